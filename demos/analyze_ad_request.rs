use ad_request_auditor::llm::GeminiClient;
use ad_request_auditor::{AdAnalyzer, AnalysisMode, AnalysisRequest, KpiSet};
use dotenv::dotenv;

const TOP_PERFORMER: &str = r#"{
    "id": "80ce30c53c16e6ede735f123ef6e32361bfc7b22",
    "at": 1,
    "tmax": 300,
    "cur": ["USD"],
    "imp": [{ "id": "1", "bidfloor": 0.03, "banner": { "w": 320, "h": 50, "pos": 1 } }],
    "app": {
        "id": "agltb3B1Yi1pbmNyDAsSA0FwcBiJkfIUDA",
        "name": "Yahoo Weather",
        "bundle": "12345",
        "storeurl": "https://itunes.apple.com/id628677149",
        "publisher": { "id": "agltb3B1Yi1pbmNyDAsSA0FwcBiJkfTUCV", "name": "yahoo" }
    },
    "device": { "ifa": "AA000DFE74168477C70D291f574D344790E0BB11", "ua": "Mozilla/5.0", "ip": "123.145.167.189", "lmt": 0 },
    "source": { "ext": { "schain": { "complete": 1, "ver": "1.0", "nodes": [{ "asi": "exchange1.com", "sid": "1234", "hp": 1 }] } } }
}"#;

const LOW_PERFORMER: &str = r#"{
    "id": "9ad3a7f1c0e24b7e",
    "imp": [{ "id": "1", "banner": { "w": 320, "h": 50 } }],
    "app": { "id": "agltb3B1Yi1pbmNyDAsSA0FwcBiJkfIUDA", "name": "Yahoo Weather" },
    "device": { "ua": "Mozilla/5.0", "ip": "123.145.167.189" }
}"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    println!("🚀 Starting ad request audit (top vs low performer)...");

    let analyzer = AdAnalyzer::new(GeminiClient::from_env()?);
    let request = AnalysisRequest::new(
        AnalysisMode::TopVsLowPerformer,
        vec![KpiSet::new("1000000", "38", "0.95")],
        vec![TOP_PERFORMER.to_string(), LOW_PERFORMER.to_string()],
    );

    let prepared = analyzer.prepare(&request)?;
    if let Some(missing) = &prepared.normalized.missing_from_target {
        println!("📋 Local pre-audit: {} parameter(s) missing from the low performer", missing.len());
    }

    match analyzer.analyze_report(&request).await {
        Ok(result) => {
            let analysis = &result.analysis_a;
            println!("\n✅ {}", analysis.summary);
            println!("💰 Forecasted uplift: ${:.2}", analysis.forecasted_revenue);
            println!("⏱️  tmax: {}", analysis.tmax);
            println!(
                "🔗 schain: complete={}, nodes={}",
                analysis.schain.complete, analysis.schain.nodes
            );
            for finding in &analysis.missing_parameters {
                println!(
                    "   [{:?}] {} - {}",
                    finding.priority, finding.parameter, finding.description
                );
            }
            if let Some(comparison) = &result.comparison {
                println!("\n🔍 {}", comparison.comparison_summary);
                println!("   Missing from target: {}", comparison.missing_from_target.join(", "));
            }
        }
        Err(report) => {
            eprintln!("❌ {}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
