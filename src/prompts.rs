// Instruction and prompt construction for the ad request audit

use crate::normalizer::{NormalizedRequest, RequestContext};
use crate::parameters::MASTER_PARAMETER_LIST;
use crate::request::{AnalysisMode, AnalysisRequest, KpiSet};
use crate::schema::NOT_FOUND;

const AUDIT_RULES: &str = r#"
You are a world-class expert in digital advertising technology (AdTech), specializing in ad request optimization for publishers.
Your task is to audit ad request(s) against a master list of important parameters and provide actionable insights to maximize revenue.

## CONTEXTUAL FILTERING (MANDATORY)
For EACH ad request, before reporting anything:
1. Determine the media type: `app` if the request has a top-level "app" object, `site` if it has a top-level "site" object.
2. Determine the ad type: `banner` or `video`, from the object present inside the "imp" array.
3. Build the RELEVANT PARAMETER SET from the IMPORTANT PARAMETER LIST:
   - media type `app`: drop every parameter starting with `site_`
   - media type `site`: drop every parameter starting with `app_`
   - ad type `banner`: drop every parameter starting with `imp_video_`
   - ad type `video`: drop every parameter starting with `imp_banner_`
   - keep every other parameter, in the original order

## FINDINGS
- Report missing parameters ONLY from the request's RELEVANT PARAMETER SET. Never report a parameter that was filtered out.
- Parameter names use `_` for nesting: `regs_ext_gdpr` means `regs.ext.gdpr`; `imp_banner_w` means `w` inside the `banner` object of an impression.
- For each missing parameter, give a clear description of why it matters for monetization and a priority: "High", "Mid" or "Low".
- Forecast the potential revenue uplift in USD from the provided KPIs and your findings.

## ALWAYS REPORT
- `tmax`: the request's tmax value as text, or "Not Found".
- `schain`: from `source.ext.schain`, the `complete` flag as text ("1" or "0") and the number of `nodes`; use "Not Found" and 0 if there is no schain.
These two are reported for every request regardless of filtering.
"#;

const OUTPUT_RULES: &str = r#"
## OUTPUT
Always provide your response in the requested JSON format. Do not include any markdown formatting.
"#;

/// Natural-language audit rules for `mode`. Only the publisher labels vary.
pub fn build_instructions(mode: AnalysisMode) -> String {
    let mut instructions = AUDIT_RULES.trim_start().to_string();

    let roles = mode.roles();
    if let [source, target] = roles {
        instructions.push_str(&format!(
            r#"
## COMPARISON
- The {source} request is the Source; the {target} request is the Target.
- In the comparison, list parameters that are present in the {source} request but missing from the {target} request.
- Comparison findings are restricted to the {target}'s RELEVANT PARAMETER SET: a parameter outside the {target}'s media type or ad type is never reported, even if the {source} carries it.
"#,
            source = source.label,
            target = target.label,
        ));
    }

    instructions.push_str(OUTPUT_RULES);
    instructions
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSection {
    pub heading: String,
    pub body: String,
}

/// An ordered list of named sections, rendered as markdown headings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prompt {
    sections: Vec<PromptSection>,
}

impl Prompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(mut self, heading: impl Into<String>, body: impl Into<String>) -> Self {
        self.sections.push(PromptSection {
            heading: heading.into(),
            body: body.into(),
        });
        self
    }

    pub fn sections(&self) -> &[PromptSection] {
        &self.sections
    }

    pub fn get(&self, heading: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.heading == heading)
            .map(|s| s.body.as_str())
    }

    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(|s| format!("## {}\n{}", s.heading, s.body.trim_end()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

pub fn master_list_line() -> String {
    format!(
        "IMPORTANT PARAMETER LIST: [{}]",
        MASTER_PARAMETER_LIST.join(", ")
    )
}

/// Builds the user prompt: master list, KPIs, raw requests, the locally
/// detected context of each request and the task.
pub fn build_prompt(request: &AnalysisRequest, normalized: &NormalizedRequest) -> Prompt {
    let mode = request.mode;
    let mut prompt = Prompt::new().section("Master Parameter List", master_list_line());

    for (idx, context) in normalized.contexts.iter().enumerate() {
        if let Some(kpis) = request.kpi_sets.get(idx) {
            prompt = prompt.section(kpi_heading(mode, idx), kpi_body(kpis));
        }

        prompt = prompt
            .section(
                format!(
                    "{} Ad Request ({})",
                    context.role.label, context.role.role
                ),
                format!("```json\n{}\n```", context.document.raw().trim()),
            )
            .section(
                format!("Detected Context: {}", context.role.label),
                context_body(context),
            );
    }

    if let (Some(missing), Some(target)) = (&normalized.missing_from_target, normalized.target()) {
        let source = normalized.source();
        prompt = prompt.section(
            "Comparison Pre-Audit",
            format!(
                "Present in {} but missing from {} (within the {}'s relevant set): {}",
                source.role.label,
                target.role.label,
                target.role.label,
                list_or_none(missing)
            ),
        );
    }

    prompt.section("Task", task_body(mode))
}

fn kpi_heading(mode: AnalysisMode, idx: usize) -> String {
    match mode {
        AnalysisMode::SinglePublisher => "Publisher KPIs".to_string(),
        AnalysisMode::TopVsLowPerformer => "Publisher KPIs (for the Low Performer)".to_string(),
        AnalysisMode::TwoPublishers => format!("{} KPIs", mode.roles()[idx].label),
    }
}

fn kpi_body(kpis: &KpiSet) -> String {
    format!(
        "- Ad Requests: {}\n- Fill Rate: {}%\n- CPM: ${}",
        kpis.ad_requests.trim(),
        kpis.fill_rate.trim(),
        kpis.cpm.trim()
    )
}

fn context_body(context: &RequestContext) -> String {
    let tmax = context
        .document
        .tmax()
        .unwrap_or_else(|| NOT_FOUND.to_string());
    let schain = context
        .document
        .schain()
        .map(|s| s.to_string())
        .unwrap_or_else(|| NOT_FOUND.to_string());

    format!(
        "- Media type: {}\n- Ad type: {}\n- tmax: {}\n- source.ext.schain: {}\n- Relevant parameters ({}): {}\n- Missing from this request: {}",
        context.classification.media_type,
        context.classification.ad_type,
        tmax,
        schain,
        context.relevant.len(),
        context.relevant.join(", "),
        list_or_none(&context.missing)
    )
}

fn list_or_none(items: &[&str]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn task_body(mode: AnalysisMode) -> String {
    match mode {
        AnalysisMode::SinglePublisher => "Analyze the Publisher's ad request. Provide a summary, a forecasted revenue uplift, \
             the missing parameters from its relevant parameter set, and the tmax and schain details \
             as `analysisA`."
            .to_string(),
        AnalysisMode::TopVsLowPerformer => "First, provide a detailed analysis of the Low Performer's ad request as `analysisA` \
             (summary, forecast, missing parameters from its relevant set, tmax, schain).\n\
             Second, provide a `comparison` identifying parameters present in the Top Performer's request \
             but missing from the Low Performer's request, restricted to the Low Performer's relevant set."
            .to_string(),
        AnalysisMode::TwoPublishers => "First, provide a separate, detailed analysis for Publisher A as `analysisA` and for \
             Publisher B as `analysisB` (summary, forecast, missing parameters from each relevant set, tmax, schain).\n\
             Second, provide a `comparison` identifying parameters present in Publisher A's request \
             but missing from Publisher B's request, restricted to Publisher B's relevant set."
            .to_string(),
    }
}
