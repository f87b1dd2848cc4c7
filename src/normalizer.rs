use crate::ad_request::{
    missing_from_target, missing_parameters, AdRequestDocument, Classification,
};
use crate::error::Result;
use crate::parameters::{relevant_parameters, MASTER_PARAMETER_LIST};
use crate::request::{AnalysisRequest, RequestRole};
use log::debug;

/// One ad request after classification and parameter filtering.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub role: RequestRole,
    pub document: AdRequestDocument,
    pub classification: Classification,
    pub relevant: Vec<&'static str>,
    /// Relevant parameters the document does not carry.
    pub missing: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct NormalizedRequest {
    pub contexts: Vec<RequestContext>,
    /// Source-only parameters, filtered by the target's relevant set.
    /// `None` for modes without a comparison.
    pub missing_from_target: Option<Vec<&'static str>>,
}

impl NormalizedRequest {
    pub fn source(&self) -> &RequestContext {
        &self.contexts[0]
    }

    pub fn target(&self) -> Option<&RequestContext> {
        self.contexts.get(1)
    }
}

/// Validates the inbound request, then parses and classifies each ad request.
pub fn normalize(request: &AnalysisRequest) -> Result<NormalizedRequest> {
    request.validate()?;

    let roles = request.mode.roles();
    let mut contexts = Vec::with_capacity(roles.len());

    for (role, input) in roles.iter().zip(&request.ad_request_inputs) {
        let document = AdRequestDocument::parse(role.label, input)?;
        let classification = document.classify()?;
        let relevant = relevant_parameters(
            MASTER_PARAMETER_LIST,
            classification.media_type,
            classification.ad_type,
        );
        let missing = missing_parameters(&document, &relevant);

        debug!(
            "{} ({}): {} relevant parameter(s), {} missing locally",
            role.label,
            role.role,
            relevant.len(),
            missing.len()
        );

        contexts.push(RequestContext {
            role: *role,
            document,
            classification,
            relevant,
            missing,
        });
    }

    let missing_from_target = if request.mode.has_comparison() {
        match contexts.as_slice() {
            [source, target] => Some(missing_from_target(
                &source.document,
                &target.document,
                &target.relevant,
            )),
            _ => None,
        }
    } else {
        None
    };

    Ok(NormalizedRequest {
        contexts,
        missing_from_target,
    })
}
