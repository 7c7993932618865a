//! Eligibility gate
//!
//! Checks a request against the minimum-count and provider-diversity policy
//! before any remote call is made. The check is pure: rejection has no side
//! effects and yields a fixed-shape [`ErrorPayload`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::model::{ModelCatalog, ProviderFamily, ProviderIdentity};
use crate::core::payload::{ErrorPayload, StatusClass};
use crate::pipeline::entities::PipelineRequest;

/// Minimum-diversity policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityPolicy {
    /// Minimum number of distinct requested models
    pub min_models: usize,
    /// Minimum number of distinct major provider families among them
    pub min_provider_families: usize,
    /// Families that count towards diversity
    pub major_families: Vec<ProviderFamily>,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            min_models: 3,
            min_provider_families: 3,
            major_families: ProviderFamily::MAJOR.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionCode {
    InsufficientModels,
    InsufficientProviderDiversity,
    UnknownModel,
}

impl RejectionCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionCode::InsufficientModels => "insufficient_models",
            RejectionCode::InsufficientProviderDiversity => "insufficient_provider_diversity",
            RejectionCode::UnknownModel => "unknown_model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatingRejection {
    pub code: RejectionCode,
    pub detail: String,
}

impl GatingRejection {
    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload::new(
            StatusClass::ServiceUnavailable,
            self.code.as_str(),
            self.detail.clone(),
        )
    }
}

impl std::fmt::Display for GatingRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.detail)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Resolved identities in request order
    Allowed(Vec<ProviderIdentity>),
    Rejected(GatingRejection),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allowed(_))
    }
}

/// Applies an [`EligibilityPolicy`] using a [`ModelCatalog`] to resolve families
#[derive(Debug, Clone, Default)]
pub struct EligibilityGate {
    policy: EligibilityPolicy,
    catalog: ModelCatalog,
}

impl EligibilityGate {
    pub fn new(policy: EligibilityPolicy, catalog: ModelCatalog) -> Self {
        Self { policy, catalog }
    }

    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Check order: unknown model, then count, then diversity
    pub fn check(&self, request: &PipelineRequest) -> GateDecision {
        let mut identities = Vec::with_capacity(request.models().len());
        for model in request.models() {
            match self.catalog.resolve(model) {
                Some(identity) => identities.push(identity),
                None => {
                    return GateDecision::Rejected(GatingRejection {
                        code: RejectionCode::UnknownModel,
                        detail: format!("model '{}' is not recognized", model),
                    });
                }
            }
        }

        if identities.len() < self.policy.min_models {
            return GateDecision::Rejected(GatingRejection {
                code: RejectionCode::InsufficientModels,
                detail: format!(
                    "{} model(s) requested, at least {} required",
                    identities.len(),
                    self.policy.min_models
                ),
            });
        }

        let families: BTreeSet<ProviderFamily> = identities
            .iter()
            .map(|i| i.family)
            .filter(|f| self.policy.major_families.contains(f))
            .collect();
        if families.len() < self.policy.min_provider_families {
            return GateDecision::Rejected(GatingRejection {
                code: RejectionCode::InsufficientProviderDiversity,
                detail: format!(
                    "{} distinct major provider(s), at least {} required",
                    families.len(),
                    self.policy.min_provider_families
                ),
            });
        }

        GateDecision::Allowed(identities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::Query;

    fn request(models: &[&str]) -> PipelineRequest {
        PipelineRequest::new(Query::try_new("q").unwrap(), models.iter().copied())
    }

    fn rejection_code(decision: GateDecision) -> RejectionCode {
        match decision {
            GateDecision::Rejected(r) => r.code,
            GateDecision::Allowed(_) => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_three_major_families_allowed() {
        let gate = EligibilityGate::default();
        let decision = gate.check(&request(&["gpt-4o", "claude-sonnet-4", "gemini-2.5-pro"]));
        match decision {
            GateDecision::Allowed(ids) => {
                let models: Vec<_> = ids.iter().map(|i| i.model.as_str()).collect();
                assert_eq!(models, vec!["gpt-4o", "claude-sonnet-4", "gemini-2.5-pro"]);
            }
            GateDecision::Rejected(r) => panic!("unexpected rejection: {}", r),
        }
    }

    #[test]
    fn test_two_models_rejected() {
        let gate = EligibilityGate::default();
        let code = rejection_code(gate.check(&request(&["gpt-4o", "claude-sonnet-4"])));
        assert_eq!(code, RejectionCode::InsufficientModels);
    }

    #[test]
    fn test_duplicates_do_not_count() {
        let gate = EligibilityGate::default();
        let code = rejection_code(gate.check(&request(&["gpt-4o", "gpt-4o", "claude-sonnet-4"])));
        assert_eq!(code, RejectionCode::InsufficientModels);
    }

    #[test]
    fn test_same_family_rejected_for_diversity() {
        let gate = EligibilityGate::default();
        let code = rejection_code(gate.check(&request(&["gpt-4o", "gpt-4.1", "o3-mini"])));
        assert_eq!(code, RejectionCode::InsufficientProviderDiversity);
    }

    #[test]
    fn test_non_major_family_does_not_count() {
        let catalog = ModelCatalog::new().with_model("local-llm", ProviderFamily::Other);
        let gate = EligibilityGate::new(EligibilityPolicy::default(), catalog);
        let code = rejection_code(gate.check(&request(&["gpt-4o", "claude-sonnet-4", "local-llm"])));
        assert_eq!(code, RejectionCode::InsufficientProviderDiversity);
    }

    #[test]
    fn test_unknown_model_checked_first() {
        let gate = EligibilityGate::default();
        let code = rejection_code(gate.check(&request(&["mystery-model"])));
        assert_eq!(code, RejectionCode::UnknownModel);
    }

    #[test]
    fn test_relaxed_policy() {
        let policy = EligibilityPolicy {
            min_models: 2,
            min_provider_families: 1,
            ..Default::default()
        };
        let gate = EligibilityGate::new(policy, ModelCatalog::new());
        assert!(gate.check(&request(&["gpt-4o", "gpt-4.1"])).is_allowed());
    }

    #[test]
    fn test_payload_shape_identical_across_causes() {
        let gate = EligibilityGate::default();
        let payloads: Vec<_> = [
            request(&["mystery"]),
            request(&["gpt-4o"]),
            request(&["gpt-4o", "gpt-4.1", "o3"]),
        ]
        .iter()
        .map(|r| match gate.check(r) {
            GateDecision::Rejected(rej) => serde_json::to_value(rej.payload()).unwrap(),
            GateDecision::Allowed(_) => panic!("expected rejection"),
        })
        .collect();

        let codes: Vec<_> = payloads.iter().map(|p| p["reason_code"].clone()).collect();
        assert_eq!(
            codes,
            vec![
                "unknown_model",
                "insufficient_models",
                "insufficient_provider_diversity"
            ]
        );
        for p in &payloads {
            assert_eq!(p["status"], "service_unavailable");
            assert_eq!(p.as_object().unwrap().len(), 3);
        }
    }
}
