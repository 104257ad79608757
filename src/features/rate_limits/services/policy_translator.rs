use serde_json::Map;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::features::rate_limits::models::{
    FlowControlSpec, IstioService, MemQuotaOverride, MemQuotaParams, MemQuotaPolicy, QuotaCharge,
    QuotaParams, QuotaRule, QuotaSpecBindingParams, QuotaSpecParams, QuotaSpecReference,
    RuleAction, RuleParams,
};
use crate::shared::validation::SERVICE_NAME_REGEX;

/// Quota instance every generated rule action points at
pub const QUOTA_INSTANCE: &str = "requestcount.quota";

const DEFAULT_MAX_AMOUNT: i64 = 1000;
const DEFAULT_VALID_DURATION: Duration = Duration::from_secs(1);
const OVERRIDE_MAX_AMOUNT: i64 = 1;
const OVERRIDE_VALID_DURATION: Duration = Duration::from_secs(5);
const QUOTA_CHARGE: i64 = 1;

/// Attribute expressions the request-count quota is dimensioned on
const QUOTA_DIMENSIONS: [(&str, &str); 4] = [
    (
        "destination",
        r#"destination.labels["app"] | destination.service | "unknown""#,
    ),
    (
        "destinationVersion",
        r#"destination.labels["version"] | "unknown""#,
    ),
    (
        "source",
        r#"source.labels["app"] | source.service | "unknown""#,
    ),
    ("sourceVersion", r#"source.labels["version"] | "unknown""#),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error("No traffic source given in the flow control limit map")]
    NoTrafficSource,

    #[error("Exactly one traffic source is supported, got: {}", .0.join(", "))]
    AmbiguousTrafficSource(Vec<String>),

    #[error("Traffic source '{0}' is not a valid service name")]
    InvalidTrafficSource(String),
}

/// Names of the five policy resources derived from a service name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    pub quota: String,
    pub memquota: String,
    pub rule: String,
    pub quota_spec: String,
    pub quota_spec_binding: String,
}

impl ResourceNames {
    pub fn for_service(service_name: &str) -> Self {
        Self {
            quota: format!("requestcount-{}", service_name),
            memquota: format!("handler-{}", service_name),
            rule: format!("quota-{}", service_name),
            quota_spec: format!("request-count-{}", service_name),
            quota_spec_binding: format!("request-count-binding-{}", service_name),
        }
    }
}

/// Desired spec of every policy resource for one service
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedPolicy {
    pub names: ResourceNames,
    pub source: String,
    pub quota: QuotaParams,
    pub memquota: MemQuotaParams,
    pub rule: RuleParams,
    pub quota_spec: QuotaSpecParams,
    pub quota_spec_binding: QuotaSpecBindingParams,
}

/// Turns a flow control spec into Istio quota policy specs
#[derive(Debug, Clone)]
pub struct PolicyTranslator {
    /// Namespace the policy resources live in
    policy_namespace: String,
    /// Namespace of the bound services
    service_namespace: String,
}

impl PolicyTranslator {
    pub fn new(policy_namespace: &str, service_namespace: &str) -> Self {
        Self {
            policy_namespace: policy_namespace.to_string(),
            service_namespace: service_namespace.to_string(),
        }
    }

    pub fn translate(
        &self,
        service_name: &str,
        spec: &FlowControlSpec,
    ) -> Result<TranslatedPolicy, TranslateError> {
        let source = traffic_source(spec)?;
        let names = ResourceNames::for_service(service_name);

        let quota = QuotaParams {
            dimensions: QUOTA_DIMENSIONS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            extra: Map::new(),
        };

        let override_dimensions = BTreeMap::from([
            ("destination".to_string(), service_name.to_string()),
            ("source".to_string(), source.clone()),
        ]);

        let memquota = MemQuotaParams {
            quotas: vec![MemQuotaPolicy {
                name: format!("memquota-quota-{}", names.memquota),
                max_amount: DEFAULT_MAX_AMOUNT,
                valid_duration: duration_literal(DEFAULT_VALID_DURATION),
                overrides: vec![MemQuotaOverride {
                    dimensions: override_dimensions,
                    max_amount: OVERRIDE_MAX_AMOUNT,
                    valid_duration: duration_literal(OVERRIDE_VALID_DURATION),
                }],
            }],
            extra: Map::new(),
        };

        let rule = RuleParams {
            actions: vec![RuleAction {
                handler: format!("{}.memquota", names.memquota),
                instances: vec![QUOTA_INSTANCE.to_string()],
            }],
            extra: Map::new(),
        };

        let quota_spec = QuotaSpecParams {
            rules: vec![QuotaRule {
                quotas: vec![QuotaCharge {
                    quota: names.rule.clone(),
                    charge: QUOTA_CHARGE,
                }],
            }],
            extra: Map::new(),
        };

        let quota_spec_binding = QuotaSpecBindingParams {
            services: vec![
                IstioService {
                    name: service_name.to_string(),
                    namespace: self.service_namespace.clone(),
                },
                IstioService {
                    name: source.clone(),
                    namespace: self.service_namespace.clone(),
                },
            ],
            quota_specs: vec![QuotaSpecReference {
                name: names.quota_spec.clone(),
                namespace: self.policy_namespace.clone(),
            }],
        };

        Ok(TranslatedPolicy {
            names,
            source,
            quota,
            memquota,
            rule,
            quota_spec,
            quota_spec_binding,
        })
    }
}

/// The single traffic source of a spec; zero or several keys are rejected.
/// The source is bound as a service, so it must be a valid service name.
fn traffic_source(spec: &FlowControlSpec) -> Result<String, TranslateError> {
    let mut sources = spec.limits.keys();
    match (sources.next(), sources.next()) {
        (None, _) => Err(TranslateError::NoTrafficSource),
        (Some(source), None) if SERVICE_NAME_REGEX.is_match(source) => Ok(source.clone()),
        (Some(source), None) => Err(TranslateError::InvalidTrafficSource(source.clone())),
        (Some(_), Some(_)) => Err(TranslateError::AmbiguousTrafficSource(
            spec.limits.keys().cloned().collect(),
        )),
    }
}

fn duration_literal(duration: Duration) -> String {
    format!("{}s", duration.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(entries: &[(&str, u32)]) -> FlowControlSpec {
        FlowControlSpec::new(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        )
    }

    #[test]
    fn test_resource_names_are_deterministic() {
        let names = ResourceNames::for_service("checkout");

        assert_eq!(names.quota, "requestcount-checkout");
        assert_eq!(names.memquota, "handler-checkout");
        assert_eq!(names.rule, "quota-checkout");
        assert_eq!(names.quota_spec, "request-count-checkout");
        assert_eq!(names.quota_spec_binding, "request-count-binding-checkout");
    }

    #[test]
    fn test_translate_ratings_limited_by_reviews() {
        let translator = PolicyTranslator::new("lance-test", "default");
        let policy = translator
            .translate("ratings", &spec(&[("reviews", 5)]))
            .unwrap();

        assert_eq!(policy.source, "reviews");

        let quota = &policy.memquota.quotas[0];
        assert_eq!(policy.memquota.quotas.len(), 1);
        assert_eq!(quota.name, "memquota-quota-handler-ratings");
        assert_eq!(quota.max_amount, 1000);
        assert_eq!(quota.valid_duration, "1s");

        let override_ = &quota.overrides[0];
        assert_eq!(quota.overrides.len(), 1);
        assert_eq!(
            override_.dimensions,
            BTreeMap::from([
                ("destination".to_string(), "ratings".to_string()),
                ("source".to_string(), "reviews".to_string()),
            ])
        );
        assert_eq!(override_.max_amount, 1);
        assert_eq!(override_.valid_duration, "5s");

        let services = &policy.quota_spec_binding.services;
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].name, "ratings");
        assert_eq!(services[1].name, "reviews");
        assert!(services.iter().all(|s| s.namespace == "default"));
        assert_eq!(
            policy.quota_spec_binding.quota_specs,
            vec![QuotaSpecReference {
                name: "request-count-ratings".to_string(),
                namespace: "lance-test".to_string(),
            }]
        );
    }

    #[test]
    fn test_translate_rule_and_quota_spec() {
        let translator = PolicyTranslator::new("lance-test", "default");
        let policy = translator
            .translate("checkout", &spec(&[("frontend", 20)]))
            .unwrap();

        assert_eq!(
            policy.rule.actions,
            vec![RuleAction {
                handler: "handler-checkout.memquota".to_string(),
                instances: vec!["requestcount.quota".to_string()],
            }]
        );
        assert_eq!(
            policy.quota_spec.rules,
            vec![QuotaRule {
                quotas: vec![QuotaCharge {
                    quota: "quota-checkout".to_string(),
                    charge: 1,
                }],
            }]
        );
        assert_eq!(policy.quota.dimensions.len(), 4);
        assert_eq!(
            policy.quota.dimensions["sourceVersion"],
            r#"source.labels["version"] | "unknown""#
        );
    }

    #[test]
    fn test_translate_rejects_blank_or_malformed_source() {
        let translator = PolicyTranslator::new("lance-test", "default");

        assert_eq!(
            translator.translate("ratings", &spec(&[("", 5)])),
            Err(TranslateError::InvalidTrafficSource(String::new()))
        );
        assert_eq!(
            translator.translate("ratings", &spec(&[("Reviews App", 5)])),
            Err(TranslateError::InvalidTrafficSource("Reviews App".to_string()))
        );
    }

    #[test]
    fn test_translate_rejects_empty_limit_map() {
        let translator = PolicyTranslator::new("lance-test", "default");

        assert_eq!(
            translator.translate("ratings", &spec(&[])),
            Err(TranslateError::NoTrafficSource)
        );
    }

    #[test]
    fn test_translate_rejects_multiple_sources() {
        let translator = PolicyTranslator::new("lance-test", "default");
        let result = translator.translate("ratings", &spec(&[("reviews", 5), ("productpage", 3)]));

        assert_eq!(
            result,
            Err(TranslateError::AmbiguousTrafficSource(vec![
                "productpage".to_string(),
                "reviews".to_string(),
            ]))
        );
    }
}
