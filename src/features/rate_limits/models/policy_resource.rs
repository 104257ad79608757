use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Object metadata; everything besides name and namespace is carried as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ObjectMeta {
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            extra: Map::new(),
        }
    }
}

/// A policy object as stored in the remote configuration API.
///
/// Unknown top-level fields (e.g. `status`) survive a decode/encode cycle so
/// that a replace only changes what the reconciler owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyResource<S> {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: S,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<S> PolicyResource<S> {
    pub fn new(api_version: &str, kind: &str, metadata: ObjectMeta, spec: S) -> Self {
        Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            metadata,
            spec,
            extra: Map::new(),
        }
    }
}

/// Spec types know which of their fields the reconciler owns
pub trait OwnedSpec {
    /// Overwrite the owned fields of `self` with those of `desired`
    fn apply_owned(&mut self, desired: Self);
}

// =============================================================================
// QUOTA
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaParams {
    #[serde(default)]
    pub dimensions: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OwnedSpec for QuotaParams {
    fn apply_owned(&mut self, desired: Self) {
        self.dimensions = desired.dimensions;
    }
}

// =============================================================================
// MEMQUOTA
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemQuotaParams {
    #[serde(default)]
    pub quotas: Vec<MemQuotaPolicy>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Owned entries decode with defaults: stored objects may omit fields that
// are overwritten on replace anyway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemQuotaPolicy {
    pub name: String,
    pub max_amount: i64,
    /// Duration literal such as `1s`
    pub valid_duration: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<MemQuotaOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemQuotaOverride {
    pub dimensions: BTreeMap<String, String>,
    pub max_amount: i64,
    pub valid_duration: String,
}

impl OwnedSpec for MemQuotaParams {
    fn apply_owned(&mut self, desired: Self) {
        // The whole policy list is replaced, earlier overrides are dropped
        self.quotas = desired.quotas;
    }
}

// =============================================================================
// RULE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleParams {
    #[serde(default)]
    pub actions: Vec<RuleAction>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleAction {
    pub handler: String,
    pub instances: Vec<String>,
}

impl OwnedSpec for RuleParams {
    fn apply_owned(&mut self, desired: Self) {
        self.actions = desired.actions;
    }
}

// =============================================================================
// QUOTA SPEC
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaSpecParams {
    #[serde(default)]
    pub rules: Vec<QuotaRule>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A rule without match clauses applies to every request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaRule {
    pub quotas: Vec<QuotaCharge>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaCharge {
    pub quota: String,
    pub charge: i64,
}

impl OwnedSpec for QuotaSpecParams {
    fn apply_owned(&mut self, desired: Self) {
        self.rules = desired.rules;
    }
}

// =============================================================================
// QUOTA SPEC BINDING
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuotaSpecBindingParams {
    pub services: Vec<IstioService>,
    pub quota_specs: Vec<QuotaSpecReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IstioService {
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaSpecReference {
    pub name: String,
    pub namespace: String,
}

impl OwnedSpec for QuotaSpecBindingParams {
    fn apply_owned(&mut self, desired: Self) {
        *self = desired;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = json!({
            "apiVersion": "config.istio.io/v1alpha2",
            "kind": "rule",
            "metadata": { "name": "quota-a", "namespace": "ns", "resourceVersion": "7" },
            "spec": { "match": "destination.service == \"a\"", "actions": [] },
            "status": { "observed": true }
        });

        let mut rule: PolicyResource<RuleParams> = serde_json::from_value(raw).unwrap();
        rule.spec.apply_owned(RuleParams {
            actions: vec![RuleAction {
                handler: "handler-a.memquota".to_string(),
                instances: vec!["requestcount.quota".to_string()],
            }],
            extra: Map::new(),
        });
        let encoded = serde_json::to_value(&rule).unwrap();

        assert_eq!(encoded["metadata"]["resourceVersion"], "7");
        assert_eq!(encoded["spec"]["match"], "destination.service == \"a\"");
        assert_eq!(encoded["status"]["observed"], true);
        assert_eq!(encoded["spec"]["actions"][0]["handler"], "handler-a.memquota");
    }

    #[test]
    fn test_memquota_serializes_camel_case() {
        let params = MemQuotaParams {
            quotas: vec![MemQuotaPolicy {
                name: "memquota-quota-handler-a".to_string(),
                max_amount: 1000,
                valid_duration: "1s".to_string(),
                overrides: vec![],
            }],
            extra: Map::new(),
        };

        let encoded = serde_json::to_value(&params).unwrap();
        assert_eq!(encoded["quotas"][0]["maxAmount"], 1000);
        assert_eq!(encoded["quotas"][0]["validDuration"], "1s");
        assert!(encoded["quotas"][0].get("overrides").is_none());
    }
}
