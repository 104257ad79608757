use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::sync::Arc;

use super::policy_translator::{PolicyTranslator, TranslateError};
use crate::core::config::IstioConfig;
use crate::features::rate_limits::models::{
    FlowControlSpec, ObjectMeta, OwnedSpec, PolicyResource,
};
use crate::modules::istio::{
    upsert, ResourceClient, ResourceKind, UpsertError, UpsertOperation, UpsertOutcome,
};

/// Reconciliation steps in the order they are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStep {
    Quota = 1,
    MemQuota = 2,
    Rule = 3,
    QuotaSpec = 4,
    QuotaSpecBinding = 5,
}

impl ReconcileStep {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ReconcileStep::Quota => ResourceKind::Quota,
            ReconcileStep::MemQuota => ResourceKind::MemQuota,
            ReconcileStep::Rule => ResourceKind::Rule,
            ReconcileStep::QuotaSpec => ResourceKind::QuotaSpec,
            ReconcileStep::QuotaSpecBinding => ResourceKind::QuotaSpecBinding,
        }
    }
}

impl fmt::Display for ReconcileStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {}/5 ({})", *self as u8, self.kind())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error("Failed to upsert {resource} at {step}: {source}")]
    Step {
        step: ReconcileStep,
        resource: String,
        #[source]
        source: UpsertError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: ReconcileStep,
    pub resource: String,
    pub operation: UpsertOperation,
}

/// What a successful reconciliation touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub service_name: String,
    pub source: String,
    pub steps: Vec<StepReport>,
}

/// Drives the five policy upserts for a service.
///
/// Steps run strictly in sequence and the first failure aborts the rest.
/// Resources written by earlier steps are left in place.
pub struct RateLimitReconciler {
    client: Arc<dyn ResourceClient>,
    translator: PolicyTranslator,
    namespace: String,
    api_version: String,
}

impl RateLimitReconciler {
    pub fn new(client: Arc<dyn ResourceClient>, config: &IstioConfig) -> Self {
        Self {
            client,
            translator: PolicyTranslator::new(&config.namespace, &config.service_namespace),
            namespace: config.namespace.clone(),
            api_version: config.api_version_string(),
        }
    }

    pub async fn reconcile(
        &self,
        service_name: &str,
        spec: &FlowControlSpec,
    ) -> Result<ReconcileReport, ReconcileError> {
        let policy = self.translator.translate(service_name, spec)?;
        let names = &policy.names;

        tracing::info!(
            "Reconciling rate limit for service '{}' (source '{}') in namespace '{}'",
            service_name,
            policy.source,
            self.namespace
        );

        let steps = vec![
            self.apply(ReconcileStep::Quota, &names.quota, policy.quota.clone())
                .await?,
            self.apply(ReconcileStep::MemQuota, &names.memquota, policy.memquota.clone())
                .await?,
            self.apply(ReconcileStep::Rule, &names.rule, policy.rule.clone())
                .await?,
            self.apply(
                ReconcileStep::QuotaSpec,
                &names.quota_spec,
                policy.quota_spec.clone(),
            )
            .await?,
            self.apply(
                ReconcileStep::QuotaSpecBinding,
                &names.quota_spec_binding,
                policy.quota_spec_binding.clone(),
            )
            .await?,
        ];

        tracing::info!(
            "Rate limit for service '{}' reconciled ({} resources)",
            service_name,
            steps.len()
        );

        Ok(ReconcileReport {
            service_name: service_name.to_string(),
            source: policy.source,
            steps,
        })
    }

    async fn apply<S>(
        &self,
        step: ReconcileStep,
        name: &str,
        desired: S,
    ) -> Result<StepReport, ReconcileError>
    where
        S: OwnedSpec + Serialize + DeserializeOwned,
    {
        let kind = step.kind();
        let namespace = self.namespace.as_str();
        let api_version = self.api_version.as_str();

        let result = upsert(
            self.client.as_ref(),
            kind,
            namespace,
            name,
            |existing: Option<PolicyResource<S>>| match existing {
                Some(mut resource) => {
                    resource.spec.apply_owned(desired);
                    resource
                }
                None => PolicyResource::new(
                    api_version,
                    kind.kind_name(),
                    ObjectMeta::new(name, namespace),
                    desired,
                ),
            },
        )
        .await;

        match result {
            Ok(UpsertOutcome { operation, .. }) => {
                tracing::info!("{}: {} '{}' {}", step, kind, name, operation);
                Ok(StepReport {
                    step,
                    resource: name.to_string(),
                    operation,
                })
            }
            Err(source) => {
                tracing::error!("{}: {} '{}' failed: {}", step, kind, name, source);
                Err(ReconcileError::Step {
                    step,
                    resource: name.to_string(),
                    source,
                })
            }
        }
    }
}
