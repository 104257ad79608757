use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

use super::client::{ResourceClient, ResourceClientError, ResourceKind};

/// Which write the upsert issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOperation {
    Created,
    Replaced,
}

impl fmt::Display for UpsertOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsertOperation::Created => f.write_str("created"),
            UpsertOperation::Replaced => f.write_str("replaced"),
        }
    }
}

#[derive(Debug)]
pub struct UpsertOutcome {
    pub operation: UpsertOperation,
    /// Raw body returned by the write call
    pub body: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpsertError {
    #[error(transparent)]
    Client(#[from] ResourceClientError),

    #[error("Failed to decode existing {kind} '{name}': {source}")]
    Decode {
        kind: ResourceKind,
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {kind} '{name}': {source}")]
    Encode {
        kind: ResourceKind,
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Get-then-create-or-replace a single named resource.
///
/// `produce` receives the decoded object when the store answered 200 and
/// must only touch the fields it owns; it receives `None` otherwise and
/// builds a fresh object. Exactly one write follows a successful read.
/// Concurrent writers are not detected: the last write wins.
pub async fn upsert<T, F>(
    client: &dyn ResourceClient,
    kind: ResourceKind,
    namespace: &str,
    name: &str,
    produce: F,
) -> Result<UpsertOutcome, UpsertError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce(Option<T>) -> T,
{
    let existing = match client.get(kind, namespace, name).await {
        Ok(response) if response.is_ok() => Some(response.body),
        Ok(_) | Err(ResourceClientError::NotFound { .. }) => None,
        Err(e) => return Err(e.into()),
    };

    let (operation, desired) = match existing {
        Some(body) => {
            let current: T =
                serde_json::from_slice(&body).map_err(|source| UpsertError::Decode {
                    kind,
                    name: name.to_string(),
                    source,
                })?;
            (UpsertOperation::Replaced, produce(Some(current)))
        }
        None => (UpsertOperation::Created, produce(None)),
    };

    let payload = serde_json::to_vec(&desired).map_err(|source| UpsertError::Encode {
        kind,
        name: name.to_string(),
        source,
    })?;

    let response = match operation {
        UpsertOperation::Replaced => client.replace(kind, namespace, name, payload).await?,
        UpsertOperation::Created => client.create(kind, namespace, name, payload).await?,
    };

    tracing::debug!("{} '{}' {} in namespace '{}'", kind, name, operation, namespace);

    Ok(UpsertOutcome {
        operation,
        body: response.body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{CallMethod, InMemoryResourceClient};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_upsert_creates_missing_resource() {
        let store = InMemoryResourceClient::new();

        let outcome = upsert(&store, ResourceKind::Quota, "ns", "requestcount-a", |existing| {
            assert!(existing.is_none());
            json!({ "metadata": { "name": "requestcount-a" }, "spec": { "dimensions": {} } })
        })
        .await
        .unwrap();

        assert_eq!(outcome.operation, UpsertOperation::Created);
        let calls = store.calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].method, CallMethod::Get);
        assert_eq!(calls[1].method, CallMethod::Create);
        assert_eq!(calls[1].name, "requestcount-a");
    }

    #[tokio::test]
    async fn test_upsert_replaces_only_owned_fields() {
        let store = InMemoryResourceClient::new();
        store
            .seed(
                ResourceKind::Rule,
                "ns",
                "quota-a",
                json!({
                    "metadata": { "name": "quota-a", "resourceVersion": "42" },
                    "spec": { "match": "true", "actions": [] }
                }),
            )
            .await;

        let outcome = upsert(&store, ResourceKind::Rule, "ns", "quota-a", |existing| {
            let mut rule: Value = existing.expect("rule should exist");
            rule["spec"]["actions"] = json!([{ "handler": "h" }]);
            rule
        })
        .await
        .unwrap();

        assert_eq!(outcome.operation, UpsertOperation::Replaced);
        let stored = store.stored(ResourceKind::Rule, "ns", "quota-a").await.unwrap();
        assert_eq!(stored["metadata"]["resourceVersion"], "42");
        assert_eq!(stored["spec"]["match"], "true");
        assert_eq!(stored["spec"]["actions"][0]["handler"], "h");
    }

    #[tokio::test]
    async fn test_upsert_aborts_on_malformed_existing_payload() {
        let store = InMemoryResourceClient::new();
        store
            .seed_raw(ResourceKind::Quota, "ns", "requestcount-a", b"not json".to_vec())
            .await;

        let result = upsert(&store, ResourceKind::Quota, "ns", "requestcount-a", |_| {
            json!({})
        })
        .await;

        assert!(matches!(result, Err(UpsertError::Decode { .. })));
        assert_eq!(store.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_propagates_read_failure_without_writing() {
        let store = InMemoryResourceClient::new();
        store.fail_on(CallMethod::Get, ResourceKind::MemQuota).await;

        let result = upsert(&store, ResourceKind::MemQuota, "ns", "handler-a", |_| {
            json!({})
        })
        .await;

        assert!(matches!(
            result,
            Err(UpsertError::Client(ResourceClientError::Transport(_)))
        ));
        assert_eq!(store.calls().await.len(), 1);
    }
}
