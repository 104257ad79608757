#[cfg(test)]
use crate::modules::istio::{RawResponse, ResourceClient, ResourceClientError, ResourceKind};

#[cfg(test)]
use async_trait::async_trait;

#[cfg(test)]
use std::collections::{HashMap, HashSet};

#[cfg(test)]
use tokio::sync::RwLock;

#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallMethod {
    Get,
    Create,
    Replace,
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: CallMethod,
    pub kind: ResourceKind,
    pub name: String,
}

/// In-memory stand-in for the remote policy store.
///
/// Records every call in order and can be told to fail a given
/// (method, kind) pair with a transport error.
#[cfg(test)]
#[derive(Default)]
pub struct InMemoryResourceClient {
    objects: RwLock<HashMap<(ResourceKind, String, String), Vec<u8>>>,
    calls: RwLock<Vec<RecordedCall>>,
    failures: RwLock<HashSet<(CallMethod, ResourceKind)>>,
}

#[cfg(test)]
#[allow(dead_code)]
impl InMemoryResourceClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        value: serde_json::Value,
    ) {
        self.seed_raw(kind, namespace, name, serde_json::to_vec(&value).unwrap())
            .await;
    }

    pub async fn seed_raw(&self, kind: ResourceKind, namespace: &str, name: &str, body: Vec<u8>) {
        self.objects
            .write()
            .await
            .insert((kind, namespace.to_string(), name.to_string()), body);
    }

    pub async fn stored(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Option<serde_json::Value> {
        self.objects
            .read()
            .await
            .get(&(kind, namespace.to_string(), name.to_string()))
            .map(|body| serde_json::from_slice(body).unwrap())
    }

    pub async fn fail_on(&self, method: CallMethod, kind: ResourceKind) {
        self.failures.write().await.insert((method, kind));
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// Kinds in the order they were written (create or replace)
    pub async fn write_order(&self) -> Vec<ResourceKind> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.method != CallMethod::Get)
            .map(|c| c.kind)
            .collect()
    }

    async fn record(
        &self,
        method: CallMethod,
        kind: ResourceKind,
        name: &str,
    ) -> Result<(), ResourceClientError> {
        self.calls.write().await.push(RecordedCall {
            method,
            kind,
            name: name.to_string(),
        });

        if self.failures.read().await.contains(&(method, kind)) {
            return Err(ResourceClientError::Transport(format!(
                "injected failure for {:?} {}",
                method, kind
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[async_trait]
impl ResourceClient for InMemoryResourceClient {
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<RawResponse, ResourceClientError> {
        self.record(CallMethod::Get, kind, name).await?;

        let key = (kind, namespace.to_string(), name.to_string());
        match self.objects.read().await.get(&key) {
            Some(body) => Ok(RawResponse {
                status: 200,
                body: body.clone(),
            }),
            None => Err(ResourceClientError::NotFound {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
        }
    }

    async fn create(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        body: Vec<u8>,
    ) -> Result<RawResponse, ResourceClientError> {
        self.record(CallMethod::Create, kind, name).await?;

        let key = (kind, namespace.to_string(), name.to_string());
        let mut objects = self.objects.write().await;
        if objects.contains_key(&key) {
            return Err(ResourceClientError::Status {
                status: 409,
                body: format!("{} '{}' already exists", kind, name),
            });
        }
        objects.insert(key, body.clone());

        Ok(RawResponse { status: 201, body })
    }

    async fn replace(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        body: Vec<u8>,
    ) -> Result<RawResponse, ResourceClientError> {
        self.record(CallMethod::Replace, kind, name).await?;

        let key = (kind, namespace.to_string(), name.to_string());
        let mut objects = self.objects.write().await;
        if !objects.contains_key(&key) {
            return Err(ResourceClientError::Status {
                status: 404,
                body: format!("{} '{}' not found", kind, name),
            });
        }
        objects.insert(key, body.clone());

        Ok(RawResponse { status: 200, body })
    }
}
