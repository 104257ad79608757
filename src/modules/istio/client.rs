use async_trait::async_trait;
use std::fmt;

/// Policy resource kinds managed in the remote store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Quota,
    MemQuota,
    Rule,
    QuotaSpec,
    QuotaSpecBinding,
}

impl ResourceKind {
    /// Plural resource name used in the REST path
    pub fn plural(&self) -> &'static str {
        match self {
            ResourceKind::Quota => "quotas",
            ResourceKind::MemQuota => "memquotas",
            ResourceKind::Rule => "rules",
            ResourceKind::QuotaSpec => "quotaspecs",
            ResourceKind::QuotaSpecBinding => "quotaspecbindings",
        }
    }

    /// Value of the `kind` field written into new objects
    pub fn kind_name(&self) -> &'static str {
        match self {
            ResourceKind::Quota => "quota",
            ResourceKind::MemQuota => "memquota",
            ResourceKind::Rule => "rule",
            ResourceKind::QuotaSpec => "QuotaSpec",
            ResourceKind::QuotaSpecBinding => "QuotaSpecBinding",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}

/// Status code and raw payload returned by the remote store
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResourceClientError {
    #[error("{kind} '{name}' not found in namespace '{namespace}'")]
    NotFound {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },

    #[error("Failed to reach policy store: {0}")]
    Transport(String),

    #[error("Policy store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Namespaced get/create/replace of a named resource by kind.
///
/// `get` signals a missing resource with [`ResourceClientError::NotFound`];
/// every other error is fatal for the caller. `create` and `replace` return
/// the raw body of a successful write.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<RawResponse, ResourceClientError>;

    async fn create(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        body: Vec<u8>,
    ) -> Result<RawResponse, ResourceClientError>;

    async fn replace(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        body: Vec<u8>,
    ) -> Result<RawResponse, ResourceClientError>;
}
