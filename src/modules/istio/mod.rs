//! Istio policy store integration
//!
//! Provides the resource client abstraction over the remote configuration
//! API, its REST implementation, and the generic upsert primitive used for
//! every policy resource kind.

mod client;
mod rest_client;
mod upsert;

pub use client::{RawResponse, ResourceClient, ResourceClientError, ResourceKind};
pub use rest_client::RestResourceClient;
pub use upsert::{upsert, UpsertError, UpsertOperation, UpsertOutcome};
