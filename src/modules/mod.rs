//! Modules layer - Infrastructure components for external integrations
//!
//! Contains clients and adapters for external services such as the Istio
//! policy configuration store.

pub mod istio;
