//! Service rate limit provisioning.
//!
//! Translates a chassis flow control document into Istio quota policy
//! resources and reconciles them against the remote policy store.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/v1/ratelimits` | Create or update the quota policy for the service in the `service_name` header |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::RateLimitReconciler;
