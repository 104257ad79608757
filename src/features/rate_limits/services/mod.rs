mod policy_translator;
mod reconciler_service;

pub use policy_translator::{PolicyTranslator, TranslateError};
pub use reconciler_service::{RateLimitReconciler, ReconcileError};
