use std::collections::BTreeMap;

/// Caller-supplied throttle policy: traffic source to request-rate limit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowControlSpec {
    pub limits: BTreeMap<String, u32>,
}

impl FlowControlSpec {
    pub fn new(limits: BTreeMap<String, u32>) -> Self {
        Self { limits }
    }
}
