mod flow_control;
mod policy_resource;

pub use flow_control::FlowControlSpec;
pub use policy_resource::{
    IstioService, MemQuotaOverride, MemQuotaParams, MemQuotaPolicy, ObjectMeta, OwnedSpec,
    PolicyResource, QuotaCharge, QuotaParams, QuotaRule, QuotaSpecBindingParams, QuotaSpecParams,
    QuotaSpecReference, RuleAction, RuleParams,
};
