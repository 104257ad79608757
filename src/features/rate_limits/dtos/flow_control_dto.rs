use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use validator::Validate;

use crate::features::rate_limits::models::FlowControlSpec;

/// Chassis configuration document posted by the caller (YAML)
///
/// ```yaml
/// cse:
///   flowcontrol:
///     Provider:
///       qps:
///         limit:
///           reviews: 5
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ChassisConfigDto {
    #[serde(default)]
    pub cse: CseConfigDto,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CseConfigDto {
    #[serde(default)]
    pub flowcontrol: FlowControlConfigDto,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FlowControlConfigDto {
    #[serde(rename = "Provider", alias = "provider", default)]
    pub provider: ProviderFlowControlDto,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProviderFlowControlDto {
    #[serde(default)]
    pub qps: QpsConfigDto,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct QpsConfigDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<QpsGlobalDto>,
    /// Request-rate limit keyed by traffic source
    #[serde(default)]
    pub limit: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QpsGlobalDto {
    pub limit: u32,
}

impl From<ChassisConfigDto> for FlowControlSpec {
    fn from(dto: ChassisConfigDto) -> Self {
        FlowControlSpec::new(dto.cse.flowcontrol.provider.qps.limit)
    }
}

/// Target service taken from the `service_name` header
#[derive(Debug, Clone, Validate)]
pub struct ServiceNameDto {
    #[validate(
        length(min = 1, max = 63, message = "Service name must be 1-63 characters"),
        regex(
            path = "*crate::shared::validation::SERVICE_NAME_REGEX",
            message = "Service name must be a lowercase DNS label (alphanumerics and hyphens)"
        )
    )]
    pub service_name: String,
}
