use utoipa::{Modify, OpenApi};

use crate::features::rate_limits::{dtos as rate_limits_dtos, handlers as rate_limits_handlers};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Rate limits
        rate_limits_handlers::rate_limit_handler::provision_rate_limit,
    ),
    components(
        schemas(
            rate_limits_dtos::ChassisConfigDto,
            rate_limits_dtos::CseConfigDto,
            rate_limits_dtos::FlowControlConfigDto,
            rate_limits_dtos::ProviderFlowControlDto,
            rate_limits_dtos::QpsConfigDto,
            rate_limits_dtos::QpsGlobalDto,
        )
    ),
    tags(
        (name = "rate-limits", description = "Service rate limit provisioning")
    )
)]
pub struct ApiDoc;

/// Overrides document info from configuration
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
