use std::sync::Arc;

use axum::{extract::State, http::StatusCode};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppYaml, ServiceName};
use crate::features::rate_limits::dtos::{ChassisConfigDto, ServiceNameDto};
use crate::features::rate_limits::models::FlowControlSpec;
use crate::features::rate_limits::services::RateLimitReconciler;

/// Create or update the quota policy throttling a service
#[utoipa::path(
    post,
    path = "/api/v1/ratelimits",
    params(
        ("service_name" = String, Header, description = "Service to throttle")
    ),
    request_body(content = ChassisConfigDto, content_type = "application/yaml"),
    responses(
        (status = 201, description = "Quota policy reconciled"),
        (status = 400, description = "Missing service name, unsupported content type, or invalid flow control spec"),
        (status = 500, description = "Body could not be read or parsed, or a policy resource could not be written")
    ),
    tag = "rate-limits"
)]
pub async fn provision_rate_limit(
    State(reconciler): State<Arc<RateLimitReconciler>>,
    ServiceName(service_name): ServiceName,
    AppYaml(dto): AppYaml<ChassisConfigDto>,
) -> Result<StatusCode> {
    let header = ServiceNameDto { service_name };
    header
        .validate()
        .map_err(|e| AppError::Validation(format!("Invalid service name: {}", e)))?;

    let spec: FlowControlSpec = dto.into();
    let report = reconciler.reconcile(&header.service_name, &spec).await?;

    for step in &report.steps {
        tracing::debug!("{}: '{}' {}", step.step, step.resource, step.operation);
    }
    tracing::info!(
        "Rate limit for '{}' from source '{}' provisioned",
        report.service_name,
        report.source
    );

    Ok(StatusCode::CREATED)
}
