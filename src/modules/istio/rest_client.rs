//! REST client for the Istio policy configuration API
//!
//! Talks to a Kubernetes-style API server:
//! `{base}/apis/{group}/{version}/namespaces/{namespace}/{plural}[/{name}]`.

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, StatusCode};
use tracing::{debug, error};

use super::client::{RawResponse, ResourceClient, ResourceClientError, ResourceKind};
use crate::core::config::IstioConfig;
use crate::core::error::AppError;

pub struct RestResourceClient {
    http_client: Client,
    api_server_url: String,
    api_group: String,
    api_version: String,
    bearer_token: Option<String>,
}

impl RestResourceClient {
    pub fn new(config: &IstioConfig) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_server_url: config.api_server_url.trim_end_matches('/').to_string(),
            api_group: config.api_group.clone(),
            api_version: config.api_version.clone(),
            bearer_token: config.bearer_token.clone(),
        })
    }

    fn collection_url(&self, kind: ResourceKind, namespace: &str) -> String {
        format!(
            "{}/apis/{}/{}/namespaces/{}/{}",
            self.api_server_url,
            self.api_group,
            self.api_version,
            namespace,
            kind.plural()
        )
    }

    fn resource_url(&self, kind: ResourceKind, namespace: &str, name: &str) -> String {
        format!("{}/{}", self.collection_url(kind, namespace), name)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<RawResponse, ResourceClientError> {
        let response = self
            .authorize(request)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                error!("Policy store request failed: {}", e);
                ResourceClientError::Transport(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ResourceClientError::Transport(e.to_string()))?
            .to_vec();

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }

    async fn write(
        &self,
        request: RequestBuilder,
        body: Vec<u8>,
    ) -> Result<RawResponse, ResourceClientError> {
        let request = request
            .header(header::CONTENT_TYPE, "application/json")
            .body(body);
        let response = self.execute(request).await?;

        if !StatusCode::from_u16(response.status)
            .map(|s| s.is_success())
            .unwrap_or(false)
        {
            let body = String::from_utf8_lossy(&response.body).into_owned();
            error!("Policy store API error: HTTP {} - {}", response.status, body);
            return Err(ResourceClientError::Status {
                status: response.status,
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ResourceClient for RestResourceClient {
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<RawResponse, ResourceClientError> {
        let url = self.resource_url(kind, namespace, name);
        debug!("Fetching {} from policy store: {}", kind, url);

        let response = self.execute(self.http_client.get(&url)).await?;

        match StatusCode::from_u16(response.status) {
            Ok(StatusCode::NOT_FOUND) => Err(ResourceClientError::NotFound {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
            Ok(status) if status.is_success() => Ok(response),
            _ => {
                let body = String::from_utf8_lossy(&response.body).into_owned();
                error!("Policy store API error: HTTP {} - {}", response.status, body);
                Err(ResourceClientError::Status {
                    status: response.status,
                    body,
                })
            }
        }
    }

    async fn create(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        body: Vec<u8>,
    ) -> Result<RawResponse, ResourceClientError> {
        let url = self.collection_url(kind, namespace);
        debug!("Creating {} '{}' in policy store: {}", kind, name, url);

        self.write(self.http_client.post(&url), body).await
    }

    async fn replace(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        body: Vec<u8>,
    ) -> Result<RawResponse, ResourceClientError> {
        let url = self.resource_url(kind, namespace, name);
        debug!("Replacing {} '{}' in policy store: {}", kind, name, url);

        self.write(self.http_client.put(&url), body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode as HttpStatus},
        routing::get,
        Router,
    };
    use std::time::Duration;

    const MEMQUOTAS: &str = "/apis/config.istio.io/v1alpha2/namespaces/lance-test/memquotas";

    fn test_config() -> IstioConfig {
        config_for("https://kube.local:6443/")
    }

    fn config_for(api_server_url: &str) -> IstioConfig {
        IstioConfig {
            api_server_url: api_server_url.to_string(),
            api_group: "config.istio.io".to_string(),
            api_version: "v1alpha2".to_string(),
            namespace: "lance-test".to_string(),
            service_namespace: "default".to_string(),
            bearer_token: None,
            request_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_resource_url_layout() {
        let client = RestResourceClient::new(&test_config()).unwrap();

        assert_eq!(
            client.resource_url(ResourceKind::MemQuota, "lance-test", "handler-ratings"),
            "https://kube.local:6443/apis/config.istio.io/v1alpha2/namespaces/lance-test/memquotas/handler-ratings"
        );
    }

    #[test]
    fn test_collection_url_used_for_create() {
        let client = RestResourceClient::new(&test_config()).unwrap();

        assert_eq!(
            client.collection_url(ResourceKind::QuotaSpecBinding, "lance-test"),
            "https://kube.local:6443/apis/config.istio.io/v1alpha2/namespaces/lance-test/quotaspecbindings"
        );
    }

    /// Serves `app` on an ephemeral local port and returns a client pointed at it
    async fn client_for(app: Router, bearer_token: Option<&str>) -> RestResourceClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut config = config_for(&format!("http://{}", addr));
        config.bearer_token = bearer_token.map(str::to_string);
        RestResourceClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_get_maps_not_found() {
        let app = Router::new().route(
            &format!("{}/handler-ratings", MEMQUOTAS),
            get(|| async { (HttpStatus::NOT_FOUND, r#"{"reason":"NotFound"}"#) }),
        );
        let client = client_for(app, None).await;

        let result = client
            .get(ResourceKind::MemQuota, "lance-test", "handler-ratings")
            .await;

        assert!(matches!(
            result,
            Err(ResourceClientError::NotFound { kind: ResourceKind::MemQuota, .. })
        ));
    }

    #[tokio::test]
    async fn test_get_returns_body_and_sends_bearer_token() {
        let app = Router::new().route(
            &format!("{}/handler-ratings", MEMQUOTAS),
            get(|headers: HeaderMap| async move {
                match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                    Some("Bearer s3cret") => (HttpStatus::OK, r#"{"kind":"memquota"}"#),
                    _ => (HttpStatus::UNAUTHORIZED, "missing token"),
                }
            }),
        );
        let client = client_for(app, Some("s3cret")).await;

        let response = client
            .get(ResourceKind::MemQuota, "lance-test", "handler-ratings")
            .await
            .unwrap();

        assert!(response.is_ok());
        assert_eq!(response.body, br#"{"kind":"memquota"}"#.to_vec());
    }

    #[tokio::test]
    async fn test_get_aborts_on_error_status() {
        let app = Router::new().route(
            &format!("{}/handler-ratings", MEMQUOTAS),
            get(|| async { (HttpStatus::FORBIDDEN, "forbidden") }),
        );
        let client = client_for(app, None).await;

        let result = client
            .get(ResourceKind::MemQuota, "lance-test", "handler-ratings")
            .await;

        match result {
            Err(ResourceClientError::Status { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "forbidden");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_posts_to_collection_and_maps_conflict() {
        let app = Router::new().route(
            MEMQUOTAS,
            axum::routing::post(|body: String| async move {
                if body.contains("handler-ratings") {
                    (HttpStatus::CONFLICT, "already exists".to_string())
                } else {
                    (HttpStatus::CREATED, body)
                }
            }),
        );
        let client = client_for(app, None).await;

        let created = client
            .create(
                ResourceKind::MemQuota,
                "lance-test",
                "handler-details",
                br#"{"metadata":{"name":"handler-details"}}"#.to_vec(),
            )
            .await
            .unwrap();
        assert_eq!(created.status, 201);

        let conflict = client
            .create(
                ResourceKind::MemQuota,
                "lance-test",
                "handler-ratings",
                br#"{"metadata":{"name":"handler-ratings"}}"#.to_vec(),
            )
            .await;
        assert!(matches!(
            conflict,
            Err(ResourceClientError::Status { status: 409, .. })
        ));
    }

    #[tokio::test]
    async fn test_replace_puts_to_resource_and_maps_errors() {
        let app = Router::new()
            .route(
                &format!("{}/handler-ratings", MEMQUOTAS),
                axum::routing::put(|body: String| async move { (HttpStatus::OK, body) }),
            )
            .route(
                &format!("{}/handler-stale", MEMQUOTAS),
                axum::routing::put(|| async { (HttpStatus::CONFLICT, "stale resourceVersion") }),
            );
        let client = client_for(app, None).await;

        let replaced = client
            .replace(
                ResourceKind::MemQuota,
                "lance-test",
                "handler-ratings",
                br#"{"spec":{}}"#.to_vec(),
            )
            .await
            .unwrap();
        assert_eq!(replaced.body, br#"{"spec":{}}"#.to_vec());

        let stale = client
            .replace(ResourceKind::MemQuota, "lance-test", "handler-stale", b"{}".to_vec())
            .await;
        assert!(matches!(
            stale,
            Err(ResourceClientError::Status { status: 409, .. })
        ));
    }
}
