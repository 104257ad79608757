use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub istio: IstioConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

/// Connection and placement settings for the Istio policy store
#[derive(Debug, Clone)]
pub struct IstioConfig {
    /// Base URL of the API server (e.g. https://kubernetes.default.svc)
    pub api_server_url: String,
    /// API group of the policy resources
    pub api_group: String,
    /// API version of the policy resources
    pub api_version: String,
    /// Namespace all five policy resources are written to
    pub namespace: String,
    /// Namespace of the services referenced by the quota spec binding
    pub service_namespace: String,
    /// Bearer token sent with every request, if any
    pub bearer_token: Option<String>,
    /// Timeout applied to each remote call
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    /// Reads every section from the process environment; `.env` is loaded by the caller
    pub fn from_env() -> Result<Self, String> {
        Ok(Config {
            app: AppConfig::from_env()?,
            istio: IstioConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024; // 1MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl IstioConfig {
    const DEFAULT_API_SERVER_URL: &'static str = "https://kubernetes.default.svc";
    const DEFAULT_API_GROUP: &'static str = "config.istio.io";
    const DEFAULT_API_VERSION: &'static str = "v1alpha2";
    const DEFAULT_NAMESPACE: &'static str = "lance-test";
    const DEFAULT_SERVICE_NAMESPACE: &'static str = "default";
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

    pub fn from_env() -> Result<Self, String> {
        let api_server_url = env::var("ISTIO_API_URL")
            .unwrap_or_else(|_| Self::DEFAULT_API_SERVER_URL.to_string());

        let api_group =
            env::var("ISTIO_API_GROUP").unwrap_or_else(|_| Self::DEFAULT_API_GROUP.to_string());

        let api_version = env::var("ISTIO_API_VERSION")
            .unwrap_or_else(|_| Self::DEFAULT_API_VERSION.to_string());

        let namespace =
            env::var("ISTIO_NAMESPACE").unwrap_or_else(|_| Self::DEFAULT_NAMESPACE.to_string());

        let service_namespace = env::var("ISTIO_SERVICE_NAMESPACE")
            .unwrap_or_else(|_| Self::DEFAULT_SERVICE_NAMESPACE.to_string());

        // An explicit token wins over a mounted service account token
        let bearer_token = match env::var("ISTIO_API_TOKEN").ok().filter(|s| !s.is_empty()) {
            Some(token) => Some(token),
            None => match env::var("ISTIO_API_TOKEN_FILE").ok().filter(|s| !s.is_empty()) {
                Some(path) => Some(
                    std::fs::read_to_string(&path)
                        .map_err(|e| format!("Failed to read ISTIO_API_TOKEN_FILE {}: {}", path, e))?
                        .trim()
                        .to_string(),
                ),
                None => None,
            },
        };

        let request_timeout_secs = env::var("ISTIO_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "ISTIO_REQUEST_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            api_server_url,
            api_group,
            api_version,
            namespace,
            service_namespace,
            bearer_token,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    /// Value of the `apiVersion` field for policy objects
    pub fn api_version_string(&self) -> String {
        format!("{}/{}", self.api_group, self.api_version)
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title =
            env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Rate Limit Provisioner API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION").unwrap_or_else(|_| {
            "Provisions Istio quota policies for service rate limiting".to_string()
        });

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}
