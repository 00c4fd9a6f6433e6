use reqwest::StatusCode;

use crate::{ModelConfig, ModelError};

/// Build the shared HTTP client for a backend
pub(crate) fn build_client(config: &ModelConfig) -> Result<reqwest::Client, ModelError> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|e| ModelError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Resolve the API key from config, then the environment
pub(crate) fn resolve_api_key(config: &ModelConfig, env_var: &str) -> Result<String, ModelError> {
    if let Some(ref key) = config.api_key {
        return Ok(key.clone());
    }
    match std::env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(ModelError::Auth(format!("{} is not set", env_var))),
    }
}

/// Map a non-success HTTP status to an error
pub(crate) fn status_error(status: StatusCode, body: String) -> ModelError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        ModelError::Auth(format!("HTTP {}: {}", status, body))
    } else {
        ModelError::Api {
            status: status.as_u16(),
            message: body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_is_auth_error() {
        let err = status_error(StatusCode::UNAUTHORIZED, "bad key".into());
        assert!(err.is_auth());

        let err = status_error(StatusCode::FORBIDDEN, String::new());
        assert!(err.is_auth());
    }

    #[test]
    fn test_server_error_is_api_error() {
        let err = status_error(StatusCode::BAD_GATEWAY, "upstream".into());
        assert!(matches!(err, ModelError::Api { status: 502, .. }));
    }

    #[test]
    fn test_explicit_key_wins() {
        let config = ModelConfig::default().with_api_key("sk-test".into());
        let key = resolve_api_key(&config, "STORYLOOP_TEST_UNSET_KEY").unwrap();
        assert_eq!(key, "sk-test");
    }

    #[test]
    fn test_missing_key_is_auth_error() {
        let config = ModelConfig::default();
        let err = resolve_api_key(&config, "STORYLOOP_TEST_DEFINITELY_UNSET").unwrap_err();
        assert!(err.is_auth());
    }
}
