use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timed out for {provider}")]
    Timeout { provider: String },

    #[error("Authentication failed: {details}")]
    AuthenticationFailed { provider: String, details: String },

    #[error("Rate limited by {provider}: {details}")]
    RateLimited { provider: String, details: String },

    #[error("Invalid request to {provider}: {details}")]
    InvalidRequest { provider: String, details: String },

    #[error("{provider} server error (Status: {status_code}): {details}")]
    ServerError {
        provider: String,
        status_code: u16,
        details: String,
    },

    #[error("Failed to parse response from {provider}: {details}")]
    ResponseParsingError { provider: String, details: String },

    #[error("API returned no candidates for {provider}")]
    NoCandidates { provider: String },

    #[error("Request blocked by {provider}: {details}")]
    RequestBlocked { provider: String, details: String },

    #[error("Unknown API error from {provider}: {details}")]
    Unknown { provider: String, details: String },
}

impl ApiError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_)
                | ApiError::Timeout { .. }
                | ApiError::RateLimited { .. }
                | ApiError::ServerError { .. }
        )
    }

    pub(crate) fn from_status(provider: &str, status: u16, details: String) -> Self {
        let provider = provider.to_string();
        match status {
            401 | 403 => ApiError::AuthenticationFailed { provider, details },
            429 => ApiError::RateLimited { provider, details },
            400 | 404 => ApiError::InvalidRequest { provider, details },
            500..=599 => ApiError::ServerError {
                provider,
                status_code: status,
                details,
            },
            _ => ApiError::Unknown { provider, details },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ApiError::from_status("google", 403, String::new()),
            ApiError::AuthenticationFailed { .. }
        ));
        assert!(ApiError::from_status("google", 429, String::new()).is_retryable());
        assert!(ApiError::from_status("google", 503, String::new()).is_retryable());
        assert!(!ApiError::from_status("google", 400, String::new()).is_retryable());
        assert!(!ApiError::from_status("google", 418, String::new()).is_retryable());
    }
}
