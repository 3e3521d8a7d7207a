use thiserror::Error;

#[derive(Debug, Error)]
/// Enumerates failures returned by external service clients.
pub enum ServiceError {
    #[error("{service} credential '{name}' is missing")]
    MissingCredential {
        service: &'static str,
        name: &'static str,
    },
    #[error("{service} client setup failed: {message}")]
    Setup {
        service: &'static str,
        message: String,
    },
    #[error("{service} {operation} request failed: {source}")]
    Transport {
        service: &'static str,
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service} {operation} failed with status {status}: {body}")]
    Status {
        service: &'static str,
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("{service} {operation} returned an unexpected payload: {message}")]
    InvalidResponse {
        service: &'static str,
        operation: &'static str,
        message: String,
    },
    #[error("{service} {operation}: not found ({message})")]
    NotFound {
        service: &'static str,
        operation: &'static str,
        message: String,
    },
}

impl ServiceError {
    /// True for the not-found class: explicit `NotFound` or an HTTP 404.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Status { status: 404, .. }
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::ServiceError;

    #[test]
    fn unit_is_not_found_covers_explicit_and_http_404() {
        let explicit = ServiceError::NotFound {
            service: "github",
            operation: "create repository from template",
            message: "template missing".to_string(),
        };
        let http = ServiceError::Status {
            service: "vercel",
            operation: "get project",
            status: 404,
            body: "{}".to_string(),
        };
        let conflict = ServiceError::Status {
            service: "vercel",
            operation: "create project",
            status: 409,
            body: "exists".to_string(),
        };
        assert!(explicit.is_not_found());
        assert!(http.is_not_found());
        assert!(!conflict.is_not_found());
        assert_eq!(conflict.status(), Some(409));
    }

    #[test]
    fn unit_status_error_renders_operation_and_body() {
        let error = ServiceError::Status {
            service: "elevenlabs",
            operation: "create agent",
            status: 422,
            body: "bad voice".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "elevenlabs create agent failed with status 422: bad voice"
        );
    }
}
