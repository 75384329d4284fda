use http::StatusCode;
use thiserror::Error;

/// Enumeration of errors raised while configuring an `EventClient` or delivering an event with it.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{0} is not a valid region, expected one of US or EU")]
    InvalidRegion(String),
    #[error("an api token is required when a region is configured")]
    MissingCredential,
    #[error("api token cannot be sent in an http header")]
    InvalidApiToken,
    #[error("error parsing endpoint url")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("user_id is required")]
    MissingUserId,

    #[error("pixel endpoint responded with {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },
    #[error("event could not be delivered to the pixel endpoint: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    /// The status code returned by the pixel endpoint, if the call got that far.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::HttpStatus { status, .. } => Some(*status),
            ClientError::Transport(error) => error.status(),
            _ => None,
        }
    }

    /// Label used when counting failed deliveries.
    pub(crate) fn reason(&self) -> &'static str {
        match self {
            ClientError::InvalidRegion(_)
            | ClientError::MissingCredential
            | ClientError::InvalidApiToken
            | ClientError::InvalidEndpoint(_) => "config",
            ClientError::MissingUserId => "missing_user_id",
            ClientError::HttpStatus { .. } => "http_status",
            ClientError::Transport(error) if error.is_timeout() => "timeout",
            ClientError::Transport(_) => "transport",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_carries_status_and_body() {
        let error = ClientError::HttpStatus {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".to_owned(),
        };

        assert_eq!(error.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(
            error.to_string(),
            "pixel endpoint responded with 500 Internal Server Error: boom"
        );
        assert_eq!(error.reason(), "http_status");
    }

    #[test]
    fn test_construction_errors_have_no_status() {
        assert_eq!(ClientError::MissingCredential.status(), None);
        assert_eq!(ClientError::InvalidRegion("APAC".to_owned()).status(), None);
        assert_eq!(ClientError::MissingUserId.reason(), "missing_user_id");
    }
}
