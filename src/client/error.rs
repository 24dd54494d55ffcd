use derive_more::Display;
use reqwest::StatusCode;
use serde::Deserialize;

/// What a caller of the API sees when a request fails. Mapping is driven by
/// the HTTP status alone; the server's `detail` is kept when it sent one.
#[derive(Debug, Display)]
pub enum ClientError {
    /// 401; the session has already been cleared, the user must log in again
    #[display(fmt = "Session expired, please log in again")]
    SessionExpired,
    #[display(fmt = "{}", _0)]
    Forbidden(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "Server error ({}), please retry later", _0)]
    Server(u16),
    #[display(fmt = "{}", detail)]
    Api { status: u16, detail: String },
    #[display(fmt = "Network error: {}", _0)]
    Transport(reqwest::Error),
    #[display(fmt = "Unexpected response: {}", _0)]
    Decode(String),
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Transport(e)
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

impl ClientError {
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail)
            .filter(|d| !d.is_empty());

        match status {
            StatusCode::UNAUTHORIZED => ClientError::SessionExpired,
            StatusCode::FORBIDDEN => {
                ClientError::Forbidden(detail.unwrap_or_else(|| "Access denied".to_string()))
            }
            StatusCode::NOT_FOUND => {
                ClientError::NotFound(detail.unwrap_or_else(|| "Resource not found".to_string()))
            }
            s if s.is_server_error() => ClientError::Server(s.as_u16()),
            s => ClientError::Api {
                status: s.as_u16(),
                detail: detail.unwrap_or_else(|| {
                    s.canonical_reason().unwrap_or("Request failed").to_string()
                }),
            },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::SessionExpired => Some(401),
            ClientError::Forbidden(_) => Some(403),
            ClientError::NotFound(_) => Some(404),
            ClientError::Server(s) => Some(*s),
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(_) | ClientError::Decode(_) => None,
        }
    }

    /// The caller should go back to the login screen.
    pub fn requires_login(&self) -> bool {
        matches!(self, ClientError::SessionExpired)
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
