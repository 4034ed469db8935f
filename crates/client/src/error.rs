use estate_cms_core::StoreError;
use reqwest::{Response, StatusCode};

use crate::config::ConfigError;

/// Errors raised while setting up the client. Request failures surface as
/// [`StoreError`] through the store traits.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("could not build HTTP client: {0}")]
    Build(#[from] reqwest::Error),

    #[error("API token contains characters not allowed in a header")]
    InvalidToken,
}

pub(crate) fn transport(err: reqwest::Error) -> StoreError {
    tracing::debug!("request failed: {err}");
    StoreError::Transport(err.to_string())
}

pub(crate) fn decode(err: reqwest::Error) -> StoreError {
    StoreError::Decode(err.to_string())
}

/// Pass 2xx responses through; turn anything else into `StoreError::Status`.
pub(crate) async fn ensure_success(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, body))
}

pub(crate) fn status_error(status: StatusCode, body: String) -> StoreError {
    StoreError::Status {
        status: status.as_u16(),
        body,
    }
}

/// Convenience type alias for client set-up.
pub type ClientResult<T> = Result<T, ClientError>;
