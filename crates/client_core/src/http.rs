use reqwest::Response;
use serde::de::DeserializeOwned;
use shared::error::ApiError;

use crate::error::ClientError;

/// Turns a non-2xx response into the normalized error shape. Bodies that are
/// not the backend's `{message, code?, time?}` payload fall back to a
/// generic message carrying the status code.
pub(crate) async fn api_error(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let fallback = ApiError::with_code(
        format!("request failed with status {status}"),
        i64::from(status),
    );
    let error = match response.bytes().await {
        Ok(bytes) if !bytes.is_empty() => {
            serde_json::from_slice(&bytes).unwrap_or(fallback)
        }
        _ => fallback,
    };
    ClientError::Api { status, error }
}

/// Decodes a 2xx body that must be present.
pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Decodes a 2xx body, treating an empty body as the type's default.
pub(crate) async fn decode_or_default<T: DeserializeOwned + Default>(
    response: Response,
) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Checks the status of a response whose body does not matter.
pub(crate) async fn expect_success(response: Response) -> Result<(), ClientError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(api_error(response).await)
    }
}

/// Base URLs are stored without a trailing slash so paths join cleanly.
pub(crate) fn normalize_base_url(base_url: impl Into<String>) -> String {
    let mut base_url = base_url.into();
    while base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}
