//! HTTP client wrapper for downloading source modules.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::{HTTP_TIMEOUT_SECS, MAX_RESPONSE_SIZE};
use crate::error::{MergerError, Result};

/// User agent string identifying this merger.
const USER_AGENT: &str = concat!("sgmodule-merger/", env!("CARGO_PKG_VERSION"));

/// Create a configured HTTP client.
///
/// # Returns
/// A `reqwest::blocking::Client` configured with a fixed timeout and user agent.
pub fn create_client() -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Download a text resource with a single GET.
///
/// Non-success statuses are errors. There is no retry: a failing source is
/// skipped by the caller.
pub fn download_text(client: &Client, url: &str) -> Result<String> {
    let response = client.get(url).send()?.error_for_status()?;

    if let Some(length) = response.content_length() {
        check_size(url, length)?;
    }

    let bytes = response.bytes()?;
    check_size(url, bytes.len() as u64)?;

    Ok(bytes_to_string(&bytes, url))
}

/// Reject bodies over [`MAX_RESPONSE_SIZE`], whether declared or received.
fn check_size(url: &str, size: u64) -> Result<()> {
    if size > MAX_RESPONSE_SIZE {
        return Err(MergerError::ResponseTooLarge {
            url: url.to_string(),
            size,
            max: MAX_RESPONSE_SIZE,
        });
    }
    Ok(())
}

/// Decode a response body as UTF-8, replacing invalid sequences.
pub fn bytes_to_string(bytes: &[u8], what: &str) -> String {
    match String::from_utf8(bytes.to_vec()) {
        Ok(text) => text,
        Err(_) => {
            tracing::warn!(source = what, "Response is not valid UTF-8, replacing invalid bytes");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}
