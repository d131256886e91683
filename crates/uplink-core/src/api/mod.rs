//! HTTP client for the remote processing API: trigger ("start") and status
//! polling, via libcurl. JSON over TLS, `X-Upload-Token` on every request.

pub mod poll;
mod types;

pub use types::{RemoteState, StartResponse, StatusResponse};

use std::time::Duration;

use url::Url;

use crate::error::TransferError;

/// Normalizes a configured base URL.
///
/// Users habitually paste the full `/upload` endpoint into the base-URL
/// field; strip one trailing `/upload` segment and trailing slashes so the
/// derived endpoints come out right.
pub fn normalize_base_url(base: &str) -> Result<String, TransferError> {
    let trimmed = base.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|e| TransferError::InvalidApiUrl {
        url: base.to_string(),
        detail: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(TransferError::InvalidApiUrl {
            url: base.to_string(),
            detail: format!("unsupported scheme {:?}", url.scheme()),
        });
    }

    let mut normalized = url.to_string();
    while normalized.ends_with('/') {
        normalized.pop();
    }
    if let Some(stripped) = normalized.strip_suffix("/upload") {
        normalized = stripped.to_string();
    }
    Ok(normalized)
}

/// Resolves where to poll: the server-supplied status URL when present and
/// absolute, else the derived `<base>/upload/status/<jobId>`.
pub fn resolve_status_url(base: &str, start: &StartResponse) -> String {
    if let Some(supplied) = &start.status_url {
        if Url::parse(supplied).is_ok() {
            return supplied.clone();
        }
    }
    format!("{}/upload/status/{}", base, start.job_id)
}

/// Client for the start/status endpoints of one run.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, TransferError> {
        Ok(Self {
            base: normalize_base_url(base_url)?,
            token: token.to_string(),
        })
    }

    /// Normalized base URL.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Triggers remote processing of `filename`. Success requires a 2xx
    /// status and a decodable `StartResponse` body.
    pub fn start(&self, filename: &str) -> Result<StartResponse, TransferError> {
        let endpoint = format!("{}/upload/start", self.base);
        let body = serde_json::json!({ "filename": filename }).to_string();
        let (code, response) = self.perform(&endpoint, Some(body.as_bytes()))?;
        if !(200..300).contains(&code) {
            return Err(TransferError::HttpStatus(code));
        }
        types::parse_start_response(&response)
    }

    /// Fetches one status snapshot from `status_url`.
    pub fn poll_status(&self, status_url: &str) -> Result<StatusResponse, TransferError> {
        let (code, response) = self.perform(status_url, None)?;
        if !(200..300).contains(&code) {
            return Err(TransferError::HttpStatus(code));
        }
        types::parse_status_response(&response)
    }

    /// One curl round trip. `body` present means POST JSON, absent means GET.
    /// Runs on the current thread; call from a blocking worker in async code.
    fn perform(&self, url: &str, body: Option<&[u8]>) -> Result<(u32, Vec<u8>), TransferError> {
        let mut out: Vec<u8> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(|e| TransferError::InvalidApiUrl {
            url: url.to_string(),
            detail: e.to_string(),
        })?;
        easy.follow_location(true).map_err(curl_setup_err)?;
        easy.connect_timeout(Duration::from_secs(15))
            .map_err(curl_setup_err)?;
        easy.timeout(Duration::from_secs(60)).map_err(curl_setup_err)?;

        let mut list = curl::easy::List::new();
        list.append(&format!("X-Upload-Token: {}", self.token))
            .map_err(curl_setup_err)?;
        if body.is_some() {
            list.append("Content-Type: application/json")
                .map_err(curl_setup_err)?;
        }
        easy.http_headers(list).map_err(curl_setup_err)?;

        if let Some(b) = body {
            easy.post(true).map_err(curl_setup_err)?;
            easy.post_fields_copy(b).map_err(curl_setup_err)?;
        }

        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    out.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(curl_setup_err)?;
            transfer
                .perform()
                .map_err(|e| TransferError::InvalidResponse(e.to_string()))?;
        }

        let code = easy
            .response_code()
            .map_err(|e| TransferError::InvalidResponse(e.to_string()))?;
        Ok((code, out))
    }
}

fn curl_setup_err(e: curl::Error) -> TransferError {
    TransferError::Other(format!("curl: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_strips_trailing_upload_segment() {
        assert_eq!(
            normalize_base_url("https://api.example.com/upload").unwrap(),
            "https://api.example.com"
        );
        assert_eq!(
            normalize_base_url("https://api.example.com/upload/").unwrap(),
            "https://api.example.com"
        );
    }

    #[test]
    fn base_url_plain_host_kept() {
        assert_eq!(
            normalize_base_url("https://api.example.com").unwrap(),
            "https://api.example.com"
        );
        assert_eq!(
            normalize_base_url("https://api.example.com/v2").unwrap(),
            "https://api.example.com/v2"
        );
    }

    #[test]
    fn base_url_rejects_garbage() {
        assert!(matches!(
            normalize_base_url("not a url"),
            Err(TransferError::InvalidApiUrl { .. })
        ));
        assert!(matches!(
            normalize_base_url("ftp://api.example.com"),
            Err(TransferError::InvalidApiUrl { .. })
        ));
    }

    #[test]
    fn status_url_prefers_server_supplied_absolute() {
        let start = StartResponse {
            job_id: "j1".into(),
            status_url: Some("https://other.example.com/s/j1".into()),
        };
        assert_eq!(
            resolve_status_url("https://api.example.com", &start),
            "https://other.example.com/s/j1"
        );
    }

    #[test]
    fn status_url_derived_when_missing_or_relative() {
        let missing = StartResponse {
            job_id: "j1".into(),
            status_url: None,
        };
        assert_eq!(
            resolve_status_url("https://api.example.com", &missing),
            "https://api.example.com/upload/status/j1"
        );

        let relative = StartResponse {
            job_id: "j2".into(),
            status_url: Some("/upload/status/j2".into()),
        };
        assert_eq!(
            resolve_status_url("https://api.example.com", &relative),
            "https://api.example.com/upload/status/j2"
        );
    }
}
