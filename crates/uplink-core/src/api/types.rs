//! Wire types for the processing API (JSON contract).

use serde::Deserialize;

use crate::error::TransferError;

/// Response to `POST <base>/upload/start`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub job_id: String,
    /// Where to poll. May be absent or malformed; the caller then derives
    /// `<base>/upload/status/<jobId>`.
    #[serde(default)]
    pub status_url: Option<String>,
}

/// Response to one status poll.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub state: RemoteState,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteState {
    Processing,
    Done,
    Error,
}

pub fn parse_start_response(body: &[u8]) -> Result<StartResponse, TransferError> {
    serde_json::from_slice(body).map_err(|e| TransferError::Decode(e.to_string()))
}

pub fn parse_status_response(body: &[u8]) -> Result<StatusResponse, TransferError> {
    serde_json::from_slice(body).map_err(|e| TransferError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_response_parses() {
        let r = parse_start_response(
            br#"{"jobId":"j-17","statusUrl":"https://api.example.com/upload/status/j-17"}"#,
        )
        .unwrap();
        assert_eq!(r.job_id, "j-17");
        assert!(r.status_url.as_deref().unwrap().ends_with("/j-17"));
    }

    #[test]
    fn start_response_without_status_url() {
        let r = parse_start_response(br#"{"jobId":"j-17"}"#).unwrap();
        assert!(r.status_url.is_none());
    }

    #[test]
    fn status_response_states() {
        let r = parse_status_response(br#"{"state":"processing"}"#).unwrap();
        assert_eq!(r.state, RemoteState::Processing);

        let r = parse_status_response(br#"{"state":"done","url":"https://r/x"}"#).unwrap();
        assert_eq!(r.state, RemoteState::Done);
        assert_eq!(r.url.as_deref(), Some("https://r/x"));

        let r = parse_status_response(br#"{"state":"error","message":"disk full"}"#).unwrap();
        assert_eq!(r.state, RemoteState::Error);
        assert_eq!(r.message.as_deref(), Some("disk full"));
    }

    #[test]
    fn unknown_state_is_a_decode_error() {
        assert!(matches!(
            parse_status_response(br#"{"state":"paused"}"#),
            Err(TransferError::Decode(_))
        ));
    }

    #[test]
    fn non_json_body_is_a_decode_error() {
        assert!(matches!(
            parse_start_response(b"<html>oops</html>"),
            Err(TransferError::Decode(_))
        ));
    }
}
