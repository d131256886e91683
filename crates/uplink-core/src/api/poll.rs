//! Status poll loop: repeated fetches until `done`, `error`, or the cap.
//!
//! Generic over the fetch call so tests drive it without a server and at
//! zero interval.

use std::time::Duration;

use crate::control::CancelToken;
use crate::error::{PhaseFailure, TransferError};

use super::{RemoteState, StatusResponse};

/// Fixed spacing between poll attempts.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Maximum number of poll attempts (~10 minutes at the fixed interval).
pub const POLL_MAX_ATTEMPTS: u32 = 600;

/// Drives the poll loop until the server settles or the cap is exhausted.
///
/// `on_attempt` fires with the 1-based attempt number before each fetch so
/// the caller can advance progress. Returns the result URL on `done`;
/// `error` fails immediately with the server's message; running out of
/// attempts is a timeout.
pub fn poll_until_done<F>(
    mut fetch: F,
    interval: Duration,
    max_attempts: u32,
    cancel: &CancelToken,
    mut on_attempt: impl FnMut(u32),
) -> Result<String, PhaseFailure>
where
    F: FnMut() -> Result<StatusResponse, TransferError>,
{
    for attempt in 1..=max_attempts {
        cancel.checkpoint()?;
        on_attempt(attempt);
        let status = fetch()?;
        match status.state {
            RemoteState::Processing => {
                if attempt < max_attempts && !interval.is_zero() {
                    std::thread::sleep(interval);
                }
            }
            RemoteState::Done => {
                return match status.url {
                    Some(url) if !url.trim().is_empty() => Ok(url),
                    _ => Err(TransferError::DoneWithoutUrl.into()),
                };
            }
            RemoteState::Error => {
                return Err(TransferError::ServerError {
                    message: status.message,
                }
                .into());
            }
        }
    }
    Err(TransferError::PollTimeout.into())
}
