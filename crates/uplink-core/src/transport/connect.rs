//! Connection setup: resolve, TCP connect, handshake, auth, SFTP subsystem.
//!
//! Each step maps to its own error kind so a failure points at the exact
//! stage. The session owns the TCP stream; dropping `SftpConnection` closes
//! everything on every exit path, including cancellation unwinds.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use ssh2::{Session, Sftp};

use crate::config::SettingsSnapshot;
use crate::control::CancelToken;
use crate::error::{PhaseFailure, TransferError};

use super::host::normalize_host;

/// An authenticated SFTP session.
pub struct SftpConnection {
    session: Session,
    sftp: Sftp,
}

impl SftpConnection {
    /// Runs the full setup sequence: normalize host, resolve, connect to the
    /// first reachable address, handshake, password auth, SFTP init.
    pub fn open(
        settings: &SettingsSnapshot,
        cancel: &CancelToken,
    ) -> Result<Self, PhaseFailure> {
        super::validate_settings(settings)?;
        let host = normalize_host(&settings.host)?;

        let addrs: Vec<SocketAddr> = (host.as_str(), settings.port)
            .to_socket_addrs()
            .map_err(|e| TransferError::DnsFailure {
                host: host.clone(),
                detail: e.to_string(),
            })?
            .collect();
        if addrs.is_empty() {
            return Err(TransferError::DnsFailure {
                host,
                detail: "resolver returned no addresses".to_string(),
            }
            .into());
        }

        let mut tcp: Option<TcpStream> = None;
        let mut connect_detail = String::new();
        for addr in &addrs {
            cancel.checkpoint()?;
            match TcpStream::connect(addr) {
                Ok(stream) => {
                    tcp = Some(stream);
                    break;
                }
                Err(e) => connect_detail = format!("{}: {}", addr, e),
            }
        }
        let Some(tcp) = tcp else {
            return Err(TransferError::ConnectFailure {
                addr: format!("{}:{}", host, settings.port),
                detail: connect_detail,
            }
            .into());
        };

        cancel.checkpoint()?;
        let mut session = Session::new()
            .map_err(|e| TransferError::Other(format!("session init: {}", e)))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| TransferError::HandshakeFailure {
                host: host.clone(),
                detail: e.to_string(),
            })?;

        cancel.checkpoint()?;
        session
            .userauth_password(&settings.username, &settings.password)
            .map_err(|e| TransferError::AuthFailure {
                username: settings.username.clone(),
                detail: e.to_string(),
            })?;
        if !session.authenticated() {
            return Err(TransferError::AuthFailure {
                username: settings.username.clone(),
                detail: "server rejected password".to_string(),
            }
            .into());
        }

        cancel.checkpoint()?;
        let sftp = session
            .sftp()
            .map_err(|e| TransferError::SubsystemFailure(e.to_string()))?;

        tracing::debug!(host = %host, port = settings.port, "SFTP session established");
        Ok(Self { session, sftp })
    }

    pub fn sftp(&self) -> &Sftp {
        &self.sftp
    }

    /// Best-effort orderly disconnect; Drop covers the rest.
    pub fn close(self) {
        let _ = self.session.disconnect(None, "done", None);
    }
}
