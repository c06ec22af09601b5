use crate::clock::{now_seconds, LogicalClock};
use crate::model::RosterEntry;
use crate::transport::{self, Transport, TransportError};
use crate::wire::{self, DecodeError, DirectoryReply, DirectoryRequest};
use std::sync::Arc;
use tokio::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Directory unreachable: {0}")]
    Transport(#[from] TransportError),

    #[error("Undecodable directory reply: {0}")]
    Decode(#[from] DecodeError),

    #[error("Directory rejected '{service}' request: {description}")]
    Rejected {
        service: String,
        description: String,
        clock: u64,
    },

    #[error("Directory answered '{0}' request with a reply for another service")]
    UnexpectedReply(&'static str),
}

impl DirectoryError {
    /// Clock carried by the reply, if the directory replied at all.
    pub(crate) fn reply_clock(&self) -> Option<u64> {
        match self {
            DirectoryError::Rejected { clock, .. } => Some(*clock),
            _ => None,
        }
    }
}

/// A successful directory reply along with the clock it carried. The caller observes the clock.
#[derive(Debug)]
pub(crate) struct DirectoryResponse<T> {
    pub value: T,
    pub clock: u64,
}

/// PeerDirectoryClient talks to the rank authority. Every call opens its own short-lived
/// request, so concurrent callers never share a socket.
#[derive(Clone)]
pub(crate) struct PeerDirectoryClient {
    logger: slog::Logger,
    transport: Arc<dyn Transport>,
    request_timeout: Duration,
}

impl PeerDirectoryClient {
    pub(crate) fn new(logger: slog::Logger, transport: Arc<dyn Transport>, request_timeout: Duration) -> Self {
        PeerDirectoryClient {
            logger,
            transport,
            request_timeout,
        }
    }

    /// Register `name` and return its rank, retrying up to `attempts` times. The clock is ticked
    /// for each attempt and observes the reply.
    pub(crate) async fn register(
        &self,
        name: &str,
        clock: &mut LogicalClock,
        attempts: u32,
    ) -> Result<u64, DirectoryError> {
        let mut last_error = None;
        for attempt in 1..=attempts {
            let request = DirectoryRequest::Rank {
                name: name.to_string(),
                timestamp: now_seconds(),
                clock: clock.tick(),
            };
            match self.call(request).await {
                Ok(DirectoryReply::Rank { rank, clock: reply_clock, .. }) => {
                    clock.observe(reply_clock);
                    slog::info!(self.logger, "Registered '{}' with rank {}", name, rank);
                    return Ok(rank);
                }
                Ok(DirectoryReply::Error(error)) => {
                    clock.observe(error.clock);
                    last_error = Some(DirectoryError::Rejected {
                        service: error.service,
                        description: error.description,
                        clock: error.clock,
                    });
                }
                Ok(_) => last_error = Some(DirectoryError::UnexpectedReply("rank")),
                Err(e) => last_error = Some(e),
            }

            slog::warn!(
                self.logger,
                "Registration attempt {}/{} failed: {:?}",
                attempt,
                attempts,
                last_error
            );
        }

        Err(last_error.unwrap_or(DirectoryError::Transport(TransportError::Closed)))
    }

    /// Fetch the roster. `clock` is the already ticked value to send.
    pub(crate) async fn roster(&self, clock: u64) -> Result<DirectoryResponse<Vec<RosterEntry>>, DirectoryError> {
        let request = DirectoryRequest::List {
            timestamp: now_seconds(),
            clock,
        };
        match self.call(request).await? {
            DirectoryReply::List { roster, clock, .. } => Ok(DirectoryResponse { value: roster, clock }),
            reply => Err(unexpected(reply, "list")),
        }
    }

    pub(crate) async fn heartbeat(&self, name: &str, clock: u64) -> Result<DirectoryResponse<()>, DirectoryError> {
        let request = DirectoryRequest::Heartbeat {
            name: name.to_string(),
            timestamp: now_seconds(),
            clock,
        };
        match self.call(request).await? {
            DirectoryReply::Heartbeat { clock, .. } => Ok(DirectoryResponse { value: (), clock }),
            reply => Err(unexpected(reply, "heartbeat")),
        }
    }

    async fn call(&self, request: DirectoryRequest) -> Result<DirectoryReply, DirectoryError> {
        slog::debug!(self.logger, "ClientWire - {:?}", request);
        let reply_bytes = transport::request_with_timeout(
            self.transport.as_ref(),
            transport::DIRECTORY_ADDRESS,
            wire::encode(&request),
            self.request_timeout,
        )
        .await?;
        let reply = wire::decode::<DirectoryReply>(&reply_bytes)?;
        slog::debug!(self.logger, "ClientWire - {:?}", reply);

        Ok(reply)
    }
}

fn unexpected(reply: DirectoryReply, service: &'static str) -> DirectoryError {
    match reply {
        DirectoryReply::Error(error) => DirectoryError::Rejected {
            service: error.service,
            description: error.description,
            clock: error.clock,
        },
        _ => DirectoryError::UnexpectedReply(service),
    }
}
