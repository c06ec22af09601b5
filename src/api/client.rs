use crate::clock::{now_millis, now_seconds, LogicalClock};
use crate::model::MessageRecord;
use crate::transport::{self, Subscription, Transport, TransportError};
use crate::wire::{self, ClientReply, ClientRequest, DecodeError, Delivery};
use std::sync::Arc;
use tokio::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Server unreachable: {0}")]
    Transport(#[from] TransportError),

    #[error("Undecodable reply: {0}")]
    Decode(#[from] DecodeError),

    #[error("Server rejected '{service}' request: {description}")]
    Rejected { service: String, description: String },

    #[error("Server answered '{0}' request with an unexpected reply")]
    UnexpectedReply(&'static str),
}

/// ChatClient talks to one chat server over the shared transport. Like every participant it
/// keeps its own logical clock, stamping requests with it and observing every reply.
pub struct ChatClient {
    transport: Arc<dyn Transport>,
    server_address: String,
    request_timeout: Duration,
    clock: LogicalClock,
}

impl ChatClient {
    pub fn new(transport: Arc<dyn Transport>, server_name: &str, request_timeout: Duration) -> Self {
        ChatClient {
            transport,
            server_address: transport::client_address(server_name),
            request_timeout,
            clock: LogicalClock::new(),
        }
    }

    pub fn clock(&self) -> u64 {
        self.clock.current()
    }

    pub async fn login(&mut self, user: &str) -> Result<(), ClientError> {
        let request = ClientRequest::Login {
            user: user.to_string(),
            timestamp: now_seconds(),
            clock: self.clock.tick(),
        };
        self.call_for_status(request).await
    }

    pub async fn users(&mut self) -> Result<Vec<String>, ClientError> {
        let request = ClientRequest::Users {
            timestamp: now_seconds(),
            clock: self.clock.tick(),
        };
        self.call_for_names(request).await
    }

    pub async fn create_channel(&mut self, channel: &str) -> Result<(), ClientError> {
        let request = ClientRequest::Channel {
            channel: channel.to_string(),
            timestamp: now_seconds(),
            clock: self.clock.tick(),
        };
        self.call_for_status(request).await
    }

    pub async fn channels(&mut self) -> Result<Vec<String>, ClientError> {
        let request = ClientRequest::Channels {
            timestamp: now_seconds(),
            clock: self.clock.tick(),
        };
        self.call_for_names(request).await
    }

    pub async fn publish(&mut self, user: &str, channel: &str, message: &str) -> Result<(), ClientError> {
        let request = ClientRequest::Publish {
            user: user.to_string(),
            channel: channel.to_string(),
            message: message.to_string(),
            timestamp: now_millis(),
            clock: self.clock.tick(),
        };
        self.call_for_status(request).await
    }

    pub async fn message(&mut self, src: &str, dst: &str, message: &str) -> Result<(), ClientError> {
        let request = ClientRequest::Message {
            src: src.to_string(),
            dst: dst.to_string(),
            message: message.to_string(),
            timestamp: now_millis(),
            clock: self.clock.tick(),
        };
        self.call_for_status(request).await
    }

    /// Subscribe to messages delivered on a channel, or to a user's direct messages.
    pub fn subscribe(&self, channel_or_user: &str) -> DeliveryStream {
        DeliveryStream {
            subscription: self.transport.subscribe(&transport::delivery_topic(channel_or_user)),
        }
    }

    async fn call_for_status(&mut self, request: ClientRequest) -> Result<(), ClientError> {
        let service = request.service_name();
        match self.call(request).await? {
            ClientReply::Status { .. } => Ok(()),
            _ => Err(ClientError::UnexpectedReply(service)),
        }
    }

    async fn call_for_names(&mut self, request: ClientRequest) -> Result<Vec<String>, ClientError> {
        let service = request.service_name();
        match self.call(request).await? {
            ClientReply::Names { names, .. } => Ok(names),
            _ => Err(ClientError::UnexpectedReply(service)),
        }
    }

    async fn call(&mut self, request: ClientRequest) -> Result<ClientReply, ClientError> {
        let reply_bytes = transport::request_with_timeout(
            self.transport.as_ref(),
            &self.server_address,
            wire::encode(&request),
            self.request_timeout,
        )
        .await?;
        let reply = wire::decode::<ClientReply>(&reply_bytes)?;
        self.clock.observe(reply.clock());

        match reply {
            ClientReply::Error(error) => Err(ClientError::Rejected {
                service: error.service,
                description: error.description,
            }),
            reply => Ok(reply),
        }
    }
}

/// Messages delivered on one channel or to one user, as published by any server.
pub struct DeliveryStream {
    subscription: Box<dyn Subscription>,
}

impl DeliveryStream {
    pub async fn next(&mut self) -> Result<MessageRecord, ClientError> {
        let payload = self.subscription.next().await?;
        let Delivery(record) = wire::decode(&payload)?;

        Ok(record)
    }
}
