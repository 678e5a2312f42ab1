use super::messages::{CommandMessage, DispatchReply, GreetingMessage};
use crate::config::NatsConfig;
use anyhow::{Context, Result};
use async_nats::Client;
use tracing::info;

pub struct NatsClient {
    client: Client,
    config: NatsConfig,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        info!("Connecting to NATS at {}", config.url);

        let client = async_nats::connect(&config.url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client, config })
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    /// Subscribe to transcript messages
    pub async fn subscribe_transcripts(&self) -> Result<async_nats::Subscriber> {
        // The STT service publishes partial and final transcripts for every
        // session; we filter by session_id in the message payload
        let subject = self.config.transcript_subject.clone();

        info!("Subscribing to transcripts on {}", subject);

        let subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .context("Failed to subscribe to transcripts")?;

        info!("Subscribed to {}", subject);

        Ok(subscriber)
    }

    /// Send a finalized utterance and wait for the handler's reply
    pub async fn request_command(&self, text: &str) -> Result<()> {
        let message = CommandMessage {
            session_id: self.config.session_id.clone(),
            text: text.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let subject = format!("{}.{}", self.config.command_subject, self.config.session_id);

        self.request(subject, serde_json::to_vec(&message)?).await
    }

    /// Ask the greeting handler to greet and wait for its reply
    pub async fn request_greeting(&self) -> Result<()> {
        let message = GreetingMessage {
            session_id: self.config.session_id.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let subject = format!("{}.{}", self.config.greeting_subject, self.config.session_id);

        self.request(subject, serde_json::to_vec(&message)?).await
    }

    async fn request(&self, subject: String, payload: Vec<u8>) -> Result<()> {
        let reply = self
            .client
            .request(subject.clone(), payload.into())
            .await
            .with_context(|| format!("Request on {} failed", subject))?;

        info!("Request on {} answered ({} bytes)", subject, reply.payload.len());

        check_reply(&reply.payload)
    }
}

/// Interpret a handler reply payload
pub(crate) fn check_reply(payload: &[u8]) -> Result<()> {
    if payload.is_empty() {
        return Ok(());
    }

    let reply: DispatchReply =
        serde_json::from_slice(payload).context("Failed to parse handler reply")?;

    match reply.error {
        Some(error) => anyhow::bail!("Handler reported an error: {}", error),
        None => Ok(()),
    }
}
