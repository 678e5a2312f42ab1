use super::client::NatsClient;
use crate::dispatch::{CommandDispatcher, GreetingDispatcher};
use anyhow::Result;
use std::sync::Arc;

/// Sends commands as NATS requests
pub struct NatsCommandDispatcher {
    client: Arc<NatsClient>,
}

impl NatsCommandDispatcher {
    pub fn new(client: Arc<NatsClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl CommandDispatcher for NatsCommandDispatcher {
    async fn dispatch(&self, command: &str) -> Result<()> {
        self.client.request_command(command).await
    }
}

/// Sends greeting requests over NATS
pub struct NatsGreetingDispatcher {
    client: Arc<NatsClient>,
}

impl NatsGreetingDispatcher {
    pub fn new(client: Arc<NatsClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl GreetingDispatcher for NatsGreetingDispatcher {
    async fn greet(&self) -> Result<()> {
        self.client.request_greeting().await
    }
}
