use super::client::NatsClient;
use super::messages::TranscriptMessage;
use crate::engine::{EngineEvent, RecognitionEngine, RecognitionResult};
use anyhow::Result;
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Recognition engine fed by an STT service publishing transcripts on NATS
pub struct NatsRecognitionEngine {
    client: Arc<NatsClient>,
    task: Option<JoinHandle<()>>,
}

impl NatsRecognitionEngine {
    pub fn new(client: Arc<NatsClient>) -> Self {
        Self { client, task: None }
    }
}

/// Map a transcript message to an engine result, if it belongs to `session_id`
pub(crate) fn to_result(message: TranscriptMessage, session_id: &str) -> Option<RecognitionResult> {
    if message.session_id != session_id {
        return None;
    }

    Some(RecognitionResult {
        text: message.text,
        is_final: !message.partial,
        alternatives: message.alternatives,
    })
}

#[async_trait::async_trait]
impl RecognitionEngine for NatsRecognitionEngine {
    async fn start(&mut self) -> Result<mpsc::Receiver<EngineEvent>> {
        if self.task.as_ref().is_some_and(|t| !t.is_finished()) {
            anyhow::bail!("Recognition already running");
        }

        let mut subscriber = self.client.subscribe_transcripts().await?;
        let session_id = self.client.session_id().to_string();
        let (tx, rx) = mpsc::channel(64);

        let task = tokio::spawn(async move {
            info!("Transcript receiving task started");

            if tx.send(EngineEvent::Started).await.is_err() {
                return;
            }

            while let Some(msg) = subscriber.next().await {
                // Parse transcript message
                let result = match serde_json::from_slice::<TranscriptMessage>(&msg.payload) {
                    Ok(transcript) => to_result(transcript, &session_id),
                    Err(e) => {
                        warn!("Failed to parse transcript message: {}", e);
                        continue;
                    }
                };

                if let Some(result) = result {
                    debug!("Transcript (final={}): {}", result.is_final, result.text);
                    if tx.send(EngineEvent::Result(vec![result])).await.is_err() {
                        // Session stopped listening to this run
                        return;
                    }
                }
            }

            info!("Transcript subscription closed");
            let _ = tx.send(EngineEvent::Ended).await;
        });

        self.task = Some(task);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            // Dropping the subscriber unsubscribes
            task.abort();
            info!("Transcript receiving task stopped");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "nats"
    }
}
