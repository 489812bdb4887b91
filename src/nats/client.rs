use anyhow::{Context, Result};
use async_nats::Client;
use tracing::{debug, info};

use super::messages::AttendanceMarkedMessage;
use crate::attendance::AttendanceRecord;

pub struct NatsClient {
    client: Client,
    session_id: String,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str, session_id: String) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client, session_id })
    }

    /// Publish a new attendance record
    pub async fn publish_marked(&self, subject: &str, record: &AttendanceRecord) -> Result<()> {
        let message = AttendanceMarkedMessage::new(&self.session_id, record);
        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .context("Failed to publish attendance record")?;

        debug!(
            "Published attendance to {} ({} at {})",
            subject, message.identity, message.time
        );

        Ok(())
    }

    /// Subscribe to recognition events from external recognizers
    pub async fn subscribe_recognitions(&self, subject: &str) -> Result<async_nats::Subscriber> {
        info!("Subscribing to recognitions on {}", subject);

        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .context("Failed to subscribe to recognitions")?;

        info!("Subscribed to {}", subject);

        Ok(subscriber)
    }
}
