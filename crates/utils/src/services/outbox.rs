use std::sync::Mutex;

use crate::{MailService, ServiceError, ServiceFuture};

/// A message accepted by an [`OutboxMailService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub message_id: String,
    pub source: String,
    pub destinations: Vec<String>,
    pub raw_data: Vec<u8>,
}

/// Mail service that records every message instead of sending it.
///
/// Optionally rejects every send with a fixed provider message.
#[derive(Debug, Default)]
pub struct OutboxMailService {
    sent: Mutex<Vec<SentMessage>>,
    rejection: Option<String>,
}

impl OutboxMailService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an outbox that rejects every message with `message`.
    pub fn rejecting(message: impl Into<String>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            rejection: Some(message.into()),
        }
    }

    /// Returns a copy of the accepted messages, in send order.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl MailService for OutboxMailService {
    fn send_raw<'a>(
        &'a self,
        source: &'a str,
        destinations: &'a [String],
        raw_data: &'a [u8],
    ) -> ServiceFuture<'a> {
        Box::pin(async move {
            if let Some(message) = &self.rejection {
                return Err(ServiceError::new(message.clone()));
            }
            let mut sent = self
                .sent
                .lock()
                .map_err(|_| ServiceError::new("Outbox lock poisoned"))?;
            let message_id = format!("outbox-{}", sent.len() + 1);
            sent.push(SentMessage {
                message_id: message_id.clone(),
                source: source.to_string(),
                destinations: destinations.to_vec(),
                raw_data: raw_data.to_vec(),
            });
            Ok(message_id)
        })
    }

    fn name(&self) -> &str {
        "outbox"
    }
}
