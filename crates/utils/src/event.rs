//! Inbound notification payload.
//!
//! Only `Records[0].ses.mail.messageId` is read, every other field of the
//! notification is ignored.

use serde::Deserialize;

use crate::RelayError;

/// Notification announcing newly archived messages.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<NotificationRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRecord {
    pub ses: SesRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SesRecord {
    pub mail: MailRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailRecord {
    #[serde(rename = "messageId")]
    pub message_id: String,
}

impl NotificationEvent {
    /// Parses a notification from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, RelayError> {
        serde_json::from_str(json).map_err(|e| RelayError::Event(e.to_string()))
    }

    /// Returns the identifier of the first announced message.
    pub fn message_id(&self) -> Result<&str, RelayError> {
        self.records
            .first()
            .map(|r| r.ses.mail.message_id.as_str())
            .ok_or_else(|| RelayError::Event("notification has no records".to_string()))
    }
}
