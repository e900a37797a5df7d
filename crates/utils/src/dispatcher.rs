use std::{fmt::Display, sync::Arc};

use tracing::{info, warn};

use crate::{MailService, OutboundMessage, RelayError};

/// Outcome of handing an [`OutboundMessage`] to the mail service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    /// The service accepted the message and assigned it an identifier.
    Sent { message_id: String },
    /// The service rejected or failed the send.
    Failed { reason: String },
}

impl DispatchResult {
    /// Converts the result into the service message identifier, mapping
    /// failures into [`RelayError::Dispatch`].
    pub fn into_result(self) -> Result<String, RelayError> {
        match self {
            DispatchResult::Sent { message_id } => Ok(message_id),
            DispatchResult::Failed { reason } => Err(RelayError::Dispatch(reason)),
        }
    }
}

impl Display for DispatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchResult::Sent { message_id } => write!(f, "Email sent! Message ID: {message_id}"),
            DispatchResult::Failed { reason } => f.write_str(reason),
        }
    }
}

/// Hands transformed messages to the outbound [`MailService`].
pub struct RelayDispatcher {
    service: Arc<dyn MailService>,
}

impl std::fmt::Debug for RelayDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayDispatcher")
            .field("service", &self.service.name())
            .finish()
    }
}

impl RelayDispatcher {
    pub fn new(service: Arc<dyn MailService>) -> Self {
        Self { service }
    }

    /// Sends the message, consuming it.
    pub async fn dispatch(&self, message: OutboundMessage) -> DispatchResult {
        let destinations = [message.destination];
        match self
            .service
            .send_raw(&message.source, &destinations, &message.data)
            .await
        {
            Ok(message_id) => {
                info!(
                    service = self.service.name(),
                    message_id = %message_id,
                    destination = %destinations[0],
                    "Dispatched message"
                );
                DispatchResult::Sent { message_id }
            }
            Err(e) => {
                warn!(
                    service = self.service.name(),
                    error = %e,
                    "Mail service rejected message"
                );
                DispatchResult::Failed {
                    reason: e.message().to_string(),
                }
            }
        }
    }
}
