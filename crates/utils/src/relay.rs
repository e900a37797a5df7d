//! Orchestration of a single relay invocation.
//!
//! An invocation walks the linear stages `Start → Fetched → Transformed →
//! Dispatched → Done`. Any failure jumps straight to `Done` with the error
//! recorded and logged, nothing is retried and nothing is rolled back.

use std::{
    error::Error,
    fmt::{self, Display},
    sync::Arc,
};

use tracing::{error, info};

use crate::{
    DispatchResult, MailService, MessageTransformer, NotificationEvent, ObjectStore,
    RawMessage, RelayConfig, RelayDispatcher, StoreError, TransformError,
};

/// Result type for relay invocations.
pub type RelayResult<T> = Result<T, RelayError>;

/// Errors that terminate a relay invocation.
#[derive(Debug)]
pub enum RelayError {
    /// The notification payload could not be read.
    Event(String),
    /// The object store could not provide the raw message.
    Fetch(StoreError),
    /// The raw message could not be transformed.
    Transform(TransformError),
    /// The mail service rejected or failed the send.
    Dispatch(String),
}

impl Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Event(msg) => write!(f, "Event error: {msg}"),
            RelayError::Fetch(e) => write!(f, "Fetch error: {e}"),
            RelayError::Transform(e) => write!(f, "Transform error: {e}"),
            RelayError::Dispatch(msg) => write!(f, "Dispatch error: {msg}"),
        }
    }
}

impl Error for RelayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RelayError::Fetch(e) => Some(e),
            RelayError::Transform(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for RelayError {
    fn from(e: StoreError) -> Self {
        RelayError::Fetch(e)
    }
}

impl From<TransformError> for RelayError {
    fn from(e: TransformError) -> Self {
        RelayError::Transform(e)
    }
}

/// Stages of a relay invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Fetched,
    Transformed,
    Dispatched,
    Done,
}

impl Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Fetched => "fetched",
            Stage::Transformed => "transformed",
            Stage::Dispatched => "dispatched",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Record of a finished invocation.
#[derive(Debug)]
pub struct RelayReport {
    pub message_id: String,
    /// Last stage reached before `Done`.
    pub stage: Stage,
    pub outcome: RelayResult<String>,
}

/// Sequences fetch, transformation and dispatch for one message at a time.
pub struct Orchestrator {
    config: Arc<RelayConfig>,
    store: Arc<dyn ObjectStore>,
    transformer: MessageTransformer,
    dispatcher: RelayDispatcher,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("bucket", &self.config.bucket)
            .field("store", &self.store.name())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl Orchestrator {
    /// Creates a new [`Orchestrator`] with the default transformer.
    pub fn new(
        config: Arc<RelayConfig>,
        store: Arc<dyn ObjectStore>,
        service: Arc<dyn MailService>,
    ) -> Self {
        Self::with_transformer(config, store, service, MessageTransformer::default())
    }

    pub fn with_transformer(
        config: Arc<RelayConfig>,
        store: Arc<dyn ObjectStore>,
        service: Arc<dyn MailService>,
        transformer: MessageTransformer,
    ) -> Self {
        info!(
            bucket = %config.bucket,
            prefix = %config.prefix,
            recipient = %config.recipient,
            store = store.name(),
            service = service.name(),
            "Relay orchestrator initialized"
        );
        Self {
            config,
            store,
            transformer,
            dispatcher: RelayDispatcher::new(service),
        }
    }

    /// Handles a notification, relaying the message it announces.
    pub async fn handle_event(&self, event: &NotificationEvent) -> RelayResult<String> {
        let message_id = event.message_id().inspect_err(|e| {
            error!(error = %e, "Failed to read notification");
        })?;
        self.relay(message_id).await
    }

    /// Relays a single message, returning the service message identifier.
    pub async fn relay(&self, message_id: &str) -> RelayResult<String> {
        self.run(message_id).await.outcome
    }

    /// Relays a single message and reports the stage it reached.
    pub async fn run(&self, message_id: &str) -> RelayReport {
        info!(message_id = %message_id, "Received message ID {message_id}");
        let mut stage = Stage::Start;
        let outcome = self.advance(message_id, &mut stage).await;
        match &outcome {
            Ok(service_id) => info!(
                message_id = %message_id,
                service_message_id = %service_id,
                stage = %Stage::Done,
                "{}",
                DispatchResult::Sent {
                    message_id: service_id.clone()
                }
            ),
            Err(e) => error!(
                message_id = %message_id,
                stage = %stage,
                error = %e,
                "Relay failed"
            ),
        }
        RelayReport {
            message_id: message_id.to_string(),
            stage,
            outcome,
        }
    }

    async fn advance(&self, message_id: &str, stage: &mut Stage) -> RelayResult<String> {
        let key = self.config.object_key(message_id);
        let raw = RawMessage::new(self.store.fetch(&self.config.bucket, &key).await?);
        *stage = Stage::Fetched;
        info!(message_id = %message_id, key = %key, size = raw.len(), "Fetched raw message");

        let locator = self.config.archive_url(message_id);
        let outbound = self
            .transformer
            .transform(&raw, &locator, &self.config.recipient)?;
        *stage = Stage::Transformed;
        info!(
            message_id = %message_id,
            source = %outbound.source,
            destination = %outbound.destination,
            "Transformed message"
        );

        let result = self.dispatcher.dispatch(outbound).await;
        *stage = Stage::Dispatched;
        result.into_result()
    }
}
