//! Rewrites archived emails into forwardable messages.
//!
//! The [`MessageTransformer`] takes a [`RawMessage`] and its
//! [`ArchiveLocator`] and produces an [`OutboundMessage`]: a new
//! `multipart/mixed` container holding a provenance banner, the original
//! body and the original attachments, addressed from a relay-safe sender
//! to the configured recipient.

use std::{
    borrow::Cow,
    error::Error,
    fmt::{self, Display},
};

use lettre::{
    message::{Mailbox, MultiPart, SinglePart},
    Address, Message,
};
use tracing::debug;

use crate::{
    append_parts, unquote_phrase, AddressCodec, ArchiveLocator, BannerTemplate, EncodedSender,
    MessagePart, ParsedMessage, RawMessage,
};

/// Errors that can occur while transforming a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// The raw bytes could not be parsed as a structured email.
    Malformed(String),
    /// A required header is absent or holds no value.
    MissingHeader(&'static str),
    /// The relay sender or the recipient is not a valid mailbox.
    InvalidAddress(String),
    /// The outbound message could not be assembled.
    Serialize(String),
}

impl Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::Malformed(msg) => write!(f, "Malformed message: {msg}"),
            TransformError::MissingHeader(name) => write!(f, "Missing header: {name}"),
            TransformError::InvalidAddress(msg) => write!(f, "Invalid address: {msg}"),
            TransformError::Serialize(msg) => write!(f, "Failed to serialize message: {msg}"),
        }
    }
}

impl Error for TransformError {}

/// The reconstructed email package, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Relay-safe sender mailbox.
    pub source: String,

    /// The fixed forwarding recipient.
    pub destination: String,

    /// Fully serialized MIME message.
    pub data: Vec<u8>,
}

impl OutboundMessage {
    /// Returns the serialized message as text, replacing invalid UTF-8
    /// sequences coming from 8bit parts.
    pub fn data_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

/// Builds [`OutboundMessage`]s out of archived raw emails.
#[derive(Debug, Clone, Default)]
pub struct MessageTransformer {
    codec: AddressCodec,
    banner: BannerTemplate,
}

impl MessageTransformer {
    pub fn new(codec: AddressCodec, banner: BannerTemplate) -> Self {
        Self { codec, banner }
    }

    /// Transforms a raw message into an outbound message for `recipient`.
    ///
    /// The headers and the banner part are written by `lettre`, the body
    /// and the attachments follow the banner exactly as they were stored.
    pub fn transform(
        &self,
        raw: &RawMessage,
        locator: &ArchiveLocator,
        recipient: &str,
    ) -> Result<OutboundMessage, TransformError> {
        let parsed = ParsedMessage::parse(raw)?;
        let from_list = parsed.from_list();
        let to_address = parsed.to_list();

        let banner = self
            .banner
            .render(&from_list, &to_address, locator.as_str());
        let sender = self.codec.sender(&from_list, &to_address.replace(' ', "_"));
        let source = sender.to_string();

        let body = parsed
            .body()
            .ok_or_else(|| TransformError::Malformed("no body part found".to_string()))?;
        debug!(
            from = %from_list,
            to = %to_address,
            source = %source,
            body = body.content_type(),
            "Transforming message"
        );
        let attachments: Vec<&MessagePart> = parsed.attachments().collect();
        for attachment in &attachments {
            debug!(
                filename = attachment.filename().unwrap_or_default(),
                content_type = attachment.content_type(),
                size = attachment.data().len(),
                "Forwarding attachment"
            );
        }

        let container = MultiPart::mixed().singlepart(SinglePart::html(banner));
        let boundary = container.boundary();
        let message = Message::builder()
            .from(sender_mailbox(&sender)?)
            .to(recipient
                .parse::<Mailbox>()
                .map_err(|e| TransformError::InvalidAddress(format!("{recipient} ({e})")))?)
            .subject(parsed.subject.as_str())
            .multipart(container)
            .map_err(|e| TransformError::Serialize(e.to_string()))?;

        let forwarded = std::iter::once(body)
            .chain(attachments)
            .map(MessagePart::data);
        let data = append_parts(message.formatted(), &boundary, forwarded).ok_or_else(|| {
            TransformError::Serialize("multipart container is not terminated".to_string())
        })?;

        Ok(OutboundMessage {
            source,
            destination: recipient.to_string(),
            data,
        })
    }
}

/// Builds the `From` mailbox, leaving quoting and encoding of the display
/// name to `lettre`.
fn sender_mailbox(sender: &EncodedSender) -> Result<Mailbox, TransformError> {
    let address: Address = sender
        .address
        .parse()
        .map_err(|e| TransformError::InvalidAddress(format!("{} ({e})", sender.address)))?;
    Ok(Mailbox::new(
        sender.name.as_deref().map(unquote_phrase),
        address,
    ))
}
