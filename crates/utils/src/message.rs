//! Core message types used throughout the relay pipeline.
//!
//! This module defines [`RawMessage`], the archived email exactly as it was
//! stored, [`ArchiveLocator`], the human-viewable link to it, and
//! [`ParsedMessage`], a structured view with the header fields the relay
//! needs and the top-level payload split into tagged [`MessagePart`]s.

use std::fmt::{self, Display};

use mailparse::{DispositionType, MailHeaderMap, ParsedMail};

use crate::{trim_line_break, TransformError};

/// Separator used when joining repeated address headers.
pub const ADDRESS_SEPARATOR: &str = ";";

/// The unmodified stored email, as fetched from the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage(Vec<u8>);

impl RawMessage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for RawMessage {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for RawMessage {
    fn from(raw: &str) -> Self {
        Self(raw.as_bytes().to_vec())
    }
}

/// Display URL pointing to where the raw message is archived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLocator(String);

impl ArchiveLocator {
    /// Builds the console URL for an object, in the form
    /// `<console_base>/<bucket>/<key>?region=<region>`.
    ///
    /// ```rust
    /// let locator = mailrelay_utils::ArchiveLocator::for_object(
    ///     "http://console.example.com/object",
    ///     "inbox",
    ///     "mail/m1",
    ///     "eu-west-1",
    /// );
    /// assert_eq!(locator.as_str(), "http://console.example.com/object/inbox/mail/m1?region=eu-west-1");
    /// ```
    pub fn for_object(console_base: &str, bucket: &str, key: &str, region: &str) -> Self {
        Self(format!(
            "{}/{bucket}/{key}?region={region}",
            console_base.trim_end_matches('/')
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ArchiveLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArchiveLocator {
    fn from(url: &str) -> Self {
        Self(url.to_string())
    }
}

/// A top-level part of a parsed message, classified once at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePart {
    /// The canonical human-readable content, possibly a
    /// `multipart/alternative` container forwarded as a whole.
    Body {
        content_type: String,
        /// Serialized part, its MIME headers followed by the encoded body.
        data: Vec<u8>,
    },
    /// A part whose content disposition marks it as an attachment.
    Attachment {
        filename: Option<String>,
        content_type: String,
        /// Serialized part, its MIME headers followed by the encoded body.
        data: Vec<u8>,
    },
}

impl MessagePart {
    /// Returns the serialized part, ready to be placed between boundaries.
    pub fn data(&self) -> &[u8] {
        match self {
            MessagePart::Body { data, .. } | MessagePart::Attachment { data, .. } => data,
        }
    }

    pub fn content_type(&self) -> &str {
        match self {
            MessagePart::Body { content_type, .. }
            | MessagePart::Attachment { content_type, .. } => content_type,
        }
    }

    /// Returns the attachment file name, if the part declares one.
    pub fn filename(&self) -> Option<&str> {
        match self {
            MessagePart::Body { .. } => None,
            MessagePart::Attachment { filename, .. } => filename.as_deref(),
        }
    }

    pub fn is_attachment(&self) -> bool {
        matches!(self, MessagePart::Attachment { .. })
    }
}

/// Structured view over a [`RawMessage`].
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    /// Decoded `From` header values, in order of appearance.
    pub from: Vec<String>,

    /// Decoded `To` header values, in order of appearance.
    pub to: Vec<String>,

    /// Decoded `Subject` header.
    pub subject: String,

    /// Primary body followed by the attachments, in their original order.
    pub parts: Vec<MessagePart>,
}

impl ParsedMessage {
    /// Parses raw bytes into a [`ParsedMessage`].
    ///
    /// Fails with [`TransformError::Malformed`] when the bytes are not a
    /// structured email or no primary body can be found, and with
    /// [`TransformError::MissingHeader`] when `From`, `To` or `Subject`
    /// are absent.
    pub fn parse(raw: &RawMessage) -> Result<Self, TransformError> {
        let mail = mailparse::parse_mail(raw.as_bytes())
            .map_err(|e| TransformError::Malformed(e.to_string()))?;
        if mail.headers.is_empty() {
            return Err(TransformError::Malformed(
                "message has no header section".to_string(),
            ));
        }

        let from = address_values(&mail, "From")?;
        let to = address_values(&mail, "To")?;
        let subject = mail
            .headers
            .get_first_value("Subject")
            .ok_or(TransformError::MissingHeader("Subject"))?;

        let mut parts = Vec::new();
        let body = primary_body(&mail)?;
        parts.push(MessagePart::Body {
            content_type: body.ctype.mimetype.clone(),
            data: if std::ptr::eq(body, &mail) {
                top_level_part(&mail)?
            } else {
                trim_line_break(body.raw_bytes).to_vec()
            },
        });

        if is_multipart(&mail) {
            for subpart in mail.subparts.iter().filter(|p| is_attachment(p)) {
                let disposition = subpart.get_content_disposition();
                parts.push(MessagePart::Attachment {
                    filename: disposition
                        .params
                        .get("filename")
                        .or_else(|| subpart.ctype.params.get("name"))
                        .cloned(),
                    content_type: subpart.ctype.mimetype.clone(),
                    data: trim_line_break(subpart.raw_bytes).to_vec(),
                });
            }
        }

        Ok(Self {
            from,
            to,
            subject,
            parts,
        })
    }

    /// Returns the `From` values normalized into an address list.
    pub fn from_list(&self) -> String {
        normalize_addresses(&self.from)
    }

    /// Returns the `To` values normalized into an address list.
    pub fn to_list(&self) -> String {
        normalize_addresses(&self.to)
    }

    /// Returns the primary body part.
    pub fn body(&self) -> Option<&MessagePart> {
        self.parts.iter().find(|p| !p.is_attachment())
    }

    /// Iterates over the attachment parts.
    pub fn attachments(&self) -> impl Iterator<Item = &MessagePart> {
        self.parts.iter().filter(|p| p.is_attachment())
    }
}

/// Joins header values with `;` and strips every angle bracket.
///
/// ```rust
/// let values = vec!["Alice <a@x.com>".to_string(), "<b@y.com>".to_string()];
/// assert_eq!(mailrelay_utils::normalize_addresses(&values), "Alice a@x.com;b@y.com");
/// ```
pub fn normalize_addresses(values: &[String]) -> String {
    values
        .join(ADDRESS_SEPARATOR)
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .collect()
}

/// Collects every value of an address header, requiring at least one
/// non-blank value.
fn address_values(
    mail: &ParsedMail<'_>,
    name: &'static str,
) -> Result<Vec<String>, TransformError> {
    let values = mail.headers.get_all_values(name);
    if values.iter().all(|v| v.trim().is_empty()) {
        return Err(TransformError::MissingHeader(name));
    }
    Ok(values)
}

fn is_multipart(part: &ParsedMail<'_>) -> bool {
    part.ctype.mimetype.starts_with("multipart/")
}

fn is_attachment(part: &ParsedMail<'_>) -> bool {
    part.get_content_disposition().disposition == DispositionType::Attachment
}

fn is_body_candidate(part: &ParsedMail<'_>) -> bool {
    !is_attachment(part) && (part.ctype.mimetype.starts_with("text/") || is_multipart(part))
}

/// Locates the primary body.
///
/// A `multipart/mixed` message yields its first non-attachment text or
/// multipart subpart; any other message is its own body, which forwards
/// `multipart/alternative` and `multipart/related` containers opaquely.
fn primary_body<'a, 'b>(mail: &'b ParsedMail<'a>) -> Result<&'b ParsedMail<'a>, TransformError> {
    if mail.ctype.mimetype == "multipart/mixed" {
        return mail
            .subparts
            .iter()
            .find(|p| is_body_candidate(p))
            .ok_or_else(|| TransformError::Malformed("no body part found".to_string()));
    }
    if !is_body_candidate(mail) {
        return Err(TransformError::Malformed(format!(
            "message of type {} has no body part",
            mail.ctype.mimetype
        )));
    }
    Ok(mail)
}

/// Serializes the top-level message as a part, carrying over only its
/// `Content-*` headers so the original envelope headers stay behind.
fn top_level_part(mail: &ParsedMail<'_>) -> Result<Vec<u8>, TransformError> {
    let (_, body_offset) = mailparse::parse_headers(mail.raw_bytes)
        .map_err(|e| TransformError::Malformed(e.to_string()))?;
    let mut data = Vec::with_capacity(mail.raw_bytes.len());
    for header in mail
        .headers
        .iter()
        .filter(|h| h.get_key_ref().to_ascii_lowercase().starts_with("content-"))
    {
        data.extend_from_slice(header.get_key_ref().as_bytes());
        data.extend_from_slice(b": ");
        data.extend_from_slice(header.get_value_raw());
        data.extend_from_slice(b"\r\n");
    }
    data.extend_from_slice(b"\r\n");
    data.extend_from_slice(trim_line_break(&mail.raw_bytes[body_offset..]));
    Ok(data)
}
