//! SMTP-backed mail service.
//!
//! Submits the already serialized MIME message through an SMTP relay,
//! typically the SMTP interface of a transactional email provider. The
//! envelope sender is the address part of the relay-safe `Source`.

use lettre::{
    address::Envelope,
    transport::smtp::{authentication::Credentials, response::Response},
    Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use tracing::{debug, error, info, warn};

use crate::{MailService, ServiceError, ServiceFuture, SmtpConfig};

/// Mail service relaying raw messages over SMTP.
pub struct SmtpMailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

impl std::fmt::Debug for SmtpMailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailService")
            .field("host", &self.host)
            .finish()
    }
}

impl SmtpMailService {
    /// Creates a new [`SmtpMailService`] from the SMTP configuration.
    pub fn new(config: &SmtpConfig) -> Result<Self, ServiceError> {
        let mut builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host).map_err(|e| {
                error!(host = %config.host, error = %e, "Failed to create SMTP transport");
                ServiceError::new(format!("Failed to create SMTP transport: {e}"))
            })?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };
        builder = builder.port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        info!(
            host = %config.host,
            port = config.port,
            starttls = config.starttls,
            "SMTP mail service initialized"
        );
        Ok(Self {
            transport: builder.build(),
            host: config.host.clone(),
        })
    }
}

impl MailService for SmtpMailService {
    fn send_raw<'a>(
        &'a self,
        source: &'a str,
        destinations: &'a [String],
        raw_data: &'a [u8],
    ) -> ServiceFuture<'a> {
        Box::pin(async move {
            let envelope = build_envelope(source, destinations)?;
            debug!(
                host = %self.host,
                source = %source,
                size = raw_data.len(),
                "Submitting message over SMTP"
            );
            let response = self
                .transport
                .send_raw(&envelope, raw_data)
                .await
                .map_err(|e| {
                    warn!(host = %self.host, error = %e, "SMTP submission failed");
                    ServiceError::new(e.to_string())
                })?;
            let message_id = message_id_from_response(&response);
            info!(host = %self.host, message_id = %message_id, "SMTP submission accepted");
            Ok(message_id)
        })
    }

    fn name(&self) -> &str {
        "smtp"
    }
}

/// Extracts the bare address out of a `Name <address>` mailbox.
///
/// ```rust
/// assert_eq!(mailrelay_utils::mailbox_address("Alice <a_at_x_dot_com_b@y.com>"), "a_at_x_dot_com_b@y.com");
/// assert_eq!(mailrelay_utils::mailbox_address("r@z.com"), "r@z.com");
/// ```
pub fn mailbox_address(mailbox: &str) -> &str {
    mailbox
        .trim()
        .strip_suffix('>')
        .and_then(|v| v.rsplit_once('<'))
        .map(|(_, address)| address.trim())
        .unwrap_or_else(|| mailbox.trim())
}

/// Builds the SMTP envelope for a relayed message.
pub fn build_envelope(source: &str, destinations: &[String]) -> Result<Envelope, ServiceError> {
    let from: Address = mailbox_address(source)
        .parse()
        .map_err(|e| ServiceError::new(format!("Illegal address: {source} ({e})")))?;
    let to = destinations
        .iter()
        .map(|d| {
            mailbox_address(d)
                .parse::<Address>()
                .map_err(|e| ServiceError::new(format!("Illegal address: {d} ({e})")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Envelope::new(Some(from), to).map_err(|e| ServiceError::new(e.to_string()))
}

/// Derives the provider message identifier from the final SMTP reply,
/// the last token of its first line (e.g. `250 Ok <id>`).
fn message_id_from_response(response: &Response) -> String {
    response
        .first_line()
        .and_then(|line| line.split_whitespace().last())
        .unwrap_or_default()
        .to_string()
}
