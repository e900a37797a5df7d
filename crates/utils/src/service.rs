use std::{error::Error, fmt::Display, future::Future, pin::Pin};

/// Boxed future type for mail service operations, enabling object safety.
///
/// Resolves to the service-assigned message identifier.
pub type ServiceFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, ServiceError>> + Send + 'a>>;

/// Failure reported by the outbound mail service.
///
/// Carries the provider's human-readable message, which is surfaced
/// verbatim as the dispatch failure reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError(pub String);

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for ServiceError {}

/// Trait for transactional mail services able to send pre-built MIME messages.
pub trait MailService: Send + Sync {
    /// Sends `raw_data` from `source` to every address in `destinations`.
    fn send_raw<'a>(
        &'a self,
        source: &'a str,
        destinations: &'a [String],
        raw_data: &'a [u8],
    ) -> ServiceFuture<'a>;

    /// Returns the name of this service.
    fn name(&self) -> &str;
}
