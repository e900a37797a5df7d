//! Concrete [`MailService`](crate::MailService) implementations.
//!
//! Contains [`SmtpMailService`], submitting messages through an SMTP relay
//! endpoint, and [`OutboxMailService`], which keeps sent messages in memory.

pub mod outbox;
pub mod smtp;

pub use outbox::*;
pub use smtp::*;
