use std::{env, fs, path::Path};

use serde::Deserialize;

use crate::ArchiveLocator;

/// Process-wide relay configuration, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Bucket holding the archived raw emails.
    pub bucket: String,

    /// Optional key prefix, objects live under `{prefix}/{message_id}`.
    #[serde(default)]
    pub prefix: String,

    /// Fixed forwarding recipient.
    pub recipient: String,

    /// Service region, used in archive URLs and the default SMTP host.
    pub region: String,

    /// Base URL of the archive console.
    #[serde(default = "default_console_base")]
    pub console_base: String,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

/// Location of the archive mirror on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default = "default_archive_path")]
    pub path: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            path: default_archive_path(),
        }
    }
}

/// Outbound SMTP relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_true")]
    pub starttls: bool,
}

impl SmtpConfig {
    /// Returns the default SMTP endpoint for a service region.
    pub fn for_region(region: &str) -> Self {
        Self {
            host: format!("email-smtp.{region}.amazonaws.com"),
            port: default_smtp_port(),
            username: None,
            password: None,
            starttls: true,
        }
    }
}

impl RelayConfig {
    /// Loads the configuration from environment variables.
    ///
    /// `MailS3Bucket`, `MailRecipient` and `Region` are required,
    /// `MailS3Prefix`, `ConsoleBase`, `MailArchivePath` and the `Smtp*`
    /// variables are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let region = required("Region")?;
        let mut smtp = SmtpConfig::for_region(&region);
        if let Some(host) = lookup("SmtpHost").filter(|v| !v.is_empty()) {
            smtp.host = host;
        }
        if let Some(port) = lookup("SmtpPort").filter(|v| !v.is_empty()) {
            smtp.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid("SmtpPort", port))?;
        }
        if let Some(starttls) = lookup("SmtpStartTls").filter(|v| !v.is_empty()) {
            smtp.starttls = parse_bool(&starttls)
                .ok_or(ConfigError::Invalid("SmtpStartTls", starttls))?;
        }
        smtp.username = lookup("SmtpUsername").filter(|v| !v.is_empty());
        smtp.password = lookup("SmtpPassword").filter(|v| !v.is_empty());

        Ok(Self {
            bucket: required("MailS3Bucket")?,
            prefix: lookup("MailS3Prefix").unwrap_or_default(),
            recipient: required("MailRecipient")?,
            console_base: lookup("ConsoleBase")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default_console_base),
            archive: ArchiveConfig {
                path: lookup("MailArchivePath")
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(default_archive_path),
            },
            smtp: Some(smtp),
            region,
        })
    }

    /// Returns the object key of a message, `{prefix}/{message_id}` or the
    /// message identifier alone when no prefix is configured.
    pub fn object_key(&self, message_id: &str) -> String {
        if self.prefix.is_empty() {
            message_id.to_string()
        } else {
            format!("{}/{message_id}", self.prefix)
        }
    }

    /// Returns the console URL of an archived message.
    pub fn archive_url(&self, message_id: &str) -> ArchiveLocator {
        ArchiveLocator::for_object(
            &self.console_base,
            &self.bucket,
            &self.object_key(message_id),
            &self.region,
        )
    }

    /// Returns the SMTP configuration, defaulting to the region endpoint.
    pub fn smtp(&self) -> SmtpConfig {
        self.smtp
            .clone()
            .unwrap_or_else(|| SmtpConfig::for_region(&self.region))
    }
}

/// Loads configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Errors that can occur while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O error occurred reading the file.
    Io(std::io::Error),
    /// A parse error occurred deserializing TOML.
    Parse(toml::de::Error),
    /// A required variable is absent or empty.
    Missing(&'static str),
    /// A variable holds a value that cannot be interpreted.
    Invalid(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "Config parse error: {e}"),
            ConfigError::Missing(name) => write!(f, "Config variable missing: {name}"),
            ConfigError::Invalid(name, value) => {
                write!(f, "Config variable {name} has invalid value: {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn default_console_base() -> String {
    "http://s3.console.aws.amazon.com/s3/object".to_string()
}

fn default_archive_path() -> String {
    "archive".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_true() -> bool {
    true
}
