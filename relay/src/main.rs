use std::{env, error::Error, path::PathBuf, sync::Arc};

use mailrelay_utils::{
    load_config, logging, DispatchResult, FileObjectStore, NotificationEvent, Orchestrator,
    RelayConfig, SmtpMailService,
};
use tokio::io::AsyncReadExt;
use tracing::{error, info};

/// Environment variable pointing at an optional TOML configuration file.
const CONFIG_VAR: &str = "MAILRELAY_CONFIG";

/// Relays the message announced by a single notification.
///
/// The notification JSON is read from the file given as first argument,
/// or from the standard input when no argument is given. Configuration
/// comes from the TOML file named by `MAILRELAY_CONFIG` or, when unset,
/// from the environment.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let config = Arc::new(load().inspect_err(|e| {
        error!(error = %e, "Failed to load configuration");
    })?);
    let store = Arc::new(FileObjectStore::new(PathBuf::from(&config.archive.path)));
    let service = Arc::new(SmtpMailService::new(&config.smtp())?);
    let orchestrator = Orchestrator::new(config, store, service);

    let payload = read_event(env::args().nth(1)).await?;
    let event = NotificationEvent::from_json(&payload).inspect_err(|e| {
        error!(error = %e, "Failed to parse notification");
    })?;

    let message_id = orchestrator.handle_event(&event).await?;
    println!("{}", DispatchResult::Sent { message_id });
    Ok(())
}

fn load() -> Result<RelayConfig, Box<dyn Error>> {
    match env::var(CONFIG_VAR) {
        Ok(path) if !path.is_empty() => {
            info!(path = %path, "Loading configuration file");
            Ok(load_config(&PathBuf::from(path))?)
        }
        _ => Ok(RelayConfig::from_env()?),
    }
}

async fn read_event(path: Option<String>) -> std::io::Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path).await,
        None => {
            let mut payload = String::new();
            tokio::io::stdin().read_to_string(&mut payload).await?;
            Ok(payload)
        }
    }
}
