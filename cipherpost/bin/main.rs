use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use cipherpost::config::Config;
use cipherpost::message::MailMessage;
use cipherpost::{Keyring, logging};

#[derive(Debug, Parser)]
#[command(
    name = "cipherpost",
    version,
    about = "Send a message as an individually OpenPGP-encrypted email to every recipient in the configuration"
)]
struct Cli {
    /// File containing the mail subject and body.
    #[arg(value_name = "MAIL")]
    mail: PathBuf,

    /// Configuration file to use (one per newsletter you maintain).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    match run(Cli::parse()).await {
        // Best-effort batch: completed, everyone resolvable was sent to.
        Ok(true) => ExitCode::SUCCESS,
        // Completed, but some recipients were skipped or failed.
        Ok(false) => ExitCode::from(1),
        // Fatal before any delivery was attempted.
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config_path = match cli.config {
        Some(path) if path.exists() => path,
        Some(path) => anyhow::bail!("config file does not exist: {}", path.display()),
        None => find_config_file()?,
    };

    let config = Config::load(&config_path)?;
    let message = MailMessage::load(&cli.mail)?;

    let secret =
        rpassword::prompt_password(format!("Please insert the password for {}: ", config.user))?;
    let config = config.with_secret(secret);

    let keyring = Keyring::from_file(&config.keyring)?;

    let result = cipherpost::run(&config, &message, &keyring).await;

    for (recipient, outcome) in result.failures() {
        warn!("{recipient}: {outcome}");
    }
    info!(
        "delivered to {} of {} recipient(s)",
        result.sent(),
        result.len()
    );

    Ok(result.is_complete_success())
}

/// Find the configuration file using the following precedence:
/// 1. `CIPHERPOST_CONFIG` environment variable
/// 2. ./cipherpost.config.ron (current working directory)
/// 3. /etc/cipherpost/cipherpost.config.ron (system-wide config)
fn find_config_file() -> anyhow::Result<PathBuf> {
    if let Ok(env_path) = std::env::var("CIPHERPOST_CONFIG") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        anyhow::bail!(
            "CIPHERPOST_CONFIG points to non-existent file: {}",
            path.display()
        );
    }

    let default_paths = vec![
        PathBuf::from("./cipherpost.config.ron"),
        PathBuf::from("/etc/cipherpost/cipherpost.config.ron"),
    ];

    for path in &default_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let paths_tried = default_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    anyhow::bail!(
        "No configuration file found. Tried:\n  - CIPHERPOST_CONFIG environment variable\n{paths_tried}"
    )
}
