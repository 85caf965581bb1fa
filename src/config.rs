use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use log::debug;
use serde::Deserialize;

use crate::Seconds;

/// All settings for a run. Loaded once at startup, immutable afterwards.
///
/// Every field is required; a missing or mistyped key fails the load before
/// any email is touched.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub smtp: SmtpSettings,
    pub email: EmailSettings,
    pub logos: LogoSettings,
    pub body: BodySettings,
    pub greetings: GreetingSettings,
}

#[derive(Debug, Deserialize)]
pub struct SmtpSettings {
    /// Hostname of the SMTP relay
    pub server: String,

    /// 465 selects implicit TLS, anything else connects plain and upgrades via STARTTLS
    pub port: u16,

    /// Login identity, also used as the From (and optional Bcc) address
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailSettings {
    /// When false no mail is sent; rendered bodies go to a local file instead
    pub send_email_flag: bool,

    /// Number of sends after which the run pauses
    pub batch_size: usize,

    /// How long a batch pause lasts
    pub pause_duration: Seconds,

    /// Blind-copy every email to the sender
    pub bcc_sender: bool,
}

#[derive(Debug, Deserialize)]
pub struct LogoSettings {
    pub smv_logo_url: String,
    pub kaufleute_logo_url: String,
    pub langendorf_logo_url: String,
}

#[derive(Debug, Deserialize)]
pub struct BodySettings {
    /// Subject line used for every email
    pub subject: String,

    /// Path of the HTML body template
    pub template_file: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct GreetingSettings {
    pub kaufleute: String,
    pub langendorf: String,
}

impl Config {
    pub fn load_from(config_path: &Path) -> anyhow::Result<Config> {
        debug!("Loading Config from: {config_path:?}");
        let file_contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read contents of {config_path:?}"))?;
        let result = serde_json::from_str(&file_contents)
            .with_context(|| format!("Failed to parse contents of {config_path:?}"))?;
        Ok(result)
    }
}
