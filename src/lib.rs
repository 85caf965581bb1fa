use std::path::Path;

mod cli;
mod config;
pub mod logging;
mod mailer;
mod roster;
mod runner;
mod secrets;
mod sent_log;
mod template;
mod units;

pub use cli::Cli;
pub use config::Config;
pub use mailer::{FileMailer, Mailer, SendOutcome, SmtpMailer, DRY_RUN_OUTPUT_FILE};
pub use roster::{load_roster, Recipient};
pub use runner::{run_batch, CountdownPacer, GroupCounts, Pacer, TARGET_GROUPS};
pub use secrets::{EnvSecrets, SecretProvider, PASSWORD_SECRET};
pub use sent_log::{SentEntry, SentLog, Timestamp};
pub use template::Template;
pub use units::Seconds;

/// Roster of people eligible for notification
pub const ROSTER_FILE: &str = "openhelpers.csv";

/// Durable record of addresses already emailed
pub const SENT_LOG_FILE: &str = "sent_emails_log.csv";

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_from(&cli.get_config_path())?;
    let template = Template::load(&config.body.template_file)?;
    let roster = load_roster(Path::new(ROSTER_FILE))?;
    let mut sent_log = SentLog::load(SENT_LOG_FILE)?;

    let mailer: Box<dyn Mailer> = if config.email.send_email_flag {
        Box::new(SmtpMailer::new(
            &config.smtp,
            config.email.bcc_sender,
            &EnvSecrets,
        )?)
    } else {
        Box::new(FileMailer::new(DRY_RUN_OUTPUT_FILE))
    };

    let mut pacer = CountdownPacer;
    run_batch(
        &config,
        &template,
        &roster,
        &mut sent_log,
        mailer.as_ref(),
        &mut pacer,
    )?;
    Ok(())
}
