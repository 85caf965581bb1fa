use std::{fs, path::PathBuf};

use anyhow::Context;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use log::{error, info};

use crate::{
    config::SmtpSettings,
    secrets::{SecretProvider, PASSWORD_SECRET},
};

/// Port on which SMTP servers expect an implicit-TLS session
const IMPLICIT_TLS_PORT: u16 = 465;

/// Where the dry-run mailer writes the most recently rendered body
pub const DRY_RUN_OUTPUT_FILE: &str = "example_email_sent.html";

/// Outcome of one delivery attempt. Failure is a value, not an error, so the
/// batch driver has to handle it and a single bad address cannot abort a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Failed,
}

pub trait Mailer {
    fn send(&self, to: &str, subject: &str, html_body: &str) -> SendOutcome;
}

/// Sends HTML mail through an SMTP relay, one message per call, no retries.
pub struct SmtpMailer {
    server: String,
    port: u16,
    login: String,
    password: String,
    bcc_sender: bool,
}

impl SmtpMailer {
    pub fn new(
        smtp: &SmtpSettings,
        bcc_sender: bool,
        secrets: &dyn SecretProvider,
    ) -> anyhow::Result<Self> {
        let password = secrets
            .get_secret(PASSWORD_SECRET)
            .context("SMTP password is not available")?;
        Ok(Self {
            server: smtp.server.clone(),
            port: smtp.port,
            login: smtp.login.clone(),
            password,
            bcc_sender,
        })
    }

    fn build_message(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<Message> {
        let from = self
            .login
            .parse()
            .with_context(|| format!("Login {:?} is not a valid mailbox", self.login))?;
        let to = to
            .parse()
            .with_context(|| format!("Recipient address {to:?} is not a valid mailbox"))?;
        let mut builder = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML);
        if self.bcc_sender {
            let bcc = self
                .login
                .parse()
                .with_context(|| format!("Login {:?} is not a valid mailbox", self.login))?;
            builder = builder.bcc(bcc);
        }
        builder
            .body(html_body.to_string())
            .context("Failed to build message")
    }

    /// Port 465 gets an implicit-TLS session, every other port connects in
    /// plaintext and upgrades via STARTTLS before authenticating.
    fn build_transport(&self) -> anyhow::Result<SmtpTransport> {
        let credentials = Credentials::new(self.login.clone(), self.password.clone());
        let builder = if self.port == IMPLICIT_TLS_PORT {
            SmtpTransport::relay(&self.server)
                .with_context(|| format!("Failed to set up TLS relay to {:?}", self.server))?
        } else {
            SmtpTransport::starttls_relay(&self.server)
                .with_context(|| format!("Failed to set up STARTTLS relay to {:?}", self.server))?
        };
        Ok(builder.port(self.port).credentials(credentials).build())
    }

    fn try_send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()> {
        let message = self.build_message(to, subject, html_body)?;
        let transport = self.build_transport()?;
        transport.send(&message).context("SMTP delivery failed")?;
        Ok(())
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, to: &str, subject: &str, html_body: &str) -> SendOutcome {
        match self.try_send(to, subject, html_body) {
            Ok(()) => {
                info!("Email sent to {to}");
                SendOutcome::Sent
            }
            Err(e) => {
                error!("Failed to send email to {to}: {e:#}");
                SendOutcome::Failed
            }
        }
    }
}

/// Dry-run mailer. Never opens a connection; writes the rendered body to a
/// local file (overwriting the previous one) and always reports success.
pub struct FileMailer {
    path: PathBuf,
}

impl FileMailer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Mailer for FileMailer {
    fn send(&self, to: &str, _subject: &str, html_body: &str) -> SendOutcome {
        if let Err(e) = fs::write(&self.path, html_body) {
            error!("Failed to write debug copy to {:?}: {e}", self.path);
        }
        info!("Email prepared for {to} (debug mode, not sent)");
        SendOutcome::Sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use tempfile::tempdir;

    struct FakeSecrets(Option<&'static str>);

    impl SecretProvider for FakeSecrets {
        fn get_secret(&self, name: &str) -> anyhow::Result<String> {
            match self.0 {
                Some(secret) => Ok(secret.to_string()),
                None => bail!("no secret named {name}"),
            }
        }
    }

    fn smtp_settings() -> SmtpSettings {
        SmtpSettings {
            server: "smtp.example.com".to_string(),
            port: 465,
            login: "sender@example.com".to_string(),
        }
    }

    #[test]
    fn file_mailer_writes_body_and_reports_success() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("debug.html");
        let mailer = FileMailer::new(&path);

        let outcome = mailer.send("anna@example.com", "Stand", "<p>Hallo Anna</p>");

        assert_eq!(outcome, SendOutcome::Sent);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "<p>Hallo Anna</p>"
        );
    }

    #[test]
    fn file_mailer_keeps_only_the_last_body() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("debug.html");
        let mailer = FileMailer::new(&path);

        mailer.send("anna@example.com", "Stand", "<p>erste</p>");
        mailer.send("ben@example.com", "Stand", "<p>letzte</p>");

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>letzte</p>");
    }

    #[test]
    fn smtp_mailer_requires_the_secret() {
        let result = SmtpMailer::new(&smtp_settings(), false, &FakeSecrets(None));

        assert!(result.is_err());
    }

    #[test]
    fn message_carries_bcc_only_when_enabled() {
        let with_bcc = SmtpMailer::new(&smtp_settings(), true, &FakeSecrets(Some("pw"))).unwrap();
        let without_bcc =
            SmtpMailer::new(&smtp_settings(), false, &FakeSecrets(Some("pw"))).unwrap();

        let message = with_bcc
            .build_message("anna@example.com", "Stand", "<p>Hallo</p>")
            .unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("Bcc: sender@example.com"));
        assert!(formatted.contains("From: sender@example.com"));
        assert!(formatted.contains("To: anna@example.com"));

        let message = without_bcc
            .build_message("anna@example.com", "Stand", "<p>Hallo</p>")
            .unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(!formatted.contains("Bcc:"));
    }

    #[test]
    fn invalid_recipient_address_is_a_failure_not_a_panic() {
        let mailer = SmtpMailer::new(&smtp_settings(), false, &FakeSecrets(Some("pw"))).unwrap();

        let outcome = mailer.send("not an address", "Stand", "<p>Hallo</p>");

        assert_eq!(outcome, SendOutcome::Failed);
    }
}
