use std::env;

use anyhow::Context;

/// Environment variable holding the SMTP password. The password never appears
/// in the settings file, the logs or the sent log.
pub const PASSWORD_SECRET: &str = "EMAIL_PASSWORD";

/// Source of secret credentials, injected so the mailer can be built in tests
/// without touching the real process environment.
pub trait SecretProvider {
    fn get_secret(&self, name: &str) -> anyhow::Result<String>;
}

/// Reads secrets from the process environment.
pub struct EnvSecrets;

impl SecretProvider for EnvSecrets {
    fn get_secret(&self, name: &str) -> anyhow::Result<String> {
        env::var(name).with_context(|| format!("Environment variable {name} is not set"))
    }
}
