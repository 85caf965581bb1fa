use std::{
    collections::HashSet,
    fmt::Display,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::Local;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::Recipient;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn new() -> Self {
        Self(format!("{}", Local::now().format("%F %T")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A recipient row as persisted after a successful send. Same columns as the
/// roster plus the send date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentEntry {
    #[serde(rename = "Gruppen")]
    pub groups: String,

    #[serde(rename = "E-Mail")]
    pub email: String,

    #[serde(rename = "Vorname")]
    pub first_name: String,

    #[serde(rename = "Nachname")]
    pub last_name: String,

    #[serde(rename = "Erreichter Wert in Stunden")]
    pub achieved_hours: f64,

    #[serde(rename = "Zielwert in Stunden")]
    pub target_hours: f64,

    #[serde(rename = "Sent Date")]
    pub sent_at: Timestamp,
}

impl SentEntry {
    fn new(recipient: &Recipient, sent_at: Timestamp) -> Self {
        Self {
            groups: recipient.groups.clone(),
            email: recipient.email.clone(),
            first_name: recipient.first_name.clone(),
            last_name: recipient.last_name.clone(),
            achieved_hours: recipient.achieved_hours,
            target_hours: recipient.target_hours,
            sent_at,
        }
    }
}

/// The durable record of addresses already emailed. Append-only: entries are
/// never removed or modified, and the set survives across runs so reruns
/// never double-send.
#[derive(Debug)]
pub struct SentLog {
    path: PathBuf,
    entries: Vec<SentEntry>,
    emails: HashSet<String>,
}

impl SentLog {
    /// Reads the persisted log if it exists, otherwise starts empty.
    pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let mut entries = Vec::new();
        if path.exists() {
            debug!("Loading sent log from: {path:?}");
            let mut reader = csv::Reader::from_path(&path)
                .with_context(|| format!("Failed to open sent log {path:?}"))?;
            for record in reader.deserialize() {
                let entry: SentEntry =
                    record.with_context(|| format!("Failed to parse sent log row in {path:?}"))?;
                entries.push(entry);
            }
        } else {
            debug!("No sent log at {path:?}, starting empty");
        }
        let emails = entries.iter().map(|e| e.email.clone()).collect();
        Ok(Self {
            path,
            entries,
            emails,
        })
    }

    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(email)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SentEntry] {
        &self.entries
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records one successful send and synchronously rewrites the whole file.
    /// The full overwrite per send is deliberate: nothing already persisted is
    /// lost if a later row crashes the run.
    pub fn append_and_persist(
        &mut self,
        recipient: &Recipient,
        sent_at: Timestamp,
    ) -> anyhow::Result<()> {
        self.emails.insert(recipient.email.clone());
        self.entries.push(SentEntry::new(recipient, sent_at));
        self.persist()
    }

    fn persist(&self) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_path(&self.path)
            .with_context(|| format!("Failed to open sent log {:?} for writing", self.path))?;
        for entry in &self.entries {
            writer
                .serialize(entry)
                .with_context(|| format!("Failed to write sent log row to {:?}", self.path))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush sent log {:?}", self.path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn recipient(email: &str) -> Recipient {
        Recipient {
            groups: "Kaufleute".to_string(),
            email: email.to_string(),
            first_name: "Anna".to_string(),
            last_name: "Muster".to_string(),
            achieved_hours: 12.5,
            target_hours: 20.0,
        }
    }

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempdir().unwrap();

        let log = SentLog::load(dir.path().join("sent.csv")).unwrap();

        assert!(log.is_empty());
        assert!(!log.contains("anna@example.com"));
    }

    #[test]
    fn append_persists_and_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sent.csv");

        let mut log = SentLog::load(&path).unwrap();
        log.append_and_persist(&recipient("anna@example.com"), Timestamp::new())
            .unwrap();

        let reloaded = SentLog::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.contains("anna@example.com"));
        assert!(!reloaded.entries()[0].sent_at.as_str().is_empty());
    }

    #[test]
    fn each_append_grows_by_one() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sent.csv");
        let mut log = SentLog::load(&path).unwrap();

        log.append_and_persist(&recipient("a@example.com"), Timestamp::new())
            .unwrap();
        log.append_and_persist(&recipient("b@example.com"), Timestamp::new())
            .unwrap();

        // Header plus one line per entry, rewritten in full each time
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 3);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn earlier_entries_are_untouched_by_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sent.csv");
        let mut log = SentLog::load(&path).unwrap();

        log.append_and_persist(&recipient("a@example.com"), Timestamp::new())
            .unwrap();
        let first_sent_at = log.entries()[0].sent_at.clone();
        log.append_and_persist(&recipient("b@example.com"), Timestamp::new())
            .unwrap();

        let reloaded = SentLog::load(&path).unwrap();
        assert_eq!(reloaded.entries()[0].email, "a@example.com");
        assert_eq!(reloaded.entries()[0].sent_at, first_sent_at);
    }
}
