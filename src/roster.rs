use std::path::Path;

use anyhow::Context;
use log::debug;
use serde::{Deserialize, Serialize};

/// One row of the roster. Column names follow the source spreadsheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipient {
    /// Group tags, possibly several in one field
    #[serde(rename = "Gruppen")]
    pub groups: String,

    /// Unique key used for the already-sent check
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
}

/// Reads the roster in file order. Row order matters downstream because the
/// batch pause is keyed to row position.
pub fn load_roster(path: &Path) -> anyhow::Result<Vec<Recipient>> {
    debug!("Loading roster from: {path:?}");
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("Failed to open roster {path:?}"))?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let recipient: Recipient =
            record.with_context(|| format!("Failed to parse roster row in {path:?}"))?;
        rows.push(recipient);
    }
    debug!("Loaded {} roster rows", rows.len());
    Ok(rows)
}
