use std::{
    collections::HashMap,
    io::{self, Write},
    thread,
    time::Duration,
};

use log::info;

use crate::{
    config::Config,
    mailer::{Mailer, SendOutcome},
    roster::Recipient,
    sent_log::{SentLog, Timestamp},
    template::Template,
    units::Seconds,
};

/// Groups that receive mail. Rows tagged with neither are skipped outright.
pub const TARGET_GROUPS: [&str; 2] = ["Kaufleute", "Langendorf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Kaufleute,
    Langendorf,
}

/// First match wins: a row tagged with both groups counts as Kaufleute.
fn resolve_group(groups: &str) -> Option<Group> {
    if groups.contains("Kaufleute") {
        Some(Group::Kaufleute)
    } else if groups.contains("Langendorf") {
        Some(Group::Langendorf)
    } else {
        None
    }
}

/// Successful sends per tracked group, reported in the final summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GroupCounts {
    pub kaufleute: u32,
    pub langendorf: u32,
}

/// The pause between batches, injected so tests can observe pauses without
/// sleeping.
pub trait Pacer {
    fn pause(&mut self, duration: Seconds);
}

/// Sleeps through the pause a second at a time with a countdown on stdout.
pub struct CountdownPacer;

impl Pacer for CountdownPacer {
    fn pause(&mut self, duration: Seconds) {
        for remaining in (1..=duration.as_u64()).rev() {
            print!("\rResuming in {remaining} seconds...");
            let _ = io::stdout().flush();
            thread::sleep(Duration::from_secs(1));
        }
        info!("\nResuming now.");
        info!("{}", "-".repeat(40));
    }
}

/// Single pass over the roster: skip, render, send, persist, pause.
///
/// A failed send is logged by the mailer, stays out of the sent log and the
/// counters, and processing moves straight on to the next row. Only a
/// sent-log write failure aborts the run.
pub fn run_batch(
    config: &Config,
    template: &Template,
    roster: &[Recipient],
    sent_log: &mut SentLog,
    mailer: &dyn Mailer,
    pacer: &mut dyn Pacer,
) -> anyhow::Result<GroupCounts> {
    let mut counts = GroupCounts::default();
    let mut batch_count = 0usize;

    for (index, recipient) in roster.iter().enumerate() {
        if sent_log.contains(&recipient.email) {
            info!("Email to {} already sent, skipping...", recipient.email);
            continue;
        }
        if !TARGET_GROUPS
            .iter()
            .any(|group| recipient.groups.contains(group))
        {
            continue;
        }

        let group = resolve_group(&recipient.groups);
        let (group_logo, greetings) = match group {
            Some(Group::Kaufleute) => (
                config.logos.kaufleute_logo_url.as_str(),
                config.greetings.kaufleute.as_str(),
            ),
            Some(Group::Langendorf) => (
                config.logos.langendorf_logo_url.as_str(),
                config.greetings.langendorf.as_str(),
            ),
            None => ("", ""),
        };

        let vars = HashMap::from([
            ("name", recipient.first_name.clone()),
            ("ist", recipient.achieved_hours.to_string()),
            ("soll", recipient.target_hours.to_string()),
            ("group_logo", group_logo.to_string()),
            ("greetings", greetings.to_string()),
            ("smv_logo_url", config.logos.smv_logo_url.clone()),
        ]);
        let body = template.render(&vars);

        info!("Vorname: {}", recipient.first_name);
        info!("Nachname: {}", recipient.last_name);
        info!("Email: {}", recipient.email);
        info!(
            "IST/SOLL: {}/{}",
            recipient.achieved_hours, recipient.target_hours
        );
        info!("Gruppe: {}", recipient.groups);

        if mailer.send(&recipient.email, &config.body.subject, &body) == SendOutcome::Sent {
            sent_log.append_and_persist(recipient, Timestamp::new())?;
            match group {
                Some(Group::Kaufleute) => counts.kaufleute += 1,
                Some(Group::Langendorf) => counts.langendorf += 1,
                None => (),
            }
        }
        info!("{}", "-".repeat(40));

        batch_count += 1;
        if batch_count >= config.email.batch_size {
            // No pause after the last roster row
            if index + 1 < roster.len() {
                info!(
                    "Pausing for {} seconds to avoid SMTP server overload...",
                    config.email.pause_duration
                );
                pacer.pause(config.email.pause_duration);
            }
            batch_count = 0;
        }
    }

    info!("{}", "=".repeat(40));
    info!("Summary of emails sent:");
    info!("Emails sent to Langendorf: {}", counts.langendorf);
    info!("Emails sent to Kaufleute: {}", counts.kaufleute);
    info!("{}", "=".repeat(40));

    Ok(counts)
}
