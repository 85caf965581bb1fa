use clap::Parser;
use mail_batch::{SentLog, SENT_LOG_FILE};

#[derive(Parser, Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
#[command(author, version, about)]
/// Simple program to inspect the persisted sent log
struct Cli {
    /// Specifies the sent log file to be read in
    #[arg(value_name = "PATH", default_value = SENT_LOG_FILE)]
    log_filename: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log = SentLog::load(cli.log_filename)?;
    for entry in log.entries() {
        println!(
            "{} {} {} <{}> ({})",
            entry.sent_at, entry.first_name, entry.last_name, entry.email, entry.groups
        );
    }
    println!("{} entries", log.len());
    Ok(())
}
