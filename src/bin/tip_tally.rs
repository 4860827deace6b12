use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};

use tip_tally::config::{AuthMode, Settings, default_config_path, load_config, write_template};
use tip_tally::dates::SearchWindow;
use tip_tally::session::Session;
use tip_tally::tally::{self, build_query};
use tip_tally::tips::format_currency;

#[derive(Parser)]
#[command(name = "tip_tally")]
#[command(about = "Sum the tips on emailed receipts in a Gmail mailbox", long_about = None)]
struct Cli {
    /// Config file [default: <config dir>/tip_tally/config.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Search for receipts and total their tips (the default)
    Tally(TallyArgs),

    /// Write a template config file to edit
    InitConfig {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Default)]
struct TallyArgs {
    /// OAuth client secrets JSON
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Token cache JSON
    #[arg(long)]
    token: Option<PathBuf>,

    /// Receipt subject to search for
    #[arg(long)]
    subject: Option<String>,

    /// Number of days to cover, ending on --date
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
    days: Option<i64>,

    /// Last day to cover, YYYY-MM-DD [default: today]
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Catch the OAuth redirect in a local listener instead of pasting the code
    #[arg(long)]
    loopback: bool,
}

impl TallyArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(p) = &self.credentials {
            settings.credentials_path = p.clone();
        }
        if let Some(p) = &self.token {
            settings.token_path = p.clone();
        }
        if let Some(s) = &self.subject {
            settings.query_subject = s.clone();
        }
        if let Some(d) = self.days {
            settings.window_days = d;
        }
        if self.loopback {
            settings.auth_mode = AuthMode::Loopback;
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(p) => p,
        None => default_config_path()?,
    };

    match cli.cmd.unwrap_or_else(|| Command::Tally(TallyArgs::default())) {
        Command::InitConfig { force } => {
            write_template(&config_path, force)?;
            println!("Wrote template config to {}", config_path.display());
            Ok(())
        }
        Command::Tally(args) => run_tally(&config_path, &args),
    }
}

fn run_tally(config_path: &Path, args: &TallyArgs) -> Result<()> {
    let cfg = load_config(config_path).map_err(|e| anyhow!("Configuration error: {e:#}"))?;
    let mut settings = Settings::from_config(&cfg);
    args.apply(&mut settings);

    let anchor = args.date.unwrap_or_else(|| Local::now().date_naive());
    let window = SearchWindow::ending_on(anchor, settings.window_days)?;
    let query = build_query(&settings.query_subject, &window)?;

    info!("Starting Tip fetching and calculation!");
    let session = Session::establish(&settings)?;
    let report = tally::run(session.mail(), &query)?;

    let failed = report.failures().count();
    if failed > 0 {
        warn!(
            "{failed} of {} messages contributed no tip",
            report.processed()
        );
    }

    info!("Final Tip Total: {}", format_currency(report.total));
    println!("{}", format_currency(report.total));
    Ok(())
}
