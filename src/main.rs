use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use team_shots::config::{RunConfig, clamp_parallelism};
use team_shots::quality::XgotPolicy;
use team_shots::review::{rows_from_records, save_review_table};
use team_shots::run::{prepare_urls, run_with_config};
use team_shots::workbook_export::export_workbook;

#[derive(Parser)]
#[command(name = "team_shots")]
#[command(about = "Extract a team's shots from match pages and score them", long_about = None)]
struct Cli {
    /// File with one match URL per line (only the first 30 are used)
    urls_file: PathBuf,

    /// Team to analyse, matched exactly against the page's team names
    #[arg(short, long)]
    team: Option<String>,

    /// Workbook output path
    #[arg(short, long, default_value = "team_database.xlsx")]
    out: PathBuf,

    /// Also write the reviewer shot table as JSON
    #[arg(long)]
    review_out: Option<PathBuf>,

    /// xGOT policy: all (xGOT = xG) or gated (on target / goal only)
    #[arg(long)]
    xgot_policy: Option<XgotPolicy>,

    /// Never fall back to headless Chrome
    #[arg(long)]
    no_browser: bool,

    /// Keep the opponent's shots as extra sheets
    #[arg(long)]
    include_opponent: bool,

    /// Matches fetched concurrently (1-8)
    #[arg(long)]
    parallelism: Option<usize>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut cfg = RunConfig::from_env();
    if let Some(policy) = cli.xgot_policy {
        cfg.xgot_policy = policy;
    }
    if cli.no_browser {
        cfg.fetch.browser_fallback = false;
    }
    if cli.include_opponent {
        cfg.include_opponent = true;
    }
    if let Some(threads) = cli.parallelism {
        cfg.parallelism = clamp_parallelism(threads);
    }

    let raw = fs::read_to_string(&cli.urls_file)
        .with_context(|| format!("read url list {}", cli.urls_file.display()))?;
    let urls = prepare_urls(raw.lines(), cfg.max_matches);

    let team = match cli.team {
        Some(team) => team.trim().to_string(),
        None => prompt_team()?,
    };
    if team.is_empty() {
        bail!("no team name given");
    }

    let report = run_with_config(&urls, &team, &cfg)?;
    let export = export_workbook(&cli.out, &report, cfg.xgot_policy)?;

    println!("Matches: {}/{}", report.records.len(), report.attempted);
    println!(
        "Shots: {}  Goals: {}  xG: {:.2}  Conversion: {:.1}%",
        report.aggregate.total_shots,
        report.aggregate.total_goals,
        report.aggregate.xg_total,
        report.aggregate.conversion_rate
    );
    if !report.failures.is_empty() {
        println!("Skipped: {}", report.failures.len());
        for err in report.failures.iter().take(6) {
            println!("   - {err}");
        }
    }
    println!(
        "Workbook: {} ({} sheets, {} shot rows)",
        cli.out.display(),
        export.sheets.len(),
        export.shot_rows
    );

    if let Some(path) = cli.review_out {
        let rows = rows_from_records(&report.records);
        save_review_table(&path, &rows)?;
        println!("Review table: {} ({} rows)", path.display(), rows.len());
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "team_shots=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn prompt_team() -> Result<String> {
    print!("Team to analyse (e.g. Hässleholms IF): ");
    io::stdout().flush().context("flush stdout")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read team name")?;
    Ok(line.trim().to_string())
}
