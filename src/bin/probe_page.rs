use std::path::Path;

use anyhow::{Context, Result, anyhow};

use team_shots::config::RunConfig;
use team_shots::fetch::DocumentFetcher;
use team_shots::locate::{LocatedPayload, locate};
use team_shots::match_extract::resolve_teams;
use team_shots::mine::mine;
use team_shots::normalize::normalize;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let target = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: probe_page <URL|FILE>"))?;
    let limit = std::env::var("PROBE_LIMIT")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(5)
        .clamp(1, 50);

    let located = if Path::new(&target).is_file() {
        let doc = std::fs::read_to_string(&target).with_context(|| format!("read {target}"))?;
        locate(&doc).ok_or_else(|| anyhow!("no structured data in {target}"))?
    } else {
        let cfg = RunConfig::from_env();
        let fetcher = DocumentFetcher::from_config(&cfg.fetch)?;
        let dump = std::env::var("PROBE_DUMP").ok();
        match fetcher.fetch_page_payload(&target) {
            Ok((doc, located)) => {
                if let Some(dump) = &dump {
                    save_dump(dump, &doc)?;
                }
                located
            }
            Err(err) => {
                // Keep the raw page around so the missing payload can be inspected.
                if let Some(dump) = &dump {
                    save_dump(dump, &fetcher.fetch(&target)?)?;
                }
                return Err(err.into());
            }
        }
    };

    report(&located, limit);
    Ok(())
}

fn save_dump(path: &str, doc: &str) -> Result<()> {
    std::fs::write(path, doc).with_context(|| format!("write {path}"))?;
    println!("Saved {} bytes to {path}", doc.len());
    Ok(())
}

fn report(located: &LocatedPayload, limit: usize) {
    println!(
        "Payload: {:?}{}",
        located.origin,
        if located.repaired { " (repaired)" } else { "" }
    );

    let teams = resolve_teams(&located.payload);
    println!(
        "Home: {}  Away: {}",
        teams.home.as_deref().unwrap_or("?"),
        teams.away.as_deref().unwrap_or("?")
    );

    let candidates = mine(&located.payload);
    println!("Candidates: {}", candidates.len());
    for record in candidates.into_iter().take(limit) {
        let event = normalize(record);
        println!(
            "  min={} team={} player={} x={} y={} goal={}",
            show(event.minute.as_ref()),
            event.team_label().unwrap_or_else(|| "-".to_string()),
            event.player_label().unwrap_or_else(|| "-".to_string()),
            show(event.x_raw.as_ref()),
            show(event.y_raw.as_ref()),
            event.is_goal
        );
    }
}

fn show(value: Option<&serde_json::Value>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
