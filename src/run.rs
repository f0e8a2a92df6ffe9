use anyhow::Result;
use tracing::{info, warn};

use crate::aggregate::{SeasonAggregate, aggregate};
use crate::config::RunConfig;
use crate::error::{ExtractError, RunError};
use crate::fetch::DocumentFetcher;
use crate::match_extract::{ExtractOptions, MatchExtractor, extract_all};
use crate::shots::MatchRecord;

#[derive(Debug)]
pub struct RunReport {
    pub team: String,
    pub attempted: usize,
    pub records: Vec<MatchRecord>,
    pub failures: Vec<ExtractError>,
    pub aggregate: SeasonAggregate,
}

/// One URL per line; blank lines and `#` comments are skipped. Keeps at most `cap`.
pub fn prepare_urls<I, S>(lines: I, cap: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut urls: Vec<String> = lines
        .into_iter()
        .map(|line| line.as_ref().trim().to_string())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();
    if urls.len() > cap {
        warn!("{} urls supplied, keeping the first {cap}", urls.len());
        urls.truncate(cap);
    }
    urls
}

pub fn run(
    extractor: &MatchExtractor,
    urls: &[String],
    team: &str,
    parallelism: usize,
) -> Result<RunReport, RunError> {
    if urls.is_empty() {
        return Err(RunError::NoUrls);
    }

    let mut records = Vec::new();
    let mut failures = Vec::new();
    for outcome in extract_all(extractor, urls, team, parallelism) {
        match outcome.result {
            Ok(record) => records.push(record),
            Err(err) => failures.push(err),
        }
    }

    if records.is_empty() {
        return Err(RunError::NoDataExtracted {
            attempted: urls.len(),
        });
    }

    let aggregate = aggregate(&records);
    info!(
        matches = records.len(),
        failed = failures.len(),
        shots = aggregate.total_shots,
        goals = aggregate.total_goals,
        "run complete"
    );

    Ok(RunReport {
        team: team.to_string(),
        attempted: urls.len(),
        records,
        failures,
        aggregate,
    })
}

/// Builds the network-backed extractor from configuration and runs it.
pub fn run_with_config(urls: &[String], team: &str, cfg: &RunConfig) -> Result<RunReport> {
    let fetcher = DocumentFetcher::from_config(&cfg.fetch)?;
    let extractor = MatchExtractor::new(fetcher, ExtractOptions::from_config(cfg));
    Ok(run(&extractor, urls, team, cfg.parallelism)?)
}
