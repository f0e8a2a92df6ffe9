use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rust_xlsxwriter::{Workbook, Worksheet};
use serde_json::Value;

use crate::aggregate::{Breakdown, SeasonAggregate, aggregate_side};
use crate::error::ExtractError;
use crate::quality::XgotPolicy;
use crate::run::RunReport;
use crate::shots::{MatchRecord, ShotEvent, Side};

/// Per-match sheet columns. Every column is written for every match.
pub const MATCH_COLUMNS: [&str; 11] = [
    "minute", "player", "x_m", "y_m", "dist_m", "xG", "xGOT", "is_goal", "opponent",
    "location", "raw",
];

const SUMMARY_COLUMNS: [&str; 11] = [
    "Total_Shots",
    "Total_Goals",
    "xG_Total",
    "xGOT_Total",
    "xG_Mean",
    "xG_Per_Match",
    "xGOT_Per_Match",
    "Conversion_Pct",
    "Matches",
    "xGOT_Policy",
    "Generated",
];

// Excel refuses longer strings in a single cell.
const MAX_CELL_CHARS: usize = 32_767;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    fn opt_number(value: Option<f64>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Empty)
    }

    fn opt_text(value: Option<String>) -> Self {
        value.map(Cell::Text).unwrap_or(Cell::Empty)
    }

    fn raw(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Cell::Empty,
            Some(Value::Number(n)) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
            Some(Value::String(s)) => Cell::Text(s.clone()),
            Some(Value::Bool(b)) => Cell::Bool(*b),
            Some(other) => Cell::Text(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub sheets: Vec<String>,
    pub shot_rows: usize,
}

pub fn export_workbook(
    path: &Path,
    report: &RunReport,
    policy: XgotPolicy,
) -> Result<ExportReport> {
    let mut workbook = Workbook::new();
    let mut out = ExportReport::default();

    for record in &report.records {
        let name = format!("Match_{}", record.index);
        let rows = match_rows(record, &record.shots);
        out.shot_rows += rows.len().saturating_sub(1);
        add_sheet(&mut workbook, &name, &rows)?;
        out.sheets.push(name);

        if !record.opponent_shots.is_empty() {
            let name = format!("Match_{}_Opp", record.index);
            add_sheet(&mut workbook, &name, &match_rows(record, &record.opponent_shots))?;
            out.sheets.push(name);
        }
    }

    let sheets: [(&str, Vec<Vec<Cell>>); 3] = [
        ("Summary", summary_rows(&report.aggregate, policy)),
        ("ByPlayer", player_rows(&report.aggregate)),
        ("ByLocation", location_rows(&report.aggregate)),
    ];
    for (name, rows) in sheets {
        add_sheet(&mut workbook, name, &rows)?;
        out.sheets.push(name.to_string());
    }

    if report.records.iter().any(|r| !r.opponent_shots.is_empty()) {
        let against = aggregate_side(&report.records, Side::Opponent);
        add_sheet(&mut workbook, "Summary_Opp", &summary_rows(&against, policy))?;
        out.sheets.push("Summary_Opp".to_string());
    }

    if !report.failures.is_empty() {
        add_sheet(&mut workbook, "Skipped", &skipped_rows(&report.failures))?;
        out.sheets.push("Skipped".to_string());
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(out)
}

fn header(columns: &[&str]) -> Vec<Cell> {
    columns.iter().map(|c| Cell::text(*c)).collect()
}

pub fn match_rows(record: &MatchRecord, shots: &[ShotEvent]) -> Vec<Vec<Cell>> {
    let mut rows = vec![header(&MATCH_COLUMNS)];
    rows.extend(shots.iter().map(|shot| shot_row(record, shot)));
    rows
}

fn shot_row(record: &MatchRecord, shot: &ShotEvent) -> Vec<Cell> {
    vec![
        Cell::raw(shot.event.minute.as_ref()),
        Cell::opt_text(shot.event.player_label()),
        Cell::opt_number(shot.x_m),
        Cell::opt_number(shot.y_m),
        Cell::opt_number(shot.dist_m),
        Cell::opt_number(shot.xg),
        Cell::opt_number(shot.xgot),
        Cell::Bool(shot.event.is_goal),
        Cell::opt_text(record.opponent.clone()),
        Cell::text(record.location.label()),
        Cell::Text(shot.event.raw.to_string()),
    ]
}

fn summary_rows(agg: &SeasonAggregate, policy: XgotPolicy) -> Vec<Vec<Cell>> {
    vec![
        header(&SUMMARY_COLUMNS),
        vec![
            Cell::Number(agg.total_shots as f64),
            Cell::Number(agg.total_goals as f64),
            Cell::Number(agg.xg_total),
            Cell::Number(agg.xgot_total),
            Cell::opt_number(agg.xg_mean),
            Cell::Number(agg.xg_per_match),
            Cell::Number(agg.xgot_per_match),
            Cell::Number(agg.conversion_rate),
            Cell::Number(agg.matches as f64),
            Cell::text(policy.label()),
            Cell::Text(Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ],
    ]
}

fn breakdown_cells(totals: &Breakdown) -> [Cell; 4] {
    [
        Cell::Number(totals.shots as f64),
        Cell::Number(totals.goals as f64),
        Cell::Number(totals.xg),
        Cell::Number(totals.xgot),
    ]
}

fn player_rows(agg: &SeasonAggregate) -> Vec<Vec<Cell>> {
    let mut rows = vec![header(&["player", "location", "shots", "goals", "xG", "xGOT"])];
    for row in &agg.by_player {
        let mut cells = vec![
            Cell::opt_text(row.player.clone()),
            Cell::text(row.location.label()),
        ];
        cells.extend(breakdown_cells(&row.totals));
        rows.push(cells);
    }
    rows
}

fn location_rows(agg: &SeasonAggregate) -> Vec<Vec<Cell>> {
    let mut rows = vec![header(&["location", "shots", "goals", "xG", "xGOT"])];
    for row in &agg.by_location {
        let mut cells = vec![Cell::text(row.location.label())];
        cells.extend(breakdown_cells(&row.totals));
        rows.push(cells);
    }
    rows
}

fn skipped_rows(failures: &[ExtractError]) -> Vec<Vec<Cell>> {
    let mut rows = vec![header(&["url", "reason", "detail"])];
    for err in failures {
        rows.push(vec![
            Cell::text(err.url()),
            Cell::text(err.kind()),
            Cell::Text(err.to_string()),
        ]);
    }
    rows
}

fn add_sheet(workbook: &mut Workbook, name: &str, rows: &[Vec<Cell>]) -> Result<()> {
    let sheet = workbook.add_worksheet();
    sheet
        .set_name(name)
        .with_context(|| format!("invalid sheet name {name}"))?;
    write_rows(sheet, rows)
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            match cell {
                Cell::Text(value) => worksheet.write_string(r, c, truncate_cell(value)),
                Cell::Number(value) => worksheet.write_number(r, c, *value),
                Cell::Bool(value) => worksheet.write_boolean(r, c, *value),
                Cell::Empty => continue,
            }
            .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

fn truncate_cell(value: &str) -> &str {
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}
