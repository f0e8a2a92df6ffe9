use std::fs;
use std::path::PathBuf;

use serde_json::{Value, json};
use team_shots::aggregate::{aggregate, aggregate_side};
use team_shots::error::ExtractError;
use team_shots::geometry::Pitch;
use team_shots::normalize::normalize;
use team_shots::quality::XgotPolicy;
use team_shots::review::{
    ReviewSession, ShotResult, load_review_table, rows_from_records, save_review_table,
};
use team_shots::run::RunReport;
use team_shots::shots::{Location, MatchRecord, ShotEvent, Side};
use team_shots::workbook_export::export_workbook;

fn shot(raw: Value) -> ShotEvent {
    ShotEvent::enrich(normalize(&raw), &Pitch::default(), XgotPolicy::AllShots)
}

fn record(
    index: usize,
    location: Location,
    shots: Vec<ShotEvent>,
    opponent_shots: Vec<ShotEvent>,
) -> MatchRecord {
    let (home, away) = match location {
        Location::Home => ("X", "Y"),
        Location::Away => ("Y", "X"),
    };
    MatchRecord {
        index,
        url: format!("https://m/{index}"),
        team: "X".to_string(),
        home_team: Some(home.to_string()),
        away_team: Some(away.to_string()),
        location,
        opponent: Some("Y".to_string()),
        shots,
        opponent_shots,
        home_stats: None,
        away_stats: None,
    }
}

fn season() -> Vec<MatchRecord> {
    vec![
        record(
            1,
            Location::Home,
            vec![
                shot(json!({
                    "teamName": "X", "playerName": "Berg", "x": 90, "y": 50, "isGoal": true
                })),
                shot(json!({"teamName": "X", "playerName": "Berg", "x": 70, "y": 30})),
                shot(json!({"teamName": "X", "x": 80, "y": 60})),
            ],
            vec![shot(json!({
                "teamName": "Y", "playerName": "Ek", "x": 85, "y": 50, "isGoal": true
            }))],
        ),
        record(
            2,
            Location::Away,
            vec![
                shot(json!({"teamName": "X", "playerName": "Berg", "x": 95, "y": 45})),
                shot(json!({"teamName": "X", "playerName": "Lind", "x": "abc", "y": 50})),
            ],
            Vec::new(),
        ),
    ]
}

fn temp_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("team_shots_{}_{name}", std::process::id()));
    path
}

#[test]
fn season_totals_and_rates() {
    let records = season();
    let agg = aggregate(&records);

    assert_eq!(agg.matches, 2);
    assert_eq!(agg.total_shots, 5);
    assert_eq!(agg.total_goals, 1);
    assert!((agg.conversion_rate - 20.0).abs() < 1e-9);

    let xg_sum: f64 = records
        .iter()
        .flat_map(|r| r.shots.iter())
        .filter_map(|s| s.xg)
        .sum();
    assert!((agg.xg_total - xg_sum).abs() < 1e-12);
    assert!((agg.xg_per_match - xg_sum / 2.0).abs() < 1e-12);
    // The unparseable shot has no xG and stays out of the mean.
    assert!((agg.xg_mean.unwrap() - xg_sum / 4.0).abs() < 1e-12);
    assert_eq!(agg.xgot_total, agg.xg_total);
}

#[test]
fn players_group_by_location_with_unnamed_bucket() {
    let agg = aggregate(&season());
    let groups: Vec<_> = agg
        .by_player
        .iter()
        .map(|p| (p.player.as_deref(), p.location, p.totals.shots, p.totals.goals))
        .collect();

    assert_eq!(
        groups,
        vec![
            (None, Location::Home, 1, 0),
            (Some("Berg"), Location::Home, 2, 1),
            (Some("Berg"), Location::Away, 1, 0),
            (Some("Lind"), Location::Away, 1, 0),
        ]
    );

    let locations: Vec<_> = agg
        .by_location
        .iter()
        .map(|l| (l.location, l.totals.shots))
        .collect();
    assert_eq!(locations, vec![(Location::Home, 3), (Location::Away, 2)]);
}

#[test]
fn opponent_side_uses_flipped_location() {
    let agg = aggregate_side(&season(), Side::Opponent);
    assert_eq!(agg.total_shots, 1);
    assert_eq!(agg.total_goals, 1);
    assert_eq!(agg.by_location.len(), 1);
    assert_eq!(agg.by_location[0].location, Location::Away);
    assert!((agg.conversion_rate - 100.0).abs() < 1e-9);
}

#[test]
fn review_edits_rescore_the_current_row() {
    let rows = rows_from_records(&season());
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].result, ShotResult::Goal);
    assert_eq!(rows[0].player_name.as_deref(), Some("Berg"));

    let mut session = ReviewSession::new(rows, Pitch::default(), XgotPolicy::OnTargetOrGoal);
    let first_xg = session.current().and_then(|r| r.xg).expect("scored");

    let edited = session.set_goal(false).expect("row").clone();
    assert!(!edited.is_goal);
    assert_eq!(edited.result, ShotResult::OnTarget);
    assert_eq!(edited.xg, Some(first_xg));
    assert_eq!(edited.xgot, Some(first_xg));

    session.cursor_mut().seek(4);
    let moved = session.recalibrate(100.0, 34.0).expect("row").clone();
    assert_eq!(moved.x, Some(100.0));
    assert!(moved.xg.unwrap() > first_xg);
    assert_eq!(moved.xgot, Some(0.0));

    let flipped = session.set_goal(true).expect("row").clone();
    assert_eq!(flipped.result, ShotResult::Goal);
    assert_eq!(flipped.xgot, flipped.xg);

    assert_eq!(session.rows()[0].result, ShotResult::OnTarget);
    assert_eq!(session.rows()[4].x, Some(100.0));

    assert_eq!(session.cursor_mut().advance(), None);
    assert!(session.set_goal(false).is_none());
    assert!(session.cursor().is_done());
}

#[test]
fn review_table_survives_disk_round_trip() {
    let rows = rows_from_records(&season());
    let path = temp_path("review.json");
    save_review_table(&path, &rows).expect("save");
    let loaded = load_review_table(&path).expect("load");
    fs::remove_file(&path).ok();

    assert_eq!(loaded.len(), rows.len());
    for (back, orig) in loaded.iter().zip(&rows) {
        assert_eq!(back.player_name, orig.player_name);
        assert_eq!(back.result, orig.result);
        assert_eq!(back.is_goal, orig.is_goal);
        match (back.xg, orig.xg) {
            (Some(a), Some(b)) => assert!((a - b).abs() < 1e-12),
            (a, b) => assert_eq!(a, b),
        }
    }
    assert_eq!(loaded[4].x, None);
    assert_eq!(loaded[4].xg, None);
}

#[test]
fn workbook_lists_match_summary_opponent_and_skipped_sheets() {
    let records = season();
    let failures = vec![ExtractError::NoStructuredData {
        url: "https://m/3".to_string(),
        attempts: vec!["http: no structured data".to_string()],
    }];
    let aggregate = aggregate(&records);
    let report = RunReport {
        team: "X".to_string(),
        attempted: 3,
        records,
        failures,
        aggregate,
    };

    let path = temp_path("season.xlsx");
    let export = export_workbook(&path, &report, XgotPolicy::AllShots).expect("export");
    let written = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    fs::remove_file(&path).ok();

    assert!(written > 0);
    assert_eq!(export.shot_rows, 5);
    assert_eq!(
        export.sheets,
        vec![
            "Match_1",
            "Match_1_Opp",
            "Match_2",
            "Summary",
            "ByPlayer",
            "ByLocation",
            "Summary_Opp",
            "Skipped",
        ]
    );
}
