use std::collections::BTreeMap;

use serde::Serialize;

use crate::shots::{Location, MatchRecord, ShotEvent, Side};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Breakdown {
    pub shots: usize,
    pub goals: usize,
    pub xg: f64,
    pub xgot: f64,
}

impl Breakdown {
    fn add(&mut self, shot: &ShotEvent) {
        self.shots += 1;
        if shot.event.is_goal {
            self.goals += 1;
        }
        self.xg += shot.xg.unwrap_or(0.0);
        self.xgot += shot.xgot.unwrap_or(0.0);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerBreakdown {
    /// `None` groups every shot without a player identifier.
    pub player: Option<String>,
    pub location: Location,
    #[serde(flatten)]
    pub totals: Breakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationBreakdown {
    pub location: Location,
    #[serde(flatten)]
    pub totals: Breakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonAggregate {
    pub matches: usize,
    pub total_shots: usize,
    pub total_goals: usize,
    pub xg_total: f64,
    pub xgot_total: f64,
    /// Mean over shots that have an xG value.
    pub xg_mean: Option<f64>,
    pub xg_per_match: f64,
    pub xgot_per_match: f64,
    /// Goals per hundred shots.
    pub conversion_rate: f64,
    pub by_player: Vec<PlayerBreakdown>,
    pub by_location: Vec<LocationBreakdown>,
}

pub fn aggregate(records: &[MatchRecord]) -> SeasonAggregate {
    aggregate_side(records, Side::Team)
}

pub fn aggregate_side(records: &[MatchRecord], side: Side) -> SeasonAggregate {
    let mut total = Breakdown::default();
    let mut xg_count = 0usize;
    let mut per_player: BTreeMap<(Option<String>, Location), Breakdown> = BTreeMap::new();
    let mut per_location: BTreeMap<Location, Breakdown> = BTreeMap::new();

    for record in records {
        let location = record.location_for(side);
        for shot in record.side(side) {
            total.add(shot);
            if shot.xg.is_some() {
                xg_count += 1;
            }
            per_player
                .entry((shot.event.player_label(), location))
                .or_default()
                .add(shot);
            per_location.entry(location).or_default().add(shot);
        }
    }

    let matches = records.len();
    SeasonAggregate {
        matches,
        total_shots: total.shots,
        total_goals: total.goals,
        xg_total: total.xg,
        xgot_total: total.xgot,
        xg_mean: (xg_count > 0).then(|| total.xg / xg_count as f64),
        xg_per_match: per_match(total.xg, matches),
        xgot_per_match: per_match(total.xgot, matches),
        conversion_rate: conversion_rate(total.goals, total.shots),
        by_player: per_player
            .into_iter()
            .map(|((player, location), totals)| PlayerBreakdown {
                player,
                location,
                totals,
            })
            .collect(),
        by_location: per_location
            .into_iter()
            .map(|(location, totals)| LocationBreakdown { location, totals })
            .collect(),
    }
}

pub fn conversion_rate(goals: usize, shots: usize) -> f64 {
    if shots == 0 {
        return 0.0;
    }
    goals as f64 / shots as f64 * 100.0
}

fn per_match(total: f64, matches: usize) -> f64 {
    if matches == 0 {
        0.0
    } else {
        total / matches as f64
    }
}
