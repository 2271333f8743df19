use crate::core::layout::SeatLayout;
use crate::domain::model::{
    Assignment, AssignmentResult, LevelSatisfaction, PairKey, PreferenceKind, Preferences,
    RankedPairs, SatisfactionMetrics, Seat,
};
use crate::utils::error::{PlannerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

fn seated_adjacent(assignment: &Assignment, layout: &SeatLayout, pair: &PairKey) -> Option<bool> {
    let a = assignment.get(pair.first())?;
    let b = assignment.get(pair.second())?;
    Some(layout.is_adjacent(*a, *b))
}

/// 整數百分比，.5 時取偶數；分母為 0 時回傳 0
fn rounded_percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round_ties_even() as u32
}

/// 計算喜好滿足情況
pub fn compute_satisfaction_metrics(
    assignment: &Assignment,
    layout: &SeatLayout,
    positive_pairs: &BTreeSet<PairKey>,
    willing: &RankedPairs,
) -> SatisfactionMetrics {
    let mut satisfied_people: BTreeSet<&str> = BTreeSet::new();
    let mut satisfied_pairs = 0;

    for pair in positive_pairs {
        if seated_adjacent(assignment, layout, pair) == Some(true) {
            satisfied_people.insert(pair.first());
            satisfied_people.insert(pair.second());
            satisfied_pairs += 1;
        }
    }

    let people_with_pref: BTreeSet<&str> = positive_pairs
        .iter()
        .flat_map(|p| [p.first(), p.second()])
        .collect();

    let first_preference_rate = match willing.get(&1) {
        Some(first) if !first.is_empty() => {
            let hit = first
                .iter()
                .filter(|p| seated_adjacent(assignment, layout, p) == Some(true))
                .count();
            hit as f64 / first.len() as f64 * 100.0
        }
        _ => 0.0,
    };

    let satisfaction_rate = rounded_percent(satisfied_people.len(), people_with_pref.len());

    SatisfactionMetrics {
        n_satisfied: satisfied_people.len(),
        n_people_with_preference: people_with_pref.len(),
        n_satisfied_pairs: satisfied_pairs,
        first_preference_rate,
        satisfaction_rate,
    }
}

/// 各等級滿足率：願意看相鄰比例，不願意看成功分開比例
pub fn level_satisfaction(
    assignment: &Assignment,
    layout: &SeatLayout,
    prefs: &Preferences,
) -> Vec<LevelSatisfaction> {
    let mut levels = Vec::new();

    for (kind, ranked) in [
        (PreferenceKind::Willing, &prefs.willing),
        (PreferenceKind::Unwilling, &prefs.unwilling),
    ] {
        for (rank, pairs) in ranked {
            if pairs.is_empty() {
                continue;
            }
            let satisfied = pairs
                .iter()
                .filter(|p| match (kind, seated_adjacent(assignment, layout, p)) {
                    (PreferenceKind::Willing, Some(adjacent)) => adjacent,
                    (PreferenceKind::Unwilling, Some(adjacent)) => !adjacent,
                    (_, None) => false,
                })
                .count();

            let label = match kind {
                PreferenceKind::Willing => format!("Willing rank {}", rank),
                PreferenceKind::Unwilling => format!("Unwilling rank {}", rank),
            };

            levels.push(LevelSatisfaction {
                kind,
                rank: *rank,
                label,
                total_pairs: pairs.len(),
                satisfied_pairs: satisfied,
                rate: satisfied as f64 / pairs.len() as f64 * 100.0,
            });
        }
    }

    levels
}

/// 驗證分配：每人一座、索引有效、無重複
pub fn validate_assignment(assignment: &Assignment, people: &[String], seats: &[Seat]) -> Result<()> {
    let roster: BTreeSet<&str> = people.iter().map(String::as_str).collect();
    let assigned: BTreeSet<&str> = assignment.keys().map(String::as_str).collect();

    if roster != assigned {
        let missing: Vec<&str> = roster.difference(&assigned).copied().collect();
        let extra: Vec<&str> = assigned.difference(&roster).copied().collect();
        let mut msg = String::new();
        if !missing.is_empty() {
            msg.push_str(&format!("Missing people: {:?}. ", missing));
        }
        if !extra.is_empty() {
            msg.push_str(&format!("Unexpected people: {:?}. ", extra));
        }
        return Err(PlannerError::validation(msg.trim_end()));
    }

    let invalid: Vec<(&String, &usize)> = assignment
        .iter()
        .filter(|(_, &idx)| idx >= seats.len())
        .collect();
    if !invalid.is_empty() {
        return Err(PlannerError::validation(format!(
            "Invalid seat indices: {:?}",
            invalid
        )));
    }

    let mut taken: HashMap<usize, &str> = HashMap::new();
    for (person, &seat) in assignment {
        if let Some(previous) = taken.insert(seat, person) {
            return Err(PlannerError::validation(format!(
                "Seat {} assigned to both {} and {}",
                seat, previous, person
            )));
        }
    }

    Ok(())
}

pub fn positive_pairs(weights: &crate::domain::model::PairWeights) -> BTreeSet<PairKey> {
    weights
        .iter()
        .filter(|(_, &w)| w > 0.0)
        .map(|(p, _)| p.clone())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentSummary {
    pub total_people: usize,
    pub objective: f64,
    pub satisfaction_rate: String,
    pub n_satisfied: usize,
    pub n_people_with_preference: usize,
    pub n_satisfied_pairs: usize,
    pub status: String,
}

impl From<&AssignmentResult> for AssignmentSummary {
    fn from(result: &AssignmentResult) -> Self {
        Self {
            total_people: result.assignment.len(),
            objective: (result.objective * 100.0).round() / 100.0,
            satisfaction_rate: format!("{}%", result.metrics.satisfaction_rate),
            n_satisfied: result.metrics.n_satisfied,
            n_people_with_preference: result.metrics.n_people_with_preference,
            n_satisfied_pairs: result.metrics.n_satisfied_pairs,
            status: result.status.label().to_string(),
        }
    }
}
