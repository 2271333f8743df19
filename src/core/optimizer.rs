use crate::core::layout::SeatLayout;
use crate::domain::model::{Assignment, AssignmentResult, PairWeights, SolveStatus};
use crate::utils::error::{PlannerError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const MAX_TOP_N: usize = 10;
const WEIGHT_EPSILON: f64 = 1e-9;
const SCORE_EPSILON: f64 = 1e-6;
const DEADLINE_CHECK_INTERVAL: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    /// 需要的方案數
    pub top_n: usize,
    /// 每個方案的時間上限，總預算為 time_limit * top_n
    pub time_limit: Duration,
    pub seed: Option<u64>,
    /// 可行分配數不超過此值時改用窮舉
    pub exhaustive_limit: u64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            top_n: 3,
            time_limit: Duration::from_secs(10),
            seed: None,
            exhaustive_limit: 200_000,
        }
    }
}

/// 索引化後的問題
struct Problem<'a> {
    layout: &'a SeatLayout,
    n_people: usize,
    n_seats: usize,
    pairs: Vec<(usize, usize, f64)>,
    by_person: Vec<Vec<(usize, f64)>>,
    upper_bound: f64,
    max_abs_weight: f64,
}

impl<'a> Problem<'a> {
    fn new(people: &[String], layout: &'a SeatLayout, weights: &PairWeights) -> Self {
        let index: HashMap<&str, usize> = people
            .iter()
            .enumerate()
            .map(|(i, p)| (p.as_str(), i))
            .collect();

        let mut pairs = Vec::new();
        let mut by_person = vec![Vec::new(); people.len()];
        for (pair, &w) in weights {
            if w.abs() <= WEIGHT_EPSILON {
                continue;
            }
            let (Some(&a), Some(&b)) = (index.get(pair.first()), index.get(pair.second())) else {
                continue;
            };
            if a == b {
                continue;
            }
            pairs.push((a.min(b), a.max(b), w));
            by_person[a].push((b, w));
            by_person[b].push((a, w));
        }

        let upper_bound = pairs.iter().map(|&(_, _, w)| w.max(0.0)).sum();
        let max_abs_weight = pairs.iter().map(|&(_, _, w)| w.abs()).fold(0.0, f64::max);

        Self {
            layout,
            n_people: people.len(),
            n_seats: layout.seat_count(),
            pairs,
            by_person,
            upper_bound,
            max_abs_weight,
        }
    }

    fn objective(&self, seat_of: &[usize]) -> f64 {
        self.pairs
            .iter()
            .filter(|&&(a, b, _)| self.layout.is_adjacent(seat_of[a], seat_of[b]))
            .map(|&(_, _, w)| w)
            .sum()
    }

    fn person_score(&self, p: usize, seat_of: &[usize]) -> f64 {
        self.by_person[p]
            .iter()
            .filter(|&&(q, _)| self.layout.is_adjacent(seat_of[p], seat_of[q]))
            .map(|&(_, w)| w)
            .sum()
    }

    fn pair_term(&self, p: usize, q: usize, seat_of: &[usize]) -> f64 {
        if !self.layout.is_adjacent(seat_of[p], seat_of[q]) {
            return 0.0;
        }
        self.by_person[p]
            .iter()
            .filter(|&&(other, _)| other == q)
            .map(|&(_, w)| w)
            .sum()
    }

    /// p 與（可能的）交換對象 o 所涉及的目標值，p-o 本身只算一次
    fn affected_score(&self, p: usize, other: Option<usize>, seat_of: &[usize]) -> f64 {
        let mut score = self.person_score(p, seat_of);
        if let Some(o) = other {
            score += self.person_score(o, seat_of) - self.pair_term(p, o, seat_of);
        }
        score
    }

    fn status_for(&self, score: f64) -> SolveStatus {
        if score >= self.upper_bound - SCORE_EPSILON {
            SolveStatus::Optimal
        } else {
            SolveStatus::Feasible
        }
    }
}

/// 依目標值由高到低保存互不相同的前 N 個分配
struct TopPool {
    capacity: usize,
    entries: Vec<(f64, Vec<usize>)>,
}

impl TopPool {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity + 1),
        }
    }

    fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    fn accepts(&self, score: f64) -> bool {
        match self.entries.last() {
            Some((worst, _)) if self.is_full() => score > worst + SCORE_EPSILON,
            _ => true,
        }
    }

    fn offer(&mut self, score: f64, seat_of: &[usize]) -> bool {
        if !self.accepts(score) || self.entries.iter().any(|(_, a)| a == seat_of) {
            return false;
        }
        let pos = self
            .entries
            .iter()
            .position(|(s, _)| score > *s + SCORE_EPSILON)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, (score, seat_of.to_vec()));
        self.entries.truncate(self.capacity);
        true
    }

    fn worst_score(&self) -> Option<f64> {
        self.entries.last().map(|(s, _)| *s)
    }
}

/// S! / (S-P)!，溢位時回傳 u64::MAX
pub fn count_assignments(n_seats: usize, n_people: usize) -> u64 {
    if n_people > n_seats {
        return 0;
    }
    ((n_seats - n_people + 1)..=n_seats).try_fold(1u64, |acc, k| acc.checked_mul(k as u64))
        .unwrap_or(u64::MAX)
}

fn report(progress: &mut Option<&mut dyn FnMut(f32, &str)>, fraction: f32, message: &str) {
    if let Some(callback) = progress.as_mut() {
        callback(fraction, message);
    }
}

/// 求解並回傳前 N 個互不相同的座位方案
pub fn solve_top_n(
    people: &[String],
    layout: &SeatLayout,
    weights: &PairWeights,
    options: &SolverOptions,
    mut progress: Option<&mut dyn FnMut(f32, &str)>,
) -> Result<Vec<AssignmentResult>> {
    let n_people = people.len();
    let n_seats = layout.seat_count();
    let top_n = options.top_n.clamp(1, MAX_TOP_N);

    report(&mut progress, 0.0, "Initializing solver...");

    tracing::debug!(
        "Solving seat assignment: {} people, {} seats, {} weighted pairs, {} edges, top_n={}, time_limit={:?}",
        n_people,
        n_seats,
        weights.len(),
        layout.edges.len(),
        top_n,
        options.time_limit
    );

    if n_people > n_seats {
        return Err(PlannerError::InfeasibleError {
            message: format!(
                "seats ({}) are not enough for everyone ({})",
                n_seats, n_people
            ),
        });
    }

    if n_people == 0 {
        report(&mut progress, 1.0, "Done!");
        return Ok(vec![AssignmentResult::new(
            Assignment::new(),
            0.0,
            SolveStatus::Optimal,
        )]);
    }

    report(&mut progress, 0.1, "Building model...");
    let problem = Problem::new(people, layout, weights);
    log_weight_stats(&problem);

    let mut pool = TopPool::new(top_n);
    let search_space = count_assignments(n_seats, n_people);

    let exact = search_space <= options.exhaustive_limit;
    if exact {
        tracing::debug!("Enumerating all {} assignments", search_space);
        report(&mut progress, 0.5, "Enumerating assignments...");
        enumerate(&problem, &mut pool);
    } else {
        let budget = options.time_limit.saturating_mul(top_n as u32);
        tracing::debug!(
            "Search space {} too large for enumeration, annealing for {:?}",
            search_space,
            budget
        );
        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        anneal(&problem, &mut pool, budget, &mut rng, &mut progress);
    }

    let results: Vec<AssignmentResult> = pool
        .entries
        .into_iter()
        .enumerate()
        .map(|(k, (score, seat_of))| {
            report(
                &mut progress,
                0.5 + 0.4 * (k as f32 + 1.0) / top_n as f32,
                &format!("Collected plan {}/{}", k + 1, top_n),
            );
            let status = if exact {
                SolveStatus::Optimal
            } else {
                problem.status_for(score)
            };
            tracing::debug!("Plan {} objective {:.2} ({})", k + 1, score, status.label());
            let assignment = people
                .iter()
                .cloned()
                .zip(seat_of)
                .collect::<Assignment>();
            AssignmentResult::new(assignment, score, status)
        })
        .collect();

    report(&mut progress, 1.0, "Done!");
    Ok(results)
}

fn log_weight_stats(problem: &Problem) {
    let positive: Vec<f64> = problem.pairs.iter().map(|p| p.2).filter(|w| *w > 0.0).collect();
    let negative: Vec<f64> = problem.pairs.iter().map(|p| p.2).filter(|w| *w < 0.0).collect();
    tracing::debug!(
        "Effective pairs: {} positive, {} negative, upper bound {:.2}",
        positive.len(),
        negative.len(),
        problem.upper_bound
    );
}

/// 窮舉所有單射分配，依字典序走訪
fn enumerate(problem: &Problem, pool: &mut TopPool) {
    let mut seat_of = vec![0usize; problem.n_people];
    let mut used = vec![false; problem.n_seats];
    place(problem, 0, 0.0, &mut seat_of, &mut used, pool);
}

fn place(
    problem: &Problem,
    person: usize,
    score: f64,
    seat_of: &mut [usize],
    used: &mut [bool],
    pool: &mut TopPool,
) {
    if person == problem.n_people {
        pool.offer(score, seat_of);
        return;
    }

    for seat in 0..problem.n_seats {
        if used[seat] {
            continue;
        }
        seat_of[person] = seat;
        used[seat] = true;

        // 只計與已就座者之間的關係
        let gained: f64 = problem.by_person[person]
            .iter()
            .filter(|&&(q, _)| q < person && problem.layout.is_adjacent(seat, seat_of[q]))
            .map(|&(_, w)| w)
            .sum();
        place(problem, person + 1, score + gained, seat_of, used, pool);

        used[seat] = false;
    }
}

fn iterations_per_restart(n_people: usize, n_seats: usize) -> usize {
    (20_000 + 50 * n_people * n_seats).min(2_000_000)
}

/// 模擬退火，多次重啟直到時間用完或已找滿上界解
fn anneal(
    problem: &Problem,
    pool: &mut TopPool,
    budget: Duration,
    rng: &mut StdRng,
    progress: &mut Option<&mut dyn FnMut(f32, &str)>,
) {
    let started = Instant::now();
    let deadline = started + budget;
    let iterations = iterations_per_restart(problem.n_people, problem.n_seats);
    let t_start = problem.max_abs_weight.max(1e-3);
    let t_end = t_start * 1e-3;

    let mut restart = 0usize;
    loop {
        let mut order: Vec<usize> = (0..problem.n_seats).collect();
        order.shuffle(rng);
        let mut seat_of: Vec<usize> = order[..problem.n_people].to_vec();
        let mut person_at: Vec<Option<usize>> = vec![None; problem.n_seats];
        for (p, &s) in seat_of.iter().enumerate() {
            person_at[s] = Some(p);
        }

        let mut score = problem.objective(&seat_of);
        pool.offer(score, &seat_of);

        for it in 0..iterations {
            if it % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
                tracing::debug!("Annealing stopped by time limit after {} restarts", restart);
                return;
            }

            let progress_ratio = it as f64 / iterations as f64;
            let temperature = t_start * (t_end / t_start).powf(progress_ratio);

            let p = rng.gen_range(0..problem.n_people);
            let target = rng.gen_range(0..problem.n_seats);
            let from = seat_of[p];
            if target == from {
                continue;
            }
            let other = person_at[target];

            let before = problem.affected_score(p, other, &seat_of);
            seat_of[p] = target;
            if let Some(o) = other {
                seat_of[o] = from;
            }
            let after = problem.affected_score(p, other, &seat_of);
            let delta = after - before;

            let accept = delta >= 0.0 || rng.gen::<f64>() < (delta / temperature).exp();
            if accept {
                person_at[target] = Some(p);
                person_at[from] = other;
                score += delta;
                if pool.accepts(score) {
                    pool.offer(score, &seat_of);
                }
            } else {
                seat_of[p] = from;
                if let Some(o) = other {
                    seat_of[o] = target;
                }
            }
        }

        restart += 1;
        let elapsed = started.elapsed().as_secs_f32() / budget.as_secs_f32().max(1e-3);
        report(
            progress,
            0.2 + 0.3 * elapsed.min(1.0),
            &format!("Searching (restart {})...", restart),
        );

        let saturated = pool.is_full()
            && pool
                .worst_score()
                .is_some_and(|worst| worst >= problem.upper_bound - SCORE_EPSILON);
        if saturated {
            tracing::debug!("All {} plans reached the upper bound", pool.capacity);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::validate_assignment;
    use crate::domain::model::{LayoutSpec, PairKey};

    fn people(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn weights(entries: &[(&str, &str, f64)]) -> PairWeights {
        entries
            .iter()
            .map(|(a, b, w)| (PairKey::new(a, b).unwrap(), *w))
            .collect()
    }

    fn row_layout(seats: usize) -> SeatLayout {
        // 單排：只有左右相鄰
        SeatLayout::build(
            LayoutSpec {
                n_cols: seats,
                rows_per_col: vec![1; seats],
                include_diagonal: false,
                aisles: vec![],
            },
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_count_assignments() {
        assert_eq!(count_assignments(4, 2), 12);
        assert_eq!(count_assignments(3, 4), 0);
        assert_eq!(count_assignments(100, 60), u64::MAX);
    }

    #[test]
    fn test_too_many_people_is_infeasible() {
        let layout = row_layout(2);
        let err = solve_top_n(
            &people(&["a", "b", "c"]),
            &layout,
            &PairWeights::new(),
            &SolverOptions::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, PlannerError::InfeasibleError { .. }));
    }

    #[test]
    fn test_empty_roster_gives_single_empty_plan() {
        let layout = row_layout(2);
        let results =
            solve_top_n(&[], &layout, &PairWeights::new(), &SolverOptions::default(), None).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].assignment.is_empty());
    }

    #[test]
    fn test_exhaustive_finds_optimum() {
        let layout = row_layout(3);
        let roster = people(&["a", "b", "c"]);
        // a 想坐 b 旁，a 不想坐 c 旁：c 必須在另一端
        let w = weights(&[("a", "b", 5.0), ("a", "c", -5.0)]);

        let results = solve_top_n(&roster, &layout, &w, &SolverOptions::default(), None).unwrap();
        let best = &results[0];
        assert_eq!(best.objective, 5.0);
        assert_eq!(best.status, SolveStatus::Optimal);
        assert!(layout.is_adjacent(best.assignment["a"], best.assignment["b"]));
        assert!(!layout.is_adjacent(best.assignment["a"], best.assignment["c"]));
    }

    #[test]
    fn test_top_n_are_distinct_and_sorted() {
        let layout = row_layout(4);
        let roster = people(&["a", "b", "c"]);
        let w = weights(&[("a", "b", 3.0), ("b", "c", 2.0)]);
        let options = SolverOptions {
            top_n: 5,
            ..Default::default()
        };

        let results = solve_top_n(&roster, &layout, &w, &options, None).unwrap();
        assert_eq!(results.len(), 5);
        for pair in results.windows(2) {
            assert!(pair[0].objective >= pair[1].objective);
            assert_ne!(pair[0].assignment, pair[1].assignment);
        }
        assert_eq!(results[0].objective, 5.0);
        for r in &results {
            validate_assignment(&r.assignment, &roster, &layout.seats).unwrap();
        }
    }

    #[test]
    fn test_top_n_limited_by_distinct_assignments() {
        let layout = row_layout(2);
        let roster = people(&["a", "b"]);
        let options = SolverOptions {
            top_n: 10,
            ..Default::default()
        };
        let results = solve_top_n(&roster, &layout, &PairWeights::new(), &options, None).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_annealing_reaches_upper_bound() {
        let layout = SeatLayout::build(LayoutSpec::uniform(4, 4), 12).unwrap();
        let roster: Vec<String> = (0..12).map(|i| format!("p{}", i)).collect();
        // 三個兩人組，全部都能滿足
        let w: PairWeights = [(0, 1), (2, 3), (4, 5)]
            .iter()
            .map(|(a, b)| (PairKey::new(&roster[*a], &roster[*b]).unwrap(), 4.0))
            .collect();
        let options = SolverOptions {
            top_n: 2,
            time_limit: Duration::from_secs(2),
            seed: Some(7),
            exhaustive_limit: 0,
        };

        let results = solve_top_n(&roster, &layout, &w, &options, None).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].objective, 12.0);
        assert_eq!(results[0].status, SolveStatus::Optimal);
        assert_ne!(results[0].assignment, results[1].assignment);
        for r in &results {
            validate_assignment(&r.assignment, &roster, &layout.seats).unwrap();
        }
    }

    #[test]
    fn test_progress_reaches_completion() {
        let layout = row_layout(3);
        let roster = people(&["a", "b"]);
        let mut seen = Vec::new();
        let mut callback = |fraction: f32, message: &str| seen.push((fraction, message.to_string()));

        solve_top_n(
            &roster,
            &layout,
            &PairWeights::new(),
            &SolverOptions::default(),
            Some(&mut callback),
        )
        .unwrap();

        assert_eq!(seen.first().map(|s| s.0), Some(0.0));
        assert_eq!(seen.last().map(|s| s.0), Some(1.0));
    }

    #[test]
    fn test_unknown_names_in_weights_are_ignored() {
        let layout = row_layout(2);
        let roster = people(&["a", "b"]);
        let w = weights(&[("a", "ghost", 10.0)]);
        let results = solve_top_n(&roster, &layout, &w, &SolverOptions::default(), None).unwrap();
        assert_eq!(results[0].objective, 0.0);
    }
}
