use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// 座位座標（列、排皆從 0 開始）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Seat {
    pub col: usize,
    pub row: usize,
}

impl Seat {
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }

    pub fn label(&self) -> String {
        format!("C{}-R{}", self.col + 1, self.row + 1)
    }
}

/// 兩列之間的過道，會阻斷左右與對角的鄰座關係
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aisle {
    pub left: usize,
    pub right: usize,
}

impl Aisle {
    pub fn separates(&self, a: usize, b: usize) -> bool {
        (self.left == a && self.right == b) || (self.left == b && self.right == a)
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSpec {
    pub n_cols: usize,
    pub rows_per_col: Vec<usize>,
    #[serde(default = "default_true")]
    pub include_diagonal: bool,
    #[serde(default)]
    pub aisles: Vec<Aisle>,
}

impl LayoutSpec {
    pub fn uniform(n_cols: usize, rows: usize) -> Self {
        Self {
            n_cols,
            rows_per_col: vec![rows; n_cols],
            include_diagonal: true,
            aisles: Vec::new(),
        }
    }

    pub fn total_seats(&self) -> usize {
        self.rows_per_col.iter().sum()
    }

    pub fn max_rows(&self) -> usize {
        self.rows_per_col.iter().copied().max().unwrap_or(0)
    }
}

/// 有向鄰座邊
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: Seat,
    pub to: Seat,
}

/// 無序人名對，內部以字典序存放
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey(String, String);

impl PairKey {
    /// 兩個名字相同時回傳 None
    pub fn new(a: &str, b: &str) -> Option<Self> {
        if a == b {
            return None;
        }
        if a < b {
            Some(Self(a.to_string(), b.to_string()))
        } else {
            Some(Self(b.to_string(), a.to_string()))
        }
    }

    pub fn first(&self) -> &str {
        &self.0
    }

    pub fn second(&self) -> &str {
        &self.1
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} & {}", self.0, self.1)
    }
}

/// 依等級分組的關係對，等級從 1 開始
pub type RankedPairs = BTreeMap<usize, BTreeSet<PairKey>>;

pub type PairWeights = BTreeMap<PairKey, f64>;

/// 人名 -> 座位索引
pub type Assignment = BTreeMap<String, usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceKind {
    Willing,
    Unwilling,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedRanges {
    pub willing: Option<String>,
    pub unwilling: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub willing: RankedPairs,
    pub unwilling: RankedPairs,
    pub willing_headers: Vec<String>,
    pub unwilling_headers: Vec<String>,
    pub detected: Option<DetectedRanges>,
}

impl Preferences {
    pub fn add(&mut self, kind: PreferenceKind, rank: usize, pair: PairKey) {
        let ranked = match kind {
            PreferenceKind::Willing => &mut self.willing,
            PreferenceKind::Unwilling => &mut self.unwilling,
        };
        ranked.entry(rank).or_default().insert(pair);
    }

    pub fn willing_count(&self) -> usize {
        self.willing.values().map(BTreeSet::len).sum()
    }

    pub fn unwilling_count(&self) -> usize {
        self.unwilling.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.willing_count() == 0 && self.unwilling_count() == 0
    }

    /// 把另一組關係併入同等級
    pub fn merge(&mut self, other: Preferences) {
        for (rank, pairs) in other.willing {
            self.willing.entry(rank).or_default().extend(pairs);
        }
        for (rank, pairs) in other.unwilling {
            self.unwilling.entry(rank).or_default().extend(pairs);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPair {
    pub a: String,
    pub b: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    Optimal,
    Feasible,
}

impl SolveStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Feasible => "feasible",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SatisfactionMetrics {
    pub n_satisfied: usize,
    pub n_people_with_preference: usize,
    pub n_satisfied_pairs: usize,
    pub first_preference_rate: f64,
    pub satisfaction_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub assignment: Assignment,
    pub objective: f64,
    pub status: SolveStatus,
    #[serde(default)]
    pub metrics: SatisfactionMetrics,
}

impl AssignmentResult {
    pub fn new(assignment: Assignment, objective: f64, status: SolveStatus) -> Self {
        Self {
            assignment,
            objective,
            status,
            metrics: SatisfactionMetrics::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSatisfaction {
    pub kind: PreferenceKind,
    pub rank: usize,
    pub label: String,
    pub total_pairs: usize,
    pub satisfied_pairs: usize,
    pub rate: f64,
}

/// extract 階段的輸出
#[derive(Debug, Clone, Default)]
pub struct PlanInput {
    pub people: Vec<String>,
    pub preferences: Preferences,
    pub custom_pairs: Vec<CustomPair>,
}

/// transform 階段的輸出
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub people: Vec<String>,
    pub layout: LayoutSpec,
    pub preferences: Preferences,
    pub weights: PairWeights,
    pub results: Vec<AssignmentResult>,
    pub levels: Vec<LevelSatisfaction>,
}
