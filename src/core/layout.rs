use crate::domain::model::{Aisle, Edge, LayoutSpec, Seat};
use crate::utils::error::{PlannerError, Result};
use std::collections::{HashMap, HashSet};

/// 依列產生座位：先第一列由前到後，再下一列
pub fn generate_seats(n_cols: usize, rows_per_col: &[usize]) -> Vec<Seat> {
    (0..n_cols)
        .flat_map(|c| {
            let rows = rows_per_col.get(c).copied().unwrap_or(0);
            (0..rows).map(move |r| Seat::new(c, r))
        })
        .collect()
}

fn has_aisle_between(aisles: &[Aisle], a: usize, b: usize) -> bool {
    aisles.iter().any(|aisle| aisle.separates(a, b))
}

/// 產生雙向鄰座邊
pub fn generate_adjacent_edges(
    n_cols: usize,
    rows_per_col: &[usize],
    include_diagonal: bool,
    aisles: &[Aisle],
) -> Vec<Edge> {
    let rows_of = |c: usize| rows_per_col.get(c).copied().unwrap_or(0);
    let mut edges = Vec::new();
    let mut link = |a: Seat, b: Seat| {
        edges.push(Edge { from: a, to: b });
        edges.push(Edge { from: b, to: a });
    };

    for c in 0..n_cols {
        let open_right = c + 1 < n_cols && !has_aisle_between(aisles, c, c + 1);
        let right_rows = if c + 1 < n_cols { rows_of(c + 1) } else { 0 };

        for r in 0..rows_of(c) {
            let curr = Seat::new(c, r);

            if open_right && r < right_rows {
                link(curr, Seat::new(c + 1, r));
            }

            if r + 1 < rows_of(c) {
                link(curr, Seat::new(c, r + 1));
            }

            if include_diagonal && open_right {
                if r + 1 < right_rows {
                    link(curr, Seat::new(c + 1, r + 1));
                }
                if r >= 1 && r - 1 < right_rows {
                    link(curr, Seat::new(c + 1, r - 1));
                }
            }
        }
    }

    edges
}

/// 相鄰的座位索引對，(小, 大)
pub fn adjacent_seat_pairs(seats: &[Seat], edges: &[Edge]) -> HashSet<(usize, usize)> {
    let index: HashMap<Seat, usize> = seats.iter().enumerate().map(|(i, s)| (*s, i)).collect();

    edges
        .iter()
        .filter_map(|edge| {
            let a = *index.get(&edge.from)?;
            let b = *index.get(&edge.to)?;
            Some((a.min(b), a.max(b)))
        })
        .collect()
}

/// 教室最多 20 列、每列最多 30 排
pub const MAX_COLUMNS: usize = 20;
pub const MAX_ROWS_PER_COLUMN: usize = 30;

pub fn validate_layout(n_cols: usize, rows_per_col: &[usize], num_people: usize) -> Result<()> {
    if n_cols == 0 {
        return Err(PlannerError::layout("Number of columns must be greater than 0"));
    }

    if n_cols > MAX_COLUMNS {
        return Err(PlannerError::layout(format!(
            "Number of columns ({}) exceeds the maximum of {}",
            n_cols, MAX_COLUMNS
        )));
    }

    if rows_per_col.len() != n_cols {
        return Err(PlannerError::layout(format!(
            "Rows-per-column entries ({}) do not match the column count ({})",
            rows_per_col.len(),
            n_cols
        )));
    }

    if rows_per_col.iter().any(|&r| r == 0) {
        return Err(PlannerError::layout("Every column needs at least one row"));
    }

    if let Some(&rows) = rows_per_col.iter().find(|&&r| r > MAX_ROWS_PER_COLUMN) {
        return Err(PlannerError::layout(format!(
            "A column has {} rows, the maximum is {}",
            rows, MAX_ROWS_PER_COLUMN
        )));
    }

    let total_seats: usize = rows_per_col.iter().sum();
    if total_seats < num_people {
        return Err(PlannerError::layout(format!(
            "Total seats ({}) fewer than people ({})",
            total_seats, num_people
        )));
    }

    Ok(())
}

pub fn validate_aisles(n_cols: usize, aisles: &[Aisle]) -> Result<()> {
    for aisle in aisles {
        if aisle.left >= aisle.right || aisle.right >= n_cols {
            return Err(PlannerError::layout(format!(
                "Aisle between columns {} and {} is outside the {}-column room",
                aisle.left + 1,
                aisle.right + 1,
                n_cols
            )));
        }
    }
    Ok(())
}

pub fn seat_label(seat_idx: usize, seats: &[Seat]) -> String {
    seats
        .get(seat_idx)
        .map(Seat::label)
        .unwrap_or_else(|| "unknown seat".to_string())
}

/// 平均分配人數到每列，至少一排
pub fn default_rows_per_col(num_people: usize, n_cols: usize) -> usize {
    if n_cols == 0 {
        return 1;
    }
    num_people.div_ceil(n_cols).max(1)
}

/// 已驗證的教室佈局，含鄰座查詢
#[derive(Debug, Clone)]
pub struct SeatLayout {
    pub spec: LayoutSpec,
    pub seats: Vec<Seat>,
    pub edges: Vec<Edge>,
    adjacency: HashSet<(usize, usize)>,
}

impl SeatLayout {
    pub fn build(spec: LayoutSpec, num_people: usize) -> Result<Self> {
        validate_layout(spec.n_cols, &spec.rows_per_col, num_people)?;
        validate_aisles(spec.n_cols, &spec.aisles)?;
        Ok(Self::from_spec(spec))
    }

    fn from_spec(spec: LayoutSpec) -> Self {
        let seats = generate_seats(spec.n_cols, &spec.rows_per_col);
        let edges = generate_adjacent_edges(
            spec.n_cols,
            &spec.rows_per_col,
            spec.include_diagonal,
            &spec.aisles,
        );
        let adjacency = adjacent_seat_pairs(&seats, &edges);

        Self {
            spec,
            seats,
            edges,
            adjacency,
        }
    }

    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }

    pub fn is_adjacent(&self, a: usize, b: usize) -> bool {
        a != b && self.adjacency.contains(&(a.min(b), a.max(b)))
    }

    pub fn adjacent_pair_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn label(&self, seat_idx: usize) -> String {
        seat_label(seat_idx, &self.seats)
    }
}
