use crate::core::layout::SeatLayout;
use crate::core::metrics::AssignmentSummary;
use crate::domain::model::{
    Assignment, AssignmentResult, LevelSatisfaction, PairWeights, PlanOutcome, PreferenceKind,
};
use crate::utils::error::{PlannerError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

const CELL_W: f64 = 120.0;
const CELL_H: f64 = 72.0;
const MARGIN: f64 = 30.0;
const AISLE_GAP: f64 = 30.0;
/// 權重絕對值超過此值才畫關係線
const LINE_WEIGHT_THRESHOLD: f64 = 3.0;

const POSITIVE_COLORS: [&str; 5] = ["#28a745", "#20c997", "#17a2b8", "#6f42c1", "#e83e8c"];
const NEGATIVE_COLORS: [&str; 5] = ["#dc3545", "#fd7e14", "#ffc107", "#6c757d", "#343a40"];

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    pub show_all_lines: bool,
    /// 另外輸出正向與負向關係各一張圖
    pub split_visualization: bool,
}

fn csv_to_string(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| PlannerError::ProcessingError {
            message: format!("Failed to flush CSV writer: {}", e),
        })?;
    String::from_utf8(bytes).map_err(|e| PlannerError::ProcessingError {
        message: format!("CSV output is not UTF-8: {}", e),
    })
}

fn seat_to_person(assignment: &Assignment) -> HashMap<usize, &str> {
    assignment
        .iter()
        .map(|(name, &seat)| (seat, name.as_str()))
        .collect()
}

/// 座位表：標題列、欄標題、每排一列
pub fn seat_chart_csv(assignment: &Assignment, layout: &SeatLayout) -> Result<String> {
    let n_cols = layout.spec.n_cols;
    let max_rows = layout.spec.max_rows();
    let occupants = seat_to_person(assignment);

    let mut grid = vec![vec![String::new(); n_cols]; max_rows];
    for (idx, seat) in layout.seats.iter().enumerate() {
        if let Some(name) = occupants.get(&idx) {
            grid[seat.row][seat.col] = name.to_string();
        }
    }

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    writer.write_record(["Seat Plan"])?;

    let mut header = vec![String::new()];
    header.extend((1..=n_cols).map(|c| format!("Column {}", c)));
    writer.write_record(&header)?;

    for (r, cells) in grid.into_iter().enumerate() {
        let mut record = vec![format!("Row {}", r + 1)];
        record.extend(cells);
        writer.write_record(&record)?;
    }

    csv_to_string(writer)
}

/// 姓名與座位號對照
pub fn assignment_list_csv(assignment: &Assignment, layout: &SeatLayout) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["name", "seat"])?;
    for (name, &seat) in assignment {
        writer.write_record([name.as_str(), layout.label(seat).as_str()])?;
    }
    csv_to_string(writer)
}

/// 方案比較表
pub fn summary_csv(results: &[AssignmentResult]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "plan",
        "objective",
        "satisfaction_rate",
        "satisfied_people",
        "satisfied_pairs",
        "status",
    ])?;
    for (i, result) in results.iter().enumerate() {
        let summary = AssignmentSummary::from(result);
        writer.write_record([
            format!("Plan {}", i + 1),
            format!("{:.2}", summary.objective),
            summary.satisfaction_rate,
            summary.n_satisfied.to_string(),
            summary.n_satisfied_pairs.to_string(),
            summary.status,
        ])?;
    }
    csv_to_string(writer)
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// 各列的 x 座標，過道後多留間距
fn column_offsets(layout: &SeatLayout) -> Vec<f64> {
    let mut x = MARGIN;
    (0..layout.spec.n_cols)
        .map(|c| {
            let current = x;
            x += CELL_W;
            if layout.spec.aisles.iter().any(|a| a.left == c) {
                x += AISLE_GAP;
            }
            current
        })
        .collect()
}

struct Canvas {
    cols_x: Vec<f64>,
    width: f64,
    height: f64,
    max_rows: usize,
}

impl Canvas {
    fn new(layout: &SeatLayout) -> Self {
        let cols_x = column_offsets(layout);
        let width = cols_x.last().map(|x| x + CELL_W).unwrap_or(MARGIN) + MARGIN;
        let max_rows = layout.spec.max_rows();
        Self {
            cols_x,
            width,
            height: max_rows as f64 * CELL_H + 2.0 * MARGIN,
            max_rows,
        }
    }

    /// 座位左上角，R1 畫在最下方
    fn origin(&self, col: usize, row: usize) -> (f64, f64) {
        let x = self.cols_x.get(col).copied().unwrap_or(MARGIN);
        let y = MARGIN + (self.max_rows - row - 1) as f64 * CELL_H;
        (x, y)
    }

    fn center(&self, col: usize, row: usize) -> (f64, f64) {
        let (x, y) = self.origin(col, row);
        (x + CELL_W / 2.0, y + CELL_H / 2.0)
    }

    fn open(&self, out: &mut String, title: &str) {
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="0 0 {:.0} {:.0}" font-family="sans-serif">"#,
            self.width, self.height, self.width, self.height
        );
        let _ = writeln!(out, "<title>{}</title>", escape_xml(title));
        let _ = writeln!(
            out,
            r##"<rect width="100%" height="100%" fill="#f8f9fa"/>"##
        );
    }

    fn aisles(&self, out: &mut String, layout: &SeatLayout) {
        for aisle in &layout.spec.aisles {
            let Some(left_x) = self.cols_x.get(aisle.left) else {
                continue;
            };
            let x = left_x + CELL_W + AISLE_GAP / 2.0;
            let _ = writeln!(
                out,
                r##"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#6c757d" stroke-width="3" stroke-dasharray="8 6" opacity="0.7"/>"##,
                x,
                MARGIN,
                x,
                self.height - MARGIN
            );
            let _ = writeln!(
                out,
                r##"<text x="{:.1}" y="{:.1}" font-size="10" fill="#6c757d" transform="rotate(90 {:.1} {:.1})">aisle</text>"##,
                x + 4.0,
                self.height / 2.0,
                x + 4.0,
                self.height / 2.0
            );
        }
    }
}

fn draw_seats(out: &mut String, canvas: &Canvas, layout: &SeatLayout, assignment: &Assignment) {
    let occupants = seat_to_person(assignment);
    for (idx, seat) in layout.seats.iter().enumerate() {
        let (x, y) = canvas.origin(seat.col, seat.row);
        let _ = writeln!(
            out,
            r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="#e9ecef" stroke="#adb5bd"/>"##,
            x, y, CELL_W, CELL_H
        );
        let _ = writeln!(
            out,
            r##"<text x="{:.1}" y="{:.1}" font-size="9" fill="#6c757d">{}</text>"##,
            x + 6.0,
            y + 14.0,
            seat.label()
        );
        if let Some(name) = occupants.get(&idx) {
            let size = (60 / name.chars().count().max(1)).clamp(9, 14);
            let _ = writeln!(
                out,
                r#"<text x="{:.1}" y="{:.1}" font-size="{}" font-weight="bold" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
                x + CELL_W / 2.0,
                y + CELL_H / 2.0,
                size,
                escape_xml(name)
            );
        }
    }
}

/// 畫出單一種類的關係線，顏色與偏移依該種類已畫的線數決定
fn draw_relationship_lines(
    out: &mut String,
    canvas: &Canvas,
    layout: &SeatLayout,
    assignment: &Assignment,
    weights: &PairWeights,
    kind: PreferenceKind,
    show_all_lines: bool,
) {
    let positive = kind == PreferenceKind::Willing;
    let (palette, dash) = if positive {
        (&POSITIVE_COLORS, "")
    } else {
        (&NEGATIVE_COLORS, r#" stroke-dasharray="6 4""#)
    };

    let mut drawn: HashMap<&str, usize> = HashMap::new();
    for (pair, &w) in weights {
        if w.abs() <= LINE_WEIGHT_THRESHOLD || (w > 0.0) != positive {
            continue;
        }
        let (Some(&a), Some(&b)) = (assignment.get(pair.first()), assignment.get(pair.second()))
        else {
            continue;
        };
        if !show_all_lines && layout.is_adjacent(a, b) != positive {
            continue;
        }
        let (Some(sa), Some(sb)) = (layout.seats.get(a), layout.seats.get(b)) else {
            continue;
        };

        let count = drawn.get(pair.first()).copied().unwrap_or(0)
            + drawn.get(pair.second()).copied().unwrap_or(0);
        let color = palette[count % palette.len()];

        let (x1, y1) = canvas.center(sa.col, sa.row);
        let (x2, y2) = canvas.center(sb.col, sb.row);
        // 同一人多條線時稍微偏移，避免重疊
        let offset = count as f64 * 4.0;
        let length = ((x2 - x1).abs() + (y2 - y1).abs()).max(1.0);
        let dx = (y2 - y1) * offset / length;
        let dy = -(x2 - x1) * offset / length;

        let _ = writeln!(
            out,
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="2" opacity="0.6" stroke-linecap="round"{}/>"#,
            x1 + dx,
            y1 + dy,
            x2 + dx,
            y2 + dy,
            color,
            dash
        );

        *drawn.entry(pair.first()).or_default() += 1;
        *drawn.entry(pair.second()).or_default() += 1;
    }
}

fn render_chart(
    title: &str,
    assignment: &Assignment,
    layout: &SeatLayout,
    weights: &PairWeights,
    kinds: &[PreferenceKind],
    show_all_lines: bool,
) -> String {
    let canvas = Canvas::new(layout);
    let mut out = String::new();
    canvas.open(&mut out, title);
    draw_seats(&mut out, &canvas, layout, assignment);
    canvas.aisles(&mut out, layout);
    for &kind in kinds {
        draw_relationship_lines(&mut out, &canvas, layout, assignment, weights, kind, show_all_lines);
    }
    out.push_str("</svg>\n");
    out
}

/// 座位圖，含滿足的喜好連線與成功分開的不喜好連線
pub fn render_assignment_svg(
    assignment: &Assignment,
    layout: &SeatLayout,
    weights: &PairWeights,
    options: ExportOptions,
) -> String {
    render_chart(
        "Seat assignment",
        assignment,
        layout,
        weights,
        &[PreferenceKind::Willing, PreferenceKind::Unwilling],
        options.show_all_lines,
    )
}

/// 拆分視圖：只畫一種關係
pub fn render_relationship_svg(
    assignment: &Assignment,
    layout: &SeatLayout,
    weights: &PairWeights,
    kind: PreferenceKind,
    options: ExportOptions,
) -> String {
    let title = match kind {
        PreferenceKind::Willing => "Positive relationships",
        PreferenceKind::Unwilling => "Negative relationships",
    };
    render_chart(title, assignment, layout, weights, &[kind], options.show_all_lines)
}

/// 教室佈局預覽：座位、鄰座邊、過道
pub fn render_layout_svg(layout: &SeatLayout) -> String {
    let canvas = Canvas::new(layout);
    let mut out = String::new();
    canvas.open(&mut out, "Classroom layout");

    for seat in &layout.seats {
        let (x, y) = canvas.origin(seat.col, seat.row);
        let _ = writeln!(
            out,
            r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="#d3d3d3" fill-opacity="0.5" stroke="#000000"/>"##,
            x + 6.0,
            y + 6.0,
            CELL_W - 12.0,
            CELL_H - 12.0
        );
        let _ = writeln!(
            out,
            r#"<text x="{:.1}" y="{:.1}" font-size="11" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
            x + CELL_W / 2.0,
            y + CELL_H / 2.0,
            seat.label()
        );
    }

    for edge in &layout.edges {
        // 有向邊成對出現，只畫一次
        if (edge.from.col, edge.from.row) > (edge.to.col, edge.to.row) {
            continue;
        }
        let (x1, y1) = canvas.center(edge.from.col, edge.from.row);
        let (x2, y2) = canvas.center(edge.to.col, edge.to.row);
        let _ = writeln!(
            out,
            r##"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#0000ff" stroke-opacity="0.3"/>"##,
            x1, y1, x2, y2
        );
    }

    canvas.aisles(&mut out, layout);
    out.push_str("</svg>\n");
    out
}

#[derive(Serialize)]
struct PlanRecord<'a> {
    plan: usize,
    summary: AssignmentSummary,
    metrics: &'a crate::domain::model::SatisfactionMetrics,
    seats: Vec<SeatRecord<'a>>,
}

#[derive(Serialize)]
struct SeatRecord<'a> {
    name: &'a str,
    seat_index: usize,
    seat: String,
}

#[derive(Serialize)]
struct ResultsDocument<'a> {
    generated_at: String,
    people: &'a [String],
    layout: &'a crate::domain::model::LayoutSpec,
    plans: Vec<PlanRecord<'a>>,
    levels: &'a [LevelSatisfaction],
}

fn results_json(outcome: &PlanOutcome, layout: &SeatLayout) -> Result<String> {
    let plans = outcome
        .results
        .iter()
        .enumerate()
        .map(|(i, result)| PlanRecord {
            plan: i + 1,
            summary: AssignmentSummary::from(result),
            metrics: &result.metrics,
            seats: result
                .assignment
                .iter()
                .map(|(name, &seat)| SeatRecord {
                    name,
                    seat_index: seat,
                    seat: layout.label(seat),
                })
                .collect(),
        })
        .collect();

    let doc = ResultsDocument {
        generated_at: chrono::Utc::now().to_rfc3339(),
        people: &outcome.people,
        layout: &outcome.layout,
        plans,
        levels: &outcome.levels,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// 打包所有方案的輸出檔
pub fn export_bundle(outcome: &PlanOutcome, options: ExportOptions) -> Result<Vec<u8>> {
    let layout = SeatLayout::build(outcome.layout.clone(), outcome.people.len())?;
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let file_options = SimpleFileOptions::default();

    zip.start_file("layout.svg", file_options)?;
    zip.write_all(render_layout_svg(&layout).as_bytes())?;

    zip.start_file("summary.csv", file_options)?;
    zip.write_all(summary_csv(&outcome.results)?.as_bytes())?;

    zip.start_file("results.json", file_options)?;
    zip.write_all(results_json(outcome, &layout)?.as_bytes())?;

    for (i, result) in outcome.results.iter().enumerate() {
        let dir = format!("plan_{}", i + 1);

        zip.start_file(format!("{}/seat_chart.csv", dir), file_options)?;
        zip.write_all(seat_chart_csv(&result.assignment, &layout)?.as_bytes())?;

        zip.start_file(format!("{}/assignment.csv", dir), file_options)?;
        zip.write_all(assignment_list_csv(&result.assignment, &layout)?.as_bytes())?;

        zip.start_file(format!("{}/seat_chart.svg", dir), file_options)?;
        let svg = render_assignment_svg(&result.assignment, &layout, &outcome.weights, options);
        zip.write_all(svg.as_bytes())?;

        if options.split_visualization {
            for (file, kind) in [
                ("positive_relationships.svg", PreferenceKind::Willing),
                ("negative_relationships.svg", PreferenceKind::Unwilling),
            ] {
                zip.start_file(format!("{}/{}", dir, file), file_options)?;
                let svg = render_relationship_svg(
                    &result.assignment,
                    &layout,
                    &outcome.weights,
                    kind,
                    options,
                );
                zip.write_all(svg.as_bytes())?;
            }
        }
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
