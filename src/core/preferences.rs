use crate::domain::model::{
    CustomPair, DetectedRanges, PairKey, PairWeights, PreferenceKind, Preferences,
};
use crate::utils::error::{PlannerError, Result};
use serde::{Deserialize, Serialize};

const HEADER_KEYWORDS: [&str; 4] = ["姓名", "name", "名字", "学生姓名"];

pub const DEFAULT_WILLING_RANGE: &str = "A1:B10";
pub const DEFAULT_UNWILLING_RANGE: &str = "D1:E10";

/// 以 A1 位址存取的原始儲存格表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// 從 CSV 讀取，不把第一列視為表頭
    pub fn from_csv_bytes(data: &[u8]) -> Result<Self> {
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { rows })
    }

    pub fn max_row(&self) -> usize {
        self.rows.len()
    }

    pub fn max_col(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// 0-based 儲存格，空白視為 None
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start_col: usize,
    pub start_row: usize,
    pub end_col: usize,
    pub end_row: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceSource {
    #[serde(default = "default_willing_range")]
    pub willing_range: String,
    #[serde(default = "default_unwilling_range")]
    pub unwilling_range: String,
    #[serde(default)]
    pub auto_detect: bool,
}

fn default_willing_range() -> String {
    DEFAULT_WILLING_RANGE.to_string()
}

fn default_unwilling_range() -> String {
    DEFAULT_UNWILLING_RANGE.to_string()
}

impl Default for PreferenceSource {
    fn default() -> Self {
        Self {
            willing_range: default_willing_range(),
            unwilling_range: default_unwilling_range(),
            auto_detect: true,
        }
    }
}

/// "A" -> 1, "Z" -> 26, "AA" -> 27
pub fn column_index_from_string(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0usize, |acc, ch| {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
}

/// 0-based 欄索引轉成欄字母
pub fn column_letter(col: usize) -> String {
    let mut n = col + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn split_cell_ref(cell: &str) -> Option<(usize, Option<usize>)> {
    let cell = cell.trim();
    let letters: String = cell.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits = &cell[letters.len()..];

    let col = column_index_from_string(&letters)? - 1;
    let row = if digits.is_empty() {
        None
    } else {
        let n: usize = digits.parse().ok()?;
        Some(n.checked_sub(1)?)
    };
    Some((col, row))
}

/// 解析 "A1:C5"，列號缺省時起始為 0、結束不設限
pub fn parse_cell_range(range_spec: &str) -> Option<CellRange> {
    let (start, end) = range_spec.split_once(':')?;
    let (start_col, start_row) = split_cell_ref(start)?;
    let (end_col, end_row) = split_cell_ref(end)?;

    Some(CellRange {
        start_col,
        start_row: start_row.unwrap_or(0),
        end_col,
        end_row,
    })
}

/// 從名單表讀取人員，第一列為表頭
pub fn load_names(sheet: &Sheet, column_spec: &str) -> Result<Vec<String>> {
    let range = parse_cell_range(column_spec).ok_or_else(|| PlannerError::InvalidConfigValueError {
        field: "name_column".to_string(),
        value: column_spec.to_string(),
        reason: "Expected a column range such as A:A".to_string(),
    })?;

    if sheet.max_row() == 0 {
        return Err(PlannerError::validation("Roster sheet is empty"));
    }

    let mut names: Vec<String> = Vec::new();
    for row in 1..sheet.max_row() {
        let Some(value) = sheet.cell(row, range.start_col) else {
            continue;
        };
        let lowered = value.to_lowercase();
        if HEADER_KEYWORDS.iter().any(|k| *k == lowered) {
            continue;
        }
        if !names.iter().any(|n| n == value) {
            names.push(value.to_string());
        }
    }

    Ok(names)
}

/// 自動辨識喜好範圍：以空欄分隔，第一組為願意，第二組為不願意
pub fn auto_detect_ranges(sheet: &Sheet) -> DetectedRanges {
    let max_row = sheet.max_row();
    let data_columns: Vec<usize> = (0..sheet.max_col())
        .filter(|&col| (0..max_row).any(|row| sheet.cell(row, col).is_some()))
        .collect();

    if data_columns.len() < 2 {
        return DetectedRanges::default();
    }

    let mut groups: Vec<Vec<usize>> = vec![vec![data_columns[0]]];
    for pair in data_columns.windows(2) {
        if pair[1] - pair[0] == 1 {
            if let Some(group) = groups.last_mut() {
                group.push(pair[1]);
            }
        } else {
            groups.push(vec![pair[1]]);
        }
    }

    let deepest_row = |cols: &[usize]| {
        cols.iter()
            .filter_map(|&col| (0..max_row).rev().find(|&row| sheet.cell(row, col).is_some()))
            .max()
            .unwrap_or(0)
    };

    let to_range = |cols: &Vec<usize>| {
        let start = cols.first().copied().unwrap_or(0);
        let end = cols.last().copied().unwrap_or(start);
        format!(
            "{}1:{}{}",
            column_letter(start),
            column_letter(end),
            deepest_row(cols.as_slice()) + 1
        )
    };

    DetectedRanges {
        willing: groups.first().map(to_range),
        unwilling: groups.get(1).map(to_range),
    }
}

fn parse_pair_cell(value: &str) -> Option<PairKey> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() != 2 {
        return None;
    }
    let (a, b) = (parts[0].trim(), parts[1].trim());
    if a.is_empty() || b.is_empty() {
        return None;
    }
    PairKey::new(a, b)
}

fn read_ranked_columns(
    sheet: &Sheet,
    range: &CellRange,
    kind: PreferenceKind,
    prefs: &mut Preferences,
) {
    let last_row = range
        .end_row
        .map(|r| (r + 1).min(sheet.max_row()))
        .unwrap_or(sheet.max_row());

    // 表格最後一欄之後不會有資料
    let Some(last_col) = sheet.max_col().checked_sub(1) else {
        return;
    };
    let end_col = range.end_col.min(last_col);

    for (level, col) in (range.start_col..=end_col).enumerate() {
        let rank = level + 1;
        for row in range.start_row..last_row {
            if let Some(pair) = sheet.cell(row, col).and_then(parse_pair_cell) {
                prefs.add(kind, rank, pair);
            }
        }

        let header = match kind {
            PreferenceKind::Willing => format!("Willing rank {}: column {}", rank, column_letter(col)),
            PreferenceKind::Unwilling => {
                format!("Unwilling rank {}: column {}", rank, column_letter(col))
            }
        };
        match kind {
            PreferenceKind::Willing => prefs.willing_headers.push(header),
            PreferenceKind::Unwilling => prefs.unwilling_headers.push(header),
        }
    }
}

/// 讀取喜好表，每欄一個等級，每格為 "甲,乙"
pub fn load_preferences(sheet: &Sheet, source: &PreferenceSource) -> Result<Preferences> {
    let mut prefs = Preferences::default();
    let mut willing_spec = source.willing_range.clone();
    let mut unwilling_spec = source.unwilling_range.clone();

    if source.auto_detect {
        let detected = auto_detect_ranges(sheet);
        if let Some(range) = &detected.willing {
            willing_spec = range.clone();
        }
        if let Some(range) = &detected.unwilling {
            unwilling_spec = range.clone();
        }
        tracing::debug!(
            "Auto-detected preference ranges: willing={:?}, unwilling={:?}",
            detected.willing,
            detected.unwilling
        );
        prefs.detected = Some(detected);
    }

    let willing = parse_cell_range(&willing_spec);
    let unwilling = parse_cell_range(&unwilling_spec);
    if willing.is_none() && unwilling.is_none() {
        return Err(PlannerError::InvalidConfigValueError {
            field: "willing_range".to_string(),
            value: willing_spec,
            reason: "Neither preference range could be parsed".to_string(),
        });
    }

    if let Some(range) = willing {
        read_ranked_columns(sheet, &range, PreferenceKind::Willing, &mut prefs);
    }
    if let Some(range) = unwilling {
        read_ranked_columns(sheet, &range, PreferenceKind::Unwilling, &mut prefs);
    }

    Ok(prefs)
}

/// 每行 "甲,乙,權重"，格式不符的行略過
pub fn parse_custom_weights(text: &str) -> Vec<CustomPair> {
    text.lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            if parts.len() != 3 || parts[0].is_empty() || parts[1].is_empty() {
                return None;
            }
            let weight: f64 = parts[2].parse().ok()?;
            Some(CustomPair {
                a: parts[0].to_string(),
                b: parts[1].to_string(),
                weight,
            })
        })
        .collect()
}

fn parse_kind(word: &str) -> Option<PreferenceKind> {
    match word.to_lowercase().as_str() {
        "喜欢" | "喜歡" | "like" | "likes" | "willing" => Some(PreferenceKind::Willing),
        "不喜欢" | "不喜歡" | "dislike" | "dislikes" | "unwilling" => {
            Some(PreferenceKind::Unwilling)
        }
        _ => None,
    }
}

/// 手動輸入：每行 "甲,喜欢,乙" 或 "甲,不喜欢,乙"，
/// 也接受 "甲,乙,權重" 形式的自訂權重
pub fn parse_manual_preferences(text: &str) -> (Preferences, Vec<CustomPair>) {
    let mut prefs = Preferences::default();
    let mut custom = Vec::new();

    for line in text.lines() {
        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            continue;
        }
        if let Some(kind) = parse_kind(parts[1]) {
            if parts[0].is_empty() || parts[2].is_empty() {
                continue;
            }
            if let Some(pair) = PairKey::new(parts[0], parts[2]) {
                prefs.add(kind, 1, pair);
            }
        } else {
            custom.extend(parse_custom_weights(line));
        }
    }

    (prefs, custom)
}

/// 願意等級 k 用 like_weights[k-1]，不願意等級 k 用 -|dislike_weights[k-1]|，
/// 自訂權重最後覆蓋
pub fn compute_pair_weights(
    prefs: &Preferences,
    like_weights: &[f64],
    dislike_weights: &[f64],
    custom_pairs: &[CustomPair],
) -> PairWeights {
    let mut weights = PairWeights::new();

    for (rank, pairs) in &prefs.willing {
        if let Some(w) = rank.checked_sub(1).and_then(|i| like_weights.get(i)) {
            for pair in pairs {
                weights.insert(pair.clone(), *w);
            }
        }
    }

    for (rank, pairs) in &prefs.unwilling {
        if let Some(w) = rank.checked_sub(1).and_then(|i| dislike_weights.get(i)) {
            for pair in pairs {
                weights.insert(pair.clone(), -w.abs());
            }
        }
    }

    for custom in custom_pairs {
        if let Some(pair) = PairKey::new(&custom.a, &custom.b) {
            weights.insert(pair, custom.weight);
        }
    }

    weights
}

pub fn default_like_weights(levels: usize) -> Vec<f64> {
    (0..levels.max(1))
        .map(|i| (5.0 - 0.5 * i as f64).max(1.0))
        .collect()
}

pub fn default_dislike_weights(levels: usize) -> Vec<f64> {
    (0..levels.max(1))
        .map(|i| (-5.0 - 0.5 * i as f64).max(-10.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[&str]]) -> Sheet {
        Sheet::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_column_letters_round_trip_edges() {
        assert_eq!(column_index_from_string("A"), Some(1));
        assert_eq!(column_index_from_string("AA"), Some(27));
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
    }

    #[test]
    fn test_parse_cell_range() {
        let range = parse_cell_range("B2:C5").unwrap();
        assert_eq!(
            range,
            CellRange {
                start_col: 1,
                start_row: 1,
                end_col: 2,
                end_row: Some(4)
            }
        );

        let open = parse_cell_range("A:A").unwrap();
        assert_eq!(open.start_row, 0);
        assert_eq!(open.end_row, None);

        assert!(parse_cell_range("A1").is_none());
        assert!(parse_cell_range("1:2").is_none());
        assert!(parse_cell_range("A0:B1").is_none());
    }

    #[test]
    fn test_load_names_skips_header_and_duplicates() {
        let s = sheet(&[&["姓名"], &["Alice"], &[" Bob "], &[""], &["Alice"], &["Name"]]);
        let names = load_names(&s, "A:A").unwrap();
        assert_eq!(names, vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_sheet_from_csv_with_bom() {
        let data = "\u{feff}name\nAlice\nBob,extra\n".as_bytes();
        let s = Sheet::from_csv_bytes(data).unwrap();
        assert_eq!(s.max_row(), 3);
        assert_eq!(s.max_col(), 2);
        assert_eq!(s.cell(0, 0), Some("name"));
    }

    #[test]
    fn test_auto_detect_ranges() {
        let s = sheet(&[
            &["like 1", "like 2", "", "dislike 1"],
            &["a,b", "c,d", "", "a,c"],
            &["e,f", "", "", ""],
        ]);
        let detected = auto_detect_ranges(&s);
        assert_eq!(detected.willing.as_deref(), Some("A1:B3"));
        assert_eq!(detected.unwilling.as_deref(), Some("D1:D2"));
    }

    #[test]
    fn test_auto_detect_needs_two_columns() {
        let s = sheet(&[&["a,b"]]);
        assert_eq!(auto_detect_ranges(&s), DetectedRanges::default());
    }

    #[test]
    fn test_load_preferences_ranks_by_column() {
        let s = sheet(&[
            &["rank1", "rank2", "", "no1"],
            &["a,b", "c,d", "", "a,c"],
            &["e,f", "x", "", "b,b"],
        ]);
        let source = PreferenceSource {
            auto_detect: true,
            ..Default::default()
        };
        let prefs = load_preferences(&s, &source).unwrap();

        assert_eq!(prefs.willing[&1].len(), 2);
        assert_eq!(prefs.willing[&2].len(), 1);
        assert_eq!(prefs.unwilling[&1].len(), 1);
        assert_eq!(prefs.willing_headers[1], "Willing rank 2: column B");
        assert_eq!(prefs.unwilling_headers[0], "Unwilling rank 1: column D");
        assert!(prefs.detected.is_some());
    }

    #[test]
    fn test_wide_range_stops_at_last_sheet_column() {
        let s = sheet(&[&["a,b", "c,d"]]);
        let source = PreferenceSource {
            willing_range: "A1:ZZZZZZZ1".to_string(),
            unwilling_range: "".to_string(),
            auto_detect: false,
        };
        let prefs = load_preferences(&s, &source).unwrap();
        assert_eq!(prefs.willing_headers.len(), 2);
        assert_eq!(prefs.willing_count(), 2);

        let beyond = PreferenceSource {
            willing_range: "AAAAAA1:ZZZZZZZ1".to_string(),
            ..source
        };
        let prefs = load_preferences(&s, &beyond).unwrap();
        assert!(prefs.willing_headers.is_empty());
        assert!(prefs.willing.is_empty());
    }

    #[test]
    fn test_load_preferences_respects_end_row() {
        let s = sheet(&[&["a,b"], &["c,d"], &["e,f"]]);
        let source = PreferenceSource {
            willing_range: "A1:A2".to_string(),
            unwilling_range: "".to_string(),
            auto_detect: false,
        };
        let prefs = load_preferences(&s, &source).unwrap();
        assert_eq!(prefs.willing_count(), 2);
        assert!(prefs.unwilling.is_empty());
    }

    #[test]
    fn test_parse_custom_weights() {
        let pairs = parse_custom_weights("a,b,3.5\nbad line\nc,d,x\n,e,1\nf, g ,-2");
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].b, "g");
        assert_eq!(pairs[1].weight, -2.0);
    }

    #[test]
    fn test_parse_manual_preferences() {
        let (prefs, custom) =
            parse_manual_preferences("张三,喜欢,李四\n王五,不喜欢,赵六\nA,dislike,B\nx,y,4");
        assert_eq!(prefs.willing_count(), 1);
        assert_eq!(prefs.unwilling[&1].len(), 2);
        assert_eq!(custom.len(), 1);
    }

    #[test]
    fn test_compute_pair_weights_precedence() {
        let mut prefs = Preferences::default();
        prefs.add(PreferenceKind::Willing, 1, PairKey::new("a", "b").unwrap());
        prefs.add(PreferenceKind::Willing, 2, PairKey::new("a", "c").unwrap());
        prefs.add(PreferenceKind::Willing, 3, PairKey::new("a", "d").unwrap());
        prefs.add(PreferenceKind::Unwilling, 1, PairKey::new("a", "c").unwrap());
        let custom = vec![CustomPair {
            a: "b".to_string(),
            b: "a".to_string(),
            weight: 9.0,
        }];

        let weights = compute_pair_weights(&prefs, &[5.0, 4.5], &[5.0], &custom);

        assert_eq!(weights[&PairKey::new("a", "b").unwrap()], 9.0);
        // 不願意覆蓋願意，且一律為負
        assert_eq!(weights[&PairKey::new("a", "c").unwrap()], -5.0);
        // 超出權重數量的等級不計
        assert!(!weights.contains_key(&PairKey::new("a", "d").unwrap()));
    }

    #[test]
    fn test_default_weights() {
        assert_eq!(default_like_weights(3), vec![5.0, 4.5, 4.0]);
        assert_eq!(default_dislike_weights(2), vec![-5.0, -5.5]);
        assert_eq!(default_like_weights(0).len(), 1);
        assert_eq!(default_like_weights(12)[11], 1.0);
    }
}
