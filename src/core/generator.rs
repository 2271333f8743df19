use crate::core::preferences::column_letter;
use crate::utils::error::{PlannerError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const SURNAMES: [&str; 30] = [
    "王", "李", "张", "刘", "陈", "杨", "赵", "黄", "周", "吴", "徐", "孙", "胡", "朱", "高", "林",
    "何", "郭", "马", "罗", "梁", "宋", "郑", "谢", "韩", "唐", "冯", "于", "董", "萧",
];

const GIVEN_NAMES: [&str; 40] = [
    "伟", "芳", "娜", "秀英", "敏", "静", "丽", "强", "磊", "军", "洋", "勇", "艳", "杰", "娟", "涛",
    "明", "超", "秀兰", "霞", "平", "刚", "桂英", "华", "建华", "建国", "建军", "志强", "志明",
    "秀珍", "晓明", "晓红", "小红", "小明", "小华", "小丽", "小燕", "小芳", "小娟", "小静",
];

/// 一個測試情境
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    pub name: String,
    pub student_count: usize,
    pub willing_levels: usize,
    pub unwilling_levels: usize,
    pub fill_rate_range: (f64, f64),
}

impl Scenario {
    fn new(name: &str, students: usize, willing: usize, unwilling: usize, fill: (f64, f64)) -> Self {
        Self {
            name: name.to_string(),
            student_count: students,
            willing_levels: willing,
            unwilling_levels: unwilling,
            fill_rate_range: fill,
        }
    }
}

pub fn default_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("small_class_standard", 20, 2, 2, (0.6, 0.8)),
        Scenario::new("medium_class_complex", 35, 4, 3, (0.3, 0.7)),
        Scenario::new("large_class_sparse", 50, 3, 2, (0.2, 0.4)),
        Scenario::new("many_levels", 25, 6, 5, (0.1, 0.5)),
        Scenario::new("single_level_dense", 15, 1, 1, (0.8, 0.9)),
    ]
}

/// 每個等級產生的配對數
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreferenceStats {
    pub willing: Vec<usize>,
    pub unwilling: Vec<usize>,
    pub total_students: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPreferences {
    /// 含表頭列的儲存格
    pub rows: Vec<Vec<String>>,
    pub stats: PreferenceStats,
}

impl GeneratedPreferences {
    /// 建議的範圍設定，對應產生的欄位配置
    pub fn suggested_ranges(&self) -> (String, String) {
        let willing = self.stats.willing.len().max(1);
        let unwilling = self.stats.unwilling.len().max(1);
        let last_row = self.rows.len().max(1);
        let unwilling_start = willing + 1;
        (
            format!("A1:{}{}", column_letter(willing - 1), last_row),
            format!(
                "{}1:{}{}",
                column_letter(unwilling_start),
                column_letter(unwilling_start + unwilling - 1),
                last_row
            ),
        )
    }
}

pub struct TestDataGenerator {
    rng: StdRng,
}

impl TestDataGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn max_unique_names() -> usize {
        SURNAMES.len() * GIVEN_NAMES.len()
    }

    /// 產生不重複的隨機姓名
    pub fn generate_names(&mut self, count: usize) -> Result<Vec<String>> {
        if count > Self::max_unique_names() {
            return Err(PlannerError::InvalidConfigValueError {
                field: "student_count".to_string(),
                value: count.to_string(),
                reason: format!("At most {} unique names are available", Self::max_unique_names()),
            });
        }

        let mut seen = BTreeSet::new();
        let mut names = Vec::with_capacity(count);
        while names.len() < count {
            let surname = SURNAMES[self.rng.gen_range(0..SURNAMES.len())];
            let given = GIVEN_NAMES[self.rng.gen_range(0..GIVEN_NAMES.len())];
            let name = format!("{}{}", surname, given);
            if seen.insert(name.clone()) {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn pick_two(&mut self, pool: &[String]) -> Option<(String, String)> {
        let mut chosen = pool.choose_multiple(&mut self.rng, 2);
        let a = chosen.next()?.clone();
        let b = chosen.next()?.clone();
        Some((a, b))
    }

    fn willing_level(&mut self, names: &[String], fill_rate_range: (f64, f64)) -> Vec<(String, String)> {
        let fill_rate = self.sample_rate(fill_rate_range);
        let max_pairs = (names.len() / 2).min((names.len() as f64 * fill_rate) as usize);

        let mut pairs = Vec::new();
        let mut used: BTreeSet<String> = BTreeSet::new();
        for _ in 0..max_pairs {
            let available: Vec<String> = names.iter().filter(|n| !used.contains(*n)).cloned().collect();
            let Some((a, b)) = self.pick_two(&available) else {
                break;
            };
            // 七成機率讓這兩人不再出現在同一等級
            if self.rng.gen_bool(0.7) {
                used.insert(a.clone());
                used.insert(b.clone());
            }
            pairs.push((a, b));
        }

        self.maybe_truncate(&mut pairs, 0.3, 3);
        pairs
    }

    fn unwilling_level(&mut self, names: &[String]) -> Vec<(String, String)> {
        let fill_rate = self.sample_rate((0.1, 0.4));
        let max_pairs = (names.len() / 3).min((names.len() as f64 * fill_rate) as usize);

        let mut pairs = Vec::new();
        for _ in 0..max_pairs {
            if let Some(pair) = self.pick_two(names) {
                pairs.push(pair);
            }
        }

        self.maybe_truncate(&mut pairs, 0.4, 2);
        pairs
    }

    fn sample_rate(&mut self, (low, high): (f64, f64)) -> f64 {
        if high > low {
            self.rng.gen_range(low..high)
        } else {
            low
        }
    }

    /// 模擬填寫不完整
    fn maybe_truncate(&mut self, pairs: &mut Vec<(String, String)>, probability: f64, divisor: usize) {
        if pairs.is_empty() || !self.rng.gen_bool(probability) {
            return;
        }
        let remove = self.rng.gen_range(1..=(pairs.len() / divisor).max(1));
        pairs.truncate(pairs.len().saturating_sub(remove));
    }

    /// 產生喜好表：願意欄、空白分隔欄、不願意欄
    pub fn generate_preferences(
        &mut self,
        names: &[String],
        willing_levels: usize,
        unwilling_levels: usize,
        fill_rate_range: (f64, f64),
    ) -> GeneratedPreferences {
        let willing: Vec<Vec<(String, String)>> = (0..willing_levels)
            .map(|_| self.willing_level(names, fill_rate_range))
            .collect();
        let unwilling: Vec<Vec<(String, String)>> = (0..unwilling_levels)
            .map(|_| self.unwilling_level(names))
            .collect();

        let depth = willing
            .iter()
            .chain(unwilling.iter())
            .map(Vec::len)
            .max()
            .unwrap_or(0);

        let mut header: Vec<String> = (1..=willing_levels).map(|k| format!("喜好{}", k)).collect();
        header.push(String::new());
        header.extend((1..=unwilling_levels).map(|k| format!("不喜好{}", k)));

        let cell = |level: &Vec<(String, String)>, row: usize| {
            level
                .get(row)
                .map(|(a, b)| format!("{},{}", a, b))
                .unwrap_or_default()
        };

        let mut rows = vec![header];
        for row in 0..depth {
            let mut record: Vec<String> = willing.iter().map(|level| cell(level, row)).collect();
            record.push(String::new());
            record.extend(unwilling.iter().map(|level| cell(level, row)));
            rows.push(record);
        }

        GeneratedPreferences {
            rows,
            stats: PreferenceStats {
                willing: willing.iter().map(Vec::len).collect(),
                unwilling: unwilling.iter().map(Vec::len).collect(),
                total_students: names.len(),
            },
        }
    }
}

pub fn roster_csv(names: &[String]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["姓名"])?;
    for name in names {
        writer.write_record([name])?;
    }
    writer.into_inner().map_err(|e| PlannerError::ProcessingError {
        message: format!("Failed to flush roster CSV: {}", e),
    })
}

pub fn preferences_csv(generated: &GeneratedPreferences) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in &generated.rows {
        writer.write_record(row)?;
    }
    writer.into_inner().map_err(|e| PlannerError::ProcessingError {
        message: format!("Failed to flush preference CSV: {}", e),
    })
}

fn scenario_notes(scenario: &Scenario, generated: &GeneratedPreferences) -> String {
    let (willing_range, unwilling_range) = generated.suggested_ranges();
    let mut notes = vec![
        format!("Scenario: {}", scenario.name),
        format!("Students: {}", scenario.student_count),
        format!("Willing levels: {}", scenario.willing_levels),
        format!("Unwilling levels: {}", scenario.unwilling_levels),
        format!(
            "Fill rate range: {:.2}-{:.2}",
            scenario.fill_rate_range.0, scenario.fill_rate_range.1
        ),
        String::new(),
        format!("Willing range: {}", willing_range),
        format!("Unwilling range: {}", unwilling_range),
        String::new(),
    ];
    for (i, count) in generated.stats.willing.iter().enumerate() {
        notes.push(format!("Willing rank {}: {} pairs", i + 1, count));
    }
    for (i, count) in generated.stats.unwilling.iter().enumerate() {
        notes.push(format!("Unwilling rank {}: {} pairs", i + 1, count));
    }
    notes.join("\n") + "\n"
}

/// 寫出單一情境：students.csv、preferences.csv、config.txt
pub fn write_scenario(
    generator: &mut TestDataGenerator,
    scenario: &Scenario,
    dir: &Path,
) -> Result<PreferenceStats> {
    std::fs::create_dir_all(dir)?;

    let names = generator.generate_names(scenario.student_count)?;
    std::fs::write(dir.join("students.csv"), roster_csv(&names)?)?;

    let generated = generator.generate_preferences(
        &names,
        scenario.willing_levels,
        scenario.unwilling_levels,
        scenario.fill_rate_range,
    );
    std::fs::write(dir.join("preferences.csv"), preferences_csv(&generated)?)?;
    std::fs::write(dir.join("config.txt"), scenario_notes(scenario, &generated))?;

    tracing::info!(
        "📝 Scenario '{}' written to {} ({} students)",
        scenario.name,
        dir.display(),
        names.len()
    );
    Ok(generated.stats)
}

/// 產生完整測試套件與報告
pub fn write_test_suite(
    generator: &mut TestDataGenerator,
    scenarios: &[Scenario],
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let mut report = vec![
        format!(
            "Test data generation report - {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ),
        "=".repeat(60),
    ];
    let mut dirs = Vec::new();

    for (i, scenario) in scenarios.iter().enumerate() {
        let dir = output_dir.join(format!("{:02}_{}", i + 1, scenario.name));
        write_scenario(generator, scenario, &dir)?;

        report.push(String::new());
        report.push(format!("Scenario {}: {}", i + 1, scenario.name));
        report.push(format!("  Students: {}", scenario.student_count));
        report.push(format!(
            "  Willing levels: {}, unwilling levels: {}",
            scenario.willing_levels, scenario.unwilling_levels
        ));
        report.push(format!("  Output: {}", dir.display()));
        dirs.push(dir);
    }

    std::fs::write(output_dir.join("generation_report.txt"), report.join("\n"))?;
    Ok(dirs)
}
