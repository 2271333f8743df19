use seat_planner::core::generator::{write_scenario, Scenario, TestDataGenerator};
use seat_planner::core::ConfigProvider;
use seat_planner::{LocalStorage, PlanConfig, PlanEngine, PlanPipeline};
use std::io::Read;
use tempfile::TempDir;

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("seat-plan.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[tokio::test]
async fn test_end_to_end_with_handwritten_sheets() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    let output_dir = temp_dir.path().join("out");
    std::fs::create_dir_all(&data_dir).unwrap();

    std::fs::write(data_dir.join("students.csv"), "姓名\nAnn\nBob\nCy\nDee\nEve\nFay\n").unwrap();
    std::fs::write(
        data_dir.join("preferences.csv"),
        "喜好1,喜好2,,不喜好1\n\"Ann,Bob\",\"Cy,Dee\",,\"Ann,Eve\"\n\"Eve,Fay\",,,\n",
    )
    .unwrap();

    let config_path = write_config(
        &temp_dir,
        &format!(
            r#"
[plan]
name = "e2e"
version = "1.0"

[input]
base_dir = "{}"
names_file = "students.csv"
preferences_file = "preferences.csv"
manual_preferences = "Bob,dislike,Fay"

[layout]
columns = 3
rows_per_column = [2, 2, 2]
include_diagonal = false

[solver]
top_n = 3
seed = 11

[output]
output_path = "{}"
bundle_name = "plans.zip"
"#,
            data_dir.display(),
            output_dir.display()
        ),
    );

    let config = PlanConfig::from_file(&config_path).unwrap();
    let storage = LocalStorage::new(config.base_dir(), config.output_path());
    let pipeline = PlanPipeline::new(storage, config);
    let engine = PlanEngine::new_with_monitoring(pipeline, false);

    let output_path = engine.run().await.unwrap();
    assert!(output_path.ends_with("plans.zip"));

    let zip_data = std::fs::read(output_dir.join("plans.zip")).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    assert!(archive.by_name("layout.svg").is_ok());
    assert!(archive.by_name("plan_3/assignment.csv").is_ok());

    let mut json = String::new();
    archive
        .by_name("results.json")
        .unwrap()
        .read_to_string(&mut json)
        .unwrap();
    let results: serde_json::Value = serde_json::from_str(&json).unwrap();
    let plans = results["plans"].as_array().unwrap();
    assert_eq!(plans.len(), 3);

    // 6 人 6 座可以窮舉，三組喜好全部相鄰、兩組不喜好全部分開
    let best = &plans[0]["summary"];
    assert_eq!(best["status"], "optimal");
    assert_eq!(best["objective"], 14.5);
    assert_eq!(best["n_satisfied_pairs"], 3);
    assert_eq!(best["satisfaction_rate"], "100%");
}

#[tokio::test]
async fn test_end_to_end_with_generated_data() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("scenario");
    let mut generator = TestDataGenerator::new(Some(42));
    let scenario = Scenario {
        name: "ci".to_string(),
        student_count: 12,
        willing_levels: 2,
        unwilling_levels: 1,
        fill_rate_range: (0.4, 0.6),
    };
    write_scenario(&mut generator, &scenario, &data_dir).unwrap();

    let config_path = write_config(
        &temp_dir,
        &format!(
            r#"
[plan]
name = "generated"
version = "1.0"

[input]
base_dir = "{}"
names_file = "students.csv"
preferences_file = "preferences.csv"

[layout]
columns = 4

[solver]
top_n = 2
time_limit_seconds = 1
seed = 5

[output]
output_path = "{}"
"#,
            data_dir.display(),
            temp_dir.path().join("out").display()
        ),
    );

    let config = PlanConfig::from_file(&config_path).unwrap();
    assert_eq!(config.layout_spec(12).rows_per_col, vec![3; 4]);

    let storage = LocalStorage::new(config.base_dir(), config.output_path());
    let engine = PlanEngine::new(PlanPipeline::new(storage, config));
    engine.run().await.unwrap();

    assert!(temp_dir.path().join("out/seat_plans.zip").exists());
}

#[tokio::test]
async fn test_missing_roster_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = write_config(
        &temp_dir,
        &format!(
            r#"
[plan]
name = "missing"
version = "1.0"

[input]
base_dir = "{}"
names_file = "nobody.csv"

[layout]
columns = 2

[output]
output_path = "{}"
"#,
            temp_dir.path().display(),
            temp_dir.path().join("out").display()
        ),
    );

    let config = PlanConfig::from_file(&config_path).unwrap();
    let storage = LocalStorage::new(config.base_dir(), config.output_path());
    let err = PlanEngine::new(PlanPipeline::new(storage, config))
        .run()
        .await
        .unwrap_err();
    assert_eq!(err.severity().exit_code(), 3);
}
