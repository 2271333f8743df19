use seat_planner::{run_server, AppState, ServerHandle};
use serde_json::json;
use std::io::Read;

async fn start() -> (ServerHandle, String) {
    let handle = run_server("127.0.0.1:0".parse().unwrap(), AppState::default())
        .await
        .unwrap();
    let base = format!("http://{}", handle.local_addr());
    (handle, base)
}

fn solve_body() -> serde_json::Value {
    json!({
        "input": {
            "roster_csv": "姓名\nAnn\nBob\nCy\nDee\n",
            "preferences_csv": "w1,,u1\n\"Ann,Bob\",,\"Ann,Cy\"\n"
        },
        "layout": { "columns": 4, "rows_per_column": [1, 1, 1, 1] },
        "solver": { "top_n": 2, "seed": 1 }
    })
}

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let (handle, base) = start().await;

    let response = reqwest::get(format!("{}/_stcore/health", base)).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "ok");

    handle.stop().await;
}

#[tokio::test]
async fn test_index_reports_version() {
    let (handle, base) = start().await;

    let info: serde_json::Value = reqwest::get(format!("{}/", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info["name"], "seat-planner");
    assert_eq!(info["version"], env!("CARGO_PKG_VERSION"));

    handle.stop().await;
}

#[tokio::test]
async fn test_layout_endpoint() {
    let (handle, base) = start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/layout", base))
        .json(&json!({ "columns": 2, "rows_per_column": [2, 2], "aisles": [[1, 2]] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["total_seats"], 4);
    // 過道擋住左右與對角，只剩每列前後
    assert_eq!(body["adjacent_pairs"], 2);
    assert_eq!(body["seats"][1]["label"], "C1-R2");
    assert!(body["svg"].as_str().unwrap().starts_with("<svg"));

    let bad = client
        .post(format!("{}/api/layout", base))
        .json(&json!({ "columns": 2, "rows_per_column": [2] }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), 422);

    handle.stop().await;
}

#[tokio::test]
async fn test_oversized_layouts_are_rejected_and_server_survives() {
    let (handle, base) = start().await;
    let client = reqwest::Client::new();

    for body in [
        json!({ "columns": 100_000_000_000u64 }),
        json!({ "columns": 21 }),
        json!({ "columns": 2, "rows_per_column": [1_000_000_000u64, 1] }),
    ] {
        let response = client
            .post(format!("{}/api/layout", base))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 422);
    }

    let solve = client
        .post(format!("{}/api/solve", base))
        .json(&json!({
            "input": { "people": ["a", "b"] },
            "layout": { "columns": 100_000_000_000u64 }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(solve.status(), 422);

    let health = reqwest::get(format!("{}/_stcore/health", base)).await.unwrap();
    assert_eq!(health.text().await.unwrap(), "ok");

    handle.stop().await;
}

#[tokio::test]
async fn test_preferences_endpoint() {
    let (handle, base) = start().await;

    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/api/preferences", base))
        .json(&json!({
            "roster_csv": "name\nAnn\nBob\n",
            "manual_preferences": "Ann,like,Bob"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["people"], json!(["Ann", "Bob"]));
    assert_eq!(body["willing"][0]["pairs"], json!([["Ann", "Bob"]]));

    handle.stop().await;
}

#[tokio::test]
async fn test_solve_endpoint() {
    let (handle, base) = start().await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/solve", base))
        .json(&solve_body())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    let plans = body["plans"].as_array().unwrap();
    assert_eq!(plans.len(), 2);
    assert_eq!(plans[0]["summary"]["status"], "optimal");
    assert_eq!(plans[0]["summary"]["objective"], 5.0);
    assert_eq!(plans[0]["seats"].as_array().unwrap().len(), 4);
    assert_eq!(body["levels"].as_array().unwrap().len(), 2);

    handle.stop().await;
}

#[tokio::test]
async fn test_solve_rejects_overfull_room() {
    let (handle, base) = start().await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/solve", base))
        .json(&json!({
            "input": { "people": ["a", "b", "c"] },
            "layout": { "columns": 1, "rows_per_column": [2] }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);

    let missing_roster = reqwest::Client::new()
        .post(format!("{}/api/solve", base))
        .json(&json!({ "input": {}, "layout": { "columns": 2 } }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing_roster.status(), 400);

    handle.stop().await;
}

#[tokio::test]
async fn test_export_endpoint_returns_zip() {
    let (handle, base) = start().await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/export", base))
        .json(&solve_body())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/zip"
    );

    let bytes = response.bytes().await.unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.to_vec())).unwrap();
    let mut summary = String::new();
    archive
        .by_name("summary.csv")
        .unwrap()
        .read_to_string(&mut summary)
        .unwrap();
    assert_eq!(summary.lines().count(), 3);
    assert!(archive.by_name("plan_2/seat_chart.svg").is_ok());

    handle.stop().await;
}
