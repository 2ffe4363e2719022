use perf_analyzer_backend::{
    config::AiConfig,
    models::{AnalysisStatus, NewProject, SendResultsRequest},
    repositories::{MemoryProjectStore, ProjectStore},
    services::{AiClient, Analyzer, EnqueueOutcome},
};
use serde_json::{Value as JsonValue, json};
use std::{sync::Arc, time::Duration};
use uuid::Uuid;

/// AI 服务不可达时完整流程仍能产出最终分析
#[tokio::test]
async fn full_run_completes_with_fallback_analysis() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let ai_client = AiClient::new(AiConfig {
        base_url: format!("http://{}", addr),
        timeout_secs: 2,
        ..AiConfig::default()
    })
    .unwrap();

    let store = Arc::new(MemoryProjectStore::new());
    let (analyzer, processor) = Analyzer::new(store.clone(), Arc::new(ai_client), 100);
    tokio::spawn(processor.start());

    let uuid = Uuid::new_v4();
    store
        .create_project(NewProject {
            tenant: "acme".to_string(),
            repo: "checkout".to_string(),
            uuid,
            language: "go".to_string(),
            testing_tool: "k6".to_string(),
            project_info: None,
        })
        .await
        .unwrap();

    let file_analysis = analyzer.analyze_file("package main\nfunc main() {}").await;
    let canned: JsonValue =
        serde_json::from_str(file_analysis["ai_response"].as_str().unwrap()).unwrap();
    assert_eq!(canned["analysis_type"], "file_analysis");
    store
        .upsert_file(uuid, "main.go", "package main\nfunc main() {}", &file_analysis)
        .await
        .unwrap();

    let request: SendResultsRequest = serde_json::from_value(json!({
        "response_time_p95": 180,
        "response_time_p99": 420,
        "successful_calls": 9500,
        "failed_calls": 500
    }))
    .unwrap();
    store
        .insert_test_results(request.into_new_results(uuid, chrono::Utc::now()))
        .await
        .unwrap();

    assert_eq!(analyzer.trigger_final_analysis(uuid), EnqueueOutcome::Queued);

    let result = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let result = store.get_analysis_result(uuid).await.unwrap().unwrap();
            if result.status.is_terminal() {
                break result;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(result.status, AnalysisStatus::Completed);
    assert!(result.completed_at.unwrap() > result.created_at);

    let payload = result.final_analysis.unwrap();
    assert_eq!(payload["test_summary"]["total_calls"], 10000);
    assert_eq!(payload["files_count"], 1);
    assert_eq!(payload["analysis_metadata"]["fallback"], true);
    let ai_analysis: JsonValue =
        serde_json::from_str(payload["ai_analysis"].as_str().unwrap()).unwrap();
    assert_eq!(ai_analysis["analysis_type"], "final_analysis");
}

/// 重复触发已完成的项目会重新分析并覆盖结果
#[tokio::test]
async fn retrigger_overwrites_completed_analysis() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let ai_client = AiClient::new(AiConfig {
        base_url: format!("http://{}", addr),
        timeout_secs: 2,
        ..AiConfig::default()
    })
    .unwrap();

    let store = Arc::new(MemoryProjectStore::new());
    let (analyzer, processor) = Analyzer::new(store.clone(), Arc::new(ai_client), 100);
    tokio::spawn(processor.start());

    let uuid = Uuid::new_v4();
    store
        .create_project(NewProject {
            tenant: "acme".to_string(),
            repo: "search".to_string(),
            uuid,
            language: "rust".to_string(),
            testing_tool: "locust".to_string(),
            project_info: None,
        })
        .await
        .unwrap();

    let mut first_completed_at = None;
    for (ok, failed) in [(100, 0), (80, 20)] {
        let request: SendResultsRequest = serde_json::from_value(json!({
            "successful_calls": ok,
            "failed_calls": failed
        }))
        .unwrap();
        store
            .insert_test_results(request.into_new_results(uuid, chrono::Utc::now()))
            .await
            .unwrap();
        analyzer.trigger_final_analysis(uuid);

        let result = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let result = store.get_analysis_result(uuid).await.unwrap().unwrap();
                let payload_failed = result
                    .final_analysis
                    .as_ref()
                    .map(|p| p["test_summary"]["failed_calls"] == json!(failed))
                    .unwrap_or(false);
                if result.status == AnalysisStatus::Completed && payload_failed {
                    break result;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap();

        if let Some(previous) = first_completed_at {
            assert!(result.completed_at.unwrap() > previous);
        }
        first_completed_at = result.completed_at;
    }
}
