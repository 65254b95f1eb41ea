//! Photo history ordering, durability and analysis supersession.

mod common;

use std::sync::Arc;

use common::{png, StillCamera};
use fasal_app::{AnalysisState, CapturePipeline};
use fasal_core::{
    defaults, AnalysisResult, EventBus, FileStore, FileUpload, KeyValueStore, MemoryStore, Photo,
    PlantHealthStatus,
};
use fasal_services::{JpegCompressor, StubAnalysisService};
use tempfile::TempDir;

fn pipeline(store: Arc<dyn KeyValueStore>, analysis: StubAnalysisService) -> CapturePipeline {
    CapturePipeline::new(
        store,
        Arc::new(JpegCompressor::default()),
        Arc::new(analysis),
        EventBus::default(),
    )
}

fn stored_history(store: &dyn KeyValueStore) -> Vec<Photo> {
    let raw = store.get(defaults::PHOTO_HISTORY_KEY).unwrap().unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn result(soil_type: &str) -> AnalysisResult {
    AnalysisResult {
        soil_type: soil_type.to_string(),
        plant_health_status: PlantHealthStatus::Healthy,
        disease_alerts: vec![],
        treatments: vec![],
        recommendations: vec![],
    }
}

#[tokio::test]
async fn test_file_captures_are_newest_first_after_each_call() {
    common::init_tracing();
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(store.clone(), StubAnalysisService::new());

    let img1 = pipeline
        .capture_from_file(FileUpload::new("image/png", png(640, 480, 10)))
        .await
        .unwrap();
    assert_eq!(stored_history(store.as_ref()), vec![img1.clone()]);

    let img2 = pipeline
        .capture_from_file(FileUpload::new("image/png", png(640, 480, 200)))
        .await
        .unwrap();
    assert_eq!(stored_history(store.as_ref()), vec![img2.clone(), img1.clone()]);
    assert_eq!(pipeline.photos(), vec![img2, img1]);
}

#[tokio::test]
async fn test_history_survives_reload() {
    let dir = TempDir::new().unwrap();
    {
        let store = Arc::new(FileStore::open(dir.path()).unwrap());
        let pipeline = pipeline(store, StubAnalysisService::new());
        pipeline.capture_from_camera(&StillCamera("img1")).await.unwrap();
        pipeline.capture_from_camera(&StillCamera("img2")).await.unwrap();
    }

    let store = Arc::new(FileStore::open(dir.path()).unwrap());
    let reloaded = pipeline(store, StubAnalysisService::new());
    let data: Vec<String> = reloaded.photos().into_iter().map(|p| p.base64_data).collect();
    assert_eq!(data, vec!["img2", "img1"]);
    assert_eq!(reloaded.soil_history().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_captures_are_all_kept() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = Arc::new(pipeline(store.clone(), StubAnalysisService::new()));

    let frames = ["a", "b", "c", "d", "e", "f", "g", "h"];
    let mut handles = Vec::new();
    for frame in frames {
        let pipeline = pipeline.clone();
        handles.push(tokio::spawn(async move {
            pipeline.capture_from_camera(&StillCamera(frame)).await.unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut data: Vec<String> = stored_history(store.as_ref())
        .into_iter()
        .map(|p| p.base64_data)
        .collect();
    data.sort();
    assert_eq!(data, frames);
}

#[tokio::test(start_paused = true)]
async fn test_newer_submission_wins_over_slower_older_one() {
    let analysis = StubAnalysisService::new()
        .with_response_for("photo1", result("Clay Soil"))
        .with_latency_for("photo1", 3_000)
        .with_response_for("photo2", result("Sandy Soil"))
        .with_latency_for("photo2", 500);
    let pipeline = Arc::new(pipeline(Arc::new(MemoryStore::new()), analysis));

    let first = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            pipeline
                .capture_and_analyze_camera(&StillCamera("photo1"))
                .await
                .unwrap()
        })
    };
    tokio::task::yield_now().await;
    let second = pipeline
        .capture_and_analyze_camera(&StillCamera("photo2"))
        .await
        .unwrap();
    let first = first.await.unwrap();

    assert_eq!(second.analysis.unwrap().unwrap().soil_type, "Sandy Soil");
    assert!(first.analysis.unwrap().is_none());
    match pipeline.analysis().state() {
        AnalysisState::Ready { result, .. } => assert_eq!(result.soil_type, "Sandy Soil"),
        other => panic!("Expected Ready state, got {:?}", other),
    }
    // Both photos persisted regardless of which analysis applied.
    assert_eq!(pipeline.photos().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_analysis_keeps_the_photo() {
    let pipeline = pipeline(
        Arc::new(MemoryStore::new()),
        StubAnalysisService::new().failing(),
    );

    let report = pipeline
        .capture_and_analyze_camera(&StillCamera("img1"))
        .await
        .unwrap();

    assert!(report.analysis.is_err());
    assert!(matches!(
        pipeline.analysis().state(),
        AnalysisState::Failed { .. }
    ));
    assert_eq!(pipeline.photos(), vec![report.photo]);
}

#[tokio::test]
async fn test_malformed_history_reconstructs_empty() {
    let store = Arc::new(MemoryStore::new());
    store.set(defaults::PHOTO_HISTORY_KEY, "[{\"base64Data\": ").unwrap();
    let pipeline = pipeline(store, StubAnalysisService::new());

    assert!(pipeline.photos().is_empty());
    assert!(pipeline.soil_history().is_empty());
    assert!(pipeline.plant_history().is_empty());
    assert!(pipeline.latest_soil().is_none());
}

#[tokio::test]
async fn test_legacy_field_name_is_read() {
    let store = Arc::new(MemoryStore::new());
    store
        .set(
            defaults::PHOTO_HISTORY_KEY,
            r#"[{"base64": "data:image/jpeg;base64,AAAA", "timestamp": "2024-06-01T08:30:00Z"}]"#,
        )
        .unwrap();
    let pipeline = pipeline(store, StubAnalysisService::new());

    let photos = pipeline.photos();
    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0].base64_data, "data:image/jpeg;base64,AAAA");

    let plant = pipeline.latest_plant().unwrap();
    assert_eq!(plant.timestamp, photos[0].timestamp);
    assert_eq!(plant.health_status, PlantHealthStatus::Healthy);
}

#[tokio::test]
async fn test_reconstruction_does_not_touch_persisted_history() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(store.clone(), StubAnalysisService::new());
    pipeline.capture_from_camera(&StillCamera("img1")).await.unwrap();
    let before = store.get(defaults::PHOTO_HISTORY_KEY).unwrap();

    let _ = pipeline.soil_history();
    let _ = pipeline.plant_history();

    assert_eq!(store.get(defaults::PHOTO_HISTORY_KEY).unwrap(), before);
}
