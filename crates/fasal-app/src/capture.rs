//! Media capture: uploads and camera frames into the persisted photo history.
//!
//! A capture is durable before it is returned. Writers on the history are
//! serialized so concurrent captures each see the other's prepend.

use std::sync::{Arc, RwLock};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use fasal_core::{
    defaults, load_json, save_json, AnalysisResult, AnalysisService, AppEvent, Error, EventBus,
    FileUpload, FrameGrabber, ImageCompressor, InputError, KeyValueStore, Photo, PhotoSource,
    PlantRecord, Result, SoilRecord,
};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::analysis::AnalysisCoordinator;
use crate::history;

/// A capture and the analysis of it, each committed on its own.
#[derive(Debug)]
pub struct CaptureReport {
    pub photo: Photo,
    /// See [`AnalysisCoordinator::analyze`].
    pub analysis: Result<Option<AnalysisResult>>,
}

pub struct CapturePipeline {
    store: Arc<dyn KeyValueStore>,
    compressor: Arc<dyn ImageCompressor>,
    analysis: AnalysisCoordinator,
    history_lock: Mutex<()>,
    owner: RwLock<Option<String>>,
    events: EventBus,
}

impl CapturePipeline {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        compressor: Arc<dyn ImageCompressor>,
        analysis: Arc<dyn AnalysisService>,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            compressor,
            analysis: AnalysisCoordinator::new(analysis, events.clone()),
            history_lock: Mutex::new(()),
            owner: RwLock::new(None),
            events,
        }
    }

    /// Tag subsequent captures with the active profile's name.
    pub fn set_owner(&self, owner: Option<String>) {
        if let Ok(mut slot) = self.owner.write() {
            *slot = owner;
        }
    }

    fn owner(&self) -> Option<String> {
        self.owner.read().ok().and_then(|o| o.clone())
    }

    pub fn analysis(&self) -> &AnalysisCoordinator {
        &self.analysis
    }

    /// Compress an uploaded image and prepend it to the history.
    ///
    /// Non-image uploads are rejected before anything is stored. The MIME
    /// type is sniffed from the bytes when the upload does not claim one.
    #[instrument(skip(self, upload), fields(subsystem = "capture", source = "file", bytes = upload.bytes.len()))]
    pub async fn capture_from_file(&self, upload: FileUpload) -> Result<Photo> {
        let mime = effective_mime(&upload);
        if !mime.starts_with("image/") {
            debug!(mime = %mime, "Rejected non-image upload");
            return Err(InputError::NotAnImage.into());
        }

        let compressor = self.compressor.clone();
        let bytes = upload.bytes;
        let compressed = tokio::task::spawn_blocking(move || compressor.compress(&bytes))
            .await
            .map_err(|e| Error::Internal(format!("Compression task failed: {}", e)))??;

        let data_uri = format!(
            "data:{};base64,{}",
            compressed.mime_type,
            STANDARD.encode(&compressed.bytes)
        );
        self.prepend(Photo::new(data_uri, Utc::now()), PhotoSource::File)
            .await
    }

    /// Grab one frame from a live camera and prepend it to the history.
    #[instrument(skip(self, camera), fields(subsystem = "capture", source = "camera"))]
    pub async fn capture_from_camera(&self, camera: &dyn FrameGrabber) -> Result<Photo> {
        let frame = camera
            .grab_frame()
            .filter(|f| !f.is_empty())
            .ok_or(InputError::NoFrame)?;
        self.prepend(Photo::new(frame, Utc::now()), PhotoSource::Camera)
            .await
    }

    pub async fn capture_and_analyze_file(&self, upload: FileUpload) -> Result<CaptureReport> {
        let photo = self.capture_from_file(upload).await?;
        let analysis = self.analysis.analyze(&photo.base64_data).await;
        Ok(CaptureReport { photo, analysis })
    }

    pub async fn capture_and_analyze_camera(
        &self,
        camera: &dyn FrameGrabber,
    ) -> Result<CaptureReport> {
        let photo = self.capture_from_camera(camera).await?;
        let analysis = self.analysis.analyze(&photo.base64_data).await;
        Ok(CaptureReport { photo, analysis })
    }

    async fn prepend(&self, photo: Photo, source: PhotoSource) -> Result<Photo> {
        let _guard = self.history_lock.lock().await;

        // Corrupt history loads as empty; a failing store aborts the capture.
        let mut photos: Vec<Photo> =
            load_json(self.store.as_ref(), defaults::PHOTO_HISTORY_KEY)?.unwrap_or_default();
        photos.insert(0, photo.clone());
        save_json(self.store.as_ref(), defaults::PHOTO_HISTORY_KEY, &photos)?;

        info!(
            owner = self.owner().as_deref().unwrap_or("-"),
            ?source,
            history_len = photos.len(),
            "Photo captured"
        );
        self.events.emit(AppEvent::PhotoCaptured {
            source,
            timestamp: photo.timestamp,
            history_len: photos.len(),
        });
        Ok(photo)
    }

    /// The persisted history, newest first. Empty when absent or corrupt.
    pub fn photos(&self) -> Vec<Photo> {
        match load_json::<Vec<Photo>>(self.store.as_ref(), defaults::PHOTO_HISTORY_KEY) {
            Ok(photos) => photos.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Photo history unreadable");
                Vec::new()
            }
        }
    }

    pub fn soil_history(&self) -> Vec<SoilRecord> {
        history::soil_history(&self.photos())
    }

    pub fn plant_history(&self) -> Vec<PlantRecord> {
        history::plant_history(&self.photos())
    }

    pub fn latest_soil(&self) -> Option<SoilRecord> {
        self.photos().first().map(history::soil_record)
    }

    pub fn latest_plant(&self) -> Option<PlantRecord> {
        self.photos().first().map(history::plant_record)
    }
}

/// Claimed MIME type, or the sniffed one when the claim is empty or generic.
fn effective_mime(upload: &FileUpload) -> String {
    let claimed = upload.mime_type.trim().to_ascii_lowercase();
    if !claimed.is_empty() && claimed != "application/octet-stream" {
        return claimed;
    }
    infer::get(&upload.bytes)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fasal_core::MemoryStore;
    use fasal_services::{JpegCompressor, StubAnalysisService};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    struct StillCamera(Option<&'static str>);

    impl FrameGrabber for StillCamera {
        fn grab_frame(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([120, 90, 40]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn pipeline() -> (Arc<MemoryStore>, CapturePipeline) {
        let kv = Arc::new(MemoryStore::new());
        let pipeline = CapturePipeline::new(
            kv.clone(),
            Arc::new(JpegCompressor::default()),
            Arc::new(StubAnalysisService::new().with_latency_ms(0)),
            EventBus::new(16),
        );
        (kv, pipeline)
    }

    #[test]
    fn test_effective_mime_sniffs_when_unclaimed() {
        assert_eq!(effective_mime(&FileUpload::new("", png(2, 2))), "image/png");
        assert_eq!(
            effective_mime(&FileUpload::new("IMAGE/PNG", vec![])),
            "image/png"
        );
        assert_eq!(
            effective_mime(&FileUpload::new("application/octet-stream", png(2, 2))),
            "image/png"
        );
        assert_eq!(effective_mime(&FileUpload::new("", b"hello".to_vec())), "");
    }

    #[tokio::test]
    async fn test_file_capture_compresses_to_jpeg_data_uri() {
        let (_, pipeline) = pipeline();
        let photo = pipeline
            .capture_from_file(FileUpload::new("image/png", png(1600, 1200)))
            .await
            .unwrap();

        let encoded = photo
            .base64_data
            .strip_prefix("data:image/jpeg;base64,")
            .unwrap();
        let jpeg = STANDARD.decode(encoded).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 600));
    }

    #[tokio::test]
    async fn test_non_image_upload_is_rejected_without_side_effects() {
        let (kv, pipeline) = pipeline();
        let err = pipeline
            .capture_from_file(FileUpload::new("application/pdf", b"%PDF-1.4".to_vec()))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Input(InputError::NotAnImage)));
        assert!(kv.get(defaults::PHOTO_HISTORY_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_camera_without_frame_is_rejected() {
        let (_, pipeline) = pipeline();
        let err = pipeline
            .capture_from_camera(&StillCamera(None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Input(InputError::NoFrame)));

        let err = pipeline
            .capture_from_camera(&StillCamera(Some("")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Input(InputError::NoFrame)));
        assert!(pipeline.photos().is_empty());
    }

    #[tokio::test]
    async fn test_captures_are_prepended_and_persisted() {
        let (kv, pipeline) = pipeline();
        pipeline
            .capture_from_camera(&StillCamera(Some("img1")))
            .await
            .unwrap();
        pipeline
            .capture_from_camera(&StillCamera(Some("img2")))
            .await
            .unwrap();

        let data: Vec<String> = pipeline
            .photos()
            .into_iter()
            .map(|p| p.base64_data)
            .collect();
        assert_eq!(data, vec!["img2", "img1"]);

        let raw = kv.get(defaults::PHOTO_HISTORY_KEY).unwrap().unwrap();
        let stored: Vec<Photo> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].base64_data, "img2");
    }

    #[tokio::test]
    async fn test_corrupt_history_reads_empty_and_is_replaced_on_capture() {
        let (kv, pipeline) = pipeline();
        kv.set(defaults::PHOTO_HISTORY_KEY, "not json").unwrap();

        assert!(pipeline.photos().is_empty());
        assert!(pipeline.soil_history().is_empty());
        assert!(pipeline.latest_plant().is_none());

        pipeline
            .capture_from_camera(&StillCamera(Some("img1")))
            .await
            .unwrap();
        assert_eq!(pipeline.photos().len(), 1);
    }

    #[tokio::test]
    async fn test_capture_and_analyze_commits_both() {
        let (_, pipeline) = pipeline();
        let report = pipeline
            .capture_and_analyze_camera(&StillCamera(Some("img1")))
            .await
            .unwrap();

        assert_eq!(report.photo.base64_data, "img1");
        let result = report.analysis.unwrap().unwrap();
        assert_eq!(result.soil_type, "Loamy Soil");
        assert_eq!(pipeline.latest_soil().unwrap().timestamp, report.photo.timestamp);
    }
}
