//! End-to-end flows through the public session API: intake, decoding,
//! compression ordering, quality fan-out, and both export paths.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use image_compressor::{
    App, Bitmap, Blob, CompressOutcome, CompressorError, CompressorResult, DownloadTrigger,
    ImageCodec, JPEG_MIME, PickedFile, RecordState, UiEvent, UiSink, ZIP_MIME,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[derive(Default)]
struct CollectingSink {
    events: Mutex<Vec<UiEvent>>,
}

impl UiSink for CollectingSink {
    fn emit(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl CollectingSink {
    fn warnings(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                UiEvent::Warning { message } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn list_shown_count(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, UiEvent::ListShown))
            .count()
    }

    fn quality_labels(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                UiEvent::QualityChanged { quality_label, .. } => Some(quality_label.clone()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Default)]
struct CollectingDownloads {
    saved: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl DownloadTrigger for CollectingDownloads {
    fn save(&self, blob: &Blob, filename: &str) -> anyhow::Result<()> {
        self.saved.lock().unwrap().push((
            filename.to_string(),
            blob.mime().to_string(),
            blob.bytes().to_vec(),
        ));
        Ok(())
    }
}

/// Test codec: the decoded "bitmap" carries the source bytes as pixels, and
/// encodes fill the output with the quality percent they ran at. Encodes can
/// be parked on a gate, selected by quality percent or by the magic `slow`
/// source payload.
struct FakeCodec {
    gated_percents: HashSet<u8>,
    gate_slow_payload: bool,
    gate: Semaphore,
    started: Mutex<Vec<u8>>,
}

impl FakeCodec {
    fn new() -> Self {
        Self {
            gated_percents: HashSet::new(),
            gate_slow_payload: false,
            gate: Semaphore::new(0),
            started: Mutex::new(Vec::new()),
        }
    }

    fn gating_percent(percent: u8) -> Self {
        let mut codec = Self::new();
        codec.gated_percents.insert(percent);
        codec
    }

    fn gating_slow_payload() -> Self {
        let mut codec = Self::new();
        codec.gate_slow_payload = true;
        codec
    }

    fn started(&self) -> Vec<u8> {
        self.started.lock().unwrap().clone()
    }

    fn release_one(&self) {
        self.gate.add_permits(1);
    }
}

fn percent_of(quality: f64) -> u8 {
    (quality * 100.0).round() as u8
}

#[async_trait]
impl ImageCodec for FakeCodec {
    async fn decode(&self, bytes: Arc<Vec<u8>>) -> CompressorResult<Bitmap> {
        if bytes.as_slice() == b"corrupt" {
            return Err(CompressorError::decode("not an image"));
        }
        Ok(Bitmap::new(1, 1, bytes.to_vec()))
    }

    async fn encode_jpeg(&self, bitmap: &Bitmap, quality: f64) -> CompressorResult<Vec<u8>> {
        let percent = percent_of(quality);
        self.started.lock().unwrap().push(percent);
        let parked = self.gated_percents.contains(&percent)
            || (self.gate_slow_payload && bitmap.pixels() == b"slow");
        if parked {
            let permit = self.gate.acquire().await.expect("gate closed");
            permit.forget();
        }
        Ok(vec![percent; 8])
    }
}

fn fake_app(codec: Arc<FakeCodec>) -> (App, Arc<CollectingSink>, Arc<CollectingDownloads>) {
    let sink = Arc::new(CollectingSink::default());
    let downloads = Arc::new(CollectingDownloads::default());
    let app = App::with_collaborators(
        codec,
        Arc::new(image_compressor::BundledZipLoader),
        sink.clone(),
        downloads.clone(),
    );
    (app, sink, downloads)
}

fn picked_image(name: &str, payload: &[u8]) -> PickedFile {
    PickedFile::new(name, "image/png", payload.to_vec())
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 64, 255])
    });
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

#[tokio::test]
async fn a_png_compresses_below_its_raw_footprint() {
    init_tracing();
    let sink = Arc::new(CollectingSink::default());
    let downloads = Arc::new(CollectingDownloads::default());
    let app = App::new(sink.clone(), downloads.clone());

    let ids = app
        .add_files(vec![picked_image("big.png", &png_bytes(2000, 1500))])
        .await
        .unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(sink.list_shown_count(), 1);

    let record = app.record(&ids[0]).await.unwrap();
    assert_eq!((record.bitmap.width, record.bitmap.height), (2000, 1500));
    assert_eq!(record.state, RecordState::Compressed);
    let blob = record.compressed.as_ref().unwrap();
    assert_eq!(blob.mime(), JPEG_MIME);
    assert!(blob.size() < record.bitmap.raw_size());

    app.download(&ids[0]).await.unwrap();
    let saved = downloads.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, "compressed_big.jpg");
    assert_eq!(saved[0].1, JPEG_MIME);
}

#[tokio::test]
async fn a_batch_without_images_warns_and_creates_nothing() {
    init_tracing();
    let (app, sink, _downloads) = fake_app(Arc::new(FakeCodec::new()));

    let result = app
        .add_files(vec![PickedFile::new(
            "notes.txt",
            "text/plain",
            b"hello".to_vec(),
        )])
        .await;

    assert!(matches!(result, Err(CompressorError::Validation(_))));
    assert!(app.records().await.is_empty());
    assert_eq!(sink.warnings().len(), 1);
    assert_eq!(sink.list_shown_count(), 0);
}

#[tokio::test]
async fn decode_failures_warn_and_skip_the_file() {
    init_tracing();
    let (app, sink, _downloads) = fake_app(Arc::new(FakeCodec::new()));

    let ids = app
        .add_files(vec![
            picked_image("broken.png", b"corrupt"),
            picked_image("fine.png", b"pixels"),
        ])
        .await
        .unwrap();

    assert_eq!(ids.len(), 1);
    assert_eq!(app.records().await.len(), 1);
    let warnings = sink.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("broken.png"));
}

#[tokio::test]
async fn global_quality_change_fans_out_to_every_record() {
    init_tracing();
    let (app, sink, _downloads) = fake_app(Arc::new(FakeCodec::new()));

    app.add_files(vec![
        picked_image("a.png", b"aa"),
        picked_image("b.png", b"bb"),
        picked_image("c.png", b"cc"),
    ])
    .await
    .unwrap();

    app.set_global_quality(0.10).await.unwrap();
    assert_eq!(app.global_quality().await, 0.10);

    let records = app.records().await;
    assert_eq!(records.len(), 3);
    for record in &records {
        assert_eq!(record.quality, 0.10);
        assert_eq!(record.compressed.as_ref().unwrap().bytes(), &[10u8; 8]);
    }
    assert_eq!(
        sink.quality_labels().iter().filter(|l| *l == "10%").count(),
        3
    );
}

#[tokio::test]
async fn the_last_issued_quality_wins_regardless_of_completion_order() {
    init_tracing();
    let codec = Arc::new(FakeCodec::gating_percent(90));
    let (app, _sink, _downloads) = fake_app(codec.clone());

    let ids = app
        .add_files(vec![picked_image("photo.png", b"pixels")])
        .await
        .unwrap();
    let id = ids[0].clone();

    // First request parks inside the encoder.
    let slow = {
        let app = app.clone();
        let id = id.clone();
        tokio::spawn(async move { app.set_item_quality(&id, 0.9).await })
    };
    while !codec.started().contains(&90) {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    // Second request completes while the first is still in flight.
    let outcome = app.set_item_quality(&id, 0.3).await.unwrap();
    assert_eq!(outcome, CompressOutcome::Completed);

    // The stale completion must be discarded, not committed.
    codec.release_one();
    let stale = slow.await.unwrap().unwrap();
    assert_eq!(stale, CompressOutcome::Superseded);

    let record = app.record(&id).await.unwrap();
    assert_eq!(record.quality, 0.3);
    assert_eq!(record.compressed.as_ref().unwrap().bytes(), &[30u8; 8]);
}

#[tokio::test]
async fn bulk_export_contains_only_finished_records() {
    init_tracing();
    let codec = Arc::new(FakeCodec::gating_slow_payload());
    let (app, sink, downloads) = fake_app(codec.clone());

    let intake = {
        let app = app.clone();
        tokio::spawn(async move {
            app.add_files(vec![
                picked_image("a.png", b"aa"),
                picked_image("b.png", b"bb"),
                picked_image("c.png", b"slow"),
            ])
            .await
        })
    };

    // Wait until the first two finished and the third is parked mid-encode.
    loop {
        let records = app.records().await;
        let finished = records.iter().filter(|r| r.compressed.is_some()).count();
        if records.len() == 3 && finished == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    app.download_all().await.unwrap();

    {
        let saved = downloads.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert!(saved[0].0.starts_with("compressed_images_"));
        assert!(saved[0].0.ends_with(".zip"));
        assert_eq!(saved[0].1, ZIP_MIME);

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(saved[0].2.clone())).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.by_index(0).unwrap().name(), "compressed_a.jpg");
        assert_eq!(archive.by_index(1).unwrap().name(), "compressed_b.jpg");
    }
    // The capability was cold on first export, so the user was told.
    assert!(!sink.warnings().is_empty());

    // Once the parked encode lands, a second export picks it up too.
    codec.release_one();
    intake.await.unwrap().unwrap();
    app.download_all().await.unwrap();

    let saved = downloads.saved.lock().unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(saved[1].2.clone())).unwrap();
    assert_eq!(archive.len(), 3);
    assert_eq!(archive.by_index(2).unwrap().name(), "compressed_c.jpg");
}

#[tokio::test]
async fn bulk_export_with_no_records_downloads_nothing() {
    init_tracing();
    let (app, _sink, downloads) = fake_app(Arc::new(FakeCodec::new()));
    app.download_all().await.unwrap();
    assert!(downloads.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn out_of_range_quality_is_rejected_before_any_work() {
    init_tracing();
    let (app, _sink, _downloads) = fake_app(Arc::new(FakeCodec::new()));

    let ids = app
        .add_files(vec![picked_image("a.png", b"aa")])
        .await
        .unwrap();

    assert!(app.set_item_quality(&ids[0], 1.5).await.is_err());
    assert!(app.set_global_quality(-0.2).await.is_err());

    // Still at the intake default.
    let record = app.record(&ids[0]).await.unwrap();
    assert_eq!(record.quality, image_compressor::DEFAULT_QUALITY);
}
