use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clipforge_common::MediaDefaults;
use clipforge_media::{
    import_files, import_recordings, CaptureKind, FinishedRecording, MediaProbe,
    MediaResolver, MetadataExtractionError, ProbeInfo,
};
use clipforge_project_model::{EditorState, EditorStore, Thumbnail, VideoMetadata};

#[derive(Clone)]
enum Behaviour {
    Ok(f64),
    Fail,
    Hang,
}

struct FakeProbe {
    files: HashMap<PathBuf, Behaviour>,
    probes: AtomicUsize,
    probe_delay: Duration,
}

impl FakeProbe {
    fn new(files: &[(&str, Behaviour)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(p, b)| (PathBuf::from(p), b.clone()))
                .collect(),
            probes: AtomicUsize::new(0),
            probe_delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl MediaProbe for FakeProbe {
    async fn probe(&self, path: &Path) -> Result<ProbeInfo, MetadataExtractionError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.probe_delay).await;
        match self.files.get(path) {
            Some(Behaviour::Ok(duration)) => Ok(ProbeInfo {
                duration: *duration,
                metadata: VideoMetadata {
                    width: 1280,
                    height: 720,
                    codec: "h264".into(),
                    frame_rate: 30.0,
                    bitrate: None,
                },
            }),
            Some(Behaviour::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!("probe should have been timed out")
            }
            Some(Behaviour::Fail) | None => {
                Err(MetadataExtractionError::unreadable(path, "corrupt"))
            }
        }
    }

    async fn thumbnail(&self, _path: &Path, at: f64) -> Result<Thumbnail, MetadataExtractionError> {
        Ok(Thumbnail::from_jpeg(format!("{at}").into_bytes()))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

fn setup(probe: FakeProbe) -> (EditorStore, Arc<FakeProbe>, MediaResolver) {
    let probe = Arc::new(probe);
    let resolver = MediaResolver::new(probe.clone(), MediaDefaults::default());
    (EditorStore::new(EditorState::new("test")), probe, resolver)
}

#[tokio::test]
async fn batch_import_skips_failures_without_aborting() {
    let (store, _probe, resolver) = setup(FakeProbe::new(&[
        ("/v/good.mp4", Behaviour::Ok(12.0)),
        ("/v/bad.mov", Behaviour::Fail),
        ("/v/zero.mkv", Behaviour::Ok(0.0)),
        ("/v/also_good.webm", Behaviour::Ok(0.8)),
    ]));

    let report = import_files(
        &store,
        &resolver,
        ["/v/good.mp4", "/v/bad.mov", "/v/notes.txt", "/v/zero.mkv", "/v/also_good.webm"],
    )
    .await;

    assert_eq!(
        report.added,
        vec![PathBuf::from("/v/good.mp4"), PathBuf::from("/v/also_good.webm")]
    );
    assert_eq!(report.skipped.len(), 3);
    assert!(report.skipped.iter().any(|s| s.reason.contains("unsupported")));
    assert!(report.skipped.iter().any(|s| s.reason.contains("Invalid duration")));

    store.read(|s| {
        assert_eq!(s.library.len(), 2);
        let short = s.library.get(Path::new("/v/also_good.webm")).unwrap();
        // Thumbnail taken at min(1s, duration / 2).
        assert_eq!(short.thumbnail.as_ref().unwrap().as_bytes(), b"0.4");
        assert_eq!(short.metadata.as_ref().unwrap().width, 1280);
    });
}

#[tokio::test]
async fn library_hit_is_not_re_derived() {
    let (store, probe, resolver) = setup(FakeProbe::new(&[("/v/a.mp4", Behaviour::Ok(5.0))]));

    import_files(&store, &resolver, ["/v/a.mp4"]).await;
    let second = import_files(&store, &resolver, ["/v/a.mp4", "/v/a.mp4"]).await;

    assert_eq!(probe.probes.load(Ordering::SeqCst), 1);
    assert_eq!(second.existing.len(), 2);
    assert!(second.added.is_empty());
    assert_eq!(store.read(|s| s.library.len()), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_resolves_share_one_derivation() {
    let mut fake = FakeProbe::new(&[("/v/a.mp4", Behaviour::Ok(5.0))]);
    fake.probe_delay = Duration::from_millis(200);
    let (_store, probe, resolver) = setup(fake);
    let resolver = Arc::new(resolver);

    let a = tokio::spawn({
        let resolver = resolver.clone();
        async move { resolver.resolve(Path::new("/v/a.mp4")).await }
    });
    let b = tokio::spawn({
        let resolver = resolver.clone();
        async move { resolver.resolve(Path::new("/v/a.mp4")).await }
    });

    let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());
    assert_eq!(a, b);
    assert_eq!(probe.probes.load(Ordering::SeqCst), 1);
    assert!(resolver.cached(Path::new("/v/a.mp4")).is_some());
}

#[tokio::test(start_paused = true)]
async fn hung_probe_times_out_as_skip() {
    let (store, _probe, resolver) = setup(FakeProbe::new(&[("/v/stuck.mp4", Behaviour::Hang)]));

    let started = tokio::time::Instant::now();
    let report = import_files(&store, &resolver, ["/v/stuck.mp4"]).await;

    assert_eq!(started.elapsed(), Duration::from_secs(10));
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].reason.contains("Timed out"));
    assert!(store.read(|s| s.library.is_empty()));
}

#[tokio::test]
async fn failed_resolution_is_retried_later() {
    let (_store, probe, resolver) = setup(FakeProbe::new(&[("/v/flaky.mp4", Behaviour::Fail)]));

    assert!(resolver.resolve(Path::new("/v/flaky.mp4")).await.is_err());
    assert!(resolver.resolve(Path::new("/v/flaky.mp4")).await.is_err());
    assert_eq!(probe.probes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn recording_without_container_duration_uses_recorded_length() {
    let (store, _probe, resolver) = setup(FakeProbe::new(&[
        ("/rec/screen-1.webm", Behaviour::Ok(f64::INFINITY)),
        ("/rec/webcam-1.webm", Behaviour::Fail),
    ]));

    let report = import_recordings(
        &store,
        &resolver,
        &[
            FinishedRecording {
                path: PathBuf::from("/rec/screen-1.webm"),
                kind: CaptureKind::Screen,
                recorded_secs: 7.0,
            },
            FinishedRecording {
                path: PathBuf::from("/rec/webcam-1.webm"),
                kind: CaptureKind::Webcam,
                recorded_secs: 7.0,
            },
        ],
    )
    .await;

    assert_eq!(report.added, vec![PathBuf::from("/rec/screen-1.webm")]);
    assert_eq!(report.skipped.len(), 1);
    let duration = store.read(|s| s.library.get(Path::new("/rec/screen-1.webm")).unwrap().duration);
    assert_eq!(duration, 7.0);
}
