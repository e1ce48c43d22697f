use std::path::Path;
use std::process::{Command, Stdio};

use test_log::test;
use webm_fix::{FfmpegRepairer, Metadata, StatusCode, fix_webm_file, is_ffmpeg_available};

/// Encode a short lossless test clip, or `None` if this ffmpeg cannot.
fn make_clip(path: &Path) -> Option<()> {
    let status = Command::new("ffmpeg")
        .args([
            "-hide_banner",
            "-nostdin",
            "-y",
            "-f",
            "lavfi",
            "-i",
            "testsrc=duration=1:size=64x48:rate=10",
            "-c:v",
            "ffv1",
        ])
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .ok()?;
    status.success().then_some(())
}

#[test]
fn remux_restores_duration_and_title() {
    if !is_ffmpeg_available() {
        tracing::warn!("ffmpeg not available, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("clip.mkv");
    let dst = dir.path().join("fixed.mkv");
    if make_clip(&src).is_none() {
        tracing::warn!("could not encode test clip, skipping");
        return;
    }

    let mut metadata = Metadata::new();
    metadata.insert("title", "repaired clip");
    let status = fix_webm_file(&FfmpegRepairer::new(), &src, &dst, &metadata).unwrap();
    assert_eq!(status, StatusCode::SUCCESS);

    let report = webm_probe::probe_path(&dst).unwrap();
    assert_eq!(report.doc_type, "matroska");
    assert!(report.duration_secs.is_some());
    assert!(report.cue_points > 0);
    assert!(!report.truncated);
    // The matroska muxer stores the title in the segment info.
    assert_eq!(report.title.as_deref(), Some("repaired clip"));
}

#[test]
fn garbage_input_is_a_failed_status() {
    if !is_ffmpeg_available() {
        tracing::warn!("ffmpeg not available, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("garbage.webm");
    std::fs::write(&src, b"this is not a media file").unwrap();

    let status = fix_webm_file(
        &FfmpegRepairer::new(),
        &src,
        &dir.path().join("out.webm"),
        &Metadata::new(),
    )
    .unwrap();
    assert_eq!(status, StatusCode::FAILURE);
}
