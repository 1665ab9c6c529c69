mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use common::{
    camera, drain_for, microphone, open_screen, runtime, wait_for, write_png, FakeBackend,
    Outcome,
};
use photoalign_app::capture_screen::{ERROR_LOADING_FILE, VIDEO_NOT_AVAILABLE};
use photoalign_app::device_select::{SelectorState, ENUMERATION_UNSUPPORTED, NO_DEVICES_FOUND};

fn photo_millis(path: &std::path::Path) -> i64 {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .expect("photo should have a utf-8 name");
    let digits = name
        .strip_prefix("Image_")
        .and_then(|rest| rest.strip_suffix(".png"))
        .expect("photo name should be Image_<digits>.png");
    assert!(digits.chars().all(|c| c.is_ascii_digit()), "{name}");
    digits.parse().expect("digits should parse")
}

#[test]
fn first_video_input_is_selected_and_streamed() {
    let rt = runtime();
    let temp = tempfile::tempdir().unwrap();
    let backend = Arc::new(FakeBackend::new(vec![
        microphone("mic"),
        camera("cam-a", "Front"),
        camera("cam-b", ""),
    ]));
    let mut screen = open_screen(&backend, temp.path(), &rt);

    wait_for(&mut screen, |s| s.stream_device_id() == Some("cam-a"));

    let labels: Vec<String> = screen
        .selector()
        .options()
        .into_iter()
        .map(|o| o.label)
        .collect();
    assert_eq!(labels, vec!["Front".to_string(), "cam-b".to_string()]);
    assert!(screen.can_capture());
    assert!(screen.error().is_none());

    let requests = backend.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    let constraints = &requests[0];
    assert_eq!(constraints.video.min_width, 1280);
    assert_eq!(constraints.video.min_height, 720);
    assert_eq!(constraints.video.device_id, "cam-a");
    assert_eq!(constraints.video.group_id, "group-cam-a");
    assert!(!constraints.audio);
}

#[test]
fn no_cameras_means_placeholder_and_no_capture() {
    let rt = runtime();
    let temp = tempfile::tempdir().unwrap();
    let backend = Arc::new(FakeBackend::new(vec![microphone("mic")]));
    let mut screen = open_screen(&backend, temp.path(), &rt);

    wait_for(&mut screen, |s| s.selector().state() == SelectorState::Ready);

    let options = screen.selector().options();
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].label, NO_DEVICES_FOUND);
    assert!(!options[0].enabled);
    assert!(!screen.selector().is_enabled());
    assert!(screen.error().is_none());
    assert!(!screen.can_capture());

    assert!(screen.capture_photo().is_none());
    assert!(screen.error().is_none());
    assert_eq!(backend.request_count(), 0);
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn missing_enumeration_is_reported_once() {
    let rt = runtime();
    let temp = tempfile::tempdir().unwrap();
    let backend = Arc::new(FakeBackend::unsupported());
    let mut screen = open_screen(&backend, temp.path(), &rt);

    assert_eq!(screen.error(), Some(ENUMERATION_UNSUPPORTED));
    assert_eq!(screen.selector().state(), SelectorState::Unsupported);

    screen.dismiss_error();
    drain_for(&mut screen, Duration::from_millis(100));
    assert!(screen.error().is_none());
    assert_eq!(backend.request_count(), 0);
}

#[test]
fn enumeration_failure_surfaces_as_error() {
    let rt = runtime();
    let temp = tempfile::tempdir().unwrap();
    let backend = Arc::new(FakeBackend::failing("sysfs unreadable"));
    let mut screen = open_screen(&backend, temp.path(), &rt);

    wait_for(&mut screen, |s| s.error().is_some());
    assert!(screen.error().unwrap().contains("sysfs unreadable"));
    assert_eq!(screen.selector().state(), SelectorState::Failed);
    assert!(!screen.can_capture());
}

#[test]
fn acquisition_failure_text_is_verbatim_and_dismiss_does_not_retry() {
    let rt = runtime();
    let temp = tempfile::tempdir().unwrap();
    let backend = Arc::new(
        FakeBackend::new(vec![camera("cam-a", "Front")])
            .with_outcome("cam-a", Outcome::Fail("Permission denied".to_string())),
    );
    let mut screen = open_screen(&backend, temp.path(), &rt);

    wait_for(&mut screen, |s| s.error().is_some());
    assert_eq!(screen.error(), Some("Permission denied"));
    assert!(screen.stream_device_id().is_none());

    screen.dismiss_error();
    drain_for(&mut screen, Duration::from_millis(150));
    assert!(screen.error().is_none());
    assert_eq!(backend.request_count(), 1);
    // The device stays selected even though no stream came up.
    assert!(screen.can_capture());
}

#[test]
fn focus_loss_after_failure_does_not_retry_but_a_pick_does() {
    let rt = runtime();
    let temp = tempfile::tempdir().unwrap();
    let backend = Arc::new(
        FakeBackend::new(vec![camera("cam-a", "Front")])
            .with_outcome("cam-a", Outcome::Fail("Device busy".to_string())),
    );
    let mut screen = open_screen(&backend, temp.path(), &rt);
    wait_for(&mut screen, |s| s.error().is_some());

    screen.dismiss_error();
    screen.blur_device_control();
    drain_for(&mut screen, Duration::from_millis(150));
    assert_eq!(backend.request_count(), 1);
    assert!(screen.error().is_none());
    assert!(!screen.is_acquiring());

    screen.select_device(0);
    wait_for(&mut screen, |s| s.error().is_some());
    assert_eq!(backend.requested_devices(), vec!["cam-a", "cam-a"]);
    assert_eq!(screen.error(), Some("Device busy"));
}

#[test]
fn selecting_a_position_switches_streams_and_releases_the_old_one() {
    let rt = runtime();
    let temp = tempfile::tempdir().unwrap();
    let backend = Arc::new(FakeBackend::new(vec![
        camera("cam-a", "Front"),
        microphone("mic"),
        camera("cam-b", "Rear"),
    ]));
    let mut screen = open_screen(&backend, temp.path(), &rt);
    wait_for(&mut screen, |s| s.stream_device_id() == Some("cam-a"));

    screen.select_device(1);
    assert_eq!(backend.released_devices(), vec!["cam-a".to_string()]);
    wait_for(&mut screen, |s| s.stream_device_id() == Some("cam-b"));

    assert_eq!(screen.video_source().unwrap().device_id, "cam-b");
    assert_eq!(backend.requested_devices(), vec!["cam-a", "cam-b"]);
}

#[test]
fn late_stream_for_a_superseded_device_is_released() {
    let rt = runtime();
    let temp = tempfile::tempdir().unwrap();
    let backend = Arc::new(
        FakeBackend::new(vec![camera("slow", "Slow"), camera("fast", "Fast")])
            .with_outcome("slow", Outcome::delayed(1280, 720, Duration::from_millis(300))),
    );
    let mut screen = open_screen(&backend, temp.path(), &rt);

    wait_for(&mut screen, |s| s.video_source().is_some());
    screen.select_device(1);
    wait_for(&mut screen, |s| s.stream_device_id() == Some("fast"));

    drain_for(&mut screen, Duration::from_millis(600));
    assert_eq!(screen.stream_device_id(), Some("fast"));
    assert!(backend.released_devices().contains(&"slow".to_string()));
    assert!(!backend.released_devices().contains(&"fast".to_string()));
}

#[test]
fn reselecting_the_live_device_is_a_no_op() {
    let rt = runtime();
    let temp = tempfile::tempdir().unwrap();
    let backend = Arc::new(FakeBackend::new(vec![camera("cam-a", "Front")]));
    let mut screen = open_screen(&backend, temp.path(), &rt);
    wait_for(&mut screen, |s| s.stream_device_id() == Some("cam-a"));

    screen.blur_device_control();
    screen.select_device(0);
    drain_for(&mut screen, Duration::from_millis(100));

    assert_eq!(backend.request_count(), 1);
    assert!(backend.released_devices().is_empty());
}

#[test]
fn capture_writes_native_size_png_with_increasing_names() {
    let rt = runtime();
    let temp = tempfile::tempdir().unwrap();
    let export_dir = temp.path().join("exports");
    let backend = Arc::new(
        FakeBackend::new(vec![camera("cam-a", "Front")])
            .with_outcome("cam-a", Outcome::stream(64, 48)),
    );
    let mut screen = open_screen(&backend, &export_dir, &rt);
    wait_for(&mut screen, |s| s.latest_frame().is_some());

    let first = screen.capture_photo().expect("first capture should be written");
    let second = screen.capture_photo().expect("second capture should be written");

    assert_eq!(first.parent(), Some(export_dir.as_path()));
    assert!(photo_millis(&second) > photo_millis(&first));
    assert_eq!(screen.last_export(), Some(&second));

    let decoded = image::open(&first).expect("capture should decode").to_rgba8();
    assert_eq!(decoded.dimensions(), (64, 48));
    assert_eq!(
        decoded.as_raw().as_slice(),
        &common::test_frame(64, 48).pixels[..]
    );
    assert!(screen.error().is_none());
}

#[test]
fn capture_before_first_frame_reports_missing_video() {
    let rt = runtime();
    let temp = tempfile::tempdir().unwrap();
    let backend = Arc::new(
        FakeBackend::new(vec![camera("cam-a", "Front")])
            .with_outcome("cam-a", Outcome::without_frames()),
    );
    let mut screen = open_screen(&backend, temp.path(), &rt);
    wait_for(&mut screen, |s| s.stream_device_id().is_some());

    assert!(screen.capture_photo().is_none());
    assert_eq!(screen.error(), Some(VIDEO_NOT_AVAILABLE));
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn newer_reference_replaces_older() {
    let rt = runtime();
    let temp = tempfile::tempdir().unwrap();
    let a = temp.path().join("a.png");
    let b = temp.path().join("b.png");
    write_png(&a, 8, 8);
    write_png(&b, 12, 6);

    let backend = Arc::new(FakeBackend::new(Vec::new()));
    let mut screen = open_screen(&backend, temp.path(), &rt);

    screen.load_reference([a]);
    wait_for(&mut screen, |s| s.reference().is_some());
    assert_eq!(screen.reference().unwrap().file_name, "a.png");

    screen.load_reference([b]);
    wait_for(&mut screen, |s| {
        s.reference().map(|r| r.file_name.as_str()) == Some("b.png")
    });
    assert_eq!(screen.reference().unwrap().size(), (12, 6));
}

#[test]
fn only_the_latest_of_overlapping_reads_applies() {
    let rt = runtime();
    let temp = tempfile::tempdir().unwrap();
    let a = temp.path().join("a.png");
    let b = temp.path().join("b.png");
    write_png(&a, 400, 400);
    write_png(&b, 2, 2);

    let backend = Arc::new(FakeBackend::new(Vec::new()));
    let mut screen = open_screen(&backend, temp.path(), &rt);

    screen.load_reference([a]);
    screen.load_reference([b]);
    wait_for(&mut screen, |s| !s.is_loading_reference());
    drain_for(&mut screen, Duration::from_millis(200));

    assert_eq!(screen.reference().unwrap().file_name, "b.png");
}

#[test]
fn unreadable_reference_keeps_previous_and_shows_generic_error() {
    let rt = runtime();
    let temp = tempfile::tempdir().unwrap();
    let good = temp.path().join("good.png");
    let bad = temp.path().join("bad.png");
    write_png(&good, 8, 8);
    std::fs::write(&bad, b"definitely not a png").unwrap();

    let backend = Arc::new(FakeBackend::new(Vec::new()));
    let mut screen = open_screen(&backend, temp.path(), &rt);

    screen.load_reference([good]);
    wait_for(&mut screen, |s| s.reference().is_some());

    screen.load_reference([bad]);
    wait_for(&mut screen, |s| s.error().is_some());
    assert_eq!(screen.error(), Some(ERROR_LOADING_FILE));
    assert_eq!(screen.reference().unwrap().file_name, "good.png");

    screen.load_reference([temp.path().join("missing.jpg")]);
    wait_for(&mut screen, |s| !s.is_loading_reference());
    assert_eq!(screen.error(), Some(ERROR_LOADING_FILE));
    assert_eq!(screen.reference().unwrap().file_name, "good.png");
}

#[test]
fn only_first_of_several_files_is_used() {
    let rt = runtime();
    let temp = tempfile::tempdir().unwrap();
    let first = temp.path().join("first.png");
    let second = temp.path().join("second.png");
    write_png(&first, 4, 4);
    write_png(&second, 4, 4);

    let backend = Arc::new(FakeBackend::new(Vec::new()));
    let mut screen = open_screen(&backend, temp.path(), &rt);

    screen.load_reference(Vec::<PathBuf>::new());
    assert!(!screen.is_loading_reference());

    screen.load_reference(vec![first, second]);
    wait_for(&mut screen, |s| s.reference().is_some());
    drain_for(&mut screen, Duration::from_millis(100));
    assert_eq!(screen.reference().unwrap().file_name, "first.png");
}

#[test]
fn dropping_the_screen_releases_its_stream() {
    let rt = runtime();
    let temp = tempfile::tempdir().unwrap();
    let backend = Arc::new(FakeBackend::new(vec![camera("cam-a", "Front")]));
    let mut screen = open_screen(&backend, temp.path(), &rt);
    wait_for(&mut screen, |s| s.stream_device_id() == Some("cam-a"));

    drop(screen);
    assert_eq!(backend.released_devices(), vec!["cam-a".to_string()]);
}
