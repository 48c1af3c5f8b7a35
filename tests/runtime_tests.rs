// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the session owner task

use photo_capture::app::{
    Notification, SessionEvent, SessionHandle, SessionOutcome, SessionRuntime,
};
use photo_capture::backends::camera::CameraPlatform;
use photo_capture::backends::library::MemoryPicker;
use photo_capture::backends::virtual_camera::VirtualCamera;
use photo_capture::config::Config;
use photo_capture::errors::{CaptureError, PickerError};
use photo_capture::SessionState;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn start(camera: &Arc<VirtualCamera>, picker: MemoryPicker, max_count: usize) -> SessionHandle {
    SessionRuntime::start(
        camera.clone(),
        Arc::new(picker),
        Config::default(),
        Some(max_count),
    )
    .unwrap()
}

/// Read notifications until one matches
async fn wait_for(
    handle: &mut SessionHandle,
    pred: impl Fn(&Notification) -> bool,
) -> Notification {
    timeout(WAIT, async {
        loop {
            match handle.next_notification().await {
                Some(n) if pred(&n) => return n,
                Some(_) => continue,
                None => panic!("session closed before the expected notification"),
            }
        }
    })
    .await
    .expect("timed out waiting for notification")
}

async fn shoot_and_confirm(handle: &mut SessionHandle) {
    handle.send(SessionEvent::Capture).await.unwrap();
    wait_for(handle, |n| matches!(n, Notification::PreviewReady(_))).await;
    handle.send(SessionEvent::Confirm).await.unwrap();
    wait_for(handle, |n| matches!(n, Notification::PhotoAdded { .. })).await;
}

fn png() -> Vec<u8> {
    let img = image::RgbaImage::new(3, 3);
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

#[tokio::test]
async fn test_capture_confirm_continue() {
    let camera = Arc::new(VirtualCamera::new());
    let mut handle = start(&camera, MemoryPicker::default(), 3);

    shoot_and_confirm(&mut handle).await;
    handle.send(SessionEvent::Continue).await.unwrap();

    let outcome = timeout(WAIT, handle.outcome()).await.unwrap().unwrap();
    assert_eq!(outcome.images().len(), 1);
    assert!(!camera.is_running());
}

#[tokio::test]
async fn test_first_notification_is_live() {
    let camera = Arc::new(VirtualCamera::new());
    let mut handle = start(&camera, MemoryPicker::default(), 3);
    assert!(matches!(
        handle.try_next_notification(),
        Some(Notification::StateChanged {
            state: SessionState::Live,
            count: 0
        })
    ));
}

#[tokio::test]
async fn test_cap_prompt_and_acknowledge() {
    let camera = Arc::new(VirtualCamera::new());
    let mut handle = start(&camera, MemoryPicker::default(), 1);

    shoot_and_confirm(&mut handle).await;
    wait_for(&mut handle, |n| matches!(n, Notification::CapReached { count: 1 })).await;

    // Another shot only re-raises the prompt
    handle.send(SessionEvent::Capture).await.unwrap();
    wait_for(&mut handle, |n| matches!(n, Notification::CapReached { count: 1 })).await;
    assert_eq!(camera.capture_count(), 1);

    handle.send(SessionEvent::AcknowledgeCap).await.unwrap();
    let outcome = timeout(WAIT, handle.outcome()).await.unwrap().unwrap();
    assert!(matches!(outcome, SessionOutcome::Completed(images) if images.len() == 1));
}

#[tokio::test]
async fn test_errors_are_notified_and_session_survives() {
    let camera = Arc::new(VirtualCamera::new());
    let mut handle = start(&camera, MemoryPicker::default(), 3);

    handle.send(SessionEvent::Confirm).await.unwrap();
    let error = wait_for(&mut handle, |n| matches!(n, Notification::Error(_))).await;
    assert!(matches!(error, Notification::Error(CaptureError::NoPendingShot)));

    shoot_and_confirm(&mut handle).await;
    handle.send(SessionEvent::Continue).await.unwrap();
    let outcome = timeout(WAIT, handle.outcome()).await.unwrap().unwrap();
    assert_eq!(outcome.images().len(), 1);
}

#[tokio::test]
async fn test_second_capture_while_in_flight_is_refused() {
    let camera = Arc::new(VirtualCamera::new().with_capture_delay(Duration::from_millis(100)));
    let mut handle = start(&camera, MemoryPicker::default(), 3);

    handle.send(SessionEvent::Capture).await.unwrap();
    handle.send(SessionEvent::Capture).await.unwrap();

    let error = wait_for(&mut handle, |n| matches!(n, Notification::Error(_))).await;
    assert!(matches!(
        error,
        Notification::Error(CaptureError::CaptureInProgress)
    ));
    wait_for(&mut handle, |n| matches!(n, Notification::PreviewReady(_))).await;
    assert_eq!(camera.capture_count(), 1);
}

#[tokio::test]
async fn test_import_through_runtime() {
    let camera = Arc::new(VirtualCamera::new());
    let picker = MemoryPicker::new(vec![
        Ok(png()),
        Err(PickerError::LoadFailed("gone".into())),
        Ok(png()),
    ]);
    let mut handle = start(&camera, picker, 5);

    handle.send(SessionEvent::Import).await.unwrap();
    wait_for(&mut handle, |n| matches!(n, Notification::ImportStarted { budget: 5 })).await;
    let error = wait_for(&mut handle, |n| matches!(n, Notification::Error(_))).await;
    assert!(matches!(
        error,
        Notification::Error(CaptureError::ImportItemFailed { index: 1, .. })
    ));
    wait_for(&mut handle, |n| matches!(n, Notification::ImportFinished { count: 2 })).await;

    handle.send(SessionEvent::Continue).await.unwrap();
    let outcome = timeout(WAIT, handle.outcome()).await.unwrap().unwrap();
    assert_eq!(outcome.images().len(), 2);
}

#[tokio::test]
async fn test_outcome_without_terminal_event_cancels() {
    let camera = Arc::new(VirtualCamera::new());
    let mut handle = start(&camera, MemoryPicker::default(), 3);
    shoot_and_confirm(&mut handle).await;

    let outcome = timeout(WAIT, handle.outcome()).await.unwrap().unwrap();
    assert!(matches!(outcome, SessionOutcome::Cancelled));
    assert!(!camera.is_running());
    assert!(camera.input_positions().is_empty());
}

#[tokio::test]
async fn test_terminal_event_fires_once() {
    let camera = Arc::new(VirtualCamera::new());
    let mut handle = start(&camera, MemoryPicker::default(), 3);

    handle.send(SessionEvent::Continue).await.unwrap();

    // Notification channel closes once the owner task is gone
    timeout(WAIT, async { while handle.next_notification().await.is_some() {} })
        .await
        .unwrap();

    assert_eq!(
        handle.send(SessionEvent::Cancel).await.unwrap_err(),
        CaptureError::Terminated
    );
    let outcome = timeout(WAIT, handle.outcome()).await.unwrap().unwrap();
    assert!(matches!(outcome, SessionOutcome::Completed(images) if images.is_empty()));
}

#[tokio::test]
async fn test_start_failure_spawns_nothing() {
    let camera = Arc::new(VirtualCamera::new().deny_access());
    let result = SessionRuntime::start(
        camera.clone(),
        Arc::new(MemoryPicker::default()),
        Config::default(),
        Some(3),
    );
    assert!(matches!(result, Err(CaptureError::AccessDenied)));
    assert!(!camera.is_running());
}
