// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture session state machine

use futures::StreamExt;
use futures::stream::BoxStream;
use image::imageops;
use photo_capture::app::{
    CaptureRequest, CaptureSessionManager, ImportRequest, Notification, SessionOutcome,
    SessionState,
};
use photo_capture::backends::camera::{
    CameraPlatform, CameraPosition, FocusPoint, PinchPhase, Viewport,
};
use photo_capture::backends::library::{ImportedItem, MemoryPicker};
use photo_capture::backends::virtual_camera::VirtualCamera;
use photo_capture::config::Config;
use photo_capture::errors::{CaptureError, PickerError};
use photo_capture::flash::FlashMode;
use photo_capture::pipelines::photo::{CapturedImage, ImageOrigin};
use std::io::Cursor;
use std::sync::Arc;

fn new_manager(camera: &Arc<VirtualCamera>, config: Config) -> CaptureSessionManager {
    CaptureSessionManager::new(camera.clone(), Arc::new(MemoryPicker::default()), config)
}

fn started(camera: &Arc<VirtualCamera>, max_count: usize) -> CaptureSessionManager {
    let mut manager = new_manager(camera, Config::default());
    manager.start(Some(max_count)).unwrap();
    manager
}

/// Request a capture and feed its result back; returns the pending image
async fn shoot(manager: &mut CaptureSessionManager) -> CapturedImage {
    let pending = match manager.request_capture().unwrap() {
        CaptureRequest::Started(pending) => pending,
        CaptureRequest::CapReached => panic!("unexpected cap"),
    };
    let result = pending.resolve().await;
    manager.complete_capture(result).unwrap();
    manager.pending_shot().cloned().expect("shot should be pending")
}

#[tokio::test]
async fn test_two_shot_session_reaches_cap_and_hands_off() {
    let camera = Arc::new(VirtualCamera::new());
    let mut manager = started(&camera, 2);

    shoot(&mut manager).await;
    assert_eq!(manager.state(), SessionState::AwaitingConfirm);
    assert_eq!(manager.confirm().unwrap(), 1);
    assert_eq!(manager.state(), SessionState::Live);

    shoot(&mut manager).await;
    assert_eq!(manager.confirm().unwrap(), 2);
    assert_eq!(manager.state(), SessionState::AtCap);

    // At cap: prompt instead of a device call
    assert!(matches!(
        manager.request_capture().unwrap(),
        CaptureRequest::CapReached
    ));
    assert_eq!(camera.capture_count(), 2);
    assert!(
        manager
            .drain_notifications()
            .iter()
            .any(|n| matches!(n, Notification::CapReached { count: 2 }))
    );

    let outcome = manager.acknowledge_cap().unwrap();
    assert_eq!(outcome.images().len(), 2);
    assert_eq!(manager.state(), SessionState::Terminated);
}

#[tokio::test]
async fn test_handoff_fires_once() {
    let camera = Arc::new(VirtualCamera::new());
    let mut manager = started(&camera, 3);
    shoot(&mut manager).await;
    manager.confirm().unwrap();

    let outcome = manager.continue_session().unwrap();
    assert!(matches!(&outcome, SessionOutcome::Completed(images) if images.len() == 1));

    assert_eq!(manager.continue_session().unwrap_err(), CaptureError::Terminated);
    assert_eq!(manager.cancel().unwrap_err(), CaptureError::Terminated);
    assert!(matches!(
        manager.request_capture(),
        Err(CaptureError::Terminated)
    ));
    assert!(!camera.is_running());
    assert!(camera.input_positions().is_empty());
}

#[tokio::test]
async fn test_continue_with_empty_set_is_allowed() {
    let camera = Arc::new(VirtualCamera::new());
    let mut manager = started(&camera, 3);
    assert!(!manager.continue_available());
    let outcome = manager.continue_session().unwrap();
    assert!(matches!(outcome, SessionOutcome::Completed(images) if images.is_empty()));
}

#[tokio::test]
async fn test_reject_keeps_count() {
    let camera = Arc::new(VirtualCamera::new());
    let mut manager = started(&camera, 2);
    shoot(&mut manager).await;
    manager.confirm().unwrap();

    shoot(&mut manager).await;
    manager.reject().unwrap();
    assert_eq!(manager.count(), 1);
    assert_eq!(manager.state(), SessionState::Live);
    assert!(manager.pending_shot().is_none());
    assert!(manager.continue_available());
}

#[tokio::test]
async fn test_confirm_and_reject_need_a_pending_shot() {
    let camera = Arc::new(VirtualCamera::new());
    let mut manager = started(&camera, 2);
    assert_eq!(manager.confirm().unwrap_err(), CaptureError::NoPendingShot);
    assert_eq!(manager.reject().unwrap_err(), CaptureError::NoPendingShot);
}

#[tokio::test]
async fn test_front_capture_is_mirrored() {
    let camera = Arc::new(VirtualCamera::new());
    let config = Config {
        initial_position: CameraPosition::Front,
        ..Config::default()
    };
    let mut manager = new_manager(&camera, config);
    manager.start(Some(2)).unwrap();

    let shot = shoot(&mut manager).await;
    let expected = imageops::flip_horizontal(&camera.reference_frame());
    assert_eq!(shot.pixels(), &expected);
    assert_eq!(shot.origin(), ImageOrigin::Camera(CameraPosition::Front));
}

#[tokio::test]
async fn test_back_capture_is_unmodified() {
    let camera = Arc::new(VirtualCamera::new());
    let mut manager = started(&camera, 2);
    let shot = shoot(&mut manager).await;
    assert_eq!(shot.pixels(), &camera.reference_frame());
}

#[tokio::test]
async fn test_mirroring_can_be_disabled() {
    let camera = Arc::new(VirtualCamera::new());
    let config = Config {
        initial_position: CameraPosition::Front,
        mirror_front_captures: false,
        ..Config::default()
    };
    let mut manager = new_manager(&camera, config);
    manager.start(None).unwrap();
    let shot = shoot(&mut manager).await;
    assert_eq!(shot.pixels(), &camera.reference_frame());
}

#[tokio::test]
async fn test_second_capture_in_flight_is_rejected() {
    let camera = Arc::new(VirtualCamera::new());
    let mut manager = started(&camera, 3);

    let pending = match manager.request_capture().unwrap() {
        CaptureRequest::Started(pending) => pending,
        CaptureRequest::CapReached => panic!("unexpected cap"),
    };
    assert_eq!(
        manager.request_capture().unwrap_err(),
        CaptureError::CaptureInProgress
    );
    assert_eq!(manager.flip().unwrap_err(), CaptureError::CaptureInProgress);
    assert_eq!(camera.capture_count(), 1);

    manager.complete_capture(pending.resolve().await).unwrap();
    // Shot pending: a new capture must wait for confirm/reject
    assert_eq!(
        manager.request_capture().unwrap_err(),
        CaptureError::SlotOccupied
    );
}

#[tokio::test]
async fn test_failed_capture_returns_to_live() {
    let camera = Arc::new(VirtualCamera::new());
    let mut manager = started(&camera, 3);
    camera.fail_next_captures(1);

    let pending = match manager.request_capture().unwrap() {
        CaptureRequest::Started(pending) => pending,
        CaptureRequest::CapReached => panic!("unexpected cap"),
    };
    let err = manager.complete_capture(pending.resolve().await).unwrap_err();
    assert!(matches!(err, CaptureError::CaptureFailed(_)));
    assert_eq!(manager.state(), SessionState::Live);
    assert_eq!(manager.count(), 0);

    // Session still usable
    shoot(&mut manager).await;
}

#[tokio::test]
async fn test_missing_output_reports_unavailable() {
    let camera = Arc::new(VirtualCamera::new().without_photo_output());
    let mut manager = started(&camera, 3);
    assert_eq!(
        manager.request_capture().unwrap_err(),
        CaptureError::OutputUnavailable
    );
    assert_eq!(manager.state(), SessionState::Live);
}

#[test]
fn test_start_failures_create_no_session() {
    let camera = Arc::new(VirtualCamera::new().without_device(CameraPosition::Back));
    let mut manager = new_manager(&camera, Config::default());
    assert_eq!(
        manager.start(Some(3)).unwrap_err(),
        CaptureError::DeviceUnavailable(CameraPosition::Back)
    );
    assert_eq!(manager.state(), SessionState::Idle);

    let camera = Arc::new(VirtualCamera::new().deny_access());
    let mut manager = new_manager(&camera, Config::default());
    assert_eq!(manager.start(Some(3)).unwrap_err(), CaptureError::AccessDenied);
    assert!(camera.input_positions().is_empty());

    let camera = Arc::new(VirtualCamera::new());
    let mut manager = new_manager(&camera, Config::default());
    assert_eq!(
        manager.start(Some(0)).unwrap_err(),
        CaptureError::InvalidMaxCount(0)
    );
}

#[test]
fn test_default_cap_comes_from_config() {
    let camera = Arc::new(VirtualCamera::new());
    let config = Config {
        default_max_count: 7,
        ..Config::default()
    };
    let mut manager = new_manager(&camera, config);
    manager.start(None).unwrap();
    assert_eq!(manager.max_count(), 7);
    assert_eq!(manager.remaining(), 7);
}

#[tokio::test]
async fn test_unbounded_cap_starts_live() {
    let camera = Arc::new(VirtualCamera::new());
    let mut manager = new_manager(&camera, Config::default());
    manager.start(Some(usize::MAX)).unwrap();
    assert_eq!(manager.state(), SessionState::Live);
    assert_eq!(manager.remaining(), usize::MAX);

    shoot(&mut manager).await;
    assert_eq!(manager.confirm().unwrap(), 1);
    assert_eq!(manager.state(), SessionState::Live);
}

#[test]
fn test_operations_before_start_are_invalid() {
    let camera = Arc::new(VirtualCamera::new());
    let mut manager = new_manager(&camera, Config::default());
    assert!(matches!(
        manager.request_capture(),
        Err(CaptureError::InvalidState {
            state: SessionState::Idle,
            ..
        })
    ));
    assert!(manager.set_zoom(2.0).is_err());
    assert!(matches!(manager.cancel(), Ok(SessionOutcome::Cancelled)));
}

#[test]
fn test_zoom_is_clamped() {
    let camera = Arc::new(VirtualCamera::new());
    let mut manager = started(&camera, 3);

    assert_eq!(manager.set_zoom(9.0).unwrap().value(), 5.0);
    assert_eq!(camera.zoom_of(CameraPosition::Back), 5.0);
    assert_eq!(manager.set_zoom(-3.0).unwrap().value(), 1.0);
    assert_eq!(manager.set_zoom(f64::NAN).unwrap().value(), 1.0);
    assert_eq!(manager.slider_zoom(4.8).unwrap().value(), 4.0);
    assert_eq!(manager.pinch(PinchPhase::Ended, 3.0).unwrap().value(), 5.0);
    assert_eq!(camera.zoom_of(CameraPosition::Back), 5.0);
}

#[test]
fn test_locked_device_is_reported_and_state_kept() {
    let camera = Arc::new(VirtualCamera::new());
    let mut manager = started(&camera, 3);
    manager.set_zoom(2.0).unwrap();

    camera.fail_next_locks(2);
    assert!(matches!(
        manager.set_zoom(3.0),
        Err(CaptureError::ConfigurationLocked(_))
    ));
    assert!(matches!(
        manager.cycle_flash(),
        Err(CaptureError::ConfigurationLocked(_))
    ));
    assert_eq!(manager.zoom().map(|z| z.value()), Some(2.0));
    assert_eq!(manager.flash_mode(), Some(FlashMode::Auto));

    // Not retried automatically, but a later attempt succeeds
    assert_eq!(manager.set_zoom(3.0).unwrap().value(), 3.0);
}

#[test]
fn test_flip_without_opposite_device_keeps_input() {
    let camera = Arc::new(VirtualCamera::new().without_device(CameraPosition::Front));
    let mut manager = started(&camera, 3);

    assert_eq!(
        manager.flip().unwrap_err(),
        CaptureError::DeviceUnavailable(CameraPosition::Front)
    );
    assert_eq!(manager.position(), Some(CameraPosition::Back));
    assert_eq!(camera.input_positions(), vec![CameraPosition::Back]);
    assert!(camera.is_running());
    assert_eq!(manager.state(), SessionState::Live);
}

#[test]
fn test_flip_resets_zoom_and_hides_zoom_control() {
    let camera = Arc::new(VirtualCamera::new());
    let mut manager = started(&camera, 3);
    manager.set_zoom(3.0).unwrap();
    assert!(manager.zoom_control_available());

    assert_eq!(manager.flip().unwrap(), CameraPosition::Front);
    assert!(!manager.zoom_control_available());
    assert_eq!(manager.zoom().map(|z| z.value()), Some(1.0));
    assert_eq!(camera.zoom_of(CameraPosition::Front), 1.0);
    // Flash mode carries over to the new device
    assert_eq!(camera.flash_of(CameraPosition::Front), Some(FlashMode::Auto));

    // Back on the back camera the device is at 1.0 too, not the old 3.0
    assert_eq!(manager.flip().unwrap(), CameraPosition::Back);
    assert_eq!(manager.zoom().map(|z| z.value()), Some(1.0));
    assert_eq!(camera.zoom_of(CameraPosition::Back), 1.0);
}

#[test]
fn test_tap_to_focus_normalizes_view_coordinates() {
    let camera = Arc::new(VirtualCamera::new());
    let mut manager = started(&camera, 3);
    let viewport = Viewport::new(1080.0, 1920.0);

    let point = manager.focus_at(540.0, 480.0, viewport).unwrap();
    assert_eq!(point, FocusPoint::new(0.5, 0.25));
    assert_eq!(camera.focus_of(CameraPosition::Back), Some(point));

    // Taps outside the view are clamped to the frame
    let point = manager.focus_at(-10.0, 5000.0, viewport).unwrap();
    assert_eq!(point, FocusPoint::new(0.0, 1.0));

    assert!(manager.focus_at(1.0, 1.0, Viewport::new(0.0, 0.0)).is_err());
}

#[test]
fn test_unsupported_focus_leaves_state() {
    let camera = Arc::new(VirtualCamera::new().without_focus_support(CameraPosition::Back));
    let mut manager = started(&camera, 3);
    assert!(matches!(
        manager.focus_at(10.0, 10.0, Viewport::new(100.0, 100.0)),
        Err(CaptureError::Device(_))
    ));
    assert_eq!(camera.focus_of(CameraPosition::Back), None);
}

#[tokio::test]
async fn test_flash_mode_travels_with_capture() {
    let camera = Arc::new(VirtualCamera::new());
    let mut manager = started(&camera, 3);
    assert_eq!(manager.cycle_flash().unwrap(), FlashMode::On);

    shoot(&mut manager).await;
    let settings = camera.last_capture_settings().unwrap();
    assert_eq!(settings.flash_mode, FlashMode::On);
    assert!(!settings.high_resolution);

    assert_eq!(manager.cycle_flash().unwrap(), FlashMode::Off);
    assert_eq!(manager.cycle_flash().unwrap(), FlashMode::Auto);
}

#[test]
fn test_suspend_and_resume() {
    let camera = Arc::new(VirtualCamera::new());
    let mut manager = started(&camera, 3);
    manager.suspend().unwrap();
    assert!(!camera.is_running());
    manager.resume().unwrap();
    assert!(camera.is_running());
}

#[test]
fn test_cancel_releases_camera() {
    let camera = Arc::new(VirtualCamera::new());
    let mut manager = started(&camera, 3);
    assert!(matches!(manager.cancel(), Ok(SessionOutcome::Cancelled)));
    assert!(!camera.is_running());
    assert!(camera.input_positions().is_empty());
}

#[test]
fn test_dropping_manager_stops_session() {
    let camera = Arc::new(VirtualCamera::new());
    {
        let _manager = started(&camera, 3);
        assert!(camera.is_running());
    }
    assert!(!camera.is_running());
}

#[tokio::test]
async fn test_count_never_exceeds_cap() {
    let camera = Arc::new(VirtualCamera::new());
    let selections: Vec<Result<Vec<u8>, PickerError>> = (0..4u8)
        .map(|shade| {
            let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([shade, 0, 0, 255]));
            let mut bytes = Vec::new();
            img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
                .unwrap();
            Ok(bytes)
        })
        .collect();
    let max_count = 5;
    let mut manager = CaptureSessionManager::new(
        camera.clone(),
        Arc::new(MemoryPicker::new(selections)),
        Config::default(),
    );
    manager.start(Some(max_count)).unwrap();

    // Deterministic mix of live capture, library import and camera controls
    let mut import: Option<BoxStream<'static, ImportedItem>> = None;
    let mut seed: u32 = 7;
    for _ in 0..120 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        match (seed >> 16) % 6 {
            0 => {
                if let Ok(CaptureRequest::Started(pending)) = manager.request_capture() {
                    let _ = manager.complete_capture(pending.resolve().await);
                }
            }
            1 => {
                let _ = manager.confirm();
            }
            2 => {
                let _ = manager.reject();
            }
            3 => {
                if let Ok(ImportRequest::Started { items, .. }) = manager.request_import() {
                    import = Some(items);
                }
            }
            4 => {
                // Deliver one item of the running import, or finish it
                if let Some(items) = import.as_mut() {
                    match items.next().await {
                        Some(item) => {
                            let _ = manager.import_item(item);
                        }
                        None => {
                            manager.finish_import();
                            import = None;
                        }
                    }
                }
            }
            _ => {
                let _ = manager.flip();
            }
        }
        assert!(manager.count() <= max_count);
        assert_eq!(
            manager.state() == SessionState::AtCap,
            manager.count() == max_count
        );
    }
}
