// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the capture session
//!
//! This module provides command-line functionality for:
//! - Listing the virtual camera devices
//! - Running a scripted capture session and saving the hand-off

use photo_capture::app::{Notification, SessionEvent, SessionOutcome, SessionRuntime};
use photo_capture::backends::camera::{CameraPlatform, CameraPosition, PinchPhase, Viewport};
use photo_capture::backends::library::{FolderPicker, LibraryPicker, MemoryPicker};
use photo_capture::backends::virtual_camera::VirtualCamera;
use photo_capture::config::Config;
use photo_capture::constants::timing::STEP_TIMEOUT;
use photo_capture::storage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// View size taps in `focus=X:Y` steps are measured against
const SCRIPT_VIEWPORT: Viewport = Viewport {
    width: 1080.0,
    height: 1920.0,
};

/// Options of the `session` command
pub struct SessionOptions {
    pub max_count: Option<usize>,
    pub script: String,
    pub source: Option<PathBuf>,
    pub library: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub front: bool,
}

/// List the devices of the virtual camera
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let camera = VirtualCamera::new();

    println!("Available cameras:");
    println!();
    for position in [CameraPosition::Back, CameraPosition::Front] {
        if let Some(device) = camera.list_device(position) {
            println!("  [{}] {} ({})", position, device.name, device.id);
        }
    }
    Ok(())
}

/// Run a scripted session and save the handed-off images
pub fn run_session(options: SessionOptions) -> Result<(), Box<dyn std::error::Error>> {
    let steps = parse_script(&options.script)?;

    let mut config = Config::load_or_default(options.config.as_deref());
    if options.front {
        config.initial_position = CameraPosition::Front;
    }
    let output_dir = options
        .output
        .clone()
        .unwrap_or_else(|| config.resolved_output_dir());
    let quality = config.jpeg_quality;

    let camera = match &options.source {
        Some(path) => VirtualCamera::from_image_file(path)?,
        None => VirtualCamera::new(),
    };
    let platform: Arc<dyn CameraPlatform> = Arc::new(camera);
    let picker: Arc<dyn LibraryPicker> = match &options.library {
        Some(dir) => Arc::new(FolderPicker::new(dir)),
        None => Arc::new(MemoryPicker::default()),
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let mut handle = SessionRuntime::start(platform, picker, config, options.max_count)?;

        for event in steps {
            println!("> {:?}", event);
            let terminal = matches!(
                event,
                SessionEvent::Continue | SessionEvent::AcknowledgeCap | SessionEvent::Cancel
            );
            handle.send(event.clone()).await?;

            let mut import_started = false;
            let wait = async {
                while let Some(notification) = handle.next_notification().await {
                    print_notification(&notification);
                    if let Notification::ImportStarted { .. } = notification {
                        import_started = true;
                    }
                    if settles(&event, &notification, import_started) {
                        return true;
                    }
                }
                false
            };

            let still_open = if terminal || waits_for_notification(&event) {
                match tokio::time::timeout(STEP_TIMEOUT, wait).await {
                    Ok(open) => open,
                    Err(_) => {
                        eprintln!("Timed out waiting for {:?}", event);
                        true
                    }
                }
            } else {
                true
            };
            if !still_open {
                debug!("Session ended during script");
                break;
            }
        }

        while let Some(notification) = handle.try_next_notification() {
            print_notification(&notification);
        }

        match handle.outcome().await? {
            SessionOutcome::Completed(images) => {
                println!("Session completed with {} image(s)", images.len());
                if !images.is_empty() {
                    let paths = storage::save_images(images, output_dir, quality).await?;
                    for path in paths {
                        println!("  {}", path.display());
                    }
                }
            }
            SessionOutcome::Cancelled => println!("Session cancelled"),
        }
        Ok::<_, Box<dyn std::error::Error>>(())
    })
}

/// Parse a comma-separated step list such as `capture,confirm,flip,zoom=2`
fn parse_script(script: &str) -> Result<Vec<SessionEvent>, String> {
    script
        .split(',')
        .map(str::trim)
        .filter(|step| !step.is_empty())
        .map(parse_step)
        .collect()
}

fn parse_step(step: &str) -> Result<SessionEvent, String> {
    let (name, arg) = match step.split_once('=') {
        Some((name, arg)) => (name, Some(arg)),
        None => (step, None),
    };
    let number = |arg: Option<&str>| -> Result<f64, String> {
        arg.ok_or_else(|| format!("step '{}' needs a value", name))?
            .parse::<f64>()
            .map_err(|e| format!("step '{}': {}", step, e))
    };

    let event = match name {
        "capture" => SessionEvent::Capture,
        "confirm" => SessionEvent::Confirm,
        "reject" => SessionEvent::Reject,
        "import" => SessionEvent::Import,
        "cancel-import" => SessionEvent::CancelImport,
        "continue" => SessionEvent::Continue,
        "ack" => SessionEvent::AcknowledgeCap,
        "cancel" => SessionEvent::Cancel,
        "flash" => SessionEvent::CycleFlash,
        "flip" => SessionEvent::Flip,
        "suspend" => SessionEvent::Suspend,
        "resume" => SessionEvent::Resume,
        "zoom" => SessionEvent::SetZoom(number(arg)?),
        "slider" => SessionEvent::SliderZoom(number(arg)?),
        "pinch" => SessionEvent::Pinch {
            phase: PinchPhase::Ended,
            scale: number(arg)?,
        },
        "focus" => {
            let (x, y) = arg
                .and_then(|arg| arg.split_once(':'))
                .ok_or_else(|| format!("step '{}' needs X:Y", step))?;
            SessionEvent::FocusAt {
                x: number(Some(x))?,
                y: number(Some(y))?,
                viewport: SCRIPT_VIEWPORT,
            }
        }
        other => return Err(format!("unknown step '{}'", other)),
    };
    Ok(event)
}

/// Whether a step produces a notification worth waiting for
fn waits_for_notification(event: &SessionEvent) -> bool {
    !matches!(
        event,
        SessionEvent::Suspend | SessionEvent::Resume | SessionEvent::CancelImport
    )
}

/// Whether `notification` completes `event`
fn settles(event: &SessionEvent, notification: &Notification, import_started: bool) -> bool {
    if matches!(notification, Notification::Error(_)) {
        return true;
    }
    match event {
        SessionEvent::Capture => matches!(
            notification,
            Notification::PreviewReady(_) | Notification::CapReached { .. }
        ),
        SessionEvent::Confirm => matches!(notification, Notification::PhotoAdded { .. }),
        SessionEvent::Reject => matches!(notification, Notification::StateChanged { .. }),
        SessionEvent::Import => match notification {
            Notification::ImportFinished { .. } => true,
            Notification::CapReached { .. } => !import_started,
            _ => false,
        },
        SessionEvent::SetZoom(_) | SessionEvent::SliderZoom(_) | SessionEvent::Pinch { .. } => {
            matches!(notification, Notification::ZoomChanged(_))
        }
        SessionEvent::FocusAt { .. } => matches!(notification, Notification::FocusChanged(_)),
        SessionEvent::CycleFlash => matches!(notification, Notification::FlashChanged(_)),
        SessionEvent::Flip => matches!(notification, Notification::CameraFlipped(_)),
        // Terminal steps run until the notification channel closes
        _ => false,
    }
}

fn print_notification(notification: &Notification) {
    match notification {
        Notification::StateChanged { state, count } => println!("  state: {} ({})", state, count),
        Notification::PreviewReady(image) => {
            println!("  preview ready: {}x{}", image.width(), image.height())
        }
        Notification::PhotoAdded { count } => println!("  photo added, {} collected", count),
        Notification::CapReached { count } => {
            println!("  cap reached with {} image(s), continue?", count)
        }
        Notification::ZoomChanged(zoom) => println!("  zoom: {}", zoom),
        Notification::FocusChanged(point) => println!("  focus: {}", point),
        Notification::FlashChanged(mode) => println!("  flash: {}", mode),
        Notification::CameraFlipped(position) => println!("  camera: {}", position),
        Notification::ImportStarted { budget } => println!("  import up to {}", budget),
        Notification::ImportFinished { count } => {
            println!("  import finished, {} collected", count)
        }
        Notification::Error(e) => println!("  error: {}", e),
    }
}
