pub mod app;
pub mod camera;
mod capture;
mod error;
mod gate;
mod layout;
mod preview;

pub use capture::{
    CameraFacing, CaptureService, ChildView, FlashMode, OverlayRenderer, SharedCapture,
    SharedOverlay, SurfaceHandle, TextView, TorchControl,
};
pub use error::{PreviewError, Result};
pub use gate::ReadinessGate;
pub use layout::{
    compute_layout, dp_to_px, fit_preview, overlay_dimensions, torch_rect, Bounds, LayoutConfig,
    LayoutPlan, LayoutRect, Orientation, PreviewSize, CONFIGURATION_LANDSCAPE,
    CONFIGURATION_PORTRAIT,
};
pub use preview::{CameraPreview, PreviewConfig};

#[cfg(target_os = "android")]
#[no_mangle]
fn android_main(app: slint::android::AndroidApp) {
    android_logger::init_once(
        android_logger::Config::default().with_max_level(log::LevelFilter::Info),
    );
    if let Err(err) = slint::android::init(app) {
        log::error!("slint init failed: {err:?}");
        return;
    }
    if let Err(err) = app::run() {
        log::error!("app exited with error: {err:?}");
    }
}
