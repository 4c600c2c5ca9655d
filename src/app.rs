use std::{cell::RefCell, rc::Rc, sync::mpsc::channel, time::Duration};

use anyhow::Result;
use log::{error, info, warn};
use slint::{ComponentHandle, Image, Timer, TimerMode, Weak};

use crate::camera;
use crate::capture::{
    CameraFacing, ChildView, OverlayRenderer, SharedCapture, SharedOverlay, TextView,
    TorchControl,
};
use crate::layout::{Bounds, LayoutRect, Orientation};
use crate::preview::{CameraPreview, PreviewConfig};

slint::slint! {
    import { Button, HorizontalBox } from "std-widgets.slint";

    export struct Placement {
        x: length,
        y: length,
        width: length,
        height: length,
    }

    export component MainWindow inherits Window {
        preferred-width: 960px;
        preferred-height: 540px;
        in-out property <image> camera-texture;
        in property <Placement> camera-rect;
        in property <Placement> overlay-rect;
        in property <Placement> torch-rect;
        in property <Placement> debug-rect;
        in property <string> debug-text;
        in property <string> camera-info;
        in property <int> detection-count;
        in property <bool> torch-active;
        callback open-camera(bool);
        callback toggle-torch();

        Rectangle {
            width: 100%;
            height: 100%;
            background: black;

            Image {
                x: root.camera-rect.x;
                y: root.camera-rect.y;
                width: root.camera-rect.width;
                height: root.camera-rect.height;
                source: root.camera-texture;
                image-fit: fill;
            }
            Rectangle {
                x: root.overlay-rect.x;
                y: root.overlay-rect.y;
                width: root.overlay-rect.width;
                height: root.overlay-rect.height;
                border-color: #00ff00;
                border-width: 2px;
                Text {
                    x: 4px;
                    y: 4px;
                    text: root.camera-info;
                    color: #00ff00;
                }
                Text {
                    x: 4px;
                    y: 24px;
                    text: root.detection-count + " detections";
                    color: #00ff00;
                }
            }
            Text {
                x: root.debug-rect.x;
                y: root.debug-rect.y;
                width: root.debug-rect.width;
                height: root.debug-rect.height;
                text: root.debug-text;
                font-size: 20px;
                color: #0000ff;
            }
            Button {
                x: root.torch-rect.x;
                y: root.torch-rect.y;
                width: root.torch-rect.width;
                height: root.torch-rect.height;
                text: root.torch-active ? "ON" : "OFF";
                clicked => {
                    root.toggle-torch();
                }
            }
            HorizontalBox {
                width: 240px;
                height: 48px;
                x: (parent.width - self.width) / 2;
                y: parent.height - self.height;
                Button {
                    text: "Open camera";
                    clicked => {
                        root.open-camera(true);
                    }
                }
                Button {
                    text: "Close camera";
                    clicked => {
                        root.open-camera(false);
                    }
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Slot {
    Camera,
    Overlay,
    Torch,
    Debug,
}

/// Forwards container placements to one element of the window. Layout runs
/// in physical pixels, the window takes logical lengths.
struct WindowSlot {
    window: Weak<MainWindow>,
    slot: Slot,
}

impl WindowSlot {
    fn boxed(app: &MainWindow, slot: Slot) -> Box<Self> {
        Box::new(Self { window: app.as_weak(), slot })
    }
}

fn placement(rect: LayoutRect, scale: f32) -> Placement {
    Placement {
        x: rect.left as f32 / scale,
        y: rect.top as f32 / scale,
        width: rect.width as f32 / scale,
        height: rect.height as f32 / scale,
    }
}

impl ChildView for WindowSlot {
    fn layout(&mut self, rect: LayoutRect) {
        let Some(app) = self.window.upgrade() else {
            return;
        };
        let placement = placement(rect, app.window().scale_factor());
        match self.slot {
            Slot::Camera => app.set_camera_rect(placement),
            Slot::Overlay => app.set_overlay_rect(placement),
            Slot::Torch => app.set_torch_rect(placement),
            Slot::Debug => app.set_debug_rect(placement),
        }
    }
}

impl TorchControl for WindowSlot {
    fn set_active(&mut self, active: bool) {
        if let Some(app) = self.window.upgrade() {
            app.set_torch_active(active);
        }
    }
}

impl TextView for WindowSlot {
    fn set_text(&mut self, text: &str) {
        if let Some(app) = self.window.upgrade() {
            app.set_debug_text(text.into());
        }
    }
}

struct WindowOverlay {
    window: Weak<MainWindow>,
}

impl OverlayRenderer for WindowOverlay {
    fn set_camera_info(&mut self, width: u32, height: u32, facing: CameraFacing) {
        if let Some(app) = self.window.upgrade() {
            app.set_camera_info(format!("{width}x{height} {facing:?}").into());
        }
    }

    fn clear(&mut self) {
        if let Some(app) = self.window.upgrade() {
            app.set_detection_count(0);
        }
    }
}

fn window_orientation(window: &Weak<MainWindow>) -> Orientation {
    window
        .upgrade()
        .map(|app| {
            let size = app.window().size();
            Orientation::from_bounds(size.width, size.height)
        })
        .unwrap_or(Orientation::Landscape)
}

/// Open/close button handling. Start failures are returned for the caller
/// to log; nothing is retried here.
fn switch_camera(
    preview: &mut CameraPreview,
    capture: Option<SharedCapture>,
    overlay: SharedOverlay,
    open: bool,
) -> crate::Result<()> {
    if !open {
        return preview.request_start(None);
    }
    if capture.is_none() {
        warn!("no camera to open");
    }
    preview.attach_and_start(capture, Some(overlay))
}

pub fn run() -> Result<()> {
    let app = MainWindow::new()?;

    let (image_sender, image_receiver) = channel();
    let capture = camera::open_default(image_sender);
    let overlay: SharedOverlay = Rc::new(RefCell::new(WindowOverlay { window: app.as_weak() }));

    let preview = Rc::new(RefCell::new(CameraPreview::new(PreviewConfig::default())));
    {
        let mut preview = preview.borrow_mut();
        preview.add_child(WindowSlot::boxed(&app, Slot::Camera));
        preview.add_child(WindowSlot::boxed(&app, Slot::Overlay));
        preview.set_torch_control(WindowSlot::boxed(&app, Slot::Torch));
        preview.set_debug_label(WindowSlot::boxed(&app, Slot::Debug));
        let window = app.as_weak();
        preview.set_orientation_source(move || window_orientation(&window));
    }

    // The window doubles as the drawing surface: it becomes available on the
    // first tick with a real size, and a relayout follows every resize or
    // change of frame size.
    let app_clone = app.as_weak();
    let preview_clone = preview.clone();
    let mut surface_ready = false;
    let mut last_window = (0, 0);
    let mut last_frame = (0, 0);
    let timer = Timer::default();
    timer.start(TimerMode::Repeated, Duration::from_millis(10), move || {
        let Some(app) = app_clone.upgrade() else {
            return;
        };
        let mut relayout = false;
        if let Ok(buffer) = image_receiver.try_recv() {
            let frame = (buffer.width(), buffer.height());
            relayout |= frame != last_frame;
            last_frame = frame;
            app.set_camera_texture(Image::from_rgba8(buffer));
        }

        let size = app.window().size();
        if size.width == 0 || size.height == 0 {
            return;
        }
        relayout |= (size.width, size.height) != last_window;
        last_window = (size.width, size.height);

        let mut preview = preview_clone.borrow_mut();
        if !surface_ready {
            surface_ready = true;
            if let Err(err) = preview.on_surface_created() {
                error!("Could not start camera source: {err}");
            }
        }
        if relayout {
            let bounds = Bounds::from_size(size.width, size.height);
            let orientation = Orientation::from_bounds(size.width, size.height);
            let density = app.window().scale_factor();
            if let Err(err) = preview.perform_layout(bounds, orientation, density) {
                error!("layout failed: {err}");
            }
        }
    });

    let preview_clone = preview.clone();
    app.on_open_camera(move |open| {
        let mut preview = preview_clone.borrow_mut();
        match switch_camera(&mut preview, capture.clone(), overlay.clone(), open) {
            Ok(()) => info!("open camera({open}) done"),
            Err(err) => error!("Could not start camera source: {err}"),
        }
    });

    let preview_clone = preview.clone();
    app.on_toggle_torch(move || {
        let on = preview_clone.borrow_mut().toggle_torch();
        info!("torch: {on}");
    });

    app.run()?;
    preview.borrow_mut().release();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{FlashMode, SurfaceHandle};
    use crate::error::PreviewError;
    use crate::layout::PreviewSize;

    #[derive(Default)]
    struct DeniedCamera {
        stops: usize,
    }

    impl crate::capture::CaptureService for DeniedCamera {
        fn start(&mut self, _surface: SurfaceHandle) -> crate::Result<()> {
            Err(PreviewError::Permission("android.permission.CAMERA".into()))
        }

        fn stop(&mut self) {
            self.stops += 1;
        }

        fn release(&mut self) {}

        fn preview_size(&self) -> Option<PreviewSize> {
            None
        }

        fn facing(&self) -> CameraFacing {
            CameraFacing::Back
        }

        fn set_flash_mode(&mut self, _mode: FlashMode) -> crate::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct NoOverlay;

    impl OverlayRenderer for NoOverlay {
        fn set_camera_info(&mut self, _width: u32, _height: u32, _facing: CameraFacing) {}

        fn clear(&mut self) {}
    }

    #[test]
    fn failed_open_is_returned_to_the_button_handler() {
        let camera = Rc::new(RefCell::new(DeniedCamera::default()));
        let capture: SharedCapture = camera.clone();
        let overlay: SharedOverlay = Rc::new(RefCell::new(NoOverlay));
        let mut preview = CameraPreview::new(PreviewConfig::default());
        preview.on_surface_created().unwrap();

        let res = switch_camera(&mut preview, Some(capture.clone()), overlay.clone(), true);
        assert!(matches!(res, Err(PreviewError::Permission(_))));

        switch_camera(&mut preview, Some(capture), overlay, false).unwrap();
        assert_eq!(camera.borrow().stops, 1);
        assert!(!preview.is_attached());
    }
}
