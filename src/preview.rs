use std::rc::Rc;

use log::{debug, info, warn};

use crate::capture::{
    ChildView, FlashMode, SharedCapture, SharedOverlay, SurfaceHandle, TextView, TorchControl,
};
use crate::error::{PreviewError, Result};
use crate::gate::ReadinessGate;
use crate::layout::{compute_layout, overlay_dimensions, Bounds, LayoutConfig, Orientation};

#[derive(Debug, Clone, Default)]
pub struct PreviewConfig {
    /// Surface the capture service is started with.
    pub surface: SurfaceHandle,
    pub layout: LayoutConfig,
}

/// Hosts the camera preview children, the torch control and a debug label,
/// and starts the capture service once both a start was requested and the
/// surface is available.
///
/// All calls are expected on the UI thread.
pub struct CameraPreview {
    config: PreviewConfig,
    gate: ReadinessGate,
    capture: Option<SharedCapture>,
    overlay: Option<SharedOverlay>,
    children: Vec<Box<dyn ChildView>>,
    torch: Option<Box<dyn TorchControl>>,
    debug_label: Option<Box<dyn TextView>>,
    // not read back from the capture service
    flash_on: bool,
    orientation_source: Box<dyn Fn() -> Orientation>,
}

fn same_source(a: &SharedCapture, b: &SharedCapture) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

impl CameraPreview {
    pub fn new(config: PreviewConfig) -> Self {
        Self {
            config,
            gate: ReadinessGate::new(),
            capture: None,
            overlay: None,
            children: vec![],
            torch: None,
            debug_label: None,
            flash_on: false,
            orientation_source: Box::new(|| Orientation::Landscape),
        }
    }

    /// Host configuration queried whenever a start happens outside a layout
    /// pass.
    pub fn set_orientation_source(&mut self, source: impl Fn() -> Orientation + 'static) {
        self.orientation_source = Box::new(source);
    }

    pub fn add_child(&mut self, child: Box<dyn ChildView>) {
        self.children.push(child);
    }

    pub fn set_torch_control(&mut self, torch: Box<dyn TorchControl>) {
        self.torch = Some(torch);
    }

    pub fn set_debug_label(&mut self, label: Box<dyn TextView>) {
        self.debug_label = Some(label);
    }

    pub fn gate(&self) -> &ReadinessGate {
        &self.gate
    }

    pub fn is_attached(&self) -> bool {
        self.capture.is_some()
    }

    pub fn flash_on(&self) -> bool {
        self.flash_on
    }

    /// Sets the overlay (or clears it with `None`) and then behaves like
    /// [`CameraPreview::request_start`].
    pub fn attach_and_start(
        &mut self,
        source: Option<SharedCapture>,
        overlay: Option<SharedOverlay>,
    ) -> Result<()> {
        self.overlay = overlay;
        self.request_start(source)
    }

    /// `None` stops and detaches the current source without starting.
    pub fn request_start(&mut self, source: Option<SharedCapture>) -> Result<()> {
        let Some(source) = source else {
            self.stop();
            self.capture = None;
            self.gate.cancel_start();
            return Ok(());
        };

        if let Some(previous) = self.capture.take() {
            if !same_source(&previous, &source) {
                info!("replacing attached camera source");
                previous.borrow_mut().stop();
            }
        }
        self.capture = Some(source);
        self.gate.request_start();
        self.try_start((self.orientation_source)())
    }

    pub fn stop(&mut self) {
        if let Some(capture) = &self.capture {
            capture.borrow_mut().stop();
        }
    }

    pub fn release(&mut self) {
        if let Some(capture) = self.capture.take() {
            capture.borrow_mut().release();
        }
        self.gate.cancel_start();
    }

    pub fn on_surface_created(&mut self) -> Result<()> {
        self.gate.surface_created();
        self.try_start((self.orientation_source)())
    }

    pub fn on_surface_destroyed(&mut self) {
        self.gate.surface_destroyed();
    }

    pub fn on_surface_changed(&mut self, format: i32, width: u32, height: u32) {
        debug!("surface changed: format={format} {width}x{height}");
    }

    /// Lays out every child with the fitted preview rectangle, places the
    /// torch control and debug label, then re-evaluates the start gate.
    pub fn perform_layout(
        &mut self,
        bounds: Bounds,
        orientation: Orientation,
        density: f32,
    ) -> Result<()> {
        let preview_size = self
            .capture
            .as_ref()
            .and_then(|capture| capture.borrow().preview_size());

        let plan = compute_layout(
            bounds,
            orientation,
            preview_size,
            density,
            &self.config.layout,
        )?;

        for child in self.children.iter_mut() {
            child.layout(plan.preview);
        }
        if let Some(torch) = self.torch.as_mut() {
            torch.layout(plan.torch);
        }
        if let Some(label) = self.debug_label.as_mut() {
            if let Some(size) = preview_size {
                label.set_text(&size.to_string());
            }
            label.layout(plan.debug_label);
        }

        self.try_start(orientation)
    }

    /// Flips the torch. Failures leave the state untouched and are only
    /// logged.
    pub fn toggle_torch(&mut self) -> bool {
        let mode = if self.flash_on {
            FlashMode::Off
        } else {
            FlashMode::Torch
        };
        let res = match &self.capture {
            Some(capture) => capture.borrow_mut().set_flash_mode(mode),
            None => Err(PreviewError::Unsupported("no camera source attached")),
        };
        match res {
            Ok(()) => {
                self.flash_on = !self.flash_on;
                if let Some(torch) = self.torch.as_mut() {
                    torch.set_active(self.flash_on);
                }
            }
            Err(err) => warn!("torch toggle failed: {err}"),
        }
        self.flash_on
    }

    fn try_start(&mut self, orientation: Orientation) -> Result<()> {
        if !self.gate.is_ready() {
            return Ok(());
        }
        let Some(capture) = self.capture.clone() else {
            return Ok(());
        };

        capture.borrow_mut().start(self.config.surface)?;
        info!("camera source started");

        if let Some(overlay) = &self.overlay {
            let (size, facing) = {
                let capture = capture.borrow();
                (capture.preview_size(), capture.facing())
            };
            let size = size.unwrap_or(self.config.layout.default_preview_size);
            let (width, height) = overlay_dimensions(size, orientation);
            let mut overlay = overlay.borrow_mut();
            overlay.set_camera_info(width, height, facing);
            overlay.clear();
        }
        self.gate.mark_started();
        Ok(())
    }
}
