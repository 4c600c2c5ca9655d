//! Collaborators the preview container talks to but does not implement.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::layout::{LayoutRect, PreviewSize};

/// Opaque id of the drawing surface the camera renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SurfaceHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraFacing {
    Back,
    Front,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlashMode {
    #[default]
    Off,
    /// LED stays on continuously.
    Torch,
}

pub trait CaptureService {
    /// Starts streaming frames into `surface`.
    fn start(&mut self, surface: SurfaceHandle) -> Result<()>;
    /// Must be safe to call when not started.
    fn stop(&mut self);
    fn release(&mut self);
    /// `None` until the service knows its native frame size.
    fn preview_size(&self) -> Option<PreviewSize>;
    fn facing(&self) -> CameraFacing;
    fn set_flash_mode(&mut self, mode: FlashMode) -> Result<()>;
}

pub trait OverlayRenderer {
    fn set_camera_info(&mut self, width: u32, height: u32, facing: CameraFacing);
    fn clear(&mut self);
}

/// A child view that receives the fitted preview rectangle.
pub trait ChildView {
    fn layout(&mut self, rect: LayoutRect);
}

pub trait TorchControl: ChildView {
    fn set_active(&mut self, active: bool);
}

pub trait TextView: ChildView {
    fn set_text(&mut self, text: &str);
}

pub type SharedCapture = Rc<RefCell<dyn CaptureService>>;
pub type SharedOverlay = Rc<RefCell<dyn OverlayRenderer>>;
