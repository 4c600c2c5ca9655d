use std::sync::mpsc::Sender;

use slint::{Rgba8Pixel, SharedPixelBuffer};

use crate::capture::SharedCapture;

#[cfg(target_os = "windows")]
mod pcam;

pub type FrameSender = Sender<SharedPixelBuffer<Rgba8Pixel>>;

/// Capture service for the first camera device, if this platform has one.
#[cfg(target_os = "windows")]
pub fn open_default(image_sender: FrameSender) -> Option<SharedCapture> {
    use std::{cell::RefCell, rc::Rc};

    let capture: SharedCapture = Rc::new(RefCell::new(pcam::Camera::new(0, image_sender)));
    Some(capture)
}

#[cfg(not(target_os = "windows"))]
pub fn open_default(_image_sender: FrameSender) -> Option<SharedCapture> {
    log::warn!("no camera backend for this platform");
    None
}
