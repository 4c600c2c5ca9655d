use std::{
    io,
    sync::{mpsc::channel, Arc, Mutex},
    time::{Duration, Instant},
};

use anyhow::{anyhow, Result};
use kamera::Camera as KCamera;
use log::{debug, info, warn};
use slint::SharedPixelBuffer;

use super::FrameSender;
use crate::capture::{CameraFacing, CaptureService, FlashMode, SurfaceHandle};
use crate::error::PreviewError;
use crate::layout::PreviewSize;

/// Desktop webcam. Frames are converted to RGBA on a worker thread and sent
/// to the UI over `image_sender`; the surface handle is not used.
pub struct Camera {
    index: usize,
    camera_handle: Option<Arc<Mutex<bool>>>,
    camera_task: Option<std::thread::JoinHandle<Result<()>>>,
    image_sender: FrameSender,
    preview_size: Arc<Mutex<Option<PreviewSize>>>,
}

impl Camera {
    pub fn new(index: usize, image_sender: FrameSender) -> Self {
        Self {
            index,
            camera_handle: None,
            camera_task: None,
            image_sender,
            preview_size: Arc::new(Mutex::new(None)),
        }
    }
}

impl CaptureService for Camera {
    fn start(&mut self, surface: SurfaceHandle) -> crate::Result<()> {
        debug!("start camera {} on {surface:?}", self.index);
        self.stop();
        let camera_handle = Arc::new(Mutex::new(true));
        self.camera_handle = Some(camera_handle.clone());
        let image_sender = self.image_sender.clone();
        let preview_size = self.preview_size.clone();
        let index = self.index;
        let (ready_sender, ready_receiver) = channel();

        self.camera_task = Some(std::thread::spawn(move || {
            let camera = match KCamera::new_device(index) {
                None => {
                    let _ = ready_sender.send(false);
                    return Err(anyhow!("camera id not exist"));
                }
                Some(v) => v,
            };
            camera.start();
            let _ = ready_sender.send(true);

            let mut count = 0;
            let mut timer = Instant::now();
            let mut rgba_buffer = vec![];
            loop {
                if let Ok(opened) = camera_handle.lock() {
                    if !*opened {
                        break;
                    }
                }

                let frame = match camera.wait_for_frame() {
                    Some(f) => f,
                    None => {
                        warn!("no frame from camera {index}");
                        std::thread::sleep(Duration::from_millis(10));
                        continue;
                    }
                };

                let (width, height) = frame.size_u32();
                if rgba_buffer.len() as u32 != width * height * 4 {
                    rgba_buffer = vec![0; (width * height * 4) as usize];
                    if let Ok(mut size) = preview_size.lock() {
                        *size = Some(PreviewSize::new(width, height));
                    }
                }
                let frame_data = frame.data();
                let data_u8 = frame_data.data_u8();
                for (idx, bgra) in data_u8.chunks(4).enumerate() {
                    rgba_buffer[idx * 4] = bgra[2];
                    rgba_buffer[idx * 4 + 1] = bgra[1];
                    rgba_buffer[idx * 4 + 2] = bgra[0];
                    rgba_buffer[idx * 4 + 3] = bgra[3];
                }

                let buf = SharedPixelBuffer::clone_from_slice(&rgba_buffer, width, height);
                if image_sender.send(buf).is_err() {
                    debug!("frame receiver gone, stopping camera {index}");
                    break;
                }

                if count == 30 {
                    let time = timer.elapsed().as_millis();
                    debug!("30 frames in {time}ms, {width}x{height}");
                    count = 0;
                    timer = Instant::now();
                }
                count += 1;
            }
            camera.stop();
            Ok(())
        }));

        match ready_receiver.recv() {
            Ok(true) => Ok(()),
            Ok(false) => Err(PreviewError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("camera {} not found", self.index),
            ))),
            Err(_) => Err(PreviewError::Io(io::Error::new(
                io::ErrorKind::Other,
                "camera thread exited before opening the device",
            ))),
        }
    }

    fn stop(&mut self) {
        let mut need_close = false;
        if let Some(handle) = self.camera_handle.as_ref() {
            if let Ok(mut handle) = handle.lock() {
                *handle = false;
                need_close = true;
            }
        }

        if need_close {
            info!("stop preview..");
            if let Some(handle) = self.camera_task.take() {
                let res = handle.join();
                info!("stop preview: {:?}", res);
            }
        }
        self.camera_handle = None;
    }

    fn release(&mut self) {
        self.stop();
        if let Ok(mut size) = self.preview_size.lock() {
            *size = None;
        }
    }

    fn preview_size(&self) -> Option<PreviewSize> {
        self.preview_size.lock().ok().and_then(|size| *size)
    }

    fn facing(&self) -> CameraFacing {
        CameraFacing::Front
    }

    fn set_flash_mode(&mut self, _mode: FlashMode) -> crate::Result<()> {
        Err(PreviewError::Unsupported("webcams have no torch"))
    }
}
