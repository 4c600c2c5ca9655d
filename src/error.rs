use thiserror::Error;

pub type Result<T> = std::result::Result<T, PreviewError>;

#[derive(Debug, Error)]
pub enum PreviewError {
    /// The capture service was started without the camera capability.
    #[error("no permission to start the camera: {0}")]
    Permission(String),
    /// The capture service could not open or bind the device.
    #[error("could not start camera source: {0}")]
    Io(#[from] std::io::Error),
    /// Geometry inputs that would make the layout undefined.
    #[error("invalid preview configuration: {0}")]
    Configuration(String),
    #[error("not supported by this camera: {0}")]
    Unsupported(&'static str),
}
