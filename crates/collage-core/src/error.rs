use crate::packer::region::RegionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid size {w}x{h}: dimensions must be finite and positive")]
    InvalidSize { w: f64, h: f64 },
    #[error("Aspect ratio of a zero-height size ({w}x{h}) is undefined")]
    UndefinedAspectRatio { w: f64, h: f64 },
    #[error("Placement error: {0}")]
    Placement(String),
    #[error("Unknown region {0}")]
    UnknownRegion(RegionId),
    #[error("Item {index} ({w}x{h}) does not fit on any canvas")]
    NoFeasibleCanvas { index: usize, w: f64, h: f64 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Nothing to pack")]
    Empty,
}

pub type Result<T> = std::result::Result<T, CollageError>;
