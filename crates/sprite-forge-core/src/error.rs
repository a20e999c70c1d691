use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpriteForgeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid sprite specification: {0}")]
    InvalidSpec(String),
    #[error("No frames to pack")]
    Empty,
    #[error("Duplicate frame name in packing batch: {0}")]
    DuplicateFrame(String),
    #[error("Strip is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    StripSize {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },
    #[error("Strip generation failed after {attempts} attempt(s): {message}")]
    Generation { attempts: u32, message: String },
}

pub type Result<T> = std::result::Result<T, SpriteForgeError>;
