use std::path::PathBuf;

pub type CipherResult<T> = Result<T, CipherError>;

#[derive(thiserror::Error, Debug)]
pub enum CipherError {
    #[error("Invalid key: Please provide a non-zero secret key.")]
    InvalidKey,
    #[error("Invalid key: {0:?} is not an integer.")]
    MalformedKey(String),
    #[error("Image file not found: {}", .0.display())]
    PathNotFound(PathBuf),
    #[error("Failed to decode image {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Failed to encode image {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
