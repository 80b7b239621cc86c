use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("OpenCv Error: {0}")]
    OpenCvError(#[from] opencv::Error),

    #[error("Io Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("unable to open video source: {0}")]
    SourceOpenError(String),
}
