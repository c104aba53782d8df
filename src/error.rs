use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The sensor could not be found or opened.
    #[error("sensor unavailable: {0}")]
    SensorUnavailable(String),

    /// The sensor cannot produce the requested stream.
    #[error("sensor does not provide a {0} stream")]
    StreamUnsupported(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("window error: {0}")]
    Window(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<minifb::Error> for Error {
    fn from(e: minifb::Error) -> Self {
        Error::Window(e.to_string())
    }
}
