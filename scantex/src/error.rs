use std::{error, fmt, io};

use crate::gpu::BackendError;

/// Failure of a generator entry point.
///
/// Every failure is fail-fast: the call aborts at the first unrecoverable
/// error and leaves all persistent state consistent, so the caller can retry
/// on the next frame.
#[derive(Debug)]
pub enum Error {
    /// The rendering backend rejected a resource or a pass.
    Backend(BackendError),

    /// Writing an export artifact failed.
    Io(io::Error),

    /// Encoding a texture image failed.
    Image(image::ImageError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "export failed: {err}"),
            Self::Image(err) => write!(f, "texture encoding failed: {err}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Image(err) => Some(err),
        }
    }
}

impl From<BackendError> for Error {
    fn from(err: BackendError) -> Self {
        Self::Backend(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err)
    }
}
