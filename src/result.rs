use thiserror::Error;

/// Errors returned by requests to a DRM card device.
///
/// Most variants correspond to a specific errno value that the DRM subsystem
/// uses with a consistent meaning across its requests. Anything else is
/// reported as [`Error::Other`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid argument")]
    Invalid,
    #[error("object does not exist")]
    NonExist,
    #[error("out of system memory")]
    SystemMem,
    #[error("out of graphics memory")]
    GraphicsMem,
    #[error("permission denied")]
    Permission,
    #[error("device disconnected")]
    Disconnected,
    #[error("operation not supported")]
    NotSupported,
    #[error("remote failure")]
    RemoteFailure,
    #[error("device died")]
    Died,
    /// The kernel kept reporting different array lengths between the two
    /// phases of a variable-length query until the retry limit was reached.
    #[error("kernel state kept changing after {attempts} attempts")]
    Unstable { attempts: u32 },
    #[error("system call failed with errno {}", .0 .0)]
    Other(linux_io::result::Error),
}

impl From<linux_io::result::Error> for Error {
    fn from(value: linux_io::result::Error) -> Self {
        match value {
            linux_io::result::EINVAL => Self::Invalid,
            linux_io::result::ENOENT => Self::NonExist,
            linux_io::result::ENOMEM => Self::SystemMem,
            linux_io::result::ENOSPC => Self::GraphicsMem,
            linux_io::result::EPERM | linux_io::result::EACCES => Self::Permission,
            linux_io::result::ENODEV => Self::Disconnected,
            linux_io::result::EOPNOTSUPP => Self::NotSupported,
            linux_io::result::ENXIO => Self::RemoteFailure,
            linux_io::result::EIO => Self::Died,
            _ => Self::Other(value),
        }
    }
}

impl Into<linux_io::result::Error> for Error {
    fn into(self) -> linux_io::result::Error {
        match self {
            Error::Invalid => linux_io::result::EINVAL,
            Error::NonExist => linux_io::result::ENOENT,
            Error::SystemMem => linux_io::result::ENOMEM,
            Error::GraphicsMem => linux_io::result::ENOSPC,
            Error::Permission => linux_io::result::EPERM,
            Error::Disconnected => linux_io::result::ENODEV,
            Error::NotSupported => linux_io::result::EOPNOTSUPP,
            Error::RemoteFailure => linux_io::result::ENXIO,
            Error::Died => linux_io::result::EIO,
            Error::Unstable { .. } => linux_io::result::EAGAIN,
            Error::Other(v) => v,
        }
    }
}

impl From<alloc::collections::TryReserveError> for Error {
    #[inline(always)]
    fn from(_: alloc::collections::TryReserveError) -> Self {
        Self::SystemMem
    }
}

/// Errors from [`crate::Card::open`] and [`crate::Card::from_file`].
#[derive(Debug, Error)]
pub enum InitError {
    #[error("file is not a DRM card device")]
    NotDrmCard,
    #[error("failed to open DRM card: errno {}", .0 .0)]
    Other(linux_io::result::Error),
}

impl Into<linux_io::result::Error> for InitError {
    fn into(self) -> linux_io::result::Error {
        match self {
            InitError::NotDrmCard => linux_io::result::ENOTTY,
            InitError::Other(e) => e,
        }
    }
}

impl From<linux_io::result::Error> for InitError {
    fn from(value: linux_io::result::Error) -> Self {
        match value {
            linux_io::result::ENOTTY => InitError::NotDrmCard,
            _ => InitError::Other(value),
        }
    }
}
