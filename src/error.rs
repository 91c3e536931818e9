use num_enum::TryFromPrimitive;
use std::ffi::NulError;
use std::fmt;
use std::os::raw::c_int;
use std::path::PathBuf;
use thiserror::Error;

use crate::native::Backend;

/// Errors reported by the wrapper.
#[derive(Debug, Error)]
pub enum Error {
    /// The shared library, or one of its symbols, could not be opened.
    #[error("failed to open libmikmod: {0}")]
    Library(#[from] libloading::Error),

    #[error("libmikmod is already initialized")]
    AlreadyInitialized,

    /// `MikMod_Init` failed; the library is unusable.
    #[error("failed to initialize libmikmod: {0}")]
    Init(NativeError),

    /// The module could not be opened or recognized.
    #[error("failed to load module: {0}")]
    Load(NativeError),

    #[error("failed to load module: empty buffer")]
    EmptyBuffer,

    /// More bytes than libmikmod can address in one buffer.
    #[error("failed to load module: buffer of {0} bytes is too large")]
    BufferTooLarge(usize),

    /// `MikMod_InitThreads` failed, so the library cannot be driven from
    /// the update thread.
    #[error("libmikmod was built without thread support")]
    NoThreadSupport,

    #[error("string contains a nul byte: {0}")]
    Nul(#[from] NulError),

    #[error("path cannot be passed to libmikmod: {}", .0.display())]
    InvalidPath(PathBuf),
}

impl Error {
    /// True for every failure of `load_file`/`load_slice`.
    pub fn is_load(&self) -> bool {
        matches!(
            self,
            Error::Load(_)
                | Error::EmptyBuffer
                | Error::BufferTooLarge(_)
                | Error::Nul(_)
                | Error::InvalidPath(_)
        )
    }

    /// The native error behind this failure, if there is one.
    pub fn native(&self) -> Option<&NativeError> {
        match self {
            Error::Init(e) | Error::Load(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A snapshot of libmikmod's global error state.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NativeError {
    pub code: c_int,
    pub kind: Option<ErrorCode>,
    pub message: String,
}

impl NativeError {
    pub fn new(code: c_int, message: String) -> NativeError {
        NativeError {
            code,
            kind: ErrorCode::try_from(code).ok(),
            message,
        }
    }

    /// Reads `MikMod_errno` and its description. Must run directly after the
    /// failing call: any other native call may overwrite the code.
    pub(crate) fn last<B: Backend + ?Sized>(backend: &B) -> NativeError {
        let code = backend.errno();
        NativeError::new(code, backend.strerror(code))
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "error {}", self.code)
        } else {
            write!(f, "{} (error {})", self.message, self.code)
        }
    }
}

/// libmikmod's `MMERR_*` codes shared by all drivers and loaders.
/// Driver specific codes beyond these decode to `None`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, TryFromPrimitive)]
#[repr(i32)]
pub enum ErrorCode {
    OpeningFile = 1,
    OutOfMemory = 2,
    DynamicLinking = 3,
    SampleTooBig = 4,
    OutOfHandles = 5,
    UnknownWaveType = 6,
    LoadingPattern = 7,
    LoadingTrack = 8,
    LoadingHeader = 9,
    LoadingSampleInfo = 10,
    NotAModule = 11,
    NotAStream = 12,
    MedSynthSamples = 13,
    ItPackInvalidData = 14,
    DetectingDevice = 15,
    InvalidDevice = 16,
    InitializingMixer = 17,
    OpeningAudio = 18,
}
