//! Error taxonomy for the bridge.
//!
//! Parsing and type-matching errors are raised before any JNI call is
//! issued; native-call failures are converted into a [`BridgeError`]
//! immediately, with no retry at this layer.

use std::ffi::NulError;

use crate::sys::jni;

/// Every way a bridge operation can fail.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// No JVM shared library could be located (or an explicit path did not
    /// point at an existing file).
    #[error("no Java runtime found: {0}")]
    RuntimeNotFound(String),

    /// The JVM shared library was found but could not be loaded or is
    /// missing the invocation entry points.
    #[error("failed to load JVM library: {0}")]
    LibraryLoad(String),

    /// A VM option or name contained an interior NUL byte.
    #[error("invalid option (NUL byte): {0}")]
    InvalidOption(#[from] NulError),

    /// `JNI_CreateJavaVM` returned a non-success status code.
    #[error("JVM creation failed (JNI status {code})")]
    VmCreationFailed { code: jni::jint },

    /// Attaching the current thread to an existing VM failed.
    #[error("attach to existing JVM failed (JNI status {code})")]
    AttachFailed { code: jni::jint },

    /// A method descriptor string could not be parsed. The position is the
    /// byte offset of the offending character.
    #[error("malformed descriptor at position {position}")]
    MalformedDescriptor { position: usize },

    /// The argument list length does not match the descriptor's formal
    /// parameter count.
    #[error("arity mismatch: descriptor declares {expected} parameter(s), got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    /// A host value's concrete type does not match the descriptor slot it
    /// was supplied for.
    #[error("signature mismatch: descriptor expects {expected}, got {actual}")]
    SignatureMismatch {
        expected: String,
        actual: &'static str,
    },

    /// An array parameter's element kind has no native allocation path and
    /// no pre-built handle was supplied.
    #[error("unsupported array element type: {0}")]
    UnsupportedArrayType(String),

    /// The guest raised an exception during a native call. The message is
    /// the guest-rendered description, captured before the pending state
    /// was cleared.
    #[error("guest exception: {message}")]
    GuestException { message: String },

    /// An operation was invoked before the VM was ready or after disposal.
    #[error("invalid bridge state: {0}")]
    InvalidState(&'static str),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
