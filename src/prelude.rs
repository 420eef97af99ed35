//! Common imports for hosting a JVM.
//!
//! This prelude is intentionally small. It covers the types most hosts use
//! while avoiding over-broad re-exports.

pub use crate::bridge::JavaBridge;
pub use crate::codec::{HostValue, ResultKind};
pub use crate::descriptor::MethodDescriptor;
pub use crate::env::{JniEnv, LocalRef};
pub use crate::error::{BridgeError, Result};
pub use crate::registry::ObjectHandle;
pub use crate::sys::jni;
pub use crate::vm::{VmOptions, VmSession};
