//! # jbridge
//!
//! Embed a JVM inside a Rust process and call Java without binding code.
//!
//! The crate loads the VM runtime library (`libjvm`) at run time through
//! the JNI invocation API, creates (or attaches to) a VM, and drives it
//! through a small facade: resolve a class, construct an object, invoke a
//! method by name and descriptor, get a plain Rust value back.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jbridge::{JavaBridge, HostValue, VmOptions};
//!
//! let mut bridge = JavaBridge::new();
//! bridge.create_vm(VmOptions::new().classpath("./classes")?)?;
//!
//! let obj = bridge.construct(
//!     "com/example/Greeter",
//!     "(Ljava/lang/String;)V",
//!     &[HostValue::Text("world".into())],
//! )?;
//!
//! let greeting = bridge.invoke(
//!     "com/example/Greeter",
//!     Some(obj),
//!     "greet",
//!     "()Ljava/lang/String;",
//!     &[],
//! )?;
//! println!("{greeting:?}");
//!
//! bridge.dispose()?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     Host Application                     │
//! ├─────────────────────────────────────────────────────────┤
//! │                 JavaBridge (bridge module)                │
//! │   class cache + object tracking (registry)               │
//! │   descriptor-driven dispatch (descriptor, codec)          │
//! ├─────────────────────────────────────────────────────────┤
//! │           VmSession / JvmRuntime (vm, loader)             │
//! │   locate + load libjvm, JNI_CreateJavaVM, attach/detach   │
//! ├─────────────────────────────────────────────────────────┤
//! │              Raw FFI Bindings (sys module)                │
//! │   sys::jni - JNI types, jvalue union, positional vtable   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`bridge`] | **The facade** - start here |
//! | [`vm`] | VM creation/attachment and per-thread environments |
//! | [`loader`] | Locating and loading the runtime library |
//! | [`descriptor`] | JVM method descriptor parsing |
//! | [`codec`] | Host value ⇄ `jvalue` conversion |
//! | [`registry`] | Guest reference lifecycle tracking |
//! | [`env`] | Safe wrapper over a raw `JNIEnv*` |
//! | [`sys::jni`] | Raw JNI types and vtable (for FFI) |
//!
//! ## Threading
//!
//! A [`JavaBridge`] is bound to the thread that created or attached its
//! session. Other threads attach themselves via
//! [`VmSession::attach_current_thread`] and work through the returned
//! environment directly. One VM per process: the runtime library stays
//! loaded and the first created VM is the only one.

pub mod sys;

pub mod bridge;
pub mod codec;
pub mod descriptor;
pub mod env;
pub mod error;
pub mod loader;
pub mod prelude;
pub mod registry;
pub mod vm;

pub use crate::bridge::JavaBridge;
pub use crate::codec::{HostValue, ResultKind};
pub use crate::descriptor::{MethodDescriptor, ParamType, Primitive};
pub use crate::error::{BridgeError, Result};
pub use crate::registry::ObjectHandle;
pub use crate::sys::jni;
pub use crate::vm::{VmOptions, VmSession};
