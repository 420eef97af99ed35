//! Raw FFI declarations for the JNI invocation API.

pub mod jni;
