//! Bookkeeping for guest references owned by the bridge.
//!
//! Two pools are tracked: resolved classes, cached by name as global
//! references so they survive across calls and threads, and constructed
//! objects, held as local references in creation order. Releasing is
//! idempotent: every delete nulls its slot, so a second release pass
//! (explicit dispose followed by drop) issues no duplicate JNI calls.

use std::collections::HashMap;

use crate::env::JniEnv;
use crate::sys::jni;

/// Index of a tracked object within the registry.
pub type ObjectHandle = usize;

#[derive(Default)]
pub struct HandleRegistry {
    classes: HashMap<String, jni::jclass>,
    objects: Vec<jni::jobject>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        HandleRegistry::default()
    }

    /// Look up a cached class. A slot that was already released reads as
    /// a miss, not a dangling handle.
    pub fn cached_class(&self, name: &str) -> Option<jni::jclass> {
        match self.classes.get(name) {
            Some(cls) if !cls.is_null() => Some(*cls),
            _ => None,
        }
    }

    /// Cache a class under its qualified name. The handle must be a global
    /// reference; the registry takes over deleting it.
    pub fn insert_class(&mut self, name: &str, cls: jni::jclass) {
        self.classes.insert(name.to_string(), cls);
    }

    /// Track a constructed object, returning its handle.
    pub fn track_object(&mut self, obj: jni::jobject) -> ObjectHandle {
        self.objects.push(obj);
        self.objects.len() - 1
    }

    /// The raw guest reference behind a handle, if still live.
    pub fn object(&self, handle: ObjectHandle) -> Option<jni::jobject> {
        match self.objects.get(handle) {
            Some(obj) if !obj.is_null() => Some(*obj),
            _ => None,
        }
    }

    /// Release a single tracked object. Releasing an already-released or
    /// unknown handle is a no-op.
    pub fn release_object(&mut self, env: &JniEnv, handle: ObjectHandle) {
        if let Some(slot) = self.objects.get_mut(handle) {
            if !slot.is_null() {
                env.delete_local_ref(*slot);
                *slot = std::ptr::null_mut();
            }
        }
    }

    /// Release every tracked reference: objects first, then classes.
    pub fn release_all(&mut self, env: &JniEnv) {
        for slot in &mut self.objects {
            if !slot.is_null() {
                env.delete_local_ref(*slot);
                *slot = std::ptr::null_mut();
            }
        }
        for slot in self.classes.values_mut() {
            if !slot.is_null() {
                env.delete_global_ref(*slot);
                *slot = std::ptr::null_mut();
            }
        }
    }

    /// Number of live (unreleased) object handles.
    pub fn live_objects(&self) -> usize {
        self.objects.iter().filter(|o| !o.is_null()).count()
    }

    /// Number of live cached classes.
    pub fn live_classes(&self) -> usize {
        self.classes.values().filter(|c| !c.is_null()).count()
    }
}
