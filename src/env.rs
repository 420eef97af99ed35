//! Safe wrapper around a JNI execution environment.
//!
//! A [`JniEnv`] wraps the per-thread `JNIEnv*` through which every call
//! into the guest VM is issued. It is tied to the thread that produced it
//! and must not be moved across threads; a thread that needs its own
//! environment attaches via [`crate::vm::VmSession::attach_current_thread`].

use std::ffi::{CStr, CString};
use std::ptr;

use crate::jni_call;
use crate::sys::jni;

/// Per-thread JNI environment handle.
///
/// All methods are thin vtable dispatches; any of them may block on guest
/// VM internals (GC pauses, guest method execution).
pub struct JniEnv {
    env: *mut jni::JNIEnv,
}

impl JniEnv {
    /// Wrap a raw environment pointer.
    ///
    /// # Safety
    /// The pointer must be a valid `JNIEnv*` obtained on the current thread.
    pub unsafe fn from_raw(env: *mut jni::JNIEnv) -> Self {
        JniEnv { env }
    }

    /// The raw environment pointer.
    pub fn raw(&self) -> *mut jni::JNIEnv {
        self.env
    }

    /// The JNI version reported by the VM (major in the high 16 bits).
    pub fn get_version(&self) -> jni::jint {
        unsafe { jni_call!(self.env, GetVersion) }
    }

    // =========================================================================
    // Classes and method IDs
    // =========================================================================

    /// Find a class by its fully qualified name with `/` separators,
    /// e.g. `java/lang/String`. Returns `None` on failure (a pending guest
    /// exception is left in place for the caller to capture).
    pub fn find_class(&self, name: &str) -> Option<jni::jclass> {
        let c_name = CString::new(name).ok()?;
        let cls = unsafe { jni_call!(self.env, FindClass, c_name.as_ptr()) };
        if cls.is_null() {
            None
        } else {
            Some(cls)
        }
    }

    pub fn get_method_id(
        &self,
        cls: jni::jclass,
        name: &str,
        sig: &str,
    ) -> Option<jni::jmethodID> {
        let c_name = CString::new(name).ok()?;
        let c_sig = CString::new(sig).ok()?;
        let mid =
            unsafe { jni_call!(self.env, GetMethodID, cls, c_name.as_ptr(), c_sig.as_ptr()) };
        if mid.is_null() {
            None
        } else {
            Some(mid)
        }
    }

    pub fn get_static_method_id(
        &self,
        cls: jni::jclass,
        name: &str,
        sig: &str,
    ) -> Option<jni::jmethodID> {
        let c_name = CString::new(name).ok()?;
        let c_sig = CString::new(sig).ok()?;
        let mid = unsafe {
            jni_call!(self.env, GetStaticMethodID, cls, c_name.as_ptr(), c_sig.as_ptr())
        };
        if mid.is_null() {
            None
        } else {
            Some(mid)
        }
    }

    pub fn get_object_class(&self, obj: jni::jobject) -> jni::jclass {
        unsafe { jni_call!(self.env, GetObjectClass, obj) }
    }

    // =========================================================================
    // Object construction
    // =========================================================================

    pub fn new_object(
        &self,
        cls: jni::jclass,
        method_id: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> Option<jni::jobject> {
        let obj = unsafe { jni_call!(self.env, NewObjectA, cls, method_id, args.as_ptr()) };
        if obj.is_null() {
            None
        } else {
            Some(obj)
        }
    }

    // =========================================================================
    // Reference management
    // =========================================================================

    pub fn new_global_ref(&self, obj: jni::jobject) -> jni::jobject {
        unsafe { jni_call!(self.env, NewGlobalRef, obj) }
    }

    pub fn delete_global_ref(&self, obj: jni::jobject) {
        unsafe { jni_call!(self.env, DeleteGlobalRef, obj) }
    }

    pub fn delete_local_ref(&self, obj: jni::jobject) {
        unsafe { jni_call!(self.env, DeleteLocalRef, obj) }
    }

    // =========================================================================
    // Strings
    // =========================================================================

    pub fn new_string_utf(&self, s: &str) -> Option<jni::jstring> {
        let c_str = CString::new(s).ok()?;
        let jstr = unsafe { jni_call!(self.env, NewStringUTF, c_str.as_ptr()) };
        if jstr.is_null() {
            None
        } else {
            Some(jstr)
        }
    }

    /// Copy a Java string into a Rust `String`. Returns `None` for a null
    /// handle or invalid UTF-8. Does not release the handle.
    pub fn get_string_utf(&self, s: jni::jstring) -> Option<String> {
        if s.is_null() {
            return None;
        }
        unsafe {
            let chars = jni_call!(self.env, GetStringUTFChars, s, ptr::null_mut());
            if chars.is_null() {
                return None;
            }
            let result = CStr::from_ptr(chars).to_str().ok().map(|r| r.to_string());
            jni_call!(self.env, ReleaseStringUTFChars, s, chars);
            result
        }
    }

    // =========================================================================
    // Arrays
    // =========================================================================

    pub fn get_array_length(&self, array: jni::jarray) -> jni::jsize {
        unsafe { jni_call!(self.env, GetArrayLength, array) }
    }

    pub fn new_object_array(
        &self,
        length: jni::jsize,
        cls: jni::jclass,
        init: jni::jobject,
    ) -> Option<jni::jobjectArray> {
        let arr = unsafe { jni_call!(self.env, NewObjectArray, length, cls, init) };
        if arr.is_null() {
            None
        } else {
            Some(arr)
        }
    }

    pub fn get_object_array_element(
        &self,
        array: jni::jobjectArray,
        index: jni::jsize,
    ) -> jni::jobject {
        unsafe { jni_call!(self.env, GetObjectArrayElement, array, index) }
    }

    pub fn set_object_array_element(
        &self,
        array: jni::jobjectArray,
        index: jni::jsize,
        value: jni::jobject,
    ) {
        unsafe { jni_call!(self.env, SetObjectArrayElement, array, index, value) }
    }

    pub fn new_byte_array(&self, len: jni::jsize) -> Option<jni::jbyteArray> {
        let arr = unsafe { jni_call!(self.env, NewByteArray, len) };
        if arr.is_null() { None } else { Some(arr) }
    }

    pub fn new_char_array(&self, len: jni::jsize) -> Option<jni::jcharArray> {
        let arr = unsafe { jni_call!(self.env, NewCharArray, len) };
        if arr.is_null() { None } else { Some(arr) }
    }

    pub fn new_short_array(&self, len: jni::jsize) -> Option<jni::jshortArray> {
        let arr = unsafe { jni_call!(self.env, NewShortArray, len) };
        if arr.is_null() { None } else { Some(arr) }
    }

    pub fn new_int_array(&self, len: jni::jsize) -> Option<jni::jintArray> {
        let arr = unsafe { jni_call!(self.env, NewIntArray, len) };
        if arr.is_null() { None } else { Some(arr) }
    }

    pub fn new_long_array(&self, len: jni::jsize) -> Option<jni::jlongArray> {
        let arr = unsafe { jni_call!(self.env, NewLongArray, len) };
        if arr.is_null() { None } else { Some(arr) }
    }

    pub fn new_float_array(&self, len: jni::jsize) -> Option<jni::jfloatArray> {
        let arr = unsafe { jni_call!(self.env, NewFloatArray, len) };
        if arr.is_null() { None } else { Some(arr) }
    }

    pub fn new_double_array(&self, len: jni::jsize) -> Option<jni::jdoubleArray> {
        let arr = unsafe { jni_call!(self.env, NewDoubleArray, len) };
        if arr.is_null() { None } else { Some(arr) }
    }

    pub fn set_byte_array_region(&self, array: jni::jbyteArray, buf: &[jni::jbyte]) {
        unsafe {
            jni_call!(self.env, SetByteArrayRegion, array, 0, buf.len() as jni::jsize, buf.as_ptr())
        }
    }

    pub fn set_char_array_region(&self, array: jni::jcharArray, buf: &[jni::jchar]) {
        unsafe {
            jni_call!(self.env, SetCharArrayRegion, array, 0, buf.len() as jni::jsize, buf.as_ptr())
        }
    }

    pub fn set_short_array_region(&self, array: jni::jshortArray, buf: &[jni::jshort]) {
        unsafe {
            jni_call!(self.env, SetShortArrayRegion, array, 0, buf.len() as jni::jsize, buf.as_ptr())
        }
    }

    pub fn set_int_array_region(&self, array: jni::jintArray, buf: &[jni::jint]) {
        unsafe {
            jni_call!(self.env, SetIntArrayRegion, array, 0, buf.len() as jni::jsize, buf.as_ptr())
        }
    }

    pub fn set_long_array_region(&self, array: jni::jlongArray, buf: &[jni::jlong]) {
        unsafe {
            jni_call!(self.env, SetLongArrayRegion, array, 0, buf.len() as jni::jsize, buf.as_ptr())
        }
    }

    pub fn set_float_array_region(&self, array: jni::jfloatArray, buf: &[jni::jfloat]) {
        unsafe {
            jni_call!(self.env, SetFloatArrayRegion, array, 0, buf.len() as jni::jsize, buf.as_ptr())
        }
    }

    pub fn set_double_array_region(&self, array: jni::jdoubleArray, buf: &[jni::jdouble]) {
        unsafe {
            jni_call!(self.env, SetDoubleArrayRegion, array, 0, buf.len() as jni::jsize, buf.as_ptr())
        }
    }

    pub fn get_byte_array_region(&self, array: jni::jbyteArray, buf: &mut [jni::jbyte]) {
        unsafe {
            jni_call!(self.env, GetByteArrayRegion, array, 0, buf.len() as jni::jsize, buf.as_mut_ptr())
        }
    }

    pub fn get_char_array_region(&self, array: jni::jcharArray, buf: &mut [jni::jchar]) {
        unsafe {
            jni_call!(self.env, GetCharArrayRegion, array, 0, buf.len() as jni::jsize, buf.as_mut_ptr())
        }
    }

    pub fn get_short_array_region(&self, array: jni::jshortArray, buf: &mut [jni::jshort]) {
        unsafe {
            jni_call!(self.env, GetShortArrayRegion, array, 0, buf.len() as jni::jsize, buf.as_mut_ptr())
        }
    }

    pub fn get_int_array_region(&self, array: jni::jintArray, buf: &mut [jni::jint]) {
        unsafe {
            jni_call!(self.env, GetIntArrayRegion, array, 0, buf.len() as jni::jsize, buf.as_mut_ptr())
        }
    }

    pub fn get_long_array_region(&self, array: jni::jlongArray, buf: &mut [jni::jlong]) {
        unsafe {
            jni_call!(self.env, GetLongArrayRegion, array, 0, buf.len() as jni::jsize, buf.as_mut_ptr())
        }
    }

    pub fn get_float_array_region(&self, array: jni::jfloatArray, buf: &mut [jni::jfloat]) {
        unsafe {
            jni_call!(self.env, GetFloatArrayRegion, array, 0, buf.len() as jni::jsize, buf.as_mut_ptr())
        }
    }

    pub fn get_double_array_region(&self, array: jni::jdoubleArray, buf: &mut [jni::jdouble]) {
        unsafe {
            jni_call!(self.env, GetDoubleArrayRegion, array, 0, buf.len() as jni::jsize, buf.as_mut_ptr())
        }
    }

    // =========================================================================
    // Method calls (instance)
    // =========================================================================

    pub fn call_void_method(&self, obj: jni::jobject, mid: jni::jmethodID, args: &[jni::jvalue]) {
        unsafe { jni_call!(self.env, CallVoidMethodA, obj, mid, args.as_ptr()) }
    }

    pub fn call_object_method(
        &self,
        obj: jni::jobject,
        mid: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> jni::jobject {
        unsafe { jni_call!(self.env, CallObjectMethodA, obj, mid, args.as_ptr()) }
    }

    pub fn call_boolean_method(
        &self,
        obj: jni::jobject,
        mid: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> jni::jboolean {
        unsafe { jni_call!(self.env, CallBooleanMethodA, obj, mid, args.as_ptr()) }
    }

    pub fn call_byte_method(
        &self,
        obj: jni::jobject,
        mid: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> jni::jbyte {
        unsafe { jni_call!(self.env, CallByteMethodA, obj, mid, args.as_ptr()) }
    }

    pub fn call_char_method(
        &self,
        obj: jni::jobject,
        mid: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> jni::jchar {
        unsafe { jni_call!(self.env, CallCharMethodA, obj, mid, args.as_ptr()) }
    }

    pub fn call_short_method(
        &self,
        obj: jni::jobject,
        mid: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> jni::jshort {
        unsafe { jni_call!(self.env, CallShortMethodA, obj, mid, args.as_ptr()) }
    }

    pub fn call_int_method(
        &self,
        obj: jni::jobject,
        mid: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> jni::jint {
        unsafe { jni_call!(self.env, CallIntMethodA, obj, mid, args.as_ptr()) }
    }

    pub fn call_long_method(
        &self,
        obj: jni::jobject,
        mid: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> jni::jlong {
        unsafe { jni_call!(self.env, CallLongMethodA, obj, mid, args.as_ptr()) }
    }

    pub fn call_float_method(
        &self,
        obj: jni::jobject,
        mid: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> jni::jfloat {
        unsafe { jni_call!(self.env, CallFloatMethodA, obj, mid, args.as_ptr()) }
    }

    pub fn call_double_method(
        &self,
        obj: jni::jobject,
        mid: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> jni::jdouble {
        unsafe { jni_call!(self.env, CallDoubleMethodA, obj, mid, args.as_ptr()) }
    }

    // =========================================================================
    // Method calls (static)
    // =========================================================================

    pub fn call_static_void_method(
        &self,
        cls: jni::jclass,
        mid: jni::jmethodID,
        args: &[jni::jvalue],
    ) {
        unsafe { jni_call!(self.env, CallStaticVoidMethodA, cls, mid, args.as_ptr()) }
    }

    pub fn call_static_object_method(
        &self,
        cls: jni::jclass,
        mid: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> jni::jobject {
        unsafe { jni_call!(self.env, CallStaticObjectMethodA, cls, mid, args.as_ptr()) }
    }

    pub fn call_static_boolean_method(
        &self,
        cls: jni::jclass,
        mid: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> jni::jboolean {
        unsafe { jni_call!(self.env, CallStaticBooleanMethodA, cls, mid, args.as_ptr()) }
    }

    pub fn call_static_byte_method(
        &self,
        cls: jni::jclass,
        mid: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> jni::jbyte {
        unsafe { jni_call!(self.env, CallStaticByteMethodA, cls, mid, args.as_ptr()) }
    }

    pub fn call_static_char_method(
        &self,
        cls: jni::jclass,
        mid: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> jni::jchar {
        unsafe { jni_call!(self.env, CallStaticCharMethodA, cls, mid, args.as_ptr()) }
    }

    pub fn call_static_short_method(
        &self,
        cls: jni::jclass,
        mid: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> jni::jshort {
        unsafe { jni_call!(self.env, CallStaticShortMethodA, cls, mid, args.as_ptr()) }
    }

    pub fn call_static_int_method(
        &self,
        cls: jni::jclass,
        mid: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> jni::jint {
        unsafe { jni_call!(self.env, CallStaticIntMethodA, cls, mid, args.as_ptr()) }
    }

    pub fn call_static_long_method(
        &self,
        cls: jni::jclass,
        mid: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> jni::jlong {
        unsafe { jni_call!(self.env, CallStaticLongMethodA, cls, mid, args.as_ptr()) }
    }

    pub fn call_static_float_method(
        &self,
        cls: jni::jclass,
        mid: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> jni::jfloat {
        unsafe { jni_call!(self.env, CallStaticFloatMethodA, cls, mid, args.as_ptr()) }
    }

    pub fn call_static_double_method(
        &self,
        cls: jni::jclass,
        mid: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> jni::jdouble {
        unsafe { jni_call!(self.env, CallStaticDoubleMethodA, cls, mid, args.as_ptr()) }
    }

    // =========================================================================
    // Exceptions
    // =========================================================================

    pub fn exception_check(&self) -> bool {
        unsafe { jni_call!(self.env, ExceptionCheck) != 0 }
    }

    pub fn exception_clear(&self) {
        unsafe { jni_call!(self.env, ExceptionClear) }
    }

    pub fn exception_describe(&self) {
        unsafe { jni_call!(self.env, ExceptionDescribe) }
    }

    pub fn exception_occurred(&self) -> Option<jni::jthrowable> {
        let exc = unsafe { jni_call!(self.env, ExceptionOccurred) };
        if exc.is_null() {
            None
        } else {
            Some(exc)
        }
    }

    /// Capture and clear a pending guest exception, returning its rendered
    /// description. The pending state does not survive the next JNI call,
    /// so the message must be extracted here, before anything else runs.
    pub fn take_pending_exception(&self) -> Option<String> {
        if !self.exception_check() {
            return None;
        }
        let throwable = self.exception_occurred();
        self.exception_clear();
        let Some(throwable) = throwable else {
            return Some("unknown guest exception".to_string());
        };
        let message = self.render_throwable(throwable);
        self.delete_local_ref(throwable);
        Some(message)
    }

    /// Render a throwable via its `toString()`. Falls back to a fixed
    /// message if rendering itself raises.
    fn render_throwable(&self, throwable: jni::jthrowable) -> String {
        let cls = self.get_object_class(throwable);
        let rendered = self
            .get_method_id(cls, "toString", "()Ljava/lang/String;")
            .and_then(|mid| {
                let jstr = self.call_object_method(throwable, mid, &[]);
                if self.exception_check() {
                    self.exception_clear();
                    return None;
                }
                let _guard = LocalRef::new(self, jstr);
                self.get_string_utf(jstr)
            });
        if !cls.is_null() {
            self.delete_local_ref(cls);
        }
        rendered.unwrap_or_else(|| "guest exception (no description available)".to_string())
    }
}

/// RAII guard that deletes a local reference when dropped.
pub struct LocalRef<'a> {
    env: &'a JniEnv,
    obj: jni::jobject,
}

impl<'a> LocalRef<'a> {
    pub fn new(env: &'a JniEnv, obj: jni::jobject) -> Self {
        LocalRef { env, obj }
    }

    pub fn get(&self) -> jni::jobject {
        self.obj
    }

    /// Release the guard without deleting the reference.
    pub fn into_inner(self) -> jni::jobject {
        let obj = self.obj;
        std::mem::forget(self);
        obj
    }
}

impl<'a> Drop for LocalRef<'a> {
    fn drop(&mut self) {
        if !self.obj.is_null() {
            self.env.delete_local_ref(self.obj);
        }
    }
}
