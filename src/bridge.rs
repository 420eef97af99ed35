//! The bridge facade: dynamic construction and invocation of guest
//! classes from host code, with no per-method binding layer.
//!
//! A [`JavaBridge`] moves through three states: constructed (no VM yet),
//! ready (a session is live), disposed. Method dispatch follows one rule:
//! invoking with no target object resolves and calls a static method,
//! invoking with a target resolves and calls an instance method.

use std::path::{Path, PathBuf};

use crate::codec::{self, EncodedArgs, HostValue, ResultKind};
use crate::descriptor::{MethodDescriptor, ParamType, Primitive};
use crate::env::JniEnv;
use crate::error::{BridgeError, Result};
use crate::loader;
use crate::registry::{HandleRegistry, ObjectHandle};
use crate::sys::jni;
use crate::vm::{VmOptions, VmSession};

#[derive(PartialEq, Eq)]
enum BridgeState {
    Constructed,
    Ready,
    Disposed,
}

/// Facade over a VM session, a class/object registry and the value codec.
///
/// Not `Send`: the underlying environment pointer is only valid on the
/// thread that created or attached the session.
pub struct JavaBridge {
    session: Option<VmSession>,
    registry: HandleRegistry,
    state: BridgeState,
    library_path: Option<PathBuf>,
}

impl JavaBridge {
    /// A bridge with no VM yet; call [`JavaBridge::create_vm`] or
    /// [`JavaBridge::attach_vm`] to make it ready.
    pub fn new() -> Self {
        JavaBridge {
            session: None,
            registry: HandleRegistry::new(),
            state: BridgeState::Constructed,
            library_path: None,
        }
    }

    /// Like [`JavaBridge::new`], pinning the runtime library to an explicit
    /// path instead of the automatic search.
    pub fn with_library(path: &Path) -> Self {
        let mut bridge = JavaBridge::new();
        bridge.library_path = Some(path.to_path_buf());
        bridge
    }

    /// Wrap a session the host already owns. The bridge takes over its
    /// lifecycle and is immediately ready.
    pub fn with_session(session: VmSession) -> Self {
        JavaBridge {
            session: Some(session),
            registry: HandleRegistry::new(),
            state: BridgeState::Ready,
            library_path: None,
        }
    }

    /// Create a VM and make the bridge ready.
    pub fn create_vm(&mut self, options: VmOptions) -> Result<()> {
        if self.state != BridgeState::Constructed {
            return Err(BridgeError::InvalidState("VM already initialized"));
        }
        let rt = loader::runtime_at(self.library_path.as_deref())?;
        let session = VmSession::create_from_runtime(options, rt)?;
        self.session = Some(session);
        self.state = BridgeState::Ready;
        Ok(())
    }

    /// Attach to a VM another component in this process already created.
    ///
    /// Returns `Ok(false)` when no VM exists; the bridge stays in its
    /// constructed state so the caller can fall back to [`create_vm`].
    ///
    /// [`create_vm`]: JavaBridge::create_vm
    pub fn attach_vm(&mut self) -> Result<bool> {
        if self.state != BridgeState::Constructed {
            return Err(BridgeError::InvalidState("VM already initialized"));
        }
        let rt = loader::runtime_at(self.library_path.as_deref())?;
        match VmSession::attach_existing_from_runtime(rt)? {
            Some(session) => {
                self.session = Some(session);
                self.state = BridgeState::Ready;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The JNI version the live session reports.
    pub fn version(&self) -> Result<jni::jint> {
        self.ensure_ready()?;
        let session = self.session.as_ref().ok_or(BridgeError::InvalidState("no session"))?;
        Ok(session.version())
    }

    /// Resolve a class by qualified name (`java/lang/String`) and cache it.
    /// Subsequent resolutions of the same name hit the cache.
    pub fn resolve_class(&mut self, name: &str) -> Result<()> {
        self.ensure_ready()?;
        let env = self.env()?;
        self.resolve_class_ref(&env, name)?;
        Ok(())
    }

    /// Construct a guest object and track it, returning its handle.
    ///
    /// `descriptor` is the constructor descriptor and must return void,
    /// e.g. `(Ljava/lang/String;)V`.
    pub fn construct(
        &mut self,
        class: &str,
        descriptor: &str,
        args: &[HostValue],
    ) -> Result<ObjectHandle> {
        self.ensure_ready()?;
        let desc = MethodDescriptor::parse(descriptor)?;
        if desc.ret != ParamType::Primitive(Primitive::Void) {
            return Err(BridgeError::SignatureMismatch {
                expected: "V".to_string(),
                actual: "constructor with non-void return",
            });
        }
        codec::validate_args(&desc, args)?;
        let env = self.env()?;
        let cls = self.resolve_class_ref(&env, class)?;
        let mid = env
            .get_method_id(cls, "<init>", descriptor)
            .ok_or_else(|| self.lookup_failure(&env, class, "<init>", descriptor))?;
        let encoded = codec::encode_args(&env, &desc, args)?;
        let obj = env.new_object(cls, mid, &encoded.slots);
        let failure = env.take_pending_exception();
        encoded.release(&env);
        if let Some(message) = failure {
            if let Some(obj) = obj {
                env.delete_local_ref(obj);
            }
            return Err(BridgeError::GuestException { message });
        }
        let obj = obj.ok_or(BridgeError::InvalidState("constructor returned null"))?;
        Ok(self.registry.track_object(obj))
    }

    /// Invoke a method that returns void. `target` of `None` dispatches
    /// statically. A descriptor with a non-void return is rejected before
    /// any call is issued.
    pub fn invoke_void(
        &mut self,
        class: &str,
        target: Option<ObjectHandle>,
        method: &str,
        descriptor: &str,
        args: &[HostValue],
    ) -> Result<()> {
        let desc = MethodDescriptor::parse(descriptor)?;
        if desc.ret != ParamType::Primitive(Primitive::Void) {
            return Err(BridgeError::SignatureMismatch {
                expected: "V".to_string(),
                actual: "non-void return",
            });
        }
        self.invoke(class, target, method, descriptor, args)?;
        Ok(())
    }

    /// Invoke a method, decoding the result per the descriptor's return
    /// type. `target` of `None` dispatches statically.
    pub fn invoke(
        &mut self,
        class: &str,
        target: Option<ObjectHandle>,
        method: &str,
        descriptor: &str,
        args: &[HostValue],
    ) -> Result<HostValue> {
        self.ensure_ready()?;
        let desc = MethodDescriptor::parse(descriptor)?;
        let kind = ResultKind::of(&desc.ret);
        codec::validate_args(&desc, args)?;
        let env = self.env()?;
        let cls = self.resolve_class_ref(&env, class)?;
        let obj = match target {
            Some(handle) => Some(
                self.registry
                    .object(handle)
                    .ok_or(BridgeError::InvalidState("object handle already released"))?,
            ),
            None => None,
        };
        let mid = match obj {
            Some(_) => env.get_method_id(cls, method, descriptor),
            None => env.get_static_method_id(cls, method, descriptor),
        }
        .ok_or_else(|| self.lookup_failure(&env, class, method, descriptor))?;
        let encoded = codec::encode_args(&env, &desc, args)?;
        self.dispatch(&env, kind, cls, obj, mid, encoded)
    }

    /// Release a single constructed object early.
    pub fn release_object(&mut self, handle: ObjectHandle) -> Result<()> {
        self.ensure_ready()?;
        let env = self.env()?;
        self.registry.release_object(&env, handle);
        Ok(())
    }

    /// Release every tracked reference and shut the session down.
    /// Idempotent; dropping after dispose does nothing further.
    pub fn dispose(&mut self) -> Result<()> {
        if self.state == BridgeState::Disposed {
            return Ok(());
        }
        self.state = BridgeState::Disposed;
        if let Some(mut session) = self.session.take() {
            let env = unsafe { session.env() };
            self.registry.release_all(&env);
            session.dispose()?;
        }
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            BridgeState::Ready => Ok(()),
            BridgeState::Constructed => Err(BridgeError::InvalidState("no VM yet")),
            BridgeState::Disposed => Err(BridgeError::InvalidState("bridge disposed")),
        }
    }

    fn env(&self) -> Result<JniEnv> {
        let session = self.session.as_ref().ok_or(BridgeError::InvalidState("no session"))?;
        Ok(unsafe { session.env() })
    }

    /// Find a class, promote it to a global reference and cache it.
    fn resolve_class_ref(&mut self, env: &JniEnv, name: &str) -> Result<jni::jclass> {
        if let Some(cls) = self.registry.cached_class(name) {
            return Ok(cls);
        }
        let local = env
            .find_class(name)
            .ok_or_else(|| self.lookup_failure(env, name, "", ""))?;
        let global = env.new_global_ref(local);
        env.delete_local_ref(local);
        if global.is_null() {
            return Err(BridgeError::InvalidState("global reference creation failed"));
        }
        self.registry.insert_class(name, global);
        Ok(global)
    }

    /// Turn a failed class/method lookup into an error, preferring the
    /// guest's own pending exception message.
    fn lookup_failure(
        &self,
        env: &JniEnv,
        class: &str,
        method: &str,
        descriptor: &str,
    ) -> BridgeError {
        let message = env.take_pending_exception().unwrap_or_else(|| {
            if method.is_empty() {
                format!("class not found: {class}")
            } else {
                format!("method not found: {class}.{method}{descriptor}")
            }
        });
        BridgeError::GuestException { message }
    }

    /// Issue the call for the selected result kind, then decode. The
    /// pending-exception check runs before any decode so a failed call
    /// never reads a half-valid result.
    fn dispatch(
        &self,
        env: &JniEnv,
        kind: ResultKind,
        cls: jni::jclass,
        obj: Option<jni::jobject>,
        mid: jni::jmethodID,
        encoded: EncodedArgs,
    ) -> Result<HostValue> {
        let slots = &encoded.slots;
        let mut obj_result: jni::jobject = std::ptr::null_mut();
        let primitive = match kind {
            ResultKind::Void => {
                match obj {
                    Some(o) => env.call_void_method(o, mid, slots),
                    None => env.call_static_void_method(cls, mid, slots),
                }
                HostValue::Null
            }
            ResultKind::Boolean => HostValue::Boolean(codec::decode_boolean(match obj {
                Some(o) => env.call_boolean_method(o, mid, slots),
                None => env.call_static_boolean_method(cls, mid, slots),
            })),
            ResultKind::Byte => HostValue::Byte(match obj {
                Some(o) => env.call_byte_method(o, mid, slots),
                None => env.call_static_byte_method(cls, mid, slots),
            }),
            ResultKind::Char => HostValue::Char(match obj {
                Some(o) => env.call_char_method(o, mid, slots),
                None => env.call_static_char_method(cls, mid, slots),
            }),
            ResultKind::Short => HostValue::Short(match obj {
                Some(o) => env.call_short_method(o, mid, slots),
                None => env.call_static_short_method(cls, mid, slots),
            }),
            ResultKind::Int => HostValue::Int(match obj {
                Some(o) => env.call_int_method(o, mid, slots),
                None => env.call_static_int_method(cls, mid, slots),
            }),
            ResultKind::Long => HostValue::Long(match obj {
                Some(o) => env.call_long_method(o, mid, slots),
                None => env.call_static_long_method(cls, mid, slots),
            }),
            ResultKind::Float => HostValue::Float(match obj {
                Some(o) => env.call_float_method(o, mid, slots),
                None => env.call_static_float_method(cls, mid, slots),
            }),
            ResultKind::Double => HostValue::Double(match obj {
                Some(o) => env.call_double_method(o, mid, slots),
                None => env.call_static_double_method(cls, mid, slots),
            }),
            ResultKind::Text
            | ResultKind::ByteArray
            | ResultKind::IntArray
            | ResultKind::TextArray
            | ResultKind::Object => {
                obj_result = match obj {
                    Some(o) => env.call_object_method(o, mid, slots),
                    None => env.call_static_object_method(cls, mid, slots),
                };
                HostValue::Null
            }
        };

        let failure = env.take_pending_exception();
        encoded.release(env);
        if let Some(message) = failure {
            if !obj_result.is_null() {
                env.delete_local_ref(obj_result);
            }
            return Err(BridgeError::GuestException { message });
        }

        Ok(match kind {
            ResultKind::Text => codec::decode_text(env, obj_result),
            ResultKind::ByteArray => codec::decode_byte_array(env, obj_result),
            ResultKind::IntArray => codec::decode_int_array(env, obj_result),
            ResultKind::TextArray => codec::decode_text_array(env, obj_result),
            ResultKind::Object => {
                if obj_result.is_null() {
                    HostValue::Null
                } else {
                    HostValue::Object(obj_result)
                }
            }
            _ => primitive,
        })
    }
}

impl Default for JavaBridge {
    fn default() -> Self {
        JavaBridge::new()
    }
}

impl Drop for JavaBridge {
    fn drop(&mut self) {
        let _ = self.dispose();
    }
}
