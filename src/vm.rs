//! Creating and owning an embedded VM instance.
//!
//! A process hosts at most one VM. [`VmSession`] owns the instance it
//! creates and destroys it on [`VmSession::dispose`] or drop; a session
//! obtained by attaching to a VM some other component created is
//! non-owning and leaves teardown to that component.

use std::ffi::CString;
use std::ptr;

use crate::env::JniEnv;
use crate::error::{BridgeError, Result};
use crate::loader::{self, JvmRuntime};
use crate::sys::jni;

/// Startup configuration for a new VM instance.
pub struct VmOptions {
    version: jni::jint,
    options: Vec<CString>,
    ignore_unrecognized: bool,
}

impl Default for VmOptions {
    fn default() -> Self {
        VmOptions::new()
    }
}

impl VmOptions {
    pub fn new() -> Self {
        VmOptions {
            version: jni::JNI_VERSION_10,
            options: Vec::new(),
            ignore_unrecognized: true,
        }
    }

    /// Request a specific JNI version (e.g. [`jni::JNI_VERSION_1_8`]).
    pub fn version(mut self, version: jni::jint) -> Self {
        self.version = version;
        self
    }

    /// Add a raw VM option like `-Xmx1g`.
    pub fn option(mut self, opt: &str) -> Result<Self> {
        self.options.push(CString::new(opt)?);
        Ok(self)
    }

    /// Add multiple raw VM options.
    pub fn options<I, S>(mut self, opts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for opt in opts {
            self.options.push(CString::new(opt.as_ref())?);
        }
        Ok(self)
    }

    /// Add a system property definition (`-Dkey=value`).
    pub fn define(self, key: &str, value: &str) -> Result<Self> {
        self.option(&format!("-D{key}={value}"))
    }

    /// Set the guest class path (`-Djava.class.path=...`).
    pub fn classpath(self, path: &str) -> Result<Self> {
        self.define("java.class.path", path)
    }

    /// Set whether unrecognized options should be ignored by the VM.
    pub fn ignore_unrecognized(mut self, value: bool) -> Self {
        self.ignore_unrecognized = value;
        self
    }

    fn build_args(&mut self) -> (jni::JavaVMInitArgs, Vec<jni::JavaVMOption>) {
        let mut opt_structs: Vec<jni::JavaVMOption> = self
            .options
            .iter_mut()
            .map(|s| jni::JavaVMOption {
                optionString: s.as_ptr() as *mut std::os::raw::c_char,
                extraInfo: ptr::null_mut(),
            })
            .collect();

        let args = jni::JavaVMInitArgs {
            version: self.version,
            nOptions: opt_structs.len() as jni::jint,
            options: if opt_structs.is_empty() {
                ptr::null_mut()
            } else {
                opt_structs.as_mut_ptr()
            },
            ignoreUnrecognized: if self.ignore_unrecognized {
                jni::JNI_TRUE
            } else {
                jni::JNI_FALSE
            },
        };

        (args, opt_structs)
    }
}

/// An embedded VM instance.
///
/// The creator environment is only valid on the thread that created the
/// VM; other threads attach via [`VmSession::attach_current_thread`].
pub struct VmSession {
    vm: *mut jni::JavaVM,
    creator_env: *mut jni::JNIEnv,
    owned: bool,
    destroyed: bool,
}

impl VmSession {
    /// Create a VM, locating and loading the runtime library automatically.
    pub fn create(options: VmOptions) -> Result<VmSession> {
        let rt = loader::runtime()?;
        unsafe { VmSession::create_with(options, rt.create_java_vm()) }
    }

    /// Create a VM from an already-loaded runtime.
    pub fn create_from_runtime(options: VmOptions, rt: &JvmRuntime) -> Result<VmSession> {
        unsafe { VmSession::create_with(options, rt.create_java_vm()) }
    }

    /// Create a VM through a raw `JNI_CreateJavaVM` entry point.
    ///
    /// # Safety
    /// `create` must be a valid entry point whose backing library stays
    /// loaded for the life of the returned session.
    pub unsafe fn create_with(
        mut options: VmOptions,
        create: jni::JNI_CreateJavaVM,
    ) -> Result<VmSession> {
        let (mut args, _opt_structs) = options.build_args();

        let mut vm: *mut jni::JavaVM = ptr::null_mut();
        let mut env: *mut jni::JNIEnv = ptr::null_mut();

        let res = create(&mut vm, &mut env, &mut args);
        if res != jni::JNI_OK {
            return Err(BridgeError::VmCreationFailed { code: res });
        }
        if vm.is_null() || env.is_null() {
            return Err(BridgeError::VmCreationFailed { code: jni::JNI_ERR });
        }

        Ok(VmSession {
            vm,
            creator_env: env,
            owned: true,
            destroyed: false,
        })
    }

    /// Attach to a VM some other component in the process already created.
    ///
    /// Returns `Ok(None)` when no VM exists yet; the caller then decides
    /// whether to create one. The returned session is non-owning.
    pub fn attach_existing() -> Result<Option<VmSession>> {
        let rt = loader::runtime()?;
        VmSession::attach_existing_from_runtime(rt)
    }

    /// Attach to an existing VM through an already-loaded runtime.
    pub fn attach_existing_from_runtime(rt: &JvmRuntime) -> Result<Option<VmSession>> {
        unsafe { VmSession::attach_existing_with(rt.get_created_java_vms()) }
    }

    /// Attach through a raw `JNI_GetCreatedJavaVMs` entry point.
    ///
    /// # Safety
    /// `get_vms` must be a valid entry point whose backing library stays
    /// loaded for the life of the returned session.
    pub unsafe fn attach_existing_with(
        get_vms: jni::JNI_GetCreatedJavaVMs,
    ) -> Result<Option<VmSession>> {
        let mut vms: [*mut jni::JavaVM; 1] = [ptr::null_mut()];
        let mut count: jni::jsize = 0;
        let res = get_vms(vms.as_mut_ptr(), 1, &mut count);
        if res != jni::JNI_OK {
            return Err(BridgeError::AttachFailed { code: res });
        }
        if count == 0 || vms[0].is_null() {
            return Ok(None);
        }
        let vm = vms[0];
        let mut env_ptr: *mut std::os::raw::c_void = ptr::null_mut();
        let res = unsafe { crate::jvm_call!(vm, AttachCurrentThread, &mut env_ptr, ptr::null_mut()) };
        if res != jni::JNI_OK || env_ptr.is_null() {
            return Err(BridgeError::AttachFailed { code: res });
        }
        Ok(Some(VmSession {
            vm,
            creator_env: env_ptr as *mut jni::JNIEnv,
            owned: false,
            destroyed: false,
        }))
    }

    /// The raw `JavaVM*`.
    pub fn java_vm_ptr(&self) -> *mut jni::JavaVM {
        self.vm
    }

    /// Wrap the creator thread's environment.
    ///
    /// # Safety
    /// Only valid on the thread that created (or attached) this session.
    pub unsafe fn env(&self) -> JniEnv {
        JniEnv::from_raw(self.creator_env)
    }

    /// Attach the current thread and return its environment. Attaching an
    /// already-attached thread returns the existing environment.
    pub fn attach_current_thread(&self) -> Result<JniEnv> {
        let mut env_ptr: *mut std::os::raw::c_void = ptr::null_mut();
        let res =
            unsafe { crate::jvm_call!(self.vm, AttachCurrentThread, &mut env_ptr, ptr::null_mut()) };
        if res != jni::JNI_OK || env_ptr.is_null() {
            return Err(BridgeError::AttachFailed { code: res });
        }
        Ok(unsafe { JniEnv::from_raw(env_ptr as *mut jni::JNIEnv) })
    }

    /// Detach the current thread.
    pub fn detach_current_thread(&self) -> Result<()> {
        let res = unsafe { crate::jvm_call!(self.vm, DetachCurrentThread) };
        if res != jni::JNI_OK {
            return Err(BridgeError::AttachFailed { code: res });
        }
        Ok(())
    }

    /// The JNI version the creator environment reports.
    pub fn version(&self) -> jni::jint {
        unsafe { self.env().get_version() }
    }

    /// Shut the VM down. Idempotent; a non-owning session detaches instead
    /// of destroying.
    pub fn dispose(&mut self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.destroyed = true;
        if !self.owned {
            return self.detach_current_thread();
        }
        let res = unsafe { crate::jvm_call!(self.vm, DestroyJavaVM) };
        if res != jni::JNI_OK {
            return Err(BridgeError::VmCreationFailed { code: res });
        }
        Ok(())
    }
}

impl Drop for VmSession {
    fn drop(&mut self) {
        if self.destroyed || self.vm.is_null() {
            return;
        }
        if self.owned {
            unsafe {
                let _ = crate::jvm_call!(self.vm, DestroyJavaVM);
            }
        }
    }
}
