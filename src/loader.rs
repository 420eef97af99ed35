//! Locating and loading the guest VM's shared library.
//!
//! The runtime library (`libjvm.so` / `libjvm.dylib` / `jvm.dll`) is
//! resolved at run time rather than link time, so a host binary runs on
//! machines without a JDK until it actually opens a session. A loaded
//! runtime is held in a process-wide [`OnceLock`] and never unloaded:
//! unloading a VM library with live VM state behind it is not sound.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{BridgeError, Result};
use crate::sys::jni;

static RUNTIME: OnceLock<JvmRuntime> = OnceLock::new();

/// Maximum directory depth when scanning below the host executable.
const EXE_SCAN_DEPTH: usize = 3;

/// A loaded VM runtime library with its invocation entry points resolved.
pub struct JvmRuntime {
    create_java_vm: jni::JNI_CreateJavaVM,
    get_created_java_vms: jni::JNI_GetCreatedJavaVMs,
    path: PathBuf,
    // Keeps the shared library mapped for the life of the process.
    _lib: libloading::Library,
}

// The function pointers are process-global once the library is mapped.
unsafe impl Send for JvmRuntime {}
unsafe impl Sync for JvmRuntime {}

impl JvmRuntime {
    /// Load the runtime library at `path` and resolve its entry points.
    pub fn open(path: &Path) -> Result<JvmRuntime> {
        let lib = unsafe {
            libloading::Library::new(path).map_err(|e| BridgeError::LibraryLoad(e.to_string()))?
        };
        let create_java_vm = unsafe {
            *lib.get::<jni::JNI_CreateJavaVM>(b"JNI_CreateJavaVM\0")
                .map_err(|e| BridgeError::LibraryLoad(e.to_string()))?
        };
        let get_created_java_vms = unsafe {
            *lib.get::<jni::JNI_GetCreatedJavaVMs>(b"JNI_GetCreatedJavaVMs\0")
                .map_err(|e| BridgeError::LibraryLoad(e.to_string()))?
        };
        Ok(JvmRuntime {
            create_java_vm,
            get_created_java_vms,
            path: path.to_path_buf(),
            _lib: lib,
        })
    }

    /// The resolved `JNI_CreateJavaVM` entry point.
    pub fn create_java_vm(&self) -> jni::JNI_CreateJavaVM {
        self.create_java_vm
    }

    /// The resolved `JNI_GetCreatedJavaVMs` entry point.
    pub fn get_created_java_vms(&self) -> jni::JNI_GetCreatedJavaVMs {
        self.get_created_java_vms
    }

    /// Where the library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Load the process-wide runtime, locating the library automatically.
///
/// The first successful load wins; later calls return the same runtime
/// even if the environment has changed since.
pub fn runtime() -> Result<&'static JvmRuntime> {
    runtime_at(None)
}

/// Load the process-wide runtime from an explicit library path.
pub fn runtime_at(explicit: Option<&Path>) -> Result<&'static JvmRuntime> {
    if let Some(rt) = RUNTIME.get() {
        return Ok(rt);
    }
    let path = match explicit {
        Some(path) if path.exists() => path.to_path_buf(),
        Some(path) => {
            return Err(BridgeError::RuntimeNotFound(format!(
                "explicit library path does not exist: {}",
                path.display()
            )))
        }
        None => find_libjvm()?,
    };
    let rt = JvmRuntime::open(&path)?;
    // A concurrent initializer may have won; its runtime is just as valid.
    Ok(RUNTIME.get_or_init(|| rt))
}

pub fn libjvm_filename() -> &'static str {
    #[cfg(target_os = "windows")]
    {
        "jvm.dll"
    }
    #[cfg(target_os = "macos")]
    {
        "libjvm.dylib"
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        "libjvm.so"
    }
}

fn candidates_from_java_home(java_home: &Path) -> Vec<PathBuf> {
    let filename = libjvm_filename();
    let arch = std::env::consts::ARCH;

    let mut rels = vec![
        format!("lib/server/{filename}"),
        format!("jre/lib/server/{filename}"),
        format!("lib/{arch}/server/{filename}"),
        format!("jre/lib/{arch}/server/{filename}"),
    ];

    if cfg!(target_os = "windows") {
        rels.push(format!("bin/server/{filename}"));
        rels.push(format!("jre/bin/server/{filename}"));
        rels.push(format!("bin/client/{filename}"));
        rels.push(format!("jre/bin/client/{filename}"));
    }

    rels.into_iter().map(|r| java_home.join(r)).collect()
}

fn platform_install_roots() -> Vec<PathBuf> {
    if cfg!(target_os = "windows") {
        let mut roots = Vec::new();
        if let Some(pf) = std::env::var_os("ProgramFiles") {
            roots.push(PathBuf::from(pf).join("Java"));
        }
        if let Some(pf) = std::env::var_os("ProgramFiles(x86)") {
            roots.push(PathBuf::from(pf).join("Java"));
        }
        roots
    } else if cfg!(target_os = "macos") {
        vec![PathBuf::from("/Library/Java/JavaVirtualMachines")]
    } else {
        vec![PathBuf::from("/usr/lib/jvm"), PathBuf::from("/usr/java")]
    }
}

/// Depth-bounded scan for the runtime library filename under `dir`.
fn scan_for_libjvm(dir: &Path, depth: usize) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if path.file_name().is_some_and(|n| n == libjvm_filename()) {
            return Some(path);
        }
    }
    if depth == 0 {
        return None;
    }
    subdirs.sort();
    for sub in subdirs {
        if let Some(found) = scan_for_libjvm(&sub, depth - 1) {
            return Some(found);
        }
    }
    None
}

/// Locate the runtime library.
///
/// Search order: `JVM_LIB_PATH`, the host executable's directory (shallow
/// scan, for bundled runtimes), `JAVA_HOME` layout candidates, then the
/// platform's conventional install roots.
pub fn find_libjvm() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os("JVM_LIB_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
        return Err(BridgeError::RuntimeNotFound(format!(
            "JVM_LIB_PATH is set but does not exist: {}",
            path.display()
        )));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            if let Some(found) = scan_for_libjvm(exe_dir, EXE_SCAN_DEPTH) {
                return Ok(found);
            }
        }
    }

    if let Some(java_home) = std::env::var_os("JAVA_HOME") {
        let java_home = PathBuf::from(java_home);
        for candidate in candidates_from_java_home(&java_home) {
            if candidate.exists() {
                return Ok(candidate);
            }
        }
        return Err(BridgeError::RuntimeNotFound(format!(
            "could not find {} under JAVA_HOME={}; set JVM_LIB_PATH explicitly",
            libjvm_filename(),
            java_home.display()
        )));
    }

    for root in platform_install_roots() {
        // Install roots hold one directory per JDK; a deeper bound covers
        // layouts like <jdk>/Contents/Home/lib/server on macOS.
        if let Some(found) = scan_for_libjvm(&root, 5) {
            return Ok(found);
        }
    }

    Err(BridgeError::RuntimeNotFound(
        "no VM runtime library found; set JAVA_HOME or JVM_LIB_PATH".to_string(),
    ))
}
