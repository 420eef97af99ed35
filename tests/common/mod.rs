//! In-process mock VM for integration tests.
//!
//! Builds a real `JNINativeInterface_` vtable whose function pointers land
//! in this file, with the mock's state stashed behind `reserved0` (the same
//! slot real VMs use for implementation data). Guest handles are small
//! integer ids cast to pointers; every id carries local/global reference
//! counts so the tests can assert exact release behavior.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use jbridge::descriptor::{MethodDescriptor, ParamType, Primitive};
use jbridge::env::JniEnv;
use jbridge::sys::jni;
use jbridge::vm::{VmOptions, VmSession};

// =============================================================================
// State
// =============================================================================

/// Canned behavior for a registered guest method.
#[derive(Clone)]
pub enum Behavior {
    /// Do nothing (void methods).
    Void,
    /// Return the first argument unchanged (primitives and references).
    EchoFirst,
    /// Return a freshly allocated string.
    Text(String),
    /// Return the receiver's constructor string, or "default".
    OwnText,
    /// Raise a guest exception with this message.
    Throw(String),
}

#[derive(Clone)]
struct MethodInfo {
    class: String,
    name: String,
    sig: String,
    is_static: bool,
    behavior: Behavior,
}

struct MockObject {
    class: String,
    text: Option<String>,
}

enum MockArray {
    Byte(Vec<i8>),
    Char(Vec<u16>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Object(Vec<usize>),
}

impl MockArray {
    fn len(&self) -> usize {
        match self {
            MockArray::Byte(v) => v.len(),
            MockArray::Char(v) => v.len(),
            MockArray::Short(v) => v.len(),
            MockArray::Int(v) => v.len(),
            MockArray::Long(v) => v.len(),
            MockArray::Float(v) => v.len(),
            MockArray::Double(v) => v.len(),
            MockArray::Object(v) => v.len(),
        }
    }
}

#[derive(Default)]
pub struct Counters {
    pub env_calls: usize,
    pub find_class: usize,
    pub get_method_id: usize,
    pub get_static_method_id: usize,
    pub new_object: usize,
    pub new_string: usize,
    pub new_array: usize,
    pub new_global_ref: usize,
    pub delete_local_ref: usize,
    pub delete_global_ref: usize,
    pub exception_clear: usize,
    pub destroy_vm: usize,
    pub attach_thread: usize,
    pub detach_thread: usize,
}

pub struct MockState {
    next_id: usize,
    known_classes: Vec<String>,
    classes: HashMap<String, usize>,
    class_names: HashMap<usize, String>,
    registered: HashMap<(String, String, String, bool), Behavior>,
    methods: HashMap<usize, MethodInfo>,
    objects: HashMap<usize, MockObject>,
    strings: HashMap<usize, CString>,
    arrays: HashMap<usize, MockArray>,
    local_refs: HashMap<usize, usize>,
    global_refs: HashMap<usize, usize>,
    pending: Option<usize>,
    env_ptr: *mut jni::JNIEnv,
    pub counters: Counters,
    /// Protocol violations the vtable observed (double releases, type
    /// confusion). Tests assert this stays empty.
    pub errors: Vec<String>,
}

impl MockState {
    fn alloc_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn bump_local(&mut self, id: usize) {
        *self.local_refs.entry(id).or_insert(0) += 1;
    }

    fn intern_class(&mut self, name: &str) -> usize {
        if let Some(id) = self.classes.get(name) {
            return *id;
        }
        let id = self.alloc_id();
        self.classes.insert(name.to_string(), id);
        self.class_names.insert(id, name.to_string());
        id
    }

    fn new_string(&mut self, text: &str) -> usize {
        let id = self.alloc_id();
        let c = CString::new(text).unwrap_or_default();
        self.strings.insert(id, c);
        self.bump_local(id);
        self.counters.new_string += 1;
        id
    }

    fn raise(&mut self, class: &str, message: &str) {
        self.intern_class(class);
        let id = self.alloc_id();
        self.objects.insert(
            id,
            MockObject {
                class: class.to_string(),
                text: Some(message.to_string()),
            },
        );
        self.pending = Some(id);
    }

    /// Total live references across both pools.
    pub fn live_refs(&self) -> usize {
        self.local_refs.values().sum::<usize>() + self.global_refs.values().sum::<usize>()
    }

    /// The rendered text a string handle carries, for assertions.
    pub fn string_text(&self, id: usize) -> Option<String> {
        self.strings
            .get(&id)
            .and_then(|c| c.to_str().ok())
            .map(|s| s.to_string())
    }
}

unsafe fn state_of(env: *mut jni::JNIEnv) -> &'static RefCell<MockState> {
    &*((**env).reserved0 as *const RefCell<MockState>)
}

fn id_of(handle: jni::jobject) -> usize {
    handle as usize
}

fn handle_of(id: usize) -> jni::jobject {
    id as jni::jobject
}

// =============================================================================
// Argument reading / behavior evaluation
// =============================================================================

#[derive(Clone, Copy)]
enum Val {
    None,
    Z(jni::jboolean),
    B(i8),
    C(u16),
    S(i16),
    I(i32),
    J(i64),
    F(f32),
    D(f64),
    L(usize),
}

unsafe fn read_args(sig: &str, args: *const jni::jvalue) -> Vec<Val> {
    let desc = MethodDescriptor::parse(sig).expect("registered mock signature must parse");
    let mut out = Vec::with_capacity(desc.params.len());
    for (i, param) in desc.params.iter().enumerate() {
        let v = *args.add(i);
        out.push(match param {
            ParamType::Primitive(Primitive::Boolean) => Val::Z(v.z),
            ParamType::Primitive(Primitive::Byte) => Val::B(v.b),
            ParamType::Primitive(Primitive::Char) => Val::C(v.c),
            ParamType::Primitive(Primitive::Short) => Val::S(v.s),
            ParamType::Primitive(Primitive::Int) => Val::I(v.i),
            ParamType::Primitive(Primitive::Long) => Val::J(v.j),
            ParamType::Primitive(Primitive::Float) => Val::F(v.f),
            ParamType::Primitive(Primitive::Double) => Val::D(v.d),
            _ => Val::L(v.l as usize),
        });
    }
    out
}

fn eval(state: &mut MockState, behavior: &Behavior, receiver: Option<usize>, vals: &[Val]) -> Val {
    match behavior {
        Behavior::Void => Val::None,
        Behavior::EchoFirst => match vals.first() {
            Some(Val::L(id)) => {
                state.bump_local(*id);
                Val::L(*id)
            }
            Some(v) => *v,
            None => Val::None,
        },
        Behavior::Text(s) => Val::L(state.new_string(s)),
        Behavior::OwnText => {
            let text = receiver
                .and_then(|id| state.objects.get(&id))
                .and_then(|o| o.text.clone())
                .unwrap_or_else(|| "default".to_string());
            Val::L(state.new_string(&text))
        }
        Behavior::Throw(msg) => {
            state.raise("java/lang/RuntimeException", msg);
            Val::None
        }
    }
}

unsafe fn do_call(
    env: *mut jni::JNIEnv,
    target: jni::jobject,
    mid: jni::jmethodID,
    args: *const jni::jvalue,
    expect_static: bool,
) -> Val {
    let cell = state_of(env);
    let mut state = cell.borrow_mut();
    state.counters.env_calls += 1;
    let info = match state.methods.get(&id_of(mid)) {
        Some(info) => info.clone(),
        None => {
            state.errors.push("call with unknown method id".to_string());
            return Val::None;
        }
    };
    if info.is_static != expect_static {
        state.errors.push(format!(
            "{}.{} dispatched through the wrong call family (static={})",
            info.class, info.name, expect_static
        ));
    }
    let receiver = if expect_static { None } else { Some(id_of(target)) };
    let vals = read_args(&info.sig, args);
    eval(&mut state, &info.behavior, receiver, &vals)
}

fn as_obj(v: Val) -> jni::jobject {
    match v {
        Val::L(id) => handle_of(id),
        _ => ptr::null_mut(),
    }
}

// =============================================================================
// vtable entry points
// =============================================================================

unsafe extern "system" fn mock_get_version(env: *mut jni::JNIEnv) -> jni::jint {
    state_of(env).borrow_mut().counters.env_calls += 1;
    jni::JNI_VERSION_10
}

unsafe extern "system" fn mock_find_class(
    env: *mut jni::JNIEnv,
    name: *const c_char,
) -> jni::jclass {
    let cell = state_of(env);
    let mut state = cell.borrow_mut();
    state.counters.env_calls += 1;
    state.counters.find_class += 1;
    let name = CStr::from_ptr(name).to_string_lossy().to_string();
    if !state.known_classes.iter().any(|k| k == &name) {
        state.raise("java/lang/NoClassDefFoundError", &name);
        return ptr::null_mut();
    }
    let id = state.intern_class(&name);
    state.bump_local(id);
    handle_of(id)
}

unsafe extern "system" fn mock_exception_occurred(env: *mut jni::JNIEnv) -> jni::jthrowable {
    let cell = state_of(env);
    let mut state = cell.borrow_mut();
    state.counters.env_calls += 1;
    match state.pending {
        Some(id) => {
            state.bump_local(id);
            handle_of(id)
        }
        None => ptr::null_mut(),
    }
}

unsafe extern "system" fn mock_exception_describe(env: *mut jni::JNIEnv) {
    state_of(env).borrow_mut().counters.env_calls += 1;
}

unsafe extern "system" fn mock_exception_clear(env: *mut jni::JNIEnv) {
    let cell = state_of(env);
    let mut state = cell.borrow_mut();
    state.counters.env_calls += 1;
    state.counters.exception_clear += 1;
    state.pending = None;
}

unsafe extern "system" fn mock_new_global_ref(
    env: *mut jni::JNIEnv,
    obj: jni::jobject,
) -> jni::jobject {
    let cell = state_of(env);
    let mut state = cell.borrow_mut();
    state.counters.env_calls += 1;
    state.counters.new_global_ref += 1;
    if obj.is_null() {
        return ptr::null_mut();
    }
    *state.global_refs.entry(id_of(obj)).or_insert(0) += 1;
    obj
}

unsafe extern "system" fn mock_delete_global_ref(env: *mut jni::JNIEnv, gref: jni::jobject) {
    let cell = state_of(env);
    let mut state = cell.borrow_mut();
    state.counters.env_calls += 1;
    state.counters.delete_global_ref += 1;
    let id = id_of(gref);
    match state.global_refs.get_mut(&id) {
        Some(count) if *count > 0 => *count -= 1,
        _ => state.errors.push(format!("double global release of {id}")),
    }
}

unsafe extern "system" fn mock_delete_local_ref(env: *mut jni::JNIEnv, obj: jni::jobject) {
    let cell = state_of(env);
    let mut state = cell.borrow_mut();
    state.counters.env_calls += 1;
    state.counters.delete_local_ref += 1;
    let id = id_of(obj);
    match state.local_refs.get_mut(&id) {
        Some(count) if *count > 0 => *count -= 1,
        _ => state.errors.push(format!("double local release of {id}")),
    }
}

unsafe extern "system" fn mock_new_object_a(
    env: *mut jni::JNIEnv,
    clazz: jni::jclass,
    mid: jni::jmethodID,
    args: *const jni::jvalue,
) -> jni::jobject {
    let cell = state_of(env);
    let mut state = cell.borrow_mut();
    state.counters.env_calls += 1;
    state.counters.new_object += 1;
    let info = match state.methods.get(&id_of(mid)) {
        Some(info) => info.clone(),
        None => {
            state.errors.push("NewObjectA with unknown method id".to_string());
            return ptr::null_mut();
        }
    };
    let class = state
        .class_names
        .get(&id_of(clazz))
        .cloned()
        .unwrap_or_else(|| info.class.clone());
    let vals = read_args(&info.sig, args);
    let text = vals.iter().find_map(|v| match v {
        Val::L(id) => state.string_text(*id),
        _ => None,
    });
    let id = state.alloc_id();
    state.objects.insert(id, MockObject { class, text });
    state.bump_local(id);
    handle_of(id)
}

unsafe extern "system" fn mock_get_object_class(
    env: *mut jni::JNIEnv,
    obj: jni::jobject,
) -> jni::jclass {
    let cell = state_of(env);
    let mut state = cell.borrow_mut();
    state.counters.env_calls += 1;
    let class = match state.objects.get(&id_of(obj)) {
        Some(o) => o.class.clone(),
        None => {
            state.errors.push("GetObjectClass on a non-object handle".to_string());
            return ptr::null_mut();
        }
    };
    let id = state.intern_class(&class);
    state.bump_local(id);
    handle_of(id)
}

unsafe fn lookup_method(
    env: *mut jni::JNIEnv,
    clazz: jni::jclass,
    name: *const c_char,
    sig: *const c_char,
    is_static: bool,
) -> jni::jmethodID {
    let cell = state_of(env);
    let mut state = cell.borrow_mut();
    state.counters.env_calls += 1;
    if is_static {
        state.counters.get_static_method_id += 1;
    } else {
        state.counters.get_method_id += 1;
    }
    let name = CStr::from_ptr(name).to_string_lossy().to_string();
    let sig = CStr::from_ptr(sig).to_string_lossy().to_string();
    let class = match state.class_names.get(&id_of(clazz)) {
        Some(c) => c.clone(),
        None => {
            state.errors.push("method lookup on a non-class handle".to_string());
            return ptr::null_mut();
        }
    };
    // toString resolves on every class so throwables can always render.
    let behavior = if !is_static && name == "toString" && sig == "()Ljava/lang/String;" {
        Some(Behavior::OwnText)
    } else {
        state
            .registered
            .get(&(class.clone(), name.clone(), sig.clone(), is_static))
            .cloned()
    };
    let Some(behavior) = behavior else {
        let message = format!("{class}.{name}{sig}");
        state.raise("java/lang/NoSuchMethodError", &message);
        return ptr::null_mut();
    };
    let id = state.alloc_id();
    state.methods.insert(
        id,
        MethodInfo {
            class,
            name,
            sig,
            is_static,
            behavior,
        },
    );
    handle_of(id)
}

unsafe extern "system" fn mock_get_method_id(
    env: *mut jni::JNIEnv,
    clazz: jni::jclass,
    name: *const c_char,
    sig: *const c_char,
) -> jni::jmethodID {
    lookup_method(env, clazz, name, sig, false)
}

unsafe extern "system" fn mock_get_static_method_id(
    env: *mut jni::JNIEnv,
    clazz: jni::jclass,
    name: *const c_char,
    sig: *const c_char,
) -> jni::jmethodID {
    lookup_method(env, clazz, name, sig, true)
}

macro_rules! mock_instance_call {
    ($name:ident, $ret:ty, $variant:ident, $default:expr) => {
        unsafe extern "system" fn $name(
            env: *mut jni::JNIEnv,
            obj: jni::jobject,
            mid: jni::jmethodID,
            args: *const jni::jvalue,
        ) -> $ret {
            match do_call(env, obj, mid, args, false) {
                Val::$variant(v) => v,
                _ => $default,
            }
        }
    };
}

macro_rules! mock_static_call {
    ($name:ident, $ret:ty, $variant:ident, $default:expr) => {
        unsafe extern "system" fn $name(
            env: *mut jni::JNIEnv,
            clazz: jni::jclass,
            mid: jni::jmethodID,
            args: *const jni::jvalue,
        ) -> $ret {
            match do_call(env, clazz, mid, args, true) {
                Val::$variant(v) => v,
                _ => $default,
            }
        }
    };
}

mock_instance_call!(mock_call_boolean_a, jni::jboolean, Z, 0);
mock_instance_call!(mock_call_byte_a, jni::jbyte, B, 0);
mock_instance_call!(mock_call_char_a, jni::jchar, C, 0);
mock_instance_call!(mock_call_short_a, jni::jshort, S, 0);
mock_instance_call!(mock_call_int_a, jni::jint, I, 0);
mock_instance_call!(mock_call_long_a, jni::jlong, J, 0);
mock_instance_call!(mock_call_float_a, jni::jfloat, F, 0.0);
mock_instance_call!(mock_call_double_a, jni::jdouble, D, 0.0);

mock_static_call!(mock_call_static_boolean_a, jni::jboolean, Z, 0);
mock_static_call!(mock_call_static_byte_a, jni::jbyte, B, 0);
mock_static_call!(mock_call_static_char_a, jni::jchar, C, 0);
mock_static_call!(mock_call_static_short_a, jni::jshort, S, 0);
mock_static_call!(mock_call_static_int_a, jni::jint, I, 0);
mock_static_call!(mock_call_static_long_a, jni::jlong, J, 0);
mock_static_call!(mock_call_static_float_a, jni::jfloat, F, 0.0);
mock_static_call!(mock_call_static_double_a, jni::jdouble, D, 0.0);

unsafe extern "system" fn mock_call_object_a(
    env: *mut jni::JNIEnv,
    obj: jni::jobject,
    mid: jni::jmethodID,
    args: *const jni::jvalue,
) -> jni::jobject {
    as_obj(do_call(env, obj, mid, args, false))
}

unsafe extern "system" fn mock_call_static_object_a(
    env: *mut jni::JNIEnv,
    clazz: jni::jclass,
    mid: jni::jmethodID,
    args: *const jni::jvalue,
) -> jni::jobject {
    as_obj(do_call(env, clazz, mid, args, true))
}

unsafe extern "system" fn mock_call_void_a(
    env: *mut jni::JNIEnv,
    obj: jni::jobject,
    mid: jni::jmethodID,
    args: *const jni::jvalue,
) {
    let _ = do_call(env, obj, mid, args, false);
}

unsafe extern "system" fn mock_call_static_void_a(
    env: *mut jni::JNIEnv,
    clazz: jni::jclass,
    mid: jni::jmethodID,
    args: *const jni::jvalue,
) {
    let _ = do_call(env, clazz, mid, args, true);
}

unsafe extern "system" fn mock_new_string_utf(
    env: *mut jni::JNIEnv,
    utf: *const c_char,
) -> jni::jstring {
    let cell = state_of(env);
    let mut state = cell.borrow_mut();
    state.counters.env_calls += 1;
    let text = CStr::from_ptr(utf).to_string_lossy().to_string();
    handle_of(state.new_string(&text))
}

unsafe extern "system" fn mock_get_string_utf_chars(
    env: *mut jni::JNIEnv,
    s: jni::jstring,
    is_copy: *mut jni::jboolean,
) -> *const c_char {
    let cell = state_of(env);
    let mut state = cell.borrow_mut();
    state.counters.env_calls += 1;
    if !is_copy.is_null() {
        *is_copy = jni::JNI_FALSE;
    }
    match state.strings.get(&id_of(s)) {
        Some(c) => c.as_ptr(),
        None => {
            state.errors.push("GetStringUTFChars on a non-string handle".to_string());
            ptr::null()
        }
    }
}

unsafe extern "system" fn mock_release_string_utf_chars(
    env: *mut jni::JNIEnv,
    _s: jni::jstring,
    _chars: *const c_char,
) {
    state_of(env).borrow_mut().counters.env_calls += 1;
}

unsafe extern "system" fn mock_get_array_length(
    env: *mut jni::JNIEnv,
    array: jni::jarray,
) -> jni::jsize {
    let cell = state_of(env);
    let mut state = cell.borrow_mut();
    state.counters.env_calls += 1;
    match state.arrays.get(&id_of(array)) {
        Some(a) => a.len() as jni::jsize,
        None => {
            state.errors.push("GetArrayLength on a non-array handle".to_string());
            0
        }
    }
}

unsafe extern "system" fn mock_new_object_array(
    env: *mut jni::JNIEnv,
    len: jni::jsize,
    _clazz: jni::jclass,
    init: jni::jobject,
) -> jni::jobjectArray {
    let cell = state_of(env);
    let mut state = cell.borrow_mut();
    state.counters.env_calls += 1;
    state.counters.new_array += 1;
    let id = state.alloc_id();
    state
        .arrays
        .insert(id, MockArray::Object(vec![id_of(init); len as usize]));
    state.bump_local(id);
    handle_of(id)
}

unsafe extern "system" fn mock_get_object_array_element(
    env: *mut jni::JNIEnv,
    array: jni::jobjectArray,
    index: jni::jsize,
) -> jni::jobject {
    let cell = state_of(env);
    let mut state = cell.borrow_mut();
    state.counters.env_calls += 1;
    let element = match state.arrays.get(&id_of(array)) {
        Some(MockArray::Object(v)) => v.get(index as usize).copied().unwrap_or(0),
        _ => {
            state.errors.push("GetObjectArrayElement on a non-object array".to_string());
            0
        }
    };
    if element != 0 {
        state.bump_local(element);
    }
    handle_of(element)
}

unsafe extern "system" fn mock_set_object_array_element(
    env: *mut jni::JNIEnv,
    array: jni::jobjectArray,
    index: jni::jsize,
    val: jni::jobject,
) {
    let cell = state_of(env);
    let mut state = cell.borrow_mut();
    state.counters.env_calls += 1;
    match state.arrays.get_mut(&id_of(array)) {
        Some(MockArray::Object(v)) if (index as usize) < v.len() => {
            v[index as usize] = id_of(val);
        }
        _ => state
            .errors
            .push("SetObjectArrayElement out of bounds or wrong kind".to_string()),
    }
}

macro_rules! mock_new_array {
    ($name:ident, $variant:ident, $elem:ty) => {
        unsafe extern "system" fn $name(env: *mut jni::JNIEnv, len: jni::jsize) -> jni::jarray {
            let cell = state_of(env);
            let mut state = cell.borrow_mut();
            state.counters.env_calls += 1;
            state.counters.new_array += 1;
            let id = state.alloc_id();
            state
                .arrays
                .insert(id, MockArray::$variant(vec![<$elem>::default(); len as usize]));
            state.bump_local(id);
            handle_of(id)
        }
    };
}

mock_new_array!(mock_new_byte_array, Byte, i8);
mock_new_array!(mock_new_char_array, Char, u16);
mock_new_array!(mock_new_short_array, Short, i16);
mock_new_array!(mock_new_int_array, Int, i32);
mock_new_array!(mock_new_long_array, Long, i64);
mock_new_array!(mock_new_float_array, Float, f32);
mock_new_array!(mock_new_double_array, Double, f64);

macro_rules! mock_get_region {
    ($name:ident, $variant:ident, $elem:ty) => {
        unsafe extern "system" fn $name(
            env: *mut jni::JNIEnv,
            array: jni::jarray,
            start: jni::jsize,
            len: jni::jsize,
            buf: *mut $elem,
        ) {
            let cell = state_of(env);
            let mut state = cell.borrow_mut();
            state.counters.env_calls += 1;
            match state.arrays.get(&id_of(array)) {
                Some(MockArray::$variant(v)) => {
                    let start = start as usize;
                    let len = len as usize;
                    if start + len <= v.len() {
                        ptr::copy_nonoverlapping(v.as_ptr().add(start), buf, len);
                    } else {
                        state.errors.push("array region read out of bounds".to_string());
                    }
                }
                _ => state.errors.push("region read on wrong array kind".to_string()),
            }
        }
    };
}

macro_rules! mock_set_region {
    ($name:ident, $variant:ident, $elem:ty) => {
        unsafe extern "system" fn $name(
            env: *mut jni::JNIEnv,
            array: jni::jarray,
            start: jni::jsize,
            len: jni::jsize,
            buf: *const $elem,
        ) {
            let cell = state_of(env);
            let mut state = cell.borrow_mut();
            state.counters.env_calls += 1;
            match state.arrays.get_mut(&id_of(array)) {
                Some(MockArray::$variant(v)) => {
                    let start = start as usize;
                    let len = len as usize;
                    if start + len <= v.len() {
                        ptr::copy_nonoverlapping(buf, v.as_mut_ptr().add(start), len);
                    } else {
                        state.errors.push("array region write out of bounds".to_string());
                    }
                }
                _ => state.errors.push("region write on wrong array kind".to_string()),
            }
        }
    };
}

mock_get_region!(mock_get_byte_region, Byte, jni::jbyte);
mock_get_region!(mock_get_char_region, Char, jni::jchar);
mock_get_region!(mock_get_short_region, Short, jni::jshort);
mock_get_region!(mock_get_int_region, Int, jni::jint);
mock_get_region!(mock_get_long_region, Long, jni::jlong);
mock_get_region!(mock_get_float_region, Float, jni::jfloat);
mock_get_region!(mock_get_double_region, Double, jni::jdouble);

mock_set_region!(mock_set_byte_region, Byte, jni::jbyte);
mock_set_region!(mock_set_char_region, Char, jni::jchar);
mock_set_region!(mock_set_short_region, Short, jni::jshort);
mock_set_region!(mock_set_int_region, Int, jni::jint);
mock_set_region!(mock_set_long_region, Long, jni::jlong);
mock_set_region!(mock_set_float_region, Float, jni::jfloat);
mock_set_region!(mock_set_double_region, Double, jni::jdouble);

unsafe extern "system" fn mock_exception_check(env: *mut jni::JNIEnv) -> jni::jboolean {
    let cell = state_of(env);
    let mut state = cell.borrow_mut();
    state.counters.env_calls += 1;
    if state.pending.is_some() {
        jni::JNI_TRUE
    } else {
        jni::JNI_FALSE
    }
}

// =============================================================================
// Invocation interface
// =============================================================================

unsafe fn vm_state(vm: *mut jni::JavaVM) -> &'static RefCell<MockState> {
    &*((**vm).reserved0 as *const RefCell<MockState>)
}

unsafe extern "system" fn mock_destroy_java_vm(vm: *mut jni::JavaVM) -> jni::jint {
    vm_state(vm).borrow_mut().counters.destroy_vm += 1;
    jni::JNI_OK
}

unsafe extern "system" fn mock_attach_current_thread(
    vm: *mut jni::JavaVM,
    penv: *mut *mut std::ffi::c_void,
    _args: *mut std::ffi::c_void,
) -> jni::jint {
    let cell = vm_state(vm);
    let mut state = cell.borrow_mut();
    state.counters.attach_thread += 1;
    *penv = state.env_ptr as *mut std::ffi::c_void;
    jni::JNI_OK
}

unsafe extern "system" fn mock_detach_current_thread(vm: *mut jni::JavaVM) -> jni::jint {
    vm_state(vm).borrow_mut().counters.detach_thread += 1;
    jni::JNI_OK
}

unsafe extern "system" fn mock_get_env(
    vm: *mut jni::JavaVM,
    penv: *mut *mut std::ffi::c_void,
    _version: jni::jint,
) -> jni::jint {
    let state = vm_state(vm).borrow();
    *penv = state.env_ptr as *mut std::ffi::c_void;
    jni::JNI_OK
}

// =============================================================================
// Construction
// =============================================================================

pub struct MockVmBuilder {
    classes: Vec<String>,
    methods: Vec<(String, String, String, bool, Behavior)>,
}

impl MockVmBuilder {
    pub fn class(mut self, name: &str) -> Self {
        self.classes.push(name.to_string());
        self
    }

    pub fn ctor(mut self, class: &str, sig: &str) -> Self {
        self.methods
            .push((class.to_string(), "<init>".to_string(), sig.to_string(), false, Behavior::Void));
        self
    }

    pub fn method(mut self, class: &str, name: &str, sig: &str, behavior: Behavior) -> Self {
        self.methods
            .push((class.to_string(), name.to_string(), sig.to_string(), false, behavior));
        self
    }

    pub fn static_method(mut self, class: &str, name: &str, sig: &str, behavior: Behavior) -> Self {
        self.methods
            .push((class.to_string(), name.to_string(), sig.to_string(), true, behavior));
        self
    }

    pub fn build(self) -> MockVm {
        MockVm::from_builder(self)
    }
}

pub struct MockVm {
    env: *mut jni::JNIEnv,
    vm: *mut jni::JavaVM,
    state: *const RefCell<MockState>,
    _vtable: Box<jni::JNINativeInterface_>,
    _env_slot: Box<jni::JNIEnv>,
    _invoke: Box<jni::JNIInvokeInterface_>,
    _vm_slot: Box<jni::JavaVM>,
}

impl MockVm {
    pub fn builder() -> MockVmBuilder {
        MockVmBuilder {
            classes: Vec::new(),
            methods: Vec::new(),
        }
    }

    fn from_builder(builder: MockVmBuilder) -> MockVm {
        let mut known = vec![
            "java/lang/String".to_string(),
            "java/lang/RuntimeException".to_string(),
            "java/lang/NoClassDefFoundError".to_string(),
            "java/lang/NoSuchMethodError".to_string(),
        ];
        known.extend(builder.classes);

        let mut registered = HashMap::new();
        for (class, name, sig, is_static, behavior) in builder.methods {
            registered.insert((class, name, sig, is_static), behavior);
        }

        let state = Box::new(RefCell::new(MockState {
            next_id: 1,
            known_classes: known,
            classes: HashMap::new(),
            class_names: HashMap::new(),
            registered,
            methods: HashMap::new(),
            objects: HashMap::new(),
            strings: HashMap::new(),
            arrays: HashMap::new(),
            local_refs: HashMap::new(),
            global_refs: HashMap::new(),
            pending: None,
            env_ptr: ptr::null_mut(),
            counters: Counters::default(),
            errors: Vec::new(),
        }));
        let state_ptr = Box::into_raw(state);

        let null = ptr::null_mut();
        let vtable = Box::new(jni::JNINativeInterface_ {
            reserved0: state_ptr as *mut std::ffi::c_void,
            reserved1: null,
            reserved2: null,
            reserved3: null,
            GetVersion: mock_get_version,
            _pad_05: [null; 1],
            FindClass: mock_find_class,
            _pad_07_14: [null; 8],
            ExceptionOccurred: mock_exception_occurred,
            ExceptionDescribe: mock_exception_describe,
            ExceptionClear: mock_exception_clear,
            _pad_18_20: [null; 3],
            NewGlobalRef: mock_new_global_ref,
            DeleteGlobalRef: mock_delete_global_ref,
            DeleteLocalRef: mock_delete_local_ref,
            _pad_24_29: [null; 6],
            NewObjectA: mock_new_object_a,
            GetObjectClass: mock_get_object_class,
            _pad_32: [null; 1],
            GetMethodID: mock_get_method_id,
            _pad_34_35: [null; 2],
            CallObjectMethodA: mock_call_object_a,
            _pad_37_38: [null; 2],
            CallBooleanMethodA: mock_call_boolean_a,
            _pad_40_41: [null; 2],
            CallByteMethodA: mock_call_byte_a,
            _pad_43_44: [null; 2],
            CallCharMethodA: mock_call_char_a,
            _pad_46_47: [null; 2],
            CallShortMethodA: mock_call_short_a,
            _pad_49_50: [null; 2],
            CallIntMethodA: mock_call_int_a,
            _pad_52_53: [null; 2],
            CallLongMethodA: mock_call_long_a,
            _pad_55_56: [null; 2],
            CallFloatMethodA: mock_call_float_a,
            _pad_58_59: [null; 2],
            CallDoubleMethodA: mock_call_double_a,
            _pad_61_62: [null; 2],
            CallVoidMethodA: mock_call_void_a,
            _pad_64_112: [null; 49],
            GetStaticMethodID: mock_get_static_method_id,
            _pad_114_115: [null; 2],
            CallStaticObjectMethodA: mock_call_static_object_a,
            _pad_117_118: [null; 2],
            CallStaticBooleanMethodA: mock_call_static_boolean_a,
            _pad_120_121: [null; 2],
            CallStaticByteMethodA: mock_call_static_byte_a,
            _pad_123_124: [null; 2],
            CallStaticCharMethodA: mock_call_static_char_a,
            _pad_126_127: [null; 2],
            CallStaticShortMethodA: mock_call_static_short_a,
            _pad_129_130: [null; 2],
            CallStaticIntMethodA: mock_call_static_int_a,
            _pad_132_133: [null; 2],
            CallStaticLongMethodA: mock_call_static_long_a,
            _pad_135_136: [null; 2],
            CallStaticFloatMethodA: mock_call_static_float_a,
            _pad_138_139: [null; 2],
            CallStaticDoubleMethodA: mock_call_static_double_a,
            _pad_141_142: [null; 2],
            CallStaticVoidMethodA: mock_call_static_void_a,
            _pad_144_166: [null; 23],
            NewStringUTF: mock_new_string_utf,
            _pad_168: [null; 1],
            GetStringUTFChars: mock_get_string_utf_chars,
            ReleaseStringUTFChars: mock_release_string_utf_chars,
            GetArrayLength: mock_get_array_length,
            NewObjectArray: mock_new_object_array,
            GetObjectArrayElement: mock_get_object_array_element,
            SetObjectArrayElement: mock_set_object_array_element,
            _pad_175: [null; 1],
            NewByteArray: mock_new_byte_array,
            NewCharArray: mock_new_char_array,
            NewShortArray: mock_new_short_array,
            NewIntArray: mock_new_int_array,
            NewLongArray: mock_new_long_array,
            NewFloatArray: mock_new_float_array,
            NewDoubleArray: mock_new_double_array,
            _pad_183_199: [null; 17],
            GetByteArrayRegion: mock_get_byte_region,
            GetCharArrayRegion: mock_get_char_region,
            GetShortArrayRegion: mock_get_short_region,
            GetIntArrayRegion: mock_get_int_region,
            GetLongArrayRegion: mock_get_long_region,
            GetFloatArrayRegion: mock_get_float_region,
            GetDoubleArrayRegion: mock_get_double_region,
            _pad_207: [null; 1],
            SetByteArrayRegion: mock_set_byte_region,
            SetCharArrayRegion: mock_set_char_region,
            SetShortArrayRegion: mock_set_short_region,
            SetIntArrayRegion: mock_set_int_region,
            SetLongArrayRegion: mock_set_long_region,
            SetFloatArrayRegion: mock_set_float_region,
            SetDoubleArrayRegion: mock_set_double_region,
            _pad_215_227: [null; 13],
            ExceptionCheck: mock_exception_check,
        });

        let mut env_slot = Box::new(&*vtable as jni::JNIEnv);
        let env: *mut jni::JNIEnv = &mut *env_slot;

        let invoke = Box::new(jni::JNIInvokeInterface_ {
            reserved0: state_ptr as *mut std::ffi::c_void,
            reserved1: null,
            reserved2: null,
            DestroyJavaVM: mock_destroy_java_vm,
            AttachCurrentThread: mock_attach_current_thread,
            DetachCurrentThread: mock_detach_current_thread,
            GetEnv: mock_get_env,
            AttachCurrentThreadAsDaemon: mock_attach_current_thread,
        });
        let mut vm_slot = Box::new(&*invoke as jni::JavaVM);
        let vm: *mut jni::JavaVM = &mut *vm_slot;

        unsafe {
            (*state_ptr).borrow_mut().env_ptr = env;
        }

        MockVm {
            env,
            vm,
            state: state_ptr,
            _vtable: vtable,
            _env_slot: env_slot,
            _invoke: invoke,
            _vm_slot: vm_slot,
        }
    }

    pub fn env(&self) -> JniEnv {
        unsafe { JniEnv::from_raw(self.env) }
    }

    pub fn env_ptr(&self) -> *mut jni::JNIEnv {
        self.env
    }

    pub fn vm_ptr(&self) -> *mut jni::JavaVM {
        self.vm
    }

    pub fn state(&self) -> std::cell::Ref<'_, MockState> {
        unsafe { (*self.state).borrow() }
    }

    pub fn state_mut(&self) -> std::cell::RefMut<'_, MockState> {
        unsafe { (*self.state).borrow_mut() }
    }

    /// Create a [`VmSession`] backed by this mock through the same raw
    /// entry-point seam a real runtime library provides.
    pub fn session(&self) -> VmSession {
        CREATE_TARGET.with(|t| t.set((self.vm, self.env)));
        let session = unsafe {
            VmSession::create_with(VmOptions::new(), mock_create_java_vm)
                .expect("mock VM creation")
        };
        session
    }

    /// Attach to this mock as if another component had created the VM,
    /// through the raw `JNI_GetCreatedJavaVMs` seam. The returned session
    /// is non-owning.
    pub fn attach_session(&self) -> Option<VmSession> {
        ATTACH_TARGET.with(|t| t.set(self.vm));
        unsafe {
            VmSession::attach_existing_with(mock_get_created_java_vms).expect("mock VM attach")
        }
    }
}

/// Attach when no VM exists in the process.
pub fn attach_session_without_vm() -> Option<VmSession> {
    ATTACH_TARGET.with(|t| t.set(ptr::null_mut()));
    unsafe { VmSession::attach_existing_with(mock_get_created_java_vms).expect("mock VM attach") }
}

impl Drop for MockVm {
    fn drop(&mut self) {
        unsafe {
            drop(Box::from_raw(self.state as *mut RefCell<MockState>));
        }
    }
}

thread_local! {
    static CREATE_TARGET: Cell<(*mut jni::JavaVM, *mut jni::JNIEnv)> =
        Cell::new((ptr::null_mut(), ptr::null_mut()));
    static ATTACH_TARGET: Cell<*mut jni::JavaVM> = Cell::new(ptr::null_mut());
}

unsafe extern "system" fn mock_create_java_vm(
    pvm: *mut *mut jni::JavaVM,
    penv: *mut *mut jni::JNIEnv,
    args: *mut jni::JavaVMInitArgs,
) -> jni::jint {
    let (vm, env) = CREATE_TARGET.with(|t| t.get());
    if vm.is_null() || env.is_null() {
        return jni::JNI_ERR;
    }
    if !args.is_null() && (*args).version == 0 {
        return jni::JNI_EVERSION;
    }
    *pvm = vm;
    *penv = env;
    jni::JNI_OK
}

unsafe extern "system" fn mock_get_created_java_vms(
    vm_buf: *mut *mut jni::JavaVM,
    buf_len: jni::jsize,
    n_vms: *mut jni::jsize,
) -> jni::jint {
    let vm = ATTACH_TARGET.with(|t| t.get());
    if vm.is_null() {
        *n_vms = 0;
        return jni::JNI_OK;
    }
    *n_vms = 1;
    if buf_len > 0 {
        *vm_buf = vm;
    }
    jni::JNI_OK
}
