//! Conversion between host values and the VM's union-based call ABI.
//!
//! Encoding is validate-then-lower: the argument list is checked against
//! the parsed descriptor in full before any JNI object is allocated, so a
//! mismatch never leaves stray guest references behind. Lowering produces
//! the `jvalue` slot array plus the list of temporary local references
//! (strings, arrays) that must be released once the call returns.

use std::fmt;

use crate::descriptor::{MethodDescriptor, ParamType, Primitive};
use crate::env::JniEnv;
use crate::error::{BridgeError, Result};
use crate::sys::jni;

/// A value crossing the bridge in either direction.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Null,
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Text(String),
    ByteArray(Vec<i8>),
    CharArray(Vec<u16>),
    ShortArray(Vec<i16>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
    TextArray(Vec<String>),
    /// A raw guest reference passed through unchanged. The caller owns the
    /// reference; encoding never releases it.
    Object(jni::jobject),
}

impl HostValue {
    /// Short name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            HostValue::Null => "null",
            HostValue::Boolean(_) => "boolean",
            HostValue::Byte(_) => "byte",
            HostValue::Char(_) => "char",
            HostValue::Short(_) => "short",
            HostValue::Int(_) => "int",
            HostValue::Long(_) => "long",
            HostValue::Float(_) => "float",
            HostValue::Double(_) => "double",
            HostValue::Text(_) => "text",
            HostValue::ByteArray(_) => "byte[]",
            HostValue::CharArray(_) => "char[]",
            HostValue::ShortArray(_) => "short[]",
            HostValue::IntArray(_) => "int[]",
            HostValue::LongArray(_) => "long[]",
            HostValue::FloatArray(_) => "float[]",
            HostValue::DoubleArray(_) => "double[]",
            HostValue::TextArray(_) => "text[]",
            HostValue::Object(_) => "object",
        }
    }
}

/// The return shape a call expects, derived from the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Text,
    ByteArray,
    IntArray,
    TextArray,
    Object,
}

impl ResultKind {
    /// Map a descriptor return type to its decode branch.
    ///
    /// `Ljava/lang/String;` decodes to text; any other reference comes back
    /// as a raw [`HostValue::Object`]. Decoded array returns are `[B`, `[I`
    /// and `[Ljava/lang/String;`; every other array kind falls back to the
    /// raw object handle rather than an error, so any method stays callable.
    pub fn of(ret: &ParamType) -> ResultKind {
        match ret {
            ParamType::Primitive(Primitive::Void) => ResultKind::Void,
            ParamType::Primitive(Primitive::Boolean) => ResultKind::Boolean,
            ParamType::Primitive(Primitive::Byte) => ResultKind::Byte,
            ParamType::Primitive(Primitive::Char) => ResultKind::Char,
            ParamType::Primitive(Primitive::Short) => ResultKind::Short,
            ParamType::Primitive(Primitive::Int) => ResultKind::Int,
            ParamType::Primitive(Primitive::Long) => ResultKind::Long,
            ParamType::Primitive(Primitive::Float) => ResultKind::Float,
            ParamType::Primitive(Primitive::Double) => ResultKind::Double,
            ParamType::Reference(name) if name == "java/lang/String" => ResultKind::Text,
            ParamType::Reference(_) => ResultKind::Object,
            ParamType::Array(inner) => match inner.as_ref() {
                ParamType::Primitive(Primitive::Byte) => ResultKind::ByteArray,
                ParamType::Primitive(Primitive::Int) => ResultKind::IntArray,
                ParamType::Reference(name) if name == "java/lang/String" => ResultKind::TextArray,
                _ => ResultKind::Object,
            },
        }
    }
}

/// Encoded call arguments: the slot array handed to the VM plus the
/// temporary references created while lowering. Temps are local refs the
/// caller releases after the call completes.
pub struct EncodedArgs {
    pub slots: Vec<jni::jvalue>,
    pub temps: Vec<jni::jobject>,
}

impl EncodedArgs {
    /// Release every temporary local reference.
    pub fn release(self, env: &JniEnv) {
        for temp in self.temps {
            if !temp.is_null() {
                env.delete_local_ref(temp);
            }
        }
    }
}

// jvalue is a union, so slot contents are opaque here.
impl fmt::Debug for EncodedArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedArgs")
            .field("slots", &self.slots.len())
            .field("temps", &self.temps.len())
            .finish()
    }
}

/// Check the whole argument list against the descriptor without touching
/// the VM: arity first, then the per-slot type policy. Callers run this
/// before issuing any native call.
pub fn validate_args(descriptor: &MethodDescriptor, args: &[HostValue]) -> Result<()> {
    if descriptor.params.len() != args.len() {
        return Err(BridgeError::ArityMismatch {
            expected: descriptor.params.len(),
            actual: args.len(),
        });
    }
    for (param, arg) in descriptor.params.iter().zip(args) {
        check_compatible(param, arg)?;
    }
    Ok(())
}

/// Lower host arguments into the VM's calling convention.
///
/// Fails before any allocation if the arity or any argument kind disagrees
/// with the descriptor. On a later allocation failure, already-created
/// temporaries are released before returning.
pub fn encode_args(
    env: &JniEnv,
    descriptor: &MethodDescriptor,
    args: &[HostValue],
) -> Result<EncodedArgs> {
    validate_args(descriptor, args)?;

    let mut encoded = EncodedArgs { slots: Vec::with_capacity(args.len()), temps: Vec::new() };
    for arg in args {
        match lower_value(env, arg) {
            Ok((slot, temp)) => {
                encoded.slots.push(slot);
                if let Some(temp) = temp {
                    encoded.temps.push(temp);
                }
            }
            Err(e) => {
                encoded.release(env);
                return Err(e);
            }
        }
    }
    Ok(encoded)
}

/// Structural compatibility check, no side effects.
fn check_compatible(param: &ParamType, arg: &HostValue) -> Result<()> {
    let ok = match (param, arg) {
        (_, HostValue::Null) => !matches!(param, ParamType::Primitive(_)),
        (ParamType::Primitive(Primitive::Boolean), HostValue::Boolean(_)) => true,
        (ParamType::Primitive(Primitive::Byte), HostValue::Byte(_)) => true,
        (ParamType::Primitive(Primitive::Char), HostValue::Char(_)) => true,
        (ParamType::Primitive(Primitive::Short), HostValue::Short(_)) => true,
        (ParamType::Primitive(Primitive::Int), HostValue::Int(_)) => true,
        (ParamType::Primitive(Primitive::Long), HostValue::Long(_)) => true,
        (ParamType::Primitive(Primitive::Float), HostValue::Float(_)) => true,
        (ParamType::Primitive(Primitive::Double), HostValue::Double(_)) => true,
        (ParamType::Reference(name), HostValue::Text(_)) => {
            name == "java/lang/String" || name == "java/lang/Object"
        }
        (ParamType::Reference(_), HostValue::Object(_)) => true,
        (ParamType::Array(_), HostValue::Object(_)) => true,
        (ParamType::Array(inner), arg) => {
            if array_compatible(inner, arg) {
                true
            } else if is_array_value(arg) && !lowerable_array_elem(inner) {
                // The host sent array data for an element kind the codec
                // cannot build; only a pre-built Object handle works here.
                return Err(BridgeError::UnsupportedArrayType(param.to_string()));
            } else {
                false
            }
        }
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(BridgeError::SignatureMismatch {
            expected: param.to_string(),
            actual: arg.kind_name(),
        })
    }
}

fn array_compatible(inner: &ParamType, arg: &HostValue) -> bool {
    match (inner, arg) {
        (ParamType::Primitive(Primitive::Byte), HostValue::ByteArray(_))
        | (ParamType::Primitive(Primitive::Char), HostValue::CharArray(_))
        | (ParamType::Primitive(Primitive::Short), HostValue::ShortArray(_))
        | (ParamType::Primitive(Primitive::Int), HostValue::IntArray(_))
        | (ParamType::Primitive(Primitive::Long), HostValue::LongArray(_))
        | (ParamType::Primitive(Primitive::Float), HostValue::FloatArray(_))
        | (ParamType::Primitive(Primitive::Double), HostValue::DoubleArray(_)) => true,
        (ParamType::Reference(name), HostValue::TextArray(_)) => name == "java/lang/String",
        _ => false,
    }
}

fn is_array_value(arg: &HostValue) -> bool {
    matches!(
        arg,
        HostValue::ByteArray(_)
            | HostValue::CharArray(_)
            | HostValue::ShortArray(_)
            | HostValue::IntArray(_)
            | HostValue::LongArray(_)
            | HostValue::FloatArray(_)
            | HostValue::DoubleArray(_)
            | HostValue::TextArray(_)
    )
}

/// Array element kinds the codec can lower from host data.
fn lowerable_array_elem(inner: &ParamType) -> bool {
    match inner {
        ParamType::Primitive(Primitive::Boolean) | ParamType::Primitive(Primitive::Void) => false,
        ParamType::Primitive(_) => true,
        ParamType::Reference(name) => name == "java/lang/String",
        ParamType::Array(_) => false,
    }
}

/// Lower one argument. The second tuple member is the temporary local
/// reference to release after the call, if lowering created one.
fn lower_value(env: &JniEnv, arg: &HostValue) -> Result<(jni::jvalue, Option<jni::jobject>)> {
    let mut slot = jni::jvalue::zeroed();
    match arg {
        HostValue::Null => {
            slot.l = std::ptr::null_mut();
            Ok((slot, None))
        }
        HostValue::Boolean(v) => {
            slot.z = if *v { jni::JNI_TRUE } else { jni::JNI_FALSE };
            Ok((slot, None))
        }
        HostValue::Byte(v) => {
            slot.b = *v;
            Ok((slot, None))
        }
        HostValue::Char(v) => {
            slot.c = *v;
            Ok((slot, None))
        }
        HostValue::Short(v) => {
            slot.s = *v;
            Ok((slot, None))
        }
        HostValue::Int(v) => {
            slot.i = *v;
            Ok((slot, None))
        }
        HostValue::Long(v) => {
            slot.j = *v;
            Ok((slot, None))
        }
        HostValue::Float(v) => {
            slot.f = *v;
            Ok((slot, None))
        }
        HostValue::Double(v) => {
            slot.d = *v;
            Ok((slot, None))
        }
        HostValue::Text(s) => {
            let jstr = env
                .new_string_utf(s)
                .ok_or(BridgeError::InvalidState("string allocation failed"))?;
            slot.l = jstr;
            Ok((slot, Some(jstr)))
        }
        HostValue::ByteArray(v) => {
            let arr = env
                .new_byte_array(v.len() as jni::jsize)
                .ok_or(BridgeError::InvalidState("array allocation failed"))?;
            env.set_byte_array_region(arr, v);
            slot.l = arr;
            Ok((slot, Some(arr)))
        }
        HostValue::CharArray(v) => {
            let arr = env
                .new_char_array(v.len() as jni::jsize)
                .ok_or(BridgeError::InvalidState("array allocation failed"))?;
            env.set_char_array_region(arr, v);
            slot.l = arr;
            Ok((slot, Some(arr)))
        }
        HostValue::ShortArray(v) => {
            let arr = env
                .new_short_array(v.len() as jni::jsize)
                .ok_or(BridgeError::InvalidState("array allocation failed"))?;
            env.set_short_array_region(arr, v);
            slot.l = arr;
            Ok((slot, Some(arr)))
        }
        HostValue::IntArray(v) => {
            let arr = env
                .new_int_array(v.len() as jni::jsize)
                .ok_or(BridgeError::InvalidState("array allocation failed"))?;
            env.set_int_array_region(arr, v);
            slot.l = arr;
            Ok((slot, Some(arr)))
        }
        HostValue::LongArray(v) => {
            let arr = env
                .new_long_array(v.len() as jni::jsize)
                .ok_or(BridgeError::InvalidState("array allocation failed"))?;
            env.set_long_array_region(arr, v);
            slot.l = arr;
            Ok((slot, Some(arr)))
        }
        HostValue::FloatArray(v) => {
            let arr = env
                .new_float_array(v.len() as jni::jsize)
                .ok_or(BridgeError::InvalidState("array allocation failed"))?;
            env.set_float_array_region(arr, v);
            slot.l = arr;
            Ok((slot, Some(arr)))
        }
        HostValue::DoubleArray(v) => {
            let arr = env
                .new_double_array(v.len() as jni::jsize)
                .ok_or(BridgeError::InvalidState("array allocation failed"))?;
            env.set_double_array_region(arr, v);
            slot.l = arr;
            Ok((slot, Some(arr)))
        }
        HostValue::TextArray(v) => {
            let arr = lower_text_array(env, v)?;
            slot.l = arr;
            Ok((slot, Some(arr)))
        }
        HostValue::Object(obj) => {
            slot.l = *obj;
            Ok((slot, None))
        }
    }
}

/// Build a `String[]`, populating each element and releasing the per-element
/// string refs as it goes.
fn lower_text_array(env: &JniEnv, items: &[String]) -> Result<jni::jobjectArray> {
    let string_cls = env
        .find_class("java/lang/String")
        .ok_or(BridgeError::InvalidState("java/lang/String not found"))?;
    let arr = env.new_object_array(items.len() as jni::jsize, string_cls, std::ptr::null_mut());
    env.delete_local_ref(string_cls);
    let arr = arr.ok_or(BridgeError::InvalidState("array allocation failed"))?;
    for (i, item) in items.iter().enumerate() {
        let jstr = match env.new_string_utf(item) {
            Some(jstr) => jstr,
            None => {
                env.delete_local_ref(arr);
                return Err(BridgeError::InvalidState("string allocation failed"));
            }
        };
        env.set_object_array_element(arr, i as jni::jsize, jstr);
        env.delete_local_ref(jstr);
    }
    Ok(arr)
}

/// Narrow a VM boolean byte to a host bool. Anything non-zero is true.
pub fn decode_boolean(v: jni::jboolean) -> bool {
    v != 0
}

/// Decode a string result, releasing the local reference. A null handle
/// decodes as [`HostValue::Null`].
pub fn decode_text(env: &JniEnv, handle: jni::jobject) -> HostValue {
    if handle.is_null() {
        return HostValue::Null;
    }
    let text = env.get_string_utf(handle);
    env.delete_local_ref(handle);
    match text {
        Some(text) => HostValue::Text(text),
        None => HostValue::Null,
    }
}

/// Decode a `byte[]` result, copying its contents out and releasing the
/// local reference.
pub fn decode_byte_array(env: &JniEnv, handle: jni::jbyteArray) -> HostValue {
    if handle.is_null() {
        return HostValue::Null;
    }
    let len = env.get_array_length(handle);
    let mut buf = vec![0 as jni::jbyte; len as usize];
    env.get_byte_array_region(handle, &mut buf);
    env.delete_local_ref(handle);
    HostValue::ByteArray(buf)
}

/// Decode an `int[]` result, copying its contents out and releasing the
/// local reference.
pub fn decode_int_array(env: &JniEnv, handle: jni::jintArray) -> HostValue {
    if handle.is_null() {
        return HostValue::Null;
    }
    let len = env.get_array_length(handle);
    let mut buf = vec![0 as jni::jint; len as usize];
    env.get_int_array_region(handle, &mut buf);
    env.delete_local_ref(handle);
    HostValue::IntArray(buf)
}

/// Decode a `String[]` result element by element, releasing each element
/// reference and finally the array reference. Null elements decode as
/// empty strings to keep indices aligned.
pub fn decode_text_array(env: &JniEnv, handle: jni::jobjectArray) -> HostValue {
    if handle.is_null() {
        return HostValue::Null;
    }
    let len = env.get_array_length(handle);
    let mut items = Vec::with_capacity(len as usize);
    for i in 0..len {
        let element = env.get_object_array_element(handle, i);
        if element.is_null() {
            items.push(String::new());
            continue;
        }
        let text = env.get_string_utf(element).unwrap_or_default();
        env.delete_local_ref(element);
        items.push(text);
    }
    env.delete_local_ref(handle);
    HostValue::TextArray(items)
}
