//! Method descriptor parsing.
//!
//! A JNI method descriptor encodes the parameter and return types of a
//! method as a compact string, e.g. `(I[Ljava/lang/String;)V` for
//! `void f(int, String[])`. The parser consumes the descriptor strictly
//! left to right with no backtracking and rejects malformed input before
//! any native call is attempted.

use std::fmt;

use crate::error::{BridgeError, Result};

/// The primitive type codes a descriptor may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Boolean, // Z
    Byte,    // B
    Char,    // C
    Short,   // S
    Int,     // I
    Long,    // J
    Float,   // F
    Double,  // D
    Void,    // V
}

impl Primitive {
    fn from_code(c: u8) -> Option<Self> {
        Some(match c {
            b'Z' => Primitive::Boolean,
            b'B' => Primitive::Byte,
            b'C' => Primitive::Char,
            b'S' => Primitive::Short,
            b'I' => Primitive::Int,
            b'J' => Primitive::Long,
            b'F' => Primitive::Float,
            b'D' => Primitive::Double,
            b'V' => Primitive::Void,
            _ => return None,
        })
    }

    fn code(self) -> char {
        match self {
            Primitive::Boolean => 'Z',
            Primitive::Byte => 'B',
            Primitive::Char => 'C',
            Primitive::Short => 'S',
            Primitive::Int => 'I',
            Primitive::Long => 'J',
            Primitive::Float => 'F',
            Primitive::Double => 'D',
            Primitive::Void => 'V',
        }
    }
}

/// One typed slot of a method descriptor.
///
/// Array types nest one level per dimension, so `[[I` parses as
/// `Array(Array(Primitive(Int)))` and stays distinguishable from its
/// element type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Primitive(Primitive),
    /// `[` followed by the element type.
    Array(Box<ParamType>),
    /// `L<name>;` - the stored name excludes the `L` and `;`, e.g.
    /// `java/lang/String`.
    Reference(String),
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Primitive(p) => write!(f, "{}", p.code()),
            ParamType::Array(inner) => write!(f, "[{inner}"),
            ParamType::Reference(name) => write!(f, "L{name};"),
        }
    }
}

/// A parsed method descriptor: the ordered parameter types plus the
/// return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub params: Vec<ParamType>,
    pub ret: ParamType,
}

impl MethodDescriptor {
    /// Parse a descriptor string of the form `(ParamType*)ReturnType`.
    ///
    /// Parsing is idempotent: the same input always yields structurally
    /// equal results.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let bytes = descriptor.as_bytes();
        let mut pos = 0usize;

        if bytes.first() != Some(&b'(') {
            return Err(BridgeError::MalformedDescriptor { position: 0 });
        }
        pos += 1;

        let mut params = Vec::new();
        loop {
            match bytes.get(pos) {
                Some(b')') => {
                    pos += 1;
                    break;
                }
                Some(_) => {
                    let start = pos;
                    let param = parse_type(bytes, &mut pos)?;
                    // V is only valid as a return type.
                    if param == ParamType::Primitive(Primitive::Void) {
                        return Err(BridgeError::MalformedDescriptor { position: start });
                    }
                    params.push(param);
                }
                None => return Err(BridgeError::MalformedDescriptor { position: pos }),
            }
        }

        let ret = parse_type(bytes, &mut pos)?;
        if pos != bytes.len() {
            return Err(BridgeError::MalformedDescriptor { position: pos });
        }

        Ok(MethodDescriptor { params, ret })
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for p in &self.params {
            write!(f, "{p}")?;
        }
        write!(f, "){}", self.ret)
    }
}

fn parse_type(bytes: &[u8], pos: &mut usize) -> Result<ParamType> {
    match bytes.get(*pos) {
        Some(b'[') => {
            *pos += 1;
            let start = *pos;
            let inner = parse_type(bytes, pos)?;
            // V cannot appear as an array element at any depth.
            if inner == ParamType::Primitive(Primitive::Void) {
                return Err(BridgeError::MalformedDescriptor { position: start });
            }
            Ok(ParamType::Array(Box::new(inner)))
        }
        Some(b'L') => {
            *pos += 1;
            let start = *pos;
            loop {
                match bytes.get(*pos) {
                    Some(b';') => break,
                    Some(_) => *pos += 1,
                    None => return Err(BridgeError::MalformedDescriptor { position: *pos }),
                }
            }
            // Descriptors are ASCII in practice; the slice between L and ;
            // came from a &str so it is valid UTF-8.
            let name = String::from_utf8_lossy(&bytes[start..*pos]).into_owned();
            *pos += 1; // consume ';'
            Ok(ParamType::Reference(name))
        }
        Some(&c) => match Primitive::from_code(c) {
            Some(p) => {
                *pos += 1;
                Ok(ParamType::Primitive(p))
            }
            None => Err(BridgeError::MalformedDescriptor { position: *pos }),
        },
        None => Err(BridgeError::MalformedDescriptor { position: *pos }),
    }
}
