//! Dynamic runtime values.
//!
//! The operand stack, frame locals, contract storage, and `PUSH`
//! literals all hold [`Value`]s. Arithmetic and comparison dispatch on
//! the pair of variant tags; the conversion rules are:
//!
//! - `Int`/`Uint` arithmetic runs through 128-bit intermediates. The
//!   result is `Uint` when either operand was `Uint` and the result is
//!   non-negative, or when it only fits above `i64::MAX`; it is `Int`
//!   when it fits; anything outside 64 bits is an overflow error.
//! - Any `Float` operand makes the operation a float operation.
//! - `+` concatenates strings, bytes, and lists.
//! - `/` and `%` on integers truncate; a zero divisor is fatal.
//! - Ordering compares numbers across `Int`/`Uint`/`Float`, and
//!   strings, bytes, addresses, and hashes within their own kind.
//! - Equality is numeric across the numeric kinds and structural within
//!   a kind; values of unrelated kinds are simply unequal.
//! - `&&`/`||`/`!` work on truthiness: null and each kind's zero/empty
//!   value are falsy, everything else is truthy.
//!
//! The JSON form (used by the bytecode artifact) maps null, bools,
//! numbers, strings, and lists directly; `bytes`, `address`, `hash`,
//! and `map` values use a single-key `{"$kind": ...}` object, and the
//! `self` marker is `{"$self": true}`. Non-negative integers
//! deserialize as `Int`; equality across `Int`/`Uint` is numeric, so
//! round-trips preserve meaning.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A dynamically typed runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Address(String),
    Hash(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// The opaque marker pushed by `self`; member access on it reads
    /// and writes contract storage.
    SelfRef,
}

/// Errors raised by value operations; the VM wraps these fatally.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Modulo by zero")]
    ModuloByZero,
    #[error("Integer overflow in '{0}'")]
    IntegerOverflow(&'static str),
    #[error("Cannot apply '{op}' to {lhs} and {rhs}")]
    BinaryTypeMismatch {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("Cannot apply '{op}' to {operand}")]
    UnaryTypeMismatch {
        op: &'static str,
        operand: &'static str,
    },
}

/// Numeric view used by the arithmetic and comparison rules.
enum Num {
    Int { value: i128, uint: bool },
    Float(f64),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Address(_) => "address",
            Value::Hash(_) => "hash",
            Value::List(_) => "array",
            Value::Map(_) => "map",
            Value::SelfRef => "self",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Uint(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bytes(b) => !b.is_empty(),
            Value::Address(s) | Value::Hash(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            Value::SelfRef => true,
        }
    }

    fn as_num(&self) -> Option<Num> {
        match self {
            Value::Int(n) => Some(Num::Int {
                value: *n as i128,
                uint: false,
            }),
            Value::Uint(n) => Some(Num::Int {
                value: *n as i128,
                uint: true,
            }),
            Value::Float(f) => Some(Num::Float(*f)),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Uint(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// The key form used when a value indexes a map.
    pub fn as_map_key(&self) -> String {
        match self {
            Value::Str(s) | Value::Address(s) | Value::Hash(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Best-effort coercion of an argument toward a declared parameter
    /// type; values that do not fit pass through unchanged.
    pub fn coerce_to(&self, type_name: &str) -> Value {
        match (type_name, self) {
            ("uint", Value::Int(n)) if *n >= 0 => Value::Uint(*n as u64),
            ("int", Value::Uint(n)) if *n <= i64::MAX as u64 => Value::Int(*n as i64),
            ("float", Value::Int(n)) => Value::Float(*n as f64),
            ("float", Value::Uint(n)) => Value::Float(*n as f64),
            ("address", Value::Str(s)) => Value::Address(s.clone()),
            ("hash", Value::Str(s)) => Value::Hash(s.clone()),
            _ => self.clone(),
        }
    }

    fn int_result(op: &'static str, value: i128, prefer_uint: bool) -> Result<Value, ValueError> {
        if prefer_uint && value >= 0 {
            if value <= u64::MAX as i128 {
                return Ok(Value::Uint(value as u64));
            }
            return Err(ValueError::IntegerOverflow(op));
        }
        if value >= i64::MIN as i128 && value <= i64::MAX as i128 {
            Ok(Value::Int(value as i64))
        } else if value >= 0 && value <= u64::MAX as i128 {
            Ok(Value::Uint(value as u64))
        } else {
            Err(ValueError::IntegerOverflow(op))
        }
    }

    fn binary_mismatch(op: &'static str, lhs: &Value, rhs: &Value) -> ValueError {
        ValueError::BinaryTypeMismatch {
            op,
            lhs: lhs.type_name(),
            rhs: rhs.type_name(),
        }
    }

    fn numeric_op(
        op: &'static str,
        lhs: &Value,
        rhs: &Value,
        int_op: impl Fn(i128, i128) -> i128,
        float_op: impl Fn(f64, f64) -> f64,
    ) -> Result<Value, ValueError> {
        match (lhs.as_num(), rhs.as_num()) {
            (Some(Num::Int { value: a, uint: ua }), Some(Num::Int { value: b, uint: ub })) => {
                Value::int_result(op, int_op(a, b), ua || ub)
            }
            (Some(_), Some(_)) => {
                // at least one float
                let a = lhs.as_f64().unwrap_or(0.0);
                let b = rhs.as_f64().unwrap_or(0.0);
                Ok(Value::Float(float_op(a, b)))
            }
            _ => Err(Value::binary_mismatch(op, lhs, rhs)),
        }
    }

    pub fn add(&self, other: &Value) -> Result<Value, ValueError> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
            (Value::Bytes(a), Value::Bytes(b)) => {
                let mut out = a.clone();
                out.extend_from_slice(b);
                Ok(Value::Bytes(out))
            }
            (Value::List(a), Value::List(b)) => {
                let mut out = a.clone();
                out.extend(b.iter().cloned());
                Ok(Value::List(out))
            }
            _ => Value::numeric_op("+", self, other, |a, b| a + b, |a, b| a + b),
        }
    }

    pub fn sub(&self, other: &Value) -> Result<Value, ValueError> {
        Value::numeric_op("-", self, other, |a, b| a - b, |a, b| a - b)
    }

    pub fn mul(&self, other: &Value) -> Result<Value, ValueError> {
        Value::numeric_op("*", self, other, |a, b| a * b, |a, b| a * b)
    }

    pub fn div(&self, other: &Value) -> Result<Value, ValueError> {
        match (self.as_num(), other.as_num()) {
            (Some(Num::Int { value: a, uint: ua }), Some(Num::Int { value: b, uint: ub })) => {
                if b == 0 {
                    return Err(ValueError::DivisionByZero);
                }
                Value::int_result("/", a / b, ua || ub)
            }
            (Some(_), Some(_)) => {
                let b = other.as_f64().unwrap_or(0.0);
                if b == 0.0 {
                    return Err(ValueError::DivisionByZero);
                }
                Ok(Value::Float(self.as_f64().unwrap_or(0.0) / b))
            }
            _ => Err(Value::binary_mismatch("/", self, other)),
        }
    }

    pub fn rem(&self, other: &Value) -> Result<Value, ValueError> {
        match (self.as_num(), other.as_num()) {
            (Some(Num::Int { value: a, uint: ua }), Some(Num::Int { value: b, uint: ub })) => {
                if b == 0 {
                    return Err(ValueError::ModuloByZero);
                }
                Value::int_result("%", a % b, ua || ub)
            }
            (Some(_), Some(_)) => {
                let b = other.as_f64().unwrap_or(0.0);
                if b == 0.0 {
                    return Err(ValueError::ModuloByZero);
                }
                Ok(Value::Float(self.as_f64().unwrap_or(0.0) % b))
            }
            _ => Err(Value::binary_mismatch("%", self, other)),
        }
    }

    pub fn neg(&self) -> Result<Value, ValueError> {
        match self {
            Value::Int(n) => Value::int_result("-", -(*n as i128), false),
            Value::Uint(n) => Value::int_result("-", -(*n as i128), false),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(ValueError::UnaryTypeMismatch {
                op: "-",
                operand: other.type_name(),
            }),
        }
    }

    pub fn not(&self) -> Value {
        Value::Bool(!self.is_truthy())
    }

    pub fn and(&self, other: &Value) -> Value {
        Value::Bool(self.is_truthy() && other.is_truthy())
    }

    pub fn or(&self, other: &Value) -> Value {
        Value::Bool(self.is_truthy() || other.is_truthy())
    }

    /// Ordering for `<`, `>`, `<=`, `>=`.
    pub fn compare(&self, op: &'static str, other: &Value) -> Result<std::cmp::Ordering, ValueError> {
        use std::cmp::Ordering;
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Ok(a.cmp(b)),
            (Value::Address(a), Value::Address(b)) => Ok(a.cmp(b)),
            (Value::Hash(a), Value::Hash(b)) => Ok(a.cmp(b)),
            _ => match (self.as_num(), other.as_num()) {
                (Some(Num::Int { value: a, .. }), Some(Num::Int { value: b, .. })) => Ok(a.cmp(&b)),
                (Some(_), Some(_)) => {
                    let a = self.as_f64().unwrap_or(0.0);
                    let b = other.as_f64().unwrap_or(0.0);
                    a.partial_cmp(&b).ok_or(ValueError::BinaryTypeMismatch {
                        op,
                        lhs: self.type_name(),
                        rhs: other.type_name(),
                    })
                }
                _ => Err(Value::binary_mismatch(op, self, other)),
            },
        }
    }

    /// The length used by the `len` builtin; `None` for non-container
    /// kinds.
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::Bytes(b) => Some(b.len()),
            Value::List(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Address(a), Value::Address(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::SelfRef, Value::SelfRef) => true,
            _ => match (self.as_num(), other.as_num()) {
                (Some(Num::Int { value: a, .. }), Some(Num::Int { value: b, .. })) => a == b,
                (Some(_), Some(_)) => self.as_f64() == other.as_f64(),
                _ => false,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Uint(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "0x{}", bytes_to_hex(b)),
            Value::Address(s) | Value::Hash(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::SelfRef => write!(f, "self"),
        }
    }
}

pub fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 {
        return Err("odd-length hex string".to_string());
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string()))
        .collect()
}

// ─── Serialization ─────────────────────────────────────────────────

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Uint(n) => serializer.serialize_u64(*n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Bytes(b) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$bytes", &bytes_to_hex(b))?;
                map.end()
            }
            Value::Address(s) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$address", s)?;
                map.end()
            }
            Value::Hash(s) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$hash", s)?;
                map.end()
            }
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$map", entries)?;
                map.end()
            }
            Value::SelfRef => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$self", &true)?;
                map.end()
            }
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a Grishex runtime value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, n: i64) -> Result<Value, E> {
        Ok(Value::Int(n))
    }

    fn visit_u64<E: de::Error>(self, n: u64) -> Result<Value, E> {
        if n <= i64::MAX as u64 {
            Ok(Value::Int(n as i64))
        } else {
            Ok(Value::Uint(n))
        }
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<Value, E> {
        Ok(Value::Float(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(Value::Str(s.to_string()))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut entries: BTreeMap<String, Value> = BTreeMap::new();
        let mut first_key: Option<String> = None;
        while let Some(key) = map.next_key::<String>()? {
            if first_key.is_none() {
                first_key = Some(key.clone());
            }
            match key.as_str() {
                "$bytes" => {
                    let hex: String = map.next_value()?;
                    let bytes = hex_to_bytes(&hex).map_err(de::Error::custom)?;
                    entries.insert(key, Value::Bytes(bytes));
                }
                "$map" => {
                    let inner: BTreeMap<String, Value> = map.next_value()?;
                    entries.insert(key, Value::Map(inner));
                }
                _ => {
                    entries.insert(key, map.next_value()?);
                }
            }
        }
        // A single `$`-tagged entry is a typed value; anything else is
        // a plain map.
        if entries.len() == 1 {
            if let Some(tag) = first_key {
                if tag == "$bytes" || tag == "$map" {
                    if let Some(value) = entries.remove(&tag) {
                        return Ok(value);
                    }
                } else if tag == "$self" {
                    return Ok(Value::SelfRef);
                } else if tag == "$address" || tag == "$hash" {
                    match entries.remove(&tag) {
                        Some(Value::Str(s)) if tag == "$address" => return Ok(Value::Address(s)),
                        Some(Value::Str(s)) => return Ok(Value::Hash(s)),
                        Some(other) => {
                            entries.insert(tag, other);
                        }
                        None => {}
                    }
                }
            }
        }
        Ok(Value::Map(entries))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_arithmetic() {
        assert_eq!(Value::Int(2).add(&Value::Int(3)).unwrap(), Value::Int(5));
        assert_eq!(Value::Int(10).sub(&Value::Int(4)).unwrap(), Value::Int(6));
        assert_eq!(Value::Int(6).mul(&Value::Int(7)).unwrap(), Value::Int(42));
        assert_eq!(Value::Int(7).div(&Value::Int(2)).unwrap(), Value::Int(3));
        assert_eq!(Value::Int(7).rem(&Value::Int(3)).unwrap(), Value::Int(1));
    }

    #[test]
    fn test_uint_propagates() {
        let result = Value::Uint(2).add(&Value::Int(3)).unwrap();
        assert_eq!(result, Value::Uint(5));
        assert_eq!(result.type_name(), "uint");
    }

    #[test]
    fn test_uint_subtraction_can_go_negative() {
        assert_eq!(Value::Uint(2).sub(&Value::Uint(5)).unwrap(), Value::Int(-3));
    }

    #[test]
    fn test_float_contaminates() {
        assert_eq!(
            Value::Int(1).add(&Value::Float(0.5)).unwrap(),
            Value::Float(1.5)
        );
        assert_eq!(
            Value::Int(7).div(&Value::Float(2.0)).unwrap(),
            Value::Float(3.5)
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            Value::Int(1).div(&Value::Int(0)),
            Err(ValueError::DivisionByZero)
        );
        assert_eq!(
            Value::Float(1.0).div(&Value::Int(0)),
            Err(ValueError::DivisionByZero)
        );
        assert_eq!(
            Value::Int(1).rem(&Value::Int(0)),
            Err(ValueError::ModuloByZero)
        );
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert!(matches!(
            Value::Uint(u64::MAX).add(&Value::Uint(u64::MAX)),
            Err(ValueError::IntegerOverflow(_))
        ));
        assert!(matches!(
            Value::Int(i64::MIN).sub(&Value::Uint(u64::MAX)),
            Err(ValueError::IntegerOverflow(_))
        ));
    }

    #[test]
    fn test_int_overflowing_into_uint_range() {
        // i64::MAX + 1 still fits u64, so it promotes instead of failing
        assert_eq!(
            Value::Int(i64::MAX).add(&Value::Int(1)).unwrap(),
            Value::Uint(i64::MAX as u64 + 1)
        );
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(
            Value::Str("foo".into()).add(&Value::Str("bar".into())).unwrap(),
            Value::Str("foobar".into())
        );
    }

    #[test]
    fn test_add_type_mismatch() {
        assert!(matches!(
            Value::Str("a".into()).add(&Value::Int(1)),
            Err(ValueError::BinaryTypeMismatch { op: "+", .. })
        ));
    }

    #[test]
    fn test_negation() {
        assert_eq!(Value::Int(5).neg().unwrap(), Value::Int(-5));
        assert_eq!(Value::Uint(5).neg().unwrap(), Value::Int(-5));
        assert_eq!(Value::Float(2.5).neg().unwrap(), Value::Float(-2.5));
        assert!(Value::Str("x".into()).neg().is_err());
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(Value::Str("x".into()).is_truthy());
        assert!(Value::SelfRef.is_truthy());
        assert_eq!(Value::Int(0).not(), Value::Bool(true));
        assert_eq!(Value::Int(1).and(&Value::Bool(true)), Value::Bool(true));
        assert_eq!(Value::Int(0).or(&Value::Null), Value::Bool(false));
    }

    #[test]
    fn test_numeric_equality_across_kinds() {
        assert_eq!(Value::Int(18), Value::Uint(18));
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert_ne!(Value::Int(1), Value::Str("1".into()));
        assert_ne!(Value::Str("0x00".into()), Value::Address("0x00".into()));
    }

    #[test]
    fn test_ordering() {
        use std::cmp::Ordering;
        assert_eq!(Value::Int(1).compare("<", &Value::Uint(2)).unwrap(), Ordering::Less);
        assert_eq!(
            Value::Str("abc".into()).compare("<", &Value::Str("abd".into())).unwrap(),
            Ordering::Less
        );
        assert!(Value::Int(1).compare("<", &Value::Str("x".into())).is_err());
    }

    #[test]
    fn test_coercion() {
        assert_eq!(Value::Int(5).coerce_to("uint"), Value::Uint(5));
        assert_eq!(Value::Int(-5).coerce_to("uint"), Value::Int(-5));
        assert_eq!(
            Value::Str("0xabc".into()).coerce_to("address"),
            Value::Address("0xabc".into())
        );
        assert_eq!(Value::Int(2).coerce_to("float"), Value::Float(2.0));
        assert_eq!(Value::Str("x".into()).coerce_to("string"), Value::Str("x".into()));
    }

    #[test]
    fn test_length() {
        assert_eq!(Value::Str("abc".into()).length(), Some(3));
        assert_eq!(Value::List(vec![Value::Int(1)]).length(), Some(1));
        assert_eq!(Value::Int(1).length(), None);
    }

    #[test]
    fn test_json_round_trip_primitives() {
        for value in [
            Value::Null,
            Value::Bool(true),
            Value::Int(-7),
            Value::Int(42),
            Value::Float(2.5),
            Value::Str("hello".into()),
            Value::Bytes(vec![0xde, 0xad]),
            Value::Address("0x0000000000000000000000000000000000000000".into()),
            Value::Hash("0x00".into()),
            Value::List(vec![Value::Int(1), Value::Str("x".into())]),
            Value::SelfRef,
        ] {
            let json = serde_json::to_string(&value).unwrap();
            let back: Value = serde_json::from_str(&json).unwrap();
            assert_eq!(back, value, "round-trip of {json}");
        }
    }

    #[test]
    fn test_json_shapes() {
        assert_eq!(serde_json::to_string(&Value::Null).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Value::Int(1)).unwrap(), "1");
        assert_eq!(
            serde_json::to_string(&Value::Bytes(vec![0xa1])).unwrap(),
            r#"{"$bytes":"a1"}"#
        );
        assert_eq!(
            serde_json::to_string(&Value::SelfRef).unwrap(),
            r#"{"$self":true}"#
        );
    }

    #[test]
    fn test_json_map_round_trip() {
        let mut entries = BTreeMap::new();
        entries.insert("a".to_string(), Value::Int(1));
        entries.insert("$bytes".to_string(), Value::Str("not a tag".into()));
        let value = Value::Map(entries);
        let json = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Bytes(vec![0xff, 0x01]).to_string(), "0xff01");
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::Int(2)]).to_string(),
            "[1, 2]"
        );
    }
}
