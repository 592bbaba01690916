// Copyright © 2024 Pathway

use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};
use std::hash::Hash;
use std::mem::{align_of, size_of};
use std::sync::Arc;

use super::batch::IdDict;
use super::error::DataError;

use arcstr::ArcStr;
use base64::engine::general_purpose::STANDARD as base64encoder;
use base64::Engine as _;
use itertools::Itertools as _;
use ordered_float::OrderedFloat;
use serde_json::Value as JsonValue;
use xxhash_rust::xxh3::Xxh3 as Hasher;

const BASE32_ALPHABET: base32::Alphabet = base32::Alphabet::Crockford;

pub type KeyImpl = u128;

/// Stable identifier computed from a sequence of values.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(pub KeyImpl);

impl Key {
    pub fn for_values(values: &[Value]) -> Self {
        let mut hasher = Hasher::default();
        values.hash_into(&mut hasher);
        Self(hasher.digest128())
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let encoded = base32::encode(BASE32_ALPHABET, &self.0.to_le_bytes());
        write!(f, "^{encoded}")
    }
}

impl Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// A single batch identifier value.
///
/// `Bool`, `Int` and `Float` are compared by their numeric value, so
/// `Int(2)` sorts after `Float(1.5)` and `Bool(true)` equals `Int(1)`.
/// Values of other kinds are ordered by kind first: `None`, numbers,
/// strings, bytes, tuples, dictionaries.
#[derive(Clone, Debug)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    String(ArcStr),
    Bytes(Arc<[u8]>),
    Tuple(Arc<[Self]>),
    Dict(Arc<IdDict>),
}

const _: () = assert!(align_of::<Value>() <= 16);
const _: () = assert!(size_of::<Value>() <= 32);

/// Numeric view of `Bool`, `Int` and `Float`. Integral floats are
/// normalized to `Int`, so equal numbers share one representation.
#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(OrderedFloat<f64>),
}

// 2^63, the first float above every `i64`
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

impl Number {
    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    fn from_float(f: f64) -> Self {
        if f.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&f) {
            Self::Int(f as i64)
        } else {
            Self::Float(OrderedFloat(f))
        }
    }

    fn compare(self, other: Self) -> Ordering {
        match (self, other) {
            (Self::Int(lhs), Self::Int(rhs)) => lhs.cmp(&rhs),
            (Self::Float(lhs), Self::Float(rhs)) => lhs.cmp(&rhs),
            (Self::Int(lhs), Self::Float(rhs)) => cmp_int_float(lhs, rhs.0),
            (Self::Float(lhs), Self::Int(rhs)) => cmp_int_float(rhs, lhs.0).reverse(),
        }
    }
}

/// Exact comparison, without rounding the integer to a float. NaN is
/// greater than any integer, as in `OrderedFloat`.
#[allow(clippy::cast_possible_truncation)]
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() || f >= I64_BOUND {
        return Ordering::Less;
    }
    if f < -I64_BOUND {
        return Ordering::Greater;
    }
    let whole = f.trunc() as i64;
    i.cmp(&whole)
        .then_with(|| 0.0_f64.partial_cmp(&f.fract()).unwrap_or(Ordering::Equal))
}

impl Value {
    fn number(&self) -> Option<Number> {
        match self {
            Self::Bool(b) => Some(Number::Int(i64::from(*b))),
            Self::Int(i) => Some(Number::Int(*i)),
            Self::Float(f) => Some(Number::from_float(f.0)),
            _ => None,
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Bool(_) | Self::Int(_) | Self::Float(_) => 1,
            Self::String(_) => 2,
            Self::Bytes(_) => 3,
            Self::Tuple(_) => 4,
            Self::Dict(_) => 5,
        }
    }

    pub fn as_tuple(&self) -> Result<&Arc<[Self]>, DataError> {
        if let Self::Tuple(t) = self {
            Ok(t)
        } else {
            Err(DataError::TypeMismatch {
                expected: "tuple",
                value: self.clone(),
            })
        }
    }

    pub fn as_dict(&self) -> Result<&IdDict, DataError> {
        if let Self::Dict(d) = self {
            Ok(d)
        } else {
            Err(DataError::TypeMismatch {
                expected: "dictionary",
                value: self.clone(),
            })
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::None => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(i) => JsonValue::from(*i),
            Self::Float(OrderedFloat(f)) => {
                serde_json::Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number)
            }
            Self::String(s) => JsonValue::String(s.to_string()),
            Self::Bytes(b) => JsonValue::String(base64encoder.encode(b)),
            Self::Tuple(vals) => JsonValue::Array(vals.iter().map(Self::to_json).collect()),
            Self::Dict(dict) => dict.to_json(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        if let (Some(lhs), Some(rhs)) = (self.number(), other.number()) {
            return lhs.compare(rhs);
        }
        match (self, other) {
            (Self::String(lhs), Self::String(rhs)) => lhs.cmp(rhs),
            (Self::Bytes(lhs), Self::Bytes(rhs)) => lhs.cmp(rhs),
            (Self::Tuple(lhs), Self::Tuple(rhs)) => lhs.cmp(rhs),
            (Self::Dict(lhs), Self::Dict(rhs)) => lhs.cmp(rhs),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

impl Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.kind_rank().hash(state);
        match self {
            Self::None => {}
            Self::Bool(_) | Self::Int(_) | Self::Float(_) => match self.number() {
                Some(Number::Int(i)) => i.hash(state),
                Some(Number::Float(f)) => f.hash(state),
                None => {}
            },
            Self::String(s) => s.hash(state),
            Self::Bytes(b) => b.hash(state),
            Self::Tuple(vals) => vals.hash(state),
            Self::Dict(dict) => dict.hash(state),
        }
    }
}

impl Display for Value {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::None => write!(fmt, "None"),
            Self::Bool(b) => write!(fmt, "{}", if *b { "True" } else { "False" }),
            Self::Int(i) => write!(fmt, "{i}"),
            Self::Float(OrderedFloat(f)) => write!(fmt, "{f:?}"),
            Self::String(s) => write!(fmt, "{s:?}"),
            Self::Bytes(b) => write!(fmt, "{b:?}"),
            Self::Tuple(vals) => write!(fmt, "({})", vals.iter().format(", ")),
            Self::Dict(dict) => write!(fmt, "{dict}"),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(OrderedFloat(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.into())
    }
}

impl From<IdDict> for Value {
    fn from(dict: IdDict) -> Self {
        Self::Dict(Arc::new(dict))
    }
}

/// Nested objects become dictionaries and arrays become tuples, recursively.
impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::None,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::None, Self::from),
            },
            JsonValue::String(s) => Self::String(s.into()),
            JsonValue::Array(items) => Self::Tuple(items.into_iter().map(Self::from).collect()),
            JsonValue::Object(map) => Self::from(IdDict::from(map)),
        }
    }
}

/// Feeds a value into the digest behind [`Key`]. Values that compare equal
/// produce the same digest.
pub trait HashInto {
    fn hash_into(&self, hasher: &mut Hasher);
}

impl HashInto for u8 {
    fn hash_into(&self, hasher: &mut Hasher) {
        hasher.update(&[*self]);
    }
}

impl HashInto for u64 {
    fn hash_into(&self, hasher: &mut Hasher) {
        hasher.update(&self.to_le_bytes());
    }
}

impl HashInto for i64 {
    fn hash_into(&self, hasher: &mut Hasher) {
        hasher.update(&self.to_le_bytes());
    }
}

impl HashInto for usize {
    fn hash_into(&self, hasher: &mut Hasher) {
        (*self as u64).hash_into(hasher);
    }
}

impl HashInto for f64 {
    fn hash_into(&self, hasher: &mut Hasher) {
        // integral floats never get here, see `Number::from_float`
        let raw = if self.is_nan() { !0 } else { self.to_bits() };
        raw.hash_into(hasher);
    }
}

impl HashInto for str {
    fn hash_into(&self, hasher: &mut Hasher) {
        self.len().hash_into(hasher);
        hasher.update(self.as_bytes());
    }
}

impl HashInto for ArcStr {
    fn hash_into(&self, hasher: &mut Hasher) {
        self.as_str().hash_into(hasher);
    }
}

impl<T: HashInto> HashInto for [T] {
    fn hash_into(&self, hasher: &mut Hasher) {
        self.len().hash_into(hasher);
        self.iter().for_each(|x| x.hash_into(hasher));
    }
}

impl HashInto for Value {
    fn hash_into(&self, hasher: &mut Hasher) {
        self.kind_rank().hash_into(hasher);
        match self {
            Self::None => {}
            Self::Bool(_) | Self::Int(_) | Self::Float(_) => match self.number() {
                Some(Number::Int(i)) => i.hash_into(hasher),
                Some(Number::Float(f)) => f.0.hash_into(hasher),
                None => {}
            },
            Self::String(s) => s.hash_into(hasher),
            Self::Bytes(b) => b.hash_into(hasher),
            Self::Tuple(vals) => vals.hash_into(hasher),
            Self::Dict(dict) => dict.hash_into(hasher),
        }
    }
}
