//! The JSON payload model.
//!
//! A [`Payload`] is what a handler wants to put in a response body before status-field
//! injection and encoding. Most of it is plain [`serde_json::Value`], but payloads may also
//! carry values which only the [`EncoderChain`](crate::encoder::EncoderChain) knows how to turn
//! into JSON: dates and times, whose format depends on configuration, and user types wrapped
//! with [`Payload::object`].

use crate::error::Error;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::fmt;

/// Insertion ordered JSON object fields.
pub type Fields = IndexMap<String, Payload>;

/// A value which is encoded to JSON by the encoder chain rather than by serde directly.
///
/// Implementors may provide their own JSON representation through [`Encodable::to_json`].
/// It is only consulted when `USE_ENCODE_METHODS` is enabled, after user encoders and the
/// built-in date/time encoder had their turn.
///
/// ```
/// # use micro_json::Encodable;
/// # use serde_json::{json, Value};
/// struct Point(i32, i32);
///
/// impl Encodable for Point {
///     fn to_json(&self) -> Option<Value> {
///         Some(json!([self.0, self.1]))
///     }
/// }
/// ```
pub trait Encodable: Any + Send + Sync {
    fn to_json(&self) -> Option<Value> {
        None
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl Encodable for NaiveDate {}
impl Encodable for NaiveTime {}
impl Encodable for NaiveDateTime {}
impl Encodable for DateTime<Utc> {}
impl Encodable for DateTime<FixedOffset> {}

pub enum Payload {
    Value(Value),
    Map(Fields),
    List(Vec<Payload>),
    Object(Box<dyn Encodable>),
}

impl Payload {
    /// An empty JSON object.
    pub fn empty() -> Self {
        Payload::Map(Fields::new())
    }

    pub fn object<T: Encodable>(value: T) -> Self {
        Payload::Object(Box::new(value))
    }

    /// Converts anything serde can serialize.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] when serialization fails, e.g. for maps with non-string keys.
    pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, Error> {
        Ok(Payload::Value(serde_json::to_value(value)?))
    }

    /// Whether the payload is a JSON object, i.e. status-field injection applies to it.
    pub fn is_map(&self) -> bool {
        matches!(self, Payload::Map(_) | Payload::Value(Value::Object(_)))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Payload::Value(Value::Null))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::Value(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Splits a mapping payload into its fields, or gives the payload back unchanged.
    pub(crate) fn into_fields(self) -> Result<Fields, Self> {
        match self {
            Payload::Map(fields) => Ok(fields),
            Payload::Value(Value::Object(map)) => Ok(map.into_iter().map(|(k, v)| (k, Payload::Value(v))).collect()),
            other => Err(other),
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Payload::Map(fields) => f.debug_tuple("Map").field(fields).finish(),
            Payload::List(items) => f.debug_tuple("List").field(items).finish(),
            Payload::Object(object) => f.debug_tuple("Object").field(&object.type_name()).finish(),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Value(value)
    }
}

impl From<Fields> for Payload {
    fn from(fields: Fields) -> Self {
        Payload::Map(fields)
    }
}

impl From<Vec<Payload>> for Payload {
    fn from(items: Vec<Payload>) -> Self {
        Payload::List(items)
    }
}

impl From<Box<dyn Encodable>> for Payload {
    fn from(object: Box<dyn Encodable>) -> Self {
        Payload::Object(object)
    }
}

macro_rules! impl_payload_from_value {
    ($($ty:ty)*) => {
        $(
        impl From<$ty> for Payload {
            #[inline]
            fn from(value: $ty) -> Self {
                Payload::Value(Value::from(value))
            }
        }
        )*
    };
}

impl_payload_from_value! { String &str bool i8 i16 i32 i64 isize u8 u16 u32 u64 usize f32 f64 }

macro_rules! impl_payload_from_encodable {
    ($($ty:ty)*) => {
        $(
        impl From<$ty> for Payload {
            #[inline]
            fn from(value: $ty) -> Self {
                Payload::object(value)
            }
        }
        )*
    };
}

impl_payload_from_encodable! { NaiveDate NaiveTime NaiveDateTime DateTime<Utc> DateTime<FixedOffset> }

impl<T: Into<Payload>> From<Option<T>> for Payload {
    fn from(value: Option<T>) -> Self {
        value.map_or(Payload::Value(Value::Null), Into::into)
    }
}
