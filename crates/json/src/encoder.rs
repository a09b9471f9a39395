//! The encoder chain turning a [`Payload`] into a [`serde_json::Value`].
//!
//! Plain JSON values pass through untouched. Every [`Payload::Object`] is offered to:
//!
//! 1. user encoders, the most recently registered first;
//! 2. the built-in encoder: `chrono` dates and times formatted per configuration, then
//!    [`Encodable::to_json`] when `USE_ENCODE_METHODS` is enabled.
//!
//! The first encoder returning `Some` wins. An object nobody encodes is an
//! [`Error::NotSerializable`].

use crate::config::{JsonConfig, TemporalFormat};
use crate::error::Error;
use crate::payload::{Encodable, Payload};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt::{self, Display, Write};
use tracing::trace;

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// A user supplied encoding step.
///
/// ```
/// # use micro_json::encoder::Encoder;
/// # use serde_json::Value;
/// # use std::any::Any;
/// struct Fake(u32);
///
/// let encoder = |value: &dyn Any| value.downcast_ref::<Fake>().map(|fake| Value::from(format!("fake-{}", fake.0)));
/// # fn assert_encoder(_e: impl Encoder) {}
/// # assert_encoder(encoder);
/// ```
pub trait Encoder: Send + Sync {
    fn encode(&self, value: &dyn Any) -> Option<Value>;
}

impl<F> Encoder for F
where
    F: Fn(&dyn Any) -> Option<Value> + Send + Sync,
{
    fn encode(&self, value: &dyn Any) -> Option<Value> {
        (self)(value)
    }
}

pub struct EncoderChain {
    hooks: Vec<Box<dyn Encoder>>,
    builtin: BuiltinEncoder,
}

impl EncoderChain {
    pub(crate) fn new(config: &JsonConfig, hooks: Vec<Box<dyn Encoder>>) -> Self {
        Self { hooks, builtin: BuiltinEncoder::from_config(config) }
    }

    /// Encodes a payload tree into plain JSON.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotSerializable`] when no encoder handles an object, or with
    /// [`Error::InvalidFormat`] when a configured date/time pattern is not valid strftime.
    pub fn encode(&self, payload: Payload) -> Result<Value, Error> {
        match payload {
            Payload::Value(value) => Ok(value),
            Payload::Map(fields) => {
                let mut map = Map::with_capacity(fields.len());
                for (key, value) in fields {
                    map.insert(key, self.encode(value)?);
                }
                Ok(Value::Object(map))
            }
            Payload::List(items) => {
                let values = items.into_iter().map(|item| self.encode(item)).collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(values))
            }
            Payload::Object(object) => self.encode_object(object.as_ref()),
        }
    }

    fn encode_object(&self, object: &dyn Encodable) -> Result<Value, Error> {
        let any: &dyn Any = object;

        if let Some(value) = self.hooks.iter().rev().find_map(|hook| hook.encode(any)) {
            return Ok(value);
        }

        if let Some(value) = self.builtin.encode(object)? {
            return Ok(value);
        }

        trace!(type_name = object.type_name(), "no encoder accepted the value");
        Err(Error::NotSerializable { type_name: object.type_name() })
    }

    pub fn hooks_len(&self) -> usize {
        self.hooks.len()
    }
}

impl fmt::Debug for EncoderChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderChain").field("hooks", &self.hooks.len()).field("builtin", &self.builtin).finish()
    }
}

#[derive(Debug, Clone)]
struct BuiltinEncoder {
    date_format: Option<TemporalFormat>,
    time_format: Option<TemporalFormat>,
    datetime_format: Option<TemporalFormat>,
    use_encode_methods: bool,
}

impl BuiltinEncoder {
    fn from_config(config: &JsonConfig) -> Self {
        Self {
            date_format: config.date_format().cloned(),
            time_format: config.time_format().cloned(),
            datetime_format: config.datetime_format().cloned(),
            use_encode_methods: config.use_encode_methods(),
        }
    }

    fn encode(&self, object: &dyn Encodable) -> Result<Option<Value>, Error> {
        let any: &dyn Any = object;

        let text = if let Some(datetime) = any.downcast_ref::<DateTime<FixedOffset>>() {
            self.datetime(datetime.to_rfc3339(), datetime.with_timezone(&Utc), |pattern| datetime.format(pattern))?
        } else if let Some(datetime) = any.downcast_ref::<DateTime<Utc>>() {
            self.datetime(datetime.to_rfc3339(), *datetime, |pattern| datetime.format(pattern))?
        } else if let Some(datetime) = any.downcast_ref::<NaiveDateTime>() {
            let iso = datetime.format("%Y-%m-%dT%H:%M:%S%.f").to_string();
            self.datetime(iso, datetime.and_utc(), |pattern| datetime.format(pattern))?
        } else if let Some(date) = any.downcast_ref::<NaiveDate>() {
            match &self.date_format {
                Some(TemporalFormat::Iso) => date.format("%Y-%m-%d").to_string(),
                Some(TemporalFormat::Pattern(pattern)) => render(date.format(pattern), "date", pattern)?,
                None => date.format("%a, %d %b %Y 00:00:00 GMT").to_string(),
            }
        } else if let Some(time) = any.downcast_ref::<NaiveTime>() {
            match &self.time_format {
                Some(TemporalFormat::Pattern(pattern)) => render(time.format(pattern), "time", pattern)?,
                Some(TemporalFormat::Iso) | None => time.format("%H:%M:%S%.f").to_string(),
            }
        } else if self.use_encode_methods {
            return Ok(object.to_json());
        } else {
            return Ok(None);
        };

        Ok(Some(Value::String(text)))
    }

    fn datetime<'a, D: Display>(
        &'a self,
        iso: String,
        utc: DateTime<Utc>,
        format: impl FnOnce(&'a str) -> D,
    ) -> Result<String, Error> {
        match &self.datetime_format {
            Some(TemporalFormat::Iso) => Ok(iso),
            Some(TemporalFormat::Pattern(pattern)) => render(format(pattern), "datetime", pattern),
            None => Ok(utc.format(HTTP_DATE).to_string()),
        }
    }
}

fn render(formatted: impl Display, kind: &'static str, pattern: &str) -> Result<String, Error> {
    let mut out = String::new();
    write!(out, "{formatted}").map_err(|fmt::Error| Error::InvalidFormat { kind, pattern: pattern.to_owned() })?;
    Ok(out)
}
