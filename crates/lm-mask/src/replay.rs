//! Producers: turn JSON text or values into sink events.
//!
//! [`replay_str`] and [`replay_reader`] drive a sink straight from the parser
//! through a serde `DeserializeSeed`, so no intermediate tree is built.
//! [`emit_value`] walks an existing `serde_json::Value`.
//!
//! Numbers keep their source text: integers outside `i64` become
//! [`ScalarValue::BigInteger`] and decimals that would not print back the same
//! as an `f64` become [`ScalarValue::BigDecimal`].

use std::fmt;
use std::io;

use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::{JsonSink, JsonWriter, MaskError, MaskerSet, Result, ScalarValue};

/// Emit `value` as events into `sink`.
///
/// Object fields come out in the map's iteration order.
pub fn emit_value<S: JsonSink + ?Sized>(value: &Value, sink: &mut S) -> Result<()> {
    match value {
        Value::Null => sink.write_scalar(&ScalarValue::Null),
        Value::Bool(b) => sink.write_scalar(&ScalarValue::Bool(*b)),
        Value::Number(n) => sink.write_scalar(&number(&n.to_string())),
        Value::String(s) => sink.write_scalar(&ScalarValue::String(s.clone())),
        Value::Array(items) => {
            sink.begin_array(Some(items.len()))?;
            for item in items {
                emit_value(item, sink)?;
            }
            sink.end_array()
        }
        Value::Object(map) => {
            sink.begin_object(Some(map.len()))?;
            for (name, item) in map {
                sink.write_field_name(name)?;
                emit_value(item, sink)?;
            }
            sink.end_object()
        }
    }
}

/// Classify a JSON number literal without losing its text.
fn number(text: &str) -> ScalarValue {
    if let Some(i) = text.parse::<i64>().ok().filter(|i| i.to_string() == text) {
        return ScalarValue::Integer(i);
    }
    if !text.contains(['.', 'e', 'E']) {
        return ScalarValue::BigInteger(text.to_string());
    }
    let float = text
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .filter(|n| n.to_string() == text)
        .and_then(|n| n.as_f64());
    match float {
        Some(f) => ScalarValue::Float(f),
        None => ScalarValue::BigDecimal(text.to_string()),
    }
}

/// Parse one JSON document from `json` and stream it into `sink`.
pub fn replay_str<S: JsonSink + ?Sized>(json: &str, sink: &mut S) -> Result<()> {
    let raw: &RawValue = serde_json::from_str(json)?;
    replay_raw(raw, sink)
}

/// Parse one JSON document from `reader` and stream it into `sink`.
pub fn replay_reader<R: io::Read, S: JsonSink + ?Sized>(reader: R, sink: &mut S) -> Result<()> {
    let raw: Box<RawValue> = serde_json::from_reader(reader)?;
    replay_raw(&raw, sink)
}

/// Mask one JSON document and return it as compact JSON.
pub fn mask_str(json: &str, masks: &MaskerSet) -> Result<String> {
    let mut transducer = masks.transducer(JsonWriter::new(Vec::new()));
    replay_str(json, &mut transducer)?;
    transducer.finish()?;
    let bytes = transducer.into_sink().into_inner();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Stream one already-validated value. Containers are walked by [`Replay`];
/// their members come back here as raw text so numbers keep their literal.
fn replay_raw<S: JsonSink + ?Sized>(raw: &RawValue, sink: &mut S) -> Result<()> {
    let text = raw.get();
    match text.as_bytes().first() {
        Some(b'{') | Some(b'[') => {
            let mut de = serde_json::Deserializer::from_str(text);
            let mut failure = None;
            let outcome = Replay {
                sink,
                failure: &mut failure,
            }
            .deserialize(&mut de);
            // a sink error travels through serde as a string; hand back the original
            if let Some(err) = failure {
                return Err(err);
            }
            outcome?;
            Ok(())
        }
        Some(b'"') => sink.write_scalar(&ScalarValue::String(serde_json::from_str(text)?)),
        _ => {
            let value = match text {
                "null" => ScalarValue::Null,
                "true" => ScalarValue::Bool(true),
                "false" => ScalarValue::Bool(false),
                _ => number(text),
            };
            sink.write_scalar(&value)
        }
    }
}

struct Replay<'a, S: ?Sized> {
    sink: &'a mut S,
    failure: &'a mut Option<MaskError>,
}

impl<S: JsonSink + ?Sized> Replay<'_, S> {
    fn check<E: de::Error>(&mut self, result: Result<()>) -> std::result::Result<(), E> {
        result.map_err(|err| {
            let message = err.to_string();
            *self.failure = Some(err);
            E::custom(message)
        })
    }

    fn member<E: de::Error>(&mut self, raw: &RawValue) -> std::result::Result<(), E> {
        let result = replay_raw(raw, &mut *self.sink);
        self.check(result)
    }
}

impl<'de, S: JsonSink + ?Sized> DeserializeSeed<'de> for Replay<'_, S> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de, S: JsonSink + ?Sized> Visitor<'de> for Replay<'_, S> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object or array")
    }

    fn visit_seq<A: SeqAccess<'de>>(mut self, mut seq: A) -> std::result::Result<(), A::Error> {
        let result = self.sink.begin_array(seq.size_hint());
        self.check(result)?;
        while let Some(raw) = seq.next_element::<&'de RawValue>()? {
            self.member(raw)?;
        }
        let result = self.sink.end_array();
        self.check(result)
    }

    fn visit_map<A: MapAccess<'de>>(mut self, mut map: A) -> std::result::Result<(), A::Error> {
        let result = self.sink.begin_object(map.size_hint());
        self.check(result)?;
        while let Some(name) = map.next_key::<String>()? {
            let result = self.sink.write_field_name(&name);
            self.check(result)?;
            let raw = map.next_value::<&'de RawValue>()?;
            self.member(raw)?;
        }
        let result = self.sink.end_object();
        self.check(result)
    }
}
