//! Sinks: where approved events go.
//!
//! The masking core only needs the [`JsonSink`] interface. [`JsonWriter`]
//! encodes compact JSON to any `io::Write`; [`EventRecorder`] keeps the events
//! themselves, which is what tests and diagnostics usually want.

use std::io::Write;

use base64::Engine;

use crate::{JsonEvent, Result, ScalarValue};

/// Consumer of the streaming JSON vocabulary.
pub trait JsonSink {
    fn begin_object(&mut self, size_hint: Option<usize>) -> Result<()>;
    fn end_object(&mut self) -> Result<()>;
    fn begin_array(&mut self, size_hint: Option<usize>) -> Result<()>;
    fn end_array(&mut self) -> Result<()>;
    fn write_field_name(&mut self, name: &str) -> Result<()>;
    fn write_scalar(&mut self, value: &ScalarValue) -> Result<()>;
    fn flush(&mut self) -> Result<()>;

    /// Dispatch one event to the matching method.
    fn write_event(&mut self, event: &JsonEvent) -> Result<()> {
        match event {
            JsonEvent::BeginObject { size_hint } => self.begin_object(*size_hint),
            JsonEvent::EndObject => self.end_object(),
            JsonEvent::BeginArray { size_hint } => self.begin_array(*size_hint),
            JsonEvent::EndArray => self.end_array(),
            JsonEvent::FieldName(name) => self.write_field_name(name),
            JsonEvent::Scalar(value) => self.write_scalar(value),
            JsonEvent::Flush => self.flush(),
        }
    }
}

impl<S: JsonSink + ?Sized> JsonSink for &mut S {
    fn begin_object(&mut self, size_hint: Option<usize>) -> Result<()> {
        (**self).begin_object(size_hint)
    }

    fn end_object(&mut self) -> Result<()> {
        (**self).end_object()
    }

    fn begin_array(&mut self, size_hint: Option<usize>) -> Result<()> {
        (**self).begin_array(size_hint)
    }

    fn end_array(&mut self) -> Result<()> {
        (**self).end_array()
    }

    fn write_field_name(&mut self, name: &str) -> Result<()> {
        (**self).write_field_name(name)
    }

    fn write_scalar(&mut self, value: &ScalarValue) -> Result<()> {
        (**self).write_scalar(value)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Compact JSON encoder.
///
/// Root-level values are separated by newlines, so a sequence of documents
/// comes out as JSON Lines.
#[derive(Debug)]
pub struct JsonWriter<W> {
    writer: W,
    // one entry per open container: has it received an element yet?
    started: Vec<bool>,
    after_name: bool,
    root_values: usize,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            started: Vec::new(),
            after_name: false,
            root_values: 0,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn before_value(&mut self) -> Result<()> {
        if self.after_name {
            self.after_name = false;
            return Ok(());
        }
        match self.started.last_mut() {
            Some(started) => {
                if *started {
                    self.writer.write_all(b",")?;
                }
                *started = true;
            }
            None => {
                if self.root_values > 0 {
                    self.writer.write_all(b"\n")?;
                }
                self.root_values += 1;
            }
        }
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> Result<()> {
        serde_json::to_writer(&mut self.writer, s)?;
        Ok(())
    }
}

impl<W: Write> JsonSink for JsonWriter<W> {
    fn begin_object(&mut self, _size_hint: Option<usize>) -> Result<()> {
        self.before_value()?;
        self.writer.write_all(b"{")?;
        self.started.push(false);
        Ok(())
    }

    fn end_object(&mut self) -> Result<()> {
        self.started.pop();
        self.writer.write_all(b"}")?;
        Ok(())
    }

    fn begin_array(&mut self, _size_hint: Option<usize>) -> Result<()> {
        self.before_value()?;
        self.writer.write_all(b"[")?;
        self.started.push(false);
        Ok(())
    }

    fn end_array(&mut self) -> Result<()> {
        self.started.pop();
        self.writer.write_all(b"]")?;
        Ok(())
    }

    fn write_field_name(&mut self, name: &str) -> Result<()> {
        if let Some(started) = self.started.last_mut() {
            if *started {
                self.writer.write_all(b",")?;
            }
            *started = true;
        }
        self.write_str(name)?;
        self.writer.write_all(b":")?;
        self.after_name = true;
        Ok(())
    }

    fn write_scalar(&mut self, value: &ScalarValue) -> Result<()> {
        self.before_value()?;
        match value {
            ScalarValue::String(s) => self.write_str(s)?,
            ScalarValue::Integer(i) => write!(self.writer, "{}", i)?,
            ScalarValue::Float(f) => serde_json::to_writer(&mut self.writer, f)?,
            ScalarValue::BigInteger(s) | ScalarValue::BigDecimal(s) | ScalarValue::Raw(s) => {
                self.writer.write_all(s.as_bytes())?
            }
            ScalarValue::Bool(b) => write!(self.writer, "{}", b)?,
            ScalarValue::Null => self.writer.write_all(b"null")?,
            ScalarValue::Binary(bytes) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
                self.write_str(&encoded)?
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Sink that records every event it receives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventRecorder {
    events: Vec<JsonEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[JsonEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<JsonEvent> {
        self.events
    }

    /// Recorded scalar values, in order.
    pub fn scalars(&self) -> Vec<&ScalarValue> {
        self.events
            .iter()
            .filter_map(|e| match e {
                JsonEvent::Scalar(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    /// Recorded field names, in order.
    pub fn field_names(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                JsonEvent::FieldName(n) => Some(n.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replay the recorded events (minus flushes) into a JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        let mut writer = JsonWriter::new(Vec::new());
        for event in self.events.iter().filter(|e| **e != JsonEvent::Flush) {
            writer.write_event(event)?;
        }
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }
}

impl JsonSink for EventRecorder {
    fn begin_object(&mut self, size_hint: Option<usize>) -> Result<()> {
        self.events.push(JsonEvent::BeginObject { size_hint });
        Ok(())
    }

    fn end_object(&mut self) -> Result<()> {
        self.events.push(JsonEvent::EndObject);
        Ok(())
    }

    fn begin_array(&mut self, size_hint: Option<usize>) -> Result<()> {
        self.events.push(JsonEvent::BeginArray { size_hint });
        Ok(())
    }

    fn end_array(&mut self) -> Result<()> {
        self.events.push(JsonEvent::EndArray);
        Ok(())
    }

    fn write_field_name(&mut self, name: &str) -> Result<()> {
        self.events.push(JsonEvent::FieldName(name.to_string()));
        Ok(())
    }

    fn write_scalar(&mut self, value: &ScalarValue) -> Result<()> {
        self.events.push(JsonEvent::Scalar(value.clone()));
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.events.push(JsonEvent::Flush);
        Ok(())
    }
}
