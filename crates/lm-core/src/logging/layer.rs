//! Tracing layers that mask log fields before they are written.
//!
//! [`MaskingJsonlLayer`] streams each event as one JSON object through a
//! [`MaskingTransducer`](lm_mask::MaskingTransducer), so log fields obey the
//! same path and value rules as any other document. The `ts`, `level` and
//! `target` envelope is written unmasked. [`MaskingFields`] does the same for
//! the human-readable `fmt` layer.
//!
//! Both render event fields under a `fields` object, so `/fields/password`
//! addresses the same field in either format. A line is only written once the
//! whole event has masked successfully; on failure it is dropped.

use std::fmt::{self, Write as _};
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use lm_mask::{EventRecorder, JsonEvent, JsonSink, JsonWriter, MaskerSet, ScalarValue};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::field::RecordFields;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::FormatFields;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Collects tracing field values as scalars, in recording order.
#[derive(Debug, Default)]
struct FieldCollector {
    fields: Vec<(String, ScalarValue)>,
}

impl FieldCollector {
    fn push(&mut self, field: &Field, value: ScalarValue) {
        self.fields.push((field.name().to_string(), value));
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, ScalarValue::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, ScalarValue::String(format!("{:?}", value)));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, ScalarValue::Integer(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, ScalarValue::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, ScalarValue::Float(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, ScalarValue::Bool(value));
    }
}

/// Span fields kept in the span's extensions.
#[derive(Debug, Clone, Default)]
struct SpanFields(Vec<(String, ScalarValue)>);

impl SpanFields {
    fn merge(&mut self, update: Vec<(String, ScalarValue)>) {
        for (name, value) in update {
            match self.0.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = value,
                None => self.0.push((name, value)),
            }
        }
    }
}

fn write_fields<S: JsonSink>(sink: &mut S, fields: &[(String, ScalarValue)]) -> lm_mask::Result<()> {
    sink.begin_object(Some(fields.len()))?;
    for (name, value) in fields {
        sink.write_field_name(name)?;
        sink.write_scalar(value)?;
    }
    sink.end_object()
}

/// Mask a flat list of fields as the document `{"fields":{...}}`.
///
/// Returns the surviving `(name, value)` pairs. When the whole `fields`
/// object is masked, the result is the single pair `("fields", mask)`.
pub fn mask_fields(
    masks: &MaskerSet,
    fields: &[(String, ScalarValue)],
) -> lm_mask::Result<Vec<(String, ScalarValue)>> {
    let mut out = masks.transducer(EventRecorder::new());
    out.begin_object(Some(1))?;
    out.write_field_name("fields")?;
    write_fields(&mut out, fields)?;
    out.end_object()?;
    out.finish()?;

    let mut masked = Vec::with_capacity(fields.len());
    let mut pending = None;
    for event in out.into_sink().into_events() {
        match event {
            JsonEvent::FieldName(name) => pending = Some(name),
            JsonEvent::Scalar(value) => {
                if let Some(name) = pending.take() {
                    masked.push((name, value));
                }
            }
            _ => pending = None,
        }
    }
    Ok(masked)
}

/// JSONL tracing layer that masks every line.
pub struct MaskingJsonlLayer<W = io::Stderr> {
    writer: Mutex<W>,
    masks: Arc<MaskerSet>,
    dropped: Arc<AtomicU64>,
}

impl MaskingJsonlLayer<io::Stderr> {
    /// Create a layer writing to stderr.
    pub fn stderr(masks: Arc<MaskerSet>) -> Self {
        Self::new(io::stderr(), masks)
    }
}

impl<W: Write> MaskingJsonlLayer<W> {
    pub fn new(writer: W, masks: Arc<MaskerSet>) -> Self {
        MaskingJsonlLayer {
            writer: Mutex::new(writer),
            masks,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Counter of events dropped because masking failed.
    pub fn dropped_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.dropped)
    }

    fn render_line(
        &self,
        metadata: &Metadata<'_>,
        fields: &[(String, ScalarValue)],
        spans: &[(&'static str, Vec<(String, ScalarValue)>)],
    ) -> lm_mask::Result<Vec<u8>> {
        let mut out = self.masks.transducer(JsonWriter::new(Vec::new()));
        out.begin_object(None)?;
        // envelope goes straight to the writer; only fields and spans are masked
        let envelope = out.sink_mut();
        envelope.write_field_name("ts")?;
        envelope.write_scalar(&ScalarValue::String(Utc::now().to_rfc3339()))?;
        envelope.write_field_name("level")?;
        envelope.write_scalar(&ScalarValue::String(
            metadata.level().as_str().to_ascii_lowercase(),
        ))?;
        envelope.write_field_name("target")?;
        envelope.write_scalar(&ScalarValue::from(metadata.target()))?;
        out.write_field_name("fields")?;
        write_fields(&mut out, fields)?;

        if !spans.is_empty() {
            out.write_field_name("spans")?;
            out.begin_array(Some(spans.len()))?;
            for (name, span_fields) in spans {
                out.begin_object(Some(2))?;
                out.write_field_name("name")?;
                out.write_scalar(&ScalarValue::from(*name))?;
                out.write_field_name("fields")?;
                write_fields(&mut out, span_fields)?;
                out.end_object()?;
            }
            out.end_array()?;
        }

        out.end_object()?;
        out.finish()?;
        let mut line = out.into_sink().into_inner();
        line.push(b'\n');
        Ok(line)
    }
}

impl<S, W> Layer<S> for MaskingJsonlLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: Write + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = FieldCollector::default();
        attrs.record(&mut visitor);

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFields(visitor.fields));
        }
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let mut visitor = FieldCollector::default();
        values.record(&mut visitor);

        if let Some(span) = ctx.span(id) {
            let mut extensions = span.extensions_mut();
            match extensions.get_mut::<SpanFields>() {
                Some(existing) => existing.merge(visitor.fields),
                None => extensions.insert(SpanFields(visitor.fields)),
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = FieldCollector::default();
        event.record(&mut visitor);

        let mut spans = Vec::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                let fields = span
                    .extensions()
                    .get::<SpanFields>()
                    .map(|f| f.0.clone())
                    .unwrap_or_default();
                spans.push((span.name(), fields));
            }
        }

        match self.render_line(event.metadata(), &visitor.fields, &spans) {
            Ok(line) => {
                if let Ok(mut writer) = self.writer.lock() {
                    let _ = writer.write_all(&line);
                }
            }
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Field formatter for the `fmt` layer that masks before formatting.
///
/// The `message` field is written bare; other fields as `name=value`.
#[derive(Debug, Clone)]
pub struct MaskingFields {
    masks: Arc<MaskerSet>,
}

impl MaskingFields {
    pub fn new(masks: Arc<MaskerSet>) -> Self {
        Self { masks }
    }
}

impl<'writer> FormatFields<'writer> for MaskingFields {
    fn format_fields<R: RecordFields>(&self, mut writer: Writer<'writer>, fields: R) -> fmt::Result {
        let mut visitor = FieldCollector::default();
        fields.record(&mut visitor);
        let masked = mask_fields(&self.masks, &visitor.fields).map_err(|_| fmt::Error)?;

        for (i, (name, value)) in masked.iter().enumerate() {
            if i > 0 {
                writer.write_char(' ')?;
            }
            match value {
                ScalarValue::String(s) if name == "message" => writer.write_str(s)?,
                _ => {
                    write!(writer, "{}=", name)?;
                    write_human(&mut writer, value)?;
                }
            }
        }
        Ok(())
    }
}

fn write_human(writer: &mut Writer<'_>, value: &ScalarValue) -> fmt::Result {
    match value {
        ScalarValue::String(s) => write!(writer, "{:?}", s),
        ScalarValue::Integer(i) => write!(writer, "{}", i),
        ScalarValue::Float(f) => write!(writer, "{}", f),
        ScalarValue::BigInteger(s) | ScalarValue::BigDecimal(s) | ScalarValue::Raw(s) => {
            writer.write_str(s)
        }
        ScalarValue::Bool(b) => write!(writer, "{}", b),
        ScalarValue::Null => writer.write_str("null"),
        ScalarValue::Binary(bytes) => write!(writer, "<{} bytes>", bytes.len()),
    }
}
