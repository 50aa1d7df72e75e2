//! The streaming masking interceptor.
//!
//! A [`MaskingTransducer`] receives the full event vocabulary in document
//! order, keeps the logical [`StreamContext`] up to date, and forwards,
//! suppresses, or substitutes each event on its way to the wrapped sink.
//!
//! # Suppression budget
//!
//! `mask_depth` counts how much of the output is currently being elided:
//!
//! - `0`: forwarding normally.
//! - `1`: a field was masked at the current object level and its real value
//!   is pending or complete. The next sibling field name or the end of the
//!   enclosing object releases it.
//! - `> 1`: inside a container that belongs to a masked field's real value.
//!
//! A masked scalar value never changes the counter; a masked container raises
//! it on begin and lowers it on end. Either way the field costs exactly one
//! unit, so the transducer never needs to know the real value's shape in
//! advance.

use std::borrow::Cow;

use crate::context::{FrameKind, StreamContext};
use crate::sink::JsonSink;
use crate::{JsonEvent, MaskError, MaskValue, MaskerSet, Result, ScalarValue};

/// Streaming interceptor that masks a document on its way to `sink`.
///
/// One instance handles one event stream; the [`MaskerSet`] it reads is shared.
pub struct MaskingTransducer<'m, S> {
    masks: &'m MaskerSet,
    sink: S,
    context: StreamContext,
    mask_depth: usize,
}

impl<'m, S: JsonSink> MaskingTransducer<'m, S> {
    pub fn new(masks: &'m MaskerSet, sink: S) -> Self {
        Self {
            masks,
            sink,
            context: StreamContext::new(),
            mask_depth: 0,
        }
    }

    /// Current suppression depth; `0` means events are forwarded.
    pub fn mask_depth(&self) -> usize {
        self.mask_depth
    }

    pub fn is_masking(&self) -> bool {
        self.mask_depth > 0
    }

    /// Logical position of the last event.
    pub fn context(&self) -> &StreamContext {
        &self.context
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The wrapped sink. Events written here skip masking and context
    /// tracking entirely.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Process one event.
    pub fn handle(&mut self, event: &JsonEvent) -> Result<()> {
        self.write_event(event)
    }

    /// Process a sequence of events.
    pub fn handle_all<'e, I>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = &'e JsonEvent>,
    {
        for event in events {
            self.handle(event)?;
        }
        Ok(())
    }

    /// Check that the document is complete and flush the sink.
    pub fn finish(&mut self) -> Result<()> {
        if !self.context.is_at_root() {
            return Err(MaskError::unbalanced(format!(
                "document ended with {} open container(s) at {}",
                self.context.depth(),
                self.context.pointer()
            )));
        }
        if self.mask_depth != 0 {
            return Err(MaskError::unbalanced(format!(
                "document ended with mask depth {}",
                self.mask_depth
            )));
        }
        self.sink.flush()
    }

    fn on_begin(&mut self, kind: FrameKind, size_hint: Option<usize>) -> Result<()> {
        match kind {
            FrameKind::Array => self.context.push_array()?,
            _ => self.context.push_object()?,
        }
        if self.mask_depth > 0 {
            self.mask_depth += 1;
            return Ok(());
        }
        match kind {
            FrameKind::Array => self.sink.begin_array(size_hint),
            _ => self.sink.begin_object(size_hint),
        }
    }

    fn on_end(&mut self, kind: FrameKind) -> Result<()> {
        self.context.pop(kind)?;
        if self.mask_depth > 0 {
            self.mask_depth -= 1;
            if self.mask_depth > 0 {
                return Ok(());
            }
        }
        match kind {
            FrameKind::Array => self.sink.end_array(),
            _ => self.sink.end_object(),
        }
    }

    fn on_field_name(&mut self, name: &str) -> Result<()> {
        self.context.set_field_name(name)?;
        match self.mask_depth {
            0 => {}
            // sibling of a masked field: its budget is released
            1 => self.mask_depth = 0,
            _ => return Ok(()),
        }

        self.sink.write_field_name(name)?;
        if let Some(mask) = self.field_mask()? {
            self.sink.write_scalar(&ScalarValue::from(mask))?;
            self.mask_depth = 1;
        }
        Ok(())
    }

    fn on_scalar(&mut self, value: &ScalarValue) -> Result<()> {
        self.context.check_scalar_position()?;
        if self.mask_depth > 0 {
            self.context.complete_value();
            return Ok(());
        }

        let masked = self.value_mask(value)?;
        self.sink.write_scalar(&masked)?;
        self.context.complete_value();
        Ok(())
    }

    fn field_mask(&self) -> Result<Option<MaskValue>> {
        for masker in self.masks.field_maskers() {
            if let Some(mask) = masker.mask(&self.context)? {
                return Ok(Some(mask));
            }
        }
        Ok(None)
    }

    fn value_mask<'v>(&self, value: &'v ScalarValue) -> Result<Cow<'v, ScalarValue>> {
        if value.is_opaque() {
            tracing::trace!(
                kind = value.kind(),
                path = %self.context.pointer(),
                "opaque scalar bypasses value maskers"
            );
            return Ok(Cow::Borrowed(value));
        }
        if !value.is_value_maskable() {
            return Ok(Cow::Borrowed(value));
        }

        let mut current = Cow::Borrowed(value);
        for masker in self.masks.value_maskers() {
            if let Some(mask) = masker.mask(&self.context, &current)? {
                current = Cow::Owned(ScalarValue::from(mask));
            }
        }
        if *current == *value {
            return Ok(Cow::Borrowed(value));
        }
        Ok(current)
    }
}

impl<S: JsonSink> JsonSink for MaskingTransducer<'_, S> {
    fn begin_object(&mut self, size_hint: Option<usize>) -> Result<()> {
        self.on_begin(FrameKind::Object, size_hint)
    }

    fn end_object(&mut self) -> Result<()> {
        self.on_end(FrameKind::Object)
    }

    fn begin_array(&mut self, size_hint: Option<usize>) -> Result<()> {
        self.on_begin(FrameKind::Array, size_hint)
    }

    fn end_array(&mut self) -> Result<()> {
        self.on_end(FrameKind::Array)
    }

    fn write_field_name(&mut self, name: &str) -> Result<()> {
        self.on_field_name(name)
    }

    fn write_scalar(&mut self, value: &ScalarValue) -> Result<()> {
        self.on_scalar(value)
    }

    fn flush(&mut self) -> Result<()> {
        self.sink.flush()
    }
}
