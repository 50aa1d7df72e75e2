//! Position tracking for the document being streamed.
//!
//! A [`StreamContext`] is a stack of frames, one per open container plus the
//! root. It follows the logical (pre-masking) document: frames are pushed and
//! popped for suppressed containers too, so path matching keeps seeing the
//! real position while output is elided.

use crate::{MaskError, Result};

/// Kind of a context frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Root,
    Object,
    Array,
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FrameKind::Root => "root",
            FrameKind::Object => "object",
            FrameKind::Array => "array",
        };
        write!(f, "{}", s)
    }
}

/// One level of ancestry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    kind: FrameKind,
    current_name: Option<String>,
    current_index: Option<usize>,
}

impl Frame {
    fn root() -> Self {
        Self {
            kind: FrameKind::Root,
            current_name: None,
            current_index: None,
        }
    }

    fn object() -> Self {
        Self {
            kind: FrameKind::Object,
            current_name: None,
            current_index: None,
        }
    }

    fn array() -> Self {
        Self {
            kind: FrameKind::Array,
            current_name: None,
            current_index: Some(0),
        }
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Name of the field whose value is in progress in this object frame.
    pub fn current_name(&self) -> Option<&str> {
        self.current_name.as_deref()
    }

    /// Index of the element in progress in this array frame.
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn is_root(&self) -> bool {
        self.kind == FrameKind::Root
    }

    /// Whether the frame currently addresses a field or an element.
    pub fn has_position(&self) -> bool {
        self.current_name.is_some() || self.current_index.is_some()
    }
}

/// Stack-shaped representation of "where we are" in the document.
#[derive(Debug, Clone)]
pub struct StreamContext {
    // frames[0] is always the root
    frames: Vec<Frame>,
}

impl Default for StreamContext {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamContext {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::root()],
        }
    }

    /// The innermost frame.
    pub fn current(&self) -> &Frame {
        // the root frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    /// The frame enclosing the current one, if any.
    pub fn parent(&self) -> Option<&Frame> {
        self.frames.len().checked_sub(2).map(|i| &self.frames[i])
    }

    /// Frames from the current one toward the root.
    pub fn ancestors(&self) -> impl Iterator<Item = &Frame> + '_ {
        self.frames.iter().rev()
    }

    /// Number of open containers.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn is_at_root(&self) -> bool {
        self.frames.len() == 1
    }

    /// Name of the field in progress in the current frame.
    pub fn current_name(&self) -> Option<&str> {
        self.current().current_name()
    }

    /// Renders the logical position as a JSON-pointer-like string.
    pub fn pointer(&self) -> String {
        let mut out = String::new();
        for frame in self.frames.iter().skip(1) {
            if let Some(name) = frame.current_name() {
                out.push('/');
                out.push_str(&name.replace('~', "~0").replace('/', "~1"));
            } else if let Some(index) = frame.current_index() {
                out.push('/');
                out.push_str(&index.to_string());
            }
        }
        out
    }

    pub(crate) fn push_object(&mut self) -> Result<()> {
        self.check_value_position("begin_object")?;
        self.frames.push(Frame::object());
        Ok(())
    }

    pub(crate) fn push_array(&mut self) -> Result<()> {
        self.check_value_position("begin_array")?;
        self.frames.push(Frame::array());
        Ok(())
    }

    pub(crate) fn pop(&mut self, kind: FrameKind) -> Result<()> {
        let current = self.current();
        if current.is_root() {
            return Err(MaskError::unbalanced(format!(
                "end_{} with no open container",
                kind
            )));
        }
        if current.kind != kind {
            return Err(MaskError::unbalanced(format!(
                "end_{} closes an open {}",
                kind, current.kind
            )));
        }
        if kind == FrameKind::Object && current.current_name.is_some() {
            return Err(MaskError::unbalanced(
                "end_object while a field value is pending",
            ));
        }
        self.frames.pop();
        self.complete_value();
        Ok(())
    }

    pub(crate) fn set_field_name(&mut self, name: &str) -> Result<()> {
        let len = self.frames.len();
        let frame = &mut self.frames[len - 1];
        if frame.kind != FrameKind::Object {
            return Err(MaskError::unbalanced(format!(
                "field name {:?} outside an object (in {})",
                name, frame.kind
            )));
        }
        if frame.current_name.is_some() {
            return Err(MaskError::unbalanced(format!(
                "field name {:?} while a previous field value is pending",
                name
            )));
        }
        frame.current_name = Some(name.to_string());
        Ok(())
    }

    pub(crate) fn check_scalar_position(&self) -> Result<()> {
        self.check_value_position("scalar")
    }

    /// Marks the value in progress in the current frame as complete.
    pub(crate) fn complete_value(&mut self) {
        let len = self.frames.len();
        let frame = &mut self.frames[len - 1];
        match frame.kind {
            FrameKind::Object => frame.current_name = None,
            FrameKind::Array => {
                frame.current_index = frame.current_index.map(|i| i + 1);
            }
            FrameKind::Root => {}
        }
    }

    fn check_value_position(&self, what: &str) -> Result<()> {
        let frame = self.current();
        if frame.kind == FrameKind::Object && frame.current_name.is_none() {
            return Err(MaskError::unbalanced(format!(
                "{} inside an object without a field name",
                what
            )));
        }
        Ok(())
    }
}
