//! Streaming masking engine for structured JSON log output.
//!
//! This crate sits between whatever produces a JSON event stream and the sink
//! that encodes it, and decides field-by-field and value-by-value whether the
//! real content is replaced by a mask. The document is never materialized:
//! every decision is made from the current ancestor chain as events flow.
//!
//! # Key Features
//!
//! - **Path masking**: absolute (`/user/password`) and partial (`password`)
//!   paths, `*` wildcards, and `~0`/`~1` escaping of literal `~` and `/`.
//! - **Container elision**: a masked field whose real value is an object or
//!   array is replaced by one scalar, and the emitted stream stays well formed.
//! - **Value masking**: regex substitution with capture-group back-references,
//!   chained across maskers.
//! - **Shareable configuration**: a built [`MaskerSet`] is immutable and can be
//!   read by any number of transducers on any number of threads.
//! - **Fail-closed**: masker errors and structural imbalance propagate to the
//!   caller instead of letting a value through unmasked.
//!
//! # Example
//!
//! ```no_run
//! use lm_mask::{mask_str, MaskerSetBuilder};
//!
//! let masks = MaskerSetBuilder::new()
//!     .mask_paths(["password", "/user/ssn"])
//!     .mask_values([r"\d{4}-\d{4}-\d{4}-\d{4}"])
//!     .build()
//!     .unwrap();
//!
//! let out = mask_str(r#"{"user":{"ssn":"123-45-6789"},"password":"hunter2"}"#, &masks).unwrap();
//! assert_eq!(out, r#"{"user":{"ssn":"****"},"password":"****"}"#);
//! ```

pub mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod field;
pub mod path;
pub mod replay;
pub mod sink;
pub mod transducer;
pub mod value_masker;

pub use builder::{MaskerSet, MaskerSetBuilder, MaskerSetStats, DEFAULT_MASK};
pub use config::{MaskingConfig, PathMaskRule, ValueMaskRule};
pub use context::{Frame, FrameKind, StreamContext};
pub use error::{MaskError, Result};
pub use event::{JsonEvent, MaskValue, ScalarValue};
pub use field::{FieldMasker, FieldNameSetMasker, PathBasedFieldMasker};
pub use path::PathPattern;
pub use replay::{emit_value, mask_str, replay_reader, replay_str};
pub use sink::{EventRecorder, JsonSink, JsonWriter};
pub use transducer::MaskingTransducer;
pub use value_masker::{RegexValueMasker, ValueMasker};
