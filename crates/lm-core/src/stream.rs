//! JSON Lines masking.

use std::io::{BufRead, Write};

use lm_mask::{mask_str, MaskError, MaskerSet};
use thiserror::Error;

/// A masking failure tied to its input line.
#[derive(Error, Debug)]
#[error("line {line}: {error}")]
pub struct LineError {
    /// 1-based line number.
    pub line: usize,
    #[source]
    pub error: MaskError,
}

/// Mask every non-blank line of `reader` as one JSON document and write the
/// results to `writer`, one per line.
///
/// Stops at the first failure; lines before it have already been written.
/// Returns the number of documents masked.
pub fn mask_lines<R: BufRead, W: Write>(
    reader: R,
    mut writer: W,
    masks: &MaskerSet,
) -> Result<usize, LineError> {
    let mut masked = 0;
    let mut last_line = 0;
    for (index, line) in reader.lines().enumerate() {
        last_line = index + 1;
        let fail = |error: MaskError| LineError {
            line: last_line,
            error,
        };

        let line = line.map_err(|e| fail(e.into()))?;
        if line.trim().is_empty() {
            continue;
        }
        let out = mask_str(&line, masks).map_err(fail)?;
        writer
            .write_all(out.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(|e| fail(e.into()))?;
        masked += 1;
    }
    // a failed flush is attributed to the last line read
    writer.flush().map_err(|e| LineError {
        line: last_line,
        error: e.into(),
    })?;
    Ok(masked)
}
