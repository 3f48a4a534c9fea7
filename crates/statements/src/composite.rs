//! Composite-key reconstruction.
//!
//! Multi-segment policy numbers (e.g. `02-14-000123-5`) are flattened by OCR
//! so that every row's first segment appears together, then every second
//! segment, and so on. With `k` segments and `n` rows the token run has
//! `k * n` entries; row `i` is rebuilt by taking position `i` from each of the
//! `k` equal slices.
//!
//! The zip assumes the extraction preserved row order within every slice.
//! Nothing here can verify that; a miscount is rejected outright rather than
//! guessed at.

use std::fmt;

use serde::Deserialize;

use crate::lines::is_digits;

/// Segment layout of a composite policy number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompositeKey {
    /// Zero-pad width per segment; `0` leaves the segment as printed.
    #[serde(rename = "segment_widths")]
    pub widths: Vec<usize>,
    #[serde(rename = "segment_separator")]
    pub separator: String,
}

impl Default for CompositeKey {
    fn default() -> Self {
        Self {
            widths: vec![2, 2, 6, 0],
            separator: "-".to_string(),
        }
    }
}

/// Token count that cannot be split into `segments` equal runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unreconstructable {
    pub tokens: usize,
    pub segments: usize,
}

impl fmt::Display for Unreconstructable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} policy tokens is not a positive multiple of {} segments",
            self.tokens, self.segments
        )
    }
}

impl CompositeKey {
    pub fn segments(&self) -> usize {
        self.widths.len()
    }

    /// Rebuild identifiers from a flattened token run.
    ///
    /// Non-digit tokens are discarded first. The remaining count must be a
    /// positive multiple of the segment count, otherwise no identifiers are
    /// produced at all.
    pub fn reconstruct<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<String>, Unreconstructable> {
        let clean: Vec<&str> = tokens
            .iter()
            .map(|t| t.as_ref().trim())
            .filter(|t| is_digits(t))
            .collect();

        let k = self.segments();
        if k == 0 || clean.is_empty() || clean.len() % k != 0 {
            return Err(Unreconstructable {
                tokens: clean.len(),
                segments: k,
            });
        }

        let n = clean.len() / k;
        let slices: Vec<&[&str]> = clean.chunks(n).collect();

        let ids = (0..n)
            .map(|row| {
                slices
                    .iter()
                    .zip(&self.widths)
                    .map(|(slice, &width)| pad(slice[row], width))
                    .collect::<Vec<_>>()
                    .join(&self.separator)
            })
            .collect();
        Ok(ids)
    }

    /// Like [`reconstruct`](Self::reconstruct) but fail-safe: a bad token
    /// count yields zero identifiers and a warning.
    pub fn reconstruct_or_empty<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<String> {
        match self.reconstruct(tokens) {
            Ok(ids) => ids,
            Err(e) => {
                log::warn!("composite key: {e}; emitting no rows");
                Vec::new()
            }
        }
    }
}

fn pad(segment: &str, width: usize) -> String {
    format!("{segment:0>width$}")
}
