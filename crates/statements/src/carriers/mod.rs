//! Per-carrier statement parsers.
//!
//! Three layout styles exist. Columnar reports print each column header once
//! followed by that column's values for every row; those go through anchors,
//! segmentation and positional alignment. Line reports print one logical row
//! per line and are matched with a single anchored regex per line. Section
//! reports (VUMI, PALIG, Assist Card) hold several tables each and are scanned
//! with a small state machine over the line stream.

mod assistcard;
mod banesco;
mod columnar;
mod ifs;
mod mercantil;
mod palig;
mod regional;
mod vumi;

pub use assistcard::{AssistcardConfig, AssistcardParser};
pub use banesco::{BanescoConfig, BanescoParser};
pub use columnar::{ColumnarAnchors, ColumnarConfig, ColumnarParser};
pub use ifs::{IfsConfig, IfsParser};
pub use mercantil::{MercantilConfig, MercantilParser};
pub use palig::{PaligConfig, PaligParser};
pub use regional::{RegionalAnchors, RegionalConfig, RegionalParser};
pub use vumi::{VumiConfig, VumiParser};

/// True when `line` contains any of the raw (case-sensitive) markers.
pub(crate) fn contains_any(line: &str, markers: &[String]) -> bool {
    markers.iter().any(|m| line.contains(m.as_str()))
}

pub(crate) fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
