//! `commrecon-statements`: carrier statement parsing.
//!
//! Pure engine crate: receives the text produced by an external OCR/extraction
//! step and returns commission rows. No ledger or directory dependencies.
//!
//! Statements arrive as a flattened line stream: each column header is printed
//! once, followed by that column's values for every row. The primitives here
//! recover the rows positionally:
//!
//! * [`lines`]: trimmed line stream, header normalization, anchor search
//! * [`segment`]: slicing value runs between anchors
//! * [`composite`]: rebuilding multi-segment policy numbers
//! * [`align`]: type-column projection, name cleaning, row validation
//! * [`carriers`]: one parser per carrier format, behind [`CarrierRegistry`]

pub mod align;
pub mod amount;
pub mod carrier;
pub mod carriers;
pub mod composite;
pub mod config;
pub mod lines;
pub mod manifest;
pub mod model;
pub mod segment;

pub use amount::{format_cents, parse_amount};
pub use carrier::{Carrier, CarrierRegistry, StatementParser};
pub use config::CarrierSettings;
pub use manifest::{read_manifest_csv, CodeAmount, ManifestError};
pub use model::{CommissionRow, DropReason, ParseOutcome, ParseStats};
