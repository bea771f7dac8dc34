// Adapters layer: concrete codecs between the domain and the outside world
// (roster files in, rendered matches and snapshots out).

pub mod records;
pub mod report;

pub use records::{parse_records, InputFormat};
pub use report::{render, render_snapshot, OutputFormat};
