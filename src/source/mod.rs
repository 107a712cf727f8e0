//! Source components for reading the remote dataset page by page.

mod socrata;
mod traits;

pub use socrata::{SocrataSource, parse_count};
pub use traits::{Page, PageRequest, RecordSource};
