pub mod parse;
pub mod resolve;

pub use parse::parse_date;
pub use resolve::{Candidate, DateProbe, DateSource, MetadataDateResolver};
