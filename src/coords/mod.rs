pub mod codec;
pub mod parser;
pub mod types;

pub use codec::{decimal_to_sexagesimal, format_sexagesimal};
pub use parser::{normalize_sexagesimal, validate_declination, validate_right_ascension};
pub use types::{AngleFormat, Coordinate};
