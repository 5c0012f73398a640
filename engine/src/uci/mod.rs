pub mod parser;

pub use parser::{parse_line, Score, UciEvent};
