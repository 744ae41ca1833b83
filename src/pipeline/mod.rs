pub mod estimate;
pub mod parse;
pub mod path;
pub mod progress;
pub mod standings;
