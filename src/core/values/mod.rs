pub mod logic_value;

// Re-export commonly used types
pub use logic_value::{check_width, BitState, Value, MAX_WIDTH};
