pub mod builder;
pub mod clock;
pub mod components;
pub mod connections;
pub mod errors;
pub mod execution;
pub mod testing;
pub mod types;
pub mod values;

#[cfg(test)]
mod tests;
