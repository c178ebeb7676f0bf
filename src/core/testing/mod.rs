pub mod runner;
pub mod test_vector;

pub use runner::{FailureKind, RowFailure, TestReport, TestRunner};
pub use test_vector::{Cell, Column, TestVector, VectorRow};
