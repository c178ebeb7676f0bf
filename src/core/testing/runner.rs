use super::test_vector::{Cell, TestVector, VectorRow};
use crate::core::errors::SimError;
use crate::core::execution::{ConcurrencyMode, Simulator};
use crate::core::types::PortRef;
use crate::core::values::Value;
use log::{debug, info};
use rayon::prelude::*;

/// Why a row failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Mismatch {
        column: String,
        expected: Cell,
        actual: Value,
    },
    /// The circuit did not settle after applying the row's inputs
    Oscillation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub line: usize,
    pub kind: FailureKind,
}

impl std::fmt::Display for RowFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            FailureKind::Mismatch {
                column,
                expected,
                actual,
            } => {
                let expected = match expected {
                    Cell::Value(v) => v.to_string(),
                    Cell::DontCare => "<DC>".to_string(),
                    Cell::Floating => "<float>".to_string(),
                };
                write!(
                    f,
                    "line {}: {} expected {}, got {}",
                    self.line, column, expected, actual
                )
            }
            FailureKind::Oscillation => write!(f, "line {}: circuit oscillates", self.line),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestReport {
    pub passed: usize,
    pub failures: Vec<RowFailure>,
}

impl TestReport {
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of distinct rows with at least one failure
    pub fn failed_rows(&self) -> usize {
        let mut lines: Vec<usize> = self.failures.iter().map(|f| f.line).collect();
        lines.dedup();
        lines.len()
    }

    fn merge(&mut self, other: TestReport) {
        self.passed += other.passed;
        self.failures.extend(other.failures);
    }
}

#[derive(Debug, Clone)]
struct Binding {
    name: String,
    port: PortRef,
    width: u8,
    is_input: bool,
}

/// Drives a simulator through a test vector.
///
/// Each independent unit (see [`TestVector::units`]) runs on its own clone
/// of the simulator, reset first, so units never observe each other.
pub struct TestRunner<'a> {
    simulator: &'a Simulator,
}

impl<'a> TestRunner<'a> {
    pub fn new(simulator: &'a Simulator) -> Self {
        Self { simulator }
    }

    pub fn run(&self, vector: &TestVector) -> Result<TestReport, SimError> {
        let bindings = self.bind(vector)?;
        let units = vector.units();
        info!(
            "Running {} test vector rows in {} units",
            vector.rows().len(),
            units.len()
        );

        let config = self.simulator.config();
        let results: Vec<Result<TestReport, SimError>> = match config.concurrency_mode {
            ConcurrencyMode::Sequential => units
                .iter()
                .map(|unit| self.run_unit(unit, &bindings))
                .collect(),
            ConcurrencyMode::Rayon => {
                let mut builder = rayon::ThreadPoolBuilder::new();
                if let Some(threads) = config.thread_pool_size {
                    builder = builder.num_threads(threads);
                }
                let pool = builder
                    .build()
                    .map_err(|e| SimError::config(format!("thread pool: {}", e)))?;
                pool.install(|| {
                    units
                        .par_iter()
                        .map(|unit| self.run_unit(unit, &bindings))
                        .collect()
                })
            }
        };

        let mut report = TestReport::default();
        for result in results {
            report.merge(result?);
        }
        report.failures.sort_by_key(|f| f.line);
        debug!(
            "Test vector finished: {} passed, {} failed",
            report.passed,
            report.failures.len()
        );
        Ok(report)
    }

    fn bind(&self, vector: &TestVector) -> Result<Vec<Binding>, SimError> {
        let netlist = self.simulator.netlist();
        vector
            .columns()
            .iter()
            .map(|column| {
                let id = netlist.find_label(&column.name).ok_or_else(|| {
                    SimError::config(format!("no pin labelled '{}'", column.name))
                })?;
                let component = netlist
                    .component(id)
                    .ok_or_else(|| SimError::config(format!("unknown component {}", id)))?;
                let width = component.port_width(0).unwrap_or(0);
                if width != column.width {
                    return Err(SimError::width_mismatch(
                        width,
                        column.width,
                        format!("test vector column {}", column.name),
                    ));
                }
                Ok(Binding {
                    name: column.name.clone(),
                    port: id.port(0),
                    width,
                    is_input: component.behavior.is_forcible(),
                })
            })
            .collect()
    }

    fn run_unit(&self, rows: &[&VectorRow], bindings: &[Binding]) -> Result<TestReport, SimError> {
        let mut sim = self.simulator.snapshot();
        sim.reset();
        let mut report = TestReport::default();

        for row in rows {
            for (binding, cell) in bindings.iter().zip(&row.cells) {
                if !binding.is_input {
                    continue;
                }
                match cell {
                    Cell::Value(value) => sim.force_port(binding.port, *value)?,
                    Cell::Floating => sim.force_port(binding.port, Value::unknown(binding.width))?,
                    Cell::DontCare => {}
                }
            }

            let tick = sim.tick()?;
            if tick.is_oscillating() {
                report.failures.push(RowFailure {
                    line: row.line,
                    kind: FailureKind::Oscillation,
                });
                continue;
            }

            let mut row_failures = Vec::new();
            for (binding, cell) in bindings.iter().zip(&row.cells) {
                if binding.is_input {
                    continue;
                }
                let actual = sim.read_port(binding.port)?;
                let ok = match cell {
                    Cell::Value(expected) => expected.compatible(&actual),
                    Cell::Floating => actual.is_unknown(),
                    Cell::DontCare => true,
                };
                if !ok {
                    row_failures.push(RowFailure {
                        line: row.line,
                        kind: FailureKind::Mismatch {
                            column: binding.name.clone(),
                            expected: *cell,
                            actual,
                        },
                    });
                }
            }
            if row_failures.is_empty() {
                report.passed += 1;
            } else {
                report.failures.extend(row_failures);
            }
        }
        Ok(report)
    }
}
