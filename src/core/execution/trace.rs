use crate::core::types::{PortRef, SimTime};
use crate::core::values::Value;
use serde::{Deserialize, Serialize};

/// One observed value change on a watched port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub time: SimTime,
    pub port: PortRef,
    pub value: Value,
}

/// Chronogram capture: value changes of watched ports in the order the
/// propagator applied them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    records: Vec<TraceRecord>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, time: SimTime, port: PortRef, value: Value) {
        self.records.push(TraceRecord { time, port, value });
    }

    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Changes of a single port
    pub fn for_port(&self, port: PortRef) -> impl Iterator<Item = &TraceRecord> + '_ {
        self.records.iter().filter(move |r| r.port == port)
    }

    /// Value the port had at `time` (the last change at or before it)
    pub fn value_at(&self, port: PortRef, time: SimTime) -> Option<Value> {
        self.for_port(port)
            .take_while(|r| r.time <= time)
            .last()
            .map(|r| r.value)
    }
}
