use super::config::SimulationConfig;
use super::propagator::{Propagator, StepOutcome, TickReport};
use super::trace::Trace;
use crate::core::components::{Behavior, ComponentState, SequentialPhase};
use crate::core::connections::Netlist;
use crate::core::errors::SimError;
use crate::core::types::{ComponentId, PortRef, SimTime};
use crate::core::values::Value;
use log::{debug, info};
use std::sync::Arc;

/// Stimulus/observation interface over one circuit.
///
/// Drive input pins with [`force_port`](Self::force_port), run
/// [`tick`](Self::tick) and read nets back with [`read_port`](Self::read_port).
/// `Clone` duplicates the whole running simulation; the topology itself is
/// shared.
#[derive(Debug, Clone)]
pub struct Simulator {
    propagator: Propagator,
}

impl Simulator {
    pub fn new(netlist: Netlist) -> Self {
        Self::with_config(netlist, SimulationConfig::default())
    }

    pub fn with_config(netlist: Netlist, config: SimulationConfig) -> Self {
        debug!(
            "Creating simulator for {} components, {} nets",
            netlist.component_count(),
            netlist.nets().len()
        );
        Self {
            propagator: Propagator::new(Arc::new(netlist), config),
        }
    }

    pub fn netlist(&self) -> &Netlist {
        self.propagator.netlist()
    }

    pub fn config(&self) -> &SimulationConfig {
        self.propagator.config()
    }

    /// Current simulated time
    pub fn time(&self) -> SimTime {
        self.propagator.time()
    }

    /// Events still queued; non-zero only while stepping
    pub fn pending_events(&self) -> usize {
        self.propagator.pending_events()
    }

    /// Queue a value for an input pin; it takes effect on the next tick.
    ///
    /// Only input pins are externally drivable; anything else is rejected
    /// with `NotAnInput` before any state changes.
    pub fn force_port(&mut self, port: PortRef, value: Value) -> Result<(), SimError> {
        let component = self
            .netlist()
            .component(port.component)
            .ok_or(SimError::NotAnInput { port })?;
        if !component.behavior.is_forcible() || port.index != 0 {
            return Err(SimError::NotAnInput { port });
        }
        if component.ports[0].width != value.width() {
            return Err(SimError::width_mismatch(
                component.ports[0].width,
                value.width(),
                format!("force of {}", component.display_name()),
            ));
        }
        if let Some(ComponentState::Pin(current)) = self.propagator.state_mut(port.component) {
            *current = value;
        }
        self.propagator.mark_pending(port.component);
        Ok(())
    }

    /// Force an input pin by label
    pub fn force_label(&mut self, label: &str, value: Value) -> Result<(), SimError> {
        let port = self.label_port(label)?;
        self.force_port(port, value)
    }

    pub fn tick(&mut self) -> Result<TickReport, SimError> {
        self.propagator.tick()
    }

    /// Advance every clock source by one half-step, then tick
    pub fn tick_clock(&mut self) -> Result<TickReport, SimError> {
        let clocks: Vec<ComponentId> = self
            .netlist()
            .components()
            .iter()
            .filter(|c| matches!(c.behavior, Behavior::Clock { .. }))
            .map(|c| c.id)
            .collect();
        for id in clocks {
            if let Some(ComponentState::ClockSource { ticks }) = self.propagator.state_mut(id) {
                *ticks += 1;
            }
            self.propagator.mark_pending(id);
        }
        self.tick()
    }

    /// Process a single event, for chronogram stepping
    pub fn step(&mut self) -> Result<StepOutcome, SimError> {
        self.propagator.step()
    }

    /// Current value of the net the port is on
    pub fn read_port(&self, port: PortRef) -> Result<Value, SimError> {
        let net = self.propagator.net_for(port)?;
        Ok(self.propagator.net_value(net))
    }

    /// Value after the most recent stable tick. After an oscillation this is
    /// the last settled value, not the mid-oscillation one.
    pub fn read_stable_port(&self, port: PortRef) -> Result<Value, SimError> {
        let net = self.propagator.net_for(port)?;
        Ok(self.propagator.stable_net_value(net))
    }

    pub fn read_label(&self, label: &str) -> Result<Value, SimError> {
        self.read_port(self.label_port(label)?)
    }

    pub fn find_label(&self, label: &str) -> Option<ComponentId> {
        self.netlist().find_label(label)
    }

    /// Port 0 of the labelled component
    pub fn label_port(&self, label: &str) -> Result<PortRef, SimError> {
        self.find_label(label)
            .map(|id| id.port(0))
            .ok_or_else(|| SimError::config(format!("no component labelled '{}'", label)))
    }

    /// Latch phase of a clocked component; `None` for combinational ones
    pub fn sequential_phase(&self, id: ComponentId) -> Option<SequentialPhase> {
        self.propagator.state(id).and_then(|state| state.phase())
    }

    pub fn component_state(&self, id: ComponentId) -> Option<&ComponentState> {
        self.propagator.state(id)
    }

    /// Record every change of the port's net from now on
    pub fn watch(&mut self, port: PortRef) -> Result<(), SimError> {
        self.propagator.watch(port)
    }

    pub fn trace(&self) -> &Trace {
        self.propagator.trace()
    }

    pub fn take_trace(&mut self) -> Trace {
        self.propagator.take_trace()
    }

    /// Deep copy of the running simulation
    pub fn snapshot(&self) -> Simulator {
        self.clone()
    }

    /// Clear all component state and rewind the clock to zero
    pub fn reset(&mut self) {
        info!("Resetting simulation at time {}", self.time());
        self.propagator.reset();
    }
}
