//! The event-driven propagation loop.
//!
//! All per-component mutable state lives in arenas indexed by component id;
//! the netlist itself is immutable and shared. Cloning a propagator is a
//! deep copy of those arenas.

use super::config::SimulationConfig;
use super::event_scheduler::{Event, EventScheduler};
use super::trace::Trace;
use crate::core::components::{ComponentState, PortDirection};
use crate::core::connections::Netlist;
use crate::core::errors::SimError;
use crate::core::types::{ComponentId, NetId, PortRef, SimTime};
use crate::core::values::Value;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

/// Components remembered for the oscillation report
const RECENT_WINDOW: usize = 64;

/// How a tick ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    /// The event queue drained
    Stable,
    /// An event budget ran out; pending events were dropped
    Oscillation { components: Vec<ComponentId> },
}

/// Explicit did-change result of a tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub outcome: TickOutcome,
    /// Simulated time when the tick ended
    pub time: SimTime,
    /// Events processed during the tick
    pub events: usize,
    /// Nets whose value changed, ascending
    pub changed_nets: Vec<NetId>,
    /// Clocked components that saw `X`/`E` on a clock input
    pub indeterminate_clocks: Vec<ComponentId>,
}

impl TickReport {
    pub fn is_stable(&self) -> bool {
        self.outcome == TickOutcome::Stable
    }

    pub fn is_oscillating(&self) -> bool {
        matches!(self.outcome, TickOutcome::Oscillation { .. })
    }

    /// Map an oscillating tick to `SimError::Oscillation`
    pub fn into_result(self) -> Result<TickReport, SimError> {
        match &self.outcome {
            TickOutcome::Stable => Ok(self),
            TickOutcome::Oscillation { components } => Err(SimError::Oscillation {
                time: self.time,
                events: self.events,
                components: components.clone(),
            }),
        }
    }

    /// Non-fatal conditions, each reported distinctly
    pub fn diagnostics(&self) -> Vec<SimError> {
        let mut out = Vec::new();
        if let TickOutcome::Oscillation { components } = &self.outcome {
            out.push(SimError::Oscillation {
                time: self.time,
                events: self.events,
                components: components.clone(),
            });
        }
        out.extend(
            self.indeterminate_clocks
                .iter()
                .map(|component| SimError::IndeterminateClock {
                    component: *component,
                }),
        );
        out
    }
}

/// Result of processing a single event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Event {
        time: SimTime,
        port: PortRef,
        net_changed: bool,
    },
    Stable,
    Oscillation { components: Vec<ComponentId> },
}

/// Bookkeeping for the tick in progress
#[derive(Debug, Clone, Default)]
struct RunStats {
    active: bool,
    events: usize,
    same_time: usize,
    changed_nets: BTreeSet<NetId>,
    recent: VecDeque<ComponentId>,
}

#[derive(Debug, Clone)]
pub struct Propagator {
    netlist: Arc<Netlist>,
    config: SimulationConfig,
    states: Vec<ComponentState>,
    /// Value each port currently drives onto its net
    drives: Vec<Vec<Value>>,
    /// Last value emitted or scheduled per port
    scheduled: Vec<Vec<Value>>,
    net_values: Vec<Value>,
    /// Net values at the end of the most recent stable tick
    stable_values: Vec<Value>,
    scheduler: EventScheduler,
    time: SimTime,
    /// Evaluate everything on the next run (fresh or reset)
    full_eval: bool,
    pending: BTreeSet<ComponentId>,
    run: RunStats,
    watched: Vec<PortRef>,
    trace: Trace,
}

impl Propagator {
    pub fn new(netlist: Arc<Netlist>, config: SimulationConfig) -> Self {
        let undriven = |netlist: &Netlist| -> Vec<Vec<Value>> {
            netlist
                .components()
                .iter()
                .map(|c| c.ports.iter().map(|p| Value::unknown(p.width)).collect())
                .collect()
        };
        let drives = undriven(&netlist);
        let net_values: Vec<Value> = netlist
            .nets()
            .iter()
            .map(|n| Value::unknown(n.width))
            .collect();
        let states = netlist
            .components()
            .iter()
            .map(|c| c.behavior.initial_state(config.random_seed))
            .collect();
        Self {
            scheduled: drives.clone(),
            drives,
            stable_values: net_values.clone(),
            net_values,
            states,
            netlist,
            config,
            scheduler: EventScheduler::new(),
            time: 0,
            full_eval: true,
            pending: BTreeSet::new(),
            run: RunStats::default(),
            watched: Vec::new(),
            trace: Trace::new(),
        }
    }

    pub fn netlist(&self) -> &Netlist {
        &self.netlist
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn pending_events(&self) -> usize {
        self.scheduler.len()
    }

    pub fn state(&self, id: ComponentId) -> Option<&ComponentState> {
        self.states.get(id.index())
    }

    pub(crate) fn state_mut(&mut self, id: ComponentId) -> Option<&mut ComponentState> {
        self.states.get_mut(id.index())
    }

    /// Re-evaluate `id` when the next run starts
    pub(crate) fn mark_pending(&mut self, id: ComponentId) {
        self.pending.insert(id);
    }

    pub fn net_value(&self, net: NetId) -> Value {
        self.net_values[net.index()]
    }

    pub fn stable_net_value(&self, net: NetId) -> Value {
        self.stable_values[net.index()]
    }

    pub fn watch(&mut self, port: PortRef) -> Result<(), SimError> {
        let net = self.net_for(port)?;
        if !self.watched.contains(&port) {
            self.watched.push(port);
            self.trace.record(self.time, port, self.net_values[net.index()]);
        }
        Ok(())
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn take_trace(&mut self) -> Trace {
        std::mem::take(&mut self.trace)
    }

    pub(crate) fn net_for(&self, port: PortRef) -> Result<NetId, SimError> {
        self.netlist
            .net_of(port)
            .ok_or_else(|| SimError::config(format!("unknown port {}", port)))
    }

    /// Restore power-on state; watched ports stay watched
    pub fn reset(&mut self) {
        let fresh = Propagator::new(Arc::clone(&self.netlist), self.config.clone());
        let watched = std::mem::take(&mut self.watched);
        *self = fresh;
        for port in watched {
            // ports were validated when first watched
            let _ = self.watch(port);
        }
    }

    /// Run until the queue drains or a budget is exhausted
    pub fn tick(&mut self) -> Result<TickReport, SimError> {
        let report = self.run_to_end();
        if report.is_err() {
            self.abandon_run();
        }
        report
    }

    fn run_to_end(&mut self) -> Result<TickReport, SimError> {
        self.begin_run()?;
        loop {
            match self.process_one()? {
                StepOutcome::Event { .. } => continue,
                StepOutcome::Stable => return Ok(self.finish_run(TickOutcome::Stable)),
                StepOutcome::Oscillation { components } => {
                    return Ok(self.finish_run(TickOutcome::Oscillation { components }))
                }
            }
        }
    }

    /// Process at most one event, seeding the run first if needed
    pub fn step(&mut self) -> Result<StepOutcome, SimError> {
        let outcome = self.begin_run().and_then(|_| self.process_one());
        match &outcome {
            Ok(StepOutcome::Event { .. }) => {}
            Ok(StepOutcome::Stable) => {
                self.finish_run(TickOutcome::Stable);
            }
            Ok(StepOutcome::Oscillation { components }) => {
                self.finish_run(TickOutcome::Oscillation {
                    components: components.clone(),
                });
            }
            Err(_) => self.abandon_run(),
        }
        outcome
    }

    fn begin_run(&mut self) -> Result<(), SimError> {
        if !self.run.active {
            self.run = RunStats {
                active: true,
                ..RunStats::default()
            };
        }
        if self.full_eval {
            self.full_eval = false;
            self.pending = (0..self.netlist.component_count())
                .map(|index| ComponentId::from_raw(index as u32))
                .collect();
        }
        // A component leaves the set only once it evaluated cleanly.
        while let Some(id) = self.pending.first().copied() {
            self.evaluate(id)?;
            self.pending.remove(&id);
        }
        Ok(())
    }

    /// Drop the bookkeeping of a run that failed; the next run starts afresh
    fn abandon_run(&mut self) {
        let run = std::mem::take(&mut self.run);
        debug!(
            "Run abandoned at time {} after {} events, {} components still pending",
            self.time,
            run.events,
            self.pending.len()
        );
    }

    fn finish_run(&mut self, outcome: TickOutcome) -> TickReport {
        let run = std::mem::take(&mut self.run);
        if outcome == TickOutcome::Stable {
            self.stable_values.clone_from(&self.net_values);
            debug!(
                "Tick stable at time {} after {} events, {} nets changed",
                self.time,
                run.events,
                run.changed_nets.len()
            );
        }
        // Reported only if still unresolved once the tick is over
        let indeterminate_clocks: Vec<ComponentId> = self
            .states
            .iter()
            .enumerate()
            .filter(|(_, state)| state.has_indeterminate_clock())
            .map(|(index, _)| ComponentId::from_raw(index as u32))
            .collect();
        for id in &indeterminate_clocks {
            warn!("Clock input of {} is indeterminate", id);
        }
        TickReport {
            outcome,
            time: self.time,
            events: run.events,
            changed_nets: run.changed_nets.into_iter().collect(),
            indeterminate_clocks,
        }
    }

    fn process_one(&mut self) -> Result<StepOutcome, SimError> {
        let Some(next_time) = self.scheduler.peek_time() else {
            return Ok(StepOutcome::Stable);
        };
        if next_time > self.time {
            self.run.same_time = 0;
        }
        if self.run.same_time >= self.config.oscillation_budget
            || self.run.events >= self.config.max_events_per_tick
        {
            return Ok(StepOutcome::Oscillation {
                components: self.declare_oscillation(),
            });
        }
        let Some(event) = self.scheduler.pop_next() else {
            return Ok(StepOutcome::Stable);
        };
        self.time = event.time;
        self.run.events += 1;
        self.run.same_time += 1;
        if self.run.recent.len() == RECENT_WINDOW {
            self.run.recent.pop_front();
        }
        self.run.recent.push_back(event.port.component);

        let port = event.port;
        trace!("t={} {} <- {}", self.time, port, event.value);
        self.drives[port.component.index()][port.index] = event.value;

        let net = self.net_for(port)?;
        let combined = self.combine_drivers(net, None)?;
        let net_changed = combined != self.net_values[net.index()];
        if net_changed {
            self.net_values[net.index()] = combined;
            self.run.changed_nets.insert(net);
            for watched in &self.watched {
                if self.netlist.net_of(*watched) == Some(net) {
                    self.trace.record(self.time, *watched, combined);
                }
            }
        }

        let netlist = Arc::clone(&self.netlist);
        let readers = netlist.readers(net);
        for (position, reader) in readers.iter().enumerate() {
            // Bidirectional readers see the net without their own drive, which
            // can change even when the combined value does not.
            if net_changed || self.has_inout_on(*reader, net, port) {
                if let Err(err) = self.evaluate(*reader) {
                    self.pending.extend(readers[position..].iter().copied());
                    return Err(err);
                }
            }
        }
        Ok(StepOutcome::Event {
            time: self.time,
            port,
            net_changed,
        })
    }

    fn has_inout_on(&self, id: ComponentId, net: NetId, source: PortRef) -> bool {
        self.netlist.net(net).ports.iter().any(|p| {
            p.component == id
                && *p != source
                && self.netlist.direction(*p) == PortDirection::InOut
        })
    }

    fn declare_oscillation(&mut self) -> Vec<ComponentId> {
        let mut components: Vec<ComponentId> = self.run.recent.iter().copied().collect();
        components.sort();
        components.dedup();
        warn!(
            "Oscillation at time {} after {} events; components {:?}",
            self.time, self.run.events, components
        );
        let dropped = self.scheduler.drain();
        // pending changes were dropped, so the current drives are what stands
        self.scheduled.clone_from(&self.drives);
        // Drives may disagree with the inputs that produced them. Evaluating
        // these again next run restarts a loop that is still unstable.
        self.pending.extend(components.iter().copied());
        self.pending
            .extend(dropped.iter().map(|event| event.port.component));
        components
    }

    fn combine_drivers(&self, net: NetId, exclude: Option<PortRef>) -> Result<Value, SimError> {
        let mut value = Value::unknown(self.netlist.net(net).width);
        for driver in self.netlist.drivers(net) {
            if Some(driver) == exclude {
                continue;
            }
            value = value.combine(&self.drives[driver.component.index()][driver.index])?;
        }
        Ok(value)
    }

    /// Value an input sees on `port`; bidirectional ports exclude themselves
    pub fn value_seen_by(&self, port: PortRef) -> Result<Value, SimError> {
        let net = self.net_for(port)?;
        match self.netlist.direction(port) {
            PortDirection::InOut => self.combine_drivers(net, Some(port)),
            _ => Ok(self.net_values[net.index()]),
        }
    }

    fn evaluate(&mut self, id: ComponentId) -> Result<(), SimError> {
        let netlist = Arc::clone(&self.netlist);
        let component = netlist
            .component(id)
            .ok_or_else(|| SimError::config(format!("unknown component {}", id)))?;
        let seen = (0..component.ports.len())
            .map(|index| self.value_seen_by(id.port(index)))
            .collect::<Result<Vec<Value>, SimError>>()?;

        let state = &mut self.states[id.index()];
        let propagation = component.propagate(&seen, state)?;
        if propagation.indeterminate_clock {
            trace!("{} sees an indeterminate clock", component.display_name());
        }

        for update in propagation.updates {
            let spec = component.ports.get(update.index).ok_or_else(|| {
                SimError::config(format!(
                    "{} drove missing port {}",
                    component.display_name(),
                    update.index
                ))
            })?;
            if spec.width != update.value.width() {
                return Err(SimError::width_mismatch(
                    spec.width,
                    update.value.width(),
                    format!("{} output {}", component.display_name(), id.port(update.index)),
                ));
            }
            let last = &mut self.scheduled[id.index()][update.index];
            if *last != update.value {
                *last = update.value;
                self.scheduler.schedule(Event {
                    time: self.time + propagation.delay,
                    port: id.port(update.index),
                    value: update.value,
                });
            }
        }
        self.states[id.index()].complete_cycle();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::NetlistBuilder;
    use crate::core::components::{register, Behavior};

    fn register_propagator() -> (Propagator, ComponentId, ComponentId) {
        let mut builder = NetlistBuilder::new();
        let d = builder.add_component(Behavior::input_pin(8));
        let clk = builder.add_component(Behavior::input_pin(1));
        let reg = builder.add_component(Behavior::register(8));
        builder
            .connect(d.port(0), reg.port(register::IN))
            .connect(clk.port(0), reg.port(register::CK));
        let netlist = Arc::new(builder.build().unwrap());
        (Propagator::new(netlist, SimulationConfig::default()), d, reg)
    }

    #[test]
    fn test_failed_run_restores_pending_and_resets_stats() {
        let (mut prop, d, reg) = register_propagator();
        assert!(prop.tick().unwrap().is_stable());

        prop.states[d.index()] = ComponentState::Pin(Value::known(8, 0x5A));
        prop.mark_pending(d);
        prop.states[reg.index()] = ComponentState::Stateless;
        let err = prop.tick().unwrap_err();
        assert!(matches!(err, SimError::Configuration(_)));
        assert!(!prop.run.active);
        assert_eq!(prop.run.events, 0);
        assert!(prop.pending.contains(&reg));

        // once the fault is gone the retried run counts only its own events
        prop.states[reg.index()] = Behavior::register(8).initial_state(0);
        let report = prop.tick().unwrap();
        assert!(report.is_stable());
        assert_eq!(report.events, 0);
        assert!(prop.pending.is_empty());
    }

    #[test]
    fn test_failed_pending_evaluation_keeps_the_rest_queued() {
        let (mut prop, d, reg) = register_propagator();
        prop.states[reg.index()] = ComponentState::Stateless;
        assert!(prop.step().is_err());
        // the pin evaluated before the failure; the register did not
        assert!(!prop.pending.contains(&d));
        assert!(prop.pending.contains(&reg));
        assert!(!prop.full_eval);
    }
}
