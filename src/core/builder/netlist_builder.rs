use crate::core::components::{Behavior, Component};
use crate::core::connections::{Net, Netlist, PortValidator};
use crate::core::errors::SimError;
use crate::core::types::{ComponentId, NetId, PortRef, SimTime};
use log::debug;
use std::collections::HashMap;

/// Imperative API for assembling a circuit.
///
/// Components get sequential ids in insertion order. Connections, labels
/// and delay overrides are only recorded here; [`build`](Self::build) does
/// all validation and groups connected ports into nets.
#[derive(Debug, Clone, Default)]
pub struct NetlistBuilder {
    components: Vec<Behavior>,
    connections: Vec<(PortRef, PortRef)>,
    labels: Vec<(ComponentId, String)>,
    delays: Vec<(ComponentId, SimTime)>,
}

impl NetlistBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_component(&mut self, behavior: Behavior) -> ComponentId {
        let id = ComponentId::from_raw(self.components.len() as u32);
        self.components.push(behavior);
        id
    }

    /// Add a component and give it a label in one call
    pub fn add_labeled(&mut self, label: &str, behavior: Behavior) -> ComponentId {
        let id = self.add_component(behavior);
        self.label(id, label);
        id
    }

    pub fn label(&mut self, id: ComponentId, label: &str) -> &mut Self {
        self.labels.push((id, label.to_string()));
        self
    }

    /// Override the component's default propagation delay
    pub fn set_delay(&mut self, id: ComponentId, delay: SimTime) -> &mut Self {
        self.delays.push((id, delay));
        self
    }

    /// Put two ports on the same net
    pub fn connect(&mut self, a: PortRef, b: PortRef) -> &mut Self {
        self.connections.push((a, b));
        self
    }

    /// Connect every port in `ports` to the first one
    pub fn connect_all(&mut self, ports: &[PortRef]) -> &mut Self {
        if let Some((first, rest)) = ports.split_first() {
            for port in rest {
                self.connect(*first, *port);
            }
        }
        self
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn build(&self) -> Result<Netlist, SimError> {
        let mut components = Vec::with_capacity(self.components.len());
        for (i, behavior) in self.components.iter().enumerate() {
            behavior.validate()?;
            let component = Component::new(ComponentId::from_raw(i as u32), behavior.clone());
            PortValidator::validate_widths(&component)?;
            components.push(component);
        }

        let mut labels = HashMap::new();
        for (id, label) in &self.labels {
            let component = components
                .get_mut(id.index())
                .ok_or_else(|| SimError::config(format!("label '{}' names unknown component {}", label, id)))?;
            if labels.insert(label.clone(), *id).is_some() {
                return Err(SimError::config(format!("duplicate label '{}'", label)));
            }
            component.label = Some(label.clone());
        }
        for (id, delay) in &self.delays {
            let component = components
                .get_mut(id.index())
                .ok_or_else(|| SimError::config(format!("delay set on unknown component {}", id)))?;
            component.delay = *delay;
        }

        // Flat port numbering for the union-find
        let mut offsets = Vec::with_capacity(components.len());
        let mut total = 0usize;
        for component in &components {
            offsets.push(total);
            total += component.ports.len();
        }
        let flat = |p: PortRef| offsets[p.component.index()] + p.index;

        let mut sets = DisjointSets::new(total);
        for (a, b) in &self.connections {
            PortValidator::validate_reference(&components, *a)?;
            PortValidator::validate_reference(&components, *b)?;
            PortValidator::validate_same_width(&components, *a, *b)?;
            sets.union(flat(*a), flat(*b));
        }

        // Number nets by the first port that reaches them, in component order
        let mut root_to_net: HashMap<usize, NetId> = HashMap::new();
        let mut nets: Vec<Net> = Vec::new();
        let mut port_nets = Vec::with_capacity(components.len());
        for component in &components {
            let mut ids = Vec::with_capacity(component.ports.len());
            for (index, spec) in component.ports.iter().enumerate() {
                let port = component.id.port(index);
                let root = sets.find(flat(port));
                let net_id = *root_to_net.entry(root).or_insert_with(|| {
                    let id = NetId(nets.len() as u32);
                    nets.push(Net {
                        id,
                        width: spec.width,
                        ports: Vec::new(),
                    });
                    id
                });
                nets[net_id.index()].ports.push(port);
                ids.push(net_id);
            }
            port_nets.push(ids);
        }

        debug!(
            "Built netlist: {} components, {} nets, {} connections",
            components.len(),
            nets.len(),
            self.connections.len()
        );
        Ok(Netlist::from_parts(components, nets, port_nets, labels))
    }
}

/// Union-find over flat port indices
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // keep the lower index as root so numbering is stable
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}
