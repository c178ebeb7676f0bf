use crate::core::components::{Component, PortDirection};
use crate::core::types::{ComponentId, NetId, PortRef};
use std::collections::HashMap;

/// A maximal set of connected ports sharing one combined value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Net {
    pub id: NetId,
    pub width: u8,
    pub ports: Vec<PortRef>,
}

/// Validated, immutable circuit topology.
///
/// Produced by [`NetlistBuilder::build`](crate::core::builder::NetlistBuilder::build).
/// Every port of every component belongs to exactly one net.
#[derive(Debug, Clone)]
pub struct Netlist {
    components: Vec<Component>,
    nets: Vec<Net>,
    /// `port_nets[component][port]`
    port_nets: Vec<Vec<NetId>>,
    /// Per net, the components with a reading port on it, ascending by id
    readers: Vec<Vec<ComponentId>>,
    labels: HashMap<String, ComponentId>,
}

impl Netlist {
    pub(crate) fn from_parts(
        mut components: Vec<Component>,
        nets: Vec<Net>,
        port_nets: Vec<Vec<NetId>>,
        labels: HashMap<String, ComponentId>,
    ) -> Self {
        let mut readers: Vec<Vec<ComponentId>> = vec![Vec::new(); nets.len()];
        for net in &nets {
            let list = &mut readers[net.id.index()];
            for port in &net.ports {
                let reads = components[port.component.index()].ports[port.index]
                    .direction
                    .reads();
                if reads {
                    list.push(port.component);
                }
            }
            list.sort();
            list.dedup();

            let connected = net.ports.len() > 1;
            for port in &net.ports {
                components[port.component.index()].connected[port.index] = connected;
            }
        }
        Self {
            components,
            nets,
            port_nets,
            readers,
            labels,
        }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.index())
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Whether `port` shares its net with any other port
    pub fn is_connected(&self, port: PortRef) -> bool {
        self.net_of(port)
            .map_or(false, |net| self.nets[net.index()].ports.len() > 1)
    }

    pub fn nets(&self) -> &[Net] {
        &self.nets
    }

    pub fn net(&self, id: NetId) -> &Net {
        &self.nets[id.index()]
    }

    pub fn net_of(&self, port: PortRef) -> Option<NetId> {
        self.port_nets
            .get(port.component.index())
            .and_then(|ports| ports.get(port.index))
            .copied()
    }

    /// Components that must be re-evaluated when `net` changes
    pub fn readers(&self, net: NetId) -> &[ComponentId] {
        &self.readers[net.index()]
    }

    /// Ports on `net` that contribute a driven value
    pub fn drivers(&self, net: NetId) -> impl Iterator<Item = PortRef> + '_ {
        self.nets[net.index()]
            .ports
            .iter()
            .copied()
            .filter(move |port| self.direction(*port).drives())
    }

    pub fn direction(&self, port: PortRef) -> PortDirection {
        self.components[port.component.index()].ports[port.index].direction
    }

    pub fn find_label(&self, label: &str) -> Option<ComponentId> {
        self.labels.get(label).copied()
    }

    /// Labels in component order
    pub fn labels(&self) -> Vec<(&str, ComponentId)> {
        let mut labels: Vec<(&str, ComponentId)> = self
            .labels
            .iter()
            .map(|(name, id)| (name.as_str(), *id))
            .collect();
        labels.sort_by_key(|(_, id)| *id);
        labels
    }
}
