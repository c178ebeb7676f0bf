use serde::{Deserialize, Serialize};

/// Simulated time, in propagation-delay units.
pub type SimTime = u64;

/// Stable component identifier; an index into the simulator's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub(crate) u32);

impl ComponentId {
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Create a handle for one of this component's ports
    pub fn port(self, index: usize) -> PortRef {
        PortRef {
            component: self,
            index,
        }
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Handle for a single port of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortRef {
    pub component: ComponentId,
    pub index: usize,
}

impl PortRef {
    pub fn new(component: ComponentId, index: usize) -> Self {
        Self { component, index }
    }
}

impl std::fmt::Display for PortRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.component, self.index)
    }
}

/// Identifier of a net (a maximal set of connected ports)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetId(pub(crate) u32);

impl NetId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_handles() {
        let id = ComponentId::from_raw(7);
        let port = id.port(2);
        assert_eq!(port.component, id);
        assert_eq!(port.index, 2);
        assert_eq!(port.to_string(), "c7.2");
    }

    #[test]
    fn test_ids_order_by_index() {
        let mut ids = vec![ComponentId(3), ComponentId(1), ComponentId(2)];
        ids.sort();
        assert_eq!(ids, vec![ComponentId(1), ComponentId(2), ComponentId(3)]);
    }
}
