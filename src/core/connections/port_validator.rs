use crate::core::components::Component;
use crate::core::errors::SimError;
use crate::core::types::PortRef;
use crate::core::values::MAX_WIDTH;

/// Port validation utilities for netlist construction
pub struct PortValidator;

impl PortValidator {
    /// Every declared port must carry between 1 and 64 bits
    pub fn validate_widths(component: &Component) -> Result<(), SimError> {
        for (index, spec) in component.ports.iter().enumerate() {
            if spec.width == 0 || spec.width > MAX_WIDTH {
                return Err(SimError::config(format!(
                    "port {} of {} declares width {} (allowed 1..={})",
                    component.id.port(index),
                    component.display_name(),
                    spec.width,
                    MAX_WIDTH
                )));
            }
        }
        Ok(())
    }

    /// The port must name an existing component and one of its ports
    pub fn validate_reference(components: &[Component], port: PortRef) -> Result<(), SimError> {
        let component = components.get(port.component.index()).ok_or_else(|| {
            SimError::config(format!("connection refers to unknown component {}", port.component))
        })?;
        if port.index >= component.ports.len() {
            return Err(SimError::config(format!(
                "{} has no port {} (it has {})",
                component.display_name(),
                port.index,
                component.ports.len()
            )));
        }
        Ok(())
    }

    /// Two ports may share a net only if they have the same width
    pub fn validate_same_width(components: &[Component], a: PortRef, b: PortRef) -> Result<(), SimError> {
        let width_of = |p: PortRef| components[p.component.index()].ports[p.index].width;
        let (wa, wb) = (width_of(a), width_of(b));
        if wa != wb {
            return Err(SimError::width_mismatch(
                wa,
                wb,
                format!("net joining {} and {}", a, b),
            ));
        }
        Ok(())
    }
}
