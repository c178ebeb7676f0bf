pub mod netlist;
pub mod port_validator;

pub use netlist::{Net, Netlist};
pub use port_validator::PortValidator;
