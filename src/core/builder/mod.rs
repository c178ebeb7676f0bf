pub mod netlist_builder;

pub use netlist_builder::NetlistBuilder;
