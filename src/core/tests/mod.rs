mod sequential_tests;

use crate::core::builder::NetlistBuilder;
use crate::core::components::{gates, Behavior, GateOp, PinKind};
use crate::core::execution::{SimulationConfig, Simulator};
use crate::core::types::ComponentId;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Two-input AND between labelled pins `A`, `B` and output `Y`
struct AndCircuit {
    sim: Simulator,
    a: ComponentId,
    b: ComponentId,
    gate: ComponentId,
    y: ComponentId,
}

fn and_circuit(config: SimulationConfig) -> AndCircuit {
    let mut builder = NetlistBuilder::new();
    let a = builder.add_labeled("A", Behavior::input_pin(1));
    let b = builder.add_labeled("B", Behavior::input_pin(1));
    let gate = builder.add_component(Behavior::gate(GateOp::And, 1, 2));
    let y = builder.add_labeled(
        "Y",
        Behavior::Pin {
            width: 1,
            kind: PinKind::Output,
        },
    );
    builder
        .connect(a.port(0), gate.port(gates::input(0)))
        .connect(b.port(0), gate.port(gates::input(1)))
        .connect(gate.port(gates::OUT), y.port(0));
    let netlist = builder.build().unwrap();
    AndCircuit {
        sim: Simulator::with_config(netlist, config),
        a,
        b,
        gate,
        y,
    }
}
