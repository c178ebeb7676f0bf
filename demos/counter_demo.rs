use circsim::core::components::{counter, register};
use circsim::{
    init_logging, Behavior, NetlistBuilder, OnGoal, SimError, SimulationConfig, Simulator,
    TestRunner, TestVector, TriggerKind,
};
use log::LevelFilter;

const REGISTER_VECTOR: &str = "\
# load, hold, reload
D[8] CLK Q[8] <set> <seq>
0xAC 0   0x00 1     1
0xAC 1   0xAC 1     2
0x11 1   0xAC 1     3
0x11 0   0xAC 1     4
0x11 1   0x11 1     5
";

fn run_counter() -> Result<(), SimError> {
    let mut builder = NetlistBuilder::new();
    let clock = builder.add_labeled(
        "clk",
        Behavior::Clock {
            high: 1,
            low: 1,
            phase: 0,
        },
    );
    let ctr = builder.add_labeled(
        "count",
        Behavior::Counter {
            width: 4,
            max: 9,
            trigger: TriggerKind::Rising,
            on_goal: OnGoal::Wrap,
        },
    );
    builder.connect(clock.port(0), ctr.port(counter::CK));

    let mut sim = Simulator::new(builder.build()?);
    sim.watch(ctr.port(counter::OUT))?;
    sim.watch(ctr.port(counter::CARRY))?;
    sim.tick()?.into_result()?;
    for _ in 0..24 {
        sim.tick_clock()?.into_result()?;
    }

    println!("Decade counter chronogram:");
    for record in sim.trace().records() {
        let name = if record.port.index == counter::OUT {
            "count"
        } else {
            "carry"
        };
        println!("  t={:>4} {:<6} {}", record.time, name, record.value);
    }
    println!("Final count: {}", sim.read_label("count")?);
    Ok(())
}

fn run_vector() -> Result<(), SimError> {
    let mut builder = NetlistBuilder::new();
    let d = builder.add_labeled("D", Behavior::input_pin(8));
    let clk = builder.add_labeled("CLK", Behavior::input_pin(1));
    let reg = builder.add_component(Behavior::register(8));
    let q = builder.add_labeled("Q", Behavior::output_pin(8));
    builder
        .connect(d.port(0), reg.port(register::IN))
        .connect(clk.port(0), reg.port(register::CK))
        .connect(reg.port(register::OUT), q.port(0));
    let sim = Simulator::with_config(builder.build()?, SimulationConfig::default());

    let vector = TestVector::parse(REGISTER_VECTOR)?;
    let report = TestRunner::new(&sim).run(&vector)?;
    println!(
        "Register vector: {} passed, {} failed",
        report.passed,
        report.failures.len()
    );
    for failure in &report.failures {
        println!("  {}", failure);
    }
    Ok(())
}

fn main() -> Result<(), SimError> {
    let _ = init_logging(LevelFilter::Info);
    run_counter()?;
    run_vector()
}
