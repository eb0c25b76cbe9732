//! Packet network runner
//!
//! Usage: cargo run --release --example network <program.txt>
//!
//! Network parameters come from intcode-emu.toml and INTCODE_* variables.

use intcode_emu::{Network, Program};
use std::env;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn")
    ).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <program.txt>", args[0]);
        std::process::exit(1);
    }

    let text = std::fs::read_to_string(&args[1])?;
    let network = Network::configured(Program::parse(&text)?);
    println!("Running {} units, NAT at {}", network.config().size, network.config().monitor_address);

    let outcome = network.run()?;
    match outcome.first_nat {
        Some(packet) => println!("first NAT packet: {}", packet),
        None => println!("first NAT packet: none"),
    }
    println!("repeated delivery: {} after {} deliveries", outcome.repeated, outcome.deliveries.len());
    for failure in &outcome.failures {
        println!("address {} failed: {}", failure.address, failure.error);
    }
    Ok(())
}
