//! Phase-search runner for amplifier pipelines
//!
//! Usage: cargo run --release --example amplifiers <program.txt> [--feedback]

use intcode_emu::{Pipeline, Program};
use std::env;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn")
    ).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <program.txt> [--feedback]", args[0]);
        std::process::exit(1);
    }

    let text = std::fs::read_to_string(&args[1])?;
    let program = Program::parse(&text)?;
    let feedback = args.iter().any(|a| a == "--feedback");
    let candidates: Vec<i64> = if feedback { (5..=9).collect() } else { (0..=4).collect() };

    let (phases, signal) = Pipeline::best_phase_setting(&program, &candidates, feedback, 0)?;
    println!("best phases {:?} -> {}", phases, signal);
    Ok(())
}
