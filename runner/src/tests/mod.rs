use scheduler::{Config, InitialPass, PolicyKind, StrideConfig};

use std::env;
use std::fs;
use std::num::NonZeroU64;

use processor::{format_logs, format_schedule, Options, Processor, Report, Workload};

mod stall;

use super::DEMO_WORKLOAD as DEMO;

static POLICIES: [PolicyKind; 3] = [PolicyKind::RoundRobin, PolicyKind::Stcf, PolicyKind::Stride];

fn write_logs(policy: PolicyKind, folder: &str, name: &str, logs: &str) {
    fs::create_dir_all(format!("../outputs/{policy}/{folder}")).unwrap();
    fs::write(format!("../outputs/{policy}/{folder}/{name}.log"), logs).unwrap();
}

/// Compares the schedule with `expected` and dumps the trace to
/// `../outputs` when `WRITE_OUTPUT` is set.
fn run(folder: &str, name: &str, policy: PolicyKind, report: &Report, expected: &str) {
    if env::var("WRITE_OUTPUT").is_ok() {
        write_logs(policy, folder, name, &format_logs(&report.logs));
    }

    println!("\nleft = Correct Schedule\nright = Your Schedule ({policy})\n");
    use pretty_assertions::assert_eq;
    assert_eq!(expected, format_schedule(&report.schedule));
}

fn options(quantum: u64) -> Options {
    Options {
        quantum: NonZeroU64::new(quantum).unwrap(),
        max_ticks: Some(10_000),
    }
}

fn simulate(policy: PolicyKind, quantum: u64, workload: &Workload) -> Report {
    simulate_with(policy, InitialPass::Zero, quantum, workload)
}

fn simulate_with(
    policy: PolicyKind,
    initial_pass: InitialPass,
    quantum: u64,
    workload: &Workload,
) -> Report {
    let config = Config {
        policy,
        stride: StrideConfig {
            initial_pass,
            ..StrideConfig::default()
        },
    };
    Processor::run(workload, options(quantum), |cpu| scheduler::engine(&config, cpu)).unwrap()
}
