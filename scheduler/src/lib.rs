//! A scheduler library.
//!
//! This library provides CPU scheduling policies that are driven by an
//! external harness. The harness owns the processes and the clock and tells
//! the scheduler about every process transition; the scheduler answers by
//! asking the [`Cpu`] to switch to the process that should run next.
//!

mod scheduler;

pub mod config;
pub mod queue;

pub use crate::config::{Config, InitialPass, PolicyKind, StrideConfig, STRIDE_CONSTANT};
pub use crate::scheduler::{Cpu, Pid, Process, ProcessState, Scheduler, SwitchError};
pub use crate::schedulers::{Engine, RoundRobin, Stcf, Stride, StrideRecord};

mod schedulers;

#[cfg(test)]
mod testing;

/// Returns a structure that implements the `Scheduler` trait with a round robin scheduler policy
///
/// * `cpu` - the processor; time slicing is turned on.
pub fn round_robin(cpu: &mut dyn Cpu) -> impl Scheduler {
    RoundRobin::init(cpu)
}

/// Returns a structure that implements the `Scheduler` trait with a shortest time to
/// completion first policy
///
/// * `cpu` - the processor; time slicing is turned off, the scheduler preempts
///           only when a process with a shorter remaining burst becomes ready.
pub fn stcf(cpu: &mut dyn Cpu) -> impl Scheduler {
    Stcf::init(cpu)
}

/// Returns a structure that implements the `Scheduler` trait with a stride scheduler policy
///
/// * `config` - the stride constant and the starting pass of new processes.
/// * `cpu` - the processor; time slicing is turned on, each expired slice charges
///           the running process one stride.
pub fn stride(config: StrideConfig, cpu: &mut dyn Cpu) -> impl Scheduler {
    Stride::init(config, cpu)
}

/// Returns the scheduler selected by `config.policy`.
pub fn engine(config: &Config, cpu: &mut dyn Cpu) -> Engine {
    Engine::init(config, cpu)
}
