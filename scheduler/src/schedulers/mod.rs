//! The scheduling policies.
//!
//! Each policy lives in its own file. [`Engine`] wraps all of them so the
//! policy can be picked at run time.

use log::warn;

use crate::config::{Config, PolicyKind};
use crate::{Cpu, Pid, Process, ProcessState, Scheduler};

mod round_robin;
pub use round_robin::RoundRobin;

mod stcf;
pub use stcf::Stcf;

mod stride;
pub use stride::{Stride, StrideRecord};

/// How a scheduler's record of the running process differed from the
/// processor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Drift {
    /// The pid the processor reports as running, now adopted.
    pub adopted: Option<Pid>,
    /// The pid the scheduler had recorded, no longer running.
    pub displaced: Option<Pid>,
}

impl Drift {
    /// The displaced process, if the processor shows it READY and it
    /// should go back to the ready set.
    pub fn displaced_ready<'a>(&self, cpu: &'a dyn Cpu) -> Option<&'a dyn Process> {
        let view = cpu.inspect(self.displaced?)?;
        (view.state() == ProcessState::Ready).then_some(view)
    }
}

/// Brings a scheduler's record of the running process in line with what
/// the processor reports.
///
/// Returns [`None`] when the two agree.
pub(crate) fn reconcile(
    running: &mut Option<Pid>,
    cpu: &dyn Cpu,
    policy: &str,
) -> Option<Drift> {
    let reported = cpu.current();
    if reported == *running {
        return None;
    }
    warn!("{policy}: running process was {running:?}, processor reports {reported:?}");
    let displaced = std::mem::replace(running, reported);
    Some(Drift {
        adopted: reported,
        displaced,
    })
}

/// One of the scheduling policies, chosen at run time.
pub enum Engine {
    RoundRobin(RoundRobin),
    Stcf(Stcf),
    Stride(Stride),
}

impl Engine {
    pub fn init(config: &Config, cpu: &mut dyn Cpu) -> Self {
        match config.policy {
            PolicyKind::RoundRobin => Engine::RoundRobin(RoundRobin::init(cpu)),
            PolicyKind::Stcf => Engine::Stcf(Stcf::init(cpu)),
            PolicyKind::Stride => Engine::Stride(Stride::init(config.stride, cpu)),
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Engine::RoundRobin(_) => PolicyKind::RoundRobin,
            Engine::Stcf(_) => PolicyKind::Stcf,
            Engine::Stride(_) => PolicyKind::Stride,
        }
    }

    fn inner(&mut self) -> &mut dyn Scheduler {
        match self {
            Engine::RoundRobin(scheduler) => scheduler,
            Engine::Stcf(scheduler) => scheduler,
            Engine::Stride(scheduler) => scheduler,
        }
    }
}

impl Scheduler for Engine {
    fn new_process(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        self.inner().new_process(cpu, process)
    }

    fn finished_time_slice(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        self.inner().finished_time_slice(cpu, process)
    }

    fn blocked(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        self.inner().blocked(cpu, process)
    }

    fn unblocked(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        self.inner().unblocked(cpu, process)
    }

    fn terminated(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        self.inner().terminated(cpu, process)
    }

    fn cleanup(self) {
        match self {
            Engine::RoundRobin(scheduler) => scheduler.cleanup(),
            Engine::Stcf(scheduler) => scheduler.cleanup(),
            Engine::Stride(scheduler) => scheduler.cleanup(),
        }
    }
}
