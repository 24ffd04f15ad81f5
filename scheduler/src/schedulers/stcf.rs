use log::{debug, trace, warn};

use super::reconcile;
use crate::queue::ReadySet;
use crate::ProcessState::{Blocked, Ready, Terminated};
use crate::{Cpu, Pid, Process, Scheduler};

/// Shortest time to completion first.
///
/// Always runs the process with the least time left in its current burst,
/// preempting the running process as soon as a shorter one becomes ready.
/// Ties go to the process that entered the ready set first.
///
/// The running process is not part of the ready set. Its pid is kept here
/// and only updated once the processor has accepted a switch.
pub struct Stcf {
    ready: ReadySet<u64>,
    running: Option<Pid>,
}

impl Stcf {
    /// Turns time slicing off and starts with nothing ready or running.
    pub fn init(cpu: &mut dyn Cpu) -> Self {
        cpu.use_time_slice(false);
        Stcf {
            ready: ReadySet::new(),
            running: None,
        }
    }

    /// The ready processes and their remaining burst, shortest first.
    pub fn ready(&self) -> Vec<(Pid, u64)> {
        self.ready.iter().collect()
    }

    pub fn running(&self) -> Option<Pid> {
        self.running
    }

    fn admit(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        let pid = process.pid();
        debug_assert_eq!(process.state(), Ready);
        if let Some(drift) = reconcile(&mut self.running, &*cpu, "stcf") {
            if let Some(adopted) = drift.adopted {
                self.ready.remove(adopted);
            }
            if let Some(view) = drift.displaced_ready(&*cpu) {
                if let Some(left) = view.remaining_burst() {
                    self.ready.insert(view.pid(), left);
                }
            }
        }

        let Some(remaining) = process.remaining_burst() else {
            debug_assert!(false, "process {pid} is ready without a CPU burst");
            return;
        };
        if !self.ready.insert(pid, remaining) {
            debug_assert!(false, "process {pid} is already ready");
        }
        self.reschedule(cpu);
    }

    fn depart(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        let pid = process.pid();
        if self.running == Some(pid) {
            self.running = None;
        }
        self.ready.remove(pid);
        self.reschedule(cpu);
    }

    /// Switches to the shortest ready process if the CPU is idle or the
    /// running process has strictly more time left.
    fn reschedule(&mut self, cpu: &mut dyn Cpu) {
        let Some((next, shortest)) = self.ready.first() else {
            return;
        };

        if let Some(current) = self.running {
            let left = cpu.inspect(current).and_then(|process| process.remaining_burst());
            if matches!(left, Some(left) if shortest >= left) {
                return;
            }
        }

        if let Err(err) = cpu.context_switch(next) {
            warn!("stcf: {err}");
            return;
        }

        self.ready.remove(next);
        let preempted = self.running.replace(next);
        debug!("stcf: switched {preempted:?} -> {next} ({shortest} left)");

        let Some(preempted) = preempted else {
            return;
        };
        let Some(view) = cpu.inspect(preempted) else {
            return;
        };
        if view.state() != Ready {
            return;
        }
        if let Some(left) = view.remaining_burst() {
            self.ready.insert(preempted, left);
        }
    }
}

impl Scheduler for Stcf {
    fn new_process(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        trace!("stcf: new process {}", process.pid());
        self.admit(cpu, process);
    }

    fn finished_time_slice(&mut self, _cpu: &mut dyn Cpu, process: &dyn Process) {
        trace!(
            "stcf: ignoring time slice end of {}, time slicing is off",
            process.pid()
        );
    }

    fn blocked(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        trace!("stcf: {} blocked", process.pid());
        debug_assert_eq!(process.state(), Blocked);
        self.depart(cpu, process);
    }

    fn unblocked(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        trace!("stcf: {} unblocked", process.pid());
        self.admit(cpu, process);
    }

    fn terminated(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        trace!("stcf: {} terminated", process.pid());
        debug_assert_eq!(process.state(), Terminated);
        self.depart(cpu, process);
    }

    fn cleanup(self) {
        debug!("stcf: cleanup with {} ready processes", self.ready.len());
    }
}
