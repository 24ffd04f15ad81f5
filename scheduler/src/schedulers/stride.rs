use std::collections::HashMap;

use log::{debug, trace, warn};

use super::reconcile;
use crate::config::{InitialPass, StrideConfig};
use crate::queue::ReadySet;
use crate::ProcessState::{Blocked, Ready, Terminated};
use crate::{Cpu, Pid, Process, Scheduler};

/// Per-process bookkeeping, created on arrival and dropped on termination.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StrideRecord {
    pub stride: u64,
    pub pass: u64,
}

/// Proportional share scheduling.
///
/// Each process advances a virtual clock (its pass) by its stride for every
/// time slice it consumes; the ready process with the lowest pass runs next.
/// A process holding twice as many tickets has half the stride and so gets
/// twice the CPU time.
///
/// The running process is kept out of the ready set.
pub struct Stride {
    config: StrideConfig,
    records: HashMap<Pid, StrideRecord>,
    ready: ReadySet<u64>,
    running: Option<Pid>,
}

impl Stride {
    /// Turns time slicing on and starts with no processes.
    pub fn init(config: StrideConfig, cpu: &mut dyn Cpu) -> Self {
        cpu.use_time_slice(true);
        Stride {
            config,
            records: HashMap::new(),
            ready: ReadySet::new(),
            running: None,
        }
    }

    pub fn record(&self, pid: Pid) -> Option<StrideRecord> {
        self.records.get(&pid).copied()
    }

    /// The ready processes and their pass, lowest first.
    pub fn ready(&self) -> Vec<(Pid, u64)> {
        self.ready.iter().collect()
    }

    pub fn running(&self) -> Option<Pid> {
        self.running
    }

    fn stride_for(&self, tickets: u32) -> u64 {
        (self.config.stride_constant / u64::from(tickets)).max(1)
    }

    fn initial_pass(&self) -> u64 {
        match self.config.initial_pass {
            InitialPass::Zero => 0,
            InitialPass::MinimumReady => self
                .ready
                .first()
                .map(|(_, pass)| pass)
                .or_else(|| self.running.and_then(|pid| self.record(pid)).map(|r| r.pass))
                .unwrap_or(0),
        }
    }

    /// Charges `pid` one stride for the CPU time it just used.
    fn charge(&mut self, pid: Pid) -> Option<u64> {
        let record = self.records.get_mut(&pid)?;
        record.pass += record.stride;
        Some(record.pass)
    }

    fn sync_running(&mut self, cpu: &dyn Cpu) {
        let Some(drift) = reconcile(&mut self.running, cpu, "stride") else {
            return;
        };
        if let Some(adopted) = drift.adopted {
            self.ready.remove(adopted);
        }
        if let Some(view) = drift.displaced_ready(cpu) {
            if let Some(record) = self.record(view.pid()) {
                self.ready.insert(view.pid(), record.pass);
            }
        }
    }

    /// Runs the ready process with the lowest pass unless the processor is
    /// already running it.
    fn schedule_next(&mut self, cpu: &mut dyn Cpu) {
        let Some((next, pass)) = self.ready.first() else {
            return;
        };

        if cpu.current() == Some(next) {
            self.ready.remove(next);
            self.running = Some(next);
            return;
        }

        match cpu.context_switch(next) {
            Ok(()) => {
                self.ready.remove(next);
                debug!("stride: switched {:?} -> {next} (pass {pass})", self.running);
                self.running = Some(next);
            }
            Err(err) => {
                warn!("stride: {err}");
                self.keep_current(cpu);
            }
        }
    }

    /// After a refused switch the processor goes on running its current
    /// process, which must not stay in the ready set.
    fn keep_current(&mut self, cpu: &dyn Cpu) {
        let Some(current) = cpu.current() else {
            return;
        };
        if self.ready.remove(current).is_some() {
            self.running = Some(current);
        }
    }
}

impl Scheduler for Stride {
    fn new_process(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        let pid = process.pid();
        trace!("stride: new process {pid}");
        debug_assert_eq!(process.state(), Ready);
        debug_assert!(process.tickets() > 0, "process {pid} holds no tickets");
        debug_assert!(!self.records.contains_key(&pid), "process {pid} arrived twice");
        self.sync_running(&*cpu);

        let record = StrideRecord {
            stride: self.stride_for(process.tickets().max(1)),
            pass: self.initial_pass(),
        };
        self.records.insert(pid, record);
        self.ready.reposition(pid, record.pass);

        if cpu.current().is_none() {
            self.schedule_next(cpu);
        }
    }

    fn finished_time_slice(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        let pid = process.pid();
        trace!("stride: time slice of {pid} finished");
        debug_assert_eq!(process.state(), Ready);
        let Some(pass) = self.charge(pid) else {
            debug_assert!(false, "time slice end for unknown process {pid}");
            return;
        };

        if self.running == Some(pid) {
            self.running = None;
        }
        self.ready.reposition(pid, pass);
        self.schedule_next(cpu);
    }

    fn blocked(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        let pid = process.pid();
        trace!("stride: {pid} blocked");
        debug_assert_eq!(process.state(), Blocked);
        self.charge(pid);
        self.ready.remove(pid);
        if self.running == Some(pid) {
            self.running = None;
        }
        self.schedule_next(cpu);
    }

    fn unblocked(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        let pid = process.pid();
        trace!("stride: {pid} unblocked");
        debug_assert_eq!(process.state(), Ready);
        self.sync_running(&*cpu);
        let Some(record) = self.record(pid) else {
            debug_assert!(false, "unblocked unknown process {pid}");
            return;
        };
        self.ready.reposition(pid, record.pass);

        if cpu.current().is_none() {
            self.schedule_next(cpu);
        }
    }

    fn terminated(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        let pid = process.pid();
        trace!("stride: {pid} terminated");
        debug_assert_eq!(process.state(), Terminated);
        self.charge(pid);
        self.ready.remove(pid);
        self.records.remove(&pid);
        if self.running == Some(pid) {
            self.running = None;
        }
        self.schedule_next(cpu);
    }

    fn cleanup(self) {
        debug!("stride: cleanup with {} records", self.records.len());
    }
}
