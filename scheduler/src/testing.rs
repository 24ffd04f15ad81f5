//! A recording [`Cpu`] used by the scheduler unit tests.

use std::collections::{BTreeMap, HashSet};

use crate::{Cpu, Pid, Process, ProcessState, SwitchError};

#[derive(Debug, Clone, Copy)]
pub struct Pcb {
    pub pid: Pid,
    pub state: ProcessState,
    pub remaining: Option<u64>,
    pub tickets: u32,
}

impl Process for Pcb {
    fn pid(&self) -> Pid {
        self.pid
    }

    fn state(&self) -> ProcessState {
        self.state
    }

    fn remaining_burst(&self) -> Option<u64> {
        self.remaining
    }

    fn tickets(&self) -> u32 {
        self.tickets
    }
}

/// Keeps a process table and the current pid the way a harness would,
/// and records every switch request.
#[derive(Debug, Default)]
pub struct MockCpu {
    pub time_slice: Option<bool>,
    pub current: Option<Pid>,
    pub table: BTreeMap<Pid, Pcb>,
    pub requests: Vec<Pid>,
    pub refuse: HashSet<Pid>,
}

impl MockCpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a READY process and returns its view.
    pub fn arrive(&mut self, pid: usize, remaining: u64, tickets: u32) -> Pcb {
        let pcb = Pcb {
            pid: Pid::new(pid),
            state: ProcessState::Ready,
            remaining: Some(remaining),
            tickets,
        };
        self.table.insert(pcb.pid, pcb);
        pcb
    }

    /// Runs the current process for `ticks` time units.
    pub fn run(&mut self, ticks: u64) {
        if let Some(pid) = self.current {
            if let Some(pcb) = self.table.get_mut(&pid) {
                pcb.remaining = pcb.remaining.map(|left| left.saturating_sub(ticks));
            }
        }
    }

    /// Ends the time slice of the current process, which stays current.
    pub fn expire(&mut self) -> Pcb {
        let pid = self.current.expect("no running process");
        let pcb = self.table.get_mut(&pid).unwrap();
        pcb.state = ProcessState::Ready;
        *pcb
    }

    /// Blocks the current process.
    pub fn block(&mut self) -> Pcb {
        self.leave(ProcessState::Blocked)
    }

    /// Terminates the current process.
    pub fn terminate(&mut self) -> Pcb {
        self.leave(ProcessState::Terminated)
    }

    /// Makes a blocked process READY again with a new burst.
    pub fn wake(&mut self, pid: usize, remaining: u64) -> Pcb {
        let pcb = self.table.get_mut(&Pid::new(pid)).unwrap();
        pcb.state = ProcessState::Ready;
        pcb.remaining = Some(remaining);
        *pcb
    }

    pub fn requests(&self) -> Vec<usize> {
        self.requests.iter().map(|pid| pid.get()).collect()
    }

    fn leave(&mut self, state: ProcessState) -> Pcb {
        let pid = self.current.take().expect("no running process");
        let pcb = self.table.get_mut(&pid).unwrap();
        pcb.state = state;
        pcb.remaining = None;
        *pcb
    }
}

impl Cpu for MockCpu {
    fn use_time_slice(&mut self, enabled: bool) {
        self.time_slice = Some(enabled);
    }

    fn context_switch(&mut self, pid: Pid) -> Result<(), SwitchError> {
        self.requests.push(pid);
        if self.refuse.contains(&pid) {
            return Err(SwitchError::Refused(pid));
        }
        let state = self
            .table
            .get(&pid)
            .ok_or(SwitchError::UnknownProcess(pid))?
            .state;
        if state != ProcessState::Ready {
            return Err(SwitchError::NotReady { pid, state });
        }
        if let Some(previous) = self.current {
            if let Some(pcb) = self.table.get_mut(&previous) {
                if pcb.state == ProcessState::Running {
                    pcb.state = ProcessState::Ready;
                }
            }
        }
        if let Some(pcb) = self.table.get_mut(&pid) {
            pcb.state = ProcessState::Running;
        }
        self.current = Some(pid);
        Ok(())
    }

    fn current(&self) -> Option<Pid> {
        self.current
    }

    fn inspect(&self, pid: Pid) -> Option<&dyn Process> {
        self.table.get(&pid).map(|pcb| pcb as &dyn Process)
    }
}
