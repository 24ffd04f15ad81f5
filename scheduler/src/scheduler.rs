use std::fmt::{self, Display};

use thiserror::Error;

/// The PID of a process
///
/// PIDs are small non-negative integers handed out by the harness.
/// The absence of a process is expressed as `Option<Pid>`.
#[derive(PartialEq, Eq, Copy, Clone, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct Pid(usize);

impl Pid {
    pub fn new(pid: usize) -> Pid {
        Pid(pid)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl PartialEq<usize> for Pid {
    fn eq(&self, other: &usize) -> bool {
        self.0 == *other
    }
}

impl Display for Pid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The lifecycle state of a process, as reported by the harness.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProcessState {
    /// The process is ready to be scheduled.
    Ready,

    /// The process is currently scheduled.
    Running,

    /// The process is waiting for an I/O operation to finish.
    Blocked,

    /// The process finished its last CPU burst.
    Terminated,
}

impl Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessState::Ready => write!(f, "READY"),
            ProcessState::Running => write!(f, "RUNNING"),
            ProcessState::Blocked => write!(f, "BLOCKED"),
            ProcessState::Terminated => write!(f, "TERMINATED"),
        }
    }
}

/// The trait that the Process Control Block (PCB) has to implement.
///
/// This is the read-only view a scheduler gets of a process. A reference
/// handed to a scheduler callback is only valid for the duration of that
/// call; schedulers keep their own copies of whatever they need later.
pub trait Process {
    /// Return the PID of the process.
    fn pid(&self) -> Pid;

    /// Return the state of the process.
    fn state(&self) -> ProcessState;

    /// Returns the time left in the current CPU burst.
    ///
    /// This is [`None`] while the process has no active burst, for example
    /// while it is blocked.
    fn remaining_burst(&self) -> Option<u64>;

    /// Returns the number of tickets the process holds. Only stride
    /// scheduling looks at this value.
    fn tickets(&self) -> u32;
}

/// The reason a [`Cpu`] refused a context switch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum SwitchError {
    #[error("process {0} is not known to the processor")]
    UnknownProcess(Pid),

    #[error("process {pid} is {state}, only READY processes can be switched to")]
    NotReady { pid: Pid, state: ProcessState },

    #[error("processor refused to switch to process {0}")]
    Refused(Pid),
}

/// The interface that the harness offers to a scheduler.
pub trait Cpu {
    /// Enables or disables preemption through fixed length time slices.
    fn use_time_slice(&mut self, enabled: bool);

    /// Asks the processor to run the process with PID `pid`.
    ///
    /// The scheduler must not treat `pid` as running unless this returns `Ok`.
    fn context_switch(&mut self, pid: Pid) -> Result<(), SwitchError>;

    /// Returns the PID of the process that the processor is currently running.
    fn current(&self) -> Option<Pid>;

    /// Returns the live view of a process.
    fn inspect(&self, pid: Pid) -> Option<&dyn Process>;
}

/// The trait that any scheduler has to implement.
///
/// A scheduler is created by its `init` constructor, which receives the
/// [`Cpu`] so it can configure time slicing, and is consumed by
/// [`Scheduler::cleanup`]. The harness delivers exactly one callback per
/// process transition, one at a time.
pub trait Scheduler {
    /// A new process arrived. The process is READY.
    fn new_process(&mut self, cpu: &mut dyn Cpu, process: &dyn Process);

    /// The running process used up its time slice but has time left in its
    /// burst. The process is READY.
    fn finished_time_slice(&mut self, cpu: &mut dyn Cpu, process: &dyn Process);

    /// The running process started an I/O operation. The process is BLOCKED.
    fn blocked(&mut self, cpu: &mut dyn Cpu, process: &dyn Process);

    /// A blocked process finished its I/O operation. The process is READY.
    fn unblocked(&mut self, cpu: &mut dyn Cpu, process: &dyn Process);

    /// The running process finished its last burst. The process is TERMINATED.
    fn terminated(&mut self, cpu: &mut dyn Cpu, process: &dyn Process);

    /// Releases every piece of state held by the scheduler.
    fn cleanup(self)
    where
        Self: Sized;
}
