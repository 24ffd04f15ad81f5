//! A processor simulation library
//!
//! This is used for driving the schedulers from the [`scheduler`] crate. The
//! simulator owns the processes and the clock: it creates processes when
//! they arrive, runs their CPU bursts one tick at a time, parks them for
//! their I/O and tells the scheduler about every transition.

use std::collections::{BTreeMap, VecDeque};
use std::fmt::{self, Display};
use std::num::NonZeroU64;

use log::{debug, trace};
use scheduler::{Cpu, Pid, Process, ProcessState, Scheduler, SwitchError};
use thiserror::Error;

mod workload;

pub use workload::{ProcessSpec, Workload, WorkloadError, WorkloadErrorKind};

/// Something that happened during the simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The scheduler turned time slicing on or off.
    TimeSlicing(bool),
    Arrived(Pid),
    Expired(Pid),
    Blocked(Pid),
    Unblocked(Pid),
    Terminated(Pid),
    /// The scheduler switched the processor to `to`.
    Switch { from: Option<Pid>, to: Pid },
    /// The processor refused a switch requested by the scheduler.
    Refused { pid: Pid, reason: SwitchError },
}

impl Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::TimeSlicing(enabled) => {
                write!(f, "time slicing {}", if *enabled { "on" } else { "off" })
            }
            Event::Arrived(pid) => write!(f, "{pid} arrived"),
            Event::Expired(pid) => write!(f, "{pid} time slice expired"),
            Event::Blocked(pid) => write!(f, "{pid} blocked"),
            Event::Unblocked(pid) => write!(f, "{pid} unblocked"),
            Event::Terminated(pid) => write!(f, "{pid} terminated"),
            Event::Switch { from: Some(from), to } => write!(f, "switch {from} -> {to}"),
            Event::Switch { from: None, to } => write!(f, "switch idle -> {to}"),
            Event::Refused { pid, reason } => write!(f, "switch to {pid} refused: {reason}"),
        }
    }
}

/// Simulation log entry
#[derive(Debug, Clone, PartialEq)]
pub struct Log {
    /// The tick at which the event happened.
    pub time: u64,

    pub event: Event,
}

impl Display for Log {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:>4}] {}", self.time, self.event)
    }
}

/// Information about a process at the end of the simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    /// The PID of the process.
    pub pid: Pid,

    pub tickets: u32,

    pub arrival: u64,

    /// The tick at which the process terminated.
    pub finish: Option<u64>,

    /// The process timings (turnaround time, time spent ready, running time).
    pub timings: (u64, u64, u64),
}

impl Display for ProcessInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let finish = self
            .finish
            .map(|finish| finish.to_string())
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.pid,
            self.tickets,
            self.arrival,
            finish,
            self.timings.0,
            self.timings.1,
            self.timings.2
        )
    }
}

/// The outcome of a simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub logs: Vec<Log>,

    /// The process that ran during each tick, [`None`] while idle.
    pub schedule: Vec<Option<Pid>>,

    pub processes: Vec<ProcessInfo>,

    /// The number of switches the processor accepted.
    pub switches: usize,
}

impl Report {
    /// The number of ticks `pid` ran for.
    pub fn ticks_of(&self, pid: Pid) -> usize {
        self.schedule
            .iter()
            .filter(|slot| **slot == Some(pid))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Workload(#[from] WorkloadError),

    /// Processes are ready but nothing runs and no future event can change that.
    #[error("stalled at tick {time}: processes {ready:?} are ready but none is running")]
    Stalled { time: u64, ready: Vec<Pid> },

    #[error("simulation did not finish within {0} ticks")]
    TickLimit(u64),
}

/// Simulation parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Options {
    /// The length of a time slice, when the scheduler uses time slicing.
    pub quantum: NonZeroU64,

    /// Stop with [`SimulationError::TickLimit`] after this many ticks.
    pub max_ticks: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            quantum: NonZeroU64::MIN.saturating_add(1),
            max_ticks: None,
        }
    }
}

/// Process Control Block.
#[derive(Debug)]
struct Pcb {
    pid: Pid,
    tickets: u32,
    arrival: u64,
    bursts: Vec<u64>,
    next_burst: usize,
    remaining: Option<u64>,
    state: ProcessState,
    wake_at: Option<u64>,
    finish: Option<u64>,
    waiting: u64,
    executing: u64,
}

impl Pcb {
    fn new(spec: &ProcessSpec) -> Self {
        Pcb {
            pid: spec.pid,
            tickets: spec.tickets,
            arrival: spec.arrival,
            bursts: spec.bursts.clone(),
            next_burst: 1,
            remaining: spec.bursts.first().copied(),
            state: ProcessState::Ready,
            wake_at: None,
            finish: None,
            waiting: 0,
            executing: 0,
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            pid: self.pid,
            state: self.state,
            remaining: self.remaining,
            tickets: self.tickets,
        }
    }

    fn info(&self) -> ProcessInfo {
        let turnaround = self
            .finish
            .map(|finish| finish - self.arrival)
            .unwrap_or_default();
        ProcessInfo {
            pid: self.pid,
            tickets: self.tickets,
            arrival: self.arrival,
            finish: self.finish,
            timings: (turnaround, self.waiting, self.executing),
        }
    }
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

/// The copy of a PCB handed to a scheduler callback.
#[derive(Debug, Copy, Clone)]
struct Snapshot {
    pid: Pid,
    state: ProcessState,
    remaining: Option<u64>,
    tickets: u32,
}

impl Process for Snapshot {
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

/// The part of the simulator a scheduler talks to.
struct Machine {
    table: BTreeMap<Pid, Pcb>,
    current: Option<Pid>,
    time_slice: bool,
    quantum_used: u64,
    time: u64,
    logs: Vec<Log>,
    schedule: Vec<Option<Pid>>,
    switches: usize,
}

impl Machine {
    fn new() -> Self {
        Machine {
            table: BTreeMap::new(),
            current: None,
            time_slice: false,
            quantum_used: 0,
            time: 0,
            logs: vec![],
            schedule: vec![],
            switches: 0,
        }
    }

    fn log(&mut self, event: Event) {
        trace!("[{}] {}", self.time, event);
        self.logs.push(Log {
            time: self.time,
            event,
        });
    }

    fn try_switch(&mut self, pid: Pid) -> Result<(), SwitchError> {
        let state = self
            .table
            .get(&pid)
            .ok_or(SwitchError::UnknownProcess(pid))?
            .state;
        if state != ProcessState::Ready {
            return Err(SwitchError::NotReady { pid, state });
        }

        let from = self.current;
        if let Some(previous) = from.filter(|previous| *previous != pid) {
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
        self.quantum_used = 0;
        self.switches += 1;
        debug!("[{}] switch {:?} -> {}", self.time, from, pid);
        self.log(Event::Switch { from, to: pid });
        Ok(())
    }

    /// A process whose time slice ended and that was not switched away
    /// keeps the processor.
    fn resume(&mut self) {
        if let Some(pcb) = self.current.and_then(|pid| self.table.get_mut(&pid)) {
            if pcb.state == ProcessState::Ready {
                pcb.state = ProcessState::Running;
            }
        }
    }

    fn tick(&mut self) {
        self.schedule.push(self.current);
        for pcb in self.table.values_mut() {
            match pcb.state {
                ProcessState::Running => {
                    pcb.executing += 1;
                    pcb.remaining = pcb.remaining.map(|left| left.saturating_sub(1));
                }
                ProcessState::Ready => pcb.waiting += 1,
                ProcessState::Blocked | ProcessState::Terminated => {}
            }
        }
        if self.current.is_some() {
            self.quantum_used += 1;
        }
        self.time += 1;
    }

    fn ready(&self) -> Vec<Pid> {
        self.table
            .values()
            .filter(|pcb| pcb.state == ProcessState::Ready)
            .map(|pcb| pcb.pid)
            .collect()
    }

    fn any_blocked(&self) -> bool {
        self.table
            .values()
            .any(|pcb| pcb.state == ProcessState::Blocked)
    }

    fn all_terminated(&self) -> bool {
        self.table
            .values()
            .all(|pcb| pcb.state == ProcessState::Terminated)
    }

    fn report(self) -> Report {
        Report {
            logs: self.logs,
            schedule: self.schedule,
            processes: self.table.values().map(Pcb::info).collect(),
            switches: self.switches,
        }
    }
}

impl Cpu for Machine {
    fn use_time_slice(&mut self, enabled: bool) {
        self.time_slice = enabled;
        self.log(Event::TimeSlicing(enabled));
    }

    fn context_switch(&mut self, pid: Pid) -> Result<(), SwitchError> {
        let result = self.try_switch(pid);
        if let Err(reason) = result {
            debug!("[{}] switch to {} refused: {}", self.time, pid, reason);
            self.log(Event::Refused { pid, reason });
        }
        result
    }

    fn current(&self) -> Option<Pid> {
        self.current
    }

    fn inspect(&self, pid: Pid) -> Option<&dyn Process> {
        self.table.get(&pid).map(|pcb| pcb as &dyn Process)
    }
}

/// The processor simulator.
pub struct Processor<S: Scheduler> {
    machine: Machine,
    scheduler: S,
    pending: VecDeque<ProcessSpec>,
    options: Options,
}

impl<S: Scheduler> Processor<S> {
    /// Runs a simulation to completion.
    ///
    /// * `workload` - the processes to simulate.
    /// * `options` - the time slice length and an optional tick limit.
    /// * `init` - builds the scheduler; it gets the processor so that it can
    ///            configure time slicing.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use processor::{Options, Processor, Workload};
    ///
    /// let workload = Workload::new()
    ///     .process(0, 1, &[4])
    ///     .process(0, 1, &[2, 3, 2]);
    ///
    /// let report = Processor::run(&workload, Options::default(), scheduler::round_robin).unwrap();
    /// assert_eq!(report.schedule.len(), 9);
    /// ```
    pub fn run<F>(workload: &Workload, options: Options, init: F) -> Result<Report, SimulationError>
    where
        F: FnOnce(&mut dyn Cpu) -> S,
    {
        workload.validate()?;

        let mut machine = Machine::new();
        let scheduler = init(&mut machine as &mut dyn Cpu);

        let mut pending = workload.processes.clone();
        pending.sort_by_key(|spec| spec.arrival);

        let mut processor = Processor {
            machine,
            scheduler,
            pending: pending.into(),
            options,
        };
        processor.simulate()?;

        let Processor {
            machine, scheduler, ..
        } = processor;
        scheduler.cleanup();
        Ok(machine.report())
    }

    fn simulate(&mut self) -> Result<(), SimulationError> {
        loop {
            let now = self.machine.time;
            self.arrive(now);
            self.wake(now);
            self.machine.resume();

            if self.pending.is_empty() && self.machine.all_terminated() {
                debug!("[{now}] all processes terminated");
                return Ok(());
            }
            if let Some(limit) = self.options.max_ticks {
                if now >= limit {
                    return Err(SimulationError::TickLimit(limit));
                }
            }
            if self.machine.current.is_none()
                && self.pending.is_empty()
                && !self.machine.any_blocked()
            {
                return Err(SimulationError::Stalled {
                    time: now,
                    ready: self.machine.ready(),
                });
            }

            self.machine.tick();
            self.complete_tick();
        }
    }

    fn arrive(&mut self, now: u64) {
        while self
            .pending
            .front()
            .is_some_and(|spec| spec.arrival <= now)
        {
            let Some(spec) = self.pending.pop_front() else {
                break;
            };
            let pcb = Pcb::new(&spec);
            let snapshot = pcb.snapshot();
            self.machine.table.insert(spec.pid, pcb);
            self.machine.log(Event::Arrived(spec.pid));
            self.scheduler.new_process(&mut self.machine, &snapshot);
        }
    }

    fn wake(&mut self, now: u64) {
        let waking: Vec<Pid> = self
            .machine
            .table
            .values()
            .filter(|pcb| pcb.state == ProcessState::Blocked && pcb.wake_at == Some(now))
            .map(|pcb| pcb.pid)
            .collect();

        for pid in waking {
            let Some(pcb) = self.machine.table.get_mut(&pid) else {
                continue;
            };
            pcb.state = ProcessState::Ready;
            pcb.wake_at = None;
            pcb.remaining = pcb.bursts.get(pcb.next_burst).copied();
            pcb.next_burst += 1;
            let snapshot = pcb.snapshot();
            self.machine.log(Event::Unblocked(pid));
            self.scheduler.unblocked(&mut self.machine, &snapshot);
        }
    }

    /// Delivers the event the last tick caused for the running process, if any.
    fn complete_tick(&mut self) {
        let Some(pid) = self.machine.current else {
            return;
        };
        let now = self.machine.time;
        let time_slice_over =
            self.machine.time_slice && self.machine.quantum_used >= self.options.quantum.get();
        let Some(pcb) = self.machine.table.get_mut(&pid) else {
            return;
        };

        if pcb.remaining == Some(0) {
            pcb.remaining = None;
            self.machine.current = None;
            if let Some(io) = pcb.bursts.get(pcb.next_burst).copied() {
                pcb.next_burst += 1;
                pcb.state = ProcessState::Blocked;
                pcb.wake_at = Some(now + io);
                let snapshot = pcb.snapshot();
                self.machine.log(Event::Blocked(pid));
                self.scheduler.blocked(&mut self.machine, &snapshot);
            } else {
                pcb.state = ProcessState::Terminated;
                pcb.finish = Some(now);
                let snapshot = pcb.snapshot();
                self.machine.log(Event::Terminated(pid));
                self.scheduler.terminated(&mut self.machine, &snapshot);
            }
        } else if time_slice_over {
            pcb.state = ProcessState::Ready;
            self.machine.quantum_used = 0;
            let snapshot = pcb.snapshot();
            self.machine.log(Event::Expired(pid));
            self.scheduler.finished_time_slice(&mut self.machine, &snapshot);
        }
    }
}

/// Format the [`Processor`]'s logs to a [`String`].
///
/// * `logs` - the logs returned by the [`Processor`].
pub fn format_logs(logs: &[Log]) -> String {
    let mut s = String::new();
    for log in logs {
        fmt::write(&mut s, format_args!("{}\n", log)).unwrap_or_default();
    }
    s
}

/// Format a schedule as one entry per tick, `-` for an idle tick.
pub fn format_schedule(schedule: &[Option<Pid>]) -> String {
    schedule
        .iter()
        .map(|slot| match slot {
            Some(pid) => pid.to_string(),
            None => "-".to_string(),
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Format the per-process statistics as a table.
pub fn format_processes(processes: &[ProcessInfo]) -> String {
    let mut s = String::from("PID\tTICKETS\tARRIVAL\tFINISH\tTURN\tWAIT\tEXEC\n");
    for process in processes {
        fmt::write(&mut s, format_args!("{}\n", process)).unwrap_or_default();
    }
    s
}
