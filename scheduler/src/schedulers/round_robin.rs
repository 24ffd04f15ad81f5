use log::{debug, trace, warn};

use crate::queue::ReadyQueue;
use crate::ProcessState::{Blocked, Ready, Terminated};
use crate::{Cpu, Pid, Process, Scheduler};

/// Round robin over a FIFO of ready processes.
///
/// The running process stays at the head of the queue while it runs. When
/// its time slice ends it is rotated to the tail and the new head is
/// dispatched.
pub struct RoundRobin {
    ready_queue: ReadyQueue,
    running: Option<Pid>,
}

impl RoundRobin {
    /// Turns time slicing on and starts with an empty queue.
    pub fn init(cpu: &mut dyn Cpu) -> Self {
        cpu.use_time_slice(true);
        RoundRobin {
            ready_queue: ReadyQueue::new(),
            running: None,
        }
    }

    /// The ready queue, head first. The head is normally the running process.
    pub fn queue(&self) -> Vec<Pid> {
        self.ready_queue.iter().collect()
    }

    pub fn running(&self) -> Option<Pid> {
        self.running
    }

    fn enqueue(&mut self, process: &dyn Process) {
        if !self.ready_queue.push_back(process.pid()) {
            debug_assert!(false, "process {} queued twice", process.pid());
        }
    }

    /// Takes the running process out of the queue.
    ///
    /// It is normally the head, but after a refused switch it keeps running
    /// from wherever rotation left it.
    fn dequeue_running(&mut self, process: &dyn Process, event: &str) {
        let pid = process.pid();
        if self.ready_queue.front() == Some(pid) {
            self.ready_queue.pop_front();
            return;
        }
        debug_assert_eq!(
            self.running,
            Some(pid),
            "{event}: process {pid} is neither running nor at the head of the queue"
        );
        self.ready_queue.remove(pid);
    }

    /// Switches to the head of the queue unless it is already running.
    fn dispatch(&mut self, cpu: &mut dyn Cpu) {
        let Some(head) = self.ready_queue.front() else {
            return;
        };
        if self.running == Some(head) {
            return;
        }
        match cpu.context_switch(head) {
            Ok(()) => {
                debug!("round robin: switched {:?} -> {}", self.running, head);
                self.running = Some(head);
            }
            Err(err) => warn!("round robin: {err}"),
        }
    }
}

impl Scheduler for RoundRobin {
    fn new_process(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        trace!("round robin: new process {}", process.pid());
        debug_assert_eq!(process.state(), Ready);
        self.enqueue(process);
        self.dispatch(cpu);
    }

    fn finished_time_slice(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        trace!("round robin: time slice of {} finished", process.pid());
        debug_assert_eq!(process.state(), Ready);
        self.dequeue_running(process, "finished_time_slice");
        self.enqueue(process);
        self.dispatch(cpu);
    }

    fn blocked(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        trace!("round robin: {} blocked", process.pid());
        debug_assert_eq!(process.state(), Blocked);
        self.dequeue_running(process, "blocked");
        self.running = None;
        self.dispatch(cpu);
    }

    fn unblocked(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        trace!("round robin: {} unblocked", process.pid());
        debug_assert_eq!(process.state(), Ready);
        self.enqueue(process);
        self.dispatch(cpu);
    }

    fn terminated(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        trace!("round robin: {} terminated", process.pid());
        debug_assert_eq!(process.state(), Terminated);
        self.dequeue_running(process, "terminated");
        self.running = None;
        self.dispatch(cpu);
    }

    fn cleanup(self) {
        debug!(
            "round robin: cleanup with {} queued processes",
            self.ready_queue.len()
        );
    }
}
