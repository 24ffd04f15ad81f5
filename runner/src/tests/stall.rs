use core::module_path;
use function_name::named;
use processor::{Event, Processor, SimulationError, Workload};
use scheduler::{Cpu, Pid, PolicyKind, Process, RoundRobin, Scheduler, SwitchError};

use super::{options, run};

/// Forgets to dispatch anything once the first process terminates.
struct Forgetful(RoundRobin);

impl Scheduler for Forgetful {
    fn new_process(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        self.0.new_process(cpu, process)
    }

    fn finished_time_slice(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        self.0.finished_time_slice(cpu, process)
    }

    fn blocked(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        self.0.blocked(cpu, process)
    }

    fn unblocked(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        self.0.unblocked(cpu, process)
    }

    fn terminated(&mut self, _cpu: &mut dyn Cpu, _process: &dyn Process) {}

    fn cleanup(self) {
        self.0.cleanup()
    }
}

/// Asks for a process that does not exist before every arrival.
struct Eager(RoundRobin);

impl Scheduler for Eager {
    fn new_process(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        let _ = cpu.context_switch(Pid::new(99));
        self.0.new_process(cpu, process)
    }

    fn finished_time_slice(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        self.0.finished_time_slice(cpu, process)
    }

    fn blocked(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        self.0.blocked(cpu, process)
    }

    fn unblocked(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        self.0.unblocked(cpu, process)
    }

    fn terminated(&mut self, cpu: &mut dyn Cpu, process: &dyn Process) {
        self.0.terminated(cpu, process)
    }

    fn cleanup(self) {
        self.0.cleanup()
    }
}

#[test]
pub fn stall_is_reported() {
    let workload = Workload::new().process(0, 1, &[2]).process(0, 1, &[2]);
    let error = Processor::run(&workload, options(4), |cpu| Forgetful(RoundRobin::init(cpu)))
    .unwrap_err();

    assert_eq!(
        error,
        SimulationError::Stalled {
            time: 2,
            ready: vec![Pid::new(2)]
        }
    );
}

#[test]
pub fn stall_waits_for_blocked_processes() {
    let workload = Workload::new().process(0, 1, &[1, 5, 1]).process(0, 1, &[1]);
    let error = Processor::run(&workload, options(4), |cpu| Forgetful(RoundRobin::init(cpu)))
    .unwrap_err();

    assert_eq!(
        error,
        SimulationError::Stalled {
            time: 6,
            ready: vec![Pid::new(1)]
        }
    );
}

#[test]
#[named]
pub fn refused_switch_is_harmless() {
    let workload = Workload::new().process(0, 1, &[3]).process(1, 1, &[2]);
    let report = Processor::run(&workload, options(2), |cpu| Eager(RoundRobin::init(cpu))).unwrap();

    let refused = report
        .logs
        .iter()
        .filter(|log| {
            log.event
                == Event::Refused {
                    pid: Pid::new(99),
                    reason: SwitchError::UnknownProcess(Pid::new(99)),
                }
        })
        .count();
    assert_eq!(refused, 2);
    run(
        module_path!().split("::").last().unwrap(),
        function_name!(),
        PolicyKind::RoundRobin,
        &report,
        "1 1 2 2 1",
    );
}
