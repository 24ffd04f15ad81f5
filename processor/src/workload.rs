use std::str::FromStr;

use scheduler::Pid;
use thiserror::Error;

/// A process the simulator will create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub pid: Pid,

    /// The tick at which the process arrives.
    pub arrival: u64,

    /// Stride scheduling tickets.
    pub tickets: u32,

    /// Alternating CPU and I/O durations, starting and ending with CPU.
    pub bursts: Vec<u64>,
}

/// The set of processes for one simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workload {
    pub processes: Vec<ProcessSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkloadErrorKind {
    #[error("`{0}` is not a number")]
    BadNumber(String),
    #[error("expected `<arrival> <tickets> <cpu> [<io> <cpu>]...`")]
    MissingFields,
    #[error("a process needs at least one ticket")]
    NoTickets,
    #[error("bursts must alternate CPU and I/O and end with a CPU burst")]
    EndsWithIo,
    #[error("bursts must last at least one tick")]
    EmptyBurst,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("workload line {line}: {kind}")]
pub struct WorkloadError {
    pub line: usize,
    pub kind: WorkloadErrorKind,
}

impl Workload {
    pub fn new() -> Self {
        Workload::default()
    }

    /// Adds a process and gives it the next pid, starting from 1.
    ///
    /// * `arrival` - the tick the process arrives at.
    /// * `tickets` - the tickets the process holds.
    /// * `bursts` - CPU and I/O durations, starting and ending with CPU.
    pub fn process(mut self, arrival: u64, tickets: u32, bursts: &[u64]) -> Self {
        let pid = Pid::new(self.processes.len() + 1);
        self.processes.push(ProcessSpec {
            pid,
            arrival,
            tickets,
            bursts: bursts.to_vec(),
        });
        self
    }

    /// Parses one process per line: `<arrival> <tickets> <cpu> [<io> <cpu>]...`.
    ///
    /// Blank lines are skipped and `#` starts a comment.
    pub fn parse(text: &str) -> Result<Workload, WorkloadError> {
        let mut workload = Workload::new();
        for (index, line) in text.lines().enumerate() {
            let content = line.split('#').next().unwrap_or_default().trim();
            if content.is_empty() {
                continue;
            }
            let error = |kind| WorkloadError {
                line: index + 1,
                kind,
            };

            let numbers = content
                .split_whitespace()
                .map(|field| {
                    field
                        .parse::<u64>()
                        .map_err(|_| error(WorkloadErrorKind::BadNumber(field.to_string())))
                })
                .collect::<Result<Vec<u64>, _>>()?;

            let [arrival, tickets, bursts @ ..] = numbers.as_slice() else {
                return Err(error(WorkloadErrorKind::MissingFields));
            };
            if bursts.is_empty() {
                return Err(error(WorkloadErrorKind::MissingFields));
            }
            let tickets = u32::try_from(*tickets)
                .map_err(|_| error(WorkloadErrorKind::BadNumber(tickets.to_string())))?;
            if tickets == 0 {
                return Err(error(WorkloadErrorKind::NoTickets));
            }
            if bursts.len() % 2 == 0 {
                return Err(error(WorkloadErrorKind::EndsWithIo));
            }
            if bursts.contains(&0) {
                return Err(error(WorkloadErrorKind::EmptyBurst));
            }

            workload = workload.process(*arrival, tickets, bursts);
        }
        Ok(workload)
    }

    /// Checks the invariants [`Workload::parse`] enforces, for workloads
    /// built in code.
    pub fn validate(&self) -> Result<(), WorkloadError> {
        for (index, spec) in self.processes.iter().enumerate() {
            let error = |kind| WorkloadError {
                line: index + 1,
                kind,
            };
            if spec.tickets == 0 {
                return Err(error(WorkloadErrorKind::NoTickets));
            }
            if spec.bursts.is_empty() {
                return Err(error(WorkloadErrorKind::MissingFields));
            }
            if spec.bursts.len() % 2 == 0 {
                return Err(error(WorkloadErrorKind::EndsWithIo));
            }
            if spec.bursts.contains(&0) {
                return Err(error(WorkloadErrorKind::EmptyBurst));
            }
        }
        Ok(())
    }
}

impl FromStr for Workload {
    type Err = WorkloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Workload::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_with_comments() {
        let workload = Workload::parse(
            "# arrival tickets bursts\n\
             0 100 5\n\
             \n\
             2 50 3 4 2   # one I/O wait\n",
        )
        .unwrap();

        assert_eq!(
            workload,
            Workload::new().process(0, 100, &[5]).process(2, 50, &[3, 4, 2])
        );
        assert_eq!(workload.processes[1].pid, Pid::new(2));
    }

    #[test]
    fn parse_errors() {
        let cases = [
            ("0 1 x", 1, WorkloadErrorKind::BadNumber("x".to_string())),
            ("0 1", 1, WorkloadErrorKind::MissingFields),
            ("0 0 5", 1, WorkloadErrorKind::NoTickets),
            ("0 1 5\n0 1 5 3", 2, WorkloadErrorKind::EndsWithIo),
            ("0 1 5 0 5", 1, WorkloadErrorKind::EmptyBurst),
        ];
        for (text, line, kind) in cases {
            assert_eq!(Workload::parse(text), Err(WorkloadError { line, kind }));
        }
    }

    #[test]
    fn validate_built_workload() {
        assert!(Workload::new().process(0, 1, &[3, 1, 3]).validate().is_ok());
        let error = Workload::new()
            .process(0, 1, &[3])
            .process(0, 0, &[3])
            .validate()
            .unwrap_err();
        assert_eq!(error.line, 2);
        assert_eq!(error.kind, WorkloadErrorKind::NoTickets);
    }
}
