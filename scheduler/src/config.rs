use std::fmt::{self, Display};
use std::str::FromStr;

use thiserror::Error;

/// The default numerator used to derive a stride from a ticket count.
pub const STRIDE_CONSTANT: u64 = 1_000_000;

/// The scheduling policies this crate implements.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PolicyKind {
    #[default]
    RoundRobin,
    Stcf,
    Stride,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown scheduling policy `{0}`, expected one of round-robin, stcf, stride")]
pub struct UnknownPolicy(pub String);

impl FromStr for PolicyKind {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "round-robin" | "rr" => Ok(PolicyKind::RoundRobin),
            "stcf" | "srtf" => Ok(PolicyKind::Stcf),
            "stride" => Ok(PolicyKind::Stride),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

impl Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::RoundRobin => write!(f, "round-robin"),
            PolicyKind::Stcf => write!(f, "stcf"),
            PolicyKind::Stride => write!(f, "stride"),
        }
    }
}

/// The pass a newly arrived process starts with under stride scheduling.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum InitialPass {
    /// Start at 0. A late arrival then runs alone until its pass catches up
    /// with the processes that were already there.
    #[default]
    Zero,

    /// Start at the lowest pass among the ready processes, or the pass of the
    /// running process when nothing is ready.
    MinimumReady,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown initial pass `{0}`, expected zero or minimum-ready")]
pub struct UnknownInitialPass(pub String);

impl FromStr for InitialPass {
    type Err = UnknownInitialPass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zero" => Ok(InitialPass::Zero),
            "minimum-ready" | "min" => Ok(InitialPass::MinimumReady),
            _ => Err(UnknownInitialPass(s.to_string())),
        }
    }
}

/// Stride scheduling parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StrideConfig {
    /// Stride of a process is `stride_constant / tickets`.
    pub stride_constant: u64,
    pub initial_pass: InitialPass,
}

impl Default for StrideConfig {
    fn default() -> Self {
        StrideConfig {
            stride_constant: STRIDE_CONSTANT,
            initial_pass: InitialPass::default(),
        }
    }
}

/// Selects and parameterizes an [`Engine`](crate::Engine).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub policy: PolicyKind,
    pub stride: StrideConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn policy_names() {
        for kind in [PolicyKind::RoundRobin, PolicyKind::Stcf, PolicyKind::Stride] {
            assert_eq!(kind.to_string().parse::<PolicyKind>(), Ok(kind));
        }
        assert_eq!("SRTF".parse::<PolicyKind>(), Ok(PolicyKind::Stcf));
        assert_eq!(
            "lottery".parse::<PolicyKind>(),
            Err(UnknownPolicy("lottery".to_string()))
        );
    }

    #[test]
    fn initial_pass_names() {
        assert_eq!("zero".parse::<InitialPass>(), Ok(InitialPass::Zero));
        assert_eq!(
            "minimum-ready".parse::<InitialPass>(),
            Ok(InitialPass::MinimumReady)
        );
        assert!("max".parse::<InitialPass>().is_err());
    }
}
