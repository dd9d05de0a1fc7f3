// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Reasons for the optimization run to stop
///
/// The integer codes returned by [`code`](`ExitStatus::code`) are stable and
/// match the codes of the reference Fortran implementation.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum ExitStatus {
    /// The lower bound of the trust region radius reached its final value
    /// (normal convergence)
    SmallTrRadius,
    /// The target cost function value was reached
    FtargetReached,
    /// A trust region step failed to reduce the quadratic model
    TrStepFailed,
    /// The maximum number of function evaluations was spent
    MaxfunReached,
    /// The maximum number of trust region iterations was reached
    /// (defensive bound)
    MaxtrReached,
    /// The input vector contained NaN before a call to the cost function
    NanInput,
    /// The cost function returned NaN or positive infinity
    NanInfF,
    /// A NaN appeared in the quadratic model or in the inverse KKT matrix
    NanModel,
}

impl ExitStatus {
    /// Returns the stable integer exit code.
    ///
    /// # Example
    ///
    /// ```
    /// use newuoa::core::ExitStatus;
    ///
    /// assert_eq!(ExitStatus::SmallTrRadius.code(), 0);
    /// assert_eq!(ExitStatus::FtargetReached.code(), 1);
    /// assert_eq!(ExitStatus::TrStepFailed.code(), 2);
    /// assert_eq!(ExitStatus::MaxfunReached.code(), 3);
    /// assert_eq!(ExitStatus::MaxtrReached.code(), 20);
    /// assert_eq!(ExitStatus::NanInput.code(), -1);
    /// assert_eq!(ExitStatus::NanInfF.code(), -2);
    /// assert_eq!(ExitStatus::NanModel.code(), -3);
    /// ```
    pub fn code(&self) -> i32 {
        match *self {
            ExitStatus::SmallTrRadius => 0,
            ExitStatus::FtargetReached => 1,
            ExitStatus::TrStepFailed => 2,
            ExitStatus::MaxfunReached => 3,
            ExitStatus::MaxtrReached => 20,
            ExitStatus::NanInput => -1,
            ExitStatus::NanInfF => -2,
            ExitStatus::NanModel => -3,
        }
    }

    /// Returns a textual representation of what happened.
    pub fn text(&self) -> &str {
        match *self {
            ExitStatus::SmallTrRadius => "The trust region radius reached its final value",
            ExitStatus::FtargetReached => "The target cost function value was reached",
            ExitStatus::TrStepFailed => "A trust region step failed to reduce the model",
            ExitStatus::MaxfunReached => "Maximum number of function evaluations reached",
            ExitStatus::MaxtrReached => "Maximum number of trust region iterations reached",
            ExitStatus::NanInput => "The input vector contains NaN",
            ExitStatus::NanInfF => "The cost function returned NaN or infinity",
            ExitStatus::NanModel => "NaN occurred in the model or in its inverse KKT matrix",
        }
    }
}

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Indicates whether an optimization run is terminated and, if so, why
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum TerminationStatus {
    /// The optimization run is terminated
    Terminated(ExitStatus),
    /// The optimization run is in progress
    NotTerminated,
}

impl TerminationStatus {
    /// Returns `true` if the run has terminated and `false` otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// use newuoa::core::{ExitStatus, TerminationStatus};
    ///
    /// assert!(TerminationStatus::Terminated(ExitStatus::SmallTrRadius).terminated());
    /// assert!(!TerminationStatus::NotTerminated.terminated());
    /// ```
    pub fn terminated(&self) -> bool {
        !matches!(self, TerminationStatus::NotTerminated)
    }
}

impl std::fmt::Display for TerminationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TerminationStatus::NotTerminated => write!(f, "Not terminated"),
            TerminationStatus::Terminated(status) => write!(f, "{}", status),
        }
    }
}

impl Default for TerminationStatus {
    fn default() -> Self {
        TerminationStatus::NotTerminated
    }
}
