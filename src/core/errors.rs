// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Errors
//!
//! Errors are reserved for misuse of the API: invalid parameters, a missing
//! initial point, and the like. Numerical trouble during an optimization run
//! (NaN in the inputs, NaN or infinity from the cost function, a poisoned
//! model) is not an error but a [`TerminationStatus`](`crate::core::TerminationStatus`),
//! because the driver must still return the best point found so far.

use thiserror::Error;

/// Error type for the newuoa crate
#[derive(Debug, Error)]
pub enum NewuoaError {
    /// Indicates an invalid parameter
    #[error("Invalid parameter: {text:?}")]
    InvalidParameter {
        /// Text
        text: String,
    },

    /// Indicates that something required was not initialized
    #[error("Not initialized: {text:?}")]
    NotInitialized {
        /// Text
        text: String,
    },

    /// For errors which are likely bugs.
    #[error("Potential bug: {text:?}. This is potentially a bug. Please file a report on https://github.com/newuoa-rs/newuoa/issues")]
    PotentialBug {
        /// Text
        text: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    send_sync_test!(error, NewuoaError);
}
