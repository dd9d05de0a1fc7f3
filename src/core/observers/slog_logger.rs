// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Logging through `slog`
//!
//! [`SlogLogger`] renders the driver's progress records. The init line
//! reports the run configuration (`rho_beg`, `rho_end`, `npt`, `maxfun`);
//! each iteration line lays out the trust-region quantities (`rho`,
//! `delta`, `ratio`, `dnorm`) next to the iteration number, the evaluation
//! count and the best cost, which is everything the legacy print levels
//! reported. Entries missing from a record are rendered as `-` (the first
//! iterations have no reduction ratio yet).

use crate::core::observers::{Observe, Stage};
use crate::core::{Error, State};
use slog::{info, o, Drain, Logger, Never};
use slog_async::{Async, OverflowStrategy};
#[cfg(feature = "serde1")]
use std::fs::OpenOptions;
#[cfg(feature = "serde1")]
use std::sync::Mutex;

/// A logger based on `slog`
#[derive(Clone)]
pub struct SlogLogger {
    /// the logger
    logger: Logger,
}

impl SlogLogger {
    /// Wraps a formatting drain into an asynchronous root logger.
    fn wrap<D>(drain: D, overflow: OverflowStrategy) -> Self
    where
        D: Drain<Ok = (), Err = Never> + Send + 'static,
    {
        let drain = Async::new(drain).overflow_strategy(overflow).build().fuse();
        SlogLogger {
            logger: Logger::root(drain, o!()),
        }
    }

    fn term_format() -> slog::Fuse<slog_term::FullFormat<slog_term::TermDecorator>> {
        let decorator = slog_term::TermDecorator::new().build();
        slog_term::FullFormat::new(decorator).build().fuse()
    }

    /// Log to the terminal in a blocking way
    pub fn term() -> Self {
        SlogLogger::wrap(SlogLogger::term_format(), OverflowStrategy::Block)
    }

    /// Log to the terminal in a non-blocking way (in case of overflow, messages are dropped)
    pub fn term_noblock() -> Self {
        SlogLogger::wrap(SlogLogger::term_format(), OverflowStrategy::Drop)
    }

    #[cfg(feature = "serde1")]
    fn json_format(
        path: &str,
        truncate: bool,
    ) -> Result<slog::Fuse<Mutex<slog_json::Json<std::fs::File>>>, Error> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(truncate)
            .open(path)?;
        Ok(Mutex::new(slog_json::Json::default(file)).map(slog::Fuse))
    }

    /// Log JSON to the file at `path` in a blocking way
    ///
    /// If `truncate` is set to `true`, the content of an existing log file
    /// at `path` will be cleared.
    ///
    /// Only available when the `serde1` feature is set.
    #[cfg(feature = "serde1")]
    pub fn file(path: &str, truncate: bool) -> Result<Self, Error> {
        Ok(SlogLogger::wrap(
            SlogLogger::json_format(path, truncate)?,
            OverflowStrategy::Block,
        ))
    }

    /// Log JSON to the file at `path` in a non-blocking way (in case of
    /// overflow, messages are dropped)
    ///
    /// If `truncate` is set to `true`, the content of an existing log file
    /// at `path` will be cleared.
    ///
    /// Only available when the `serde1` feature is set.
    #[cfg(feature = "serde1")]
    pub fn file_noblock(path: &str, truncate: bool) -> Result<Self, Error> {
        Ok(SlogLogger::wrap(
            SlogLogger::json_format(path, truncate)?,
            OverflowStrategy::Drop,
        ))
    }
}

impl<I: State> Observe<I> for SlogLogger {
    fn observe(&mut self, stage: Stage<'_, I>) -> Result<(), Error> {
        match stage {
            Stage::Init { name, config } => {
                let pick = |key| config.get(key).unwrap_or("-");
                info!(self.logger, "{}", name;
                    "maxfun" => %pick("maxfun"),
                    "npt" => %pick("npt"),
                    "rho_end" => %pick("rho_end"),
                    "rho_beg" => %pick("rho_beg"),
                );
            }
            Stage::Iter { state, record } => {
                let pick = |key| record.get(key).unwrap_or("-");
                info!(self.logger, "";
                    "dnorm" => %pick("dnorm"),
                    "ratio" => %pick("ratio"),
                    "delta" => %pick("delta"),
                    "rho" => %pick("rho"),
                    "best" => %state.get_best_cost(),
                    "nf" => %pick("nf"),
                    "iter" => state.get_iter(),
                );
            }
        }
        Ok(())
    }
}
