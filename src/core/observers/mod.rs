// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Observers
//!
//! Observers watch the progress of an optimization run. They are handed a
//! [`Stage`]: once the [`Stage::Init`] stage after the initial interpolation
//! set has been sampled (carrying the run configuration), and then a
//! [`Stage::Iter`] stage per driver iteration, carrying the state and the
//! iteration record with the trust-region quantities `rho`, `delta`,
//! `ratio`, `dnorm` and the evaluation count `nf`.
//!
//! How often an observer hears about iterations is controlled by its
//! [`ObserverMode`], which mirrors the verbosity levels of the legacy
//! interface: `EveryIter` corresponds to a message per iteration,
//! `RhoChange` to a message at each new resolution level, and `NewBest` to
//! reporting only improvements of the best point. A summary at return is
//! available from the final
//! [`OptimizationResult`](`crate::core::OptimizationResult`) display.
//!
//! The observer [`SlogLogger`](`crate::core::observers::SlogLogger`) logs
//! the progress to screen or to disk. This requires the `slog-logger`
//! feature; writing to disk in addition requires the `serde1` feature.

#[cfg(feature = "slog-logger")]
pub mod slog_logger;

#[cfg(feature = "slog-logger")]
pub use slog_logger::*;

use crate::core::{Error, State, KV};

/// A stage of the optimization run as seen by observers.
pub enum Stage<'a, I> {
    /// The initializer has sampled the first interpolation set.
    Init {
        /// Name of the solver
        name: &'a str,
        /// Run configuration (initial and final trust region bounds,
        /// number of interpolation conditions, evaluation budget)
        config: &'a KV,
    },
    /// A driver iteration has finished.
    Iter {
        /// Iteration state
        state: &'a I,
        /// Per-iteration record (`rho`, `delta`, `ratio`, `dnorm`, `nf`)
        record: &'a KV,
    },
}

/// An interface for watching the progress of a run.
///
/// # Example
///
/// ```
/// use newuoa::core::{Error, State};
/// use newuoa::core::observers::{Observe, Stage};
///
/// struct RhoPrinter {}
///
/// impl<I: State> Observe<I> for RhoPrinter {
///     fn observe(&mut self, stage: Stage<'_, I>) -> Result<(), Error> {
///         if let Stage::Iter { record, .. } = stage {
///             if let Some(rho) = record.get("rho") {
///                 println!("resolution is now {}", rho);
///             }
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Observe<I> {
    /// Called with [`Stage::Init`] once, then with [`Stage::Iter`] for every
    /// iteration selected by the observer's [`ObserverMode`].
    fn observe(&mut self, stage: Stage<'_, I>) -> Result<(), Error>;
}

/// Selects which iterations an observer is told about.
///
/// The modes mirror the print levels of the legacy interface; see the
/// [module documentation](`crate::core::observers`).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum ObserverMode {
    /// Report every iteration
    #[default]
    EveryIter,
    /// Report only iterations which changed the resolution bound rho
    RhoChange,
    /// Report only iterations which improved the best point
    NewBest,
}

struct ObserverEntry<I> {
    observer: Box<dyn Observe<I>>,
    mode: ObserverMode,
    /// The `rho` value of the last record seen, for `RhoChange` dispatch.
    seen_rho: Option<String>,
}

/// Container dispatching run stages to the attached observers.
///
/// Iteration records are filtered per observer according to its
/// [`ObserverMode`]; the `RhoChange` mode is driven by the `rho` entry of
/// the per-iteration record.
#[derive(Default)]
pub struct Observers<I> {
    entries: Vec<ObserverEntry<I>>,
}

impl<I> Observers<I> {
    /// Construct a new empty `Observers` instance.
    pub fn new() -> Self {
        Observers { entries: vec![] }
    }

    /// Attach an observer with its [`ObserverMode`].
    pub fn push<OBS: Observe<I> + 'static>(
        &mut self,
        observer: OBS,
        mode: ObserverMode,
    ) -> &mut Self {
        self.entries.push(ObserverEntry {
            observer: Box::new(observer),
            mode,
            seen_rho: None,
        });
        self
    }

    /// Returns true if no observer is attached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hands the initialization stage to every attached observer,
    /// regardless of mode.
    pub fn notify_init(&mut self, name: &str, config: &KV) -> Result<(), Error> {
        for entry in self.entries.iter_mut() {
            entry.observer.observe(Stage::Init { name, config })?;
        }
        Ok(())
    }
}

impl<I: State> Observers<I> {
    /// Hands an iteration stage to every attached observer whose mode
    /// selects it. A missing `rho` entry in the record never counts as a
    /// resolution change.
    pub fn notify_iter(&mut self, state: &I, record: &KV) -> Result<(), Error> {
        let rho = record.get("rho");
        for entry in self.entries.iter_mut() {
            let due = match entry.mode {
                ObserverMode::EveryIter => true,
                ObserverMode::RhoChange => rho.is_some() && entry.seen_rho.as_deref() != rho,
                ObserverMode::NewBest => state.is_best(),
            };
            if let Some(rho) = rho {
                if entry.seen_rho.as_deref() != Some(rho) {
                    entry.seen_rho = Some(rho.to_string());
                }
            }
            if due {
                entry.observer.observe(Stage::Iter { state, record })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::IterState;
    use std::sync::{Arc, Mutex};

    send_sync_test!(observermode, ObserverMode);

    type TState = IterState<Vec<f64>, f64>;

    /// Counts (init, iter) calls through shared storage.
    struct Counter {
        calls: Arc<Mutex<(usize, usize)>>,
    }

    fn counter() -> (Counter, Arc<Mutex<(usize, usize)>>) {
        let calls = Arc::new(Mutex::new((0, 0)));
        (
            Counter {
                calls: calls.clone(),
            },
            calls,
        )
    }

    impl<I> Observe<I> for Counter {
        fn observe(&mut self, stage: Stage<'_, I>) -> Result<(), Error> {
            let mut calls = self.calls.lock().unwrap();
            match stage {
                Stage::Init { .. } => calls.0 += 1,
                Stage::Iter { .. } => calls.1 += 1,
            }
            Ok(())
        }
    }

    #[test]
    fn test_every_iter_dispatch() {
        let (obs, calls) = counter();
        let mut observers: Observers<TState> = Observers::new();
        observers.push(obs, ObserverMode::EveryIter);
        assert!(!observers.is_empty());

        let state = TState::new();
        observers.notify_init("solver", &kv!()).unwrap();
        for _ in 0..3 {
            observers.notify_iter(&state, &kv!("rho" => 1.0;)).unwrap();
        }
        assert_eq!(*calls.lock().unwrap(), (1, 3));
    }

    #[test]
    fn test_rho_change_dispatch() {
        let (obs, calls) = counter();
        let mut observers: Observers<TState> = Observers::new();
        observers.push(obs, ObserverMode::RhoChange);

        let state = TState::new();
        // first record with a rho entry counts as a new level
        observers.notify_iter(&state, &kv!("rho" => 1.0;)).unwrap();
        observers.notify_iter(&state, &kv!("rho" => 1.0;)).unwrap();
        observers.notify_iter(&state, &kv!("rho" => 0.5;)).unwrap();
        observers.notify_iter(&state, &kv!("rho" => 0.5;)).unwrap();
        // a record without rho never fires
        observers.notify_iter(&state, &kv!()).unwrap();
        assert_eq!(*calls.lock().unwrap(), (0, 2));
    }

    #[test]
    fn test_new_best_dispatch() {
        let (obs, calls) = counter();
        let mut observers: Observers<TState> = Observers::new();
        observers.push(obs, ObserverMode::NewBest);

        let mut state = TState::new();
        // a fresh state reports iteration 0 as its best
        observers.notify_iter(&state, &kv!()).unwrap();
        assert_eq!(calls.lock().unwrap().1, 1);

        state.increment_iter();
        observers.notify_iter(&state, &kv!()).unwrap();
        assert_eq!(calls.lock().unwrap().1, 1);

        state.last_best_iter = state.iter;
        observers.notify_iter(&state, &kv!()).unwrap();
        assert_eq!(calls.lock().unwrap().1, 2);
    }
}
