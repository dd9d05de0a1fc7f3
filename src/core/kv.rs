// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Key Value storage
//!
//! A very simple key-value storage used to hand solver-specific metrics
//! (trust-region radii, reduction ratios, ...) to observers.

#[cfg(feature = "serde1")]
use serde::Serialize;

/// A simple key-value storage
#[derive(Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde1", derive(Serialize))]
pub struct KV {
    /// The actual key value storage
    pub kv: Vec<(&'static str, String)>,
}

impl std::fmt::Display for KV {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "KV")?;
        for (key, val) in self.kv.iter() {
            writeln!(f, "   {}: {}", key, val)?;
        }
        Ok(())
    }
}

impl KV {
    /// Constructor
    pub fn new() -> Self {
        KV { kv: vec![] }
    }

    /// Push a key-value pair to the `kv` vector.
    ///
    /// This formats the `val` using `format!`. Therefore `T` has to implement `Display`.
    pub fn push<T: std::fmt::Display>(&mut self, key: &'static str, val: T) -> &mut Self {
        self.kv.push((key, format!("{}", val)));
        self
    }

    /// Returns the value associated with `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.kv
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Merge another `kv` into `self.kv`
    #[must_use]
    pub fn merge(mut self, other: &mut KV) -> Self {
        self.kv.append(&mut other.kv);
        self
    }
}

impl std::iter::FromIterator<(&'static str, String)> for KV {
    fn from_iter<I: IntoIterator<Item = (&'static str, String)>>(iter: I) -> Self {
        let mut c = KV::new();

        for i in iter {
            c.push(i.0, i.1);
        }

        c
    }
}

impl std::iter::Extend<(&'static str, String)> for KV {
    fn extend<I: IntoIterator<Item = (&'static str, String)>>(&mut self, iter: I) {
        for i in iter {
            self.push(i.0, i.1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    send_sync_test!(kv, KV);

    #[test]
    fn test_push_and_get() {
        let mut kv = KV::new();
        kv.push("rho", 0.5).push("delta", 1.25);
        assert_eq!(kv.get("rho"), Some("0.5"));
        assert_eq!(kv.get("delta"), Some("1.25"));
        assert_eq!(kv.get("gamma"), None);
    }
}
