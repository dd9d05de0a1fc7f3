// Copyright 2024 newuoa developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use num_traits::{Float, FloatConst, FromPrimitive, ToPrimitive};
use std::fmt::{Debug, Display};

/// An alias for float types (`f32`, `f64`) which combines multiple commonly needed traits from
/// `num_traits` and `std::fmt`. It is automatically implemented for all types which fulfill the
/// trait bounds.
pub trait NewuoaFloat:
    'static + Float + FloatConst + FromPrimitive + ToPrimitive + Debug + Display + SerializeAlias
{
}

/// `NewuoaFloat` is automatically implemented for all types which fulfill the trait bounds.
impl<I> NewuoaFloat for I where
    I: 'static + Float + FloatConst + FromPrimitive + ToPrimitive + Debug + Display + SerializeAlias
{
}

/// If the `serde1` feature is set, it acts as an alias for `Serialize` and is implemented for all
/// types which implement `Serialize`. If `serde1` is not set, it will be an "empty" trait
/// implemented for all types.
#[cfg(feature = "serde1")]
pub trait SerializeAlias: serde::Serialize {}

/// If the `serde1` feature is set, it acts as an alias for `Serialize` and is implemented for all
/// types which implement `Serialize`. If `serde1` is not set, it will be an "empty" trait
/// implemented for all types.
#[cfg(not(feature = "serde1"))]
pub trait SerializeAlias {}

#[cfg(feature = "serde1")]
impl<T> SerializeAlias for T where T: serde::Serialize {}
#[cfg(not(feature = "serde1"))]
impl<T> SerializeAlias for T {}
