/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

/// Evaluation of a position, as produced by the material-ratio scorer.
///
/// Scores normally lie in `[0, INF]`, where 0 means the opponent of the
/// evaluated side has nothing left and `INF` means the evaluated side has
/// nothing left. The alpha-beta early return may hand back `INF + 1` or
/// values below 0; these non-exact bounds are part of the search contract
/// and must not be clamped.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct Score(pub(crate) f64);

impl Score {
    /// Worst possible score for the evaluated side.
    pub const INF: Self = Self(1e9);

    /// Best possible score for the evaluated side.
    pub const ZERO: Self = Self(0.0);

    #[inline(always)]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    #[inline(always)]
    pub fn max(self, other: Self) -> Self {
        if other.0 > self.0 {
            other
        } else {
            self
        }
    }

    #[inline(always)]
    pub fn min(self, other: Self) -> Self {
        if other.0 < self.0 {
            other
        } else {
            self
        }
    }

    /// `true` for every score the evaluator itself can produce.
    #[inline(always)]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

macro_rules! impl_binary_op {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            type Output = Self;

            fn $fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$fn(rhs.0))
            }
        }

        impl std::ops::$trait<f64> for Score {
            type Output = Self;

            fn $fn(self, rhs: f64) -> Self::Output {
                Self(self.0.$fn(rhs))
            }
        }
    };
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
