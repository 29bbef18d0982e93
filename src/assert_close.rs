/* ************************************************************************ **
** This file is part of pair-nn, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Approximate-equality assertions for the numerical test suites.
//!
//! ```rust
//! # #[macro_use] extern crate pair_nn;
//! # fn main() {
//! assert_close!(1.0, 1.0 + 1e-12);
//! assert_close!(rel=1e-5, 1.0, 1.000001);
//! assert_close!(abs=1e-6, 0.0, 1e-8);
//! # }
//! ```

/// Default relative tolerance when none is supplied.
pub const DEFAULT_NONZERO_TOL: f64 = 1e-9;

#[derive(Debug, Copy, Clone)]
pub struct Tolerances {
    pub rel: f64,
    pub abs: f64,
}

/// Elementwise approximate comparison.
pub trait CheckClose: std::fmt::Debug {
    fn check_close(&self, other: &Self, tol: Tolerances) -> bool;
}

impl CheckClose for f64 {
    fn check_close(&self, other: &f64, tol: Tolerances) -> bool {
        let bound = f64::max(tol.rel * f64::max(self.abs(), other.abs()), tol.abs);
        (self - other).abs() <= bound
    }
}

impl<T: CheckClose> CheckClose for [T] {
    fn check_close(&self, other: &[T], tol: Tolerances) -> bool {
        self.len() == other.len()
            && self.iter().zip(other).all(|(a, b)| a.check_close(b, tol))
    }
}

impl<T: CheckClose> CheckClose for Vec<T> {
    fn check_close(&self, other: &Vec<T>, tol: Tolerances) -> bool {
        self[..].check_close(&other[..], tol)
    }
}

impl<'a, T: ?Sized + CheckClose> CheckClose for &'a T {
    fn check_close(&self, other: &&'a T, tol: Tolerances) -> bool {
        T::check_close(self, other, tol)
    }
}

#[macro_export]
macro_rules! assert_close {
    ($($args:tt)*) => {
        $crate::__assert_close_impl!{
            [$crate::assert_close::DEFAULT_NONZERO_TOL, 0.0]
            $($args)*
        }
    };
}

#[macro_export]
macro_rules! debug_assert_close {
    ($($args:tt)*) => {
        if cfg!(debug_assertions) {
            $crate::assert_close!($($args)*);
        }
    };
}

// Munches `rel=`/`abs=` prefixes into the tolerance state, then compares.
#[doc(hidden)]
#[macro_export]
macro_rules! __assert_close_impl {
    ([$rel:expr, $abs:expr] rel=$new:expr, $($rest:tt)*) => {
        $crate::__assert_close_impl!{[$new, $abs] $($rest)*}
    };
    ([$rel:expr, $abs:expr] abs=$new:expr, $($rest:tt)*) => {
        $crate::__assert_close_impl!{[$rel, $new] $($rest)*}
    };
    ([$rel:expr, $abs:expr] $a:expr, $b:expr $(,)*) => {{
        let tol = $crate::assert_close::Tolerances { rel: $rel, abs: $abs };
        let (a, b) = (&$a, &$b);
        if !$crate::assert_close::CheckClose::check_close(a, b, tol) {
            panic!(
                "assert_close failed\n   left: {:?}\n  right: {:?}\n    tol: {:?}",
                a, b, tol,
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn default_tolerance() {
        assert_close!(1.0, 1.0 + 1e-12);
    }

    #[test]
    #[should_panic(expected = "assert_close failed")]
    fn default_tolerance_rejects() {
        assert_close!(1.0, 1.0 + 1e-6);
    }

    #[test]
    fn explicit_tolerances() {
        assert_close!(rel=1e-3, 1.0, 1.0005);
        assert_close!(abs=1e-6, 0.0, 1e-8);
        assert_close!(rel=0.0, abs=1e-6, 1.0, 1.0 + 1e-7);
    }

    #[test]
    fn slices() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![1.0 + 1e-12, 2.0, 3.0];
        assert_close!(a, b);
        // unsized comparands arrive behind a reference
        assert_close!(&a[..], &b[..]);
        assert_close!(&a[..2], &b[..2]);
    }

    #[test]
    #[should_panic(expected = "assert_close failed")]
    fn length_mismatch_rejects() {
        assert_close!(vec![1.0], vec![1.0, 2.0]);
    }
}
