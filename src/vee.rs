/* ************************************************************************ **
** This file is part of pair-nn, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! A bare-bones 3-vector of `f64`, with just the arithmetic the potential
//! pipeline needs.

use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, Neg, Sub, SubAssign};

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct V3(pub [f64; 3]);

impl V3 {
    #[inline]
    pub fn zero() -> V3 { V3([0.0; 3]) }

    #[inline]
    pub fn from_fn(mut f: impl FnMut(usize) -> f64) -> V3 {
        V3([f(0), f(1), f(2)])
    }

    #[inline]
    pub fn dot(a: &V3, b: &V3) -> f64 {
        a.0[0] * b.0[0] + a.0[1] * b.0[1] + a.0[2] * b.0[2]
    }

    #[inline]
    pub fn sqnorm(&self) -> f64 { V3::dot(self, self) }

    #[inline]
    pub fn norm(&self) -> f64 { self.sqnorm().sqrt() }

    #[inline]
    pub fn unit(&self) -> V3 { *self / self.norm() }

    #[inline]
    pub fn map(self, mut f: impl FnMut(f64) -> f64) -> V3 {
        V3([f(self.0[0]), f(self.0[1]), f(self.0[2])])
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|x| x.is_finite())
    }
}

impl Index<usize> for V3 {
    type Output = f64;
    #[inline]
    fn index(&self, i: usize) -> &f64 { &self.0[i] }
}

impl IndexMut<usize> for V3 {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut f64 { &mut self.0[i] }
}

impl Add for V3 {
    type Output = V3;
    #[inline]
    fn add(self, b: V3) -> V3 { V3::from_fn(|i| self.0[i] + b.0[i]) }
}

impl Sub for V3 {
    type Output = V3;
    #[inline]
    fn sub(self, b: V3) -> V3 { V3::from_fn(|i| self.0[i] - b.0[i]) }
}

impl Neg for V3 {
    type Output = V3;
    #[inline]
    fn neg(self) -> V3 { self.map(|x| -x) }
}

impl AddAssign for V3 {
    #[inline]
    fn add_assign(&mut self, b: V3) { *self = *self + b; }
}

impl SubAssign for V3 {
    #[inline]
    fn sub_assign(&mut self, b: V3) { *self = *self - b; }
}

impl Mul<f64> for V3 {
    type Output = V3;
    #[inline]
    fn mul(self, b: f64) -> V3 { self.map(|x| x * b) }
}

impl Mul<V3> for f64 {
    type Output = V3;
    #[inline]
    fn mul(self, b: V3) -> V3 { b * self }
}

impl Div<f64> for V3 {
    type Output = V3;
    #[inline]
    fn div(self, b: f64) -> V3 { self.map(|x| x / b) }
}

impl std::iter::Sum for V3 {
    fn sum<I: Iterator<Item = V3>>(iter: I) -> V3 {
        iter.fold(V3::zero(), |a, b| a + b)
    }
}

impl crate::assert_close::CheckClose for V3 {
    fn check_close(&self, other: &V3, tol: crate::assert_close::Tolerances) -> bool {
        crate::assert_close::CheckClose::check_close(&self.0[..], &other.0[..], tol)
    }
}

/// A uniformly distributed unit vector, by rejection sampling.
#[cfg(test)]
pub(crate) fn random_unit() -> V3 {
    loop {
        let v = V3::from_fn(|_| crate::util::uniform(-1.0, 1.0));
        let sq = v.sqnorm();
        if 1e-4 < sq && sq <= 1.0 {
            return v / sq.sqrt();
        }
    }
}
