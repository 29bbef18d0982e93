/* ************************************************************************ **
** This file is part of pair-nn, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Numerical differentiation, for checking analytic derivatives in tests.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DerivativeKind {
    /// n-point central difference. 3 and 5 point stencils are supported.
    Stencil(u32),
}

impl Default for DerivativeKind {
    fn default() -> DerivativeKind { DerivativeKind::Stencil(5) }
}

/// Numerically differentiate a function of one variable at `point`,
/// sampling at a distance of `step` (and multiples thereof).
pub fn slope(
    step: f64,
    kind: Option<DerivativeKind>,
    point: f64,
    mut value_fn: impl FnMut(f64) -> f64,
) -> f64 {
    match kind.unwrap_or_default() {
        DerivativeKind::Stencil(3) => {
            (value_fn(point + step) - value_fn(point - step)) / (2.0 * step)
        },
        DerivativeKind::Stencil(5) => {
            ( value_fn(point - 2.0 * step)
            - 8.0 * value_fn(point - step)
            + 8.0 * value_fn(point + step)
            - value_fn(point + 2.0 * step)
            ) / (12.0 * step)
        },
        DerivativeKind::Stencil(n) => panic!("unsupported stencil size: {}", n),
    }
}

/// Numerically compute a gradient, one axis at a time.
pub fn gradient(
    step: f64,
    kind: Option<DerivativeKind>,
    point: &[f64],
    mut value_fn: impl FnMut(&[f64]) -> f64,
) -> Vec<f64> {
    (0..point.len())
        .map(|axis| {
            let mut point = point.to_vec();
            let center = point[axis];
            slope(step, kind, center, |x| {
                point[axis] = x;
                value_fn(&point)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::uniform;

    #[test]
    fn slope_of_sine() {
        for _ in 0..10 {
            let x = uniform(-3.0, 3.0);
            for &kind in &[DerivativeKind::Stencil(3), DerivativeKind::Stencil(5)] {
                let d = slope(1e-4, Some(kind), x, f64::sin);
                assert_close!(rel=1e-6, abs=1e-9, d, x.cos());
            }
        }
    }

    #[test]
    fn gradient_of_quadratic() {
        // f(x) = sum(i * x_i^2), df/dx_i = 2 i x_i
        let point: Vec<f64> = (0..4).map(|_| uniform(-2.0, 2.0)).collect();
        let grad = gradient(1e-4, None, &point, |v| {
            v.iter().enumerate().map(|(i, x)| i as f64 * x * x).sum()
        });
        let expected: Vec<f64> = point.iter().enumerate()
            .map(|(i, x)| 2.0 * i as f64 * x)
            .collect();
        assert_close!(rel=1e-7, abs=1e-8, grad, expected);
    }
}
