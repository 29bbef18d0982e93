/* ************************************************************************ **
** This file is part of pair-nn, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::FailResult;

/// Activation applied to hidden layers. (Input and output layers are linear.)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Activation {
    Sigmoid,
}

impl Activation {
    pub fn from_name(name: &str) -> FailResult<Activation> {
        match name {
            "sigmoid" => Ok(Activation::Sigmoid),
            _ => bail!("unknown activation function: {:?}", name),
        }
    }

    #[inline]
    pub fn value(&self, x: f64) -> f64 {
        match self {
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
        }
    }

    /// Derivative, computed from the stored forward value rather than the
    /// pre-activation. For sigmoid: `a (1 - a)`.
    #[inline]
    pub fn deriv_from_value(&self, a: f64) -> f64 {
        match self {
            Activation::Sigmoid => a * (1.0 - a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerical;
    use crate::util::uniform;

    #[test]
    fn parse() {
        assert_eq!(Activation::from_name("sigmoid").unwrap(), Activation::Sigmoid);
        assert!(Activation::from_name("tanh").is_err());
    }

    #[test]
    fn sigmoid_value() {
        let f = Activation::Sigmoid;
        assert_close!(f.value(0.0), 0.5);
        assert!(f.value(20.0) > 0.999);
        assert!(f.value(-20.0) < 0.001);
    }

    #[test]
    fn derivative_matches_slope() {
        let f = Activation::Sigmoid;
        for _ in 0..20 {
            let x = uniform(-4.0, 4.0);
            let expected = numerical::slope(1e-5, None, x, |x| f.value(x));
            assert_close!(rel=1e-8, abs=1e-10, f.deriv_from_value(f.value(x)), expected);
        }
    }
}
