/* ************************************************************************ **
** This file is part of pair-nn, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

#[cfg(test)]
pub(crate) fn uniform(a: f64, b: f64) -> f64 { ::rand::random::<f64>() * (b - a) + a }

#[cfg(test)]
pub(crate) fn num_grad_v3(
    interval: f64,
    point: crate::vee::V3,
    mut value_fn: impl FnMut(crate::vee::V3) -> f64,
) -> crate::vee::V3 {
    use crate::vee::V3;

    let grad = crate::numerical::gradient(interval, None, &point.0, |v| {
        value_fn(V3([v[0], v[1], v[2]]))
    });
    V3([grad[0], grad[1], grad[2]])
}
