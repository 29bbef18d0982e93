/* ************************************************************************ **
** This file is part of pair-nn, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Cosine cutoff taper. Symmetry functions are multiplied by this so that
//! every feature goes smoothly to zero as a bond approaches its cutoff.

use std::f64::consts::PI;

/// `(value, d_r)` of the taper, clamped to zero at and beyond the cutoff.
#[inline]
pub fn hard(r: f64, r_cut: f64) -> (f64, f64) {
    if r < r_cut {
        soft(r, r_cut)
    } else {
        (0.0, 0.0)
    }
}

/// `(value, d_r)` of the raw cosine formula, with no range check.
///
/// Callers use this on distances already known to lie inside the cutoff;
/// on the jk leg of a triplet (which has no cutoff filter of its own) the
/// [`hard`] variant must be used instead.
#[inline]
pub fn soft(r: f64, r_cut: f64) -> (f64, f64) {
    let value = 0.5 * ((PI * r / r_cut).cos() + 1.0);
    let d_r = -(PI / (2.0 * r_cut)) * (PI * r / r_cut).sin();
    (value, d_r)
}
