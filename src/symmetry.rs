/* ************************************************************************ **
** This file is part of pair-nn, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Behler-Parrinello symmetry functions: the per-pair radial term (G2) and
//! the per-triplet angular terms (G4, G5), with analytic derivatives.
//!
//! Derivatives are named `value_d_foo` meaning `d(value)/d(foo)`. Angular
//! derivatives are taken with respect to the *positions* of the two outer
//! atoms; the central atom's derivative is the negated sum of the other
//! two, so a triplet can never exert a net force.

use crate::vee::V3;

/// One slot of the feature vector.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Descriptor {
    Radial(Radial),
    Angular(Angular),
}

/// G2 parameters: a Gaussian of width `eta` centered on `center`,
/// tapered to zero at `cutoff`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Radial {
    pub eta: f64,
    pub cutoff: f64,
    pub center: f64,
}

/// G4/G5 parameters. `lambda` is `+1` or `-1` and selects whether the
/// function peaks at 0 or 180 degrees; `zeta` sharpens the peak.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Angular {
    pub eta: f64,
    pub cutoff: f64,
    pub zeta: f64,
    pub lambda: f64,
}

/// Which angular family the potential's 4-parameter rows denote.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AngularKind {
    /// G4: includes the jk separation in both the Gaussian and the cutoff
    /// product, so the feature also decays as the outer atoms separate.
    ThreeBody,
    /// G5: depends on the jk separation only through the angle.
    TwoBody,
}

impl Default for AngularKind {
    fn default() -> AngularKind { AngularKind::ThreeBody }
}

/// Cached geometry of one `j-i-k` triplet around a central atom `i`.
///
/// `delta_ij` is `x_j - x_i`. The cosine is clamped to `[-1, 1]` so that
/// roundoff on nearly-collinear triplets cannot produce `powf` of a
/// negative base.
#[derive(Debug, Copy, Clone)]
pub struct TripletGeometry {
    pub delta_ij: V3,
    pub delta_ik: V3,
    pub delta_jk: V3,
    pub length_ij: f64,
    pub length_ik: f64,
    pub length_jk: f64,
    pub cos_ijk: f64,
}

impl TripletGeometry {
    pub fn new(delta_ij: V3, length_ij: f64, delta_ik: V3, length_ik: f64) -> TripletGeometry {
        let delta_jk = delta_ik - delta_ij;
        let length_jk = delta_jk.norm();
        let cos_ijk = {
            let cos = V3::dot(&delta_ij, &delta_ik) / (length_ij * length_ik);
            f64::max(-1.0, f64::min(1.0, cos))
        };
        TripletGeometry {
            delta_ij, delta_ik, delta_jk,
            length_ij, length_ik, length_jk,
            cos_ijk,
        }
    }
}

pub mod g2 {
    use super::Radial;
    use crate::cutoff;

    /// `(value, value_d_r)` of the radial symmetry function at separation `r`.
    ///
    /// Uses the hard-cut taper for both value and derivative, so the term
    /// (and its force contribution) vanishes identically past the
    /// descriptor's own cutoff.
    pub fn compute(params: &Radial, r: f64) -> (f64, f64) {
        let Radial { eta, cutoff: r_cut, center } = *params;

        let (cut, cut_d_r) = cutoff::hard(r, r_cut);
        let gauss = f64::exp(-eta * (r - center) * (r - center));
        let gauss_d_r = -2.0 * eta * (r - center) * gauss;

        let value = gauss * cut;
        let value_d_r = gauss_d_r * cut + gauss * cut_d_r;
        (value, value_d_r)
    }
}

/// Output of an angular symmetry function on one triplet.
#[derive(Debug, Copy, Clone)]
pub struct AngularOutput {
    pub value: f64,
    /// Derivative with respect to the position of atom `j`.
    pub value_d_rj: V3,
    /// Derivative with respect to the position of atom `k`.
    pub value_d_rk: V3,
}

pub mod g4 {
    use super::{Angular, AngularOutput, TripletGeometry, angle_part};
    use crate::cutoff;

    pub fn compute(params: &Angular, geom: &TripletGeometry) -> AngularOutput {
        let Angular { eta, cutoff: r_cut, .. } = *params;
        let TripletGeometry {
            delta_ij: d1, delta_ik: d2, delta_jk: d3,
            length_ij: r1, length_ik: r2, length_jk: r3,
            cos_ijk: cos,
        } = *geom;

        let (angular, angular_d_cos) = angle_part(params, cos);

        let gauss = f64::exp(-eta * (r1 * r1 + r2 * r2 + r3 * r3));
        let gauss_d_r1 = -2.0 * eta * r1 * gauss;
        let gauss_d_r2 = -2.0 * eta * r2 * gauss;
        let gauss_d_r3 = -2.0 * eta * r3 * gauss;

        // ij and ik are within the cutoff by construction; jk is not filtered
        // anywhere, so it gets the hard-cut taper.
        let (cut1, cut1_d_r1) = cutoff::soft(r1, r_cut);
        let (cut2, cut2_d_r2) = cutoff::soft(r2, r_cut);
        let (cut3, cut3_d_r3) = cutoff::hard(r3, r_cut);

        let value = angular * gauss * cut1 * cut2 * cut3;
        let value_d_cos = angular_d_cos * gauss * cut1 * cut2 * cut3;
        let value_d_r1 = angular * (gauss_d_r1 * cut1 + gauss * cut1_d_r1) * cut2 * cut3;
        let value_d_r2 = angular * (gauss_d_r2 * cut2 + gauss * cut2_d_r2) * cut1 * cut3;
        let value_d_r3 = angular * (gauss_d_r3 * cut3 + gauss * cut3_d_r3) * cut1 * cut2;

        let cos_d_rj = super::cos_d_outer(d1, r1, d2, r2, cos);
        let cos_d_rk = super::cos_d_outer(d2, r2, d1, r1, cos);

        let value_d_rj = value_d_cos * cos_d_rj + (value_d_r1 / r1) * d1 - (value_d_r3 / r3) * d3;
        let value_d_rk = value_d_cos * cos_d_rk + (value_d_r2 / r2) * d2 + (value_d_r3 / r3) * d3;
        AngularOutput { value, value_d_rj, value_d_rk }
    }
}

pub mod g5 {
    use super::{Angular, AngularOutput, TripletGeometry, angle_part};
    use crate::cutoff;

    pub fn compute(params: &Angular, geom: &TripletGeometry) -> AngularOutput {
        let Angular { eta, cutoff: r_cut, .. } = *params;
        let TripletGeometry {
            delta_ij: d1, delta_ik: d2,
            length_ij: r1, length_ik: r2,
            cos_ijk: cos,
            ..
        } = *geom;

        let (angular, angular_d_cos) = angle_part(params, cos);

        let gauss = f64::exp(-eta * (r1 * r1 + r2 * r2));
        let gauss_d_r1 = -2.0 * eta * r1 * gauss;
        let gauss_d_r2 = -2.0 * eta * r2 * gauss;

        let (cut1, cut1_d_r1) = cutoff::soft(r1, r_cut);
        let (cut2, cut2_d_r2) = cutoff::soft(r2, r_cut);

        let value = angular * gauss * cut1 * cut2;
        let value_d_cos = angular_d_cos * gauss * cut1 * cut2;
        let value_d_r1 = angular * (gauss_d_r1 * cut1 + gauss * cut1_d_r1) * cut2;
        let value_d_r2 = angular * (gauss_d_r2 * cut2 + gauss * cut2_d_r2) * cut1;

        let cos_d_rj = super::cos_d_outer(d1, r1, d2, r2, cos);
        let cos_d_rk = super::cos_d_outer(d2, r2, d1, r1, cos);

        let value_d_rj = value_d_cos * cos_d_rj + (value_d_r1 / r1) * d1;
        let value_d_rk = value_d_cos * cos_d_rk + (value_d_r2 / r2) * d2;
        AngularOutput { value, value_d_rj, value_d_rk }
    }
}

/// `(angular, angular_d_cos)` of the shared G4/G5 angle factor
/// `2^(1 - zeta) (1 + lambda cos)^zeta`.
fn angle_part(params: &Angular, cos: f64) -> (f64, f64) {
    let Angular { zeta, lambda, .. } = *params;

    // zeta >= 1 is checked at load, so base^(zeta - 1) is finite even at
    // the base == 0 endpoint.
    let base = 1.0 + lambda * cos;
    let prefactor = f64::powf(2.0, 1.0 - zeta);
    let angular = prefactor * f64::powf(base, zeta);
    let angular_d_cos = prefactor * zeta * lambda * f64::powf(base, zeta - 1.0);
    (angular, angular_d_cos)
}

/// `d(cos)/d(position of a)` where `da = x_a - x_i` is the bond whose atom
/// moves and `db` is the other bond of the angle.
fn cos_d_outer(da: V3, ra: f64, db: V3, rb: f64, cos: f64) -> V3 {
    db / (ra * rb) - (cos / (ra * ra)) * da
}
