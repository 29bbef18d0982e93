/* ************************************************************************ **
** This file is part of pair-nn, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Chains the network's per-feature gradient back through the cached
//! environment geometry into per-atom position gradients.
//!
//! Every pair and triplet contribution is added to its atoms in the same
//! step, with the central atom always receiving the negated sum, so the
//! assembled gradients sum to zero over any isolated site exactly (not
//! merely to roundoff).

use itertools::zip_eq;

use crate::environment::AtomicEnvironment;
use crate::symmetry::{self, AngularKind, Descriptor};
use crate::vee::V3;

/// Position gradients of one site's energy contribution.
#[derive(Debug, Clone)]
pub struct SiteGrad {
    pub d_center: V3,
    /// Keyed by the neighbor's index in the host's neighbor list.
    /// Out-of-cutoff neighbors do not appear.
    pub d_neighbors: Vec<(usize, V3)>,
}

/// `gradient` is `d(site energy)/d(feature)`, one slot per descriptor.
pub fn assemble(
    env: &AtomicEnvironment,
    descriptors: &[Descriptor],
    angular_kind: AngularKind,
    gradient: &[f64],
) -> SiteGrad {
    let mut d_center = V3::zero();
    let mut d_pairs = vec![V3::zero(); env.pairs.len()];

    for (descriptor, &energy_d_feature) in zip_eq(descriptors, gradient) {
        match descriptor {
            Descriptor::Radial(params) => {
                for (jj, pair) in env.pairs.iter().enumerate() {
                    let (_, value_d_r) = symmetry::g2::compute(params, pair.length);
                    let d = (energy_d_feature * value_d_r / pair.length) * pair.delta;
                    d_pairs[jj] += d;
                    d_center -= d;
                }
            },
            Descriptor::Angular(params) => {
                for (jj, pair) in env.pairs.iter().enumerate() {
                    for triplet in &pair.triplets {
                        let output = match angular_kind {
                            AngularKind::ThreeBody => symmetry::g4::compute(params, &triplet.geometry),
                            AngularKind::TwoBody => symmetry::g5::compute(params, &triplet.geometry),
                        };
                        let d_j = energy_d_feature * output.value_d_rj;
                        let d_k = energy_d_feature * output.value_d_rk;
                        d_pairs[jj] += d_j;
                        d_pairs[triplet.partner] += d_k;
                        d_center -= d_j + d_k;
                    }
                }
            },
        }
    }

    let d_neighbors = zip_eq(&env.pairs, d_pairs)
        .map(|(pair, d)| (pair.index, d))
        .collect();
    SiteGrad { d_center, d_neighbors }
}
