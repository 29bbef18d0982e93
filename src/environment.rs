/* ************************************************************************ **
** This file is part of pair-nn, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! A snapshot of one atom's local geometry, with everything the symmetry
//! functions and the force assembler both need computed exactly once.

use crate::FailResult;
use crate::symmetry::{self, AngularKind, Descriptor, TripletGeometry};
use crate::vee::V3;

#[derive(Debug, Clone)]
pub struct AtomicEnvironment {
    /// Neighbors retained by the cutoff filter, in input order.
    pub pairs: Vec<Pair>,
}

#[derive(Debug, Clone)]
pub struct Pair {
    /// The neighbor's index in the host's neighbor list.
    pub index: usize,
    /// Displacement from the central atom to the neighbor.
    pub delta: V3,
    pub length: f64,
    /// Triplets in which this pair is the `j` leg. Partners are always
    /// later pairs, so each unordered triplet appears exactly once.
    pub triplets: Vec<Triplet>,
}

#[derive(Debug, Clone)]
pub struct Triplet {
    /// Position in `pairs` of the `k` leg.
    pub partner: usize,
    pub geometry: TripletGeometry,
}

impl AtomicEnvironment {
    /// Filter the neighbor list by `cutoff` and cache pair and triplet
    /// geometry.
    ///
    /// Out-of-range neighbors are silently skipped (hosts commonly pass
    /// padded lists); degenerate geometry is an error, never a NaN that
    /// silently poisons the forces downstream.
    pub fn compute(cutoff: f64, neighbors: &[(usize, V3)]) -> FailResult<AtomicEnvironment> {
        let mut pairs = Vec::with_capacity(neighbors.len());
        for &(index, delta) in neighbors {
            ensure!(delta.is_finite(), "non-finite displacement for neighbor {}", index);
            let length = delta.norm();
            ensure!(length > 0.0, "zero-length bond to neighbor {}", index);
            if length >= cutoff {
                continue;
            }
            pairs.push(Pair { index, delta, length, triplets: vec![] });
        }

        for j in 0..pairs.len() {
            let mut triplets = Vec::with_capacity(pairs.len() - j - 1);
            for k in j + 1..pairs.len() {
                let geometry = TripletGeometry::new(
                    pairs[j].delta, pairs[j].length,
                    pairs[k].delta, pairs[k].length,
                );
                // the jk leg enters angular derivatives as a unit vector
                ensure!(
                    geometry.length_jk > 0.0,
                    "coincident neighbors {} and {}", pairs[j].index, pairs[k].index,
                );
                triplets.push(Triplet { partner: k, geometry });
            }
            pairs[j].triplets = triplets;
        }
        Ok(AtomicEnvironment { pairs })
    }
}

/// Encode an environment as a feature vector, one slot per descriptor.
pub fn encode(
    env: &AtomicEnvironment,
    descriptors: &[Descriptor],
    angular_kind: AngularKind,
) -> Vec<f64> {
    descriptors.iter().map(|descriptor| {
        match descriptor {
            Descriptor::Radial(params) => {
                env.pairs.iter()
                    .map(|pair| symmetry::g2::compute(params, pair.length).0)
                    .sum()
            },
            Descriptor::Angular(params) => {
                env.pairs.iter()
                    .flat_map(|pair| &pair.triplets)
                    .map(|triplet| match angular_kind {
                        AngularKind::ThreeBody => symmetry::g4::compute(params, &triplet.geometry).value,
                        AngularKind::TwoBody => symmetry::g5::compute(params, &triplet.geometry).value,
                    })
                    .sum()
            },
        }
    }).collect()
}
