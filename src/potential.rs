/* ************************************************************************ **
** This file is part of pair-nn, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! The host-facing surface: a trained model plus options, evaluated one
//! site at a time against caller-supplied neighbor lists.

use std::path::Path;

use itertools::zip_eq;
use rayon_cond::CondIterator;

use crate::FailResult;
use crate::environment::{self, AtomicEnvironment};
use crate::forces::{self, SiteGrad};
use crate::load::{self, PotentialFiles};
use crate::network::{Network, Scratch};
use crate::symmetry::{AngularKind, Descriptor};
use crate::vee::V3;

#[derive(Debug, Copy, Clone)]
pub struct Options {
    /// Interaction range of the potential. Neighbors at or beyond this
    /// distance are ignored regardless of the descriptors' own cutoffs.
    pub cutoff: f64,
    /// Which angular family the 4-parameter descriptor rows denote.
    pub angular_kind: AngularKind,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            cutoff: 10.0,
            angular_kind: AngularKind::default(),
        }
    }
}

/// One site's energy contribution and its position gradients.
///
/// These are gradients, not forces; the force on an atom is the negated
/// sum of its gradient contributions over all sites.
#[derive(Debug, Clone)]
pub struct SiteOutput {
    pub value: f64,
    pub d_center: V3,
    /// Keyed by index into the neighbor list given to `compute_site`.
    /// Out-of-cutoff neighbors are omitted.
    pub d_neighbors: Vec<(usize, V3)>,
}

/// A potential that can be evaluated on one atomic site at a time.
///
/// Implementations are immutable and `Sync`; hosts may evaluate many sites
/// concurrently against one instance.
pub trait SitePotential: Sync {
    fn cutoff(&self) -> f64;

    /// `neighbors` are `(index, displacement from the central atom)` pairs.
    /// The list may include out-of-range neighbors; they are filtered here.
    fn compute_site(&self, neighbors: &[(usize, V3)]) -> FailResult<SiteOutput>;
}

/// The neural-network potential.
#[derive(Debug, Clone)]
pub struct PairNn {
    network: Network,
    descriptors: Vec<Descriptor>,
    feature_means: Option<Vec<f64>>,
    feature_ranges: Option<Vec<(f64, f64)>>,
    options: Options,
}

impl PairNn {
    pub fn new(files: PotentialFiles, options: Options) -> FailResult<PairNn> {
        ensure!(
            options.cutoff > 0.0 && options.cutoff.is_finite(),
            "bad potential cutoff: {}", options.cutoff,
        );

        let PotentialFiles { network, descriptors, feature_means, feature_ranges } = files;
        ensure!(
            descriptors.len() == network.num_inputs(),
            "{} descriptors for a network with {} inputs",
            descriptors.len(), network.num_inputs(),
        );
        if let Some(means) = &feature_means {
            ensure!(
                means.len() == descriptors.len(),
                "{} feature means for {} descriptors", means.len(), descriptors.len(),
            );
        }
        if let Some(ranges) = &feature_ranges {
            ensure!(
                ranges.len() == descriptors.len(),
                "{} feature ranges for {} descriptors", ranges.len(), descriptors.len(),
            );
        }

        Ok(PairNn { network, descriptors, feature_means, feature_ranges, options })
    }

    pub fn from_potential_dir(dir: impl AsRef<Path>, options: Options) -> FailResult<PairNn> {
        PairNn::new(load::load_dir(dir)?, options)
    }

    pub fn descriptors(&self) -> &[Descriptor] { &self.descriptors }
}

impl SitePotential for PairNn {
    fn cutoff(&self) -> f64 { self.options.cutoff }

    fn compute_site(&self, neighbors: &[(usize, V3)]) -> FailResult<SiteOutput> {
        let env = AtomicEnvironment::compute(self.options.cutoff, neighbors)?;
        let mut features = environment::encode(&env, &self.descriptors, self.options.angular_kind);

        if let Some(means) = &self.feature_means {
            for (feature, mean) in zip_eq(&mut features, means) {
                *feature -= mean;
            }
        }
        if let Some(ranges) = &self.feature_ranges {
            for (slot, (feature, &(min, max))) in zip_eq(&features, ranges).enumerate() {
                if *feature < min || max < *feature {
                    debug!(
                        "extrapolating: feature {} is {:e}, outside [{:e}, {:e}]",
                        slot, feature, min, max,
                    );
                }
            }
        }

        let mut scratch = Scratch::new(&self.network);
        let value = self.network.forward(&features, &mut scratch);

        // mean-centering is a constant shift, so the feature gradient is
        // unaffected by it
        let mut gradient = vec![0.0; features.len()];
        self.network.backward(&mut scratch, &mut gradient);

        let SiteGrad { d_center, d_neighbors } = forces::assemble(
            &env, &self.descriptors, self.options.angular_kind, &gradient,
        );
        Ok(SiteOutput { value, d_center, d_neighbors })
    }
}

/// Evaluate every site of a small isolated cluster, with brute-force
/// neighbor lists. Returns the total energy and its gradient with respect
/// to each atom's position.
///
/// This is a convenience for clusters and tests; hosts with real neighbor
/// lists drive `compute_site` themselves.
pub fn compute_cluster(
    potential: &impl SitePotential,
    carts: &[V3],
    use_rayon: bool,
) -> FailResult<(f64, Vec<V3>)> {
    let site_outputs = CondIterator::new(0..carts.len(), use_rayon)
        .map(|i| {
            let neighbors: Vec<(usize, V3)> = carts.iter().enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(j, &x)| (j, x - carts[i]))
                .collect();
            potential.compute_site(&neighbors)
        })
        .collect::<FailResult<Vec<SiteOutput>>>()?;

    let mut value = 0.0;
    let mut d_positions = vec![V3::zero(); carts.len()];
    for (i, output) in site_outputs.into_iter().enumerate() {
        value += output.value;
        d_positions[i] += output.d_center;
        for (j, d) in output.d_neighbors {
            d_positions[j] += d;
        }
    }
    Ok((value, d_positions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::Activation;
    use crate::network::Matrix;
    use crate::symmetry::{Angular, Radial};
    use crate::util::uniform;
    use crate::vee::random_unit;

    const CUTOFF: f64 = 4.0;

    fn descriptors() -> Vec<Descriptor> {
        vec![
            Descriptor::Radial(Radial { eta: 1.0, cutoff: CUTOFF, center: 0.0 }),
            Descriptor::Radial(Radial { eta: 0.5, cutoff: CUTOFF, center: 1.5 }),
            Descriptor::Angular(Angular { eta: 0.01, cutoff: CUTOFF, zeta: 2.0, lambda: 1.0 }),
            Descriptor::Angular(Angular { eta: 0.05, cutoff: CUTOFF, zeta: 4.0, lambda: -1.0 }),
        ]
    }

    fn random_network(num_inputs: usize) -> Network {
        let sizes = [num_inputs, 5, 5, 1];
        let mut weights = vec![];
        let mut biases = vec![];
        for (&m, &n) in sizes.iter().zip(&sizes[1..]) {
            let rows = (0..m)
                .map(|_| (0..n).map(|_| uniform(-1.0, 1.0)).collect())
                .collect();
            weights.push(Matrix::from_rows(rows).unwrap());
            biases.push((0..n).map(|_| uniform(-1.0, 1.0)).collect());
        }
        Network::new(Activation::Sigmoid, weights, biases).unwrap()
    }

    fn potential() -> PairNn {
        let descriptors = descriptors();
        let files = PotentialFiles {
            network: random_network(descriptors.len()),
            descriptors,
            feature_means: None,
            feature_ranges: None,
        };
        let options = Options { cutoff: CUTOFF, ..Options::default() };
        PairNn::new(files, options).unwrap()
    }

    // a jittered tetrahedron, so every pair is within the cutoff but
    // nothing is degenerate
    fn random_cluster() -> Vec<V3> {
        let base = [
            V3([0.0, 0.0, 0.0]),
            V3([1.6, 0.0, 0.0]),
            V3([0.8, 1.4, 0.0]),
            V3([0.8, 0.5, 1.3]),
        ];
        base.iter()
            .map(|&x| x + random_unit() * uniform(0.0, 0.1))
            .collect()
    }

    fn flatten(carts: &[V3]) -> Vec<f64> {
        carts.iter().flat_map(|v| v.0.iter().cloned()).collect()
    }

    fn unflatten(flat: &[f64]) -> Vec<V3> {
        flat.chunks(3).map(|c| V3([c[0], c[1], c[2]])).collect()
    }

    #[test]
    fn gradient_matches_numerical() {
        let potential = potential();
        let carts = random_cluster();

        let (_, d_positions) = compute_cluster(&potential, &carts, false).unwrap();

        let expected = crate::numerical::gradient(1e-4, None, &flatten(&carts), |flat| {
            compute_cluster(&potential, &unflatten(flat), false).unwrap().0
        });
        assert_close!(rel=1e-5, abs=1e-8, flatten(&d_positions), expected);
    }

    #[test]
    fn gradients_sum_to_zero() {
        let potential = potential();
        let (_, d_positions) = compute_cluster(&potential, &random_cluster(), false).unwrap();
        let total: V3 = d_positions.into_iter().sum();
        assert_close!(abs=1e-10, total, V3::zero());
    }

    #[test]
    fn permutation_invariance() {
        let potential = potential();
        let carts = random_cluster();
        let permutation = [2, 0, 3, 1];
        let permuted: Vec<V3> = permutation.iter().map(|&p| carts[p]).collect();

        let (value, d_positions) = compute_cluster(&potential, &carts, false).unwrap();
        let (permuted_value, permuted_d) = compute_cluster(&potential, &permuted, false).unwrap();

        assert_close!(rel=1e-12, value, permuted_value);
        for (new, &old) in permutation.iter().enumerate() {
            assert_close!(rel=1e-12, abs=1e-12, permuted_d[new], d_positions[old]);
        }
    }

    #[test]
    fn parallel_evaluation_agrees() {
        let potential = potential();
        let carts = random_cluster();
        let (serial_value, serial_d) = compute_cluster(&potential, &carts, false).unwrap();
        let (parallel_value, parallel_d) = compute_cluster(&potential, &carts, true).unwrap();
        assert_eq!(serial_value, parallel_value);
        assert_eq!(serial_d, parallel_d);
    }

    #[test]
    fn isolated_atom() {
        let potential = potential();
        let output = potential.compute_site(&[]).unwrap();
        assert!(output.value.is_finite());
        assert_eq!(output.d_center, V3::zero());
        assert!(output.d_neighbors.is_empty());
    }

    #[test]
    fn mean_centering_shifts_inputs() {
        let descriptors = descriptors();
        let network = random_network(descriptors.len());
        let carts = random_cluster();

        let neighbors: Vec<(usize, V3)> = carts[1..].iter()
            .map(|&x| x - carts[0])
            .enumerate()
            .collect();

        // choose the means to be exactly this environment's features, so
        // the centered network sees a zero input vector
        let env = AtomicEnvironment::compute(CUTOFF, &neighbors).unwrap();
        let features = environment::encode(&env, &descriptors, AngularKind::default());

        let files = PotentialFiles {
            network: network.clone(),
            descriptors: descriptors.clone(),
            feature_means: Some(features.clone()),
            feature_ranges: None,
        };
        let options = Options { cutoff: CUTOFF, ..Options::default() };
        let potential = PairNn::new(files, options).unwrap();

        let mut scratch = Scratch::new(&network);
        let expected = network.forward(&vec![0.0; features.len()], &mut scratch);
        let output = potential.compute_site(&neighbors).unwrap();
        assert_close!(rel=1e-12, output.value, expected);
    }

    #[test]
    fn feature_ranges_are_informational() {
        let descriptors = descriptors();
        let network = random_network(descriptors.len());
        let carts = random_cluster();
        let neighbors: Vec<(usize, V3)> = carts[1..].iter()
            .map(|&x| x - carts[0])
            .enumerate()
            .collect();

        let options = Options { cutoff: CUTOFF, ..Options::default() };
        let files = |ranges: Option<Vec<(f64, f64)>>| PotentialFiles {
            network: network.clone(),
            descriptors: descriptors.clone(),
            feature_means: None,
            feature_ranges: ranges,
        };

        let bare = PairNn::new(files(None), options).unwrap()
            .compute_site(&neighbors).unwrap();

        // wide ranges flag nothing; collapsed ranges flag every slot.
        // either way the output must be bit-identical.
        let wide = Some(vec![(-1e6, 1e6); descriptors.len()]);
        let collapsed = Some(vec![(0.0, 0.0); descriptors.len()]);
        for ranges in vec![wide, collapsed] {
            let output = PairNn::new(files(ranges), options).unwrap()
                .compute_site(&neighbors).unwrap();
            assert_eq!(output.value, bare.value);
            assert_eq!(output.d_center, bare.d_center);
            assert_eq!(output.d_neighbors, bare.d_neighbors);
        }
    }

    #[test]
    fn constructor_validation() {
        let descriptors = descriptors();
        let files = PotentialFiles {
            network: random_network(descriptors.len()),
            descriptors,
            feature_means: None,
            feature_ranges: None,
        };

        // bad cutoff
        let options = Options { cutoff: 0.0, ..Options::default() };
        assert!(PairNn::new(files.clone(), options).is_err());

        // means table of the wrong length
        let mut files = files;
        files.feature_means = Some(vec![0.0; 3]);
        assert!(PairNn::new(files, Options { cutoff: CUTOFF, ..Options::default() }).is_err());
    }
}
