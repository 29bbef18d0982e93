/* ************************************************************************ **
** This file is part of pair-nn, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! The feed-forward network: features in, one energy out.
//!
//! The model itself (`Network`) is immutable after construction and shared
//! read-only across sites; all per-evaluation storage lives in a `Scratch`
//! owned by the caller, so concurrent site evaluations never contend.

use crate::FailResult;
use crate::activation::Activation;

/// Dense row-major matrix.
///
/// Weight matrices are stored with shape `[inputs_of_layer, outputs_of_layer]`,
/// so a layer application is a row-vector times matrix product.
#[derive(Debug, Clone)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn from_rows(rows: Vec<Vec<f64>>) -> FailResult<Matrix> {
        ensure!(!rows.is_empty(), "empty weight matrix");
        let cols = rows[0].len();
        ensure!(cols > 0, "empty weight matrix row");
        ensure!(
            rows.iter().all(|row| row.len() == cols),
            "ragged weight matrix (expected {} columns)", cols,
        );
        let num_rows = rows.len();
        let data = rows.into_iter().flatten().collect();
        Ok(Matrix { rows: num_rows, cols, data })
    }

    pub fn rows(&self) -> usize { self.rows }
    pub fn cols(&self) -> usize { self.cols }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn transposed(&self) -> Matrix {
        let mut data = vec![0.0; self.data.len()];
        for i in 0..self.rows {
            for j in 0..self.cols {
                data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        Matrix { rows: self.cols, cols: self.rows, data }
    }

    /// `out[j] = sum_i x[i] * self[i][j]`
    pub fn vec_mul(&self, x: &[f64], out: &mut [f64]) {
        assert_eq!(x.len(), self.rows);
        assert_eq!(out.len(), self.cols);
        for value in out.iter_mut() {
            *value = 0.0;
        }
        for (xi, row) in x.iter().zip(0..self.rows) {
            for (value, w) in out.iter_mut().zip(self.row(row)) {
                *value += xi * w;
            }
        }
    }
}

/// The trained model. `weights[l]` and `biases[l]` map layer `l` to layer
/// `l + 1`, where layer 0 is the (linear) input layer and the last layer is
/// the (linear) scalar output.
#[derive(Debug, Clone)]
pub struct Network {
    activation: Activation,
    weights: Vec<Matrix>,
    weights_t: Vec<Matrix>,
    biases: Vec<Vec<f64>>,
    num_inputs: usize,
    num_outputs: usize,
    nodes_per_layer: usize,
}

impl Network {
    pub fn new(
        activation: Activation,
        weights: Vec<Matrix>,
        biases: Vec<Vec<f64>>,
    ) -> FailResult<Network> {
        ensure!(weights.len() >= 2, "network must have at least one hidden layer");
        ensure!(
            weights.len() == biases.len(),
            "have {} weight matrices but {} bias vectors", weights.len(), biases.len(),
        );
        for (w, w_next) in weights.iter().zip(&weights[1..]) {
            ensure!(
                w.cols() == w_next.rows(),
                "mismatched layer sizes: {} outputs feeding {} inputs",
                w.cols(), w_next.rows(),
            );
        }
        for (w, b) in weights.iter().zip(&biases) {
            ensure!(
                w.cols() == b.len(),
                "layer with {} outputs has {} biases", w.cols(), b.len(),
            );
        }

        let num_inputs = weights[0].rows();
        let num_outputs = weights.last().unwrap().cols();
        ensure!(num_outputs == 1, "energy network must have exactly one output");

        let nodes_per_layer = weights[0].cols();
        ensure!(
            weights[..weights.len() - 1].iter().all(|w| w.cols() == nodes_per_layer),
            "hidden layers must all have the same width",
        );

        let weights_t = weights.iter().map(Matrix::transposed).collect();
        Ok(Network {
            activation, weights, weights_t, biases,
            num_inputs, num_outputs, nodes_per_layer,
        })
    }

    pub fn num_inputs(&self) -> usize { self.num_inputs }
    pub fn num_outputs(&self) -> usize { self.num_outputs }
    pub fn num_hidden_layers(&self) -> usize { self.weights.len() - 1 }
    pub fn nodes_per_layer(&self) -> usize { self.nodes_per_layer }

    /// Evaluate the network, leaving every layer's activations in `scratch`
    /// for a later `backward` call.
    pub fn forward(&self, input: &[f64], scratch: &mut Scratch) -> f64 {
        assert_eq!(input.len(), self.num_inputs);
        scratch.activations[0].copy_from_slice(input);

        let last = self.weights.len() - 1;
        for (l, (w, b)) in self.weights.iter().zip(&self.biases).enumerate() {
            let (done, rest) = scratch.activations.split_at_mut(l + 1);
            let out = &mut rest[0];
            w.vec_mul(&done[l], out);
            for (value, bias) in out.iter_mut().zip(b) {
                *value += bias;
                if l != last {
                    *value = self.activation.value(*value);
                }
            }
        }
        scratch.activations[last + 1][0]
    }

    /// Backpropagate `d(output)/d(input)` into `gradient`, using the
    /// activations stored by the immediately preceding `forward` call.
    pub fn backward(&self, scratch: &mut Scratch, gradient: &mut [f64]) {
        assert_eq!(gradient.len(), self.num_inputs);
        let num_layers = self.weights.len();

        // output layer is linear; seed with d(output)/d(output) = 1
        scratch.derivatives[num_layers][0] = 1.0;

        for l in (1..num_layers).rev() {
            let (done, rest) = scratch.derivatives.split_at_mut(l + 1);
            self.weights_t[l].vec_mul(&rest[0], &mut done[l]);
            for (d, a) in done[l].iter_mut().zip(&scratch.activations[l]) {
                *d *= self.activation.deriv_from_value(*a);
            }
        }

        // input layer is linear; no activation factor
        self.weights_t[0].vec_mul(&scratch.derivatives[1], gradient);
    }
}

/// Per-evaluation storage for `forward`/`backward`.
#[derive(Debug, Clone)]
pub struct Scratch {
    activations: Vec<Vec<f64>>,
    derivatives: Vec<Vec<f64>>,
}

impl Scratch {
    pub fn new(network: &Network) -> Scratch {
        let mut sizes = Vec::with_capacity(network.num_hidden_layers() + 2);
        sizes.push(network.num_inputs());
        for _ in 0..network.num_hidden_layers() {
            sizes.push(network.nodes_per_layer());
        }
        sizes.push(network.num_outputs());

        let buffers: Vec<Vec<f64>> = sizes.iter().map(|&n| vec![0.0; n]).collect();
        Scratch {
            activations: buffers.clone(),
            derivatives: buffers,
        }
    }
}
