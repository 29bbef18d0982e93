/* ************************************************************************ **
** This file is part of pair-nn, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Reads a trained potential from a directory.
//!
//! * `graph.dat` (required): network architecture, weights, biases.
//! * `parameters.dat` (required): symmetry function table. Rows of 3 values
//!   (`eta cutoff center`) are radial; rows of 4 (`eta cutoff zeta lambda`)
//!   are angular.
//! * `mean.txt` (optional): per-feature shifts subtracted before the
//!   network sees the features.
//! * `minmax.txt` (optional): per-feature value ranges observed during
//!   training, used to flag extrapolation.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::FailResult;
use crate::activation::Activation;
use crate::network::{Matrix, Network};
use crate::symmetry::{Angular, Descriptor, Radial};

#[derive(Debug, Clone)]
pub struct PotentialFiles {
    pub network: Network,
    pub descriptors: Vec<Descriptor>,
    pub feature_means: Option<Vec<f64>>,
    pub feature_ranges: Option<Vec<(f64, f64)>>,
}

pub fn load_dir(dir: impl AsRef<Path>) -> FailResult<PotentialFiles> {
    let dir = dir.as_ref();
    info!("reading potential from {}", dir.display());

    let network = parse_graph(open(&dir.join("graph.dat"))?)?;
    info!(
        "network: {} inputs, {} hidden layers of {} nodes",
        network.num_inputs(), network.num_hidden_layers(), network.nodes_per_layer(),
    );

    let descriptors = parse_parameters(open(&dir.join("parameters.dat"))?)?;
    info!("symmetry functions: {}", descriptors.len());
    ensure!(
        descriptors.len() == network.num_inputs(),
        "parameters.dat defines {} features but graph.dat expects {} inputs",
        descriptors.len(), network.num_inputs(),
    );

    let feature_means = match open_optional(&dir.join("mean.txt"))? {
        None => {
            info!("no mean.txt; features will not be centered");
            None
        },
        Some(reader) => {
            let means = parse_means(reader)?;
            ensure!(
                means.len() == descriptors.len(),
                "mean.txt has {} entries for {} features", means.len(), descriptors.len(),
            );
            Some(means)
        },
    };

    let feature_ranges = match open_optional(&dir.join("minmax.txt"))? {
        None => {
            info!("no minmax.txt; extrapolation will not be tracked");
            None
        },
        Some(reader) => {
            let ranges = parse_minmax(reader)?;
            ensure!(
                ranges.len() == descriptors.len(),
                "minmax.txt has {} entries for {} features", ranges.len(), descriptors.len(),
            );
            Some(ranges)
        },
    };

    Ok(PotentialFiles { network, descriptors, feature_means, feature_ranges })
}

fn open(path: &Path) -> FailResult<BufReader<File>> {
    let file = File::open(path)
        .map_err(|e| format_err!("{}: {}", path.display(), e))?;
    Ok(BufReader::new(file))
}

fn open_optional(path: &Path) -> FailResult<Option<BufReader<File>>> {
    match File::open(path) {
        Ok(file) => Ok(Some(BufReader::new(file))),
        Err(e) => match e.kind() {
            io::ErrorKind::NotFound => Ok(None),
            _ => Err(format_err!("{}: {}", path.display(), e)),
        },
    }
}

fn parse_floats(line: &str) -> FailResult<Vec<f64>> {
    line.split_whitespace()
        .map(|token| Ok(token.parse()?))
        .collect()
}

/// Layout: a header line (`hidden-layers nodes activation inputs outputs`),
/// then one weight matrix row per line, a blank line, then one bias vector
/// per line. The output layer's weights are written as rows of `nodes`
/// values and its bias row is padded to `nodes` values; both are cut back
/// to the true output width here.
pub fn parse_graph(reader: impl BufRead) -> FailResult<Network> {
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => bail!("empty network file"),
    };
    let fields: Vec<&str> = header.split_whitespace().collect();
    ensure!(fields.len() == 5, "malformed network header: {:?}", header);
    let num_hidden: usize = fields[0].parse()?;
    let nodes: usize = fields[1].parse()?;
    let activation = Activation::from_name(fields[2])?;
    let num_inputs: usize = fields[3].parse()?;
    let num_outputs: usize = fields[4].parse()?;
    ensure!(num_hidden >= 1, "network must have at least one hidden layer");
    ensure!(nodes >= 1 && num_inputs >= 1, "malformed network header: {:?}", header);

    let mut weight_rows: Vec<Vec<f64>> = vec![];
    for line in &mut lines {
        let line = line?;
        if line.trim().is_empty() {
            if weight_rows.is_empty() {
                continue;
            }
            break;
        }
        let row = parse_floats(&line)?;
        ensure!(
            row.len() == nodes,
            "weight row {} has {} values (expected {})", weight_rows.len() + 1, row.len(), nodes,
        );
        weight_rows.push(row);
    }

    let expected = num_inputs + (num_hidden - 1) * nodes + num_outputs;
    ensure!(
        weight_rows.len() == expected,
        "have {} weight rows (expected {})", weight_rows.len(), expected,
    );

    let mut bias_rows: Vec<Vec<f64>> = vec![];
    for line in &mut lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        bias_rows.push(parse_floats(&line)?);
    }
    ensure!(
        bias_rows.len() == num_hidden + 1,
        "have {} bias rows (expected {})", bias_rows.len(), num_hidden + 1,
    );

    let mut weights = vec![];
    let mut next_row = 0;
    let mut take = |n: usize| {
        let rows = weight_rows[next_row..next_row + n].to_vec();
        next_row += n;
        rows
    };
    weights.push(Matrix::from_rows(take(num_inputs))?);
    for _ in 1..num_hidden {
        weights.push(Matrix::from_rows(take(nodes))?);
    }
    // the output block is written transposed relative to the others
    weights.push(Matrix::from_rows(take(num_outputs))?.transposed());

    let mut biases = bias_rows;
    for (i, row) in biases[..num_hidden].iter().enumerate() {
        ensure!(
            row.len() == nodes,
            "bias row {} has {} values (expected {})", i + 1, row.len(), nodes,
        );
    }
    {
        let last = biases.last_mut().unwrap();
        ensure!(
            last.len() >= num_outputs,
            "output bias row has {} values (expected at least {})", last.len(), num_outputs,
        );
        last.truncate(num_outputs);
    }

    Network::new(activation, weights, biases)
}

/// Layout: a count line, then one symmetry function per line.
pub fn parse_parameters(reader: impl BufRead) -> FailResult<Vec<Descriptor>> {
    let mut lines = reader.lines();

    let count: usize = match lines.next() {
        Some(line) => line?.trim().parse()?,
        None => bail!("empty parameters file"),
    };

    let mut descriptors = vec![];
    for line in &mut lines {
        let line = line?;
        if line.trim().is_empty() {
            if descriptors.is_empty() {
                continue;
            }
            break;
        }
        let row = parse_floats(&line)?;
        descriptors.push(match row[..] {
            [eta, cutoff, center] => {
                ensure!(cutoff > 0.0, "nonpositive cutoff in parameters.dat");
                Descriptor::Radial(Radial { eta, cutoff, center })
            },
            [eta, cutoff, zeta, lambda] => {
                ensure!(cutoff > 0.0, "nonpositive cutoff in parameters.dat");
                ensure!(zeta >= 1.0, "angular function has zeta < 1");
                ensure!(
                    lambda == 1.0 || lambda == -1.0,
                    "angular function has lambda {} (expected +1 or -1)", lambda,
                );
                Descriptor::Angular(Angular { eta, cutoff, zeta, lambda })
            },
            _ => bail!(
                "symmetry function row has {} parameters (expected 3 or 4)", row.len(),
            ),
        });
    }

    ensure!(
        descriptors.len() == count,
        "parameters.dat declares {} functions but defines {}", count, descriptors.len(),
    );
    Ok(descriptors)
}

/// One shift value per feature, in any whitespace-separated layout.
pub fn parse_means(mut reader: impl BufRead) -> FailResult<Vec<f64>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_floats(&text)
}

/// `(min, max)` per feature, two values per entry.
pub fn parse_minmax(mut reader: impl BufRead) -> FailResult<Vec<(f64, f64)>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let values = parse_floats(&text)?;
    ensure!(values.len() % 2 == 0, "odd number of values in minmax file");

    values.chunks(2).map(|pair| {
        let (min, max) = (pair[0], pair[1]);
        ensure!(min <= max, "inverted range in minmax file: ({}, {})", min, max);
        Ok((min, max))
    }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Scratch;

    const GRAPH: &str = "\
1 2 sigmoid 2 1
0.1 -0.2
0.3 0.4
2.0 -1.0

0.05 -0.05
0.5 0.0
";

    const PARAMETERS: &str = "\
3

1.0 4.0 0.0
0.5 4.0 1.5
0.01 4.0 2.0 -1.0
";

    fn sigmoid(x: f64) -> f64 { 1.0 / (1.0 + (-x).exp()) }

    #[test]
    fn graph_round_trip() {
        let network = parse_graph(GRAPH.as_bytes()).unwrap();
        assert_eq!(network.num_inputs(), 2);
        assert_eq!(network.num_hidden_layers(), 1);
        assert_eq!(network.nodes_per_layer(), 2);

        let mut scratch = Scratch::new(&network);
        let (x0, x1) = (0.7, -0.3);
        let h0 = sigmoid(0.1 * x0 + 0.3 * x1 + 0.05);
        let h1 = sigmoid(-0.2 * x0 + 0.4 * x1 - 0.05);
        let expected = 2.0 * h0 - 1.0 * h1 + 0.5;
        assert_close!(rel=1e-12, network.forward(&[x0, x1], &mut scratch), expected);
    }

    #[test]
    fn graph_with_two_hidden_layers() {
        let text = "\
2 2 sigmoid 1 1
0.1 0.2
0.3 0.4
0.5 0.6
1.0 -1.0

0.0 0.0
0.1 0.2
0.3 0.0
";
        let network = parse_graph(text.as_bytes()).unwrap();
        assert_eq!(network.num_hidden_layers(), 2);

        let mut scratch = Scratch::new(&network);
        let x = 0.4;
        let h0 = sigmoid(0.1 * x);
        let h1 = sigmoid(0.2 * x);
        let g0 = sigmoid(0.3 * h0 + 0.5 * h1 + 0.1);
        let g1 = sigmoid(0.4 * h0 + 0.6 * h1 + 0.2);
        let expected = g0 - g1 + 0.3;
        assert_close!(rel=1e-12, network.forward(&[x], &mut scratch), expected);
    }

    #[test]
    fn graph_errors() {
        // missing weight row
        let truncated = "\
1 2 sigmoid 2 1
0.1 -0.2
2.0 -1.0

0.05 -0.05
0.5 0.0
";
        assert!(parse_graph(truncated.as_bytes()).is_err());

        // unknown activation
        let unknown = GRAPH.replace("sigmoid", "relu");
        assert!(parse_graph(unknown.as_bytes()).is_err());

        // ragged weight row
        let ragged = GRAPH.replace("0.3 0.4", "0.3 0.4 0.5");
        assert!(parse_graph(ragged.as_bytes()).is_err());
    }

    #[test]
    fn parameters_round_trip() {
        let descriptors = parse_parameters(PARAMETERS.as_bytes()).unwrap();
        assert_eq!(descriptors.len(), 3);
        assert_eq!(
            descriptors[0],
            Descriptor::Radial(Radial { eta: 1.0, cutoff: 4.0, center: 0.0 }),
        );
        assert_eq!(
            descriptors[2],
            Descriptor::Angular(Angular { eta: 0.01, cutoff: 4.0, zeta: 2.0, lambda: -1.0 }),
        );
    }

    #[test]
    fn parameters_errors() {
        // count mismatch
        assert!(parse_parameters("2\n\n1.0 4.0 0.0\n".as_bytes()).is_err());
        // wrong arity
        assert!(parse_parameters("1\n\n1.0 4.0\n".as_bytes()).is_err());
        // zeta < 1 breaks the derivative at the collinear endpoint
        assert!(parse_parameters("1\n\n1.0 4.0 0.5 1.0\n".as_bytes()).is_err());
        // lambda must be a sign
        assert!(parse_parameters("1\n\n1.0 4.0 2.0 0.5\n".as_bytes()).is_err());
    }

    #[test]
    fn optional_tables() {
        assert_eq!(parse_means("0.5 1.5\n2.5\n".as_bytes()).unwrap(), vec![0.5, 1.5, 2.5]);
        assert_eq!(
            parse_minmax("0.0 1.0\n-2.0 2.0\n".as_bytes()).unwrap(),
            vec![(0.0, 1.0), (-2.0, 2.0)],
        );
        assert!(parse_minmax("0.0 1.0 2.0\n".as_bytes()).is_err());
        assert!(parse_minmax("1.0 0.0\n".as_bytes()).is_err());
    }
}
