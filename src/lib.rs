/* ************************************************************************ **
** This file is part of pair-nn, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Single-species neural-network interatomic potential.
//!
//! A site's local neighborhood is encoded into symmetry-function features,
//! fed through a small feed-forward network to produce an energy
//! contribution, and the network's input gradient is chained back through
//! the encoding to produce analytic position gradients. Forces are the
//! negation of the gradients returned here.

#[macro_use] extern crate failure;
#[macro_use] extern crate log;

#[macro_use] pub mod assert_close;

pub mod activation;
pub mod cutoff;
pub mod environment;
pub mod forces;
pub mod load;
pub mod network;
pub mod numerical;
pub mod potential;
pub mod symmetry;
pub mod vee;

pub(crate) mod util;

pub type FailResult<T> = Result<T, failure::Error>;

pub use crate::potential::{Options, PairNn, SiteOutput, SitePotential, compute_cluster};
pub use crate::symmetry::AngularKind;
pub use crate::vee::V3;
