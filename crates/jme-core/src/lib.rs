//! # jme-core
//!
//! Shared building blocks for the JME flattening pipeline: the per-event raw
//! input model handed over by the host framework, small kinematics helpers,
//! the error type, and the traits behind which calibration services sit.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod kinematics;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use kinematics::LorentzVector;
pub use traits::{JecUncertaintyProvider, JetIdProvider, MuonMomentumCorrector};
pub use types::*;
