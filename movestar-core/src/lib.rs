#![allow(clippy::field_reassign_with_default)]

//! Crate containing the MOVESTAR models for second-by-second estimation of fuel
//! consumption and tailpipe emissions from a vehicle speed trace, based on the MOVES
//! operating-mode methodology.
//!
//! The pipeline runs [kinematics] -> [vsp] -> [opmode] -> [emissions], orchestrated by
//! [trip]. Driving-behavior scores live in [scoring].
//!
//! # Features:
//! - resources: embed the default vehicle coefficient table in the binary

#[macro_use]
pub mod macros;

pub mod emissions;
pub mod error;
pub mod imports;
pub mod kinematics;
pub mod opmode;
pub mod params;
pub mod prelude;
#[cfg(feature = "resources")]
pub mod resources;
pub mod scoring;
pub mod tables;
pub mod trace;
pub mod traits;
pub mod trip;
pub mod utils;
pub mod vehicle;
pub mod vsp;
