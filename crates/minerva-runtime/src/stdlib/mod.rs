//! Built-in command collaborators
//!
//! Pure numeric/IO routines the evaluator delegates to from command
//! dispatch. Everything here is script-agnostic: plain slices and paths in,
//! `Result` out, no access to scopes or registries.

pub mod cluster;
pub mod matrix;
pub mod neural;
pub mod plot;
pub mod table;
