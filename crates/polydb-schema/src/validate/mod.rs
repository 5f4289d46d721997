//! Descriptor validation.
//!
//! `model` checks one descriptor in isolation when it is registered;
//! `relation` needs the full model set and runs on finalize.

pub mod model;
pub mod naming;
pub mod relation;
