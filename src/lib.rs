//! Arcology tower simulation library
//!
//! A zoned elevator network and the agents who ride it, runnable headless.

pub mod simulation;
