//! Property-based tests for the parser
//!
//! These check properties that must hold for any input rather than for
//! hand-picked fixtures: every byte lands somewhere in the tree, chunking
//! never changes the result, and copies stay faithful to their original.

mod generators;
mod invariants;
