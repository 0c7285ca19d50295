//! Deterministic core of the width-based planning engine.
//!
//! # API Surface
//!
//! - [`model::state::State`] -- a STRIPS state as a fluent set
//! - [`model::problem::StripsProblem`] -- the grounded-problem contract the
//!   search engine consumes
//! - [`proof::hash::canonical_hash`] -- domain-separated content hashing for
//!   states, actions, and plans
//!
//! # Module Dependency Direction
//!
//! `proof` ← `model`
//!
//! One-way only. `model` depends on `proof` for fingerprinting; `proof`
//! depends on nothing internal.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod model;
pub mod proof;
