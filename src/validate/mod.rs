//! Declarative input validation.
//!
//! # Design Decisions
//! - Rule sets are static per route class, declared at startup
//! - Evaluation never short-circuits: every failing predicate for every
//!   field is collected, in declaration order
//! - Runs last in the pipeline, after identity is known, so rule sets may
//!   differ between roles

pub mod rules;

pub use rules::{FieldError, Rule, RuleSet, Validator};
