//! # Microprolog
//!
//! A minimal Prolog-style logic engine implementation in Rust.
//!
//! ## Features
//!
//! - Facts, rules and conjunctive queries over nested predicate terms
//! - Unification with occurs-check
//! - Depth-first backtracking resolution with per-use variable renaming
//! - Optional text front end and REPL (`parsing` feature)
//!
//! ## Example
//!
//! ```rust
//! use microprolog::{Clause, Interpreter, Predicate, Program, QueryOutcome, Term};
//!
//! let mut interpreter = Interpreter::new();
//! let program = Program::new(vec![
//!     Clause::Fact(Predicate::new("parent", vec![Term::atom("alice"), Term::atom("bob")])),
//!     Clause::Query(Term::predicate("parent", vec![Term::atom("alice"), Term::var("X")])),
//! ]);
//!
//! let Some(QueryOutcome::Solutions(solutions)) = interpreter.evaluate(&program).unwrap() else {
//!     unreachable!()
//! };
//! assert_eq!(solutions[0].get("X"), Some("bob"));
//! ```

/// Error type.
pub mod error;
/// Top-level program evaluation.
pub mod interpreter;
/// Fact and rule storage.
pub mod knowledge_base;
/// Text front end.
#[cfg(feature = "parsing")]
pub mod parser;
/// Rendering solutions into result records.
pub mod project;
/// Resolution engine.
pub mod solver;
/// Term tree.
pub mod term;
/// Unification.
pub mod unify;

pub use error::{EngineError, Result};
pub use interpreter::{Interpreter, QueryOutcome};
pub use knowledge_base::{KnowledgeBase, Rule};
#[cfg(feature = "parsing")]
pub use parser::parse_program;
pub use project::{collect_variables, is_ground, project, render, QueryResult};
pub use solver::{check_variable_names, flatten_goals, Solver, SolverConfig};
pub use term::{Clause, Predicate, Program, Term};
pub use unify::{unify_predicates, unify_terms, Bindings};
