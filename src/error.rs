use thiserror::Error;

/// Errors raised while storing clauses or answering queries.
///
/// Unification failure is not an error: it prunes a branch and shows up as
/// fewer (or zero) solutions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A query goal contained something other than predicates and conjunctions
    #[error("malformed query goal: expected a predicate or conjunction, found {kind}")]
    MalformedGoal {
        /// Kind of the offending node (e.g. `"number"`)
        kind: &'static str,
    },

    /// A rule body contained something other than predicates and conjunctions
    #[error("malformed body in rule `{head}`: expected a predicate or conjunction, found {kind}")]
    MalformedRule {
        /// Head of the rejected rule
        head: String,
        /// Kind of the offending node
        kind: &'static str,
    },

    /// A branch of the search went deeper than the configured limit
    #[error("resolution depth limit of {limit} exceeded")]
    DepthLimitExceeded {
        /// The configured `max_depth`
        limit: usize,
    },

    /// A clause or query used a variable name from the renaming namespace
    #[error("variable name `{name}` is reserved: `#` marks renamed rule variables")]
    ReservedVariable {
        /// The offending variable name
        name: String,
    },

    /// Source text did not match the clause grammar
    #[cfg(feature = "parsing")]
    #[error("parse error at line {line}, column {column}: unexpected `{found}`")]
    Parse {
        /// 1-based line of the first unparsed character
        line: usize,
        /// 1-based column of the first unparsed character
        column: usize,
        /// The unparsed text, truncated
        found: String,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;
