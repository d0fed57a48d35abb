use crate::error::Result;
use crate::knowledge_base::{KnowledgeBase, Rule};
use crate::project::{collect_variables, is_ground, project, QueryResult};
use crate::solver::{check_variable_names, flatten_goals, Solver, SolverConfig};
use crate::term::{Clause, Program, Term};
use crate::unify::Bindings;
use log::debug;
use std::fmt;
use std::iter;
use std::ops::ControlFlow;

/// Answer to a query clause
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum QueryOutcome {
    /// A ground query: whether at least one proof exists
    Proven(bool),
    /// A query with variables: one record per solution, in search order
    Solutions(Vec<QueryResult>),
}

impl QueryOutcome {
    /// True if the query had at least one solution
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            QueryOutcome::Proven(proven) => *proven,
            QueryOutcome::Solutions(solutions) => !solutions.is_empty(),
        }
    }
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutcome::Proven(proven) => write!(f, "{proven}"),
            QueryOutcome::Solutions(solutions) if solutions.is_empty() => f.write_str("false"),
            QueryOutcome::Solutions(solutions) => {
                for (idx, solution) in solutions.iter().enumerate() {
                    if idx > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{solution}")?;
                }
                Ok(())
            }
        }
    }
}

/// Evaluates programs against a knowledge base it owns
///
/// Facts and rules accumulate across calls to [`Interpreter::evaluate`];
/// every interpreter has its own knowledge base.
#[derive(Debug, Default)]
pub struct Interpreter {
    kb: KnowledgeBase,
    config: SolverConfig,
}

impl Interpreter {
    /// Create an interpreter with an empty knowledge base
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an interpreter whose queries run under `config`
    #[must_use]
    pub fn with_config(config: SolverConfig) -> Self {
        Self {
            kb: KnowledgeBase::new(),
            config,
        }
    }

    /// The knowledge base built so far
    #[must_use]
    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    /// Processes clauses in order and returns the outcome of the last query
    ///
    /// Facts and rules are stored; they leave the current result unchanged.
    /// Returns `None` if the program has no query.
    ///
    /// # Errors
    ///
    /// Stops at the first malformed clause, the first clause using a reserved
    /// variable name (one containing `#`), or a query exceeding the depth
    /// limit. Clauses processed before it stay in the knowledge base.
    pub fn evaluate(&mut self, program: &Program) -> Result<Option<QueryOutcome>> {
        let mut outcome = None;
        for clause in &program.clauses {
            if let Some(answer) = self.evaluate_clause(clause)? {
                outcome = Some(answer);
            }
        }
        Ok(outcome)
    }

    /// Processes a single clause, returning an outcome for queries
    ///
    /// # Errors
    ///
    /// See [`Interpreter::evaluate`].
    pub fn evaluate_clause(&mut self, clause: &Clause) -> Result<Option<QueryOutcome>> {
        match clause {
            Clause::Fact(fact) => {
                check_variable_names(&fact.args)?;
                self.kb.add_fact(fact.clone());
                Ok(None)
            }
            Clause::Rule { head, body } => {
                check_variable_names(head.args.iter().chain(iter::once(body)))?;
                self.kb.add_rule(Rule::new(head.clone(), body.clone())?);
                Ok(None)
            }
            Clause::Query(goal) => self.query(goal).map(Some),
        }
    }

    /// Answers `goal` against the current knowledge base
    ///
    /// A ground goal yields [`QueryOutcome::Proven`]; otherwise every
    /// solution is projected onto the goal's variables.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::MalformedGoal`] for goals that are not
    /// predicates or conjunctions, [`crate::EngineError::ReservedVariable`]
    /// for variable names containing `#`, or
    /// [`crate::EngineError::DepthLimitExceeded`].
    pub fn query(&self, goal: &Term) -> Result<QueryOutcome> {
        check_variable_names([goal])?;
        let goals = flatten_goals(goal)?;
        let mut solver = Solver::with_config(&self.kb, self.config);

        if is_ground(goal) {
            let proven = solver.prove(&goals, Bindings::new())?.is_some();
            debug!("?- {goal} => {proven}");
            return Ok(QueryOutcome::Proven(proven));
        }

        let variables = collect_variables(goal);
        let mut solutions = Vec::new();
        solver.for_each_solution(&goals, Bindings::new(), |bindings| {
            solutions.push(project(bindings, &variables));
            ControlFlow::Continue(())
        })?;
        debug!("?- {goal} => {} solution(s)", solutions.len());
        Ok(QueryOutcome::Solutions(solutions))
    }

    /// Parses `source` and evaluates it
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::Parse`] if the text does not parse,
    /// otherwise see [`Interpreter::evaluate`].
    #[cfg(feature = "parsing")]
    pub fn evaluate_source(&mut self, source: &str) -> Result<Option<QueryOutcome>> {
        let program = crate::parser::parse_program(source)?;
        self.evaluate(&program)
    }
}
