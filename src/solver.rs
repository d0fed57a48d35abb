//! Depth-first backtracking resolution
//!
//! The solver owns no state beyond a borrowed [`KnowledgeBase`] and a counter
//! for renaming rule variables; the search itself lives on the call stack.
//! A single [`Bindings`] is extended in place as the search descends and
//! undone to a mark when it backtracks.
//!
//! For each goal the solver tries matching facts first, then matching rules,
//! each group in insertion order. That order is the order solutions are
//! produced in.
//!
//! Facts are matched as stored. Every use of a rule is *standardized apart*:
//! its variables are renamed to names unique to that use, so recursive calls
//! or sibling goals that match the same rule never share bindings by
//! accident. Renamed names contain `#`, which is reserved for this purpose
//! (see [`check_variable_names`]).
//!
//! Termination is not guaranteed. A recursive rule without a decreasing
//! argument (`loop(X) :- loop(X).`) searches forever unless
//! [`SolverConfig::max_depth`] is set.

use crate::error::{EngineError, Result};
use crate::knowledge_base::{KnowledgeBase, Rule};
use crate::term::{Predicate, Term};
use crate::unify::Bindings;
use indexmap::IndexMap;
use log::trace;
use std::ops::ControlFlow;

/// Marks variable names produced by renaming
const RENAME_MARKER: char = '#';

/// Search limits for a [`Solver`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverConfig {
    /// Maximum number of nested rule expansions along a single branch.
    /// Fact matches are not counted. `None` means unlimited.
    pub max_depth: Option<usize>,
}

impl SolverConfig {
    /// Sets the maximum branch depth
    #[must_use]
    pub fn with_max_depth(mut self, limit: usize) -> Self {
        self.max_depth = Some(limit);
        self
    }
}

/// Resolution engine over a borrowed knowledge base
///
/// Variable names containing `#` are reserved for renamed rule variables;
/// goals and clauses using them can alias a rule use.
#[derive(Debug)]
pub struct Solver<'kb> {
    kb: &'kb KnowledgeBase,
    config: SolverConfig,
    uses: usize,
}

impl<'kb> Solver<'kb> {
    /// Creates a solver with the default (unlimited) configuration
    #[must_use]
    pub fn new(kb: &'kb KnowledgeBase) -> Self {
        Self::with_config(kb, SolverConfig::default())
    }

    /// Creates a solver with explicit limits
    #[must_use]
    pub fn with_config(kb: &'kb KnowledgeBase, config: SolverConfig) -> Self {
        Self {
            kb,
            config,
            uses: 0,
        }
    }

    /// Enumerates every environment satisfying all `goals`, in search order
    ///
    /// An empty goal sequence succeeds exactly once with `bindings`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DepthLimitExceeded`] if a branch nests more
    /// rule expansions than the configured `max_depth`.
    pub fn solve(&mut self, goals: &[Predicate], bindings: Bindings) -> Result<Vec<Bindings>> {
        let mut solutions = Vec::new();
        self.for_each_solution(goals, bindings, |solution| {
            solutions.push(solution.clone());
            ControlFlow::Continue(())
        })?;
        Ok(solutions)
    }

    /// Returns the first environment satisfying all `goals`, stopping the
    /// search there
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DepthLimitExceeded`] if a branch explored
    /// before the first solution nests too many rule expansions.
    pub fn prove(&mut self, goals: &[Predicate], bindings: Bindings) -> Result<Option<Bindings>> {
        let mut found = None;
        self.for_each_solution(goals, bindings, |solution| {
            found = Some(solution.clone());
            ControlFlow::Break(())
        })?;
        Ok(found)
    }

    /// Calls `visit` with each solution in search order until it returns
    /// [`ControlFlow::Break`]
    ///
    /// The environment passed to `visit` is only valid for that call.
    ///
    /// # Errors
    ///
    /// See [`Solver::solve`].
    pub fn for_each_solution<F>(
        &mut self,
        goals: &[Predicate],
        mut bindings: Bindings,
        mut visit: F,
    ) -> Result<()>
    where
        F: FnMut(&Bindings) -> ControlFlow<()>,
    {
        self.search(goals, &mut bindings, 0, &mut visit)?;
        Ok(())
    }

    fn search(
        &mut self,
        goals: &[Predicate],
        bindings: &mut Bindings,
        depth: usize,
        visit: &mut dyn FnMut(&Bindings) -> ControlFlow<()>,
    ) -> Result<ControlFlow<()>> {
        let Some((goal, rest)) = goals.split_first() else {
            return Ok(visit(bindings));
        };

        let kb = self.kb;
        trace!("depth {depth}: solving {goal}");

        for fact in kb.lookup_facts(&goal.name, goal.arity()) {
            let mark = bindings.mark();
            if bindings.unify_predicates(goal, fact) {
                let flow = self.search(rest, bindings, depth, visit);
                bindings.undo_to(mark);
                if flow?.is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }
        }

        for rule in kb.lookup_rules(&goal.name, goal.arity()) {
            let (head, body) = self.standardize_apart(rule);
            let mark = bindings.mark();
            if !bindings.unify_predicates(goal, &head) {
                continue;
            }
            if let Some(limit) = self.config.max_depth.filter(|&limit| depth >= limit) {
                return Err(EngineError::DepthLimitExceeded { limit });
            }
            trace!("depth {depth}: expanding {goal} via rule {}", rule.head());
            let mut pending = body;
            pending.extend_from_slice(rest);
            let flow = self.search(&pending, bindings, depth + 1, visit);
            bindings.undo_to(mark);
            if flow?.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }

        Ok(ControlFlow::Continue(()))
    }

    fn standardize_apart(&mut self, rule: &Rule) -> (Predicate, Vec<Predicate>) {
        self.uses += 1;
        let mut renamer = Renamer::new(self.uses);
        let head = renamer.predicate(rule.head());
        let body = rule
            .goals()
            .iter()
            .map(|goal| renamer.predicate(goal))
            .collect();
        (head, body)
    }
}

/// Renames the variables of a single rule use
///
/// Repeated occurrences of one variable map to the same fresh name.
#[derive(Debug)]
struct Renamer {
    suffix: usize,
    fresh: IndexMap<String, String>,
}

impl Renamer {
    fn new(suffix: usize) -> Self {
        Self {
            suffix,
            fresh: IndexMap::new(),
        }
    }

    fn predicate(&mut self, predicate: &Predicate) -> Predicate {
        Predicate::new(
            predicate.name.clone(),
            predicate.args.iter().map(|arg| self.term(arg)).collect(),
        )
    }

    fn term(&mut self, term: &Term) -> Term {
        match term {
            Term::Variable(name) => Term::Variable(self.variable(name)),
            Term::Predicate(predicate) => Term::Predicate(self.predicate(predicate)),
            Term::And(left, right) => Term::and(self.term(left), self.term(right)),
            Term::Atom(_) | Term::Number(_) | Term::String(_) => term.clone(),
        }
    }

    fn variable(&mut self, name: &str) -> String {
        let suffix = self.suffix;
        self.fresh
            .entry(name.to_owned())
            .or_insert_with(|| format!("{name}{RENAME_MARKER}{suffix}"))
            .clone()
    }
}

/// Rejects variable names that could collide with renamed rule variables
///
/// # Errors
///
/// Returns [`EngineError::ReservedVariable`] for the first variable whose
/// name contains `#`.
pub fn check_variable_names<'a>(terms: impl IntoIterator<Item = &'a Term>) -> Result<()> {
    for term in terms {
        match term {
            Term::Variable(name) if name.contains(RENAME_MARKER) => {
                return Err(EngineError::ReservedVariable { name: name.clone() });
            }
            Term::Predicate(predicate) => check_variable_names(&predicate.args)?,
            Term::And(left, right) => check_variable_names([&**left, &**right])?,
            Term::Variable(_) | Term::Atom(_) | Term::Number(_) | Term::String(_) => {}
        }
    }
    Ok(())
}

/// Flattens a goal into the predicates to prove, left to right
///
/// # Errors
///
/// Returns [`EngineError::MalformedGoal`] if the goal contains anything but
/// predicates and conjunctions.
pub fn flatten_goals(goal: &Term) -> Result<Vec<Predicate>> {
    let mut goals = Vec::new();
    collect_goals(goal, &mut goals)?;
    Ok(goals)
}

fn collect_goals(goal: &Term, out: &mut Vec<Predicate>) -> Result<()> {
    match goal {
        Term::Predicate(predicate) => {
            out.push(predicate.clone());
            Ok(())
        }
        Term::And(left, right) => {
            collect_goals(left, out)?;
            collect_goals(right, out)
        }
        other @ (Term::Atom(_) | Term::Number(_) | Term::String(_) | Term::Variable(_)) => {
            Err(EngineError::MalformedGoal { kind: other.kind() })
        }
    }
}
