//! Structural unification with occurs-check
//!
//! [`Bindings`] is the substitution environment of one proof branch. It only
//! ever grows by adding bindings for unbound variables, so its insertion
//! order doubles as a trail: [`Bindings::mark`] records a position and
//! [`Bindings::undo_to`] drops everything bound after it. The solver extends
//! a single environment in place and undoes on backtrack.
//!
//! [`unify_terms`] and [`unify_predicates`] are the non-mutating entry
//! points: on success they return an extended copy.
//!
//! # Example
//!
//! ```rust
//! use microprolog::{unify_terms, Bindings, Term};
//!
//! // parent(X, bob) = parent(alice, Y)  =>  X = alice, Y = bob
//! let left = Term::predicate("parent", vec![Term::var("X"), Term::atom("bob")]);
//! let right = Term::predicate("parent", vec![Term::atom("alice"), Term::var("Y")]);
//! let bindings = unify_terms(&left, &right, &Bindings::new()).unwrap();
//! assert_eq!(bindings.get("X"), Some(&Term::atom("alice")));
//! ```

use crate::term::{Predicate, Term};
use indexmap::IndexMap;
use std::ops::Deref;
use std::sync::Arc;

/// Substitution environment: variable name to bound term
///
/// Acyclic by construction, since every binding passes the occurs-check.
/// Bound terms are shared, so copying an environment never deep-clones them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    map: IndexMap<String, Arc<Term>>,
}

impl Bindings {
    /// Creates an empty environment
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The term a variable is directly bound to
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Term> {
        self.map.get(name).map(Arc::as_ref)
    }

    /// Whether a variable is bound
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Number of bound variables
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True if nothing is bound
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates over bindings in the order they were made
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.map.iter().map(|(name, term)| (name.as_str(), &**term))
    }

    /// Current position in the binding history
    #[must_use]
    pub fn mark(&self) -> usize {
        self.map.len()
    }

    /// Forgets every binding made since `mark` was taken
    pub fn undo_to(&mut self, mark: usize) {
        self.map.truncate(mark);
    }

    /// Follows variable-to-term chains until reaching a non-variable or an
    /// unbound variable
    #[must_use]
    pub fn resolve<'a>(&'a self, mut term: &'a Term) -> &'a Term {
        while let Term::Variable(name) = term {
            match self.map.get(name) {
                Some(bound) => term = &**bound,
                None => break,
            }
        }
        term
    }

    /// Applies the substitution throughout a term
    #[must_use]
    pub fn substitute(&self, term: &Term) -> Term {
        match self.resolve(term) {
            Term::Predicate(predicate) => Term::Predicate(Predicate::new(
                predicate.name.clone(),
                predicate.args.iter().map(|arg| self.substitute(arg)).collect(),
            )),
            Term::And(left, right) => Term::and(self.substitute(left), self.substitute(right)),
            leaf @ (Term::Atom(_) | Term::Number(_) | Term::String(_) | Term::Variable(_)) => {
                leaf.clone()
            }
        }
    }

    /// Whether variable `name` occurs anywhere inside `term` under this environment
    #[must_use]
    pub fn occurs(&self, name: &str, term: &Term) -> bool {
        match self.resolve(term) {
            Term::Variable(other) => other == name,
            Term::Predicate(predicate) => predicate.args.iter().any(|arg| self.occurs(name, arg)),
            Term::And(left, right) => self.occurs(name, left) || self.occurs(name, right),
            Term::Atom(_) | Term::Number(_) | Term::String(_) => false,
        }
    }

    /// Unifies two terms, extending this environment in place
    ///
    /// On failure the environment is left exactly as it was.
    pub fn unify(&mut self, left: &Term, right: &Term) -> bool {
        let mark = self.mark();
        let unified = unify_in_place(left, right, self);
        if !unified {
            self.undo_to(mark);
        }
        unified
    }

    /// Unifies two predicates in place, rejecting immediately on a name or
    /// arity mismatch
    ///
    /// On failure the environment is left exactly as it was.
    pub fn unify_predicates(&mut self, left: &Predicate, right: &Predicate) -> bool {
        if !left.same_signature(right) {
            return false;
        }
        let mark = self.mark();
        let unified = unify_args(&left.args, &right.args, self);
        if !unified {
            self.undo_to(mark);
        }
        unified
    }

    /// Like [`Bindings::resolve`], but the result does not borrow `self`
    fn walk<'t>(&self, term: &'t Term) -> Walked<'t> {
        let mut current = Walked::Input(term);
        loop {
            let next = match &*current {
                Term::Variable(name) => self.map.get(name).cloned(),
                _ => None,
            };
            match next {
                Some(bound) => current = Walked::Bound(bound),
                None => return current,
            }
        }
    }

    fn bind(&mut self, name: &str, term: &Walked<'_>) -> bool {
        if self.occurs(name, term) {
            return false;
        }
        self.map.insert(name.to_owned(), term.to_shared());
        true
    }
}

/// A dereferenced term: either part of the caller's input or a bound term
/// held by the environment
#[derive(Debug)]
enum Walked<'t> {
    Input(&'t Term),
    Bound(Arc<Term>),
}

impl Walked<'_> {
    fn to_shared(&self) -> Arc<Term> {
        match self {
            Walked::Input(term) => Arc::new(Term::clone(term)),
            Walked::Bound(term) => Arc::clone(term),
        }
    }
}

impl Deref for Walked<'_> {
    type Target = Term;

    fn deref(&self) -> &Term {
        match self {
            Walked::Input(term) => *term,
            Walked::Bound(term) => &**term,
        }
    }
}

/// Unifies two terms under `bindings`
///
/// Returns the extended environment, or `None` when the terms cannot be made
/// identical (including when the occurs-check rejects a binding).
#[must_use]
pub fn unify_terms(left: &Term, right: &Term, bindings: &Bindings) -> Option<Bindings> {
    let mut next = bindings.clone();
    next.unify(left, right).then_some(next)
}

/// Unifies two predicates under `bindings`, rejecting immediately on a
/// name or arity mismatch
#[must_use]
pub fn unify_predicates(
    left: &Predicate,
    right: &Predicate,
    bindings: &Bindings,
) -> Option<Bindings> {
    if !left.same_signature(right) {
        return None;
    }
    let mut next = bindings.clone();
    next.unify_predicates(left, right).then_some(next)
}

// On failure `bindings` may hold partial work; the public methods undo it.
fn unify_in_place(left: &Term, right: &Term, bindings: &mut Bindings) -> bool {
    let left = bindings.walk(left);
    let right = bindings.walk(right);

    match (&*left, &*right) {
        (Term::Variable(a), Term::Variable(b)) if a == b => true,
        (Term::Variable(name), _) => bindings.bind(name, &right),
        (_, Term::Variable(name)) => bindings.bind(name, &left),
        (Term::Atom(a), Term::Atom(b)) | (Term::String(a), Term::String(b)) => a == b,
        (Term::Number(a), Term::Number(b)) => a == b,
        (Term::Predicate(p), Term::Predicate(q)) => {
            p.same_signature(q) && unify_args(&p.args, &q.args, bindings)
        }
        _ => false,
    }
}

fn unify_args(left: &[Term], right: &[Term], bindings: &mut Bindings) -> bool {
    left.iter()
        .zip(right)
        .all(|(l, r)| unify_in_place(l, r, bindings))
}
