use std::fmt;

/// A node of the term tree
///
/// `And` only ever appears at goal position (query goals and rule bodies);
/// it is never a unifiable argument value.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Term {
    /// A symbolic constant (e.g. `alice`)
    Atom(String),
    /// An integer literal (e.g. `42`)
    Number(i64),
    /// A double-quoted string literal, stored without quotes
    String(String),
    /// A logic variable (e.g. `X`)
    Variable(String),
    /// A named term with ordered arguments (e.g. `parent(alice, X)`)
    Predicate(Predicate),
    /// Conjunction of two goals (`left, right`)
    And(Box<Term>, Box<Term>),
}

impl Term {
    /// Creates an atom
    #[must_use]
    pub fn atom(value: impl Into<String>) -> Self {
        Self::Atom(value.into())
    }

    /// Creates a string literal
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Creates a variable
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// Creates a predicate term
    #[must_use]
    pub fn predicate(name: impl Into<String>, args: Vec<Term>) -> Self {
        Self::Predicate(Predicate::new(name, args))
    }

    /// Creates the conjunction `left, right`
    #[must_use]
    pub fn and(left: Term, right: Term) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    /// Folds goals into a right-nested conjunction, `None` when empty
    #[must_use]
    pub fn conjunction(goals: impl IntoIterator<Item = Predicate>) -> Option<Self> {
        let goals: Vec<Predicate> = goals.into_iter().collect();
        goals
            .into_iter()
            .rev()
            .map(Term::Predicate)
            .reduce(|rest, goal| Term::and(goal, rest))
    }

    /// Short name of the node kind, used in diagnostics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Term::Atom(_) => "atom",
            Term::Number(_) => "number",
            Term::String(_) => "string",
            Term::Variable(_) => "variable",
            Term::Predicate(_) => "predicate",
            Term::And(..) => "conjunction",
        }
    }
}

impl From<Predicate> for Term {
    fn from(predicate: Predicate) -> Self {
        Self::Predicate(predicate)
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Atom(value) | Term::Variable(value) => f.write_str(value),
            Term::Number(value) => write!(f, "{value}"),
            Term::String(value) => write!(f, "\"{value}\""),
            Term::Predicate(predicate) => write!(f, "{predicate}"),
            Term::And(left, right) => write!(f, "{left}, {right}"),
        }
    }
}

/// A predicate (e.g. `parent(alice, bob)`): the unit of fact, rule and goal matching
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Predicate {
    /// The predicate name (e.g. `"parent"`)
    pub name: String,
    /// The ordered arguments
    #[cfg_attr(feature = "serde", serde(default))]
    pub args: Vec<Term>,
}

impl Predicate {
    /// Creates a predicate
    #[must_use]
    pub fn new(name: impl Into<String>, args: Vec<Term>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Number of arguments
    #[must_use]
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// True when both predicates share name and arity
    #[must_use]
    pub fn same_signature(&self, other: &Predicate) -> bool {
        self.name == other.name && self.arity() == other.arity()
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.args.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (idx, arg) in self.args.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// One top-level clause of a program
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Clause {
    /// `name(arg, ...).`
    Fact(Predicate),
    /// `head :- body.`
    Rule {
        /// The rule head
        head: Predicate,
        /// Predicates joined by `And`
        body: Term,
    },
    /// `?- goal.`
    Query(Term),
}

impl Clause {
    /// Short name of the clause kind, used in diagnostics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Clause::Fact(_) => "fact",
            Clause::Rule { .. } => "rule",
            Clause::Query(_) => "query",
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Fact(fact) => write!(f, "{fact}."),
            Clause::Rule { head, body } => write!(f, "{head} :- {body}."),
            Clause::Query(goal) => write!(f, "?- {goal}."),
        }
    }
}

/// An ordered sequence of clauses
#[derive(Debug, Clone, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    /// Clauses in source order
    pub clauses: Vec<Clause>,
}

impl Program {
    /// Creates a program from clauses
    #[must_use]
    pub fn new(clauses: Vec<Clause>) -> Self {
        Self { clauses }
    }
}

impl FromIterator<Clause> for Program {
    fn from_iter<I: IntoIterator<Item = Clause>>(iter: I) -> Self {
        Self {
            clauses: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_nested_predicate() {
        let term = Term::predicate(
            "has",
            vec![Term::predicate(
                "parent",
                vec![Term::atom("alice"), Term::var("X"), Term::Number(3)],
            )],
        );
        assert_eq!(term.to_string(), "has(parent(alice, X, 3))");
    }

    #[test]
    fn test_display_string_is_quoted() {
        let term = Term::predicate("name", vec![Term::string("Bob Smith")]);
        assert_eq!(term.to_string(), "name(\"Bob Smith\")");
    }

    #[test]
    fn test_conjunction_nests_to_the_right() {
        let p = Predicate::new("p", vec![]);
        let q = Predicate::new("q", vec![]);
        let r = Predicate::new("r", vec![]);

        let goal = Term::conjunction([p.clone(), q.clone(), r.clone()]).unwrap();
        assert_eq!(
            goal,
            Term::and(p.into(), Term::and(q.into(), r.into())),
        );
        assert_eq!(goal.to_string(), "p, q, r");
        assert!(Term::conjunction(Vec::new()).is_none());
    }

    #[test]
    fn test_clause_display() {
        let head = Predicate::new("grandparent", vec![Term::var("X"), Term::var("Z")]);
        let body = Term::and(
            Term::predicate("parent", vec![Term::var("X"), Term::var("Y")]),
            Term::predicate("parent", vec![Term::var("Y"), Term::var("Z")]),
        );
        let rule = Clause::Rule { head, body };
        assert_eq!(
            rule.to_string(),
            "grandparent(X, Z) :- parent(X, Y), parent(Y, Z)."
        );
        assert_eq!(rule.kind(), "rule");
    }

    #[test]
    fn test_same_signature() {
        let a = Predicate::new("p", vec![Term::atom("a")]);
        let b = Predicate::new("p", vec![Term::var("X")]);
        let c = Predicate::new("p", vec![Term::atom("a"), Term::atom("b")]);
        assert!(a.same_signature(&b));
        assert!(!a.same_signature(&c));
    }
}
