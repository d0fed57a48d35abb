use crate::error::{EngineError, Result};
use crate::solver::flatten_goals;
use crate::term::{Predicate, Term};
use indexmap::{Equivalent, IndexMap};
use log::debug;
use smallvec::SmallVec;

/// A rule `head :- body.` whose body has been checked to consist only of
/// predicates and conjunctions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    head: Predicate,
    body: Term,
    goals: Vec<Predicate>,
}

impl Rule {
    /// Builds a rule, flattening `body` into its goal sequence
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MalformedRule`] if the body contains anything
    /// other than predicates joined by conjunctions.
    pub fn new(head: Predicate, body: Term) -> Result<Self> {
        let goals = flatten_goals(&body).map_err(|err| match err {
            EngineError::MalformedGoal { kind } => EngineError::MalformedRule {
                head: head.to_string(),
                kind,
            },
            other => other,
        })?;
        Ok(Self { head, body, goals })
    }

    /// The rule head
    #[must_use]
    pub fn head(&self) -> &Predicate {
        &self.head
    }

    /// The body as written
    #[must_use]
    pub fn body(&self) -> &Term {
        &self.body
    }

    /// The body flattened into goals, left to right
    #[must_use]
    pub fn goals(&self) -> &[Predicate] {
        &self.goals
    }
}

/// Lookup key: predicate name and arity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Signature {
    name: String,
    arity: usize,
}

impl From<&Predicate> for Signature {
    fn from(predicate: &Predicate) -> Self {
        Self {
            name: predicate.name.clone(),
            arity: predicate.arity(),
        }
    }
}

/// Borrowed form of [`Signature`]; hashes identically so lookups don't allocate
#[derive(Hash)]
struct SignatureRef<'a> {
    name: &'a str,
    arity: usize,
}

impl Equivalent<Signature> for SignatureRef<'_> {
    fn equivalent(&self, key: &Signature) -> bool {
        self.name == key.name && self.arity == key.arity
    }
}

/// Positions into the fact or rule list, in insertion order
type Positions = SmallVec<[usize; 4]>;

/// Append-only store of facts and rules
///
/// Lookups by name and arity return entries in insertion order, which is
/// also the order in which the solver enumerates solutions. Duplicates are
/// kept: each copy yields its own solution branch.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    facts: Vec<Predicate>,
    rules: Vec<Rule>,
    fact_index: IndexMap<Signature, Positions>,
    rule_index: IndexMap<Signature, Positions>,
}

impl KnowledgeBase {
    /// Create an empty knowledge base
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fact
    pub fn add_fact(&mut self, fact: Predicate) {
        debug!("storing fact {fact}");
        self.fact_index
            .entry(Signature::from(&fact))
            .or_default()
            .push(self.facts.len());
        self.facts.push(fact);
    }

    /// Appends a rule
    pub fn add_rule(&mut self, rule: Rule) {
        debug!("storing rule {} :- {}", rule.head, rule.body);
        self.rule_index
            .entry(Signature::from(&rule.head))
            .or_default()
            .push(self.rules.len());
        self.rules.push(rule);
    }

    /// Facts named `name` with `arity` arguments, in insertion order
    pub fn lookup_facts<'a>(
        &'a self,
        name: &str,
        arity: usize,
    ) -> impl Iterator<Item = &'a Predicate> + 'a {
        Self::positions(&self.fact_index, name, arity)
            .iter()
            .map(move |&pos| &self.facts[pos])
    }

    /// Rules whose head is named `name` with `arity` arguments, in insertion order
    pub fn lookup_rules<'a>(
        &'a self,
        name: &str,
        arity: usize,
    ) -> impl Iterator<Item = &'a Rule> + 'a {
        Self::positions(&self.rule_index, name, arity)
            .iter()
            .map(move |&pos| &self.rules[pos])
    }

    fn positions<'a>(
        index: &'a IndexMap<Signature, Positions>,
        name: &str,
        arity: usize,
    ) -> &'a [usize] {
        match index.get(&SignatureRef { name, arity }) {
            Some(positions) => positions.as_slice(),
            None => &[],
        }
    }

    /// All facts in insertion order
    #[must_use]
    pub fn facts(&self) -> &[Predicate] {
        &self.facts
    }

    /// All rules in insertion order
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Total number of stored facts and rules
    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len() + self.rules.len()
    }

    /// True if nothing has been stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty() && self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fact(name: &str, args: &[&str]) -> Predicate {
        Predicate::new(name, args.iter().map(|a| Term::atom(*a)).collect())
    }

    #[test]
    fn test_empty_knowledge_base() {
        let kb = KnowledgeBase::new();
        assert!(kb.is_empty());
        assert_eq!(kb.lookup_facts("anything", 0).count(), 0);
        assert_eq!(kb.lookup_rules("anything", 0).count(), 0);
    }

    #[test]
    fn test_lookup_filters_by_name_and_arity() {
        let mut kb = KnowledgeBase::new();
        kb.add_fact(fact("parent", &["alice", "bob"]));
        kb.add_fact(fact("parent", &["alice"]));
        kb.add_fact(fact("likes", &["alice", "pizza"]));
        kb.add_fact(fact("parent", &["alice", "cathy"]));

        let parents: Vec<_> = kb.lookup_facts("parent", 2).collect();
        assert_eq!(
            parents,
            vec![
                &fact("parent", &["alice", "bob"]),
                &fact("parent", &["alice", "cathy"])
            ]
        );
        assert_eq!(kb.lookup_facts("parent", 1).count(), 1);
        assert_eq!(kb.lookup_facts("parent", 3).count(), 0);
        assert_eq!(kb.len(), 4);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut kb = KnowledgeBase::new();
        kb.add_fact(fact("p", &["a"]));
        kb.add_fact(fact("p", &["a"]));
        assert_eq!(kb.lookup_facts("p", 1).count(), 2);
    }

    #[test]
    fn test_rules_indexed_by_head() {
        let mut kb = KnowledgeBase::new();
        let head = Predicate::new("r", vec![Term::var("X")]);
        let body = Term::predicate("p", vec![Term::var("X")]);
        kb.add_rule(Rule::new(head, body).unwrap());

        let rules: Vec<_> = kb.lookup_rules("r", 1).collect();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].goals(), &[Predicate::new("p", vec![Term::var("X")])]);
        assert_eq!(kb.lookup_rules("p", 1).count(), 0);
    }

    #[test]
    fn test_rule_with_malformed_body_is_rejected() {
        let head = Predicate::new("r", vec![Term::var("X")]);
        let body = Term::and(Term::predicate("p", vec![Term::var("X")]), Term::Number(1));
        let err = Rule::new(head, body).unwrap_err();
        assert_eq!(
            err,
            EngineError::MalformedRule {
                head: "r(X)".to_string(),
                kind: "number",
            }
        );
    }

    proptest! {
        #[test]
        fn prop_lookups_reflect_every_insert_in_order(
            entries in prop::collection::vec(("[pq]", 0usize..3), 0..40)
        ) {
            let mut kb = KnowledgeBase::new();
            let mut added = Vec::new();
            for (idx, (name, arity)) in entries.iter().enumerate() {
                let value = i64::try_from(idx).unwrap();
                let args = (0..*arity).map(|_| Term::Number(value)).collect();
                let predicate = Predicate::new(name.clone(), args);
                kb.add_fact(predicate.clone());
                added.push(predicate);
            }

            prop_assert_eq!(kb.facts(), added.as_slice());
            for name in ["p", "q"] {
                for arity in 0..3 {
                    let expected: Vec<&Predicate> = added
                        .iter()
                        .filter(|p| p.name == name && p.arity() == arity)
                        .collect();
                    let found: Vec<&Predicate> = kb.lookup_facts(name, arity).collect();
                    prop_assert_eq!(found, expected);
                }
            }
        }
    }
}
