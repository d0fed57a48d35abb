use crate::term::Term;
use crate::unify::Bindings;
use indexmap::{IndexMap, IndexSet};
use std::fmt;

/// Result of a non-ground query - one set of variable bindings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryResult {
    /// Query variable name to rendered value, in first-occurrence order
    pub bindings: IndexMap<String, String>,
}

impl QueryResult {
    /// The rendered value of a query variable
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bindings.is_empty() {
            return f.write_str("true");
        }
        for (idx, (name, value)) in self.bindings.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name} = {value}")?;
        }
        Ok(())
    }
}

/// True if no variable appears anywhere in `term`
#[must_use]
pub fn is_ground(term: &Term) -> bool {
    match term {
        Term::Variable(_) => false,
        Term::Atom(_) | Term::Number(_) | Term::String(_) => true,
        Term::Predicate(predicate) => predicate.args.iter().all(is_ground),
        Term::And(left, right) => is_ground(left) && is_ground(right),
    }
}

/// Distinct variable names of `term`, in first-occurrence order
#[must_use]
pub fn collect_variables(term: &Term) -> IndexSet<String> {
    let mut variables = IndexSet::new();
    gather(term, &mut variables);
    variables
}

fn gather(term: &Term, variables: &mut IndexSet<String>) {
    match term {
        Term::Variable(name) => {
            if !variables.contains(name) {
                variables.insert(name.clone());
            }
        }
        Term::Predicate(predicate) => {
            for arg in &predicate.args {
                gather(arg, variables);
            }
        }
        Term::And(left, right) => {
            gather(left, variables);
            gather(right, variables);
        }
        Term::Atom(_) | Term::Number(_) | Term::String(_) => {}
    }
}

/// Renders the bindings of `variables` found in `bindings`
///
/// Variables the environment never bound are left out.
#[must_use]
pub fn project(bindings: &Bindings, variables: &IndexSet<String>) -> QueryResult {
    let rendered = variables
        .iter()
        .filter_map(|name| {
            let bound = bindings.get(name)?;
            Some((name.clone(), render(bound, bindings)))
        })
        .collect();
    QueryResult { bindings: rendered }
}

/// Renders a term with every variable dereferenced through `bindings`
///
/// Leaves render as their literal value (strings without quotes), predicates
/// as `name(arg1, arg2, ...)`. Variables still unbound render as their name;
/// for a variable introduced by a rule use that is the renamed form (`Y#1`),
/// which no query variable can spell.
#[must_use]
pub fn render(term: &Term, bindings: &Bindings) -> String {
    match bindings.resolve(term) {
        Term::Atom(value) | Term::String(value) | Term::Variable(value) => value.clone(),
        Term::Number(value) => value.to_string(),
        Term::Predicate(predicate) => {
            let args: Vec<String> = predicate
                .args
                .iter()
                .map(|arg| render(arg, bindings))
                .collect();
            format!("{}({})", predicate.name, args.join(", "))
        }
        Term::And(left, right) => format!(
            "and({}, {})",
            render(left, bindings),
            render(right, bindings)
        ),
    }
}
