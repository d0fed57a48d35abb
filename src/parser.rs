//! Text front end for clause source
//!
//! ```text
//! parent(alice, bob).                                % fact
//! grandparent(X, Z) :- parent(X, Y), parent(Y, Z).   % rule
//! ?- grandparent(alice, Who).                        % query
//! ```
//!
//! Atoms start lowercase, variables uppercase; numbers are non-negative
//! integers and strings are double-quoted. A bare name in goal or head
//! position is a zero-arity predicate. `%` starts a comment running to the
//! end of the line.

use crate::error::{EngineError, Result};
use crate::term::{Clause, Predicate, Program, Term};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit1, multispace1, satisfy},
    combinator::{all_consuming, map, map_opt, map_res, opt, recognize, value},
    multi::{many0, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

/// Parses a whole program
///
/// # Errors
///
/// Returns [`EngineError::Parse`] pointing at the first clause that does
/// not match the grammar.
pub fn parse_program(source: &str) -> Result<Program> {
    match all_consuming(terminated(many0(clause), skip))(source) {
        Ok((_, clauses)) => Ok(Program::new(clauses)),
        Err(nom::Err::Error(err) | nom::Err::Failure(err)) => Err(error_at(source, err.input)),
        Err(nom::Err::Incomplete(_)) => Err(error_at(source, "")),
    }
}

fn error_at(source: &str, rest: &str) -> EngineError {
    let offset = source.len() - rest.len();
    let consumed = &source[..offset];
    let line = consumed.matches('\n').count() + 1;
    let column = consumed
        .rsplit('\n')
        .next()
        .map_or(0, |tail| tail.chars().count())
        + 1;
    let found = if rest.is_empty() {
        "end of input".to_string()
    } else {
        rest.chars().take(20).collect()
    };
    EngineError::Parse {
        line,
        column,
        found,
    }
}

/// Skips whitespace and comments
fn skip(input: &str) -> IResult<&str, ()> {
    value((), many0(alt((multispace1, comment))))(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(char('%'), take_while(|c: char| c != '\n')))(input)
}

fn token<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    preceded(skip, inner)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn lower_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_lowercase()),
        take_while(is_name_char),
    ))(input)
}

fn upper_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_uppercase()),
        take_while(is_name_char),
    ))(input)
}

fn string_literal(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_while(|c: char| c != '"'), char('"'))(input)
}

fn number(input: &str) -> IResult<&str, i64> {
    map_res(digit1, |digits: &str| digits.parse::<i64>())(input)
}

fn arguments(input: &str) -> IResult<&str, Vec<Term>> {
    delimited(
        token(char('(')),
        separated_list0(token(char(',')), term),
        token(char(')')),
    )(input)
}

/// A name with an optional argument list
fn compound(input: &str) -> IResult<&str, (&str, Option<Vec<Term>>)> {
    pair(token(lower_name), opt(arguments))(input)
}

fn term(input: &str) -> IResult<&str, Term> {
    alt((
        map(compound, |(name, args)| match args {
            Some(args) => Term::predicate(name, args),
            None => Term::atom(name),
        }),
        map(token(upper_name), Term::var),
        map(token(number), Term::Number),
        map(token(string_literal), Term::string),
    ))(input)
}

fn predicate(input: &str) -> IResult<&str, Predicate> {
    map(compound, |(name, args)| {
        Predicate::new(name, args.unwrap_or_default())
    })(input)
}

fn conjunction(input: &str) -> IResult<&str, Term> {
    map_opt(separated_list1(token(char(',')), predicate), Term::conjunction)(input)
}

fn query(input: &str) -> IResult<&str, Clause> {
    map(preceded(token(tag("?-")), conjunction), Clause::Query)(input)
}

fn fact_or_rule(input: &str) -> IResult<&str, Clause> {
    map(
        pair(predicate, opt(preceded(token(tag(":-")), conjunction))),
        |(head, body)| match body {
            Some(body) => Clause::Rule { head, body },
            None => Clause::Fact(head),
        },
    )(input)
}

fn clause(input: &str) -> IResult<&str, Clause> {
    terminated(alt((query, fact_or_rule)), token(char('.')))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(source: &str) -> Clause {
        let mut program = parse_program(source).unwrap();
        assert_eq!(program.clauses.len(), 1, "{source}");
        program.clauses.remove(0)
    }

    #[test]
    fn test_parse_fact() {
        assert_eq!(
            parse_one("parent(alice, bob)."),
            Clause::Fact(Predicate::new(
                "parent",
                vec![Term::atom("alice"), Term::atom("bob")]
            ))
        );
    }

    #[test]
    fn test_parse_argument_kinds() {
        assert_eq!(
            parse_one(r#"info(alice, Who, 42, "Hello, World", f(x))."#),
            Clause::Fact(Predicate::new(
                "info",
                vec![
                    Term::atom("alice"),
                    Term::var("Who"),
                    Term::Number(42),
                    Term::string("Hello, World"),
                    Term::predicate("f", vec![Term::atom("x")]),
                ]
            ))
        );
    }

    #[test]
    fn test_parse_rule_body_is_conjunction() {
        let clause = parse_one("grandparent(X, Z) :- parent(X, Y), parent(Y, Z).");
        let Clause::Rule { head, body } = clause else {
            panic!("expected a rule");
        };
        assert_eq!(head, Predicate::new("grandparent", vec![Term::var("X"), Term::var("Z")]));
        assert_eq!(
            body,
            Term::and(
                Term::predicate("parent", vec![Term::var("X"), Term::var("Y")]),
                Term::predicate("parent", vec![Term::var("Y"), Term::var("Z")]),
            )
        );
    }

    #[test]
    fn test_parse_query() {
        assert_eq!(
            parse_one("?- has(parent(X, Y))."),
            Clause::Query(Term::predicate(
                "has",
                vec![Term::predicate("parent", vec![Term::var("X"), Term::var("Y")])]
            ))
        );
    }

    #[test]
    fn test_parse_zero_arity_and_comments() {
        let program = parse_program(
            "% a comment line\n\
             sunny.   % trailing comment\n\
             happy :- sunny.\n\
             ?- happy.\n",
        )
        .unwrap();
        assert_eq!(
            program.clauses,
            vec![
                Clause::Fact(Predicate::new("sunny", vec![])),
                Clause::Rule {
                    head: Predicate::new("happy", vec![]),
                    body: Term::predicate("sunny", vec![]),
                },
                Clause::Query(Term::predicate("happy", vec![])),
            ]
        );
    }

    #[test]
    fn test_parse_several_clauses_on_one_line() {
        let program = parse_program("p(a). p(b).   ?- p(X).").unwrap();
        assert_eq!(program.clauses.len(), 3);
    }

    #[test]
    fn test_parse_empty_source() {
        assert_eq!(parse_program("  \n % nothing\n").unwrap(), Program::default());
    }

    #[test]
    fn test_parse_error_position() {
        let err = parse_program("p(a).\np(b\n").unwrap_err();
        assert_eq!(
            err,
            EngineError::Parse {
                line: 2,
                column: 1,
                found: "p(b\n".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_error_missing_period() {
        assert!(matches!(
            parse_program("parent(alice, bob)"),
            Err(EngineError::Parse { line: 1, column: 1, .. })
        ));
    }

    #[test]
    fn test_variable_cannot_head_a_clause() {
        assert!(parse_program("X :- p(X).").is_err());
    }
}
