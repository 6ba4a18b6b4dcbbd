/*
Copyright 2021 Robin Marchart

   Licensed under the Apache License, Version 2.0 (the "License");
   you may not use this file except in compliance with the License.
   You may obtain a copy of the License at

       http://www.apache.org/licenses/LICENSE-2.0

   Unless required by applicable law or agreed to in writing, software
   distributed under the License is distributed on an "AS IS" BASIS,
   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
   See the License for the specific language governing permissions and
   limitations under the License.
*/

//! Arithmetic over plain numbers, the second phase of [`crate::evaluate`].

use crate::{
    context::EvalContext,
    error::{Error, Result},
};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, multispace0, one_of},
    combinator::{all_consuming, map, map_res, opt, recognize},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded},
    IResult,
};
use std::fmt;

#[cfg(feature = "logging")]
use log::debug;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Add => "+",
            Operation::Sub => "-",
            Operation::Mul => "*",
            Operation::Div => "/",
            Operation::Rem => "%",
        })
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Term {
    Constant(f64),
    Variable(String),
    Negate(Box<Term>),
    Calculation(Box<Term>, Operation, Box<Term>),
    Call(String, Vec<Term>),
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Constant(c) => write!(f, "{}", c),
            Term::Variable(name) => f.write_str(name),
            Term::Negate(term) => write!(f, "-{}", term),
            Term::Calculation(left, op, right) => write!(f, "({}{}{})", left, op, right),
            Term::Call(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

pub fn parse_number(input: &str) -> IResult<&str, f64> {
    map_res(
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        str::parse::<f64>,
    )(input)
}

pub fn parse_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn parse_call(input: &str) -> IResult<&str, Term> {
    map(
        pair(
            parse_identifier,
            delimited(
                ws(char('(')),
                separated_list0(ws(char(',')), parse_term),
                ws(char(')')),
            ),
        ),
        |(name, args)| Term::Call(name.to_string(), args),
    )(input)
}

fn parse_primary(input: &str) -> IResult<&str, Term> {
    ws(alt((
        map(parse_number, Term::Constant),
        parse_call,
        map(parse_identifier, |name| Term::Variable(name.to_string())),
        delimited(char('('), parse_term, char(')')),
    )))(input)
}

fn parse_unary(input: &str) -> IResult<&str, Term> {
    alt((
        map(preceded(ws(char('-')), parse_unary), |term| {
            Term::Negate(Box::new(term))
        }),
        preceded(ws(char('+')), parse_unary),
        parse_primary,
    ))(input)
}

fn fold_calculations(first: Term, rest: Vec<(Operation, Term)>) -> Term {
    rest.into_iter().fold(first, |left, (op, right)| {
        Term::Calculation(Box::new(left), op, Box::new(right))
    })
}

fn parse_factor(input: &str) -> IResult<&str, Term> {
    map(
        pair(
            parse_unary,
            many0(pair(
                map(ws(one_of("*/%")), |c| match c {
                    '*' => Operation::Mul,
                    '/' => Operation::Div,
                    _ => Operation::Rem,
                }),
                parse_unary,
            )),
        ),
        |(first, rest)| fold_calculations(first, rest),
    )(input)
}

/// Sums of products, left associative.
pub fn parse_term(input: &str) -> IResult<&str, Term> {
    map(
        pair(
            parse_factor,
            many0(pair(
                map(ws(one_of("+-")), |c| match c {
                    '+' => Operation::Add,
                    _ => Operation::Sub,
                }),
                parse_factor,
            )),
        ),
        |(first, rest)| fold_calculations(first, rest),
    )(input)
}

/// Deepest nesting of parentheses and unary signs the parser descends into.
pub const MAX_NESTING: usize = 64;

/// Every `(` and every sign in a run of unary signs costs the parser one
/// level of recursion.
fn check_nesting(input: &str) -> Result<()> {
    let mut parens = 0usize;
    let mut signs = 0usize;
    for c in input.chars() {
        match c {
            '(' => parens += 1,
            ')' => {
                parens = parens.saturating_sub(1);
                signs = 0;
            }
            '+' | '-' => signs += 1,
            c if c.is_whitespace() => {}
            _ => signs = 0,
        }
        if parens + signs > MAX_NESTING {
            return Err(Error::parse(input, "expression nested too deeply"));
        }
    }
    Ok(())
}

/// Parses a whole arithmetic expression.
pub fn parse(input: &str) -> Result<Term> {
    check_nesting(input)?;
    all_consuming(parse_term)(input)
        .map(|(_, term)| term)
        .map_err(|e| Error::parse(input, e))
}

fn single_arg(name: &'static str, args: &[f64]) -> Result<f64> {
    match args {
        [x] => Ok(*x),
        _ => Err(Error::InvalidArgCount {
            name,
            got: args.len(),
        }),
    }
}

fn call(name: &str, args: &[f64]) -> Result<f64> {
    match name {
        "abs" => Ok(single_arg("abs", args)?.abs()),
        "ceil" => Ok(single_arg("ceil", args)?.ceil()),
        "floor" => Ok(single_arg("floor", args)?.floor()),
        "round" => Ok(single_arg("round", args)?.round()),
        "min" => args
            .iter()
            .copied()
            .reduce(f64::min)
            .ok_or(Error::NotEnoughArgs("min")),
        "max" => args
            .iter()
            .copied()
            .reduce(f64::max)
            .ok_or(Error::NotEnoughArgs("max")),
        _ => Err(Error::UnknownFunction(name.to_string())),
    }
}

impl Term {
    /// Computes the value of the term. Variables come from the context parameters.
    pub fn evaluate(&self, ctx: &EvalContext) -> Result<f64> {
        match self {
            Term::Constant(c) => Ok(*c),
            Term::Variable(name) => ctx
                .param(name)
                .ok_or_else(|| Error::UnknownVariable(name.clone())),
            Term::Negate(term) => Ok(-term.evaluate(ctx)?),
            Term::Calculation(left, op, right) => {
                let left = left.evaluate(ctx)?;
                let right = right.evaluate(ctx)?;
                match op {
                    Operation::Add => Ok(left + right),
                    Operation::Sub => Ok(left - right),
                    Operation::Mul => Ok(left * right),
                    Operation::Div if right == 0.0 => Err(Error::DivideByZero),
                    Operation::Div => Ok(left / right),
                    Operation::Rem if right == 0.0 => Err(Error::DivideByZero),
                    Operation::Rem => Ok(left % right),
                }
            }
            Term::Call(name, args) => {
                let values = args
                    .iter()
                    .map(|arg| arg.evaluate(ctx))
                    .collect::<Result<Vec<_>>>()?;
                call(name, &values)
            }
        }
    }
}

/// Parses and computes `input` in one go.
pub fn calculate(ctx: &EvalContext, input: &str) -> Result<f64> {
    let term = parse(input)?;
    let result = term.evaluate(ctx);
    #[cfg(feature = "logging")]
    {
        debug!("got {:?} for term {}", &result, &term)
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc(input: &str) -> Result<f64> {
        calculate(&EvalContext::new(), input)
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("12"), Ok(("", 12.0)));
        assert_eq!(parse_number("1.5+"), Ok(("+", 1.5)));
        assert_eq!(parse_number(".25"), Ok(("", 0.25)));
        assert!(parse_number("x").is_err());
    }

    #[test]
    fn test_parse_structure() {
        assert_eq!(
            parse("1+2*3"),
            Ok(Term::Calculation(
                Box::new(Term::Constant(1.0)),
                Operation::Add,
                Box::new(Term::Calculation(
                    Box::new(Term::Constant(2.0)),
                    Operation::Mul,
                    Box::new(Term::Constant(3.0))
                ))
            ))
        );
        assert_eq!(
            parse("max(a, 2)"),
            Ok(Term::Call(
                "max".to_string(),
                vec![Term::Variable("a".to_string()), Term::Constant(2.0)]
            ))
        );
        assert_eq!(parse("((1 - 2) - 3)").unwrap().to_string(), "((1-2)-3)");
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(calc("1+2*3"), Ok(7.0));
        assert_eq!(calc("(1+2)*3"), Ok(9.0));
        assert_eq!(calc("10-4-3"), Ok(3.0));
        assert_eq!(calc("64/4/2"), Ok(8.0));
        assert_eq!(calc("7%4*2"), Ok(6.0));
        assert_eq!(calc(" 2 * -3 "), Ok(-6.0));
        assert_eq!(calc("--2"), Ok(2.0));
        assert_eq!(calc("1 - -1"), Ok(2.0));
        assert_eq!(calc("+5"), Ok(5.0));
        assert_eq!(calc("(5)+(2)"), Ok(7.0));
    }

    #[test]
    fn test_functions() {
        assert_eq!(calc("abs(-3)"), Ok(3.0));
        assert_eq!(calc("ceil(2.1)"), Ok(3.0));
        assert_eq!(calc("floor(2.9)"), Ok(2.0));
        assert_eq!(calc("round(2.5)"), Ok(3.0));
        assert_eq!(calc("round(-2.5)"), Ok(-3.0));
        assert_eq!(calc("min(4,2,8)"), Ok(2.0));
        assert_eq!(calc("max(4)"), Ok(4.0));
        assert_eq!(calc("floor(max(17,8)/2+3)"), Ok(11.0));
    }

    #[test]
    fn test_function_errors() {
        assert_eq!(
            calc("abs(1,2)"),
            Err(Error::InvalidArgCount {
                name: "abs",
                got: 2
            })
        );
        assert_eq!(
            calc("floor()"),
            Err(Error::InvalidArgCount {
                name: "floor",
                got: 0
            })
        );
        assert_eq!(calc("min()"), Err(Error::NotEnoughArgs("min")));
        assert_eq!(calc("max( )"), Err(Error::NotEnoughArgs("max")));
        assert_eq!(calc("sqrt(4)"), Err(Error::UnknownFunction("sqrt".to_string())));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(calc("1/0"), Err(Error::DivideByZero));
        assert_eq!(calc("5%(2-2)"), Err(Error::DivideByZero));
        assert_eq!(calc("0/5"), Ok(0.0));
    }

    #[test]
    fn test_variables() {
        let ctx = EvalContext::new().with_param("str", 3.0).with_param("_lvl2", 2.0);
        assert_eq!(calculate(&ctx, "str*2+_lvl2"), Ok(8.0));
        assert_eq!(
            calculate(&ctx, "dex"),
            Err(Error::UnknownVariable("dex".to_string()))
        );
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(calc(&nested(MAX_NESTING)), Ok(1.0));
        assert!(matches!(
            calc(&nested(MAX_NESTING + 1)),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(calc(&nested(50_000)), Err(Error::Parse { .. })));
        assert!(matches!(
            calc(&format!("{}1", "-".repeat(50_000))),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            calc(&format!("{}1", "- (".repeat(50_000))),
            Err(Error::Parse { .. })
        ));
        assert_eq!(calc(&format!("{}1", "- ".repeat(MAX_NESTING))), Ok(1.0));
        let long_sum = vec!["1"; 10_000].join("+");
        assert_eq!(calc(&long_sum), Ok(10_000.0));
    }

    #[test]
    fn test_syntax_errors() {
        for input in ["", "1+", "(1", "1)", "2 3", "1+*2", "max(1,)"] {
            assert!(
                matches!(calc(input), Err(Error::Parse { .. })),
                "{:?} should not parse",
                input
            );
        }
    }
}
