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

use crate::{
    dice_types::*,
    error::{Error, Result},
};

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case},
    character::complete::{char, digit1, one_of},
    combinator::{map, map_res, not, opt, recognize, value},
    multi::many0,
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};

#[cfg(feature = "logging")]
use log::debug;

pub fn parse_dice_digit(input: &str) -> IResult<&str, &str> {
    tag_no_case("d")(input)
}

pub fn parse_u32(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |s: &str| s.parse::<u32>())(input)
}

pub fn parse_usize(input: &str) -> IResult<&str, usize> {
    map_res(digit1, |s: &str| s.parse::<usize>())(input)
}

pub fn parse_i64(input: &str) -> IResult<&str, i64> {
    map_res(digit1, |s: &str| s.parse::<i64>())(input)
}

pub fn parse_count(input: &str) -> IResult<&str, u32> {
    map(opt(parse_u32), |count| count.unwrap_or(1))(input)
}

/// Sides of the die; `F` stands for a fudge die and is recorded with size 1.
pub fn parse_dice_type(input: &str) -> IResult<&str, (DieKind, u32)> {
    alt((
        value((DieKind::Fudge, 1), tag_no_case("f")),
        map(parse_u32, |size| (DieKind::Polyhedron, size)),
    ))(input)
}

pub fn parse_compare(input: &str) -> IResult<&str, CompareOp> {
    alt((
        value(CompareOp::LessEqual, tag("<=")),
        value(CompareOp::GreaterEqual, tag(">=")),
        value(CompareOp::Equal, tag("=")),
        value(CompareOp::Less, tag("<")),
        value(CompareOp::Greater, tag(">")),
    ))(input)
}

/// `compare? integer`, where a bare integer compares for equality.
pub fn parse_condition(input: &str) -> IResult<&str, (CompareOp, i64)> {
    pair(
        map(opt(parse_compare), |op| op.unwrap_or(CompareOp::Equal)),
        parse_i64,
    )(input)
}

pub fn parse_reroll(input: &str) -> IResult<&str, Modifier> {
    map(
        tuple((char('r'), opt(char('o')), parse_condition)),
        |(_, once, (compare, target))| Modifier::Reroll {
            compare,
            target,
            once: once.is_some(),
        },
    )(input)
}

pub fn parse_drop_keep(input: &str) -> IResult<&str, Modifier> {
    map(
        pair(
            alt((
                value(DropKeepMethod::DropLowest, tag("dl")),
                value(DropKeepMethod::DropHighest, tag("dh")),
                value(DropKeepMethod::Drop, tag("d")),
                value(DropKeepMethod::KeepLowest, tag("kl")),
                value(DropKeepMethod::KeepHighest, tag("kh")),
                value(DropKeepMethod::Keep, tag("k")),
            )),
            opt(parse_usize),
        ),
        |(method, num)| Modifier::DropKeep {
            method,
            num: num.unwrap_or(1),
        },
    )(input)
}

/// A `d` right after `s` only means descending when it cannot start a drop.
pub fn parse_sort(input: &str) -> IResult<&str, Modifier> {
    map(
        preceded(
            char('s'),
            opt(alt((
                value(SortDirection::Ascending, char('a')),
                value(
                    SortDirection::Descending,
                    terminated(char('d'), not(one_of("lh0123456789"))),
                ),
            ))),
        ),
        |direction| Modifier::Sort {
            direction: direction.unwrap_or(SortDirection::Ascending),
        },
    )(input)
}

pub fn parse_explode(input: &str) -> IResult<&str, Modifier> {
    map(
        tuple((
            char('!'),
            opt(alt((
                value(ExplodeKind::Compound, char('!')),
                value(ExplodeKind::Penetrate, char('p')),
            ))),
            opt(parse_condition),
        )),
        |(_, kind, condition)| Modifier::Explode {
            kind: kind.unwrap_or(ExplodeKind::Explode),
            compare: condition.map(|c| c.0),
            target: condition.map(|c| c.1),
        },
    )(input)
}

pub fn parse_critical(input: &str) -> IResult<&str, Modifier> {
    map(
        tuple((
            char('c'),
            alt((
                value(CriticalKind::Success, char('s')),
                value(CriticalKind::Failure, char('f')),
            )),
            opt(parse_condition),
        )),
        |(_, kind, condition)| Modifier::Critical {
            kind,
            compare: condition.map(|c| c.0),
            target: condition.map(|c| c.1),
        },
    )(input)
}

/// Every modifier family starts with its own character, so the first one
/// matching commits.
pub fn parse_modifier(input: &str) -> IResult<&str, Modifier> {
    alt((
        parse_reroll,
        parse_drop_keep,
        parse_sort,
        parse_explode,
        parse_critical,
    ))(input)
}

/// The longest prefix of `input` that reads as dice notation.
pub fn recognize_dice(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        parse_count,
        parse_dice_digit,
        parse_dice_type,
        many0(parse_modifier),
    )))(input)
}

/// Parses `<count>d<size><modifiers>` into the properties of a dice group.
///
/// Modifiers are read left to right; at the first suffix that does not form a
/// modifier the rest of the input is ignored.
pub fn parse_notation(input: &str) -> Result<RollerProperties> {
    let (rest, count) =
        parse_count(input).map_err(|_| Error::parse(input, "expected a dice count"))?;
    let (rest, _) = parse_dice_digit(rest).map_err(|_| Error::parse(input, "expected 'd'"))?;
    let (mut rest, (kind, size)) = parse_dice_type(rest)
        .map_err(|_| Error::parse(input, "expected a number of sides or 'F'"))?;
    if size == 0 {
        return Err(Error::SizeZero);
    }

    let mut props = RollerProperties::new(kind, size, count);
    while let Ok((next, modifier)) = parse_modifier(rest) {
        props.add_modifier(modifier);
        rest = next;
    }

    #[cfg(feature = "logging")]
    {
        if !rest.is_empty() {
            debug!("ignoring {:?} after dice notation {:?}", rest, input);
        }
        debug!("parsed {:?} as {}", input, &props);
    }
    Ok(props)
}
