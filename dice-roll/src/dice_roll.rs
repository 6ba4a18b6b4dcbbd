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
    context::EvalContext,
    error::Result,
    math,
    parser::{parse_notation, recognize_dice},
    roller::{new_roller_group, RollerGroup},
};

#[cfg(feature = "logging")]
use log::debug;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Outcome of [`evaluate`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ExpressionResult {
    /// The expression as given.
    pub original: String,
    /// The expression with every dice token replaced by its expanded form.
    pub rolled: String,
    pub result: f64,
    pub dice: Vec<RollerGroup>,
}

/// Parses a single dice notation, builds its group and rolls it.
pub fn roll_notation(ctx: &EvalContext, notation: &str) -> Result<RollerGroup> {
    let props = parse_notation(notation)?;
    ctx.ensure_rolls(u64::from(props.count))?;
    let group = new_roller_group(&props)?;
    group.full_roll(ctx)?;
    #[cfg(feature = "logging")]
    {
        debug!("rolled {} to {}", notation, group.expanded());
    }
    Ok(group)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Rolls every dice token in `expression`, then computes the arithmetic.
///
/// A dice token only counts when it is a whole word, so identifiers such as
/// `dex` or `round` are left to the arithmetic phase.
pub fn evaluate(ctx: &EvalContext, expression: &str) -> Result<ExpressionResult> {
    ctx.check()?;
    let mut rolled = String::with_capacity(expression.len());
    let mut dice = Vec::new();
    let mut rest = expression;
    let mut in_word = false;

    while let Some(c) = rest.chars().next() {
        if !in_word {
            if let Ok((next, token)) = recognize_dice(rest) {
                if !next.starts_with(is_word_char) {
                    let group = roll_notation(ctx, token)?;
                    rolled.push_str(&group.expanded());
                    dice.push(group);
                    rest = next;
                    continue;
                }
            }
        }
        rolled.push(c);
        in_word = is_word_char(c);
        rest = &rest[c.len_utf8()..];
    }

    let result = math::calculate(ctx, &rolled)?;
    #[cfg(feature = "logging")]
    {
        debug!(
            "evaluated {:?} as {} = {} using {} rolls",
            expression,
            &rolled,
            result,
            ctx.rolls()
        );
    }
    Ok(ExpressionResult {
        original: expression.to_string(),
        rolled,
        result,
        dice,
    })
}
