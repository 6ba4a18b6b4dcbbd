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
    dice_types::*,
    error::{Error, Result},
    roller::{Die, Group, Roller},
};

#[cfg(feature = "logging")]
use log::debug;

/// What a modifier is applied to.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Die(&'a Die),
    Group(&'a Group),
}

impl Target<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Target::Die(_) => "die",
            Target::Group(_) => "group",
        }
    }
}

impl Modifier {
    /// Applies the modifier once to an already rolled target.
    pub fn apply(&self, ctx: &EvalContext, target: Target<'_>) -> Result<()> {
        match (self, target) {
            (
                Modifier::Reroll {
                    compare,
                    target: value,
                    once,
                },
                Target::Die(die),
            ) => reroll(ctx, die, *compare, *value, *once),
            (Modifier::DropKeep { method, num }, Target::Group(group)) => {
                drop_keep(ctx, group, *method, *num)
            }
            (Modifier::Sort { .. }, Target::Group(_))
            | (Modifier::Explode { .. }, Target::Die(_))
            | (Modifier::Critical { .. }, Target::Die(_)) => {
                #[cfg(feature = "logging")]
                {
                    debug!("modifier {} has no effect on the roll", self);
                }
                Ok(())
            }
            (modifier, target) => Err(Error::TypeMismatch {
                modifier: modifier.name(),
                target: target.name(),
            }),
        }
    }
}

fn needs_reroll(die: &Die, compare: CompareOp, target: i64) -> Result<bool> {
    let value = die.result().ok_or(Error::Unrolled)?;
    Ok(compare.rerolls(value as f64, target))
}

fn reroll(ctx: &EvalContext, die: &Die, compare: CompareOp, target: i64, once: bool) -> Result<()> {
    if !needs_reroll(die, compare, target)? {
        return Ok(());
    }
    if once {
        ctx.check()?;
        return die.reroll(ctx);
    }
    let mut rerolls = 0;
    while needs_reroll(die, compare, target)? {
        ctx.check()?;
        if rerolls >= ctx.max_rerolls() {
            return Err(Error::RerollLimitExceeded(ctx.max_rerolls()));
        }
        die.reroll(ctx)?;
        rerolls += 1;
    }
    #[cfg(feature = "logging")]
    {
        debug!("rerolled {} times on {}{}{}", rerolls, die.kind(), compare, target);
    }
    Ok(())
}

/// Marks children of `group` as dropped or kept, ranking them by total.
///
/// Ties keep the order in which the dice were rolled.
fn drop_keep(ctx: &EvalContext, group: &Group, method: DropKeepMethod, num: usize) -> Result<()> {
    let rollers = group.rollers();
    let mut ranked = Vec::with_capacity(rollers.len());
    for (index, roller) in rollers.iter().enumerate() {
        ranked.push((index, roller.total(ctx)?));
    }
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

    let n = ranked.len();
    let k = num.min(n);
    let dropped = match method {
        DropKeepMethod::Drop | DropKeepMethod::DropLowest => &ranked[..k],
        DropKeepMethod::DropHighest => &ranked[n - k..],
        DropKeepMethod::Keep | DropKeepMethod::KeepHighest => &ranked[..n - k],
        DropKeepMethod::KeepLowest => &ranked[k..],
    };
    for (index, _) in dropped {
        rollers[*index].drop(ctx, true);
    }
    #[cfg(feature = "logging")]
    {
        debug!("{}{} dropped {} of {}", method, num, dropped.len(), n);
    }
    Ok(())
}
