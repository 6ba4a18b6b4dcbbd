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

//! Dice, groups of dice, and the operations every roller supports.

use crate::{
    context::EvalContext,
    dice_types::*,
    error::{Error, Result},
    modifier::Target,
    rng,
};
use parking_lot::RwLock;
use std::fmt;

#[cfg(feature = "logging")]
use log::debug;

#[cfg(feature = "serde")]
use serde::{Serialize, Serializer};

/// What every die and group can do.
pub trait Roller: fmt::Display {
    /// Rolls for the first time.
    fn roll(&self, ctx: &EvalContext) -> Result<()>;

    /// Replaces an existing result.
    fn reroll(&self, ctx: &EvalContext) -> Result<()>;

    /// The value this roller contributes, 0 when dropped.
    fn total(&self, ctx: &EvalContext) -> Result<f64>;

    fn drop(&self, ctx: &EvalContext, dropped: bool);

    fn is_dropped(&self) -> bool;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct DieState {
    result: Option<i64>,
    dropped: bool,
}

/// A single physical die.
///
/// Result and dropped flag live behind one lock, so a die can be shared
/// between threads and nobody sees a half finished roll.
#[derive(Debug)]
pub struct Die {
    kind: DieKind,
    size: u32,
    modifiers: Vec<Modifier>,
    state: RwLock<DieState>,
}

impl Die {
    pub fn new(kind: DieKind, size: u32) -> Result<Die> {
        let size = match kind {
            DieKind::Polyhedron if size == 0 => return Err(Error::SizeZero),
            DieKind::Polyhedron => size,
            DieKind::Fudge => 1,
        };
        Ok(Die {
            kind,
            size,
            modifiers: Vec::new(),
            state: RwLock::new(DieState::default()),
        })
    }

    pub fn fudge() -> Die {
        Die {
            kind: DieKind::Fudge,
            size: 1,
            modifiers: Vec::new(),
            state: RwLock::new(DieState::default()),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Vec<Modifier>) -> Die {
        self.modifiers = modifiers;
        self
    }

    pub fn kind(&self) -> DieKind {
        self.kind
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn result(&self) -> Option<i64> {
        self.state.read().result
    }

    pub fn is_rolled(&self) -> bool {
        self.result().is_some()
    }

    fn draw(&self) -> Result<i64> {
        match self.kind {
            DieKind::Polyhedron => Ok(1 + rng::uniform_int(i64::from(self.size))?),
            DieKind::Fudge => Ok(rng::uniform_int(3)? - 1),
        }
    }
}

impl Clone for Die {
    fn clone(&self) -> Self {
        Die {
            kind: self.kind,
            size: self.size,
            modifiers: self.modifiers.clone(),
            state: RwLock::new(*self.state.read()),
        }
    }
}

impl Roller for Die {
    /// Draws a result, then applies the die's own modifiers.
    fn roll(&self, ctx: &EvalContext) -> Result<()> {
        {
            let mut state = self.state.write();
            if state.result.is_some() {
                return Err(Error::AlreadyRolled);
            }
            ctx.count_roll()?;
            let result = self.draw()?;
            state.result = Some(result);
            #[cfg(feature = "logging")]
            {
                debug!("rolled {} on d{}", result, self.size);
            }
        }
        for modifier in &self.modifiers {
            modifier.apply(ctx, Target::Die(self))?;
        }
        Ok(())
    }

    /// Draws a new result. Modifiers are not applied again.
    fn reroll(&self, ctx: &EvalContext) -> Result<()> {
        let mut state = self.state.write();
        if state.result.is_none() {
            return Err(Error::Unrolled);
        }
        ctx.count_roll()?;
        let result = self.draw()?;
        #[cfg(feature = "logging")]
        {
            debug!("rerolled d{}: {:?} -> {}", self.size, state.result, result);
        }
        state.result = Some(result);
        Ok(())
    }

    fn total(&self, ctx: &EvalContext) -> Result<f64> {
        let mut state = *self.state.read();
        if state.result.is_none() {
            match self.roll(ctx) {
                Ok(()) | Err(Error::AlreadyRolled) => {}
                Err(e) => return Err(e),
            }
            state = *self.state.read();
        }
        if state.dropped {
            return Ok(0.0);
        }
        Ok(state.result.map_or(0.0, |r| r as f64))
    }

    fn drop(&self, _ctx: &EvalContext, dropped: bool) {
        self.state.write().dropped = dropped;
    }

    fn is_dropped(&self) -> bool {
        self.state.read().dropped
    }
}

impl fmt::Display for Die {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(result) = self.result() {
            return write!(f, "{}", result);
        }
        match self.kind {
            DieKind::Polyhedron => write!(f, "d{}", self.size)?,
            DieKind::Fudge => f.write_str("dF")?,
        }
        for modifier in &self.modifiers {
            write!(f, "{}", modifier)?;
        }
        Ok(())
    }
}

/// Either a single die or a nested group.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum RollerNode {
    Die(Die),
    Group(RollerGroup),
}

impl RollerNode {
    fn collect_dice<'a>(&'a self, dice: &mut Vec<&'a Die>) {
        match self {
            RollerNode::Die(die) => dice.push(die),
            RollerNode::Group(group) => {
                for roller in group.group.rollers() {
                    roller.collect_dice(dice);
                }
            }
        }
    }
}

impl From<Die> for RollerNode {
    fn from(die: Die) -> Self {
        RollerNode::Die(die)
    }
}

impl From<RollerGroup> for RollerNode {
    fn from(group: RollerGroup) -> Self {
        RollerNode::Group(group)
    }
}

impl Roller for RollerNode {
    fn roll(&self, ctx: &EvalContext) -> Result<()> {
        match self {
            RollerNode::Die(die) => die.roll(ctx),
            RollerNode::Group(group) => group.roll(ctx),
        }
    }

    fn reroll(&self, ctx: &EvalContext) -> Result<()> {
        match self {
            RollerNode::Die(die) => die.reroll(ctx),
            RollerNode::Group(group) => group.reroll(ctx),
        }
    }

    fn total(&self, ctx: &EvalContext) -> Result<f64> {
        match self {
            RollerNode::Die(die) => die.total(ctx),
            RollerNode::Group(group) => group.total(ctx),
        }
    }

    fn drop(&self, ctx: &EvalContext, dropped: bool) {
        match self {
            RollerNode::Die(die) => die.drop(ctx, dropped),
            RollerNode::Group(group) => group.drop(ctx, dropped),
        }
    }

    fn is_dropped(&self) -> bool {
        match self {
            RollerNode::Die(die) => die.is_dropped(),
            RollerNode::Group(group) => group.is_dropped(),
        }
    }
}

impl fmt::Display for RollerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollerNode::Die(die) => die.fmt(f),
            RollerNode::Group(group) => group.fmt(f),
        }
    }
}

/// Rollers in the order they appear in the notation.
#[derive(Debug, Clone, Default)]
pub struct Group {
    rollers: Vec<RollerNode>,
}

impl Group {
    pub fn new(rollers: Vec<RollerNode>) -> Group {
        Group { rollers }
    }

    pub fn rollers(&self) -> &[RollerNode] {
        &self.rollers
    }

    pub fn len(&self) -> usize {
        self.rollers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rollers.is_empty()
    }

    /// All dice, nested groups flattened, in order.
    pub fn dice(&self) -> Vec<&Die> {
        let mut dice = Vec::new();
        for roller in &self.rollers {
            roller.collect_dice(&mut dice);
        }
        dice
    }
}

impl Roller for Group {
    fn roll(&self, ctx: &EvalContext) -> Result<()> {
        for roller in &self.rollers {
            roller.roll(ctx)?;
        }
        Ok(())
    }

    fn reroll(&self, ctx: &EvalContext) -> Result<()> {
        for roller in &self.rollers {
            roller.reroll(ctx)?;
        }
        Ok(())
    }

    fn total(&self, ctx: &EvalContext) -> Result<f64> {
        self.rollers
            .iter()
            .try_fold(0.0, |sum, roller| Ok(sum + roller.total(ctx)?))
    }

    fn drop(&self, ctx: &EvalContext, dropped: bool) {
        for roller in &self.rollers {
            roller.drop(ctx, dropped);
        }
    }

    fn is_dropped(&self) -> bool {
        !self.rollers.is_empty() && self.rollers.iter().all(Roller::is_dropped)
    }
}

fn join_sum<I: Iterator<Item = String>>(terms: I) -> String {
    terms.collect::<Vec<_>>().join("+").replace("+-", "-")
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_sum(self.rollers.iter().map(ToString::to_string)))
    }
}

/// A group together with the modifiers applied to it after every roll.
#[derive(Debug, Clone, Default)]
pub struct RollerGroup {
    group: Group,
    modifiers: Vec<Modifier>,
}

impl RollerGroup {
    pub fn new(group: Group, modifiers: Vec<Modifier>) -> RollerGroup {
        RollerGroup { group, modifiers }
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn dice(&self) -> Vec<&Die> {
        self.group.dice()
    }

    fn apply_modifiers(&self, ctx: &EvalContext) -> Result<()> {
        for modifier in &self.modifiers {
            modifier.apply(ctx, Target::Group(&self.group))?;
        }
        Ok(())
    }

    /// Rolls every die, then applies the group modifiers in order.
    pub fn full_roll(&self, ctx: &EvalContext) -> Result<()> {
        self.group.roll(ctx)?;
        self.apply_modifiers(ctx)
    }

    /// Rerolls every die and applies the group modifiers afresh.
    pub fn full_reroll(&self, ctx: &EvalContext) -> Result<()> {
        self.group.drop(ctx, false);
        self.group.reroll(ctx)?;
        self.apply_modifiers(ctx)
    }

    /// Results of the dice still counting, e.g. `(5+2+6)`.
    pub fn expanded(&self) -> String {
        let kept = self
            .dice()
            .into_iter()
            .filter(|die| !die.is_dropped())
            .filter_map(Die::result)
            .map(|r| r.to_string());
        let sum = join_sum(kept);
        if sum.is_empty() {
            "(0)".to_string()
        } else {
            format!("({})", sum)
        }
    }
}

impl Roller for RollerGroup {
    fn roll(&self, ctx: &EvalContext) -> Result<()> {
        self.full_roll(ctx)
    }

    fn reroll(&self, ctx: &EvalContext) -> Result<()> {
        self.full_reroll(ctx)
    }

    fn total(&self, ctx: &EvalContext) -> Result<f64> {
        self.group.total(ctx)
    }

    fn drop(&self, ctx: &EvalContext, dropped: bool) {
        self.group.drop(ctx, dropped)
    }

    fn is_dropped(&self) -> bool {
        self.group.is_dropped()
    }
}

impl fmt::Display for RollerGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.group.fmt(f)
    }
}

/// Builds `count` fresh unrolled dice, each carrying the per-die modifiers.
pub fn new_roller_group(props: &RollerProperties) -> Result<RollerGroup> {
    let rollers = (0..props.count)
        .map(|_| {
            Die::new(props.kind, props.size)
                .map(|die| RollerNode::Die(die.with_modifiers(props.die_modifiers.clone())))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(RollerGroup::new(
        Group::new(rollers),
        props.group_modifiers.clone(),
    ))
}

#[cfg(feature = "serde")]
fn is_false(b: &bool) -> bool {
    !*b
}

#[cfg(feature = "serde")]
fn no_modifiers(modifiers: &&[Modifier]) -> bool {
    modifiers.is_empty()
}

#[cfg(feature = "serde")]
#[derive(Serialize)]
struct DieRecord<'a> {
    #[serde(rename = "type")]
    kind: DieKind,
    size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<i64>,
    #[serde(skip_serializing_if = "is_false")]
    dropped: bool,
    #[serde(skip_serializing_if = "no_modifiers")]
    modifiers: &'a [Modifier],
}

#[cfg(feature = "serde")]
impl Serialize for Die {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let state = *self.state.read();
        DieRecord {
            kind: self.kind,
            size: self.size,
            result: state.result,
            dropped: state.dropped,
            modifiers: &self.modifiers,
        }
        .serialize(serializer)
    }
}

#[cfg(feature = "serde")]
#[derive(Serialize)]
struct GroupRecord<'a> {
    group: &'a [RollerNode],
    #[serde(skip_serializing_if = "no_modifiers")]
    modifiers: &'a [Modifier],
}

#[cfg(feature = "serde")]
impl Serialize for Group {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        GroupRecord {
            group: &self.rollers,
            modifiers: &[],
        }
        .serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl Serialize for RollerGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        GroupRecord {
            group: &self.group.rollers,
            modifiers: &self.modifiers,
        }
        .serialize(serializer)
    }
}
