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

use crate::error::Error;
use std::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DieKind {
    Polyhedron,
    Fudge,
}

impl fmt::Display for DieKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DieKind::Polyhedron => "polyhedron",
            DieKind::Fudge => "fudge",
        })
    }
}

impl FromStr for DieKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "polyhedron" | "poly" => Ok(DieKind::Polyhedron),
            "fudge" | "F" | "f" => Ok(DieKind::Fudge),
            _ => Err(Error::UnknownDieType(s.to_string())),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CompareOp {
    #[cfg_attr(feature = "serde", serde(rename = "="))]
    Equal,
    #[cfg_attr(feature = "serde", serde(rename = "<"))]
    Less,
    #[cfg_attr(feature = "serde", serde(rename = ">"))]
    Greater,
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    LessEqual,
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    GreaterEqual,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Equal => "=",
            CompareOp::Less => "<",
            CompareOp::Greater => ">",
            CompareOp::LessEqual => "<=",
            CompareOp::GreaterEqual => ">=",
        }
    }

    /// Whether a die showing `value` has to be rerolled against `target`.
    ///
    /// `<` and `<=` both include the target, as do `>` and `>=`.
    pub fn rerolls(self, value: f64, target: i64) -> bool {
        let target = target as f64;
        match self {
            CompareOp::Equal => value == target,
            CompareOp::Less | CompareOp::LessEqual => value <= target,
            CompareOp::Greater | CompareOp::GreaterEqual => value >= target,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DropKeepMethod {
    #[cfg_attr(feature = "serde", serde(rename = "d"))]
    Drop,
    #[cfg_attr(feature = "serde", serde(rename = "dl"))]
    DropLowest,
    #[cfg_attr(feature = "serde", serde(rename = "dh"))]
    DropHighest,
    #[cfg_attr(feature = "serde", serde(rename = "k"))]
    Keep,
    #[cfg_attr(feature = "serde", serde(rename = "kl"))]
    KeepLowest,
    #[cfg_attr(feature = "serde", serde(rename = "kh"))]
    KeepHighest,
}

impl fmt::Display for DropKeepMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DropKeepMethod::Drop => "d",
            DropKeepMethod::DropLowest => "dl",
            DropKeepMethod::DropHighest => "dh",
            DropKeepMethod::Keep => "k",
            DropKeepMethod::KeepLowest => "kl",
            DropKeepMethod::KeepHighest => "kh",
        })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SortDirection {
    #[cfg_attr(feature = "serde", serde(rename = "asc"))]
    Ascending,
    #[cfg_attr(feature = "serde", serde(rename = "desc"))]
    Descending,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExplodeKind {
    Explode,
    Compound,
    Penetrate,
}

impl fmt::Display for ExplodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExplodeKind::Explode => "!",
            ExplodeKind::Compound => "!!",
            ExplodeKind::Penetrate => "!p",
        })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CriticalKind {
    Success,
    Failure,
}

impl fmt::Display for CriticalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CriticalKind::Success => "cs",
            CriticalKind::Failure => "cf",
        })
    }
}

/// A transformation of a die or a group, applied after it was rolled.
///
/// Reroll, explode and critical modifiers belong to single dice, drop/keep and
/// sort to whole groups. Sort, explode and critical are parsed and carried
/// along but do not change any result yet.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Modifier {
    Reroll {
        compare: CompareOp,
        target: i64,
        once: bool,
    },
    DropKeep {
        method: DropKeepMethod,
        num: usize,
    },
    Sort {
        direction: SortDirection,
    },
    Explode {
        kind: ExplodeKind,
        #[cfg_attr(
            feature = "serde",
            serde(default, skip_serializing_if = "Option::is_none")
        )]
        compare: Option<CompareOp>,
        #[cfg_attr(
            feature = "serde",
            serde(default, skip_serializing_if = "Option::is_none")
        )]
        target: Option<i64>,
    },
    Critical {
        kind: CriticalKind,
        #[cfg_attr(
            feature = "serde",
            serde(default, skip_serializing_if = "Option::is_none")
        )]
        compare: Option<CompareOp>,
        #[cfg_attr(
            feature = "serde",
            serde(default, skip_serializing_if = "Option::is_none")
        )]
        target: Option<i64>,
    },
}

impl Modifier {
    pub fn name(&self) -> &'static str {
        match self {
            Modifier::Reroll { .. } => "reroll",
            Modifier::DropKeep { .. } => "drop_keep",
            Modifier::Sort { .. } => "sort",
            Modifier::Explode { .. } => "explode",
            Modifier::Critical { .. } => "critical",
        }
    }

    /// Whether the modifier works on a whole group rather than a single die.
    pub fn is_group_modifier(&self) -> bool {
        matches!(self, Modifier::DropKeep { .. } | Modifier::Sort { .. })
    }
}

fn fmt_condition(
    f: &mut fmt::Formatter<'_>,
    compare: Option<CompareOp>,
    target: Option<i64>,
) -> fmt::Result {
    if let Some(target) = target {
        match compare {
            Some(CompareOp::Equal) | None => write!(f, "{}", target),
            Some(op) => write!(f, "{}{}", op, target),
        }
    } else {
        Ok(())
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::Reroll {
                compare,
                target,
                once,
            } => {
                f.write_str(if *once { "ro" } else { "r" })?;
                fmt_condition(f, Some(*compare), Some(*target))
            }
            Modifier::DropKeep { method, num } => write!(f, "{}{}", method, num),
            Modifier::Sort { direction } => f.write_str(match direction {
                SortDirection::Ascending => "s",
                SortDirection::Descending => "sd",
            }),
            Modifier::Explode {
                kind,
                compare,
                target,
            } => {
                write!(f, "{}", kind)?;
                fmt_condition(f, *compare, *target)
            }
            Modifier::Critical {
                kind,
                compare,
                target,
            } => {
                write!(f, "{}", kind)?;
                fmt_condition(f, *compare, *target)
            }
        }
    }
}

/// Everything notation says about a dice group, before anything is rolled.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RollerProperties {
    pub kind: DieKind,
    pub size: u32,
    pub count: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub die_modifiers: Vec<Modifier>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub group_modifiers: Vec<Modifier>,
}

impl RollerProperties {
    pub fn new(kind: DieKind, size: u32, count: u32) -> RollerProperties {
        RollerProperties {
            kind,
            size: match kind {
                DieKind::Fudge => 1,
                DieKind::Polyhedron => size,
            },
            count,
            die_modifiers: Vec::new(),
            group_modifiers: Vec::new(),
        }
    }

    /// Files `modifier` under the die or group list it belongs to.
    pub fn add_modifier(&mut self, modifier: Modifier) -> &mut Self {
        if modifier.is_group_modifier() {
            self.group_modifiers.push(modifier);
        } else {
            self.die_modifiers.push(modifier);
        }
        self
    }
}

/// Canonical notation, which parses back to the same properties.
///
/// One sequence has no notation of its own: a plain `!` without a target
/// directly followed by another explode prints as `!!…`, which reads back as a
/// compound explode. Such properties only come from building them by hand.
impl fmt::Display for RollerProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.count)?;
        match self.kind {
            DieKind::Polyhedron => write!(f, "{}", self.size)?,
            DieKind::Fudge => f.write_str("F")?,
        }
        for modifier in self.die_modifiers.iter().chain(&self.group_modifiers) {
            write!(f, "{}", modifier)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_die_kind_from_str() {
        assert_eq!("polyhedron".parse::<DieKind>(), Ok(DieKind::Polyhedron));
        assert_eq!("F".parse::<DieKind>(), Ok(DieKind::Fudge));
        assert_eq!(
            "d100".parse::<DieKind>(),
            Err(Error::UnknownDieType("d100".to_string()))
        );
    }

    #[test]
    fn test_compare_rerolls() {
        assert!(CompareOp::Equal.rerolls(1.0, 1));
        assert!(!CompareOp::Equal.rerolls(2.0, 1));
        assert!(CompareOp::Less.rerolls(3.0, 3));
        assert!(CompareOp::LessEqual.rerolls(2.0, 3));
        assert!(!CompareOp::Less.rerolls(4.0, 3));
        assert!(CompareOp::Greater.rerolls(3.0, 3));
        assert!(CompareOp::GreaterEqual.rerolls(6.0, 3));
        assert!(!CompareOp::GreaterEqual.rerolls(2.0, 3));
    }

    #[test]
    fn test_display_properties() {
        let mut props = RollerProperties::new(DieKind::Polyhedron, 6, 4);
        props
            .add_modifier(Modifier::DropKeep {
                method: DropKeepMethod::KeepHighest,
                num: 3,
            })
            .add_modifier(Modifier::Reroll {
                compare: CompareOp::Less,
                target: 2,
                once: true,
            });
        assert_eq!(props.to_string(), "4d6ro<2kh3");

        let mut fudge = RollerProperties::new(DieKind::Fudge, 0, 2);
        fudge.add_modifier(Modifier::Sort {
            direction: SortDirection::Descending,
        });
        assert_eq!(fudge.size, 1);
        assert_eq!(fudge.to_string(), "2dFsd");
    }

    #[test]
    fn test_display_reserved_modifiers() {
        let explode = Modifier::Explode {
            kind: ExplodeKind::Penetrate,
            compare: Some(CompareOp::GreaterEqual),
            target: Some(5),
        };
        assert_eq!(explode.to_string(), "!p>=5");
        let critical = Modifier::Critical {
            kind: CriticalKind::Failure,
            compare: None,
            target: None,
        };
        assert_eq!(critical.to_string(), "cf");
    }
}
