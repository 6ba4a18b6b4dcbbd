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

//! Dice notation expressions such as `3d6+2`, `4d6kh3` or
//! `floor(max(d20,d12)/2+3)`.
//!
//! [`evaluate`] rolls every dice token of an expression, substitutes the
//! results and computes the arithmetic. The pieces it is built from
//! ([`parse_notation`], [`new_roller_group`], the [`Roller`] types) are
//! public for hosts that want finer control.

pub mod context;
pub mod dice_roll;
pub mod dice_types;
pub mod error;
pub mod limits;
pub mod math;
pub mod modifier;
pub mod parser;
pub mod rng;
pub mod roller;

pub use context::{CancelHandle, EvalContext, DEFAULT_MAX_REROLLS};
pub use dice_roll::{evaluate, roll_notation, ExpressionResult};
pub use dice_types::*;
pub use error::{Error, Result};
pub use limits::DiceLimits;
pub use modifier::Target;
pub use parser::parse_notation;
pub use roller::{new_roller_group, Die, Group, Roller, RollerGroup, RollerNode};
