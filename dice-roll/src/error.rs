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

use thiserror::Error as ThisError;

/// Everything that can go wrong while parsing, rolling or evaluating dice.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unable to parse {input:?}: {reason}")]
    Parse { input: String, reason: String },
    #[error("dice must have at least one side")]
    SizeZero,
    #[error("unknown die type {0:?}")]
    UnknownDieType(String),
    #[error("die was already rolled")]
    AlreadyRolled,
    #[error("die has not been rolled yet")]
    Unrolled,
    #[error("gave up after {0} rerolls")]
    RerollLimitExceeded(u32),
    #[error("more than {0} rolls requested")]
    MaxRollsExceeded(u64),
    #[error("modifier {modifier} cannot be applied to a {target}")]
    TypeMismatch {
        modifier: &'static str,
        target: &'static str,
    },
    #[error("{name} takes exactly one argument, got {got}")]
    InvalidArgCount { name: &'static str, got: usize },
    #[error("{0} needs at least one argument")]
    NotEnoughArgs(&'static str),
    #[error("division by zero")]
    DivideByZero,
    #[error("unknown function {0:?}")]
    UnknownFunction(String),
    #[error("unknown variable {0:?}")]
    UnknownVariable(String),
    #[error("evaluation cancelled")]
    Cancelled,
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn parse(input: &str, reason: impl ToString) -> Self {
        Error::Parse {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
