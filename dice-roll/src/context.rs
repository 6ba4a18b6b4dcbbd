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

use crate::error::{Error, Result};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

/// Ceiling on rerolls a single modifier application may perform.
pub const DEFAULT_MAX_REROLLS: u32 = 1000;

/// Lets another thread stop an evaluation that is still running.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Limits, counters and parameters shared by everything one evaluation touches.
///
/// Pass it by reference into every roll; never keep it inside a die or group.
#[derive(Debug)]
pub struct EvalContext {
    max_rolls: u64,
    max_rerolls: u32,
    rolls: AtomicU64,
    params: HashMap<String, f64>,
    deadline: Option<Instant>,
    cancel: CancelHandle,
}

impl EvalContext {
    pub fn new() -> EvalContext {
        EvalContext {
            max_rolls: u64::MAX,
            max_rerolls: DEFAULT_MAX_REROLLS,
            rolls: AtomicU64::new(0),
            params: HashMap::new(),
            deadline: None,
            cancel: CancelHandle::default(),
        }
    }

    pub fn with_max_rolls(mut self, max_rolls: u64) -> EvalContext {
        self.max_rolls = max_rolls;
        self
    }

    pub fn with_max_rerolls(mut self, max_rerolls: u32) -> EvalContext {
        self.max_rerolls = max_rerolls;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> EvalContext {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> EvalContext {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> EvalContext {
        self.params.insert(name.into(), value);
        self
    }

    pub fn max_rolls(&self) -> u64 {
        self.max_rolls
    }

    pub fn max_rerolls(&self) -> u32 {
        self.max_rerolls
    }

    /// Rolls and rerolls performed so far.
    pub fn rolls(&self) -> u64 {
        self.rolls.load(Ordering::SeqCst)
    }

    pub fn param(&self, name: &str) -> Option<f64> {
        self.params.get(name).copied()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Fails once the evaluation was cancelled or ran past its deadline.
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    /// Fails when `count` more rolls would not fit under `max_rolls`.
    pub fn ensure_rolls(&self, count: u64) -> Result<()> {
        if count > self.max_rolls.saturating_sub(self.rolls()) {
            return Err(Error::MaxRollsExceeded(self.max_rolls));
        }
        Ok(())
    }

    /// Reserves one roll. The counter never moves past `max_rolls`.
    pub(crate) fn count_roll(&self) -> Result<()> {
        self.check()?;
        let max = self.max_rolls;
        self.rolls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                if n < max {
                    Some(n + 1)
                } else {
                    None
                }
            })
            .map(|_| ())
            .map_err(|_| Error::MaxRollsExceeded(max))
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}
