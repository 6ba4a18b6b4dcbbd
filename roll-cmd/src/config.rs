use dice_roll::{EvalContext, DEFAULT_MAX_REROLLS};
use std::{path::Path, time::Duration};
use toml::{map::Map, Value};

/// Limits and seed for the evaluations of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub max_rolls: Option<u64>,
    pub max_rerolls: u32,
    pub roll_timeout: Option<Duration>,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_rolls: None,
            max_rerolls: DEFAULT_MAX_REROLLS,
            roll_timeout: None,
            seed: None,
        }
    }
}

fn read_integer<T: TryFrom<i64>>(config: &Map<String, Value>, key: &str) -> Option<T> {
    let value = config.get(key)?;
    match value.as_integer().and_then(|i| T::try_from(i).ok()) {
        Some(v) => Some(v),
        None => {
            log::warn!("unable to read {}, using the default", key);
            None
        }
    }
}

impl Config {
    /// Reads a TOML file. Anything missing or unreadable keeps its default.
    pub fn load(path: &Path) -> Config {
        let config: Map<String, Value> = match toml::from_slice(&match std::fs::read(path) {
            Ok(a) => a,
            Err(e) => {
                log::warn!("Unable to read config file {}: {}", path.display(), e);
                vec![]
            }
        }) {
            Ok(a) => a,
            Err(e) => {
                log::warn!("Unable to parse config: {}", e);
                Map::new()
            }
        };
        Config::from_map(&config)
    }

    pub fn from_map(config: &Map<String, Value>) -> Config {
        Config {
            max_rolls: read_integer(config, "max_rolls"),
            max_rerolls: read_integer(config, "max_rerolls").unwrap_or(DEFAULT_MAX_REROLLS),
            roll_timeout: read_integer(config, "roll_timeout_ms").map(Duration::from_millis),
            seed: read_integer(config, "seed"),
        }
    }

    /// A fresh context; the timeout starts counting now.
    pub fn context(&self) -> EvalContext {
        let mut ctx = EvalContext::new().with_max_rerolls(self.max_rerolls);
        if let Some(max_rolls) = self.max_rolls {
            ctx = ctx.with_max_rolls(max_rolls);
        }
        if let Some(timeout) = self.roll_timeout {
            ctx = ctx.with_timeout(timeout);
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Config {
        Config::from_map(&toml::from_str(input).unwrap())
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            "max_rolls = 100\nmax_rerolls = 20\nroll_timeout_ms = 2000\nseed = 42\n",
        );
        assert_eq!(
            config,
            Config {
                max_rolls: Some(100),
                max_rerolls: 20,
                roll_timeout: Some(Duration::from_millis(2000)),
                seed: Some(42),
            }
        );
        let ctx = config.context();
        assert_eq!(ctx.max_rolls(), 100);
        assert_eq!(ctx.max_rerolls(), 20);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = parse("max_rolls = -1\nmax_rerolls = \"many\"\nseed = 1.5\n");
        assert_eq!(config, Config::default());
        assert_eq!(config.context().max_rerolls(), DEFAULT_MAX_REROLLS);
    }

    #[test]
    fn test_missing_file() {
        assert_eq!(
            Config::load(Path::new("/nonexistent/roll-cmd.toml")),
            Config::default()
        );
    }
}
