//! Loading, validating and hot-swapping the reward rule set.

use crate::errors::{ConfigError, ConfigResult};
use schema::{RewardKind, RewardsConfig, Trigger};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

/// Read and validate a rule set from a RON file.
pub fn load_config(path: &Path) -> ConfigResult<RewardsConfig> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: RewardsConfig = ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    validate(&config)?;

    if config.version != RewardsConfig::CURRENT_VERSION {
        warn!(
            "Config {} has version {}, expected {}",
            path.display(),
            config.version,
            RewardsConfig::CURRENT_VERSION
        );
    }
    info!(
        "Loaded {} rewards from {}",
        config.total_rewards(),
        path.display()
    );
    Ok(config)
}

/// Load the rule set, writing out the default one first if the file is missing.
pub fn load_or_create(path: &Path) -> ConfigResult<RewardsConfig> {
    if path.exists() {
        return load_config(path);
    }

    let config = RewardsConfig::default();
    let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default())?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, text).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Wrote default reward configuration to {}", path.display());
    Ok(config)
}

/// Check every rule against the schema constraints. Dangling `excludes`
/// entries are only warned about.
pub fn validate(config: &RewardsConfig) -> ConfigResult<()> {
    let known_ids: HashSet<&str> = config.iter_all().map(|(_, id, _)| id.as_str()).collect();

    for (trigger, id, reward) in config.iter_all() {
        let invalid = |reason: String| ConfigError::Invalid {
            reward_id: id.clone(),
            reason,
        };

        if !(0.0..=100.0).contains(&reward.chance) {
            return Err(invalid(format!(
                "chance {} is outside 0..=100",
                reward.chance
            )));
        }
        if reward.min_level > reward.max_level {
            return Err(invalid(format!(
                "min_level {} is above max_level {}",
                reward.min_level, reward.max_level
            )));
        }
        if reward.kind == RewardKind::Item
            && reward.item_stack.iter().map(|item| u64::from(item.weight)).sum::<u64>() == 0
        {
            return Err(invalid(
                "item reward needs at least one payload with a positive weight".to_string(),
            ));
        }

        for excluded in &reward.excludes {
            if !known_ids.contains(excluded.as_str()) {
                warn!(
                    "Reward '{}' ({}) excludes unknown reward '{}'",
                    id, trigger, excluded
                );
            }
        }
    }
    Ok(())
}

/// Human-readable listing of the rule set, grouped by trigger.
pub fn describe_rewards(config: &RewardsConfig) -> String {
    let mut out = String::new();
    for trigger in [
        Trigger::BattleWon,
        Trigger::BattleLost,
        Trigger::BattleForfeit,
        Trigger::Captured,
    ] {
        let rewards = config.rewards_for(trigger);
        let _ = writeln!(out, "{} ({}):", trigger, rewards.len());
        if rewards.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for (id, reward) in rewards {
            let battle_types = reward
                .battle_types
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join("/");
            let _ = write!(
                out,
                "  {} [{:?}] chance {}% order {} levels {}-{} types {}",
                id,
                reward.kind,
                reward.chance,
                reward.order,
                reward.min_level,
                reward.max_level,
                battle_types
            );
            if reward.cooldown > 0 {
                let _ = write!(out, " cooldown {}s", reward.cooldown);
            }
            if !reward.excludes.is_empty() {
                let _ = write!(out, " excludes {}", reward.excludes.join(","));
            }
            out.push('\n');
        }
    }
    out
}

/// The active rule set. Readers take an `Arc` snapshot for a whole
/// resolution pass; a reload swaps the set in one step.
#[derive(Debug)]
pub struct RewardStore {
    current: RwLock<Arc<RewardsConfig>>,
}

impl RewardStore {
    pub fn new(config: RewardsConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    pub fn snapshot(&self) -> Arc<RewardsConfig> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, config: RewardsConfig) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
    }

    /// Reload from disk. On failure the previous rule set stays active.
    pub fn reload_from(&self, path: &Path) -> ConfigResult<Arc<RewardsConfig>> {
        match load_config(path) {
            Ok(config) => {
                self.replace(config);
                Ok(self.snapshot())
            }
            Err(err) => {
                warn!("Reload of {} failed, keeping current rewards: {}", path.display(), err);
                Err(err)
            }
        }
    }
}
