//! Wires the battle tracker, rule set and dispatcher together.

use crate::battle::state::LifecycleEvent;
use crate::battle::tracker::BattleTracker;
use crate::config::{load_or_create, RewardStore};
use crate::errors::{ConfigResult, EngineError, EngineResult};
use crate::host::RewardHost;
use crate::player::PlayerId;
use crate::rewards::{select_rewards, RewardContext, RewardDispatcher};
use schema::{BattleType, RewardsConfig, Trigger};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of one resolution pass for one player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionReport {
    pub player_id: PlayerId,
    pub trigger: Trigger,
    pub battle_type: BattleType,
    pub granted: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    pub active_battles: usize,
    pub configured_rewards: usize,
    pub players_with_cooldowns: usize,
}

pub struct RewardEngine {
    tracker: Arc<BattleTracker>,
    store: RewardStore,
    dispatcher: RewardDispatcher,
    host: Arc<dyn RewardHost>,
    config_path: Option<PathBuf>,
}

#[derive(Default)]
pub struct RewardEngineBuilder {
    host: Option<Arc<dyn RewardHost>>,
    rules: Option<RewardsConfig>,
    config_path: Option<PathBuf>,
}

impl RewardEngineBuilder {
    pub fn host(mut self, host: Arc<dyn RewardHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Use an in-memory rule set.
    pub fn rules(mut self, rules: RewardsConfig) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Load the rule set from this file at build time, creating it with the
    /// defaults if missing. Also used for later reloads.
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Fails without a host or without any source of rules; the engine never
    /// starts half-wired.
    pub fn build(self) -> EngineResult<RewardEngine> {
        let host = self
            .host
            .ok_or(EngineError::MissingCollaborator("reward host"))?;
        let rules = match (self.rules, &self.config_path) {
            (Some(rules), _) => rules,
            (None, Some(path)) => load_or_create(path)?,
            (None, None) => return Err(EngineError::MissingCollaborator("reward rule set")),
        };

        info!(
            "Reward engine ready with {} rewards",
            rules.total_rewards()
        );
        Ok(RewardEngine {
            tracker: Arc::new(BattleTracker::new()),
            store: RewardStore::new(rules),
            dispatcher: RewardDispatcher::new(host.clone()),
            host,
            config_path: self.config_path,
        })
    }
}

impl RewardEngine {
    pub fn builder() -> RewardEngineBuilder {
        RewardEngineBuilder::default()
    }

    pub fn tracker(&self) -> &Arc<BattleTracker> {
        &self.tracker
    }

    pub fn dispatcher(&self) -> &RewardDispatcher {
        &self.dispatcher
    }

    pub fn rules(&self) -> Arc<RewardsConfig> {
        self.store.snapshot()
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Feed one lifecycle notification through the tracker and grant whatever
    /// it resolves.
    pub fn handle(&self, event: LifecycleEvent) -> Vec<ResolutionReport> {
        match event {
            LifecycleEvent::BattleStarted { battle_id, actors } => {
                self.tracker.on_battle_start(battle_id, actors);
                Vec::new()
            }
            LifecycleEvent::CreatureSentOut { creature } => {
                self.tracker.on_creature_sent_out(creature);
                Vec::new()
            }
            LifecycleEvent::CreatureCaptured {
                battle_id,
                player_id,
                creature,
            } => self.grant_all(
                self.tracker
                    .on_creature_captured(battle_id, player_id, creature),
            ),
            LifecycleEvent::BattleVictory { battle_id, winners } => {
                self.grant_all(self.tracker.on_battle_victory(battle_id, &winners))
            }
            LifecycleEvent::BattleFled {
                battle_id,
                player_id,
            } => self.grant_all(self.tracker.on_battle_fled(battle_id, player_id)),
            LifecycleEvent::CreatureFainted {
                battle_id,
                creature_id,
            } => {
                self.tracker.on_creature_fainted(battle_id, creature_id);
                Vec::new()
            }
        }
    }

    fn grant_all(&self, contexts: impl IntoIterator<Item = RewardContext>) -> Vec<ResolutionReport> {
        contexts
            .into_iter()
            .filter_map(|context| self.grant(&context))
            .collect()
    }

    /// Run one resolution pass: select against the current rule set and
    /// dispatch each pick. Players the host cannot find are skipped.
    pub fn grant(&self, context: &RewardContext) -> Option<ResolutionReport> {
        let Some(player) = self.host.player(context.player_id) else {
            debug!(
                "Player {} not online, skipping {} rewards",
                context.player_id, context.trigger
            );
            return None;
        };

        let rules = self.store.snapshot();
        let selected = select_rewards(&rules, context, &player.dimension, &mut rand::rng());

        let mut report = ResolutionReport {
            player_id: player.id,
            trigger: context.trigger,
            battle_type: context.battle_type,
            granted: Vec::new(),
            failed: Vec::new(),
        };
        for pick in selected {
            let granted = self.dispatcher.dispatch(
                &player,
                pick,
                context,
                rules.inventory_full_behavior,
            );
            if granted {
                report.granted.push(pick.id.to_string());
            } else {
                report.failed.push(pick.id.to_string());
            }
        }

        debug!(
            "{} {} for {}: granted {:?}, failed {:?}",
            context.battle_type, context.trigger, player.name, report.granted, report.failed
        );
        Some(report)
    }

    /// Reload rules from disk. The active set is untouched on failure.
    pub fn reload(&self, path: &Path) -> ConfigResult<Arc<RewardsConfig>> {
        self.store.reload_from(path)
    }

    pub fn replace_rules(&self, rules: RewardsConfig) {
        self.store.replace(rules);
    }

    pub fn sweep(&self) -> usize {
        self.tracker.sweep()
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            active_battles: self.tracker.len(),
            configured_rewards: self.store.snapshot().total_rewards(),
            players_with_cooldowns: self.dispatcher.cooldowns().player_count(),
        }
    }
}
