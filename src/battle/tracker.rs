use crate::battle::state::{BattleId, BattleState, BATTLE_TIMEOUT_MS};
use crate::clock::epoch_millis;
use crate::player::{BattleActor, PlayerId};
use crate::pokemon::PokemonInst;
use crate::rewards::RewardContext;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use schema::{BattleType, Trigger};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};
use uuid::Uuid;

type SharedBattle = Arc<Mutex<BattleState>>;

fn lock(battle: &SharedBattle) -> MutexGuard<'_, BattleState> {
    battle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registry of battles in progress.
///
/// Each battle sits behind its own mutex so related fields change together.
/// A battle's mutex is never held while the battle map or creature index are
/// touched, except inside the sweeper's `remove_if` re-check, which only goes
/// map then battle. The resolved ledger is written under a battle's mutex and
/// nothing locks a battle while holding the ledger.
/// Terminal notifications return the reward contexts to resolve instead of
/// granting them, so no lock is held while rewards are dispatched.
#[derive(Debug, Default)]
pub struct BattleTracker {
    battles: DashMap<BattleId, SharedBattle>,
    creature_index: DashMap<Uuid, BattleId>,
    /// Battles ended by capture, victory or flee, with the time they ended.
    /// Kept for one timeout window so late captures are not granted twice.
    resolved: DashMap<BattleId, u64>,
}

/// Where a capture notification belongs.
enum CaptureTarget {
    Tracked(BattleId, SharedBattle),
    AlreadyResolved(BattleId),
    Ambient,
}

impl BattleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.battles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.battles.is_empty()
    }

    /// A copy of a tracked battle's current state.
    pub fn battle(&self, battle_id: BattleId) -> Option<BattleState> {
        self.shared(battle_id).map(|battle| lock(&battle).clone())
    }

    pub fn battle_for_creature(&self, creature_id: Uuid) -> Option<BattleId> {
        self.creature_index.get(&creature_id).map(|entry| *entry.value())
    }

    fn shared(&self, battle_id: BattleId) -> Option<SharedBattle> {
        self.battles.get(&battle_id).map(|entry| entry.value().clone())
    }

    /// Start tracking a battle. A repeated start for the same id replaces the
    /// earlier state.
    pub fn on_battle_start(&self, battle_id: BattleId, actors: Vec<BattleActor>) -> BattleType {
        let state = BattleState::new(battle_id, actors, epoch_millis());
        let battle_type = state.battle_type;
        let creature_ids = state.creature_ids();

        self.resolved.remove(&battle_id);
        if let Some(previous) = self.battles.insert(battle_id, Arc::new(Mutex::new(state))) {
            debug!("Battle {} restarted, replacing tracked state", battle_id);
            let stale_ids = lock(&previous).creature_ids();
            for id in stale_ids {
                self.creature_index.remove_if(&id, |_, owner| *owner == battle_id);
            }
        }
        for id in creature_ids {
            self.creature_index.insert(id, battle_id);
        }

        info!("Battle {} started as {}", battle_id, battle_type);
        battle_type
    }

    /// A creature entered the field. Returns false when no tracked battle owns it.
    pub fn on_creature_sent_out(&self, creature: PokemonInst) -> bool {
        let Some(battle_id) = self.battle_for_creature(creature.uuid) else {
            debug!("No tracked battle for sent out creature {}", creature.uuid);
            return false;
        };
        let Some(battle) = self.shared(battle_id) else {
            return false;
        };

        let mut state = lock(&battle);
        let before = state.battle_type;
        debug!("Battle {}: {} sent out", battle_id, creature.species);
        state.send_out(creature, epoch_millis());
        if state.battle_type != before {
            info!("Battle {} reclassified {} -> {}", battle_id, before, state.battle_type);
        }
        true
    }

    /// A creature was captured by a player.
    ///
    /// Inside a tracked battle this resolves the battle: it is marked captured
    /// and resolved, dropped from the registry, and one Captured context is
    /// returned. Later notifications for the same battle yield nothing.
    ///
    /// An unknown battle id falls back to the battle owning the creature, and
    /// failing that to a synthetic wild battle. A battle that was swept as
    /// stale still grants its capture this way.
    pub fn on_creature_captured(
        &self,
        battle_id: Option<BattleId>,
        player_id: PlayerId,
        creature: PokemonInst,
    ) -> Option<RewardContext> {
        let (battle_id, battle) = match self.capture_target(battle_id, creature.uuid) {
            CaptureTarget::Tracked(battle_id, battle) => (battle_id, battle),
            CaptureTarget::AlreadyResolved(battle_id) => {
                debug!("Battle {} already resolved, capture ignored", battle_id);
                return None;
            }
            CaptureTarget::Ambient => {
                let now = epoch_millis();
                if let Some(battle_id) = battle_id {
                    // First synthetic capture naming this id wins.
                    if let Entry::Vacant(slot) = self.resolved.entry(battle_id) {
                        slot.insert(now);
                    } else {
                        debug!("Battle {} already resolved, capture ignored", battle_id);
                        return None;
                    }
                }
                debug!(
                    "Capture of {} outside any tracked battle, resolving as wild",
                    creature.species
                );
                return Some(
                    RewardContext::new(None, player_id, Trigger::Captured, BattleType::Wild)
                        .with_opponent(Some(creature)),
                );
            }
        };

        let context = {
            let mut state = lock(&battle);
            if state.captured || state.resolved {
                debug!("Battle {} already resolved, capture ignored", battle_id);
                return None;
            }
            let now = epoch_millis();
            state.captured = true;
            state.resolved = true;
            state.touch(now);
            self.resolved.insert(battle_id, now);
            if state.opponent_pokemon.as_ref().map(|p| p.uuid) != Some(creature.uuid) {
                state.set_opponent(creature);
            }
            RewardContext::new(Some(battle_id), player_id, Trigger::Captured, state.battle_type)
                .with_opponent(state.opponent_pokemon.clone())
        };

        info!("Battle {} ended by capture", battle_id);
        self.remove_battle(battle_id);
        Some(context)
    }

    /// The reported battle wins when tracked; then the creature's battle.
    fn capture_target(&self, battle_id: Option<BattleId>, creature_id: Uuid) -> CaptureTarget {
        let candidates = battle_id
            .into_iter()
            .chain(self.battle_for_creature(creature_id));
        for candidate in candidates {
            if let Some(battle) = self.shared(candidate) {
                return CaptureTarget::Tracked(candidate, battle);
            }
            if self.resolved.contains_key(&candidate) {
                return CaptureTarget::AlreadyResolved(candidate);
            }
            debug!("Capture names untracked battle {}", candidate);
        }
        CaptureTarget::Ambient
    }

    /// The battle ended with a winning side. Every player in the battle gets
    /// a context: Won for winners, Forfeit for losers with a creature still
    /// standing, Lost for the rest.
    pub fn on_battle_victory(&self, battle_id: BattleId, winners: &[Uuid]) -> Vec<RewardContext> {
        let Some(battle) = self.shared(battle_id) else {
            debug!("Victory for untracked battle {} ignored", battle_id);
            return Vec::new();
        };

        let contexts = {
            let mut state = lock(&battle);
            if state.captured || state.resolved {
                debug!("Battle {} already resolved, victory ignored", battle_id);
                return Vec::new();
            }
            let now = epoch_millis();
            state.resolved = true;
            state.touch(now);
            self.resolved.insert(battle_id, now);

            state
                .player_actors()
                .filter_map(|actor| {
                    let player_id = actor.player_id?;
                    let trigger = if winners.contains(&actor.actor_id) {
                        Trigger::BattleWon
                    } else if actor.has_conscious_pokemon() {
                        Trigger::BattleForfeit
                    } else {
                        Trigger::BattleLost
                    };
                    Some(
                        RewardContext::new(Some(battle_id), player_id, trigger, state.battle_type)
                            .with_opponent(state.opponent_for(actor, winners)),
                    )
                })
                .collect::<Vec<_>>()
        };

        info!(
            "Battle {} resolved by victory for {} player(s)",
            battle_id,
            contexts.len()
        );
        self.remove_battle(battle_id);
        contexts
    }

    /// A player ran from the battle. They forfeit; in PVP every other player
    /// is awarded the win. A player who is not in the battle changes nothing.
    pub fn on_battle_fled(&self, battle_id: BattleId, player_id: PlayerId) -> Vec<RewardContext> {
        let Some(battle) = self.shared(battle_id) else {
            debug!("Flee from untracked battle {} ignored", battle_id);
            return Vec::new();
        };

        let contexts = {
            let mut state = lock(&battle);
            if state.captured || state.resolved {
                debug!("Battle {} already resolved, flee ignored", battle_id);
                return Vec::new();
            }
            let Some(fleeing) = state
                .player_actors()
                .find(|actor| actor.player_id == Some(player_id))
                .map(|actor| actor.actor_id)
            else {
                debug!("Player {} is not in battle {}, flee ignored", player_id, battle_id);
                return Vec::new();
            };

            let now = epoch_millis();
            state.resolved = true;
            state.touch(now);
            self.resolved.insert(battle_id, now);

            let remaining: Vec<Uuid> = state
                .player_actors()
                .filter(|actor| actor.player_id != Some(player_id))
                .map(|actor| actor.actor_id)
                .collect();

            let mut contexts = Vec::new();
            let fleeing_opponent = state
                .player_actors()
                .find(|actor| actor.actor_id == fleeing)
                .and_then(|actor| state.opponent_for(actor, &remaining));
            contexts.push(
                RewardContext::new(
                    Some(battle_id),
                    player_id,
                    Trigger::BattleForfeit,
                    state.battle_type,
                )
                .with_opponent(fleeing_opponent),
            );

            if state.battle_type == BattleType::Pvp {
                for actor in state.player_actors() {
                    let Some(other_id) = actor.player_id.filter(|id| *id != player_id) else {
                        continue;
                    };
                    contexts.push(
                        RewardContext::new(
                            Some(battle_id),
                            other_id,
                            Trigger::BattleWon,
                            state.battle_type,
                        )
                        .with_opponent(state.opponent_for(actor, &remaining)),
                    );
                }
            }
            contexts
        };

        info!("Battle {} resolved by flee", battle_id);
        self.remove_battle(battle_id);
        contexts
    }

    /// Record a faint. Feeds the forfeit or lost decision at victory time.
    pub fn on_creature_fainted(&self, battle_id: BattleId, creature_id: Uuid) -> bool {
        let Some(battle) = self.shared(battle_id) else {
            return false;
        };
        let found = lock(&battle).faint(creature_id, epoch_millis());
        if !found {
            debug!("Battle {}: fainted creature {} not on any team", battle_id, creature_id);
        }
        found
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(epoch_millis())
    }

    /// Evict resolved battles and battles idle past the timeout. Candidates
    /// are picked from a snapshot; each removal re-checks its battle so one
    /// revived in the meantime stays. Resolved-battle records older than the
    /// timeout are dropped too but not counted.
    pub fn sweep_at(&self, now_ms: u64) -> usize {
        self.resolved
            .retain(|_, ended_at| now_ms.saturating_sub(*ended_at) <= BATTLE_TIMEOUT_MS);

        let snapshot: Vec<(BattleId, SharedBattle)> = self
            .battles
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let evictable = |state: &BattleState| state.resolved || state.is_stale(now_ms);
        let candidates: Vec<BattleId> = snapshot
            .into_iter()
            .filter(|(_, battle)| evictable(&lock(battle)))
            .map(|(id, _)| id)
            .collect();

        let mut removed = 0;
        for battle_id in candidates {
            if let Some((_, battle)) = self
                .battles
                .remove_if(&battle_id, |_, battle| evictable(&lock(battle)))
            {
                self.clear_index(battle_id, &battle);
                debug!("Swept battle {}", battle_id);
                removed += 1;
            }
        }

        if removed > 0 {
            info!("Sweep removed {} battle(s)", removed);
        }
        removed
    }

    fn remove_battle(&self, battle_id: BattleId) {
        if let Some((_, battle)) = self.battles.remove(&battle_id) {
            self.clear_index(battle_id, &battle);
        }
    }

    fn clear_index(&self, battle_id: BattleId, battle: &SharedBattle) {
        let creature_ids = lock(battle).creature_ids();
        for id in creature_ids {
            self.creature_index.remove_if(&id, |_, owner| *owner == battle_id);
        }
    }
}
