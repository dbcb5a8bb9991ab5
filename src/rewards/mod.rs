//! Reward eligibility and distribution.
//!
//! A resolution pass starts from a [`RewardContext`] captured by the battle
//! tracker, picks rules with [`selector::select_rewards`], and grants each one
//! through the [`dispatcher::RewardDispatcher`], which consults the
//! [`cooldown::CooldownTracker`].

pub mod conditions;
pub mod cooldown;
pub mod dispatcher;
pub mod items;
pub mod placeholders;
pub mod properties;
pub mod selector;

pub use conditions::{conditions_match, matches};
pub use cooldown::CooldownTracker;
pub use dispatcher::RewardDispatcher;
pub use items::{pick_weighted, ItemStack};
pub use properties::PropertySnapshot;
pub use selector::{eligible_rewards, select_rewards, SelectedReward};

use crate::battle::state::BattleId;
use crate::player::PlayerId;
use crate::pokemon::PokemonInst;
use schema::{BattleType, Trigger};

/// Everything one resolution pass needs about a battle, copied out while the
/// battle was locked so granting never holds the battle.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardContext {
    /// None for captures that happened outside any tracked battle.
    pub battle_id: Option<BattleId>,
    pub player_id: PlayerId,
    pub trigger: Trigger,
    pub battle_type: BattleType,
    pub opponent: Option<PokemonInst>,
    pub opponent_properties: PropertySnapshot,
}

impl RewardContext {
    pub fn new(
        battle_id: Option<BattleId>,
        player_id: PlayerId,
        trigger: Trigger,
        battle_type: BattleType,
    ) -> Self {
        Self {
            battle_id,
            player_id,
            trigger,
            battle_type,
            opponent: None,
            opponent_properties: PropertySnapshot::default(),
        }
    }

    /// Attach the opponent creature, rebuilding the property snapshot.
    pub fn with_opponent(mut self, opponent: Option<PokemonInst>) -> Self {
        self.opponent_properties = opponent
            .as_ref()
            .map(PropertySnapshot::from_pokemon)
            .unwrap_or_default();
        self.opponent = opponent;
        self
    }

    /// Opponent level used for level windows; 1 when no opponent is known.
    pub fn opponent_level(&self) -> u32 {
        self.opponent.as_ref().map(|p| p.level).unwrap_or(1)
    }
}
