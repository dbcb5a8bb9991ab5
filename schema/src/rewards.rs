use crate::battle_types::{BattleType, Trigger};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a reward does when it is granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RewardKind {
    /// Deliver one of the configured item payloads to the player.
    Item,
    /// Run a command string through the host.
    #[default]
    Command,
    /// Anything the engine does not know how to grant. Kept loadable so one
    /// stale entry does not take the whole rule set down.
    #[serde(other)]
    Unknown,
}

/// A condition entry: either a single expression or a group whose
/// expressions must all match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionExpr {
    Single(String),
    AllOf(Vec<String>),
}

/// An item payload variant and its relative weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedItem {
    /// Serialized item stack (JSON), handed to the item collaborator.
    pub value: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

/// What to do with an item reward when the player's inventory is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InventoryFullBehavior {
    #[default]
    Drop,
    Skip,
}

/// A single reward rule. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reward {
    pub kind: RewardKind,
    pub message: String,
    pub command: String,
    pub item_stack: Vec<WeightedItem>,
    /// Probability in percent, 0 to 100.
    pub chance: f64,
    /// Seconds between two grants of this reward to the same player.
    pub cooldown: u64,
    pub cooldown_message: String,
    pub battle_types: Vec<BattleType>,
    pub conditions: Vec<ConditionExpr>,
    pub conditions_blacklist: bool,
    pub min_level: u32,
    pub max_level: u32,
    /// Lower values are evaluated first.
    pub order: i32,
    /// Reward ids that may not also fire in the same resolution pass once
    /// this one is selected.
    pub excludes: Vec<String>,
    pub allowed_dimensions: Option<Vec<String>>,
}

impl Default for Reward {
    fn default() -> Self {
        Self {
            kind: RewardKind::Command,
            message: String::new(),
            command: String::new(),
            item_stack: Vec::new(),
            chance: 100.0,
            cooldown: 0,
            cooldown_message: String::new(),
            battle_types: vec![BattleType::Wild, BattleType::Npc, BattleType::Pvp],
            conditions: Vec::new(),
            conditions_blacklist: false,
            min_level: 1,
            max_level: 100,
            order: 999,
            excludes: Vec::new(),
            allowed_dimensions: None,
        }
    }
}

impl Reward {
    /// True when the reward may be granted in the given dimension.
    pub fn allowed_in(&self, dimension: &str) -> bool {
        match &self.allowed_dimensions {
            None => true,
            Some(dimensions) if dimensions.is_empty() => true,
            Some(dimensions) => dimensions.iter().any(|d| d == dimension),
        }
    }

    /// True when `level` falls inside the inclusive level window.
    pub fn covers_level(&self, level: u32) -> bool {
        (self.min_level..=self.max_level).contains(&level)
    }
}

/// The complete rule set: one map of reward id to reward per trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardsConfig {
    pub version: String,
    pub debug_enabled: bool,
    pub inventory_full_behavior: InventoryFullBehavior,
    pub battle_won_rewards: BTreeMap<String, Reward>,
    pub battle_lost_rewards: BTreeMap<String, Reward>,
    pub battle_forfeit_rewards: BTreeMap<String, Reward>,
    pub capture_rewards: BTreeMap<String, Reward>,
}

impl RewardsConfig {
    pub const CURRENT_VERSION: &'static str = "2.0.0";

    /// Candidate rules for a trigger.
    pub fn rewards_for(&self, trigger: Trigger) -> &BTreeMap<String, Reward> {
        match trigger {
            Trigger::BattleWon => &self.battle_won_rewards,
            Trigger::BattleLost => &self.battle_lost_rewards,
            Trigger::BattleForfeit => &self.battle_forfeit_rewards,
            Trigger::Captured => &self.capture_rewards,
        }
    }

    /// Iterate every (trigger, id, reward) triple in the rule set.
    pub fn iter_all(&self) -> impl Iterator<Item = (Trigger, &String, &Reward)> {
        [
            Trigger::BattleWon,
            Trigger::BattleLost,
            Trigger::BattleForfeit,
            Trigger::Captured,
        ]
        .into_iter()
        .flat_map(move |trigger| {
            self.rewards_for(trigger)
                .iter()
                .map(move |(id, reward)| (trigger, id, reward))
        })
    }

    pub fn total_rewards(&self) -> usize {
        self.battle_won_rewards.len()
            + self.battle_lost_rewards.len()
            + self.battle_forfeit_rewards.len()
            + self.capture_rewards.len()
    }
}

impl Default for RewardsConfig {
    /// The starter rule set written out when no configuration exists yet.
    fn default() -> Self {
        let mut battle_won_rewards = BTreeMap::new();
        battle_won_rewards.insert(
            "wild_poke_balls".to_string(),
            Reward {
                kind: RewardKind::Item,
                message: "You received %rewardItemCount% Poke Balls for beating %pokemon%!"
                    .to_string(),
                item_stack: vec![
                    WeightedItem {
                        value: r#"{"id":"cobblemon:poke_ball","count":3}"#.to_string(),
                        weight: 3,
                    },
                    WeightedItem {
                        value: r#"{"id":"cobblemon:great_ball","count":1}"#.to_string(),
                        weight: 1,
                    },
                ],
                chance: 60.0,
                cooldown: 300,
                cooldown_message: "Wait %time% seconds for more Poke Balls.".to_string(),
                battle_types: vec![BattleType::Wild],
                max_level: 30,
                order: 1,
                ..Reward::default()
            },
        );
        battle_won_rewards.insert(
            "wild_ultra_ball".to_string(),
            Reward {
                kind: RewardKind::Item,
                message: "You received an Ultra Ball for beating a level %level% %pokemon%!"
                    .to_string(),
                item_stack: vec![WeightedItem {
                    value: r#"{"id":"cobblemon:ultra_ball","count":1}"#.to_string(),
                    weight: 1,
                }],
                chance: 40.0,
                cooldown: 900,
                battle_types: vec![BattleType::Wild],
                min_level: 31,
                order: 1,
                excludes: vec!["wild_dollars".to_string()],
                ..Reward::default()
            },
        );
        battle_won_rewards.insert(
            "wild_dollars".to_string(),
            Reward {
                message: "You received $25 for winning the battle!".to_string(),
                command: "eco deposit 25 dollars %player%".to_string(),
                chance: 50.0,
                battle_types: vec![BattleType::Wild],
                ..Reward::default()
            },
        );
        battle_won_rewards.insert(
            "npc_dollars".to_string(),
            Reward {
                message: "You received $100 for defeating the trainer!".to_string(),
                command: "eco deposit 100 dollars %player%".to_string(),
                battle_types: vec![BattleType::Npc],
                ..Reward::default()
            },
        );
        battle_won_rewards.insert(
            "pvp_tokens".to_string(),
            Reward {
                message: "You received 15 PVP tokens!".to_string(),
                command: "eco deposit 15 pvptokens %player%".to_string(),
                cooldown: 600,
                battle_types: vec![BattleType::Pvp],
                ..Reward::default()
            },
        );

        let mut battle_lost_rewards = BTreeMap::new();
        battle_lost_rewards.insert(
            "lost_consolation".to_string(),
            Reward {
                message: "Better luck next time, %player%. Here is $5.".to_string(),
                command: "eco deposit 5 dollars %player%".to_string(),
                chance: 50.0,
                cooldown: 300,
                ..Reward::default()
            },
        );

        let mut battle_forfeit_rewards = BTreeMap::new();
        battle_forfeit_rewards.insert(
            "forfeit_potion".to_string(),
            Reward {
                kind: RewardKind::Item,
                message: "You received a consolation potion.".to_string(),
                item_stack: vec![WeightedItem {
                    value: r#"{"id":"cobblemon:potion","count":1}"#.to_string(),
                    weight: 1,
                }],
                chance: 50.0,
                cooldown: 300,
                cooldown_message: "You need to wait %time% seconds before another potion."
                    .to_string(),
                ..Reward::default()
            },
        );

        let mut capture_rewards = BTreeMap::new();
        capture_rewards.insert(
            "capture_dollars".to_string(),
            Reward {
                message: "You received $50 for capturing %pokemon%!".to_string(),
                command: "eco deposit 50 dollars %player%".to_string(),
                battle_types: vec![BattleType::Wild],
                ..Reward::default()
            },
        );
        capture_rewards.insert(
            "capture_rare_type".to_string(),
            Reward {
                message: "Rare type bonus: $150!".to_string(),
                command: "eco deposit 150 dollars %player%".to_string(),
                battle_types: vec![BattleType::Wild],
                conditions: vec![
                    ConditionExpr::Single("type:dragon".to_string()),
                    ConditionExpr::Single("type:ghost".to_string()),
                    ConditionExpr::Single("type:fairy".to_string()),
                ],
                order: 0,
                ..Reward::default()
            },
        );
        capture_rewards.insert(
            "capture_shiny_pikachu".to_string(),
            Reward {
                kind: RewardKind::Item,
                message: "A shiny Pikachu! Take a Thunder Stone.".to_string(),
                item_stack: vec![WeightedItem {
                    value: r#"{"id":"cobblemon:thunder_stone","count":1}"#.to_string(),
                    weight: 1,
                }],
                cooldown: 86400,
                battle_types: vec![BattleType::Wild],
                conditions: vec![ConditionExpr::AllOf(vec![
                    "pikachu".to_string(),
                    "shiny=true".to_string(),
                ])],
                ..Reward::default()
            },
        );

        Self {
            version: Self::CURRENT_VERSION.to_string(),
            debug_enabled: false,
            inventory_full_behavior: InventoryFullBehavior::Drop,
            battle_won_rewards,
            battle_lost_rewards,
            battle_forfeit_rewards,
            capture_rewards,
        }
    }
}
