// In: src/lib.rs

//! Battle Rewards Engine
//!
//! Tracks creature battles as the host reports them, classifies each one, and
//! when a battle ends grants the configured rewards: tiered selection with
//! exclusions, condition matching against the opponent, weighted item
//! payloads and per-player cooldowns.

// --- MODULE DECLARATIONS ---
pub mod battle;
pub mod clock;
pub mod config;
pub mod engine;
pub mod errors;
pub mod host;
pub mod player;
pub mod pokemon;
pub mod rewards;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
// Configuration schema and shared enums.
pub use schema::{
    BattleType, ConditionExpr, InventoryFullBehavior, PokemonType, Reward, RewardKind,
    RewardsConfig, Trigger, WeightedItem,
};

// --- From this crate's modules (`src/`) ---

// Battle tracking and the lifecycle feed.
pub use battle::state::{BattleId, BattleState, LifecycleEvent, BATTLE_TIMEOUT_MS};
pub use battle::sweeper::{spawn_sweeper, DEFAULT_SWEEP_PERIOD};
pub use battle::tracker::BattleTracker;

// Engine composition.
pub use config::{describe_rewards, load_config, load_or_create, RewardStore};
pub use engine::{EngineStatus, RewardEngine, RewardEngineBuilder, ResolutionReport};
pub use host::{HostAction, RecordingHost, RewardHost};

// Core runtime types.
pub use player::{ActorKind, BattleActor, BlockPos, PlayerId, PlayerInfo};
pub use pokemon::{Gender, Owner, PokemonInst, StatSpread};
pub use rewards::{RewardContext, RewardDispatcher};

// Crate-specific error and result types.
pub use errors::{
    ConfigError, ConfigResult, DispatchError, DispatchResult, EngineError, EngineResult,
};
