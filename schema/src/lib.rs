// Battle Rewards Schema - Shared type definitions
// This crate contains the configuration schema and the small enums that are
// shared between the rewards engine and its binaries.

// Re-export the main types
pub use battle_types::*;
pub use pokemon_types::*;
pub use rewards::*;

pub mod battle_types;
pub mod pokemon_types;
pub mod rewards;
