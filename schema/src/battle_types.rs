use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Classification of a battle. Rules name the classifications they fire for.
///
/// Variants are ordered by precedence: a battle may move from `Wild` to
/// `Npc`, and nothing ever moves a battle out of `Pvp`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BattleType {
    Wild,
    Npc,
    Pvp,
}

/// The terminal outcome that causes a reward resolution pass.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum Trigger {
    BattleWon,
    BattleLost,
    BattleForfeit,
    Captured,
}
