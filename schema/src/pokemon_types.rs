use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Elemental typing of a creature as reported by the host game.
///
/// Displayed in lowercase (`electric`, `flying`) because that is the form
/// condition expressions are written against.
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
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PokemonType {
    Normal,
    Fighting,
    Flying,
    Poison,
    Ground,
    Rock,
    Bug,
    Ghost,
    Steel,
    Fire,
    Water,
    Grass,
    Electric,
    Psychic,
    Ice,
    Dragon,
    Dark,
    Fairy,
}

/// Joins a creature's types into the comma separated form used by property
/// snapshots, e.g. `electric,flying`.
pub fn join_types(types: &[PokemonType]) -> String {
    types
        .iter()
        .map(|t| t.as_ref())
        .collect::<Vec<_>>()
        .join(",")
}
