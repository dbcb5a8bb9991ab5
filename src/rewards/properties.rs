use crate::pokemon::PokemonInst;
use schema::join_types;
use std::collections::BTreeMap;
use std::fmt;

type Extractor = fn(&PokemonInst) -> String;

/// The named properties a condition expression can refer to, and how each is
/// read off a creature. Keys are lowercase.
const EXTRACTORS: &[(&str, Extractor)] = &[
    ("species", |p| p.species.clone()),
    ("nickname", |p| p.nickname.clone().unwrap_or_default()),
    ("type", |p| join_types(&p.types)),
    ("level", |p| p.level.to_string()),
    ("shiny", |p| p.shiny.to_string()),
    ("gender", |p| p.gender.to_string()),
    ("nature", |p| p.nature.clone()),
    ("ability", |p| p.ability.clone()),
    ("form", |p| p.form.clone()),
    ("friendship", |p| p.friendship.to_string()),
    ("ivs", |p| p.ivs.describe("iv")),
    ("evs", |p| p.evs.describe("ev")),
];

/// Flattened key to value view of a creature, rebuilt whenever the tracked
/// opponent changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySnapshot {
    values: BTreeMap<&'static str, String>,
}

impl PropertySnapshot {
    pub fn from_pokemon(pokemon: &PokemonInst) -> Self {
        let values = EXTRACTORS
            .iter()
            .map(|(key, extract)| (*key, extract(pokemon)))
            .collect();
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Every property name the snapshot can carry.
    pub fn known_keys() -> impl Iterator<Item = &'static str> {
        EXTRACTORS.iter().map(|(key, _)| *key)
    }
}

impl fmt::Display for PropertySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .values
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "{}", joined)
    }
}
