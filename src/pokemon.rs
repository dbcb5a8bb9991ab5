use crate::player::PlayerId;
use schema::PokemonType;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Genderless,
}

/// Who a creature belongs to, as far as the host can tell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Owner {
    Player(PlayerId),
    Npc(String),
    #[default]
    Unowned,
}

/// Per-stat values for IVs or EVs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatSpread {
    pub hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub special_attack: u16,
    pub special_defense: u16,
    pub speed: u16,
}

impl StatSpread {
    pub fn uniform(value: u16) -> Self {
        Self {
            hp: value,
            attack: value,
            defense: value,
            special_attack: value,
            special_defense: value,
            speed: value,
        }
    }

    /// Serialize as `hp_<suffix>=31,attack_<suffix>=31,...`.
    pub fn describe(&self, suffix: &str) -> String {
        [
            ("hp", self.hp),
            ("attack", self.attack),
            ("defense", self.defense),
            ("special_attack", self.special_attack),
            ("special_defense", self.special_defense),
            ("speed", self.speed),
        ]
        .iter()
        .map(|(stat, value)| format!("{}_{}={}", stat, suffix, value))
        .collect::<Vec<_>>()
        .join(",")
    }
}

/// A creature instance as reported by the host game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PokemonInst {
    pub uuid: Uuid,
    pub species: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub types: Vec<PokemonType>,
    pub level: u32,
    #[serde(default)]
    pub shiny: bool,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub nature: String,
    #[serde(default)]
    pub ability: String,
    #[serde(default)]
    pub form: String,
    #[serde(default)]
    pub friendship: u32,
    #[serde(default)]
    pub ivs: StatSpread,
    #[serde(default)]
    pub evs: StatSpread,
    pub current_hp: u32,
    #[serde(default)]
    pub owner: Owner,
}

impl PokemonInst {
    /// A fresh, unowned creature at full health with otherwise default attributes.
    pub fn new(species: &str, level: u32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            species: species.to_string(),
            nickname: None,
            types: Vec::new(),
            level,
            shiny: false,
            gender: Gender::default(),
            nature: String::new(),
            ability: String::new(),
            form: String::new(),
            friendship: 0,
            ivs: StatSpread::default(),
            evs: StatSpread::default(),
            current_hp: 1,
            owner: Owner::Unowned,
        }
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp == 0
    }

    pub fn is_player_owned(&self) -> bool {
        matches!(self.owner, Owner::Player(_))
    }

    pub fn is_npc_owned(&self) -> bool {
        matches!(self.owner, Owner::Npc(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_spread_describe() {
        let ivs = StatSpread {
            hp: 31,
            attack: 0,
            defense: 15,
            special_attack: 31,
            special_defense: 2,
            speed: 31,
        };
        assert_eq!(
            ivs.describe("iv"),
            "hp_iv=31,attack_iv=0,defense_iv=15,special_attack_iv=31,special_defense_iv=2,speed_iv=31"
        );
    }

    #[test]
    fn test_owner_helpers() {
        let mut pokemon = PokemonInst::new("pikachu", 10);
        assert!(!pokemon.is_player_owned());
        assert!(!pokemon.is_npc_owned());

        pokemon.owner = Owner::Npc("Youngster Joey".to_string());
        assert!(pokemon.is_npc_owned());

        pokemon.owner = Owner::Player(Uuid::new_v4());
        assert!(pokemon.is_player_owned());
    }

    #[test]
    fn test_fainted() {
        let mut pokemon = PokemonInst::new("eevee", 5);
        assert!(!pokemon.is_fainted());
        pokemon.current_hp = 0;
        assert!(pokemon.is_fainted());
    }
}
