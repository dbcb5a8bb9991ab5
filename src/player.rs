use crate::pokemon::PokemonInst;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type PlayerId = Uuid;

/// What kind of participant an actor is, as reported by the host.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorKind {
    Player,
    Wild,
    Npc,
    Other,
}

/// One side's participant in a battle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattleActor {
    // Unique per battle. Winners in a victory notification are named by this id.
    pub actor_id: Uuid,
    pub kind: ActorKind,

    // Set for human players only.
    #[serde(default)]
    pub player_id: Option<PlayerId>,

    // The actor's team; the first entry is the creature currently on the field.
    pub team: Vec<PokemonInst>,
}

impl BattleActor {
    pub fn new(kind: ActorKind, player_id: Option<PlayerId>, team: Vec<PokemonInst>) -> Self {
        Self {
            actor_id: Uuid::new_v4(),
            kind,
            player_id,
            team,
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == ActorKind::Player
    }

    /// Get the creature currently on the field
    pub fn active_pokemon(&self) -> Option<&PokemonInst> {
        self.team.first()
    }

    /// True while at least one team member can still battle
    pub fn has_conscious_pokemon(&self) -> bool {
        self.team.iter().any(|pokemon| !pokemon.is_fainted())
    }

    /// Mark a team member as fainted. Returns false if the creature is not on this team.
    pub fn mark_fainted(&mut self, creature_id: Uuid) -> bool {
        match self.team.iter_mut().find(|p| p.uuid == creature_id) {
            Some(pokemon) => {
                pokemon.current_hp = 0;
                true
            }
            None => false,
        }
    }
}

/// Block coordinates of a player in the world.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

/// A player as currently seen by the host: name, world partition and position.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub dimension: String,
    #[serde(default)]
    pub position: BlockPos,
}

impl PlayerInfo {
    pub fn new(id: PlayerId, name: &str, dimension: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            dimension: dimension.to_string(),
            position: BlockPos::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conscious_pokemon_tracking() {
        let first = PokemonInst::new("bulbasaur", 12);
        let second = PokemonInst::new("pidgey", 8);
        let second_id = second.uuid;
        let first_id = first.uuid;
        let mut actor = BattleActor::new(ActorKind::Player, Some(Uuid::new_v4()), vec![first, second]);

        assert!(actor.has_conscious_pokemon());
        assert!(actor.mark_fainted(first_id));
        assert!(actor.has_conscious_pokemon());
        assert!(actor.mark_fainted(second_id));
        assert!(!actor.has_conscious_pokemon());
        assert!(!actor.mark_fainted(Uuid::new_v4()));
    }

    #[test]
    fn test_block_pos_display() {
        let pos = BlockPos { x: -12, y: 64, z: 300 };
        assert_eq!(pos.to_string(), "-12,64,300");
    }
}
