//! The boundary between the rewards engine and the game it runs inside.

use crate::player::{PlayerId, PlayerInfo};
use crate::rewards::ItemStack;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

/// Services the host game provides to the engine. Implementations must be
/// cheap to call; the engine calls them while resolving a battle.
pub trait RewardHost: Send + Sync {
    /// Look up an online player. None means rewards for them are skipped.
    fn player(&self, id: PlayerId) -> Option<PlayerInfo>;

    fn send_message(&self, player: &PlayerInfo, message: &str);

    /// Run a fully substituted command with server authority.
    fn execute_command(&self, command: &str) -> Result<(), String>;

    /// Try to place the stack in the player's inventory.
    fn insert_item(&self, player: &PlayerInfo, item: &ItemStack) -> bool;

    /// Drop the stack in the world at the player's feet.
    fn drop_item(&self, player: &PlayerInfo, item: &ItemStack);
}

/// Something the engine asked the host to do.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum HostAction {
    Message { player: PlayerId, text: String },
    Command { command: String },
    ItemInserted { player: PlayerId, item: ItemStack },
    ItemDropped { player: PlayerId, item: ItemStack },
}

#[derive(Debug, Default)]
struct RecordingState {
    players: HashMap<PlayerId, PlayerInfo>,
    full_inventories: HashSet<PlayerId>,
    failing_commands: HashSet<String>,
    actions: Vec<HostAction>,
}

/// An in-memory host that records every request. Players must be registered
/// before they can receive rewards.
#[derive(Debug, Default)]
pub struct RecordingHost {
    state: Mutex<RecordingState>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_player(&self, player: PlayerInfo) {
        self.state().players.insert(player.id, player);
    }

    pub fn remove_player(&self, id: PlayerId) {
        self.state().players.remove(&id);
    }

    pub fn set_inventory_full(&self, id: PlayerId, full: bool) {
        let mut state = self.state();
        if full {
            state.full_inventories.insert(id);
        } else {
            state.full_inventories.remove(&id);
        }
    }

    /// Make every future execution of exactly this command fail.
    pub fn fail_command(&self, command: &str) {
        self.state().failing_commands.insert(command.to_string());
    }

    pub fn actions(&self) -> Vec<HostAction> {
        self.state().actions.clone()
    }

    /// Remove and return everything recorded so far.
    pub fn take_actions(&self) -> Vec<HostAction> {
        std::mem::take(&mut self.state().actions)
    }

    pub fn messages_for(&self, id: PlayerId) -> Vec<String> {
        self.state()
            .actions
            .iter()
            .filter_map(|action| match action {
                HostAction::Message { player, text } if *player == id => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn commands(&self) -> Vec<String> {
        self.state()
            .actions
            .iter()
            .filter_map(|action| match action {
                HostAction::Command { command } => Some(command.clone()),
                _ => None,
            })
            .collect()
    }
}

impl RewardHost for RecordingHost {
    fn player(&self, id: PlayerId) -> Option<PlayerInfo> {
        self.state().players.get(&id).cloned()
    }

    fn send_message(&self, player: &PlayerInfo, message: &str) {
        self.state().actions.push(HostAction::Message {
            player: player.id,
            text: message.to_string(),
        });
    }

    fn execute_command(&self, command: &str) -> Result<(), String> {
        let mut state = self.state();
        if state.failing_commands.contains(command) {
            return Err("command rejected by host".to_string());
        }
        state.actions.push(HostAction::Command {
            command: command.to_string(),
        });
        Ok(())
    }

    fn insert_item(&self, player: &PlayerInfo, item: &ItemStack) -> bool {
        let mut state = self.state();
        if state.full_inventories.contains(&player.id) {
            return false;
        }
        state.actions.push(HostAction::ItemInserted {
            player: player.id,
            item: item.clone(),
        });
        true
    }

    fn drop_item(&self, player: &PlayerInfo, item: &ItemStack) {
        self.state().actions.push(HostAction::ItemDropped {
            player: player.id,
            item: item.clone(),
        });
    }
}
