use crate::player::PlayerId;
use dashmap::DashMap;
use schema::Trigger;
use std::collections::HashMap;

/// Reward ids are only unique within one trigger's table.
type RewardKey = (Trigger, String);

/// Last-granted timestamps per player and reward.
///
/// Each player's map lives behind its own shard entry, so players never
/// contend with each other. Entries are never evicted.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    entries: DashMap<PlayerId, HashMap<RewardKey, u64>>,
}

/// A grant slot claimed by [`CooldownTracker::try_reserve`].
///
/// The reservation timestamp is already stored, so a successful grant needs
/// nothing further. A failed grant hands it back to [`CooldownTracker::release`].
#[derive(Debug)]
#[must_use]
pub struct Reservation {
    player: PlayerId,
    key: RewardKey,
    reserved_at: u64,
    previous: Option<u64>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_granted(&self, player: PlayerId, trigger: Trigger, reward_id: &str) -> Option<u64> {
        self.entries
            .get(&player)
            .and_then(|rewards| rewards.get(&(trigger, reward_id.to_string())).copied())
    }

    /// Milliseconds left before the reward may be granted to `player` again,
    /// or None when it is not cooling down.
    pub fn remaining_ms(
        &self,
        player: PlayerId,
        trigger: Trigger,
        reward_id: &str,
        cooldown_secs: u64,
        now_ms: u64,
    ) -> Option<u64> {
        let last = self.last_granted(player, trigger, reward_id)?;
        remaining(last, cooldown_secs, now_ms)
    }

    pub fn record(&self, player: PlayerId, trigger: Trigger, reward_id: &str, now_ms: u64) {
        self.entries
            .entry(player)
            .or_default()
            .insert((trigger, reward_id.to_string()), now_ms);
    }

    /// Check the cooldown and claim the grant slot in one step.
    ///
    /// The player's entry stays locked between the check and the write, so of
    /// two concurrent callers only one gets the reservation. The other gets
    /// the milliseconds left on the winner's window.
    pub fn try_reserve(
        &self,
        player: PlayerId,
        trigger: Trigger,
        reward_id: &str,
        cooldown_secs: u64,
        now_ms: u64,
    ) -> Result<Reservation, u64> {
        let key = (trigger, reward_id.to_string());
        let mut rewards = self.entries.entry(player).or_default();

        let previous = rewards.get(&key).copied();
        if let Some(left) = previous.and_then(|last| remaining(last, cooldown_secs, now_ms)) {
            return Err(left);
        }
        rewards.insert(key.clone(), now_ms);

        Ok(Reservation {
            player,
            key,
            reserved_at: now_ms,
            previous,
        })
    }

    /// Undo a reservation whose grant failed.
    ///
    /// The earlier timestamp comes back only if nobody re-reserved the reward
    /// in the meantime.
    pub fn release(&self, reservation: Reservation) {
        let Reservation {
            player,
            key,
            reserved_at,
            previous,
        } = reservation;

        let Some(mut rewards) = self.entries.get_mut(&player) else {
            return;
        };
        if rewards.get(&key) != Some(&reserved_at) {
            return;
        }
        match previous {
            Some(last) => {
                rewards.insert(key, last);
            }
            None => {
                rewards.remove(&key);
            }
        }
        let now_empty = rewards.is_empty();
        drop(rewards);
        if now_empty {
            self.entries.remove_if(&player, |_, rewards| rewards.is_empty());
        }
    }

    /// Number of players with at least one recorded grant.
    pub fn player_count(&self) -> usize {
        self.entries.len()
    }
}

fn remaining(last: u64, cooldown_secs: u64, now_ms: u64) -> Option<u64> {
    let window = cooldown_secs.saturating_mul(1000);
    let elapsed = now_ms.saturating_sub(last);
    (elapsed < window).then(|| window - elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use uuid::Uuid;

    const WON: Trigger = Trigger::BattleWon;

    #[test]
    fn test_unrecorded_reward_is_ready() {
        let cooldowns = CooldownTracker::new();
        assert_eq!(cooldowns.remaining_ms(Uuid::new_v4(), WON, "potion", 300, 1_000), None);
    }

    #[test]
    fn test_remaining_time_counts_down() {
        let cooldowns = CooldownTracker::new();
        let player = Uuid::new_v4();
        cooldowns.record(player, WON, "potion", 10_000);

        assert_eq!(cooldowns.remaining_ms(player, WON, "potion", 60, 10_000), Some(60_000));
        assert_eq!(cooldowns.remaining_ms(player, WON, "potion", 60, 40_000), Some(30_000));
        assert_eq!(cooldowns.remaining_ms(player, WON, "potion", 60, 70_000), None);
    }

    #[test]
    fn test_zero_cooldown_never_blocks() {
        let cooldowns = CooldownTracker::new();
        let player = Uuid::new_v4();
        cooldowns.record(player, WON, "coins", 5_000);
        assert_eq!(cooldowns.remaining_ms(player, WON, "coins", 0, 5_000), None);
        assert!(cooldowns.try_reserve(player, WON, "coins", 0, 5_000).is_ok());
    }

    #[test]
    fn test_scoped_per_player_and_reward() {
        let cooldowns = CooldownTracker::new();
        let ash = Uuid::new_v4();
        let gary = Uuid::new_v4();
        cooldowns.record(ash, WON, "potion", 1_000);

        assert!(cooldowns.remaining_ms(ash, WON, "potion", 60, 2_000).is_some());
        assert!(cooldowns.remaining_ms(ash, WON, "ball", 60, 2_000).is_none());
        assert!(cooldowns.remaining_ms(gary, WON, "potion", 60, 2_000).is_none());
        assert_eq!(cooldowns.player_count(), 1);
    }

    #[test]
    fn test_same_id_under_different_triggers_is_independent() {
        let cooldowns = CooldownTracker::new();
        let player = Uuid::new_v4();
        cooldowns.record(player, WON, "daily", 1_000);

        assert!(cooldowns.remaining_ms(player, WON, "daily", 3600, 2_000).is_some());
        assert_eq!(cooldowns.remaining_ms(player, Trigger::Captured, "daily", 3600, 2_000), None);
        assert!(cooldowns
            .try_reserve(player, Trigger::Captured, "daily", 3600, 2_000)
            .is_ok());
        assert_eq!(cooldowns.last_granted(player, WON, "daily"), Some(1_000));
    }

    #[test]
    fn test_reservation_blocks_until_released() {
        let cooldowns = CooldownTracker::new();
        let player = Uuid::new_v4();

        let reservation = cooldowns.try_reserve(player, WON, "daily", 60, 1_000);
        assert!(reservation.is_ok());
        assert_eq!(cooldowns.try_reserve(player, WON, "daily", 60, 1_500).err(), Some(59_500));

        if let Ok(reservation) = reservation {
            cooldowns.release(reservation);
        }
        assert_eq!(cooldowns.last_granted(player, WON, "daily"), None);
        assert_eq!(cooldowns.player_count(), 0);
    }

    #[test]
    fn test_release_restores_the_expired_timestamp() {
        let cooldowns = CooldownTracker::new();
        let player = Uuid::new_v4();
        cooldowns.record(player, WON, "daily", 0);

        let reservation = cooldowns.try_reserve(player, WON, "daily", 10, 20_000);
        assert_eq!(cooldowns.last_granted(player, WON, "daily"), Some(20_000));
        if let Ok(reservation) = reservation {
            cooldowns.release(reservation);
        }
        assert_eq!(cooldowns.last_granted(player, WON, "daily"), Some(0));
    }

    #[test]
    fn test_stale_release_keeps_a_newer_reservation() {
        let cooldowns = CooldownTracker::new();
        let player = Uuid::new_v4();

        let first = cooldowns.try_reserve(player, WON, "coins", 0, 1_000);
        let second = cooldowns.try_reserve(player, WON, "coins", 0, 2_000);
        assert!(second.is_ok());
        if let Ok(first) = first {
            cooldowns.release(first);
        }
        assert_eq!(cooldowns.last_granted(player, WON, "coins"), Some(2_000));
    }

    #[test]
    fn test_concurrent_reservations_admit_one() {
        let cooldowns = Arc::new(CooldownTracker::new());
        let player = Uuid::new_v4();
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cooldowns = cooldowns.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    cooldowns.try_reserve(player, WON, "daily", 3600, 1_000).is_ok()
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 1);
    }
}
