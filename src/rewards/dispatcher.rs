use crate::clock::epoch_millis;
use crate::errors::{DispatchError, DispatchResult};
use crate::host::RewardHost;
use crate::player::PlayerInfo;
use crate::rewards::cooldown::CooldownTracker;
use crate::rewards::items::{pick_weighted, ItemStack};
use crate::rewards::placeholders::Placeholders;
use crate::rewards::selector::SelectedReward;
use crate::rewards::RewardContext;
use rand::Rng;
use schema::{InventoryFullBehavior, Reward, RewardKind};
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_COOLDOWN_MESSAGE: &str = "Wait %time% seconds before receiving this reward again.";

/// Grants selected rewards through the host, enforcing per-player cooldowns.
pub struct RewardDispatcher {
    host: Arc<dyn RewardHost>,
    cooldowns: CooldownTracker,
}

impl RewardDispatcher {
    pub fn new(host: Arc<dyn RewardHost>) -> Self {
        Self {
            host,
            cooldowns: CooldownTracker::new(),
        }
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    /// Grant one reward now. Returns true when the effect was applied.
    pub fn dispatch(
        &self,
        player: &PlayerInfo,
        selected: SelectedReward<'_>,
        context: &RewardContext,
        inventory_full: InventoryFullBehavior,
    ) -> bool {
        self.dispatch_at(
            player,
            selected,
            context,
            inventory_full,
            epoch_millis(),
            &mut rand::rng(),
        )
    }

    /// Grant one reward at an explicit time with an explicit random source.
    ///
    /// A reward still cooling down only produces the cooldown message. The
    /// cooldown slot is claimed before the effect runs, so concurrent
    /// resolutions for the same player grant it at most once. Any failure is
    /// logged, hands the slot back and is reported as false.
    pub fn dispatch_at<R: Rng + ?Sized>(
        &self,
        player: &PlayerInfo,
        selected: SelectedReward<'_>,
        context: &RewardContext,
        inventory_full: InventoryFullBehavior,
        now_ms: u64,
        rng: &mut R,
    ) -> bool {
        let reward = selected.reward;

        let reservation = match self.cooldowns.try_reserve(
            player.id,
            context.trigger,
            selected.id,
            reward.cooldown,
            now_ms,
        ) {
            Ok(reservation) => reservation,
            Err(remaining_ms) => {
                self.notify_cooldown(player, selected, context, remaining_ms);
                return false;
            }
        };

        let outcome = match reward.kind {
            RewardKind::Item => self.give_item(player, reward, inventory_full, rng),
            RewardKind::Command => self.run_command(player, reward, context),
            RewardKind::Unknown => Err(DispatchError::UnknownKind),
        };

        match outcome {
            Ok(item_count) => {
                if !reward.message.is_empty() {
                    let placeholders = Placeholders {
                        player,
                        context,
                        chance: reward.chance,
                        item_count,
                    };
                    self.host
                        .send_message(player, &placeholders.apply(&reward.message));
                }
                info!(
                    "Granted '{}' to {} for {}",
                    selected.id, player.name, context.trigger
                );
                true
            }
            Err(err) => {
                self.cooldowns.release(reservation);
                warn!(
                    "Failed to grant '{}' to {}: {}",
                    selected.id, player.name, err
                );
                false
            }
        }
    }

    fn notify_cooldown(
        &self,
        player: &PlayerInfo,
        selected: SelectedReward<'_>,
        context: &RewardContext,
        remaining_ms: u64,
    ) {
        let reward = selected.reward;
        let placeholders = Placeholders {
            player,
            context,
            chance: reward.chance,
            item_count: 0,
        };
        let template = if reward.cooldown_message.is_empty() {
            DEFAULT_COOLDOWN_MESSAGE
        } else {
            reward.cooldown_message.as_str()
        };
        let remaining_secs = remaining_ms.div_ceil(1000);
        debug!(
            "Reward '{}' on cooldown for {} ({}s left)",
            selected.id, player.name, remaining_secs
        );
        self.host.send_message(
            player,
            &placeholders.apply_with_time(template, remaining_secs),
        );
    }

    /// Deliver a weighted-random payload variant. Returns the stack size.
    fn give_item<R: Rng + ?Sized>(
        &self,
        player: &PlayerInfo,
        reward: &Reward,
        inventory_full: InventoryFullBehavior,
        rng: &mut R,
    ) -> DispatchResult<u32> {
        let variant = pick_weighted(&reward.item_stack, rng).ok_or(DispatchError::NoItemVariants)?;
        let stack = ItemStack::parse(&variant.value)?;

        if self.host.insert_item(player, &stack) {
            return Ok(stack.count);
        }

        match inventory_full {
            InventoryFullBehavior::Drop => {
                debug!("Inventory of {} is full, dropping {}", player.name, stack.id);
                self.host.drop_item(player, &stack);
                Ok(stack.count)
            }
            InventoryFullBehavior::Skip => Err(DispatchError::InventoryFull),
        }
    }

    fn run_command(
        &self,
        player: &PlayerInfo,
        reward: &Reward,
        context: &RewardContext,
    ) -> DispatchResult<u32> {
        if reward.command.trim().is_empty() {
            return Err(DispatchError::EmptyCommand);
        }

        let placeholders = Placeholders {
            player,
            context,
            chance: reward.chance,
            item_count: 0,
        };
        let command = placeholders.apply(&reward.command);
        self.host
            .execute_command(&command)
            .map_err(|reason| DispatchError::CommandFailed {
                command: command.clone(),
                reason,
            })?;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostAction, RecordingHost};
    use crate::player::PlayerId;
    use crate::pokemon::PokemonInst;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use schema::{BattleType, Trigger, WeightedItem};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;
    use uuid::Uuid;

    struct Fixture {
        host: Arc<RecordingHost>,
        dispatcher: RewardDispatcher,
        player: PlayerInfo,
        context: RewardContext,
        rng: StdRng,
    }

    fn fixture() -> Fixture {
        let host = Arc::new(RecordingHost::new());
        let player = PlayerInfo::new(Uuid::new_v4(), "Leaf", "minecraft:overworld");
        host.add_player(player.clone());
        let context = RewardContext::new(None, player.id, Trigger::BattleWon, BattleType::Wild)
            .with_opponent(Some(PokemonInst::new("geodude", 45)));
        Fixture {
            dispatcher: RewardDispatcher::new(host.clone()),
            host,
            player,
            context,
            rng: StdRng::seed_from_u64(5),
        }
    }

    fn command_reward(cooldown: u64) -> Reward {
        Reward {
            message: "Enjoy, %player%!".to_string(),
            command: "eco deposit 25 dollars %player%".to_string(),
            cooldown,
            ..Reward::default()
        }
    }

    fn item_reward(payload: &str) -> Reward {
        Reward {
            kind: RewardKind::Item,
            message: "Got %rewardItemCount% from %pokemon%".to_string(),
            item_stack: vec![WeightedItem {
                value: payload.to_string(),
                weight: 1,
            }],
            ..Reward::default()
        }
    }

    fn last_won(f: &Fixture, id: &str) -> Option<u64> {
        f.dispatcher
            .cooldowns()
            .last_granted(f.player.id, Trigger::BattleWon, id)
    }

    fn selected<'a>(id: &'a str, reward: &'a Reward) -> SelectedReward<'a> {
        SelectedReward { id, reward }
    }

    #[test]
    fn test_command_reward_runs_and_messages() {
        let mut f = fixture();
        let reward = command_reward(0);

        let granted = f.dispatcher.dispatch_at(
            &f.player,
            selected("cash", &reward),
            &f.context,
            InventoryFullBehavior::Drop,
            1_000,
            &mut f.rng,
        );

        assert!(granted);
        assert_eq!(
            f.host.actions(),
            vec![
                HostAction::Command {
                    command: "eco deposit 25 dollars Leaf".to_string()
                },
                HostAction::Message {
                    player: f.player.id,
                    text: "Enjoy, Leaf!".to_string()
                },
            ]
        );
        assert_eq!(last_won(&f, "cash"), Some(1_000));
    }

    #[test]
    fn test_second_grant_inside_cooldown_fails_and_keeps_the_timer() {
        let mut f = fixture();
        let reward = command_reward(60);

        assert!(f.dispatcher.dispatch_at(
            &f.player,
            selected("cash", &reward),
            &f.context,
            InventoryFullBehavior::Drop,
            10_000,
            &mut f.rng,
        ));
        f.host.take_actions();

        assert!(!f.dispatcher.dispatch_at(
            &f.player,
            selected("cash", &reward),
            &f.context,
            InventoryFullBehavior::Drop,
            40_000,
            &mut f.rng,
        ));
        assert_eq!(
            f.host.messages_for(f.player.id),
            vec!["Wait 30 seconds before receiving this reward again.".to_string()]
        );
        assert!(f.host.commands().is_empty());
        assert_eq!(last_won(&f, "cash"), Some(10_000));

        // The original grant time still governs when the reward frees up.
        assert!(f.dispatcher.dispatch_at(
            &f.player,
            selected("cash", &reward),
            &f.context,
            InventoryFullBehavior::Drop,
            70_000,
            &mut f.rng,
        ));
    }

    #[test]
    fn test_custom_cooldown_message() {
        let mut f = fixture();
        let mut reward = command_reward(10);
        reward.cooldown_message = "%player% must wait %time%s".to_string();
        f.dispatcher.cooldowns().record(f.player.id, Trigger::BattleWon, "cash", 0);

        assert!(!f.dispatcher.dispatch_at(
            &f.player,
            selected("cash", &reward),
            &f.context,
            InventoryFullBehavior::Drop,
            2_500,
            &mut f.rng,
        ));
        assert_eq!(f.host.messages_for(f.player.id), vec!["Leaf must wait 8s".to_string()]);
    }

    #[test]
    fn test_item_reward_inserts_stack() {
        let mut f = fixture();
        let reward = item_reward(r#"{"id":"cobblemon:poke_ball","count":3}"#);

        assert!(f.dispatcher.dispatch_at(
            &f.player,
            selected("balls", &reward),
            &f.context,
            InventoryFullBehavior::Drop,
            0,
            &mut f.rng,
        ));
        let actions = f.host.actions();
        assert!(matches!(
            &actions[0],
            HostAction::ItemInserted { item, .. } if item.id == "cobblemon:poke_ball" && item.count == 3
        ));
        assert_eq!(f.host.messages_for(f.player.id), vec!["Got 3 from geodude".to_string()]);
    }

    #[test]
    fn test_full_inventory_drop_and_skip() {
        let mut f = fixture();
        f.host.set_inventory_full(f.player.id, true);
        let reward = item_reward(r#"{"id":"minecraft:diamond"}"#);

        assert!(f.dispatcher.dispatch_at(
            &f.player,
            selected("gem", &reward),
            &f.context,
            InventoryFullBehavior::Drop,
            0,
            &mut f.rng,
        ));
        assert!(matches!(&f.host.actions()[0], HostAction::ItemDropped { .. }));

        f.host.take_actions();
        assert!(!f.dispatcher.dispatch_at(
            &f.player,
            selected("other_gem", &reward),
            &f.context,
            InventoryFullBehavior::Skip,
            0,
            &mut f.rng,
        ));
        assert!(f.host.actions().is_empty());
        assert_eq!(last_won(&f, "other_gem"), None);
    }

    #[test]
    fn test_failures_record_no_cooldown() {
        let mut f = fixture();
        let malformed = item_reward("{not json");
        let blank = Reward {
            command: "   ".to_string(),
            cooldown: 60,
            ..Reward::default()
        };
        let unknown = Reward {
            kind: RewardKind::Unknown,
            cooldown: 60,
            ..Reward::default()
        };
        let no_variants = Reward {
            kind: RewardKind::Item,
            cooldown: 60,
            ..Reward::default()
        };
        let rejected = command_reward(60);
        f.host.fail_command("eco deposit 25 dollars Leaf");

        for (id, reward) in [
            ("malformed", &malformed),
            ("blank", &blank),
            ("unknown", &unknown),
            ("no_variants", &no_variants),
            ("rejected", &rejected),
        ] {
            assert!(
                !f.dispatcher.dispatch_at(
                    &f.player,
                    selected(id, reward),
                    &f.context,
                    InventoryFullBehavior::Drop,
                    0,
                    &mut f.rng,
                ),
                "{} should fail",
                id
            );
            assert_eq!(last_won(&f, id), None);
        }
        assert!(f.host.actions().is_empty());
    }

    /// Holds every command long enough for a second resolution to overlap.
    struct SlowHost {
        inner: Arc<RecordingHost>,
        delay: Duration,
    }

    impl RewardHost for SlowHost {
        fn player(&self, id: PlayerId) -> Option<PlayerInfo> {
            self.inner.player(id)
        }

        fn send_message(&self, player: &PlayerInfo, message: &str) {
            self.inner.send_message(player, message)
        }

        fn execute_command(&self, command: &str) -> Result<(), String> {
            thread::sleep(self.delay);
            self.inner.execute_command(command)
        }

        fn insert_item(&self, player: &PlayerInfo, item: &ItemStack) -> bool {
            self.inner.insert_item(player, item)
        }

        fn drop_item(&self, player: &PlayerInfo, item: &ItemStack) {
            self.inner.drop_item(player, item)
        }
    }

    #[test]
    fn test_overlapping_grants_respect_the_cooldown() {
        // Arrange
        let f = fixture();
        let dispatcher = RewardDispatcher::new(Arc::new(SlowHost {
            inner: f.host.clone(),
            delay: Duration::from_millis(100),
        }));
        let reward = command_reward(3600);
        let barrier = Barrier::new(2);

        // Act
        let results: Vec<bool> = thread::scope(|scope| {
            let handles: Vec<_> = (0..2u64)
                .map(|seed| {
                    let (dispatcher, reward, barrier, f) = (&dispatcher, &reward, &barrier, &f);
                    scope.spawn(move || {
                        let mut rng = StdRng::seed_from_u64(seed);
                        barrier.wait();
                        dispatcher.dispatch_at(
                            &f.player,
                            selected("daily", reward),
                            &f.context,
                            InventoryFullBehavior::Drop,
                            1_000,
                            &mut rng,
                        )
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        // Assert
        assert_eq!(results.iter().filter(|granted| **granted).count(), 1);
        assert_eq!(f.host.commands().len(), 1);
        assert_eq!(
            dispatcher
                .cooldowns()
                .last_granted(f.player.id, Trigger::BattleWon, "daily"),
            Some(1_000)
        );
    }

    #[test]
    fn test_failed_grant_frees_the_cooldown_for_a_retry() {
        let mut f = fixture();
        let mut reward = item_reward(r#"{"id":"minecraft:emerald"}"#);
        reward.cooldown = 60;
        f.host.set_inventory_full(f.player.id, true);

        assert!(!f.dispatcher.dispatch_at(
            &f.player,
            selected("gem", &reward),
            &f.context,
            InventoryFullBehavior::Skip,
            1_000,
            &mut f.rng,
        ));
        assert_eq!(last_won(&f, "gem"), None);

        f.host.set_inventory_full(f.player.id, false);
        assert!(f.dispatcher.dispatch_at(
            &f.player,
            selected("gem", &reward),
            &f.context,
            InventoryFullBehavior::Skip,
            2_000,
            &mut f.rng,
        ));
        assert_eq!(last_won(&f, "gem"), Some(2_000));
    }

    #[test]
    fn test_same_id_in_two_trigger_tables_keeps_separate_cooldowns() {
        let mut f = fixture();
        let reward = command_reward(3600);
        let captured = RewardContext::new(None, f.player.id, Trigger::Captured, BattleType::Wild)
            .with_opponent(Some(PokemonInst::new("geodude", 45)));

        assert!(f.dispatcher.dispatch_at(
            &f.player,
            selected("daily", &reward),
            &f.context,
            InventoryFullBehavior::Drop,
            1_000,
            &mut f.rng,
        ));
        assert!(f.dispatcher.dispatch_at(
            &f.player,
            selected("daily", &reward),
            &captured,
            InventoryFullBehavior::Drop,
            2_000,
            &mut f.rng,
        ));
        assert!(!f.dispatcher.dispatch_at(
            &f.player,
            selected("daily", &reward),
            &captured,
            InventoryFullBehavior::Drop,
            3_000,
            &mut f.rng,
        ));

        assert_eq!(f.host.commands().len(), 2);
        let cooldowns = f.dispatcher.cooldowns();
        assert_eq!(cooldowns.last_granted(f.player.id, Trigger::BattleWon, "daily"), Some(1_000));
        assert_eq!(cooldowns.last_granted(f.player.id, Trigger::Captured, "daily"), Some(2_000));
    }
}
