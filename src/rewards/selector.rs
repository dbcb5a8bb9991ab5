use crate::rewards::conditions::conditions_match;
use crate::rewards::RewardContext;
use rand::Rng;
use schema::{Reward, RewardsConfig};
use std::collections::HashSet;
use tracing::debug;

/// A rule picked for granting, borrowed from the active rule set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedReward<'c> {
    pub id: &'c str,
    pub reward: &'c Reward,
}

/// Rules for the context's trigger that pass every static filter: dimension,
/// battle type, opponent conditions and level window. Sorted by `order`
/// ascending, ties in reward id order.
pub fn eligible_rewards<'c>(
    config: &'c RewardsConfig,
    context: &RewardContext,
    dimension: &str,
) -> Vec<SelectedReward<'c>> {
    let level = context.opponent_level();
    let mut eligible: Vec<SelectedReward<'c>> = config
        .rewards_for(context.trigger)
        .iter()
        .filter(|(id, reward)| {
            let passes = reward.allowed_in(dimension)
                && reward.battle_types.contains(&context.battle_type)
                && conditions_match(
                    &reward.conditions,
                    reward.conditions_blacklist,
                    &context.opponent_properties,
                )
                && reward.covers_level(level);
            debug!("Reward '{}' eligible: {}", id, passes);
            passes
        })
        .map(|(id, reward)| SelectedReward {
            id: id.as_str(),
            reward,
        })
        .collect();

    // Stable sort keeps id order inside a tier.
    eligible.sort_by_key(|selected| selected.reward.order);
    eligible
}

/// Pick the rewards to grant for one resolution pass.
///
/// Tiers are walked lowest `order` first. Every candidate that is not
/// excluded by an already selected reward rolls against its chance; a
/// winner's `excludes` take effect immediately for everything after it,
/// including later members of its own tier. Zero, one or many rewards may be
/// returned.
pub fn select_rewards<'c, R: Rng + ?Sized>(
    config: &'c RewardsConfig,
    context: &RewardContext,
    dimension: &str,
    rng: &mut R,
) -> Vec<SelectedReward<'c>> {
    let mut excluded: HashSet<&'c str> = HashSet::new();
    let mut selected = Vec::new();

    for candidate in eligible_rewards(config, context, dimension) {
        if excluded.contains(candidate.id) {
            debug!("Reward '{}' skipped: excluded by an earlier reward", candidate.id);
            continue;
        }

        let draw: f64 = rng.random_range(0.0..100.0);
        if draw < candidate.reward.chance {
            debug!(
                "Reward '{}' selected (tier {}, rolled {:.2} < {})",
                candidate.id, candidate.reward.order, draw, candidate.reward.chance
            );
            excluded.extend(candidate.reward.excludes.iter().map(String::as_str));
            selected.push(candidate);
        } else {
            debug!(
                "Reward '{}' missed its roll ({:.2} >= {})",
                candidate.id, draw, candidate.reward.chance
            );
        }
    }

    selected
}
