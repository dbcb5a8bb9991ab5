use crate::player::PlayerInfo;
use crate::rewards::RewardContext;

/// Values substituted into reward messages and commands.
pub struct Placeholders<'a> {
    pub player: &'a PlayerInfo,
    pub context: &'a RewardContext,
    pub chance: f64,
    /// Size of the delivered stack; 0 for rewards that give no item.
    pub item_count: u32,
}

impl Placeholders<'_> {
    pub fn apply(&self, template: &str) -> String {
        let opponent = self.context.opponent.as_ref();
        let species = opponent.map(|p| p.species.clone()).unwrap_or_default();
        let level = opponent.map(|p| p.level.to_string()).unwrap_or_default();

        [
            ("%player%", self.player.name.clone()),
            ("%pokemon%", species),
            ("%level%", level),
            ("%battleType%", self.context.battle_type.to_string()),
            ("%chance%", self.chance.to_string()),
            ("%coords%", self.player.position.to_string()),
            ("%trigger%", self.context.trigger.to_string()),
            ("%dimension%", self.player.dimension.clone()),
            ("%rewardItemCount%", self.item_count.to_string()),
        ]
        .into_iter()
        .fold(template.to_string(), |text, (token, value)| {
            text.replace(token, &value)
        })
    }

    /// Like [`apply`](Self::apply) with `%time%` set to the remaining cooldown.
    pub fn apply_with_time(&self, template: &str, remaining_secs: u64) -> String {
        self.apply(&template.replace("%time%", &remaining_secs.to_string()))
    }
}
