#[cfg(test)]
mod tests {
    use crate::battle::state::BattleState;
    use crate::battle::tests::common::{
        npc_actor, player_with, wild_actor, TestPokemonBuilder,
    };
    use crate::battle::tracker::BattleTracker;
    use crate::player::{ActorKind, BattleActor};
    use proptest::prelude::*;
    use rstest::rstest;
    use schema::BattleType;
    use uuid::Uuid;

    fn other_with_npc_creature() -> BattleActor {
        BattleActor::new(
            ActorKind::Other,
            None,
            vec![TestPokemonBuilder::new("onix", 14).owned_by_npc("Brock").build()],
        )
    }

    fn other_with_wild_creature() -> BattleActor {
        BattleActor::new(
            ActorKind::Other,
            None,
            vec![TestPokemonBuilder::new("pidgey", 3).build()],
        )
    }

    #[rstest]
    #[case::player_vs_wild(vec!["player", "wild"], BattleType::Wild)]
    #[case::player_vs_npc(vec!["player", "npc"], BattleType::Npc)]
    #[case::npc_owned_creature(vec!["player", "other_npc"], BattleType::Npc)]
    #[case::unowned_other(vec!["player", "other_wild"], BattleType::Wild)]
    #[case::wild_beats_npc(vec!["player", "npc", "wild"], BattleType::Wild)]
    #[case::two_players(vec!["player", "player"], BattleType::Pvp)]
    #[case::pvp_beats_everything(vec!["player", "npc", "wild", "player"], BattleType::Pvp)]
    #[case::nobody(vec![], BattleType::Wild)]
    fn test_classification_chain(#[case] sides: Vec<&str>, #[case] expected: BattleType) {
        let actors: Vec<BattleActor> = sides
            .into_iter()
            .map(|side| match side {
                "player" => player_with(Uuid::new_v4(), "charmander", 10),
                "wild" => wild_actor(TestPokemonBuilder::new("rattata", 3).build()),
                "npc" => npc_actor("Misty", &["staryu"]),
                "other_npc" => other_with_npc_creature(),
                "other_wild" => other_with_wild_creature(),
                other => panic!("unknown side {}", other),
            })
            .collect();

        assert_eq!(BattleState::classify(&actors), expected);
    }

    #[test]
    fn test_reclassification_is_monotonic() {
        let tracker = BattleTracker::new();
        let battle_id = Uuid::new_v4();
        let trainer = BattleActor::new(
            ActorKind::Other,
            None,
            vec![
                TestPokemonBuilder::new("sandshrew", 12).build(),
                TestPokemonBuilder::new("onix", 14).owned_by_npc("Brock").build(),
            ],
        );
        let onix = trainer.team[1].clone();
        let sandshrew = trainer.team[0].clone();

        tracker.on_battle_start(battle_id, vec![player_with(Uuid::new_v4(), "squirtle", 12), trainer]);
        assert_eq!(tracker.battle(battle_id).unwrap().battle_type, BattleType::Wild);

        assert!(tracker.on_creature_sent_out(onix));
        assert_eq!(tracker.battle(battle_id).unwrap().battle_type, BattleType::Npc);

        // An unowned creature coming back does not downgrade.
        assert!(tracker.on_creature_sent_out(sandshrew));
        assert_eq!(tracker.battle(battle_id).unwrap().battle_type, BattleType::Npc);
    }

    fn any_side() -> impl Strategy<Value = u8> {
        0u8..4
    }

    proptest! {
        #[test]
        fn prop_two_players_always_pvp(
            extra_sides in prop::collection::vec(any_side(), 0..6),
            player_slots in (0usize..8, 0usize..8),
        ) {
            let mut actors: Vec<BattleActor> = extra_sides
                .iter()
                .map(|side| match side {
                    0 => wild_actor(TestPokemonBuilder::new("weedle", 2).build()),
                    1 => npc_actor("Giovanni", &["persian"]),
                    2 => other_with_npc_creature(),
                    _ => other_with_wild_creature(),
                })
                .collect();
            let first = player_slots.0.min(actors.len());
            actors.insert(first, player_with(Uuid::new_v4(), "bulbasaur", 5));
            let second = player_slots.1.min(actors.len());
            actors.insert(second, player_with(Uuid::new_v4(), "charmander", 5));

            prop_assert_eq!(BattleState::classify(&actors), BattleType::Pvp);
        }
    }
}
