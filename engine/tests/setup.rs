use std::collections::HashSet;

use proptest::prelude::*;
use scenario_engine::game::{Character, Game};
use scenario_engine::ports::EditionRepository;
use scenario_engine::model::{
    CharacterData, EditionData, EntityValue, LootDeckConfig, LootType, MonsterData, MonsterType,
    ObjectiveDefinition, RoomDefinition, ScenarioDefinition, StandeePlacement,
};
use scenario_engine::{Catalogue, ScenarioContext, ScenarioManager, Settings, StandeeDice};

const ED: &str = "gh";
const HEROES: [&str; 4] = ["brute", "tinkerer", "spellweaver", "cragheart"];

fn monster(name: &str, count: u32, boss: bool) -> MonsterData {
    MonsterData {
        name: name.into(),
        edition: ED.into(),
        count,
        boss,
    }
}

fn default_monsters() -> Vec<MonsterData> {
    vec![
        monster("guard", 6, false),
        monster("archer", 6, false),
        monster("hound", 2, false),
        monster("captain", 1, true),
    ]
}

fn place(name: &str, kind: Option<MonsterType>) -> StandeePlacement {
    StandeePlacement {
        name: name.into(),
        kind,
        player2: None,
        player3: None,
        player4: None,
    }
}

fn by_players(
    name: &str,
    player2: Option<MonsterType>,
    player3: Option<MonsterType>,
    player4: Option<MonsterType>,
) -> StandeePlacement {
    StandeePlacement {
        name: name.into(),
        kind: None,
        player2,
        player3,
        player4,
    }
}

fn room(room_number: u32, initial: bool, monsters: Vec<StandeePlacement>) -> RoomDefinition {
    RoomDefinition {
        room_number,
        initial,
        monsters,
    }
}

fn scenario(index: &str, rooms: Vec<RoomDefinition>) -> ScenarioDefinition {
    ScenarioDefinition {
        index: index.into(),
        name: format!("Test {}", index),
        edition: ED.into(),
        rooms,
        ..Default::default()
    }
}

fn catalogue_with(monsters: Vec<MonsterData>, scenarios: Vec<ScenarioDefinition>) -> Catalogue {
    Catalogue::new([EditionData {
        edition: ED.into(),
        scenarios,
        sections: vec![],
        monsters,
        characters: HEROES
            .iter()
            .map(|name| CharacterData {
                name: name.to_string(),
                edition: ED.into(),
            })
            .collect(),
    }])
}

fn party_of(players: usize) -> Game {
    Game {
        level: 1,
        characters: HEROES[..players]
            .iter()
            .map(|name| {
                Character::new(
                    &CharacterData {
                        name: name.to_string(),
                        edition: ED.into(),
                    },
                    1,
                )
            })
            .collect(),
        ..Default::default()
    }
}

fn standees(game: &Game, name: &str) -> Vec<(i32, MonsterType)> {
    game.monster(name)
        .map(|group| {
            group
                .entities
                .iter()
                .map(|entity| (entity.number, entity.kind))
                .collect()
        })
        .unwrap_or_default()
}

/// Select `definition` (which must be in `catalogue`) on a party of `players`.
fn run(
    catalogue: &Catalogue,
    settings: &Settings,
    dice: StandeeDice,
    definition: &ScenarioDefinition,
    players: usize,
) -> Game {
    let mut manager = ScenarioManager::with_dice(ScenarioContext::standard(catalogue, settings), dice);
    let mut game = party_of(players);
    manager.select(&mut game, definition).unwrap();
    game
}

fn settings() -> Settings {
    Settings::default().with_editions([ED])
}

#[test]
fn without_room_setup_every_listed_monster_is_added_up_front() {
    let mut def = scenario("1", vec![room(1, true, vec![place("guard", Some(MonsterType::Elite))])]);
    def.monsters = vec!["archer".into(), "hound".into()];
    def.allies = vec!["hound".into()];
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);
    let settings = Settings {
        scenario_rooms: false,
        ..settings()
    };

    let game = run(&catalogue, &settings, StandeeDice::from_seed(1), &def, 2);

    let names: Vec<&str> = game.monsters.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["archer", "hound"]);
    assert!(game.monster("hound").unwrap().is_ally);
    assert!(!game.monster("archer").unwrap().is_ally);
    assert!(game.monsters.iter().all(|g| g.entities.is_empty()));
    assert!(game.scenario.as_ref().unwrap().revealed_rooms.is_empty());
}

#[test]
fn disabled_standees_also_skip_rooms() {
    let mut def = scenario("1", vec![room(1, true, vec![place("guard", Some(MonsterType::Normal))])]);
    def.monsters = vec!["guard".into()];
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);
    let settings = Settings {
        disable_standees: true,
        ..settings()
    };

    let game = run(&catalogue, &settings, StandeeDice::from_seed(1), &def, 2);

    assert!(standees(&game, "guard").is_empty());
    assert!(game.monster("guard").is_some());
}

#[test]
fn scenario_without_rooms_adds_monsters_directly() {
    let mut def = scenario("1", vec![]);
    def.monsters = vec!["guard".into()];
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);

    let game = run(&catalogue, &settings(), StandeeDice::from_seed(1), &def, 2);

    assert_eq!(game.monsters.len(), 1);
    assert!(standees(&game, "guard").is_empty());
}

#[test]
fn only_initial_rooms_open_at_setup() {
    let def = scenario(
        "1",
        vec![
            room(1, true, vec![place("guard", Some(MonsterType::Normal))]),
            room(2, false, vec![place("archer", Some(MonsterType::Elite))]),
        ],
    );
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);

    let game = run(&catalogue, &settings(), StandeeDice::from_seed(1), &def, 2);

    assert_eq!(standees(&game, "guard"), vec![(-1, MonsterType::Normal)]);
    assert!(game.monster("archer").is_none());
    assert_eq!(game.scenario.as_ref().unwrap().revealed_rooms, vec![1]);
}

#[test]
fn type_follows_present_player_count() {
    let def = scenario(
        "1",
        vec![room(
            1,
            true,
            vec![by_players(
                "guard",
                Some(MonsterType::Normal),
                Some(MonsterType::Elite),
                None,
            )],
        )],
    );
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);

    for (players, expected) in [
        (1, vec![(-1, MonsterType::Normal)]),
        (2, vec![(-1, MonsterType::Normal)]),
        (3, vec![(-1, MonsterType::Elite)]),
        (4, vec![]),
    ] {
        let game = run(&catalogue, &settings(), StandeeDice::from_seed(1), &def, players);
        assert_eq!(standees(&game, "guard"), expected, "{} players", players);
    }
}

#[test]
fn absent_characters_do_not_count_towards_player_count() {
    let def = scenario(
        "1",
        vec![room(
            1,
            true,
            vec![by_players(
                "guard",
                Some(MonsterType::Normal),
                Some(MonsterType::Elite),
                Some(MonsterType::Elite),
            )],
        )],
    );
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);
    let settings = settings();
    let mut manager = ScenarioManager::with_dice(
        ScenarioContext::standard(&catalogue, &settings),
        StandeeDice::from_seed(1),
    );
    let mut game = party_of(4);
    game.characters[2].absent = true;
    game.characters[3].absent = true;

    manager.select(&mut game, &def).unwrap();

    assert_eq!(standees(&game, "guard"), vec![(-1, MonsterType::Normal)]);
}

#[test]
fn explicit_type_wins_over_player_table() {
    let mut placement = by_players("guard", Some(MonsterType::Normal), None, None);
    placement.kind = Some(MonsterType::Elite);
    let def = scenario("1", vec![room(1, true, vec![placement])]);
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);

    let game = run(&catalogue, &settings(), StandeeDice::from_seed(1), &def, 2);

    assert_eq!(standees(&game, "guard"), vec![(-1, MonsterType::Elite)]);
}

#[test]
fn boss_monsters_always_place_as_boss() {
    let def = scenario("1", vec![room(1, true, vec![place("captain", Some(MonsterType::Normal))])]);
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);

    let game = run(&catalogue, &settings(), StandeeDice::from_seed(1), &def, 2);

    assert_eq!(standees(&game, "captain"), vec![(-1, MonsterType::Boss)]);
}

#[test]
fn sequential_numbers_count_down() {
    let def = scenario(
        "1",
        vec![room(
            1,
            true,
            vec![
                place("guard", Some(MonsterType::Normal)),
                place("guard", Some(MonsterType::Elite)),
                place("guard", Some(MonsterType::Normal)),
            ],
        )],
    );
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);

    let game = run(&catalogue, &settings(), StandeeDice::from_seed(1), &def, 2);

    assert_eq!(
        standees(&game, "guard"),
        vec![
            (-1, MonsterType::Normal),
            (-2, MonsterType::Elite),
            (-3, MonsterType::Normal),
        ]
    );
}

#[test]
fn manual_standees_only_register_the_group() {
    let def = scenario("1", vec![room(1, true, vec![place("guard", Some(MonsterType::Normal))])]);
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);
    let settings = Settings {
        automatic_standees: false,
        ..settings()
    };

    let game = run(&catalogue, &settings, StandeeDice::from_seed(1), &def, 2);

    assert!(game.monster("guard").is_some());
    assert!(standees(&game, "guard").is_empty());
}

#[test]
fn random_numbers_are_redrawn_on_collision() {
    let def = scenario(
        "1",
        vec![room(
            1,
            true,
            vec![
                place("guard", Some(MonsterType::Normal)),
                place("guard", Some(MonsterType::Normal)),
                place("guard", Some(MonsterType::Elite)),
            ],
        )],
    );
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);
    let settings = Settings {
        random_standees: true,
        ..settings()
    };

    let game = run(
        &catalogue,
        &settings,
        StandeeDice::from_scripted(vec![4, 4, 2, 4, 2, 5]),
        &def,
        2,
    );

    assert_eq!(
        standees(&game, "guard"),
        vec![
            (4, MonsterType::Normal),
            (2, MonsterType::Normal),
            (5, MonsterType::Elite),
        ]
    );
}

#[test]
fn reopening_a_room_respects_capacity() {
    let def = scenario(
        "1",
        vec![room(
            1,
            true,
            vec![
                place("hound", Some(MonsterType::Normal)),
                place("hound", Some(MonsterType::Normal)),
            ],
        )],
    );
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);
    let settings = settings();
    let mut manager = ScenarioManager::with_dice(
        ScenarioContext::standard(&catalogue, &settings),
        StandeeDice::from_seed(3),
    );
    let mut game = party_of(2);

    manager.select(&mut game, &def).unwrap();
    let edition = catalogue.edition(ED).unwrap();
    manager.open_door(&mut game, &def.rooms[0], edition, &def);

    assert_eq!(standees(&game, "hound").len(), 2);
    assert_eq!(game.scenario.as_ref().unwrap().revealed_rooms, vec![1, 1]);
}

#[test]
fn reopening_a_revealed_room_places_nothing() {
    let def = scenario(
        "1",
        vec![
            room(1, true, vec![]),
            room(2, false, vec![place("guard", Some(MonsterType::Elite))]),
        ],
    );
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);
    let settings = settings();
    let mut manager = ScenarioManager::with_dice(
        ScenarioContext::standard(&catalogue, &settings),
        StandeeDice::from_seed(3),
    );
    let mut game = party_of(2);
    manager.select(&mut game, &def).unwrap();

    manager.open_room(&mut game, 2).unwrap();
    manager.open_room(&mut game, 2).unwrap();

    assert_eq!(standees(&game, "guard"), vec![(-1, MonsterType::Elite)]);
    assert_eq!(game.scenario.as_ref().unwrap().revealed_rooms, vec![1, 2, 2]);
}

#[test]
fn no_random_number_left_skips_placement() {
    let def = scenario(
        "1",
        vec![
            room(1, true, vec![place("captain", Some(MonsterType::Normal))]),
            room(2, false, vec![place("captain", Some(MonsterType::Normal))]),
        ],
    );
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);
    let settings = Settings {
        random_standees: true,
        ..settings()
    };
    let mut manager = ScenarioManager::with_dice(
        ScenarioContext::standard(&catalogue, &settings),
        StandeeDice::from_scripted(vec![1]),
    );
    let mut game = party_of(2);
    manager.select(&mut game, &def).unwrap();
    game.monsters[0].entities[0].dead = true;

    manager.open_room(&mut game, 2).unwrap();

    assert_eq!(standees(&game, "captain"), vec![(1, MonsterType::Boss)]);
}

#[test]
fn opening_unknown_room_is_reported() {
    let def = scenario("1", vec![room(1, true, vec![])]);
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);
    let settings = settings();
    let mut manager = ScenarioManager::with_dice(
        ScenarioContext::standard(&catalogue, &settings),
        StandeeDice::from_seed(3),
    );
    let mut game = party_of(2);
    manager.select(&mut game, &def).unwrap();

    let err = manager.open_room(&mut game, 9).unwrap_err();

    assert_eq!(err, scenario_engine::ScenarioError::RoomNotFound { room: 9 });
    assert_eq!(game.scenario.as_ref().unwrap().revealed_rooms, vec![1]);
}

#[test]
fn solo_scenario_locks_out_other_characters() {
    let mut def = scenario("1", vec![]);
    def.solo = Some("tinkerer".into());
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);

    let game = run(&catalogue, &settings(), StandeeDice::from_seed(1), &def, 3);

    let absent: Vec<(&str, bool)> = game
        .characters
        .iter()
        .map(|c| (c.name.as_str(), c.absent))
        .collect();
    assert_eq!(
        absent,
        vec![("brute", true), ("tinkerer", false), ("spellweaver", true)]
    );
}

#[test]
fn missing_solo_character_is_added_at_level_one() {
    let mut def = scenario("1", vec![]);
    def.solo = Some("cragheart".into());
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);

    let game = run(&catalogue, &settings(), StandeeDice::from_seed(1), &def, 2);

    assert_eq!(game.characters.len(), 3);
    let added = &game.characters[2];
    assert_eq!((added.name.as_str(), added.level, added.absent), ("cragheart", 1, false));
    assert_eq!(game.present_character_count(), 1);
}

#[test]
fn unknown_solo_character_is_not_fatal() {
    let mut def = scenario("1", vec![room(1, true, vec![place("guard", Some(MonsterType::Normal))])]);
    def.solo = Some("nobody".into());
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);

    let game = run(&catalogue, &settings(), StandeeDice::from_seed(1), &def, 2);

    assert_eq!(game.characters.len(), 2);
    assert!(game.characters.iter().all(|c| c.absent));
    assert_eq!(standees(&game, "guard").len(), 1);
}

#[test]
fn objectives_are_numbered_when_several() {
    let mut def = scenario("1", vec![]);
    def.objectives = vec![
        ObjectiveDefinition {
            name: "Crate".into(),
            count: EntityValue::Number(3),
            health: EntityValue::Expression("3+L".into()),
            escort: false,
        },
        ObjectiveDefinition {
            name: "Villager".into(),
            count: EntityValue::Number(1),
            health: EntityValue::Number(4),
            escort: true,
        },
    ];
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);

    let game = run(&catalogue, &settings(), StandeeDice::from_seed(1), &def, 2);

    let names: Vec<(&str, Option<&str>)> = game
        .objectives
        .iter()
        .map(|o| (o.name.as_str(), o.display_name.as_deref()))
        .collect();
    assert_eq!(
        names,
        vec![
            ("Crate", Some("Crate 1")),
            ("Crate", Some("Crate 2")),
            ("Crate", Some("Crate 3")),
            ("Villager", None),
        ]
    );
    assert_eq!(game.objectives[0].max_health, 4);
    assert!(game.objectives[3].escort);
}

#[test]
fn objective_count_can_depend_on_characters() {
    let mut def = scenario("1", vec![]);
    def.objectives = vec![ObjectiveDefinition {
        name: "Altar".into(),
        count: EntityValue::Expression("C".into()),
        health: EntityValue::default(),
        escort: false,
    }];
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);

    let game = run(&catalogue, &settings(), StandeeDice::from_seed(1), &def, 3);

    assert_eq!(game.objectives.len(), 3);
    assert_eq!(game.objectives[2].display_name.as_deref(), Some("Altar 3"));
}

#[test]
fn huge_objective_count_is_capped() {
    let mut def = scenario("1", vec![]);
    def.objectives = vec![ObjectiveDefinition {
        name: "Crate".into(),
        count: EntityValue::Expression("999999999".into()),
        health: EntityValue::Number(2),
        escort: false,
    }];
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);

    let game = run(&catalogue, &settings(), StandeeDice::from_seed(1), &def, 2);

    let cap = scenario_engine::setup::MAX_OBJECTIVE_COPIES as usize;
    assert_eq!(game.objectives.len(), cap);
    assert_eq!(
        game.objectives[cap - 1].display_name.as_deref(),
        Some(format!("Crate {}", cap).as_str())
    );
}

#[test]
fn loot_deck_config_builds_the_deck() {
    let mut def = scenario("1", vec![]);
    let mut config = LootDeckConfig::default();
    config.0.insert(LootType::Money, 2);
    config.0.insert(LootType::Hide, 1);
    def.loot_deck_config = Some(config.clone());
    let catalogue = catalogue_with(default_monsters(), vec![def.clone()]);

    let game = run(&catalogue, &settings(), StandeeDice::from_seed(1), &def, 2);

    assert_eq!(
        game.loot_deck.cards,
        vec![LootType::Money, LootType::Money, LootType::Hide]
    );
    assert_eq!(game.loot_deck.config, Some(config));
}

proptest! {
    #[test]
    fn random_standee_numbers_never_repeat(
        seed in any::<u64>(),
        capacity in 1u32..10,
        placements in 0usize..16,
    ) {
        let def = scenario(
            "1",
            vec![room(1, true, vec![place("guard", Some(MonsterType::Normal)); placements])],
        );
        let catalogue = catalogue_with(vec![monster("guard", capacity, false)], vec![def.clone()]);
        let settings = Settings { random_standees: true, ..settings() };

        let game = run(&catalogue, &settings, StandeeDice::from_seed(seed), &def, 2);

        let numbers: Vec<i32> = standees(&game, "guard").into_iter().map(|(n, _)| n).collect();
        let unique: HashSet<i32> = numbers.iter().copied().collect();
        prop_assert_eq!(unique.len(), numbers.len());
        prop_assert_eq!(numbers.len(), placements.min(capacity as usize));
        prop_assert!(numbers.iter().all(|n| (1..=capacity as i32).contains(n)));
    }
}
