use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use encoding_rs::Encoding;
use scenario_engine::conditions::Bindings;
use scenario_engine::game::Character;
use scenario_engine::model::{MonsterType, ScenarioRule};
use scenario_engine::ports::EditionRepository;
use scenario_engine::rules::rule_fires;
use scenario_engine::settings::{parse_document, render_document, DataFormat};
use scenario_engine::{
    CampaignProgress, Catalogue, Game, GameState, ScenarioContext, ScenarioIdentifier,
    ScenarioManager, ScenarioRecord, Settings, StandeeDice,
};
use tracing::{debug, info, Level};

#[derive(Copy, Clone, ValueEnum)]
enum Phase {
    Draw,
    Next,
}

impl From<Phase> for GameState {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Draw => GameState::Draw,
            Phase::Next => GameState::Next,
        }
    }
}

#[derive(Args)]
struct ContentArgs {
    /// Extra edition file (JSON or YAML); may be repeated
    #[arg(long = "catalogue")]
    catalogues: Vec<PathBuf>,
    /// Settings file (JSON or YAML)
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Cmd {
    /// List the scenarios a campaign may currently pick
    Scenarios {
        /// Edition code
        #[arg(long)]
        edition: String,
        /// Campaign progress file; a fresh campaign if omitted
        #[arg(long)]
        campaign: Option<PathBuf>,
        #[command(flatten)]
        content: ContentArgs,
    },
    /// Set up a scenario on a fresh game and print the result
    Setup {
        #[arg(long)]
        edition: String,
        #[arg(long)]
        index: String,
        #[arg(long)]
        group: Option<String>,
        /// Character to bring along; may be repeated
        #[arg(long = "character")]
        characters: Vec<String>,
        /// Party level
        #[arg(long, default_value_t = 1)]
        level: u32,
        /// Section to add after setup; may be repeated
        #[arg(long = "section")]
        sections: Vec<String>,
        /// Room to open after setup; may be repeated
        #[arg(long = "open")]
        open: Vec<u32>,
        /// RNG seed for random standee numbers
        #[arg(long)]
        seed: Option<u64>,
        /// Print the whole game state as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        content: ContentArgs,
    },
    /// Check whether a rule condition fires
    Rule {
        #[arg(long)]
        condition: String,
        #[arg(long)]
        round: u32,
        #[arg(long)]
        characters: usize,
        /// Rule fires at round start
        #[arg(long)]
        start: bool,
        #[arg(long, value_enum, default_value_t = Phase::Next)]
        state: Phase,
    },
    /// Record a completed scenario in a campaign file
    Complete {
        #[arg(long)]
        campaign: PathBuf,
        #[arg(long)]
        edition: String,
        #[arg(long)]
        index: String,
        #[arg(long)]
        group: Option<String>,
        #[command(flatten)]
        content: ContentArgs,
    },
}

#[derive(Parser)]
#[command(name = "scenario-cli")]
#[command(about = "Scenario setup and campaign progression harness")]
struct Cli {
    /// -v for info, -vv for debug logging (stderr)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Cmd,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn read_text_auto(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        Ok(String::from_utf8(bytes)?)
    }
}

fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = read_text_auto(path)?;
    parse_document(&text, DataFormat::from_path(path), &path.display().to_string())
}

fn load_content(args: &ContentArgs) -> anyhow::Result<(Catalogue, Settings)> {
    let mut catalogue = Catalogue::builtin()?;
    for path in &args.catalogues {
        let text = read_text_auto(path)?;
        catalogue.load_str(&text, DataFormat::from_path(path), &path.display().to_string())?;
    }
    let mut settings = match &args.settings {
        Some(path) => read_document::<Settings>(path)?,
        None => Settings::default(),
    };
    if settings.editions.is_empty() {
        settings = settings.with_editions(catalogue.edition_codes());
    }
    debug!(editions = ?settings.editions, "content loaded");
    Ok((catalogue, settings))
}

fn load_campaign(path: Option<&Path>) -> anyhow::Result<CampaignProgress> {
    match path {
        Some(path) if path.exists() => read_document(path),
        _ => Ok(CampaignProgress {
            campaign_mode: true,
            ..Default::default()
        }),
    }
}

fn kind_label(kind: MonsterType) -> &'static str {
    match kind {
        MonsterType::Normal => "normal",
        MonsterType::Elite => "elite",
        MonsterType::Boss => "boss",
    }
}

fn print_summary(game: &Game) {
    if let Some(live) = &game.scenario {
        let def = &live.definition;
        println!("scenario {} {} ({})", def.index, def.name, def.edition);
        let rooms: Vec<String> = live.revealed_rooms.iter().map(u32::to_string).collect();
        println!("rooms: {}", rooms.join(", "));
    }
    for character in &game.characters {
        let status = if character.absent { " (absent)" } else { "" };
        println!("character {}{}", character.name, status);
    }
    for group in &game.monsters {
        let standees: Vec<String> = group
            .entities
            .iter()
            .map(|e| format!("{} {}", e.number, kind_label(e.kind)))
            .collect();
        let ally = if group.is_ally { " [ally]" } else { "" };
        println!("{}{}: {}", group.name, ally, standees.join(", "));
    }
    for objective in &game.objectives {
        let name = objective.display_name.as_deref().unwrap_or(&objective.name);
        println!("objective {} (hp {})", name, objective.max_health);
    }
    if !game.loot_deck.cards.is_empty() {
        println!("loot: {} cards", game.loot_deck.cards.len());
    }
    for rule in &game.scenario_rules {
        let source = if rule.section { "section" } else { "scenario" };
        println!("rule {} of {} {} fires", rule.index, source, rule.scenario);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Cmd::Scenarios {
            edition,
            campaign,
            content,
        } => {
            let (catalogue, settings) = load_content(&content)?;
            if catalogue.edition(&edition).is_none() {
                bail!("unknown edition {}", edition);
            }
            let game = Game {
                party: Some(load_campaign(campaign.as_deref())?),
                ..Default::default()
            };
            let manager = ScenarioManager::new(ScenarioContext::standard(&catalogue, &settings));
            for scenario in manager.scenario_data(&game, Some(&edition)) {
                let blocked = if manager.is_blocked(&game, scenario) {
                    " (blocked)"
                } else {
                    ""
                };
                println!("{} {}{}", scenario.index, scenario.name, blocked);
            }
        }
        Cmd::Setup {
            edition,
            index,
            group,
            characters,
            level,
            sections,
            open,
            seed,
            json,
            content,
        } => {
            let (catalogue, settings) = load_content(&content)?;
            let definition = catalogue
                .find_scenario(&index, &edition, group.as_deref())
                .with_context(|| format!("unknown scenario {} in edition {}", index, edition))?;
            let mut game = Game {
                level,
                ..Default::default()
            };
            for name in &characters {
                let data = catalogue
                    .find_character(name, &edition)
                    .with_context(|| format!("unknown character {} in edition {}", name, edition))?;
                game.characters.push(Character::new(data, level));
            }

            let dice = seed.map_or_else(StandeeDice::from_entropy, StandeeDice::from_seed);
            let mut manager =
                ScenarioManager::with_dice(ScenarioContext::standard(&catalogue, &settings), dice);
            manager.select(&mut game, definition)?;
            for section in &sections {
                let key = ScenarioIdentifier::new(section.as_str(), edition.as_str(), None);
                manager.add_section_by_key(&mut game, &key)?;
            }
            for room in open {
                manager.open_room(&mut game, room)?;
            }
            manager.apply_scenario_rules(&mut game);
            info!(monsters = game.monsters.len(), "scenario set up");

            if json {
                println!("{}", serde_json::to_string_pretty(&game)?);
            } else {
                print_summary(&game);
            }
        }
        Cmd::Rule {
            condition,
            round,
            characters,
            start,
            state,
        } => {
            let rule = ScenarioRule {
                round: condition.as_str().into(),
                start,
                note: None,
            };
            let bindings = Bindings::for_rules(round, characters);
            match rule_fires(&rule, state.into(), &bindings) {
                Ok(true) => println!("fires"),
                Ok(false) => println!("does not fire"),
                Err(err) => bail!("cannot evaluate {:?}: {}", condition, err),
            }
        }
        Cmd::Complete {
            campaign,
            edition,
            index,
            group,
            content,
        } => {
            let (catalogue, _) = load_content(&content)?;
            let definition = catalogue
                .find_scenario(&index, &edition, group.as_deref())
                .with_context(|| format!("unknown scenario {} in edition {}", index, edition))?;
            let mut progress = load_campaign(Some(&campaign))?;
            progress.record_completion(ScenarioRecord::from_definition(definition, &[], false, ""));
            let text = render_document(&progress, DataFormat::from_path(&campaign))?;
            fs::write(&campaign, text)
                .with_context(|| format!("failed to write {}", campaign.display()))?;
            info!(path = %campaign.display(), "campaign updated");
            println!("completed {} {}", definition.index, definition.name);
        }
    }
    Ok(())
}
