//! The playable session: owns the mutable run state and resolves every
//! player action against the shared story graph.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::constants::{
    DEFEAT_NODE_ID, ENTRY_NODE_ID, LOG_CONTINUE, LOG_DEFEAT, LOG_EVENT_INTERRUPT,
    LOG_GAINED_PREFIX, LOG_GAME_LOADED, LOG_NEW_GAME, LOG_REST_BLOCKED, LOG_SAVE_FAILED_PREFIX,
    LOG_SAVE_NOT_FOUND, LOG_SAVE_UNREADABLE_PREFIX, LOG_SAVED_PREFIX, LOG_SCAVENGE_DEPLETED,
    LOG_SCAVENGE_NOTHING, LOG_SCAVENGE_TIRED, LOG_UNDO_EMPTY, LOG_VICTORY, MAP_ITEM, NO_RETURN,
    NodeId, RESUME_SENTINEL, VICTORY_NODE_ID,
};
use crate::events::{EventInjector, resume_target};
use crate::inventory::Inventory;
use crate::persistence::{SaveError, SaveRecord, SaveStorage, normalize_save_name};
use crate::stats::{Rank, Stats};
use crate::story::{GraphError, StoryGraph, StoryNode};
use crate::undo::{GameSnapshot, UndoStack};

/// Which screen the session is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GamePhase {
    #[default]
    Menu,
    Intro,
    Gameplay,
    Map,
    Rest,
    Scavenge,
    Outro,
}

impl GamePhase {
    /// Phases in which the player is out in the world and may open the map.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Gameplay | Self::Map | Self::Rest | Self::Scavenge)
    }
}

/// Result of [`GameSession::make_choice`].
#[derive(Debug)]
pub enum Transition {
    /// The run is over or there is no current node.
    Ignored,
    /// Out-of-range index; only the per-turn drift applied.
    InvalidChoice { index: usize },
    /// An event branch handed the player back.
    Resumed { node: NodeId },
    Moved {
        node: NodeId,
        interrupted_by: Option<NodeId>,
    },
    /// The run ended in defeat; `intended` is where the choice was heading.
    Defeated { intended: NodeId },
    Victory,
    /// The resolved target is not in the graph; the player stays put.
    BrokenLink(GraphError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemUse {
    ToggledMap,
    Consumed,
    NotHeld,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { file_name: String },
    Failed { file_name: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    NotFound,
    Rejected(SaveError),
}

#[derive(Debug, Clone)]
pub struct GameSession {
    graph: Arc<StoryGraph>,
    config: EngineConfig,
    injector: EventInjector,
    rng: ChaCha20Rng,
    seed: u64,
    phase: GamePhase,
    current_node: Option<NodeId>,
    return_to: NodeId,
    stats: Stats,
    inventory: Inventory,
    log: Vec<String>,
    undo: UndoStack,
    intro_index: usize,
    game_over: bool,
    game_won: bool,
}

impl GameSession {
    /// Start a fresh run on `graph`. All random draws come from `seed`.
    #[must_use]
    pub fn new(graph: Arc<StoryGraph>, config: EngineConfig, seed: u64) -> Self {
        let injector = EventInjector::new(config.events.clone());
        let mut session = Self {
            graph,
            injector,
            rng: ChaCha20Rng::seed_from_u64(seed),
            seed,
            phase: GamePhase::Menu,
            current_node: None,
            return_to: NO_RETURN,
            stats: Stats::default(),
            inventory: Inventory::with_capacity(config.inventory_capacity),
            log: Vec::new(),
            undo: UndoStack::new(config.undo_depth),
            intro_index: 0,
            game_over: false,
            game_won: false,
            config,
        };
        session.init_game();
        session
    }

    /// Reset to a new run: default stats, starting items, entry node, menu.
    pub fn init_game(&mut self) {
        self.stats = Stats::default();
        self.inventory = Inventory::with_capacity(self.config.inventory_capacity);
        for name in &self.config.starting_items {
            match self.config.catalog.instantiate(name, 1) {
                Some(item) => self.inventory.add(item),
                None => log::warn!("starting item {name} is not in the catalog"),
            }
        }
        self.undo = UndoStack::new(self.config.undo_depth);
        self.return_to = NO_RETURN;
        self.log = vec![LOG_NEW_GAME.to_string()];
        self.current_node = self
            .graph
            .contains(ENTRY_NODE_ID)
            .then_some(ENTRY_NODE_ID);
        if self.current_node.is_none() {
            log::error!("story has no entry node {ENTRY_NODE_ID}");
        }
        self.phase = GamePhase::Menu;
        self.intro_index = 0;
        self.game_over = false;
        self.game_won = false;
    }

    /// Leave the menu for the intro, or straight into play when there is none.
    pub fn start(&mut self) {
        if self.phase != GamePhase::Menu {
            return;
        }
        self.intro_index = 0;
        self.phase = if self.graph.intro().is_empty() {
            GamePhase::Gameplay
        } else {
            GamePhase::Intro
        };
    }

    /// The intro line currently on screen.
    #[must_use]
    pub fn intro_line(&self) -> Option<&str> {
        if self.phase != GamePhase::Intro {
            return None;
        }
        self.graph.intro().get(self.intro_index).map(String::as_str)
    }

    /// Step to the next intro line. Returns `false` once play has begun.
    pub fn advance_intro(&mut self) -> bool {
        if self.phase != GamePhase::Intro {
            return false;
        }
        self.intro_index += 1;
        if self.intro_index >= self.graph.intro().len() {
            self.phase = GamePhase::Gameplay;
            return false;
        }
        true
    }

    pub fn skip_intro(&mut self) {
        if matches!(self.phase, GamePhase::Menu | GamePhase::Intro) {
            self.phase = GamePhase::Gameplay;
        }
    }

    /// Close the rest, scavenge, or map screen.
    pub fn resume_gameplay(&mut self) {
        if matches!(
            self.phase,
            GamePhase::Rest | GamePhase::Scavenge | GamePhase::Map
        ) {
            self.phase = GamePhase::Gameplay;
        }
    }

    pub fn toggle_map(&mut self) {
        match self.phase {
            GamePhase::Map => self.phase = GamePhase::Gameplay,
            phase if phase.is_active() => self.phase = GamePhase::Map,
            _ => {}
        }
    }

    /// Resolve the player's pick of choice `index` at the current node.
    pub fn make_choice(&mut self, index: usize) -> Transition {
        if self.game_over || self.game_won {
            return Transition::Ignored;
        }
        let graph = Arc::clone(&self.graph);
        let Some(node) = self.current_node.and_then(|id| graph.get(id)) else {
            return Transition::Ignored;
        };
        let here = node.id;

        self.push_snapshot(here);
        self.stats.apply(&self.config.turn_drift);
        self.phase = GamePhase::Gameplay;

        let Some(target) = node.choice(index).map(|choice| choice.target) else {
            log::debug!("choice {index} is out of range at node {here}");
            if self.settle() {
                return Transition::Defeated { intended: here };
            }
            return Transition::InvalidChoice { index };
        };

        if target == RESUME_SENTINEL {
            let resumed = resume_target(self.return_to, &graph);
            self.return_to = NO_RETURN;
            self.current_node = Some(resumed);
            self.log.push(LOG_CONTINUE.to_string());
            if self.settle() {
                return Transition::Defeated { intended: resumed };
            }
            return Transition::Resumed { node: resumed };
        }

        let interception =
            self.injector
                .redirect(target, &mut self.stats, &mut self.return_to, &mut self.rng);
        if interception.is_some() {
            self.log.push(LOG_EVENT_INTERRUPT.to_string());
        }
        let destination = interception.map_or(target, |hit| hit.event);

        let next = match graph.lookup(destination) {
            Ok(next) => next,
            Err(err) => {
                if cfg!(debug_assertions) {
                    log::error!("choice {index} at node {here} leads nowhere: {err}");
                } else {
                    log::warn!("choice {index} at node {here} leads nowhere: {err}");
                }
                if self.settle() {
                    return Transition::Defeated {
                        intended: destination,
                    };
                }
                return Transition::BrokenLink(err);
            }
        };

        self.current_node = Some(destination);
        self.stats.apply(&next.delta);
        self.grant_rewards(next);
        log::debug!("moved {here} -> {destination}");

        if self.settle() {
            return Transition::Defeated {
                intended: destination,
            };
        }
        if destination == DEFEAT_NODE_ID {
            self.defeat();
            return Transition::Defeated {
                intended: destination,
            };
        }
        if destination == VICTORY_NODE_ID {
            self.game_won = true;
            self.phase = GamePhase::Outro;
            self.log.push(LOG_VICTORY.to_string());
            return Transition::Victory;
        }
        Transition::Moved {
            node: destination,
            interrupted_by: interception.map(|hit| hit.event),
        }
    }

    /// Rest in place. Returns whether the rest happened.
    pub fn rest(&mut self) -> bool {
        let Some(here) = self.acting_node() else {
            return false;
        };
        if here.saturating_sub(self.stats.last_rest_node) < self.config.rest.cooldown {
            self.log.push(LOG_REST_BLOCKED.to_string());
            return false;
        }

        self.push_snapshot(here);
        self.stats.last_rest_node = here;
        let effect = self.config.rest.effect;
        self.stats.apply(&effect);
        self.phase = GamePhase::Rest;
        self.log.push(format!("Rested ({effect})."));
        self.settle();
        true
    }

    /// Search the area for supplies. Returns whether the search happened.
    pub fn scavenge(&mut self) -> bool {
        let Some(here) = self.acting_node() else {
            return false;
        };
        let scavenge = &self.config.scavenge;
        if here.saturating_sub(self.stats.last_scavenge_node) < scavenge.cooldown {
            self.log.push(LOG_SCAVENGE_DEPLETED.to_string());
            return false;
        }
        if self.stats.energy <= scavenge.min_energy {
            self.log.push(LOG_SCAVENGE_TIRED.to_string());
            return false;
        }

        self.push_snapshot(here);
        self.stats.last_scavenge_node = here;
        let effect = self.config.scavenge.effect;
        self.stats.apply(&effect);
        self.phase = GamePhase::Scavenge;

        let found = self.rng.gen_range(0..100u8) < self.config.scavenge.find_percent;
        let item = if found {
            let name = &self.config.scavenge.find_item;
            let item = self.config.catalog.instantiate(name, 1);
            if item.is_none() {
                log::warn!("scavenge item {name} is not in the catalog");
            }
            item
        } else {
            None
        };
        match item {
            Some(item) => {
                self.log.push(format!("Found {}!", item.name));
                self.inventory.add(item);
            }
            None => self.log.push(LOG_SCAVENGE_NOTHING.to_string()),
        }
        self.settle();
        true
    }

    /// Use one unit of `name`. The map is never consumed; it toggles the map view.
    pub fn use_item(&mut self, name: &str) -> ItemUse {
        if name == MAP_ITEM {
            self.toggle_map();
            return ItemUse::ToggledMap;
        }
        if !self.inventory.remove_one(name) {
            self.log.push(format!("You don't have {name}."));
            return ItemUse::NotHeld;
        }
        match self.config.catalog.use_effect(name).copied() {
            Some(effect) if !effect.is_zero() => {
                self.stats.apply(&effect);
                self.log.push(format!("Used {name} ({effect})."));
            }
            _ => self.log.push(format!("Used {name}.")),
        }
        self.settle();
        ItemUse::Consumed
    }

    /// Rewind the most recent choice, rest, or scavenge.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo.pop() else {
            self.log.push(LOG_UNDO_EMPTY.to_string());
            return false;
        };
        if self.graph.contains(snapshot.current_node) {
            self.current_node = Some(snapshot.current_node);
        }
        self.return_to = snapshot.return_to;
        self.stats = snapshot.stats;
        self.log = snapshot.log;
        self.inventory.restore(snapshot.items);
        self.stats.clamp();
        self.game_over = false;
        self.game_won = false;
        self.phase = GamePhase::Gameplay;
        log::info!("undo back to node {}", snapshot.current_node);
        true
    }

    /// Write the current run to `storage` under `name` (`.txt` appended when missing).
    pub fn save<S: SaveStorage>(&mut self, storage: &S, name: &str) -> SaveOutcome {
        let file_name = normalize_save_name(name);
        let contents = match self.record().encode() {
            Ok(contents) => contents,
            Err(err) => return self.save_failed(file_name, err.to_string()),
        };
        match storage.write_record(&file_name, &contents) {
            Ok(()) => {
                log::info!("saved session to {file_name}");
                self.log.push(format!("{LOG_SAVED_PREFIX}{file_name}"));
                SaveOutcome::Saved { file_name }
            }
            Err(err) => self.save_failed(file_name, err.to_string()),
        }
    }

    fn save_failed(&mut self, file_name: String, reason: String) -> SaveOutcome {
        log::warn!("saving to {file_name} failed: {reason}");
        self.log.push(format!("{LOG_SAVE_FAILED_PREFIX}{reason}"));
        SaveOutcome::Failed { file_name, reason }
    }

    /// Replace the run with the record stored at `path`. On any failure the
    /// session is left untouched apart from a log line.
    pub fn load<S: SaveStorage>(&mut self, storage: &S, path: &str) -> LoadOutcome {
        let contents = match storage.read_record(path) {
            Ok(Some(contents)) => contents,
            Ok(None) => {
                self.log.push(LOG_SAVE_NOT_FOUND.to_string());
                return LoadOutcome::NotFound;
            }
            Err(err) => {
                log::warn!("reading save {path} failed: {err}");
                self.log.push(LOG_SAVE_NOT_FOUND.to_string());
                return LoadOutcome::NotFound;
            }
        };
        match SaveRecord::decode(&contents) {
            Ok(record) => {
                self.apply_record(record);
                log::info!("loaded session from {path}");
                LoadOutcome::Loaded
            }
            Err(err) => {
                log::warn!("save {path} rejected: {err}");
                self.log.push(format!("{LOG_SAVE_UNREADABLE_PREFIX}{err}"));
                LoadOutcome::Rejected(err)
            }
        }
    }

    /// The persisted view of this run.
    #[must_use]
    pub fn record(&self) -> SaveRecord {
        SaveRecord {
            node_id: self.current_node.unwrap_or(ENTRY_NODE_ID),
            health: self.stats.health,
            hunger: self.stats.hunger,
            energy: self.stats.energy,
            reputation: self.stats.reputation,
            day_count: self.stats.day_count,
            event_happened: self.stats.event_happened,
            items: self.inventory.snapshot(),
        }
    }

    fn apply_record(&mut self, record: SaveRecord) {
        if self.graph.contains(record.node_id) {
            self.current_node = Some(record.node_id);
        } else {
            log::warn!("saved node {} is not in the story", record.node_id);
        }
        self.stats.health = record.health;
        self.stats.hunger = record.hunger;
        self.stats.energy = record.energy;
        self.stats.reputation = record.reputation;
        self.stats.day_count = record.day_count;
        self.stats.event_happened = record.event_happened;
        self.stats.clamp();
        self.inventory.restore(record.items);

        self.return_to = NO_RETURN;
        self.undo.clear();
        self.log = vec![LOG_GAME_LOADED.to_string()];
        self.game_over = self.current_node == Some(DEFEAT_NODE_ID);
        self.game_won = self.current_node == Some(VICTORY_NODE_ID);
        self.phase = if self.game_over || self.game_won {
            GamePhase::Outro
        } else {
            GamePhase::Gameplay
        };
    }

    /// Rest and scavenge start only from the main gameplay screen.
    fn acting_node(&self) -> Option<NodeId> {
        if self.game_over || self.game_won || self.phase != GamePhase::Gameplay {
            return None;
        }
        self.current_node
    }

    fn push_snapshot(&mut self, here: NodeId) {
        self.undo.push(GameSnapshot {
            current_node: here,
            return_to: self.return_to,
            stats: self.stats.clone(),
            items: self.inventory.snapshot(),
            log: self.log.clone(),
        });
    }

    fn grant_rewards(&mut self, node: &StoryNode) {
        for tag in &node.rewards {
            match self.config.catalog.instantiate(tag, 1) {
                Some(item) => {
                    self.log.push(format!("{LOG_GAINED_PREFIX}{tag}"));
                    self.inventory.add(item);
                }
                None => log::warn!("node {} rewards unknown item {tag}", node.id),
            }
        }
    }

    /// Clamp, then end a live run if the player collapsed. Returns `true`
    /// only when this call caused the defeat.
    fn settle(&mut self) -> bool {
        self.stats.clamp();
        if !self.game_over && !self.game_won && self.stats.is_collapsed() {
            self.defeat();
            return true;
        }
        false
    }

    fn defeat(&mut self) {
        self.game_over = true;
        self.current_node = Some(DEFEAT_NODE_ID);
        self.phase = GamePhase::Outro;
        self.log.push(LOG_DEFEAT.to_string());
    }

    #[must_use]
    pub fn graph(&self) -> &StoryGraph {
        &self.graph
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub const fn current_node_id(&self) -> Option<NodeId> {
        self.current_node
    }

    #[must_use]
    pub fn current_node(&self) -> Option<&StoryNode> {
        self.current_node.and_then(|id| self.graph.get(id))
    }

    /// Where the pending event will hand the player back, or `-1`.
    #[must_use]
    pub const fn return_to(&self) -> NodeId {
        self.return_to
    }

    #[must_use]
    pub const fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Direct access for scripted setups; changes are clamped by the next action.
    pub const fn stats_mut(&mut self) -> &mut Stats {
        &mut self.stats
    }

    #[must_use]
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub const fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    #[must_use]
    pub fn log(&self) -> &[String] {
        &self.log
    }

    #[must_use]
    pub fn last_log(&self) -> Option<&str> {
        self.log.last().map(String::as_str)
    }

    #[must_use]
    pub const fn undo_history(&self) -> &UndoStack {
        &self.undo
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.game_over
    }

    #[must_use]
    pub const fn is_won(&self) -> bool {
        self.game_won
    }

    #[must_use]
    pub const fn rank(&self) -> Rank {
        self.stats.rank()
    }
}
