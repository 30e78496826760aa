//! Nightclaw Game Engine
//!
//! Platform-agnostic core of the Nightclaw branching survival story: the
//! story graph, bounded player stats, random event injection, undo history,
//! and save records. Rendering, audio, and input belong to the caller.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod events;
pub mod inventory;
pub mod persistence;
pub mod session;
pub mod stats;
pub mod story;
pub mod undo;

pub use catalog::{ItemCatalog, ItemTemplate};
pub use config::{ConfigError, EngineConfig, RestConfig, ScavengeConfig};
pub use constants::NodeId;
pub use events::{EventInjector, EventTrigger, Interception};
pub use inventory::{Inventory, Item, ItemCategory};
pub use persistence::{FileStorage, MemoryStorage, SaveError, SaveRecord, SaveStorage};
pub use session::{GamePhase, GameSession, ItemUse, LoadOutcome, SaveOutcome, Transition};
pub use stats::{Rank, StatDelta, Stats};
pub use story::{Choice, GraphError, StoryGraph, StoryGraphBuilder, StoryNode};
pub use undo::{GameSnapshot, UndoStack};

use std::sync::Arc;
use thiserror::Error;

/// Source of story content and tuning.
pub trait StoryLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// # Errors
    ///
    /// Returns an error if the story cannot be loaded or is not playable.
    fn load_story(&self) -> Result<StoryGraph, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the tuning cannot be loaded or parsed.
    fn load_config(&self) -> Result<EngineConfig, Self::Error>;
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Story(#[from] GraphError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The story and tuning compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledContent;

impl StoryLoader for BundledContent {
    type Error = ContentError;

    fn load_story(&self) -> Result<StoryGraph, Self::Error> {
        let graph = StoryGraph::bundled()?;
        match graph.validate().into_iter().next() {
            Some(problem) => Err(problem.into()),
            None => Ok(graph),
        }
    }

    fn load_config(&self) -> Result<EngineConfig, Self::Error> {
        let config = EngineConfig::load_from_static();
        config.validate()?;
        Ok(config)
    }
}

/// Binds a content source to a save target and hands out sessions.
pub struct GameEngine<L, S>
where
    L: StoryLoader,
    S: SaveStorage,
{
    loader: L,
    storage: S,
}

impl<L, S> GameEngine<L, S>
where
    L: StoryLoader,
    S: SaveStorage,
{
    pub const fn new(loader: L, storage: S) -> Self {
        Self { loader, storage }
    }

    /// Start a new run seeded with `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the story or tuning cannot be loaded.
    pub fn new_session(&self, seed: u64) -> Result<GameSession, L::Error> {
        let graph = self.loader.load_story()?;
        let config = self.loader.load_config()?;
        Ok(GameSession::new(Arc::new(graph), config, seed))
    }

    pub fn save(&self, session: &mut GameSession, name: &str) -> SaveOutcome {
        session.save(&self.storage, name)
    }

    pub fn load(&self, session: &mut GameSession, path: &str) -> LoadOutcome {
        session.load(&self.storage, path)
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }
}
