//! Fixed ids, bounds and player-facing log texts for the Nightclaw engine.
//!
//! Tunable balance lives in [`crate::config::EngineConfig`]; the values here
//! are structural and are only changed alongside the story content.

/// Identifier of a node in the story graph.
pub type NodeId = i32;

// Story anchors -------------------------------------------------------------
pub const ENTRY_NODE_ID: NodeId = 1;
pub const RESUME_SENTINEL: NodeId = -99;
pub const DEFEAT_NODE_ID: NodeId = 997;
pub const VICTORY_NODE_ID: NodeId = 999;
pub const NO_RETURN: NodeId = -1;
pub const COOLDOWN_UNSET: NodeId = -10;

// Stat bounds ----------------------------------------------------------------
pub const STAT_MIN: i32 = 0;
pub const STAT_MAX: i32 = 100;
pub const FIRST_DAY: i32 = 1;
pub const LEGENDARY_REPUTATION: i32 = 80;
pub const PACK_LEADER_REPUTATION: i32 = 40;

// Inventory ------------------------------------------------------------------
pub const INVENTORY_CAPACITY: usize = 20;
pub const UNDO_DEPTH: usize = 5;
pub const MAP_ITEM: &str = "Map";

// Save files -----------------------------------------------------------------
pub const SAVE_HEADER: &str = "NIGHTCLAW-SAVE";
pub const SAVE_FORMAT_VERSION: u32 = 1;
pub const SAVE_EXTENSION: &str = ".txt";
pub const DEFAULT_SAVE_NAME: &str = "savegame";
pub const CHECKSUM_PREFIX: &str = "checksum";

// Game log texts -------------------------------------------------------------
pub const LOG_NEW_GAME: &str = "--- NEW GAME STARTED ---";
pub const LOG_EVENT_INTERRUPT: &str = ">> A RANDOM EVENT INTERRUPTS YOUR PATH!";
pub const LOG_CONTINUE: &str = "You continue on your journey...";
pub const LOG_UNDO_EMPTY: &str = ">> Cannot Undo (Stack Empty)";
pub const LOG_REST_BLOCKED: &str = "Cannot Rest: Unsafe area or rested recently.";
pub const LOG_SCAVENGE_DEPLETED: &str = "Nothing to scavenge here.";
pub const LOG_SCAVENGE_TIRED: &str = "Too tired to scavenge.";
pub const LOG_SCAVENGE_NOTHING: &str = "Found nothing.";
pub const LOG_GAINED_PREFIX: &str = ">> GAINED: ";
pub const LOG_SAVED_PREFIX: &str = ">> GAME SAVED to ";
pub const LOG_SAVE_FAILED_PREFIX: &str = ">> SAVE FAILED: ";
pub const LOG_SAVE_NOT_FOUND: &str = ">> SAVE FILE NOT FOUND";
pub const LOG_SAVE_UNREADABLE_PREFIX: &str = ">> SAVE FILE UNREADABLE: ";
pub const LOG_GAME_LOADED: &str = ">> GAME LOADED";
pub const LOG_DEFEAT: &str = ">> YOUR STRENGTH FAILS YOU.";
pub const LOG_VICTORY: &str = ">> THE TERRITORY IS YOURS.";

/// Whether `id` names one of the two endings.
#[must_use]
pub const fn is_ending(id: NodeId) -> bool {
    id == DEFEAT_NODE_ID || id == VICTORY_NODE_ID
}
