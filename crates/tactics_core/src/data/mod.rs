//! Data structures for scenario configuration.
//!
//! This module contains pure data structures that define unit templates,
//! maps and complete scenarios. All structs are designed to be deserialized
//! from RON files.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `tactics_headless`.

mod map_data;
mod scenario_data;
mod unit_data;

pub use map_data::{MapData, TerrainPatch, TilePlacement, TokenPlacement};
pub use scenario_data::{Controller, Placement, PlayerSlot, ScenarioData};
pub use unit_data::{StatBlock, UnitData};
