//! Scenario loading.
//!
//! Scenarios are [`ScenarioData`] RON files: a map, unit templates,
//! placements and the players taking part. The core never touches the
//! filesystem, so reading them lives here.

use std::path::{Path, PathBuf};

use tactics_core::data::{Controller, ScenarioData};
use thiserror::Error;
use tracing::debug;

/// Built-in 1v1 skirmish, also shipped as `scenarios/skirmish_1v1.ron`.
pub const SKIRMISH_1V1: &str = include_str!("../scenarios/skirmish_1v1.ron");

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
}

/// Load a scenario from a RON file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<ScenarioData, ScenarioError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    let scenario = from_ron_str(&contents)?;
    debug!(path = %path.display(), name = %scenario.name, "Loaded scenario");
    Ok(scenario)
}

/// Parse a scenario from a RON string.
pub fn from_ron_str(ron: &str) -> Result<ScenarioData, ScenarioError> {
    Ok(ron::from_str(ron)?)
}

/// The built-in 1v1 skirmish.
pub fn skirmish_1v1() -> Result<ScenarioData, ScenarioError> {
    from_ron_str(SKIRMISH_1V1)
}

/// Resolve a command-line scenario argument.
///
/// `None` and `"skirmish_1v1"` select the built-in skirmish unless a file of
/// that name exists; anything else is a path.
pub fn resolve(argument: Option<&str>) -> Result<ScenarioData, ScenarioError> {
    match argument {
        None => skirmish_1v1(),
        Some(name) if name == "skirmish_1v1" && !Path::new(name).exists() => skirmish_1v1(),
        Some(path) => load(path),
    }
}

/// Every `.ron` file directly inside `dir`, sorted by path.
pub fn scenario_files(dir: &Path) -> Result<Vec<PathBuf>, ScenarioError> {
    if !dir.is_dir() {
        return Err(ScenarioError::FileNotFound(dir.display().to_string()));
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "ron") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Hand every player slot to the built-in AI.
#[must_use]
pub fn ai_only(mut scenario: ScenarioData) -> ScenarioData {
    for slot in &mut scenario.players {
        slot.controller = Controller::Ai;
    }
    scenario
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_skirmish_parses() {
        let scenario = skirmish_1v1().unwrap();
        assert_eq!(scenario.name, "Standard 1v1 Skirmish");
        assert_eq!(scenario.placements.len(), 6);
        assert_eq!(scenario.player_numbers().len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load("definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, ScenarioError::FileNotFound(_)));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ScenarioData(name: \"broken\"").unwrap();
        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, ScenarioError::ParseError(_)));
    }

    #[test]
    fn test_scenario_files_are_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.ron"), SKIRMISH_1V1).unwrap();
        std::fs::write(dir.path().join("a.ron"), SKIRMISH_1V1).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let files = scenario_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.ron", "b.ron"]);
    }

    #[test]
    fn test_ai_only_overrides_humans() {
        let mut scenario = skirmish_1v1().unwrap();
        scenario.players[0].controller = Controller::Human;
        let scenario = ai_only(scenario);
        assert!(scenario.players.iter().all(|p| p.controller == Controller::Ai));
    }
}
