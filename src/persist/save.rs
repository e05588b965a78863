//! Versioned save files
//!
//! A save file is the serialized transcript of a snapshot, wrapped in a
//! version envelope. The version is checked before the body is parsed,
//! so a save from an incompatible build is rejected cleanly even when
//! the body schema has drifted.

use std::borrow::Cow;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::persist::snapshot::{clone_state, SnapshotScope};
use crate::state::game::GameState;

/// Format version written into every save
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("save file version {found} is not readable by this build (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("save serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("save I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize, Deserialize)]
struct SaveFile<'a> {
    version: u32,
    state: Cow<'a, GameState>,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

/// Snapshot the game and write it as a versioned save
///
/// The caller must hold at least a read lock on a live game for the
/// duration of the call.
pub fn write_save(
    game: &GameState,
    scope: SnapshotScope,
    writer: &mut impl Write,
) -> Result<(), PersistError> {
    let snapshot = clone_state(game, scope);
    let file = SaveFile { version: SAVE_VERSION, state: Cow::Borrowed(&snapshot) };
    serde_json::to_writer(writer, &file)?;
    Ok(())
}

/// Read a save back into a fully independent state graph
pub fn read_save(reader: &mut impl Read) -> Result<GameState, PersistError> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;

    let probe: VersionProbe = serde_json::from_str(&raw)?;
    if probe.version != SAVE_VERSION {
        return Err(PersistError::UnsupportedVersion {
            found: probe.version,
            expected: SAVE_VERSION,
        });
    }

    let file: SaveFile<'_> = serde_json::from_str(&raw)?;
    Ok(file.state.into_owned())
}
