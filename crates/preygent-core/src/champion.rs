//! Champion program persistence.
//!
//! The best program found so far is kept as plain program text in a single
//! file (`best.push` by default). It is read once at startup to seed the
//! elite set and overwritten whenever a new champion appears.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use preygent_program::{InstructionSet, ParseError, Program};

/// Errors raised while reading or writing the champion file.
#[derive(Debug, thiserror::Error)]
pub enum ChampionError {
    /// The file exists but could not be read or written.
    #[error("champion file {}: {source}", .path.display())]
    Io {
        /// The champion file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file contents are not a valid program.
    #[error("champion file {} is malformed: {source}", .path.display())]
    Parse {
        /// The champion file.
        path: PathBuf,
        /// The underlying parse error.
        source: ParseError,
    },
}

/// Read the champion program at `path`.
///
/// Returns `Ok(None)` when the file does not exist.
///
/// # Errors
///
/// Returns [`ChampionError::Io`] for any other read failure and
/// [`ChampionError::Parse`] if the text does not parse against
/// `instructions`.
pub fn load_champion<C>(
    path: &Path,
    instructions: &InstructionSet<C>,
    unwrap_single_list: bool,
) -> Result<Option<Program>, ChampionError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(source) if source.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ChampionError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    preygent_program::parse(&text, instructions, unwrap_single_list)
        .map(Some)
        .map_err(|source| ChampionError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Overwrite the file at `path` with the text of `program`.
///
/// # Errors
///
/// Returns [`ChampionError::Io`] if the file cannot be written.
pub fn save_champion(path: &Path, program: &Program) -> Result<(), ChampionError> {
    std::fs::write(path, program.to_string()).map_err(|source| ChampionError::Io {
        path: path.to_path_buf(),
        source,
    })
}
