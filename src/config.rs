//! Runtime configuration
//!
//! Everything is read from the environment:
//! - `PANTRY_DATABASE_PATH`: SQLite file (default `data/pantry.db` at the project root)
//! - `PANTRY_UNITS_PATH`: optional JSON unit table replacing or extending the built-in one
//! - `RUST_LOG`: log filter, handled by the binary's subscriber

use std::path::{Path, PathBuf};

use crate::units::{ConversionGraph, GraphError};

pub const DATABASE_PATH_VAR: &str = "PANTRY_DATABASE_PATH";
pub const UNITS_PATH_VAR: &str = "PANTRY_UNITS_PATH";

/// Resolved configuration for the server and the utilities
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub units_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_path: database_path(),
            units_path: std::env::var_os(UNITS_PATH_VAR).map(PathBuf::from),
        }
    }

    /// Build the conversion graph this configuration points at
    pub fn conversion_graph(&self) -> Result<ConversionGraph, GraphError> {
        match &self.units_path {
            Some(path) => ConversionGraph::load(path),
            None => Ok(ConversionGraph::builtin()),
        }
    }
}

/// Get the database path from the environment or use the default
fn database_path() -> PathBuf {
    std::env::var(DATABASE_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(Path::to_path_buf))
                .unwrap_or_else(|| PathBuf::from("."));

            let mut path = project_root(exe_dir);
            path.push("data");
            path.push("pantry.db");
            path
        })
}

/// Step out of target/release or target/debug to the project root
fn project_root(exe_dir: PathBuf) -> PathBuf {
    if exe_dir.ends_with("release") || exe_dir.ends_with("debug") {
        if let Some(grandparent) = exe_dir.parent().and_then(Path::parent) {
            return grandparent.to_path_buf();
        }
    }
    exe_dir
}
