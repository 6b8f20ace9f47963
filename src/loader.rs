//! This module provides file access for compiled tables: loading programs and modules from
//! disk or memory, and writing compiled programs back out.

use crate::encoder::encode;
use crate::parser::parse;
use crate::types::{AquaError, Program, COMPILED_EXTENSION};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Somewhere compiled modules can be looked up by name.
pub trait ModuleSource {
    /// Loads the compiled table of the module called `name`.
    fn load(&self, name: &str) -> Result<Program, AquaError>;
}

/// Looks up `<name>.aquacomp` in a list of directories, first match wins.
#[derive(Debug, Clone)]
pub struct FileSystemSource {
    search_paths: Vec<PathBuf>,
}

impl FileSystemSource {
    /// Searches the current directory, then `search_path` if given.
    pub fn new(search_path: Option<&Path>) -> Self {
        let mut search_paths = vec![PathBuf::from(".")];
        search_paths.extend(search_path.map(Path::to_path_buf));
        Self { search_paths }
    }

    /// Searches exactly the given directories.
    pub fn with_paths(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl ModuleSource for FileSystemSource {
    fn load(&self, name: &str) -> Result<Program, AquaError> {
        let file_name = format!("{name}.{COMPILED_EXTENSION}");

        let found = self
            .search_paths
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|path| path.is_file());

        match found {
            Some(path) => {
                tracing::debug!(module = name, path = %path.display(), "loading module");
                ProgramLoader::load_program(&path)
            }
            None => Err(AquaError::ModuleNotFound {
                name: name.to_string(),
                searched: self
                    .search_paths
                    .iter()
                    .map(|dir| dir.join(&file_name).display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

/// Modules held in memory as table text, keyed by module name.
impl ModuleSource for HashMap<String, String> {
    fn load(&self, name: &str) -> Result<Program, AquaError> {
        let content = self.get(name).ok_or_else(|| AquaError::ModuleNotFound {
            name: name.to_string(),
            searched: "memory".to_string(),
        })?;

        parse(content)
    }
}

/// `ProgramLoader` is a utility struct for reading and writing compiled tables.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a compiled table from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the file is successfully read and parsed.
    /// * `Err(AquaError::FileError)` if the file cannot be read.
    /// * Any table parsing error if the content is not a valid table.
    pub fn load_program(path: &Path) -> Result<Program, AquaError> {
        let content = fs::read_to_string(path).map_err(|e| {
            AquaError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        parse(&content)
    }

    /// Writes `program` to `path` in the compiled table format, replacing any existing file.
    pub fn write_program(path: &Path, program: &Program) -> Result<(), AquaError> {
        fs::write(path, encode(program)).map_err(|e| {
            AquaError::FileError(format!("Failed to write file {}: {}", path.display(), e))
        })
    }
}
