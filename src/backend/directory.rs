//! Filesystem configuration backend.
//!
//! A backend directory holds one XML file per definition:
//!
//! ```text
//! <root>/
//! ├── components/
//! │   ├── slit.xml
//! │   └── pilatus.xml
//! ├── datasources/
//! │   ├── gap.xml
//! │   └── exp_c01.xml
//! └── variables.json      (optional initial variables)
//! ```
//!
//! The file stem is the definition name. Every call reads the files again, so
//! edits are picked up between resolution calls.

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::graph::ComponentGraph;
use super::variables;
use super::{BackendResult, ConfigBackend};
use crate::core::BackendError;
use crate::resolver::references::component_references;

const COMPONENTS_DIR: &str = "components";
const DATASOURCES_DIR: &str = "datasources";
const VARIABLES_FILE: &str = "variables.json";
const DOCUMENT_EXTENSION: &str = "xml";

/// [`ConfigBackend`] reading definitions from a directory tree.
#[derive(Debug)]
pub struct DirectoryBackend {
    root: PathBuf,
    variables: Mutex<Map<String, Value>>,
}

impl DirectoryBackend {
    /// Open a backend directory, loading `variables.json` when present.
    ///
    /// # Errors
    ///
    /// Fails when `root` is not a directory or `variables.json` is not a JSON
    /// object.
    pub fn open(root: impl Into<PathBuf>) -> BackendResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(BackendError::Io {
                operation: "open backend directory".to_string(),
                path: root.display().to_string(),
                reason: "not a directory".to_string(),
            });
        }

        let variables_path = root.join(VARIABLES_FILE);
        let variables = if variables_path.is_file() {
            let content = read_file(&variables_path)?;
            match serde_json::from_str::<Value>(&content) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(BackendError::Io {
                        operation: "load variables".to_string(),
                        path: variables_path.display().to_string(),
                        reason: "expected a JSON object".to_string(),
                    });
                }
                Err(e) => {
                    return Err(BackendError::Io {
                        operation: "load variables".to_string(),
                        path: variables_path.display().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        } else {
            Map::new()
        };

        debug!("Opened backend directory {} ({} variables)", root.display(), variables.len());

        Ok(Self {
            root,
            variables: Mutex::new(variables),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sorted names of the `*.xml` files directly inside `subdir`.
    fn list(&self, subdir: &str) -> Vec<String> {
        let dir = self.root.join(subdir);
        if !dir.is_dir() {
            return Vec::new();
        }

        let mut names: Vec<String> = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some(DOCUMENT_EXTENSION))
            .filter_map(|entry| entry.path().file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        names
    }

    fn document_path(&self, subdir: &str, name: &str) -> PathBuf {
        self.root.join(subdir).join(format!("{name}.{DOCUMENT_EXTENSION}"))
    }

    fn fetch(&self, subdir: &str, kind: &str, names: &[String]) -> BackendResult<Vec<String>> {
        names
            .iter()
            .map(|name| {
                let path = self.document_path(subdir, name);
                if !path.is_file() {
                    return Err(BackendError::NotFound {
                        kind: kind.to_string(),
                        name: name.clone(),
                    });
                }
                read_file(&path)
            })
            .collect()
    }

    fn graph(&self) -> ComponentGraph {
        let mut graph = ComponentGraph::new();
        for name in self.list(COMPONENTS_DIR) {
            graph.add_component(&name);
            match read_file(&self.document_path(COMPONENTS_DIR, &name)) {
                Ok(xml) => {
                    for dep in component_references(&xml) {
                        graph.add_dependency(&name, &dep);
                    }
                }
                Err(e) => warn!("Skipping dependencies of component '{}': {}", name, e),
            }
        }
        graph
    }

    fn current_variables(&self) -> BackendResult<Map<String, Value>> {
        self.variables.lock().map(|vars| vars.clone()).map_err(|e| BackendError::Unavailable {
            operation: "variables".to_string(),
            reason: e.to_string(),
        })
    }
}

fn read_file(path: &Path) -> BackendResult<String> {
    fs::read_to_string(path).map_err(|e| BackendError::Io {
        operation: "read".to_string(),
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

impl ConfigBackend for DirectoryBackend {
    fn available_components(&self) -> BackendResult<Vec<String>> {
        Ok(self.list(COMPONENTS_DIR))
    }

    fn available_data_sources(&self) -> BackendResult<Vec<String>> {
        Ok(self.list(DATASOURCES_DIR))
    }

    fn dependent_components(&self, names: &[String]) -> BackendResult<Vec<String>> {
        let closure = self.graph().closure(names);
        // Tokens naming a component without a file still become graph nodes
        if let Some(missing) =
            closure.iter().find(|name| !self.document_path(COMPONENTS_DIR, name).is_file())
        {
            return Err(BackendError::NotFound {
                kind: "component".to_string(),
                name: missing.clone(),
            });
        }
        Ok(closure)
    }

    fn components(&self, names: &[String]) -> BackendResult<Vec<String>> {
        self.fetch(COMPONENTS_DIR, "component", names)
    }

    fn instantiated_components(&self, names: &[String]) -> BackendResult<Vec<String>> {
        let vars = self.current_variables()?;
        let documents = self.fetch(COMPONENTS_DIR, "component", names)?;
        names.iter().zip(documents).map(|(name, xml)| variables::substitute(&xml, name, &vars)).collect()
    }

    fn data_sources(&self, names: &[String]) -> BackendResult<Vec<String>> {
        self.fetch(DATASOURCES_DIR, "datasource", names)
    }

    fn variables(&self) -> BackendResult<Map<String, Value>> {
        self.current_variables()
    }

    fn set_variables(&self, variables: Map<String, Value>) -> BackendResult<()> {
        let mut current = self.variables.lock().map_err(|e| BackendError::Unavailable {
            operation: "set variables".to_string(),
            reason: e.to_string(),
        })?;
        *current = variables;
        Ok(())
    }
}
