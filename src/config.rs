//! Runtime configuration: declaring an executor set in TOML.
//!
//! The embedding application can describe its executors — names, kinds,
//! CPU pinning — in a config file instead of code:
//!
//! ```toml
//! [[executors]]
//! name = "main_core"
//! kind = "serial"
//! cpu_affinity = [0]
//!
//! [[executors]]
//! name = "multi_cores"
//! kind = "parallel"
//! ```
//!
//! [`RuntimeConfig::build`] instantiates the declared executors into
//! handles keyed by name, ready to be bound into [`ExecutorSlot`]s.

use crate::error::{FlowError, Result};
use crate::executor::{Executor, ExecutorHandle};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// The kind of executor to instantiate. Only the threaded kinds are
/// configurable; the realtime/deleter/waiting-zone services always exist
/// on the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorKind {
    Serial,
    Parallel,
}

/// One declared executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorSpec {
    /// Name the executor is looked up by.
    pub name: String,
    pub kind: ExecutorKind,
    /// CPU indices the worker thread may be pinned to (first available
    /// wins). Empty means unpinned.
    #[serde(default)]
    pub cpu_affinity: Vec<usize>,
}

/// A declared executor set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub executors: Vec<ExecutorSpec>,
}

impl RuntimeConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| FlowError::Config(e.to_string()))
    }

    /// Load a config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Save the config as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = toml::to_string_pretty(self).map_err(|e| FlowError::Config(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Instantiate every declared executor, keyed by name. The executors
    /// are created stopped; start them (and register them for shutdown)
    /// as the application requires.
    pub fn build(&self) -> HashMap<String, ExecutorHandle> {
        let mut executors = HashMap::new();
        for spec in &self.executors {
            let executor = match spec.kind {
                ExecutorKind::Serial if !spec.cpu_affinity.is_empty() => {
                    Executor::serial_pinned(&spec.cpu_affinity)
                }
                ExecutorKind::Serial => Executor::serial(),
                ExecutorKind::Parallel => {
                    let executor = Executor::parallel();
                    if !spec.cpu_affinity.is_empty() {
                        executor.set_cpu_affinity(&spec.cpu_affinity);
                    }
                    executor
                }
            };
            if executors.insert(spec.name.clone(), executor).is_some() {
                tracing::warn!(name = %spec.name, "executor name redeclared; later declaration wins");
            }
        }
        executors
    }
}
