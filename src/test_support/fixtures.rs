//! Stub collaborators for common test scenarios.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::core::definition::{GenerationError, TargetDefinition};
use crate::core::project::Project;
use crate::core::store::{PersistenceError, ProjectStore};

/// Scriptable autolinking definition.
///
/// Shared between the target and the test via `Arc`, so a test can flip
/// `set_needs_provider` between runs and inspect the recorded generator
/// calls afterwards.
#[derive(Debug)]
pub struct StubDefinition {
    needs_provider: AtomicBool,
    fail_generation: AtomicBool,
    provider_name: String,
    support_dir: PathBuf,
    /// Recorded `(target_name, output_path)` generator invocations, in call
    /// order.
    pub calls: Mutex<Vec<(String, PathBuf)>>,
}

impl StubDefinition {
    /// A definition that needs a provider named `ModulesProvider.gen.c`
    /// under `support_dir`.
    pub fn new(support_dir: impl Into<PathBuf>) -> Self {
        StubDefinition {
            needs_provider: AtomicBool::new(true),
            fail_generation: AtomicBool::new(false),
            provider_name: "ModulesProvider.gen.c".to_string(),
            support_dir: support_dir.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Flip whether the target currently needs a provider.
    pub fn set_needs_provider(&self, needs: bool) {
        self.needs_provider.store(needs, Ordering::SeqCst);
    }

    /// Make the next `generate` call fail.
    pub fn set_fail_generation(&self, fail: bool) {
        self.fail_generation.store(fail, Ordering::SeqCst);
    }

    /// Target names passed to `generate`, in call order.
    pub fn generated_targets(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl TargetDefinition for StubDefinition {
    fn needs_provider_generation(&self) -> bool {
        self.needs_provider.load(Ordering::SeqCst)
    }

    fn provider_file_name(&self) -> String {
        self.provider_name.clone()
    }

    fn support_files_dir(&self) -> PathBuf {
        self.support_dir.clone()
    }

    fn generate(&self, target_name: &str, output_path: &Path) -> Result<(), GenerationError> {
        self.calls
            .lock()
            .unwrap()
            .push((target_name.to_string(), output_path.to_path_buf()));
        if self.fail_generation.load(Ordering::SeqCst) {
            return Err(GenerationError::new(format!(
                "stub generation failure for `{target_name}`"
            )));
        }
        Ok(())
    }
}

/// In-memory store recording which projects were saved, in save order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub saved: Vec<String>,
}

impl ProjectStore for MemoryStore {
    fn save(&mut self, project: &Project) -> Result<(), PersistenceError> {
        self.saved.push(project.name().to_string());
        Ok(())
    }
}

/// Store whose every save fails, for persistence-error propagation tests.
#[derive(Debug, Default)]
pub struct FailingStore;

impl ProjectStore for FailingStore {
    fn save(&mut self, project: &Project) -> Result<(), PersistenceError> {
        Err(PersistenceError::Write {
            path: project.path().to_path_buf(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only store"),
        })
    }
}
