#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use nodejob::config::{RawConfigFile, Settings};
use nodejob::fs::mock::MockFileSystem;
use nodejob::server::ToolHandler;
use nodejob::supervisor::Supervisor;

use crate::fake_engine::FakeEngine;

/// Builder for validated `Settings` to simplify test setup.
pub struct SettingsBuilder {
    raw: RawConfigFile,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawConfigFile::default(),
        }
    }

    pub fn namespace(mut self, ns: &str) -> Self {
        self.raw.engine.namespace = ns.to_string();
        self
    }

    pub fn image(mut self, image: &str) -> Self {
        self.raw.engine.image = image.to_string();
        self
    }

    pub fn install_timeout(mut self, dur: &str) -> Self {
        self.raw.timeouts.install = dur.to_string();
        self
    }

    pub fn run_once_timeout(mut self, dur: &str) -> Self {
        self.raw.timeouts.run_once = dur.to_string();
        self
    }

    pub fn build(self) -> Settings {
        Settings::try_from(self.raw).expect("Failed to build valid settings from builder")
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A supervisor wired to a fresh [`FakeEngine`], plus the engine handle for
/// assertions.
pub fn fake_supervisor(settings: Settings) -> (Supervisor, FakeEngine) {
    let engine = FakeEngine::new();
    let supervisor = Supervisor::new(settings, Arc::new(engine.clone()));
    (supervisor, engine)
}

/// A Node.js project living in a mock filesystem.
pub struct ProjectFixture {
    pub fs: MockFileSystem,
    pub root: PathBuf,
}

impl ProjectFixture {
    /// Project at `root` whose `package.json` is `manifest`.
    pub fn new(root: impl AsRef<Path>, manifest: &str) -> Self {
        let fs = MockFileSystem::new();
        let root = root.as_ref().to_path_buf();
        fs.add_file(root.join("package.json"), manifest);
        Self { fs, root }
    }

    /// Project with `start` and `test` scripts.
    pub fn with_default_scripts(root: impl AsRef<Path>) -> Self {
        Self::new(
            root,
            r#"{"name": "demo", "scripts": {"start": "node server.js", "test": "node --test"}}"#,
        )
    }

    pub fn root_str(&self) -> String {
        self.root.display().to_string()
    }

    /// Tool handler over this project's filesystem and `supervisor`.
    pub fn handler(&self, supervisor: Supervisor) -> ToolHandler {
        ToolHandler::new(supervisor, Arc::new(self.fs.clone()))
    }
}
