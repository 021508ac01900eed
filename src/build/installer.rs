//! Registering artifacts with the running environment.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::utils::exec::Cmd;

/// Outcome of an install call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub success: bool,
    pub report: String,
}

impl InstallReport {
    pub fn ok(report: impl Into<String>) -> Self {
        Self {
            success: true,
            report: report.into(),
        }
    }

    pub fn failed(report: impl Into<String>) -> Self {
        Self {
            success: false,
            report: report.into(),
        }
    }
}

/// Registers and unregisters artifacts. Uninstall is best effort.
pub trait ArtifactInstaller: Send {
    fn install(&mut self, artifact: &Path) -> InstallReport;
    fn uninstall(&mut self, artifact: &Path);
}

/// Installs by copying into a user fonts directory.
#[derive(Debug, Clone)]
pub struct FontDirInstaller {
    fonts_dir: PathBuf,
    refresh_command: Vec<String>,
}

impl FontDirInstaller {
    pub fn new(fonts_dir: PathBuf, refresh_command: Vec<String>) -> Self {
        Self {
            fonts_dir,
            refresh_command,
        }
    }

    /// Platform default user fonts directory.
    pub fn default_fonts_dir() -> &'static str {
        if cfg!(target_os = "macos") {
            "~/Library/Fonts"
        } else {
            "~/.local/share/fonts"
        }
    }

    /// Where `artifact` lands once installed.
    pub fn installed_path(&self, artifact: &Path) -> PathBuf {
        let name = artifact.file_name().unwrap_or(artifact.as_os_str());
        self.fonts_dir.join(name)
    }

    fn refresh(&self) {
        if self.refresh_command.is_empty() {
            return;
        }
        if let Err(e) = Cmd::from_slice(self.refresh_command.as_slice()).run() {
            crate::debug!("install"; "font cache refresh failed: {:#}", e);
        }
    }

    fn copy_in(&self, artifact: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.fonts_dir)?;
        let target = self.installed_path(artifact);
        fs::copy(artifact, &target)?;
        Ok(target)
    }
}

impl ArtifactInstaller for FontDirInstaller {
    fn install(&mut self, artifact: &Path) -> InstallReport {
        match self.copy_in(artifact) {
            Ok(target) => {
                self.refresh();
                InstallReport::ok(format!("installed as {}", target.display()))
            }
            Err(e) => InstallReport::failed(format!(
                "could not copy into {}: {e}",
                self.fonts_dir.display()
            )),
        }
    }

    fn uninstall(&mut self, artifact: &Path) {
        let target = self.installed_path(artifact);
        match fs::remove_file(&target) {
            Ok(()) => self.refresh(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => crate::debug!("install"; "uninstall {}: {}", target.display(), e),
        }
    }
}
