//! In-memory collaborators for tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use super::{
    ArtifactGenerator, ArtifactInstaller, GenerateError, GenerateOptions, GenerateTarget,
    InstallReport,
};

/// Shared view of what the fakes did.
#[derive(Debug, Default)]
pub struct FakeLog {
    pub generated: Vec<GenerateTarget>,
    pub installed: Vec<PathBuf>,
    pub uninstalled: Vec<PathBuf>,
    /// Currently registered with the "environment".
    pub live: FxHashSet<PathBuf>,
    /// Inputs whose generation fails.
    pub fail_inputs: FxHashSet<PathBuf>,
    /// Reject every install.
    pub reject_installs: bool,
}

pub type SharedLog = Arc<Mutex<FakeLog>>;

/// Writes bytes derived from the input's content, so unchanged sources
/// produce identical artifacts.
pub struct FakeGenerator(pub SharedLog);

impl ArtifactGenerator for FakeGenerator {
    fn generate(
        &mut self,
        target: &GenerateTarget,
        output: &Path,
        _options: &GenerateOptions,
    ) -> Result<String, GenerateError> {
        let mut log = self.0.lock();
        log.generated.push(target.clone());
        if log.fail_inputs.contains(target.input()) {
            return Err(GenerateError::Failed {
                target: target.describe(),
                message: "boom".into(),
            });
        }

        let mut bytes = Vec::new();
        match target {
            // Content only: a moved source produces the same artifact.
            GenerateTarget::Font(ufo) => collect_bytes(ufo, &mut bytes),
            // Instances depend on the masters only.
            GenerateTarget::Instance { designspace, .. } => {
                bytes.extend(target.describe().into_bytes());
                let dir = designspace.parent().unwrap_or(Path::new("."));
                let mut masters: Vec<_> = fs::read_dir(dir)
                    .into_iter()
                    .flatten()
                    .flatten()
                    .map(|e| e.path())
                    .filter(|p| p.extension().is_some_and(|ext| ext == "ufo"))
                    .collect();
                masters.sort();
                for master in masters {
                    collect_bytes(&master, &mut bytes);
                }
            }
        }
        fs::write(output, bytes).map_err(|e| GenerateError::Failed {
            target: target.describe(),
            message: e.to_string(),
        })?;
        Ok(String::new())
    }
}

fn collect_bytes(path: &Path, out: &mut Vec<u8>) {
    if path.is_file() {
        if let Ok(data) = fs::read(path) {
            out.extend(data);
        }
        return;
    }
    let Ok(entries) = fs::read_dir(path) else {
        return;
    };
    let mut paths: Vec<_> = entries.flatten().map(|e| e.path()).collect();
    paths.sort();
    for p in paths {
        collect_bytes(&p, out);
    }
}

pub struct FakeInstaller(pub SharedLog);

impl ArtifactInstaller for FakeInstaller {
    fn install(&mut self, artifact: &Path) -> InstallReport {
        let mut log = self.0.lock();
        if log.reject_installs {
            return InstallReport::failed("rejected");
        }
        log.installed.push(artifact.to_path_buf());
        log.live.insert(artifact.to_path_buf());
        InstallReport::ok("ok")
    }

    fn uninstall(&mut self, artifact: &Path) {
        let mut log = self.0.lock();
        log.uninstalled.push(artifact.to_path_buf());
        log.live.remove(artifact);
    }
}

pub fn fakes() -> (SharedLog, Box<FakeGenerator>, Box<FakeInstaller>) {
    let log = SharedLog::default();
    (
        log.clone(),
        Box::new(FakeGenerator(log.clone())),
        Box::new(FakeInstaller(log)),
    )
}

// ----------------------------------------------------------------------------
// Fixtures
// ----------------------------------------------------------------------------

pub fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A minimal UFO with one square glyph `a`.
pub fn make_ufo(path: &Path, family: &str, style: &str) {
    write(
        &path.join("fontinfo.plist"),
        &format!(
            "<plist><dict><key>familyName</key><string>{family}</string>\
             <key>styleName</key><string>{style}</string></dict></plist>"
        ),
    );
    write(
        &path.join("glyphs/contents.plist"),
        "<plist><dict><key>a</key><string>a.glif</string></dict></plist>",
    );
    set_glyph(path, 100);
}

/// Rewrite glyph `a` as a square of `size` units.
pub fn set_glyph(ufo: &Path, size: i32) {
    write(
        &ufo.join("glyphs/a.glif"),
        &format!(
            "<glyph name=\"a\" format=\"2\"><outline><contour>\
             <point x=\"0\" y=\"0\" type=\"line\"/>\
             <point x=\"{size}\" y=\"0\" type=\"line\"/>\
             <point x=\"{size}\" y=\"{size}\" type=\"line\"/>\
             <point x=\"0\" y=\"{size}\" type=\"line\"/>\
             </contour></outline></glyph>"
        ),
    );
}

/// A design space over `masters` with the given instance style names.
pub fn make_designspace(path: &Path, masters: &[&str], instances: &[&str]) {
    let mut sources = String::new();
    for (i, master) in masters.iter().enumerate() {
        sources.push_str(&format!(
            "<source filename=\"{master}\"><location>\
             <dimension name=\"Weight\" xvalue=\"{}\"/></location></source>",
            100 + i * 100
        ));
    }
    let mut insts = String::new();
    for style in instances {
        insts.push_str(&format!(
            "<instance name=\"Fam {style}\" familyname=\"Fam\" stylename=\"{style}\"/>"
        ));
    }
    write(
        path,
        &format!(
            "<designspace format=\"4.1\"><axes>\
             <axis tag=\"wght\" name=\"Weight\" minimum=\"100\" maximum=\"900\" default=\"100\"/>\
             </axes><sources>{sources}</sources><instances>{insts}</instances></designspace>"
        ),
    );
}
