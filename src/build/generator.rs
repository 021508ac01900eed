//! Artifact generation through an external compiler.

use std::fs;
use std::path::{Path, PathBuf};

use super::GenerateError;
use crate::utils::exec::{Cmd, FONTMAKE_NOISE};

/// Binary encoding of the produced artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtifactFormat {
    #[default]
    Otf,
}

impl ArtifactFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Otf => "otf",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    pub format: ArtifactFormat,
    pub autohint: bool,
    pub decompose: bool,
    /// Explicit glyph order taken from the source.
    pub glyph_order: Vec<String>,
}

impl GenerateOptions {
    /// The fixed test-install profile: otf, no autohinting, no
    /// decomposition, source glyph order.
    pub fn test_install(glyph_order: Vec<String>) -> Self {
        Self {
            format: ArtifactFormat::Otf,
            autohint: false,
            decompose: false,
            glyph_order,
        }
    }
}

/// What to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateTarget {
    /// A single UFO (a font source, or a design-space master).
    Font(PathBuf),
    /// One named instance of a design space.
    Instance { designspace: PathBuf, instance: String },
}

impl GenerateTarget {
    pub fn input(&self) -> &Path {
        match self {
            Self::Font(path) => path,
            Self::Instance { designspace, .. } => designspace,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Font(path) => path.display().to_string(),
            Self::Instance {
                designspace,
                instance,
            } => format!("{} [{instance}]", designspace.display()),
        }
    }
}

/// Turns a source into a binary artifact on disk. May fail.
pub trait ArtifactGenerator: Send {
    /// Write the artifact to `output`, returning the compiler's report.
    fn generate(
        &mut self,
        target: &GenerateTarget,
        output: &Path,
        options: &GenerateOptions,
    ) -> Result<String, GenerateError>;
}

/// Runs a configurable compiler command (default `fontmake`).
///
/// Argument templates expand `{input}`, `{output}`, `{instance}` and
/// `{format}`. `SOURCE_DATE_EPOCH` is pinned so unchanged sources compile to
/// identical bytes.
///
/// A non-empty glyph order appends `glyph_order_args`, whose
/// `{glyph_order_file}` names a file holding one glyph name per line. The
/// file lives next to the output for the duration of the compile.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    pub command: Vec<String>,
    pub font_args: Vec<String>,
    pub instance_args: Vec<String>,
    pub autohint_flag: String,
    pub decompose_flag: String,
    pub glyph_order_args: Vec<String>,
}

/// Where the glyph order for a compile to `output` is written.
pub fn glyph_order_file(output: &Path) -> PathBuf {
    output.with_extension("glyphorder")
}

impl CommandGenerator {
    /// Fail early when the compiler is not installed.
    pub fn check_available(&self) -> Result<PathBuf, GenerateError> {
        let program = self.command.first().map(String::as_str).unwrap_or_default();
        which::which(program).map_err(|_| GenerateError::MissingProgram(program.to_owned()))
    }

    /// Full argument list for one compile.
    pub fn build_args(
        &self,
        target: &GenerateTarget,
        output: &Path,
        options: &GenerateOptions,
    ) -> Vec<String> {
        let (template, instance) = match target {
            GenerateTarget::Font(_) => (&self.font_args, ""),
            GenerateTarget::Instance { instance, .. } => (&self.instance_args, instance.as_str()),
        };
        let input = target.input().to_string_lossy();
        let order_file = glyph_order_file(output);
        let order_file = order_file.to_string_lossy();
        let output = output.to_string_lossy();
        let expand = |arg: &String| {
            arg.replace("{input}", &input)
                .replace("{output}", &output)
                .replace("{instance}", instance)
                .replace("{format}", options.format.extension())
                .replace("{glyph_order_file}", &order_file)
        };

        let mut args: Vec<String> = self.command[1.min(self.command.len())..].to_vec();
        args.extend(template.iter().map(expand));
        if !options.glyph_order.is_empty() {
            args.extend(self.glyph_order_args.iter().map(expand));
        }
        if options.autohint && !self.autohint_flag.is_empty() {
            args.push(self.autohint_flag.clone());
        }
        if options.decompose && !self.decompose_flag.is_empty() {
            args.push(self.decompose_flag.clone());
        }
        args
    }
}

impl ArtifactGenerator for CommandGenerator {
    fn generate(
        &mut self,
        target: &GenerateTarget,
        output: &Path,
        options: &GenerateOptions,
    ) -> Result<String, GenerateError> {
        let Some(program) = self.command.first() else {
            return Err(GenerateError::MissingProgram(String::new()));
        };
        let args = self.build_args(target, output, options);
        crate::debug!("install"; "{} {}", program, args.join(" "));

        let order_file = (!options.glyph_order.is_empty() && !self.glyph_order_args.is_empty())
            .then(|| glyph_order_file(output));
        if let Some(path) = &order_file {
            let mut names = options.glyph_order.join("\n");
            names.push('\n');
            fs::write(path, names).map_err(|e| GenerateError::Failed {
                target: target.describe(),
                message: format!("cannot write glyph order to {}: {e}", path.display()),
            })?;
        }

        let mut cmd = Cmd::new(program)
            .args(&args)
            .env("SOURCE_DATE_EPOCH", "0")
            .quiet(&FONTMAKE_NOISE);
        if let Some(dir) = target.input().parent() {
            cmd = cmd.cwd(dir);
        }

        let result = cmd.run();
        if let Some(path) = &order_file {
            let _ = fs::remove_file(path);
        }
        let result = result.map_err(|e| GenerateError::Failed {
            target: target.describe(),
            message: format!("{e:#}"),
        })?;

        if !output.is_file() {
            return Err(GenerateError::NoOutput(output.to_path_buf()));
        }
        Ok(String::from_utf8_lossy(&result.stderr).trim().to_owned())
    }
}
