//! `[generator]` section configuration.
//!
//! The external compiler and its argument templates. Templates expand
//! `{input}`, `{output}`, `{instance}` and `{format}`. `glyph_order_args` is
//! appended when the source declares a glyph order and may also use
//! `{glyph_order_file}`, a file with one glyph name per line.
//!
//! fontmake reads the order from the UFO itself, so it is left empty there.
//!
//! # Example
//!
//! ```toml
//! [generator]
//! command = ["fontmake"]
//! font_args = ["-u", "{input}", "-o", "{format}", "--output-path", "{output}"]
//! instance_args = ["-m", "{input}", "-i", "{instance}", "-o", "{format}", "--output-path", "{output}"]
//! autohint_flag = "--autohint"
//! decompose_flag = "--flatten-components"
//! glyph_order_args = []
//! ```

use serde::{Deserialize, Serialize};

use crate::build::CommandGenerator;
use crate::config::{ConfigDiagnostics, FieldPath};

const PLACEHOLDERS: [&str; 4] = ["{input}", "{output}", "{instance}", "{format}"];
const GLYPH_ORDER_PLACEHOLDERS: [&str; 5] =
    ["{input}", "{output}", "{instance}", "{format}", "{glyph_order_file}"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub command: Vec<String>,
    pub font_args: Vec<String>,
    pub instance_args: Vec<String>,
    pub autohint_flag: String,
    pub decompose_flag: String,
    pub glyph_order_args: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let args = |list: &[&str]| list.iter().map(|s| (*s).to_owned()).collect();
        Self {
            command: vec!["fontmake".into()],
            font_args: args(&["-u", "{input}", "-o", "{format}", "--output-path", "{output}"]),
            instance_args: args(&[
                "-m",
                "{input}",
                "-i",
                "{instance}",
                "-o",
                "{format}",
                "--output-path",
                "{output}",
            ]),
            autohint_flag: "--autohint".into(),
            decompose_flag: "--flatten-components".into(),
            glyph_order_args: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    pub fn to_generator(&self) -> CommandGenerator {
        CommandGenerator {
            command: self.command.clone(),
            font_args: self.font_args.clone(),
            instance_args: self.instance_args.clone(),
            autohint_flag: self.autohint_flag.clone(),
            decompose_flag: self.decompose_flag.clone(),
            glyph_order_args: self.glyph_order_args.clone(),
        }
    }

    pub(crate) fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.command.first().is_none_or(|program| program.trim().is_empty()) {
            diag.error_with_hint(
                FieldPath::new("generator.command"),
                "generator command is empty",
                "e.g. command = [\"fontmake\"]",
            );
        }

        for (field, args) in [
            (FieldPath::new("generator.font_args"), &self.font_args),
            (FieldPath::new("generator.instance_args"), &self.instance_args),
        ] {
            if !args.iter().any(|arg| arg.contains("{output}")) {
                diag.error(field, "arguments never mention {output}");
            }
            check_placeholders(field, args, &PLACEHOLDERS, diag);
        }
        check_placeholders(
            FieldPath::new("generator.glyph_order_args"),
            &self.glyph_order_args,
            &GLYPH_ORDER_PLACEHOLDERS,
            diag,
        );
    }
}

fn check_placeholders(
    field: FieldPath,
    args: &[String],
    known: &[&str],
    diag: &mut ConfigDiagnostics,
) {
    for arg in args {
        if let Some(unknown) = unknown_placeholder(arg, known) {
            diag.error_with_hint(
                field,
                format!("unknown placeholder `{unknown}`"),
                format!("known placeholders: {}", known.join(", ")),
            );
        }
    }
}

/// First `{name}` in `arg` that is not in `known`.
fn unknown_placeholder<'a>(arg: &'a str, known: &[&str]) -> Option<&'a str> {
    let mut rest = arg;
    while let Some(start) = rest.find('{') {
        let end = rest[start..].find('}')? + start;
        let token = &rest[start..=end];
        if !known.contains(&token) {
            return Some(token);
        }
        rest = &rest[end + 1..];
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{PLACEHOLDERS, unknown_placeholder};
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_default_generator_is_valid() {
        let config = test_parse_config("");
        let mut diag = ConfigDiagnostics::new();
        config.generator.validate(&mut diag);
        assert!(diag.is_empty());
        assert_eq!(config.generator.to_generator().command, ["fontmake"]);
    }

    #[test]
    fn test_empty_command_rejected() {
        let config = test_parse_config("[generator]\ncommand = []");
        let mut diag = ConfigDiagnostics::new();
        config.generator.validate(&mut diag);
        assert_eq!(diag.errors()[0].field.as_str(), "generator.command");
    }

    #[test]
    fn test_unknown_placeholder() {
        assert_eq!(unknown_placeholder("--out={output}", &PLACEHOLDERS), None);
        assert_eq!(unknown_placeholder("{input}:{style}", &PLACEHOLDERS), Some("{style}"));
        assert_eq!(unknown_placeholder("plain", &PLACEHOLDERS), None);

        let config = test_parse_config("[generator]\nfont_args = [\"-u\", \"{input}\"]");
        let mut diag = ConfigDiagnostics::new();
        config.generator.validate(&mut diag);
        assert_eq!(diag.len(), 1);
        assert_eq!(diag.errors()[0].field.as_str(), "generator.font_args");
    }

    #[test]
    fn test_glyph_order_args() {
        let config = test_parse_config(
            "[generator]\nglyph_order_args = [\"--order\", \"{glyph_order_file}\"]",
        );
        let mut diag = ConfigDiagnostics::new();
        config.generator.validate(&mut diag);
        assert!(diag.is_empty());
        assert_eq!(
            config.generator.to_generator().glyph_order_args,
            ["--order", "{glyph_order_file}"]
        );

        // Only meaningful where an order is being passed.
        let config = test_parse_config(
            "[generator]\nfont_args = [\"{output}\", \"{glyph_order_file}\"]",
        );
        let mut diag = ConfigDiagnostics::new();
        config.generator.validate(&mut diag);
        assert_eq!(diag.errors()[0].field.as_str(), "generator.font_args");
    }
}
