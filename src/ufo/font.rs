//! UFO font directories.

use std::path::{Path, PathBuf};

use super::UfoError;
use super::plist::read_plist;

const DEFAULT_LAYER: &str = "public.default";
const DEFAULT_LAYER_DIR: &str = "glyphs";

/// The parts of a UFO needed to name, build and compare it.
#[derive(Debug, Clone)]
pub struct UfoFont {
    pub path: PathBuf,
    pub family_name: Option<String>,
    pub style_name: Option<String>,
    /// `public.glyphOrder` from `lib.plist`.
    pub glyph_order: Vec<String>,
    /// `(layer name, directory)` pairs from `layercontents.plist`.
    pub layers: Vec<(String, String)>,
}

impl UfoFont {
    /// Read a UFO. Zipped sources (`.ufoz`) only carry their file stem as name.
    pub fn open(path: &Path) -> Result<Self, UfoError> {
        let mut font = Self {
            path: path.to_path_buf(),
            family_name: None,
            style_name: None,
            glyph_order: Vec::new(),
            layers: vec![(DEFAULT_LAYER.to_owned(), DEFAULT_LAYER_DIR.to_owned())],
        };

        if !path.is_dir() {
            if path.exists() {
                return Ok(font);
            }
            return Err(UfoError::Io(
                path.to_path_buf(),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }

        let fontinfo = path.join("fontinfo.plist");
        if fontinfo.is_file() {
            let info = read_plist(&fontinfo)?;
            font.family_name = info.get("familyName").and_then(|v| v.as_str()).map(str::to_owned);
            font.style_name = info.get("styleName").and_then(|v| v.as_str()).map(str::to_owned);
        }

        let lib = path.join("lib.plist");
        if lib.is_file() {
            let lib = read_plist(&lib)?;
            if let Some(order) = lib.get("public.glyphOrder") {
                font.glyph_order = order.string_list();
            }
        }

        let layercontents = path.join("layercontents.plist");
        if layercontents.is_file() {
            let layers: Vec<_> = read_plist(&layercontents)?
                .as_array()
                .unwrap_or_default()
                .iter()
                .filter_map(|pair| {
                    let pair = pair.string_list();
                    match pair.as_slice() {
                        [name, dir] => Some((name.clone(), dir.clone())),
                        _ => None,
                    }
                })
                .collect();
            if !layers.is_empty() {
                font.layers = layers;
            }
        }

        Ok(font)
    }

    /// `"{family} {style}"`, falling back to the directory stem.
    pub fn display_name(&self) -> String {
        match (&self.family_name, &self.style_name) {
            (Some(family), Some(style)) => format!("{family} {style}"),
            (Some(family), None) => family.clone(),
            _ => self.file_stem(),
        }
    }

    pub fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_owned())
    }

    /// Glyph directory for a layer (`None` = default layer).
    pub fn layer_dir(&self, layer: Option<&str>) -> PathBuf {
        let dir = match layer {
            None => self.layers.first().map(|(_, dir)| dir.as_str()),
            Some(name) => self
                .layers
                .iter()
                .find_map(|(n, dir)| (n == name).then_some(dir.as_str())),
        };
        self.path.join(dir.unwrap_or(DEFAULT_LAYER_DIR))
    }

    /// `(glyph name, .glif path)` pairs listed in a layer's `contents.plist`.
    pub fn glyph_files(&self, layer: Option<&str>) -> Result<Vec<(String, PathBuf)>, UfoError> {
        let dir = self.layer_dir(layer);
        let contents = dir.join("contents.plist");
        if !contents.is_file() {
            return Ok(Vec::new());
        }
        let plist = read_plist(&contents)?;
        Ok(plist
            .as_dict()
            .unwrap_or_default()
            .iter()
            .filter_map(|(name, file)| Some((name.clone(), dir.join(file.as_str()?))))
            .collect())
    }
}
