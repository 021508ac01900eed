use std::fs;
use std::path::Path;

use tempfile::TempDir;

use super::*;

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn plist(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<plist version=\"1.0\">\n{body}\n</plist>\n"
    )
}

fn make_ufo(root: &Path, name: &str, family: &str, style: &str) -> std::path::PathBuf {
    let ufo = root.join(name);
    write(
        &ufo.join("fontinfo.plist"),
        &plist(&format!(
            "<dict><key>familyName</key><string>{family}</string>\
             <key>styleName</key><string>{style}</string></dict>"
        )),
    );
    write(
        &ufo.join("lib.plist"),
        &plist("<dict><key>public.glyphOrder</key><array><string>a</string><string>b</string></array></dict>"),
    );
    write(
        &ufo.join("glyphs/contents.plist"),
        &plist("<dict><key>a</key><string>a.glif</string><key>b</key><string>b.glif</string></dict>"),
    );
    ufo
}

#[test]
fn test_open_ufo_reads_names_and_order() {
    let dir = TempDir::new().unwrap();
    let ufo = make_ufo(dir.path(), "Test-Bold.ufo", "Test Sans", "Bold");

    let font = UfoFont::open(&ufo).unwrap();
    assert_eq!(font.display_name(), "Test Sans Bold");
    assert_eq!(font.glyph_order, vec!["a", "b"]);
    assert_eq!(font.layer_dir(None), ufo.join("glyphs"));

    let files = font.glyph_files(None).unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[1], ("b".to_string(), ufo.join("glyphs/b.glif")));
}

#[test]
fn test_open_ufo_without_fontinfo_uses_stem() {
    let dir = TempDir::new().unwrap();
    let ufo = dir.path().join("Sketch.ufo");
    fs::create_dir_all(&ufo).unwrap();

    let font = UfoFont::open(&ufo).unwrap();
    assert_eq!(font.display_name(), "Sketch");
    assert!(font.glyph_files(None).unwrap().is_empty());
}

#[test]
fn test_open_missing_ufo_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = UfoFont::open(&dir.path().join("Nope.ufo")).unwrap_err();
    assert!(matches!(err, UfoError::Io(..)));
}

#[test]
fn test_layercontents_maps_layers() {
    let dir = TempDir::new().unwrap();
    let ufo = make_ufo(dir.path(), "L.ufo", "L", "Regular");
    write(
        &ufo.join("layercontents.plist"),
        &plist(
            "<array>\
             <array><string>public.default</string><string>glyphs</string></array>\
             <array><string>sketch</string><string>glyphs.sketch</string></array>\
             </array>",
        ),
    );

    let font = UfoFont::open(&ufo).unwrap();
    assert_eq!(font.layers.len(), 2);
    assert_eq!(font.layer_dir(Some("sketch")), ufo.join("glyphs.sketch"));
    assert_eq!(font.layer_dir(Some("missing")), ufo.join("glyphs"));
}

const DESIGNSPACE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<designspace format="4.1">
  <axes>
    <axis tag="wght" name="Weight" minimum="300" maximum="700" default="300"/>
    <axis tag="ital" name="Italic" values="0 1" default="0"/>
  </axes>
  <sources>
    <source filename="masters/Light.ufo" name="light" familyname="Fam" stylename="Light">
      <location>
        <dimension name="Weight" xvalue="300"/>
        <dimension name="Italic" xvalue="0"/>
      </location>
    </source>
    <source filename="masters/Bold.ufo" name="bold">
      <location>
        <dimension name="Weight" xvalue="700"/>
      </location>
    </source>
    <source filename="masters/LightItalic.ufo" name="light-italic" layer="support">
      <location>
        <dimension name="Weight" xvalue="300"/>
        <dimension name="Italic" xvalue="1"/>
      </location>
    </source>
  </sources>
  <instances>
    <instance name="Fam Regular" familyname="Fam" stylename="Regular" filename="instances/Fam-Regular.ufo">
      <location>
        <dimension name="Weight" xvalue="400"/>
      </location>
    </instance>
    <instance familyname="Fam" stylename="Bold Italic"/>
  </instances>
</designspace>
"#;

#[test]
fn test_parse_designspace() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Fam.designspace");
    write(&path, DESIGNSPACE);

    let ds = DesignSpace::open(&path).unwrap();
    assert_eq!(ds.axes.len(), 2);
    assert!(!ds.axes[0].is_discrete());
    assert!(ds.axes[1].is_discrete());
    assert_eq!(ds.axes[1].values, vec![0.0, 1.0]);

    assert_eq!(ds.sources.len(), 3);
    assert!(ds.sources[0].filename.ends_with("masters/Light.ufo"));
    assert!(ds.sources[0].filename.is_absolute());
    assert_eq!(ds.sources[2].layer.as_deref(), Some("support"));
    assert_eq!(ds.sources[1].location, vec![("Weight".to_string(), 700.0)]);

    assert_eq!(ds.instances.len(), 2);
    assert_eq!(ds.instances[0].selector(), "Fam Regular");
    assert_eq!(ds.instances[1].selector(), "Fam Bold Italic");
    assert_eq!(ds.default_source(), Some(0));
    assert_eq!(ds.master_paths().len(), 3);
}

#[test]
fn test_discrete_location_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Fam.designspace");
    write(&path, DESIGNSPACE);
    let ds = DesignSpace::open(&path).unwrap();

    let upright = ds.discrete_location(&ds.sources[1].location);
    let italic = ds.discrete_location(&ds.sources[2].location);
    assert_eq!(upright.to_string(), "Italic=0");
    assert_eq!(italic.to_string(), "Italic=1");
    assert_eq!(ds.discrete_location(&ds.sources[0].location), upright);
}

#[test]
fn test_designspace_without_sources_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Empty.designspace");
    write(&path, "<designspace><axes/></designspace>");
    assert!(matches!(DesignSpace::open(&path), Err(UfoError::Format { .. })));
}
