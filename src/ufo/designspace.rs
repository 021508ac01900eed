//! `.designspace` documents.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};

use super::UfoError;
use super::xml::{attr, attr_f64, reader};
use crate::utils::path::normalize_path;

/// A design axis. Axes with explicit `values` are discrete.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub name: String,
    pub tag: String,
    pub default: f64,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub values: Vec<f64>,
}

impl Axis {
    pub fn is_discrete(&self) -> bool {
        !self.values.is_empty() && self.minimum.is_none() && self.maximum.is_none()
    }
}

/// A master source.
#[derive(Debug, Clone, PartialEq)]
pub struct DsSource {
    pub name: String,
    /// Resolved against the document directory.
    pub filename: PathBuf,
    pub layer: Option<String>,
    pub family_name: Option<String>,
    pub style_name: Option<String>,
    pub location: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DsInstance {
    pub name: String,
    pub family_name: Option<String>,
    pub style_name: Option<String>,
    pub filename: Option<String>,
    pub location: Vec<(String, f64)>,
}

impl DsInstance {
    /// Value passed to the compiler's instance selector.
    pub fn selector(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        match (&self.family_name, &self.style_name) {
            (Some(f), Some(s)) => format!("{f} {s}"),
            (None, Some(s)) => s.clone(),
            (Some(f), None) => f.clone(),
            (None, None) => String::new(),
        }
    }
}

/// Coordinates on the discrete axes only, formatted like `Italic=1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiscreteLocation(pub Vec<(String, String)>);

impl fmt::Display for DiscreteLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("default");
        }
        for (i, (axis, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{axis}={value}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesignSpace {
    pub path: PathBuf,
    pub axes: Vec<Axis>,
    pub sources: Vec<DsSource>,
    pub instances: Vec<DsInstance>,
}

impl DesignSpace {
    pub fn open(path: &Path) -> Result<Self, UfoError> {
        let bytes = fs::read(path).map_err(|e| UfoError::Io(path.to_path_buf(), e))?;
        parse_designspace(&bytes, path)
    }

    /// Discrete location of a source, using axis defaults for missing
    /// dimensions.
    pub fn discrete_location(&self, location: &[(String, f64)]) -> DiscreteLocation {
        DiscreteLocation(
            self.axes
                .iter()
                .filter(|axis| axis.is_discrete())
                .map(|axis| {
                    let value = location
                        .iter()
                        .find_map(|(name, v)| (*name == axis.name).then_some(*v))
                        .unwrap_or(axis.default);
                    (axis.name.clone(), format_coord(value))
                })
                .collect(),
        )
    }

    /// Master UFO paths, deduplicated, in document order.
    pub fn master_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for source in &self.sources {
            if !paths.contains(&source.filename) {
                paths.push(source.filename.clone());
            }
        }
        paths
    }

    /// Index of the default master: the source sitting on every axis default.
    pub fn default_source(&self) -> Option<usize> {
        self.sources.iter().position(|source| {
            self.axes.iter().all(|axis| {
                let value = source
                    .location
                    .iter()
                    .find_map(|(name, v)| (*name == axis.name).then_some(*v))
                    .unwrap_or(axis.default);
                (value - axis.default).abs() < f64::EPSILON
            })
        })
    }
}

fn format_coord(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn parse_designspace(bytes: &[u8], path: &Path) -> Result<DesignSpace, UfoError> {
    let base = path.parent().unwrap_or(Path::new("."));
    let mut reader = reader(bytes);
    let mut ds = DesignSpace {
        path: path.to_path_buf(),
        axes: Vec::new(),
        sources: Vec::new(),
        instances: Vec::new(),
    };

    // Location dimensions attach to whichever of these is open.
    enum Open {
        None,
        Source,
        Instance,
    }
    let mut open = Open::None;

    loop {
        let event = reader.read_event().map_err(|e| UfoError::xml(path, e))?;
        let (elem, is_empty) = match event {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(e) => {
                match e.name().as_ref() {
                    b"source" | b"instance" => open = Open::None,
                    _ => {}
                }
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        match elem.name().as_ref() {
            b"axis" => ds.axes.push(parse_axis(&elem, path)?),
            b"source" => {
                let filename = attr(&elem, b"filename")
                    .ok_or_else(|| UfoError::format(path, "<source> without filename"))?;
                ds.sources.push(DsSource {
                    name: attr(&elem, b"name").unwrap_or_default(),
                    filename: normalize_path(&base.join(filename)),
                    layer: attr(&elem, b"layer"),
                    family_name: attr(&elem, b"familyname"),
                    style_name: attr(&elem, b"stylename"),
                    location: Vec::new(),
                });
                if !is_empty {
                    open = Open::Source;
                }
            }
            b"instance" => {
                ds.instances.push(DsInstance {
                    name: attr(&elem, b"name").unwrap_or_default(),
                    family_name: attr(&elem, b"familyname"),
                    style_name: attr(&elem, b"stylename"),
                    filename: attr(&elem, b"filename"),
                    location: Vec::new(),
                });
                if !is_empty {
                    open = Open::Instance;
                }
            }
            b"dimension" => {
                let dim = parse_dimension(&elem, path)?;
                match open {
                    Open::Source => {
                        if let Some(source) = ds.sources.last_mut() {
                            source.location.push(dim);
                        }
                    }
                    Open::Instance => {
                        if let Some(instance) = ds.instances.last_mut() {
                            instance.location.push(dim);
                        }
                    }
                    Open::None => {}
                }
            }
            _ => {}
        }
    }

    if ds.sources.is_empty() {
        return Err(UfoError::format(path, "design space has no sources"));
    }
    Ok(ds)
}

fn parse_axis(elem: &BytesStart<'_>, path: &Path) -> Result<Axis, UfoError> {
    let name = attr(elem, b"name").ok_or_else(|| UfoError::format(path, "<axis> without name"))?;
    let values = match attr(elem, b"values") {
        Some(raw) => raw
            .split_whitespace()
            .map(|v| {
                v.parse()
                    .map_err(|_| UfoError::format(path, format!("axis `{name}`: bad value `{v}`")))
            })
            .collect::<Result<Vec<f64>, _>>()?,
        None => Vec::new(),
    };
    let minimum = attr_f64(elem, b"minimum");
    let maximum = attr_f64(elem, b"maximum");
    let default = attr_f64(elem, b"default")
        .or(minimum)
        .or_else(|| values.first().copied())
        .unwrap_or(0.0);
    Ok(Axis {
        tag: attr(elem, b"tag").unwrap_or_default(),
        name,
        default,
        minimum,
        maximum,
        values,
    })
}

fn parse_dimension(elem: &BytesStart<'_>, path: &Path) -> Result<(String, f64), UfoError> {
    let name =
        attr(elem, b"name").ok_or_else(|| UfoError::format(path, "<dimension> without name"))?;
    let value = attr_f64(elem, b"xvalue")
        .ok_or_else(|| UfoError::format(path, format!("dimension `{name}` without xvalue")))?;
    Ok((name, value))
}
