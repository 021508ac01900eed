//! Readers for the on-disk source formats.
//!
//! ```text
//! ufo/
//! ├── xml.rs          # quick-xml helpers shared by the readers
//! ├── plist.rs        # property lists (fontinfo, lib, contents, layercontents)
//! ├── glif.rs         # glyph outlines + in-place contour/point rewriting
//! ├── font.rs         # UFO directory: names, glyph order, layers
//! └── designspace.rs  # axes (continuous / discrete), sources, instances
//! ```
//!
//! Only the parts needed to name artifacts, drive the external compiler and
//! check master compatibility are modelled. Everything else in a file is
//! passed through untouched when a glyph is rewritten.

mod designspace;
mod error;
mod font;
mod glif;
mod plist;
mod xml;

#[cfg(test)]
mod tests;

pub use designspace::{DesignSpace, DiscreteLocation};
pub use error::UfoError;
pub use font::UfoFont;
pub use glif::{Component, Contour, GlifEdit, Glyph, Point, PointType, read_glif, rewrite_glif};
