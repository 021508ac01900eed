//! `.glif` glyph files: outline reading and structure-preserving rewrites.

use std::fs;
use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesStart, Event};

use super::UfoError;
use super::xml::{attr, attr_f64, reader};

/// Point type as written in the `type` attribute (absent = off-curve).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointType {
    Move,
    Line,
    Curve,
    QCurve,
    OffCurve,
}

impl PointType {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("move") => Self::Move,
            Some("line") => Self::Line,
            Some("curve") => Self::Curve,
            Some("qcurve") => Self::QCurve,
            _ => Self::OffCurve,
        }
    }

    /// One-letter code used for structural signatures.
    pub const fn code(self) -> char {
        match self {
            Self::Move => 'm',
            Self::Line => 'l',
            Self::Curve => 'c',
            Self::QCurve => 'q',
            Self::OffCurve => 'o',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub kind: PointType,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    pub points: Vec<Point>,
}

impl Contour {
    /// Open contours start with a `move` point and cannot be rotated.
    pub fn is_open(&self) -> bool {
        self.points.first().is_some_and(|p| p.kind == PointType::Move)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub base: String,
    pub x_offset: f64,
    pub y_offset: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Glyph {
    pub name: String,
    pub contours: Vec<Contour>,
    pub components: Vec<Component>,
}

/// Read a glyph file.
pub fn read_glif(path: &Path) -> Result<Glyph, UfoError> {
    let bytes = fs::read(path).map_err(|e| UfoError::Io(path.to_path_buf(), e))?;
    parse_glif(&bytes, path)
}

/// Parse glyph bytes. Only the outline is modelled.
pub(super) fn parse_glif(bytes: &[u8], path: &Path) -> Result<Glyph, UfoError> {
    let mut reader = reader(bytes);
    let mut glyph = Glyph::default();
    let mut in_outline = false;
    let mut current: Option<Contour> = None;

    loop {
        let event = reader.read_event().map_err(|e| UfoError::xml(path, e))?;
        match event {
            Event::Start(e) | Event::Empty(e) if !in_outline => match e.name().as_ref() {
                b"glyph" => glyph.name = attr(&e, b"name").unwrap_or_default(),
                b"outline" => in_outline = true,
                _ => {}
            },
            Event::Start(e) => match e.name().as_ref() {
                b"contour" => current = Some(Contour::default()),
                b"point" => push_point(&mut current, &e, path)?,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"contour" => glyph.contours.push(Contour::default()),
                b"point" => push_point(&mut current, &e, path)?,
                b"component" => glyph.components.push(Component {
                    base: attr(&e, b"base").unwrap_or_default(),
                    x_offset: attr_f64(&e, b"xOffset").unwrap_or(0.0),
                    y_offset: attr_f64(&e, b"yOffset").unwrap_or(0.0),
                }),
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"contour" => {
                    if let Some(contour) = current.take() {
                        glyph.contours.push(contour);
                    }
                }
                b"outline" => in_outline = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if glyph.name.is_empty() {
        return Err(UfoError::format(path, "glyph has no name"));
    }
    Ok(glyph)
}

fn push_point(
    current: &mut Option<Contour>,
    elem: &BytesStart<'_>,
    path: &Path,
) -> Result<(), UfoError> {
    let Some(contour) = current.as_mut() else {
        return Err(UfoError::format(path, "<point> outside of <contour>"));
    };
    let (Some(x), Some(y)) = (attr_f64(elem, b"x"), attr_f64(elem, b"y")) else {
        return Err(UfoError::format(path, "<point> without numeric x/y"));
    };
    contour.points.push(Point {
        x,
        y,
        kind: PointType::parse(attr(elem, b"type").as_deref()),
    });
    Ok(())
}

// ============================================================================
// Rewriting
// ============================================================================

/// A structural correction to apply to a glyph file.
///
/// Slot `i` of the rewritten outline receives original contour
/// `contour_order[i]`, whose points are rotated left by `rotations[i]`
/// (new point `j` = old point `(j + r) % len`). Components are reordered the
/// same way through `component_order`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlifEdit {
    pub contour_order: Vec<usize>,
    pub rotations: Vec<usize>,
    pub component_order: Vec<usize>,
}

impl GlifEdit {
    /// An edit that leaves the glyph unchanged.
    pub fn is_identity(&self) -> bool {
        self.contour_order.iter().enumerate().all(|(i, &j)| i == j)
            && self.rotations.iter().all(|&r| r == 0)
            && self.component_order.iter().enumerate().all(|(i, &j)| i == j)
    }
}

/// `[start, end]` event index range of one element.
type Span = (usize, usize);

/// Apply `edit` to glyph bytes, keeping every other event untouched.
pub fn rewrite_glif(bytes: &[u8], edit: &GlifEdit, path: &Path) -> Result<Vec<u8>, UfoError> {
    let events = read_events(bytes, path)?;
    let (contours, components) = outline_spans(&events);

    if edit.contour_order.len() != contours.len() || edit.rotations.len() != contours.len() {
        return Err(UfoError::format(
            path,
            format!(
                "edit expects {} contours, file has {}",
                edit.contour_order.len(),
                contours.len()
            ),
        ));
    }
    if edit.component_order.len() != components.len() {
        return Err(UfoError::format(
            path,
            format!(
                "edit expects {} components, file has {}",
                edit.component_order.len(),
                components.len()
            ),
        ));
    }

    let mut writer = Writer::new(Vec::with_capacity(bytes.len()));
    let mut i = 0;
    while i < events.len() {
        if let Some(slot) = contours.iter().position(|&(s, _)| s == i) {
            let source = contours[edit.contour_order[slot]];
            let rotated = rotate_points(&events, source, edit.rotations[slot]);
            for event in rotated {
                write(&mut writer, event, path)?;
            }
            i = contours[slot].1 + 1;
            continue;
        }
        if let Some(slot) = components.iter().position(|&(s, _)| s == i) {
            let (start, end) = components[edit.component_order[slot]];
            for event in &events[start..=end] {
                write(&mut writer, event, path)?;
            }
            i = components[slot].1 + 1;
            continue;
        }
        write(&mut writer, &events[i], path)?;
        i += 1;
    }

    Ok(writer.into_inner())
}

fn write(writer: &mut Writer<Vec<u8>>, event: &Event<'static>, path: &Path) -> Result<(), UfoError> {
    writer
        .write_event(event.clone())
        .map_err(|e| UfoError::xml(path, e))
}

fn read_events(bytes: &[u8], path: &Path) -> Result<Vec<Event<'static>>, UfoError> {
    let mut reader = reader(bytes);
    let mut events = Vec::new();
    loop {
        match reader.read_event().map_err(|e| UfoError::xml(path, e))? {
            Event::Eof => return Ok(events),
            event => events.push(event.into_owned()),
        }
    }
}

fn element_name(event: &Event<'_>) -> Option<Vec<u8>> {
    match event {
        Event::Start(e) | Event::Empty(e) => Some(e.name().as_ref().to_vec()),
        _ => None,
    }
}

/// Find the closing index for an element starting at `start`.
fn element_end(events: &[Event<'static>], start: usize) -> usize {
    if matches!(events[start], Event::Empty(_)) {
        return start;
    }
    let mut depth = 0usize;
    for (i, event) in events.iter().enumerate().skip(start) {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    events.len() - 1
}

/// Spans of the direct `<contour>` and `<component>` children of `<outline>`.
fn outline_spans(events: &[Event<'static>]) -> (Vec<Span>, Vec<Span>) {
    let mut contours = Vec::new();
    let mut components = Vec::new();

    let Some(outline) = events
        .iter()
        .position(|e| element_name(e).as_deref() == Some(b"outline".as_slice()))
    else {
        return (contours, components);
    };
    let outline_end = element_end(events, outline);

    let mut i = outline + 1;
    while i < outline_end {
        match element_name(&events[i]).as_deref() {
            Some(b"contour") => {
                let end = element_end(events, i);
                contours.push((i, end));
                i = end + 1;
            }
            Some(b"component") => {
                let end = element_end(events, i);
                components.push((i, end));
                i = end + 1;
            }
            Some(_) => i = element_end(events, i) + 1,
            None => i += 1,
        }
    }
    (contours, components)
}

/// Events of one contour span with its `<point>` elements rotated.
fn rotate_points<'a>(events: &'a [Event<'static>], span: Span, rotation: usize) -> Vec<&'a Event<'static>> {
    let (start, end) = span;
    let mut points = Vec::new();
    let mut i = start + 1;
    while i < end {
        match element_name(&events[i]).as_deref() {
            Some(b"point") => {
                let point_end = element_end(events, i);
                points.push((i, point_end));
                i = point_end + 1;
            }
            Some(_) => i = element_end(events, i) + 1,
            None => i += 1,
        }
    }

    let mut out = Vec::with_capacity(end - start + 1);
    let n = points.len();
    let mut i = start;
    while i <= end {
        if let Some(slot) = points.iter().position(|&(s, _)| s == i) {
            let (ps, pe) = points[(slot + rotation) % n];
            out.extend(&events[ps..=pe]);
            i = points[slot].1 + 1;
            continue;
        }
        out.push(&events[i]);
        i += 1;
    }
    out
}
