//! Compatibility groups: every variant of one glyph at one discrete location.

use std::path::PathBuf;

use rustc_hash::FxHashMap;

use super::matching::{self, Match};
use crate::ufo::{DesignSpace, DiscreteLocation, Glyph, UfoError, UfoFont, read_glif};

/// One master's variant of a glyph.
#[derive(Debug, Clone)]
pub struct Member {
    /// Index into `DesignSpace::sources`.
    pub source: usize,
    pub glif: PathBuf,
    pub glyph: Glyph,
}

/// Verdict for a single member after matching.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub confidence: f64,
    /// Fails in-order structural equality with the reference.
    pub incompatible: bool,
    pub matched: Option<Match>,
}

#[derive(Debug, Clone)]
pub struct CompatibilityGroup {
    pub location: DiscreteLocation,
    pub glyph: String,
    /// Ordered with the default master first.
    pub members: Vec<Member>,
    /// Index into `members` of the chosen reference.
    pub reference: usize,
    /// Parallel to `members`; empty when unresolvable.
    pub verdicts: Vec<Verdict>,
    pub unresolvable: Option<String>,
}

impl CompatibilityGroup {
    /// Location-qualified glyph name (`Italic=1/a`).
    pub fn label(&self) -> String {
        if self.location.0.is_empty() {
            self.glyph.clone()
        } else {
            format!("{}/{}", self.location, self.glyph)
        }
    }

    /// Members that need a rewrite at `threshold`.
    pub fn corrections(&self, threshold: f64) -> impl Iterator<Item = (&Member, &Match)> {
        self.members
            .iter()
            .zip(&self.verdicts)
            .filter(move |(_, v)| v.incompatible || v.confidence <= threshold)
            .filter_map(|(m, v)| v.matched.as_ref().map(|matched| (m, matched)))
            .filter(|(_, matched)| !matched.edit.is_identity())
    }

    /// Match every member, picking the reference with the best aggregate
    /// confidence (ties favour the earliest member).
    pub fn evaluate(&mut self) {
        if let Some(reason) = self.find_mismatch() {
            self.unresolvable = Some(reason);
            self.verdicts.clear();
            return;
        }

        let n = self.members.len();
        let mut best: Option<(f64, usize, Vec<Match>)> = None;
        for r in 0..n {
            let matches: Vec<Match> = self
                .members
                .iter()
                .map(|m| matching::match_glyph(&m.glyph, &self.members[r].glyph))
                .collect();
            let score: f64 = matches.iter().map(|m| m.confidence).sum();
            if best.as_ref().is_none_or(|(s, _, _)| score > *s + 1e-9) {
                best = Some((score, r, matches));
            }
        }

        let Some((_, reference, matches)) = best else {
            return;
        };
        self.reference = reference;
        self.verdicts = matches
            .into_iter()
            .enumerate()
            .map(|(i, matched)| {
                let incompatible = !matching::in_order_compatible(
                    &self.members[i].glyph,
                    &self.members[reference].glyph,
                );
                Verdict {
                    confidence: matched.confidence,
                    incompatible,
                    matched: (i != reference).then_some(matched),
                }
            })
            .collect();
    }

    fn find_mismatch(&self) -> Option<String> {
        let first = self.members.first()?;
        self.members[1..].iter().find_map(|m| {
            matching::structural_mismatch(&first.glyph, &m.glyph)
                .map(|reason| format!("{reason} ({} vs {})", first.glif.display(), m.glif.display()))
        })
    }
}

/// Collect all groups of a design space. Glyph files are read here; matching
/// happens later in [`CompatibilityGroup::evaluate`].
pub fn collect_groups(ds: &DesignSpace) -> Result<Vec<CompatibilityGroup>, UfoError> {
    let default = ds.default_source().unwrap_or(0);
    let mut order: Vec<usize> = (0..ds.sources.len()).collect();
    order.sort_by_key(|&i| (i != default, i));

    let mut fonts: FxHashMap<PathBuf, UfoFont> = FxHashMap::default();
    let mut seen_layers: Vec<(PathBuf, Option<String>)> = Vec::new();
    let mut by_key: FxHashMap<(DiscreteLocation, String), usize> = FxHashMap::default();
    let mut groups: Vec<CompatibilityGroup> = Vec::new();

    for index in order {
        let source = &ds.sources[index];
        let layer_key = (source.filename.clone(), source.layer.clone());
        if seen_layers.contains(&layer_key) {
            continue;
        }
        seen_layers.push(layer_key);

        if !fonts.contains_key(&source.filename) {
            let font = UfoFont::open(&source.filename)?;
            fonts.insert(source.filename.clone(), font);
        }
        let font = &fonts[&source.filename];
        let location = ds.discrete_location(&source.location);

        for (name, glif) in font.glyph_files(source.layer.as_deref())? {
            let glyph = read_glif(&glif)?;
            let key = (location.clone(), name);
            let slot = *by_key.entry(key.clone()).or_insert_with(|| {
                groups.push(CompatibilityGroup {
                    location: key.0.clone(),
                    glyph: key.1.clone(),
                    members: Vec::new(),
                    reference: 0,
                    verdicts: Vec::new(),
                    unresolvable: None,
                });
                groups.len() - 1
            });
            groups[slot].members.push(Member {
                source: index,
                glif,
                glyph,
            });
        }
    }

    groups.sort_by(|a, b| (&a.location, &a.glyph).cmp(&(&b.location, &b.glyph)));
    Ok(groups)
}
