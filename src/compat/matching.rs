//! Structural matching of one glyph variant against a reference.
//!
//! Contours are paired by canonical point-type signature, then by the
//! distance between their centroids in bbox-normalized space. Closed
//! contours are rotated to the start point that best lines up with the
//! reference; open contours never rotate.

use crate::ufo::{Contour, GlifEdit, Glyph};

/// Point-type string of a contour, e.g. `"lllc"`.
pub fn signature(contour: &Contour) -> String {
    contour.points.iter().map(|p| p.kind.code()).collect()
}

/// Rotation-invariant form of a signature.
///
/// Closed contours use their lexicographically smallest rotation. Open
/// contours keep their exact sequence.
pub fn canonical(contour: &Contour) -> String {
    let sig = signature(contour);
    if contour.is_open() || sig.len() < 2 {
        return sig;
    }
    let doubled = format!("{sig}{sig}");
    (0..sig.len())
        .map(|r| &doubled[r..r + sig.len()])
        .min()
        .unwrap_or(&sig)
        .to_owned()
}

/// Sorted canonical signatures (a multiset).
pub fn canonical_multiset(glyph: &Glyph) -> Vec<String> {
    let mut sigs: Vec<_> = glyph.contours.iter().map(canonical).collect();
    sigs.sort_unstable();
    sigs
}

/// Sorted component base names.
pub fn component_multiset(glyph: &Glyph) -> Vec<&str> {
    let mut bases: Vec<_> = glyph.components.iter().map(|c| c.base.as_str()).collect();
    bases.sort_unstable();
    bases
}

/// Why two variants can never be reconciled by reordering, if they can't.
pub fn structural_mismatch(a: &Glyph, b: &Glyph) -> Option<String> {
    if a.contours.len() != b.contours.len() {
        return Some(format!(
            "contour count {} vs {}",
            a.contours.len(),
            b.contours.len()
        ));
    }
    if a.components.len() != b.components.len() {
        return Some(format!(
            "component count {} vs {}",
            a.components.len(),
            b.components.len()
        ));
    }
    if component_multiset(a) != component_multiset(b) {
        return Some("component bases differ".to_owned());
    }
    if canonical_multiset(a) != canonical_multiset(b) {
        return Some("contour point structure differs".to_owned());
    }
    None
}

/// In-order structural equality: what an interpolating compiler requires.
pub fn in_order_compatible(member: &Glyph, reference: &Glyph) -> bool {
    member.contours.len() == reference.contours.len()
        && member
            .contours
            .iter()
            .zip(&reference.contours)
            .all(|(m, r)| signature(m) == signature(r))
        && member.components.len() == reference.components.len()
        && member
            .components
            .iter()
            .zip(&reference.components)
            .all(|(m, r)| m.base == r.base)
}

/// Result of matching a member against the reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// Rewrite that makes the member line up with the reference.
    pub edit: GlifEdit,
    /// Share of elements already in place, in `[0, 1]`.
    pub confidence: f64,
}

/// Match `member` against `reference`. Both must be structurally
/// reconcilable (see [`structural_mismatch`]).
pub fn match_glyph(member: &Glyph, reference: &Glyph) -> Match {
    let frame_m = Frame::of(member);
    let frame_r = Frame::of(reference);

    let contour_order = assign_contours(member, reference, &frame_m, &frame_r);
    let rotations: Vec<usize> = contour_order
        .iter()
        .enumerate()
        .map(|(slot, &j)| {
            best_rotation(
                &member.contours[j],
                &reference.contours[slot],
                &frame_m,
                &frame_r,
            )
        })
        .collect();
    let component_order = assign_components(member, reference);

    let mut total = 0.0;
    let mut elements = 0usize;
    for (slot, (&j, &r)) in contour_order.iter().zip(&rotations).enumerate() {
        elements += 1;
        total += match (j == slot, r == 0) {
            (true, true) => 1.0,
            (true, false) => 0.5,
            (false, _) => 0.0,
        };
    }
    for (slot, &j) in component_order.iter().enumerate() {
        elements += 1;
        if j == slot {
            total += 1.0;
        }
    }
    let confidence = if elements == 0 {
        1.0
    } else {
        total / elements as f64
    };

    Match {
        edit: GlifEdit {
            contour_order,
            rotations,
            component_order,
        },
        confidence,
    }
}

/// Bounding box used to normalize coordinates.
struct Frame {
    min_x: f64,
    min_y: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn of(glyph: &Glyph) -> Self {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in glyph.contours.iter().flat_map(|c| &c.points) {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        if !min_x.is_finite() {
            return Self {
                min_x: 0.0,
                min_y: 0.0,
                width: 1.0,
                height: 1.0,
            };
        }
        Self {
            min_x,
            min_y,
            width: (max_x - min_x).max(1.0),
            height: (max_y - min_y).max(1.0),
        }
    }

    fn normalize(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.min_x) / self.width, (y - self.min_y) / self.height)
    }

    fn centroid(&self, contour: &Contour) -> (f64, f64) {
        if contour.points.is_empty() {
            return (0.0, 0.0);
        }
        let n = contour.points.len() as f64;
        let (sx, sy) = contour
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        self.normalize(sx / n, sy / n)
    }
}

fn distance_sq(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)
}

/// `order[slot]` = member contour placed at reference slot.
///
/// Greedy over all same-signature pairs by ascending centroid distance.
fn assign_contours(member: &Glyph, reference: &Glyph, fm: &Frame, fr: &Frame) -> Vec<usize> {
    let n = reference.contours.len();
    let sig_m: Vec<_> = member.contours.iter().map(canonical).collect();
    let sig_r: Vec<_> = reference.contours.iter().map(canonical).collect();
    let cen_m: Vec<_> = member.contours.iter().map(|c| fm.centroid(c)).collect();
    let cen_r: Vec<_> = reference.contours.iter().map(|c| fr.centroid(c)).collect();

    let mut pairs = Vec::new();
    for slot in 0..n {
        for j in 0..member.contours.len() {
            if sig_m[j] == sig_r[slot] {
                pairs.push((distance_sq(cen_m[j], cen_r[slot]), slot, j));
            }
        }
    }
    // Stable ordering on ties keeps in-place pairs first.
    pairs.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then_with(|| (a.1 != a.2).cmp(&(b.1 != b.2)))
            .then_with(|| (a.1, a.2).cmp(&(b.1, b.2)))
    });

    let mut order = vec![usize::MAX; n];
    let mut used = vec![false; member.contours.len()];
    for (_, slot, j) in pairs {
        if order[slot] == usize::MAX && !used[j] {
            order[slot] = j;
            used[j] = true;
        }
    }

    // Unreachable for reconcilable glyphs; fill leftovers in order.
    let mut spare = (0..member.contours.len()).filter(|&j| !used[j]);
    for slot in order.iter_mut().filter(|s| **s == usize::MAX) {
        *slot = spare.next().unwrap_or(0);
    }
    order
}

/// Start-point rotation of `member` that lines up with `reference`.
///
/// Only rotations that reproduce the exact point-type sequence qualify.
/// Among those, the one with the smallest summed point distance wins.
fn best_rotation(member: &Contour, reference: &Contour, fm: &Frame, fr: &Frame) -> usize {
    let n = member.points.len();
    if member.is_open() || n < 2 || n != reference.points.len() {
        return 0;
    }

    let mut best: Option<(f64, usize)> = None;
    for r in 0..n {
        let types_match = (0..n).all(|k| member.points[(k + r) % n].kind == reference.points[k].kind);
        if !types_match {
            continue;
        }
        let cost: f64 = (0..n)
            .map(|k| {
                let m = &member.points[(k + r) % n];
                let p = &reference.points[k];
                distance_sq(fm.normalize(m.x, m.y), fr.normalize(p.x, p.y))
            })
            .sum();
        if best.is_none_or(|(c, _)| cost < c - 1e-12) {
            best = Some((cost, r));
        }
    }
    best.map_or(0, |(_, r)| r)
}

/// `order[slot]` = member component placed at reference slot, by base name.
fn assign_components(member: &Glyph, reference: &Glyph) -> Vec<usize> {
    let mut used = vec![false; member.components.len()];
    let mut order = Vec::with_capacity(reference.components.len());
    for (slot, target) in reference.components.iter().enumerate() {
        let candidates = member
            .components
            .iter()
            .enumerate()
            .filter(|(j, c)| !used[*j] && c.base == target.base);
        // Prefer the slot itself, then the nearest offset.
        let pick = candidates
            .min_by(|(ja, a), (jb, b)| {
                let da = (a.x_offset - target.x_offset).powi(2) + (a.y_offset - target.y_offset).powi(2);
                let db = (b.x_offset - target.x_offset).powi(2) + (b.y_offset - target.y_offset).powi(2);
                (*ja != slot)
                    .cmp(&(*jb != slot))
                    .then_with(|| da.total_cmp(&db))
                    .then_with(|| ja.cmp(jb))
            })
            .map(|(j, _)| j);
        let j = pick
            .or_else(|| used.iter().position(|u| !u))
            .unwrap_or(slot);
        if let Some(flag) = used.get_mut(j) {
            *flag = true;
        }
        order.push(j);
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ufo::{Component, Point, PointType};

    fn contour(points: &[(f64, f64, PointType)]) -> Contour {
        Contour {
            points: points
                .iter()
                .map(|&(x, y, kind)| Point { x, y, kind })
                .collect(),
        }
    }

    fn square(x: f64, y: f64, size: f64) -> Contour {
        use PointType::Line;
        contour(&[
            (x, y, Line),
            (x + size, y, Line),
            (x + size, y + size, Line),
            (x, y + size, Line),
        ])
    }

    fn triangle(x: f64, y: f64) -> Contour {
        use PointType::Line;
        contour(&[(x, y, Line), (x + 50.0, y, Line), (x + 25.0, y + 40.0, Line)])
    }

    fn glyph(contours: Vec<Contour>) -> Glyph {
        Glyph {
            name: "g".into(),
            contours,
            components: Vec::new(),
        }
    }

    #[test]
    fn test_canonical_is_rotation_invariant() {
        use PointType::{Curve, Line, OffCurve};
        let a = contour(&[
            (0.0, 0.0, Line),
            (1.0, 0.0, OffCurve),
            (2.0, 0.0, OffCurve),
            (3.0, 0.0, Curve),
        ]);
        let b = contour(&[
            (3.0, 0.0, Curve),
            (0.0, 0.0, Line),
            (1.0, 0.0, OffCurve),
            (2.0, 0.0, OffCurve),
        ]);
        assert_ne!(signature(&a), signature(&b));
        assert_eq!(canonical(&a), canonical(&b));
    }

    #[test]
    fn test_open_contour_keeps_exact_signature() {
        use PointType::{Line, Move};
        let open = contour(&[(0.0, 0.0, Move), (1.0, 0.0, Line)]);
        assert_eq!(canonical(&open), "ml");
    }

    #[test]
    fn test_identical_glyphs_full_confidence() {
        let g = glyph(vec![square(0.0, 0.0, 100.0), triangle(300.0, 0.0)]);
        let m = match_glyph(&g, &g);
        assert_eq!(m.confidence, 1.0);
        assert!(m.edit.is_identity());
    }

    #[test]
    fn test_swapped_contours_are_reordered() {
        let reference = glyph(vec![square(0.0, 0.0, 100.0), square(300.0, 0.0, 100.0)]);
        let member = glyph(vec![square(310.0, 0.0, 110.0), square(0.0, 0.0, 110.0)]);
        let m = match_glyph(&member, &reference);
        assert_eq!(m.edit.contour_order, vec![1, 0]);
        assert_eq!(m.edit.rotations, vec![0, 0]);
        assert_eq!(m.confidence, 0.0);
    }

    #[test]
    fn test_rotated_start_point_is_detected() {
        use PointType::Line;
        let reference = glyph(vec![square(0.0, 0.0, 100.0)]);
        // Same square, starting at the second corner.
        let member = glyph(vec![contour(&[
            (100.0, 0.0, Line),
            (100.0, 100.0, Line),
            (0.0, 100.0, Line),
            (0.0, 0.0, Line),
        ])]);
        let m = match_glyph(&member, &reference);
        assert_eq!(m.edit.contour_order, vec![0]);
        assert_eq!(m.edit.rotations, vec![3]);
        assert_eq!(m.confidence, 0.5);
    }

    #[test]
    fn test_structural_mismatch_reasons() {
        let a = glyph(vec![square(0.0, 0.0, 100.0)]);
        let b = glyph(vec![square(0.0, 0.0, 100.0), square(200.0, 0.0, 10.0)]);
        let c = glyph(vec![triangle(0.0, 0.0)]);
        assert!(structural_mismatch(&a, &b).unwrap().contains("contour count"));
        assert!(structural_mismatch(&a, &c).is_some());
        assert!(structural_mismatch(&a, &a).is_none());
    }

    #[test]
    fn test_components_matched_by_base() {
        let comp = |base: &str, x: f64| Component {
            base: base.into(),
            x_offset: x,
            y_offset: 0.0,
        };
        let reference = Glyph {
            name: "aacute".into(),
            contours: Vec::new(),
            components: vec![comp("a", 0.0), comp("acute", 100.0)],
        };
        let member = Glyph {
            name: "aacute".into(),
            contours: Vec::new(),
            components: vec![comp("acute", 120.0), comp("a", 0.0)],
        };
        assert!(!in_order_compatible(&member, &reference));
        let m = match_glyph(&member, &reference);
        assert_eq!(m.edit.component_order, vec![1, 0]);
        assert_eq!(m.confidence, 0.0);
    }
}
