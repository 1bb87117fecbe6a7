//! Connector assignment enumeration.
//!
//! The full assignment space is (kinds * polarities)^anchors, which is already
//! ~4K at 4 anchors and >250K at 6. The placement engine therefore runs on the
//! small curated set from [`core_variants`]; [`AssignmentIter`] exists for
//! callers that want to walk the full space lazily under a cap.

use std::collections::BTreeSet;

use crate::connector::{Connector, ConnectorKind, Polarity, CONNECTOR_KINDS};
use crate::shape::BaseShape;

pub const MIN_DISTINCT_KINDS_DEFAULT: usize = 2;
pub const BALANCE_TOLERANCE_DEFAULT: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectorAssignment {
    pub anchor_id: u8,
    pub kind: ConnectorKind,
    pub polarity: Polarity,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeVariant {
    pub shape_slug: &'static str,
    pub variant_id: String,
    pub connectors: Vec<ConnectorAssignment>,
}

impl ShapeVariant {
    fn from_assignments(shape: &'static BaseShape, connectors: Vec<ConnectorAssignment>) -> Self {
        let variant_id = variant_id(shape.slug, &connectors);
        Self {
            shape_slug: shape.slug,
            variant_id,
            connectors,
        }
    }

    pub fn connector_for_anchor(&self, anchor_id: u8) -> Option<Connector> {
        self.connectors
            .iter()
            .find(|assignment| assignment.anchor_id == anchor_id)
            .map(|assignment| Connector::new(assignment.kind, assignment.polarity))
    }
}

/// Stable id: shape slug plus one kind-letter/polarity-letter pair per anchor
/// in anchor order, e.g. `fox-kpsrkpsr`.
pub fn variant_id(slug: &str, connectors: &[ConnectorAssignment]) -> String {
    let mut id = String::with_capacity(slug.len() + 1 + connectors.len() * 2);
    id.push_str(slug);
    id.push('-');
    for assignment in connectors {
        id.push(assignment.kind.code());
        id.push(assignment.polarity.code());
    }
    id
}

/// Inverse of [`variant_id`]. Returns the slug part and the per-anchor
/// connectors; `None` when the id is malformed.
pub fn decode_variant_id(id: &str) -> Option<(&str, Vec<Connector>)> {
    let (slug, code) = id.rsplit_once('-')?;
    if slug.is_empty() || code.is_empty() || code.len() % 2 != 0 {
        return None;
    }
    let mut connectors = Vec::with_capacity(code.len() / 2);
    let mut chars = code.chars();
    while let Some(kind_code) = chars.next() {
        let polarity_code = chars.next()?;
        let kind = ConnectorKind::from_code(kind_code)?;
        let polarity = Polarity::from_code(polarity_code)?;
        connectors.push(Connector::new(kind, polarity));
    }
    Some((slug, connectors))
}

/// Lazily walks every connector assignment for a shape. The counter decodes as
/// one base-8 digit per anchor (kind index * 2 + polarity), so the sequence is
/// restartable and position `n` is always the same assignment.
pub struct AssignmentIter {
    shape: &'static BaseShape,
    cursor: u64,
    total: u64,
}

impl AssignmentIter {
    pub fn new(shape: &'static BaseShape) -> Self {
        let states = (CONNECTOR_KINDS.len() * 2) as u64;
        let total = states.pow(shape.anchors.len() as u32);
        Self {
            shape,
            cursor: 0,
            total,
        }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn remaining(&self) -> u64 {
        self.total - self.cursor
    }

    fn decode(&self, mut value: u64) -> Vec<ConnectorAssignment> {
        let states = (CONNECTOR_KINDS.len() * 2) as u64;
        let mut connectors = Vec::with_capacity(self.shape.anchors.len());
        for anchor in self.shape.anchors {
            let digit = (value % states) as usize;
            value /= states;
            let kind = CONNECTOR_KINDS[digit / 2];
            let polarity = if digit % 2 == 0 {
                Polarity::Protruding
            } else {
                Polarity::Recessed
            };
            connectors.push(ConnectorAssignment {
                anchor_id: anchor.id,
                kind,
                polarity,
            });
        }
        connectors
    }
}

impl Iterator for AssignmentIter {
    type Item = Vec<ConnectorAssignment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.total {
            return None;
        }
        let connectors = self.decode(self.cursor);
        self.cursor += 1;
        Some(connectors)
    }
}

pub fn distinct_kind_count(connectors: &[ConnectorAssignment]) -> usize {
    let kinds: BTreeSet<ConnectorKind> = connectors.iter().map(|a| a.kind).collect();
    kinds.len()
}

/// Usage spread across the kinds that appear: max count minus min count.
pub fn kind_usage_spread(connectors: &[ConnectorAssignment]) -> usize {
    let mut counts = [0usize; CONNECTOR_KINDS.len()];
    for assignment in connectors {
        let idx = CONNECTOR_KINDS
            .iter()
            .position(|kind| *kind == assignment.kind)
            .unwrap_or(0);
        counts[idx] += 1;
    }
    let used: Vec<usize> = counts.iter().copied().filter(|count| *count > 0).collect();
    match (used.iter().max(), used.iter().min()) {
        (Some(max), Some(min)) => max - min,
        _ => 0,
    }
}

#[derive(Clone, Copy, Debug)]
pub struct VariantFilter {
    pub min_distinct_kinds: usize,
    pub balance_tolerance: Option<usize>,
}

impl Default for VariantFilter {
    fn default() -> Self {
        Self {
            min_distinct_kinds: MIN_DISTINCT_KINDS_DEFAULT,
            balance_tolerance: None,
        }
    }
}

impl VariantFilter {
    pub fn accepts(&self, connectors: &[ConnectorAssignment]) -> bool {
        if distinct_kind_count(connectors) < self.min_distinct_kinds {
            return false;
        }
        if let Some(tolerance) = self.balance_tolerance {
            if kind_usage_spread(connectors) > tolerance {
                return false;
            }
        }
        true
    }
}

/// Exhaustive mode: pull at most `cap` accepted assignments from the lazy
/// iterator. Intended for inspection and experiments, not for placement.
pub fn exhaustive_variants(
    shape: &'static BaseShape,
    filter: VariantFilter,
    cap: usize,
) -> Vec<ShapeVariant> {
    AssignmentIter::new(shape)
        .filter(|connectors| filter.accepts(connectors))
        .take(cap)
        .map(|connectors| ShapeVariant::from_assignments(shape, connectors))
        .collect()
}

/// Curated mode: the deterministic set the placement engine runs on.
///
/// Three structured families, de-duplicated by id:
/// - per kind, alternating polarity around the anchor ring
/// - per unordered kind pair, alternating kind and polarity
/// - per kind and polarity, uniform assignment
pub fn core_variants(shape: &'static BaseShape) -> Vec<ShapeVariant> {
    let mut seen = BTreeSet::new();
    let mut variants = Vec::new();
    let mut push = |connectors: Vec<ConnectorAssignment>| {
        let id = variant_id(shape.slug, &connectors);
        if seen.insert(id) {
            variants.push(ShapeVariant::from_assignments(shape, connectors));
        }
    };

    for kind in CONNECTOR_KINDS {
        push(assign(shape, |idx| (kind, alternating(idx))));
    }
    for (i, a) in CONNECTOR_KINDS.iter().enumerate() {
        for b in &CONNECTOR_KINDS[i + 1..] {
            push(assign(shape, |idx| {
                let kind = if idx % 2 == 0 { *a } else { *b };
                (kind, alternating(idx))
            }));
        }
    }
    for kind in CONNECTOR_KINDS {
        for polarity in [Polarity::Protruding, Polarity::Recessed] {
            push(assign(shape, |idx| {
                let _ = idx;
                (kind, polarity)
            }));
        }
    }

    variants
}

fn alternating(idx: usize) -> Polarity {
    if idx % 2 == 0 {
        Polarity::Protruding
    } else {
        Polarity::Recessed
    }
}

fn assign<F>(shape: &'static BaseShape, mut pick: F) -> Vec<ConnectorAssignment>
where
    F: FnMut(usize) -> (ConnectorKind, Polarity),
{
    shape
        .anchors
        .iter()
        .enumerate()
        .map(|(idx, anchor)| {
            let (kind, polarity) = pick(idx);
            ConnectorAssignment {
                anchor_id: anchor.id,
                kind,
                polarity,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::shape_by_slug;
    use std::collections::BTreeSet;

    fn fox() -> &'static BaseShape {
        shape_by_slug("fox").expect("fox in catalog")
    }

    #[test]
    fn curated_set_is_deterministic() {
        let first: BTreeSet<String> = core_variants(fox())
            .into_iter()
            .map(|variant| variant.variant_id)
            .collect();
        let second: BTreeSet<String> = core_variants(fox())
            .into_iter()
            .map(|variant| variant.variant_id)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn curated_set_size_and_uniqueness() {
        let variants = core_variants(fox());
        let ids: BTreeSet<&str> = variants.iter().map(|v| v.variant_id.as_str()).collect();
        assert_eq!(ids.len(), variants.len());
        assert!(
            (15..=20).contains(&variants.len()),
            "got {} variants",
            variants.len()
        );
    }

    #[test]
    fn curated_variants_cover_every_anchor() {
        for variant in core_variants(fox()) {
            assert_eq!(variant.connectors.len(), fox().anchors.len());
            for (idx, assignment) in variant.connectors.iter().enumerate() {
                assert_eq!(assignment.anchor_id as usize, idx);
            }
        }
    }

    #[test]
    fn exhaustive_iter_counts_full_space() {
        let shape = fox();
        let states = 8u64.pow(shape.anchors.len() as u32);
        let mut iter = AssignmentIter::new(shape);
        assert_eq!(iter.remaining(), states);
        assert_eq!(iter.by_ref().count() as u64, states);
        iter.reset();
        assert_eq!(iter.remaining(), states);
    }

    #[test]
    fn exhaustive_cap_and_filter() {
        let filter = VariantFilter {
            min_distinct_kinds: 2,
            balance_tolerance: Some(BALANCE_TOLERANCE_DEFAULT),
        };
        let variants = exhaustive_variants(fox(), filter, 50);
        assert!(variants.len() <= 50);
        assert!(!variants.is_empty());
        for variant in &variants {
            assert!(distinct_kind_count(&variant.connectors) >= 2);
            assert!(kind_usage_spread(&variant.connectors) <= BALANCE_TOLERANCE_DEFAULT);
        }
    }

    #[test]
    fn variant_id_round_trips() {
        for variant in core_variants(fox()) {
            let (slug, connectors) = decode_variant_id(&variant.variant_id).expect("decodes");
            assert_eq!(slug, "fox");
            assert_eq!(connectors.len(), variant.connectors.len());
            for (decoded, assignment) in connectors.iter().zip(&variant.connectors) {
                assert_eq!(decoded.kind, assignment.kind);
                assert_eq!(decoded.polarity, assignment.polarity);
            }
        }
    }

    #[test]
    fn malformed_variant_ids_rejected() {
        assert!(decode_variant_id("fox").is_none());
        assert!(decode_variant_id("fox-").is_none());
        assert!(decode_variant_id("fox-kpx").is_none());
        assert!(decode_variant_id("fox-zz").is_none());
    }
}
