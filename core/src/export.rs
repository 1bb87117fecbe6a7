//! Cut-ready output: SVG cut sheets, a DXF polyline export, an assembly
//! guide, and the piece manifest.
//!
//! The SVG path builders follow the string + `fmt::Write` approach used for
//! the interactive piece renderer; coordinates are fixed to three decimals so
//! output is byte-stable for a given template.

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write;

use crate::connector::{Connector, ConnectorStyle};
use crate::shape::{shape_by_slug, AnchorPoint, BaseShape};
use crate::template::{PlacedPiece, PuzzleTemplate};
use crate::variant::decode_variant_id;

pub const PAGE_WIDTH_MM_DEFAULT: f32 = 600.0;
pub const PAGE_HEIGHT_MM_DEFAULT: f32 = 400.0;
pub const MARGIN_MM_DEFAULT: f32 = 10.0;
pub const PIECE_SCALE_DEFAULT: f32 = 1.0;

// Laser job software separates operations by stroke convention; keep these
// stable.
pub const CUT_STROKE: &str = "#ff0000";
pub const CUT_STROKE_WIDTH_MM: f32 = 0.1;
pub const ENGRAVE_STROKE: &str = "#0000ff";
pub const ENGRAVE_STROKE_WIDTH_MM: f32 = 0.2;
pub const ENGRAVE_FONT_MM: f32 = 6.0;

// Connector cut geometry in shape units, scaled by the kind profile.
pub const CONNECTOR_BASE_RADIUS: f32 = 4.0;
pub const CONNECTOR_BASE_DEPTH: f32 = 5.0;

pub const GUIDE_CELL_PX: f32 = 40.0;
pub const GUIDE_LEGEND_ROW_PX: f32 = 22.0;

pub const SHAPE_COLORS: &[&str] = &[
    "#e6550d", "#3182bd", "#31a354", "#756bb1", "#636363", "#fd8d3c", "#6baed6", "#74c476",
    "#9e9ac8", "#969696", "#fdae6b", "#9ecae1",
];

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProductionConfig {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    pub piece_scale: f32,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            page_width_mm: PAGE_WIDTH_MM_DEFAULT,
            page_height_mm: PAGE_HEIGHT_MM_DEFAULT,
            margin_mm: MARGIN_MM_DEFAULT,
            piece_scale: PIECE_SCALE_DEFAULT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportError {
    UnknownShape { slug: String },
    UnknownVariant { variant_id: String },
    AnchorMismatch { variant_id: String, expected: usize, found: usize },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::UnknownShape { slug } => {
                write!(f, "template references unknown shape '{slug}'")
            }
            ExportError::UnknownVariant { variant_id } => {
                write!(f, "template references malformed variant '{variant_id}'")
            }
            ExportError::AnchorMismatch {
                variant_id,
                expected,
                found,
            } => write!(
                f,
                "variant '{variant_id}' carries {found} connectors but the shape has {expected} anchors"
            ),
        }
    }
}

impl std::error::Error for ExportError {}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SheetLayout {
    pub pieces_per_row: u32,
    pub rows: u32,
    pub slot_mm: f32,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
}

/// Row-major reading-order sheet layout; page height grows to fit when the
/// configured page is too short.
pub fn sheet_layout(template: &PuzzleTemplate, config: &ProductionConfig) -> SheetLayout {
    let slot_mm = template.cell_size_mm * config.piece_scale.max(0.01);
    let usable = (config.page_width_mm - config.margin_mm * 2.0).max(slot_mm);
    let pieces_per_row = ((usable / slot_mm).floor() as u32).max(1);
    let count = template.pieces.len() as u32;
    let rows = count.div_ceil(pieces_per_row);
    let content = rows as f32 * slot_mm;
    let page_height_mm = config
        .page_height_mm
        .max(config.margin_mm * 2.0 + content);
    SheetLayout {
        pieces_per_row,
        rows,
        slot_mm,
        page_width_mm: config.page_width_mm,
        page_height_mm,
    }
}

fn fmt_mm(value: f32) -> String {
    format!("{:.3}", value)
}

struct ResolvedPiece<'a> {
    piece: &'a PlacedPiece,
    shape: &'static BaseShape,
    connectors: Vec<Connector>,
}

fn resolve_piece(piece: &PlacedPiece) -> Result<ResolvedPiece<'_>, ExportError> {
    let shape = shape_by_slug(&piece.shape_slug).ok_or_else(|| ExportError::UnknownShape {
        slug: piece.shape_slug.clone(),
    })?;
    let (slug, connectors) =
        decode_variant_id(&piece.variant_id).ok_or_else(|| ExportError::UnknownVariant {
            variant_id: piece.variant_id.clone(),
        })?;
    if slug != shape.slug {
        return Err(ExportError::UnknownVariant {
            variant_id: piece.variant_id.clone(),
        });
    }
    if connectors.len() != shape.anchors.len() {
        return Err(ExportError::AnchorMismatch {
            variant_id: piece.variant_id.clone(),
            expected: shape.anchors.len(),
            found: connectors.len(),
        });
    }
    Ok(ResolvedPiece {
        piece,
        shape,
        connectors,
    })
}

fn outline_path(shape: &BaseShape) -> String {
    let mut path = String::new();
    for (idx, &(x, y)) in shape.outline.iter().enumerate() {
        let command = if idx == 0 { 'M' } else { 'L' };
        let _ = write!(path, "{}{} {} ", command, fmt_mm(x), fmt_mm(y));
    }
    path.push('Z');
    path
}

fn connector_subpath(anchor: &AnchorPoint, connector: Connector) -> String {
    let profile = connector.kind.profile();
    let radius = profile.width_ratio * CONNECTOR_BASE_RADIUS;
    let depth = profile.depth_ratio * CONNECTOR_BASE_DEPTH;
    let angle = anchor.outward_angle_deg.to_radians();
    // Screen coordinates: +y is down, angle 90 points up.
    let sign = connector.polarity.sign() as f32;
    let cx = anchor.x + angle.cos() * depth * sign;
    let cy = anchor.y - angle.sin() * depth * sign;
    match profile.style {
        ConnectorStyle::Rounded => {
            format!(
                "M{} {} A{r} {r} 0 1 0 {} {} A{r} {r} 0 1 0 {} {} Z",
                fmt_mm(cx - radius),
                fmt_mm(cy),
                fmt_mm(cx + radius),
                fmt_mm(cy),
                fmt_mm(cx - radius),
                fmt_mm(cy),
                r = fmt_mm(radius),
            )
        }
        ConnectorStyle::Angular => {
            format!(
                "M{} {} L{} {} L{} {} L{} {} Z",
                fmt_mm(cx),
                fmt_mm(cy - radius),
                fmt_mm(cx + radius),
                fmt_mm(cy),
                fmt_mm(cx),
                fmt_mm(cy + radius),
                fmt_mm(cx - radius),
                fmt_mm(cy),
            )
        }
    }
}

fn piece_transform(layout: &SheetLayout, config: &ProductionConfig, index: usize, piece: &PlacedPiece) -> String {
    let col = index as u32 % layout.pieces_per_row;
    let row = index as u32 / layout.pieces_per_row;
    let tx = config.margin_mm + col as f32 * layout.slot_mm;
    let ty = config.margin_mm + row as f32 * layout.slot_mm;
    let scale = layout.slot_mm / crate::shape::SHAPE_UNITS;
    format!(
        "translate({} {}) scale({}) rotate({} 50 50)",
        fmt_mm(tx),
        fmt_mm(ty),
        fmt_mm(scale),
        fmt_mm(piece.rotation.degrees()),
    )
}

/// Production cut sheet: millimeter units, one group per piece, cut-styled
/// outline + connector geometry, engrave-styled piece label.
pub fn to_svg_cut_file(
    template: &PuzzleTemplate,
    config: &ProductionConfig,
) -> Result<String, ExportError> {
    let resolved: Vec<ResolvedPiece<'_>> = template
        .pieces
        .iter()
        .map(resolve_piece)
        .collect::<Result<_, _>>()?;
    let layout = sheet_layout(template, config);

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}mm\" height=\"{h}mm\" viewBox=\"0 0 {w} {h}\">",
        w = fmt_mm(layout.page_width_mm),
        h = fmt_mm(layout.page_height_mm),
    );
    let _ = writeln!(
        svg,
        "<!-- template {} | {} pieces | cut {} / engrave {} -->",
        template.id,
        template.pieces.len(),
        CUT_STROKE,
        ENGRAVE_STROKE,
    );

    for (index, resolved) in resolved.iter().enumerate() {
        let transform = piece_transform(&layout, config, index, resolved.piece);
        let _ = writeln!(
            svg,
            "<g id=\"piece-{}\" transform=\"{}\">",
            resolved.piece.id, transform
        );

        let mut cut_path = outline_path(resolved.shape);
        for (anchor, connector) in resolved.shape.anchors.iter().zip(&resolved.connectors) {
            cut_path.push(' ');
            cut_path.push_str(&connector_subpath(anchor, *connector));
        }
        let _ = writeln!(
            svg,
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>",
            cut_path,
            CUT_STROKE,
            fmt_mm(CUT_STROKE_WIDTH_MM),
        );
        let _ = writeln!(
            svg,
            "<text x=\"50\" y=\"54\" text-anchor=\"middle\" font-size=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\">{}</text>",
            fmt_mm(ENGRAVE_FONT_MM),
            ENGRAVE_STROKE,
            fmt_mm(ENGRAVE_STROKE_WIDTH_MM),
            resolved.piece.id,
        );
        svg.push_str("</g>\n");
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}

/// Minimal DXF: one closed 4-vertex polyline per piece at the same sheet
/// coordinates. Bounding rectangle only, not the traced outline; the SVG cut
/// file is the production path.
pub fn to_dxf(template: &PuzzleTemplate, config: &ProductionConfig) -> Result<String, ExportError> {
    let layout = sheet_layout(template, config);
    let mut dxf = String::from("0\nSECTION\n2\nENTITIES\n");

    for (index, piece) in template.pieces.iter().enumerate() {
        let shape = shape_by_slug(&piece.shape_slug).ok_or_else(|| ExportError::UnknownShape {
            slug: piece.shape_slug.clone(),
        })?;
        let bb = shape.bounding_box();
        let col = index as u32 % layout.pieces_per_row;
        let row = index as u32 / layout.pieces_per_row;
        let scale = layout.slot_mm / crate::shape::SHAPE_UNITS;
        let tx = config.margin_mm + col as f32 * layout.slot_mm;
        let ty = config.margin_mm + row as f32 * layout.slot_mm;
        let corners = [
            (tx + bb.min_x * scale, ty + bb.min_y * scale),
            (tx + bb.max_x * scale, ty + bb.min_y * scale),
            (tx + bb.max_x * scale, ty + bb.max_y * scale),
            (tx + bb.min_x * scale, ty + bb.max_y * scale),
        ];

        dxf.push_str("0\nPOLYLINE\n8\nCUT\n66\n1\n70\n1\n");
        for (x, y) in corners {
            let _ = write!(dxf, "0\nVERTEX\n8\nCUT\n10\n{}\n20\n{}\n", fmt_mm(x), fmt_mm(y));
        }
        dxf.push_str("0\nSEQEND\n");
    }

    dxf.push_str("0\nENDSEC\n0\nEOF\n");
    Ok(dxf)
}

/// Human-readable QA diagram: one colored cell per placed piece plus a
/// shape-keyed legend.
pub fn to_assembly_guide(template: &PuzzleTemplate) -> String {
    let width = template.grid_width as f32 * GUIDE_CELL_PX;
    let grid_height = template.grid_height as f32 * GUIDE_CELL_PX;
    let legend_height = template.shapes.len() as f32 * GUIDE_LEGEND_ROW_PX + 10.0;
    let height = grid_height + legend_height;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        w = fmt_mm(width),
        h = fmt_mm(height),
    );

    for piece in &template.pieces {
        let color_idx = template
            .shapes
            .iter()
            .position(|slug| *slug == piece.shape_slug)
            .unwrap_or(0);
        let color = SHAPE_COLORS[color_idx % SHAPE_COLORS.len()];
        let x = piece.grid_x as f32 * GUIDE_CELL_PX;
        let y = piece.grid_y as f32 * GUIDE_CELL_PX;
        let _ = writeln!(
            svg,
            "<rect x=\"{}\" y=\"{}\" width=\"{c}\" height=\"{c}\" fill=\"{}\" stroke=\"#333\"/>",
            fmt_mm(x),
            fmt_mm(y),
            color,
            c = fmt_mm(GUIDE_CELL_PX),
        );
        let _ = writeln!(
            svg,
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#fff\">{}</text>",
            fmt_mm(x + GUIDE_CELL_PX * 0.5),
            fmt_mm(y + GUIDE_CELL_PX * 0.6),
            piece.id,
        );
    }

    for (idx, slug) in template.shapes.iter().enumerate() {
        let color = SHAPE_COLORS[idx % SHAPE_COLORS.len()];
        let y = grid_height + 10.0 + idx as f32 * GUIDE_LEGEND_ROW_PX;
        let count = template.shape_counts.get(slug).copied().unwrap_or(0);
        let _ = writeln!(
            svg,
            "<rect x=\"4\" y=\"{}\" width=\"14\" height=\"14\" fill=\"{}\"/>",
            fmt_mm(y),
            color,
        );
        let _ = writeln!(
            svg,
            "<text x=\"24\" y=\"{}\" font-size=\"12\" fill=\"#000\">{slug} x{count}</text>",
            fmt_mm(y + 12.0),
        );
    }

    svg.push_str("</svg>\n");
    svg
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ManifestEntry {
    pub shape_slug: String,
    pub variant_id: String,
    pub quantity: u32,
}

/// Deduplicated variant/quantity table, sorted by shape then variant.
pub fn to_manifest(template: &PuzzleTemplate) -> Vec<ManifestEntry> {
    let mut quantities: BTreeMap<(String, String), u32> = BTreeMap::new();
    for piece in &template.pieces {
        *quantities
            .entry((piece.shape_slug.clone(), piece.variant_id.clone()))
            .or_insert(0) += 1;
    }
    quantities
        .into_iter()
        .map(|((shape_slug, variant_id), quantity)| ManifestEntry {
            shape_slug,
            variant_id,
            quantity,
        })
        .collect()
}

/// Grouped text rendering with per-shape subtotals and a grand total.
pub fn render_manifest(template: &PuzzleTemplate) -> String {
    let entries = to_manifest(template);
    let mut text = String::new();
    let _ = writeln!(text, "manifest for template {}", template.id);

    let mut current_shape: Option<&str> = None;
    let mut subtotal = 0u32;
    let mut total = 0u32;
    for entry in &entries {
        if current_shape != Some(entry.shape_slug.as_str()) {
            if let Some(shape) = current_shape {
                let _ = writeln!(text, "  subtotal {shape}: {subtotal}");
            }
            let _ = writeln!(text, "{}:", entry.shape_slug);
            current_shape = Some(entry.shape_slug.as_str());
            subtotal = 0;
        }
        let _ = writeln!(text, "  {} x{}", entry.variant_id, entry.quantity);
        subtotal += entry.quantity;
        total += entry.quantity;
    }
    if let Some(shape) = current_shape {
        let _ = writeln!(text, "  subtotal {shape}: {subtotal}");
    }
    let _ = writeln!(text, "total pieces: {total}");
    text
}
