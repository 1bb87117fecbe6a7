pub mod cache;
pub mod connector;
pub mod export;
pub mod shape;
pub mod template;
pub mod variant;

pub use cache::{CacheError, CacheStats, FileStore, MemoryStore, TemplateCache, TemplateStore};
pub use connector::{can_connect, Connector, ConnectorKind, ConnectorStyle, Polarity};
pub use export::{
    render_manifest, to_assembly_guide, to_dxf, to_manifest, to_svg_cut_file, ExportError,
    ManifestEntry, ProductionConfig,
};
pub use shape::{shape_by_label, shape_by_slug, AnchorPoint, BaseShape, SHAPE_CATALOG};
pub use template::{
    generate, template_id, GenerationConfig, PlacedPiece, PuzzleTemplate, Rotation,
    SelectionError, TemplateError,
};
pub use variant::{core_variants, exhaustive_variants, ShapeVariant, VariantFilter};
