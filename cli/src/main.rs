use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kumiki_core::cache::{FileStore, MemoryStore, TemplateCache};
use kumiki_core::export::{
    render_manifest, to_assembly_guide, to_dxf, to_svg_cut_file, ProductionConfig,
};
use kumiki_core::shape::{shape_by_slug, SHAPE_CATALOG};
use kumiki_core::template::{GenerationConfig, COPIES_PER_SHAPE_DEFAULT};
use kumiki_core::variant::{core_variants, exhaustive_variants, VariantFilter};
use rand::Rng;

#[derive(Parser)]
#[command(name = "kumiki", version, about = "Laser-cut puzzle template generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the silhouette catalog.
    Shapes,
    /// Print connector variants for one shape.
    Variants {
        slug: String,
        #[arg(long)]
        exhaustive: bool,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 2)]
        min_kinds: usize,
        #[arg(long)]
        balanced: bool,
    },
    /// Generate (or fetch from cache) a template and export production files.
    Generate {
        /// Comma-separated shape slugs, e.g. fox,cat,owl
        #[arg(long)]
        shapes: String,
        /// Decimal or 0x-prefixed hex seed; fresh entropy when omitted.
        #[arg(long)]
        seed: Option<String>,
        #[arg(long, default_value = "out")]
        out: PathBuf,
        /// Comma-separated subset of svg,dxf,guide,manifest
        #[arg(long, default_value = "svg,dxf,guide,manifest")]
        formats: String,
        #[arg(long, env = "KUMIKI_CACHE_DIR")]
        cache_dir: Option<PathBuf>,
        #[arg(long, default_value_t = COPIES_PER_SHAPE_DEFAULT)]
        copies: u32,
        #[arg(long)]
        cell_size: Option<f32>,
    },
    /// Template cache administration.
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Subcommand)]
enum CacheCommand {
    Stats {
        #[arg(long, env = "KUMIKI_CACHE_DIR")]
        cache_dir: PathBuf,
    },
    Clear {
        #[arg(long, env = "KUMIKI_CACHE_DIR")]
        cache_dir: PathBuf,
    },
    /// Pre-generate the popular shape combinations.
    Warm {
        #[arg(long, env = "KUMIKI_CACHE_DIR")]
        cache_dir: PathBuf,
        #[arg(long)]
        seed: Option<String>,
        #[arg(long, default_value_t = COPIES_PER_SHAPE_DEFAULT)]
        copies: u32,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Shapes => {
            for shape in SHAPE_CATALOG {
                println!(
                    "{:<10} {:<10} {:<8} {} anchors",
                    shape.slug,
                    shape.label,
                    shape.category,
                    shape.anchors.len()
                );
            }
        }
        Commands::Variants {
            slug,
            exhaustive,
            limit,
            min_kinds,
            balanced,
        } => {
            let Some(shape) = shape_by_slug(&slug) else {
                eprintln!("unknown shape: {slug}");
                eprintln!("available shapes:");
                for shape in SHAPE_CATALOG {
                    eprintln!("  {} ({})", shape.slug, shape.label);
                }
                return Ok(());
            };
            let variants = if exhaustive {
                let filter = VariantFilter {
                    min_distinct_kinds: min_kinds,
                    balance_tolerance: balanced.then_some(2),
                };
                exhaustive_variants(shape, filter, limit)
            } else {
                core_variants(shape)
            };
            for variant in &variants {
                println!("{}", variant.variant_id);
            }
            println!("{} variants", variants.len());
        }
        Commands::Generate {
            shapes,
            seed,
            out,
            formats,
            cache_dir,
            copies,
            cell_size,
        } => {
            let slugs: Vec<String> = shapes
                .split(',')
                .map(|slug| slug.trim().to_string())
                .filter(|slug| !slug.is_empty())
                .collect();
            let mut config = GenerationConfig {
                unique_shapes: slugs.len() as u32,
                copies_per_shape: copies,
                total_pieces: slugs.len() as u32 * copies,
                ..GenerationConfig::default()
            };
            if let Some(cell_size) = cell_size {
                config.cell_size_mm = cell_size;
            }
            let seed = resolve_seed(seed.as_deref())?;

            let mut cache = open_cache(cache_dir)?;
            let template = cache.get_or_create(&slugs, &config, seed)?;

            println!("template: {}", template.id);
            println!(
                "grid: {}x{} ({} pieces, cell {} mm)",
                template.grid_width,
                template.grid_height,
                template.pieces.len(),
                template.cell_size_mm
            );
            println!("seed: {seed:#010x}");
            if template.relaxed_placement_count > 0 {
                eprintln!(
                    "warning: {} piece(s) placed without satisfying neighbor constraints",
                    template.relaxed_placement_count
                );
            }

            fs::create_dir_all(&out)?;
            let production = ProductionConfig::default();
            for format in formats.split(',') {
                match format.trim() {
                    "svg" => {
                        let path = out.join(format!("{}.svg", template.id));
                        fs::write(&path, to_svg_cut_file(&template, &production)?)?;
                        println!("wrote {}", path.display());
                    }
                    "dxf" => {
                        let path = out.join(format!("{}.dxf", template.id));
                        fs::write(&path, to_dxf(&template, &production)?)?;
                        println!("wrote {}", path.display());
                    }
                    "guide" => {
                        let path = out.join(format!("{}-guide.svg", template.id));
                        fs::write(&path, to_assembly_guide(&template))?;
                        println!("wrote {}", path.display());
                    }
                    "manifest" => {
                        let path = out.join(format!("{}-manifest.txt", template.id));
                        fs::write(&path, render_manifest(&template))?;
                        println!("wrote {}", path.display());
                    }
                    "" => {}
                    other => eprintln!("skipping unknown format: {other}"),
                }
            }
        }
        Commands::Cache { command } => match command {
            CacheCommand::Stats { cache_dir } => {
                let cache = TemplateCache::new(Box::new(FileStore::open(cache_dir)?));
                let stats = cache.stats();
                println!("templates: {}", stats.total_templates);
                println!("pieces: {}", stats.total_pieces);
            }
            CacheCommand::Clear { cache_dir } => {
                let mut cache = TemplateCache::new(Box::new(FileStore::open(cache_dir)?));
                cache.clear();
                println!("cache cleared");
            }
            CacheCommand::Warm {
                cache_dir,
                seed,
                copies,
            } => {
                let seed = resolve_seed(seed.as_deref())?;
                let mut cache = TemplateCache::new(Box::new(FileStore::open(cache_dir)?));
                let config = GenerationConfig {
                    copies_per_shape: copies,
                    ..GenerationConfig::default()
                };
                let generated = cache.warm(&config, seed)?;
                println!("warmed {generated} template(s)");
            }
        },
    }

    Ok(())
}

fn open_cache(cache_dir: Option<PathBuf>) -> Result<TemplateCache, Box<dyn std::error::Error>> {
    let cache = match cache_dir {
        Some(dir) => TemplateCache::new(Box::new(FileStore::open(dir)?)),
        None => TemplateCache::new(Box::new(MemoryStore::new())),
    };
    Ok(cache)
}

fn resolve_seed(raw: Option<&str>) -> Result<u32, Box<dyn std::error::Error>> {
    match raw {
        Some(raw) => parse_seed_arg(raw),
        None => Ok(rand::rng().random()),
    }
}

fn parse_seed_arg(raw: &str) -> Result<u32, Box<dyn std::error::Error>> {
    let trimmed = raw.trim();
    let value = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16)?
    } else {
        trimmed.parse::<u32>()?
    };
    Ok(value)
}
