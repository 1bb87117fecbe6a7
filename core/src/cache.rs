//! Template memoization.
//!
//! Completed layouts are keyed by the order-independent template id, so two
//! callers selecting the same shapes in different orders reuse one layout.
//! The cache is an explicit instance handed to call sites; there is no global
//! singleton. One caller per instance — no concurrent-writer contract.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rkyv::rancor;

use crate::template::{generate, template_id, GenerationConfig, PuzzleTemplate, TemplateError};

pub const TEMPLATE_RECORD_VERSION: u32 = 1;
pub const INDEX_RECORD_VERSION: u32 = 1;
pub const INDEX_FILE: &str = "index.bin";
pub const DEFAULT_QUOTA_BYTES: u64 = 2 * 1024 * 1024;

/// Curated shape combinations worth pre-generating ahead of demand.
pub const POPULAR_COMBOS: &[&[&str]] = &[
    &["fox", "cat", "rabbit", "owl"],
    &["fish", "turtle", "butterfly", "leaf"],
    &["star", "heart", "acorn", "pine"],
];

#[derive(Clone, Debug, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
struct TemplateRecord {
    version: u32,
    template: PuzzleTemplate,
}

#[derive(Clone, Debug, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
struct IndexEntry {
    id: String,
    created_at_ms: u64,
    bytes: u64,
}

#[derive(Clone, Debug, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
struct IndexRecord {
    version: u32,
    entries: Vec<IndexEntry>,
}

#[derive(Debug)]
pub enum CacheError {
    QuotaExceeded { needed_bytes: u64, quota_bytes: u64 },
    Io(String),
    Codec(String),
    Generation(TemplateError),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::QuotaExceeded {
                needed_bytes,
                quota_bytes,
            } => write!(
                f,
                "cache quota exceeded: need {needed_bytes} bytes of {quota_bytes}"
            ),
            CacheError::Io(message) => write!(f, "cache io error: {message}"),
            CacheError::Codec(message) => write!(f, "cache codec error: {message}"),
            CacheError::Generation(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Generation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TemplateError> for CacheError {
    fn from(err: TemplateError) -> Self {
        CacheError::Generation(err)
    }
}

impl From<io::Error> for CacheError {
    fn from(err: io::Error) -> Self {
        CacheError::Io(err.to_string())
    }
}

fn encode_record(record: &TemplateRecord) -> Result<Vec<u8>, CacheError> {
    rkyv::to_bytes::<rancor::Error>(record)
        .map(|bytes| bytes.into_vec())
        .map_err(|err| CacheError::Codec(err.to_string()))
}

fn decode_record(bytes: &[u8]) -> Option<PuzzleTemplate> {
    let record = rkyv::from_bytes::<TemplateRecord, rancor::Error>(bytes).ok()?;
    if record.version != TEMPLATE_RECORD_VERSION {
        return None;
    }
    Some(record.template)
}

pub trait TemplateStore {
    fn get(&self, id: &str) -> Option<PuzzleTemplate>;
    fn set(&mut self, template: PuzzleTemplate) -> Result<(), CacheError>;
    fn has(&self, id: &str) -> bool;
    fn delete(&mut self, id: &str) -> bool;
    fn clear(&mut self);
    fn get_all(&self) -> Vec<PuzzleTemplate>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Volatile in-process backend.
#[derive(Default)]
pub struct MemoryStore {
    templates: HashMap<String, PuzzleTemplate>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TemplateStore for MemoryStore {
    fn get(&self, id: &str) -> Option<PuzzleTemplate> {
        self.templates.get(id).cloned()
    }

    fn set(&mut self, template: PuzzleTemplate) -> Result<(), CacheError> {
        self.templates.insert(template.id.clone(), template);
        Ok(())
    }

    fn has(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    fn delete(&mut self, id: &str) -> bool {
        self.templates.remove(id).is_some()
    }

    fn clear(&mut self) {
        self.templates.clear();
    }

    fn get_all(&self) -> Vec<PuzzleTemplate> {
        self.templates.values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.templates.len()
    }
}

/// Quota-limited persisted backend: one rkyv-encoded record file per template
/// plus a companion index. A write that would blow the quota evicts the single
/// oldest template by creation time and retries once before failing.
pub struct FileStore {
    dir: PathBuf,
    quota_bytes: u64,
    entries: Vec<IndexEntry>,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        Self::open_with_quota(dir, DEFAULT_QUOTA_BYTES)
    }

    pub fn open_with_quota(dir: impl AsRef<Path>, quota_bytes: u64) -> Result<Self, CacheError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let entries = match fs::read(dir.join(INDEX_FILE)) {
            Ok(bytes) => rkyv::from_bytes::<IndexRecord, rancor::Error>(&bytes)
                .ok()
                .filter(|record| record.version == INDEX_RECORD_VERSION)
                .map(|record| record.entries)
                .unwrap_or_default(),
            Err(_) => Vec::new(),
        };
        Ok(Self {
            dir,
            quota_bytes,
            entries,
        })
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.bin"))
    }

    fn used_bytes(&self) -> u64 {
        self.entries.iter().map(|entry| entry.bytes).sum()
    }

    fn save_index(&self) -> Result<(), CacheError> {
        let record = IndexRecord {
            version: INDEX_RECORD_VERSION,
            entries: self.entries.clone(),
        };
        let bytes = rkyv::to_bytes::<rancor::Error>(&record)
            .map_err(|err| CacheError::Codec(err.to_string()))?;
        fs::write(self.dir.join(INDEX_FILE), bytes.as_slice())?;
        Ok(())
    }

    fn evict_oldest(&mut self) -> Result<bool, CacheError> {
        let oldest = self
            .entries
            .iter()
            .enumerate()
            .min_by_key(|(_, entry)| entry.created_at_ms)
            .map(|(idx, _)| idx);
        let Some(idx) = oldest else {
            return Ok(false);
        };
        let entry = self.entries.remove(idx);
        let _ = fs::remove_file(self.record_path(&entry.id));
        self.save_index()?;
        Ok(true)
    }
}

impl TemplateStore for FileStore {
    fn get(&self, id: &str) -> Option<PuzzleTemplate> {
        if !self.entries.iter().any(|entry| entry.id == id) {
            return None;
        }
        let bytes = fs::read(self.record_path(id)).ok()?;
        decode_record(&bytes)
    }

    fn set(&mut self, template: PuzzleTemplate) -> Result<(), CacheError> {
        let record = TemplateRecord {
            version: TEMPLATE_RECORD_VERSION,
            template,
        };
        let bytes = encode_record(&record)?;
        let needed = bytes.len() as u64;

        self.entries.retain(|entry| entry.id != record.template.id);
        if self.used_bytes() + needed > self.quota_bytes {
            self.evict_oldest()?;
        }
        if self.used_bytes() + needed > self.quota_bytes {
            return Err(CacheError::QuotaExceeded {
                needed_bytes: needed,
                quota_bytes: self.quota_bytes,
            });
        }

        fs::write(self.record_path(&record.template.id), &bytes)?;
        self.entries.push(IndexEntry {
            id: record.template.id.clone(),
            created_at_ms: record.template.created_at_ms,
            bytes: needed,
        });
        self.save_index()
    }

    fn has(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    fn delete(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        if self.entries.len() == before {
            return false;
        }
        let _ = fs::remove_file(self.record_path(id));
        self.save_index().is_ok()
    }

    fn clear(&mut self) {
        for entry in self.entries.drain(..) {
            let _ = fs::remove_file(self.dir.join(format!("{}.bin", entry.id)));
        }
        let _ = self.save_index();
    }

    fn get_all(&self) -> Vec<PuzzleTemplate> {
        self.entries
            .iter()
            .filter_map(|entry| {
                let bytes = fs::read(self.record_path(&entry.id)).ok()?;
                decode_record(&bytes)
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CacheStats {
    pub total_templates: usize,
    pub total_pieces: usize,
    pub hit_count: u64,
    pub miss_count: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f32 {
        let lookups = self.hit_count + self.miss_count;
        if lookups == 0 {
            return 0.0;
        }
        self.hit_count as f32 / lookups as f32
    }
}

pub struct TemplateCache {
    store: Box<dyn TemplateStore>,
    hit_count: u64,
    miss_count: u64,
}

impl TemplateCache {
    pub fn new(store: Box<dyn TemplateStore>) -> Self {
        Self {
            store,
            hit_count: 0,
            miss_count: 0,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    pub fn get(&mut self, shape_slugs: &[String]) -> Option<PuzzleTemplate> {
        let id = template_id(shape_slugs);
        let template = self.store.get(&id);
        if template.is_some() {
            self.hit_count += 1;
        } else {
            self.miss_count += 1;
        }
        template
    }

    pub fn has(&self, shape_slugs: &[String]) -> bool {
        self.store.has(&template_id(shape_slugs))
    }

    pub fn delete(&mut self, shape_slugs: &[String]) -> bool {
        self.store.delete(&template_id(shape_slugs))
    }

    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Cache hit short-circuits generation; miss generates, stores, and
    /// returns the new template.
    pub fn get_or_create(
        &mut self,
        shape_slugs: &[String],
        config: &GenerationConfig,
        seed: u32,
    ) -> Result<PuzzleTemplate, CacheError> {
        let id = template_id(shape_slugs);
        if let Some(template) = self.store.get(&id) {
            self.hit_count += 1;
            return Ok(template);
        }
        self.miss_count += 1;
        let template = generate(shape_slugs, config, seed)?;
        self.store.set(template.clone())?;
        Ok(template)
    }

    /// Pre-generates the popular combinations. Batch convenience only; combos
    /// that do not fit the config's shape count are skipped.
    pub fn warm(&mut self, base: &GenerationConfig, seed: u32) -> Result<usize, CacheError> {
        let mut generated = 0;
        for (idx, combo) in POPULAR_COMBOS.iter().enumerate() {
            let slugs: Vec<String> = combo.iter().map(|slug| slug.to_string()).collect();
            let config = GenerationConfig {
                unique_shapes: slugs.len() as u32,
                total_pieces: slugs.len() as u32 * base.copies_per_shape,
                ..*base
            };
            if !self.has(&slugs) {
                self.get_or_create(&slugs, &config, seed.wrapping_add(idx as u32))?;
                generated += 1;
            }
        }
        Ok(generated)
    }

    pub fn stats(&self) -> CacheStats {
        let templates = self.store.get_all();
        CacheStats {
            total_templates: templates.len(),
            total_pieces: templates.iter().map(|template| template.pieces.len()).sum(),
            hit_count: self.hit_count,
            miss_count: self.miss_count,
        }
    }
}
