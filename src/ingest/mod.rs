// src/ingest/mod.rs
pub mod utils;

use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use glob::{glob_with, MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{Cursor, Read},
    path::{Path, PathBuf},
};
use tracing::{debug, info, trace, warn};
use zip::ZipArchive;

use utils::clean_str;

#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// File stem the table was read from (e.g. "staph aureus phenotypes R").
    pub name: String,
    /// Column names from the header row, cleaned.
    pub headers: Vec<String>,
    /// Each data row, one cleaned string per header. Short rows are padded with "".
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Index of `column`, matched case-insensitively after trimming.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        let wanted = column.trim();
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(wanted))
    }
}

/// Parse CSV bytes with a header row into a `RawTable`.
pub fn parse_csv_bytes(name: &str, data: &[u8]) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(Cursor::new(data));

    let headers: Vec<String> = rdr
        .headers()
        .with_context(|| format!("reading header row of {}", name))?
        .iter()
        .map(clean_str)
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error in {} at record {}", name, idx))?;
        let mut row: Vec<String> = record.iter().map(clean_str).collect();
        if row.iter().all(String::is_empty) {
            trace!(table = name, idx, "skipping blank row");
            continue;
        }
        if row.len() > headers.len() {
            warn!(table = name, idx, extra = row.len() - headers.len(), "dropping cells beyond header width");
        }
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    debug!(table = name, columns = headers.len(), rows = rows.len(), "parsed table");
    Ok(RawTable {
        name: name.to_string(),
        headers,
        rows,
    })
}

/// Read a single CSV export from disk.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_csv_table<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    let mut buf = Vec::new();
    File::open(path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path))?
        .read_to_end(&mut buf)
        .with_context(|| format!("Failed to read {:?}", path))?;
    parse_csv_bytes(&file_stem(path), &buf)
}

/// Open `zip_path` and parse every `.csv` entry, keyed by file stem.
#[tracing::instrument(level = "info", skip(zip_path), fields(path = %zip_path.as_ref().display()))]
pub fn load_bundle_zip<P: AsRef<Path>>(zip_path: P) -> Result<BTreeMap<String, RawTable>> {
    let file = File::open(&zip_path)
        .with_context(|| format!("Failed to open ZIP file: {:?}", zip_path.as_ref()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("Failed to read ZIP archive: {:?}", zip_path.as_ref()))?;

    let mut tables = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).with_context(|| {
            format!("Failed to access ZIP entry #{} in {:?}", i, zip_path.as_ref())
        })?;
        let name = entry.name().to_string();
        if !entry.is_file() || !name.to_lowercase().ends_with(".csv") {
            trace!(entry = %name, "skipping non-csv entry");
            continue;
        }

        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .with_context(|| format!("Failed to read {} into memory", name))?;
        let stem = file_stem(Path::new(&name));
        let table = parse_csv_bytes(&stem, &buf)?;
        if tables.insert(stem.clone(), table).is_some() {
            warn!(entry = %name, "duplicate table name in bundle; later entry wins");
        }
    }

    info!(tables = tables.len(), "loaded bundle");
    Ok(tables)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Glob patterns identifying the three exports, matched against file names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePatterns {
    pub key_agents: String,
    pub other_agents: String,
    pub phenotypes: String,
}

impl Default for SourcePatterns {
    fn default() -> Self {
        Self {
            key_agents: "*ATB cles*.csv".into(),
            other_agents: "*autre atb*.csv".into(),
            phenotypes: "*phenotypes*.csv".into(),
        }
    }
}

/// The three raw tables a dashboard load needs.
#[derive(Debug, Clone)]
pub struct SourceSet {
    pub key_agents: RawTable,
    pub other_agents: RawTable,
    pub phenotypes: RawTable,
}

const MATCH_OPTS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

impl SourceSet {
    /// Resolve the exports from a directory of CSVs or from a `.zip` bundle.
    pub fn locate(source: &Path, patterns: &SourcePatterns) -> Result<Self> {
        let is_zip = source
            .extension()
            .map(|e| e.eq_ignore_ascii_case("zip"))
            .unwrap_or(false);
        if is_zip {
            Self::from_bundle(source, patterns)
        } else {
            Self::from_dir(source, patterns)
        }
    }

    fn from_dir(dir: &Path, patterns: &SourcePatterns) -> Result<Self> {
        if !dir.is_dir() {
            return Err(anyhow!("data directory {} not found", dir.display()));
        }
        let find = |pattern: &str| -> Result<PathBuf> {
            let full = format!("{}/{}", Pattern::escape(&dir.to_string_lossy()), pattern);
            let mut hits: Vec<PathBuf> = glob_with(&full, MATCH_OPTS)
                .with_context(|| format!("bad source pattern {:?}", pattern))?
                .filter_map(Result::ok)
                .collect();
            hits.sort();
            if hits.len() > 1 {
                warn!(pattern, matches = hits.len(), "several files match; using the first");
            }
            hits.into_iter()
                .next()
                .ok_or_else(|| anyhow!("no file matching {:?} in {}", pattern, dir.display()))
        };

        Ok(Self {
            key_agents: read_csv_table(find(&patterns.key_agents)?)?,
            other_agents: read_csv_table(find(&patterns.other_agents)?)?,
            phenotypes: read_csv_table(find(&patterns.phenotypes)?)?,
        })
    }

    fn from_bundle(zip_path: &Path, patterns: &SourcePatterns) -> Result<Self> {
        let mut tables = load_bundle_zip(zip_path)?;
        let mut take = |pattern: &str| -> Result<RawTable> {
            let pat = Pattern::new(pattern).with_context(|| format!("bad source pattern {:?}", pattern))?;
            let key = tables
                .keys()
                .find(|stem| pat.matches_with(&format!("{}.csv", stem), MATCH_OPTS))
                .cloned()
                .ok_or_else(|| anyhow!("no entry matching {:?} in {}", pattern, zip_path.display()))?;
            tables
                .remove(&key)
                .ok_or_else(|| anyhow!("entry {} vanished from bundle", key))
        };

        Ok(Self {
            key_agents: take(&patterns.key_agents)?,
            other_agents: take(&patterns.other_agents)?,
            phenotypes: take(&patterns.phenotypes)?,
        })
    }
}
