// src/dataset.rs

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use std::{path::Path, sync::Arc, time::Instant};
use tracing::info;

use crate::{
    antibiogram::{AgentClass, Antibiogram},
    config::Config,
    ingest::SourceSet,
    surveillance::{compute_change_rates, normalize, PeriodFilter, ResistanceRecord},
};

/// Everything one load produces. Immutable once built; views are copies.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub key_agents: Antibiogram,
    pub other_agents: Antibiogram,
    /// Ascending by month, change rates filled in.
    pub records: Vec<ResistanceRecord>,
}

impl Dataset {
    /// Ingest the three exports under `cfg.data_dir` and enrich the phenotype table.
    #[tracing::instrument(level = "info", skip(cfg), fields(source = %cfg.data_dir.display()))]
    pub fn load(cfg: &Config) -> Result<Self> {
        Self::load_from(&cfg.data_dir, cfg)
    }

    pub fn load_from(source: &Path, cfg: &Config) -> Result<Self> {
        let start = Instant::now();
        let sources = SourceSet::locate(source, &cfg.sources)
            .with_context(|| format!("locating exports in {}", source.display()))?;
        Self::from_sources(&sources, cfg).map(|ds| {
            info!(records = ds.records.len(), elapsed = ?start.elapsed(), "dataset loaded");
            ds
        })
    }

    pub fn from_sources(sources: &SourceSet, cfg: &Config) -> Result<Self> {
        let key_agents = Antibiogram::from_raw(AgentClass::Key, &sources.key_agents)?;
        let other_agents = Antibiogram::from_raw(AgentClass::Other, &sources.other_agents)?;
        let sorted = normalize(&sources.phenotypes, &cfg.normalize_options())?;
        let records = compute_change_rates(sorted).context("computing change rates")?;
        Ok(Self {
            key_agents,
            other_agents,
            records,
        })
    }

    /// A freshly allocated filtered view; the base records are untouched.
    pub fn view(&self, filter: &PeriodFilter) -> Vec<ResistanceRecord> {
        filter.apply(&self.records)
    }

    pub fn antibiogram(&self, class: AgentClass) -> &Antibiogram {
        match class {
            AgentClass::Key => &self.key_agents,
            AgentClass::Other => &self.other_agents,
        }
    }
}

/// Lazily loaded, shared dataset. Loads at most once until `reload`.
#[derive(Debug, Default)]
pub struct DatasetCache {
    cell: OnceCell<Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&self, cfg: &Config) -> Result<Arc<Dataset>> {
        self.cell
            .get_or_try_init(|| Dataset::load(cfg).map(Arc::new))
            .map(Arc::clone)
    }

    pub fn get(&self) -> Option<Arc<Dataset>> {
        self.cell.get().cloned()
    }

    /// Drop the cached dataset and load again. Handles already given out keep
    /// the old data.
    pub fn reload(&mut self, cfg: &Config) -> Result<Arc<Dataset>> {
        let fresh = Arc::new(Dataset::load(cfg)?);
        self.cell = OnceCell::with_value(Arc::clone(&fresh));
        info!("dataset reloaded");
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::tests::{KEY_AGENTS_CSV, OTHER_AGENTS_CSV, PHENOTYPES_CSV};
    use crate::surveillance::Period;
    use std::fs;
    use tempfile::tempdir;

    fn write_exports(dir: &Path, phenotypes: &str) -> Result<()> {
        fs::write(dir.join("ATB cles staph aureus.csv"), KEY_AGENTS_CSV)?;
        fs::write(dir.join("staph aureus autre atb.csv"), OTHER_AGENTS_CSV)?;
        fs::write(dir.join("staph aureus phenotypes R.csv"), phenotypes)?;
        Ok(())
    }

    fn config_for(dir: &Path) -> Config {
        Config {
            data_dir: dir.to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn loads_and_enriches() -> Result<()> {
        crate::ingest::tests::init_test_logging();
        let dir = tempdir()?;
        write_exports(dir.path(), PHENOTYPES_CSV)?;
        let ds = Dataset::load(&config_for(dir.path()))?;

        assert_eq!(ds.records.len(), 3);
        assert_eq!(ds.records[0].mom_change_pct, None);
        assert!((ds.records[1].mom_change_pct.unwrap() - 20.0).abs() < 1e-9);
        assert!((ds.records[2].mom_change_pct.unwrap() + 25.0).abs() < 1e-9);
        assert_eq!(ds.antibiogram(AgentClass::Other).rows.len(), 2);
        Ok(())
    }

    #[test]
    fn views_do_not_touch_the_base() -> Result<()> {
        let dir = tempdir()?;
        write_exports(dir.path(), PHENOTYPES_CSV)?;
        let ds = Dataset::load(&config_for(dir.path()))?;

        let feb = Period::new(2024, 2).unwrap();
        let filter = PeriodFilter {
            start: feb,
            end: feb,
            day: None,
        };
        let view = ds.view(&filter);
        assert_eq!(view.len(), 1);
        // change rates come from the full series, not the view
        assert!(view[0].mom_change_pct.is_some());
        assert_eq!(ds.records.len(), 3);
        Ok(())
    }

    #[test]
    fn cache_loads_once_until_reload() -> Result<()> {
        let dir = tempdir()?;
        write_exports(dir.path(), PHENOTYPES_CSV)?;
        let cfg = config_for(dir.path());

        let mut cache = DatasetCache::new();
        assert!(cache.get().is_none());
        let first = cache.get_or_load(&cfg)?;
        assert_eq!(first.records.len(), 3);

        write_exports(dir.path(), "Month,Total,MRSA,VRSA\nJanuary,10,1,0\n")?;
        let again = cache.get_or_load(&cfg)?;
        assert!(Arc::ptr_eq(&first, &again));

        let reloaded = cache.reload(&cfg)?;
        assert_eq!(reloaded.records.len(), 1);
        assert_eq!(first.records.len(), 3);
        assert!(Arc::ptr_eq(&reloaded, &cache.get_or_load(&cfg)?));
        Ok(())
    }

    #[test]
    fn loads_from_zip_bundle() -> Result<()> {
        let tmp = crate::ingest::tests::write_bundle(&[
            ("ATB cles staph aureus.csv", KEY_AGENTS_CSV),
            ("staph aureus autre atb.csv", OTHER_AGENTS_CSV),
            ("staph aureus phenotypes R.csv", PHENOTYPES_CSV),
        ])?;
        let ds = Dataset::load(&config_for(tmp.path()))?;
        assert_eq!(ds.records.len(), 3);
        Ok(())
    }
}
