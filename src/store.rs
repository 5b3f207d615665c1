//! On-disk persistence of the daily inflow history.
//!
//! One JSON file per fundraiser slug. Writes go to a temp file that is
//! renamed into place, so an interrupted write never leaves a torn file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::Result;
use crate::tracker::{DailySeries, SeriesState};

pub struct SeriesStore {
    /// Directory holding one `<slug>.json` per fundraiser.
    pub dir: PathBuf,
}

impl SeriesStore {
    /// Open a store, creating the directory if it does not exist.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{slug}.json"))
    }

    /// Load the saved series for `slug`.
    ///
    /// Returns `Ok(None)` when nothing was saved yet. A corrupt file is
    /// removed and also reported as `None`, so the next save starts fresh.
    pub fn load(&self, slug: &str) -> Result<Option<DailySeries>> {
        let path = self.path_for(slug);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)?;
        match serde_json::from_str::<SeriesState>(&contents) {
            Ok(state) => Ok(Some(DailySeries::from_state(state))),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt series file -- removing");
                let _ = fs::remove_file(&path);
                Ok(None)
            }
        }
    }

    pub fn save(&self, slug: &str, series: &DailySeries) -> Result<()> {
        let path = self.path_for(slug);
        let tmp = path.with_extension("json.tmp");

        let result = (|| -> Result<()> {
            let json = serde_json::to_vec_pretty(&series.to_state())?;
            fs::write(&tmp, json)?;
            fs::rename(&tmp, &path)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    /// Delete the saved series for `slug`, if any.
    pub fn remove(&self, slug: &str) -> Result<()> {
        let path = self.path_for(slug);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
