//! JSON file persistence of the store state.

use crate::domain::error::PackError;
use crate::domain::store::StoreState;
use crate::ports::state_port::StatePort;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

pub struct JsonStateAdapter {
    path: PathBuf,
}

impl JsonStateAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl StatePort for JsonStateAdapter {
    fn load(&self) -> Result<Option<StoreState>, PackError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file = File::open(&self.path)?;
        let state: StoreState =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| PackError::State {
                reason: format!("failed to parse {}: {}", self.path.display(), e),
            })?;
        info!(
            path = %self.path.display(),
            tickers = state.series.len(),
            "loaded store state"
        );
        Ok(Some(state))
    }

    fn save(&self, state: &StoreState) -> Result<(), PackError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer(&mut writer, state).map_err(|e| PackError::State {
            reason: format!("failed to serialize state: {}", e),
        })?;
        writer.flush()?;
        info!(
            path = %self.path.display(),
            tickers = state.series.len(),
            "saved store state"
        );
        Ok(())
    }
}
