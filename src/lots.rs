use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::config::LotConfig;
use crate::engine::{Engine, EngineError};
use crate::limits::*;
use crate::notify::NotifyHub;

/// A lot shared between callers. The mutex is the one exclusion boundary for
/// the whole lot: hold it for the entire operation, never across two.
pub type SharedLot = Arc<Mutex<Engine>>;

/// Named lots, created lazily from one shared config.
pub struct LotManager {
    lots: DashMap<String, SharedLot>,
    config: LotConfig,
}

impl LotManager {
    pub fn new(config: LotConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            lots: DashMap::new(),
            config,
        })
    }

    pub fn config(&self) -> &LotConfig {
        &self.config
    }

    /// Get or lazily create the lot called `name`.
    pub fn get_or_create(&self, name: &str) -> Result<SharedLot, EngineError> {
        if let Some(lot) = self.lots.get(name) {
            return Ok(lot.value().clone());
        }
        if name.len() > MAX_LOT_NAME_LEN {
            return Err(EngineError::LimitExceeded("lot name too long"));
        }
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            return Err(EngineError::InvalidLotName(name.to_string()));
        }
        if self.lots.len() >= MAX_LOTS {
            return Err(EngineError::LimitExceeded("too many lots"));
        }

        let lot = self
            .lots
            .entry(name.to_string())
            .or_try_insert_with(|| {
                let engine = Engine::new(&self.config, Arc::new(NotifyHub::new()))?;
                tracing::info!("created lot {name}");
                Ok::<_, EngineError>(Arc::new(Mutex::new(engine)))
            })?
            .value()
            .clone();
        metrics::gauge!(crate::observability::LOTS_ACTIVE).set(self.lots.len() as f64);
        Ok(lot)
    }

    pub fn get(&self, name: &str) -> Option<SharedLot> {
        self.lots.get(name).map(|e| e.value().clone())
    }

    /// Lot names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lots.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    /// Re-initialize a lot in place. Existing handles see the fresh state.
    pub async fn reset(&self, name: &str) -> bool {
        let Some(lot) = self.get(name) else {
            return false;
        };
        lot.lock().await.reset();
        true
    }

    /// Drop a lot. Its event subscribers are disconnected.
    pub async fn remove(&self, name: &str) -> bool {
        let Some((_, lot)) = self.lots.remove(name) else {
            return false;
        };
        lot.lock().await.notify.clear();
        metrics::gauge!(crate::observability::LOTS_ACTIVE).set(self.lots.len() as f64);
        tracing::info!("removed lot {name}");
        true
    }
}
