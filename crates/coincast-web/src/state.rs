//! Shared state handed to every handler as `State<Arc<AppState>>`.
//!
//! Nothing here is mutable: each request runs its own pipeline over the
//! shared, read-only service.

use std::path::PathBuf;
use std::sync::Arc;

use coincast_core::{PredictionService, UtcDateTime};
use time::Date;

/// Source of "today" for horizon resolution.
pub type Clock = Arc<dyn Fn() -> Date + Send + Sync>;

#[derive(Clone)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Clone)]
pub struct AppState {
    pub service: PredictionService,
    pub build: BuildInfo,
    pub static_dir: PathBuf,
    pub clock: Clock,
}

impl AppState {
    pub fn new(service: PredictionService, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            service,
            build: BuildInfo {
                service: "coincast-web",
                version: env!("CARGO_PKG_VERSION"),
            },
            static_dir: static_dir.into(),
            clock: Arc::new(|| UtcDateTime::now().date()),
        }
    }

    /// Pin "today", for tests.
    pub fn with_fixed_today(mut self, today: Date) -> Self {
        self.clock = Arc::new(move || today);
        self
    }

    pub fn today(&self) -> Date {
        (self.clock)()
    }
}
