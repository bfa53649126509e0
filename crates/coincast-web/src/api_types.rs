//! Request and response bodies specific to the HTTP surface.
//!
//! Result shapes shared with the CLI live in `coincast_core::response`.

use coincast_core::ProviderId;
use serde::{Deserialize, Serialize};

/// `POST /predict_linear` body. Exactly one of `target_date` and
/// `days_ahead` must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictBody {
    pub symbol: String,
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default)]
    pub days_ahead: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
    pub provider: ProviderId,
}
