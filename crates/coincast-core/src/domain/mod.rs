//! # Domain Models
//!
//! Canonical value types shared by the adapters, the forecast engine and the
//! response formatter.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated, upper-cased ticker |
//! | [`UtcDateTime`] | UTC timestamp |
//! | [`PriceSeries`] | Normalized daily closes, oldest first |
//! | [`CoinSnapshot`] | Current market figures for one coin |
//!
//! All of them are request-scoped: built fresh per call and never mutated
//! after construction.

mod series;
mod snapshot;
mod symbol;
mod timestamp;

pub use series::{PriceSample, PriceSeries, RawObservation, SeriesProvenance};
pub use snapshot::CoinSnapshot;
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
