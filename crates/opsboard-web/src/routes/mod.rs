//! Route handlers.

pub mod crypto;
pub mod dashboard;
pub mod internal;
pub mod peers;
pub mod weather;

use opsboard_core::provider::chart::ChartData;
use opsboard_core::provider::Fetched;
use serde::Serialize;

/// Fetched data together with its chart series.
#[derive(Serialize)]
pub struct Charted<T> {
    #[serde(flatten)]
    pub fetched: Fetched<T>,
    pub chart: ChartData,
}
