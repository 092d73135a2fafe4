use async_trait::async_trait;

use crate::{PriceBar, Result};

/// Abstraction over a provider of daily price bars.
///
/// `MockSource` in `crates/collector` implements this for local runs and tests.
/// Implementations return bars in strictly ascending date order.
#[async_trait]
pub trait BarSource: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &str;

    /// Fetch up to `days` trading days of bars for `symbol`, oldest first.
    async fn daily_bars(&self, symbol: &str, days: usize) -> Result<Vec<PriceBar>>;
}
