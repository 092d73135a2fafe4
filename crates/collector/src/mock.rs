use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use tracing::debug;

use common::{BarSource, Error, PriceBar, Result, MAX_HISTORY_DAYS};

/// Deterministic synthetic daily bars.
///
/// Every symbol gets its own base price and volume derived from a stable hash
/// of its name, and a seeded random walk from there. Two sources with the
/// same `end_date` always return identical bars for the same request.
#[derive(Debug, Clone)]
pub struct MockSource {
    end_date: NaiveDate,
}

impl MockSource {
    /// Bars end at `end_date`, or the Friday before it when it falls on a
    /// weekend.
    pub fn new(end_date: NaiveDate) -> Self {
        Self {
            end_date: last_weekday_on_or_before(end_date).unwrap_or(end_date),
        }
    }

    /// Bars ending today (UTC).
    pub fn today() -> Self {
        Self::new(Utc::now().date_naive())
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }
}

#[async_trait]
impl BarSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn daily_bars(&self, symbol: &str, days: usize) -> Result<Vec<PriceBar>> {
        validate_symbol(symbol)?;
        if days > MAX_HISTORY_DAYS {
            return Err(Error::Source(format!(
                "requested {days} days, at most {MAX_HISTORY_DAYS} are available"
            )));
        }
        let symbol = symbol.to_uppercase();
        let h = symbol_hash(&symbol);

        let base_price = 150.0 + (h % 100) as f64;
        let base_volume = 1_000_000 + h % 5_000_000;
        let mut rng = StdRng::seed_from_u64(h);

        let mut dates = Vec::with_capacity(days);
        let mut date = self.end_date;
        if days > 0 {
            dates.push(date);
        }
        while dates.len() < days {
            date = previous_weekday(date).ok_or_else(|| {
                Error::Source(format!("{days} days before {} is out of range", self.end_date))
            })?;
            dates.push(date);
        }
        dates.reverse();

        let mut price = base_price;
        let bars: Vec<PriceBar> = dates
            .into_iter()
            .map(|date| {
                let open = price;
                let change = rng.gen_range(-0.02..0.02) + 0.0003;
                price = (price * (1.0 + change)).max(1.0);
                let close = price;
                let high = open.max(close) * (1.0 + rng.gen::<f64>() * 0.01);
                let low = open.min(close) * (1.0 - rng.gen::<f64>() * 0.01);
                let volume = (base_volume as f64 * rng.gen_range(0.5..1.5)) as u64;
                PriceBar::new(date, open, high, low, close, volume)
            })
            .collect();

        debug!(symbol = %symbol, bars = bars.len(), base_price, "Mock bars generated");
        Ok(bars)
    }
}

fn validate_symbol(symbol: &str) -> Result<()> {
    if symbol.is_empty() {
        return Err(Error::Source("empty symbol".into()));
    }
    if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::Source(format!("invalid symbol '{symbol}'")));
    }
    Ok(())
}

/// Stable across runs and platforms, unlike `std::hash`.
fn symbol_hash(symbol: &str) -> u64 {
    let digest = Sha256::digest(symbol.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

/// `None` once the walk runs past the earliest representable date.
fn previous_weekday(date: NaiveDate) -> Option<NaiveDate> {
    last_weekday_on_or_before(date.checked_sub_days(Days::new(1))?)
}

fn last_weekday_on_or_before(mut date: NaiveDate) -> Option<NaiveDate> {
    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        date = date.checked_sub_days(Days::new(1))?;
    }
    Some(date)
}
