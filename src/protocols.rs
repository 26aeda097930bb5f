// src/protocols.rs
// Protocol-level TVL views: top protocols by locked value and a short-window
// trend over aggregate TVL history. Pure functions over feed snapshots.

use serde::Deserialize;

/// One protocol row from the protocols endpoint. Extra feed fields are
/// ignored; `tvl` can be null for delisted protocols.
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolTvl {
    pub name: String,
    #[serde(default)]
    pub tvl: Option<f64>,
}

/// One point of aggregate TVL history from the charts endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TvlPoint {
    /// Unix timestamp (the feed serializes it as a string).
    #[serde(deserialize_with = "de_string_or_number")]
    pub date: i64,
    #[serde(rename = "totalLiquidityUSD", alias = "tvl")]
    pub total_liquidity_usd: f64,
}

impl TvlPoint {
    /// Calendar day of this point (UTC). `None` for out-of-range timestamps.
    pub fn day(&self) -> Option<chrono::NaiveDate> {
        chrono::DateTime::from_timestamp(self.date, 0).map(|dt| dt.date_naive())
    }
}

/// Percentage change over the trailing day and week.
#[derive(Debug, Clone, PartialEq)]
pub struct TvlTrend {
    pub daily_change_pct: f64,
    pub weekly_change_pct: f64,
}

/// Largest protocols by TVL, descending; rows without a TVL are skipped.
pub fn top_protocols_by_tvl(protocols: &[ProtocolTvl], n: usize) -> Vec<&ProtocolTvl> {
    let mut out: Vec<&ProtocolTvl> = protocols.iter().filter(|p| p.tvl.is_some()).collect();
    out.sort_by(|a, b| {
        b.tvl
            .unwrap_or(0.0)
            .partial_cmp(&a.tvl.unwrap_or(0.0))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    out.truncate(n);
    out
}

/// Day-over-day and week-over-week change from daily history, latest point
/// last. Needs at least 8 points (a full week plus today), and the sampled
/// points must actually be one and seven days apart; a feed with gaps or
/// duplicate days yields `None` instead of a mislabeled trend.
pub fn tvl_trend(history: &[TvlPoint]) -> Option<TvlTrend> {
    if history.len() < 8 {
        return None;
    }
    let latest = &history[history.len() - 1];
    let yesterday = &history[history.len() - 2];
    let week_ago = &history[history.len() - 8];

    let (d0, d1, d7) = (latest.day()?, yesterday.day()?, week_ago.day()?);
    if (d0 - d1).num_days() != 1 || (d0 - d7).num_days() != 7 {
        return None;
    }
    if yesterday.total_liquidity_usd <= 0.0 || week_ago.total_liquidity_usd <= 0.0 {
        return None;
    }
    Some(TvlTrend {
        daily_change_pct: (latest.total_liquidity_usd - yesterday.total_liquidity_usd)
            / yesterday.total_liquidity_usd
            * 100.0,
        weekly_change_pct: (latest.total_liquidity_usd - week_ago.total_liquidity_usd)
            / week_ago.total_liquidity_usd
            * 100.0,
    })
}

// The charts feed emits `"date": "1700000000"`; some mirrors emit a number.
fn de_string_or_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s.parse::<i64>().map_err(D::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400;
    const BASE: i64 = 1_700_006_400; // 2023-11-15 00:00:00 UTC

    fn point(date: i64, tvl: f64) -> TvlPoint {
        TvlPoint {
            date,
            total_liquidity_usd: tvl,
        }
    }

    // `n` consecutive daily points ending at BASE + (n-1) days.
    fn daily_history(n: usize, tvl: f64) -> Vec<TvlPoint> {
        (0..n).map(|i| point(BASE + i as i64 * DAY, tvl)).collect()
    }

    #[test]
    fn test_top_protocols_skips_null_tvl() {
        let protocols = vec![
            ProtocolTvl { name: "a".into(), tvl: Some(5.0e9) },
            ProtocolTvl { name: "dead".into(), tvl: None },
            ProtocolTvl { name: "b".into(), tvl: Some(9.0e9) },
        ];
        let top = top_protocols_by_tvl(&protocols, 5);
        let names: Vec<&str> = top.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_trend_requires_eight_points() {
        let history = daily_history(7, 100.0);
        assert!(tvl_trend(&history).is_none());
    }

    #[test]
    fn test_trend_changes() {
        let mut history = daily_history(8, 100.0);
        history[6].total_liquidity_usd = 110.0; // yesterday
        history[7].total_liquidity_usd = 121.0; // today
        let trend = tvl_trend(&history).unwrap();
        assert!((trend.daily_change_pct - 10.0).abs() < 1e-9);
        assert!((trend.weekly_change_pct - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_trend_rejects_gapped_history() {
        // A two-day hole before the latest point: the "yesterday" sample is
        // really two days old.
        let mut history = daily_history(8, 100.0);
        history[7].date += DAY;
        assert!(tvl_trend(&history).is_none());

        // Duplicate latest day (intraday resample) is rejected too.
        let mut history = daily_history(8, 100.0);
        history[7].date = history[6].date;
        assert!(tvl_trend(&history).is_none());
    }

    #[test]
    fn test_day_conversion() {
        let p = point(1700006400, 1.0); // 2023-11-15 00:00:00 UTC
        assert_eq!(p.day().unwrap().to_string(), "2023-11-15");
    }

    #[test]
    fn test_parses_string_dates() {
        let json = r#"[{"date": "1700000000", "totalLiquidityUSD": 1.5e9},
                       {"date": 1700086400, "totalLiquidityUSD": 1.6e9}]"#;
        let points: Vec<TvlPoint> = serde_json::from_str(json).unwrap();
        assert_eq!(points[0].date, 1700000000);
        assert_eq!(points[1].date, 1700086400);
    }
}
