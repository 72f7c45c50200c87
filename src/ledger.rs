//! Date-keyed word count history.
//!
//! Stored as `YYYY-MM-DD<TAB>count` lines with no header, sorted by date.
//! There is at most one entry per day; recording again on the same day
//! replaces that day's entry.

use crate::charts::{Chart, ProgressChart};
use crate::error::ProjectError;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

/// Ledger file name inside the progress directory.
pub const LEDGER_FILE: &str = "progress.tsv";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressLedger {
    entries: BTreeMap<NaiveDate, i64>,
}

impl ProgressLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses ledger text. Blank lines are skipped; any other line that is
    /// not exactly `date<TAB>count` is an error.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ProjectError> {
        let mut entries = BTreeMap::new();

        for (index, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let malformed = || ProjectError::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                content: line.to_string(),
            };

            let mut fields = trimmed.split('\t');
            let (Some(date), Some(count), None) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(malformed());
            };

            let date = NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| malformed())?;
            let count = count.trim().parse::<i64>().map_err(|_| malformed())?;
            entries.insert(date, count);
        }

        Ok(Self { entries })
    }

    /// Loads the ledger at `path`; a missing file is an empty history.
    pub async fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path).await {
            Ok(text) => Ok(Self::parse(&text, path)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No ledger yet at {}", path.display());
                Ok(Self::new())
            }
            Err(e) => Err(ProjectError::io(format!("reading {}", path.display()), e).into()),
        }
    }

    /// Overwrites the ledger file with every entry, oldest first.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ProjectError::io(format!("creating {}", parent.display()), e))?;
        }
        fs::write(path, self.to_tsv())
            .await
            .map_err(|e| ProjectError::io(format!("writing {}", path.display()), e))?;
        debug!("Wrote {} ledger entries to {}", self.entries.len(), path.display());
        Ok(())
    }

    pub fn to_tsv(&self) -> String {
        self.entries
            .iter()
            .map(|(date, count)| format!("{}\t{}\n", date.format(DATE_FORMAT), count))
            .collect()
    }

    /// Sets the count for `date` and returns that day's delta.
    pub fn record(&mut self, date: NaiveDate, count: i64) -> i64 {
        self.entries.insert(date, count);
        self.delta_for(date).unwrap_or(count)
    }

    /// Count on `date` minus the count on the nearest earlier recorded date
    /// (zero when there is none).
    pub fn delta_for(&self, date: NaiveDate) -> Option<i64> {
        let count = *self.entries.get(&date)?;
        let previous = self
            .entries
            .range(..date)
            .next_back()
            .map_or(0, |(_, c)| *c);
        Some(count - previous)
    }

    pub fn get(&self, date: NaiveDate) -> Option<i64> {
        self.entries.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (NaiveDate, i64)> + '_ {
        self.entries.iter().map(|(d, c)| (*d, *c))
    }

    /// Total count per recorded date.
    pub fn cumulative_series(&self) -> Vec<(NaiveDate, i64)> {
        self.entries().collect()
    }

    /// Per-date deltas, the first entry measured against zero.
    pub fn daily_series(&self) -> Vec<(NaiveDate, i64)> {
        let mut last = 0;
        self.entries()
            .map(|(date, count)| {
                let delta = count - last;
                last = count;
                (date, delta)
            })
            .collect()
    }

    /// Renders the overall and daily charts next to the ledger file.
    pub async fn write_charts(
        &self,
        dir: &Path,
        book_name: &str,
        renderer: &dyn ProgressChart,
    ) -> Result<()> {
        let charts = [
            (
                "progress-overall",
                Chart {
                    title: format!("Overall Word Count Progress for \"{book_name}\""),
                    points: labelled(self.cumulative_series()),
                },
            ),
            (
                "progress-daily",
                Chart {
                    title: format!("Daily Word Count Progress for \"{book_name}\""),
                    points: labelled(self.daily_series()),
                },
            ),
        ];

        for (stem, chart) in charts {
            let Some(document) = renderer.render(&chart) else {
                continue;
            };
            let path = dir.join(format!("{stem}.{}", renderer.extension()));
            fs::write(&path, document)
                .await
                .map_err(|e| ProjectError::io(format!("writing {}", path.display()), e))?;
            info!("Wrote: {}", path.display());
        }
        Ok(())
    }
}

/// Loads the ledger, records `count` for today, saves it and returns today's
/// delta. Charts go next to the ledger file.
pub async fn record_today(
    path: &Path,
    count: i64,
    renderer: &dyn ProgressChart,
    book_name: &str,
) -> Result<i64> {
    let today = Local::now().date_naive();
    let mut ledger = ProgressLedger::load(path).await?;
    let delta = ledger.record(today, count);
    ledger.save(path).await?;

    if let Some(dir) = path.parent() {
        ledger.write_charts(dir, book_name, renderer).await?;
    }

    Ok(delta)
}

fn labelled(series: Vec<(NaiveDate, i64)>) -> Vec<(String, i64)> {
    series
        .into_iter()
        .map(|(date, value)| (date.format(DATE_FORMAT).to_string(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::NoCharts;
    use tempfile::tempdir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_same_day_overwrites() {
        let mut ledger = ProgressLedger::new();
        ledger.record(day(1), 40);
        assert_eq!(ledger.record(day(2), 100), 60);
        assert_eq!(ledger.record(day(2), 150), 110);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.get(day(2)), Some(150));
    }

    #[test]
    fn test_daily_deltas() {
        let mut ledger = ProgressLedger::new();
        assert_eq!(ledger.record(day(1), 50), 50);
        assert_eq!(ledger.record(day(2), 80), 30);
        assert_eq!(ledger.record(day(3), 95), 15);
    }

    #[test]
    fn test_delta_skips_gaps() {
        let mut ledger = ProgressLedger::new();
        ledger.record(day(1), 200);
        assert_eq!(ledger.record(day(9), 260), 60);
    }

    #[test]
    fn test_delta_ignores_later_entries() {
        let mut ledger = ProgressLedger::new();
        ledger.record(day(5), 500);
        assert_eq!(ledger.record(day(3), 300), 300);
        assert_eq!(ledger.delta_for(day(5)), Some(200));
    }

    #[test]
    fn test_tsv_sorted_by_date() {
        let mut ledger = ProgressLedger::new();
        ledger.record(day(12), 30);
        ledger.record(day(2), 10);
        assert_eq!(ledger.to_tsv(), "2026-10-02\t10\n2026-10-12\t30\n");
    }

    #[test]
    fn test_parse_roundtrip_and_blank_lines() {
        let text = "2026-10-01\t5\n\n2026-10-03\t9\n";
        let ledger = ProgressLedger::parse(text, Path::new("p.tsv")).unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.to_tsv(), "2026-10-01\t5\n2026-10-03\t9\n");
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        for bad in ["2026-10-01 5", "2026-10-01\tfive", "yesterday\t5", "2026-10-01\t5\textra"] {
            let err = ProgressLedger::parse(bad, Path::new("p.tsv")).unwrap_err();
            assert!(
                matches!(err, ProjectError::Parse { line: 1, .. }),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_series() {
        let mut ledger = ProgressLedger::new();
        ledger.record(day(1), 50);
        ledger.record(day(2), 80);
        ledger.record(day(4), 70);

        let daily: Vec<_> = ledger.daily_series().into_iter().map(|(_, v)| v).collect();
        assert_eq!(daily, vec![50, 30, -10]);
        let total: Vec<_> = ledger.cumulative_series().into_iter().map(|(_, v)| v).collect();
        assert_eq!(total, vec![50, 80, 70]);
    }

    #[tokio::test]
    async fn test_record_today_persists() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("Progress").join(LEDGER_FILE);

        assert_eq!(record_today(&path, 100, &NoCharts, "Book").await?, 100);
        assert_eq!(record_today(&path, 150, &NoCharts, "Book").await?, 150);

        let ledger = ProgressLedger::load(&path).await?;
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(Local::now().date_naive()), Some(150));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_ledger_is_empty() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let ledger = ProgressLedger::load(&dir.path().join(LEDGER_FILE)).await?;
        assert!(ledger.is_empty());
        Ok(())
    }
}
