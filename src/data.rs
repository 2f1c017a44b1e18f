//! Occupancy samples: CSV parsing and the derived columns the chart needs.

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

pub const REQUIRED_COLUMNS: [&str; 3] = ["hora", "personas", "porcentaje"];

/// Timestamp layouts accepted for the `hora` column.
const TS_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Fixed Monday every sample's clock time is projected onto, so all weeks
/// share one horizontal axis.
pub fn reference_monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 3).expect("fixed reference date")
}

/// One occupancy observation: timestamp, head count, and the percentage the
/// feed derives from the venue capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub hora: NaiveDateTime,
    pub personas: i64,
    pub porcentaje: i64,
}

impl Sample {
    /// 0 = Monday .. 6 = Sunday.
    pub fn weekday_index(&self) -> u32 {
        self.hora.weekday().num_days_from_monday()
    }

    /// The Monday at-or-before the sample's date, at midnight.
    pub fn week_start(&self) -> NaiveDate {
        self.hora.date() - Duration::days(self.weekday_index() as i64)
    }

    /// Hour and minute re-projected onto the reference Monday, seconds zeroed.
    pub fn normalized_time(&self) -> NaiveDateTime {
        reference_monday()
            .and_hms_opt(self.hora.hour(), self.hora.minute(), 0)
            .expect("hour/minute taken from a valid timestamp")
    }
}

/// Parse the raw feed. The header must name every column in
/// [`REQUIRED_COLUMNS`]; a single malformed row fails the whole run.
pub fn parse_csv(text: &str) -> Result<Vec<Sample>> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header) = lines.next().ok_or_else(|| anyhow!("empty csv"))?;
    let columns: Vec<&str> = header.split(',').map(|s| s.trim()).collect();
    let position = |name: &str| -> Result<usize> {
        columns
            .iter()
            .position(|c| *c == name)
            .ok_or_else(|| anyhow!("missing column {:?} in header {:?}", name, columns))
    };
    let [hora_name, personas_name, porcentaje_name] = REQUIRED_COLUMNS;
    let hora_col = position(hora_name)?;
    let personas_col = position(personas_name)?;
    let porcentaje_col = position(porcentaje_name)?;

    let mut samples = Vec::new();
    for (lineno, line) in lines {
        let fields: Vec<&str> = line.split(',').map(|s| s.trim()).collect();
        let field = |col: usize| -> Result<&str> {
            fields.get(col).copied().ok_or_else(|| {
                anyhow!(
                    "line {}: expected {} columns, got {}",
                    lineno + 1,
                    columns.len(),
                    fields.len()
                )
            })
        };

        let hora = parse_ts(field(hora_col)?).with_context(|| format!("line {}", lineno + 1))?;
        let personas = field(personas_col)?
            .parse::<i64>()
            .with_context(|| format!("line {}: bad personas", lineno + 1))?;
        let porcentaje =
            parse_pct(field(porcentaje_col)?).with_context(|| format!("line {}", lineno + 1))?;

        samples.push(Sample {
            hora,
            personas,
            porcentaje,
        });
    }
    Ok(samples)
}

fn parse_ts(raw: &str) -> Result<NaiveDateTime> {
    for fmt in TS_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(ts);
        }
    }
    Err(anyhow!("bad hora {:?}", raw))
}

fn parse_pct(raw: &str) -> Result<i64> {
    let digits = raw
        .strip_suffix('%')
        .ok_or_else(|| anyhow!("bad porcentaje {:?}: missing % suffix", raw))?;
    digits
        .trim()
        .parse::<i64>()
        .with_context(|| format!("bad porcentaje {:?}", raw))
}

/// Distinct week-start Mondays, ascending.
pub fn week_starts(samples: &[Sample]) -> Vec<NaiveDate> {
    let mut weeks: Vec<NaiveDate> = samples.iter().map(|s| s.week_start()).collect();
    weeks.sort();
    weeks.dedup();
    weeks
}

/// Weekday indices ordered by mean head count over the whole dataset,
/// highest first. Days without data sort last; ties fall back to calendar
/// order. The same order is reused for every week.
pub fn weekday_rank(samples: &[Sample]) -> Vec<u32> {
    let mut sum = [0i64; 7];
    let mut count = [0u64; 7];
    for s in samples {
        let day = s.weekday_index() as usize;
        sum[day] += s.personas;
        count[day] += 1;
    }

    let mean = |day: u32| -> f64 {
        let day = day as usize;
        if count[day] > 0 {
            sum[day] as f64 / count[day] as f64
        } else {
            f64::NEG_INFINITY
        }
    };

    let mut order: Vec<u32> = (0..7).collect();
    order.sort_by(|a, b| {
        mean(*b)
            .partial_cmp(&mean(*a))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(b))
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: &str, personas: i64, porcentaje: i64) -> Sample {
        Sample {
            hora: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap(),
            personas,
            porcentaje,
        }
    }

    #[test]
    fn test_parse_csv_happy_path() {
        let csv = "hora,personas,porcentaje\n\
                   2024-04-15 07:30:00,80,20%\n\
                   2024-04-16 18:00:00,250,63%\n";
        let samples = parse_csv(csv).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].personas, 80);
        assert_eq!(samples[0].porcentaje, 20);
        assert_eq!(samples[1].hora.hour(), 18);
    }

    #[test]
    fn test_parse_csv_column_order_independent() {
        let csv = "porcentaje,hora,personas\n30%,2024-04-15 07:30:00,120\n";
        let samples = parse_csv(csv).unwrap();
        assert_eq!(samples[0].personas, 120);
        assert_eq!(samples[0].porcentaje, 30);
    }

    #[test]
    fn test_parse_csv_missing_column() {
        let csv = "hora,personas\n2024-04-15 07:30:00,80\n";
        let err = parse_csv(csv).unwrap_err();
        assert!(err.to_string().contains("porcentaje"), "got: {}", err);
    }

    #[test]
    fn test_parse_csv_bad_percentage() {
        let csv = "hora,personas,porcentaje\n2024-04-15 07:30:00,80,20\n";
        assert!(parse_csv(csv).is_err(), "percentage without % must fail");
    }

    #[test]
    fn test_parse_csv_bad_personas() {
        let csv = "hora,personas,porcentaje\n2024-04-15 07:30:00,many,20%\n";
        assert!(parse_csv(csv).is_err());
    }

    #[test]
    fn test_parse_csv_bad_timestamp() {
        let csv = "hora,personas,porcentaje\n15/04/2024 07:30,80,20%\n";
        assert!(parse_csv(csv).is_err());
    }

    #[test]
    fn test_parse_csv_alternate_timestamp_layouts() {
        let csv = "hora,personas,porcentaje\n\
                   2024-04-15T07:30:00,80,20%\n\
                   2024-04-15 08:15,90,22%\n";
        let samples = parse_csv(csv).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].hora.minute(), 15);
    }

    #[test]
    fn test_weekday_index_range_and_monday_key() {
        // One sample per calendar day across two weeks.
        for day in 15..=28 {
            let s = sample(&format!("2024-04-{:02} 10:00:00", day), 100, 25);
            let idx = s.weekday_index();
            assert!(idx <= 6);
            let week = s.week_start();
            assert_eq!(week.weekday().num_days_from_monday(), 0, "week key must be a Monday");
            assert!(week <= s.hora.date());
        }
    }

    #[test]
    fn test_week_start_sunday_maps_back_to_monday() {
        // 2024-04-21 is a Sunday; its week starts 2024-04-15.
        let s = sample("2024-04-21 09:00:00", 50, 12);
        assert_eq!(s.week_start(), NaiveDate::from_ymd_opt(2024, 4, 15).unwrap());
    }

    #[test]
    fn test_normalized_time_aligns_weeks() {
        // Two Mondays, same clock time: normalized values must be equal.
        let a = sample("2024-04-15 07:45:10", 80, 20);
        let b = sample("2024-04-22 07:45:59", 90, 22);
        assert_ne!(a.hora.date(), b.hora.date());
        assert_eq!(a.normalized_time(), b.normalized_time());
        assert_eq!(a.normalized_time().second(), 0);
        assert_eq!(a.normalized_time().date(), reference_monday());
    }

    #[test]
    fn test_week_starts_sorted_distinct() {
        let samples = vec![
            sample("2024-04-22 10:00:00", 100, 25),
            sample("2024-04-15 10:00:00", 100, 25),
            sample("2024-04-16 10:00:00", 100, 25),
        ];
        let weeks = week_starts(&samples);
        assert_eq!(
            weeks,
            vec![
                NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
                NaiveDate::from_ymd_opt(2024, 4, 22).unwrap(),
            ]
        );
    }

    #[test]
    fn test_weekday_rank_is_permutation() {
        let samples = vec![
            sample("2024-04-15 10:00:00", 100, 25),
            sample("2024-04-17 10:00:00", 300, 75),
        ];
        let mut rank = weekday_rank(&samples);
        rank.sort();
        assert_eq!(rank, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_weekday_rank_orders_by_mean_descending() {
        // Wednesday busier than Monday, Monday busier than Friday.
        let samples = vec![
            sample("2024-04-15 10:00:00", 100, 25),
            sample("2024-04-15 11:00:00", 200, 50),
            sample("2024-04-17 10:00:00", 300, 75),
            sample("2024-04-19 10:00:00", 40, 10),
        ];
        let rank = weekday_rank(&samples);
        assert_eq!(&rank[..3], &[2, 0, 4], "observed days ranked by mean");
        // Days without data keep calendar order at the tail.
        assert_eq!(&rank[3..], &[1, 3, 5, 6]);
    }

    #[test]
    fn test_weekday_rank_empty_dataset() {
        let rank = weekday_rank(&[]);
        assert_eq!(rank, (0..7).collect::<Vec<_>>());
    }
}
