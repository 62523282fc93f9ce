//! Property tests for normalization invariants.
//!
//! Uses proptest to verify:
//! 1. Date pieces rejoin to the date they were split from
//! 2. Price text is copied verbatim from either source
//! 3. Both sources yield exactly one record per input entry

use indexload_core::data::csv_import::read_rows;
use indexload_core::data::{normalize_api, normalize_rows, RawDailyPoint, RawDailyRow, RawDailySeries};
use indexload_core::domain::split_date;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_date() -> impl Strategy<Value = String> {
    (1900u32..2100, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| format!("{y:04}-{m:02}-{d:02}"))
}

/// Price text as a source would emit it: digits with an optional fraction.
fn arb_price() -> impl Strategy<Value = String> {
    "[0-9]{1,6}(\\.[0-9]{1,6})?"
}

fn arb_row() -> impl Strategy<Value = RawDailyRow> {
    (arb_date(), arb_price(), arb_price(), arb_price(), arb_price()).prop_map(
        |(date, open, high, low, close)| RawDailyRow {
            date,
            open,
            high,
            low,
            close,
        },
    )
}

// ── 1. Date split ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn split_then_join_is_identity(date in arb_date()) {
        let pieces = split_date(&date).unwrap();
        prop_assert_eq!(pieces.join(), date);
    }

    /// Any three dash-free segments split back into those segments.
    #[test]
    fn split_keeps_segments(
        a in "[^-]{0,6}",
        b in "[^-]{0,6}",
        c in "[^-]{0,6}",
    ) {
        let pieces = split_date(&format!("{a}-{b}-{c}")).unwrap();
        prop_assert_eq!(pieces.year, a);
        prop_assert_eq!(pieces.month, b);
        prop_assert_eq!(pieces.day, c);
    }

    #[test]
    fn extra_separator_is_rejected(date in arb_date(), tail in "[0-9]{1,2}") {
        let err = split_date(&format!("{date}-{tail}")).unwrap_err();
        prop_assert_eq!(err.parts, 4);
    }
}

// ── 2 & 3. Verbatim copy, one record per entry ──────────────────────

proptest! {
    #[test]
    fn csv_rows_copy_verbatim(rows in prop::collection::vec(arb_row(), 1..40)) {
        let mut text = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
        for r in &rows {
            text.push_str(&format!("{},{},{},{},{},{},0\n", r.date, r.open, r.high, r.low, r.close, r.close));
        }

        let parsed = read_rows(text.as_bytes()).unwrap();
        prop_assert_eq!(&parsed, &rows);

        let records = normalize_rows(parsed).unwrap();
        prop_assert_eq!(records.len(), rows.len());
        for (record, row) in records.iter().zip(&rows) {
            prop_assert_eq!(&record.date, &row.date);
            prop_assert_eq!(&record.open, &row.open);
            prop_assert_eq!(&record.high, &row.high);
            prop_assert_eq!(&record.low, &row.low);
            prop_assert_eq!(&record.close, &row.close);
        }
    }

    #[test]
    fn api_series_yields_one_record_per_date(
        series in prop::collection::btree_map(
            arb_date(),
            (arb_price(), arb_price(), arb_price(), arb_price()),
            1..40,
        )
    ) {
        let raw: RawDailySeries = series
            .iter()
            .map(|(date, (open, high, low, close))| {
                (
                    date.clone(),
                    RawDailyPoint {
                        open: open.clone(),
                        high: high.clone(),
                        low: low.clone(),
                        close: close.clone(),
                    },
                )
            })
            .collect();

        let records = normalize_api(raw).unwrap();
        prop_assert_eq!(records.len(), series.len());
        for record in &records {
            let (open, high, low, close) = &series[&record.date];
            prop_assert_eq!(&record.open, open);
            prop_assert_eq!(&record.high, high);
            prop_assert_eq!(&record.low, low);
            prop_assert_eq!(&record.close, close);
            prop_assert_eq!(record.date_pieces.join(), record.date.clone());
        }
    }
}
