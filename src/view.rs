//! Which records the board shows, and in what order.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::task::{Priority, Record, COMPLETE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Drops blank spreadsheet rows.
    HasIdentifier,
    StatusEquals(String),
    StatusNotEquals(String),
}

impl Predicate {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::HasIdentifier => !record.id().is_empty(),
            Predicate::StatusEquals(s) => record.status() == s.as_str(),
            Predicate::StatusNotEquals(s) => record.status() != s.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Earliest due date first, undated last.
    #[default]
    Date,
    /// High, then Medium, then Low, then anything else.
    Priority,
}

impl SortMode {
    pub fn toggle(self) -> Self {
        match self {
            SortMode::Date => SortMode::Priority,
            SortMode::Priority => SortMode::Date,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMode::Date => "date",
            SortMode::Priority => "priority",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    pub show_complete: bool,
    pub sort: SortMode,
    /// Extra filters applied after the defaults.
    pub extra: Vec<Predicate>,
}

impl ViewOptions {
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut preds = vec![Predicate::HasIdentifier];
        if !self.show_complete {
            preds.push(Predicate::StatusNotEquals(COMPLETE.to_string()));
        }
        preds.extend(self.extra.iter().cloned());
        preds
    }
}

pub fn filter<'a>(records: &'a [Record], predicates: &[Predicate]) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|r| predicates.iter().all(|p| p.matches(r)))
        .collect()
}

/// Stable sort: records with equal keys keep their input order.
pub fn sort(records: &mut [&Record], mode: SortMode) {
    match mode {
        SortMode::Date => records.sort_by_key(|r| date_key(r.date())),
        SortMode::Priority => {
            records.sort_by(|a, b| Priority::rank(b.priority()).cmp(&Priority::rank(a.priority())))
        }
    }
}

pub fn visible<'a>(records: &'a [Record], opts: &ViewOptions) -> Vec<&'a Record> {
    let mut shown = filter(records, &opts.predicates());
    sort(&mut shown, opts.sort);
    shown
}

/// Visible records whose normalized priority is `column`.
pub fn column<'a>(records: &'a [Record], opts: &ViewOptions, column: Priority) -> Vec<&'a Record> {
    visible(records, opts)
        .into_iter()
        .filter(|r| r.column() == column)
        .collect()
}

/// Undated and unparsable records sort as if due on this day.
pub fn far_future() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2099, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MAX)
}

fn date_key(raw: &str) -> NaiveDateTime {
    parse_date(raw).unwrap_or_else(far_future)
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%b %d, %Y", "%B %d, %Y"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// Parses the date shapes spreadsheet exports commonly produce.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for date_fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, date_fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
        for time_fmt in TIME_FORMATS {
            let fmt = format!("{date_fmt} {time_fmt}");
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, &fmt) {
                return Some(dt);
            }
        }
    }
    None
}

/// Short card date such as `Mar 5`, or `None` when the value does not parse.
pub fn display_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|dt| dt.format("%b %-d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn ids(records: &[&Record]) -> Vec<String> {
        records.iter().map(|r| r.id().to_string()).collect()
    }

    #[test]
    fn hides_complete_and_keeps_order() {
        let records = parse("Unique_ID,Status\n1,Complete\n2,Pending\n3,Complete\n");
        let shown = filter(&records, &[Predicate::StatusNotEquals(COMPLETE.into())]);
        assert_eq!(ids(&shown), vec!["2"]);
    }

    #[test]
    fn status_match_is_case_sensitive() {
        let records = parse("Unique_ID,Status\n1,complete\n2,Complete\n");
        let shown = filter(&records, &[Predicate::StatusEquals(COMPLETE.into())]);
        assert_eq!(ids(&shown), vec!["2"]);
    }

    #[test]
    fn blank_identifiers_are_dropped() {
        let records = parse("Unique_ID,Task\n,ghost\n4,real\n");
        let shown = visible(&records, &ViewOptions::default());
        assert_eq!(ids(&shown), vec!["4"]);
    }

    #[test]
    fn priority_sort_descends_by_rank() {
        let records = parse("Unique_ID,Priority\n1,Low\n2,High\n3,Medium\n");
        let opts = ViewOptions { sort: SortMode::Priority, ..Default::default() };
        let shown = visible(&records, &opts);
        let labels: Vec<&str> = shown.iter().map(|r| r.priority()).collect();
        assert_eq!(labels, vec!["High", "Medium", "Low"]);
    }

    #[test]
    fn priority_sort_is_stable_and_unknown_last() {
        let records = parse("Unique_ID,Priority\n1,Low\n2,Soon\n3,High\n4,Low\n5,High\n");
        let opts = ViewOptions { sort: SortMode::Priority, ..Default::default() };
        assert_eq!(ids(&visible(&records, &opts)), vec!["3", "5", "1", "4", "2"]);
    }

    #[test]
    fn priority_sort_ignores_label_case() {
        let records = parse("Unique_ID,Priority\n1,high\n2,High\n3,LOW\n4,medium\n");
        let opts = ViewOptions { sort: SortMode::Priority, ..Default::default() };
        assert_eq!(ids(&visible(&records, &opts)), vec!["1", "2", "4", "3"]);
        assert_eq!(ids(&column(&records, &opts, Priority::High)), vec!["1", "2"]);
    }

    #[test]
    fn date_sort_puts_undated_last() {
        let records = parse(
            "Unique_ID,Date\n1,\n2,2024-03-10\n3,not a date\n4,3/1/2024\n5,2024-03-10\n",
        );
        let shown = visible(&records, &ViewOptions::default());
        assert_eq!(ids(&shown), vec!["4", "2", "5", "1", "3"]);
    }

    #[test]
    fn show_complete_includes_everything_with_an_id() {
        let records = parse("Unique_ID,Status\n1,Complete\n2,Pending\n");
        let opts = ViewOptions { show_complete: true, ..Default::default() };
        assert_eq!(visible(&records, &opts).len(), 2);
    }

    #[test]
    fn column_groups_by_normalized_priority() {
        let records = parse("Unique_ID,Priority\n1,high\n2,Medium\n3,\n4,HIGH\n");
        let opts = ViewOptions::default();
        assert_eq!(ids(&column(&records, &opts, Priority::High)), vec!["1", "4"]);
        assert_eq!(ids(&column(&records, &opts, Priority::Low)), vec!["3"]);
    }

    #[test]
    fn parses_common_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let shapes = [
            "2024-03-05",
            "3/5/2024",
            "03/05/2024",
            "2024/03/05",
            "Mar 5, 2024",
            "March 5, 2024",
        ];
        for raw in shapes {
            assert_eq!(parse_date(raw).map(|d| d.date()), Some(expected), "{raw}");
        }
        assert_eq!(
            parse_date("3/5/2024 14:30:00").map(|d| d.date()),
            Some(expected)
        );
        assert!(parse_date("2024-03-05T10:00:00Z").is_some());
        assert!(parse_date("soon").is_none());
    }

    #[test]
    fn display_date_is_short_month_day() {
        assert_eq!(display_date("2024-03-05").as_deref(), Some("Mar 5"));
        assert_eq!(display_date(""), None);
    }
}
