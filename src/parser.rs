//! Comma-separated text to [`Record`]s.
//!
//! A single forward scan. Fields may be wrapped in double quotes, `""` inside
//! a quoted field is a literal quote, and CR, LF or CRLF end a row unless they
//! sit inside quotes. Nothing here fails: short rows are padded with empty
//! values, long rows lose their extra cells and an unterminated quote is
//! closed by the end of the input.

use crate::task::Record;

/// Parses `text`, using its first row as the header row.
pub fn parse(text: &str) -> Vec<Record> {
    records_from_rows(split_rows(text))
}

/// Splits `text` into rows of trimmed fields. Blank lines are skipped.
fn split_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                cell.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                row.push(cell.trim().to_string());
                cell.clear();
            }
            '\r' | '\n' if !in_quotes => {
                // CRLF closes the row on CR; the LF then sees an empty row.
                if !cell.is_empty() || !row.is_empty() {
                    row.push(cell.trim().to_string());
                    rows.push(std::mem::take(&mut row));
                    cell.clear();
                }
            }
            _ => cell.push(ch),
        }
    }
    if !cell.is_empty() || !row.is_empty() {
        row.push(cell.trim().to_string());
        rows.push(row);
    }
    rows
}

/// Maps every row after the first onto the first row's field names.
fn records_from_rows(rows: Vec<Vec<String>>) -> Vec<Record> {
    let mut rows = rows.into_iter();
    let Some(headers) = rows.next() else {
        return Vec::new();
    };

    rows.map(|row| {
        let mut record = Record::new();
        for (idx, header) in headers.iter().enumerate() {
            let value = row.get(idx).map(String::as_str).unwrap_or("");
            record.insert(header.as_str(), strip_redundant_quotes(value));
        }
        record
    })
    .collect()
}

fn strip_redundant_quotes(value: &str) -> &str {
    let value = value.trim();
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_one_record_per_data_row() {
        let records = parse("ID,Task,Status\n1,a,Pending\n2,b,Complete\n3,c,Pending\n");
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.len() == 3));
        assert_eq!(records[2].get("Task"), Some("c"));
    }

    #[test]
    fn quoted_comma_and_trailing_empty_cell() {
        let records = parse("ID,Task,Notes\n1,\"Fix, bug\",");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("ID"), Some("1"));
        assert_eq!(records[0].get("Task"), Some("Fix, bug"));
        assert_eq!(records[0].get("Notes"), Some(""));
    }

    #[test]
    fn escaped_quotes_collapse() {
        let records = parse("ID,Task\n1,\"He said \"\"hi\"\"\"");
        assert_eq!(records[0].get("Task"), Some("He said \"hi\""));
    }

    #[test]
    fn quoted_line_break_stays_in_field() {
        let records = parse("ID,Notes\r\n1,\"first\r\nsecond\"\r\n2,plain\r\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Notes"), Some("first\r\nsecond"));
        assert_eq!(records[1].get("ID"), Some("2"));
    }

    #[test]
    fn empty_and_header_only_inputs() {
        assert!(parse("").is_empty());
        assert!(parse("ID,Task\n").is_empty());
        assert!(parse("ID,Task").is_empty());
    }

    #[test]
    fn short_rows_pad_and_long_rows_truncate() {
        let records = parse("A,B,C\n1\n1,2,3,4,5\n");
        assert_eq!(records[0].get("A"), Some("1"));
        assert_eq!(records[0].get("B"), Some(""));
        assert_eq!(records[0].get("C"), Some(""));
        assert_eq!(records[1].len(), 3);
        assert_eq!(records[1].get("C"), Some("3"));
    }

    #[test]
    fn unterminated_quote_runs_to_end_of_input() {
        let records = parse("ID,Task\n1,\"never closed, at all\n2,x");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("Task"), Some("never closed, at all\n2,x"));
    }

    #[test]
    fn carriage_returns_and_blank_lines() {
        let rows = split_rows("a,b\r\rc,d\n\n\ne,f");
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"], vec!["e", "f"]]);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let records = parse(" ID , Task \n  7 ,  \"  spaced  \"  \n");
        assert_eq!(records[0].get("ID"), Some("7"));
        assert_eq!(records[0].get("Task"), Some("spaced"));
    }

    #[test]
    fn redundant_quote_pair_is_stripped() {
        let records = parse("ID,Task\n1,\"\"\"quoted\"\"\"\n");
        assert_eq!(records[0].get("Task"), Some("quoted"));
    }

    #[test]
    fn numeric_ids_stay_strings() {
        let records = parse("Unique_ID\n007\n");
        assert_eq!(records[0].id(), "007");
    }

    #[test]
    fn duplicate_headers_last_wins() {
        let records = parse("ID,Name,ID\n1,x,2\n");
        assert_eq!(records[0].len(), 2);
        assert_eq!(records[0].get("ID"), Some("2"));
    }
}
