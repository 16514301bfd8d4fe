use crate::error::{DashboardError, Result};
use crate::types::{Row, Value};
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Delimiters tried when sniffing, in preference order.
pub const DELIMITER_CANDIDATES: [u8; 4] = [b';', b',', b'\t', b'|'];
const SAMPLE_LINES: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    /// Rows whose field count differs from the header's.
    pub ragged_rows: usize,
}

#[derive(Debug, Clone)]
pub struct ParsedDataset {
    pub delimiter: u8,
    pub headers: Arc<[String]>,
    pub rows: Vec<Row>,
    pub report: LoadReport,
}

/// Read and parse a delimited file from disk.
pub fn load_path(path: impl AsRef<Path>) -> Result<ParsedDataset> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| DashboardError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = parse_rows(&text)?;
    let delimiter = (dataset.delimiter as char).escape_default();
    info!(
        path = %path.display(),
        rows = dataset.report.total_rows,
        delimiter = %delimiter,
        "dataset loaded"
    );
    Ok(dataset)
}

/// Parse delimited text with a header line into typed rows.
///
/// The delimiter is sniffed from the content, blank lines are skipped and
/// every cell goes through scalar inference (see [`infer_value`]).
pub fn parse_rows(text: &str) -> Result<ParsedDataset> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let delimiter = guess_delimiter(text);
    debug!(delimiter = ?(delimiter as char), "delimiter selected");

    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        // The header is pulled manually so blank leading lines can be skipped.
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = rdr.records();
    let headers: Arc<[String]> = loop {
        match records.next() {
            Some(result) => {
                let record = result?;
                if !is_blank(&record) {
                    break record.iter().map(str::to_string).collect::<Vec<_>>().into();
                }
            }
            None => return Err(DashboardError::EmptyInput),
        }
    };

    let mut rows = Vec::new();
    let mut ragged_rows = 0usize;
    for result in records {
        let record = result?;
        if is_blank(&record) {
            continue;
        }
        if record.len() != headers.len() {
            ragged_rows += 1;
        }
        // Extra trailing fields have no name and are dropped.
        let values = record.iter().take(headers.len()).map(infer_value).collect();
        rows.push(Row::new(Arc::clone(&headers), values));
    }

    if ragged_rows > 0 {
        warn!(ragged_rows, "rows with a field count different from the header");
    }
    let report = LoadReport {
        total_rows: rows.len(),
        ragged_rows,
    };
    Ok(ParsedDataset {
        delimiter,
        headers,
        rows,
        report,
    })
}

/// Pick the candidate delimiter that splits the first lines most consistently.
///
/// A candidate must average at least two fields per line. Among those, the one
/// with the smallest line-to-line change in field count wins; ties go to the
/// higher average, then to the earlier candidate. Falls back to `,`.
pub fn guess_delimiter(text: &str) -> u8 {
    let sample = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SAMPLE_LINES)
        .collect::<Vec<_>>()
        .join("\n");

    let mut best: Option<(u8, usize, f64)> = None;
    for &candidate in &DELIMITER_CANDIDATES {
        let mut rdr = ReaderBuilder::new()
            .delimiter(candidate)
            .has_headers(false)
            .flexible(true)
            .from_reader(sample.as_bytes());
        let counts: Vec<usize> = rdr
            .records()
            .filter_map(|r| r.ok())
            .map(|r| r.len())
            .collect();
        if counts.is_empty() {
            continue;
        }
        let avg = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
        if avg < 1.99 {
            continue;
        }
        let delta: usize = counts.windows(2).map(|w| w[0].abs_diff(w[1])).sum();
        let better = match best {
            None => true,
            Some((_, best_delta, best_avg)) => {
                delta < best_delta || (delta == best_delta && avg > best_avg)
            }
        };
        if better {
            best = Some((candidate, delta, avg));
        }
    }
    best.map(|(d, _, _)| d).unwrap_or(b',')
}

/// Infer a scalar from a raw field.
///
/// Only truly empty fields become `Null`; whitespace-only cells stay text.
/// `true`/`false` become booleans and plain numerals become numbers. Numerals with a leading zero (`000123`) are kept
/// as text since they are codes, not quantities.
pub fn infer_value(field: &str) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    let v = field.trim();
    if v.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if v.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    match parse_numeral(v) {
        Some(n) => Value::Number(n),
        None => Value::Text(field.to_string()),
    }
}

fn parse_numeral(v: &str) -> Option<f64> {
    if !v.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    if !v
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'e' | b'E'))
    {
        return None;
    }
    let unsigned = v.strip_prefix('-').unwrap_or(v).as_bytes();
    if unsigned.len() > 1 && unsigned[0] == b'0' && unsigned[1].is_ascii_digit() {
        return None;
    }
    v.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|f| f.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FIELD_ABC, FIELD_AMOUNT, FIELD_STOCK};

    const SEMICOLON_CSV: &str = "\
Material;Descripción;ABC;Importe Vendido;Stock
000123;Tornillo 3/8;A;$ 1.500,00;12,5
000124;Tuerca;B;200,00;3

000125;Arandela;;50;0
";

    #[test]
    fn sniffs_semicolon_even_with_comma_decimals() {
        assert_eq!(guess_delimiter(SEMICOLON_CSV), b';');
    }

    #[test]
    fn sniffs_other_candidates() {
        assert_eq!(guess_delimiter("a,b,c\n1,2,3\n4,5,6\n"), b',');
        assert_eq!(guess_delimiter("a\tb\n1\t2\n"), b'\t');
        assert_eq!(guess_delimiter("a|b|c\n1|2|3\n"), b'|');
        assert_eq!(guess_delimiter("single\nline\n"), b',');
    }

    #[test]
    fn parses_rows_and_skips_blank_lines() {
        let ds = parse_rows(SEMICOLON_CSV).unwrap();
        assert_eq!(ds.headers.len(), 5);
        assert_eq!(ds.rows.len(), 3);
        assert_eq!(ds.report.total_rows, 3);
        assert_eq!(ds.report.ragged_rows, 0);

        let first = &ds.rows[0];
        assert_eq!(first.get("Material"), Some(&Value::from("000123")));
        assert_eq!(first.get(FIELD_ABC), Some(&Value::from("A")));
        assert_eq!(first.get(FIELD_AMOUNT), Some(&Value::from("$ 1.500,00")));
        assert_eq!(first.get(FIELD_STOCK), Some(&Value::from("12,5")));
        assert_eq!(ds.rows[1].get(FIELD_STOCK), Some(&Value::Number(3.0)));
        assert_eq!(ds.rows[2].get(FIELD_ABC), Some(&Value::Null));
        assert_eq!(ds.rows[2].get(FIELD_AMOUNT), Some(&Value::Number(50.0)));
    }

    #[test]
    fn keeps_input_order() {
        let ds = parse_rows("id,v\n3,a\n1,b\n2,c\n").unwrap();
        let ids: Vec<_> = ds.rows.iter().map(|r| r.get("id").cloned()).collect();
        assert_eq!(
            ids,
            vec![
                Some(Value::Number(3.0)),
                Some(Value::Number(1.0)),
                Some(Value::Number(2.0))
            ]
        );
    }

    #[test]
    fn counts_ragged_rows() {
        let ds = parse_rows("a,b,c\n1,2\n1,2,3,4\n").unwrap();
        assert_eq!(ds.rows.len(), 2);
        assert_eq!(ds.report.ragged_rows, 2);
        assert!(ds.rows[0].get("c").is_none());
        assert_eq!(ds.rows[1].get("c"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn strips_bom() {
        let ds = parse_rows("\u{feff}ABC,Stock\nA,1\n").unwrap();
        assert_eq!(ds.headers[0], "ABC");
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(parse_rows(""), Err(DashboardError::EmptyInput)));
        assert!(matches!(parse_rows("\n\n  \n"), Err(DashboardError::EmptyInput)));
    }

    #[test]
    fn header_only_yields_no_rows() {
        let ds = parse_rows("ABC,Stock\n").unwrap();
        assert!(ds.rows.is_empty());
    }

    #[test]
    fn infers_scalars() {
        assert_eq!(infer_value(""), Value::Null);
        assert_eq!(infer_value("  "), Value::from("  "));
        assert_eq!(infer_value(" 42 "), Value::Number(42.0));
        assert_eq!(infer_value("TRUE"), Value::Bool(true));
        assert_eq!(infer_value("false"), Value::Bool(false));
        assert_eq!(infer_value("42"), Value::Number(42.0));
        assert_eq!(infer_value("-3.5"), Value::Number(-3.5));
        assert_eq!(infer_value(".5"), Value::Number(0.5));
        assert_eq!(infer_value("1e3"), Value::Number(1000.0));
        assert_eq!(infer_value("0"), Value::Number(0.0));
        assert_eq!(infer_value("0.25"), Value::Number(0.25));
        assert_eq!(infer_value("007"), Value::from("007"));
        assert_eq!(infer_value("12,5"), Value::from("12,5"));
        assert_eq!(infer_value("inf"), Value::from("inf"));
        assert_eq!(infer_value("1-2"), Value::from("1-2"));
        assert_eq!(infer_value("-"), Value::from("-"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_path("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, DashboardError::Read { .. }));
    }
}
