//! # Delimited-Text Codec
//!
//! The `wifi-library` delimited format: two fixed header lines, then one
//! line per record with every field double-quoted, `;`-separated, and a
//! trailing `;` before the line break.
//!
//! The header pair is an exact-match file-format contract: it confirms the
//! uploaded file carries the expected schema variant, so both lines are
//! compared byte-for-byte before any row is even tokenized. Row parsing
//! assumes the canonical field order blindly and is only reached once every
//! line has passed structural validation.

use crate::codec::Codec;
use crate::error::FormatError;
use crate::record::{Record, WIRE_NAMES};
use std::fmt::Write as _;

/// First header line: the English field-name row (exact literal).
pub const CSV_HEADER_FIELDS: &str = "\"ID\";\"LibraryName\";\"AdmArea\";\"District\";\"Address\";\"NumberOfAccessPoints\";\"WiFiName\";\"CoverageArea\";\"FunctionFlag\";\"AccessFlag\";\"Password\";\"Latitude_WGS84\";\"Longitude_WGS84\";\"global_id\";\"geodata_center\";\"geoarea\";";

/// Second header line: the localized label row (exact literal).
pub const CSV_HEADER_LABELS: &str = "\"Код\";\"Наименование библиотеки\";\"Административный округ\";\"Район\";\"Адрес\";\"Количество точек доступа\";\"Имя Wi-Fi сети\";\"Зона покрытия, в метрах\";\"Признак функционирования\";\"Условия доступа\";\"Пароль\";\"Широта в WGS-84\";\"Долгота в WGS-84\";\"global_id\";\"geodata_center\";\"geoarea\";";

/// Token positions that must hold numbers (or be empty) in a data row.
const NUMERIC_POSITIONS: [usize; 6] = [0, 5, 7, 11, 12, 13];

/// Data rows start on line 3; lines are numbered from 1 in diagnostics.
const FIRST_DATA_LINE: usize = 3;

// =============================================================================
// CODEC
// =============================================================================

/// The delimited-text implementation of [`Codec`].
pub struct CsvCodec;

impl Codec for CsvCodec {
    fn encode(&self, records: &[Record]) -> Result<Vec<u8>, FormatError> {
        let mut out = String::new();
        out.push_str(CSV_HEADER_FIELDS);
        out.push('\n');
        out.push_str(CSV_HEADER_LABELS);
        out.push('\n');
        for record in records {
            push_row(&mut out, record);
            out.push('\n');
        }
        Ok(out.into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<Record>, FormatError> {
        // Tolerate invalid UTF-8 the way a lenient text reader would; the
        // header comparison below still rejects anything that is not the
        // expected schema variant.
        let text = String::from_utf8_lossy(bytes);
        let lines: Vec<&str> = text.lines().collect();

        validate_structure(&lines)?;
        build_records(&lines[2..])
    }
}

/// Append one record as a delimited row (no line break).
///
/// Floats render with the invariant decimal point; integer-valued floats
/// render without a fractional part, matching the upstream file corpus.
fn push_row(out: &mut String, r: &Record) {
    let _ = write!(
        out,
        "\"{}\";\"{}\";\"{}\";\"{}\";\"{}\";\"{}\";\"{}\";\"{}\";\"{}\";\"{}\";\"{}\";\"{}\";\"{}\";\"{}\";\"{}\";\"{}\";",
        r.id(),
        r.library_name(),
        r.adm_area(),
        r.district(),
        r.address(),
        r.number_of_access_points(),
        r.wifi_name(),
        r.coverage_area(),
        r.function_flag(),
        r.access_flag(),
        r.password(),
        r.latitude(),
        r.longitude(),
        r.global_id(),
        r.geodata_center(),
        r.geoarea(),
    );
}

// =============================================================================
// STRUCTURAL VALIDATION (runs before any record is built)
// =============================================================================

fn validate_structure(lines: &[&str]) -> Result<(), FormatError> {
    if lines.is_empty() {
        return Err(FormatError::Empty);
    }
    if lines.first().copied() != Some(CSV_HEADER_FIELDS) {
        return Err(FormatError::HeaderMismatch(1));
    }
    if lines.get(1).copied() != Some(CSV_HEADER_LABELS) {
        return Err(FormatError::HeaderMismatch(2));
    }

    for (offset, line) in lines[2..].iter().enumerate() {
        let line_no = FIRST_DATA_LINE + offset;
        let tokens = split_row(line);
        if tokens.len() != WIRE_NAMES.len() {
            return Err(FormatError::FieldCount {
                line: line_no,
                found: tokens.len(),
            });
        }
        for idx in NUMERIC_POSITIONS {
            let value = &tokens[idx];
            if !value.is_empty() && value.parse::<f64>().is_err() {
                return Err(FormatError::NumericField {
                    line: line_no,
                    field: WIRE_NAMES[idx],
                    value: value.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Split a data row into unquoted tokens.
///
/// Empty tokens are dropped, so the trailing `;` contributes nothing and an
/// unquoted empty field shifts the count (and fails the 16-token check).
fn split_row(line: &str) -> Vec<String> {
    line.split(';')
        .filter(|token| !token.is_empty())
        .map(|token| token.replace('"', ""))
        .collect()
}

// =============================================================================
// RECORD CONSTRUCTION
// =============================================================================

fn build_records(rows: &[&str]) -> Result<Vec<Record>, FormatError> {
    let mut records = Vec::with_capacity(rows.len());
    for (offset, line) in rows.iter().enumerate() {
        let line_no = FIRST_DATA_LINE + offset;
        let t = split_row(line);
        let record = Record::new(
            parse_int(&t[0], line_no, WIRE_NAMES[0])?,
            t[1].clone(),
            t[2].clone(),
            t[3].clone(),
            t[4].clone(),
            parse_int(&t[5], line_no, WIRE_NAMES[5])?,
            t[6].clone(),
            parse_float(&t[7], line_no, WIRE_NAMES[7])?,
            t[8].clone(),
            t[9].clone(),
            t[10].clone(),
            parse_float(&t[11], line_no, WIRE_NAMES[11])?,
            parse_float(&t[12], line_no, WIRE_NAMES[12])?,
            parse_float(&t[13], line_no, WIRE_NAMES[13])?,
            t[14].clone(),
            t[15].clone(),
        )?;
        records.push(record);
    }
    Ok(records)
}

/// Integer positions accept integers only; the structural pass has already
/// admitted any float-shaped token, so `"1.5"` in an integer position fails
/// here, as a format error rather than a validation error.
fn parse_int(token: &str, line: usize, field: &'static str) -> Result<i64, FormatError> {
    token.parse::<i64>().map_err(|_| FormatError::NumericField {
        line,
        field,
        value: token.to_string(),
    })
}

fn parse_float(token: &str, line: usize, field: &'static str) -> Result<f64, FormatError> {
    token.parse::<f64>().map_err(|_| FormatError::NumericField {
        line,
        field,
        value: token.to_string(),
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn sample(id: i64, name: &str, coverage: f64) -> Record {
        Record::new(
            id,
            name.to_string(),
            "ЦАО".to_string(),
            "Арбат".to_string(),
            "ул. Воздвиженка, 3/5".to_string(),
            2,
            "RGB_WiFi".to_string(),
            coverage,
            "действует".to_string(),
            "открытая сеть".to_string(),
            String::new(),
            55.751_93,
            37.609_51,
            281_129.0,
            String::new(),
            String::new(),
        )
        .expect("sample record is valid")
    }

    fn encode(records: &[Record]) -> String {
        let bytes = CsvCodec.encode(records).expect("encode never fails");
        String::from_utf8(bytes).expect("csv output is utf-8")
    }

    #[test]
    fn encode_starts_with_both_header_lines() {
        let text = encode(&[]);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER_FIELDS));
        assert_eq!(lines.next(), Some(CSV_HEADER_LABELS));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn row_is_quoted_and_ends_with_separator() {
        let text = encode(&[sample(7, "РГБ", 15.5)]);
        let row = text.lines().nth(2).expect("one data row");
        assert!(row.starts_with("\"7\";\"РГБ\";"));
        assert!(row.ends_with(';'));
        assert!(row.contains("\"15.5\""));
    }

    #[test]
    fn roundtrip_preserves_every_field() {
        let records = vec![sample(1, "Библиотека №1", 30.0), sample(2, "Une Deux", 0.25)];
        let decoded = CsvCodec
            .decode(&CsvCodec.encode(&records).expect("encode"))
            .expect("decode");
        assert_eq!(decoded, records);
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = CsvCodec.decode(b"").expect_err("must fail");
        assert!(matches!(err, FormatError::Empty));
    }

    #[test]
    fn header_must_match_byte_for_byte() {
        // A translated or reordered header is a different schema variant.
        let text = format!("{}\n{}\n", CSV_HEADER_FIELDS.to_lowercase(), CSV_HEADER_LABELS);
        let err = CsvCodec.decode(text.as_bytes()).expect_err("must fail");
        assert!(matches!(err, FormatError::HeaderMismatch(1)));

        let text = format!("{CSV_HEADER_FIELDS}\n{CSV_HEADER_FIELDS}\n");
        let err = CsvCodec.decode(text.as_bytes()).expect_err("must fail");
        assert!(matches!(err, FormatError::HeaderMismatch(2)));
    }

    #[test]
    fn missing_label_line_is_a_header_mismatch() {
        let err = CsvCodec
            .decode(format!("{CSV_HEADER_FIELDS}\n").as_bytes())
            .expect_err("must fail");
        assert!(matches!(err, FormatError::HeaderMismatch(2)));
    }

    #[test]
    fn off_by_one_token_counts_are_rejected() {
        let base = encode(&[sample(1, "X", 1.0)]);
        let row = base.lines().nth(2).expect("row");

        let fifteen = row.replacen(";\"Арбат\"", "", 1);
        let text = format!("{CSV_HEADER_FIELDS}\n{CSV_HEADER_LABELS}\n{fifteen}\n");
        let err = CsvCodec.decode(text.as_bytes()).expect_err("must fail");
        assert!(matches!(
            err,
            FormatError::FieldCount { line: 3, found: 15 }
        ));

        let seventeen = format!("{row}\"extra\";");
        let text = format!("{CSV_HEADER_FIELDS}\n{CSV_HEADER_LABELS}\n{seventeen}\n");
        let err = CsvCodec.decode(text.as_bytes()).expect_err("must fail");
        assert!(matches!(
            err,
            FormatError::FieldCount { line: 3, found: 17 }
        ));
    }

    #[test]
    fn non_numeric_token_in_numeric_position_is_rejected() {
        let bad = encode(&[sample(1, "X", 1.0)]).replace("\"1\";\"X\"", "\"one\";\"X\"");
        let err = CsvCodec.decode(bad.as_bytes()).expect_err("must fail");
        assert!(matches!(
            err,
            FormatError::NumericField {
                line: 3,
                field: "ID",
                ..
            }
        ));
    }

    #[test]
    fn structural_pass_runs_before_construction() {
        // Line 3 is fine, line 4 is structurally broken: nothing decodes.
        let good = encode(&[sample(1, "A", 1.0)]);
        let row = good.lines().nth(2).expect("row");
        let text = format!("{CSV_HEADER_FIELDS}\n{CSV_HEADER_LABELS}\n{row}\ngarbage\n");
        let err = CsvCodec.decode(text.as_bytes()).expect_err("must fail");
        assert!(matches!(err, FormatError::FieldCount { line: 4, .. }));
    }

    #[test]
    fn fractional_token_in_integer_position_fails_construction() {
        // "1.5" passes the float-shaped structural check but is not an id.
        let text = encode(&[sample(1, "X", 1.0)]).replacen("\"1\"", "\"1.5\"", 1);
        let err = CsvCodec.decode(text.as_bytes()).expect_err("must fail");
        assert!(matches!(
            err,
            FormatError::NumericField {
                line: 3,
                field: "ID",
                ..
            }
        ));
    }

    #[test]
    fn constraint_violation_aborts_the_whole_decode() {
        let text = encode(&[sample(1, "A", 1.0)]).replacen("\"55.75193\"", "\"95\"", 1);
        let err = CsvCodec.decode(text.as_bytes()).expect_err("must fail");
        assert!(matches!(
            err,
            FormatError::Invalid(ValidationError::OutOfRange {
                field: "Latitude_WGS84",
                ..
            })
        ));
    }

    #[test]
    fn carriage_returns_are_tolerated() {
        let unix = encode(&[sample(3, "CRLF", 9.0)]);
        let dos = unix.replace('\n', "\r\n");
        let decoded = CsvCodec.decode(dos.as_bytes()).expect("decode");
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].library_name(), "CRLF");
    }
}
