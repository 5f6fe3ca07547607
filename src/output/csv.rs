//! CSV serialization of feature tables.

use crate::dataset::table::FeatureTable;
use crate::core::error::OutputResult;
use std::io::{self, Write};
use std::path::Path;

/// Format a float in shortest round-trip notation.
///
/// Shortest round-trip digits; plain notation for exponents in `-4..16`,
/// otherwise scientific with a signed, at least two-digit exponent
/// (`1e-05`, `1.5e+16`). Integral values keep a `.0` suffix.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. "-1.2345e-5"
    let sci = format!("{:e}", value);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };

    if (-4..16).contains(&exp) {
        let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
        let body = if exp >= 0 {
            let int_len = exp as usize + 1;
            if digits.len() > int_len {
                format!("{}.{}", &digits[..int_len], &digits[int_len..])
            } else {
                format!("{}{}.0", digits, "0".repeat(int_len - digits.len()))
            }
        } else {
            format!("0.{}{}", "0".repeat((-exp - 1) as usize), digits)
        };
        format!("{}{}", sign, body)
    } else {
        let exp_sign = if exp < 0 { '-' } else { '+' };
        format!("{}{}e{}{:02}", sign, mantissa, exp_sign, exp.abs())
    }
}

/// Quote a field if it holds a comma, a quote or a line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Write `table` as CSV: header line, then one line per row with the class
/// last. NaN cells are left empty.
pub fn write_table<W: Write>(table: &FeatureTable, writer: &mut W) -> io::Result<()> {
    let header: Vec<String> = table.header().iter().map(|h| escape_field(h)).collect();
    writeln!(writer, "{}", header.join(","))?;

    for row in table.rows() {
        let mut fields: Vec<String> = row
            .values
            .iter()
            .map(|&v| if v.is_nan() { String::new() } else { format_float(v) })
            .collect();
        fields.push(escape_field(&row.class));
        writeln!(writer, "{}", fields.join(","))?;
    }
    Ok(())
}

/// Render `table` as a CSV string.
pub fn to_string(table: &FeatureTable) -> String {
    let mut buf = Vec::new();
    // writing into a Vec cannot fail
    let _ = write_table(table, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Write `table` to a CSV file.
pub fn save(table: &FeatureTable, path: &Path) -> OutputResult<()> {
    super::write_file(path, |w| write_table(table, w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::table::FeatureRecord;

    #[test]
    fn test_format_float_shortest_repr() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(-2.5), "-2.5");
        assert_eq!(format_float(1e-5), "1e-05");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(123456.0), "123456.0");
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(1.5e16), "1.5e+16");
        assert_eq!(format_float(1e15), "1000000000000000.0");
        assert_eq!(format_float(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_float(-3.25e-7), "-3.25e-07");
        assert_eq!(format_float(1e100), "1e+100");
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(-0.0), "-0.0");
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_write_table() {
        let table = FeatureTable::from_records(
            vec![
                FeatureRecord::new("Adialer.C", [("b".to_string(), 0.5), ("a".to_string(), 2.0)].into_iter().collect()),
                FeatureRecord::new("Agent,X", [("a".to_string(), 1e-5)].into_iter().collect()),
            ],
            vec!["Adialer.C".into(), "Agent,X".into()],
        );

        assert_eq!(
            to_string(&table),
            "a,b,class\n2.0,0.5,Adialer.C\n1e-05,,\"Agent,X\"\n"
        );
    }
}
