//! ARFF serialization of feature tables.
//!
//! Layout:
//!
//! ```text
//! % Malimg Malware Classification
//! @RELATION malimg
//!
//! @ATTRIBUTE edge_density REAL
//! ...
//! @ATTRIBUTE class {Adialer.C, Agent.FYI}
//!
//! @DATA
//! 0.0123,...,Adialer.C
//! ```

use crate::core::error::OutputResult;
use crate::dataset::table::{FeatureTable, LABEL_COLUMN};
use crate::output::csv::format_float;
use std::io::{self, Write};
use std::path::Path;

/// Header text of an ARFF file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArffHeader {
    /// `@RELATION` name.
    pub relation: String,
    /// Leading comment; each line becomes a `%` line.
    pub description: String,
}

impl Default for ArffHeader {
    fn default() -> Self {
        Self {
            relation: "malimg".to_string(),
            description: "Malimg Malware Classification".to_string(),
        }
    }
}

/// Characters that force a name (relation or attribute) into double quotes.
const NAME_SPECIAL: [char; 5] = [' ', '%', '{', '}', ','];

fn encode_name(name: &str) -> String {
    if name.contains(NAME_SPECIAL) {
        format!("\"{}\"", name)
    } else {
        name.to_string()
    }
}

/// Encode a nominal or string value, single-quoting it when needed.
fn encode_value(value: &str) -> String {
    let needs_quotes = value.chars().any(|c| {
        matches!(c, '"' | '\'' | '\\' | '%' | ',') || c.is_whitespace() || (c as u32) < 32
    });
    if !needs_quotes {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '%' => out.push_str("\\%"),
            c if (c as u32) < 32 => out.push_str(&format!("\\{:03o}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Write `table` as ARFF. Features are `REAL`; the class attribute
/// enumerates every class of the table, including ones with no rows.
pub fn write_table<W: Write>(
    table: &FeatureTable,
    header: &ArffHeader,
    writer: &mut W,
) -> io::Result<()> {
    for line in header.description.lines() {
        writeln!(writer, "% {}", line)?;
    }
    writeln!(writer, "@RELATION {}", encode_name(&header.relation))?;
    writeln!(writer)?;

    for column in table.columns() {
        writeln!(writer, "@ATTRIBUTE {} REAL", encode_name(column))?;
    }
    let classes: Vec<String> = table.classes().iter().map(|c| encode_value(c)).collect();
    writeln!(writer, "@ATTRIBUTE {} {{{}}}", LABEL_COLUMN, classes.join(", "))?;
    writeln!(writer)?;

    writeln!(writer, "@DATA")?;
    for row in table.rows() {
        let mut fields: Vec<String> = row
            .values
            .iter()
            .map(|&v| if v.is_nan() { "?".to_string() } else { format_float(v) })
            .collect();
        fields.push(encode_value(&row.class));
        writeln!(writer, "{}", fields.join(","))?;
    }
    Ok(())
}

/// Render `table` as an ARFF string.
pub fn to_string(table: &FeatureTable, header: &ArffHeader) -> String {
    let mut buf = Vec::new();
    // writing into a Vec cannot fail
    let _ = write_table(table, header, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Write `table` to an ARFF file.
pub fn save(table: &FeatureTable, header: &ArffHeader, path: &Path) -> OutputResult<()> {
    super::write_file(path, |w| write_table(table, header, w))
}
