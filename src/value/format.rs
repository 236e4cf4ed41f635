//! DB2 literal rendering

use super::Literal;
use std::fmt::Write;

/// Render a literal in DB2 syntax
///
/// - Text and temporal values are single-quoted with embedded quotes doubled
/// - Booleans become `1` / `0`
/// - UUIDs are quoted in their hyphenated form
/// - Byte sequences become `BLOB(X'..')` with lowercase hex
/// - Durations become a floating-point count of seconds (`90.0`)
/// - NaN and infinite floats have no DB2 literal and become `NULL`
/// - Everything else uses its default textual form
///
/// # Example
///
/// ```
/// use lifeguard_db2::value::{format_literal, Literal};
///
/// assert_eq!(format_literal(&Literal::text("O'Brien")), "'O''Brien'");
/// assert_eq!(format_literal(&Literal::Bool(true)), "1");
/// ```
pub fn format_literal(value: &Literal) -> String {
    match value {
        Literal::Null => "NULL".to_string(),
        Literal::Text(s) => quote_text(s),
        Literal::Date(d) => quote_text(&d.to_string()),
        Literal::Time(t) => quote_text(&t.to_string()),
        Literal::DateTime(dt) => quote_text(&dt.to_string()),
        Literal::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        Literal::Uuid(u) => format!("'{}'", u),
        Literal::Bytes(bytes) => {
            let mut hex = String::with_capacity(bytes.len() * 2);
            for byte in bytes {
                let _ = write!(hex, "{:02x}", byte);
            }
            format!("BLOB(X'{}')", hex)
        }
        Literal::Duration(d) => {
            let seconds = d.num_seconds() as f64 + f64::from(d.subsec_nanos()) / 1_000_000_000.0;
            float_text(seconds)
        }
        Literal::Integer(i) => i.to_string(),
        Literal::Float(f) => float_text(*f),
        Literal::Decimal(d) => d.to_string(),
    }
}

fn quote_text(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

// `Debug` keeps a fractional part on integral floats (`90.0`, not `90`).
fn float_text(value: f64) -> String {
    if value.is_finite() {
        format!("{:?}", value)
    } else {
        "NULL".to_string()
    }
}
