//! Wiki table markup: header line, row lines and per-cell formatting.

use crate::types::{Cell, Row};

/// Format the header line, e.g. `|| A || B ||`
///
/// With no headers this yields `|| ||`.
pub fn format_header_line(headers: &[String]) -> String {
    if headers.is_empty() {
        return "|| ||".to_string();
    }
    format!("|| {} ||", headers.join(" || "))
}

/// Format a data row. Values follow the row's own column order, not the headers.
pub fn format_row_line(row: &Row) -> String {
    let mut line = String::from("| ");
    for value in row.values() {
        line.push_str(&format_cell(value));
        line.push_str(" |");
    }
    line
}

/// Render one cell as markup text
pub fn format_cell(cell: &Cell) -> String {
    match cell {
        Cell::Null => String::new(),
        Cell::Text(s) => s.clone(),
        Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        Cell::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        Cell::Integer(i) => i.to_string(),
        Cell::Decimal(d) => format_float(round_places(*d, 3)),
        Cell::Float(f) => format_float(*f),
        Cell::Other(s) => s.clone(),
    }
}

/// Round half away from zero to `places` fractional digits.
///
/// `value * factor` can land just below a tie (0.5005 * 1000 is
/// 500.4999...), so a value whose half-way point divides back to at most
/// itself is bumped away from zero.
pub fn round_places(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(places);
    let mut scaled = (value * factor).round();
    if value > 0.0 && (scaled + 0.5) / factor <= value {
        scaled += 1.0;
    } else if value < 0.0 && (scaled - 0.5) / factor >= value {
        scaled -= 1.0;
    }
    let rounded = scaled / factor;
    if rounded.is_finite() { rounded } else { value }
}

/// Shortest round-trip float text with a fractional part (`5` -> `5.0`).
///
/// Values whose decimal exponent falls outside -4..16 switch to
/// exponent form with a signed two-digit exponent (`1.0e+16`, `1.0e-05`).
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() };
    }

    // LowerExp yields the shortest digits, e.g. "-1.2345e-5"
    let sci = format!("{:e}", value);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let point = exponent + 1;

    let body = if point > 0 && point <= 16 {
        let point = point as usize;
        if digits.len() > point {
            format!("{}.{}", &digits[..point], &digits[point..])
        } else {
            format!("{}{}.0", digits, "0".repeat(point - digits.len()))
        }
    } else if point <= 0 && point > -4 {
        format!("0.{}{}", "0".repeat(point.unsigned_abs() as usize), digits)
    } else {
        let fraction = if digits.len() > 1 { &digits[1..] } else { "0" };
        format!("{}.{}e{}{:02}", &digits[..1], fraction, if exponent < 0 { '-' } else { '+' }, exponent.unsigned_abs())
    };

    format!("{}{}", sign, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_header_line() {
        assert_eq!(format_header_line(&["A".to_string(), "B".to_string()]), "|| A || B ||");
    }

    #[test]
    fn test_header_line_without_headers() {
        assert_eq!(format_header_line(&[]), "|| ||");
    }

    #[test]
    fn test_decimal_rounds_to_three_places() {
        assert_eq!(format_cell(&Cell::Decimal(3.14159)), "3.142");
        assert_eq!(format_cell(&Cell::Decimal(1.0006)), "1.001");
        assert_eq!(format_cell(&Cell::Decimal(5.0)), "5.0");
        assert_eq!(format_cell(&Cell::Decimal(-1.23456)), "-1.235");
    }

    #[test]
    fn test_decimal_ties_round_away_from_zero() {
        // Each of these scales to just under .5 in binary
        assert_eq!(format_cell(&Cell::Decimal(0.5005)), "0.501");
        assert_eq!(format_cell(&Cell::Decimal(0.5015)), "0.502");
        assert_eq!(format_cell(&Cell::Decimal(0.5025)), "0.503");
        assert_eq!(format_cell(&Cell::Decimal(-0.5005)), "-0.501");
        assert_eq!(round_places(2.5, 0), 3.0);
        assert_eq!(round_places(-2.5, 0), -3.0);
        assert_eq!(round_places(0.5004, 3), 0.5);
    }

    #[test]
    fn test_float_text_forms() {
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(12345.678), "12345.678");
        assert_eq!(format_float(-42.0), "-42.0");
        assert_eq!(format_float(1e15), "1000000000000000.0");
        assert_eq!(format_float(1e16), "1.0e+16");
        assert_eq!(format_float(1.5e20), "1.5e+20");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(0.00001), "1.0e-05");
        assert_eq!(format_float(-1.25e-7), "-1.25e-07");
        assert_eq!(format_float(f64::INFINITY), "Infinity");
    }

    #[test]
    fn test_float_is_not_rounded() {
        assert_eq!(format_cell(&Cell::Float(3.14159)), "3.14159");
        assert_eq!(format_cell(&Cell::Float(f64::NAN)), "NaN");
    }

    #[test]
    fn test_scalar_cells() {
        assert_eq!(format_cell(&Cell::Text("hello".into())), "hello");
        assert_eq!(format_cell(&Cell::Integer(-42)), "-42");
        assert_eq!(format_cell(&Cell::Null), "");
        assert_eq!(format_cell(&Cell::Other("blob".into())), "blob");

        let date = NaiveDate::from_ymd_opt(2012, 3, 7).unwrap();
        assert_eq!(format_cell(&Cell::Date(date)), "2012-03-07");
        let ts = date.and_hms_opt(9, 5, 0).unwrap();
        assert_eq!(format_cell(&Cell::Timestamp(ts)), "2012-03-07 09:05:00");
    }

    #[test]
    fn test_row_line() {
        let row = Row::new().with("name", Cell::Text("foo".into())).with("count", Cell::Integer(3));
        assert_eq!(format_row_line(&row), "| foo |3 |");
    }

    #[test]
    fn test_empty_row_line() {
        assert_eq!(format_row_line(&Row::new()), "| ");
    }
}
