use std::str::FromStr;

use rust_decimal::Decimal;

/// Format a decimal as a Brazilian real amount with thousands separators: R$ 1.234,56
pub fn money(val: Decimal) -> String {
    let negative = val < Decimal::ZERO;
    let cents = format!("{:.2}", val.abs().round_dp(2));
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_dots = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_dots.push('.');
        }
        with_dots.push(c);
    }
    let with_dots: String = with_dots.chars().rev().collect();

    if negative {
        format!("-R$ {with_dots},{dec_part}")
    } else {
        format!("R$ {with_dots},{dec_part}")
    }
}

/// Parse a monetary amount into an exact decimal.
///
/// Accepts a leading currency symbol (`R$`, `$`), parenthesized negatives and
/// either `,` or `.` as the decimal separator. When both appear, the right-most
/// one is the decimal separator and the other is a thousands separator.
/// Returns `None` for anything that is not a number.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let s: String = raw.trim().replace('"', "").split_whitespace().collect();
    let (negative, s) = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (true, inner.to_string()),
        None => (false, s.clone()),
    };
    let (sign, body) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.strip_prefix('+').unwrap_or(&s)),
    };
    let body = body
        .strip_prefix("R$")
        .or_else(|| body.strip_prefix('$'))
        .unwrap_or(body);
    if body.is_empty() {
        return None;
    }

    let normalized = match (body.rfind(','), body.rfind('.')) {
        (Some(c), Some(d)) if c > d => body.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => body.replace(',', ""),
        (Some(_), None) if body.matches(',').count() == 1 => body.replace(',', "."),
        (Some(_), None) => body.replace(',', ""),
        (None, Some(_)) if body.matches('.').count() > 1 => body.replace('.', ""),
        _ => body.to_string(),
    };
    if !normalized.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }

    let value = Decimal::from_str(&format!("{sign}{normalized}")).ok()?;
    Some(if negative { -value.abs() } else { value })
}
