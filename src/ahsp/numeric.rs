/// Converts spreadsheet number text into an `f64`, returning `0.0` for
/// anything that does not read as a number.
///
/// Separator rules:
/// - `,` and `.` together: `.` groups thousands, `,` is the decimal mark
///   (`1.000,00`). A single trailing `.` after commas reads English-style.
/// - `,` alone: decimal mark when it appears once, grouping otherwise.
/// - `.` alone: grouping when every group after the first has exactly three
///   digits and the first group is 1-3 digits without a leading zero
///   (`15.000`, `1.250.000`); otherwise a single `.` is a decimal mark
///   (`0.750`, `2.5`, `1.0250`).
pub fn normalize_number(raw: &str) -> f64 {
    let Some(compact) = strip_currency_and_spaces(raw) else {
        return 0.0;
    };

    let (negative, digits) = match compact.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, compact.as_str()),
    };

    if digits.is_empty()
        || !digits.chars().any(|ch| ch.is_ascii_digit())
        || !digits
            .chars()
            .all(|ch| ch.is_ascii_digit() || ch == '.' || ch == ',')
    {
        return 0.0;
    }

    let Some(canonical) = canonicalize_separators(digits) else {
        return 0.0;
    };

    match canonical.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            if negative {
                -value
            } else {
                value
            }
        }
        _ => 0.0,
    }
}

/// True when the cell reads as a number on its own, e.g. `0,750` or
/// `Rp 12.500`. Codes such as `L.01` are not numeric.
pub fn is_numeric_text(raw: &str) -> bool {
    let Some(compact) = strip_currency_and_spaces(raw) else {
        return false;
    };
    let digits = compact.strip_prefix('-').unwrap_or(&compact);

    !digits.is_empty()
        && digits.chars().any(|ch| ch.is_ascii_digit())
        && digits
            .chars()
            .all(|ch| ch.is_ascii_digit() || ch == '.' || ch == ',')
        && canonicalize_separators(digits).is_some()
}

/// Reads a resource coefficient token. A single `.` or `,` is always the
/// decimal mark (`1.500` is one and a half); several separators fall back to
/// `normalize_number` grouping.
pub fn parse_coefficient(raw: &str) -> f64 {
    let token = raw.trim();
    if token.matches(['.', ',']).count() != 1 {
        return normalize_number(token);
    }

    match token.replace(',', ".").parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Renders a coefficient with a decimal comma so it reads back through
/// `normalize_number` unchanged (`1.047` would otherwise read as 1047).
pub fn format_coefficient(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }

    format!("{value}").replace('.', ",")
}

fn strip_currency_and_spaces(raw: &str) -> Option<String> {
    let mut text = raw.trim();
    if text.is_empty() {
        return None;
    }

    for prefix in ["rp.", "rp", "idr"] {
        if text.len() >= prefix.len()
            && text.is_char_boundary(prefix.len())
            && text[..prefix.len()].eq_ignore_ascii_case(prefix)
        {
            text = text[prefix.len()..].trim_start();
            break;
        }
    }

    let compact = text
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '\u{a0}')
        .collect::<String>();

    // Trailing ",-" is the usual rupiah "no cents" marker.
    let compact = compact
        .strip_suffix(",-")
        .or_else(|| compact.strip_suffix(".-"))
        .map(ToOwned::to_owned)
        .unwrap_or(compact);

    if compact.is_empty() {
        None
    } else {
        Some(compact)
    }
}

fn canonicalize_separators(digits: &str) -> Option<String> {
    let comma_count = digits.matches(',').count();
    let period_count = digits.matches('.').count();

    let canonical = match (comma_count, period_count) {
        (0, 0) => digits.to_string(),
        (0, 1) => {
            if period_is_grouping(digits) {
                digits.replace('.', "")
            } else {
                digits.to_string()
            }
        }
        (0, _) => {
            if !period_is_grouping(digits) {
                return None;
            }
            digits.replace('.', "")
        }
        (1, 0) => digits.replace(',', "."),
        (_, 0) => {
            if !comma_is_grouping(digits) {
                return None;
            }
            digits.replace(',', "")
        }
        _ => {
            let last_comma = digits.rfind(',')?;
            let last_period = digits.rfind('.')?;
            if last_comma > last_period && comma_count == 1 {
                digits.replace('.', "").replace(',', ".")
            } else if last_period > last_comma && period_count == 1 {
                // "1,250.50": a period after the commas only happens in
                // English-formatted exports.
                digits.replace(',', "")
            } else {
                return None;
            }
        }
    };

    Some(canonical)
}

fn period_is_grouping(digits: &str) -> bool {
    separator_groups_thousands(digits, '.')
}

fn comma_is_grouping(digits: &str) -> bool {
    separator_groups_thousands(digits, ',')
}

fn separator_groups_thousands(digits: &str, separator: char) -> bool {
    let mut groups = digits.split(separator);
    let Some(lead) = groups.next() else {
        return false;
    };

    if lead.is_empty() || lead.len() > 3 || lead.starts_with('0') {
        return false;
    }

    groups.all(|group| group.len() == 3 && group.chars().all(|ch| ch.is_ascii_digit()))
}
