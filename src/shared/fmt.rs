//! Number formatting for the ticker list and detail views.
//!
//! Prices are shown with grouped thousands and a bounded number of fraction
//! digits; volumes are usually shown with zero digits.

/// Group the integer part of an already-rendered number with commas and
/// trim trailing fractional zeros.
fn group_thousands(rendered: &str) -> String {
    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered),
    };

    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (unsigned, ""),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    // "-0" after rounding reads oddly next to a price
    let sign = if grouped.chars().all(|c| c == '0' || c == ',') && frac_part.is_empty() {
        ""
    } else {
        sign
    };

    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}

fn auto_digits(value: f64) -> usize {
    let abs_value = value.abs();

    if abs_value >= 100.0 {
        return 0;
    }
    if abs_value >= 1.0 || abs_value == 0.0 {
        return 2;
    }

    let exponent = abs_value.log10().floor().abs() as usize;
    (exponent + 2).min(8)
}

/// Format with digits chosen from the magnitude: whole numbers from 100 up,
/// two digits from 1, and enough digits to show two significant figures below 1.
pub fn format_number(value: f64) -> String {
    format_with_digits(value, auto_digits(value))
}

/// Format with at most `digits` fraction digits.
pub fn format_with_digits(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    group_thousands(&format!("{:.1$}", value, digits))
}
