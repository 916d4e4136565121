//! Shape check for EU VAT numbers.
//!
//! Only the form is checked (prefix and length of the national part). A
//! customer whose VAT number fails the check is treated as a consumer.

/// Allowed lengths of the national part per prefix.
static EU_VAT_SHAPES: &[(&str, usize, usize)] = &[
    ("AT", 9, 9),
    ("BE", 10, 10),
    ("BG", 9, 10),
    ("CY", 9, 9),
    ("CZ", 8, 10),
    ("DE", 9, 9),
    ("DK", 8, 8),
    ("EE", 9, 9),
    ("EL", 9, 9),
    ("ES", 9, 9),
    ("FI", 8, 8),
    ("FR", 11, 11),
    ("HR", 11, 11),
    ("HU", 8, 8),
    ("IE", 8, 9),
    ("IT", 11, 11),
    ("LT", 9, 12),
    ("LU", 8, 8),
    ("LV", 11, 11),
    ("MT", 8, 8),
    ("NL", 12, 12),
    ("PL", 10, 10),
    ("PT", 9, 9),
    ("RO", 2, 10),
    ("SE", 12, 12),
    ("SI", 8, 8),
    ("SK", 10, 10),
];

/// VAT prefix for an ISO country code (Greece uses `EL`).
fn vat_prefix(country: &str) -> &str {
    if country == "GR" { "EL" } else { country }
}

/// Strip the separators people type into VAT numbers and uppercase the rest.
pub fn compact_vat_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '.' | '-' | '\t'))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Whether `raw` looks like a VAT number issued by `country` (ISO, uppercase).
///
/// For countries outside the EU any non-empty alphanumeric identifier is
/// accepted, since only EU numbers have a common shape.
pub fn vat_number_matches(country: &str, raw: &str) -> bool {
    let vat = compact_vat_number(raw);
    if vat.is_empty() || !vat.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }
    let prefix = vat_prefix(country);
    let Some(&(_, min, max)) = EU_VAT_SHAPES.iter().find(|(p, _, _)| *p == prefix) else {
        return true;
    };
    let Some(national) = vat.strip_prefix(prefix) else {
        return false;
    };
    (min..=max).contains(&national.len()) && national.chars().any(|c| c.is_ascii_digit())
}
