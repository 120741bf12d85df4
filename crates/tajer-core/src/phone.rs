// SPDX-FileCopyrightText: 2026 Tajer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number canonicalization.
//!
//! Every phone number that enters the system (webhook sender, CLI flag) is
//! rewritten to `+<country><subscriber>` before it is used as a customer key
//! or a delivery address.

/// Normalize a raw phone number to canonical international form.
///
/// Accepted inputs:
/// - `+96170123456`, `+961 70 123 456`, `+961-70-123456`
/// - `0096170123456` (international `00` prefix)
/// - `96170123456` (gateway style, country code without `+`)
/// - `070123456` / `70123456` (national; `default_country_code` is prepended)
///
/// Returns `None` when fewer than 7 digits remain.
pub fn normalize_phone(raw: &str, default_country_code: &str) -> Option<String> {
    let trimmed = raw.trim();
    let has_plus = trimmed.starts_with('+');
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() < 7 {
        return None;
    }

    let country = default_country_code.trim_start_matches('+');

    let international = if has_plus {
        digits
    } else if let Some(rest) = digits.strip_prefix("00") {
        rest.to_string()
    } else if let Some(rest) = digits.strip_prefix('0') {
        format!("{country}{rest}")
    } else if !country.is_empty() && digits.starts_with(country) && digits.len() > 8 {
        digits
    } else if digits.len() <= 8 {
        format!("{country}{digits}")
    } else {
        digits
    };

    Some(format!("+{international}"))
}
