use crate::sanitize::MAX_PHONE_DIGITS;

/// Group a raw national digit string for display.
///
/// The stored value is always the bare digits; grouping is computed on the
/// way out and never written back. Grouping by digit count n:
/// n <= 2 as-is, 3..=5 `DD D..`, 6..=7 `DD DDD D..`, 8..=9 `DD DDD DD D[D]`.
pub fn format_national(digits: &str) -> String {
    // Callers hold the digits-only invariant; enforce it anyway so the
    // formatter is total over arbitrary input.
    let digits: String = digits.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        0..=2 => digits,
        3..=5 => format!("{} {}", &digits[..2], &digits[2..]),
        6..=7 => format!("{} {} {}", &digits[..2], &digits[2..5], &digits[5..]),
        _ => format!(
            "{} {} {} {}",
            &digits[..2],
            &digits[2..5],
            &digits[5..7],
            &digits[7..]
        ),
    }
}

/// Format a number for the outgoing payload: fixed country prefix plus the
/// grouped national number.
///
/// A 12-digit value that already starts with the country code is reduced to
/// its subscriber part first; a bare 9-digit value is used as-is. The country
/// prefix itself is display furniture, it is never stored in `FormState`.
pub fn format_international(digits: &str, country_code: &str) -> String {
    let national = match digits.strip_prefix(country_code) {
        Some(rest) if rest.len() == MAX_PHONE_DIGITS => rest,
        _ => digits,
    };
    format!("+{} {}", country_code, format_national(national))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_full_subscriber_number() {
        assert_eq!(format_national("991234567"), "99 123 45 67");
    }

    #[test]
    fn short_prefixes_stay_ungrouped() {
        assert_eq!(format_national(""), "");
        assert_eq!(format_national("9"), "9");
        assert_eq!(format_national("99"), "99");
    }

    #[test]
    fn partial_numbers_group_incrementally() {
        assert_eq!(format_national("991"), "99 1");
        assert_eq!(format_national("9912"), "99 12");
        assert_eq!(format_national("99123"), "99 123");
        assert_eq!(format_national("991234"), "99 123 4");
        assert_eq!(format_national("9912345"), "99 123 45");
        assert_eq!(format_national("99123456"), "99 123 45 6");
    }

    #[test]
    fn non_digits_are_ignored() {
        assert_eq!(format_national("99-123-45-67"), "99 123 45 67");
    }

    #[test]
    fn international_prepends_country_prefix() {
        assert_eq!(
            format_international("991234567", "998"),
            "+998 99 123 45 67"
        );
    }

    #[test]
    fn international_strips_duplicated_country_code() {
        assert_eq!(
            format_international("998991234567", "998"),
            "+998 99 123 45 67"
        );
    }

    #[test]
    fn nine_digit_number_starting_with_country_code_digits_is_kept() {
        // "998123456" is a full subscriber number, not a 12-digit
        // international form, so no prefix stripping happens.
        assert_eq!(
            format_international("998123456", "998"),
            "+998 99 812 34 56"
        );
    }
}
