/// Character policy applied to a field before its value enters `FormState`.
///
/// Every text field of the form belongs to exactly one class; the class
/// decides which characters survive. Sanitization runs on every input
/// event, so re-sanitizing an already-clean value must be a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    /// Name and message bodies: structurally dangerous characters stripped,
    /// interior whitespace kept as typed.
    FreeText,
    /// Email addresses: reduced to the `[A-Za-z0-9_@.+-]` alphabet.
    Email,
    /// Phone input: decimal digits only, capped at the subscriber length.
    Phone,
}

/// Characters stripped from free-text fields. These are the characters that
/// give markup, path, or key/value structure to downstream consumers.
const FREE_TEXT_DENYLIST: &[char] = &[
    '<', '>', '[', ']', '{', '}', '\'', '"', '\\', '/', '|', ';', ':', '=',
];

/// National subscriber numbers carry exactly this many digits; anything a
/// user types beyond it is dropped.
pub const MAX_PHONE_DIGITS: usize = 9;

/// Clean a raw input value according to its field class.
pub fn sanitize(class: FieldClass, raw: &str) -> String {
    match class {
        FieldClass::FreeText => sanitize_free_text(raw),
        FieldClass::Email => sanitize_email(raw),
        FieldClass::Phone => sanitize_phone(raw),
    }
}

fn sanitize_free_text(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !FREE_TEXT_DENYLIST.contains(c))
        .collect();
    stripped.trim().to_string()
}

fn sanitize_email(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '.' | '+' | '-'))
        .collect();
    kept.trim().to_string()
}

fn sanitize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(MAX_PHONE_DIGITS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_text_strips_denylist_characters() {
        let dirty = r#"<script>alert('x')</script> {a} [b] "c" d;e:f=g|h\i/j"#;
        let clean = sanitize(FieldClass::FreeText, dirty);
        for c in FREE_TEXT_DENYLIST {
            assert!(!clean.contains(*c), "denylist char {c:?} survived: {clean}");
        }
    }

    #[test]
    fn free_text_keeps_interior_whitespace() {
        assert_eq!(
            sanitize(FieldClass::FreeText, "  John  Smith  "),
            "John  Smith"
        );
    }

    #[test]
    fn free_text_is_idempotent() {
        let once = sanitize(FieldClass::FreeText, "He said: \"hello\" <wave>");
        let twice = sanitize(FieldClass::FreeText, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn email_keeps_only_address_alphabet() {
        assert_eq!(
            sanitize(FieldClass::Email, " john.smith+tag@example.com "),
            "john.smith+tag@example.com"
        );
        assert_eq!(
            sanitize(FieldClass::Email, "jo hn<script>@exa mple.com"),
            "johnscript@example.com"
        );
    }

    #[test]
    fn email_is_idempotent() {
        let once = sanitize(FieldClass::Email, "a b@c;d.com");
        assert_eq!(sanitize(FieldClass::Email, &once), once);
    }

    #[test]
    fn phone_keeps_digits_and_truncates() {
        assert_eq!(sanitize(FieldClass::Phone, "+998 (99) 123-45-67"), "998991234");
        assert_eq!(sanitize(FieldClass::Phone, "99 123 45 67"), "991234567");
        assert_eq!(sanitize(FieldClass::Phone, "abc"), "");
    }

    #[test]
    fn phone_output_is_all_digits_and_short_enough() {
        let clean = sanitize(FieldClass::Phone, "12x34y56z78w90v12");
        assert!(clean.chars().all(|c| c.is_ascii_digit()));
        assert!(clean.len() <= MAX_PHONE_DIGITS);
    }

    #[test]
    fn phone_is_idempotent() {
        let once = sanitize(FieldClass::Phone, "99-123-45-67-89");
        assert_eq!(sanitize(FieldClass::Phone, &once), once);
    }
}
