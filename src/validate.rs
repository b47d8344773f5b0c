use crate::sanitize::{FieldClass, MAX_PHONE_DIGITS};
use crate::session::FormState;
use crate::translations::{MessageCatalog, MessageKey};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 100;
pub const MIN_MESSAGE_LEN: usize = 2;

lazy_static! {
    // Single '@' with at least one '.' somewhere after it.
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Addressable slots in the error map. `Consent` and `Submit` are
/// synthetic: they carry gate and submit-scoped errors rather than
/// typed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    Name,
    Email,
    Phone,
    Message,
    Consent,
    Submit,
}

impl FieldKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Name => "name",
            FieldKey::Email => "email",
            FieldKey::Phone => "phone",
            FieldKey::Message => "message",
            FieldKey::Consent => "consent",
            FieldKey::Submit => "submit",
        }
    }

    /// Sanitization class for fields that accept typed input.
    pub fn class(&self) -> Option<FieldClass> {
        match self {
            FieldKey::Name | FieldKey::Message => Some(FieldClass::FreeText),
            FieldKey::Email => Some(FieldClass::Email),
            FieldKey::Phone => Some(FieldClass::Phone),
            FieldKey::Consent | FieldKey::Submit => None,
        }
    }
}

/// Per-field error codes from the latest validation pass.
///
/// Stored as message keys, not rendered text, so the same pass can be
/// displayed in any loaded language.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors {
    errors: BTreeMap<FieldKey, MessageKey>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: FieldKey, message: MessageKey) {
        self.errors.insert(field, message);
    }

    pub fn get(&self, field: FieldKey) -> Option<MessageKey> {
        self.errors.get(&field).copied()
    }

    /// Drop the error for one field, used when that field is edited.
    pub fn clear_field(&mut self, field: FieldKey) {
        self.errors.remove(&field);
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, MessageKey)> + '_ {
        self.errors.iter().map(|(k, v)| (*k, *v))
    }

    /// Render the map to display strings in the requested language.
    pub fn render(&self, catalog: &MessageCatalog, lang: &str) -> Vec<(&'static str, String)> {
        self.errors
            .iter()
            .map(|(field, key)| (field.as_str(), catalog.lookup(lang, *key).to_string()))
            .collect()
    }
}

/// Deployment-tunable validation rules.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationPolicy {
    pub max_message_len: usize,
    pub country_code: String,
    pub require_consent: bool,
    pub require_contact: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            max_message_len: 1000,
            country_code: "998".to_string(),
            require_consent: true,
            require_contact: true,
        }
    }
}

/// Check a form against the policy and collect every failure in one
/// pass. Pure: runs at submit time only, never per keystroke.
pub fn validate(form: &FormState, policy: &ValidationPolicy) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let name_len = form.name.chars().count();
    if name_len < MIN_NAME_LEN || name_len > MAX_NAME_LEN {
        errors.insert(FieldKey::Name, MessageKey::ErrorNameLength);
    }

    let message_len = form.message.chars().count();
    if message_len < MIN_MESSAGE_LEN || message_len > policy.max_message_len {
        errors.insert(FieldKey::Message, MessageKey::ErrorMessageLength);
    }

    if !form.email.is_empty() && !EMAIL_RE.is_match(&form.email) {
        errors.insert(FieldKey::Email, MessageKey::ErrorEmailInvalid);
    }

    if !form.phone.is_empty() && !phone_is_valid(&form.phone, &policy.country_code) {
        errors.insert(FieldKey::Phone, MessageKey::ErrorPhoneInvalid);
    }

    // One shared message on both contact fields when neither is given.
    if policy.require_contact && form.email.is_empty() && form.phone.is_empty() {
        errors.insert(FieldKey::Email, MessageKey::ErrorContactRequired);
        errors.insert(FieldKey::Phone, MessageKey::ErrorContactRequired);
    }

    if policy.require_consent && !form.consent {
        errors.insert(FieldKey::Consent, MessageKey::ErrorConsentRequired);
    }

    errors
}

/// A bare subscriber number, or a full number with the national
/// country code ahead of it.
fn phone_is_valid(digits: &str, country_code: &str) -> bool {
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    digits.len() == MAX_PHONE_DIGITS
        || (digits.len() == country_code.len() + MAX_PHONE_DIGITS
            && digits.starts_with(country_code))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> FormState {
        FormState {
            name: "John Smith".to_string(),
            email: "john@example.com".to_string(),
            message: "Interested in your services".to_string(),
            phone: String::new(),
            consent: true,
        }
    }

    #[test]
    fn valid_form_produces_no_errors() {
        let errors = validate(&valid_form(), &ValidationPolicy::default());
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn name_length_bounds() {
        let policy = ValidationPolicy::default();

        let mut form = valid_form();
        form.name = "J".to_string();
        assert_eq!(
            validate(&form, &policy).get(FieldKey::Name),
            Some(MessageKey::ErrorNameLength)
        );

        form.name = "Jo".to_string();
        assert_eq!(validate(&form, &policy).get(FieldKey::Name), None);

        form.name = "x".repeat(100);
        assert_eq!(validate(&form, &policy).get(FieldKey::Name), None);

        form.name = "x".repeat(101);
        assert_eq!(
            validate(&form, &policy).get(FieldKey::Name),
            Some(MessageKey::ErrorNameLength)
        );
    }

    #[test]
    fn name_length_counts_characters_not_bytes() {
        let policy = ValidationPolicy::default();
        let mut form = valid_form();
        // Two characters, four bytes.
        form.name = "Ёж".to_string();
        assert_eq!(validate(&form, &policy).get(FieldKey::Name), None);
    }

    #[test]
    fn message_length_respects_policy_cap() {
        let policy = ValidationPolicy {
            max_message_len: 500,
            ..ValidationPolicy::default()
        };

        let mut form = valid_form();
        form.message = "x".repeat(500);
        assert_eq!(validate(&form, &policy).get(FieldKey::Message), None);

        form.message = "x".repeat(501);
        assert_eq!(
            validate(&form, &policy).get(FieldKey::Message),
            Some(MessageKey::ErrorMessageLength)
        );

        form.message = "x".to_string();
        assert_eq!(
            validate(&form, &policy).get(FieldKey::Message),
            Some(MessageKey::ErrorMessageLength)
        );
    }

    #[test]
    fn email_pattern() {
        let policy = ValidationPolicy::default();
        let mut form = valid_form();

        form.email = "a@b.co".to_string();
        assert_eq!(validate(&form, &policy).get(FieldKey::Email), None);

        form.email = "a@b".to_string();
        assert_eq!(
            validate(&form, &policy).get(FieldKey::Email),
            Some(MessageKey::ErrorEmailInvalid)
        );

        form.email = "a@@b.co".to_string();
        assert_eq!(
            validate(&form, &policy).get(FieldKey::Email),
            Some(MessageKey::ErrorEmailInvalid)
        );
    }

    #[test]
    fn phone_digit_counts() {
        let policy = ValidationPolicy::default();
        let mut form = valid_form();

        form.phone = "123456789".to_string();
        assert_eq!(validate(&form, &policy).get(FieldKey::Phone), None);

        form.phone = "12345".to_string();
        assert_eq!(
            validate(&form, &policy).get(FieldKey::Phone),
            Some(MessageKey::ErrorPhoneInvalid)
        );

        // Full international form with the national country code.
        form.phone = "998991234567".to_string();
        assert_eq!(validate(&form, &policy).get(FieldKey::Phone), None);

        // Twelve digits with the wrong prefix is not a national number.
        form.phone = "997991234567".to_string();
        assert_eq!(
            validate(&form, &policy).get(FieldKey::Phone),
            Some(MessageKey::ErrorPhoneInvalid)
        );
    }

    #[test]
    fn dual_contact_rule_flags_both_fields() {
        let policy = ValidationPolicy::default();
        let mut form = valid_form();
        form.email = String::new();
        form.phone = String::new();

        let errors = validate(&form, &policy);
        assert_eq!(
            errors.get(FieldKey::Email),
            Some(MessageKey::ErrorContactRequired)
        );
        assert_eq!(
            errors.get(FieldKey::Phone),
            Some(MessageKey::ErrorContactRequired)
        );

        let relaxed = ValidationPolicy {
            require_contact: false,
            ..ValidationPolicy::default()
        };
        assert!(validate(&form, &relaxed).is_empty());
    }

    #[test]
    fn consent_gate() {
        let policy = ValidationPolicy::default();
        let mut form = valid_form();
        form.consent = false;

        assert_eq!(
            validate(&form, &policy).get(FieldKey::Consent),
            Some(MessageKey::ErrorConsentRequired)
        );

        let relaxed = ValidationPolicy {
            require_consent: false,
            ..ValidationPolicy::default()
        };
        assert!(validate(&form, &relaxed).is_empty());
    }

    #[test]
    fn clear_field_drops_only_that_entry() {
        let mut errors = FieldErrors::new();
        errors.insert(FieldKey::Name, MessageKey::ErrorNameLength);
        errors.insert(FieldKey::Email, MessageKey::ErrorEmailInvalid);

        errors.clear_field(FieldKey::Name);
        assert_eq!(errors.get(FieldKey::Name), None);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn flagged_fields_iterate_in_form_order() {
        let mut errors = FieldErrors::new();
        errors.insert(FieldKey::Submit, MessageKey::ErrorSubmitFailed);
        errors.insert(FieldKey::Phone, MessageKey::ErrorPhoneInvalid);
        errors.insert(FieldKey::Name, MessageKey::ErrorNameLength);

        let flagged: Vec<FieldKey> = errors.iter().map(|(field, _)| field).collect();
        assert_eq!(flagged, vec![FieldKey::Name, FieldKey::Phone, FieldKey::Submit]);
    }

    #[test]
    fn render_localizes_messages() {
        let catalog = crate::translations::MessageCatalog::builtin("en").unwrap();
        let mut errors = FieldErrors::new();
        errors.insert(FieldKey::Consent, MessageKey::ErrorConsentRequired);

        let rendered = errors.render(&catalog, "ru");
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].0, "consent");
        assert_eq!(
            rendered[0].1,
            "Пожалуйста, примите политику конфиденциальности"
        );
    }
}
