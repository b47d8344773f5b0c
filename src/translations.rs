use anyhow::{bail, Context, Result};
use std::collections::HashMap;

/// Every display string the pipeline itself needs, as a closed set.
///
/// Catalogs are validated against this set when they are built or loaded,
/// so `MessageCatalog::lookup` is total: there is no per-key render-time
/// fallback to chase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageKey {
    LabelName,
    LabelEmail,
    LabelPhone,
    LabelMessage,
    LabelConsent,
    ButtonSubmit,
    ButtonSending,
    SuccessTitle,
    SuccessBody,
    ErrorNameLength,
    ErrorMessageLength,
    ErrorEmailInvalid,
    ErrorPhoneInvalid,
    ErrorContactRequired,
    ErrorConsentRequired,
    ErrorRateLimited,
    ErrorSubmitFailed,
}

impl MessageKey {
    pub const ALL: &'static [MessageKey] = &[
        MessageKey::LabelName,
        MessageKey::LabelEmail,
        MessageKey::LabelPhone,
        MessageKey::LabelMessage,
        MessageKey::LabelConsent,
        MessageKey::ButtonSubmit,
        MessageKey::ButtonSending,
        MessageKey::SuccessTitle,
        MessageKey::SuccessBody,
        MessageKey::ErrorNameLength,
        MessageKey::ErrorMessageLength,
        MessageKey::ErrorEmailInvalid,
        MessageKey::ErrorPhoneInvalid,
        MessageKey::ErrorContactRequired,
        MessageKey::ErrorConsentRequired,
        MessageKey::ErrorRateLimited,
        MessageKey::ErrorSubmitFailed,
    ];

    /// Key name as it appears in translation files.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKey::LabelName => "label_name",
            MessageKey::LabelEmail => "label_email",
            MessageKey::LabelPhone => "label_phone",
            MessageKey::LabelMessage => "label_message",
            MessageKey::LabelConsent => "label_consent",
            MessageKey::ButtonSubmit => "button_submit",
            MessageKey::ButtonSending => "button_sending",
            MessageKey::SuccessTitle => "success_title",
            MessageKey::SuccessBody => "success_body",
            MessageKey::ErrorNameLength => "error_name_length",
            MessageKey::ErrorMessageLength => "error_message_length",
            MessageKey::ErrorEmailInvalid => "error_email_invalid",
            MessageKey::ErrorPhoneInvalid => "error_phone_invalid",
            MessageKey::ErrorContactRequired => "error_contact_required",
            MessageKey::ErrorConsentRequired => "error_consent_required",
            MessageKey::ErrorRateLimited => "error_rate_limited",
            MessageKey::ErrorSubmitFailed => "error_submit_failed",
        }
    }

    fn from_str(name: &str) -> Option<MessageKey> {
        MessageKey::ALL.iter().copied().find(|k| k.as_str() == name)
    }
}

/// Language-keyed message tables with a guaranteed fallback language.
///
/// Built-in tables ship complete; tables loaded from a file are rejected
/// whole when any key is missing or unknown, rather than failing silently
/// per key later.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    tables: HashMap<String, HashMap<MessageKey, String>>,
    default_language: String,
}

impl MessageCatalog {
    /// Catalog with the built-in languages. Fails if `default_language`
    /// is not one of them (the fallback must always resolve).
    pub fn builtin(default_language: &str) -> Result<Self> {
        let mut tables = HashMap::new();
        tables.insert("en".to_string(), english());
        tables.insert("ru".to_string(), russian());
        tables.insert("uz".to_string(), uzbek());

        if !tables.contains_key(default_language) {
            bail!(
                "default language '{default_language}' is not a built-in language (en, ru, uz)"
            );
        }

        Ok(Self {
            tables,
            default_language: default_language.to_string(),
        })
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.tables.keys().map(|s| s.as_str()).collect();
        langs.sort_unstable();
        langs
    }

    pub fn has_language(&self, lang: &str) -> bool {
        self.tables.contains_key(lang)
    }

    /// Resolve a message. An unrecognized language selector falls back to
    /// the default language; the key itself always resolves because every
    /// stored table is complete.
    pub fn lookup(&self, lang: &str, key: MessageKey) -> &str {
        let table = self
            .tables
            .get(lang)
            .or_else(|| self.tables.get(&self.default_language));

        match table.and_then(|t| t.get(&key)) {
            Some(message) => message,
            // Unreachable for validated catalogs; keep lookup total anyway.
            None => key.as_str(),
        }
    }

    /// Load additional or overriding language tables from a YAML file of
    /// the shape `lang -> { key_name -> message }`.
    ///
    /// Each table must cover every `MessageKey` and may not carry unknown
    /// keys; an invalid table rejects the whole file.
    pub fn merge_file(&mut self, path: &str) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read translations file: {path}"))?;
        let raw: HashMap<String, HashMap<String, String>> = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse translations file: {path}"))?;

        // Validate every table before the first insert: a rejected file
        // must leave the catalog untouched.
        let mut validated = HashMap::new();
        for (lang, entries) in raw {
            let table = validate_table(&lang, &entries)
                .with_context(|| format!("Invalid language table '{lang}' in {path}"))?;
            validated.insert(lang, table);
        }

        for (lang, table) in validated {
            log::info!("loaded translation table '{lang}' ({} keys)", table.len());
            self.tables.insert(lang, table);
        }

        Ok(())
    }
}

fn validate_table(
    lang: &str,
    entries: &HashMap<String, String>,
) -> Result<HashMap<MessageKey, String>> {
    let mut table = HashMap::new();

    for (name, message) in entries {
        match MessageKey::from_str(name) {
            Some(key) => {
                table.insert(key, message.clone());
            }
            None => bail!("unknown message key '{name}'"),
        }
    }

    let missing: Vec<&str> = MessageKey::ALL
        .iter()
        .filter(|k| !table.contains_key(k))
        .map(|k| k.as_str())
        .collect();
    if !missing.is_empty() {
        bail!(
            "language table '{lang}' is incomplete, missing: {}",
            missing.join(", ")
        );
    }

    Ok(table)
}

fn table(entries: &[(MessageKey, &str)]) -> HashMap<MessageKey, String> {
    entries
        .iter()
        .map(|(k, v)| (*k, (*v).to_string()))
        .collect()
}

fn english() -> HashMap<MessageKey, String> {
    table(&[
        (MessageKey::LabelName, "Name"),
        (MessageKey::LabelEmail, "Email"),
        (MessageKey::LabelPhone, "Phone"),
        (MessageKey::LabelMessage, "Message"),
        (MessageKey::LabelConsent, "I agree to the privacy policy"),
        (MessageKey::ButtonSubmit, "Send message"),
        (MessageKey::ButtonSending, "Sending..."),
        (MessageKey::SuccessTitle, "Message sent!"),
        (MessageKey::SuccessBody, "We will get back to you shortly."),
        (
            MessageKey::ErrorNameLength,
            "Name must be between 2 and 100 characters",
        ),
        (
            MessageKey::ErrorMessageLength,
            "Message is too short or too long",
        ),
        (MessageKey::ErrorEmailInvalid, "Enter a valid email address"),
        (MessageKey::ErrorPhoneInvalid, "Enter a valid phone number"),
        (
            MessageKey::ErrorContactRequired,
            "Leave an email or a phone number so we can reach you",
        ),
        (
            MessageKey::ErrorConsentRequired,
            "Please accept the privacy policy",
        ),
        (
            MessageKey::ErrorRateLimited,
            "Too many submissions, please try again later",
        ),
        (
            MessageKey::ErrorSubmitFailed,
            "Something went wrong, please try again",
        ),
    ])
}

fn russian() -> HashMap<MessageKey, String> {
    table(&[
        (MessageKey::LabelName, "Имя"),
        (MessageKey::LabelEmail, "Эл. почта"),
        (MessageKey::LabelPhone, "Телефон"),
        (MessageKey::LabelMessage, "Сообщение"),
        (
            MessageKey::LabelConsent,
            "Я согласен с политикой конфиденциальности",
        ),
        (MessageKey::ButtonSubmit, "Отправить сообщение"),
        (MessageKey::ButtonSending, "Отправка..."),
        (MessageKey::SuccessTitle, "Сообщение отправлено!"),
        (
            MessageKey::SuccessBody,
            "Мы свяжемся с вами в ближайшее время.",
        ),
        (
            MessageKey::ErrorNameLength,
            "Имя должно содержать от 2 до 100 символов",
        ),
        (
            MessageKey::ErrorMessageLength,
            "Сообщение слишком короткое или слишком длинное",
        ),
        (
            MessageKey::ErrorEmailInvalid,
            "Введите корректный адрес эл. почты",
        ),
        (
            MessageKey::ErrorPhoneInvalid,
            "Введите корректный номер телефона",
        ),
        (
            MessageKey::ErrorContactRequired,
            "Укажите эл. почту или телефон, чтобы мы могли с вами связаться",
        ),
        (
            MessageKey::ErrorConsentRequired,
            "Пожалуйста, примите политику конфиденциальности",
        ),
        (
            MessageKey::ErrorRateLimited,
            "Слишком много заявок, повторите попытку позже",
        ),
        (
            MessageKey::ErrorSubmitFailed,
            "Что-то пошло не так, попробуйте ещё раз",
        ),
    ])
}

fn uzbek() -> HashMap<MessageKey, String> {
    table(&[
        (MessageKey::LabelName, "Ism"),
        (MessageKey::LabelEmail, "Email"),
        (MessageKey::LabelPhone, "Telefon"),
        (MessageKey::LabelMessage, "Xabar"),
        (MessageKey::LabelConsent, "Maxfiylik siyosatiga roziman"),
        (MessageKey::ButtonSubmit, "Xabar yuborish"),
        (MessageKey::ButtonSending, "Yuborilmoqda..."),
        (MessageKey::SuccessTitle, "Xabar yuborildi!"),
        (
            MessageKey::SuccessBody,
            "Tez orada siz bilan bog'lanamiz.",
        ),
        (
            MessageKey::ErrorNameLength,
            "Ism 2 tadan 100 tagacha belgidan iborat bo'lishi kerak",
        ),
        (
            MessageKey::ErrorMessageLength,
            "Xabar juda qisqa yoki juda uzun",
        ),
        (
            MessageKey::ErrorEmailInvalid,
            "To'g'ri email manzilini kiriting",
        ),
        (
            MessageKey::ErrorPhoneInvalid,
            "To'g'ri telefon raqamini kiriting",
        ),
        (
            MessageKey::ErrorContactRequired,
            "Siz bilan bog'lanishimiz uchun email yoki telefon qoldiring",
        ),
        (
            MessageKey::ErrorConsentRequired,
            "Iltimos, maxfiylik siyosatini qabul qiling",
        ),
        (
            MessageKey::ErrorRateLimited,
            "Juda ko'p urinish, keyinroq qayta urinib ko'ring",
        ),
        (
            MessageKey::ErrorSubmitFailed,
            "Xatolik yuz berdi, qayta urinib ko'ring",
        ),
    ])
}
