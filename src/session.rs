use crate::device::{DeviceClassifier, DeviceSignals};
use crate::phone;
use crate::rate_limit::RateLimiter;
use crate::sanitize;
use crate::submit::{RemoteSubmitClient, SubmitPayload};
use crate::translations::{MessageCatalog, MessageKey};
use crate::validate::{validate, FieldErrors, FieldKey, ValidationPolicy};

/// In-memory contents of the active form. Field values only ever hold
/// sanitized text; `phone` is raw digits, its display form is computed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub name: String,
    pub email: String,
    pub message: String,
    pub phone: String,
    pub consent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Editing,
    Submitting,
    Success,
}

/// Result of one submit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The session was not accepting a submit (in flight or finished).
    Ignored,
    /// Validation failed; per-field errors are populated.
    Invalid,
    /// The sliding window is full; no network call was made.
    RateLimited,
    /// The endpoint rejected the payload or the transport failed.
    Failed,
    /// The endpoint confirmed the submission.
    Accepted,
}

/// One user's form session: owns the form state, drives sanitization,
/// validation, rate limiting and the remote call, and exposes the
/// UI-visible status.
pub struct FormSession {
    form: FormState,
    errors: FieldErrors,
    status: SessionStatus,
    language: String,
    signals: Option<DeviceSignals>,
    policy: ValidationPolicy,
    limiter: RateLimiter,
    classifier: DeviceClassifier,
    client: RemoteSubmitClient,
}

impl FormSession {
    pub fn new(
        policy: ValidationPolicy,
        limiter: RateLimiter,
        classifier: DeviceClassifier,
        client: RemoteSubmitClient,
    ) -> Self {
        Self {
            form: FormState::default(),
            errors: FieldErrors::new(),
            status: SessionStatus::Editing,
            language: "en".to_string(),
            signals: None,
            policy,
            limiter,
            classifier,
            client,
        }
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, language: &str) {
        self.language = language.to_string();
    }

    pub fn set_device_signals(&mut self, signals: DeviceSignals) {
        self.signals = Some(signals);
    }

    /// Accept one field edit: sanitize per the field's class, store it,
    /// and clear any stale error on that field alone.
    pub fn set_field(&mut self, field: FieldKey, raw: &str) {
        if self.status != SessionStatus::Editing {
            log::debug!("Ignoring edit of '{}' outside the editing state", field.as_str());
            return;
        }
        let class = match field.class() {
            Some(class) => class,
            None => {
                log::debug!("Field '{}' does not take typed input", field.as_str());
                return;
            }
        };

        let clean = sanitize::sanitize(class, raw);
        match field {
            FieldKey::Name => self.form.name = clean,
            FieldKey::Email => self.form.email = clean,
            FieldKey::Phone => self.form.phone = clean,
            FieldKey::Message => self.form.message = clean,
            FieldKey::Consent | FieldKey::Submit => unreachable!("no input class"),
        }
        self.errors.clear_field(field);
    }

    pub fn set_consent(&mut self, consent: bool) {
        if self.status != SessionStatus::Editing {
            return;
        }
        self.form.consent = consent;
        self.errors.clear_field(FieldKey::Consent);
    }

    /// National display form of the stored phone digits. The country
    /// prefix is rendered by the caller as a fixed prefix, not stored.
    pub fn display_phone(&self) -> String {
        phone::format_national(&self.form.phone)
    }

    /// Errors from the latest validation pass, rendered in the
    /// session's language.
    pub fn render_errors(&self, catalog: &MessageCatalog) -> Vec<(&'static str, String)> {
        self.errors.render(catalog, &self.language)
    }

    /// Run the full submit pass: validate, check the rate limiter, and
    /// only then touch the network. On success the form is cleared and
    /// the submission recorded; on failure the form survives for retry.
    pub async fn submit(&mut self) -> SubmitOutcome {
        match self.status {
            SessionStatus::Submitting => {
                log::warn!("Ignoring re-entrant submit while a submission is in flight");
                return SubmitOutcome::Ignored;
            }
            SessionStatus::Success => {
                log::debug!("Ignoring submit after success; reset the session first");
                return SubmitOutcome::Ignored;
            }
            SessionStatus::Editing => {}
        }

        self.errors = validate(&self.form, &self.policy);
        if !self.errors.is_empty() {
            return SubmitOutcome::Invalid;
        }

        if self.limiter.is_limited() {
            self.errors
                .insert(FieldKey::Submit, MessageKey::ErrorRateLimited);
            if let Some(wait) = self.limiter.retry_after_secs() {
                log::info!("Submission rate limited, window frees up in {wait}s");
            }
            return SubmitOutcome::RateLimited;
        }

        self.status = SessionStatus::Submitting;
        let payload = self.build_payload();

        match self.client.send(&payload).await {
            Ok(()) => {
                if let Err(e) = self.limiter.record() {
                    log::warn!("Failed to record submission timestamp: {e}");
                }
                self.form = FormState::default();
                self.errors.clear();
                self.status = SessionStatus::Success;
                SubmitOutcome::Accepted
            }
            Err(e) => {
                log::warn!("Submission failed: {e}");
                self.status = SessionStatus::Editing;
                self.errors
                    .insert(FieldKey::Submit, MessageKey::ErrorSubmitFailed);
                SubmitOutcome::Failed
            }
        }
    }

    /// Return to a blank editing state. Ignored while a submission is
    /// in flight.
    pub fn reset(&mut self) {
        if self.status == SessionStatus::Submitting {
            log::debug!("Ignoring reset while a submission is in flight");
            return;
        }
        self.form = FormState::default();
        self.errors.clear();
        self.status = SessionStatus::Editing;
    }

    fn build_payload(&self) -> SubmitPayload {
        let phone = if self.form.phone.is_empty() {
            None
        } else {
            Some(phone::format_international(
                &self.form.phone,
                &self.policy.country_code,
            ))
        };
        let device = self
            .signals
            .as_ref()
            .map(|signals| self.classifier.classify(signals));

        SubmitPayload {
            name: self.form.name.clone(),
            email: self.form.email.clone(),
            message: self.form.message.clone(),
            phone,
            device,
        }
    }
}
