use anyhow::Context;
use clap::{Arg, Command};
use formgate::config::Config;
use formgate::device::{DeviceClassifier, DeviceSignals};
use formgate::rate_limit::{FileStore, RateLimiter, SystemClock};
use formgate::sanitize::{sanitize, FieldClass};
use formgate::session::{FormSession, FormState, SubmitOutcome};
use formgate::submit::{HttpTransport, RemoteSubmitClient};
use formgate::translations::MessageCatalog;
use formgate::validate::{validate, FieldKey};
use log::LevelFilter;
use serde::Deserialize;
use std::process;
use std::sync::Arc;

/// One submission as carried by a `--submission` file.
#[derive(Debug, Deserialize)]
struct SubmissionFile {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    consent: bool,
    language: Option<String>,
    device: Option<DeviceSignals>,
}

#[tokio::main]
async fn main() {
    let matches = Command::new("formgate")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Contact-form submission pipeline: sanitize, validate, throttle, forward")
        .long_about(
            "Formgate runs untrusted contact-form input through the full pipeline:\n\
             sanitization per field class, submit-time validation, sliding-window\n\
             rate limiting, device fingerprinting, and the webhook POST.",
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("/etc/formgate.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Test configuration validity, including translation tables")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("submission")
                .short('s')
                .long("submission")
                .value_name("FILE")
                .help("Process a YAML submission file through the pipeline")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Validate and rate-limit check only, never call the endpoint")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    // Initialize logger based on verbose flag
    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches.get_one::<String>("config").unwrap();
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        test_config(&config);
        return;
    }

    if let Some(submission_file) = matches.get_one::<String>("submission") {
        run_submission(&config, submission_file, matches.get_flag("dry-run")).await;
        return;
    }

    eprintln!("Nothing to do: pass --submission FILE, --test-config or --generate-config");
    process::exit(2);
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path)
    } else {
        log::warn!("Configuration file '{path}' not found, using default configuration");
        Ok(Config::default())
    }
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

fn test_config(config: &Config) {
    println!("🔍 Testing configuration...");
    println!();

    let catalog = match check_config(config) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("❌ Configuration error: {e:#}");
            process::exit(1);
        }
    };

    println!("Endpoint: {}", config.endpoint_url);
    println!("Country code: +{}", config.country_code);
    println!("Message length cap: {}", config.max_message_len);
    println!("Consent required: {}", config.require_consent);
    println!("Contact method required: {}", config.require_contact);
    println!(
        "Rate limit: {} submissions per {}s",
        config.rate_limit.max_submissions, config.rate_limit.window_seconds
    );
    println!("Submission store: {}", config.rate_limit.store_path);
    println!("Default language: {}", config.default_language);
    println!("Languages: {}", catalog.languages().join(", "));
    println!();
    println!("✅ Configuration is valid");
}

fn check_config(config: &Config) -> anyhow::Result<MessageCatalog> {
    url::Url::parse(&config.endpoint_url)
        .with_context(|| format!("Invalid endpoint URL: {}", config.endpoint_url))?;

    if config.rate_limit.max_submissions == 0 {
        anyhow::bail!("rate_limit.max_submissions must be at least 1");
    }
    if config.rate_limit.window_seconds == 0 {
        anyhow::bail!("rate_limit.window_seconds must be at least 1");
    }
    if config.max_message_len < 2 {
        anyhow::bail!("max_message_len must be at least 2");
    }
    if config.country_code.is_empty() || !config.country_code.chars().all(|c| c.is_ascii_digit()) {
        anyhow::bail!(
            "country_code must be decimal digits, got '{}'",
            config.country_code
        );
    }

    build_catalog(config)
}

fn build_catalog(config: &Config) -> anyhow::Result<MessageCatalog> {
    let mut catalog = MessageCatalog::builtin(&config.default_language)?;
    if let Some(path) = &config.translations_file {
        catalog.merge_file(path)?;
    }
    Ok(catalog)
}

fn load_submission(path: &str) -> anyhow::Result<SubmissionFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read submission file: {path}"))?;
    let submission: SubmissionFile = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse submission file: {path}"))?;
    Ok(submission)
}

fn print_field_errors(errors: &[(&'static str, String)]) {
    for (field, message) in errors {
        eprintln!("  {field}: {message}");
    }
}

async fn run_submission(config: &Config, submission_file: &str, dry_run: bool) {
    println!("🧪 Processing submission file: {submission_file}");
    println!();

    let submission = match load_submission(submission_file) {
        Ok(submission) => submission,
        Err(e) => {
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    };

    let catalog = match check_config(config) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("❌ Configuration error: {e:#}");
            process::exit(1);
        }
    };

    let language = submission
        .language
        .clone()
        .unwrap_or_else(|| config.default_language.clone());
    if !catalog.has_language(&language) {
        log::warn!(
            "Language '{language}' is not loaded, falling back to '{}'",
            catalog.default_language()
        );
    }

    let classifier = DeviceClassifier::new();
    if let Some(signals) = &submission.device {
        println!("Device: {}", classifier.classify(signals));
    }

    let store = Arc::new(FileStore::new(&config.rate_limit.store_path));
    let clock = Arc::new(SystemClock);
    let limiter = RateLimiter::new(
        store,
        clock,
        config.rate_limit.window_seconds,
        config.rate_limit.max_submissions,
    );
    let policy = config.validation_policy();

    if dry_run {
        // Same sanitize-validate-throttle pass as a live run, with the
        // network leg left out.
        let form = sanitized_form(&submission);
        let errors = validate(&form, &policy);
        if !errors.is_empty() {
            eprintln!("❌ Submission rejected by validation:");
            print_field_errors(&errors.render(&catalog, &language));
            process::exit(1);
        }
        if limiter.is_limited() {
            match limiter.retry_after_secs() {
                Some(wait) => eprintln!("❌ Rate limited, window frees up in {wait}s"),
                None => eprintln!("❌ Rate limited"),
            }
            process::exit(1);
        }
        println!("✅ Submission would be accepted (dry run, endpoint not called)");
        return;
    }

    let transport = match HttpTransport::new(
        &config.endpoint_url,
        config.http.timeout_seconds,
        &config.http.user_agent,
    ) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    };

    let mut session = FormSession::new(
        policy,
        limiter,
        classifier,
        RemoteSubmitClient::new(Arc::new(transport)),
    );
    session.set_language(&language);
    session.set_field(FieldKey::Name, &submission.name);
    session.set_field(FieldKey::Email, &submission.email);
    session.set_field(FieldKey::Phone, &submission.phone);
    session.set_field(FieldKey::Message, &submission.message);
    session.set_consent(submission.consent);
    if let Some(signals) = submission.device.clone() {
        session.set_device_signals(signals);
    }

    match session.submit().await {
        SubmitOutcome::Accepted => {
            println!("✅ Submission accepted by the endpoint");
        }
        SubmitOutcome::Invalid => {
            eprintln!("❌ Submission rejected by validation:");
            print_field_errors(&session.render_errors(&catalog));
            process::exit(1);
        }
        SubmitOutcome::RateLimited => {
            eprintln!("❌ Submission rate limited:");
            print_field_errors(&session.render_errors(&catalog));
            process::exit(1);
        }
        SubmitOutcome::Failed => {
            eprintln!("❌ Submission failed:");
            print_field_errors(&session.render_errors(&catalog));
            process::exit(1);
        }
        SubmitOutcome::Ignored => {
            eprintln!("❌ Submission was not attempted");
            process::exit(1);
        }
    }
}

/// Sanitized form for the dry-run path, mirroring what the session does
/// on each field edit.
fn sanitized_form(submission: &SubmissionFile) -> FormState {
    FormState {
        name: sanitize(FieldClass::FreeText, &submission.name),
        email: sanitize(FieldClass::Email, &submission.email),
        message: sanitize(FieldClass::FreeText, &submission.message),
        phone: sanitize(FieldClass::Phone, &submission.phone),
        consent: submission.consent,
    }
}
