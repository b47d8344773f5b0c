use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref ANDROID_MODEL_RE: Regex = Regex::new(r"Android [0-9.]+; ([^;)]+)").unwrap();
    static ref APPLE_CHIP_RE: Regex =
        Regex::new(r"Apple (M\d+(?: (?:Pro|Max|Ultra))?)").unwrap();
}

fn default_pixel_ratio() -> f64 {
    1.0
}

/// Ambient environment signals reported by the submitting client.
///
/// Everything here is client-supplied and spoofable; the classifier
/// treats it as advisory telemetry only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSignals {
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default = "default_pixel_ratio")]
    pub pixel_ratio: f64,
    #[serde(default)]
    pub screen_width: u32,
    #[serde(default)]
    pub screen_height: u32,
    #[serde(default)]
    pub gpu_renderer: Option<String>,
}

impl Default for DeviceSignals {
    fn default() -> Self {
        Self {
            user_agent: String::new(),
            platform: String::new(),
            pixel_ratio: 1.0,
            screen_width: 0,
            screen_height: 0,
            gpu_renderer: None,
        }
    }
}

impl DeviceSignals {
    /// Physical pixel resolution, orientation-normalized to
    /// (shorter side, longer side).
    pub fn physical_resolution(&self) -> (u32, u32) {
        let w = (self.pixel_ratio * self.screen_width as f64).round() as u32;
        let h = (self.pixel_ratio * self.screen_height as f64).round() as u32;
        (w.min(h), w.max(h))
    }
}

/// One heuristic in the classification chain: a predicate over the
/// signals plus a label builder, tried in priority order.
pub trait DeviceResolver: Send + Sync {
    fn name(&self) -> &str;
    fn applies(&self, signals: &DeviceSignals) -> bool;
    fn label(&self, signals: &DeviceSignals) -> String;
}

/// Best-effort device labeling from user-agent and screen signals.
///
/// First matching resolver wins. Android is checked before Linux
/// because Android user agents also carry the "Linux" token.
pub struct DeviceClassifier {
    resolvers: Vec<Box<dyn DeviceResolver>>,
}

impl Default for DeviceClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceClassifier {
    pub fn new() -> Self {
        Self {
            resolvers: vec![
                Box::new(AppleMobileResolver),
                Box::new(AppleDesktopResolver),
                Box::new(AndroidResolver),
                Box::new(WindowsResolver),
                Box::new(LinuxResolver),
            ],
        }
    }

    /// Label for the submitting device, or a generic fallback. Never
    /// fails: unrecognized signals yield "Unknown device".
    pub fn classify(&self, signals: &DeviceSignals) -> String {
        for resolver in &self.resolvers {
            if resolver.applies(signals) {
                let label = resolver.label(signals);
                log::debug!("Device resolver '{}' matched: {label}", resolver.name());
                return label;
            }
        }
        log::debug!("No device resolver matched user agent: {}", signals.user_agent);
        "Unknown device".to_string()
    }
}

// Known physical resolutions in natural orientation. Client-reported
// screen geometry only narrows the model tier, it never identifies a
// unit.
const APPLE_MOBILE_MODELS: &[((u32, u32), &str)] = &[
    ((640, 960), "iPhone 4/4S"),
    ((640, 1136), "iPhone 5/5s/SE"),
    ((750, 1334), "iPhone 6/7/8/SE 2"),
    ((1080, 1920), "iPhone 6+/7+/8+"),
    ((828, 1792), "iPhone XR/11"),
    ((1125, 2436), "iPhone X/XS/11 Pro"),
    ((1242, 2688), "iPhone XS Max/11 Pro Max"),
    ((1080, 2340), "iPhone 12/13 mini"),
    ((1170, 2532), "iPhone 12/13/14"),
    ((1284, 2778), "iPhone 12/13 Pro Max/14 Plus"),
    ((1179, 2556), "iPhone 14 Pro/15/16"),
    ((1290, 2796), "iPhone 14 Pro Max/15 Plus/15 Pro Max"),
    ((1206, 2622), "iPhone 16 Pro"),
    ((1320, 2868), "iPhone 16 Pro Max"),
    ((1620, 2160), "iPad 10.2″"),
    ((1668, 2388), "iPad Pro 11″"),
    ((2048, 2732), "iPad Pro 12.9″"),
];

const MAC_MODELS: &[((u32, u32), &str)] = &[
    ((2560, 1600), "MacBook Air/Pro 13″"),
    ((2560, 1664), "MacBook Air 13″ (M2)"),
    ((2880, 1800), "MacBook Pro 15″"),
    ((2880, 1864), "MacBook Air 15″"),
    ((3024, 1964), "MacBook Pro 14″"),
    ((3456, 2234), "MacBook Pro 16″"),
    ((4480, 2520), "iMac 24″"),
    ((5120, 2880), "iMac 27″/Studio Display"),
];

fn lookup_model(
    table: &[((u32, u32), &'static str)],
    physical: (u32, u32),
) -> Option<&'static str> {
    table
        .iter()
        .find(|((w, h), _)| ((*w).min(*h), (*w).max(*h)) == physical)
        .map(|(_, label)| *label)
}

struct AppleMobileResolver;

impl DeviceResolver for AppleMobileResolver {
    fn name(&self) -> &str {
        "apple-mobile"
    }

    fn applies(&self, signals: &DeviceSignals) -> bool {
        ["iPhone", "iPad", "iPod"]
            .iter()
            .any(|token| signals.user_agent.contains(token))
    }

    fn label(&self, signals: &DeviceSignals) -> String {
        if let Some(model) = lookup_model(APPLE_MOBILE_MODELS, signals.physical_resolution()) {
            return model.to_string();
        }
        if signals.user_agent.contains("iPad") {
            "iPad".to_string()
        } else {
            "iPhone".to_string()
        }
    }
}

struct AppleDesktopResolver;

impl DeviceResolver for AppleDesktopResolver {
    fn name(&self) -> &str {
        "apple-desktop"
    }

    fn applies(&self, signals: &DeviceSignals) -> bool {
        signals.user_agent.contains("Macintosh") || signals.platform.starts_with("Mac")
    }

    fn label(&self, signals: &DeviceSignals) -> String {
        let base = lookup_model(MAC_MODELS, signals.physical_resolution()).unwrap_or("Mac");

        // Refine with the chip generation when the GPU renderer string
        // names one; missing or foreign renderer strings keep the base.
        match signals
            .gpu_renderer
            .as_deref()
            .and_then(|renderer| APPLE_CHIP_RE.captures(renderer))
            .and_then(|caps| caps.get(1))
        {
            Some(chip) => format!("{} (Apple {})", base, chip.as_str()),
            None => {
                log::debug!("No Apple chip generation in GPU renderer info");
                base.to_string()
            }
        }
    }
}

struct AndroidResolver;

impl DeviceResolver for AndroidResolver {
    fn name(&self) -> &str {
        "android"
    }

    fn applies(&self, signals: &DeviceSignals) -> bool {
        signals.user_agent.contains("Android")
    }

    fn label(&self, signals: &DeviceSignals) -> String {
        let token = ANDROID_MODEL_RE
            .captures(&signals.user_agent)
            .and_then(|caps| caps.get(1))
            .map(|m| {
                let token = m.as_str();
                // Some agents append a build tag to the model token.
                match token.find(" Build/") {
                    Some(idx) => token[..idx].trim(),
                    None => token.trim(),
                }
            });

        match token {
            // "K" is the privacy-reduced placeholder model.
            None | Some("") | Some("K") => "Android phone".to_string(),
            Some(model) => match brand_for_model(model) {
                Some(brand) => format!("{brand} {model}"),
                None => model.to_string(),
            },
        }
    }
}

/// Manufacturer inferred from well-known model-number prefixes. Tokens
/// that already spell their brand out pass through unchanged.
fn brand_for_model(model: &str) -> Option<&'static str> {
    const BRANDED: &[&str] = &[
        "samsung", "huawei", "vivo", "oppo", "realme", "moto", "nokia", "oneplus", "xiaomi",
        "lenovo",
    ];
    const PREFIXES: &[(&str, &str)] = &[
        ("SM-", "Samsung"),
        ("GT-", "Samsung"),
        ("Pixel", "Google"),
        ("Redmi", "Xiaomi"),
        ("Mi ", "Xiaomi"),
        ("POCO", "Xiaomi"),
        ("CPH", "OPPO"),
        ("RMX", "realme"),
    ];

    let lower = model.to_lowercase();
    if BRANDED.iter().any(|brand| lower.starts_with(brand)) {
        return None;
    }
    PREFIXES
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, brand)| *brand)
}

struct WindowsResolver;

impl DeviceResolver for WindowsResolver {
    fn name(&self) -> &str {
        "windows"
    }

    fn applies(&self, signals: &DeviceSignals) -> bool {
        signals.user_agent.contains("Windows")
    }

    fn label(&self, _signals: &DeviceSignals) -> String {
        "Windows PC".to_string()
    }
}

struct LinuxResolver;

impl DeviceResolver for LinuxResolver {
    fn name(&self) -> &str {
        "linux"
    }

    fn applies(&self, signals: &DeviceSignals) -> bool {
        signals.user_agent.contains("Linux") || signals.user_agent.contains("X11")
    }

    fn label(&self, _signals: &DeviceSignals) -> String {
        "Linux PC".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(user_agent: &str) -> DeviceSignals {
        DeviceSignals {
            user_agent: user_agent.to_string(),
            ..DeviceSignals::default()
        }
    }

    #[test]
    fn iphone_resolution_maps_to_model_tier() {
        let mut s = signals("Mozilla/5.0 (iPhone; CPU iPhone OS 16_5 like Mac OS X)");
        s.pixel_ratio = 3.0;
        s.screen_width = 390;
        s.screen_height = 844;

        let classifier = DeviceClassifier::new();
        assert_eq!(classifier.classify(&s), "iPhone 12/13/14");
    }

    #[test]
    fn unknown_apple_mobile_resolution_falls_back_to_family() {
        let mut s = signals("Mozilla/5.0 (iPad; CPU OS 15_0 like Mac OS X)");
        s.pixel_ratio = 2.0;
        s.screen_width = 123;
        s.screen_height = 456;

        let classifier = DeviceClassifier::new();
        assert_eq!(classifier.classify(&s), "iPad");
    }

    #[test]
    fn landscape_orientation_matches_the_same_model() {
        let mut s = signals("Mozilla/5.0 (iPhone; CPU iPhone OS 16_5 like Mac OS X)");
        s.pixel_ratio = 3.0;
        s.screen_width = 844;
        s.screen_height = 390;

        let classifier = DeviceClassifier::new();
        assert_eq!(classifier.classify(&s), "iPhone 12/13/14");
    }

    #[test]
    fn resolution_tables_resolve_known_panels() {
        assert_eq!(
            lookup_model(APPLE_MOBILE_MODELS, (1170, 2532)),
            Some("iPhone 12/13/14")
        );
        assert_eq!(
            lookup_model(MAC_MODELS, (1600, 2560)),
            Some("MacBook Air/Pro 13″")
        );
        assert_eq!(lookup_model(MAC_MODELS, (123, 456)), None);
    }

    #[test]
    fn mac_label_is_refined_with_chip_generation() {
        let mut s = signals("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)");
        s.pixel_ratio = 2.0;
        s.screen_width = 1512;
        s.screen_height = 982;
        s.gpu_renderer = Some("ANGLE (Apple, Apple M3 Pro, OpenGL 4.1)".to_string());

        let classifier = DeviceClassifier::new();
        assert_eq!(classifier.classify(&s), "MacBook Pro 14″ (Apple M3 Pro)");
    }

    #[test]
    fn mac_without_renderer_info_keeps_the_base_label() {
        let mut s = signals("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)");
        s.pixel_ratio = 2.0;
        s.screen_width = 1280;
        s.screen_height = 800;

        let classifier = DeviceClassifier::new();
        assert_eq!(classifier.classify(&s), "MacBook Air/Pro 13″");
    }

    #[test]
    fn unknown_mac_resolution_falls_back_to_generic() {
        let s = signals("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)");
        let classifier = DeviceClassifier::new();
        assert_eq!(classifier.classify(&s), "Mac");
    }

    #[test]
    fn samsung_model_number_gets_branded() {
        let s = signals("Mozilla/5.0 (Linux; Android 13; SM-G991B) AppleWebKit/537.36");
        let classifier = DeviceClassifier::new();
        assert_eq!(classifier.classify(&s), "Samsung SM-G991B");
    }

    #[test]
    fn pixel_model_gets_branded() {
        let s = signals("Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36");
        let classifier = DeviceClassifier::new();
        assert_eq!(classifier.classify(&s), "Google Pixel 8");
    }

    #[test]
    fn build_tag_is_stripped_from_the_model_token() {
        let s = signals("Mozilla/5.0 (Linux; Android 11; SM-A515F Build/RP1A.200720.012)");
        let classifier = DeviceClassifier::new();
        assert_eq!(classifier.classify(&s), "Samsung SM-A515F");
    }

    #[test]
    fn branded_token_is_not_double_prefixed() {
        let s = signals("Mozilla/5.0 (Linux; Android 12; OnePlus 9 Pro)");
        let classifier = DeviceClassifier::new();
        assert_eq!(classifier.classify(&s), "OnePlus 9 Pro");
    }

    #[test]
    fn privacy_reduced_agent_yields_generic_android() {
        let s = signals("Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36");
        let classifier = DeviceClassifier::new();
        assert_eq!(classifier.classify(&s), "Android phone");
    }

    #[test]
    fn android_wins_over_linux() {
        // Android agents carry "Linux" as well; priority order decides.
        let s = signals("Mozilla/5.0 (Linux; Android 13; SM-S911B)");
        let classifier = DeviceClassifier::new();
        assert_eq!(classifier.classify(&s), "Samsung SM-S911B");
    }

    #[test]
    fn desktop_families_get_fixed_labels() {
        let classifier = DeviceClassifier::new();
        assert_eq!(
            classifier.classify(&signals("Mozilla/5.0 (Windows NT 10.0; Win64; x64)")),
            "Windows PC"
        );
        assert_eq!(
            classifier.classify(&signals("Mozilla/5.0 (X11; Linux x86_64)")),
            "Linux PC"
        );
    }

    #[test]
    fn unrecognized_agent_yields_the_generic_fallback() {
        let classifier = DeviceClassifier::new();
        assert_eq!(classifier.classify(&signals("curl/8.4.0")), "Unknown device");
        assert_eq!(classifier.classify(&DeviceSignals::default()), "Unknown device");
    }
}
