pub mod config;
pub mod device;
pub mod phone;
pub mod rate_limit;
pub mod sanitize;
pub mod session;
pub mod submit;
pub mod translations;
pub mod validate;

pub use config::Config;
pub use device::{DeviceClassifier, DeviceSignals};
pub use rate_limit::{FileStore, MemoryStore, RateLimiter, SystemClock};
pub use session::{FormSession, FormState, SessionStatus, SubmitOutcome};
pub use submit::{HttpTransport, RemoteSubmitClient, SubmitPayload};
pub use translations::{MessageCatalog, MessageKey};
pub use validate::{FieldErrors, FieldKey, ValidationPolicy};
