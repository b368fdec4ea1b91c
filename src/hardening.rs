//! Security hardening layer: sensitive-value redaction, environment-driven
//! log suppression, a transport security flag and a storage audit. Installed
//! once per process through an explicit sink (dependency injection), never by
//! patching a global logger in place. No state machine here — one instance,
//! cross-cutting, configured at startup.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::Environment;

pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Sensitive key names whose values must never reach a sink or a URL log.
/// Longer alternatives first so `token` cannot shadow `access_token`.
const SENSITIVE_KEYS: &str = "access_token|refresh_token|api_key|device_id|token|secret";

/// Markers that let a line through the development filter. Everything else is
/// considered noise, including non-critical warnings.
const CRITICAL_MARKERS: [&str; 4] = ["error", "security", "type", "reference"];

/// Plaintext key names that should never sit in durable client storage.
const DISALLOWED_STORAGE_KEYS: [&str; 3] = ["password", "secret", "api_key"];

static QUERY_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r#"(?i)\b({SENSITIVE_KEYS})=([^&\s"']*)"#)).unwrap());
static JSON_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r#"(?i)"({SENSITIVE_KEYS})"\s*:\s*"[^"]*""#)).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

/// Where filtered, redacted lines end up. The default forwards to `tracing`;
/// tests inject a capturing sink.
pub trait LogSink: Send + Sync {
    fn emit(&self, level: LogLevel, line: &str);
}

pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, level: LogLevel, line: &str) {
        match level {
            LogLevel::Error => error!(target: "fitgate::hardening", "{line}"),
            LogLevel::Warn => warn!(target: "fitgate::hardening", "{line}"),
            LogLevel::Info => info!(target: "fitgate::hardening", "{line}"),
            LogLevel::Debug => debug!(target: "fitgate::hardening", "{line}"),
        }
    }
}

/// Replace sensitive values in `key=value` and `"key":"value"` forms before
/// the text is observable anywhere.
pub fn redact(input: &str) -> String {
    let pass1 = QUERY_FORM.replace_all(input, format!("$1={REDACTION_MARKER}"));
    JSON_FORM.replace_all(&pass1, format!(r#""$1":"{REDACTION_MARKER}""#)).into_owned()
}

pub struct Hardening {
    environment: Environment,
    sink: Box<dyn LogSink>,
    transport_secure: AtomicBool,
}

static INSTANCE: OnceCell<Hardening> = OnceCell::new();

/// Process-wide install. Idempotent: repeat calls return the existing
/// instance and perform no further side effects.
pub fn init(environment: Environment) -> &'static Hardening {
    init_with_sink(environment, Box::new(TracingSink))
}

pub fn init_with_sink(environment: Environment, sink: Box<dyn LogSink>) -> &'static Hardening {
    INSTANCE.get_or_init(|| Hardening::new(environment, sink))
}

pub fn installed() -> Option<&'static Hardening> { INSTANCE.get() }

impl Hardening {
    /// Direct construction, for embedding and tests. Most callers want
    /// [`init`].
    pub fn new(environment: Environment, sink: Box<dyn LogSink>) -> Self {
        Self { environment, sink, transport_secure: AtomicBool::new(true) }
    }

    pub fn environment(&self) -> Environment { self.environment }

    /// Redact, then apply the suppression policy, then emit. Production
    /// silences every sink line; development passes only critical-marked
    /// lines and drops the rest.
    pub fn log(&self, level: LogLevel, line: &str) {
        if self.environment.is_production() {
            return;
        }
        let clean = redact(line);
        if !is_critical(&clean) {
            return;
        }
        self.sink.emit(level, &clean);
    }

    /// Record whether the app origin uses an encrypted transport. Loopback
    /// origins are treated as secure for local development. An insecure
    /// origin flips the observable flag and emits a security-marked line
    /// rather than silently proceeding.
    pub fn check_transport(&self, origin: &str) -> bool {
        let secure = origin.starts_with("https://") || origin.starts_with("wss://") || is_loopback(origin);
        self.transport_secure.store(secure, Ordering::Relaxed);
        if !secure {
            self.log(LogLevel::Error, &format!("security: insecure transport for origin {origin}"));
        }
        secure
    }

    pub fn is_transport_secure(&self) -> bool {
        self.transport_secure.load(Ordering::Relaxed)
    }

    /// Advisory scan of the durable storage root for plaintext key names that
    /// should not exist there. Warns and counts; never blocks operation.
    pub fn audit_storage(&self, root: &Path) -> usize {
        let mut findings = 0usize;
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_ascii_lowercase();
            if DISALLOWED_STORAGE_KEYS.iter().any(|k| name.contains(k)) {
                findings += 1;
                self.log(
                    LogLevel::Warn,
                    &format!("security: plaintext credential material in client storage: {}", entry.path().display()),
                );
            }
        }
        findings
    }
}

fn is_critical(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    CRITICAL_MARKERS.iter().any(|m| lower.contains(m))
}

fn is_loopback(origin: &str) -> bool {
    match reqwest::Url::parse(origin) {
        Ok(url) => matches!(url.host_str(), Some("localhost") | Some("127.0.0.1") | Some("[::1]") | Some("::1")),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct CaptureSink {
        lines: Arc<Mutex<Vec<String>>>,
    }

    impl LogSink for CaptureSink {
        fn emit(&self, _level: LogLevel, line: &str) {
            self.lines.lock().push(line.to_string());
        }
    }

    #[test]
    fn redacts_query_form() {
        assert_eq!(redact("token=abc123&other=1"), "token=[REDACTED]&other=1");
        assert_eq!(redact("?access_token=xyz"), "?access_token=[REDACTED]");
        assert_eq!(redact("api_key=k&refresh_token=r"), "api_key=[REDACTED]&refresh_token=[REDACTED]");
    }

    #[test]
    fn redacts_json_form() {
        assert_eq!(redact(r#"{"token": "abc", "id": 4}"#), r#"{"token":"[REDACTED]", "id": 4}"#);
        assert_eq!(redact(r#"{"secret":"s3cr3t"}"#), r#"{"secret":"[REDACTED]"}"#);
    }

    #[test]
    fn redaction_leaves_benign_text_alone() {
        assert_eq!(redact("user=ade&plan=gold"), "user=ade&plan=gold");
        assert_eq!(redact("tokenizer=fast"), "tokenizer=fast");
    }

    #[test]
    fn production_silences_everything() {
        let sink = CaptureSink::default();
        let h = Hardening::new(Environment::Production, Box::new(sink.clone()));
        h.log(LogLevel::Error, "error: credential rejected");
        assert!(sink.lines.lock().is_empty());
    }

    #[test]
    fn development_passes_only_critical_markers() {
        let sink = CaptureSink::default();
        let h = Hardening::new(Environment::Development, Box::new(sink.clone()));
        h.log(LogLevel::Warn, "slow render detected"); // noise, dropped
        h.log(LogLevel::Error, "TypeError: undefined role"); // type marker
        h.log(LogLevel::Error, "security: insecure transport"); // security marker
        let lines = sink.lines.lock();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("TypeError"));
    }

    #[test]
    fn emitted_lines_are_redacted() {
        let sink = CaptureSink::default();
        let h = Hardening::new(Environment::Development, Box::new(sink.clone()));
        h.log(LogLevel::Error, "error: refresh failed token=abc123");
        assert_eq!(sink.lines.lock()[0], "error: refresh failed token=[REDACTED]");
    }

    #[test]
    fn transport_flag_is_observable() {
        let sink = CaptureSink::default();
        let h = Hardening::new(Environment::Development, Box::new(sink.clone()));
        assert!(h.check_transport("https://studio.fit"));
        assert!(h.is_transport_secure());
        assert!(h.check_transport("http://localhost:3000")); // loopback exempt
        assert!(!h.check_transport("http://studio.fit"));
        assert!(!h.is_transport_secure());
        assert!(sink.lines.lock().iter().any(|l| l.contains("insecure transport")));
    }

    #[test]
    fn storage_audit_flags_disallowed_names() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("password.txt"), "hunter2").unwrap();
        std::fs::write(tmp.path().join("user.json"), "{}").unwrap();
        let nested = tmp.path().join("cache");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("api_key"), "k").unwrap();

        let sink = CaptureSink::default();
        let h = Hardening::new(Environment::Development, Box::new(sink.clone()));
        assert_eq!(h.audit_storage(tmp.path()), 2);
        assert_eq!(sink.lines.lock().len(), 2);
    }

    #[test]
    fn global_install_is_idempotent() {
        let first = init(Environment::Development) as *const Hardening;
        let second = init(Environment::Production) as *const Hardening;
        assert_eq!(first, second);
        assert_eq!(installed().unwrap().environment(), Environment::Development);
    }
}
