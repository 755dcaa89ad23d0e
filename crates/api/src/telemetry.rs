//! Tracing bootstrap with sensitive-field redaction.
//!
//! Log events carry structured fields. Before a field is written, its name is
//! checked against a deny-list; denied values are replaced with
//! [`REDACTED`]. Only field names are inspected, so a secret must be logged
//! under a denied name to be hidden.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::field::MakeExt;
use tracing_subscriber::fmt::format::{FormatFields, Writer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use crate::config::Config;

/// Replacement text for denied field values.
pub const REDACTED: &str = "[REDACTED]";

/// Field names redacted regardless of configuration.
pub const DEFAULT_REDACTED_FIELDS: &[&str] = &[
    "password",
    "password_hash",
    "token",
    "secret",
    "authorization",
    "cookie",
];

/// Case-insensitive deny-list of field names.
#[derive(Debug, Clone)]
pub struct Redactor {
    denied: Arc<[String]>,
}

impl Redactor {
    /// Builds a redactor that denies exactly `fields`.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut denied: Vec<String> = fields
            .into_iter()
            .map(|f| f.as_ref().trim().to_ascii_lowercase())
            .filter(|f| !f.is_empty())
            .collect();
        denied.sort();
        denied.dedup();
        Self {
            denied: denied.into(),
        }
    }

    /// The default deny-list extended with `extra`.
    pub fn with_defaults<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extra: Vec<String> = extra.into_iter().map(|f| f.as_ref().to_string()).collect();
        Self::new(
            DEFAULT_REDACTED_FIELDS
                .iter()
                .map(|f| f.to_string())
                .chain(extra),
        )
    }

    pub fn is_denied(&self, field: &str) -> bool {
        self.denied.iter().any(|d| d.eq_ignore_ascii_case(field))
    }

    /// Returns `value`, or [`REDACTED`] when `field` is denied.
    pub fn redact<'a>(&self, field: &str, value: &'a str) -> &'a str {
        if self.is_denied(field) { REDACTED } else { value }
    }

    /// A field formatter that writes `name=value` pairs, masking denied
    /// fields.
    pub fn field_formatter(&self) -> impl for<'w> FormatFields<'w> + Send + Sync + 'static {
        let redactor = self.clone();
        tracing_subscriber::fmt::format::debug_fn(
            move |writer: &mut Writer<'_>,
                  field: &tracing::field::Field,
                  value: &dyn std::fmt::Debug| {
                if redactor.is_denied(field.name()) {
                    write!(writer, "{}={}", field.name(), REDACTED)
                } else if field.name() == "message" {
                    write!(writer, "{value:?}")
                } else {
                    write!(writer, "{}={:?}", field.name(), value)
                }
            },
        )
        .delimited(" ")
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::with_defaults(std::iter::empty::<&str>())
    }
}

/// Installs the global subscriber: an `EnvFilter` from `RUST_LOG` (falling
/// back to the configured level) and a redacting `fmt` layer.
pub fn init_tracing(config: &Config) -> Result<(), TryInitError> {
    let redactor = Redactor::with_defaults(&config.redact_fields);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().fmt_fields(redactor.field_formatter()))
        .try_init()
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(redactor: &Redactor, emit: impl FnOnce()) -> String {
        let out = Captured::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(move || writer.clone())
                .fmt_fields(redactor.field_formatter()),
        );
        tracing::subscriber::with_default(subscriber, emit);
        out.text()
    }

    #[test]
    fn test_defaults_are_denied_case_insensitively() {
        let redactor = Redactor::default();
        assert!(redactor.is_denied("password"));
        assert!(redactor.is_denied("Authorization"));
        assert!(redactor.is_denied("PASSWORD_HASH"));
        assert!(!redactor.is_denied("email"));
    }

    #[test]
    fn test_extra_fields_extend_defaults() {
        let redactor = Redactor::with_defaults(["api_key"]);
        assert!(redactor.is_denied("API_KEY"));
        assert!(redactor.is_denied("token"));
        assert_eq!(redactor.redact("api_key", "abc"), REDACTED);
        assert_eq!(redactor.redact("user_id", "abc"), "abc");
    }

    #[test]
    fn test_empty_names_are_ignored() {
        let redactor = Redactor::new(["", "  "]);
        assert!(!redactor.is_denied(""));
    }

    #[test]
    fn test_formatter_masks_denied_fields() {
        let redactor = Redactor::default();
        let output = capture(&redactor, || {
            tracing::info!(
                email = "ada@example.com",
                password = "hunter22",
                token = %"abc.def",
                "login attempt"
            );
        });

        assert!(output.contains("login attempt"));
        assert!(output.contains("email=\"ada@example.com\""));
        assert!(output.contains("password=[REDACTED]"));
        assert!(output.contains("token=[REDACTED]"));
        assert!(!output.contains("hunter22"));
        assert!(!output.contains("abc.def"));
    }

    #[test]
    fn test_formatter_masks_span_fields() {
        let redactor = Redactor::with_defaults(["session"]);
        let output = capture(&redactor, || {
            let span = tracing::info_span!("request", session = "s-123", path = "/v1/orders");
            let _guard = span.enter();
            tracing::info!("handled");
        });

        assert!(output.contains("session=[REDACTED]"));
        assert!(output.contains("path=\"/v1/orders\""));
        assert!(!output.contains("s-123"));
    }
}
