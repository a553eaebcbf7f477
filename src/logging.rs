//! Tracing subscriber setup
//!
//! Staged image URLs are often pre-signed, so everything written to the log
//! goes through a writer that masks credentials first.

use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting sensitive data
pub struct RedactionPatterns {
    signed_query: Regex,
    bearer: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            signed_query: Regex::new(
                r"(?i)([?&](?:x-amz-signature|x-amz-credential|x-amz-security-token|access_token|token|sig)=)[^&\s'\x22]+",
            )?,
            bearer: Regex::new(r"(Bearer )[A-Za-z0-9._~+/-]+=*")?,
        })
    }

    /// Mask credentials in `input`
    #[must_use]
    pub fn redact(&self, input: &str) -> String {
        let output = self.signed_query.replace_all(input, "${1}[MASKED]");
        self.bearer
            .replace_all(&output, "${1}[MASKED]")
            .into_owned()
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // Report the original length; the redacted text may differ in size
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: (self.make_inner)(),
            patterns: self.patterns.clone(),
        }
    }
}

/// Install the global subscriber: `RUST_LOG` filter (default `info`),
/// redacted output on stderr.
///
/// # Errors
///
/// Returns an error if the redaction patterns fail to compile.
pub fn init_tracing() -> Result<(), regex::Error> {
    let patterns = Arc::new(RedactionPatterns::new()?);
    let make_writer = RedactingMakeWriter {
        make_inner: io::stderr,
        patterns,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
    Ok(())
}
