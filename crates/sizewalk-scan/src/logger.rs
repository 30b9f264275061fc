//! Diagnostic logging capability for the scanner.

use std::fmt;
use std::sync::Arc;

/// A structured key/value pair attached to a log message.
pub type Field<'a> = (&'static str, &'a dyn fmt::Display);

/// Four-level logger injected into the scanner.
///
/// Used only for diagnostics; nothing the scanner decides depends on it.
pub trait ScanLogger: Send + Sync {
    fn debug(&self, message: &str, fields: &[Field<'_>]);
    fn info(&self, message: &str, fields: &[Field<'_>]);
    fn warn(&self, message: &str, fields: &[Field<'_>]);
    fn error(&self, message: &str, fields: &[Field<'_>]);
}

impl<L: ScanLogger + ?Sized> ScanLogger for &L {
    fn debug(&self, message: &str, fields: &[Field<'_>]) {
        (**self).debug(message, fields)
    }
    fn info(&self, message: &str, fields: &[Field<'_>]) {
        (**self).info(message, fields)
    }
    fn warn(&self, message: &str, fields: &[Field<'_>]) {
        (**self).warn(message, fields)
    }
    fn error(&self, message: &str, fields: &[Field<'_>]) {
        (**self).error(message, fields)
    }
}

impl<L: ScanLogger + ?Sized> ScanLogger for Arc<L> {
    fn debug(&self, message: &str, fields: &[Field<'_>]) {
        (**self).debug(message, fields)
    }
    fn info(&self, message: &str, fields: &[Field<'_>]) {
        (**self).info(message, fields)
    }
    fn warn(&self, message: &str, fields: &[Field<'_>]) {
        (**self).warn(message, fields)
    }
    fn error(&self, message: &str, fields: &[Field<'_>]) {
        (**self).error(message, fields)
    }
}

/// Forwards scanner diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl ScanLogger for TracingLogger {
    fn debug(&self, message: &str, fields: &[Field<'_>]) {
        tracing::debug!(target: "sizewalk::scan", context = %Context(fields), "{message}");
    }

    fn info(&self, message: &str, fields: &[Field<'_>]) {
        tracing::info!(target: "sizewalk::scan", context = %Context(fields), "{message}");
    }

    fn warn(&self, message: &str, fields: &[Field<'_>]) {
        tracing::warn!(target: "sizewalk::scan", context = %Context(fields), "{message}");
    }

    fn error(&self, message: &str, fields: &[Field<'_>]) {
        tracing::error!(target: "sizewalk::scan", context = %Context(fields), "{message}");
    }
}

/// Renders fields as `key=value key=value`.
pub struct Context<'a>(pub &'a [Field<'a>]);

impl fmt::Display for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
