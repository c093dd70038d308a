//! Error reporting and panic boundaries
//!
//! Every externally triggered entry point runs behind one of the boundaries
//! here, so a panic anywhere in the pipeline turns into a typed `AppError`
//! instead of taking the process down.

use std::any::Any;
use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{error, info, warn};

use super::{AppError, Result, Severity};

/// Log a non-critical error with the caller's description of what was going on
pub fn handle_error(err: &AppError, context: &str) {
    log_with_context(err, context, false);
}

/// Log a critical error together with a stack trace
///
/// Never exits the process; the caller decides what to do next.
pub fn handle_critical_error(err: &AppError, context: &str) {
    log_with_context(err, context, true);
    if err.is_critical() {
        error!(context = %context, "Critical error, application may need to shut down");
    }
}

pub fn log_error(err: &AppError) {
    log_with_context(err, "", false);
}

/// Whether any error in the source chain is a retryable `AppError`
pub fn is_retryable_error(err: &(dyn std::error::Error + 'static)) -> bool {
    find_app_error(err).is_some_and(AppError::is_retryable)
}

pub fn is_critical_error(err: &(dyn std::error::Error + 'static)) -> bool {
    find_app_error(err).is_some_and(AppError::is_critical)
}

fn find_app_error<'a>(err: &'a (dyn std::error::Error + 'static)) -> Option<&'a AppError> {
    std::iter::successors(Some(err), |e| e.source()).find_map(|e| e.downcast_ref::<AppError>())
}

/// Render a context map as `key=value` pairs, sorted by key
pub fn format_context(context: &HashMap<String, serde_json::Value>) -> String {
    let mut entries: Vec<_> = context.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
        .into_iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(s) => format!("{}={}", key, s),
            other => format!("{}={}", key, other),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn stack_trace() -> String {
    Backtrace::force_capture().to_string()
}

/// One log line: `[SEVERITY] | [component] | [CODE] | message | Context: .. | Details: .. | Cause: ..`
fn describe(err: &AppError, context: &str) -> String {
    let mut parts = vec![format!("[{}]", err.severity)];
    if !err.component.is_empty() {
        parts.push(format!("[{}]", err.component));
    }
    parts.push(format!("[{}]", err.code));
    parts.push(err.message.clone());
    if !context.is_empty() {
        parts.push(format!("Context: {}", context));
    }
    if !err.context.is_empty() {
        parts.push(format!("Details: {}", format_context(&err.context)));
    }
    if let Some(cause) = &err.cause {
        parts.push(format!("Cause: {}", cause));
    }
    parts.join(" | ")
}

fn log_with_context(err: &AppError, context: &str, include_stack_trace: bool) {
    let line = describe(err, context);
    match err.severity {
        Severity::Info => info!(code = %err.code, component = %err.component, "{}", line),
        Severity::Warning => warn!(code = %err.code, component = %err.component, "{}", line),
        Severity::Error | Severity::Critical => {
            error!(code = %err.code, component = %err.component, "{}", line)
        }
    }

    if include_stack_trace || err.is_critical() {
        error!("Stack trace: {}", stack_trace());
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Convert a recovered panic payload into the typed envelope
pub fn panic_to_error(payload: Box<dyn Any + Send>, operation: &str) -> AppError {
    let value = panic_message(payload.as_ref());
    AppError::transaction("recovered from panic")
        .caused_by(format!("panic: {}", value))
        .with_context("panic_value", value)
        .with_context("stack_trace", stack_trace())
        .with_context("operation", operation)
}

/// Run a synchronous closure, converting a panic into an `AppError`
pub fn safe_execute<T, F>(operation: &str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let err = panic_to_error(payload, operation);
            handle_error(&err, operation);
            Err(err)
        }
    }
}

/// Run a future on its own task, converting a panic into an `AppError`
///
/// Cancellation of the task (runtime shutdown) is reported the same way,
/// without a panic value.
pub async fn guard<T, F>(operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(fut).await {
        Ok(result) => result,
        Err(join_err) if join_err.is_panic() => {
            let err = panic_to_error(join_err.into_panic(), operation);
            handle_error(&err, operation);
            Err(err)
        }
        Err(join_err) => {
            let err = AppError::transaction("task cancelled")
                .caused_by(join_err)
                .with_context("operation", operation);
            handle_error(&err, operation);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_format_context_is_sorted() {
        let mut context = HashMap::new();
        context.insert("user".to_string(), serde_json::json!("budi"));
        context.insert("attempt".to_string(), serde_json::json!(3));
        assert_eq!(format_context(&context), "attempt=3, user=budi");
        assert_eq!(format_context(&HashMap::new()), "");
    }

    #[test]
    fn test_describe_includes_all_parts() {
        let err = AppError::ledger("append failed")
            .caused_by("quota exceeded")
            .with_context("category", "Groceries");
        let line = describe(&err, "saving transaction");
        assert_eq!(
            line,
            "[ERROR] | [ledger] | [LEDGER_ERROR] | append failed | Context: saving transaction | Details: category=Groceries | Cause: quota exceeded"
        );
    }

    #[test]
    fn test_is_retryable_error_walks_chain() {
        let inner = AppError::timeout("slow");
        assert!(is_retryable_error(&inner));

        let outer = AppError::transaction("processing failed").caused_by(inner);
        // The outer code is not retryable, so the first AppError found wins
        assert!(!is_retryable_error(&outer));

        let io = std::io::Error::new(std::io::ErrorKind::Other, "plain");
        assert!(!is_retryable_error(&io));
    }

    #[test]
    fn test_is_critical_error() {
        assert!(is_critical_error(&AppError::config("missing token")));
        assert!(!is_critical_error(&AppError::network("flaky")));
    }

    #[test]
    fn test_safe_execute_passes_through() {
        let ok: Result<i32> = safe_execute("ok", || Ok(7));
        assert_eq!(ok.unwrap(), 7);

        let err: Result<i32> = safe_execute("err", || Err(AppError::validation("bad")));
        assert_eq!(err.unwrap_err().code, ErrorCode::Validation);
    }

    #[test]
    fn test_safe_execute_recovers_panic() {
        let result: Result<()> = safe_execute("parse candidates", || panic!("boom"));
        let err = result.unwrap_err();
        assert_eq!(err.code, ErrorCode::Transaction);
        assert_eq!(err.message, "recovered from panic");
        assert_eq!(err.context["panic_value"], "boom");
        assert_eq!(err.context["operation"], "parse candidates");
        assert!(err.context.contains_key("stack_trace"));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_guard_recovers_async_panic() {
        let result: Result<()> = guard("process text", async {
            let amount: Option<&str> = None;
            if amount.is_none() {
                panic!("no amount: {:?}", amount);
            }
            Ok(())
        })
        .await;
        let err = result.unwrap_err();
        assert_eq!(err.context["panic_value"], "no amount: None");
        assert_eq!(err.context["operation"], "process text");
    }

    #[tokio::test]
    async fn test_guard_passes_through_result() {
        let result = guard("noop", async { Ok::<_, AppError>("done") }).await;
        assert_eq!(result.unwrap(), "done");
    }
}
