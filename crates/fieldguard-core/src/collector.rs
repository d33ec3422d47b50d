//! Request-scoped error collection.

use crate::error::{BoxError, Result, ValidatorError};
use crate::registry::BoxFuture;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Output formatter: display param, message, original value.
pub type ErrorFormatter = Arc<dyn Fn(&str, &str, Option<&Value>) -> Value + Send + Sync>;

/// `{ "param", "msg", "value" }`; `value` is omitted when the field was absent.
pub fn default_formatter(param: &str, msg: &str, value: Option<&Value>) -> Value {
    let mut out = Map::new();
    out.insert("param".into(), Value::String(param.to_string()));
    out.insert("msg".into(), Value::String(msg.to_string()));
    if let Some(value) = value {
        out.insert("value".into(), value.clone());
    }
    Value::Object(out)
}

/// One failed validator call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    /// Display form of the field path
    pub param: String,
    pub msg: String,
    /// Value under test; `None` when the field was absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl ErrorRecord {
    pub fn new(param: impl Into<String>, msg: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            param: param.into(),
            msg: msg.into(),
            value,
        }
    }

    pub fn format(&self, formatter: &ErrorFormatter) -> Value {
        formatter(&self.param, &self.msg, self.value.as_ref())
    }
}

/// Formatted errors, as a list or keyed by param.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ValidationErrors {
    List(Vec<Value>),
    Mapped(IndexMap<String, Value>),
}

impl ValidationErrors {
    pub(crate) fn build(records: &[ErrorRecord], mapped: bool, formatter: &ErrorFormatter) -> Self {
        if mapped {
            let mut map = IndexMap::with_capacity(records.len());
            for record in records {
                map.insert(record.param.clone(), record.format(formatter));
            }
            ValidationErrors::Mapped(map)
        } else {
            ValidationErrors::List(records.iter().map(|r| r.format(formatter)).collect())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ValidationErrors::List(list) => list.len(),
            ValidationErrors::Mapped(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            ValidationErrors::List(list) => Some(list),
            ValidationErrors::Mapped(_) => None,
        }
    }

    pub fn as_mapped(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            ValidationErrors::Mapped(map) => Some(map),
            ValidationErrors::List(_) => None,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            ValidationErrors::List(list) => Value::Array(list),
            ValidationErrors::Mapped(map) => Value::Object(map.into_iter().collect()),
        }
    }
}

/// Handle to a registered error, used to replace its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ErrorId(u64);

struct PendingCheck {
    id: ErrorId,
    future: BoxFuture<Result<bool, BoxError>>,
    record: ErrorRecord,
}

#[derive(Default)]
struct CollectorState {
    resolved: Vec<(ErrorId, ErrorRecord)>,
    pending: Vec<PendingCheck>,
    next_id: u64,
    fault: Option<ValidatorError>,
}

impl CollectorState {
    fn next_id(&mut self) -> ErrorId {
        let id = ErrorId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Accumulates every failure of one request.
///
/// Synchronous failures are recorded as they happen. Asynchronous checks are
/// kept pending, with the record they produce on failure, until
/// [`resolve`](Self::resolve) awaits them one at a time in registration order.
#[derive(Clone, Default)]
pub struct ErrorCollector {
    state: Arc<Mutex<CollectorState>>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CollectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn register_sync(&self, record: ErrorRecord) -> ErrorId {
        let mut state = self.lock();
        let id = state.next_id();
        state.resolved.push((id, record));
        id
    }

    pub(crate) fn register(
        &self,
        future: BoxFuture<Result<bool, BoxError>>,
        record: ErrorRecord,
    ) -> ErrorId {
        let mut state = self.lock();
        let id = state.next_id();
        state.pending.push(PendingCheck { id, future, record });
        id
    }

    /// Replace the message of a registered error, keeping its position.
    pub(crate) fn replace_message(&self, id: ErrorId, msg: &str) {
        let mut state = self.lock();
        if let Some((_, record)) = state.resolved.iter_mut().find(|(i, _)| *i == id) {
            record.msg = msg.to_string();
        } else if let Some(check) = state.pending.iter_mut().find(|c| c.id == id) {
            check.record.msg = msg.to_string();
        }
    }

    /// Remember a programming fault; only the first one is kept.
    pub(crate) fn record_fault(&self, fault: ValidatorError) {
        let mut state = self.lock();
        if state.fault.is_none() {
            state.fault = Some(fault);
        }
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Await pending checks and return every failure in order.
    ///
    /// Pending checks are drained, so a second call does not run them again.
    pub async fn resolve(&self) -> Result<Vec<ErrorRecord>> {
        let fault = self.lock().fault.clone();
        if let Some(fault) = fault {
            return Err(fault);
        }

        let pending = std::mem::take(&mut self.lock().pending);
        let awaited = pending.len();
        for check in pending {
            let valid = match check.future.await {
                Ok(valid) => valid,
                Err(err) => {
                    trace_warn!(param = %check.record.param, error = %err, "async validator rejected");
                    false
                }
            };
            if !valid {
                self.lock().resolved.push((check.id, check.record));
            }
        }

        let records: Vec<ErrorRecord> = self
            .lock()
            .resolved
            .iter()
            .map(|(_, record)| record.clone())
            .collect();
        trace_debug!(
            errors = records.len(),
            awaited = awaited,
            "validation errors resolved"
        );
        Ok(records)
    }
}

impl fmt::Debug for ErrorCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ErrorCollector")
            .field("resolved", &state.resolved.len())
            .field("pending", &state.pending.len())
            .field("fault", &state.fault)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(param: &str, msg: &str) -> ErrorRecord {
        ErrorRecord::new(param, msg, Some(json!("x")))
    }

    fn ready(valid: bool) -> BoxFuture<Result<bool, BoxError>> {
        Box::pin(async move { Ok::<_, BoxError>(valid) })
    }

    #[tokio::test]
    async fn sync_records_come_before_async_ones() {
        let collector = ErrorCollector::new();
        collector.register(ready(false), record("a", "async"));
        collector.register_sync(record("b", "sync"));
        collector.register(ready(true), record("c", "passes"));

        let msgs: Vec<_> = collector
            .resolve()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.msg)
            .collect();
        assert_eq!(msgs, ["sync", "async"]);
    }

    #[tokio::test]
    async fn replace_message_keeps_position() {
        let collector = ErrorCollector::new();
        collector.register_sync(record("a", "first"));
        let id = collector.register_sync(record("b", "second"));
        collector.register_sync(record("c", "third"));
        collector.replace_message(id, "custom");

        let msgs: Vec<_> = collector
            .resolve()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.msg)
            .collect();
        assert_eq!(msgs, ["first", "custom", "third"]);
    }

    #[tokio::test]
    async fn rejected_async_check_is_a_failure() {
        let collector = ErrorCollector::new();
        let id = collector.register(
            Box::pin(async { Err::<bool, BoxError>("lookup failed".into()) }),
            record("email", "Invalid value"),
        );
        collector.replace_message(id, "taken");

        let errors = collector.resolve().await.unwrap();
        assert_eq!(errors, vec![record("email", "taken")]);
        assert_eq!(collector.pending_count(), 0);
        assert_eq!(collector.resolve().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn first_fault_wins() {
        let collector = ErrorCollector::new();
        collector.record_fault(ValidatorError::NotInstalled);
        collector.record_fault(ValidatorError::InvalidSchema("x".into()));
        assert_eq!(
            collector.resolve().await.unwrap_err(),
            ValidatorError::NotInstalled
        );
    }

    #[test]
    fn mapped_output_keeps_first_position_and_last_value() {
        let formatter: ErrorFormatter = Arc::new(default_formatter);
        let records = [record("a", "1"), record("b", "2"), record("a", "3")];
        let mapped = ValidationErrors::build(&records, true, &formatter);
        let map = mapped.as_mapped().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(map["a"]["msg"], json!("3"));
    }

    #[test]
    fn default_formatter_omits_absent_values() {
        assert_eq!(
            default_formatter("id", "Invalid value", None),
            json!({"param": "id", "msg": "Invalid value"})
        );
    }
}
