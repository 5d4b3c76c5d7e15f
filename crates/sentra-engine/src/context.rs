use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

/// Per-invocation evaluation context, constructed fresh by the caller for
/// every cycle.
///
/// `now` anchors relative time ranges so an evaluation is deterministic under
/// test. `cancel` is checked by the engine before each query part is issued;
/// a canceled context aborts with the timeout error rather than an empty
/// result. `debug` only adds trace output — it must never change the
/// computed result.
#[derive(Debug, Clone)]
pub struct EvalContext {
    pub now: DateTime<Utc>,
    pub cancel: CancellationToken,
    pub debug: bool,
}

impl EvalContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            cancel: CancellationToken::new(),
            debug: false,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}
