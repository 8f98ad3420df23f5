//! The three host-facing operations.
//!
//! # Design
//! Arguments arrive positionally as loosely-typed values, the way a host
//! runtime passes them. `process_json` and `extract_fields` run on the
//! calling thread and always return a value: the result text or an
//! `{"error": ...}` object. `Bridge::make_request` returns a [`Promise`]
//! before any work starts; argument handling, request construction, I/O
//! and response shaping all run on a blocking worker. A second task awaits
//! the worker's join handle to release the in-flight slot, independent of
//! how (or whether) the worker settled the promise.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::runtime::{Handle, Runtime};
use uuid::Uuid;

use crate::envelope::ResponseEnvelope;
use crate::error::{BridgeError, ErrorOutcome};
use crate::extract;
use crate::normalize;
use crate::promise::{Promise, Resolver};
use crate::request::{coerce_text, RequestConfig, DEFAULT_METHOD};
use crate::transport::{Transport, UreqTransport};

/// Environment variable overriding the worker thread count.
pub const WORKERS_ENV: &str = "FETCHBRIDGE_WORKERS";

/// `processJSON(text)`: validate and re-encode a JSON payload.
pub fn process_json(args: &[Value]) -> Value {
    let Some(input) = args.first() else {
        return ErrorOutcome::from(BridgeError::MissingJsonInput).to_value();
    };
    match normalize::normalize(&coerce_text(input)) {
        Ok(text) => Value::String(text),
        Err(err) => ErrorOutcome::from(err).to_value(),
    }
}

/// `extractFields(text, fieldNames)`: project top-level keys.
pub fn extract_fields(args: &[Value]) -> Value {
    let [input, fields, ..] = args else {
        return ErrorOutcome::from(BridgeError::MissingArgs).to_value();
    };
    let names: Vec<String> = match fields {
        Value::Array(items) => items.iter().map(coerce_text).collect(),
        Value::String(single) => vec![single.clone()],
        _ => Vec::new(),
    };
    match extract::extract_fields(&coerce_text(input), &names) {
        Ok(text) => Value::String(text),
        Err(err) => ErrorOutcome::from(err).to_value(),
    }
}

/// Runtime settings for a [`Bridge`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Async worker threads; `None` uses the tokio default.
    pub worker_threads: Option<usize>,
}

impl BridgeOptions {
    /// Read `FETCHBRIDGE_WORKERS`; unset, unparsable or zero means default.
    pub fn from_env() -> Self {
        let worker_threads = std::env::var(WORKERS_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n > 0);
        Self { worker_threads }
    }
}

/// Owns the worker runtime and the shared transport for `makeRequest`.
pub struct Bridge {
    runtime: Option<Runtime>,
    handle: Handle,
    transport: Arc<dyn Transport>,
    in_flight: Arc<AtomicUsize>,
}

impl Bridge {
    pub fn new() -> Result<Self, BridgeError> {
        Self::with_options(BridgeOptions::default())
    }

    pub fn with_options(options: BridgeOptions) -> Result<Self, BridgeError> {
        Self::with_transport(options, Arc::new(UreqTransport::new()))
    }

    /// Build a bridge that executes requests through `transport`.
    pub fn with_transport(
        options: BridgeOptions,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, BridgeError> {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.thread_name("fetchbridge-worker").enable_all();
        if let Some(n) = options.worker_threads.filter(|n| *n > 0) {
            builder.worker_threads(n);
        }
        let runtime = builder
            .build()
            .map_err(|e| BridgeError::Runtime(e.to_string()))?;
        let handle = runtime.handle().clone();
        tracing::debug!(workers = ?options.worker_threads, "bridge runtime started");

        Ok(Self {
            runtime: Some(runtime),
            handle,
            transport,
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// `makeRequest(url, config?)`: issue a request in the background.
    ///
    /// The returned promise resolves with the response envelope as a value
    /// or rejects with `{"error": ...}`.
    pub fn make_request(&self, args: &[Value]) -> Promise {
        self.request_from_args(args, None)
    }

    /// `get(url, config?)`: like [`Bridge::make_request`], but the method is
    /// always `GET` whatever the config says.
    pub fn get(&self, args: &[Value]) -> Promise {
        self.request_from_args(args, Some(DEFAULT_METHOD))
    }

    /// Typed form of [`Bridge::make_request`].
    pub fn fetch(&self, url: impl Into<String>, config: RequestConfig) -> Promise {
        let url = url.into();
        self.spawn_request(move |transport| perform(transport, url, config))
    }

    /// Requests whose worker has not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    fn request_from_args(&self, args: &[Value], method: Option<&'static str>) -> Promise {
        let args = args.to_vec();
        self.spawn_request(move |transport| {
            let url = args.first().ok_or(BridgeError::UrlNotSet)?;
            let mut config = RequestConfig::from_value(args.get(1));
            if let Some(method) = method {
                config = config.with_method(method);
            }
            perform(transport, coerce_text(url), config)
        })
    }

    fn spawn_request<F>(&self, job: F) -> Promise
    where
        F: FnOnce(&dyn Transport) -> Result<Value, BridgeError> + Send + 'static,
    {
        let (promise, resolver) = Promise::pending();
        let request_id = Uuid::new_v4();
        let transport = Arc::clone(&self.transport);
        let span = tracing::debug_span!("request", id = %request_id);

        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let worker = self.handle.spawn_blocking(move || {
            let _entered = span.enter();
            settle(resolver, job(transport.as_ref()));
        });

        let in_flight = Arc::clone(&self.in_flight);
        self.handle.spawn(async move {
            if let Err(err) = worker.await {
                tracing::warn!(%request_id, "request worker aborted: {err}");
            }
            in_flight.fetch_sub(1, Ordering::AcqRel);
            tracing::trace!(%request_id, "request worker finished");
        });

        promise
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        // In-flight workers keep running and still settle their promises.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

fn perform(
    transport: &dyn Transport,
    url: String,
    config: RequestConfig,
) -> Result<Value, BridgeError> {
    let request = config.into_request(url)?;
    tracing::debug!(method = %request.method, url = %request.url, "executing request");
    let response = transport.execute(&request)?;
    tracing::debug!(status = response.status, "response received");
    ResponseEnvelope::from_response(response).to_value()
}

fn settle(resolver: Resolver, result: Result<Value, BridgeError>) {
    match result {
        Ok(envelope) => resolver.resolve(envelope),
        Err(err) => {
            tracing::warn!(error = %err, "request failed");
            resolver.reject(ErrorOutcome::from(err));
        }
    }
}
