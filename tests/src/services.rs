//! Instrumented platform-service fakes.
//!
//! Each fake implements one kernel contract and records how it was used, so
//! integration tests can assert not just the response the caller saw but
//! which collaborators were (or were not) consulted along the way.

use apihub_kernel::{
    Credential, HttpMethod, InboundRequest, InterfaceDescriptor, InterfaceRegistry,
    ResponseEnvelope, ServiceError, Upstream, UpstreamError, UsageMeter, UserDirectory,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ─────────────────────────────────────────────────────────────────────────────
// RecordingDirectory
// ─────────────────────────────────────────────────────────────────────────────

/// [`UserDirectory`] fake that counts lookups.
#[derive(Default)]
pub struct RecordingDirectory {
    creds: HashMap<String, Credential>,
    lookups: AtomicUsize,
    fail: bool,
}

impl RecordingDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory whose every lookup fails with a service error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.creds
            .insert(credential.access_key.clone(), credential);
        self
    }

    /// How many lookups the gateway performed.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserDirectory for RecordingDirectory {
    async fn lookup(&self, access_key: &str) -> Result<Option<Credential>, ServiceError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ServiceError::new("directory unavailable"));
        }
        Ok(self.creds.get(access_key).cloned())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RecordingRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// [`InterfaceRegistry`] fake that counts finds.
#[derive(Default)]
pub struct RecordingRegistry {
    entries: HashMap<(String, HttpMethod), InterfaceDescriptor>,
    finds: AtomicUsize,
}

impl RecordingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interface(mut self, descriptor: InterfaceDescriptor) -> Self {
        self.entries.insert(
            (descriptor.url.clone(), descriptor.method.clone()),
            descriptor,
        );
        self
    }

    /// How many lookups the gateway performed.
    pub fn find_count(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InterfaceRegistry for RecordingRegistry {
    async fn find(
        &self,
        url: &str,
        method: &HttpMethod,
    ) -> Result<Option<InterfaceDescriptor>, ServiceError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .entries
            .get(&(url.to_string(), method.clone()))
            .cloned())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RecordingMeter
// ─────────────────────────────────────────────────────────────────────────────

/// [`UsageMeter`] fake that logs every recording it receives.
#[derive(Default)]
pub struct RecordingMeter {
    recordings: Mutex<Vec<(i64, i64)>>,
    fail: bool,
}

impl RecordingMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Meter whose every recording fails after being logged.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// The `(interface_id, user_id)` pairs recorded so far, in order.
    pub fn recordings(&self) -> Vec<(i64, i64)> {
        self.recordings.lock().unwrap().clone()
    }
}

#[async_trait]
impl UsageMeter for RecordingMeter {
    async fn record_invocation(&self, interface_id: i64, user_id: i64) -> Result<(), ServiceError> {
        self.recordings
            .lock()
            .unwrap()
            .push((interface_id, user_id));
        if self.fail {
            return Err(ServiceError::new("accounting backend down"));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ScriptedUpstream
// ─────────────────────────────────────────────────────────────────────────────

/// [`Upstream`] fake that replays pre-scripted responses and captures every
/// request it is handed, so tests never need a live HTTP server.
#[derive(Default)]
pub struct ScriptedUpstream {
    responses: Mutex<VecDeque<Result<ResponseEnvelope, UpstreamError>>>,
    seen: Mutex<Vec<InboundRequest>>,
}

impl ScriptedUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next dispatch result.
    pub fn script(&self, result: Result<ResponseEnvelope, UpstreamError>) {
        self.responses.lock().unwrap().push_back(result);
    }

    /// How many dispatches reached the upstream.
    pub fn dispatch_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// Copies of the requests that were dispatched, in order.
    pub fn seen_requests(&self) -> Vec<InboundRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for ScriptedUpstream {
    async fn dispatch(&self, request: &InboundRequest) -> Result<ResponseEnvelope, UpstreamError> {
        self.seen.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(UpstreamError::Connect("no scripted response".into())))
    }
}
