use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use vvx_proto::HttpMethod;

use crate::transport::PreparedRequest;

/// Diagnostic record of one attempt of a REST call.
///
/// Recorded before the request leaves, then completed with either the raw
/// response body or the error text. The password is never kept.
#[derive(Debug, Clone, PartialEq)]
pub struct RestCall {
    pub id: u64,
    pub uri: String,
    pub method: HttpMethod,
    pub username: Option<String>,
    pub request_body: Option<String>,
    pub response_body: Option<String>,
    pub error: Option<String>,
    pub attempt: u32,
}

impl RestCall {
    fn snapshot(id: u64, request: &PreparedRequest, attempt: u32) -> Self {
        RestCall {
            id,
            uri: request.uri.clone(),
            method: request.method,
            username: request.credential.as_ref().map(|c| c.username.clone()),
            request_body: request.body.clone(),
            response_body: None,
            error: None,
            attempt,
        }
    }
}

/// Bounded, thread safe history of REST attempts, newest last.
pub struct CallJournal {
    capacity: usize,
    next_id: AtomicU64,
    calls: Mutex<VecDeque<RestCall>>,
}

impl CallJournal {
    pub const DEFAULT_CAPACITY: usize = 32;

    pub fn new(capacity: usize) -> Self {
        CallJournal {
            capacity: capacity.max(1),
            next_id: AtomicU64::new(1),
            calls: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    // a caller panicking while holding the lock must not cost the records
    fn lock(&self) -> MutexGuard<'_, VecDeque<RestCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a fresh record for an attempt about to be sent, returns its id.
    pub fn record(&self, request: &PreparedRequest, attempt: u32) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut calls = self.lock();
        if calls.len() == self.capacity {
            calls.pop_front();
        }
        calls.push_back(RestCall::snapshot(id, request, attempt));
        id
    }

    pub fn complete(&self, id: u64, response_body: &str) {
        self.update(id, |call| call.response_body = Some(response_body.to_string()));
    }

    pub fn fail(&self, id: u64, error: String) {
        self.update(id, |call| call.error = Some(error));
    }

    fn update<F>(&self, id: u64, f: F)
    where
        F: FnOnce(&mut RestCall),
    {
        // an evicted record is simply gone
        if let Some(call) = self.lock().iter_mut().rev().find(|call| call.id == id) {
            f(call);
        }
    }

    pub fn last(&self) -> Option<RestCall> {
        self.lock().back().cloned()
    }

    pub fn calls(&self) -> Vec<RestCall> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CallJournal {
    fn default() -> Self {
        CallJournal::new(Self::DEFAULT_CAPACITY)
    }
}
