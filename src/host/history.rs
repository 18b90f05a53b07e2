//! Exchanges served by a host, kept so tests can look at what the system
//! under test actually received after a scenario ran.

use std::collections::VecDeque;

use http::StatusCode;

use crate::http::{RequestDescriptor, ResponseDescriptor};

/// Exchanges retained when no capacity is configured.
pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// One served request and the response it produced.
#[derive(Debug, Clone)]
pub struct ExchangeRecord {
    pub request: RequestDescriptor,
    pub response: ResponseDescriptor,
    pub duration_ms: u128,
}

impl ExchangeRecord {
    pub fn path(&self) -> &str {
        self.request.path()
    }

    pub fn status(&self) -> StatusCode {
        self.response.status()
    }
}

/// Bounded exchange log in the order the exchanges were served.
#[derive(Debug, Clone)]
pub struct ExchangeHistory {
    records: VecDeque<ExchangeRecord>,
    capacity: usize,
}

impl Default for ExchangeHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl ExchangeHistory {
    /// A capacity of zero disables recording.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn record(&mut self, record: ExchangeRecord) {
        if self.capacity == 0 {
            return;
        }
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ExchangeRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&ExchangeRecord> {
        self.records.back()
    }

    /// Exchanges whose request path equals `path`, ignoring the query.
    pub fn for_path<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a ExchangeRecord> {
        self.records.iter().filter(move |record| record.path() == path)
    }

    pub fn with_status(&self, status: StatusCode) -> impl Iterator<Item = &ExchangeRecord> {
        self.records
            .iter()
            .filter(move |record| record.status() == status)
    }
}
