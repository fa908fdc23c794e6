//! Test doubles for the network and timer seams.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use hs_data::{FetchError, Response, Sleep, Transport};

/// Scripted transport: answers each URL from a queue, repeating the last answer.
#[derive(Default)]
pub struct MockTransport {
    scripts: RefCell<HashMap<String, VecDeque<Response>>>,
    calls: RefCell<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `url`.
    pub fn respond(self, url: &str, status: u16, body: &str) -> Self {
        self.scripts
            .borrow_mut()
            .entry(url.to_string())
            .or_default()
            .push_back(Response::json_body(status, body.as_bytes().to_vec()));
        self
    }

    /// URLs requested so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

#[async_trait(?Send)]
impl Transport for MockTransport {
    async fn get(&self, url: &str) -> Result<Response, FetchError> {
        self.calls.borrow_mut().push(url.to_string());
        // Stay pending for one poll so concurrent callers really overlap.
        tokio::task::yield_now().await;

        let mut scripts = self.scripts.borrow_mut();
        let queue = scripts
            .get_mut(url)
            .ok_or_else(|| FetchError::RequestError(format!("no script for {}", url)))?;
        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        response.ok_or_else(|| FetchError::RequestError(format!("empty script for {}", url)))
    }
}

/// Sleeper that returns immediately and remembers what it was asked to wait.
#[derive(Default)]
pub struct RecordingSleep {
    delays: RefCell<Vec<Duration>>,
}

impl RecordingSleep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Sleep for RecordingSleep {
    async fn sleep(&self, duration: Duration) {
        self.delays.borrow_mut().push(duration);
    }
}

#[async_trait(?Send)]
impl<'a> Sleep for &'a RecordingSleep {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }
}
