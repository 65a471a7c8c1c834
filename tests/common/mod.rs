//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use url_map::http::{Request, Response};
use url_map::kernel::{Handler, HandlerError, RequestType, Terminable};

/// Shared, ordered log of handler events (`handle:api`, `terminate:main`, ...).
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Handler that records every call and replies with its name.
pub struct Recorder {
    name: &'static str,
    log: EventLog,
    terminable: bool,
    seen: Mutex<Vec<Request>>,
    /// Address of the last request reference received.
    last_ptr: Mutex<Option<usize>>,
}

impl Recorder {
    pub fn new(name: &'static str, log: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            name,
            log: log.clone(),
            terminable: false,
            seen: Mutex::new(Vec::new()),
            last_ptr: Mutex::new(None),
        })
    }

    pub fn terminable(name: &'static str, log: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            name,
            log: log.clone(),
            terminable: true,
            seen: Mutex::new(Vec::new()),
            last_ptr: Mutex::new(None),
        })
    }

    /// Requests received so far.
    pub fn seen(&self) -> Vec<Request> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last_ptr(&self) -> Option<usize> {
        *self.last_ptr.lock().unwrap()
    }

    pub fn as_handler(self: &Arc<Self>) -> Arc<dyn Handler> {
        self.clone()
    }
}

impl Handler for Recorder {
    fn handle(
        &self,
        request: &Request,
        _kind: RequestType,
        _catch: bool,
    ) -> Result<Response, HandlerError> {
        self.log.lock().unwrap().push(format!("handle:{}", self.name));
        self.seen.lock().unwrap().push(request.clone());
        *self.last_ptr.lock().unwrap() = Some(request as *const Request as usize);
        Ok(Response::text(self.name))
    }

    fn as_terminable(&self) -> Option<&dyn Terminable> {
        if self.terminable {
            Some(self)
        } else {
            None
        }
    }
}

impl Terminable for Recorder {
    fn terminate(&self, _request: &Request, _response: &Response) {
        self.log
            .lock()
            .unwrap()
            .push(format!("terminate:{}", self.name));
    }
}

/// Response body as a string.
pub fn text(response: &Response) -> String {
    String::from_utf8(response.body().to_vec()).unwrap()
}
