//! Scripted in-memory transport for tests.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::TransportError;
use crate::sync::transport::{Form, Response, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

/// A request as the transport saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub form: Form,
}

impl Recorded {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

struct Reply {
    result: Result<Response, TransportError>,
    gate: Option<oneshot::Receiver<()>>,
}

/// Replies are queued per `(method, path)` and handed out in order.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    log: Mutex<Vec<Recorded>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, method: Method, path: &str, status: u16, body: &str) {
        self.push(method, path, Ok(Response::new(status, body)), None);
    }

    /// Queue a reply that is held back until the returned sender fires.
    pub fn reply_gated(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: &str,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.push(method, path, Ok(Response::new(status, body)), Some(rx));
        tx
    }

    pub fn fail(&self, method: Method, path: &str, error: TransportError) {
        self.push(method, path, Err(error), None);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().clone()
    }

    fn push(
        &self,
        method: Method,
        path: &str,
        result: Result<Response, TransportError>,
        gate: Option<oneshot::Receiver<()>>,
    ) {
        self.replies
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Reply { result, gate });
    }

    async fn serve(
        &self,
        method: Method,
        path: &str,
        form: Form,
    ) -> Result<Response, TransportError> {
        self.log.lock().push(Recorded {
            method,
            path: path.to_string(),
            form,
        });
        let reply = self
            .replies
            .lock()
            .get_mut(&(method, path.to_string()))
            .and_then(VecDeque::pop_front);
        let Some(reply) = reply else {
            return Err(TransportError::Network(format!("no reply scripted for {}", path)));
        };
        if let Some(gate) = reply.gate {
            let _ = gate.await;
        }
        reply.result
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, path: &str) -> Result<Response, TransportError> {
        self.serve(Method::Get, path, Vec::new()).await
    }

    async fn post_form(&self, path: &str, form: Form) -> Result<Response, TransportError> {
        self.serve(Method::Post, path, form).await
    }
}
