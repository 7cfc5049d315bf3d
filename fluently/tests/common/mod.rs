#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fluently::{
    ClientContext, Error, Exchange, Middleware, Next, Request, Response, Result, StatusCode,
    Transport,
};

/// Transport answering every request with a fixed JSON body and counting calls.
#[derive(Clone, Default)]
pub struct MockTransport {
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<Request>>>,
    delay: Option<Duration>,
    fail: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// URL and headers of every request that reached the transport.
    pub fn last_request(&self) -> Option<(String, Vec<(String, Vec<String>)>)> {
        self.seen.lock().unwrap().last().map(|request| {
            let headers = request
                .headers()
                .iter()
                .map(|(name, values)| (name.to_owned(), values.to_vec()))
                .collect();
            (request.uri().to_owned(), headers)
        })
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(Error::transport(std::io::Error::other("connection refused")));
        }
        let body = format!(r#"{{"url":"{}","call":{}}}"#, request.uri(), call);
        self.seen.lock().unwrap().push(request);
        Ok(Response::new(StatusCode::OK)
            .with_header("Content-Type", "application/json")
            .with_body(body))
    }
}

/// Shared log of stage enter/exit events.
pub type Trace = Arc<Mutex<Vec<String>>>;

/// Stage recording when it is entered and left.
pub struct Recorder {
    pub name: &'static str,
    pub trace: Trace,
    pub next: Next,
}

#[async_trait]
impl Middleware for Recorder {
    async fn invoke(&self, exchange: Exchange<'_>) -> Result<Response> {
        self.trace.lock().unwrap().push(format!("{}-enter", self.name));
        let response = self.next.invoke(exchange).await;
        self.trace.lock().unwrap().push(format!("{}-exit", self.name));
        response
    }
}

pub fn recorder(
    name: &'static str,
    trace: &Trace,
) -> impl Fn(Next, &Arc<ClientContext>) -> std::result::Result<Next, fluently::BoxError>
+ Send
+ Sync
+ 'static {
    let trace = trace.clone();
    move |next: Next, _client: &Arc<ClientContext>| {
        let stage: Next = Arc::new(Recorder {
            name,
            trace: trace.clone(),
            next,
        });
        Ok(stage)
    }
}

pub fn body_call(response: &Response) -> u64 {
    let value: serde_json::Value = response.json().unwrap();
    value["call"].as_u64().unwrap()
}
