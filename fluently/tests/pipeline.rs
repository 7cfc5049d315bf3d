mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::{Trace, recorder};
use fluently::{
    BoxError, CancellationToken, ClientContext, Error, Exchange, Method, Middleware,
    MiddlewareDescriptor, MiddlewareRunner, Next, PipelineBuilder, Request, Response, Result,
    StatusCode,
};

fn context() -> Arc<ClientContext> {
    Arc::new(ClientContext::new("heroes").with_base_url("https://sketch7.com/api"))
}

fn recording_action(
    trace: &Trace,
) -> impl Fn(Request) -> std::pin::Pin<Box<dyn Future<Output = Result<Response>> + Send>>
+ Send
+ Sync {
    let trace = trace.clone();
    move |_request: Request| {
        let trace = trace.clone();
        Box::pin(async move {
            trace.lock().unwrap().push("terminal".to_owned());
            Ok::<_, Error>(Response::new(StatusCode::OK))
        })
    }
}

#[tokio::test]
async fn stages_run_as_an_onion() {
    let trace: Trace = Arc::default();
    let mut builder = PipelineBuilder::new();
    builder
        .add("a", recorder("A", &trace))
        .add("b", recorder("B", &trace))
        .add("c", recorder("C", &trace));
    let runner = MiddlewareRunner::new(builder.build(context()).unwrap());

    let action = recording_action(&trace);
    runner
        .run(Request::new(Method::GET, "/heroes"), &action)
        .await
        .unwrap();

    assert_eq!(
        *trace.lock().unwrap(),
        [
            "A-enter", "B-enter", "C-enter", "terminal", "C-exit", "B-exit", "A-exit"
        ]
    );
    assert_eq!(runner.pipeline().stages(), ["a", "b", "c"]);
}

#[tokio::test]
async fn empty_pipeline_only_runs_terminal() {
    let trace: Trace = Arc::default();
    let runner = MiddlewareRunner::new(PipelineBuilder::new().build(context()).unwrap());

    let action = recording_action(&trace);
    let response = runner
        .run(Request::new(Method::GET, "/heroes"), &action)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(*trace.lock().unwrap(), ["terminal"]);
}

struct ShortCircuit;

#[async_trait]
impl Middleware for ShortCircuit {
    async fn invoke(&self, _exchange: Exchange<'_>) -> Result<Response> {
        Ok(Response::new(StatusCode::IM_A_TEAPOT))
    }
}

#[tokio::test]
async fn short_circuit_skips_inner_stages_and_terminal() {
    let trace: Trace = Arc::default();
    let mut builder = PipelineBuilder::new();
    builder
        .add("outer", recorder("outer", &trace))
        .add("short", |_next: Next, _client: &Arc<ClientContext>| {
            let stage: Next = Arc::new(ShortCircuit);
            Ok(stage)
        })
        .add("inner", recorder("inner", &trace));
    let runner = MiddlewareRunner::new(builder.build(context()).unwrap());

    let action = recording_action(&trace);
    let response = runner
        .run(Request::new(Method::GET, "/heroes"), &action)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(*trace.lock().unwrap(), ["outer-enter", "outer-exit"]);
}

#[tokio::test]
async fn failing_factory_reports_index_and_name() {
    let trace: Trace = Arc::default();
    let mut builder = PipelineBuilder::new();
    builder
        .add("a", recorder("A", &trace))
        .add_descriptor(MiddlewareDescriptor::from_fn(
            "broken",
            |_next: Next, _client: &Arc<ClientContext>| -> std::result::Result<Next, BoxError> {
                Err("missing cache service".into())
            },
        ));

    match builder.build(context()) {
        Err(Error::InvalidMiddleware {
            index,
            name,
            reason,
        }) => {
            assert_eq!(index, 1);
            assert_eq!(name, "broken");
            assert_eq!(reason, "missing cache service");
        }
        other => panic!("expected InvalidMiddleware, got {other:?}"),
    }
}

#[tokio::test]
async fn factories_see_client_context() {
    let seen = Arc::new(Mutex::new(None));
    let captured = seen.clone();
    let mut builder = PipelineBuilder::new();
    builder.add("probe", move |next: Next, client: &Arc<ClientContext>| {
        *captured.lock().unwrap() = Some(client.identifier().to_owned());
        Ok(next)
    });
    builder.build(context()).unwrap();

    assert_eq!(seen.lock().unwrap().as_deref(), Some("heroes"));
}

struct Stamp {
    next: Next,
}

#[async_trait]
impl Middleware for Stamp {
    async fn invoke(&self, mut exchange: Exchange<'_>) -> Result<Response> {
        exchange.request_mut().items_mut().insert("stamp", 7_u32);
        self.next.invoke(exchange).await
    }
}

#[tokio::test]
async fn items_set_on_the_way_in_are_on_the_response() {
    let mut builder = PipelineBuilder::new();
    builder.add("stamp", |next: Next, _client: &Arc<ClientContext>| {
        let stage: Next = Arc::new(Stamp { next });
        Ok(stage)
    });
    let runner = MiddlewareRunner::new(builder.build(context()).unwrap());

    let action = |request: Request| {
        let stamped = request.items().get::<u32>("stamp").copied();
        async move {
            assert_eq!(stamped, Some(7));
            Ok::<_, Error>(Response::new(StatusCode::OK))
        }
    };
    let response = runner
        .run(Request::new(Method::GET, "/heroes"), &action)
        .await
        .unwrap();

    assert_eq!(response.items().get::<u32>("stamp"), Some(&7));
}

#[tokio::test]
async fn cancelled_before_send_never_reaches_terminal() {
    let sent = Arc::new(AtomicUsize::new(0));
    let counter = sent.clone();
    let action = move |_request: Request| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, Error>(Response::new(StatusCode::OK)) }
    };
    let runner = MiddlewareRunner::new(PipelineBuilder::new().build(context()).unwrap());

    let token = CancellationToken::new();
    token.cancel();
    let result = runner
        .run(
            Request::new(Method::GET, "/heroes").with_cancellation(token),
            &action,
        )
        .await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(sent.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn cancellation_aborts_in_flight_send() {
    let action = |_request: Request| async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok::<_, Error>(Response::new(StatusCode::OK))
    };
    let runner = MiddlewareRunner::new(PipelineBuilder::new().build(context()).unwrap());

    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();
    });

    let result = runner
        .run(
            Request::new(Method::GET, "/heroes").with_cancellation(token),
            &action,
        )
        .await;
    assert!(matches!(result, Err(Error::Cancelled)));
}
