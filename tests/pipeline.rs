//! Pipeline behavior driven through an in-memory sink.
//!
//! These tests cover ordering, short-circuiting and buffering:
//!
//! 1. Authorizers run in registration order and stop at the first denial
//! 2. A denied request never reaches the handler or the monitors
//! 3. Monitors see the complete capture, in registration order
//! 4. Captured chunks reach the sink unmodified, in write order
//! 5. A failing sink truncates the flush

use std::sync::{Arc, Mutex};

use axum::http::{HeaderValue, Response, StatusCode, header};
use axum_extra::extract::cookie::Cookie;
use bytes::Bytes;
use intercept_handler::{
    AuthOutcome, Denial, Disposition, MemorySink, Pipeline, Request, SinkError,
    handlers::{login::LoginPage, resource::UpdateResource},
    intercept::{authorizer_fn, handler_fn, monitor_fn},
    middleware::auth::{AllowAll, RequireCookie},
};

type Log = Arc<Mutex<Vec<String>>>;

fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Creates a test request for the given path.
fn make_request(path: &str) -> Request {
    axum::http::Request::builder().uri(path).body(Bytes::new()).unwrap()
}

/// Creates a test request carrying a `Cookie` header.
fn make_cookie_request(path: &str, cookie: &str) -> Request {
    axum::http::Request::builder()
        .uri(path)
        .header(header::COOKIE, cookie)
        .body(Bytes::new())
        .unwrap()
}

async fn run(pipeline: &Pipeline, request: &Request) -> (Disposition, Response<Bytes>) {
    let mut sink = MemorySink::new();
    let disposition = pipeline.handle(&mut sink, request).await;
    (disposition, sink.into_response())
}

#[tokio::test]
async fn test_login_writes_body_and_cookie() {
    let pipeline = Pipeline::new(LoginPage::new("S"));

    let (disposition, response) = run(&pipeline, &make_request("/login")).await;

    assert!(matches!(
        disposition,
        Disposition::Delivered { chunks: 2, bytes: 11 }
    ));
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), "hello buddy");
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("S="), "unexpected cookie: {cookie}");
}

#[tokio::test]
async fn test_missing_cookie_is_denied() {
    let calls = new_log();
    let handler_calls = Arc::clone(&calls);
    let monitor_calls = Arc::clone(&calls);

    let pipeline = Pipeline::new(handler_fn(move |w, _r| {
        handler_calls.lock().unwrap().push("handler".into());
        w.write("should not be sent");
    }))
    .authorizer(RequireCookie::new("S"))
    .monitor(monitor_fn("audit", move |_w, _r, _c| {
        monitor_calls.lock().unwrap().push("monitor".into());
    }));

    let (disposition, response) = run(&pipeline, &make_request("/update")).await;

    assert!(matches!(
        disposition,
        Disposition::Denied { status } if status == StatusCode::UNAUTHORIZED
    ));
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.body(), "missing cookie for S");
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert!(entries(&calls).is_empty());
}

#[tokio::test]
async fn test_update_with_allowing_authorizer() {
    let pipeline = Pipeline::new(UpdateResource).authorizer(AllowAll);

    let (disposition, response) = run(&pipeline, &make_request("/update")).await;

    assert!(disposition.is_delivered());
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ETAG], "a1");
    assert_eq!(response.body(), "updated successfully");
}

#[tokio::test]
async fn test_update_with_cookie_refreshes_it() {
    let pipeline = Pipeline::new(UpdateResource).authorizer(RequireCookie::new("S"));

    let (_, response) = run(&pipeline, &make_cookie_request("/update", "S=a1b2c3")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::SET_COOKIE], "S=a1b2c3");
    assert_eq!(response.body(), "updated successfully");
}

#[tokio::test]
async fn test_monitors_observe_full_capture_in_order() {
    let seen = new_log();
    let first = Arc::clone(&seen);
    let second = Arc::clone(&seen);

    let pipeline = Pipeline::new(handler_fn(|w, _r| {
        w.write("a".repeat(10));
        w.write("b".repeat(20));
        w.write("c".repeat(12));
    }))
    .monitor(monitor_fn("first", move |_w, _r, captured| {
        first
            .lock()
            .unwrap()
            .push(format!("first:{}:{}", captured.len(), captured.total_bytes()));
    }))
    .monitor(monitor_fn("second", move |_w, _r, captured| {
        second
            .lock()
            .unwrap()
            .push(format!("second:{}:{}", captured.len(), captured.total_bytes()));
    }));

    let (disposition, response) = run(&pipeline, &make_request("/report")).await;

    assert_eq!(entries(&seen), ["first:3:42", "second:3:42"]);
    assert!(matches!(
        disposition,
        Disposition::Delivered { chunks: 3, bytes: 42 }
    ));
    assert_eq!(response.body().len(), 42);
    assert_eq!(
        response.body(),
        &format!("{}{}{}", "a".repeat(10), "b".repeat(20), "c".repeat(12))
    );
}

#[tokio::test]
async fn test_authorizers_run_in_registration_order() {
    let order = new_log();
    let mut pipeline = Pipeline::new(handler_fn(|w, _r| {
        w.write("ok");
    }));

    for name in ["rate_limit", "identity", "scope"] {
        let order = Arc::clone(&order);
        pipeline.add_authorizer(authorizer_fn(name, move |_w, _r| {
            order.lock().unwrap().push(name.to_string());
            AuthOutcome::Allow
        }));
    }

    let (_, response) = run(&pipeline, &make_request("/")).await;

    assert_eq!(entries(&order), ["rate_limit", "identity", "scope"]);
    assert_eq!(response.body(), "ok");
}

#[tokio::test]
async fn test_denial_skips_remaining_authorizers() {
    let order = new_log();
    let a = Arc::clone(&order);
    let b = Arc::clone(&order);

    let pipeline = Pipeline::new(handler_fn(|w, _r| {
        w.write("secret");
    }))
    .authorizer(authorizer_fn("a", move |_w, _r| {
        a.lock().unwrap().push("a".into());
        Denial::new(StatusCode::TOO_MANY_REQUESTS, "slow down").into()
    }))
    .authorizer(authorizer_fn("b", move |_w, _r| {
        b.lock().unwrap().push("b".into());
        AuthOutcome::Allow
    }));

    let (_, response) = run(&pipeline, &make_request("/")).await;

    assert_eq!(entries(&order), ["a"]);
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    // No explicit message: the cause's description is the body.
    assert_eq!(response.body(), "slow down");
}

#[tokio::test]
async fn test_empty_chains_allow() {
    let pipeline = Pipeline::new(handler_fn(|w, _r| {
        w.set_status(StatusCode::CREATED);
        w.write("created");
    }));

    let (_, response) = run(&pipeline, &make_request("/")).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.body(), "created");
}

#[tokio::test]
async fn test_flush_failure_truncates() {
    let pipeline = Pipeline::new(handler_fn(|w, _r| {
        w.write("first ");
        w.write("second ");
        w.write("third");
    }));
    let mut sink = MemorySink::new().fail_after(1);

    let disposition = pipeline.handle(&mut sink, &make_request("/")).await;

    let (chunks_written, bytes_written, error) = match disposition {
        Disposition::Truncated {
            chunks_written,
            bytes_written,
            error,
        } => (chunks_written, bytes_written, error),
        other => panic!("expected truncated flush, got {other:?}"),
    };
    assert_eq!(chunks_written, 1);
    assert_eq!(bytes_written, 6);
    assert!(matches!(error, SinkError::Io(_)));
    assert_eq!(sink.body(), b"first ");
}

#[tokio::test]
async fn test_monitor_writes_are_discarded() {
    let pipeline = Pipeline::new(handler_fn(|w, _r| {
        w.write("body");
    }))
    .monitor(monitor_fn("noisy", |w, _r, _c| {
        w.write("injected");
        w.add_header(
            header::HeaderName::from_static("x-audited"),
            HeaderValue::from_static("yes"),
        );
    }));

    let (_, response) = run(&pipeline, &make_request("/")).await;

    assert_eq!(response.body(), "body");
    assert_eq!(response.headers()["x-audited"], "yes");
}

#[tokio::test]
async fn test_monitor_sees_handler_headers() {
    let seen = new_log();
    let recorder = Arc::clone(&seen);

    let pipeline = Pipeline::new(LoginPage::new("S")).monitor(monitor_fn(
        "cookie_check",
        move |w, _r, _c| {
            let has_cookie = w.headers().contains_key(header::SET_COOKIE);
            recorder.lock().unwrap().push(has_cookie.to_string());
        },
    ));

    run(&pipeline, &make_request("/login")).await;

    assert_eq!(entries(&seen), ["true"]);
}

#[tokio::test]
async fn test_cookie_set_before_denial_is_still_sent() {
    let pipeline = Pipeline::new(handler_fn(|w, _r| {
        w.write("unreachable");
    }))
    .authorizer(authorizer_fn("session", |w, _r| {
        w.set_cookie(&Cookie::new("trace", "t1"));
        AuthOutcome::Allow
    }))
    .authorizer(authorizer_fn("forbid", |_w, _r| {
        Denial::new(StatusCode::FORBIDDEN, "no access")
            .with_message("forbidden")
            .into()
    }));

    let (_, response) = run(&pipeline, &make_request("/")).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.body(), "forbidden");
    assert_eq!(response.headers()[header::SET_COOKIE], "trace=t1");
}

#[tokio::test]
async fn test_capture_is_fresh_per_request() {
    let pipeline = Pipeline::new(UpdateResource);

    let (_, first) = run(&pipeline, &make_request("/update")).await;
    let (_, second) = run(&pipeline, &make_request("/update")).await;

    assert_eq!(first.body(), "updated successfully");
    assert_eq!(second.body(), "updated successfully");
}

#[tokio::test]
async fn test_concurrent_requests_do_not_share_capture() {
    let pipeline = Arc::new(Pipeline::new(handler_fn(|w, r| {
        w.write(r.uri().path());
        w.write("|done");
    })));

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move {
                let path = format!("/item/{i}");
                let mut sink = MemorySink::new();
                pipeline.handle(&mut sink, &make_request(&path)).await;
                (path, sink.into_response())
            })
        })
        .collect();

    for task in tasks {
        let (path, response) = task.await.unwrap();
        assert_eq!(response.body(), &format!("{path}|done"));
    }
}
