//! axum middleware binding the push decorators to a router.
//!
//! Both middlewares expect the host to insert a [`PushHandle`] into the
//! request extensions for connections that can push. Without one the
//! request passes straight through.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{response::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::http::recorder::BufferedResponse;
use crate::http::writer::ResponseWriter;
use crate::push::{is_push, CommitHook, Decorated, PushHandle, RedirectPush, ServerPush};

/// Push `rel=preload` Link targets of the response.
///
/// ```ignore
/// let app = Router::new()
///     .route("/", get(index))
///     .layer(middleware::from_fn_with_state(push, server_push_middleware));
/// ```
pub async fn server_push_middleware(
    State(push): State<Arc<ServerPush>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some((handle, request_headers)) = push_context(&req) else {
        return next.run(req).await;
    };

    let response = next.run(req).await;
    replay(response, handle, |writer| push.decorate(writer, &request_headers))
}

/// Push the `Location` target of same-origin redirects.
pub async fn redirect_push_middleware(
    State(push): State<Arc<RedirectPush>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !push.is_enabled() {
        return next.run(req).await;
    }
    let Some((handle, request_headers)) = push_context(&req) else {
        return next.run(req).await;
    };

    let response = next.run(req).await;
    replay(response, handle, |writer| push.decorate(writer, &request_headers))
}

/// The push handle and request headers, if this request may be decorated.
fn push_context(req: &Request<Body>) -> Option<(PushHandle, HeaderMap)> {
    if is_push(req) {
        return None;
    }
    let handle = req.extensions().get::<PushHandle>()?.clone();
    Some((handle, req.headers().clone()))
}

/// Commit the response head through a decorator and rebuild the response
/// around the untouched body.
fn replay<H, F>(response: Response, handle: PushHandle, decorate: F) -> Response
where
    H: CommitHook,
    F: FnOnce(BufferedResponse) -> Result<Decorated<BufferedResponse, H>, BufferedResponse>,
{
    let (mut parts, body) = response.into_parts();
    let status = parts.status;
    let writer = BufferedResponse::from_head(status, std::mem::take(&mut parts.headers))
        .with_pusher(handle);

    let writer = match decorate(writer) {
        Ok(mut decorated) => {
            decorated.write_header(status);
            decorated.into_inner()
        }
        Err(writer) => writer,
    };

    restore_head(&mut parts, writer);
    Response::from_parts(parts, body)
}

fn restore_head(parts: &mut Parts, writer: BufferedResponse) {
    let (status, headers) = writer.into_head();
    parts.status = status;
    parts.headers = headers;
}
