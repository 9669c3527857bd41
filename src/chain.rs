//! Interceptor chains.
//!
//! An [`Endpoint`] is a type-erased async request handler. An [`Interceptor`]
//! wraps one endpoint into another and may answer the request itself instead
//! of calling through. A chain is an ordered list of interceptors folded from
//! the right around a terminal endpoint, so the first interceptor in the list
//! is the outermost: `compose(h, [a, b])` behaves as `a(b(h))`.

use axum::extract::Request;
use axum::handler::Handler;
use axum::response::Response;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;

/// A cloneable async request handler.
#[derive(Clone)]
pub struct Endpoint(Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>);

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Endpoint")
    }
}

impl Endpoint {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Endpoint(Arc::new(move |req: Request| f(req).boxed()))
    }

    /// Adapt an axum handler (with its state) into an endpoint.
    pub fn from_handler<H, T, S>(handler: H, state: S) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        Endpoint::new(move |req| handler.clone().call(req, state.clone()))
    }

    pub fn call(&self, req: Request) -> BoxFuture<'static, Response> {
        (self.0)(req)
    }

    /// Whether both values share the same underlying handler.
    #[cfg(test)]
    fn ptr_eq(&self, other: &Endpoint) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Turn the endpoint into an axum handler for use with `axum::routing`.
    pub fn into_handler(
        self,
    ) -> impl FnOnce(Request) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static {
        move |req| self.call(req)
    }
}

/// Wraps an endpoint, optionally short-circuiting before it runs.
#[derive(Clone)]
pub struct Interceptor(Arc<dyn Fn(Endpoint) -> Endpoint + Send + Sync>);

impl std::fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Interceptor")
    }
}

impl Interceptor {
    pub fn new<F>(wrap: F) -> Self
    where
        F: Fn(Endpoint) -> Endpoint + Send + Sync + 'static,
    {
        Interceptor(Arc::new(wrap))
    }

    /// Build an interceptor from an async function of the request and the
    /// next endpoint, in the shape of `axum::middleware::from_fn`.
    ///
    /// ```rust,no_run
    /// use gauther::chain::{Endpoint, Interceptor};
    ///
    /// let logged = Interceptor::from_fn(|req, next: Endpoint| async move {
    ///     tracing::info!(uri = %req.uri(), "request");
    ///     next.call(req).await
    /// });
    /// ```
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Request, Endpoint) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Interceptor::new(move |next| {
            let f = f.clone();
            Endpoint::new(move |req| f(req, next.clone()))
        })
    }

    pub fn wrap(&self, next: Endpoint) -> Endpoint {
        (self.0)(next)
    }
}

/// Fold `interceptors` around `terminal`; the first interceptor is outermost.
///
/// An empty list returns `terminal` unchanged.
pub fn compose(terminal: Endpoint, interceptors: &[Interceptor]) -> Endpoint {
    interceptors
        .iter()
        .rev()
        .fold(terminal, |next, interceptor| interceptor.wrap(next))
}

/// Ordered list of interceptors, outermost first.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    interceptors: Vec<Interceptor>,
}

impl Chain {
    pub fn new() -> Self {
        Chain::default()
    }

    /// Append an interceptor inside the ones already added.
    pub fn with(mut self, interceptor: Interceptor) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn compose(&self, terminal: Endpoint) -> Endpoint {
        compose(terminal, &self.interceptors)
    }
}
