//! Handlers and the advance callback.
//!
//! A handler receives the request [`Context`] and a [`Next`] value. Awaiting
//! `next.run(ctx)` runs the rest of the chain; returning without calling it
//! stops the chain. `Next` is consumed by `run`, so a handler cannot advance
//! twice.
//!
//! Errors are returned, not thrown: a handler that fails returns `Err`, and
//! the error travels back up through every `next.run` to the dispatch
//! boundary, where exactly one error or validation handler deals with it.
//!
//! # Example
//!
//! ```
//! use kaze_core::{handler_fn, Context, Next};
//!
//! let logger = handler_fn(|ctx, next| {
//!     Box::pin(async move {
//!         tracing::info!(path = %ctx.path(), "incoming");
//!         next.run(ctx).await
//!     })
//! });
//!
//! let hello = handler_fn(|ctx, _next| {
//!     Box::pin(async move { ctx.send("hello") })
//! });
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::KazeResult;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a handler returns.
pub type HandlerResult = KazeResult<()>;

/// A shared, type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// An immutable, shareable handler chain.
pub type HandlerChain = Arc<[BoxedHandler]>;

/// A request-processing unit.
///
/// Middlewares and terminal handlers implement the same trait; the only
/// difference is whether they call `next`.
pub trait Handler: Send + Sync + 'static {
    /// Processes the request.
    fn call<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, HandlerResult>;

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Advances the chain by exactly one handler.
///
/// Holds the flattened chain and the index of the handler to run next.
/// The index is mirrored into [`Context::cursor`] while that handler runs.
pub struct Next<'a> {
    chain: &'a [BoxedHandler],
    index: usize,
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field("len", &self.chain.len())
            .finish()
    }
}

impl<'a> Next<'a> {
    /// Starts at the first handler of `chain`.
    #[must_use]
    pub fn new(chain: &'a [BoxedHandler]) -> Self {
        Self { chain, index: 0 }
    }

    /// Number of handlers that have not run yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.index)
    }

    /// Returns `true` when no handler is left.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.remaining() == 0
    }

    /// Runs the next handler. Past the end of the chain this is a no-op.
    ///
    /// This consumes `self` to ensure it can only be called once.
    pub async fn run(self, ctx: &mut Context) -> HandlerResult {
        let Some(handler) = self.chain.get(self.index) else {
            return Ok(());
        };
        ctx.set_cursor(self.index);
        let next = Next {
            chain: self.chain,
            index: self.index + 1,
        };
        handler.call(ctx, next).await
    }
}

/// A handler created from a closure.
///
/// The closure must return a boxed future so it can borrow the context.
pub struct FnHandler<F> {
    name: &'static str,
    func: F,
}

impl<F> FnHandler<F> {
    /// Creates a new named closure handler.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, HandlerResult> {
        (self.func)(ctx, next)
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Wraps a closure as a [`BoxedHandler`].
pub fn handler_fn<F>(func: F) -> BoxedHandler
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnHandler::new("handler_fn", func))
}

/// Wraps a closure as a named [`BoxedHandler`].
pub fn named_handler_fn<F>(name: &'static str, func: F) -> BoxedHandler
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnHandler::new(name, func))
}
