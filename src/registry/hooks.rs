//! Sync/async test and hook body types.

use std::future::Future;
use std::pin::Pin;

use crate::error::FirmoError;
use crate::scheduler::AsyncContext;

type AsyncFuture = Pin<Box<dyn Future<Output = Result<(), FirmoError>>>>;

/// A test body. `None` test bodies (see [`super::Registry::it_pending`])
/// are represented at the `TestBlock` level, not here.
pub enum TestBody {
    Sync(Box<dyn Fn() -> Result<(), FirmoError>>),
    Async(Box<dyn Fn(AsyncContext) -> AsyncFuture>),
}

pub enum HookBody {
    Sync(Box<dyn Fn() -> Result<(), FirmoError>>),
    Async(Box<dyn Fn(AsyncContext) -> AsyncFuture>),
}

/// Blanket trait so `it_async`/`before_async`/`after_async` accept a plain
/// closure `|ctx| Box::pin(async move { ... })` without spelling out the
/// `Pin<Box<dyn Future<...>>>` return type at call sites.
pub trait AsyncTestBody: Fn(AsyncContext) -> AsyncFuture {}
impl<F: Fn(AsyncContext) -> AsyncFuture> AsyncTestBody for F {}

pub trait AsyncHookBody: Fn(AsyncContext) -> AsyncFuture {}
impl<F: Fn(AsyncContext) -> AsyncFuture> AsyncHookBody for F {}
