//! Event predicates.
//!
//! A [`Filter`] decides whether a handler node (and its subtree) runs for an
//! event. Plain functions become filters through [`from_fn`] and
//! [`from_async`]; [`FilterFactory::create`] normalizes any of these, or an
//! already shared `Arc<dyn Filter>`, into one runnable form.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::EventContext;
use crate::events::Event;

/// Predicate over an event and its dispatch context.
///
/// # Example
///
/// ```ignore
/// struct FromUser(String);
///
/// #[async_trait]
/// impl Filter for FromUser {
///     async fn check(&self, event: &Event, _ctx: &EventContext) -> anyhow::Result<bool> {
///         Ok(event.user().is_some_and(|u| u.id == self.0))
///     }
/// }
/// ```
#[async_trait]
pub trait Filter: Send + Sync {
    async fn check(&self, event: &Event, ctx: &EventContext) -> anyhow::Result<bool>;
}

/// Filter backed by a synchronous predicate.
pub struct SyncFilter<F> {
    func: F,
}

#[async_trait]
impl<F> Filter for SyncFilter<F>
where
    F: Fn(&Event, &EventContext) -> bool + Send + Sync,
{
    async fn check(&self, event: &Event, ctx: &EventContext) -> anyhow::Result<bool> {
        Ok((self.func)(event, ctx))
    }
}

/// Filter backed by an async predicate.
///
/// The predicate receives owned clones so its future can outlive the borrow.
pub struct AsyncFilter<F> {
    func: F,
}

#[async_trait]
impl<F, Fut> Filter for AsyncFilter<F>
where
    F: Fn(Event, EventContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
{
    async fn check(&self, event: &Event, ctx: &EventContext) -> anyhow::Result<bool> {
        (self.func)(event.clone(), ctx.clone()).await
    }
}

/// Wrap a synchronous predicate.
pub fn from_fn<F>(func: F) -> SyncFilter<F>
where
    F: Fn(&Event, &EventContext) -> bool + Send + Sync,
{
    SyncFilter { func }
}

/// Wrap an async predicate.
pub fn from_async<F, Fut>(func: F) -> AsyncFilter<F>
where
    F: Fn(Event, EventContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
{
    AsyncFilter { func }
}

/// Passes events whose wire kind equals `kind`.
pub fn kind(kind: &'static str) -> KindFilter {
    KindFilter { kind }
}

#[derive(Debug, Clone, Copy)]
pub struct KindFilter {
    kind: &'static str,
}

#[async_trait]
impl Filter for KindFilter {
    async fn check(&self, event: &Event, _ctx: &EventContext) -> anyhow::Result<bool> {
        Ok(event.kind() == self.kind)
    }
}

/// Anything that can serve as a handler filter.
///
/// Values that are neither a [`Filter`] nor a shared `Arc<dyn Filter>` do not
/// implement this trait, so a misconfigured tree fails to compile.
pub trait IntoFilter {
    fn into_filter(self) -> Arc<dyn Filter>;
}

impl<T: Filter + 'static> IntoFilter for T {
    fn into_filter(self) -> Arc<dyn Filter> {
        Arc::new(self)
    }
}

impl IntoFilter for Arc<dyn Filter> {
    fn into_filter(self) -> Arc<dyn Filter> {
        self
    }
}

pub struct FilterFactory;

impl FilterFactory {
    pub fn create(filter: impl IntoFilter) -> Arc<dyn Filter> {
        filter.into_filter()
    }
}
