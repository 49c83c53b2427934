//! Handler effects.
//!
//! An [`Action`] is what a handler node does once its filter passes. Like
//! filters, plain functions are adapted with [`from_fn`] and [`from_async`].

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::EventContext;
use crate::events::Event;

/// Side effect run for an event that passed its node's filter.
#[async_trait]
pub trait Action: Send + Sync {
    async fn run(&self, event: &Event, ctx: &EventContext) -> anyhow::Result<()>;
}

/// Action backed by a synchronous procedure.
pub struct SyncAction<F> {
    func: F,
}

#[async_trait]
impl<F> Action for SyncAction<F>
where
    F: Fn(&Event, &EventContext) + Send + Sync,
{
    async fn run(&self, event: &Event, ctx: &EventContext) -> anyhow::Result<()> {
        (self.func)(event, ctx);
        Ok(())
    }
}

/// Action backed by an async procedure, typically one that replies through
/// [`EventContext::client`].
pub struct AsyncAction<F> {
    func: F,
}

#[async_trait]
impl<F, Fut> Action for AsyncAction<F>
where
    F: Fn(Event, EventContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn run(&self, event: &Event, ctx: &EventContext) -> anyhow::Result<()> {
        (self.func)(event.clone(), ctx.clone()).await
    }
}

pub fn from_fn<F>(func: F) -> SyncAction<F>
where
    F: Fn(&Event, &EventContext) + Send + Sync,
{
    SyncAction { func }
}

pub fn from_async<F, Fut>(func: F) -> AsyncAction<F>
where
    F: Fn(Event, EventContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    AsyncAction { func }
}

/// Anything that can serve as a handler action.
pub trait IntoAction {
    fn into_action(self) -> Arc<dyn Action>;
}

impl<T: Action + 'static> IntoAction for T {
    fn into_action(self) -> Arc<dyn Action> {
        Arc::new(self)
    }
}

impl IntoAction for Arc<dyn Action> {
    fn into_action(self) -> Arc<dyn Action> {
        self
    }
}

pub struct ActionFactory;

impl ActionFactory {
    pub fn create(action: impl IntoAction) -> Arc<dyn Action> {
        action.into_action()
    }
}
