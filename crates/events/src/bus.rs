//! Publish/subscribe abstraction (mechanics only).
//!
//! A broadcaster is an explicit service: it is created at process start,
//! handed to the components that publish, and listeners are registered by the
//! scope that owns them. There is no ambient global channel.
//!
//! ## Delivery
//!
//! - **Synchronous**: `publish()` calls every listener before returning
//! - **Once per listener**: listeners registered at publish time see the message once
//! - **No ordering across listeners**
//! - **No backpressure**: the listener list is unbounded
//!
//! Listeners run on the publisher's task, so they should be short and must not
//! block.

use std::sync::Arc;

/// Callback invoked for each published message.
pub type Listener<M> = Arc<dyn Fn(&M) + Send + Sync>;

/// Cancellation handle returned by [`Broadcaster::subscribe`].
///
/// The listener stays registered until [`Subscription::unsubscribe`] is called
/// or the handle is dropped. Use [`Subscription::detach`] for listeners that
/// live as long as the broadcaster.
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle that cancels nothing.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Unregister the listener. Calling this more than once is impossible by
    /// construction; dropping the handle has the same effect.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Keep the listener registered for the lifetime of the broadcaster.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Process-wide publish/subscribe channel.
///
/// Object safe, so publishers can hold an `Arc<dyn Broadcaster<M>>` and tests
/// can inject a fake.
pub trait Broadcaster<M>: Send + Sync {
    /// Deliver `message` to every listener registered right now.
    fn publish(&self, message: &M);

    /// Register `listener`; the returned handle unregisters it.
    fn subscribe(&self, listener: Listener<M>) -> Subscription;
}

impl<M, B> Broadcaster<M> for Arc<B>
where
    B: Broadcaster<M> + ?Sized,
{
    fn publish(&self, message: &M) {
        (**self).publish(message)
    }

    fn subscribe(&self, listener: Listener<M>) -> Subscription {
        (**self).subscribe(listener)
    }
}
