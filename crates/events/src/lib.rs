//! `tutaller-events`: in-process publish/subscribe.
//!
//! Used by the client to fan normalized API errors out to UI listeners and to
//! announce session changes (credential store cleared) to the auth context.

pub mod bus;
pub mod in_memory_bus;

pub use bus::{Broadcaster, Listener, Subscription};
pub use in_memory_bus::InMemoryBroadcaster;
