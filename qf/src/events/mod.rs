//! Observability for the coordinator's scheduling decisions
//!
//! The coordinator emits a [`FarmEvent`] for every dispatch, every reply it
//! collects and every stop it sends. Subscribers (tests, the `--trace` output
//! of the CLI) see the exact order in which scheduler state changed.
//!
//! ```rust,ignore
//! let bus = Arc::new(EventBus::with_default_capacity());
//! let mut rx = bus.subscribe();
//! let report = Farm::new(problem, config).with_events(bus.clone()).run().await?;
//! for event in drain(&mut rx) {
//!     println!("{:?}", event);
//! }
//! ```

mod bus;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, drain};
pub use types::FarmEvent;
