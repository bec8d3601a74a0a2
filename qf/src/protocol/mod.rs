//! Coordinator/worker message protocol
//!
//! Four message kinds flow over the farm's channels:
//! - **DoWork:** coordinator hands an interval to an idle worker
//! - **SplitTask:** worker returns one half of a split; always sent twice in a row
//! - **Result:** worker returns a finished partial area
//! - **Stop:** coordinator tells a worker to exit

mod messages;

pub use messages::{Envelope, Message, MessageKind, Rank, Selector};
