/// Messaging module: the network → presentation crossing point
///
/// The connection layer runs on background tasks; presentation state is
/// confined to a single consumer thread. The [`EventQueue`] is the sole
/// crossing point between the two:
///
/// ```text
/// network task ──┐
/// network task ──┼── enqueue ──> EventQueue ── drain_all (per tick) ──> consumer
/// status events ─┘
/// ```
///
/// One batched drain per consumer tick gives the presentation state machine
/// thread-confinement without per-command locking.
pub mod events;
pub mod queue;

pub use events::{QueueEntry, QueueEvent};
pub use queue::EventQueue;
