//! Shared concurrency primitives: completion signal, resettable deadline
//! timer, and the ready queue watchers push their terminal results into.

pub mod queue;
pub mod signal;
pub mod timer;

pub use queue::ReadyQueue;
pub use signal::Signal;
pub use timer::{DeadlineTimer, ManualTimer, ManualTimerHandle, Timer};
