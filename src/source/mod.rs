//! Timing and the simulated position feed

pub mod clock;
pub mod position;
pub mod scheduler;

pub use clock::{Clock, SystemClock, VirtualClock};
pub use position::{FixCallback, PositionSource, SimulatedTrajectory, SubscriptionHandle};
pub use scheduler::{Scheduler, TaskCallback, TaskHandle};
