pub mod optimizer;
pub mod queue;
pub mod rolling;
pub mod viewer;

pub use optimizer::{Availability, OptimizerPipeline, TimestampedFrame};
pub use queue::{BoundedQueue, EnqueueError, QueueStats};
pub use rolling::RollingAverage;
pub use viewer::{ViewerOrientation, ViewerSnapshot, ViewerState};
