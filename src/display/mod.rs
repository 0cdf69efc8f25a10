pub mod consumer;
pub mod headless;
pub mod orientation;

pub use consumer::{ConsumerStats, DecodedFrame, FrameConsumer, Presented};
pub use headless::{HeadlessDisplay, RunSummary};
pub use orientation::{OrientationSource, SimulatedHead};
