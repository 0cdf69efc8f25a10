pub mod frame;
pub mod source;
pub mod synthetic;

pub use frame::{PanoramicFrame, SourceFrame};
pub use source::{BufferedSource, FrameSource, IterSource};
pub use synthetic::SyntheticSource;
