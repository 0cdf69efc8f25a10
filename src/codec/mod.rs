pub mod angle;
pub mod compact;
pub mod foveate;

pub use angle::{angle_to_col, constrain_angle};
pub use compact::{CompactFrame, Size};
pub use foveate::{decode, decode_with_filter, encode, CodecSettings, ResizeFilter};
