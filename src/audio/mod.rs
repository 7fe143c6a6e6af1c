//! Audio decoding, conditioning, and segmentation.

pub mod buffer;
pub mod decode;
pub mod segmenter;

pub use buffer::AudioBuffer;
pub use decode::decode_wav;
pub use segmenter::{AudioSegmenter, Segment, SegmentMode, SegmenterConfig};
