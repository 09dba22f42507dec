pub mod buffer;
pub mod scanline;

pub use buffer::PixelBuffer;
pub use scanline::ScanlineRenderer;
