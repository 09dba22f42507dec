/// A packed 32-bit ARGB framebuffer the raster pass writes into.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, color: u32) {
        self.pixels[y * self.width + x] = color;
    }

    /// Mutable view of a single scanline.
    pub fn row_mut(&mut self, y: usize) -> &mut [u32] {
        let start = y * self.width;
        &mut self.pixels[start..start + self.width]
    }

    /// Duplicates scanline `src` into scanline `dst`.
    pub fn copy_row(&mut self, src: usize, dst: usize) {
        let w = self.width;
        self.pixels.copy_within(src * w..(src + 1) * w, dst * w);
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_round_trip() {
        let mut buf = PixelBuffer::new(8, 4);
        buf.set(3, 2, 0xffaa_bbcc);
        assert_eq!(buf.get(3, 2), 0xffaa_bbcc);
        assert_eq!(buf.get(0, 0), 0);
    }

    #[test]
    fn copy_row_duplicates_scanline() {
        let mut buf = PixelBuffer::new(4, 3);
        for x in 0..4 {
            buf.set(x, 1, x as u32 + 1);
        }
        buf.copy_row(1, 2);
        for x in 0..4 {
            assert_eq!(buf.get(x, 2), x as u32 + 1);
        }
        assert_eq!(buf.get(0, 0), 0);
    }

    #[test]
    fn clear_fills_every_pixel() {
        let mut buf = PixelBuffer::new(5, 5);
        buf.clear(0xff00_00ff);
        assert!(buf.pixels().iter().all(|&p| p == 0xff00_00ff));
    }
}
