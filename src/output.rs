// Each pixel is written by exactly one worker, exactly once, so a plain
// atomic store is enough.

use std::sync::atomic::{AtomicU32, Ordering};

pub struct Output {
    pub width: u32,
    pub height: u32,
    buffer: Vec<AtomicU32>,
}

impl Output {
    pub fn new(width: u32, height: u32) -> Output {
        Output {
            width,
            height,
            buffer: (0..width as usize * height as usize)
                .map(|_| AtomicU32::new(0))
                .collect(),
        }
    }

    #[inline]
    pub fn put(&self, x: u32, y: u32, color: u32) {
        self.buffer[(x + y * self.width) as usize].store(color, Ordering::Relaxed);
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.buffer[(x + y * self.width) as usize].load(Ordering::Relaxed)
    }

    pub fn as_rgba8(&self) -> &[u8] {
        unsafe { &*(self.buffer.as_slice() as *const [AtomicU32] as *const [u8]) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let out = Output::new(4, 4);
        out.put(2, 1, 0x1234_5678);
        assert_eq!(out.get(2, 1), 0x1234_5678);
    }

    #[test]
    fn as_rgba8_has_four_bytes_per_pixel_in_little_endian_rgba_order() {
        let out = Output::new(2, 1);
        out.put(0, 0, 0xFF_00_00_00 | 0x11 | (0x22 << 8) | (0x33 << 16));
        let bytes = out.as_rgba8();
        assert_eq!(&bytes[0..4], &[0x11, 0x22, 0x33, 0xFF]);
    }

    #[test]
    fn fresh_buffer_starts_at_zero() {
        let out = Output::new(3, 3);
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(out.get(x, y), 0);
            }
        }
    }
}
