//! Image payload recycled through the frame queue.
//!
//! `FrameBuffer` owns a fixed-size byte store sized once at construction.
//! Producers overwrite it in place every iteration; nothing here allocates
//! after `new`.

/// Fixed-size interleaved 8-bit image
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    channels: usize,
    /// Iteration that last filled this buffer
    pub sequence: u64,
    data: Vec<u8>,
}

impl FrameBuffer {
    /// Allocate a zeroed buffer of `width * height * channels` bytes
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
            sequence: 0,
            data: vec![0; width * height * channels],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Size of the backing store in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Bytes of pixel (x, y), or `None` outside the image
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        let offset = self.offset(x, y)?;
        Some(&self.data[offset..offset + self.channels])
    }

    /// Mutable bytes of pixel (x, y), or `None` outside the image
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> Option<&mut [u8]> {
        let offset = self.offset(x, y)?;
        let channels = self.channels;
        Some(&mut self.data[offset..offset + channels])
    }

    /// Set every byte to `value` (no allocation)
    pub fn fill(&mut self, value: u8) {
        self.data.fill(value);
    }


    fn offset(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y * self.width + x) * self.channels)
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("sequence", &self.sequence)
            .finish()
    }
}
