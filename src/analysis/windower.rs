// SampleWindower - fixed-capacity, non-overlapping sample windows
//
// Storage is allocated once; a write cursor marks how much of the current
// window is filled. When the last slot is written the full buffer is handed
// out and the cursor rewinds, so consecutive windows never share a sample.

/// Accumulates scalar samples into windows of exactly `capacity` samples
#[derive(Debug, Clone)]
pub struct SampleWindower {
    buffer: Box<[f64]>,
    cursor: usize,
}

impl SampleWindower {
    /// # Arguments
    /// * `capacity` - Samples per window (at least 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)].into_boxed_slice(),
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Samples accumulated towards the next window
    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Discard a partially filled window
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Append one sample
    ///
    /// # Returns
    /// * `Some(window)` - This sample completed a window; the slice stays
    ///   valid until the next push
    /// * `None` - Window not yet full
    pub fn push(&mut self, sample: f64) -> Option<&[f64]> {
        self.buffer[self.cursor] = sample;
        self.cursor += 1;

        if self.cursor == self.buffer.len() {
            self.cursor = 0;
            Some(&self.buffer)
        } else {
            None
        }
    }
}
