//! Audio buffers for the block processor.
//!
//! A [`BufferPool`] holds the physical [`StereoBuffer`]s one published topology
//! renders into, plus a shared silent buffer that unconnected nodes read from.
//! Slots are assigned when the topology is compiled (see
//! [`Schedule`](crate::graph::Schedule)): a slot is live from the step that writes
//! it to the last step that reads it, then reused.
//!
//! Pools are allocated on the control thread at their final size. The render path
//! only slices into them.

/// A stereo audio buffer with separate left and right channels.
#[derive(Debug, Clone)]
pub struct StereoBuffer {
    /// Left channel samples.
    pub left: Vec<f32>,
    /// Right channel samples.
    pub right: Vec<f32>,
}

impl StereoBuffer {
    /// Creates a zeroed buffer holding `frames` samples per channel.
    pub fn new(frames: usize) -> Self {
        Self {
            left: vec![0.0; frames],
            right: vec![0.0; frames],
        }
    }

    /// Returns the number of samples per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Returns true if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Zeroes the first `frames` samples of both channels.
    #[inline]
    pub fn clear(&mut self, frames: usize) {
        self.left[..frames].fill(0.0);
        self.right[..frames].fill(0.0);
    }

    /// Borrows the first `frames` samples of both channels.
    #[inline]
    pub fn channels(&self, frames: usize) -> (&[f32], &[f32]) {
        (&self.left[..frames], &self.right[..frames])
    }

    /// Mutably borrows the first `frames` samples of both channels.
    #[inline]
    pub fn channels_mut(&mut self, frames: usize) -> (&mut [f32], &mut [f32]) {
        (&mut self.left[..frames], &mut self.right[..frames])
    }
}

/// Fixed set of buffer slots plus a silent buffer.
#[derive(Debug)]
pub struct BufferPool {
    buffers: Vec<StereoBuffer>,
    silence: StereoBuffer,
    frames: usize,
}

impl BufferPool {
    /// Creates `count` zeroed slots of `frames` samples each.
    pub fn new(count: usize, frames: usize) -> Self {
        Self {
            buffers: (0..count).map(|_| StereoBuffer::new(frames)).collect(),
            silence: StereoBuffer::new(frames),
            frames,
        }
    }

    /// Returns the number of slots.
    pub fn count(&self) -> usize {
        self.buffers.len()
    }

    /// Returns the capacity of each slot in frames.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Borrows a slot.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= count()`.
    #[inline]
    pub fn get(&self, slot: usize) -> &StereoBuffer {
        &self.buffers[slot]
    }

    /// Mutably borrows a slot.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= count()`.
    #[inline]
    pub fn get_mut(&mut self, slot: usize) -> &mut StereoBuffer {
        &mut self.buffers[slot]
    }

    /// Borrows the silent buffer.
    #[inline]
    pub fn silence(&self) -> &StereoBuffer {
        &self.silence
    }

    /// Borrows `read` immutably and `write` mutably at the same time.
    ///
    /// # Panics
    ///
    /// Panics if `read == write` or either slot is out of range.
    #[inline]
    pub fn read_write(&mut self, read: usize, write: usize) -> (&StereoBuffer, &mut StereoBuffer) {
        assert_ne!(read, write, "a slot cannot be read and written by one step");
        if read < write {
            let (head, tail) = self.buffers.split_at_mut(write);
            (&head[read], &mut tail[0])
        } else {
            let (head, tail) = self.buffers.split_at_mut(read);
            (&tail[0], &mut head[write])
        }
    }

    /// Borrows the silent buffer together with a writable slot.
    #[inline]
    pub fn silence_and(&mut self, write: usize) -> (&StereoBuffer, &mut StereoBuffer) {
        (&self.silence, &mut self.buffers[write])
    }
}
