//! Position feedback filtering.
//!
//! Moving average over the last `kernel_size` valid samples, backed by a
//! fixed-capacity ring buffer.

use heapless::Deque;
use rig_common::consts::MAX_KERNEL_SIZE;

/// Moving average with a runtime window of `1..=MAX_KERNEL_SIZE` samples.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    window: Deque<f64, MAX_KERNEL_SIZE>,
    kernel_size: usize,
}

impl MovingAverage {
    /// Window size is clamped to `1..=MAX_KERNEL_SIZE`.
    pub fn new(kernel_size: usize) -> Self {
        Self {
            window: Deque::new(),
            kernel_size: kernel_size.clamp(1, MAX_KERNEL_SIZE),
        }
    }

    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    /// Push a sample, evicting the oldest once the window is full.
    #[inline]
    pub fn push(&mut self, sample: f64) {
        if self.window.len() >= self.kernel_size {
            self.window.pop_front();
        }
        let pushed = self.window.push_back(sample);
        debug_assert!(pushed.is_ok(), "window capacity is MAX_KERNEL_SIZE >= kernel_size");
    }

    /// Mean of the window, `None` while empty.
    #[inline]
    pub fn mean(&self) -> Option<f64> {
        if self.window.is_empty() {
            return None;
        }
        Some(self.window.iter().sum::<f64>() / self.window.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Window holds `kernel_size` samples.
    pub fn is_full(&self) -> bool {
        self.window.len() >= self.kernel_size
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
