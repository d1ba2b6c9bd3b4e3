//! Fixed-length rolling histories for the three signal streams.
//!
//! Each buffer keeps a constant number of fixed-dimension samples. A push
//! evicts the oldest slot and appends at the tail, so index 0 is always the
//! oldest retained sample and index `len - 1` the newest.

use nalgebra::DVector;
use rand::Rng;
use rand_distr::StandardNormal;

// ---------------------------------------------------------------------------
// HistoryBuffer
// ---------------------------------------------------------------------------

/// Rolling window of `len` samples of dimension `dim`.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    slots: Vec<DVector<f64>>,
    dim: usize,
}

impl HistoryBuffer {
    /// Allocate `len` zeroed slots of dimension `dim`. Both must be > 0.
    #[must_use]
    pub fn new(len: usize, dim: usize) -> Self {
        assert!(len > 0, "history length must be > 0");
        assert!(dim > 0, "sample dimension must be > 0");
        Self {
            slots: vec![DVector::zeros(dim); len],
            dim,
        }
    }

    /// Number of retained slots. Constant for the buffer's lifetime.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sample dimension.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Evict the oldest slot and append `sample` at the tail.
    /// Panics if the sample dimension does not match.
    pub fn push(&mut self, sample: &DVector<f64>) {
        assert_eq!(
            sample.len(),
            self.dim,
            "history sample: expected dim {}, got {}",
            self.dim,
            sample.len()
        );
        self.slots.rotate_left(1);
        let tail = self.slots.len() - 1;
        self.slots[tail].copy_from(sample);
    }

    /// Sample by age rank: 0 is the oldest retained, `len - 1` the newest.
    #[must_use]
    pub fn get(&self, index: usize) -> &DVector<f64> {
        &self.slots[index]
    }

    /// The most recent sample.
    #[must_use]
    pub fn latest(&self) -> &DVector<f64> {
        &self.slots[self.slots.len() - 1]
    }

    /// Every slot except the most recent, oldest first.
    #[must_use]
    pub fn window_excluding_latest(&self) -> &[DVector<f64>] {
        &self.slots[..self.slots.len() - 1]
    }

    /// All slots, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &DVector<f64>> {
        self.slots.iter()
    }

    /// Fill every element of every slot with `scale * N(0, 1)` noise.
    ///
    /// Called at episode reset so the policy never sees a degenerate
    /// all-zero history.
    pub fn reset_with_noise<R: Rng + ?Sized>(&mut self, rng: &mut R, scale: f64) {
        for slot in &mut self.slots {
            for value in slot.iter_mut() {
                let n: f64 = rng.sample(StandardNormal);
                *value = scale * n;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sample(value: f64) -> DVector<f64> {
        DVector::from_element(3, value)
    }

    // ---- construction ----

    #[test]
    fn new_buffer_is_zeroed() {
        let buf = HistoryBuffer::new(4, 3);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.dim(), 3);
        for slot in buf.iter() {
            assert!(slot.iter().all(|v| v.abs() < f64::EPSILON));
        }
    }

    #[test]
    #[should_panic(expected = "history length must be > 0")]
    fn zero_length_panics() {
        let _ = HistoryBuffer::new(0, 3);
    }

    // ---- push / rotation ----

    #[test]
    fn push_keeps_insertion_order_oldest_first() {
        let mut buf = HistoryBuffer::new(3, 3);
        for i in 1..=3 {
            buf.push(&sample(f64::from(i)));
        }
        for i in 0..3 {
            assert!((buf.get(i)[0] - (i as f64 + 1.0)).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn push_evicts_oldest() {
        let mut buf = HistoryBuffer::new(3, 3);
        for i in 1..=5 {
            buf.push(&sample(f64::from(i)));
        }
        // 1 and 2 evicted; 3, 4, 5 retained in order
        assert!((buf.get(0)[0] - 3.0).abs() < f64::EPSILON);
        assert!((buf.get(1)[0] - 4.0).abs() < f64::EPSILON);
        assert!((buf.latest()[0] - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn length_is_constant_across_pushes() {
        let mut buf = HistoryBuffer::new(2, 1);
        for i in 0..10 {
            buf.push(&DVector::from_element(1, f64::from(i)));
            assert_eq!(buf.len(), 2);
        }
    }

    #[test]
    #[should_panic(expected = "expected dim 3, got 2")]
    fn push_wrong_dim_panics() {
        let mut buf = HistoryBuffer::new(2, 3);
        buf.push(&DVector::zeros(2));
    }

    // ---- views ----

    #[test]
    fn window_excluding_latest_drops_newest() {
        let mut buf = HistoryBuffer::new(3, 1);
        for i in 1..=3 {
            buf.push(&DVector::from_element(1, f64::from(i)));
        }
        let window = buf.window_excluding_latest();
        assert_eq!(window.len(), 2);
        assert!((window[0][0] - 1.0).abs() < f64::EPSILON);
        assert!((window[1][0] - 2.0).abs() < f64::EPSILON);
        assert!((buf.latest()[0] - 3.0).abs() < f64::EPSILON);
    }

    // ---- noise reset ----

    #[test]
    fn reset_with_noise_fills_all_slots() {
        let mut buf = HistoryBuffer::new(4, 5);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        buf.reset_with_noise(&mut rng, 0.1);
        let nonzero = buf.iter().flat_map(|s| s.iter()).filter(|v| v.abs() > 0.0);
        assert_eq!(nonzero.count(), 20);
    }

    #[test]
    fn reset_with_noise_is_deterministic_per_seed() {
        let mut a = HistoryBuffer::new(2, 2);
        let mut b = HistoryBuffer::new(2, 2);
        a.reset_with_noise(&mut ChaCha8Rng::seed_from_u64(7), 0.1);
        b.reset_with_noise(&mut ChaCha8Rng::seed_from_u64(7), 0.1);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).norm() < f64::EPSILON);
        }
    }

    #[test]
    fn reset_with_noise_scale_bounds_magnitude() {
        let mut buf = HistoryBuffer::new(8, 8);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        buf.reset_with_noise(&mut rng, 0.1);
        // 0.1-scaled standard normal samples essentially never exceed 1.0
        assert!(buf.iter().flat_map(|s| s.iter()).all(|v| v.abs() < 1.0));
    }
}
