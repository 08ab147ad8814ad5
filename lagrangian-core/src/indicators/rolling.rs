//! Fixed-capacity rolling window with a sliding Welford accumulator.
//!
//! Each push is O(1): the sample leaving the window is removed from the running
//! mean and sum of squared deviations, then the entering sample is added. This
//! avoids the cancellation error of the naive `E[x^2] - E[x]^2` formulation.
//!
//! Removal leaves a little rounding residue in the running sums. The window
//! recomputes them exactly from its slots once every `capacity` pushes, and
//! whenever a removal collapses M2 towards zero.
//!
//! Missing samples (`None`) occupy a slot so the window always spans the same
//! number of rows, but they do not count towards `count()`.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    slots: VecDeque<Option<f64>>,
    count: usize,
    mean: f64,
    m2: f64,
    since_resync: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "rolling window capacity must be >= 1");
        Self {
            capacity,
            slots: VecDeque::with_capacity(capacity),
            count: 0,
            mean: 0.0,
            m2: 0.0,
            since_resync: 0,
        }
    }

    /// Slide the window forward by one row.
    pub fn push(&mut self, value: Option<f64>) {
        if self.slots.len() == self.capacity {
            if let Some(Some(old)) = self.slots.pop_front() {
                self.remove(old);
            }
        }
        self.slots.push_back(value);
        if let Some(x) = value {
            self.add(x);
        }

        self.since_resync += 1;
        if self.since_resync >= self.capacity {
            self.resync();
        }
    }

    /// Recompute count, mean and M2 exactly from the slots.
    fn resync(&mut self) {
        self.since_resync = 0;
        let defined = || self.slots.iter().flatten().copied();
        let count = defined().count();
        if count == 0 {
            self.count = 0;
            self.mean = 0.0;
            self.m2 = 0.0;
            return;
        }
        let mean = defined().sum::<f64>() / count as f64;
        let m2 = defined().map(|x| (x - mean) * (x - mean)).sum();
        self.count = count;
        self.mean = mean;
        self.m2 = m2;
    }

    fn add(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    fn remove(&mut self, x: f64) {
        if self.count <= 1 {
            self.count = 0;
            self.mean = 0.0;
            self.m2 = 0.0;
            return;
        }
        let m2_before = self.m2;
        self.count -= 1;
        let delta = x - self.mean;
        self.mean -= delta / self.count as f64;
        self.m2 -= delta * (x - self.mean);
        if m2_before > 0.0 && self.m2 <= m2_before * 1e-9 {
            self.resync();
        }
    }

    /// Rows currently in the window, defined or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Defined samples currently in the window.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Population variance (divide by N).
    pub fn variance(&self) -> Option<f64> {
        (self.count > 0).then(|| self.m2 / self.count as f64)
    }

    /// Population standard deviation.
    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }
}
