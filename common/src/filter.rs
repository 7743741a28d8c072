/// Depth of the temperature smoothing ring.
pub const FILTER_DEPTH: usize = 4;

/// Fixed-depth ring of raw temperature samples (tenths of a degree).
///
/// Insertion order does not matter for the average, so `append` simply
/// overwrites slots round-robin. Values are not range checked here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AveragingBuffer<const N: usize = FILTER_DEPTH> {
    slots: [i32; N],
    next: usize,
}

impl<const N: usize> AveragingBuffer<N> {
    pub fn new(seed: i32) -> Self {
        assert!(N > 0, "averaging buffer needs at least one slot");
        Self {
            slots: [seed; N],
            next: 0,
        }
    }

    /// Refills every slot with `seed` and restarts the ring position.
    pub fn initialize(&mut self, seed: i32) {
        self.slots = [seed; N];
        self.next = 0;
    }

    pub fn append(&mut self, sample: i32) {
        self.slots[self.next] = sample;
        self.next = (self.next + 1) % N;
    }

    /// Integer mean, computed on a sum scaled by 10 and scaled back down.
    /// Both divisions truncate toward zero.
    pub fn average(&self) -> i32 {
        let scaled: i64 = self.slots.iter().map(|&slot| i64::from(slot) * 10).sum();
        let mean = (scaled / N as i64) / 10;
        mean as i32
    }

    pub fn slots(&self) -> &[i32; N] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_fills_every_slot() {
        let buffer: AveragingBuffer = AveragingBuffer::new(720);
        assert_eq!(buffer.slots(), &[720; FILTER_DEPTH]);
        assert_eq!(buffer.average(), 720);
    }

    #[test]
    fn equal_samples_average_to_that_value() {
        let mut buffer: AveragingBuffer = AveragingBuffer::new(0);
        for _ in 0..FILTER_DEPTH {
            buffer.append(683);
        }
        assert_eq!(buffer.average(), 683);
    }

    #[test]
    fn mixed_samples_use_scaled_mean() {
        let mut buffer: AveragingBuffer = AveragingBuffer::new(0);
        for sample in [10, 20, 30, 40] {
            buffer.append(sample);
        }
        assert_eq!(buffer.average(), 25);
    }

    #[test]
    fn uneven_sum_rounds_toward_zero() {
        let mut buffer: AveragingBuffer = AveragingBuffer::new(0);
        for sample in [10, 10, 10, 11] {
            buffer.append(sample);
        }
        // 410 / 4 = 102, then / 10 = 10
        assert_eq!(buffer.average(), 10);
    }

    #[test]
    fn negative_mean_truncates_toward_zero() {
        let mut buffer: AveragingBuffer = AveragingBuffer::new(0);
        for sample in [-10, -10, -10, -11] {
            buffer.append(sample);
        }
        assert_eq!(buffer.average(), -10);
    }

    #[test]
    fn append_overwrites_oldest_slot() {
        let mut buffer: AveragingBuffer = AveragingBuffer::new(720);
        for sample in [600, 610, 620, 630, 640] {
            buffer.append(sample);
        }
        assert_eq!(buffer.slots(), &[640, 610, 620, 630]);
    }

    #[test]
    fn initialize_resets_ring() {
        let mut buffer: AveragingBuffer<3> = AveragingBuffer::new(1);
        buffer.append(9);
        buffer.initialize(5);
        buffer.append(2);
        assert_eq!(buffer.slots(), &[2, 5, 5]);
        assert_eq!(buffer.average(), 4);
    }
}
