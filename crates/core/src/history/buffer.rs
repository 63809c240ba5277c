/// Fixed-capacity ring of samples.
///
/// Every slot always holds a value (the seed until overwritten), and the
/// aggregates scan all `N` of them.
#[derive(Debug, Clone)]
pub struct RollingSampleBuffer<T, const N: usize> {
    slots: [T; N],
    cursor: usize,
}

impl<T, const N: usize> RollingSampleBuffer<T, N>
where
    T: Copy + Ord + Into<i128> + TryFrom<i128>,
{
    const NON_EMPTY: () = assert!(N > 0, "a rolling sample buffer needs at least one slot");

    pub fn filled(seed: T) -> Self {
        let () = Self::NON_EMPTY;
        Self {
            slots: [seed; N],
            cursor: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn push(&mut self, sample: T) {
        self.slots[self.cursor] = sample;
        self.cursor = (self.cursor + 1) % N;
    }

    /// The slot the next push overwrites.
    pub fn oldest(&self) -> T {
        self.slots[self.cursor]
    }

    pub fn latest(&self) -> T {
        self.slots[(self.cursor + N - 1) % N]
    }

    pub fn fill(&mut self, seed: T) {
        self.slots = [seed; N];
        self.cursor = 0;
    }

    pub fn minimum(&self) -> T {
        let mut min = self.slots[0];
        for &sample in &self.slots[1..] {
            min = min.min(sample);
        }
        min
    }

    pub fn maximum(&self) -> T {
        let mut max = self.slots[0];
        for &sample in &self.slots[1..] {
            max = max.max(sample);
        }
        max
    }

    pub fn sum(&self) -> i128 {
        self.slots.iter().map(|&s| s.into()).sum()
    }

    pub fn average(&self) -> T {
        // The mean of in-range values is itself in range.
        T::try_from(self.sum() / N as i128).unwrap_or_else(|_| self.maximum())
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.slots[self.cursor..]
            .iter()
            .chain(&self.slots[..self.cursor])
            .copied()
    }
}
