// src/smoothing.rs - Majority-vote smoothing with hysteresis
use crate::gesture::GestureLabel;
use std::collections::VecDeque;
use tracing::debug;

/// Bounded FIFO of raw labels in arrival order (oldest at the front).
#[derive(Debug, Clone)]
pub struct GestureHistory {
    labels: VecDeque<GestureLabel>,
    capacity: usize,
}

impl GestureHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            labels: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, label: GestureLabel) {
        if self.labels.len() == self.capacity {
            self.labels.pop_front();
        }
        self.labels.push_back(label);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &GestureLabel> {
        self.labels.iter()
    }

    /// Label with the highest count. Ties go to the label first seen
    /// walking from oldest to newest.
    pub fn most_common(&self) -> Option<(GestureLabel, usize)> {
        let mut tally: Vec<(GestureLabel, usize)> = Vec::with_capacity(self.labels.len());
        for label in &self.labels {
            match tally.iter_mut().find(|(seen, _)| seen == label) {
                Some((_, count)) => *count += 1,
                None => tally.push((*label, 1)),
            }
        }

        let mut best: Option<(GestureLabel, usize)> = None;
        for (label, count) in tally {
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((label, count));
            }
        }
        best
    }
}

#[derive(Debug, Clone)]
pub struct TemporalSmoother {
    history: GestureHistory,
    stable: GestureLabel,
    switch_ratio_percent: usize,
}

impl Default for TemporalSmoother {
    fn default() -> Self {
        Self::new(5, 60)
    }
}

impl TemporalSmoother {
    pub fn new(window: usize, switch_ratio_percent: u8) -> Self {
        Self {
            history: GestureHistory::new(window),
            stable: GestureLabel::NoHand,
            switch_ratio_percent: usize::from(switch_ratio_percent.clamp(1, 100)),
        }
    }

    pub fn stable(&self) -> GestureLabel {
        self.stable
    }

    pub fn history(&self) -> &GestureHistory {
        &self.history
    }

    /// Feed one raw label (once per frame, in arrival order) and return the stable label.
    pub fn update(&mut self, raw: GestureLabel) -> GestureLabel {
        self.history.push(raw);

        let Some((candidate, count)) = self.history.most_common() else {
            return self.stable;
        };

        if candidate != self.stable && self.meets_threshold(count) {
            debug!(
                "Stable gesture {} -> {} ({}/{})",
                self.stable,
                candidate,
                count,
                self.history.len()
            );
            self.stable = candidate;
        }

        self.stable
    }

    /// `count >= ceil(ratio * len)`, computed against the current history
    /// length so a partly filled window can still switch.
    fn meets_threshold(&self, count: usize) -> bool {
        count * 100 >= self.history.len() * self.switch_ratio_percent
    }

    pub fn reset(&mut self) {
        self.history = GestureHistory::new(self.history.capacity());
        self.stable = GestureLabel::NoHand;
    }
}
