// src/timer.rs
use std::time::{Duration, Instant};

/// Fires at most once per `period`, on the first poll at or after each due time.
///
/// Due times advance on a fixed grid from the start instant, so irregular
/// frame timing neither skips a refresh nor fires it twice. If several
/// periods elapse between polls, only one tick is reported. A due time past
/// what `Instant` can represent never fires.
#[derive(Debug, Clone)]
pub struct RefreshTimer {
    period: Duration,
    next_due: Option<Instant>,
}

impl RefreshTimer {
    /// First tick is due one `period` after `start`.
    pub fn new(period: Duration, start: Instant) -> Self {
        let period = period.max(Duration::from_millis(1));
        Self {
            period,
            next_due: start.checked_add(period),
        }
    }

    /// First tick is due immediately.
    pub fn immediate(period: Duration, start: Instant) -> Self {
        let mut timer = Self::new(period, start);
        timer.next_due = Some(start);
        timer
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due.filter(|due| now >= *due) else {
            return false;
        };

        let behind = now.duration_since(due);
        let skipped = behind.as_nanos() / self.period.as_nanos();
        self.next_due = u32::try_from(skipped + 1)
            .ok()
            .and_then(|periods| self.period.checked_mul(periods))
            .and_then(|advance| due.checked_add(advance));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    #[test]
    fn fires_once_per_period_under_jitter() {
        let t0 = Instant::now();
        let mut timer = RefreshTimer::new(Duration::from_secs(5), t0);

        let frames = [16, 4990, 5003, 5021, 9998, 10_040, 10_050];
        let fired: Vec<bool> = frames.iter().map(|&f| timer.poll(ms(t0, f))).collect();
        assert_eq!(fired, vec![false, false, true, false, false, true, false]);
    }

    #[test]
    fn long_stall_reports_single_tick_and_realigns() {
        let t0 = Instant::now();
        let mut timer = RefreshTimer::new(Duration::from_secs(5), t0);

        assert!(timer.poll(ms(t0, 17_000)));
        assert_eq!(timer.next_due(), Some(ms(t0, 20_000)));
        assert!(!timer.poll(ms(t0, 19_999)));
        assert!(timer.poll(ms(t0, 20_000)));
    }

    #[test]
    fn immediate_timer_fires_on_first_poll() {
        let t0 = Instant::now();
        let mut timer = RefreshTimer::immediate(Duration::from_secs(5), t0);
        assert!(timer.poll(t0));
        assert!(!timer.poll(ms(t0, 100)));
    }

    #[test]
    fn unrepresentable_period_never_fires() {
        let t0 = Instant::now();
        let mut timer = RefreshTimer::immediate(Duration::MAX, t0);
        assert!(timer.poll(t0));
        assert_eq!(timer.next_due(), None);
        assert!(!timer.poll(ms(t0, 60_000)));
    }
}
