#![forbid(unsafe_code)]

use std::time::{Duration, Instant};

/// Result of a `RefreshScheduler::trigger` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
	/// A refresh is pending and will be due at `deadline`.
	Scheduled { deadline: Instant },

	/// The pending refresh has been postponed for too long; the caller must
	/// refresh now. The scheduler is already idle again.
	FlushNow,
}

/// Trailing debounce with a cap on how long a pending refresh can be postponed.
///
/// The cap is `window * max_postpones` measured from the first trigger of the
/// pending burst, so the size of a burst never forces a flush on its own.
/// Time is passed in explicitly so the owner decides how deadlines are awaited.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
	window: Duration,
	max_postponement: Duration,
	deadline: Option<Instant>,
	pending_since: Option<Instant>,
}

impl RefreshScheduler {
	pub fn new(window: Duration, max_postpones: u32) -> Self {
		Self {
			window,
			max_postponement: window.saturating_mul(max_postpones.max(1)),
			deadline: None,
			pending_since: None,
		}
	}

	/// Request a refresh; the deadline moves to `now + window`.
	pub fn trigger(&mut self, now: Instant) -> TriggerOutcome {
		let since = *self.pending_since.get_or_insert(now);
		if now.saturating_duration_since(since) >= self.max_postponement {
			self.reset();
			return TriggerOutcome::FlushNow;
		}

		let deadline = now + self.window;
		self.deadline = Some(deadline);
		TriggerOutcome::Scheduled { deadline }
	}

	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	pub fn is_pending(&self) -> bool {
		self.deadline.is_some()
	}

	/// First trigger of the pending burst.
	pub fn pending_since(&self) -> Option<Instant> {
		self.pending_since
	}

	/// Returns true (and goes idle) when the pending refresh is due.
	pub fn take_due(&mut self, now: Instant) -> bool {
		match self.deadline {
			Some(deadline) if now >= deadline => {
				self.reset();
				true
			}
			_ => false,
		}
	}

	/// Drop any pending refresh. Returns whether one was pending.
	pub fn cancel(&mut self) -> bool {
		let was_pending = self.deadline.is_some();
		self.reset();
		was_pending
	}

	fn reset(&mut self) {
		self.deadline = None;
		self.pending_since = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const WINDOW: Duration = Duration::from_millis(500);

	fn ms(n: u64) -> Duration {
		Duration::from_millis(n)
	}

	/// Feed triggers at the given offsets, polling every 10ms, and count flushes.
	fn run_offsets(offsets: &[u64], max_postpones: u32) -> usize {
		let t0 = Instant::now();
		let mut scheduler = RefreshScheduler::new(WINDOW, max_postpones);
		let mut runs = 0;
		let end = offsets.iter().copied().max().unwrap_or(0) + 2_000;

		let mut next = offsets.iter().copied().peekable();
		let mut t = 0;
		while t <= end {
			while next.peek() == Some(&t) {
				next.next();
				if scheduler.trigger(t0 + ms(t)) == TriggerOutcome::FlushNow {
					runs += 1;
				}
			}
			if scheduler.take_due(t0 + ms(t)) {
				runs += 1;
			}
			t += 10;
		}
		runs
	}

	#[test]
	fn burst_within_window_runs_once() {
		assert_eq!(run_offsets(&[0, 50, 100, 300, 450], 60), 1);
	}

	#[test]
	fn spaced_triggers_run_each_time() {
		assert_eq!(run_offsets(&[0, 600, 1_200, 1_800], 60), 4);
	}

	#[test]
	fn deadline_trails_the_last_trigger() {
		let t0 = Instant::now();
		let mut scheduler = RefreshScheduler::new(WINDOW, 60);
		scheduler.trigger(t0);
		scheduler.trigger(t0 + ms(400));

		assert!(!scheduler.take_due(t0 + ms(600)));
		assert!(scheduler.take_due(t0 + ms(900)));
		assert!(!scheduler.is_pending());
	}

	#[test]
	fn postpone_cap_forces_a_flush() {
		let t0 = Instant::now();
		let mut scheduler = RefreshScheduler::new(WINDOW, 3);

		// Each trigger lands inside the window of the previous one.
		for offset in [0, 400, 800, 1_200] {
			assert!(matches!(
				scheduler.trigger(t0 + ms(offset)),
				TriggerOutcome::Scheduled { .. }
			));
		}
		assert_eq!(scheduler.pending_since(), Some(t0));
		assert_eq!(scheduler.trigger(t0 + ms(1_500)), TriggerOutcome::FlushNow);
		assert!(!scheduler.is_pending());
		assert_eq!(scheduler.pending_since(), None);

		// The next burst starts its own budget.
		assert!(matches!(scheduler.trigger(t0 + ms(1_510)), TriggerOutcome::Scheduled { .. }));
		assert_eq!(scheduler.pending_since(), Some(t0 + ms(1_510)));
	}

	#[test]
	fn same_instant_burst_runs_once() {
		let t0 = Instant::now();
		let mut scheduler = RefreshScheduler::new(WINDOW, 60);

		for _ in 0..200 {
			assert!(matches!(scheduler.trigger(t0), TriggerOutcome::Scheduled { .. }));
		}
		assert!(!scheduler.take_due(t0 + ms(499)));
		assert!(scheduler.take_due(t0 + ms(500)));
		assert_eq!(run_offsets(&[0; 200], 60), 1);
	}

	#[test]
	fn endless_waggling_still_refreshes() {
		// 70s of triggers every 100ms: two forced flushes at the 30s cap, then
		// the trailing run once the triggers stop.
		let offsets: Vec<u64> = (0..700).map(|i| i * 100).collect();
		let runs = run_offsets(&offsets, 60);
		assert_eq!(runs, 3, "expected forced flushes, got {runs}");
	}

	#[test]
	fn cancel_discards_pending_refresh() {
		let t0 = Instant::now();
		let mut scheduler = RefreshScheduler::new(WINDOW, 60);
		scheduler.trigger(t0);

		assert!(scheduler.cancel());
		assert!(!scheduler.take_due(t0 + ms(1_000)));
		assert!(!scheduler.cancel());
	}
}
