//! Pending/displayed bookkeeping behind the typewriter-style log reveal.

use std::collections::VecDeque;

use super::record::LogRecord;

/// A record that made it to the screen, keyed by arrival order.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayedLog {
	pub seq: u64,
	pub record: LogRecord,
}

/// Subscription the queue currently accepts records from. Bumped on reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Epoch(u64);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogQueue {
	noise: Vec<String>,
	pending: VecDeque<LogRecord>,
	displayed: Vec<DisplayedLog>,
	next_seq: u64,
	received: bool,
	epoch: Epoch,
}

impl LogQueue {
	pub fn new<I, S>(noise: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self {
			noise: noise
				.into_iter()
				.map(|p| p.as_ref().to_lowercase())
				.filter(|p| !p.is_empty())
				.collect(),
			..Self::default()
		}
	}

	pub fn is_noise(&self, message: &str) -> bool {
		let message = message.to_lowercase();
		self.noise.iter().any(|p| message.contains(p.as_str()))
	}

	/// Queue a record unless it is noise. Returns whether it was kept.
	pub fn push(&mut self, record: LogRecord) -> bool {
		if self.is_noise(&record.message) {
			return false;
		}
		self.received = true;
		self.pending.push_back(record);
		true
	}

	/// Like [`LogQueue::push`], but drops records delivered to a subscription
	/// opened before the last reset.
	pub fn push_for(&mut self, epoch: Epoch, record: LogRecord) -> bool {
		if epoch != self.epoch {
			return false;
		}
		self.push(record)
	}

	pub fn epoch(&self) -> Epoch {
		self.epoch
	}

	/// Move the oldest pending record to the displayed list.
	pub fn drain_one(&mut self) -> Option<&DisplayedLog> {
		let record = self.pending.pop_front()?;
		self.displayed.push(DisplayedLog {
			seq: self.next_seq,
			record,
		});
		self.next_seq += 1;
		self.displayed.last()
	}

	/// Forget everything, including whether anything was ever received, and
	/// start a new epoch.
	pub fn reset(&mut self) -> Epoch {
		self.pending.clear();
		self.displayed.clear();
		self.received = false;
		self.epoch = Epoch(self.epoch.0 + 1);
		self.epoch
	}

	pub fn displayed(&self) -> &[DisplayedLog] {
		&self.displayed
	}

	pub fn displayed_len(&self) -> usize {
		self.displayed.len()
	}

	pub fn pending_len(&self) -> usize {
		self.pending.len()
	}

	pub fn has_received(&self) -> bool {
		self.received
	}

	/// Share of received records already on screen, in percent.
	pub fn progress(&self) -> f64 {
		let (shown, waiting) = (self.displayed.len(), self.pending.len());
		if waiting == 0 {
			return 100.0;
		}
		100.0 * shown as f64 / (shown + waiting) as f64
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn record(message: &str) -> LogRecord {
		LogRecord {
			message: message.into(),
			..LogRecord::default()
		}
	}

	fn queue() -> LogQueue {
		LogQueue::new(["health check", "joined room", "connected"])
	}

	#[test]
	fn drains_one_record_per_tick_in_order() {
		let mut q = queue();
		for i in 0..5 {
			assert!(q.push(record(&format!("line {i}"))));
		}
		for tick in 1..=5 {
			assert!(q.drain_one().is_some());
			assert_eq!(q.displayed_len(), tick);
			assert_eq!(q.pending_len(), 5 - tick);
		}
		assert!(q.drain_one().is_none());
		let messages: Vec<_> = q.displayed().iter().map(|d| d.record.message.as_str()).collect();
		assert_eq!(messages, ["line 0", "line 1", "line 2", "line 3", "line 4"]);
	}

	#[test]
	fn noise_is_dropped_regardless_of_case() {
		let mut q = queue();
		assert!(!q.push(record("Health Check OK")));
		assert!(!q.push(record("client JOINED ROOM abc")));
		assert!(!q.push(record("Socket Connected")));
		assert!(!q.has_received());
		assert!(q.push(record("Crawling https://example.com")));
		assert!(q.has_received());
		while q.drain_one().is_some() {}
		assert_eq!(q.displayed_len(), 1);
	}

	#[test]
	fn progress_tracks_reveal() {
		let mut q = queue();
		assert_eq!(q.progress(), 100.0);
		for i in 0..4 {
			q.push(record(&format!("{i}")));
		}
		assert_eq!(q.progress(), 0.0);
		q.drain_one();
		assert_eq!(q.progress(), 25.0);
		q.drain_one();
		q.drain_one();
		assert_eq!(q.progress(), 75.0);
		q.drain_one();
		assert_eq!(q.progress(), 100.0);
	}

	#[test]
	fn reset_clears_both_lists() {
		let mut q = queue();
		q.push(record("a"));
		q.push(record("b"));
		q.drain_one();
		q.reset();
		assert_eq!((q.displayed_len(), q.pending_len()), (0, 0));
		assert!(!q.has_received());

		q.push(record("c"));
		let first = q.drain_one().unwrap();
		assert_eq!(first.record.message, "c");
		// keys keep growing so old rows are never reused
		assert_eq!(first.seq, 1);
	}

	#[test]
	fn records_from_previous_subscription_are_dropped() {
		let mut q = queue();
		let old = q.epoch();
		assert!(q.push_for(old, record("old a")));
		q.drain_one();
		assert!(q.push_for(old, record("old b")));

		let current = q.reset();
		assert_ne!(current, old);
		assert!(!q.push_for(old, record("late from old task")));
		assert_eq!((q.displayed_len(), q.pending_len()), (0, 0));
		assert!(!q.has_received());

		assert!(q.push_for(current, record("new task")));
		while q.drain_one().is_some() {}
		let messages: Vec<_> = q.displayed().iter().map(|d| d.record.message.as_str()).collect();
		assert_eq!(messages, ["new task"]);
	}
}
