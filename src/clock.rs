//! Wall-clock capability and the millisecond timestamp used by every artifact.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::_prelude::*;

/// Instant expressed as milliseconds since the Unix epoch.
///
/// Persisted documents carry timestamps in this exact form, so the newtype serializes as a bare
/// integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);
impl Timestamp {
	/// Unix epoch.
	pub const EPOCH: Self = Self(0);

	/// Wraps raw epoch milliseconds.
	pub const fn from_epoch_millis(millis: i64) -> Self {
		Self(millis)
	}

	/// Returns the raw epoch milliseconds.
	pub const fn epoch_millis(self) -> i64 {
		self.0
	}

	/// Converts an [`OffsetDateTime`], saturating at the `i64` millisecond range.
	pub fn from_datetime(moment: OffsetDateTime) -> Self {
		let millis = moment.unix_timestamp_nanos() / 1_000_000;

		Self(i64::try_from(millis).unwrap_or(if millis.is_negative() { i64::MIN } else { i64::MAX }))
	}

	/// Converts back into an [`OffsetDateTime`] when the value is within `time`'s range.
	pub fn to_datetime(self) -> Option<OffsetDateTime> {
		OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.0) * 1_000_000).ok()
	}

	/// Parses an RFC 3339 instant such as `2024-05-01T10:00:00.1234567Z`.
	pub fn parse_rfc3339(raw: &str) -> Result<Self, time::error::Parse> {
		OffsetDateTime::parse(raw, &Rfc3339).map(Self::from_datetime)
	}

	/// Returns the instant shifted by `offset`, saturating on overflow.
	pub fn saturating_add(self, offset: Duration) -> Self {
		let millis = offset.whole_milliseconds();
		let millis = i64::try_from(millis)
			.unwrap_or(if millis.is_negative() { i64::MIN } else { i64::MAX });

		Self(self.0.saturating_add(millis))
	}
}
impl Display for Timestamp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self.to_datetime().and_then(|moment| moment.format(&Rfc3339).ok()) {
			Some(formatted) => f.write_str(&formatted),
			None => write!(f, "{}ms", self.0),
		}
	}
}

/// Source of "now" for expiry checks and expiry computation.
pub trait Clock
where
	Self: 'static + Send + Sync + Debug,
{
	/// Returns the current instant.
	fn now(&self) -> Timestamp;
}

/// Clock backed by the operating system's UTC time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> Timestamp {
		Timestamp::from_datetime(OffsetDateTime::now_utc())
	}
}

/// Manually driven clock for deterministic expiry handling.
///
/// Clones share the same instant.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<Timestamp>>);
impl ManualClock {
	/// Creates a clock frozen at `now`.
	pub fn new(now: Timestamp) -> Self {
		Self(Arc::new(Mutex::new(now)))
	}

	/// Moves the clock to `now`.
	pub fn set(&self, now: Timestamp) {
		*self.0.lock() = now;
	}

	/// Moves the clock forward by `offset`.
	pub fn advance(&self, offset: Duration) {
		let mut now = self.0.lock();

		*now = now.saturating_add(offset);
	}
}
impl Clock for ManualClock {
	fn now(&self) -> Timestamp {
		*self.0.lock()
	}
}
