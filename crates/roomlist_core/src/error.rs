#![forbid(unsafe_code)]

/// Failures reported by the external room/tag/group sources.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
	/// The source has not finished its initial load.
	#[error("source not ready: {0}")]
	NotReady(String),

	/// A historical-room resync failed.
	#[error("resync failed: {0}")]
	Resync(String),

	/// Other source failure.
	#[error("source error: {0}")]
	Other(String),
}

/// Errors for room list operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomListError {
	/// A source read failed during recomputation.
	#[error(transparent)]
	Source(#[from] SourceError),

	/// The service event bus is closed (service stopped).
	#[error("event bus is closed")]
	BusClosed,

	/// The service event bus is full.
	#[error("event bus is full")]
	BusFull,

	/// No consumer is listening for intents.
	#[error("intent channel is closed")]
	IntentsClosed,
}
