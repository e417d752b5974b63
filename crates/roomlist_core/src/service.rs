#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Instant;

use roomlist_domain::UserId;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::RoomListConfig;
use crate::error::RoomListError;
use crate::events::RoomListEvent;
use crate::sections::RoomListIntent;
use crate::source::RoomListSource;
use crate::view::{RoomListSnapshot, RoomListView, ViewEffect};

/// Cloneable sender for event sources.
#[derive(Debug, Clone)]
pub struct RoomListNotifier {
	events_tx: mpsc::Sender<RoomListEvent>,
}

impl RoomListNotifier {
	/// Queue an event, waiting for bus capacity.
	pub async fn notify(&self, event: RoomListEvent) -> Result<(), RoomListError> {
		self.events_tx.send(event).await.map_err(|_| RoomListError::BusClosed)
	}

	/// Queue an event without waiting.
	pub fn try_notify(&self, event: RoomListEvent) -> Result<(), RoomListError> {
		match self.events_tx.try_send(event) {
			Ok(()) => Ok(()),
			Err(TrySendError::Full(_)) => Err(RoomListError::BusFull),
			Err(TrySendError::Closed(_)) => Err(RoomListError::BusClosed),
		}
	}
}

/// Owner handle of a running room list service.
///
/// Dropping it stops the service the same way `shutdown` does.
#[derive(Debug)]
pub struct RoomListHandle {
	notifier: RoomListNotifier,
	snapshots_rx: watch::Receiver<Arc<RoomListSnapshot>>,
	intents_tx: mpsc::Sender<RoomListIntent>,
	shutdown_tx: Option<oneshot::Sender<()>>,
	join: Option<JoinHandle<()>>,
}

impl RoomListHandle {
	pub async fn notify(&self, event: RoomListEvent) -> Result<(), RoomListError> {
		self.notifier.notify(event).await
	}

	pub fn try_notify(&self, event: RoomListEvent) -> Result<(), RoomListError> {
		self.notifier.try_notify(event)
	}

	pub fn notifier(&self) -> RoomListNotifier {
		self.notifier.clone()
	}

	pub fn snapshots(&self) -> watch::Receiver<Arc<RoomListSnapshot>> {
		self.snapshots_rx.clone()
	}

	/// Latest published snapshot.
	pub fn current(&self) -> Arc<RoomListSnapshot> {
		self.snapshots_rx.borrow().clone()
	}

	/// Forward an intent to the consumer. Fire-and-forget: a full channel drops it.
	pub fn invoke(&self, intent: RoomListIntent) -> Result<(), RoomListError> {
		match self.intents_tx.try_send(intent) {
			Ok(()) => {
				debug!(?intent, "intent dispatched");
				Ok(())
			}
			Err(TrySendError::Full(intent)) => {
				warn!(?intent, "intent dropped: consumer is not keeping up");
				Ok(())
			}
			Err(TrySendError::Closed(_)) => Err(RoomListError::IntentsClosed),
		}
	}

	/// Stop the service and wait for it to finish.
	pub async fn shutdown(mut self) {
		if let Some(tx) = self.shutdown_tx.take() {
			let _ = tx.send(());
		}
		if let Some(join) = self.join.take()
			&& let Err(e) = join.await
		{
			warn!(error = %e, "room list task ended abnormally");
		}
	}
}

/// Start the room list on the current tokio runtime.
///
/// Returns the handle and the receiving end of the intent channel.
pub fn spawn_room_list<S>(
	source: Arc<S>,
	local_user: UserId,
	config: RoomListConfig,
) -> (RoomListHandle, mpsc::Receiver<RoomListIntent>)
where
	S: RoomListSource + ?Sized,
{
	let (events_tx, events_rx) = mpsc::channel(config.event_bus_capacity.max(1));
	let (intents_tx, intents_rx) = mpsc::channel(config.intent_capacity.max(1));
	let (snapshots_tx, snapshots_rx) = watch::channel(Arc::new(RoomListSnapshot::default()));
	let (shutdown_tx, shutdown_rx) = oneshot::channel();

	let view = RoomListView::new(source, local_user, &config);
	let task = ServiceTask {
		view,
		events_rx,
		feedback_tx: events_tx.downgrade(),
		snapshots_tx,
	};
	let join = tokio::spawn(task.run(shutdown_rx));

	let handle = RoomListHandle {
		notifier: RoomListNotifier { events_tx },
		snapshots_rx,
		intents_tx,
		shutdown_tx: Some(shutdown_tx),
		join: Some(join),
	};
	(handle, intents_rx)
}

struct ServiceTask<S: RoomListSource + ?Sized> {
	view: RoomListView<S>,
	events_rx: mpsc::Receiver<RoomListEvent>,
	/// Weak so the task never keeps its own bus open.
	feedback_tx: mpsc::WeakSender<RoomListEvent>,
	snapshots_tx: watch::Sender<Arc<RoomListSnapshot>>,
}

impl<S: RoomListSource + ?Sized> ServiceTask<S> {
	async fn run(mut self, mut shutdown_rx: oneshot::Receiver<()>) {
		match self.view.mount() {
			Ok(snapshot) => self.publish(snapshot),
			Err(e) => error!(error = %e, "initial room list refresh failed"),
		}

		loop {
			let deadline = self.view.next_deadline().map(tokio::time::Instant::from_std);

			tokio::select! {
				_ = &mut shutdown_rx => {
					info!("room list shutdown requested");
					break;
				}

				event = self.events_rx.recv() => {
					let Some(event) = event else {
						info!("room list event bus closed");
						break;
					};
					match self.view.handle_event(event, Instant::now()) {
						Ok(effects) => self.apply(effects),
						Err(e) => error!(error = %e, "room list refresh failed"),
					}
				}

				_ = async {
					if let Some(deadline) = deadline {
						tokio::time::sleep_until(deadline).await;
					}
				}, if deadline.is_some() => {
					match self.view.poll_refresh(Instant::now()) {
						Ok(Some(snapshot)) => self.publish(snapshot),
						Ok(None) => {}
						Err(e) => error!(error = %e, "room list refresh failed"),
					}
				}
			}
		}

		self.view.shutdown();
	}

	fn apply(&self, effects: Vec<ViewEffect>) {
		for effect in effects {
			match effect {
				ViewEffect::Publish(snapshot) => self.publish(snapshot),
				ViewEffect::SyncArchivedRooms => self.spawn_archive_sync(),
			}
		}
	}

	fn publish(&self, snapshot: Arc<RoomListSnapshot>) {
		self.snapshots_tx.send_replace(snapshot);
	}

	fn spawn_archive_sync(&self) {
		let source = Arc::clone(self.view.source());
		let feedback_tx = self.feedback_tx.clone();

		tokio::spawn(async move {
			let error = source.sync_left_rooms().await.err();
			debug!(failed = error.is_some(), "historical room resync finished");
			if let Some(tx) = feedback_tx.upgrade() {
				let _ = tx.send(RoomListEvent::ArchivedSyncFinished { error }).await;
			}
		});
	}
}
