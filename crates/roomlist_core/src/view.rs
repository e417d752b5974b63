#![forbid(unsafe_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use roomlist_domain::{RoomId, Tag, UserId};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::conference::{ConferenceDetector, ConferenceRoomDetector};
use crate::config::RoomListConfig;
use crate::error::RoomListError;
use crate::events::{EventAction, RoomListEvent, classify};
use crate::group_cache::GroupMembershipCache;
use crate::partition::partition;
use crate::scheduler::{RefreshScheduler, TriggerOutcome};
use crate::sections::{AssemblyInput, Section, SectionKey, assemble};
use crate::source::{RoomInfo, RoomListSource, TaggedRoomLists};
use crate::visibility::compute_visible_rooms;

/// Immutable result of one render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoomListSnapshot {
	/// Increases with every render of the same view.
	pub generation: u64,
	pub sections: Vec<Section>,
	/// Rooms across all filtered lists; a room with two tags counts twice.
	pub total_room_count: usize,
	/// Tag selection as of the last refresh.
	pub selected_tags: Vec<Tag>,
	pub incoming_call: Option<RoomId>,
}

impl RoomListSnapshot {
	pub fn section(&self, key: &SectionKey) -> Option<&Section> {
		self.sections.iter().find(|section| &section.key == key)
	}

	pub fn section_for_tag(&self, tag: &Tag) -> Option<&Section> {
		self.sections.iter().find(|section| match &section.key {
			SectionKey::Tag(t) => t == tag,
			SectionKey::CommunityInvites => false,
		})
	}
}

/// Work the view hands back to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEffect {
	Publish(Arc<RoomListSnapshot>),
	/// Start a historical room resync and report back with `ArchivedSyncFinished`.
	SyncArchivedRooms,
}

type Detector = Box<dyn ConferenceDetector + Send + Sync>;

/// The synchronous room list pipeline.
///
/// Owns the scheduler, the group cache and the visible set; everything else is
/// read from the source on each refresh. Time is passed in by the caller.
pub struct RoomListView<S: RoomListSource + ?Sized> {
	source: Arc<S>,
	local_user: UserId,
	conference: Detector,
	scheduler: RefreshScheduler,
	group_cache: GroupMembershipCache,
	visible: HashSet<RoomId>,
	filtered: TaggedRoomLists,
	selected_tags: Vec<Tag>,
	search_filter: Option<String>,
	incoming_call: Option<RoomId>,
	loading_archived: bool,
	generation: u64,
	snapshot: Option<Arc<RoomListSnapshot>>,
}

impl<S: RoomListSource + ?Sized> RoomListView<S> {
	pub fn new(source: Arc<S>, local_user: UserId, config: &RoomListConfig) -> Self {
		let conference: Detector = if config.hide_conference_rooms {
			Box::new(ConferenceRoomDetector::new(config.conference_user_prefix.clone()))
		} else {
			Box::new(|_: &RoomInfo, _: &UserId| false)
		};

		Self {
			source,
			local_user,
			conference,
			scheduler: RefreshScheduler::new(config.debounce, config.max_postpones),
			group_cache: GroupMembershipCache::new(),
			visible: HashSet::new(),
			filtered: TaggedRoomLists::new(),
			selected_tags: Vec::new(),
			search_filter: None,
			incoming_call: None,
			loading_archived: false,
			generation: 0,
			snapshot: None,
		}
	}

	/// Replace the conference room detector.
	pub fn with_conference_detector(mut self, detector: impl ConferenceDetector + Send + Sync + 'static) -> Self {
		self.conference = Box::new(detector);
		self
	}

	pub fn source(&self) -> &Arc<S> {
		&self.source
	}

	pub fn visible_rooms(&self) -> &HashSet<RoomId> {
		&self.visible
	}

	/// Last published snapshot.
	pub fn snapshot(&self) -> Option<&Arc<RoomListSnapshot>> {
		self.snapshot.as_ref()
	}

	/// When the pending refresh is due, if one is pending.
	pub fn next_deadline(&self) -> Option<Instant> {
		self.scheduler.deadline()
	}

	/// Build all state from scratch and render.
	pub fn mount(&mut self) -> Result<Arc<RoomListSnapshot>, RoomListError> {
		let groups = self.refresh_group_caches();
		let snapshot = self.refresh()?;
		info!(
			user = %self.local_user,
			groups,
			sections = snapshot.sections.len(),
			"room list mounted"
		);
		Ok(snapshot)
	}

	/// Apply one event. Refresh failures are returned; the previous snapshot stays.
	pub fn handle_event(&mut self, event: RoomListEvent, now: Instant) -> Result<Vec<ViewEffect>, RoomListError> {
		let action = classify(&event, &self.local_user);
		debug!(event = event.kind(), ?action, "room list event");

		let published = match action {
			EventAction::Ignore => None,
			EventAction::ScheduleRefresh => self.schedule(now)?,
			EventAction::RecomputeVisibility => {
				self.recompute_visibility();
				self.schedule(now)?
			}
			EventAction::RefreshGroups => {
				self.refresh_group_caches();
				self.recompute_visibility();
				self.schedule(now)?
			}
			EventAction::ForceRender => {
				self.apply_render_state(event);
				Some(self.render())
			}
			EventAction::Archived => return Ok(self.handle_archived(event)),
		};

		Ok(published.into_iter().map(ViewEffect::Publish).collect())
	}

	/// Run the pending refresh if it is due.
	pub fn poll_refresh(&mut self, now: Instant) -> Result<Option<Arc<RoomListSnapshot>>, RoomListError> {
		if !self.scheduler.take_due(now) {
			return Ok(None);
		}
		self.refresh().map(Some)
	}

	/// Full recompute against the current source state.
	pub fn refresh(&mut self) -> Result<Arc<RoomListSnapshot>, RoomListError> {
		metrics::counter!("roomlist_refresh_total").increment(1);

		let lists = self.source.tagged_room_lists().inspect_err(|_| {
			metrics::counter!("roomlist_refresh_errors_total").increment(1);
		})?;

		self.recompute_visibility();
		self.selected_tags = self.source.selected_tags();
		self.filtered = partition(
			&lists,
			&self.visible,
			&*self.source,
			&self.local_user,
			&*self.conference,
		);

		debug!(
			tags = lists.len(),
			visible = self.visible.len(),
			total = self.filtered.total_rooms(),
			"room lists recomputed"
		);

		Ok(self.render())
	}

	/// Drop any pending refresh. Returns whether one was pending.
	pub fn shutdown(&mut self) -> bool {
		let cancelled = self.scheduler.cancel();
		info!(cancelled, "room list unmounted");
		cancelled
	}

	fn schedule(&mut self, now: Instant) -> Result<Option<Arc<RoomListSnapshot>>, RoomListError> {
		match self.scheduler.trigger(now) {
			TriggerOutcome::Scheduled { deadline } => {
				debug!(
					in_ms = deadline.saturating_duration_since(now).as_millis() as u64,
					"refresh scheduled"
				);
				Ok(None)
			}
			TriggerOutcome::FlushNow => {
				metrics::counter!("roomlist_forced_flush_total").increment(1);
				warn!("refresh postponed too many times; flushing now");
				self.refresh().map(Some)
			}
		}
	}

	fn refresh_group_caches(&mut self) -> usize {
		let mut refreshed = 0;
		for tag in self.source.ordered_tags() {
			if self.group_cache.refresh_for_tag(&tag, &*self.source, &self.local_user) {
				refreshed += 1;
			}
		}
		refreshed
	}

	fn recompute_visibility(&mut self) {
		let selected = self.source.selected_tags();
		self.visible = compute_visible_rooms(&selected, &self.group_cache, &*self.source);
	}

	fn apply_render_state(&mut self, event: RoomListEvent) {
		match event {
			RoomListEvent::SearchFilterChanged { filter } => {
				self.search_filter = filter.filter(|f| !f.is_empty());
			}
			RoomListEvent::CallStateChanged { room, ringing } => {
				self.incoming_call = ringing.then_some(room);
			}
			_ => {}
		}
	}

	fn handle_archived(&mut self, event: RoomListEvent) -> Vec<ViewEffect> {
		match event {
			RoomListEvent::ArchivedSectionToggled { hidden: false } => {
				self.loading_archived = true;
				vec![ViewEffect::Publish(self.render()), ViewEffect::SyncArchivedRooms]
			}
			RoomListEvent::ArchivedSyncFinished { error } => {
				if let Some(err) = error {
					warn!(error = %err, "historical room resync failed");
				}
				self.loading_archived = false;
				vec![ViewEffect::Publish(self.render())]
			}
			_ => Vec::new(),
		}
	}

	fn render(&mut self) -> Arc<RoomListSnapshot> {
		let groups = self.source.groups();
		let sections = assemble(&AssemblyInput {
			lists: &self.filtered,
			groups: &groups,
			search_filter: self.search_filter.as_deref(),
			loading_archived: self.loading_archived,
		});

		self.generation += 1;
		let snapshot = Arc::new(RoomListSnapshot {
			generation: self.generation,
			sections,
			total_room_count: self.filtered.total_rooms(),
			selected_tags: self.selected_tags.clone(),
			incoming_call: self.incoming_call.clone(),
		});

		metrics::counter!("roomlist_render_total").increment(1);
		debug!(
			generation = snapshot.generation,
			sections = snapshot.sections.len(),
			total = snapshot.total_room_count,
			"room list rendered"
		);

		self.snapshot = Some(snapshot.clone());
		snapshot
	}
}
