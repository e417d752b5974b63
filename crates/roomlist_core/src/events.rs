#![forbid(unsafe_code)]

use roomlist_domain::{RoomId, UserId};

use crate::error::SourceError;

/// Account data type carrying the direct-message map.
pub const DIRECT_ACCOUNT_DATA: &str = "m.direct";

/// Change notifications the room list reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomListEvent {
	RoomCreated { room: RoomId },
	RoomDeleted { room: RoomId },
	ReceiptRecorded { room: RoomId, readers: Vec<UserId> },
	MemberNameChanged { room: RoomId, user: UserId },
	EventDecrypted { room: RoomId },
	AccountDataChanged { event_type: String },
	/// The local user's membership in some group changed.
	GroupMyMembershipChanged,
	GroupDataChanged,
	TagSelectionChanged,
	TaggedRoomListsChanged,
	SearchFilterChanged { filter: Option<String> },
	CallStateChanged { room: RoomId, ringing: bool },
	ArchivedSectionToggled { hidden: bool },
	ArchivedSyncFinished { error: Option<SourceError> },
}

impl RoomListEvent {
	/// Short name used in logs.
	pub fn kind(&self) -> &'static str {
		match self {
			RoomListEvent::RoomCreated { .. } => "room_created",
			RoomListEvent::RoomDeleted { .. } => "room_deleted",
			RoomListEvent::ReceiptRecorded { .. } => "receipt_recorded",
			RoomListEvent::MemberNameChanged { .. } => "member_name_changed",
			RoomListEvent::EventDecrypted { .. } => "event_decrypted",
			RoomListEvent::AccountDataChanged { .. } => "account_data_changed",
			RoomListEvent::GroupMyMembershipChanged => "group_my_membership_changed",
			RoomListEvent::GroupDataChanged => "group_data_changed",
			RoomListEvent::TagSelectionChanged => "tag_selection_changed",
			RoomListEvent::TaggedRoomListsChanged => "tagged_room_lists_changed",
			RoomListEvent::SearchFilterChanged { .. } => "search_filter_changed",
			RoomListEvent::CallStateChanged { .. } => "call_state_changed",
			RoomListEvent::ArchivedSectionToggled { .. } => "archived_section_toggled",
			RoomListEvent::ArchivedSyncFinished { .. } => "archived_sync_finished",
		}
	}
}

/// What the view does in response to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
	Ignore,
	/// Debounced full recompute.
	ScheduleRefresh,
	/// Recompute the visible set now, then a debounced refresh.
	RecomputeVisibility,
	/// Refresh every group tag cache, then as `RecomputeVisibility`.
	RefreshGroups,
	/// Re-assemble from the last partitioned lists and publish immediately.
	ForceRender,
	/// Historical section state changed; handled by the view directly.
	Archived,
}

/// Map an event to the single action it causes.
pub fn classify(event: &RoomListEvent, local_user: &UserId) -> EventAction {
	match event {
		RoomListEvent::RoomCreated { .. } | RoomListEvent::RoomDeleted { .. } | RoomListEvent::TagSelectionChanged => {
			EventAction::RecomputeVisibility
		}
		RoomListEvent::ReceiptRecorded { readers, .. } => {
			if readers.iter().any(|reader| reader == local_user) {
				EventAction::ScheduleRefresh
			} else {
				EventAction::Ignore
			}
		}
		RoomListEvent::AccountDataChanged { event_type } => {
			if event_type == DIRECT_ACCOUNT_DATA {
				EventAction::ScheduleRefresh
			} else {
				EventAction::Ignore
			}
		}
		RoomListEvent::MemberNameChanged { .. }
		| RoomListEvent::EventDecrypted { .. }
		| RoomListEvent::TaggedRoomListsChanged => EventAction::ScheduleRefresh,
		RoomListEvent::GroupDataChanged => EventAction::RefreshGroups,
		RoomListEvent::GroupMyMembershipChanged
		| RoomListEvent::SearchFilterChanged { .. }
		| RoomListEvent::CallStateChanged { .. } => EventAction::ForceRender,
		RoomListEvent::ArchivedSectionToggled { .. } | RoomListEvent::ArchivedSyncFinished { .. } => {
			EventAction::Archived
		}
	}
}
