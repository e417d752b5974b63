#![forbid(unsafe_code)]

use std::collections::HashSet;

use roomlist_domain::{RoomId, UserId};

use crate::conference::ConferenceDetector;
use crate::source::{RoomRegistry, TaggedRoomLists};

/// Filter the canonical per-tag lists down to what may be shown.
///
/// Per tag, in canonical order: rooms the registry no longer knows are dropped,
/// then conference placeholders, then anything outside `visible`. A tag whose
/// list ends up empty is kept only if it is a standard tag.
pub fn partition<R, C>(
	lists: &TaggedRoomLists,
	visible: &HashSet<RoomId>,
	registry: &R,
	local_user: &UserId,
	conference: &C,
) -> TaggedRoomLists
where
	R: RoomRegistry + ?Sized,
	C: ConferenceDetector + ?Sized,
{
	let mut filtered = TaggedRoomLists::new();

	for (tag, rooms) in lists.iter() {
		let kept: Vec<RoomId> = rooms
			.iter()
			.filter(|room_id| {
				let Some(room) = registry.room(room_id) else {
					return false;
				};
				if conference.is_conference_room(&room, local_user) {
					return false;
				}
				visible.contains(*room_id)
			})
			.cloned()
			.collect();

		if !kept.is_empty() || tag.is_standard() {
			filtered.insert(tag.clone(), kept);
		}
	}

	filtered
}
