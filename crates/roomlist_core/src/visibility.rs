#![forbid(unsafe_code)]

use std::collections::HashSet;

use roomlist_domain::{RoomId, Tag};

use crate::group_cache::GroupMembershipCache;
use crate::source::RoomRegistry;

/// Rooms eligible for display under the current tag selection.
///
/// No selection shows the whole registry. Otherwise the result is the union of
/// the selected tags' group sets, restricted to rooms the registry knows about
/// (group data and registry can disagree for a while).
pub fn compute_visible_rooms<R>(selected: &[Tag], cache: &GroupMembershipCache, registry: &R) -> HashSet<RoomId>
where
	R: RoomRegistry + ?Sized,
{
	if selected.is_empty() {
		return registry.visible_rooms().into_iter().collect();
	}

	let mut visible = HashSet::new();
	for tag in selected {
		for room_id in cache.rooms_for_tag(tag).iter() {
			if visible.contains(room_id) {
				continue;
			}
			if registry.contains(room_id) {
				visible.insert(room_id.clone());
			}
		}
	}
	visible
}
