#![forbid(unsafe_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use roomlist_domain::{GroupId, RoomId, Tag, UserId};
use tracing::debug;

use crate::source::{DirectMessageMap, GroupDirectory};

/// Rooms in scope for each group tag.
///
/// Entries only change through `refresh_for_tag`; nothing here notices upstream
/// group changes on its own.
#[derive(Debug, Clone, Default)]
pub struct GroupMembershipCache {
	entries: HashMap<GroupId, Arc<HashSet<RoomId>>>,
}

impl GroupMembershipCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Recompute the set for a group tag: the group's own rooms plus every DM
	/// room shared with a member other than `local_user`.
	///
	/// Returns false (and does nothing) for non-group tags.
	pub fn refresh_for_tag<S>(&mut self, tag: &Tag, source: &S, local_user: &UserId) -> bool
	where
		S: GroupDirectory + DirectMessageMap + ?Sized,
	{
		let Some(group) = tag.as_group() else {
			return false;
		};

		let mut rooms: HashSet<RoomId> = source.group_rooms(group).into_iter().collect();
		let group_rooms = rooms.len();

		for member in source.group_members(group) {
			if &member == local_user {
				continue;
			}
			rooms.extend(source.dm_rooms_for_user(&member));
		}

		debug!(
			group = %group,
			group_rooms,
			total = rooms.len(),
			"group membership cache refreshed"
		);

		self.entries.insert(group.clone(), Arc::new(rooms));
		true
	}

	/// Last computed set, empty if the tag was never refreshed.
	pub fn rooms_for_tag(&self, tag: &Tag) -> Arc<HashSet<RoomId>> {
		tag.as_group()
			.and_then(|group| self.entries.get(group))
			.cloned()
			.unwrap_or_default()
	}

	pub fn contains_tag(&self, tag: &Tag) -> bool {
		tag.as_group().is_some_and(|group| self.entries.contains_key(group))
	}
}
