#![forbid(unsafe_code)]

use roomlist_domain::{GroupId, Membership, RoomId, Tag, UserId};
use serde::Serialize;

use crate::error::SourceError;

/// Registry attributes of a room, read on demand and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
	pub room_id: RoomId,
	pub name: Option<String>,
	pub membership: Membership,
	/// Set by the registry for legacy conference-call rooms.
	pub conference_placeholder: bool,
	pub joined_members: Vec<UserId>,
}

impl RoomInfo {
	/// A joined room with no extra attributes.
	pub fn joined(room_id: RoomId) -> Self {
		Self {
			room_id,
			name: None,
			membership: Membership::Join,
			conference_placeholder: false,
			joined_members: Vec::new(),
		}
	}
}

/// A group as seen by the local user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
	pub group_id: GroupId,
	pub name: Option<String>,
	pub membership: Membership,
}

/// Per-tag ordered room lists, kept in directory iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaggedRoomLists {
	entries: Vec<(Tag, Vec<RoomId>)>,
}

impl TaggedRoomLists {
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the list for `tag`. An existing tag keeps its position.
	pub fn insert(&mut self, tag: Tag, rooms: Vec<RoomId>) {
		match self.entries.iter_mut().find(|(t, _)| *t == tag) {
			Some((_, existing)) => *existing = rooms,
			None => self.entries.push((tag, rooms)),
		}
	}

	pub fn get(&self, tag: &Tag) -> Option<&[RoomId]> {
		self.entries
			.iter()
			.find(|(t, _)| t == tag)
			.map(|(_, rooms)| rooms.as_slice())
	}

	pub fn contains_tag(&self, tag: &Tag) -> bool {
		self.entries.iter().any(|(t, _)| t == tag)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&Tag, &[RoomId])> {
		self.entries.iter().map(|(t, rooms)| (t, rooms.as_slice()))
	}

	pub fn tags(&self) -> impl Iterator<Item = &Tag> {
		self.entries.iter().map(|(t, _)| t)
	}

	/// Number of tags.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Sum of all list lengths (a room tagged twice counts twice).
	pub fn total_rooms(&self) -> usize {
		self.entries.iter().map(|(_, rooms)| rooms.len()).sum()
	}
}

impl FromIterator<(Tag, Vec<RoomId>)> for TaggedRoomLists {
	fn from_iter<I: IntoIterator<Item = (Tag, Vec<RoomId>)>>(iter: I) -> Self {
		let mut lists = TaggedRoomLists::new();
		for (tag, rooms) in iter {
			lists.insert(tag, rooms);
		}
		lists
	}
}

/// Authoritative room universe.
pub trait RoomRegistry {
	/// `None` when the registry does not (or no longer) know the room.
	fn room(&self, room_id: &RoomId) -> Option<RoomInfo>;

	/// Every room the client currently shows when nothing is filtered.
	fn visible_rooms(&self) -> Vec<RoomId>;

	fn contains(&self, room_id: &RoomId) -> bool {
		self.room(room_id).is_some()
	}
}

/// Room tags and the user's tag selection.
pub trait TagDirectory {
	/// Canonical per-tag room lists.
	fn tagged_room_lists(&self) -> Result<TaggedRoomLists, SourceError>;

	/// Tags the user picked as filters. Empty means no filtering.
	fn selected_tags(&self) -> Vec<Tag>;

	/// Tags shown in the tag panel; group tags among them get membership caches.
	fn ordered_tags(&self) -> Vec<Tag>;
}

/// Group rooms and members.
pub trait GroupDirectory {
	fn group_rooms(&self, group: &GroupId) -> Vec<RoomId>;

	fn group_members(&self, group: &GroupId) -> Vec<UserId>;

	/// Every group the local user has a membership in.
	fn groups(&self) -> Vec<GroupSummary>;
}

/// Mapping of users to the direct-message rooms shared with them.
pub trait DirectMessageMap {
	fn dm_rooms_for_user(&self, user: &UserId) -> Vec<RoomId>;
}

/// Historical (left) room resync.
#[async_trait::async_trait]
pub trait ArchiveSync: Send + Sync {
	/// Resulting rooms arrive through the usual room notifications.
	async fn sync_left_rooms(&self) -> Result<(), SourceError>;
}

/// Everything the room list consults.
pub trait RoomListSource:
	RoomRegistry + TagDirectory + GroupDirectory + DirectMessageMap + ArchiveSync + Send + Sync + 'static
{
}

impl<T> RoomListSource for T where
	T: RoomRegistry + TagDirectory + GroupDirectory + DirectMessageMap + ArchiveSync + Send + Sync + 'static
{
}

#[cfg(test)]
mod tests {
	use roomlist_domain::StandardTag;

	use super::*;

	fn rid(s: &str) -> RoomId {
		RoomId::new(s).expect("valid room id")
	}

	#[test]
	fn insert_keeps_directory_order() {
		let mut lists = TaggedRoomLists::new();
		lists.insert(Tag::parse("u.b").unwrap(), vec![rid("!1")]);
		lists.insert(StandardTag::Favourite.into(), vec![rid("!2")]);
		lists.insert(Tag::parse("u.b").unwrap(), vec![rid("!3"), rid("!4")]);

		let tags: Vec<_> = lists.tags().map(Tag::as_str).collect();
		assert_eq!(tags, vec!["u.b", "m.favourite"]);
		assert_eq!(lists.get(&Tag::parse("u.b").unwrap()).map(<[RoomId]>::len), Some(2));
		assert_eq!(lists.total_rooms(), 3);
	}
}
