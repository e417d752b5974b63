#![forbid(unsafe_code)]

use std::fmt;

use roomlist_domain::{GroupId, Membership, RoomId, StandardTag, Tag};
use serde::Serialize;

use crate::source::{GroupSummary, TaggedRoomLists};

/// How a section's rooms are ordered by the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListOrder {
	Recent,
	Manual,
}

/// Actions the consumer may dispatch. The core never runs them itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomListIntent {
	CreateChat,
	CreateRoom,
	ViewRoomDirectory,
}

/// Stable section identity across recomputations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
	CommunityInvites,
	Tag(Tag),
}

impl fmt::Display for SectionKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SectionKey::CommunityInvites => f.write_str("community_invites"),
			SectionKey::Tag(tag) => f.write_str(tag.as_str()),
		}
	}
}

/// Pending group invite shown as an extra tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupInviteTile {
	pub group_id: GroupId,
	pub name: Option<String>,
}

/// One named bucket of the room list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
	pub key: SectionKey,
	pub label: String,
	pub rooms: Vec<RoomId>,
	pub extra_tiles: Vec<GroupInviteTile>,
	/// Tag a room dropped onto this section receives.
	pub drop_tag: Option<Tag>,
	pub order: ListOrder,
	pub is_invite: bool,
	pub start_as_hidden: bool,
	pub show_spinner: bool,
	pub add_action: Option<RoomListIntent>,
	pub header_actions: Vec<RoomListIntent>,
}

impl Section {
	fn new(key: SectionKey, label: impl Into<String>, order: ListOrder) -> Self {
		Self {
			key,
			label: label.into(),
			rooms: Vec::new(),
			extra_tiles: Vec::new(),
			drop_tag: None,
			order,
			is_invite: false,
			start_as_hidden: false,
			show_spinner: false,
			add_action: None,
			header_actions: Vec::new(),
		}
	}

	fn standard(tag: StandardTag, label: &str, order: ListOrder, lists: &TaggedRoomLists) -> Self {
		let tag = Tag::Standard(tag);
		let mut section = Self::new(SectionKey::Tag(tag.clone()), label, order);
		section.rooms = lists.get(&tag).map(<[RoomId]>::to_vec).unwrap_or_default();
		section
	}

	fn droppable(mut self, tag: StandardTag) -> Self {
		self.drop_tag = Some(Tag::Standard(tag));
		self
	}

	/// Rooms plus extra tiles.
	pub fn len(&self) -> usize {
		self.rooms.len() + self.extra_tiles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Empty sections without an add action are not rendered.
	pub fn is_rendered(&self) -> bool {
		!self.is_empty() || self.add_action.is_some()
	}
}

/// Inputs to one assembly pass.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyInput<'a> {
	pub lists: &'a TaggedRoomLists,
	pub groups: &'a [GroupSummary],
	pub search_filter: Option<&'a str>,
	pub loading_archived: bool,
}

/// Pending group invites matching the search phrase.
///
/// A group matches when its id starts with the phrase or its name contains it,
/// ignoring case.
pub fn group_invite_tiles(groups: &[GroupSummary], search_filter: Option<&str>) -> Vec<GroupInviteTile> {
	let filter = search_filter.map(str::to_lowercase).filter(|f| !f.is_empty());

	groups
		.iter()
		.filter(|group| group.membership == Membership::Invite)
		.filter(|group| {
			let Some(filter) = filter.as_deref() else {
				return true;
			};
			group.group_id.as_str().to_lowercase().starts_with(filter)
				|| group
					.name
					.as_deref()
					.is_some_and(|name| name.to_lowercase().contains(filter))
		})
		.map(|group| GroupInviteTile {
			group_id: group.group_id.clone(),
			name: group.name.clone(),
		})
		.collect()
}

/// Build the ordered section sequence.
pub fn assemble(input: &AssemblyInput<'_>) -> Vec<Section> {
	let lists = input.lists;

	let mut community_invites = Section::new(SectionKey::CommunityInvites, "Community Invites", ListOrder::Recent);
	community_invites.extra_tiles = group_invite_tiles(input.groups, input.search_filter);
	community_invites.is_invite = true;

	let mut invites = Section::standard(StandardTag::Invite, "Invites", ListOrder::Recent, lists);
	invites.is_invite = true;

	let favourites =
		Section::standard(StandardTag::Favourite, "Favourites", ListOrder::Manual, lists).droppable(StandardTag::Favourite);

	let mut people =
		Section::standard(StandardTag::Direct, "People", ListOrder::Recent, lists).droppable(StandardTag::Direct);
	people.add_action = Some(RoomListIntent::CreateChat);
	people.header_actions = vec![RoomListIntent::CreateChat];

	let mut rooms = Section::standard(StandardTag::Recent, "Rooms", ListOrder::Recent, lists);
	rooms.add_action = Some(RoomListIntent::CreateRoom);
	rooms.header_actions = vec![RoomListIntent::ViewRoomDirectory, RoomListIntent::CreateRoom];

	let mut sections = vec![community_invites, invites, favourites, people, rooms];

	sections.extend(
		lists
			.iter()
			.filter(|(tag, _)| !tag.is_standard())
			.map(|(tag, tag_rooms)| {
				let mut section = Section::new(SectionKey::Tag(tag.clone()), tag.label(), ListOrder::Manual);
				section.rooms = tag_rooms.to_vec();
				section.drop_tag = Some(tag.clone());
				section
			}),
	);

	let low_priority = Section::standard(StandardTag::LowPriority, "Low priority", ListOrder::Recent, lists)
		.droppable(StandardTag::LowPriority);

	let mut historical = Section::standard(StandardTag::Archived, "Historical", ListOrder::Recent, lists);
	historical.start_as_hidden = true;
	historical.show_spinner = input.loading_archived;

	// Shares the low priority drop target.
	let system_alerts = Section::standard(StandardTag::ServerNotice, "System Alerts", ListOrder::Recent, lists)
		.droppable(StandardTag::LowPriority);

	sections.extend([low_priority, historical, system_alerts]);

	sections.retain(Section::is_rendered);
	sections
}
