#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context as _;
use parking_lot::RwLock;
use roomlist_domain::{GroupId, Membership, RoomId, Tag, UserId};
use serde::Deserialize;

use crate::error::SourceError;
use crate::source::{
	ArchiveSync, DirectMessageMap, GroupDirectory, GroupSummary, RoomInfo, RoomRegistry, TagDirectory, TaggedRoomLists,
};

fn default_membership() -> Membership {
	Membership::Join
}

/// A room as described in a world file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldRoom {
	pub id: RoomId,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default = "default_membership")]
	pub membership: Membership,
	#[serde(default)]
	pub conference: bool,
	#[serde(default)]
	pub members: Vec<UserId>,
}

impl WorldRoom {
	pub fn joined(id: RoomId) -> Self {
		Self {
			id,
			name: None,
			membership: Membership::Join,
			conference: false,
			members: Vec::new(),
		}
	}
}

/// One canonical tag list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldList {
	pub tag: Tag,
	#[serde(default)]
	pub rooms: Vec<RoomId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldGroup {
	pub id: GroupId,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default = "default_membership")]
	pub membership: Membership,
	#[serde(default)]
	pub rooms: Vec<RoomId>,
	#[serde(default)]
	pub members: Vec<UserId>,
}

/// Complete state behind a `MemorySource`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct World {
	pub local_user: Option<UserId>,
	pub rooms: Vec<WorldRoom>,
	pub lists: Vec<WorldList>,
	pub selected_tags: Vec<Tag>,
	pub ordered_tags: Vec<Tag>,
	pub groups: Vec<WorldGroup>,
	/// User id to the DM rooms shared with them.
	pub direct: BTreeMap<UserId, Vec<RoomId>>,

	/// Returned by the next `tagged_room_lists` calls while set.
	#[serde(skip)]
	pub lists_error: Option<SourceError>,
	/// Returned by `sync_left_rooms` while set.
	#[serde(skip)]
	pub archive_error: Option<SourceError>,
}

impl World {
	pub fn set_list(&mut self, tag: Tag, rooms: Vec<RoomId>) {
		match self.lists.iter_mut().find(|list| list.tag == tag) {
			Some(list) => list.rooms = rooms,
			None => self.lists.push(WorldList { tag, rooms }),
		}
	}

	/// Drop a room from the registry and from every list.
	pub fn remove_room(&mut self, room_id: &RoomId) {
		self.rooms.retain(|room| &room.id != room_id);
		for list in &mut self.lists {
			list.rooms.retain(|id| id != room_id);
		}
	}
}

/// In-memory source backing tests and the demo binary.
#[derive(Debug, Default)]
pub struct MemorySource {
	world: RwLock<World>,
	archive_syncs: AtomicUsize,
}

impl MemorySource {
	pub fn new(world: World) -> Self {
		Self {
			world: RwLock::new(world),
			archive_syncs: AtomicUsize::new(0),
		}
	}

	pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
		let world: World = toml::from_str(s).context("parse world TOML")?;
		Ok(Self::new(world))
	}

	pub fn load(path: &Path) -> anyhow::Result<Self> {
		let s = std::fs::read_to_string(path).with_context(|| format!("read world from {}", path.display()))?;
		Self::from_toml_str(&s)
	}

	pub fn local_user(&self) -> Option<UserId> {
		self.world.read().local_user.clone()
	}

	/// Mutate the world under the write lock.
	pub fn update<R>(&self, f: impl FnOnce(&mut World) -> R) -> R {
		f(&mut self.world.write())
	}

	pub fn set_selected_tags(&self, tags: Vec<Tag>) {
		self.world.write().selected_tags = tags;
	}

	/// Number of archive resyncs requested so far.
	pub fn archive_sync_count(&self) -> usize {
		self.archive_syncs.load(Ordering::SeqCst)
	}
}

impl RoomRegistry for MemorySource {
	fn room(&self, room_id: &RoomId) -> Option<RoomInfo> {
		let world = self.world.read();
		let room = world.rooms.iter().find(|room| &room.id == room_id)?;
		Some(RoomInfo {
			room_id: room.id.clone(),
			name: room.name.clone(),
			membership: room.membership,
			conference_placeholder: room.conference,
			joined_members: room.members.clone(),
		})
	}

	fn visible_rooms(&self) -> Vec<RoomId> {
		self.world.read().rooms.iter().map(|room| room.id.clone()).collect()
	}

	fn contains(&self, room_id: &RoomId) -> bool {
		self.world.read().rooms.iter().any(|room| &room.id == room_id)
	}
}

impl TagDirectory for MemorySource {
	fn tagged_room_lists(&self) -> Result<TaggedRoomLists, SourceError> {
		let world = self.world.read();
		if let Some(err) = &world.lists_error {
			return Err(err.clone());
		}
		Ok(world
			.lists
			.iter()
			.map(|list| (list.tag.clone(), list.rooms.clone()))
			.collect())
	}

	fn selected_tags(&self) -> Vec<Tag> {
		self.world.read().selected_tags.clone()
	}

	fn ordered_tags(&self) -> Vec<Tag> {
		self.world.read().ordered_tags.clone()
	}
}

impl GroupDirectory for MemorySource {
	fn group_rooms(&self, group: &GroupId) -> Vec<RoomId> {
		self.world
			.read()
			.groups
			.iter()
			.find(|g| &g.id == group)
			.map(|g| g.rooms.clone())
			.unwrap_or_default()
	}

	fn group_members(&self, group: &GroupId) -> Vec<UserId> {
		self.world
			.read()
			.groups
			.iter()
			.find(|g| &g.id == group)
			.map(|g| g.members.clone())
			.unwrap_or_default()
	}

	fn groups(&self) -> Vec<GroupSummary> {
		self.world
			.read()
			.groups
			.iter()
			.map(|g| GroupSummary {
				group_id: g.id.clone(),
				name: g.name.clone(),
				membership: g.membership,
			})
			.collect()
	}
}

impl DirectMessageMap for MemorySource {
	fn dm_rooms_for_user(&self, user: &UserId) -> Vec<RoomId> {
		self.world.read().direct.get(user).cloned().unwrap_or_default()
	}
}

#[async_trait::async_trait]
impl ArchiveSync for MemorySource {
	async fn sync_left_rooms(&self) -> Result<(), SourceError> {
		self.archive_syncs.fetch_add(1, Ordering::SeqCst);
		let archive_error = self.world.read().archive_error.clone();
		match archive_error {
			Some(err) => Err(err),
			None => Ok(()),
		}
	}
}
