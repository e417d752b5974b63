#![forbid(unsafe_code)]

//! Reactive room list core: turns room, tag and group state plus a stream of
//! change notifications into an ordered list of sections.

pub mod conference;
pub mod config;
pub mod error;
pub mod events;
pub mod group_cache;
pub mod memory;
pub mod partition;
pub mod scheduler;
pub mod sections;
pub mod service;
pub mod source;
pub mod view;
pub mod visibility;


pub use conference::{ConferenceDetector, ConferenceRoomDetector};
pub use config::{RoomListConfig, default_config_path, load_room_list_config, load_room_list_config_from_path};
pub use error::{RoomListError, SourceError};
pub use events::{EventAction, RoomListEvent, classify};
pub use group_cache::GroupMembershipCache;
pub use memory::{MemorySource, World};
pub use partition::partition;
pub use scheduler::{RefreshScheduler, TriggerOutcome};
pub use sections::{GroupInviteTile, ListOrder, RoomListIntent, Section, SectionKey, assemble, group_invite_tiles};
pub use service::{RoomListHandle, RoomListNotifier, spawn_room_list};
pub use source::{
	ArchiveSync, DirectMessageMap, GroupDirectory, GroupSummary, RoomInfo, RoomListSource, RoomRegistry, TagDirectory,
	TaggedRoomLists,
};
pub use view::{RoomListSnapshot, RoomListView, ViewEffect};
pub use visibility::compute_visible_rooms;

pub use roomlist_domain as domain;
