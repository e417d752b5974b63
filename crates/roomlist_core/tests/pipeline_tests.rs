#![forbid(unsafe_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use roomlist_core::domain::{GroupId, RoomId, StandardTag, Tag, UserId};
use roomlist_core::{
	MemorySource, RoomListConfig, RoomListEvent, RoomListIntent, RoomListSnapshot, RoomListView, SectionKey,
	spawn_room_list,
};

fn fixture() -> MemorySource {
	let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/world.toml");
	MemorySource::load(&path).expect("fixture world loads")
}

fn rid(s: &str) -> RoomId {
	RoomId::new(s).expect("valid RoomId")
}

fn me() -> UserId {
	UserId::new("@me:example.org").expect("valid UserId")
}

fn keys(snapshot: &RoomListSnapshot) -> Vec<String> {
	snapshot.sections.iter().map(|s| s.key.to_string()).collect()
}

fn rooms(snapshot: &RoomListSnapshot, tag: impl Into<Tag>) -> Vec<RoomId> {
	snapshot
		.section_for_tag(&tag.into())
		.map(|s| s.rooms.clone())
		.unwrap_or_default()
}

#[test]
fn fixture_world_renders_every_section_in_order() {
	let source = fixture();
	assert_eq!(source.local_user(), Some(me()));

	let mut view = RoomListView::new(Arc::new(source), me(), &RoomListConfig::default());
	let snapshot = view.mount().expect("mount");

	assert_eq!(
		keys(&snapshot),
		vec![
			"community_invites",
			"im.vector.fake.invite",
			"m.favourite",
			"im.vector.fake.direct",
			"im.vector.fake.recent",
			"u.work",
			"m.lowpriority",
			"im.vector.fake.archived",
			"m.server_notice",
		]
	);

	let labels: Vec<_> = snapshot.sections.iter().map(|s| s.label.as_str()).collect();
	assert_eq!(
		labels,
		vec![
			"Community Invites",
			"Invites",
			"Favourites",
			"People",
			"Rooms",
			"work",
			"Low priority",
			"Historical",
			"System Alerts",
		]
	);

	assert_eq!(
		rooms(&snapshot, StandardTag::Direct),
		vec![rid("!bob:example.org"), rid("!carol:example.org")]
	);
	// The conference room is gone; the regular room keeps its place.
	assert_eq!(rooms(&snapshot, StandardTag::Recent), vec![rid("!standup:example.org")]);
	assert_eq!(snapshot.total_room_count, 9);

	let invites = snapshot.section(&SectionKey::CommunityInvites).expect("community invites");
	assert_eq!(invites.extra_tiles.len(), 1);
	assert_eq!(invites.extra_tiles[0].name.as_deref(), Some("Cat Lovers"));
}

#[test]
fn selecting_a_group_keeps_group_rooms_and_member_dms() {
	let source = fixture();
	source.set_selected_tags(vec![Tag::Group(GroupId::new("+rust:example.org").expect("gid"))]);

	let mut view = RoomListView::new(Arc::new(source), me(), &RoomListConfig::default());
	let snapshot = view.mount().expect("mount");

	assert_eq!(
		keys(&snapshot),
		vec![
			"community_invites",
			"m.favourite",
			"im.vector.fake.direct",
			"im.vector.fake.recent",
		]
	);
	assert_eq!(rooms(&snapshot, StandardTag::Favourite), vec![rid("!general:example.org")]);
	assert_eq!(rooms(&snapshot, StandardTag::Direct), vec![rid("!bob:example.org")]);

	let recent = snapshot
		.section_for_tag(&StandardTag::Recent.into())
		.expect("rooms section");
	assert!(recent.rooms.is_empty());
	assert_eq!(recent.add_action, Some(RoomListIntent::CreateRoom));
}

#[test]
fn snapshot_serializes_for_consumers() {
	let mut view = RoomListView::new(Arc::new(fixture()), me(), &RoomListConfig::default());
	let snapshot = view.mount().expect("mount");

	let value = serde_json::to_value(&*snapshot).expect("json");
	assert_eq!(value["sections"][0]["key"], "community_invites");
	assert_eq!(value["sections"][2]["key"]["tag"], "m.favourite");
	assert_eq!(value["sections"][2]["rooms"][0], "!general:example.org");
	assert_eq!(value["sections"][3]["add_action"], "create_chat");
	assert_eq!(value["total_room_count"], 9);
}

#[test]
fn sync_view_settles_to_latest_state_after_a_burst() {
	let source = Arc::new(fixture());
	let mut view = RoomListView::new(source.clone(), me(), &RoomListConfig::default());
	view.mount().expect("mount");
	let t0 = Instant::now();

	view.handle_event(RoomListEvent::TaggedRoomListsChanged, t0).expect("event");
	source.update(|w| w.remove_room(&rid("!standup:example.org")));
	view.handle_event(
		RoomListEvent::RoomDeleted {
			room: rid("!standup:example.org"),
		},
		t0 + Duration::from_millis(100),
	)
	.expect("event");

	let snapshot = view
		.poll_refresh(t0 + Duration::from_millis(600))
		.expect("poll")
		.expect("refresh due");

	assert!(rooms(&snapshot, StandardTag::Recent).is_empty());
	assert!(snapshot.section_for_tag(&Tag::parse("u.work").expect("tag")).is_none());
}

#[tokio::test]
async fn service_publishes_fixture_world() {
	let config = RoomListConfig {
		debounce: Duration::from_millis(20),
		..RoomListConfig::default()
	};
	let (handle, _intents) = spawn_room_list(Arc::new(fixture()), me(), config);
	let mut rx = handle.snapshots();

	let snapshot = tokio::time::timeout(Duration::from_secs(2), async {
		loop {
			let current = rx.borrow_and_update().clone();
			if current.generation >= 1 {
				return current;
			}
			rx.changed().await.expect("service alive");
		}
	})
	.await
	.expect("first snapshot");

	assert_eq!(snapshot.sections.len(), 9);
	handle.shutdown().await;
}
