#![forbid(unsafe_code)]

use roomlist_domain::UserId;

use crate::source::RoomInfo;

/// Decides whether a room is a legacy conference-call placeholder.
pub trait ConferenceDetector {
	fn is_conference_room(&self, room: &RoomInfo, local_user: &UserId) -> bool;
}

impl<F> ConferenceDetector for F
where
	F: Fn(&RoomInfo, &UserId) -> bool,
{
	fn is_conference_room(&self, room: &RoomInfo, local_user: &UserId) -> bool {
		self(room, local_user)
	}
}

/// Registry flag, or a two-member room shared with a conference bot user.
#[derive(Debug, Clone, Default)]
pub struct ConferenceRoomDetector {
	user_prefix: Option<String>,
}

impl ConferenceRoomDetector {
	pub fn new(user_prefix: Option<String>) -> Self {
		Self {
			user_prefix: user_prefix.filter(|p| !p.trim().is_empty()),
		}
	}

	fn is_conference_user(&self, user: &UserId) -> bool {
		self.user_prefix
			.as_deref()
			.is_some_and(|prefix| user.as_str().starts_with(prefix))
	}
}

impl ConferenceDetector for ConferenceRoomDetector {
	fn is_conference_room(&self, room: &RoomInfo, local_user: &UserId) -> bool {
		if room.conference_placeholder {
			return true;
		}

		let [a, b] = room.joined_members.as_slice() else {
			return false;
		};

		let other = if a == local_user {
			b
		} else if b == local_user {
			a
		} else {
			return false;
		};

		self.is_conference_user(other)
	}
}
