#![forbid(unsafe_code)]

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for parsing identifiers and tags from strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseIdError {
	#[error("empty value")]
	Empty,
	#[error("unknown membership: {0}")]
	UnknownMembership(String),
	#[error("invalid format: {0}")]
	InvalidFormat(String),
}

macro_rules! string_id {
	($(#[$meta:meta])* $name:ident) => {
		$(#[$meta])*
		#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
		#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(try_from = "String", into = "String"))]
		pub struct $name(String);

		impl $name {
			/// Create a non-empty identifier.
			pub fn new(id: impl Into<String>) -> Result<Self, ParseIdError> {
				let id = id.into();
				if id.trim().is_empty() {
					return Err(ParseIdError::Empty);
				}
				Ok(Self(id))
			}

			pub fn as_str(&self) -> &str {
				&self.0
			}

			pub fn into_string(self) -> String {
				self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl FromStr for $name {
			type Err = ParseIdError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s.to_string())
			}
		}

		impl TryFrom<String> for $name {
			type Error = ParseIdError;

			fn try_from(s: String) -> Result<Self, Self::Error> {
				Self::new(s)
			}
		}

		impl From<$name> for String {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

string_id!(
	/// Opaque room identifier as known to the room registry.
	RoomId
);

string_id!(
	/// User identifier (e.g. `@alice:example.org`).
	UserId
);

string_id!(
	/// Group (community) identifier, always carrying the `+` sigil.
	GroupId
);

impl GroupId {
	/// Sigil that marks a tag as a group tag.
	pub const SIGIL: char = '+';
}

/// Membership state of the local user in a room or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum Membership {
	Join,
	Invite,
	Leave,
	Ban,
}

impl Membership {
	pub const fn as_str(self) -> &'static str {
		match self {
			Membership::Join => "join",
			Membership::Invite => "invite",
			Membership::Leave => "leave",
			Membership::Ban => "ban",
		}
	}
}

impl fmt::Display for Membership {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Membership {
	type Err = ParseIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		if s.is_empty() {
			return Err(ParseIdError::Empty);
		}

		match s.to_ascii_lowercase().as_str() {
			"join" | "joined" => Ok(Membership::Join),
			"invite" | "invited" => Ok(Membership::Invite),
			"leave" | "left" => Ok(Membership::Leave),
			"ban" | "banned" => Ok(Membership::Ban),
			other => Err(ParseIdError::UnknownMembership(other.to_string())),
		}
	}
}

/// System-recognized tags. Each one always gets an addressable list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardTag {
	Favourite,
	LowPriority,
	ServerNotice,
	/// Synthetic: rooms the local user is invited to.
	Invite,
	/// Synthetic: untagged joined rooms.
	Recent,
	/// Synthetic: direct-message rooms.
	Direct,
	/// Synthetic: rooms the local user has left.
	Archived,
}

impl StandardTag {
	pub const ALL: [StandardTag; 7] = [
		StandardTag::Favourite,
		StandardTag::LowPriority,
		StandardTag::ServerNotice,
		StandardTag::Invite,
		StandardTag::Recent,
		StandardTag::Direct,
		StandardTag::Archived,
	];

	/// Stable wire name.
	pub const fn as_str(self) -> &'static str {
		match self {
			StandardTag::Favourite => "m.favourite",
			StandardTag::LowPriority => "m.lowpriority",
			StandardTag::ServerNotice => "m.server_notice",
			StandardTag::Invite => "im.vector.fake.invite",
			StandardTag::Recent => "im.vector.fake.recent",
			StandardTag::Direct => "im.vector.fake.direct",
			StandardTag::Archived => "im.vector.fake.archived",
		}
	}

	/// Exact-match lookup of a wire name.
	pub fn parse(s: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|tag| tag.as_str() == s)
	}

	/// Presentation-only tags that never exist as real room tags.
	pub const fn is_synthetic(self) -> bool {
		matches!(
			self,
			StandardTag::Invite | StandardTag::Recent | StandardTag::Direct | StandardTag::Archived
		)
	}
}

impl fmt::Display for StandardTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A room tag, classified once when it enters the system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(try_from = "String", into = "String"))]
pub enum Tag {
	Standard(StandardTag),
	UserDefined(String),
	Group(GroupId),
}

impl Tag {
	/// Prefix used by user-created tags (`u.work`).
	pub const USER_PREFIX: &'static str = "u.";

	/// Classify a raw tag string.
	///
	/// A bare `+` with no group id is rejected with `InvalidFormat`, not read as a group tag.
	pub fn parse(s: &str) -> Result<Self, ParseIdError> {
		if s.trim().is_empty() {
			return Err(ParseIdError::Empty);
		}

		if let Some(standard) = StandardTag::parse(s) {
			return Ok(Tag::Standard(standard));
		}

		if s.starts_with(GroupId::SIGIL) {
			if s.len() == GroupId::SIGIL.len_utf8() {
				return Err(ParseIdError::InvalidFormat("group tag without an id".into()));
			}
			return Ok(Tag::Group(GroupId::new(s)?));
		}

		Ok(Tag::UserDefined(s.to_string()))
	}

	pub fn as_str(&self) -> &str {
		match self {
			Tag::Standard(tag) => tag.as_str(),
			Tag::UserDefined(name) => name,
			Tag::Group(id) => id.as_str(),
		}
	}

	pub fn is_standard(&self) -> bool {
		matches!(self, Tag::Standard(_))
	}

	pub fn as_group(&self) -> Option<&GroupId> {
		match self {
			Tag::Group(id) => Some(id),
			_ => None,
		}
	}

	/// Display label: the user-tag prefix is stripped, everything else is shown raw.
	pub fn label(&self) -> &str {
		let raw = self.as_str();
		raw.strip_prefix(Self::USER_PREFIX).unwrap_or(raw)
	}
}

impl From<StandardTag> for Tag {
	fn from(tag: StandardTag) -> Self {
		Tag::Standard(tag)
	}
}

impl From<GroupId> for Tag {
	fn from(id: GroupId) -> Self {
		Tag::Group(id)
	}
}

impl fmt::Display for Tag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Tag {
	type Err = ParseIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Tag::parse(s)
	}
}

impl TryFrom<String> for Tag {
	type Error = ParseIdError;

	fn try_from(s: String) -> Result<Self, Self::Error> {
		Tag::parse(&s)
	}
}

impl From<Tag> for String {
	fn from(tag: Tag) -> Self {
		match tag {
			Tag::Standard(tag) => tag.as_str().to_string(),
			Tag::UserDefined(name) => name,
			Tag::Group(id) => id.into_string(),
		}
	}
}
