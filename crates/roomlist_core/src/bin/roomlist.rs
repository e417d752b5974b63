#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, anyhow};
use roomlist_core::domain::Tag;
use roomlist_core::{
	MemorySource, RoomListEvent, RoomListSnapshot, load_room_list_config, load_room_list_config_from_path,
	spawn_room_list,
};
use tracing::info;

fn usage_and_exit() -> ! {
	eprintln!(
		"Usage: roomlist --world <file.toml> [--config <file.toml>] [--select <tag>]... [--search <phrase>] [--json]\n\
\n\
Options:\n\
	--world     World file describing rooms, tag lists and groups (required)\n\
	--config    Config file (default: ~/.roomlist/config.toml)\n\
	--select    Tag to filter by (repeatable; e.g. +group:example.org)\n\
	--search    Search phrase applied to community invites\n\
	--json      Print the snapshot as JSON\n\
	--help      Show this help\n\
\n\
Examples:\n\
	roomlist --world crates/roomlist_core/fixtures/world.toml\n\
	roomlist --world world.toml --select +rust:example.org --json\n"
	);
	std::process::exit(2)
}

fn init_tracing() {
	let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn,roomlist_core=info".to_string());
	tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

struct Args {
	world: PathBuf,
	config: Option<PathBuf>,
	select: Vec<Tag>,
	search: Option<String>,
	json: bool,
}

fn parse_args() -> Args {
	let mut world: Option<PathBuf> = None;
	let mut config: Option<PathBuf> = None;
	let mut select: Vec<Tag> = Vec::new();
	let mut search: Option<String> = None;
	let mut json = false;

	let mut it = std::env::args().skip(1);
	while let Some(arg) = it.next() {
		match arg.as_str() {
			"--help" | "-h" => usage_and_exit(),
			"--world" => {
				let v = it.next().unwrap_or_else(|| usage_and_exit());
				world = Some(PathBuf::from(v));
			}
			"--config" => {
				let v = it.next().unwrap_or_else(|| usage_and_exit());
				config = Some(PathBuf::from(v));
			}
			"--select" => {
				let v = it.next().unwrap_or_else(|| usage_and_exit());
				let tag = Tag::parse(v.trim()).unwrap_or_else(|e| {
					eprintln!("Invalid --select value {v:?}: {e}");
					usage_and_exit()
				});
				select.push(tag);
			}
			"--search" => {
				search = Some(it.next().unwrap_or_else(|| usage_and_exit()));
			}
			"--json" => json = true,
			other => {
				eprintln!("Unknown argument: {other}");
				usage_and_exit();
			}
		}
	}

	let Some(world) = world else {
		eprintln!("--world is required");
		usage_and_exit();
	};

	Args {
		world,
		config,
		select,
		search,
		json,
	}
}

fn print_text(snapshot: &RoomListSnapshot) {
	for section in &snapshot.sections {
		println!("[{}] ({})", section.label, section.len());
		for tile in &section.extra_tiles {
			println!("  * {}", tile.name.as_deref().unwrap_or(tile.group_id.as_str()));
		}
		for room in &section.rooms {
			println!("  {room}");
		}
		if let Some(action) = section.add_action {
			println!("  + {action:?}");
		}
	}
	println!("total rooms: {}", snapshot.total_room_count);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	init_tracing();
	let args = parse_args();

	let config = match &args.config {
		Some(path) => load_room_list_config_from_path(path)?,
		None => load_room_list_config()?,
	};

	let source = Arc::new(MemorySource::load(&args.world)?);
	let local_user = source
		.local_user()
		.ok_or_else(|| anyhow!("world file {} has no local_user", args.world.display()))?;

	let settle = config.debounce + Duration::from_millis(100);
	let (handle, _intents) = spawn_room_list(source.clone(), local_user.clone(), config);
	info!(user = %local_user, world = %args.world.display(), "room list started");

	if !args.select.is_empty() {
		source.set_selected_tags(args.select.clone());
		handle
			.notify(RoomListEvent::TagSelectionChanged)
			.await
			.context("send tag selection")?;
	}
	if let Some(search) = args.search.clone() {
		handle
			.notify(RoomListEvent::SearchFilterChanged { filter: Some(search) })
			.await
			.context("send search phrase")?;
	}

	tokio::time::sleep(settle).await;
	let snapshot = handle.current();

	if args.json {
		println!("{}", serde_json::to_string_pretty(&*snapshot).context("serialize snapshot")?);
	} else {
		print_text(&snapshot);
	}

	handle.shutdown().await;
	Ok(())
}
