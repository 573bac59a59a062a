use std::borrow::Cow;

use rust_embed::RustEmbed;

/// Embed the entire `assets/` directory into the binary.
#[derive(RustEmbed)]
#[folder = "assets"]
struct EmbeddedAssets;

/// Fee schedule used when no override is configured.
pub const DEFAULT_SCHEDULE: &str = "fee_schedules/2024.json";

const SCHEDULE_DIR: &str = "fee_schedules/";

/// Raw bytes of an embedded asset, e.g. `fee_schedules/2024.json`.
pub fn load_asset(path: &str) -> Option<Cow<'static, [u8]>> {
    EmbeddedAssets::get(&canonical_asset_path(path)).map(|file| file.data)
}

/// Names (without directory or extension) of the bundled fee schedules.
pub fn schedule_names() -> Vec<String> {
    let mut names: Vec<String> = EmbeddedAssets::iter()
        .filter_map(|path| {
            path.strip_prefix(SCHEDULE_DIR)
                .and_then(|file| file.strip_suffix(".json"))
                .map(str::to_string)
        })
        .collect();
    names.sort();
    names
}

/// Path of a bundled schedule by name (`2024` -> `fee_schedules/2024.json`).
pub fn schedule_asset_path(name: &str) -> String {
    format!("{SCHEDULE_DIR}{name}.json")
}

fn canonical_asset_path(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    if let Some(rest) = trimmed.strip_prefix("assets/") {
        rest.to_string()
    } else {
        trimmed.to_string()
    }
}
