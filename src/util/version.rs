pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_TAG: Option<&str> = option_env!("GIT_TAG");

/// Release tag when built from a tagged checkout, crate version otherwise.
pub fn version_label() -> &'static str {
    match GIT_TAG {
        Some(tag) => tag,
        None => concat!("v", env!("CARGO_PKG_VERSION")),
    }
}
