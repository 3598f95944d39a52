/// Media handling module
///
/// This module handles:
/// - Classifying user URLs into images, videos and embeds
/// - Fetching, caching and decoding assets
/// - Importing media files from a local folder

pub mod classify;
pub mod import;
pub mod loader;
