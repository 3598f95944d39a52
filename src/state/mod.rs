/// State management module
///
/// This module handles all gallery state, including:
/// - Catalog connection, backend record mapping and saves (library.rs)
/// - Shared data structures (data.rs)
/// - Layout configuration (settings.rs)
/// - The session object that owns and mutates everything (session.rs)
/// - Share link encoding (share.rs)

pub mod data;
pub mod library;
pub mod session;
pub mod settings;
pub mod share;
