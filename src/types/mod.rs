// AstroLab shared type definitions
// Each submodule defines types used across the application.

pub mod errors;
pub mod favorite;
pub mod reflection;
pub mod session;
pub mod settings;
