// AstroLab services
// Services talk to collaborators outside the process (remote tables, settings on disk)
// and hold the pure merge logic used by sync.

pub mod favorites_sync;
pub mod merge_resolver;
pub mod reflection_journal;
pub mod remote;
pub mod settings_engine;
pub mod supabase_client;
