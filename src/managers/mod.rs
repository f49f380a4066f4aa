// AstroLab state managers
// Managers own local, synchronously persisted state.

pub mod favorites_store;
