//! AstroLab database layer.
//!
//! SQLite connection management, schema migrations and the key-value
//! storage the favorites store persists its snapshot through.
//!
//! # Usage
//!
//! ```no_run
//! use astrolab::database::{Database, KeyValueStorage};
//!
//! let db = Database::open("astrolab.db").expect("failed to open database");
//! db.save("greeting", "\"hola\"").expect("write failed");
//! assert_eq!(db.load("greeting").unwrap().as_deref(), Some("\"hola\""));
//! ```

pub mod connection;
pub mod kv_store;
pub mod migrations;

pub use connection::Database;
pub use kv_store::KeyValueStorage;
