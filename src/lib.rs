//! echo-table: a single-connection TCP echo service and a Markdown
//! table converter.
//!
//! - `server`: bind, accept one client, reply to every chunk it sends
//!   with `Hello from server!` until it closes its side
//! - `client`: send messages one at a time and check each reply
//! - `table`: turn tab-delimited text into a Markdown table
//!
//! Configuration comes from CLI arguments or a TOML file.

pub mod client;
pub mod config;
pub mod protocol;
pub mod server;
pub mod table;
