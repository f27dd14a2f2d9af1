//! Deno support: deno.json(c) imports and deno.lock

pub mod lockfile;
pub mod parser;

pub use lockfile::DenoLockfileParser;
pub use parser::DenoJsonParser;
