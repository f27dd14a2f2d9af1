//! Bundler support: Gemfile and Gemfile.lock

pub mod gemfile;
pub mod gemfile_lock;

pub use gemfile::GemfileParser;
pub use gemfile_lock::GemfileLockParser;
