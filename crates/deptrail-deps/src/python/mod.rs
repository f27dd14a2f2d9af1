//! Python support: pyproject.toml and uv.lock

mod pep508;
pub mod pyproject;
pub mod uv_lock;

pub use pyproject::PyprojectParser;
pub use uv_lock::UvLockParser;
