//! npm and pnpm ecosystem support

pub mod lockfile;
pub mod parser;
pub mod pnpm;

pub use lockfile::NpmLockfileParser;
pub use parser::PackageJsonParser;
pub use pnpm::PnpmLockfileParser;
