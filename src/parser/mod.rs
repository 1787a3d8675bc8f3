//! Lockfile parsing
//!
//! Turns `Gemfile.lock` text into a [`Lockfile`](crate::domain::Lockfile).

mod lockfile;

pub use lockfile::LockfileParser;
