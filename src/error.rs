//! Error type for the decoding engine.
//!
//! The library deliberately avoids `anyhow`/`thiserror`: a hand-rolled
//! enum keeps the public error surface explicit and dependency-free,
//! which matters more for a library than for an application binary.

use std::{fmt, io};

use crate::data::InodeNum;

#[derive(Debug)]
pub enum Error {
	/// None of the four candidate superblock offsets validated.
	SuperblockNotFound,

	/// A cylinder group header's magic did not match `CG_MAGIC`.
	BadCylinderGroup { cg: u64 },

	/// A path component did not exist.
	NotFound { path: String },

	/// `iterdir`/`listdir` was called on a non-directory inode.
	NotADirectory { inr: InodeNum },

	/// `link`/`link_inode` was called on a non-symlink inode.
	NotASymlink { inr: InodeNum },

	/// Symlink resolution exceeded the configured hop limit.
	TooManySymlinks { path: String },

	/// The underlying byte source failed.
	Io(io::Error),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::SuperblockNotFound => write!(f, "superblock not found"),
			Self::BadCylinderGroup { cg } => write!(f, "invalid cylinder group: {cg}"),
			Self::NotFound { path } => write!(f, "file not found: {path}"),
			Self::NotADirectory { inr } => write!(f, "inode {inr} is not a directory"),
			Self::NotASymlink { inr } => write!(f, "inode {inr} is not a symlink"),
			Self::TooManySymlinks { path } => write!(f, "too many symlinks while resolving {path}"),
			Self::Io(e) => write!(f, "{e}"),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Io(e) => Some(e),
			_ => None,
		}
	}
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Self {
		Self::Io(e)
	}
}

pub type Result<T> = std::result::Result<T, Error>;
