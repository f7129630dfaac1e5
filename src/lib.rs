//! A read-only decoder for the BSD Fast File System (FFS/UFS), both UFS1
//! and UFS2. Given any `Read + Seek` byte source over a raw disk image or
//! partition, [`Volume`] locates the superblock, then serves directory
//! listings, inode metadata, symlink resolution and streaming file reads.
//!
//! Writing, journaling/soft-updates recovery, snapshots, extended
//! attributes and ACLs are out of scope: this crate only reads.

mod blocks;
mod cg;
mod data;
mod decoder;
mod dinode;
mod dir;
mod error;
mod inode;
mod reader;
mod runlist;
mod sb;
mod volume;

pub use crate::data::InodeNum;
pub use crate::dinode::FileType;
pub use crate::error::{Error, Result};
pub use crate::inode::Inode;
pub use crate::runlist::Run;
pub use crate::sb::UfsVersion;
pub use crate::volume::{PathOrInum, Volume};
