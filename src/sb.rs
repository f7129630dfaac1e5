//! Locates and validates the superblock by trying each candidate offset
//! in `SBLOCKSEARCH` in turn until one decodes and looks sane.

use std::io::{Read, Seek};

use log::{debug, warn};

use crate::data::{
	Superblock, FS_UFS1_MAGIC, FS_UFS2_MAGIC, MAXBSIZE, MINBSIZE, SBLOCKSEARCH, SBLOCKSIZE,
};
use crate::decoder::Decoder;
use crate::error::{Error, Result};

/// Whether this superblock describes a UFS1 or UFS2 filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UfsVersion {
	Ufs1,
	Ufs2,
}

impl Superblock {
	fn is_plausible(&self) -> bool {
		if self.magic != FS_UFS1_MAGIC && self.magic != FS_UFS2_MAGIC {
			return false;
		}
		if self.ncg < 1 {
			return false;
		}
		if self.bsize < MINBSIZE || self.bsize > MAXBSIZE {
			return false;
		}
		if self.sbsize < 0 || self.sbsize as usize > SBLOCKSIZE {
			return false;
		}
		true
	}

	pub fn version(&self) -> UfsVersion {
		if self.magic == FS_UFS2_MAGIC {
			UfsVersion::Ufs2
		} else {
			UfsVersion::Ufs1
		}
	}
}

/// Probe each offset in [`SBLOCKSEARCH`] in order, returning the first
/// candidate that decodes and passes [`Superblock::is_plausible`]. A
/// decode failure at one offset is not fatal: it just means this isn't
/// where the superblock lives, so we move on to the next candidate.
pub fn find<T: Read + Seek>(dec: &mut Decoder<T>) -> Result<Superblock> {
	for &off in SBLOCKSEARCH.iter() {
		debug!("probing for superblock at offset {off}");
		let sb: Result<Superblock> = dec.decode_at(off).map_err(Error::from);
		match sb {
			Ok(sb) if sb.is_plausible() => {
				debug!("found superblock at offset {off}, magic {:#x}", sb.magic);
				return Ok(sb);
			}
			Ok(sb) => warn!("rejected implausible superblock at offset {off}, magic {:#x}", sb.magic),
			Err(e) => warn!("failed to decode candidate superblock at offset {off}: {e}"),
		}
	}
	Err(Error::SuperblockNotFound)
}
