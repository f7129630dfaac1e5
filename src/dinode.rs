//! Unifies the UFS1 and UFS2 on-disk inode formats behind one accessor
//! surface, decided once at decode time so every other module is
//! oblivious to which on-disk format it's reading.

use crate::data::*;

/// A decoded on-disk inode record, UFS1 or UFS2.
#[derive(Debug, Clone)]
pub enum Dinode {
	V1(Ufs1Dinode),
	V2(Ufs2Dinode),
}

/// POSIX file-type nibble, decoded from either `mode & S_IFMT` or a
/// directory entry's `d_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
	NamedPipe,
	CharDevice,
	Directory,
	BlockDevice,
	RegularFile,
	Symlink,
	Socket,
}

impl FileType {
	/// Decode from `mode & S_IFMT`.
	pub fn from_mode(mode: u16) -> Option<Self> {
		match mode & S_IFMT {
			S_IFIFO => Some(Self::NamedPipe),
			S_IFCHR => Some(Self::CharDevice),
			S_IFDIR => Some(Self::Directory),
			S_IFBLK => Some(Self::BlockDevice),
			S_IFREG => Some(Self::RegularFile),
			S_IFLNK => Some(Self::Symlink),
			S_IFSOCK => Some(Self::Socket),
			_ => None,
		}
	}

	/// Decode from a directory entry's `d_type` byte.
	pub fn from_dirent_type(kind: u8) -> Option<Self> {
		match kind {
			DT_FIFO => Some(Self::NamedPipe),
			DT_CHR => Some(Self::CharDevice),
			DT_DIR => Some(Self::Directory),
			DT_BLK => Some(Self::BlockDevice),
			DT_REG => Some(Self::RegularFile),
			DT_LNK => Some(Self::Symlink),
			DT_SOCK | DT_WHT | DT_UNKNOWN => None,
			_ => None,
		}
	}

	/// The `mode & S_IFMT` value this file type corresponds to.
	pub fn as_mode_bits(self) -> u16 {
		match self {
			Self::NamedPipe => S_IFIFO,
			Self::CharDevice => S_IFCHR,
			Self::Directory => S_IFDIR,
			Self::BlockDevice => S_IFBLK,
			Self::RegularFile => S_IFREG,
			Self::Symlink => S_IFLNK,
			Self::Socket => S_IFSOCK,
		}
	}
}

impl Dinode {
	pub fn mode(&self) -> u16 {
		match self {
			Self::V1(d) => d.mode,
			Self::V2(d) => d.mode,
		}
	}

	pub fn nlink(&self) -> i16 {
		match self {
			Self::V1(d) => d.nlink,
			Self::V2(d) => d.nlink,
		}
	}

	pub fn uid(&self) -> u32 {
		match self {
			Self::V1(d) => d.uid,
			Self::V2(d) => d.uid,
		}
	}

	pub fn gid(&self) -> u32 {
		match self {
			Self::V1(d) => d.gid,
			Self::V2(d) => d.gid,
		}
	}

	pub fn size(&self) -> u64 {
		match self {
			Self::V1(d) => d.size,
			Self::V2(d) => d.size,
		}
	}

	pub fn blocks(&self) -> u64 {
		match self {
			Self::V1(d) => d.blocks as u64,
			Self::V2(d) => d.blocks,
		}
	}

	pub fn flags(&self) -> u32 {
		match self {
			Self::V1(d) => d.flags,
			Self::V2(d) => d.flags,
		}
	}

	/// `(seconds, nanoseconds)` for each timestamp. UFS1 stores no birth
	/// time; callers distinguish that with [`Dinode::btime_ns`] returning
	/// `None`.
	pub fn atime(&self) -> (i64, i32) {
		match self {
			Self::V1(d) => (d.atime as i64, d.atimensec),
			Self::V2(d) => (d.atime, d.atimensec),
		}
	}

	pub fn mtime(&self) -> (i64, i32) {
		match self {
			Self::V1(d) => (d.mtime as i64, d.mtimensec),
			Self::V2(d) => (d.mtime, d.mtimensec),
		}
	}

	pub fn ctime(&self) -> (i64, i32) {
		match self {
			Self::V1(d) => (d.ctime as i64, d.ctimensec),
			Self::V2(d) => (d.ctime, d.ctimensec),
		}
	}

	pub fn btime_ns(&self) -> Option<i128> {
		match self {
			Self::V1(_) => None,
			Self::V2(d) => Some(d.birthtime as i128 * 1_000_000_000 + d.birthnsec as i128),
		}
	}

	/// Direct block addresses, widened to fragment (`i64`) addresses
	/// regardless of the on-disk pointer width.
	pub fn db(&self) -> [i64; UFS_NDADDR] {
		match self {
			Self::V1(d) => {
				let mut out = [0i64; UFS_NDADDR];
				for (o, x) in out.iter_mut().zip(d.db.iter()) {
					*o = *x as i64;
				}
				out
			}
			Self::V2(d) => d.db,
		}
	}

	/// Indirect block addresses (single/double/triple), widened to `i64`.
	pub fn ib(&self) -> [i64; UFS_NIADDR] {
		match self {
			Self::V1(d) => {
				let mut out = [0i64; UFS_NIADDR];
				for (o, x) in out.iter_mut().zip(d.ib.iter()) {
					*o = *x as i64;
				}
				out
			}
			Self::V2(d) => d.ib,
		}
	}

	pub fn kind(&self) -> u16 {
		self.mode() & S_IFMT
	}
}

/// Helper used when a [`Dinode`] must be decoded from a byte-exact copy of
/// an inode's direct+indirect pointer area for short-symlink inline
/// decoding (see [`crate::inode::Inode::open`]).
pub(crate) fn encode_pointer_area(db: &[i64; UFS_NDADDR], ib: &[i64; UFS_NIADDR], v1: bool) -> Vec<u8> {
	let mut out = Vec::with_capacity((UFS_NDADDR + UFS_NIADDR) * if v1 { 4 } else { 8 });
	if v1 {
		for x in db {
			out.extend_from_slice(&(*x as i32).to_le_bytes());
		}
		for x in ib {
			out.extend_from_slice(&(*x as i32).to_le_bytes());
		}
	} else {
		for x in db {
			out.extend_from_slice(&x.to_le_bytes());
		}
		for x in ib {
			out.extend_from_slice(&x.to_le_bytes());
		}
	}
	out
}
