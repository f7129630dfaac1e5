//! The public inode handle: a cheap, cloneable reference to one inode
//! number on a volume, with its on-disk record decoded lazily and
//! memoized on first access. Metadata, directory iteration, symlink
//! resolution and data reads all hang off this handle.

use std::cell::RefCell;
use std::io::{Cursor, Read};
use std::rc::Rc;

use log::error;

use crate::data::InodeNum;
use crate::dinode::{encode_pointer_area, Dinode, FileType};
use crate::dir::DirIter;
use crate::error::{Error, Result};
use crate::reader::RunlistReader;
use crate::runlist::{self, Run};
use crate::sb::UfsVersion;
use crate::volume::VolumeState;

struct InodeData<T> {
	volume:        Rc<RefCell<VolumeState<T>>>,
	inum:          InodeNum,
	name:          Option<String>,
	filetype_hint: Option<u16>,
	parent:        Option<InodeNum>,
	record:        RefCell<Option<Dinode>>,
	runs:          RefCell<Option<Rc<Vec<Run>>>>,
}

/// A reference to one inode on a [`crate::volume::Volume`]. Cloning is
/// cheap: it bumps a reference count, it does not copy the decoded
/// record.
pub struct Inode<T> {
	data: Rc<InodeData<T>>,
}

impl<T> Clone for Inode<T> {
	fn clone(&self) -> Self {
		Self { data: self.data.clone() }
	}
}

impl<T: Read + std::io::Seek + 'static> Inode<T> {
	pub(crate) fn new(
		volume: Rc<RefCell<VolumeState<T>>>,
		inum: InodeNum,
		name: Option<String>,
		filetype_hint: Option<FileType>,
		parent: Option<InodeNum>,
	) -> Self {
		Self {
			data: Rc::new(InodeData {
				volume,
				inum,
				name,
				filetype_hint: filetype_hint.map(FileType::as_mode_bits),
				parent,
				record: RefCell::new(None),
				runs: RefCell::new(None),
			}),
		}
	}

	pub fn inum(&self) -> InodeNum {
		self.data.inum
	}

	pub fn name(&self) -> Option<&str> {
		self.data.name.as_deref()
	}

	pub fn parent(&self) -> Option<InodeNum> {
		self.data.parent
	}

	/// Load (if not already cached) and return the on-disk record.
	fn record(&self) -> Result<Dinode> {
		if let Some(rec) = self.data.record.borrow().as_ref() {
			return Ok(rec.clone());
		}

		let mut state = self.data.volume.borrow_mut();
		let inode_size = state.inode_size;
		let version = state.version;
		let off = state.superblock.ino_to_offset(self.data.inum, inode_size);

		let rec = match version {
			UfsVersion::Ufs1 => state.decoder.decode_at(off).map(Dinode::V1)?,
			UfsVersion::Ufs2 => state.decoder.decode_at(off).map(Dinode::V2)?,
		};
		drop(state);

		if rec.mode() == 0 {
			error!("inode {} has mode 0, possibly unallocated", self.data.inum);
		}

		*self.data.record.borrow_mut() = Some(rec.clone());
		Ok(rec)
	}

	/// POSIX file-type nibble (`mode & 0xF000`). Uses the constructor's
	/// hint without touching the on-disk record when one was supplied.
	pub fn kind(&self) -> Result<u16> {
		match self.data.filetype_hint {
			Some(hint) => Ok(hint),
			None => Ok(self.record()?.kind()),
		}
	}

	pub fn is_dir(&self) -> Result<bool> {
		Ok(self.kind()? == crate::data::S_IFDIR)
	}

	pub fn is_file(&self) -> Result<bool> {
		Ok(self.kind()? == crate::data::S_IFREG)
	}

	pub fn is_symlink(&self) -> Result<bool> {
		Ok(self.kind()? == crate::data::S_IFLNK)
	}

	pub fn size(&self) -> Result<u64> {
		Ok(self.record()?.size())
	}

	pub fn mode(&self) -> Result<u16> {
		Ok(self.record()?.mode())
	}

	pub fn nblocks(&self) -> Result<u64> {
		Ok(self.record()?.blocks())
	}

	pub fn uid(&self) -> Result<u32> {
		Ok(self.record()?.uid())
	}

	pub fn gid(&self) -> Result<u32> {
		Ok(self.record()?.gid())
	}

	pub fn nlink(&self) -> Result<i16> {
		Ok(self.record()?.nlink())
	}

	pub fn flags(&self) -> Result<u32> {
		Ok(self.record()?.flags())
	}

	pub fn atime_ns(&self) -> Result<i128> {
		let (s, ns) = self.record()?.atime();
		Ok(s as i128 * 1_000_000_000 + ns as i128)
	}

	pub fn mtime_ns(&self) -> Result<i128> {
		let (s, ns) = self.record()?.mtime();
		Ok(s as i128 * 1_000_000_000 + ns as i128)
	}

	pub fn ctime_ns(&self) -> Result<i128> {
		let (s, ns) = self.record()?.ctime();
		Ok(s as i128 * 1_000_000_000 + ns as i128)
	}

	/// `None` for UFS1, which has no birth time.
	pub fn btime_ns(&self) -> Result<Option<i128>> {
		Ok(self.record()?.btime_ns())
	}

	/// The symlink target, decoded with invalid-byte-sequence-preserving
	/// fallback. Fails if this inode is not a symlink.
	pub fn link(&self) -> Result<String> {
		if !self.is_symlink()? {
			return Err(Error::NotASymlink { inr: self.data.inum });
		}
		let mut buf = Vec::new();
		self.open()?.read_to_end(&mut buf)?;
		Ok(String::from_utf8_lossy(&buf).into_owned())
	}

	/// Resolve one symlink hop: a relative target is resolved against
	/// this inode's parent (valid because `.`/`..` are real directory
	/// entries), an absolute one from the volume root.
	pub fn link_inode(&self) -> Result<Inode<T>> {
		let target = self.link()?;
		let volume = self.volume_handle();

		if let Some(rest) = target.strip_prefix('/') {
			volume.get(rest, None)
		} else {
			let parent = self
				.data
				.parent
				.map(|p| volume.inode(p))
				.unwrap_or_else(|| volume.root());
			volume.get(target.as_str(), Some(parent))
		}
	}

	/// Iterate the directory's entries, `.`/`..` included, in on-disk
	/// order.
	pub fn iterdir(&self) -> Result<Vec<Inode<T>>> {
		if !self.is_dir()? {
			return Err(Error::NotADirectory { inr: self.data.inum });
		}

		let mut buf = Vec::new();
		self.open()?.read_to_end(&mut buf)?;

		let volume = self.volume_handle();
		Ok(DirIter::new(&buf)
			.map(|e| {
				volume.inode_with_hint(
					e.ino,
					e.name,
					e.kind,
					self.data.inum,
				)
			})
			.collect())
	}

	/// [`Inode::iterdir`], paired with each child's name, in on-disk
	/// order (`.`/`..` first).
	pub fn listdir(&self) -> Result<Vec<(String, Inode<T>)>> {
		Ok(self
			.iterdir()?
			.into_iter()
			.map(|child| (child.name().unwrap_or_default().to_string(), child))
			.collect())
	}

	/// The run list describing where this file's data lives, memoized.
	pub fn dataruns(&self) -> Result<Rc<Vec<Run>>> {
		if let Some(runs) = self.data.runs.borrow().as_ref() {
			return Ok(runs.clone());
		}

		let rec = self.record()?;
		let (bsize, frag, nindir) = {
			let state = self.data.volume.borrow();
			(state.superblock.bsize as u64, state.superblock.frag as u64, state.superblock.nindir as u64)
		};

		let db = rec.db();
		let ib = rec.ib();
		let frag_per_block = frag;

		let blocks = {
			let volume = self.data.volume.clone();
			crate::blocks::enumerate_blocks(&db, ib, rec.size(), bsize, nindir, |addr| {
				read_indirect_block(&volume, addr, nindir, matches!(rec, Dinode::V1(_)))
			})?
		};

		let runs = Rc::new(runlist::build(blocks.into_iter(), frag_per_block));
		*self.data.runs.borrow_mut() = Some(runs.clone());
		Ok(runs)
	}

	/// Open this file's data for reading. Short inline symlinks are
	/// reconstructed from the inode's own pointer area; everything else
	/// streams through the run list.
	pub fn open(&self) -> Result<Box<dyn Read>> {
		let rec = self.record()?;
		let is_v1 = matches!(rec, Dinode::V1(_));

		if self.is_symlink()? {
			let maxsymlinklen = self.data.volume.borrow().superblock.maxsymlinklen as u64;
			if rec.size() < maxsymlinklen {
				let bytes = encode_pointer_area(&rec.db(), &rec.ib(), is_v1);
				let size = rec.size() as usize;
				return Ok(Box::new(Cursor::new(bytes[..size.min(bytes.len())].to_vec())));
			}
		}

		let runs = self.dataruns()?;
		let frag_size = self.data.volume.borrow().superblock.fsize as u64;
		Ok(Box::new(RunlistReader::new(self.data.volume.clone(), (*runs).clone(), frag_size, rec.size())))
	}

	fn volume_handle(&self) -> crate::volume::Volume<T> {
		crate::volume::Volume::from_state(self.data.volume.clone())
	}
}

fn read_indirect_block<T: Read + std::io::Seek>(
	volume: &Rc<RefCell<VolumeState<T>>>,
	addr: i64,
	nindir: u64,
	is_v1: bool,
) -> std::io::Result<Vec<i64>> {
	let mut state = volume.borrow_mut();
	let byte_addr = state.superblock.fsbtodb(addr) * 512;

	let mut out = Vec::with_capacity(nindir as usize);
	if is_v1 {
		let mut raw = vec![0u8; nindir as usize * 4];
		state.decoder.read_at(byte_addr, &mut raw)?;
		for chunk in raw.chunks_exact(4) {
			out.push(i32::from_le_bytes(chunk.try_into().unwrap()) as i64);
		}
	} else {
		let mut raw = vec![0u8; nindir as usize * 8];
		state.decoder.read_at(byte_addr, &mut raw)?;
		for chunk in raw.chunks_exact(8) {
			out.push(i64::from_le_bytes(chunk.try_into().unwrap()));
		}
	}
	Ok(out)
}
