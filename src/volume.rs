//! The entry point into a UFS volume: locates the superblock, owns the
//! byte source and the two lookup caches, and answers path and inum
//! lookups.

use std::cell::RefCell;
use std::io::{Read, Seek};
use std::rc::Rc;

use log::{debug, info, trace};
use lru::LruCache;

use crate::cg::CylinderGroup;
use crate::data::{InodeNum, MAXMNTLEN, MAXVOLLEN, UFS_ROOTINO};
use crate::decoder::Decoder;
use crate::dinode::FileType;
use crate::error::{Error, Result};
use crate::inode::Inode;
use crate::sb::{self, UfsVersion};

const CG_CACHE_SIZE: usize = 1024;
const INODE_CACHE_SIZE: usize = 4096;

/// Shared, interior-mutable state backing every [`Inode`] handle cut from
/// one [`Volume`]. All decode paths funnel through here, since every
/// decode shares the one underlying cursor.
pub struct VolumeState<T> {
	pub(crate) decoder:     Decoder<T>,
	pub(crate) superblock:  crate::data::Superblock,
	pub(crate) version:     UfsVersion,
	pub(crate) inode_size:  u64,
	pub(crate) mount_name:  String,
	pub(crate) volume_name: String,
	cg_cache:                LruCache<u64, Rc<CylinderGroup>>,
	inode_cache:             LruCache<InodeNum, Inode<T>>,
}

/// A mounted UFS1/UFS2 volume. Cheap to clone: it's a reference-counted
/// handle onto the shared [`VolumeState`].
pub struct Volume<T> {
	state: Rc<RefCell<VolumeState<T>>>,
}

impl<T> Clone for Volume<T> {
	fn clone(&self) -> Self {
		Self { state: self.state.clone() }
	}
}

fn decode_cstr_field(bytes: &[u8]) -> String {
	let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
	String::from_utf8_lossy(&bytes[..end]).into_owned()
}

impl<T: Read + Seek + 'static> Volume<T> {
	/// Open a volume over `source`, locating its superblock.
	pub fn open(source: T) -> Result<Self> {
		let mut decoder = Decoder::new(source);
		let superblock = sb::find(&mut decoder)?;
		let version = superblock.version();
		let inode_size = superblock.bsize as u64 / superblock.inopb as u64;

		let mount_name = decode_cstr_field(&superblock.fsmnt[..MAXMNTLEN.min(superblock.fsmnt.len())]);
		let volume_name = decode_cstr_field(&superblock.volname[..MAXVOLLEN.min(superblock.volname.len())]);

		info!(
			"opened {} UFS volume: {} blocks of {} bytes, {} cylinder groups",
			if version == UfsVersion::Ufs2 { "UFS2" } else { "UFS1" },
			superblock.size,
			superblock.bsize,
			superblock.ncg,
		);
		debug!("superblock: {superblock:#?}");

		let state = Rc::new(RefCell::new(VolumeState {
			decoder,
			superblock,
			version,
			inode_size,
			mount_name,
			volume_name,
			cg_cache: LruCache::new(std::num::NonZeroUsize::new(CG_CACHE_SIZE).unwrap()),
			inode_cache: LruCache::new(std::num::NonZeroUsize::new(INODE_CACHE_SIZE).unwrap()),
		}));

		Ok(Self { state })
	}

	/// Wrap an already-open volume's shared state, without re-probing the
	/// superblock. Used internally so an [`Inode`] can hand back a
	/// [`Volume`] for symlink and path resolution.
	pub(crate) fn from_state(state: Rc<RefCell<VolumeState<T>>>) -> Self {
		Self { state }
	}

	/// The volume's root directory, inode 2.
	pub fn root(&self) -> Inode<T> {
		self.inode(UFS_ROOTINO)
	}

	pub fn mount_name(&self) -> String {
		self.state.borrow().mount_name.clone()
	}

	pub fn volume_name(&self) -> String {
		self.state.borrow().volume_name.clone()
	}

	pub fn version(&self) -> UfsVersion {
		self.state.borrow().version
	}

	pub fn block_size(&self) -> u32 {
		self.state.borrow().superblock.bsize as u32
	}

	/// Construct or return a cached anonymous handle for inode `inum`.
	///
	/// Only lookups with no name/filetype-hint/parent are cached: a
	/// cache hit for a hinted lookup could return a handle whose name
	/// or parent doesn't match what the caller asked for.
	pub fn inode(&self, inum: InodeNum) -> Inode<T> {
		if let Some(cached) = self.state.borrow_mut().inode_cache.get(&inum) {
			return cached.clone();
		}
		let handle = Inode::new(self.state.clone(), inum, None, None, None);
		self.state.borrow_mut().inode_cache.put(inum, handle.clone());
		handle
	}

	/// Construct a handle carrying an explicit name/type-hint/parent,
	/// bypassing the cache (see [`Volume::inode`]).
	pub fn inode_with_hint(
		&self,
		inum: InodeNum,
		name: String,
		filetype_hint: Option<FileType>,
		parent: InodeNum,
	) -> Inode<T> {
		Inode::new(self.state.clone(), inum, Some(name), filetype_hint, Some(parent))
	}

	/// Return (and cache) the cylinder group handle for group `num`.
	pub(crate) fn cylinder_group(&self, num: u64) -> Result<Rc<CylinderGroup>> {
		if let Some(cg) = self.state.borrow_mut().cg_cache.get(&num) {
			return Ok(cg.clone());
		}
		let cg = {
			let mut state = self.state.borrow_mut();
			let sb = state.superblock.clone();
			Rc::new(CylinderGroup::read(&mut state.decoder, &sb, num)?)
		};
		self.state.borrow_mut().cg_cache.put(num, cg.clone());
		Ok(cg)
	}

	/// Look up a path or a raw inode number, optionally starting from a
	/// node other than the root.
	pub fn get(&self, path: impl Into<PathOrInum>, start: Option<Inode<T>>) -> Result<Inode<T>> {
		match path.into() {
			PathOrInum::Inum(inr) => Ok(self.inode(inr)),
			PathOrInum::Path(path) => self.resolve_path(&path, start),
		}
	}

	fn resolve_path(&self, path: &str, start: Option<Inode<T>>) -> Result<Inode<T>> {
		const MAX_SYMLINK_HOPS: u32 = 40;

		let mut node = start.unwrap_or_else(|| self.root());
		let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
		let mut hops = 0u32;

		for (i, seg) in segments.iter().enumerate() {
			let more_segments_follow = i + 1 < segments.len();
			while more_segments_follow && node.is_symlink()? {
				hops += 1;
				if hops > MAX_SYMLINK_HOPS {
					return Err(Error::TooManySymlinks { path: path.to_string() });
				}
				node = node.link_inode()?;
			}

			let mut found = None;
			for child in node.iterdir()? {
				if child.name().map(|n| n == *seg).unwrap_or(false) {
					found = Some(child);
					break;
				}
			}
			node = found.ok_or_else(|| Error::NotFound { path: path.to_string() })?;
		}

		Ok(node)
	}

	/// Iterate every allocated inode from inum 2 upward, in ascending
	/// order.
	pub fn iter_inodes(&self) -> Result<Vec<Inode<T>>> {
		let (ncg, ipg) = {
			let state = self.state.borrow();
			(state.superblock.ncg as u64, state.superblock.ipg as u64)
		};
		let num_inodes = ncg * ipg;

		let mut out = Vec::new();
		let mut cur_cg: Option<(u64, Rc<CylinderGroup>)> = None;

		for inum in UFS_ROOTINO as u64..num_inodes {
			let cgnum = {
				let state = self.state.borrow();
				state.superblock.ino_to_cg(inum as InodeNum)
			};
			let cg = match &cur_cg {
				Some((n, cg)) if *n == cgnum => cg.clone(),
				_ => {
					let cg = self.cylinder_group(cgnum)?;
					cur_cg = Some((cgnum, cg.clone()));
					cg
				}
			};

			let ipg = { self.state.borrow().superblock.ipg as u64 };
			if cg.is_inode_allocated(inum % ipg) {
				out.push(self.inode(inum as InodeNum));
			}
		}

		Ok(out)
	}
}

/// Either a slash-separated path or a raw inode number, accepted by
/// [`Volume::get`].
pub enum PathOrInum {
	Path(String),
	Inum(InodeNum),
}

impl From<&str> for PathOrInum {
	fn from(s: &str) -> Self {
		Self::Path(s.to_string())
	}
}

impl From<String> for PathOrInum {
	fn from(s: String) -> Self {
		Self::Path(s)
	}
}

impl From<InodeNum> for PathOrInum {
	fn from(n: InodeNum) -> Self {
		Self::Inum(n)
	}
}
