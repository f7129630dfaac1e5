//! On-disk layout descriptors for UFS1/UFS2: the superblock, cylinder group
//! header, both dinode formats, and directory entries. Field order, widths
//! and padding follow FreeBSD's `sys/ufs/ufs/fs.h` and `dinode.h` verbatim.

use std::mem::size_of;

use bincode::Decode;

/// UFS1 fast filesystem magic number (`FS_UFS1_MAGIC`).
pub const FS_UFS1_MAGIC: i32 = 0x011954;

/// UFS2 fast filesystem magic number (`FS_UFS2_MAGIC`).
pub const FS_UFS2_MAGIC: i32 = 0x19540119;

/// Magic number of a cylinder group (`CG_MAGIC`).
pub const CG_MAGIC: i32 = 0x090255;

/// Byte offset of the floppy superblock candidate.
pub const SBLOCK_FLOPPY: u64 = 0;
/// Byte offset of the historic UFS1 superblock candidate.
pub const SBLOCK_UFS1: u64 = 8192;
/// Byte offset of the UFS2 superblock candidate.
pub const SBLOCK_UFS2: u64 = 65536;
/// Byte offset of the "really piggy" superblock candidate.
pub const SBLOCK_PIGGY: u64 = 262144;

/// Order in which superblock candidate offsets are probed.
pub const SBLOCKSEARCH: [u64; 4] = [SBLOCK_UFS2, SBLOCK_UFS1, SBLOCK_FLOPPY, SBLOCK_PIGGY];

/// Size of a superblock record.
pub const SBLOCKSIZE: usize = 8192;

/// Smallest allowable filesystem block size.
pub const MINBSIZE: i32 = 4096;
/// Largest allowable filesystem block size.
pub const MAXBSIZE: i32 = 65536;

/// Max number of fragments per block.
pub const MAXFRAG: usize = 8;

/// `ufs_time_t` on FreeBSD.
pub type UfsTime = i64;

/// UFS-native inode number type.
pub type InodeNum = u32;

/// The root inode is always inode 2; inode 0 is unused and inode 1 is a
/// historic bad-block placeholder.
pub const UFS_ROOTINO: InodeNum = 2;

/// Amount of space reserved in the superblock for the mount path.
pub const MAXMNTLEN: usize = 468;

/// Amount of space reserved in the superblock for the volume name.
pub const MAXVOLLEN: usize = 32;

/// Maximum number of snapshot inodes recorded in the superblock.
pub const FSMAXSNAP: usize = 20;

/// Padding behind the single summary-info pointer in the superblock.
pub const NOCSPTRS: usize = (128 / size_of::<usize>()) - 1;

/// External addresses in an inode (extended attributes).
pub const UFS_NXADDR: usize = 2;
/// Direct addresses in an inode.
pub const UFS_NDADDR: usize = 12;
/// Indirect addresses in an inode.
pub const UFS_NIADDR: usize = 3;
/// Maximum length of a directory entry's name.
pub const UFS_MAXNAMLEN: usize = 255;

/// type of file mask
pub const S_IFMT: u16 = 0o170000;
/// named pipe (fifo)
pub const S_IFIFO: u16 = 0o010000;
/// character special
pub const S_IFCHR: u16 = 0o020000;
/// directory
pub const S_IFDIR: u16 = 0o040000;
/// block special
pub const S_IFBLK: u16 = 0o060000;
/// regular file
pub const S_IFREG: u16 = 0o100000;
/// symbolic link
pub const S_IFLNK: u16 = 0o120000;
/// socket
pub const S_IFSOCK: u16 = 0o140000;

pub const DT_UNKNOWN: u8 = 0;
pub const DT_FIFO: u8 = 1;
pub const DT_CHR: u8 = 2;
pub const DT_DIR: u8 = 4;
pub const DT_BLK: u8 = 6;
pub const DT_REG: u8 = 8;
pub const DT_LNK: u8 = 10;
pub const DT_SOCK: u8 = 12;
pub const DT_WHT: u8 = 14;

/// Per-cylinder-group free-space summary. `struct csum` in FreeBSD.
#[derive(Debug, Clone, Copy, Decode)]
pub struct Csum {
	pub ndir:   i32,
	pub nbfree: i32,
	pub nifree: i32,
	pub nffree: i32,
}

/// Filesystem-wide free-space summary. `struct csum_total` in FreeBSD.
#[derive(Debug, Clone, Copy, Decode)]
pub struct CsumTotal {
	pub ndir:        i64,
	pub nbfree:      i64,
	pub nifree:      i64,
	pub nffree:      i64,
	pub numclusters: i64,
	pub spare:       [i64; 3],
}

/// Superblock for a UFS1/UFS2 filesystem. `struct fs` in FreeBSD; shared
/// between both versions verbatim, only `magic` distinguishes them.
#[derive(Debug, Clone, Decode)]
pub struct Superblock {
	pub firstfield:       i32,
	pub unused_1:         i32,
	pub sblkno:           i32,
	pub cblkno:           i32,
	pub iblkno:           i32,
	pub dblkno:           i32,
	pub old_cgoffset:     i32,
	pub old_cgmask:       i32,
	pub old_time:         i32,
	pub old_size:         i32,
	pub old_dsize:        i32,
	pub ncg:              u32,
	pub bsize:            i32,
	pub fsize:            i32,
	pub frag:             i32,
	pub minfree:          i32,
	pub old_rotdelay:     i32,
	pub old_rps:          i32,
	pub bmask:            i32,
	pub fmask:            i32,
	pub bshift:           i32,
	pub fshift:           i32,
	pub maxcontig:        i32,
	pub maxbpg:           i32,
	pub fragshift:        i32,
	pub fsbtodb:          i32,
	pub sbsize:           i32,
	pub spare1:           [i32; 2],
	pub nindir:           i32,
	pub inopb:            u32,
	pub old_nspf:         i32,
	pub optim:            i32,
	pub old_npsect:       i32,
	pub old_interleave:   i32,
	pub old_trackskew:    i32,
	pub id:               [i32; 2],
	pub old_csaddr:       i32,
	pub cssize:           i32,
	pub cgsize:           i32,
	pub spare2:           i32,
	pub old_nsect:        i32,
	pub old_spc:          i32,
	pub old_ncyl:         i32,
	pub old_cpg:          i32,
	pub ipg:              u32,
	pub fpg:              i32,
	pub old_cstotal:      Csum,
	pub fmod:             i8,
	pub clean:            i8,
	pub ronly:            i8,
	pub old_flags:        i8,
	pub fsmnt:            [u8; MAXMNTLEN],
	pub volname:          [u8; MAXVOLLEN],
	pub swuid:            u64,
	pub pad:              i32,
	pub cgrotor:          i32,
	pub ocsp:             [usize; NOCSPTRS],
	pub si:               usize,
	pub old_cpc:          i32,
	pub maxbsize:         i32,
	pub unrefs:           i64,
	pub providersize:     i64,
	pub metaspace:        i64,
	pub sparecon64:       [i64; 13],
	pub sblockactualloc:  i64,
	pub sblockloc:        i64,
	pub cstotal:          CsumTotal,
	pub time:             UfsTime,
	pub size:             i64,
	pub dsize:            i64,
	pub csaddr:           i64,
	pub pendingblocks:    i64,
	pub pendinginodes:    u32,
	pub snapinum:         [u32; FSMAXSNAP],
	pub avgfilesize:      u32,
	pub avgfpdir:         u32,
	pub save_cgsize:      i32,
	pub mtime:            UfsTime,
	pub sujfree:          i32,
	pub sparecon32:       [i32; 21],
	pub ckhash:           u32,
	pub metackhash:       u32,
	pub flags:            i32,
	pub contigsumsize:    i32,
	pub maxsymlinklen:    i32,
	pub old_inodefmt:     i32,
	pub maxfilesize:      u64,
	pub qbmask:           i64,
	pub qfmask:           i64,
	pub state:            i32,
	pub old_postblformat: i32,
	pub old_nrpos:        i32,
	pub spare5:           [i32; 2],
	pub magic:            i32,
}

/// Cylinder group header. `struct cg` in FreeBSD; only the fixed-size
/// prefix is decoded, the variable-length bitmaps that follow are read
/// separately by byte offset.
#[derive(Debug, Clone, Decode)]
pub struct CylGroup {
	pub firstfield:    i32,
	pub magic:         i32,
	pub old_time:      i32,
	pub cgx:           u32,
	pub old_ncyl:      i16,
	pub old_niblk:     i16,
	pub ndblk:         u32,
	pub cs:            Csum,
	pub rotor:         u32,
	pub frotor:        u32,
	pub irotor:        u32,
	pub frsum:         [u32; MAXFRAG],
	pub old_btotoff:   i32,
	pub old_boff:      i32,
	pub iusedoff:      u32,
	pub freeoff:       u32,
	pub nextfreeoff:   u32,
	pub clustersumoff: u32,
	pub clusteroff:    u32,
	pub nclusterblks:  u32,
	pub niblk:         u32,
	pub initediblk:    u32,
	pub unrefs:        u32,
	pub sparecon32:    [i32; 1],
	pub ckhash:        u32,
	pub time:          UfsTime,
	pub sparecon64:    [i64; 3],
}

/// UFS2 on-disk inode. `struct ufs2_dinode` in FreeBSD, 256 bytes.
#[derive(Debug, Clone, Decode)]
pub struct Ufs2Dinode {
	pub mode:      u16,
	pub nlink:     i16,
	pub uid:       u32,
	pub gid:       u32,
	pub blksize:   u32,
	pub size:      u64,
	pub blocks:    u64,
	pub atime:     UfsTime,
	pub mtime:     UfsTime,
	pub ctime:     UfsTime,
	pub birthtime: UfsTime,
	pub mtimensec: i32,
	pub atimensec: i32,
	pub ctimensec: i32,
	pub birthnsec: i32,
	pub gen:       u32,
	pub kernflags: u32,
	pub flags:     u32,
	pub extsize:   u32,
	pub extb:      [i64; UFS_NXADDR],
	pub db:        [i64; UFS_NDADDR],
	pub ib:        [i64; UFS_NIADDR],
	pub modrev:    u64,
	pub freelink:  u32,
	pub ckhash:    u32,
	pub spare:     [u32; 2],
}

/// UFS1 on-disk inode. `struct ufs1_dinode` in FreeBSD, 128 bytes.
#[derive(Debug, Clone, Decode)]
pub struct Ufs1Dinode {
	pub mode:      u16,
	pub nlink:     i16,
	pub freelink:  u32,
	pub size:      u64,
	pub atime:     i32,
	pub atimensec: i32,
	pub mtime:     i32,
	pub mtimensec: i32,
	pub ctime:     i32,
	pub ctimensec: i32,
	pub db:        [i32; UFS_NDADDR],
	pub ib:        [i32; UFS_NIADDR],
	pub flags:     u32,
	pub blocks:    u32,
	pub gen:       u32,
	pub uid:       u32,
	pub gid:       u32,
	pub modrev:    u64,
}

/// Fixed 8-byte header of a directory entry; the name follows, padded to a
/// 4-byte record boundary.
#[derive(Debug, Clone, Copy, Decode)]
pub struct DirentHeader {
	pub ino:     u32,
	pub reclen:  u16,
	pub kind:    u8,
	pub namelen: u8,
}

impl Superblock {
	/// Size in bytes of one cylinder group's data area.
	pub fn cgsize(&self) -> u64 {
		self.fpg as u64 * self.fsize as u64
	}

	/// `fsbtodb`: fragment address to 512-byte device block address.
	pub fn fsbtodb(&self, b: i64) -> u64 {
		(b << self.fsbtodb) as u64
	}

	/// `cgbase`: first fragment address of cylinder group `c`.
	pub fn cgbase(&self, c: u64) -> i64 {
		self.fpg as i64 * c as i64
	}

	/// `cgstart`: start of cylinder group `c`, accounting for the UFS1
	/// historic rotational offset.
	pub fn cgstart(&self, c: u64) -> i64 {
		if self.magic == FS_UFS2_MAGIC {
			self.cgbase(c)
		} else {
			self.cgbase(c) + self.old_cgoffset as i64 * (c as i32 & !self.old_cgmask) as i64
		}
	}

	/// `cgtod`: fragment address of cylinder group `c`'s own header.
	pub fn cgtod(&self, c: u64) -> i64 {
		self.cgstart(c) + self.cblkno as i64
	}

	/// `cgimin`: fragment address of the first inode block of group `c`.
	pub fn cgimin(&self, c: u64) -> i64 {
		self.cgstart(c) + self.iblkno as i64
	}

	/// `blkstofrags`: convert a block count to a fragment count.
	pub fn blkstofrags(&self, blocks: u64) -> u64 {
		blocks << self.fragshift
	}

	/// `ino_to_cg`: inode number to cylinder group number.
	pub fn ino_to_cg(&self, ino: InodeNum) -> u64 {
		ino as u64 / self.ipg as u64
	}

	/// `ino_to_fsba`: inode number to filesystem (fragment) block address.
	pub fn ino_to_fsba(&self, ino: InodeNum) -> i64 {
		let cg = self.ino_to_cg(ino);
		let frags = self.blkstofrags((ino as u64 % self.ipg as u64) / self.inopb as u64);
		self.cgimin(cg) + frags as i64
	}

	/// `ino_to_fsbo`: inode number to block-local inode slot index.
	pub fn ino_to_fsbo(&self, ino: InodeNum) -> u64 {
		ino as u64 % self.inopb as u64
	}

	/// Absolute byte offset of inode `ino`'s on-disk record.
	pub fn ino_to_offset(&self, ino: InodeNum, inode_size: u64) -> u64 {
		let block = self.fsbtodb(self.ino_to_fsba(ino));
		block * 512 + self.ino_to_fsbo(ino) * inode_size
	}
}
