//! Presents a file's scattered data blocks as one contiguous, seekable
//! byte stream, zero-filling holes on the fly.

use std::cell::RefCell;
use std::io::{Cursor, Read, Result as IoResult, Seek, SeekFrom};
use std::rc::Rc;

use crate::runlist::Run;

/// Something `RunlistReader` can read an arbitrary byte range from,
/// without owning a cursor of its own. Implemented for [`VolumeState`]
/// so a reader can share the one underlying seekable source every other
/// decode path uses.
///
/// [`VolumeState`]: crate::volume::VolumeState
pub trait ByteSource {
	fn read_at(&mut self, pos: u64, buf: &mut [u8]) -> IoResult<()>;
}

impl<T: Read + Seek> ByteSource for crate::volume::VolumeState<T> {
	fn read_at(&mut self, pos: u64, buf: &mut [u8]) -> IoResult<()> {
		self.decoder.read_at(pos, buf)
	}
}

impl<T: AsRef<[u8]>> ByteSource for Cursor<T> {
	fn read_at(&mut self, pos: u64, buf: &mut [u8]) -> IoResult<()> {
		self.seek(SeekFrom::Start(pos))?;
		self.read_exact(buf)
	}
}

/// A `Read + Seek` view over a file's run list.
///
/// `frag_size` is the byte size of one fragment (the unit runs are
/// measured in); `total_size` caps the stream at the inode's logical
/// size, since the last fragment of the last block is usually only
/// partially used.
pub struct RunlistReader<S> {
	source:     Rc<RefCell<S>>,
	runs:       Vec<Run>,
	frag_size:  u64,
	total_size: u64,
	pos:        u64,
}

impl<S: ByteSource> RunlistReader<S> {
	pub fn new(source: Rc<RefCell<S>>, runs: Vec<Run>, frag_size: u64, total_size: u64) -> Self {
		Self {
			source,
			runs,
			frag_size,
			total_size,
			pos: 0,
		}
	}

	/// Locate the run containing stream offset `pos`, returning
	/// `(run_index, offset_within_run)` in bytes, or `None` past the end
	/// of the run list.
	fn locate(&self, pos: u64) -> Option<(usize, u64)> {
		let mut base = 0u64;
		for (i, run) in self.runs.iter().enumerate() {
			let len = run.len() * self.frag_size;
			if pos < base + len {
				return Some((i, pos - base));
			}
			base += len;
		}
		None
	}
}

impl<S: ByteSource> Read for RunlistReader<S> {
	fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
		if self.pos >= self.total_size {
			return Ok(0);
		}
		let want = (buf.len() as u64).min(self.total_size - self.pos) as usize;
		if want == 0 {
			return Ok(0);
		}

		let Some((idx, run_off)) = self.locate(self.pos) else {
			return Ok(0);
		};
		let run = self.runs[idx];
		let run_len = run.len() * self.frag_size;
		let avail = (run_len - run_off).min(want as u64) as usize;

		match run {
			Run::Hole { .. } => {
				buf[..avail].fill(0);
			}
			Run::Data { addr, .. } => {
				let byte_addr = addr as u64 * self.frag_size + run_off;
				self.source.borrow_mut().read_at(byte_addr, &mut buf[..avail])?;
			}
		}

		self.pos += avail as u64;
		Ok(avail)
	}
}

impl<S> Seek for RunlistReader<S> {
	fn seek(&mut self, pos: SeekFrom) -> IoResult<u64> {
		let new_pos = match pos {
			SeekFrom::Start(p) => p as i64,
			SeekFrom::Current(off) => self.pos as i64 + off,
			SeekFrom::End(off) => self.total_size as i64 + off,
		};
		if new_pos < 0 {
			return Err(std::io::Error::new(
				std::io::ErrorKind::InvalidInput,
				"seek to a negative position",
			));
		}
		self.pos = new_pos as u64;
		Ok(self.pos)
	}
}
