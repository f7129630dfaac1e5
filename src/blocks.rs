//! Turns an inode's twelve direct and three indirect pointers into a flat,
//! file-order sequence of fragment addresses, one per filesystem block.
//!
//! Recursing once per indirect block would put a stack frame per
//! addressed block on a worst-case triple-indirect file (`nindir^3` of
//! them), so this walks the tree with an explicit stack instead.

use std::io::Result as IoResult;

use crate::data::UFS_NDADDR;

/// Collect the fragment address of every filesystem block in a file, in
/// file order. `read_indirect` reads one indirect block's worth of child
/// addresses, already widened to `i64` regardless of on-disk pointer
/// width.
pub fn enumerate_blocks(
	db: &[i64; UFS_NDADDR],
	ib: [i64; 3],
	size: u64,
	block_size: u64,
	nindir: u64,
	mut read_indirect: impl FnMut(i64) -> IoResult<Vec<i64>>,
) -> IoResult<Vec<i64>> {
	let num_blocks = size.div_ceil(block_size.max(1));
	let num_direct = (num_blocks as usize).min(UFS_NDADDR);

	let mut out = Vec::with_capacity(num_blocks as usize);
	out.extend_from_slice(&db[..num_direct]);

	let mut remaining = num_blocks - num_direct as u64;
	if remaining == 0 || nindir == 0 {
		return Ok(out);
	}

	for (level, addr) in [(1u32, ib[0]), (2, ib[1]), (3, ib[2])] {
		if remaining == 0 {
			break;
		}
		walk_subtree(addr, level, &mut remaining, nindir, &mut read_indirect, &mut out)?;
	}

	Ok(out)
}

/// Depth-first walk of one indirect subtree rooted at `(addr, level)`,
/// pushing resolved leaf (level-0) addresses into `out` and decrementing
/// `remaining` as it goes. `addr == 0` anywhere in the tree marks an
/// unallocated (sparse) subtree; its leaves are reported as address 0
/// without any read.
fn walk_subtree(
	addr: i64,
	level: u32,
	remaining: &mut u64,
	nindir: u64,
	read_indirect: &mut impl FnMut(i64) -> IoResult<Vec<i64>>,
	out: &mut Vec<i64>,
) -> IoResult<()> {
	let mut stack = vec![(addr, level)];

	while let Some((addr, level)) = stack.pop() {
		if *remaining == 0 {
			break;
		}

		if level == 0 {
			out.push(addr);
			*remaining -= 1;
			continue;
		}

		let subtree_capacity = nindir.saturating_pow(level);

		if addr == 0 {
			let take = subtree_capacity.min(*remaining);
			out.extend(std::iter::repeat(0).take(take as usize));
			*remaining -= take;
			continue;
		}

		let blocks_per_child = subtree_capacity / nindir;
		let read_count = (*remaining).div_ceil(blocks_per_child).min(nindir) as usize;

		let children = read_indirect(addr)?;
		for &child in children[..read_count.min(children.len())].iter().rev() {
			stack.push((child, level - 1));
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn all_direct_blocks() {
		let mut db = [0i64; UFS_NDADDR];
		for (i, x) in db.iter_mut().enumerate() {
			*x = (i as i64 + 1) * 8;
		}
		let out = enumerate_blocks(&db, [0, 0, 0], 6 * 4096, 4096, 2048, |_| unreachable!()).unwrap();
		assert_eq!(out, vec![8, 16, 24, 32, 40, 48]);
	}

	#[test]
	fn single_indirect_reads_one_block() {
		let db = [0i64; UFS_NDADDR];
		let size = (UFS_NDADDR as u64 + 3) * 4096;
		let out = enumerate_blocks(&db, [100, 0, 0], size, 4096, 4096, |addr| {
			assert_eq!(addr, 100);
			Ok(vec![200, 208, 216, 0])
		})
		.unwrap();
		let mut expected = vec![0i64; UFS_NDADDR];
		expected.extend([200, 208, 216]);
		assert_eq!(out, expected);
	}

	#[test]
	fn sparse_indirect_pointer_yields_holes() {
		let db = [0i64; UFS_NDADDR];
		let size = (UFS_NDADDR as u64 + 2) * 4096;
		let out = enumerate_blocks(&db, [0, 0, 0], size, 4096, 4096, |_| unreachable!()).unwrap();
		let mut expected = vec![0i64; UFS_NDADDR];
		expected.extend([0, 0]);
		assert_eq!(out, expected);
	}
}
