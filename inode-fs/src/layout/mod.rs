//! # 磁盘数据结构层
//!
//! inode-fs 的磁盘布局：
//! 超级块(含 inode 位图与数据块位图) | 索引节点表 | 数据块区域
//!
//! 所有整数均以小端序存放。

mod super_block;
pub use super_block::SuperBlock;

mod bitmap;
pub use bitmap::Bitmap;

mod inode;
pub use inode::{DiskInode, INODE_SIZE, InodeKind};

#[inline]
fn get_u32(raw: &[u8], offset: usize) -> u32 {
    let mut word = [0; 4];
    word.copy_from_slice(&raw[offset..offset + 4]);
    u32::from_le_bytes(word)
}

#[inline]
fn put_u32(raw: &mut [u8], offset: usize, value: u32) {
    raw[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
