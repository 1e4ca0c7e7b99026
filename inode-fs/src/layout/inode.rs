//! 磁盘上的 inode
//!
//! 只有直接索引：第 `i` 个数据块的编号存放于 `direct[i]`，
//! 单个文件最多 [`DIRECT_COUNT`] 块。
//! 未使用的索引为 0，而 0 号块是超级块，不会被分给文件。

use block_dev::{BlockDevice, DeviceError};

use super::{get_u32, put_u32};
use crate::{BLOCK_SIZE, DIRECT_COUNT, DataBlock};
use crate::{Error, Result};

/// 磁盘上每条 inode 记录的字节数：
/// size(4) | direct(4 * DIRECT_COUNT) | kind(1) | 填充(3)
pub const INODE_SIZE: usize = 48;

const KIND_OFFSET: usize = 4 + 4 * DIRECT_COUNT;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiskInode {
    /// 文件字节数
    pub size: u32,
    /// 直接索引块
    pub direct: [u32; DIRECT_COUNT],
    pub kind: InodeKind,
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum InodeKind {
    #[default]
    File = 0,
    Directory = 1,
}

impl TryFrom<u8> for InodeKind {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(Self::File),
            1 => Ok(Self::Directory),
            _ => Err(Error::Corrupted("unknown inode kind")),
        }
    }
}

impl DiskInode {
    #[inline]
    pub fn init(&mut self, kind: InodeKind) {
        *self = Self {
            kind,
            ..Default::default()
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == InodeKind::Directory
    }

    /// 文件当前占用的数据块
    #[inline]
    pub fn blocks(&self) -> &[u32] {
        &self.direct[..Self::count_data_block(self.size as usize).min(DIRECT_COUNT)]
    }

    /// 计算容纳指定数据量需要多少个数据块
    #[inline]
    pub fn count_data_block(size: usize) -> usize {
        size.div_ceil(BLOCK_SIZE)
    }

    pub fn decode(raw: &[u8]) -> Result<Self> {
        let mut direct = [0; DIRECT_COUNT];
        for (slot, offset) in direct.iter_mut().zip((4..KIND_OFFSET).step_by(4)) {
            *slot = get_u32(raw, offset);
        }

        Ok(Self {
            size: get_u32(raw, 0),
            direct,
            kind: InodeKind::try_from(raw[KIND_OFFSET])?,
        })
    }

    pub fn encode(&self, raw: &mut [u8]) {
        put_u32(raw, 0, self.size);
        for (&block_id, offset) in self.direct.iter().zip((4..KIND_OFFSET).step_by(4)) {
            put_u32(raw, offset, block_id);
        }
        raw[KIND_OFFSET] = self.kind as u8;
        raw[KIND_OFFSET + 1..INODE_SIZE].fill(0);
    }

    /// 从指定位置(字节偏移)读出数据填充`buf`，返回读出的字节数。
    ///
    /// 读取范围被截断在文件末尾；`buf` 超出部分保持原样。
    pub fn read_at(
        &self,
        offset: usize,
        buf: &mut [u8],
        block_device: &dyn BlockDevice,
    ) -> core::result::Result<usize, DeviceError> {
        let mut start = offset;
        let end = offset.saturating_add(buf.len()).min(self.size as usize);

        if start >= end {
            return Ok(0);
        }

        let mut data_block: DataBlock = [0; BLOCK_SIZE];
        // 已读取多少字节
        let mut read_size = 0;
        loop {
            // 当前块在 direct 中的下标
            let block_index = start / BLOCK_SIZE;
            // 当前块的末地址(字节)
            let current_block_end = ((block_index + 1) * BLOCK_SIZE).min(end);
            let block_read_size = current_block_end - start;

            block_device.read_block(self.direct[block_index] as usize, &mut data_block)?;
            // 绝对地址 % 块大小 = 块内偏移
            let src = &data_block[start % BLOCK_SIZE..start % BLOCK_SIZE + block_read_size];
            buf[read_size..read_size + block_read_size].copy_from_slice(src);

            read_size += block_read_size;

            if current_block_end == end {
                break;
            }

            start = current_block_end;
        }

        Ok(read_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_layout() {
        let mut inode = DiskInode::default();
        inode.init(InodeKind::Directory);
        inode.size = 4097;
        inode.direct[0] = 3;
        inode.direct[1] = 7;

        let mut raw = [0xee; INODE_SIZE];
        inode.encode(&mut raw);
        assert_eq!(4097u32.to_le_bytes(), raw[0..4]);
        assert_eq!(3u32.to_le_bytes(), raw[4..8]);
        assert_eq!(7u32.to_le_bytes(), raw[8..12]);
        assert_eq!(1, raw[KIND_OFFSET]);
        assert_eq!([0u8; 3], raw[KIND_OFFSET + 1..]);

        let decoded = DiskInode::decode(&raw).unwrap();
        assert_eq!(inode, decoded);
        assert!(decoded.is_dir());
        assert_eq!(&[3u32, 7], decoded.blocks());
    }

    #[test]
    fn rejects_unknown_kind() {
        let mut raw = [0; INODE_SIZE];
        raw[KIND_OFFSET] = 2;
        assert_eq!(
            Err(Error::Corrupted("unknown inode kind")),
            DiskInode::decode(&raw)
        );
    }

    #[test]
    fn block_count() {
        assert_eq!(0, DiskInode::count_data_block(0));
        assert_eq!(1, DiskInode::count_data_block(1));
        assert_eq!(1, DiskInode::count_data_block(BLOCK_SIZE));
        assert_eq!(2, DiskInode::count_data_block(BLOCK_SIZE + 1));
    }
}
