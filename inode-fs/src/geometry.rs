//! 格式化参数
//!
//! 只在格式化时使用；挂载时的几何参数一律来自磁盘上的超级块。

use core::ops::Range;

use crate::inode_table::InodeTable;
use crate::layout::{Bitmap, SuperBlock};
use crate::{Error, Result};
use crate::{BLOCK_SIZE, INODE_TABLE_START, NUM_BLOCKS, NUM_INODES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// 设备总块数，包括超级块与索引节点表
    pub total_blocks: u32,
    pub total_inodes: u32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            total_blocks: NUM_BLOCKS,
            total_inodes: NUM_INODES,
        }
    }
}

impl Geometry {
    #[inline]
    pub fn inode_table_blocks(&self) -> u32 {
        InodeTable::blocks_for(self.total_inodes) as u32
    }

    /// 第一个数据块，之前的块均为元数据
    #[inline]
    pub fn data_start(&self) -> u32 {
        INODE_TABLE_START as u32 + self.inode_table_blocks()
    }

    /// 超级块所在块内，inode 位图与数据块位图各自的字节范围
    pub(crate) fn bitmap_ranges(&self) -> (Range<usize>, Range<usize>) {
        let inode_end = SuperBlock::SIZE + Bitmap::bytes_for(self.total_inodes);
        let block_end = inode_end + Bitmap::bytes_for(self.total_blocks);
        (SuperBlock::SIZE..inode_end, inode_end..block_end)
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_inodes == 0 {
            return Err(Error::InvalidGeometry("at least one inode is required"));
        }
        if self.bitmap_ranges().1.end > BLOCK_SIZE {
            return Err(Error::InvalidGeometry(
                "bitmaps do not fit into the superblock block",
            ));
        }
        // 溢出时同样视为放不下
        let data_start = (INODE_TABLE_START as u64)
            + (self.total_inodes as u64 * crate::layout::INODE_SIZE as u64)
                .div_ceil(BLOCK_SIZE as u64);
        if data_start >= self.total_blocks as u64 {
            return Err(Error::InvalidGeometry("no room left for data blocks"));
        }

        Ok(())
    }
}
