//! # 索引节点表
//!
//! 挂载时整张表从磁盘载入内存，同步时整张写回。
//! 表以原始字节保存，按块对齐：访问某条记录时才解码，
//! 因此未改动的记录(以及最后一块末尾的多余字节)写回时与载入时逐字节相同。

use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;

use block_dev::BlockDevice;

use crate::layout::{DiskInode, INODE_SIZE};
use crate::{BLOCK_SIZE, INODE_TABLE_START};
use crate::{Error, InodeId, Result};

#[derive(Debug, Clone)]
pub struct InodeTable {
    data: Vec<u8>,
    count: u32,
}

impl InodeTable {
    /// 容纳 `count` 条记录需要的块数，最后一块可以不满
    #[inline]
    pub fn blocks_for(count: u32) -> usize {
        (count as usize * INODE_SIZE).div_ceil(BLOCK_SIZE)
    }

    pub fn zeroed(count: u32) -> Self {
        Self {
            data: vec![0; Self::blocks_for(count) * BLOCK_SIZE],
            count,
        }
    }

    pub fn load(block_device: &dyn BlockDevice, count: u32) -> Result<Self> {
        let mut table = Self::zeroed(count);
        for (i, block) in table.data.chunks_mut(BLOCK_SIZE).enumerate() {
            block_device.read_block(INODE_TABLE_START + i, block)?;
        }
        log::debug!(
            "inode table: loaded {count} inodes from {} blocks",
            Self::blocks_for(count)
        );
        Ok(table)
    }

    pub fn flush(&self, block_device: &dyn BlockDevice) -> Result<()> {
        for (i, block) in self.data.chunks(BLOCK_SIZE).enumerate() {
            block_device.write_block(INODE_TABLE_START + i, block)?;
        }
        Ok(())
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn get(&self, id: u32) -> Result<DiskInode> {
        DiskInode::decode(&self.data[self.record(id)?])
    }

    /// 解码记录交给 `f` 修改，再编码写回表中
    pub fn map_mut<V>(&mut self, id: u32, f: impl FnOnce(&mut DiskInode) -> V) -> Result<V> {
        let range = self.record(id)?;
        let mut inode = DiskInode::decode(&self.data[range.clone()])?;
        let ret = f(&mut inode);
        inode.encode(&mut self.data[range]);
        Ok(ret)
    }

    /// 不看原有内容，直接覆盖整条记录
    pub fn put(&mut self, id: u32, inode: &DiskInode) -> Result<()> {
        let range = self.record(id)?;
        inode.encode(&mut self.data[range]);
        Ok(())
    }

    fn record(&self, id: u32) -> Result<Range<usize>> {
        if id >= self.count {
            return Err(Error::InvalidHandle(InodeId::from(id)));
        }
        let start = id as usize * INODE_SIZE;
        Ok(start..start + INODE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use block_dev::RamDisk;

    use super::*;
    use crate::layout::InodeKind;

    #[test]
    fn partial_last_block() {
        // 100 * 48 = 4800 字节，第二块只用了 704 字节
        assert_eq!(2, InodeTable::blocks_for(100));
        assert_eq!(1, InodeTable::blocks_for(85));
        assert_eq!(0, InodeTable::blocks_for(0));
    }

    #[test]
    fn load_flush() {
        let disk = RamDisk::new(BLOCK_SIZE, 4);
        let mut table = InodeTable::zeroed(100);
        table
            .map_mut(99, |inode| {
                inode.init(InodeKind::Directory);
                inode.size = 12;
                inode.direct[0] = 3;
            })
            .unwrap();
        table.flush(&disk).unwrap();

        let loaded = InodeTable::load(&disk, 100).unwrap();
        assert_eq!(table.data, loaded.data);
        assert_eq!(table.get(99).unwrap(), loaded.get(99).unwrap());
        assert_eq!(DiskInode::default(), loaded.get(0).unwrap());
    }

    #[test]
    fn put_ignores_stale_record() {
        let mut table = InodeTable::zeroed(4);
        table.data[INODE_SIZE + 44] = 7;
        assert!(table.get(1).is_err());

        let mut inode = DiskInode::default();
        inode.init(InodeKind::Directory);
        table.put(1, &inode).unwrap();
        assert_eq!(inode, table.get(1).unwrap());
    }

    #[test]
    fn out_of_range() {
        let table = InodeTable::zeroed(4);
        assert_eq!(
            Err(Error::InvalidHandle(InodeId::from(4))),
            table.get(4)
        );
    }
}
