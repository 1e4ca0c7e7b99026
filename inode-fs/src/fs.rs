//! # 文件系统层
//!
//! [`FileSystem`] 持有块设备与挂载后的全部内存状态：
//! 超级块、两张位图、索引节点表。
//! 所有操作都经由同一个 [`FileSystem`] 进行，内部不加锁；
//! 多线程环境下用 [`FileSystem::into_shared`] 以一把锁保护整体。

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec;

use block_dev::BlockDevice;
use spin::Mutex;

use crate::inode_table::InodeTable;
use crate::layout::{Bitmap, DiskInode, SuperBlock};
use crate::{BLOCK_SIZE, DataBlock, MAX_FILE_SIZE, SUPER_BLOCK_ID};
use crate::{Error, Geometry, InodeId, Resource, Result};

pub type SharedFileSystem = Arc<Mutex<FileSystem>>;

pub struct FileSystem {
    block_device: Arc<dyn BlockDevice>,
    /// 未挂载时为空
    mounted: Option<Mounted>,
}

/// 空间使用情况
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub total_blocks: u32,
    pub free_blocks: u32,
    pub total_inodes: u32,
    pub free_inodes: u32,
    /// 第一个数据块
    pub data_start: u32,
}

/// 挂载后常驻内存的状态
pub(crate) struct Mounted {
    /// 超级块所在块的原始内容，同步时就地更新后整块写回
    raw: Box<[u8]>,
    pub super_block: SuperBlock,
    pub inode_bitmap: Bitmap,
    pub block_bitmap: Bitmap,
    pub inodes: InodeTable,
}

impl FileSystem {
    pub fn new(block_device: Arc<dyn BlockDevice>) -> Self {
        Self {
            block_device,
            mounted: None,
        }
    }

    /// 在设备上建立空文件系统：元数据块标记为占用，索引节点表清零。
    ///
    /// 完成后处于未挂载状态。
    pub fn format(&mut self, geometry: Geometry) -> Result<()> {
        geometry.validate()?;

        // 设备必须容得下最后一块
        let mut probe: DataBlock = [0; BLOCK_SIZE];
        self.block_device
            .read_block(geometry.total_blocks as usize - 1, &mut probe)?;

        let data_start = geometry.data_start();
        let mut block_bitmap = Bitmap::new(geometry.total_blocks);
        (0..data_start).for_each(|block_id| block_bitmap.mark(block_id));

        let mut fresh = Mounted {
            raw: vec![0; BLOCK_SIZE].into_boxed_slice(),
            super_block: SuperBlock::new(&geometry, geometry.total_blocks - data_start),
            inode_bitmap: Bitmap::new(geometry.total_inodes),
            block_bitmap,
            inodes: InodeTable::zeroed(geometry.total_inodes),
        };
        fresh.flush(&*self.block_device)?;
        self.mounted = None;

        log::info!(
            "formatted: {} blocks, {} inodes, data starts at block {data_start}",
            geometry.total_blocks,
            geometry.total_inodes
        );
        Ok(())
    }

    /// 载入超级块、位图与索引节点表，并校验它们相互一致。
    ///
    /// 已挂载时重新载入，内存中未同步的改动全部丢弃。
    /// 载入或校验失败时保持未挂载。
    pub fn mount(&mut self) -> Result<()> {
        if self.mounted.take().is_some() {
            log::warn!("already mounted, reloading and discarding unsynced changes");
        }

        let mounted = Mounted::load(&*self.block_device)?;
        mounted.verify()?;

        let usage = mounted.usage();
        log::debug!(
            "mounted: {}/{} blocks free, {}/{} inodes free",
            usage.free_blocks,
            usage.total_blocks,
            usage.free_inodes,
            usage.total_inodes
        );
        self.mounted = Some(mounted);
        Ok(())
    }

    /// 将超级块、位图与索引节点表写回设备
    pub fn sync(&mut self) -> Result<()> {
        let (block_device, mounted) = self.parts_mut()?;
        mounted.flush(&**block_device)?;
        log::debug!("synced");
        Ok(())
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn usage(&self) -> Result<Usage> {
        Ok(self.mounted()?.usage())
    }

    /// 对内存中的状态做一次完整的一致性校验
    pub fn check(&self) -> Result<Usage> {
        let mounted = self.mounted()?;
        mounted.verify()?;
        Ok(mounted.usage())
    }

    #[inline]
    pub fn block_device(&self) -> &Arc<dyn BlockDevice> {
        &self.block_device
    }

    /// 交由一把锁统一保护，供多个执行流共享
    pub fn into_shared(self) -> SharedFileSystem {
        Arc::new(Mutex::new(self))
    }

    pub(crate) fn mounted(&self) -> Result<&Mounted> {
        self.mounted.as_ref().ok_or(Error::NotMounted)
    }

    pub(crate) fn parts_mut(&mut self) -> Result<(&Arc<dyn BlockDevice>, &mut Mounted)> {
        let mounted = self.mounted.as_mut().ok_or(Error::NotMounted)?;
        Ok((&self.block_device, mounted))
    }
}

impl Mounted {
    fn load(block_device: &dyn BlockDevice) -> Result<Self> {
        let mut raw = vec![0; BLOCK_SIZE].into_boxed_slice();
        block_device.read_block(SUPER_BLOCK_ID, &mut raw)?;

        let super_block = SuperBlock::decode(&raw);
        if !super_block.is_valid() {
            return Err(Error::Corrupted("invalid superblock"));
        }
        let geometry = super_block.geometry();
        if geometry.validate().is_err() {
            return Err(Error::Corrupted("superblock geometry is invalid"));
        }

        let (inode_range, block_range) = geometry.bitmap_ranges();
        let inode_bitmap = Bitmap::decode(geometry.total_inodes, &raw[inode_range]);
        let block_bitmap = Bitmap::decode(geometry.total_blocks, &raw[block_range]);
        let inodes = InodeTable::load(block_device, geometry.total_inodes)?;

        Ok(Self {
            raw,
            super_block,
            inode_bitmap,
            block_bitmap,
            inodes,
        })
    }

    fn flush(&mut self, block_device: &dyn BlockDevice) -> Result<()> {
        let (inode_range, block_range) = self.super_block.geometry().bitmap_ranges();
        self.super_block.encode(&mut self.raw[..SuperBlock::SIZE]);
        self.inode_bitmap.encode(&mut self.raw[inode_range]);
        self.block_bitmap.encode(&mut self.raw[block_range]);

        block_device.write_block(SUPER_BLOCK_ID, &self.raw)?;
        self.inodes.flush(block_device)
    }

    fn usage(&self) -> Usage {
        let super_block = &self.super_block;
        Usage {
            total_blocks: super_block.total_blocks,
            free_blocks: super_block.free_blocks,
            total_inodes: super_block.total_inodes,
            free_inodes: super_block.free_inodes,
            data_start: super_block.geometry().data_start(),
        }
    }

    /// 位图与空闲计数一致，元数据块均已占用，
    /// 每个已分配 inode 引用的块都在数据区内、已占用且不与其它 inode 共用。
    fn verify(&self) -> Result<()> {
        let super_block = &self.super_block;
        if self.inode_bitmap.used() != super_block.total_inodes - super_block.free_inodes {
            return Err(Error::Corrupted(
                "inode bitmap disagrees with the free inode count",
            ));
        }
        if self.block_bitmap.used() != super_block.total_blocks - super_block.free_blocks {
            return Err(Error::Corrupted(
                "block bitmap disagrees with the free block count",
            ));
        }

        let data_start = super_block.geometry().data_start();
        if (0..data_start).any(|block_id| !self.block_bitmap.is_used(block_id)) {
            return Err(Error::Corrupted("metadata block marked free"));
        }

        let mut referenced = Bitmap::new(super_block.total_blocks);
        for id in self.inode_bitmap.iter_used() {
            let inode = self.inodes.get(id)?;
            if inode.size as usize > MAX_FILE_SIZE {
                return Err(Error::Corrupted("inode size exceeds direct block capacity"));
            }
            for &block_id in inode.blocks() {
                if block_id < data_start || block_id >= super_block.total_blocks {
                    return Err(Error::Corrupted("inode references a block outside the data area"));
                }
                if !self.block_bitmap.is_used(block_id) {
                    return Err(Error::Corrupted("inode references a free block"));
                }
                if referenced.is_used(block_id) {
                    return Err(Error::Corrupted("block shared by two inodes"));
                }
                referenced.mark(block_id);
            }
        }

        let leaked = self.block_bitmap.used() - data_start - referenced.used();
        if leaked > 0 {
            log::warn!("{leaked} blocks are allocated but referenced by no inode");
        }

        Ok(())
    }

    /// 已分配的 inode，否则为无效句柄
    pub fn inode(&self, id: InodeId) -> Result<DiskInode> {
        let raw_id = u32::from(id);
        if raw_id >= self.inodes.count() || !self.inode_bitmap.is_used(raw_id) {
            return Err(Error::InvalidHandle(id));
        }
        self.inodes.get(raw_id)
    }

    /* 位图与超级块的空闲计数总是一起改动 */

    pub fn alloc_inode(&mut self) -> Result<u32> {
        let id = self
            .inode_bitmap
            .alloc()
            .ok_or(Error::ResourceExhausted(Resource::Inode))?;
        self.super_block.free_inodes -= 1;
        log::trace!("alloc inode {id}");
        Ok(id)
    }

    pub fn dealloc_inode(&mut self, id: u32) {
        if self.inode_bitmap.dealloc(id) {
            self.super_block.free_inodes += 1;
            log::trace!("dealloc inode {id}");
        }
    }

    pub fn alloc_block(&mut self) -> Result<u32> {
        let block_id = self
            .block_bitmap
            .alloc()
            .ok_or(Error::ResourceExhausted(Resource::Block))?;
        self.super_block.free_blocks -= 1;
        log::trace!("alloc block {block_id}");
        Ok(block_id)
    }

    pub fn dealloc_blocks(&mut self, blocks: &[u32]) {
        for &block_id in blocks {
            if self.block_bitmap.dealloc(block_id) {
                self.super_block.free_blocks += 1;
                log::trace!("dealloc block {block_id}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use block_dev::RamDisk;

    use super::*;

    fn formatted(geometry: Geometry) -> FileSystem {
        let disk = Arc::new(RamDisk::new(BLOCK_SIZE, geometry.total_blocks as usize));
        let mut fs = FileSystem::new(disk);
        fs.format(geometry).unwrap();
        fs.mount().unwrap();
        fs
    }

    #[test]
    fn counters_follow_bitmaps() {
        let mut fs = formatted(Geometry {
            total_blocks: 8,
            total_inodes: 4,
        });
        let (_, mounted) = fs.parts_mut().unwrap();
        // 0 号超级块、1 号索引节点表
        assert_eq!(Ok(2), mounted.alloc_block());
        assert_eq!(Ok(3), mounted.alloc_block());
        assert_eq!(4, mounted.super_block.free_blocks);

        mounted.dealloc_blocks(&[2, 2]);
        assert_eq!(5, mounted.super_block.free_blocks);
        assert_eq!(Ok(2), mounted.alloc_block());

        for expected in 0..4 {
            assert_eq!(Ok(expected), mounted.alloc_inode());
        }
        assert_eq!(
            Err(Error::ResourceExhausted(Resource::Inode)),
            mounted.alloc_inode()
        );
        assert_eq!(0, mounted.super_block.free_inodes);
        mounted.verify().unwrap();
    }

    #[test]
    fn unreferenced_blocks_are_tolerated() {
        let mut fs = formatted(Geometry {
            total_blocks: 8,
            total_inodes: 4,
        });
        let (_, mounted) = fs.parts_mut().unwrap();
        mounted.alloc_block().unwrap();
        mounted.verify().unwrap();
    }
}
