//! # 文件层
//!
//! 以 inode 编号([`InodeId`])为句柄，对单个文件进行创建、读写与删除。
//! 写入总是整体覆盖：新数据写入新分配的块，成功后才释放旧块。

use alloc::vec::Vec;

use block_dev::BlockDevice;
use derive_more::{Display, From, Into};
use enumflags2::{BitFlags, bitflags};

use crate::layout::{DiskInode, InodeKind};
use crate::{BLOCK_SIZE, DIRECT_COUNT, DataBlock, MAX_FILE_SIZE};
use crate::{Error, FileSystem, Resource, Result};

/// inode 编号，即文件句柄
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
#[repr(transparent)]
pub struct InodeId(u32);

impl InodeId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub inode: InodeId,
    pub kind: StatKind,
    /// 文件字节数
    pub size: u32,
    /// 占用的数据块数
    pub blocks: u32,
}

#[allow(clippy::upper_case_acronyms)]
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatKind {
    DIR = 0o040000,
    #[default]
    FILE = 0o100000,
}

impl FileSystem {
    /// 分配一个 inode，大小清零。
    ///
    /// 空闲槽位上残留的旧记录直接被覆盖，不做解码。
    pub fn create(&mut self, kind: InodeKind) -> Result<InodeId> {
        let (_, fs) = self.parts_mut()?;
        let mut disk_inode = DiskInode::default();
        disk_inode.init(kind);

        let id = fs.alloc_inode()?;
        if let Err(err) = fs.inodes.put(id, &disk_inode) {
            fs.dealloc_inode(id);
            return Err(err);
        }

        log::debug!("create {kind:?} inode {id}");
        Ok(InodeId(id))
    }

    /// 用 `data` 覆盖文件的全部内容。
    ///
    /// 超出直接索引容量或空闲块不足时，不分配任何块直接报错；
    /// 写设备失败时释放本次分配的块，文件保持原样。
    ///
    /// 新块先分配、旧块后释放，空闲块数须覆盖全部新块：
    /// 磁盘已满时，即便是缩小文件的覆盖写也会返回 `ResourceExhausted`。
    pub fn write(&mut self, inode: InodeId, data: &[u8]) -> Result<()> {
        let (block_device, fs) = self.parts_mut()?;
        let old = fs.inode(inode)?;

        let blocks_needed = DiskInode::count_data_block(data.len());
        if blocks_needed > DIRECT_COUNT {
            log::warn!("write {} bytes to inode {inode}: too large", data.len());
            return Err(Error::CapacityExceeded {
                requested: data.len(),
                capacity: MAX_FILE_SIZE,
            });
        }
        if blocks_needed > fs.super_block.free_blocks as usize {
            log::warn!("write {} bytes to inode {inode}: out of blocks", data.len());
            return Err(Error::ResourceExhausted(Resource::Block));
        }

        let mut direct = [0; DIRECT_COUNT];
        let mut allocated = 0;
        let result = data.chunks(BLOCK_SIZE).try_for_each(|chunk| {
            let block_id = fs.alloc_block()?;
            direct[allocated] = block_id;
            allocated += 1;
            write_data_block(&**block_device, block_id, chunk)
        });
        if let Err(err) = result {
            fs.dealloc_blocks(&direct[..allocated]);
            return Err(err);
        }

        fs.inodes.map_mut(inode.into(), |disk_inode| {
            disk_inode.size = data.len() as u32;
            disk_inode.direct = direct;
        })?;
        fs.dealloc_blocks(old.blocks());

        log::debug!(
            "write {} bytes to inode {inode} in {blocks_needed} blocks",
            data.len()
        );
        Ok(())
    }

    /// 从字节偏移 `offset` 处读出文件内容填充 `buf`，返回读出的字节数。
    ///
    /// 读出的字节数为 `min(buf.len(), size - offset)`，偏移越过文件末尾时为 0；
    /// `buf` 中超出部分保持原样。
    pub fn read(&self, inode: InodeId, buf: &mut [u8], offset: usize) -> Result<usize> {
        let disk_inode = self.mounted()?.inode(inode)?;
        let read_size = disk_inode.read_at(offset, buf, &**self.block_device())?;

        log::trace!("read {read_size} bytes from inode {inode} at {offset}");
        Ok(read_size)
    }

    /// 释放文件的全部数据块与 inode 本身
    pub fn delete(&mut self, inode: InodeId) -> Result<()> {
        let (_, fs) = self.parts_mut()?;
        let disk_inode = fs.inode(inode)?;

        fs.dealloc_blocks(disk_inode.blocks());
        fs.inodes.put(inode.into(), &DiskInode::default())?;
        fs.dealloc_inode(inode.into());

        log::debug!("delete inode {inode}");
        Ok(())
    }

    pub fn stat(&self, inode: InodeId) -> Result<Stat> {
        let disk_inode = self.mounted()?.inode(inode)?;
        Ok(Stat {
            inode,
            kind: if disk_inode.is_dir() {
                StatKind::DIR
            } else {
                StatKind::FILE
            },
            size: disk_inode.size,
            blocks: disk_inode.blocks().len() as u32,
        })
    }

    /// 已分配的 inode，编号升序
    pub fn inodes(&self) -> Result<impl Iterator<Item = InodeId> + '_> {
        Ok(self.mounted()?.inode_bitmap.iter_used().map(InodeId))
    }

    /// 列出类型属于 `kinds` 的全部文件
    pub fn list(&self, kinds: impl Into<BitFlags<StatKind>>) -> Result<Vec<Stat>> {
        let kinds = kinds.into();
        let mut stats = Vec::new();
        for inode in self.inodes()? {
            let stat = self.stat(inode)?;
            if kinds.contains(stat.kind) {
                stats.push(stat);
            }
        }
        Ok(stats)
    }
}

/// 末块不满一块时以 0 填充
fn write_data_block(block_device: &dyn BlockDevice, block_id: u32, chunk: &[u8]) -> Result<()> {
    let mut data_block: DataBlock = [0; BLOCK_SIZE];
    data_block[..chunk.len()].copy_from_slice(chunk);
    block_device.write_block(block_id as usize, &data_block)?;
    Ok(())
}
