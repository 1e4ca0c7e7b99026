//! 内存盘：以一段内存充当块设备

use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;

use spin::Mutex;

use crate::{BlockDevice, DeviceError};

#[derive(Debug)]
pub struct RamDisk {
    block_size: usize,
    data: Mutex<Vec<u8>>,
}

impl RamDisk {
    /// 创建 `blocks` 个全零块
    pub fn new(block_size: usize, blocks: usize) -> Self {
        Self {
            block_size,
            data: Mutex::new(vec![0; block_size * blocks]),
        }
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    #[inline]
    pub fn blocks(&self) -> usize {
        self.data.lock().len() / self.block_size
    }

    /// 整个设备内容的拷贝
    pub fn snapshot(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    fn range(&self, block_id: usize, len: usize) -> Result<Range<usize>, DeviceError> {
        if len != self.block_size {
            return Err(DeviceError::ShortTransfer { block_id, len });
        }
        if block_id >= self.blocks() {
            return Err(DeviceError::OutOfRange { block_id });
        }

        let start = block_id * self.block_size;
        Ok(start..start + self.block_size)
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        let range = self.range(block_id, buf.len())?;
        log::trace!("ramdisk: read block {block_id}");
        buf.copy_from_slice(&self.data.lock()[range]);
        Ok(())
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        let range = self.range(block_id, buf.len())?;
        log::trace!("ramdisk: write block {block_id}");
        self.data.lock()[range].copy_from_slice(buf);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_back() {
        let disk = RamDisk::new(64, 4);
        assert_eq!(64, disk.block_size());
        assert_eq!(4, disk.blocks());
        let block = [0xa5; 64];
        disk.write_block(3, &block).unwrap();

        let mut buf = [0; 64];
        disk.read_block(3, &mut buf).unwrap();
        assert_eq!(block, buf);

        disk.read_block(2, &mut buf).unwrap();
        assert_eq!([0; 64], buf);
    }

    #[test]
    fn rejects_bad_access() {
        let disk = RamDisk::new(64, 4);
        let mut buf = [0; 64];
        assert_eq!(
            Err(DeviceError::OutOfRange { block_id: 4 }),
            disk.read_block(4, &mut buf)
        );

        let mut short = [0; 32];
        assert_eq!(
            Err(DeviceError::ShortTransfer { block_id: 0, len: 32 }),
            disk.read_block(0, &mut short)
        );
        assert_eq!(
            Err(DeviceError::ShortTransfer { block_id: 1, len: 32 }),
            disk.write_block(1, &short)
        );
    }
}
