#[cfg(test)]
mod tests;

use std::fs::{File, OpenOptions};
use std::io;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;

use block_dev::{BlockDevice, DeviceError};
use inode_fs::BLOCK_SIZE;

/// 以宿主机上的镜像文件充当块设备
#[derive(Debug)]
pub struct BlockFile(pub Mutex<File>);

impl BlockFile {
    /// 新建(或截断)镜像并扩展到 `blocks` 块
    pub fn create(path: impl AsRef<Path>, blocks: u32) -> io::Result<Self> {
        let fd = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        fd.set_len(blocks as u64 * BLOCK_SIZE as u64)?;

        Ok(Self(Mutex::new(fd)))
    }

    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let fd = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self(Mutex::new(fd)))
    }

    fn seek(file: &mut File, block_id: usize) -> Result<(), DeviceError> {
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .map_err(|err| {
                log::error!("seeking block {block_id}: {err}");
                DeviceError::Io { block_id }
            })?;
        Ok(())
    }
}

impl BlockDevice for BlockFile {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        if buf.len() != BLOCK_SIZE {
            return Err(DeviceError::ShortTransfer {
                block_id,
                len: buf.len(),
            });
        }

        let mut file = self.0.lock().map_err(|_| DeviceError::Io { block_id })?;
        Self::seek(&mut file, block_id)?;
        file.read_exact(buf).map_err(|err| match err.kind() {
            io::ErrorKind::UnexpectedEof => DeviceError::OutOfRange { block_id },
            _ => {
                log::error!("reading block {block_id}: {err}");
                DeviceError::Io { block_id }
            }
        })
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        if buf.len() != BLOCK_SIZE {
            return Err(DeviceError::ShortTransfer {
                block_id,
                len: buf.len(),
            });
        }

        let mut file = self.0.lock().map_err(|_| DeviceError::Io { block_id })?;
        let len = file.metadata().map_err(|_| DeviceError::Io { block_id })?.len();
        // 镜像大小固定，不允许写到末尾之外
        if ((block_id + 1) * BLOCK_SIZE) as u64 > len {
            return Err(DeviceError::OutOfRange { block_id });
        }

        Self::seek(&mut file, block_id)?;
        file.write_all(buf).map_err(|err| {
            log::error!("writing block {block_id}: {err}");
            DeviceError::Io { block_id }
        })
    }
}
