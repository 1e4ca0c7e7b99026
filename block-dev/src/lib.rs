//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘、光盘、U盘等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 块的大小由调用方决定：传入缓冲区的长度即为块大小。

#![no_std]

extern crate alloc;

mod ram_disk;

use core::any::Any;

use derive_more::Display;

pub use self::ram_disk::RamDisk;

/// 块设备驱动特质
///
/// 单块读写是原子的，多块之间没有事务保证。
pub trait BlockDevice: Send + Sync + Any {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError>;
    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError>;
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    #[display(fmt = "block {} is out of the device", block_id)]
    OutOfRange { block_id: usize },
    #[display(fmt = "block {} got {} bytes, not a complete block", block_id, len)]
    ShortTransfer { block_id: usize, len: usize },
    #[display(fmt = "I/O error on block {}", block_id)]
    Io { block_id: usize },
}

impl core::error::Error for DeviceError {}
