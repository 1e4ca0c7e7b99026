#![no_std]

extern crate alloc;

/* inode-fs 的整体架构，自上而下 */

// 文件层：文件的创建、读写、删除
mod file;

// 文件系统层：挂载、同步，以及分配器与超级块计数的协同
mod fs;

// 索引节点表：常驻内存，挂载时载入、同步时写回
mod inode_table;

// 磁盘数据结构层：表示磁盘文件系统的数据结构
mod layout;

mod error;
mod geometry;

pub use block_dev::{BlockDevice, DeviceError};

pub use self::{
    error::{Error, Resource, Result},
    file::{InodeId, Stat, StatKind},
    fs::{FileSystem, SharedFileSystem, Usage},
    geometry::Geometry,
    layout::InodeKind,
};

pub const MAGIC: u32 = 0x1e0d_f500;
pub const BLOCK_SIZE: usize = 4096;
/// 每个 inode 的直接索引块个数
pub const DIRECT_COUNT: usize = 10;
/// 单个文件的最大字节数
pub const MAX_FILE_SIZE: usize = DIRECT_COUNT * BLOCK_SIZE;

pub const NUM_BLOCKS: u32 = 1024;
pub const NUM_INODES: u32 = 128;

/// 超级块所在块
const SUPER_BLOCK_ID: usize = 0;
/// 索引节点表的起始块
const INODE_TABLE_START: usize = 1;

type DataBlock = [u8; BLOCK_SIZE];
