#![allow(dead_code)]

use std::sync::Arc;

use block_dev::RamDisk;
use inode_fs::{BLOCK_SIZE, FileSystem, Geometry};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 已格式化并挂载
pub fn formatted(geometry: Geometry) -> (Arc<RamDisk>, FileSystem) {
    init_logger();
    let disk = Arc::new(RamDisk::new(BLOCK_SIZE, geometry.total_blocks as usize));
    let mut fs = FileSystem::new(disk.clone());
    fs.format(geometry).unwrap();
    fs.mount().unwrap();
    (disk, fs)
}

/// 在同一设备上重新挂载一个新实例
pub fn remount(disk: &Arc<RamDisk>) -> FileSystem {
    let mut fs = FileSystem::new(disk.clone());
    fs.mount().unwrap();
    fs
}

pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8 ^ seed).collect()
}
