use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use block_dev::{BlockDevice, DeviceError};
use inode_fs::{BLOCK_SIZE, FileSystem, Geometry, InodeKind};

use crate::BlockFile;

fn image(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("inode-fs-tool-{}-{name}.img", std::process::id()))
}

#[test]
fn block_file_bounds() {
    let path = image("bounds");
    {
        let file = BlockFile::create(&path, 4).unwrap();
        let block = [0x5a; BLOCK_SIZE];
        file.write_block(3, &block).unwrap();

        let mut buf = [0; BLOCK_SIZE];
        file.read_block(3, &mut buf).unwrap();
        assert_eq!(block, buf);

        assert_eq!(
            Err(DeviceError::OutOfRange { block_id: 4 }),
            file.read_block(4, &mut buf)
        );
        assert_eq!(
            Err(DeviceError::OutOfRange { block_id: 4 }),
            file.write_block(4, &block)
        );
        assert_eq!(
            Err(DeviceError::ShortTransfer { block_id: 0, len: 10 }),
            file.write_block(0, &block[..10])
        );
    }
    fs::remove_file(&path).unwrap();
}

#[test]
fn image_survives_reopen() {
    let _ = env_logger::builder().is_test(true).try_init();
    let path = image("reopen");
    let geometry = Geometry {
        total_blocks: 32,
        total_inodes: 16,
    };
    {
        let device = Arc::new(BlockFile::create(&path, geometry.total_blocks).unwrap());
        let mut efs = FileSystem::new(device);
        efs.format(geometry).unwrap();
        efs.mount().unwrap();
        let inode = efs.create(InodeKind::File).unwrap();
        efs.write(inode, b"Hello, kernel world!").unwrap();
        efs.sync().unwrap();
    }
    {
        let device = Arc::new(BlockFile::open(&path).unwrap());
        let mut efs = FileSystem::new(device);
        efs.mount().unwrap();
        let inode = efs.inodes().unwrap().next().unwrap();

        let mut buf = [0; 64];
        let n = efs.read(inode, &mut buf, 0).unwrap();
        assert_eq!(b"Hello, kernel world!", &buf[..n]);
    }
    fs::remove_file(&path).unwrap();
}
