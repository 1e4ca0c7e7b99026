mod cli;

use std::error::Error;
use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Command};
use inode_fs::{FileSystem, Geometry, InodeId, InodeKind, Stat, StatKind};
use inode_fs_tool::BlockFile;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Format { blocks, inodes } => {
            let geometry = Geometry {
                total_blocks: blocks,
                total_inodes: inodes,
            };
            // 先校验，避免留下一个截断了的镜像
            geometry.validate()?;
            let block_file = BlockFile::create(&cli.image, blocks)?;
            FileSystem::new(Arc::new(block_file)).format(geometry)?;
            println!("{}: {blocks} blocks, {inodes} inodes", cli.image.display());
        }
        Command::Put { source, dir } => {
            let data = fs::read(&source)?;
            let kind = if dir {
                InodeKind::Directory
            } else {
                InodeKind::File
            };

            let mut efs = mount(&cli.image)?;
            let inode = efs.create(kind)?;
            // 写入失败时不同步，镜像保持原样
            efs.write(inode, &data)?;
            efs.sync()?;
            println!("{inode}");
        }
        Command::Cat { inode, offset } => {
            let efs = mount(&cli.image)?;
            let inode = InodeId::new(inode);
            let size = efs.stat(inode)?.size as usize;
            let mut buf = vec![0; size.saturating_sub(offset)];
            let n = efs.read(inode, &mut buf, offset)?;
            io::stdout().write_all(&buf[..n])?;
        }
        Command::Stat { inode } => {
            let efs = mount(&cli.image)?;
            print_stat(&efs.stat(InodeId::new(inode))?);
        }
        Command::Ls { files, dirs } => {
            let efs = mount(&cli.image)?;
            let stats = match (files, dirs) {
                (true, _) => efs.list(StatKind::FILE)?,
                (_, true) => efs.list(StatKind::DIR)?,
                _ => efs.list(StatKind::FILE | StatKind::DIR)?,
            };
            stats.iter().for_each(print_stat);
        }
        Command::Rm { inode } => {
            let mut efs = mount(&cli.image)?;
            efs.delete(InodeId::new(inode))?;
            efs.sync()?;
        }
        Command::Check => {
            let usage = mount(&cli.image)?.check()?;
            println!(
                "ok: {}/{} blocks free, {}/{} inodes free, data starts at block {}",
                usage.free_blocks,
                usage.total_blocks,
                usage.free_inodes,
                usage.total_inodes,
                usage.data_start
            );
        }
    }

    Ok(())
}

fn mount(image: &Path) -> Result<FileSystem, Box<dyn Error>> {
    let mut efs = FileSystem::new(Arc::new(BlockFile::open(image)?));
    efs.mount()?;
    Ok(efs)
}

fn print_stat(stat: &Stat) {
    println!(
        "{:>5} {:06o} {:>8} bytes {:>2} blocks",
        stat.inode, stat.kind as u32, stat.size, stat.blocks
    );
}
