use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Inspect and populate inode-fs images")]
pub struct Cli {
    /// Image file
    pub image: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the image and write an empty filesystem into it
    Format {
        /// Total blocks, including superblock and inode table
        #[arg(long, short, default_value_t = inode_fs::NUM_BLOCKS)]
        blocks: u32,

        /// Number of inodes
        #[arg(long, short, default_value_t = inode_fs::NUM_INODES)]
        inodes: u32,
    },

    /// Store a host file as a new inode and print its number
    Put {
        source: PathBuf,

        /// Mark the inode as a directory
        #[arg(long)]
        dir: bool,
    },

    /// Write the content of an inode to stdout
    Cat {
        inode: u32,

        /// Byte offset to start reading at
        #[arg(long, short, default_value_t = 0)]
        offset: usize,
    },

    /// Show the metadata of an inode
    Stat { inode: u32 },

    /// List allocated inodes
    Ls {
        /// Only regular files
        #[arg(long, conflicts_with = "dirs")]
        files: bool,

        /// Only directories
        #[arg(long)]
        dirs: bool,
    },

    /// Delete an inode and release its blocks
    Rm { inode: u32 },

    /// Verify the consistency of the image and print its usage
    Check,
}
