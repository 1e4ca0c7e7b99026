use block_dev::DeviceError;
use derive_more::Display;

use crate::InodeId;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[display(fmt = "no free {} left", _0)]
    ResourceExhausted(Resource),
    #[display(fmt = "{} bytes exceed the direct block capacity of {} bytes", requested, capacity)]
    CapacityExceeded { requested: usize, capacity: usize },
    #[display(fmt = "inode {} is not an allocated file", _0)]
    InvalidHandle(InodeId),
    #[display(fmt = "filesystem is not mounted")]
    NotMounted,
    #[display(fmt = "device error: {}", _0)]
    Device(DeviceError),
    #[display(fmt = "filesystem is corrupted: {}", _0)]
    Corrupted(&'static str),
    #[display(fmt = "invalid geometry: {}", _0)]
    InvalidGeometry(&'static str),
}

/// 可分配的资源种类
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    #[display(fmt = "inode")]
    Inode,
    #[display(fmt = "block")]
    Block,
}

impl From<DeviceError> for Error {
    fn from(err: DeviceError) -> Self {
        Self::Device(err)
    }
}

impl core::error::Error for Error {}
