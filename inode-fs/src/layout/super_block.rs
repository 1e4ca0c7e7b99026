use super::{get_u32, put_u32};
use crate::Geometry;
use crate::MAGIC;

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 记录容量与空闲计数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperBlock {
    /// 魔数：用于校验文件系统合法性
    magic: u32,
    pub total_inodes: u32,
    pub total_blocks: u32,
    pub free_blocks: u32,
    pub free_inodes: u32,
}

impl SuperBlock {
    /// 在块内占据的字节数，其后紧跟两张位图
    pub const SIZE: usize = 20;

    #[inline]
    pub fn new(geometry: &Geometry, free_blocks: u32) -> Self {
        Self {
            magic: MAGIC,
            total_inodes: geometry.total_inodes,
            total_blocks: geometry.total_blocks,
            free_blocks,
            free_inodes: geometry.total_inodes,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
            && self.free_blocks <= self.total_blocks
            && self.free_inodes <= self.total_inodes
    }

    #[inline]
    pub fn geometry(&self) -> Geometry {
        Geometry {
            total_blocks: self.total_blocks,
            total_inodes: self.total_inodes,
        }
    }

    pub fn decode(raw: &[u8]) -> Self {
        Self {
            magic: get_u32(raw, 0),
            total_inodes: get_u32(raw, 4),
            total_blocks: get_u32(raw, 8),
            free_blocks: get_u32(raw, 12),
            free_inodes: get_u32(raw, 16),
        }
    }

    pub fn encode(&self, raw: &mut [u8]) {
        put_u32(raw, 0, self.magic);
        put_u32(raw, 4, self.total_inodes);
        put_u32(raw, 8, self.total_blocks);
        put_u32(raw, 12, self.free_blocks);
        put_u32(raw, 16, self.free_inodes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_offsets() {
        let mut super_block = SuperBlock::new(&Geometry::default(), 1021);
        super_block.free_inodes = 127;

        let mut raw = [0; SuperBlock::SIZE];
        super_block.encode(&mut raw);
        assert_eq!(MAGIC.to_le_bytes(), raw[0..4]);
        assert_eq!(128u32.to_le_bytes(), raw[4..8]);
        assert_eq!(1024u32.to_le_bytes(), raw[8..12]);
        assert_eq!(1021u32.to_le_bytes(), raw[12..16]);
        assert_eq!(127u32.to_le_bytes(), raw[16..20]);
        assert_eq!(super_block, SuperBlock::decode(&raw));
    }

    #[test]
    fn validity() {
        let mut super_block = SuperBlock::new(&Geometry::default(), 1021);
        assert!(super_block.is_valid());

        super_block.free_blocks = 1025;
        assert!(!super_block.is_valid());

        assert!(!SuperBlock::decode(&[0; SuperBlock::SIZE]).is_valid());
    }
}
