use alloc::vec;
use alloc::vec::Vec;

/// 位图，记录其指示区域内各单元(块或 inode)的分配情况：
/// 0 为空闲，1 为占用。
///
/// 第 `i` 位存放于第 `i / 8` 字节的第 `i % 8` 位。
/// 位图只改动自身；超级块中对应的空闲计数由调用方在同一次操作中维护。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    /// 按 64 位分组
    groups: Vec<u64>,
    /// 位图所指示区域的单元数
    capacity: u32,
}

impl Bitmap {
    /// 全部空闲的位图
    pub fn new(capacity: u32) -> Self {
        Self {
            groups: vec![0; (capacity as usize).div_ceil(64)],
            capacity,
        }
    }

    /// 在磁盘上占据的字节数
    #[inline]
    pub const fn bytes_for(capacity: u32) -> usize {
        (capacity as usize).div_ceil(8)
    }

    pub fn decode(capacity: u32, raw: &[u8]) -> Self {
        let mut bitmap = Self::new(capacity);
        for (index, &byte) in raw[..Self::bytes_for(capacity)].iter().enumerate() {
            bitmap.groups[index / 8] |= (byte as u64) << (index % 8 * 8);
        }
        bitmap
    }

    pub fn encode(&self, raw: &mut [u8]) {
        let bytes = self.groups.iter().flat_map(|group| group.to_le_bytes());
        for (dest, byte) in raw[..Self::bytes_for(self.capacity)].iter_mut().zip(bytes) {
            *dest = byte;
        }
    }

    /// 线性扫描，返回编号最小的空闲单元
    pub fn find_first_free(&self) -> Option<u32> {
        self.groups
            .iter()
            .enumerate()
            .find_map(|(group_index, &bits)| {
                (bits != u64::MAX).then(|| (group_index * 64) as u32 + bits.trailing_ones())
            })
            .filter(|&index| index < self.capacity)
    }

    /// 分配编号最小的空闲单元，空间用尽则返回空
    pub fn alloc(&mut self) -> Option<u32> {
        let index = self.find_first_free()?;
        self.mark(index);
        Some(index)
    }

    /// 清除对应位，返回该位原先是否占用
    pub fn dealloc(&mut self, index: u32) -> bool {
        let (group_index, bit) = Self::locate(index);
        let was_used = self.groups[group_index] & bit != 0;
        self.groups[group_index] &= !bit;
        was_used
    }

    #[inline]
    pub fn mark(&mut self, index: u32) {
        let (group_index, bit) = Self::locate(index);
        self.groups[group_index] |= bit;
    }

    #[inline]
    pub fn is_used(&self, index: u32) -> bool {
        if index >= self.capacity {
            return false;
        }
        let (group_index, bit) = Self::locate(index);
        self.groups[group_index] & bit != 0
    }

    /// 已占用单元数，容量之外的位不计入
    pub fn used(&self) -> u32 {
        let tail = self.capacity % 64;
        self.groups
            .iter()
            .enumerate()
            .map(|(group_index, &bits)| {
                if tail != 0 && group_index == self.groups.len() - 1 {
                    (bits & ((1 << tail) - 1)).count_ones()
                } else {
                    bits.count_ones()
                }
            })
            .sum()
    }

    /// 按编号升序遍历已占用的单元
    pub fn iter_used(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.capacity).filter(|&index| self.is_used(index))
    }

    #[inline]
    fn locate(index: u32) -> (usize, u64) {
        (index as usize / 64, 1 << (index % 64))
    }
}
