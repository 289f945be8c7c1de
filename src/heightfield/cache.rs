//! Per-chunk heightfield data published by the terrain subsystem.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::constants::{CHUNK_SIZE, HEIGHTMAP_LEN, HEIGHTMAP_STRIDE, VOXEL_MASK_LEN};

/// Rejected chunk data
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ChunkDataError {
    #[error("Heightmap has {actual} samples, expected {expected}")]
    HeightmapLength { expected: usize, actual: usize },
    #[error("Voxel mask has {actual} cells, expected {expected}")]
    VoxelMaskLength { expected: usize, actual: usize },
    #[error("Heightmap sample {index} is not finite")]
    NonFiniteHeight { index: usize },
}

/// Heightmap and voxel mask for one chunk.
///
/// `heightmap` holds (N+1)² vertex heights, row-major by Z.
/// `voxel_mask` holds N² column flags, row-major by Z: 0 = heightfield
/// column, anything else = voxel-governed column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkColumns {
    heightmap: Option<Vec<f32>>,
    voxel_mask: Option<Vec<u8>>,
}

impl ChunkColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every vertex at `height`
    pub fn flat(height: f32) -> Self {
        Self {
            heightmap: Some(vec![height; HEIGHTMAP_LEN]),
            voxel_mask: None,
        }
    }

    /// Heightmap from a per-vertex function of local (x, z)
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(usize, usize) -> f32,
    {
        let mut heightmap = Vec::with_capacity(HEIGHTMAP_LEN);
        for z in 0..HEIGHTMAP_STRIDE {
            for x in 0..HEIGHTMAP_STRIDE {
                heightmap.push(f(x, z));
            }
        }
        Self {
            heightmap: Some(heightmap),
            voxel_mask: None,
        }
    }

    pub fn with_heightmap(mut self, heightmap: Vec<f32>) -> Result<Self, ChunkDataError> {
        if heightmap.len() != HEIGHTMAP_LEN {
            return Err(ChunkDataError::HeightmapLength {
                expected: HEIGHTMAP_LEN,
                actual: heightmap.len(),
            });
        }
        if let Some(index) = heightmap.iter().position(|h| !h.is_finite()) {
            return Err(ChunkDataError::NonFiniteHeight { index });
        }
        self.heightmap = Some(heightmap);
        Ok(self)
    }

    pub fn with_voxel_mask(mut self, voxel_mask: Vec<u8>) -> Result<Self, ChunkDataError> {
        if voxel_mask.len() != VOXEL_MASK_LEN {
            return Err(ChunkDataError::VoxelMaskLength {
                expected: VOXEL_MASK_LEN,
                actual: voxel_mask.len(),
            });
        }
        self.voxel_mask = Some(voxel_mask);
        Ok(self)
    }

    pub fn heightmap(&self) -> Option<&[f32]> {
        self.heightmap.as_deref()
    }

    pub fn voxel_mask(&self) -> Option<&[u8]> {
        self.voxel_mask.as_deref()
    }

    /// Height at vertex (x, z); indices clamp to the chunk
    pub fn vertex_height(&self, x: usize, z: usize) -> Option<f32> {
        let heightmap = self.heightmap.as_ref()?;
        let x = x.min(CHUNK_SIZE);
        let z = z.min(CHUNK_SIZE);
        Some(heightmap[z * HEIGHTMAP_STRIDE + x])
    }

    /// Mask flag for cell (x, z); `None` when there is no mask.
    /// Indices clamp to the chunk.
    pub fn is_voxel_cell(&self, x: usize, z: usize) -> Option<bool> {
        let mask = self.voxel_mask.as_ref()?;
        let x = x.min(CHUNK_SIZE - 1);
        let z = z.min(CHUNK_SIZE - 1);
        Some(mask[z * CHUNK_SIZE + x] != 0)
    }

    /// Flag cell (x, z) as voxel-governed or not, creating an all-heightfield
    /// mask first if the chunk has none. Out-of-range cells are ignored.
    pub fn set_voxel_cell(&mut self, x: usize, z: usize, voxel: bool) {
        if x >= CHUNK_SIZE || z >= CHUNK_SIZE {
            return;
        }
        let mask = self
            .voxel_mask
            .get_or_insert_with(|| vec![0; VOXEL_MASK_LEN]);
        mask[z * CHUNK_SIZE + x] = u8::from(voxel);
    }

    /// Flag every cell in the inclusive local rectangle
    pub fn set_voxel_region(&mut self, min: UVec2, max: UVec2, voxel: bool) {
        for z in min.y..=max.y {
            for x in min.x..=max.x {
                self.set_voxel_cell(x as usize, z as usize, voxel);
            }
        }
    }
}

/// Chunk data keyed by chunk coordinate (chunk x, chunk z)
#[derive(Debug, Clone, Default)]
pub struct ChunkCache {
    chunks: HashMap<IVec2, ChunkColumns>,
}

impl ChunkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chunk: IVec2, columns: ChunkColumns) -> Option<ChunkColumns> {
        tracing::debug!(
            chunk_x = chunk.x,
            chunk_z = chunk.y,
            has_heightmap = columns.heightmap.is_some(),
            has_mask = columns.voxel_mask.is_some(),
            "chunk columns cached"
        );
        self.chunks.insert(chunk, columns)
    }

    pub fn remove(&mut self, chunk: IVec2) -> Option<ChunkColumns> {
        let removed = self.chunks.remove(&chunk);
        if removed.is_some() {
            tracing::debug!(chunk_x = chunk.x, chunk_z = chunk.y, "chunk columns evicted");
        }
        removed
    }

    /// Validate raw terrain-worker output and cache it.
    ///
    /// Rejected data leaves any previously cached columns for `chunk` in place.
    pub fn publish(
        &mut self,
        chunk: IVec2,
        heightmap: Option<Vec<f32>>,
        voxel_mask: Option<Vec<u8>>,
    ) -> Result<(), ChunkDataError> {
        let build = || -> Result<ChunkColumns, ChunkDataError> {
            let mut columns = ChunkColumns::new();
            if let Some(heightmap) = heightmap {
                columns = columns.with_heightmap(heightmap)?;
            }
            if let Some(voxel_mask) = voxel_mask {
                columns = columns.with_voxel_mask(voxel_mask)?;
            }
            Ok(columns)
        };

        match build() {
            Ok(columns) => {
                self.insert(chunk, columns);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(chunk_x = chunk.x, chunk_z = chunk.y, "rejected chunk data: {}", e);
                Err(e)
            }
        }
    }

    pub fn get(&self, chunk: IVec2) -> Option<&ChunkColumns> {
        self.chunks.get(&chunk)
    }

    pub fn get_mut(&mut self, chunk: IVec2) -> Option<&mut ChunkColumns> {
        self.chunks.get_mut(&chunk)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heightmap_length_checked() {
        let err = ChunkColumns::new().with_heightmap(vec![0.0; 16]).unwrap_err();
        assert_eq!(
            err,
            ChunkDataError::HeightmapLength {
                expected: HEIGHTMAP_LEN,
                actual: 16
            }
        );
    }

    #[test]
    fn test_non_finite_height_rejected() {
        let mut heights = vec![1.0; HEIGHTMAP_LEN];
        heights[40] = f32::NAN;
        let err = ChunkColumns::new().with_heightmap(heights).unwrap_err();
        assert_eq!(err, ChunkDataError::NonFiniteHeight { index: 40 });
    }

    #[test]
    fn test_mask_length_checked() {
        assert!(ChunkColumns::new().with_voxel_mask(vec![0; VOXEL_MASK_LEN]).is_ok());
        assert!(ChunkColumns::new().with_voxel_mask(vec![0; 10]).is_err());
    }

    #[test]
    fn test_vertex_layout_is_row_major_by_z() {
        let columns = ChunkColumns::from_fn(|x, z| (x + 100 * z) as f32);
        assert_eq!(columns.vertex_height(3, 0), Some(3.0));
        assert_eq!(columns.vertex_height(0, 2), Some(200.0));
        // Clamped to the last vertex
        assert_eq!(columns.vertex_height(99, 99), Some(1616.0));
    }

    #[test]
    fn test_set_voxel_cell_creates_mask() {
        let mut columns = ChunkColumns::flat(0.0);
        assert_eq!(columns.is_voxel_cell(4, 4), None);
        columns.set_voxel_cell(4, 5, true);
        assert_eq!(columns.is_voxel_cell(4, 5), Some(true));
        assert_eq!(columns.is_voxel_cell(5, 4), Some(false));
        columns.set_voxel_cell(CHUNK_SIZE, 0, true);
        assert_eq!(columns.voxel_mask().map(|m| m.iter().filter(|c| **c != 0).count()), Some(1));
    }

    #[test]
    fn test_cache_insert_replace_remove() {
        let mut cache = ChunkCache::new();
        assert!(cache.insert(IVec2::new(0, 0), ChunkColumns::flat(1.0)).is_none());
        assert!(cache.insert(IVec2::new(0, 0), ChunkColumns::flat(2.0)).is_some());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(IVec2::ZERO).and_then(|c| c.vertex_height(0, 0)), Some(2.0));
        assert!(cache.remove(IVec2::ZERO).is_some());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_publish_rejects_bad_data_and_keeps_old() {
        let mut cache = ChunkCache::new();
        cache
            .publish(IVec2::ZERO, Some(vec![3.0; HEIGHTMAP_LEN]), None)
            .unwrap();
        let err = cache
            .publish(IVec2::ZERO, Some(vec![4.0; HEIGHTMAP_LEN]), Some(vec![1; 3]))
            .unwrap_err();
        assert!(matches!(err, ChunkDataError::VoxelMaskLength { actual: 3, .. }));
        assert_eq!(cache.get(IVec2::ZERO).and_then(|c| c.vertex_height(1, 1)), Some(3.0));
    }
}
