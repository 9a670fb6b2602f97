//! Chunk corpus and nearest-neighbor index.
//!
//! The corpus and its vectors are built offline; this module only loads
//! them and answers k-NN queries. Position *i* in the corpus corresponds to
//! vector *i* in the index.
//!
//! # Vector file format
//!
//! ```text
//! offset  size          field
//! 0       4             magic "AGIX"
//! 4       4             dims  (u32, little-endian)
//! 8       4             count (u32, little-endian)
//! 12      count*dims*4  vectors, row-major f32 little-endian
//! ```
//!
//! The vector payload uses the same encoding as [`vec_to_blob`].

use anyhow::{bail, ensure, Context, Result};
use std::path::Path;

use crate::models::Neighbor;

const MAGIC: &[u8; 4] = b"AGIX";
const HEADER_LEN: usize = 12;

/// The ordered chunk texts the index was built from.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    chunks: Vec<String>,
}

impl Corpus {
    pub fn new(chunks: Vec<String>) -> Self {
        Self { chunks }
    }

    /// Reads a JSON array of strings.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read chunks file: {}", path.display()))?;
        let chunks: Vec<String> = serde_json::from_str(&content).with_context(|| {
            format!("Chunks file is not a JSON string array: {}", path.display())
        })?;
        Ok(Self { chunks })
    }

    /// Chunk text at `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.chunks.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// k-NN search over fixed-length vectors.
///
/// Results are ordered by ascending distance (best first) and hold at
/// most `k` entries. Implementations must be safe for concurrent reads.
pub trait SimilarityIndex: Send + Sync {
    fn dims(&self) -> usize;
    /// Number of stored vectors.
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;
}

/// Exact brute-force index under squared Euclidean distance.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dims: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            data: Vec::new(),
        }
    }

    pub fn from_vectors(dims: usize, vectors: &[Vec<f32>]) -> Result<Self> {
        let mut index = Self::new(dims);
        for v in vectors {
            index.add(v)?;
        }
        Ok(index)
    }

    pub fn add(&mut self, vector: &[f32]) -> Result<()> {
        ensure!(
            vector.len() == self.dims,
            "vector has {} dims, index expects {}",
            vector.len(),
            self.dims
        );
        self.data.extend_from_slice(vector);
        Ok(())
    }

    #[cfg(test)]
    fn vector(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(self.dims)?;
        self.data.get(start..start + self.dims)
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read vector file: {}", path.display()))?;
        Self::from_bytes(&bytes).with_context(|| format!("Invalid vector file: {}", path.display()))
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_bytes())
            .with_context(|| format!("Failed to write vector file: {}", path.display()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN || &bytes[0..4] != MAGIC {
            bail!("missing AGIX header");
        }
        let dims = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
        let count = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
        if dims == 0 {
            bail!("dimensionality must be > 0");
        }

        let expected = count
            .checked_mul(dims)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| anyhow::anyhow!("vector count overflows"))?;
        let payload = &bytes[HEADER_LEN..];
        if payload.len() != expected {
            bail!(
                "expected {} payload bytes for {} x {} vectors, found {}",
                expected,
                count,
                dims,
                payload.len()
            );
        }

        Ok(Self {
            dims,
            data: blob_to_vec(payload),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.data.len() * 4);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&(self.dims as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&vec_to_blob(&self.data));
        bytes
    }
}

impl SimilarityIndex for FlatL2Index {
    fn dims(&self) -> usize {
        self.dims
    }

    fn len(&self) -> usize {
        if self.dims == 0 {
            0
        } else {
            self.data.len() / self.dims
        }
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        ensure!(
            query.len() == self.dims,
            "query has {} dims, index expects {}",
            query.len(),
            self.dims
        );
        if k == 0 || self.dims == 0 {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dims)
            .enumerate()
            .map(|(index, v)| Neighbor {
                distance: squared_l2(query, v),
                index,
            })
            .filter(|n| n.distance.is_finite())
            .collect();

        // Distance asc, index asc (deterministic ties)
        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        neighbors.truncate(k);

        Ok(neighbors)
    }
}

/// Squared Euclidean distance. Callers guarantee equal lengths.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Encode a float vector as little-endian f32 bytes.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode little-endian f32 bytes back into a float vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
