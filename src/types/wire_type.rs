//! Wire data types understood by the simulator

use serde::{Deserialize, Serialize};

/// Data type of one field in a wire record.
/// Mirrors the simulator's data definition types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireType {
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit floating point
    Float32,
    /// 64-bit floating point
    Float64,
}

impl WireType {
    /// Returns the size in bytes of this data type on the wire.
    pub const fn size(&self) -> usize {
        match self {
            WireType::Int32 | WireType::Float32 => 4,
            WireType::Int64 | WireType::Float64 => 8,
        }
    }
}
