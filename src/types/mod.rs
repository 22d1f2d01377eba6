//! Common value types shared across the graphics system.
//!
//! All native-object creation is abstracted behind these simple value-typed
//! descriptors; the scheduler never depends on a specific native SDK type.

use bitflags::bitflags;

/// Sentinel subresource index meaning "all subresources" of a resource.
///
/// Declaring a usage with this index requests bulk-state semantics: the
/// scheduler expands it to every actual subresource when injecting barriers
/// and committing states.
pub const SUBRESOURCE_ALL: u32 = u32::MAX;

/// Type of GPU command queue a command list is submitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueueType {
    /// Graphics queue (accepts graphics, compute and copy work).
    #[default]
    Graphics,
    /// Compute-only queue.
    Compute,
    /// Copy/transfer-only queue.
    Copy,
}

/// Texture format enumeration.
///
/// Only the formats the scheduling core needs to reason about; backends
/// extend this as they grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum TextureFormat {
    /// 8-bit RGBA channels, unsigned normalized.
    #[default]
    Rgba8Unorm,
    /// 8-bit BGRA channels, unsigned normalized (common swap-chain format).
    Bgra8Unorm,
    /// 16-bit RGBA channels, float.
    Rgba16Float,
    /// 32-bit depth, float.
    Depth32Float,
}

impl TextureFormat {
    /// Returns true if this is a depth format.
    pub fn is_depth(&self) -> bool {
        matches!(self, Self::Depth32Float)
    }
}

bitflags! {
    /// Synchronization state of a resource (or a single subresource).
    ///
    /// Read states may be combined; write states are exclusive. A resource
    /// must be transitioned into a compatible state before it is used in an
    /// incompatible way, via a [`ResourceBarrier`](crate::backend::ResourceBarrier).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResourceState: u32 {
        /// Read as vertex or constant buffer.
        const VERTEX_AND_CONSTANT_BUFFER = 1 << 0;
        /// Read as index buffer.
        const INDEX_BUFFER = 1 << 1;
        /// Written as color render target.
        const RENDER_TARGET = 1 << 2;
        /// Read/write as unordered access (storage).
        const UNORDERED_ACCESS = 1 << 3;
        /// Written as depth target.
        const DEPTH_WRITE = 1 << 4;
        /// Read-only depth.
        const DEPTH_READ = 1 << 5;
        /// Sampled in a shader.
        const SHADER_RESOURCE = 1 << 6;
        /// Read as indirect draw arguments.
        const INDIRECT_ARGUMENT = 1 << 7;
        /// Destination of a copy operation.
        const COPY_DEST = 1 << 8;
        /// Source of a copy operation.
        const COPY_SOURCE = 1 << 9;
        /// Presentable to the swap chain.
        const PRESENT = 1 << 10;
    }
}

impl ResourceState {
    /// Default state of a freshly created (or unknown) resource.
    ///
    /// Barrier logic never guesses: a resource whose state cannot be
    /// determined is treated as `COMMON` and transitioned with a full
    /// barrier.
    pub const COMMON: Self = Self::empty();

    /// Whether this state only reads the resource.
    pub fn is_read_only(&self) -> bool {
        !self.intersects(
            Self::RENDER_TARGET | Self::UNORDERED_ACCESS | Self::DEPTH_WRITE | Self::COPY_DEST,
        )
    }
}

impl Default for ResourceState {
    fn default() -> Self {
        Self::COMMON
    }
}

/// What kind of resource a descriptor creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    /// A linear buffer. Buffers have exactly one subresource.
    Buffer {
        /// Size in bytes.
        size: u64,
    },
    /// A 2D texture. Each mip level of each array layer is a subresource.
    Texture {
        /// Width in texels.
        width: u32,
        /// Height in texels.
        height: u32,
        /// Number of mip levels.
        mip_levels: u32,
        /// Number of array layers.
        array_layers: u32,
        /// Texel format.
        format: TextureFormat,
    },
}

/// Value-typed description of a GPU resource.
///
/// Consumed by the device boundary to create the native object; retained by
/// [`MemoryObject`](crate::resources::MemoryObject) so the scheduler can
/// query subresource counts and barrier preferences without touching the
/// backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Debug label.
    pub label: Option<String>,
    /// Resource kind and dimensions.
    pub kind: ResourceKind,
    /// Request begin/end split barriers for transitions of this resource.
    ///
    /// Default is whole (unsplit) barriers.
    pub split_barriers: bool,
}

impl ResourceDescriptor {
    /// Describe a buffer of `size` bytes.
    pub fn buffer(size: u64) -> Self {
        Self {
            label: None,
            kind: ResourceKind::Buffer { size },
            split_barriers: false,
        }
    }

    /// Describe a 2D texture with a single mip level and array layer.
    pub fn texture_2d(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            label: None,
            kind: ResourceKind::Texture {
                width,
                height,
                mip_levels: 1,
                array_layers: 1,
                format,
            },
            split_barriers: false,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the mip level count (textures only).
    pub fn with_mip_levels(mut self, mips: u32) -> Self {
        if let ResourceKind::Texture { mip_levels, .. } = &mut self.kind {
            *mip_levels = mips;
        }
        self
    }

    /// Set the array layer count (textures only).
    pub fn with_array_layers(mut self, layers: u32) -> Self {
        if let ResourceKind::Texture { array_layers, .. } = &mut self.kind {
            *array_layers = layers;
        }
        self
    }

    /// Request begin/end split barriers for this resource.
    pub fn with_split_barriers(mut self) -> Self {
        self.split_barriers = true;
        self
    }

    /// Number of individually-stateful subresources.
    pub fn subresource_count(&self) -> u32 {
        match &self.kind {
            ResourceKind::Buffer { .. } => 1,
            ResourceKind::Texture {
                mip_levels,
                array_layers,
                ..
            } => mip_levels * array_layers,
        }
    }
}
