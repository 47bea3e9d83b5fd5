//! Translation results and resource usage tracking

use lt_microcode::{ExportType, ShaderType};

pub const MAX_TEXTURES: usize = 16;
pub const MAX_SAMPLERS: usize = 16;
pub const MAX_UNIFORM_BLOCKS: usize = 16;

/// Size of the uniform register file, in vec4s
pub const CFILE_SIZE: u32 = 256;

/// Size of a uniform block assumed for dynamically indexed accesses, in vec4s
pub const UNIFORM_BLOCK_SIZE: u32 = 4096;

/// Resources referenced by a translated program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceUsage {
    pub textures: [bool; MAX_TEXTURES],
    pub samplers: [bool; MAX_SAMPLERS],
    /// vec4 count accessed per uniform block; 0 when unused
    pub uniform_blocks: [u32; MAX_UNIFORM_BLOCKS],
    /// vec4 count accessed in the register file
    pub cfile: u32,
}

impl ResourceUsage {
    pub fn is_empty(&self) -> bool {
        !self.textures.iter().any(|&t| t)
            && !self.samplers.iter().any(|&s| s)
            && self.uniform_blocks.iter().all(|&n| n == 0)
            && self.cfile == 0
    }

    pub fn use_texture(&mut self, slot: usize) {
        self.textures[slot] = true;
    }

    pub fn use_sampler(&mut self, slot: usize) {
        self.samplers[slot] = true;
    }

    /// Record an access to vec4 `index` of uniform block `block`
    pub fn use_uniform(&mut self, block: usize, index: u32) {
        let size = &mut self.uniform_blocks[block];
        *size = (*size).max(index.saturating_add(1)).min(UNIFORM_BLOCK_SIZE);
    }

    /// Dynamically indexed access; the whole block must be bound
    pub fn use_uniform_block(&mut self, block: usize) {
        self.uniform_blocks[block] = UNIFORM_BLOCK_SIZE;
    }

    pub fn use_cfile(&mut self, index: u32) {
        self.cfile = self.cfile.max(index.saturating_add(1)).min(CFILE_SIZE);
    }

    pub fn use_cfile_all(&mut self) {
        self.cfile = CFILE_SIZE;
    }

    /// Union of two usage records
    pub fn merge(&mut self, other: &ResourceUsage) {
        for (a, b) in self.textures.iter_mut().zip(other.textures.iter()) {
            *a |= *b;
        }
        for (a, b) in self.samplers.iter_mut().zip(other.samplers.iter()) {
            *a |= *b;
        }
        for (a, b) in self.uniform_blocks.iter_mut().zip(other.uniform_blocks.iter()) {
            *a = (*a).max(*b);
        }
        self.cfile = self.cfile.max(other.cfile);
    }

    pub fn texture_count(&self) -> usize {
        self.textures.iter().filter(|&&t| t).count()
    }
}

/// How a vertex input advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputIndexMode {
    PerVertex,
    PerInstance,
}

/// Vertex input layout produced by a fetch shader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputData {
    /// Attribute buffer slot (0..16)
    pub buffer_index: u32,
    /// Byte offset within one vertex
    pub offset: u32,
    /// Bytes per element
    pub elem_width: u32,
    pub elem_count: u32,
    pub index_mode: InputIndexMode,
    /// Instance step rate; 0 for per-vertex inputs
    pub divisor: u32,
    /// Shader-visible attribute location
    pub location: u32,
}

/// One shader output slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportEntry {
    pub kind: ExportType,
    pub array_base: u32,
    pub slot: u32,
}

/// Maps hardware export targets to dense shader output slots
///
/// Slots are assigned per export kind in first-seen order, so the same
/// program always produces the same interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportMap {
    entries: Vec<ExportEntry>,
}

impl ExportMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_assign(&mut self, kind: ExportType, array_base: u32) -> u32 {
        if let Some(slot) = self.slot(kind, array_base) {
            return slot;
        }
        let slot = self.count(kind);
        self.entries.push(ExportEntry {
            kind,
            array_base,
            slot,
        });
        slot
    }

    pub fn slot(&self, kind: ExportType, array_base: u32) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.kind == kind && e.array_base == array_base)
            .map(|e| e.slot)
    }

    pub fn count(&self, kind: ExportType) -> u32 {
        self.entries.iter().filter(|e| e.kind == kind).count() as u32
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExportEntry> {
        self.entries.iter()
    }

    /// Entries of one kind, in slot order
    pub fn of_kind(&self, kind: ExportType) -> impl Iterator<Item = &ExportEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Output of a successful translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedShader {
    pub stage: ShaderType,
    /// Generated HLSL source
    pub code: String,
    pub usage: ResourceUsage,
    /// Vertex inputs, populated for vertex shaders that call a fetch shader
    pub inputs: Vec<InputData>,
    pub calls_fs: bool,
    pub exports: ExportMap,
}

impl TranslatedShader {
    pub fn num_pos_exports(&self) -> u32 {
        self.exports.count(ExportType::Pos)
    }

    pub fn num_param_exports(&self) -> u32 {
        self.exports.count(ExportType::Param)
    }

    pub fn num_pixel_exports(&self) -> u32 {
        self.exports.count(ExportType::Pixel)
    }
}
