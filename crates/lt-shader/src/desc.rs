//! Shader descriptors: the programs and bound resources handed to the
//! translator, plus "clean" copies trimmed to what the generated code uses

use lt_microcode::TexDim;

use crate::record::{ResourceUsage, CFILE_SIZE, MAX_SAMPLERS, MAX_TEXTURES, MAX_UNIFORM_BLOCKS};

/// Number of entries in the vertex semantic table
pub const MAX_SEMANTICS: usize = 32;

/// Semantic table entry meaning "not consumed by the vertex program"
pub const SEMANTIC_UNUSED: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureBinding {
    pub dim: TexDim,
    /// Opaque host handle, carried through untouched
    pub handle: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerBinding {
    pub handle: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformBlockBinding {
    pub handle: u64,
    /// Size in vec4s
    pub size: u32,
}

/// Resources bound to one shader stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResources {
    pub textures: [Option<TextureBinding>; MAX_TEXTURES],
    pub samplers: [Option<SamplerBinding>; MAX_SAMPLERS],
    pub uniform_blocks: [Option<UniformBlockBinding>; MAX_UNIFORM_BLOCKS],
    /// Register file size in vec4s
    pub cfile_size: u32,
}

impl Default for StageResources {
    fn default() -> Self {
        Self {
            textures: [None; MAX_TEXTURES],
            samplers: [None; MAX_SAMPLERS],
            uniform_blocks: [None; MAX_UNIFORM_BLOCKS],
            cfile_size: CFILE_SIZE,
        }
    }
}

impl StageResources {
    pub fn with_texture(mut self, slot: usize, dim: TexDim, handle: u64) -> Self {
        self.textures[slot] = Some(TextureBinding { dim, handle });
        self
    }

    pub fn with_sampler(mut self, slot: usize, handle: u64) -> Self {
        self.samplers[slot] = Some(SamplerBinding { handle });
        self
    }

    pub fn with_uniform_block(mut self, slot: usize, handle: u64, size: u32) -> Self {
        self.uniform_blocks[slot] = Some(UniformBlockBinding { handle, size });
        self
    }

    /// Declared dimension of every texture slot
    pub fn texture_dims(&self) -> [Option<TexDim>; MAX_TEXTURES] {
        self.textures.map(|t| t.map(|t| t.dim))
    }

    /// Copy holding only the bindings `usage` references
    pub fn clean(&self, usage: &ResourceUsage) -> Self {
        let mut out = self.clone();
        for (binding, &used) in out.textures.iter_mut().zip(usage.textures.iter()) {
            if !used {
                *binding = None;
            }
        }
        for (binding, &used) in out.samplers.iter_mut().zip(usage.samplers.iter()) {
            if !used {
                *binding = None;
            }
        }
        for (binding, &count) in out.uniform_blocks.iter_mut().zip(usage.uniform_blocks.iter()) {
            *binding = match *binding {
                Some(block) if count > 0 => Some(UniformBlockBinding {
                    size: block.size.min(count),
                    ..block
                }),
                _ => None,
            };
        }
        out.cfile_size = self.cfile_size.min(usage.cfile);
        out
    }
}

/// Vertex stage input: the vertex program and the fetch shader it may call
#[derive(Debug, Clone)]
pub struct VertexShaderDesc<'a> {
    pub binary: &'a [u8],
    pub fetch_binary: &'a [u8],
    pub resources: StageResources,
    /// Semantic id to GPR; [`SEMANTIC_UNUSED`] marks unused entries
    pub semantic_gprs: [u8; MAX_SEMANTICS],
    /// Step rates selected by SRC_SEL_X Y and Z for per-instance data
    pub instance_step_rates: [u32; 2],
}

impl<'a> VertexShaderDesc<'a> {
    pub fn new(binary: &'a [u8], fetch_binary: &'a [u8]) -> Self {
        Self {
            binary,
            fetch_binary,
            resources: StageResources::default(),
            semantic_gprs: [SEMANTIC_UNUSED; MAX_SEMANTICS],
            instance_step_rates: [1, 1],
        }
    }

    pub fn clean(&self, usage: &ResourceUsage) -> Self {
        Self {
            resources: self.resources.clean(usage),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeometryShaderDesc<'a> {
    pub binary: &'a [u8],
    pub resources: StageResources,
}

impl<'a> GeometryShaderDesc<'a> {
    pub fn new(binary: &'a [u8]) -> Self {
        Self {
            binary,
            resources: StageResources::default(),
        }
    }

    pub fn clean(&self, usage: &ResourceUsage) -> Self {
        Self {
            resources: self.resources.clean(usage),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct PixelShaderDesc<'a> {
    pub binary: &'a [u8],
    pub resources: StageResources,
    /// Interpolated parameters preloaded into R0..
    pub num_inputs: u32,
}

impl<'a> PixelShaderDesc<'a> {
    pub fn new(binary: &'a [u8]) -> Self {
        Self {
            binary,
            resources: StageResources::default(),
            num_inputs: 0,
        }
    }

    pub fn clean(&self, usage: &ResourceUsage) -> Self {
        Self {
            resources: self.resources.clean(usage),
            ..self.clone()
        }
    }
}
