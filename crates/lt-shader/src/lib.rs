//! Latte shader recompiler
//!
//! Translates Latte (R6xx/R7xx) shader microcode into HLSL source together
//! with the resources the generated shader needs:
//! - [`parser`]: the generic decode/dispatch walker and its legality checks
//! - [`transpiler`]: the HLSL backend driven by the walker
//! - [`desc`]: stage descriptors and their "clean" counterparts
//! - [`record`]: translation results and resource usage

pub mod desc;
pub mod parser;
pub mod record;
pub mod transpiler;

pub use desc::{
    GeometryShaderDesc, PixelShaderDesc, SamplerBinding, StageResources, TextureBinding,
    UniformBlockBinding, VertexShaderDesc,
};
pub use parser::{AluTarget, ShaderParser, TranslationStatus, WalkState};
pub use record::{ExportEntry, ExportMap, InputData, InputIndexMode, ResourceUsage, TranslatedShader};
pub use transpiler::Transpiler;

use lt_core::{ShaderConfig, TranslateError};
use lt_microcode::ShaderType;
use tracing::{debug, warn};

fn log_result(
    stage: ShaderType,
    result: Result<TranslatedShader, TranslateError>,
) -> Result<TranslatedShader, TranslateError> {
    match &result {
        Ok(shader) => debug!(
            "Translated {} shader: {} bytes of source, {} texture(s), {} pos/{} param/{} pixel export(s)",
            stage.name(),
            shader.code.len(),
            shader.usage.texture_count(),
            shader.num_pos_exports(),
            shader.num_param_exports(),
            shader.num_pixel_exports()
        ),
        Err(e) => warn!("Failed to translate {} shader: {}", stage.name(), e),
    }
    result
}

fn vertex_with_fetch(
    desc: &VertexShaderDesc<'_>,
    config: &ShaderConfig,
) -> Result<TranslatedShader, TranslateError> {
    let mut vs = Transpiler::new(desc.binary, ShaderType::Vertex, false, &desc.resources, config)
        .with_semantics(desc.semantic_gprs, desc.instance_step_rates);
    vs.translate()?;

    let fetch = if vs.calls_fs() {
        let mut fs = Transpiler::new(desc.fetch_binary, ShaderType::Fetch, true, &desc.resources, config)
            .with_semantics(desc.semantic_gprs, desc.instance_step_rates);
        fs.translate()?;
        Some(fs)
    } else {
        None
    };
    vs.finish_vertex(fetch)
}

/// Translate a vertex shader, and the fetch shader it calls
pub fn translate_vertex(
    desc: &VertexShaderDesc<'_>,
    config: &ShaderConfig,
) -> Result<TranslatedShader, TranslateError> {
    debug!(
        "Translating vertex shader ({} bytes, fetch shader {} bytes)",
        desc.binary.len(),
        desc.fetch_binary.len()
    );
    log_result(ShaderType::Vertex, vertex_with_fetch(desc, config))
}

pub fn translate_geometry(
    desc: &GeometryShaderDesc<'_>,
    config: &ShaderConfig,
) -> Result<TranslatedShader, TranslateError> {
    debug!("Translating geometry shader ({} bytes)", desc.binary.len());
    let mut gs = Transpiler::new(desc.binary, ShaderType::Geometry, false, &desc.resources, config);
    let result = gs.translate().and_then(|()| gs.finish());
    log_result(ShaderType::Geometry, result)
}

pub fn translate_pixel(
    desc: &PixelShaderDesc<'_>,
    config: &ShaderConfig,
) -> Result<TranslatedShader, TranslateError> {
    debug!(
        "Translating pixel shader ({} bytes, {} input(s))",
        desc.binary.len(),
        desc.num_inputs
    );
    let mut ps = Transpiler::new(desc.binary, ShaderType::Pixel, false, &desc.resources, config)
        .with_pixel_inputs(desc.num_inputs);
    let result = ps.translate().and_then(|()| ps.finish());
    log_result(ShaderType::Pixel, result)
}

/// Translate a single program with an explicit stage
///
/// `is_function` compiles the program as a callable function, which is
/// required for fetch shaders and is the only mode in which `RETURN` is
/// legal.
pub fn translate_program(
    binary: &[u8],
    stage: ShaderType,
    is_function: bool,
    resources: &StageResources,
    config: &ShaderConfig,
) -> Result<TranslatedShader, TranslateError> {
    debug!(
        "Translating {} program ({} bytes, function: {})",
        stage.name(),
        binary.len(),
        is_function
    );
    let mut t = Transpiler::new(binary, stage, is_function, resources, config);
    let result = t.translate().and_then(|()| t.finish());
    log_result(stage, result)
}
