//! Microcode to HLSL transpiler
//!
//! [`Transpiler`] implements [`ShaderParser`]: the walker decodes and
//! validates, the handlers in the submodules append HLSL statements to the
//! body, and [`Transpiler::finish`] wraps the body with declarations and an
//! entry point.

mod alu;
mod assemble;
mod cf;
mod codegen;
mod export;
mod tex;
mod vtx;

use lt_core::{ShaderConfig, TranslateError};
use lt_microcode::{
    AluInstructionGroup, AluOp2, AluOp3, CfAluInst, CfExpInst, CfInst, ControlFlowInst,
    ShaderType, TexDim, TexInst, VtxInst,
};

use crate::desc::{StageResources, MAX_SEMANTICS, SEMANTIC_UNUSED};
use crate::parser::{
    AluHandler, CfHandler, ShaderParser, TexHandler, TranslationStatus, VtxHandler, WalkState,
};
use crate::record::{ExportMap, InputData, ResourceUsage, TranslatedShader, MAX_TEXTURES};

pub use codegen::ShaderWriter;

/// Translates one program into an HLSL function body
pub struct Transpiler<'a> {
    walk: WalkState<'a>,
    config: ShaderConfig,
    tex_dims: [Option<TexDim>; MAX_TEXTURES],
    semantic_gprs: [u8; MAX_SEMANTICS],
    instance_step_rates: [u32; 2],
    out: ShaderWriter,
    /// GPR writes held back until the end of the current ALU group
    deferred: Vec<String>,
    usage: ResourceUsage,
    inputs: Vec<InputData>,
    exports: ExportMap,
    /// Interpolated parameters preloaded by a pixel shader
    num_inputs: u32,
}

impl<'a> Transpiler<'a> {
    pub fn new(
        binary: &'a [u8],
        stage: ShaderType,
        is_function: bool,
        resources: &StageResources,
        config: &ShaderConfig,
    ) -> Self {
        Self {
            walk: WalkState::new(binary, stage, is_function),
            config: config.clone(),
            tex_dims: resources.texture_dims(),
            semantic_gprs: [SEMANTIC_UNUSED; MAX_SEMANTICS],
            instance_step_rates: [1, 1],
            out: ShaderWriter::with_indent(1),
            deferred: Vec::new(),
            usage: ResourceUsage::default(),
            inputs: Vec::new(),
            exports: ExportMap::new(),
            num_inputs: 0,
        }
    }

    /// Semantic table and step rates used by vertex fetches
    pub fn with_semantics(mut self, semantic_gprs: [u8; MAX_SEMANTICS], step_rates: [u32; 2]) -> Self {
        self.semantic_gprs = semantic_gprs;
        self.instance_step_rates = step_rates;
        self
    }

    pub fn with_pixel_inputs(mut self, num_inputs: u32) -> Self {
        self.num_inputs = num_inputs;
        self
    }

    pub fn stage(&self) -> ShaderType {
        self.walk.stage
    }

    pub fn status(&self) -> TranslationStatus {
        self.walk.status
    }

    pub fn calls_fs(&self) -> bool {
        self.walk.calls_fs
    }

    pub fn usage(&self) -> &ResourceUsage {
        &self.usage
    }

    pub fn inputs(&self) -> &[InputData] {
        &self.inputs
    }

    pub fn exports(&self) -> &ExportMap {
        &self.exports
    }

    /// Statements emitted so far, without declarations
    pub fn body(&self) -> &str {
        self.out.as_str()
    }

    /// Build the final shader; only valid after a completed walk
    pub fn finish(self) -> Result<TranslatedShader, TranslateError> {
        if self.status() != TranslationStatus::Completed {
            return Err(TranslateError::Incomplete);
        }
        Ok(self.assemble(None))
    }

    /// Build a vertex shader together with the fetch shader it calls
    pub fn finish_vertex(self, fetch: Option<Transpiler<'_>>) -> Result<TranslatedShader, TranslateError> {
        let fetch_done = fetch
            .as_ref()
            .map_or(true, |fs| fs.status() == TranslationStatus::Completed);
        if self.status() != TranslationStatus::Completed || !fetch_done {
            return Err(TranslateError::Incomplete);
        }
        Ok(self.assemble(fetch))
    }

    /// `// ...` annotation, when enabled
    fn comment(&mut self, text: impl AsRef<str>) {
        if self.config.emit_comments {
            self.out.line(format!("// {}", text.as_ref()));
        }
    }

    fn cf_comment(&mut self, name: &str) {
        if self.config.emit_comments {
            let cf_pc = self.walk.cf_pc;
            self.out.line(format!("// CF {} {}", cf_pc, name));
        }
    }
}

impl<'a> ShaderParser<'a> for Transpiler<'a> {
    fn walk(&self) -> &WalkState<'a> {
        &self.walk
    }

    fn walk_mut(&mut self) -> &mut WalkState<'a> {
        &mut self.walk
    }

    fn cf_handler(&self, inst: CfInst) -> Option<CfHandler<Self>> {
        cf::normal_handler(inst)
    }

    fn exp_handler(&self, inst: CfExpInst) -> Option<CfHandler<Self>> {
        export::handler(inst)
    }

    fn cf_alu_handler(&self, inst: CfAluInst) -> Option<CfHandler<Self>> {
        cf::alu_handler(inst)
    }

    fn alu_op2_handler(&self, op: AluOp2) -> Option<AluHandler<Self>> {
        alu::op2_handler(op)
    }

    fn alu_op3_handler(&self, op: AluOp3) -> Option<AluHandler<Self>> {
        alu::op3_handler(op)
    }

    fn tex_handler(&self, inst: TexInst) -> Option<TexHandler<Self>> {
        tex::handler(inst)
    }

    fn vtx_handler(&self, inst: VtxInst) -> Option<VtxHandler<Self>> {
        vtx::handler(inst)
    }

    fn begin_alu_group(
        &mut self,
        _cf: &ControlFlowInst,
        _group: &AluInstructionGroup,
    ) -> Result<(), TranslateError> {
        self.deferred.clear();
        let group_pc = self.walk.group_pc;
        self.comment(format!("group {}", group_pc));
        Ok(())
    }

    fn end_alu_group(
        &mut self,
        _cf: &ControlFlowInst,
        _group: &AluInstructionGroup,
    ) -> Result<(), TranslateError> {
        for write in std::mem::take(&mut self.deferred) {
            self.out.line(write);
        }
        self.out.line("PV = PVo;");
        self.out.line("PS = PSo;");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lt_microcode::builder::{CfBuilder, ProgramBuilder};

    fn config() -> ShaderConfig {
        ShaderConfig {
            emit_comments: false,
            log_source: false,
        }
    }

    #[test]
    fn test_finish_requires_completed_walk() {
        let bytes = ProgramBuilder::new()
            .cf(CfBuilder::normal(CfInst::Nop).end_of_program())
            .build();
        let resources = StageResources::default();

        let t = Transpiler::new(&bytes, ShaderType::Pixel, false, &resources, &config());
        assert_eq!(t.finish().unwrap_err(), TranslateError::Incomplete);

        let mut t = Transpiler::new(&bytes, ShaderType::Pixel, false, &resources, &config());
        t.translate().unwrap();
        assert_eq!(t.status(), TranslationStatus::Completed);
        let shader = t.finish().unwrap();
        assert_eq!(shader.stage, ShaderType::Pixel);
        assert!(shader.code.contains("PSOutput PSMain(PSInput input)"));
    }

    #[test]
    fn test_failed_fetch_blocks_vertex() {
        let vs = ProgramBuilder::new()
            .cf(CfBuilder::normal(CfInst::CallFs))
            .cf(CfBuilder::normal(CfInst::Nop).end_of_program())
            .build();
        let fs = ProgramBuilder::new()
            .cf(CfBuilder::normal(CfInst::LoopStart))
            .build();
        let resources = StageResources::default();

        let mut vs_t = Transpiler::new(&vs, ShaderType::Vertex, false, &resources, &config());
        vs_t.translate().unwrap();
        let mut fs_t = Transpiler::new(&fs, ShaderType::Fetch, true, &resources, &config());
        assert!(fs_t.translate().is_err());
        assert_eq!(fs_t.status(), TranslationStatus::Failed);
        assert_eq!(vs_t.finish_vertex(Some(fs_t)).unwrap_err(), TranslateError::Incomplete);
    }

    #[test]
    fn test_comments_follow_config() {
        let bytes = ProgramBuilder::new()
            .cf(CfBuilder::normal(CfInst::Nop).end_of_program())
            .build();
        let resources = StageResources::default();

        let mut t = Transpiler::new(&bytes, ShaderType::Pixel, false, &resources, &ShaderConfig::default());
        t.translate().unwrap();
        assert_eq!(t.body(), "    // CF 0 NOP\n");

        let mut t = Transpiler::new(&bytes, ShaderType::Pixel, false, &resources, &config());
        t.translate().unwrap();
        assert!(t.body().is_empty());
    }
}
