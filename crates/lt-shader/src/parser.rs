//! Generic microcode walker
//!
//! [`ShaderParser`] drives the decode/dispatch loop over a shader program and
//! enforces control-flow legality. Implementors only supply per-opcode
//! handlers; any opcode without a handler fails the translation with
//! [`TranslateError::Unimplemented`].

use lt_core::{DecodeError, TranslateError};
use lt_microcode::{
    AluClauseParser, AluInst, AluInstructionGroup, AluOp2, AluOp3, AluOpcode, AluUnit,
    CfAluInst, CfExpInst, CfInst, CfInstType, ControlFlowInst, ShaderBinary, ShaderType,
    TexInst, TextureFetchInst, VertexFetchInst, VtxInst,
};
use tracing::{trace, warn};

/// Progress of one translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslationStatus {
    #[default]
    NotStarted,
    Walking,
    Completed,
    Failed,
}

/// Mutable walk state owned by one translation
#[derive(Debug, Clone)]
pub struct WalkState<'a> {
    pub binary: ShaderBinary<'a>,
    pub stage: ShaderType,
    pub is_function: bool,
    pub cf_pc: u32,
    pub group_pc: u32,
    pub reached_eop: bool,
    pub calls_fs: bool,
    pub status: TranslationStatus,
}

impl<'a> WalkState<'a> {
    pub fn new(binary: &'a [u8], stage: ShaderType, is_function: bool) -> Self {
        Self {
            binary: ShaderBinary::new(binary),
            stage,
            is_function,
            cf_pc: 0,
            group_pc: 0,
            reached_eop: false,
            calls_fs: false,
            status: TranslationStatus::NotStarted,
        }
    }
}

/// Which part of an ALU group a handler is translating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluTarget {
    /// A single lane
    Unit(AluUnit),
    /// Lanes X..W of a reduction group, collapsed into one operation
    Reduction,
}

pub type CfHandler<T> = fn(&mut T, &ControlFlowInst) -> Result<(), TranslateError>;
pub type AluHandler<T> = fn(
    &mut T,
    &ControlFlowInst,
    &AluInstructionGroup,
    AluTarget,
    &AluInst,
) -> Result<(), TranslateError>;
pub type TexHandler<T> = fn(&mut T, &ControlFlowInst, &TextureFetchInst) -> Result<(), TranslateError>;
pub type VtxHandler<T> = fn(&mut T, &ControlFlowInst, &VertexFetchInst) -> Result<(), TranslateError>;

fn unimplemented(kind: &'static str, name: &'static str) -> TranslateError {
    TranslateError::Unimplemented { kind, name }
}

/// Decode/dispatch loop shared by every microcode translator
pub trait ShaderParser<'a>: Sized {
    fn walk(&self) -> &WalkState<'a>;
    fn walk_mut(&mut self) -> &mut WalkState<'a>;

    fn cf_handler(&self, _inst: CfInst) -> Option<CfHandler<Self>> {
        None
    }

    fn exp_handler(&self, _inst: CfExpInst) -> Option<CfHandler<Self>> {
        None
    }

    fn cf_alu_handler(&self, _inst: CfAluInst) -> Option<CfHandler<Self>> {
        None
    }

    fn alu_op2_handler(&self, _op: AluOp2) -> Option<AluHandler<Self>> {
        None
    }

    fn alu_op3_handler(&self, _op: AluOp3) -> Option<AluHandler<Self>> {
        None
    }

    fn tex_handler(&self, _inst: TexInst) -> Option<TexHandler<Self>> {
        None
    }

    fn vtx_handler(&self, _inst: VtxInst) -> Option<VtxHandler<Self>> {
        None
    }

    fn begin_alu_group(
        &mut self,
        _cf: &ControlFlowInst,
        _group: &AluInstructionGroup,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn end_alu_group(
        &mut self,
        _cf: &ControlFlowInst,
        _group: &AluInstructionGroup,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    /// Walk the whole program, recording the final status
    fn translate(&mut self) -> Result<(), TranslateError> {
        let result = self.walk_program();
        self.walk_mut().status = match result {
            Ok(()) => TranslationStatus::Completed,
            Err(_) => TranslationStatus::Failed,
        };
        result
    }

    fn walk_program(&mut self) -> Result<(), TranslateError> {
        let walk = self.walk();
        if walk.binary.is_empty() {
            return Err(DecodeError::EmptyBinary.into());
        }
        if walk.stage == ShaderType::Fetch && !walk.is_function {
            return Err(TranslateError::FetchShaderNotFunction);
        }

        self.walk_mut().status = TranslationStatus::Walking;
        while !self.walk().reached_eop {
            let binary = self.walk().binary;
            let cf_pc = self.walk().cf_pc;
            if !binary.has_cf(cf_pc as usize) {
                warn!(
                    "{} shader ended at CF {} without reaching end of program",
                    self.walk().stage.name(),
                    cf_pc
                );
                break;
            }

            let cf = binary.cf_at(cf_pc as usize)?;
            trace!("CF {}: {:?} {:08X} {:08X}", cf_pc, cf.inst_type(), cf.word0, cf.word1);
            self.translate_cf_inst(&cf)?;
            self.walk_mut().cf_pc += 1;
        }
        Ok(())
    }

    fn translate_cf_inst(&mut self, cf: &ControlFlowInst) -> Result<(), TranslateError> {
        match cf.inst_type() {
            CfInstType::Normal => self.translate_cf_normal(cf),
            CfInstType::Export => self.translate_cf_export(cf),
            CfInstType::Alu | CfInstType::AluExtended => self.translate_cf_alu(cf),
        }
    }

    fn translate_cf_normal(&mut self, cf: &ControlFlowInst) -> Result<(), TranslateError> {
        let inst = cf.cf_inst()?;
        let walk = self.walk();
        match inst {
            CfInst::CallFs => {
                if walk.stage != ShaderType::Vertex {
                    return Err(TranslateError::FetchShaderCallOutsideVertex {
                        stage: walk.stage.name(),
                    });
                }
                if walk.calls_fs {
                    return Err(TranslateError::DuplicateFetchShaderCall { cf_pc: walk.cf_pc });
                }
                if walk.cf_pc != 0 {
                    return Err(TranslateError::FetchShaderCallNotFirst { cf_pc: walk.cf_pc });
                }
            }
            CfInst::Return => {
                if !walk.is_function {
                    return Err(TranslateError::ReturnOutsideFunction { cf_pc: walk.cf_pc });
                }
            }
            _ => {}
        }

        let handler = self
            .cf_handler(inst)
            .ok_or_else(|| unimplemented(CfInst::KIND, inst.name()))?;
        handler(self, cf)?;

        let walk = self.walk_mut();
        match inst {
            CfInst::CallFs => walk.calls_fs = true,
            CfInst::Return => walk.reached_eop = true,
            _ => {}
        }
        if cf.end_of_program() {
            walk.reached_eop = true;
        }
        Ok(())
    }

    fn translate_cf_export(&mut self, cf: &ControlFlowInst) -> Result<(), TranslateError> {
        let inst = cf.exp_inst()?;
        let handler = self
            .exp_handler(inst)
            .ok_or_else(|| unimplemented(CfExpInst::KIND, inst.name()))?;
        handler(self, cf)?;

        if cf.end_of_program() {
            self.walk_mut().reached_eop = true;
        }
        Ok(())
    }

    fn translate_cf_alu(&mut self, cf: &ControlFlowInst) -> Result<(), TranslateError> {
        let inst = cf.alu_inst()?;
        let handler = self
            .cf_alu_handler(inst)
            .ok_or_else(|| unimplemented(CfAluInst::KIND, inst.name()))?;
        handler(self, cf)
    }

    fn translate_tex_clause(&mut self, cf: &ControlFlowInst) -> Result<(), TranslateError> {
        let insts = self.walk().binary.tex_clause(cf.addr(), cf.count())?;
        for inst in &insts {
            let op = inst.tex_inst()?;
            let handler = self
                .tex_handler(op)
                .ok_or_else(|| unimplemented(TexInst::KIND, op.name()))?;
            handler(self, cf, inst)?;
        }
        Ok(())
    }

    fn translate_vtx_clause(&mut self, cf: &ControlFlowInst) -> Result<(), TranslateError> {
        let insts = self.walk().binary.vtx_clause(cf.addr(), cf.count())?;
        for inst in &insts {
            let op = inst.vtx_inst()?;
            let handler = self
                .vtx_handler(op)
                .ok_or_else(|| unimplemented(VtxInst::KIND, op.name()))?;
            handler(self, cf, inst)?;
        }
        Ok(())
    }

    fn translate_alu_clause(&mut self, cf: &ControlFlowInst) -> Result<(), TranslateError> {
        let slots = self.walk().binary.alu_clause(cf.alu_addr(), cf.alu_count())?;
        let mut parser = AluClauseParser::new(&slots);
        while !parser.is_end_of_clause() {
            let group = parser.read_group()?;
            self.translate_alu_group(cf, &group)?;
        }
        Ok(())
    }

    fn translate_alu_group(
        &mut self,
        cf: &ControlFlowInst,
        group: &AluInstructionGroup,
    ) -> Result<(), TranslateError> {
        trace!("ALU group {}: {} lane(s)", self.walk().group_pc, group.len());
        self.begin_alu_group(cf, group)?;

        let mut first_unit = 0;
        if let Some(first) = group.unit(AluUnit::X) {
            if first.opcode()?.is_reduction() {
                check_reduction_group(group, first)?;
                self.translate_alu_inst(cf, group, AluTarget::Reduction, first)?;
                // Lanes X..W were consumed by the reduction
                first_unit = 4;
            }
        }

        for &unit in &AluUnit::ALL[first_unit..] {
            let Some(inst) = group.unit(unit) else {
                continue;
            };
            let opcode = inst.opcode()?;
            if opcode.is_reduction() {
                return Err(TranslateError::MisplacedReduction {
                    name: opcode.name(),
                    unit: unit.index(),
                });
            }
            self.translate_alu_inst(cf, group, AluTarget::Unit(unit), inst)?;
        }

        self.end_alu_group(cf, group)?;
        self.walk_mut().group_pc += 1;
        Ok(())
    }

    fn translate_alu_inst(
        &mut self,
        cf: &ControlFlowInst,
        group: &AluInstructionGroup,
        target: AluTarget,
        inst: &AluInst,
    ) -> Result<(), TranslateError> {
        let handler = match inst.opcode()? {
            AluOpcode::Op2(op) => self
                .alu_op2_handler(op)
                .ok_or_else(|| unimplemented(AluOp2::KIND, op.name()))?,
            AluOpcode::Op3(op) => self
                .alu_op3_handler(op)
                .ok_or_else(|| unimplemented(AluOp3::KIND, op.name()))?,
        };
        handler(self, cf, group, target, inst)
    }
}

/// Lanes X..W of a reduction must agree on opcode, clamp and (for OP2)
/// output modifier
fn check_reduction_group(group: &AluInstructionGroup, first: &AluInst) -> Result<(), TranslateError> {
    let opcode = first.opcode()?;
    for unit in [AluUnit::Y, AluUnit::Z, AluUnit::W] {
        let mismatch = |field| TranslateError::ReductionMismatch {
            field,
            unit: unit.index(),
        };
        let inst = group.unit(unit).ok_or_else(|| mismatch("opcode"))?;
        if inst.opcode()? != opcode {
            return Err(mismatch("opcode"));
        }
        if matches!(opcode, AluOpcode::Op2(_)) && inst.omod() != first.omod() {
            return Err(mismatch("output modifier"));
        }
        if inst.clamp() != first.clamp() {
            return Err(mismatch("clamp"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lt_microcode::builder::{AluBuilder, CfBuilder, ProgramBuilder};
    use lt_microcode::fields::alu_word0;
    use lt_microcode::{Chan, OutputModifier};

    /// Records dispatches without emitting anything
    struct Recorder<'a> {
        walk: WalkState<'a>,
        calls: Vec<String>,
    }

    impl<'a> Recorder<'a> {
        fn new(binary: &'a [u8], stage: ShaderType, is_function: bool) -> Self {
            Self {
                walk: WalkState::new(binary, stage, is_function),
                calls: Vec::new(),
            }
        }
    }

    fn record_cf(r: &mut Recorder<'_>, cf: &ControlFlowInst) -> Result<(), TranslateError> {
        r.calls.push(format!("cf {:?}", cf.cf_inst()?));
        Ok(())
    }

    fn record_alu(
        r: &mut Recorder<'_>,
        _cf: &ControlFlowInst,
        _group: &AluInstructionGroup,
        target: AluTarget,
        inst: &AluInst,
    ) -> Result<(), TranslateError> {
        r.calls.push(format!("{:?} {}", target, inst.opcode()?));
        Ok(())
    }

    impl<'a> ShaderParser<'a> for Recorder<'a> {
        fn walk(&self) -> &WalkState<'a> {
            &self.walk
        }

        fn walk_mut(&mut self) -> &mut WalkState<'a> {
            &mut self.walk
        }

        fn cf_handler(&self, inst: CfInst) -> Option<CfHandler<Self>> {
            let handler: CfHandler<Self> = match inst {
                CfInst::Nop | CfInst::CallFs | CfInst::Return => record_cf,
                _ => return None,
            };
            Some(handler)
        }

        fn cf_alu_handler(&self, inst: CfAluInst) -> Option<CfHandler<Self>> {
            let handler: CfHandler<Self> = match inst {
                CfAluInst::Alu => Self::translate_alu_clause,
                _ => return None,
            };
            Some(handler)
        }

        fn alu_op2_handler(&self, op: AluOp2) -> Option<AluHandler<Self>> {
            let handler: AluHandler<Self> = match op {
                AluOp2::Mov | AluOp2::Dot4 | AluOp2::RecipIeee => record_alu,
                _ => return None,
            };
            Some(handler)
        }
    }

    fn dot4_lanes() -> Vec<AluInst> {
        Chan::ALL
            .iter()
            .map(|&chan| AluBuilder::op2(AluOp2::Dot4).dst(1, chan).build())
            .collect()
    }

    fn alu_program(mut slots: Vec<AluInst>) -> Vec<u8> {
        if let Some(last) = slots.last_mut() {
            *last = AluInst::new(alu_word0::LAST.set(last.word0, 1), last.word1);
        }
        ProgramBuilder::new()
            .alu_clause(CfBuilder::alu(CfAluInst::Alu), slots)
            .cf(CfBuilder::normal(CfInst::Nop).end_of_program())
            .build()
    }

    #[test]
    fn test_stops_at_end_of_program() {
        let bytes = ProgramBuilder::new()
            .cf(CfBuilder::normal(CfInst::Nop).end_of_program())
            .cf(CfBuilder::normal(CfInst::Jump))
            .build();
        let mut parser = Recorder::new(&bytes, ShaderType::Pixel, false);
        parser.translate().unwrap();
        assert_eq!(parser.walk.status, TranslationStatus::Completed);
        assert_eq!(parser.walk.cf_pc, 1);
        assert_eq!(parser.calls, ["cf Nop"]);
    }

    #[test]
    fn test_exhaustion_completes() {
        let bytes = ProgramBuilder::new().cf(CfBuilder::normal(CfInst::Nop)).build();
        let mut parser = Recorder::new(&bytes, ShaderType::Pixel, false);
        parser.translate().unwrap();
        assert_eq!(parser.walk.status, TranslationStatus::Completed);
        assert!(!parser.walk.reached_eop);
    }

    #[test]
    fn test_unimplemented_cf() {
        let bytes = ProgramBuilder::new()
            .cf(CfBuilder::normal(CfInst::LoopStart).end_of_program())
            .build();
        let mut parser = Recorder::new(&bytes, ShaderType::Vertex, false);
        let err = parser.translate().unwrap_err();
        assert_eq!(err.to_string(), "Unimplemented CF NORMAL instruction LOOP_START");
        assert_eq!(parser.walk.status, TranslationStatus::Failed);
    }

    #[test]
    fn test_empty_binary() {
        let mut parser = Recorder::new(&[], ShaderType::Vertex, false);
        assert_eq!(
            parser.translate(),
            Err(TranslateError::Decode(DecodeError::EmptyBinary))
        );
        assert_eq!(parser.walk.status, TranslationStatus::Failed);
    }

    #[test]
    fn test_fetch_must_be_function() {
        let bytes = ProgramBuilder::new()
            .cf(CfBuilder::normal(CfInst::Return))
            .build();
        let mut parser = Recorder::new(&bytes, ShaderType::Fetch, false);
        assert_eq!(parser.translate(), Err(TranslateError::FetchShaderNotFunction));
    }

    #[test]
    fn test_return_sets_eop() {
        let bytes = ProgramBuilder::new()
            .cf(CfBuilder::normal(CfInst::Return))
            .cf(CfBuilder::normal(CfInst::Nop))
            .build();
        let mut parser = Recorder::new(&bytes, ShaderType::Fetch, true);
        parser.translate().unwrap();
        assert!(parser.walk.reached_eop);
        assert_eq!(parser.calls, ["cf Return"]);

        let mut parser = Recorder::new(&bytes, ShaderType::Vertex, false);
        assert_eq!(
            parser.translate(),
            Err(TranslateError::ReturnOutsideFunction { cf_pc: 0 })
        );
    }

    #[test]
    fn test_call_fs_legality() {
        let bytes = ProgramBuilder::new()
            .cf(CfBuilder::normal(CfInst::CallFs))
            .cf(CfBuilder::normal(CfInst::Nop).end_of_program())
            .build();
        let mut parser = Recorder::new(&bytes, ShaderType::Vertex, false);
        parser.translate().unwrap();
        assert!(parser.walk.calls_fs);

        let mut parser = Recorder::new(&bytes, ShaderType::Pixel, false);
        assert_eq!(
            parser.translate(),
            Err(TranslateError::FetchShaderCallOutsideVertex { stage: "pixel" })
        );

        let bytes = ProgramBuilder::new()
            .cf(CfBuilder::normal(CfInst::Nop))
            .cf(CfBuilder::normal(CfInst::CallFs).end_of_program())
            .build();
        let mut parser = Recorder::new(&bytes, ShaderType::Vertex, false);
        assert_eq!(
            parser.translate(),
            Err(TranslateError::FetchShaderCallNotFirst { cf_pc: 1 })
        );

        let bytes = ProgramBuilder::new()
            .cf(CfBuilder::normal(CfInst::CallFs))
            .cf(CfBuilder::normal(CfInst::CallFs).end_of_program())
            .build();
        let mut parser = Recorder::new(&bytes, ShaderType::Vertex, false);
        assert_eq!(
            parser.translate(),
            Err(TranslateError::DuplicateFetchShaderCall { cf_pc: 1 })
        );
    }

    #[test]
    fn test_reduction_collapses_four_lanes() {
        let mut slots = dot4_lanes();
        slots.push(AluBuilder::op2(AluOp2::RecipIeee).dst(2, Chan::X).build());
        let bytes = alu_program(slots);

        let mut parser = Recorder::new(&bytes, ShaderType::Pixel, false);
        parser.translate().unwrap();
        assert_eq!(parser.calls, ["Reduction DOT4", "Unit(T) RECIP_IEEE", "cf Nop"]);
        assert_eq!(parser.walk.group_pc, 1);
    }

    #[test]
    fn test_reduction_mismatch() {
        let mut slots = dot4_lanes();
        slots[2] = AluBuilder::op2(AluOp2::Mov).dst(1, Chan::Z).build();
        let program = alu_program(slots);
        let mut parser = Recorder::new(&program, ShaderType::Pixel, false);
        assert_eq!(
            parser.translate(),
            Err(TranslateError::ReductionMismatch {
                field: "opcode",
                unit: 2
            })
        );

        let mut slots = dot4_lanes();
        slots[1] = AluBuilder::op2(AluOp2::Dot4).dst(1, Chan::Y).clamp().build();
        let program = alu_program(slots);
        let mut parser = Recorder::new(&program, ShaderType::Pixel, false);
        assert_eq!(
            parser.translate(),
            Err(TranslateError::ReductionMismatch {
                field: "clamp",
                unit: 1
            })
        );

        let mut slots = dot4_lanes();
        slots[3] = AluBuilder::op2(AluOp2::Dot4)
            .dst(1, Chan::W)
            .omod(OutputModifier::Mul2)
            .build();
        let program = alu_program(slots);
        let mut parser = Recorder::new(&program, ShaderType::Pixel, false);
        assert_eq!(
            parser.translate(),
            Err(TranslateError::ReductionMismatch {
                field: "output modifier",
                unit: 3
            })
        );
    }

    #[test]
    fn test_misplaced_reduction() {
        let slots = vec![
            AluBuilder::op2(AluOp2::Mov).dst(1, Chan::X).build(),
            AluBuilder::op2(AluOp2::Dot4).dst(1, Chan::Y).build(),
        ];
        let program = alu_program(slots);
        let mut parser = Recorder::new(&program, ShaderType::Pixel, false);
        assert_eq!(
            parser.translate(),
            Err(TranslateError::MisplacedReduction {
                name: "DOT4",
                unit: 1
            })
        );
    }
}
