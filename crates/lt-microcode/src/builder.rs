//! Microcode assembler
//!
//! Encodes instructions through the same field tables the decoder reads and
//! lays out a complete program (CF instructions followed by their clauses).
//! Used to build fixtures for tests and benchmarks.

use crate::fields::{
    alu_word0, alu_word1_op2, alu_word1_op3, cf_alu_word0, cf_alu_word1, cf_exp_word0,
    cf_exp_word1, cf_word0, cf_word1, tex_word0, tex_word1, tex_word2, vtx_word0, vtx_word1,
    vtx_word2,
};
use crate::instructions::{AluInst, ControlFlowInst, TextureFetchInst, VertexFetchInst};
use crate::opcodes::{AluOp2, AluOp3, CfAluInst, CfExpInst, CfInst, TexInst, VtxInst};
use crate::types::{Chan, DataFormat, ExportType, FetchType, KcacheMode, OutputModifier, Sel};

/// Control flow instruction encoder
#[derive(Debug, Clone, Copy)]
pub struct CfBuilder {
    word0: u32,
    word1: u32,
}

impl CfBuilder {
    pub fn normal(inst: CfInst) -> Self {
        Self {
            word0: 0,
            word1: cf_word1::CF_INST.set(0, inst.raw()),
        }
    }

    pub fn alu(inst: CfAluInst) -> Self {
        Self {
            word0: 0,
            word1: cf_alu_word1::CF_INST.set(0, inst.raw()),
        }
    }

    pub fn export(inst: CfExpInst, ty: ExportType, array_base: u32, gpr: u32) -> Self {
        let word0 = cf_exp_word0::ARRAY_BASE.set(0, array_base);
        let word0 = cf_exp_word0::TYPE.set(word0, ty as u32);
        let word0 = cf_exp_word0::RW_GPR.set(word0, gpr);
        let word1 = cf_exp_word1::CF_INST.set(0, inst.raw());
        Self { word0, word1 }.sels([Sel::X, Sel::Y, Sel::Z, Sel::W])
    }

    /// Raw export TYPE, for encoding reserved values
    pub fn export_type_raw(mut self, ty: u32) -> Self {
        self.word0 = cf_exp_word0::TYPE.set(self.word0, ty);
        self
    }

    pub fn end_of_program(mut self) -> Self {
        // Same bit in the normal and export encodings
        self.word1 = cf_word1::END_OF_PROGRAM.set(self.word1, 1);
        self
    }

    pub fn addr(mut self, addr: u32) -> Self {
        self.word0 = cf_word0::ADDR.set(self.word0, addr);
        self
    }

    /// Fetch clause instruction count (1..=15)
    pub fn count(mut self, count: u32) -> Self {
        let (low, high) = if count > 8 { (count - 9, 1) } else { (count.saturating_sub(1), 0) };
        self.word1 = cf_word1::COUNT.set(self.word1, low);
        self.word1 = cf_word1::COUNT_3.set(self.word1, high);
        self
    }

    pub fn alu_addr(mut self, addr: u32) -> Self {
        self.word0 = cf_alu_word0::ADDR.set(self.word0, addr);
        self
    }

    /// ALU clause slot count (1..=128)
    pub fn alu_count(mut self, count: u32) -> Self {
        self.word1 = cf_alu_word1::COUNT.set(self.word1, count.saturating_sub(1));
        self
    }

    pub fn kcache(mut self, bank: usize, buffer: u32, mode: KcacheMode, addr: u32) -> Self {
        if bank == 0 {
            self.word0 = cf_alu_word0::KCACHE_BANK0.set(self.word0, buffer);
            self.word0 = cf_alu_word0::KCACHE_MODE0.set(self.word0, mode as u32);
            self.word1 = cf_alu_word1::KCACHE_ADDR0.set(self.word1, addr);
        } else {
            self.word0 = cf_alu_word0::KCACHE_BANK1.set(self.word0, buffer);
            self.word1 = cf_alu_word1::KCACHE_MODE1.set(self.word1, mode as u32);
            self.word1 = cf_alu_word1::KCACHE_ADDR1.set(self.word1, addr);
        }
        self
    }

    pub fn sels(mut self, sels: [Sel; 4]) -> Self {
        self.word1 = cf_exp_word1::SEL_X.set(self.word1, sels[0] as u32);
        self.word1 = cf_exp_word1::SEL_Y.set(self.word1, sels[1] as u32);
        self.word1 = cf_exp_word1::SEL_Z.set(self.word1, sels[2] as u32);
        self.word1 = cf_exp_word1::SEL_W.set(self.word1, sels[3] as u32);
        self
    }

    /// Number of consecutive registers exported (1..=16)
    pub fn burst(mut self, count: u32) -> Self {
        self.word1 = cf_exp_word1::BURST_COUNT.set(self.word1, count.saturating_sub(1));
        self
    }

    pub fn build(self) -> ControlFlowInst {
        ControlFlowInst::new(self.word0, self.word1)
    }
}

/// ALU instruction encoder
#[derive(Debug, Clone, Copy)]
pub struct AluBuilder {
    word0: u32,
    word1: u32,
    op3: bool,
}

impl AluBuilder {
    /// Two-operand instruction, GPR write enabled
    pub fn op2(op: AluOp2) -> Self {
        let word1 = alu_word1_op2::ALU_INST.set(0, op.raw());
        let word1 = alu_word1_op2::WRITE_MASK.set(word1, 1);
        Self {
            word0: 0,
            word1,
            op3: false,
        }
    }

    pub fn op3(op: AluOp3) -> Self {
        Self {
            word0: 0,
            word1: alu_word1_op3::ALU_INST.set(0, op.raw()),
            op3: true,
        }
    }

    pub fn dst(mut self, gpr: u32, chan: Chan) -> Self {
        self.word1 = alu_word1_op2::DST_GPR.set(self.word1, gpr);
        self.word1 = alu_word1_op2::DST_CHAN.set(self.word1, chan as u32);
        self
    }

    pub fn dst_rel(mut self) -> Self {
        self.word1 = alu_word1_op2::DST_REL.set(self.word1, 1);
        self
    }

    pub fn src(mut self, n: usize, sel: u32, chan: Chan) -> Self {
        match n {
            0 => {
                self.word0 = alu_word0::SRC0_SEL.set(self.word0, sel);
                self.word0 = alu_word0::SRC0_CHAN.set(self.word0, chan as u32);
            }
            1 => {
                self.word0 = alu_word0::SRC1_SEL.set(self.word0, sel);
                self.word0 = alu_word0::SRC1_CHAN.set(self.word0, chan as u32);
            }
            _ => {
                self.word1 = alu_word1_op3::SRC2_SEL.set(self.word1, sel);
                self.word1 = alu_word1_op3::SRC2_CHAN.set(self.word1, chan as u32);
            }
        }
        self
    }

    pub fn src_rel(mut self, n: usize, index_mode: u32) -> Self {
        self.word0 = alu_word0::INDEX_MODE.set(self.word0, index_mode);
        match n {
            0 => self.word0 = alu_word0::SRC0_REL.set(self.word0, 1),
            1 => self.word0 = alu_word0::SRC1_REL.set(self.word0, 1),
            _ => self.word1 = alu_word1_op3::SRC2_REL.set(self.word1, 1),
        }
        self
    }

    pub fn neg(mut self, n: usize) -> Self {
        match n {
            0 => self.word0 = alu_word0::SRC0_NEG.set(self.word0, 1),
            1 => self.word0 = alu_word0::SRC1_NEG.set(self.word0, 1),
            _ => self.word1 = alu_word1_op3::SRC2_NEG.set(self.word1, 1),
        }
        self
    }

    /// Absolute value modifier (OP2 sources 0 and 1 only)
    pub fn abs(mut self, n: usize) -> Self {
        if !self.op3 {
            match n {
                0 => self.word1 = alu_word1_op2::SRC0_ABS.set(self.word1, 1),
                _ => self.word1 = alu_word1_op2::SRC1_ABS.set(self.word1, 1),
            }
        }
        self
    }

    pub fn write(mut self, enabled: bool) -> Self {
        if !self.op3 {
            self.word1 = alu_word1_op2::WRITE_MASK.set(self.word1, enabled as u32);
        }
        self
    }

    pub fn clamp(mut self) -> Self {
        self.word1 = alu_word1_op2::CLAMP.set(self.word1, 1);
        self
    }

    pub fn omod(mut self, omod: OutputModifier) -> Self {
        if !self.op3 {
            self.word1 = alu_word1_op2::OMOD.set(self.word1, omod as u32);
        }
        self
    }

    pub fn last(mut self) -> Self {
        self.word0 = alu_word0::LAST.set(self.word0, 1);
        self
    }

    pub fn build(self) -> AluInst {
        AluInst::new(self.word0, self.word1)
    }
}

/// Texture fetch encoder; coordinates default to normalized
#[derive(Debug, Clone, Copy)]
pub struct TexBuilder {
    inst: TextureFetchInst,
}

impl TexBuilder {
    pub fn new(op: TexInst, resource_id: u32, sampler_id: u32) -> Self {
        let word0 = tex_word0::TEX_INST.set(0, op.raw());
        let word0 = tex_word0::RESOURCE_ID.set(word0, resource_id);
        let word1 = [
            tex_word1::COORD_TYPE_X,
            tex_word1::COORD_TYPE_Y,
            tex_word1::COORD_TYPE_Z,
            tex_word1::COORD_TYPE_W,
        ]
        .iter()
        .fold(0, |word, field| field.set(word, 1));
        let word2 = tex_word2::SAMPLER_ID.set(0, sampler_id);
        Self {
            inst: TextureFetchInst {
                word0,
                word1,
                word2,
                padding: 0,
            },
        }
        .src(0, [Sel::X, Sel::Y, Sel::Z, Sel::W])
        .dst(0, [Sel::X, Sel::Y, Sel::Z, Sel::W])
    }

    pub fn src(mut self, gpr: u32, sels: [Sel; 4]) -> Self {
        let w = &mut self.inst;
        w.word0 = tex_word0::SRC_GPR.set(w.word0, gpr);
        w.word2 = tex_word2::SRC_SEL_X.set(w.word2, sels[0] as u32);
        w.word2 = tex_word2::SRC_SEL_Y.set(w.word2, sels[1] as u32);
        w.word2 = tex_word2::SRC_SEL_Z.set(w.word2, sels[2] as u32);
        w.word2 = tex_word2::SRC_SEL_W.set(w.word2, sels[3] as u32);
        self
    }

    pub fn dst(mut self, gpr: u32, sels: [Sel; 4]) -> Self {
        let w = &mut self.inst;
        w.word1 = tex_word1::DST_GPR.set(w.word1, gpr);
        w.word1 = tex_word1::DST_SEL_X.set(w.word1, sels[0] as u32);
        w.word1 = tex_word1::DST_SEL_Y.set(w.word1, sels[1] as u32);
        w.word1 = tex_word1::DST_SEL_Z.set(w.word1, sels[2] as u32);
        w.word1 = tex_word1::DST_SEL_W.set(w.word1, sels[3] as u32);
        self
    }

    /// Signed texel offsets, truncated to 5 bits
    pub fn offset(mut self, x: i32, y: i32, z: i32) -> Self {
        let w = &mut self.inst;
        w.word2 = tex_word2::OFFSET_X.set(w.word2, x as u32);
        w.word2 = tex_word2::OFFSET_Y.set(w.word2, y as u32);
        w.word2 = tex_word2::OFFSET_Z.set(w.word2, z as u32);
        self
    }

    pub fn unnormalized(mut self, chan: Chan) -> Self {
        let field = match chan {
            Chan::X => tex_word1::COORD_TYPE_X,
            Chan::Y => tex_word1::COORD_TYPE_Y,
            Chan::Z => tex_word1::COORD_TYPE_Z,
            Chan::W => tex_word1::COORD_TYPE_W,
        };
        self.inst.word1 = field.set(self.inst.word1, 0);
        self
    }

    pub fn frac_mode(mut self) -> Self {
        self.inst.word0 = tex_word0::BC_FRAC_MODE.set(self.inst.word0, 1);
        self
    }

    pub fn build(self) -> TextureFetchInst {
        self.inst
    }
}

/// Vertex fetch encoder
#[derive(Debug, Clone, Copy)]
pub struct VtxBuilder {
    inst: VertexFetchInst,
}

impl VtxBuilder {
    pub fn new(op: VtxInst, buffer_id: u32) -> Self {
        let word0 = vtx_word0::VTX_INST.set(0, op.raw());
        let word0 = vtx_word0::BUFFER_ID.set(word0, buffer_id);
        let word0 = vtx_word0::SRC_SEL_X.set(word0, Sel::X as u32);
        let word1 = vtx_word1::DATA_FORMAT.set(0, DataFormat::Fmt32_32_32_32Float as u32);
        Self {
            inst: VertexFetchInst {
                word0,
                word1,
                word2: 0,
                padding: 0,
            },
        }
        .dst_sels([Sel::X, Sel::Y, Sel::Z, Sel::W])
    }

    /// SEMANTIC fetch for semantic table entry `id`
    pub fn semantic(buffer_id: u32, id: u32) -> Self {
        let mut builder = Self::new(VtxInst::Semantic, buffer_id);
        builder.inst.word1 = vtx_word1::SEMANTIC_ID.set(builder.inst.word1, id);
        builder
    }

    pub fn dst_sels(mut self, sels: [Sel; 4]) -> Self {
        let w = &mut self.inst;
        w.word1 = vtx_word1::DST_SEL_X.set(w.word1, sels[0] as u32);
        w.word1 = vtx_word1::DST_SEL_Y.set(w.word1, sels[1] as u32);
        w.word1 = vtx_word1::DST_SEL_Z.set(w.word1, sels[2] as u32);
        w.word1 = vtx_word1::DST_SEL_W.set(w.word1, sels[3] as u32);
        self
    }

    pub fn fetch_type(mut self, ty: FetchType) -> Self {
        self.inst.word0 = vtx_word0::FETCH_TYPE.set(self.inst.word0, ty as u32);
        self
    }

    /// Index source; W selects per-instance stepping for instance data
    pub fn src_sel_x(mut self, sel: Sel) -> Self {
        self.inst.word0 = vtx_word0::SRC_SEL_X.set(self.inst.word0, sel as u32);
        self
    }

    pub fn data_format(mut self, format: DataFormat) -> Self {
        self.inst.word1 = vtx_word1::DATA_FORMAT.set(self.inst.word1, format as u32);
        self
    }

    pub fn data_format_raw(mut self, format: u32) -> Self {
        self.inst.word1 = vtx_word1::DATA_FORMAT.set(self.inst.word1, format);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.inst.word2 = vtx_word2::OFFSET.set(self.inst.word2, offset);
        self
    }

    pub fn build(self) -> VertexFetchInst {
        self.inst
    }
}

enum Clause {
    Alu(Vec<AluInst>),
    Tex(Vec<TextureFetchInst>),
    Vtx(Vec<VertexFetchInst>),
}

/// Lays out a program: CF instructions first, then each clause in order,
/// patching clause addresses and counts into the owning CF instruction
#[derive(Default)]
pub struct ProgramBuilder {
    cf: Vec<(CfBuilder, Option<usize>)>,
    clauses: Vec<Clause>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cf(mut self, cf: CfBuilder) -> Self {
        self.cf.push((cf, None));
        self
    }

    /// ALU clause; `slots` holds instructions and literal slots in order
    pub fn alu_clause(mut self, cf: CfBuilder, slots: Vec<AluInst>) -> Self {
        self.push_clause(cf, Clause::Alu(slots));
        self
    }

    pub fn tex_clause(mut self, cf: CfBuilder, insts: Vec<TextureFetchInst>) -> Self {
        self.push_clause(cf, Clause::Tex(insts));
        self
    }

    pub fn vtx_clause(mut self, cf: CfBuilder, insts: Vec<VertexFetchInst>) -> Self {
        self.push_clause(cf, Clause::Vtx(insts));
        self
    }

    fn push_clause(&mut self, cf: CfBuilder, clause: Clause) {
        self.cf.push((cf, Some(self.clauses.len())));
        self.clauses.push(clause);
    }

    pub fn build(self) -> Vec<u8> {
        let cf_bytes = self.cf.len() * ControlFlowInst::SIZE;
        let mut clause_bytes: Vec<u8> = Vec::new();
        let mut placements = Vec::with_capacity(self.clauses.len());

        for clause in &self.clauses {
            // Fetch clauses must start on a 16-byte boundary
            if !matches!(clause, Clause::Alu(_)) && (cf_bytes + clause_bytes.len()) % 16 != 0 {
                clause_bytes.extend_from_slice(&[0u8; 8]);
            }
            let addr = ((cf_bytes + clause_bytes.len()) / 8) as u32;
            let count = match clause {
                Clause::Alu(slots) => {
                    for slot in slots {
                        push_words(&mut clause_bytes, &[slot.word0, slot.word1]);
                    }
                    slots.len()
                }
                Clause::Tex(insts) => {
                    for inst in insts {
                        push_words(&mut clause_bytes, &[inst.word0, inst.word1, inst.word2, inst.padding]);
                    }
                    insts.len()
                }
                Clause::Vtx(insts) => {
                    for inst in insts {
                        push_words(&mut clause_bytes, &[inst.word0, inst.word1, inst.word2, inst.padding]);
                    }
                    insts.len()
                }
            };
            placements.push((addr, count as u32));
        }

        let mut out = Vec::with_capacity(cf_bytes + clause_bytes.len());
        for (cf, clause) in self.cf {
            let cf = match clause {
                Some(index) => {
                    let (addr, count) = placements[index];
                    match self.clauses[index] {
                        Clause::Alu(_) => cf.alu_addr(addr).alu_count(count),
                        Clause::Tex(_) | Clause::Vtx(_) => cf.addr(addr).count(count),
                    }
                }
                None => cf,
            };
            out.extend_from_slice(&cf.build().to_le_bytes());
        }
        out.extend_from_slice(&clause_bytes);
        out
    }
}

fn push_words(out: &mut Vec<u8>, words: &[u32]) {
    for word in words {
        out.extend_from_slice(&word.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::ShaderBinary;
    use crate::types::CfInstType;

    #[test]
    fn test_program_layout() {
        let bytes = ProgramBuilder::new()
            .alu_clause(
                CfBuilder::alu(CfAluInst::Alu),
                vec![AluBuilder::op2(AluOp2::Mov).dst(1, Chan::X).last().build()],
            )
            .tex_clause(
                CfBuilder::normal(CfInst::Tex),
                vec![TexBuilder::new(TexInst::Sample, 3, 1).build()],
            )
            .cf(CfBuilder::normal(CfInst::Nop).end_of_program())
            .build();

        let binary = ShaderBinary::new(&bytes);
        let alu = binary.cf_at(0).unwrap();
        assert_eq!(alu.inst_type(), CfInstType::Alu);
        assert_eq!(alu.alu_addr(), 3);
        assert_eq!(alu.alu_count(), 1);
        assert_eq!(binary.alu_clause(3, 1).unwrap()[0].dst_gpr(), 1);

        let tex = binary.cf_at(1).unwrap();
        assert_eq!(tex.addr(), 4);
        assert_eq!(tex.count(), 1);
        let fetch = binary.tex_clause(tex.addr(), tex.count()).unwrap();
        assert_eq!(fetch[0].resource_id(), 3);
        assert_eq!(fetch[0].sampler_id(), 1);

        assert!(binary.cf_at(2).unwrap().end_of_program());
    }

    #[test]
    fn test_fetch_clause_alignment() {
        let bytes = ProgramBuilder::new()
            .vtx_clause(
                CfBuilder::normal(CfInst::Vtx),
                vec![VtxBuilder::semantic(160, 0).build()],
            )
            .cf(CfBuilder::normal(CfInst::Return).end_of_program())
            .build();

        // Two CF slots are 16 bytes, so no padding is needed
        let binary = ShaderBinary::new(&bytes);
        assert_eq!(binary.cf_at(0).unwrap().addr(), 2);

        let bytes = ProgramBuilder::new()
            .vtx_clause(
                CfBuilder::normal(CfInst::Vtx),
                vec![VtxBuilder::semantic(160, 0).build()],
            )
            .build();
        let binary = ShaderBinary::new(&bytes);
        assert_eq!(binary.cf_at(0).unwrap().addr(), 2);
        assert_eq!(binary.len(), 32);
    }

    #[test]
    fn test_fetch_count_encoding() {
        for count in 1..=15 {
            let cf = CfBuilder::normal(CfInst::Vtx).count(count).build();
            assert_eq!(cf.count(), count);
        }
    }

    #[test]
    fn test_export_encoding() {
        let cf = CfBuilder::export(CfExpInst::ExpDone, ExportType::Param, 2, 5)
            .burst(3)
            .end_of_program()
            .build();
        assert_eq!(cf.inst_type(), CfInstType::Export);
        assert_eq!(cf.exp_inst(), Ok(CfExpInst::ExpDone));
        assert_eq!(cf.exp_type(), ExportType::Param as u32);
        assert_eq!(cf.exp_array_base(), 2);
        assert_eq!(cf.exp_rw_gpr(), 5);
        assert_eq!(cf.exp_burst_count(), 3);
        assert_eq!(cf.exp_sels(), [Sel::X, Sel::Y, Sel::Z, Sel::W]);
        assert!(cf.end_of_program());
    }
}
