//! Typed views over raw instruction words
//!
//! Each view is a `#[repr(C)]` Pod struct of little-endian words. Accessors
//! decode individual fields through the tables in [`crate::fields`].

use bytemuck::{Pod, Zeroable};
use lt_core::DecodeError;

use crate::fields::{
    alu_word0, alu_word1_op2, alu_word1_op3, cf_alu_word0, cf_alu_word1, cf_exp_word0,
    cf_exp_word1, cf_word0, cf_word1, tex_word0, tex_word1, tex_word2, vtx_word0, vtx_word1,
    vtx_word2,
};
use crate::opcodes::{AluOp2, AluOp3, AluOpcode, CfAluInst, CfExpInst, CfInst, TexInst, VtxInst};
use crate::types::{
    AluEncoding, CfInstType, Chan, KcacheMode, OutputModifier, Sel, TexCoordType,
};

/// Control flow instruction (8 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ControlFlowInst {
    pub word0: u32,
    pub word1: u32,
}

impl ControlFlowInst {
    pub const SIZE: usize = 8;

    pub fn new(word0: u32, word1: u32) -> Self {
        Self { word0, word1 }
    }

    /// Decode from `SIZE` little-endian bytes
    pub fn from_le_bytes(bytes: &[u8]) -> Self {
        let raw: Self = bytemuck::pod_read_unaligned(bytes);
        Self {
            word0: u32::from_le(raw.word0),
            word1: u32::from_le(raw.word1),
        }
    }

    pub fn to_le_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..4].copy_from_slice(&self.word0.to_le_bytes());
        out[4..].copy_from_slice(&self.word1.to_le_bytes());
        out
    }

    pub fn inst_type(&self) -> CfInstType {
        CfInstType::from(cf_word1::CF_INST_TYPE.get(self.word1))
    }

    // Normal view

    pub fn cf_inst(&self) -> Result<CfInst, DecodeError> {
        let id = cf_word1::CF_INST.get(self.word1);
        CfInst::from_raw(id).ok_or(DecodeError::UnexpectedOpcode {
            kind: CfInst::KIND,
            id,
        })
    }

    pub fn addr(&self) -> u32 {
        cf_word0::ADDR.get(self.word0)
    }

    /// Number of fetch instructions in a TEX/VTX clause
    pub fn count(&self) -> u32 {
        (cf_word1::COUNT.get(self.word1) + 1) | (cf_word1::COUNT_3.get(self.word1) << 3)
    }

    pub fn pop_count(&self) -> u32 {
        cf_word1::POP_COUNT.get(self.word1)
    }

    pub fn end_of_program(&self) -> bool {
        cf_word1::END_OF_PROGRAM.get_bool(self.word1)
    }

    pub fn barrier(&self) -> bool {
        cf_word1::BARRIER.get_bool(self.word1)
    }

    // ALU view

    pub fn alu_inst(&self) -> Result<CfAluInst, DecodeError> {
        let id = cf_alu_word1::CF_INST.get(self.word1);
        CfAluInst::from_raw(id).ok_or(DecodeError::UnexpectedOpcode {
            kind: CfAluInst::KIND,
            id,
        })
    }

    pub fn alu_addr(&self) -> u32 {
        cf_alu_word0::ADDR.get(self.word0)
    }

    /// Number of ALU slots (instructions and literals) in the clause
    pub fn alu_count(&self) -> u32 {
        cf_alu_word1::COUNT.get(self.word1) + 1
    }

    /// Constant buffer locked into kcache bank 0 or 1
    pub fn kcache_bank(&self, bank: usize) -> u32 {
        match bank {
            0 => cf_alu_word0::KCACHE_BANK0.get(self.word0),
            _ => cf_alu_word0::KCACHE_BANK1.get(self.word0),
        }
    }

    pub fn kcache_mode(&self, bank: usize) -> KcacheMode {
        match bank {
            0 => KcacheMode::from(cf_alu_word0::KCACHE_MODE0.get(self.word0)),
            _ => KcacheMode::from(cf_alu_word1::KCACHE_MODE1.get(self.word1)),
        }
    }

    /// Start of the locked window, in units of 16 constants
    pub fn kcache_addr(&self, bank: usize) -> u32 {
        match bank {
            0 => cf_alu_word1::KCACHE_ADDR0.get(self.word1),
            _ => cf_alu_word1::KCACHE_ADDR1.get(self.word1),
        }
    }

    // Export view

    pub fn exp_inst(&self) -> Result<CfExpInst, DecodeError> {
        let id = cf_exp_word1::CF_INST.get(self.word1);
        CfExpInst::from_raw(id).ok_or(DecodeError::UnexpectedOpcode {
            kind: CfExpInst::KIND,
            id,
        })
    }

    pub fn exp_array_base(&self) -> u32 {
        cf_exp_word0::ARRAY_BASE.get(self.word0)
    }

    pub fn exp_type(&self) -> u32 {
        cf_exp_word0::TYPE.get(self.word0)
    }

    pub fn exp_rw_gpr(&self) -> u32 {
        cf_exp_word0::RW_GPR.get(self.word0)
    }

    pub fn exp_rw_rel(&self) -> bool {
        cf_exp_word0::RW_REL.get_bool(self.word0)
    }

    pub fn exp_index_gpr(&self) -> u32 {
        cf_exp_word0::INDEX_GPR.get(self.word0)
    }

    pub fn exp_elem_size(&self) -> u32 {
        cf_exp_word0::ELEM_SIZE.get(self.word0)
    }

    pub fn exp_sels(&self) -> [Sel; 4] {
        [
            Sel::from(cf_exp_word1::SEL_X.get(self.word1)),
            Sel::from(cf_exp_word1::SEL_Y.get(self.word1)),
            Sel::from(cf_exp_word1::SEL_Z.get(self.word1)),
            Sel::from(cf_exp_word1::SEL_W.get(self.word1)),
        ]
    }

    /// Number of consecutive registers written by the export
    pub fn exp_burst_count(&self) -> u32 {
        cf_exp_word1::BURST_COUNT.get(self.word1) + 1
    }
}

/// One ALU source operand, decoded from whichever word holds it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluSource {
    pub sel: u32,
    pub rel: bool,
    pub chan: Chan,
    pub neg: bool,
    pub abs: bool,
}

/// ALU instruction (8 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct AluInst {
    pub word0: u32,
    pub word1: u32,
}

impl AluInst {
    pub const SIZE: usize = 8;

    pub fn new(word0: u32, word1: u32) -> Self {
        Self { word0, word1 }
    }

    pub fn from_le_bytes(bytes: &[u8]) -> Self {
        let raw: Self = bytemuck::pod_read_unaligned(bytes);
        Self {
            word0: u32::from_le(raw.word0),
            word1: u32::from_le(raw.word1),
        }
    }

    pub fn encoding(&self) -> AluEncoding {
        if alu_word1_op2::ENCODING.get(self.word1) == 0 {
            AluEncoding::Op2
        } else {
            AluEncoding::Op3
        }
    }

    pub fn opcode(&self) -> Result<AluOpcode, DecodeError> {
        match self.encoding() {
            AluEncoding::Op2 => {
                let id = alu_word1_op2::ALU_INST.get(self.word1);
                AluOp2::from_raw(id)
                    .map(AluOpcode::Op2)
                    .ok_or(DecodeError::UnexpectedOpcode {
                        kind: AluOp2::KIND,
                        id,
                    })
            }
            AluEncoding::Op3 => {
                let id = alu_word1_op3::ALU_INST.get(self.word1);
                AluOp3::from_raw(id)
                    .map(AluOpcode::Op3)
                    .ok_or(DecodeError::UnexpectedOpcode {
                        kind: AluOp3::KIND,
                        id,
                    })
            }
        }
    }

    pub fn num_srcs(&self) -> usize {
        match self.encoding() {
            AluEncoding::Op2 => 2,
            AluEncoding::Op3 => 3,
        }
    }

    /// Source operand `n` (0..=1 for OP2, 0..=2 for OP3)
    pub fn src(&self, n: usize) -> AluSource {
        let op2 = self.encoding() == AluEncoding::Op2;
        match n {
            0 => AluSource {
                sel: alu_word0::SRC0_SEL.get(self.word0),
                rel: alu_word0::SRC0_REL.get_bool(self.word0),
                chan: Chan::from(alu_word0::SRC0_CHAN.get(self.word0)),
                neg: alu_word0::SRC0_NEG.get_bool(self.word0),
                abs: op2 && alu_word1_op2::SRC0_ABS.get_bool(self.word1),
            },
            1 => AluSource {
                sel: alu_word0::SRC1_SEL.get(self.word0),
                rel: alu_word0::SRC1_REL.get_bool(self.word0),
                chan: Chan::from(alu_word0::SRC1_CHAN.get(self.word0)),
                neg: alu_word0::SRC1_NEG.get_bool(self.word0),
                abs: op2 && alu_word1_op2::SRC1_ABS.get_bool(self.word1),
            },
            _ => AluSource {
                sel: alu_word1_op3::SRC2_SEL.get(self.word1),
                rel: alu_word1_op3::SRC2_REL.get_bool(self.word1),
                chan: Chan::from(alu_word1_op3::SRC2_CHAN.get(self.word1)),
                neg: alu_word1_op3::SRC2_NEG.get_bool(self.word1),
                abs: false,
            },
        }
    }

    pub fn index_mode(&self) -> u32 {
        alu_word0::INDEX_MODE.get(self.word0)
    }

    pub fn pred_sel(&self) -> u32 {
        alu_word0::PRED_SEL.get(self.word0)
    }

    pub fn last(&self) -> bool {
        alu_word0::LAST.get_bool(self.word0)
    }

    pub fn dst_gpr(&self) -> u32 {
        alu_word1_op2::DST_GPR.get(self.word1)
    }

    pub fn dst_rel(&self) -> bool {
        alu_word1_op2::DST_REL.get_bool(self.word1)
    }

    pub fn dst_chan(&self) -> Chan {
        Chan::from(alu_word1_op2::DST_CHAN.get(self.word1))
    }

    pub fn clamp(&self) -> bool {
        alu_word1_op2::CLAMP.get_bool(self.word1)
    }

    pub fn bank_swizzle(&self) -> u32 {
        alu_word1_op2::BANK_SWIZZLE.get(self.word1)
    }

    /// GPR write enable; the OP3 encoding always writes
    pub fn write_mask(&self) -> bool {
        match self.encoding() {
            AluEncoding::Op2 => alu_word1_op2::WRITE_MASK.get_bool(self.word1),
            AluEncoding::Op3 => true,
        }
    }

    /// Output modifier; the OP3 encoding has none
    pub fn omod(&self) -> OutputModifier {
        match self.encoding() {
            AluEncoding::Op2 => OutputModifier::from(alu_word1_op2::OMOD.get(self.word1)),
            AluEncoding::Op3 => OutputModifier::Off,
        }
    }

    pub fn update_exec_mask(&self) -> bool {
        self.encoding() == AluEncoding::Op2
            && alu_word1_op2::UPDATE_EXECUTE_MASK.get_bool(self.word1)
    }

    pub fn update_pred(&self) -> bool {
        self.encoding() == AluEncoding::Op2 && alu_word1_op2::UPDATE_PRED.get_bool(self.word1)
    }
}

/// Texture fetch instruction (16 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct TextureFetchInst {
    pub word0: u32,
    pub word1: u32,
    pub word2: u32,
    pub padding: u32,
}

impl TextureFetchInst {
    pub const SIZE: usize = 16;

    pub fn from_le_bytes(bytes: &[u8]) -> Self {
        let raw: Self = bytemuck::pod_read_unaligned(bytes);
        Self {
            word0: u32::from_le(raw.word0),
            word1: u32::from_le(raw.word1),
            word2: u32::from_le(raw.word2),
            padding: u32::from_le(raw.padding),
        }
    }

    pub fn tex_inst(&self) -> Result<TexInst, DecodeError> {
        let id = tex_word0::TEX_INST.get(self.word0);
        TexInst::from_raw(id).ok_or(DecodeError::UnexpectedOpcode {
            kind: TexInst::KIND,
            id,
        })
    }

    pub fn bc_frac_mode(&self) -> bool {
        tex_word0::BC_FRAC_MODE.get_bool(self.word0)
    }

    pub fn resource_id(&self) -> u32 {
        tex_word0::RESOURCE_ID.get(self.word0)
    }

    pub fn src_gpr(&self) -> u32 {
        tex_word0::SRC_GPR.get(self.word0)
    }

    pub fn src_rel(&self) -> bool {
        tex_word0::SRC_REL.get_bool(self.word0)
    }

    pub fn dst_gpr(&self) -> u32 {
        tex_word1::DST_GPR.get(self.word1)
    }

    pub fn dst_rel(&self) -> bool {
        tex_word1::DST_REL.get_bool(self.word1)
    }

    pub fn dst_sels(&self) -> [Sel; 4] {
        [
            Sel::from(tex_word1::DST_SEL_X.get(self.word1)),
            Sel::from(tex_word1::DST_SEL_Y.get(self.word1)),
            Sel::from(tex_word1::DST_SEL_Z.get(self.word1)),
            Sel::from(tex_word1::DST_SEL_W.get(self.word1)),
        ]
    }

    pub fn lod_bias(&self) -> i32 {
        tex_word1::LOD_BIAS.get_signed(self.word1)
    }

    pub fn coord_types(&self) -> [TexCoordType; 4] {
        [
            TexCoordType::from(tex_word1::COORD_TYPE_X.get_bool(self.word1)),
            TexCoordType::from(tex_word1::COORD_TYPE_Y.get_bool(self.word1)),
            TexCoordType::from(tex_word1::COORD_TYPE_Z.get_bool(self.word1)),
            TexCoordType::from(tex_word1::COORD_TYPE_W.get_bool(self.word1)),
        ]
    }

    /// Signed texel offsets (x, y, z)
    pub fn offsets(&self) -> [i32; 3] {
        [
            tex_word2::OFFSET_X.get_signed(self.word2),
            tex_word2::OFFSET_Y.get_signed(self.word2),
            tex_word2::OFFSET_Z.get_signed(self.word2),
        ]
    }

    pub fn sampler_id(&self) -> u32 {
        tex_word2::SAMPLER_ID.get(self.word2)
    }

    pub fn src_sels(&self) -> [Sel; 4] {
        [
            Sel::from(tex_word2::SRC_SEL_X.get(self.word2)),
            Sel::from(tex_word2::SRC_SEL_Y.get(self.word2)),
            Sel::from(tex_word2::SRC_SEL_Z.get(self.word2)),
            Sel::from(tex_word2::SRC_SEL_W.get(self.word2)),
        ]
    }
}

/// Vertex fetch instruction (16 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct VertexFetchInst {
    pub word0: u32,
    pub word1: u32,
    pub word2: u32,
    pub padding: u32,
}

impl VertexFetchInst {
    pub const SIZE: usize = 16;

    pub fn from_le_bytes(bytes: &[u8]) -> Self {
        let raw: Self = bytemuck::pod_read_unaligned(bytes);
        Self {
            word0: u32::from_le(raw.word0),
            word1: u32::from_le(raw.word1),
            word2: u32::from_le(raw.word2),
            padding: u32::from_le(raw.padding),
        }
    }

    pub fn vtx_inst(&self) -> Result<VtxInst, DecodeError> {
        let id = vtx_word0::VTX_INST.get(self.word0);
        VtxInst::from_raw(id).ok_or(DecodeError::UnexpectedOpcode {
            kind: VtxInst::KIND,
            id,
        })
    }

    pub fn fetch_type(&self) -> u32 {
        vtx_word0::FETCH_TYPE.get(self.word0)
    }

    pub fn buffer_id(&self) -> u32 {
        vtx_word0::BUFFER_ID.get(self.word0)
    }

    pub fn src_gpr(&self) -> u32 {
        vtx_word0::SRC_GPR.get(self.word0)
    }

    pub fn src_sel_x(&self) -> Sel {
        Sel::from(vtx_word0::SRC_SEL_X.get(self.word0))
    }

    pub fn mega_fetch_count(&self) -> u32 {
        vtx_word0::MEGA_FETCH_COUNT.get(self.word0)
    }

    pub fn dst_gpr(&self) -> u32 {
        vtx_word1::DST_GPR.get(self.word1)
    }

    pub fn semantic_id(&self) -> u32 {
        vtx_word1::SEMANTIC_ID.get(self.word1)
    }

    pub fn dst_sels(&self) -> [Sel; 4] {
        [
            Sel::from(vtx_word1::DST_SEL_X.get(self.word1)),
            Sel::from(vtx_word1::DST_SEL_Y.get(self.word1)),
            Sel::from(vtx_word1::DST_SEL_Z.get(self.word1)),
            Sel::from(vtx_word1::DST_SEL_W.get(self.word1)),
        ]
    }

    pub fn use_const_fields(&self) -> bool {
        vtx_word1::USE_CONST_FIELDS.get_bool(self.word1)
    }

    pub fn data_format(&self) -> u32 {
        vtx_word1::DATA_FORMAT.get(self.word1)
    }

    pub fn num_format_all(&self) -> u32 {
        vtx_word1::NUM_FORMAT_ALL.get(self.word1)
    }

    pub fn format_comp_all(&self) -> bool {
        vtx_word1::FORMAT_COMP_ALL.get_bool(self.word1)
    }

    pub fn offset(&self) -> u32 {
        vtx_word2::OFFSET.get(self.word2)
    }

    pub fn endian_swap(&self) -> u32 {
        vtx_word2::ENDIAN_SWAP.get(self.word2)
    }

    pub fn mega_fetch(&self) -> bool {
        vtx_word2::MEGA_FETCH.get_bool(self.word2)
    }
}
