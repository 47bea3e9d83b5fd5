//! Opcode tables for every instruction category
//!
//! Each table is a single `opcode_table!` invocation, which generates the
//! enum, raw-id conversion, ISA mnemonics and per-opcode flags. The shader
//! walker derives both its dispatch and its "unimplemented" diagnostics from
//! these tables, so adding an opcode here is the only step needed to wire it.

use bitflags::bitflags;

bitflags! {
    /// Static properties of an ALU opcode
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InstFlags: u8 {
        /// Lanes X..W jointly compute one result
        const REDUCTION = 0x01;
        /// Can only execute on the T (transcendental) unit
        const TRANS_ONLY = 0x02;
        /// Sources are signed integers
        const INT_IN = 0x04;
        /// Result is a signed integer
        const INT_OUT = 0x08;
        /// Sources are unsigned integers
        const UINT_IN = 0x10;
        /// Result is an unsigned integer
        const UINT_OUT = 0x20;
    }
}

macro_rules! opcode_table {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident = $value:literal => $mnemonic:literal $([$($flag:ident)|+])?,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant = $value,)*
        }

        impl $name {
            /// Category name used in diagnostics
            pub const KIND: &'static str = $kind;

            /// Every opcode of this category, in table order
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];

            pub fn from_raw(raw: u32) -> Option<Self> {
                match raw {
                    $($value => Some(Self::$variant),)*
                    _ => None,
                }
            }

            pub const fn raw(self) -> u32 {
                self as u32
            }

            /// ISA mnemonic
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $mnemonic,)*
                }
            }

            pub const fn flags(self) -> InstFlags {
                match self {
                    $(Self::$variant => InstFlags::empty()$($(.union(InstFlags::$flag))+)?,)*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

opcode_table! {
    /// Normal control flow instructions (CF_INST_TYPE 0)
    CfInst, "CF NORMAL" {
        Nop = 0 => "NOP",
        Tex = 1 => "TEX",
        Vtx = 2 => "VTX",
        VtxTc = 3 => "VTX_TC",
        LoopStart = 4 => "LOOP_START",
        LoopEnd = 5 => "LOOP_END",
        LoopStartDx10 = 6 => "LOOP_START_DX10",
        LoopStartNoAl = 7 => "LOOP_START_NO_AL",
        LoopContinue = 8 => "LOOP_CONTINUE",
        LoopBreak = 9 => "LOOP_BREAK",
        Jump = 10 => "JUMP",
        Push = 11 => "PUSH",
        PushElse = 12 => "PUSH_ELSE",
        Else = 13 => "ELSE",
        Pop = 14 => "POP",
        PopJump = 15 => "POP_JUMP",
        PopPush = 16 => "POP_PUSH",
        PopPushElse = 17 => "POP_PUSH_ELSE",
        Call = 18 => "CALL",
        CallFs = 19 => "CALL_FS",
        Return = 20 => "RETURN",
        EmitVertex = 21 => "EMIT_VERTEX",
        EmitCutVertex = 22 => "EMIT_CUT_VERTEX",
        CutVertex = 23 => "CUT_VERTEX",
        Kill = 24 => "KILL",
        WaitAck = 26 => "WAIT_ACK",
        TexAck = 27 => "TEX_ACK",
        VtxAck = 28 => "VTX_ACK",
        VtxTcAck = 29 => "VTX_TC_ACK",
    }
}

opcode_table! {
    /// Export and memory-write control flow instructions (CF_INST_TYPE 1)
    CfExpInst, "CF EXPORT" {
        MemStream0 = 32 => "MEM_STREAM0",
        MemStream1 = 33 => "MEM_STREAM1",
        MemStream2 = 34 => "MEM_STREAM2",
        MemStream3 = 35 => "MEM_STREAM3",
        MemScratch = 36 => "MEM_SCRATCH",
        MemReduction = 37 => "MEM_REDUCTION",
        MemRing = 38 => "MEM_RING",
        Exp = 39 => "EXP",
        ExpDone = 40 => "EXP_DONE",
        MemExport = 58 => "MEM_EXPORT",
    }
}

opcode_table! {
    /// ALU clause control flow instructions (CF_INST_TYPE 2 and 3)
    CfAluInst, "CF ALU" {
        Alu = 8 => "ALU",
        AluPushBefore = 9 => "ALU_PUSH_BEFORE",
        AluPopAfter = 10 => "ALU_POP_AFTER",
        AluPop2After = 11 => "ALU_POP2_AFTER",
        AluContinue = 13 => "ALU_CONTINUE",
        AluBreak = 14 => "ALU_BREAK",
        AluElseAfter = 15 => "ALU_ELSE_AFTER",
    }
}

opcode_table! {
    /// Two-operand ALU instructions
    AluOp2, "ALU OP2" {
        Add = 0x00 => "ADD",
        Mul = 0x01 => "MUL",
        MulIeee = 0x02 => "MUL_IEEE",
        Max = 0x03 => "MAX",
        Min = 0x04 => "MIN",
        MaxDx10 = 0x05 => "MAX_DX10",
        MinDx10 = 0x06 => "MIN_DX10",
        Sete = 0x08 => "SETE",
        Setgt = 0x09 => "SETGT",
        Setge = 0x0A => "SETGE",
        Setne = 0x0B => "SETNE",
        SeteDx10 = 0x0C => "SETE_DX10" [INT_OUT],
        SetgtDx10 = 0x0D => "SETGT_DX10" [INT_OUT],
        SetgeDx10 = 0x0E => "SETGE_DX10" [INT_OUT],
        SetneDx10 = 0x0F => "SETNE_DX10" [INT_OUT],
        Fract = 0x10 => "FRACT",
        Trunc = 0x11 => "TRUNC",
        Ceil = 0x12 => "CEIL",
        Rndne = 0x13 => "RNDNE",
        Floor = 0x14 => "FLOOR",
        Mova = 0x15 => "MOVA",
        MovaFloor = 0x16 => "MOVA_FLOOR",
        MovaInt = 0x18 => "MOVA_INT" [INT_IN],
        Mov = 0x19 => "MOV",
        Nop = 0x1A => "NOP",
        PredSetgtUint = 0x1E => "PRED_SETGT_UINT" [UINT_IN],
        PredSetgeUint = 0x1F => "PRED_SETGE_UINT" [UINT_IN],
        PredSete = 0x20 => "PRED_SETE",
        PredSetgt = 0x21 => "PRED_SETGT",
        PredSetge = 0x22 => "PRED_SETGE",
        PredSetne = 0x23 => "PRED_SETNE",
        PredSetInv = 0x24 => "PRED_SET_INV",
        PredSetPop = 0x25 => "PRED_SET_POP",
        PredSetClr = 0x26 => "PRED_SET_CLR",
        PredSetRestore = 0x27 => "PRED_SET_RESTORE",
        PredSetePush = 0x28 => "PRED_SETE_PUSH",
        PredSetgtPush = 0x29 => "PRED_SETGT_PUSH",
        PredSetgePush = 0x2A => "PRED_SETGE_PUSH",
        PredSetnePush = 0x2B => "PRED_SETNE_PUSH",
        Kille = 0x2C => "KILLE",
        Killgt = 0x2D => "KILLGT",
        Killge = 0x2E => "KILLGE",
        Killne = 0x2F => "KILLNE",
        AndInt = 0x30 => "AND_INT" [INT_IN | INT_OUT],
        OrInt = 0x31 => "OR_INT" [INT_IN | INT_OUT],
        XorInt = 0x32 => "XOR_INT" [INT_IN | INT_OUT],
        NotInt = 0x33 => "NOT_INT" [INT_IN | INT_OUT],
        AddInt = 0x34 => "ADD_INT" [INT_IN | INT_OUT],
        SubInt = 0x35 => "SUB_INT" [INT_IN | INT_OUT],
        MaxInt = 0x36 => "MAX_INT" [INT_IN | INT_OUT],
        MinInt = 0x37 => "MIN_INT" [INT_IN | INT_OUT],
        MaxUint = 0x38 => "MAX_UINT" [UINT_IN | UINT_OUT],
        MinUint = 0x39 => "MIN_UINT" [UINT_IN | UINT_OUT],
        SeteInt = 0x3A => "SETE_INT" [INT_IN | INT_OUT],
        SetgtInt = 0x3B => "SETGT_INT" [INT_IN | INT_OUT],
        SetgeInt = 0x3C => "SETGE_INT" [INT_IN | INT_OUT],
        SetneInt = 0x3D => "SETNE_INT" [INT_IN | INT_OUT],
        SetgtUint = 0x3E => "SETGT_UINT" [UINT_IN | INT_OUT],
        SetgeUint = 0x3F => "SETGE_UINT" [UINT_IN | INT_OUT],
        KillgtUint = 0x40 => "KILLGT_UINT" [UINT_IN],
        KillgeUint = 0x41 => "KILLGE_UINT" [UINT_IN],
        PredSeteInt = 0x42 => "PRED_SETE_INT" [INT_IN],
        PredSetgtInt = 0x43 => "PRED_SETGT_INT" [INT_IN],
        PredSetgeInt = 0x44 => "PRED_SETGE_INT" [INT_IN],
        PredSetneInt = 0x45 => "PRED_SETNE_INT" [INT_IN],
        KilleInt = 0x46 => "KILLE_INT" [INT_IN],
        KillgtInt = 0x47 => "KILLGT_INT" [INT_IN],
        KillgeInt = 0x48 => "KILLGE_INT" [INT_IN],
        KillneInt = 0x49 => "KILLNE_INT" [INT_IN],
        PredSetePushInt = 0x4A => "PRED_SETE_PUSH_INT" [INT_IN],
        PredSetgtPushInt = 0x4B => "PRED_SETGT_PUSH_INT" [INT_IN],
        PredSetgePushInt = 0x4C => "PRED_SETGE_PUSH_INT" [INT_IN],
        PredSetnePushInt = 0x4D => "PRED_SETNE_PUSH_INT" [INT_IN],
        PredSetltPushInt = 0x4E => "PRED_SETLT_PUSH_INT" [INT_IN],
        PredSetlePushInt = 0x4F => "PRED_SETLE_PUSH_INT" [INT_IN],
        Dot4 = 0x50 => "DOT4" [REDUCTION],
        Dot4Ieee = 0x51 => "DOT4_IEEE" [REDUCTION],
        Cube = 0x52 => "CUBE" [REDUCTION],
        Max4 = 0x53 => "MAX4" [REDUCTION],
        MovaGprInt = 0x60 => "MOVA_GPR_INT" [INT_IN],
        ExpIeee = 0x61 => "EXP_IEEE" [TRANS_ONLY],
        LogClamped = 0x62 => "LOG_CLAMPED" [TRANS_ONLY],
        LogIeee = 0x63 => "LOG_IEEE" [TRANS_ONLY],
        RecipClamped = 0x64 => "RECIP_CLAMPED" [TRANS_ONLY],
        RecipFf = 0x65 => "RECIP_FF" [TRANS_ONLY],
        RecipIeee = 0x66 => "RECIP_IEEE" [TRANS_ONLY],
        RecipsqrtClamped = 0x67 => "RECIPSQRT_CLAMPED" [TRANS_ONLY],
        RecipsqrtFf = 0x68 => "RECIPSQRT_FF" [TRANS_ONLY],
        RecipsqrtIeee = 0x69 => "RECIPSQRT_IEEE" [TRANS_ONLY],
        SqrtIeee = 0x6A => "SQRT_IEEE" [TRANS_ONLY],
        FltToInt = 0x6B => "FLT_TO_INT" [TRANS_ONLY | INT_OUT],
        IntToFlt = 0x6C => "INT_TO_FLT" [TRANS_ONLY | INT_IN],
        UintToFlt = 0x6D => "UINT_TO_FLT" [TRANS_ONLY | UINT_IN],
        Sin = 0x6E => "SIN" [TRANS_ONLY],
        Cos = 0x6F => "COS" [TRANS_ONLY],
        AshrInt = 0x70 => "ASHR_INT" [INT_IN | INT_OUT],
        LshrInt = 0x71 => "LSHR_INT" [UINT_IN | UINT_OUT],
        LshlInt = 0x72 => "LSHL_INT" [INT_IN | INT_OUT],
        MulloInt = 0x73 => "MULLO_INT" [TRANS_ONLY | INT_IN | INT_OUT],
        MulhiInt = 0x74 => "MULHI_INT" [TRANS_ONLY | INT_IN | INT_OUT],
        MulloUint = 0x75 => "MULLO_UINT" [TRANS_ONLY | UINT_IN | UINT_OUT],
        MulhiUint = 0x76 => "MULHI_UINT" [TRANS_ONLY | UINT_IN | UINT_OUT],
        RecipInt = 0x77 => "RECIP_INT" [TRANS_ONLY | INT_IN | INT_OUT],
        RecipUint = 0x78 => "RECIP_UINT" [TRANS_ONLY | UINT_IN | UINT_OUT],
        FltToUint = 0x79 => "FLT_TO_UINT" [TRANS_ONLY | UINT_OUT],
    }
}

opcode_table! {
    /// Three-operand ALU instructions
    AluOp3, "ALU OP3" {
        MulLit = 0x0C => "MUL_LIT" [TRANS_ONLY],
        MulLitM2 = 0x0D => "MUL_LIT_M2" [TRANS_ONLY],
        MulLitM4 = 0x0E => "MUL_LIT_M4" [TRANS_ONLY],
        MulLitD2 = 0x0F => "MUL_LIT_D2" [TRANS_ONLY],
        Muladd = 0x10 => "MULADD",
        MuladdM2 = 0x11 => "MULADD_M2",
        MuladdM4 = 0x12 => "MULADD_M4",
        MuladdD2 = 0x13 => "MULADD_D2",
        MuladdIeee = 0x14 => "MULADD_IEEE",
        MuladdIeeeM2 = 0x15 => "MULADD_IEEE_M2",
        MuladdIeeeM4 = 0x16 => "MULADD_IEEE_M4",
        MuladdIeeeD2 = 0x17 => "MULADD_IEEE_D2",
        Cnde = 0x18 => "CNDE",
        Cndgt = 0x19 => "CNDGT",
        Cndge = 0x1A => "CNDGE",
        CndeInt = 0x1C => "CNDE_INT" [INT_IN],
        CndgtInt = 0x1D => "CNDGT_INT" [INT_IN],
        CndgeInt = 0x1E => "CNDGE_INT" [INT_IN],
    }
}

opcode_table! {
    /// Texture fetch clause instructions
    TexInst, "TEX" {
        VtxFetch = 0 => "VTX_FETCH",
        VtxSemantic = 1 => "VTX_SEMANTIC",
        Mem = 2 => "MEM",
        Ld = 3 => "LD",
        GetTextureInfo = 4 => "GET_TEXTURE_INFO",
        GetNumberOfSamples = 5 => "GET_NUMBER_OF_SAMPLES",
        GetLod = 6 => "GET_LOD",
        GetGradientsH = 7 => "GET_GRADIENTS_H",
        GetGradientsV = 8 => "GET_GRADIENTS_V",
        GetLerp = 9 => "GET_LERP",
        KeepGradients = 10 => "KEEP_GRADIENTS",
        SetGradientsH = 11 => "SET_GRADIENTS_H",
        SetGradientsV = 12 => "SET_GRADIENTS_V",
        Pass = 13 => "PASS",
        SetCubemapIndex = 14 => "SET_CUBEMAP_INDEX",
        Fetch4 = 15 => "FETCH4",
        Sample = 16 => "SAMPLE",
        SampleL = 17 => "SAMPLE_L",
        SampleLb = 18 => "SAMPLE_LB",
        SampleLz = 19 => "SAMPLE_LZ",
        SampleG = 20 => "SAMPLE_G",
        SampleGL = 21 => "SAMPLE_G_L",
        SampleGLb = 22 => "SAMPLE_G_LB",
        SampleGLz = 23 => "SAMPLE_G_LZ",
        SampleC = 24 => "SAMPLE_C",
        SampleCL = 25 => "SAMPLE_C_L",
        SampleCLb = 26 => "SAMPLE_C_LB",
        SampleCLz = 27 => "SAMPLE_C_LZ",
        SampleCG = 28 => "SAMPLE_C_G",
        SampleCGL = 29 => "SAMPLE_C_G_L",
        SampleCGLb = 30 => "SAMPLE_C_G_LB",
        SampleCGLz = 31 => "SAMPLE_C_G_LZ",
    }
}

opcode_table! {
    /// Vertex fetch clause instructions
    VtxInst, "VTX" {
        Fetch = 0 => "FETCH",
        Semantic = 1 => "SEMANTIC",
        Mem = 2 => "MEM",
        Bufinfo = 14 => "BUFINFO",
    }
}

/// Either ALU encoding's opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluOpcode {
    Op2(AluOp2),
    Op3(AluOp3),
}

impl AluOpcode {
    pub fn kind(self) -> &'static str {
        match self {
            Self::Op2(_) => AluOp2::KIND,
            Self::Op3(_) => AluOp3::KIND,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Op2(op) => op.name(),
            Self::Op3(op) => op.name(),
        }
    }

    pub fn flags(self) -> InstFlags {
        match self {
            Self::Op2(op) => op.flags(),
            Self::Op3(op) => op.flags(),
        }
    }

    pub fn is_reduction(self) -> bool {
        self.flags().contains(InstFlags::REDUCTION)
    }

    pub fn is_trans_only(self) -> bool {
        self.flags().contains(InstFlags::TRANS_ONLY)
    }
}

impl std::fmt::Display for AluOpcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn check_table<T: Copy + std::fmt::Debug>(
        all: &[T],
        raw: impl Fn(T) -> u32,
        name: impl Fn(T) -> &'static str,
        from_raw: impl Fn(u32) -> Option<T>,
        width: u32,
    ) {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for &op in all {
            let id = raw(op);
            assert!(id < (1 << width), "{op:?} does not fit in {width} bits");
            assert!(ids.insert(id), "duplicate id {id}");
            assert!(names.insert(name(op)), "duplicate name {}", name(op));
            assert_eq!(from_raw(id).map(&raw), Some(id));
        }
    }

    #[test]
    fn test_tables_are_consistent() {
        check_table(CfInst::ALL, CfInst::raw, CfInst::name, CfInst::from_raw, 7);
        check_table(CfExpInst::ALL, CfExpInst::raw, CfExpInst::name, CfExpInst::from_raw, 7);
        check_table(CfAluInst::ALL, CfAluInst::raw, CfAluInst::name, CfAluInst::from_raw, 4);
        check_table(AluOp2::ALL, AluOp2::raw, AluOp2::name, AluOp2::from_raw, 11);
        check_table(AluOp3::ALL, AluOp3::raw, AluOp3::name, AluOp3::from_raw, 5);
        check_table(TexInst::ALL, TexInst::raw, TexInst::name, TexInst::from_raw, 5);
        check_table(VtxInst::ALL, VtxInst::raw, VtxInst::name, VtxInst::from_raw, 5);
    }

    #[test]
    fn test_cf_type_ranges() {
        // CF_INST_TYPE is the top two bits of the 7-bit CF_INST field
        assert!(CfInst::ALL.iter().all(|op| op.raw() >> 5 == 0));
        assert!(CfExpInst::ALL.iter().all(|op| op.raw() >> 5 == 1));
        // ALU CF opcodes are 4 bits at bit 26, so their type is raw >> 2
        assert!(CfAluInst::ALL.iter().all(|op| op.raw() >> 2 >= 2));
    }

    #[test]
    fn test_from_raw_unknown() {
        assert_eq!(CfInst::from_raw(25), None);
        assert_eq!(AluOp2::from_raw(0x7F), None);
        assert_eq!(AluOp3::from_raw(0x1B), None);
        assert_eq!(VtxInst::from_raw(3), None);
    }

    #[test]
    fn test_flags() {
        let reductions: Vec<_> = AluOp2::ALL
            .iter()
            .filter(|op| op.flags().contains(InstFlags::REDUCTION))
            .map(|op| op.name())
            .collect();
        assert_eq!(reductions, ["DOT4", "DOT4_IEEE", "CUBE", "MAX4"]);

        assert!(AluOp2::RecipIeee.flags().contains(InstFlags::TRANS_ONLY));
        assert!(!AluOp2::Add.flags().contains(InstFlags::TRANS_ONLY));
        assert!(AluOp2::AddInt.flags().contains(InstFlags::INT_IN | InstFlags::INT_OUT));
        assert_eq!(AluOp2::Mov.flags(), InstFlags::empty());
        assert!(AluOpcode::Op2(AluOp2::Max4).is_reduction());
        assert!(AluOpcode::Op3(AluOp3::MulLit).is_trans_only());
    }

    #[test]
    fn test_names() {
        assert_eq!(CfInst::CallFs.name(), "CALL_FS");
        assert_eq!(CfExpInst::ExpDone.to_string(), "EXP_DONE");
        assert_eq!(AluOp2::MovaFloor.name(), "MOVA_FLOOR");
        assert_eq!(AluOpcode::Op3(AluOp3::Muladd).kind(), "ALU OP3");
        assert_eq!(TexInst::KIND, "TEX");
    }
}
