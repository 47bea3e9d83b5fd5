//! Latte (R6xx/R7xx) shader microcode model
//!
//! This crate provides the structural decoding layer of the recompiler:
//! - Bit-field tables for every instruction word
//! - Opcode tables shared by the decoder and the shader walker
//! - Typed instruction views and bounds-checked clause access
//! - ALU clause parsing into VLIW instruction groups
//! - An assembler for building microcode fixtures

pub mod binary;
pub mod builder;
pub mod clause;
pub mod fields;
pub mod instructions;
pub mod opcodes;
pub mod types;

pub use binary::ShaderBinary;
pub use clause::{AluClauseParser, AluInstructionGroup};
pub use instructions::{AluInst, AluSource, ControlFlowInst, TextureFetchInst, VertexFetchInst};
pub use opcodes::{
    AluOp2, AluOp3, AluOpcode, CfAluInst, CfExpInst, CfInst, InstFlags, TexInst, VtxInst,
};
pub use types::{
    AluEncoding, AluUnit, CfInstType, Chan, DataFormat, ExportType, FetchType, IndexMode,
    KcacheMode, OperandSel, OutputModifier, Sel, ShaderType, TexCoordType, TexDim,
};
