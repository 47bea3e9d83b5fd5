//! Error types for the Latte shader recompiler

use thiserror::Error;

/// Main error type for the recompiler
#[derive(Error, Debug)]
pub enum LatteError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Translation error: {0}")]
    Translate(#[from] TranslateError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Structural decoding errors for raw microcode
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Shader binary is empty")]
    EmptyBinary,

    #[error("Read of {len} bytes at offset 0x{offset:x} exceeds {size}-byte shader binary")]
    OutOfBounds { offset: usize, len: usize, size: usize },

    #[error("Unexpected {kind} instruction id {id}")]
    UnexpectedOpcode { kind: &'static str, id: u32 },

    #[error("ALU group at slot {slot} assigns more than one instruction to the T unit")]
    AluUnitConflict { slot: usize },

    #[error("ALU clause ended inside a group at slot {slot}")]
    UnterminatedGroup { slot: usize },

    #[error("ALU group at slot {slot} is missing {needed} literal slot(s)")]
    MissingLiterals { slot: usize, needed: usize },
}

/// Translation failures: unimplemented opcodes and ISA legality violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("Unimplemented {kind} instruction {name}")]
    Unimplemented { kind: &'static str, name: &'static str },

    #[error("CALL_FS is only allowed as the first CF instruction (found at CF {cf_pc})")]
    FetchShaderCallNotFirst { cf_pc: u32 },

    #[error("CALL_FS issued more than once (CF {cf_pc})")]
    DuplicateFetchShaderCall { cf_pc: u32 },

    #[error("CALL_FS is only allowed in vertex shaders, not {stage} shaders")]
    FetchShaderCallOutsideVertex { stage: &'static str },

    #[error("RETURN outside of a function body (CF {cf_pc})")]
    ReturnOutsideFunction { cf_pc: u32 },

    #[error("Fetch shaders must be translated as functions")]
    FetchShaderNotFunction,

    #[error("Expected every instruction in reduction group to have the same {field} (unit {unit})")]
    ReductionMismatch { field: &'static str, unit: usize },

    #[error("Unexpected reduction instruction {name} in ALU unit {unit}")]
    MisplacedReduction { name: &'static str, unit: usize },

    #[error("Instruction {name} is only valid as a reduction")]
    ReductionOnly { name: &'static str },

    #[error("Texture fetch with non-normalized coordinates on channel {channel}")]
    NonNormalizedCoords { channel: char },

    #[error("Texture fetch with fraction addressing mode is unsupported")]
    FracAddressingMode,

    #[error("Texture slot {slot} has no declared dimension ({context})")]
    UnknownTextureDim { slot: u32, context: &'static str },

    #[error("Unexpected texture dimension {dim} for {context}")]
    UnexpectedTextureDim { dim: &'static str, context: &'static str },

    #[error("Invalid ALU operand selector {sel}")]
    InvalidOperand { sel: u32 },

    #[error("Invalid index mode {mode} for relative addressing")]
    InvalidIndexMode { mode: u32 },

    #[error("Kcache bank {bank} referenced while unlocked")]
    KcacheNotLocked { bank: u32 },

    #[error("{kind} slot {slot} is out of range")]
    ResourceOutOfRange { kind: &'static str, slot: u32 },

    #[error("Invalid {kind} export to array base {array_base} in {stage} shader")]
    InvalidExport {
        kind: &'static str,
        array_base: u32,
        stage: &'static str,
    },

    #[error("Vertex fetch from non-attribute buffer {buffer_id}")]
    InvalidFetchBuffer { buffer_id: u32 },

    #[error("Unsupported vertex fetch {what} {value}")]
    UnsupportedFetch { what: &'static str, value: u32 },

    #[error("Translation result requested before the walk completed")]
    Incomplete,

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Result type alias for recompiler operations
pub type Result<T> = std::result::Result<T, LatteError>;
