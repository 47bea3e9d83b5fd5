//! Small enumerations decoded from instruction fields

/// Shader stage a program is compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderType {
    Fetch,
    Vertex,
    Geometry,
    Pixel,
}

impl ShaderType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Vertex => "vertex",
            Self::Geometry => "geometry",
            Self::Pixel => "pixel",
        }
    }
}

/// CF_INST_TYPE
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfInstType {
    Normal = 0,
    Export = 1,
    Alu = 2,
    AluExtended = 3,
}

impl From<u32> for CfInstType {
    fn from(v: u32) -> Self {
        match v & 0x3 {
            0 => CfInstType::Normal,
            1 => CfInstType::Export,
            2 => CfInstType::Alu,
            _ => CfInstType::AluExtended,
        }
    }
}

/// Component channel
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chan {
    X = 0,
    Y = 1,
    Z = 2,
    W = 3,
}

impl Chan {
    pub const ALL: [Chan; 4] = [Chan::X, Chan::Y, Chan::Z, Chan::W];

    pub fn as_char(self) -> char {
        match self {
            Chan::X => 'x',
            Chan::Y => 'y',
            Chan::Z => 'z',
            Chan::W => 'w',
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl From<u32> for Chan {
    fn from(v: u32) -> Self {
        match v & 0x3 {
            0 => Chan::X,
            1 => Chan::Y,
            2 => Chan::Z,
            _ => Chan::W,
        }
    }
}

/// Component selector used by swizzles in fetch and export instructions
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sel {
    X = 0,
    Y = 1,
    Z = 2,
    W = 3,
    Zero = 4,
    One = 5,
    Reserved = 6,
    Mask = 7,
}

impl Sel {
    /// Selectors that leave the destination component untouched
    pub fn is_masked(self) -> bool {
        matches!(self, Sel::Mask | Sel::Reserved)
    }
}

impl From<u32> for Sel {
    fn from(v: u32) -> Self {
        match v & 0x7 {
            0 => Sel::X,
            1 => Sel::Y,
            2 => Sel::Z,
            3 => Sel::W,
            4 => Sel::Zero,
            5 => Sel::One,
            6 => Sel::Reserved,
            _ => Sel::Mask,
        }
    }
}

impl From<Chan> for Sel {
    fn from(chan: Chan) -> Self {
        Sel::from(chan as u32)
    }
}

/// ALU execution unit of a VLIW group
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluUnit {
    X = 0,
    Y = 1,
    Z = 2,
    W = 3,
    T = 4,
}

impl AluUnit {
    pub const ALL: [AluUnit; 5] = [AluUnit::X, AluUnit::Y, AluUnit::Z, AluUnit::W, AluUnit::T];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Vector channel for X..W, `None` for the T unit
    pub fn chan(self) -> Option<Chan> {
        match self {
            AluUnit::X => Some(Chan::X),
            AluUnit::Y => Some(Chan::Y),
            AluUnit::Z => Some(Chan::Z),
            AluUnit::W => Some(Chan::W),
            AluUnit::T => None,
        }
    }
}

impl From<Chan> for AluUnit {
    fn from(chan: Chan) -> Self {
        match chan {
            Chan::X => AluUnit::X,
            Chan::Y => AluUnit::Y,
            Chan::Z => AluUnit::Z,
            Chan::W => AluUnit::W,
        }
    }
}

/// Decoded ALU source selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandSel {
    Gpr(u32),
    /// Constant from a locked kcache window
    Kcache { bank: usize, index: u32 },
    Zero,
    One,
    IntOne,
    IntMinusOne,
    Half,
    Literal,
    PrevVector,
    PrevScalar,
    /// Uniform register file
    Cfile(u32),
}

impl OperandSel {
    pub const LITERAL: u32 = 253;

    pub fn decode(sel: u32) -> Option<Self> {
        match sel {
            0..=127 => Some(OperandSel::Gpr(sel)),
            128..=159 => Some(OperandSel::Kcache {
                bank: 0,
                index: sel - 128,
            }),
            160..=191 => Some(OperandSel::Kcache {
                bank: 1,
                index: sel - 160,
            }),
            248 => Some(OperandSel::Zero),
            249 => Some(OperandSel::One),
            250 => Some(OperandSel::IntOne),
            251 => Some(OperandSel::IntMinusOne),
            252 => Some(OperandSel::Half),
            Self::LITERAL => Some(OperandSel::Literal),
            254 => Some(OperandSel::PrevVector),
            255 => Some(OperandSel::PrevScalar),
            256..=511 => Some(OperandSel::Cfile(sel - 256)),
            _ => None,
        }
    }
}

/// ALU_WORD1 encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluEncoding {
    Op2,
    Op3,
}

/// OMOD
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputModifier {
    Off = 0,
    Mul2 = 1,
    Mul4 = 2,
    Div2 = 3,
}

impl From<u32> for OutputModifier {
    fn from(v: u32) -> Self {
        match v & 0x3 {
            0 => OutputModifier::Off,
            1 => OutputModifier::Mul2,
            2 => OutputModifier::Mul4,
            _ => OutputModifier::Div2,
        }
    }
}

/// Relative addressing register selected by INDEX_MODE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    ArX,
    ArY,
    ArZ,
    ArW,
    Loop,
    Global,
    GlobalArX,
}

impl IndexMode {
    pub fn from_raw(v: u32) -> Option<Self> {
        match v {
            0 => Some(IndexMode::ArX),
            1 => Some(IndexMode::ArY),
            2 => Some(IndexMode::ArZ),
            3 => Some(IndexMode::ArW),
            4 => Some(IndexMode::Loop),
            5 => Some(IndexMode::Global),
            6 => Some(IndexMode::GlobalArX),
            _ => None,
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            IndexMode::ArX => 0,
            IndexMode::ArY => 1,
            IndexMode::ArZ => 2,
            IndexMode::ArW => 3,
            IndexMode::Loop => 4,
            IndexMode::Global => 5,
            IndexMode::GlobalArX => 6,
        }
    }
}

/// KCACHE_MODE
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KcacheMode {
    Nop = 0,
    Lock1 = 1,
    Lock2 = 2,
    LockLoopIndex = 3,
}

impl From<u32> for KcacheMode {
    fn from(v: u32) -> Self {
        match v & 0x3 {
            0 => KcacheMode::Nop,
            1 => KcacheMode::Lock1,
            2 => KcacheMode::Lock2,
            _ => KcacheMode::LockLoopIndex,
        }
    }
}

/// Texture resource dimensionality
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexDim {
    Dim1D = 0,
    Dim2D = 1,
    Dim3D = 2,
    Cubemap = 3,
    Dim1DArray = 4,
    Dim2DArray = 5,
    Dim2DMsaa = 6,
    Dim2DArrayMsaa = 7,
}

impl TexDim {
    pub fn name(self) -> &'static str {
        match self {
            TexDim::Dim1D => "1D",
            TexDim::Dim2D => "2D",
            TexDim::Dim3D => "3D",
            TexDim::Cubemap => "CUBEMAP",
            TexDim::Dim1DArray => "1D_ARRAY",
            TexDim::Dim2DArray => "2D_ARRAY",
            TexDim::Dim2DMsaa => "2D_MSAA",
            TexDim::Dim2DArrayMsaa => "2D_ARRAY_MSAA",
        }
    }
}

impl From<u32> for TexDim {
    fn from(v: u32) -> Self {
        match v & 0x7 {
            0 => TexDim::Dim1D,
            1 => TexDim::Dim2D,
            2 => TexDim::Dim3D,
            3 => TexDim::Cubemap,
            4 => TexDim::Dim1DArray,
            5 => TexDim::Dim2DArray,
            6 => TexDim::Dim2DMsaa,
            _ => TexDim::Dim2DArrayMsaa,
        }
    }
}

/// COORD_TYPE_*
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexCoordType {
    Unnormalized,
    Normalized,
}

impl From<bool> for TexCoordType {
    fn from(v: bool) -> Self {
        if v {
            TexCoordType::Normalized
        } else {
            TexCoordType::Unnormalized
        }
    }
}

/// Export TYPE
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportType {
    Pixel = 0,
    Pos = 1,
    Param = 2,
}

impl ExportType {
    pub fn from_raw(v: u32) -> Option<Self> {
        match v {
            0 => Some(ExportType::Pixel),
            1 => Some(ExportType::Pos),
            2 => Some(ExportType::Param),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ExportType::Pixel => "pixel",
            ExportType::Pos => "position",
            ExportType::Param => "parameter",
        }
    }
}

/// Vertex FETCH_TYPE
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchType {
    VertexData = 0,
    InstanceData = 1,
    NoIndexOffset = 2,
}

impl FetchType {
    pub fn from_raw(v: u32) -> Option<Self> {
        match v {
            0 => Some(FetchType::VertexData),
            1 => Some(FetchType::InstanceData),
            2 => Some(FetchType::NoIndexOffset),
            _ => None,
        }
    }
}

/// Vertex DATA_FORMAT
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Fmt8 = 1,
    Fmt4_4 = 2,
    Fmt16 = 5,
    Fmt16Float = 6,
    Fmt8_8 = 7,
    Fmt5_6_5 = 8,
    Fmt1_5_5_5 = 10,
    Fmt4_4_4_4 = 11,
    Fmt32 = 13,
    Fmt32Float = 14,
    Fmt16_16 = 15,
    Fmt16_16Float = 16,
    Fmt10_11_11 = 21,
    Fmt2_10_10_10 = 25,
    Fmt8_8_8_8 = 26,
    Fmt10_10_10_2 = 27,
    Fmt32_32 = 29,
    Fmt32_32Float = 30,
    Fmt16_16_16_16 = 31,
    Fmt16_16_16_16Float = 32,
    Fmt32_32_32_32 = 34,
    Fmt32_32_32_32Float = 35,
    Fmt32_32_32 = 47,
    Fmt32_32_32Float = 48,
}

impl DataFormat {
    pub fn from_raw(v: u32) -> Option<Self> {
        Some(match v {
            1 => DataFormat::Fmt8,
            2 => DataFormat::Fmt4_4,
            5 => DataFormat::Fmt16,
            6 => DataFormat::Fmt16Float,
            7 => DataFormat::Fmt8_8,
            8 => DataFormat::Fmt5_6_5,
            10 => DataFormat::Fmt1_5_5_5,
            11 => DataFormat::Fmt4_4_4_4,
            13 => DataFormat::Fmt32,
            14 => DataFormat::Fmt32Float,
            15 => DataFormat::Fmt16_16,
            16 => DataFormat::Fmt16_16Float,
            21 => DataFormat::Fmt10_11_11,
            25 => DataFormat::Fmt2_10_10_10,
            26 => DataFormat::Fmt8_8_8_8,
            27 => DataFormat::Fmt10_10_10_2,
            29 => DataFormat::Fmt32_32,
            30 => DataFormat::Fmt32_32Float,
            31 => DataFormat::Fmt16_16_16_16,
            32 => DataFormat::Fmt16_16_16_16Float,
            34 => DataFormat::Fmt32_32_32_32,
            35 => DataFormat::Fmt32_32_32_32Float,
            47 => DataFormat::Fmt32_32_32,
            48 => DataFormat::Fmt32_32_32Float,
            _ => return None,
        })
    }

    /// Bits per element and element count, `None` for packed formats whose
    /// components differ in width
    pub fn element_layout(self) -> Option<(u32, u32)> {
        match self {
            DataFormat::Fmt8 => Some((8, 1)),
            DataFormat::Fmt8_8 => Some((8, 2)),
            DataFormat::Fmt8_8_8_8 => Some((8, 4)),
            DataFormat::Fmt16 | DataFormat::Fmt16Float => Some((16, 1)),
            DataFormat::Fmt16_16 | DataFormat::Fmt16_16Float => Some((16, 2)),
            DataFormat::Fmt16_16_16_16 | DataFormat::Fmt16_16_16_16Float => Some((16, 4)),
            DataFormat::Fmt32 | DataFormat::Fmt32Float => Some((32, 1)),
            DataFormat::Fmt32_32 | DataFormat::Fmt32_32Float => Some((32, 2)),
            DataFormat::Fmt32_32_32 | DataFormat::Fmt32_32_32Float => Some((32, 3)),
            DataFormat::Fmt32_32_32_32 | DataFormat::Fmt32_32_32_32Float => Some((32, 4)),
            DataFormat::Fmt4_4
            | DataFormat::Fmt5_6_5
            | DataFormat::Fmt1_5_5_5
            | DataFormat::Fmt4_4_4_4
            | DataFormat::Fmt10_11_11
            | DataFormat::Fmt2_10_10_10
            | DataFormat::Fmt10_10_10_2 => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sel_masking() {
        assert!(Sel::from(7).is_masked());
        assert!(Sel::from(6).is_masked());
        assert!(!Sel::from(4).is_masked());
        assert_eq!(Sel::from(Chan::Z), Sel::Z);
    }

    #[test]
    fn test_alu_unit_chan() {
        assert_eq!(AluUnit::from(Chan::W), AluUnit::W);
        assert_eq!(AluUnit::T.chan(), None);
        assert_eq!(AluUnit::Y.chan(), Some(Chan::Y));
    }

    #[test]
    fn test_index_mode() {
        assert_eq!(IndexMode::from_raw(4), Some(IndexMode::Loop));
        assert_eq!(IndexMode::from_raw(7), None);
        for raw in 0..7 {
            assert_eq!(IndexMode::from_raw(raw).map(IndexMode::raw), Some(raw));
        }
    }

    #[test]
    fn test_data_format_layout() {
        assert_eq!(DataFormat::from_raw(26).and_then(DataFormat::element_layout), Some((8, 4)));
        assert_eq!(DataFormat::from_raw(48).and_then(DataFormat::element_layout), Some((32, 3)));
        assert_eq!(DataFormat::Fmt10_10_10_2.element_layout(), None);
        assert_eq!(DataFormat::from_raw(0), None);
    }

    #[test]
    fn test_operand_sel() {
        assert_eq!(OperandSel::decode(5), Some(OperandSel::Gpr(5)));
        assert_eq!(OperandSel::decode(130), Some(OperandSel::Kcache { bank: 0, index: 2 }));
        assert_eq!(OperandSel::decode(191), Some(OperandSel::Kcache { bank: 1, index: 31 }));
        assert_eq!(OperandSel::decode(253), Some(OperandSel::Literal));
        assert_eq!(OperandSel::decode(300), Some(OperandSel::Cfile(44)));
        assert_eq!(OperandSel::decode(200), None);
        assert_eq!(OperandSel::decode(512), None);
    }

    #[test]
    fn test_export_type() {
        assert_eq!(ExportType::from_raw(1), Some(ExportType::Pos));
        assert_eq!(ExportType::from_raw(3), None);
    }
}
