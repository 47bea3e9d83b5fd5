//! Bit-field layouts of the Latte microcode words
//!
//! Every instruction word is described by a table of `(name, offset, width)`
//! entries. Accessors on the instruction views read through these tables, so
//! the hardware layout lives in exactly one place.

/// A single field inside a 32-bit instruction word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    pub name: &'static str,
    pub offset: u32,
    pub width: u32,
}

impl BitField {
    pub const fn new(name: &'static str, offset: u32, width: u32) -> Self {
        Self {
            name,
            offset,
            width,
        }
    }

    /// Right-aligned mask covering `width` bits
    #[inline]
    pub const fn mask(self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        }
    }

    #[inline]
    pub const fn get(self, word: u32) -> u32 {
        (word >> self.offset) & self.mask()
    }

    #[inline]
    pub const fn get_bool(self, word: u32) -> bool {
        self.get(word) != 0
    }

    /// Field value sign-extended from `width` bits
    #[inline]
    pub const fn get_signed(self, word: u32) -> i32 {
        let shift = 32 - self.width;
        ((self.get(word) << shift) as i32) >> shift
    }

    /// Replace the field in `word` with `value` (truncated to the field width)
    #[inline]
    pub const fn set(self, word: u32, value: u32) -> u32 {
        let mask = self.mask() << self.offset;
        (word & !mask) | ((value & self.mask()) << self.offset)
    }

    /// Whether two fields share any bit
    pub const fn overlaps(self, other: BitField) -> bool {
        self.offset < other.offset + other.width && other.offset < self.offset + self.width
    }
}

macro_rules! layout {
    (
        $(#[$meta:meta])*
        $module:ident {
            $($field:ident : $offset:literal, $width:literal;)*
        }
        $(overlays {
            $($ofield:ident : $ooffset:literal, $owidth:literal;)*
        })?
    ) => {
        $(#[$meta])*
        pub mod $module {
            use super::BitField;

            $(pub const $field: BitField = BitField::new(stringify!($field), $offset, $width);)*
            $($(pub const $ofield: BitField = BitField::new(stringify!($ofield), $ooffset, $owidth);)*)?

            /// Non-overlapping fields of this word, in bit order
            pub const ALL: &[BitField] = &[$($field),*];
        }
    };
}

layout! {
    /// CF_WORD0 (normal control flow)
    cf_word0 {
        ADDR: 0, 32;
    }
}

layout! {
    /// CF_WORD1 (normal control flow)
    cf_word1 {
        POP_COUNT: 0, 3;
        CF_CONST: 3, 5;
        COND: 8, 2;
        COUNT: 10, 3;
        CALL_COUNT: 13, 6;
        COUNT_3: 19, 1;
        END_OF_PROGRAM: 21, 1;
        VALID_PIXEL_MODE: 22, 1;
        CF_INST: 23, 7;
        WHOLE_QUAD_MODE: 30, 1;
        BARRIER: 31, 1;
    }
    overlays {
        CF_INST_TYPE: 28, 2;
    }
}

layout! {
    /// CF_ALU_WORD0
    cf_alu_word0 {
        ADDR: 0, 22;
        KCACHE_BANK0: 22, 4;
        KCACHE_BANK1: 26, 4;
        KCACHE_MODE0: 30, 2;
    }
}

layout! {
    /// CF_ALU_WORD1
    cf_alu_word1 {
        KCACHE_MODE1: 0, 2;
        KCACHE_ADDR0: 2, 8;
        KCACHE_ADDR1: 10, 8;
        COUNT: 18, 7;
        ALT_CONST: 25, 1;
        CF_INST: 26, 4;
        WHOLE_QUAD_MODE: 30, 1;
        BARRIER: 31, 1;
    }
}

layout! {
    /// CF_ALLOC_EXPORT_WORD0
    cf_exp_word0 {
        ARRAY_BASE: 0, 13;
        TYPE: 13, 2;
        RW_GPR: 15, 7;
        RW_REL: 22, 1;
        INDEX_GPR: 23, 7;
        ELEM_SIZE: 30, 2;
    }
}

layout! {
    /// CF_ALLOC_EXPORT_WORD1 (swizzle form)
    cf_exp_word1 {
        SEL_X: 0, 3;
        SEL_Y: 3, 3;
        SEL_Z: 6, 3;
        SEL_W: 9, 3;
        BURST_COUNT: 17, 4;
        END_OF_PROGRAM: 21, 1;
        VALID_PIXEL_MODE: 22, 1;
        CF_INST: 23, 7;
        WHOLE_QUAD_MODE: 30, 1;
        BARRIER: 31, 1;
    }
}

layout! {
    /// ALU_WORD0
    alu_word0 {
        SRC0_SEL: 0, 9;
        SRC0_REL: 9, 1;
        SRC0_CHAN: 10, 2;
        SRC0_NEG: 12, 1;
        SRC1_SEL: 13, 9;
        SRC1_REL: 22, 1;
        SRC1_CHAN: 23, 2;
        SRC1_NEG: 25, 1;
        INDEX_MODE: 26, 3;
        PRED_SEL: 29, 2;
        LAST: 31, 1;
    }
}

layout! {
    /// ALU_WORD1 in the two-operand encoding
    alu_word1_op2 {
        SRC0_ABS: 0, 1;
        SRC1_ABS: 1, 1;
        UPDATE_EXECUTE_MASK: 2, 1;
        UPDATE_PRED: 3, 1;
        WRITE_MASK: 4, 1;
        OMOD: 5, 2;
        ALU_INST: 7, 11;
        BANK_SWIZZLE: 18, 3;
        DST_GPR: 21, 7;
        DST_REL: 28, 1;
        DST_CHAN: 29, 2;
        CLAMP: 31, 1;
    }
    overlays {
        ENCODING: 15, 3;
    }
}

layout! {
    /// ALU_WORD1 in the three-operand encoding
    alu_word1_op3 {
        SRC2_SEL: 0, 9;
        SRC2_REL: 9, 1;
        SRC2_CHAN: 10, 2;
        SRC2_NEG: 12, 1;
        ALU_INST: 13, 5;
        BANK_SWIZZLE: 18, 3;
        DST_GPR: 21, 7;
        DST_REL: 28, 1;
        DST_CHAN: 29, 2;
        CLAMP: 31, 1;
    }
}

layout! {
    /// TEX_WORD0
    tex_word0 {
        TEX_INST: 0, 5;
        BC_FRAC_MODE: 5, 1;
        FETCH_WHOLE_QUAD: 7, 1;
        RESOURCE_ID: 8, 8;
        SRC_GPR: 16, 7;
        SRC_REL: 23, 1;
        ALT_CONST: 24, 1;
    }
}

layout! {
    /// TEX_WORD1
    tex_word1 {
        DST_GPR: 0, 7;
        DST_REL: 7, 1;
        DST_SEL_X: 9, 3;
        DST_SEL_Y: 12, 3;
        DST_SEL_Z: 15, 3;
        DST_SEL_W: 18, 3;
        LOD_BIAS: 21, 7;
        COORD_TYPE_X: 28, 1;
        COORD_TYPE_Y: 29, 1;
        COORD_TYPE_Z: 30, 1;
        COORD_TYPE_W: 31, 1;
    }
}

layout! {
    /// TEX_WORD2
    tex_word2 {
        OFFSET_X: 0, 5;
        OFFSET_Y: 5, 5;
        OFFSET_Z: 10, 5;
        SAMPLER_ID: 15, 5;
        SRC_SEL_X: 20, 3;
        SRC_SEL_Y: 23, 3;
        SRC_SEL_Z: 26, 3;
        SRC_SEL_W: 29, 3;
    }
}

layout! {
    /// VTX_WORD0
    vtx_word0 {
        VTX_INST: 0, 5;
        FETCH_TYPE: 5, 2;
        FETCH_WHOLE_QUAD: 7, 1;
        BUFFER_ID: 8, 8;
        SRC_GPR: 16, 7;
        SRC_REL: 23, 1;
        SRC_SEL_X: 24, 2;
        MEGA_FETCH_COUNT: 26, 6;
    }
}

layout! {
    /// VTX_WORD1 (GPR form; the semantic form reuses the low byte)
    vtx_word1 {
        DST_GPR: 0, 7;
        DST_REL: 7, 1;
        DST_SEL_X: 9, 3;
        DST_SEL_Y: 12, 3;
        DST_SEL_Z: 15, 3;
        DST_SEL_W: 18, 3;
        USE_CONST_FIELDS: 21, 1;
        DATA_FORMAT: 22, 6;
        NUM_FORMAT_ALL: 28, 2;
        FORMAT_COMP_ALL: 30, 1;
        SRF_MODE_ALL: 31, 1;
    }
    overlays {
        SEMANTIC_ID: 0, 8;
    }
}

layout! {
    /// VTX_WORD2
    vtx_word2 {
        OFFSET: 0, 16;
        ENDIAN_SWAP: 16, 2;
        CONST_BUF_NO_STRIDE: 18, 1;
        MEGA_FETCH: 19, 1;
        ALT_CONST: 20, 1;
    }
}

/// Every word layout, for table-wide checks
pub const LAYOUTS: &[(&str, &[BitField])] = &[
    ("CF_WORD0", cf_word0::ALL),
    ("CF_WORD1", cf_word1::ALL),
    ("CF_ALU_WORD0", cf_alu_word0::ALL),
    ("CF_ALU_WORD1", cf_alu_word1::ALL),
    ("CF_ALLOC_EXPORT_WORD0", cf_exp_word0::ALL),
    ("CF_ALLOC_EXPORT_WORD1", cf_exp_word1::ALL),
    ("ALU_WORD0", alu_word0::ALL),
    ("ALU_WORD1_OP2", alu_word1_op2::ALL),
    ("ALU_WORD1_OP3", alu_word1_op3::ALL),
    ("TEX_WORD0", tex_word0::ALL),
    ("TEX_WORD1", tex_word1::ALL),
    ("TEX_WORD2", tex_word2::ALL),
    ("VTX_WORD0", vtx_word0::ALL),
    ("VTX_WORD1", vtx_word1::ALL),
    ("VTX_WORD2", vtx_word2::ALL),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_fit_and_do_not_overlap() {
        for (word, fields) in LAYOUTS {
            for (i, a) in fields.iter().enumerate() {
                assert!(a.width > 0, "{word}.{} has zero width", a.name);
                assert!(a.offset + a.width <= 32, "{word}.{} exceeds 32 bits", a.name);
                for b in &fields[i + 1..] {
                    assert!(!a.overlaps(*b), "{word}.{} overlaps {}", a.name, b.name);
                }
            }
        }
    }

    #[test]
    fn test_get_set() {
        let word = cf_word1::CF_INST.set(0, 19);
        assert_eq!(cf_word1::CF_INST.get(word), 19);
        assert_eq!(word, 19 << 23);

        let word = cf_word1::END_OF_PROGRAM.set(word, 1);
        assert!(cf_word1::END_OF_PROGRAM.get_bool(word));
        assert_eq!(cf_word1::CF_INST.get(word), 19);

        // Values wider than the field are truncated
        assert_eq!(cf_word1::COUNT.set(0, 0xF), 0x7 << 10);
    }

    #[test]
    fn test_full_width_field() {
        assert_eq!(cf_word0::ADDR.mask(), u32::MAX);
        assert_eq!(cf_word0::ADDR.get(0xDEAD_BEEF), 0xDEAD_BEEF);
        assert_eq!(cf_word0::ADDR.set(0x1234, 0xCAFE_F00D), 0xCAFE_F00D);
    }

    #[test]
    fn test_signed_field() {
        assert_eq!(tex_word2::OFFSET_X.get_signed(0b01111), 15);
        assert_eq!(tex_word2::OFFSET_X.get_signed(0b10000), -16);
        assert_eq!(tex_word2::OFFSET_Y.get_signed(0b11111 << 5), -1);
    }

    #[test]
    fn test_overlay_views() {
        // CF_INST_TYPE is the top two bits of the 7-bit CF_INST field
        let word = cf_word1::CF_INST.set(0, 39);
        assert_eq!(cf_word1::CF_INST_TYPE.get(word), 1);

        // OP3 opcodes always have a non-zero ENCODING view
        let word = alu_word1_op3::ALU_INST.set(0, 0x10);
        assert_ne!(alu_word1_op2::ENCODING.get(word), 0);
        let word = alu_word1_op2::ALU_INST.set(0, 0x79);
        assert_eq!(alu_word1_op2::ENCODING.get(word), 0);
    }
}
