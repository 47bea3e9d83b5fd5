//! Bounds-checked access to a shader program's raw bytes

use lt_core::DecodeError;

use crate::instructions::{AluInst, ControlFlowInst, TextureFetchInst, VertexFetchInst};

/// Clause addresses are expressed in units of this many bytes
pub const CLAUSE_ADDR_UNIT: usize = 8;

/// Immutable view of one compiled shader program
#[derive(Debug, Clone, Copy)]
pub struct ShaderBinary<'a> {
    data: &'a [u8],
}

impl<'a> ShaderBinary<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow `len` bytes at `offset`
    pub fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8], DecodeError> {
        let out_of_bounds = DecodeError::OutOfBounds {
            offset,
            len,
            size: self.data.len(),
        };
        let end = offset.checked_add(len).ok_or(out_of_bounds.clone())?;
        self.data.get(offset..end).ok_or(out_of_bounds)
    }

    /// Whether a CF instruction slot starts at `index`
    pub fn has_cf(&self, index: usize) -> bool {
        index
            .checked_mul(ControlFlowInst::SIZE)
            .map_or(false, |offset| offset < self.data.len())
    }

    /// Decode control flow instruction `index`
    pub fn cf_at(&self, index: usize) -> Result<ControlFlowInst, DecodeError> {
        let offset = Self::scaled(index, ControlFlowInst::SIZE, self.data.len())?;
        let bytes = self.slice(offset, ControlFlowInst::SIZE)?;
        Ok(ControlFlowInst::from_le_bytes(bytes))
    }

    /// `count` ALU slots starting at clause address `addr`
    pub fn alu_clause(&self, addr: u32, count: u32) -> Result<Vec<AluInst>, DecodeError> {
        let bytes = self.clause_bytes(addr, count, AluInst::SIZE)?;
        Ok(bytes
            .chunks_exact(AluInst::SIZE)
            .map(AluInst::from_le_bytes)
            .collect())
    }

    /// `count` texture fetch instructions starting at clause address `addr`
    pub fn tex_clause(&self, addr: u32, count: u32) -> Result<Vec<TextureFetchInst>, DecodeError> {
        let bytes = self.clause_bytes(addr, count, TextureFetchInst::SIZE)?;
        Ok(bytes
            .chunks_exact(TextureFetchInst::SIZE)
            .map(TextureFetchInst::from_le_bytes)
            .collect())
    }

    /// `count` vertex fetch instructions starting at clause address `addr`
    pub fn vtx_clause(&self, addr: u32, count: u32) -> Result<Vec<VertexFetchInst>, DecodeError> {
        let bytes = self.clause_bytes(addr, count, VertexFetchInst::SIZE)?;
        Ok(bytes
            .chunks_exact(VertexFetchInst::SIZE)
            .map(VertexFetchInst::from_le_bytes)
            .collect())
    }

    fn clause_bytes(&self, addr: u32, count: u32, size: usize) -> Result<&'a [u8], DecodeError> {
        let offset = Self::scaled(addr as usize, CLAUSE_ADDR_UNIT, self.data.len())?;
        let len = Self::scaled(count as usize, size, self.data.len())?;
        self.slice(offset, len)
    }

    fn scaled(value: usize, unit: usize, size: usize) -> Result<usize, DecodeError> {
        value.checked_mul(unit).ok_or(DecodeError::OutOfBounds {
            offset: usize::MAX,
            len: unit,
            size,
        })
    }
}

impl<'a> From<&'a [u8]> for ShaderBinary<'a> {
    fn from(data: &'a [u8]) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn test_cf_at() {
        let data = words(&[1, 2, 3, 4]);
        let binary = ShaderBinary::new(&data);

        assert_eq!(binary.cf_at(0), Ok(ControlFlowInst::new(1, 2)));
        assert_eq!(binary.cf_at(1), Ok(ControlFlowInst::new(3, 4)));
        assert_eq!(
            binary.cf_at(2),
            Err(DecodeError::OutOfBounds {
                offset: 16,
                len: 8,
                size: 16
            })
        );
        assert!(binary.has_cf(1));
        assert!(!binary.has_cf(2));
    }

    #[test]
    fn test_truncated_cf() {
        let data = words(&[1, 2, 3]);
        let binary = ShaderBinary::new(&data);
        assert!(binary.has_cf(1));
        assert!(matches!(binary.cf_at(1), Err(DecodeError::OutOfBounds { .. })));
    }

    #[test]
    fn test_alu_clause() {
        let data = words(&[0, 0, 10, 11, 12, 13]);
        let binary = ShaderBinary::new(&data);

        let insts = binary.alu_clause(1, 2).unwrap();
        assert_eq!(insts, vec![AluInst::new(10, 11), AluInst::new(12, 13)]);

        assert!(binary.alu_clause(1, 3).is_err());
        assert!(binary.alu_clause(u32::MAX, 1).is_err());
    }

    #[test]
    fn test_fetch_clauses() {
        let data = words(&[0, 0, 1, 2, 3, 4, 5, 6, 7, 8]);
        let binary = ShaderBinary::new(&data);

        let tex = binary.tex_clause(1, 2).unwrap();
        assert_eq!(tex.len(), 2);
        assert_eq!(tex[0].word0, 1);
        assert_eq!(tex[1].word2, 7);

        let vtx = binary.vtx_clause(1, 1).unwrap();
        assert_eq!(vtx[0].word1, 2);

        assert!(matches!(
            binary.tex_clause(2, 2),
            Err(DecodeError::OutOfBounds { offset: 16, len: 32, size: 40 })
        ));
    }
}
