//! ALU clause decoding into VLIW instruction groups

use lt_core::DecodeError;
use tracing::trace;

use crate::instructions::AluInst;
use crate::types::{AluUnit, Chan, OperandSel};

/// One VLIW bundle: up to five lanes plus the literal constants that follow it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AluInstructionGroup {
    pub units: [Option<AluInst>; 5],
    pub literals: [u32; 4],
}

impl AluInstructionGroup {
    pub fn unit(&self, unit: AluUnit) -> Option<&AluInst> {
        self.units[unit.index()].as_ref()
    }

    pub fn literal(&self, chan: Chan) -> u32 {
        self.literals[chan.index()]
    }

    /// Occupied lanes in unit order
    pub fn iter(&self) -> impl Iterator<Item = (AluUnit, &AluInst)> {
        AluUnit::ALL
            .iter()
            .zip(self.units.iter())
            .filter_map(|(&unit, inst)| inst.as_ref().map(|inst| (unit, inst)))
    }

    pub fn len(&self) -> usize {
        self.units.iter().filter(|u| u.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cursor over the raw slots of one ALU clause
#[derive(Debug)]
pub struct AluClauseParser<'c> {
    slots: &'c [AluInst],
    pos: usize,
}

impl<'c> AluClauseParser<'c> {
    pub fn new(slots: &'c [AluInst]) -> Self {
        Self { slots, pos: 0 }
    }

    pub fn is_end_of_clause(&self) -> bool {
        self.pos >= self.slots.len()
    }

    /// Index of the next unread slot
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Read one group, consuming its literal slots
    pub fn read_group(&mut self) -> Result<AluInstructionGroup, DecodeError> {
        let start = self.pos;
        let mut group = AluInstructionGroup::default();
        let mut literal_slots = 0;

        loop {
            let slot = self.pos;
            let inst = *self
                .slots
                .get(slot)
                .ok_or(DecodeError::UnterminatedGroup { slot: start })?;
            self.pos += 1;

            let opcode = inst.opcode()?;
            let mut unit = AluUnit::from(inst.dst_chan());
            if opcode.is_trans_only() || group.units[unit.index()].is_some() {
                unit = AluUnit::T;
            }
            if group.units[unit.index()].is_some() {
                return Err(DecodeError::AluUnitConflict { slot });
            }
            group.units[unit.index()] = Some(inst);

            for n in 0..inst.num_srcs() {
                let src = inst.src(n);
                if src.sel == OperandSel::LITERAL {
                    // X/Y live in the first literal slot, Z/W in the second
                    let needed = if src.chan.index() < 2 { 1 } else { 2 };
                    literal_slots = literal_slots.max(needed);
                }
            }

            if inst.last() {
                break;
            }
        }

        if literal_slots > 0 {
            let literals = self
                .slots
                .get(self.pos..self.pos + literal_slots)
                .ok_or(DecodeError::MissingLiterals {
                    slot: start,
                    needed: literal_slots,
                })?;
            for (i, literal) in literals.iter().enumerate() {
                group.literals[i * 2] = literal.word0;
                group.literals[i * 2 + 1] = literal.word1;
            }
            self.pos += literal_slots;
        }

        trace!(
            "ALU group at slot {}: {} lane(s), {} literal slot(s)",
            start,
            group.len(),
            literal_slots
        );
        Ok(group)
    }
}
