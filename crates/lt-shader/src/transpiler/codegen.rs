//! Shared code generation helpers: operand expressions, lane result writes
//! and swizzled assignments

use lt_core::TranslateError;
use lt_microcode::{
    AluInst, AluInstructionGroup, AluUnit, Chan, ControlFlowInst, IndexMode, InstFlags,
    KcacheMode, OperandSel, OutputModifier, Sel,
};

use super::Transpiler;

const INDENT: &str = "    ";

/// Line-oriented text accumulator with indentation
#[derive(Debug, Clone, Default)]
pub struct ShaderWriter {
    buf: String,
    indent: usize,
}

impl ShaderWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent(indent: usize) -> Self {
        Self {
            buf: String::new(),
            indent,
        }
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.indent {
                self.buf.push_str(INDENT);
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    /// Append already formatted lines verbatim
    pub fn raw(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

/// Index register added to a relatively addressed GPR or constant
pub(super) fn index_register(mode: u32) -> Result<&'static str, TranslateError> {
    match IndexMode::from_raw(mode) {
        Some(IndexMode::ArX) => Ok("AR.x"),
        Some(IndexMode::ArY) => Ok("AR.y"),
        Some(IndexMode::ArZ) => Ok("AR.z"),
        Some(IndexMode::ArW) => Ok("AR.w"),
        Some(IndexMode::Loop) => Ok("AL"),
        _ => Err(TranslateError::InvalidIndexMode { mode }),
    }
}

fn sel_component(src: &str, sel: Sel) -> Option<String> {
    match sel {
        Sel::X | Sel::Y | Sel::Z | Sel::W => {
            let chan = Chan::from(sel as u32);
            Some(format!("{}.{}", src, chan.as_char()))
        }
        Sel::Zero => Some("0.0f".to_string()),
        Sel::One => Some("1.0f".to_string()),
        Sel::Reserved | Sel::Mask => None,
    }
}

/// `dest = src` through a four component selector; masked channels keep
/// their previous value
pub(super) fn assign_stmt(dest: &str, src: &str, sels: [Sel; 4]) -> Option<String> {
    let mut dest_chans = String::new();
    let mut swizzle = String::new();
    let mut components = Vec::new();
    let mut swizzle_only = true;

    for (chan, &sel) in Chan::ALL.iter().zip(sels.iter()) {
        let Some(component) = sel_component(src, sel) else {
            continue;
        };
        dest_chans.push(chan.as_char());
        match sel {
            Sel::Zero | Sel::One => swizzle_only = false,
            _ => swizzle.push(Chan::from(sel as u32).as_char()),
        }
        components.push(component);
    }

    if components.is_empty() {
        return None;
    }
    let target = if dest_chans == "xyzw" {
        dest.to_string()
    } else {
        format!("{}.{}", dest, dest_chans)
    };
    let value = match components.len() {
        1 => components.join(""),
        _ if swizzle == "xyzw" => src.to_string(),
        _ if swizzle_only => format!("{}.{}", src, swizzle),
        n => format!("float{}({})", n, components.join(", ")),
    };
    Some(format!("{} = {};", target, value))
}

fn apply_output_modifier(expr: String, omod: OutputModifier) -> String {
    match omod {
        OutputModifier::Off => expr,
        OutputModifier::Mul2 => format!("({}) * 2.0f", expr),
        OutputModifier::Mul4 => format!("({}) * 4.0f", expr),
        OutputModifier::Div2 => format!("({}) / 2.0f", expr),
    }
}

impl<'a> Transpiler<'a> {
    /// HLSL expression for source operand `n` of `inst`
    pub(super) fn gen_src_var(
        &mut self,
        cf: &ControlFlowInst,
        group: &AluInstructionGroup,
        inst: &AluInst,
        n: usize,
    ) -> Result<String, TranslateError> {
        let src = inst.src(n);
        let chan = src.chan.as_char();
        let operand =
            OperandSel::decode(src.sel).ok_or(TranslateError::InvalidOperand { sel: src.sel })?;

        let mut expr = match operand {
            OperandSel::Gpr(gpr) if src.rel => {
                let index = index_register(inst.index_mode())?;
                format!("R[{} + {}].{}", gpr, index, chan)
            }
            OperandSel::Gpr(gpr) => format!("R[{}].{}", gpr, chan),
            OperandSel::Kcache { bank, index } => {
                let base = self.kcache_operand(cf, bank, index, src.rel, inst.index_mode())?;
                format!("{}.{}", base, chan)
            }
            OperandSel::Zero => "0.0f".to_string(),
            OperandSel::One => "1.0f".to_string(),
            OperandSel::IntOne => "asfloat(1)".to_string(),
            OperandSel::IntMinusOne => "asfloat(-1)".to_string(),
            OperandSel::Half => "0.5f".to_string(),
            OperandSel::Literal => format!("asfloat(0x{:08X}u)", group.literal(src.chan)),
            OperandSel::PrevVector => format!("PV.{}", chan),
            OperandSel::PrevScalar => "PS".to_string(),
            OperandSel::Cfile(index) if src.rel => {
                let reg = index_register(inst.index_mode())?;
                self.usage.use_cfile_all();
                format!("C[{} + {}].{}", index, reg, chan)
            }
            OperandSel::Cfile(index) => {
                self.usage.use_cfile(index);
                format!("C[{}].{}", index, chan)
            }
        };

        if src.abs {
            expr = format!("abs({})", expr);
        }
        if src.neg {
            expr = format!("-{}", expr);
        }

        let flags = inst.opcode()?.flags();
        if flags.contains(InstFlags::INT_IN) {
            expr = format!("asint({})", expr);
        } else if flags.contains(InstFlags::UINT_IN) {
            expr = format!("asuint({})", expr);
        }
        Ok(expr)
    }

    /// Uniform block element addressed through a locked kcache bank
    fn kcache_operand(
        &mut self,
        cf: &ControlFlowInst,
        bank: usize,
        index: u32,
        rel: bool,
        index_mode: u32,
    ) -> Result<String, TranslateError> {
        let block = cf.kcache_bank(bank) as usize;
        let addr = cf.kcache_addr(bank) * 16 + index;

        let mut offsets = Vec::new();
        match cf.kcache_mode(bank) {
            KcacheMode::Nop => {
                return Err(TranslateError::KcacheNotLocked { bank: bank as u32 });
            }
            KcacheMode::LockLoopIndex => offsets.push("AL"),
            KcacheMode::Lock1 | KcacheMode::Lock2 => {}
        }
        if rel {
            offsets.push(index_register(index_mode)?);
        }

        if offsets.is_empty() {
            self.usage.use_uniform(block, addr);
            Ok(format!("CB{}[{}]", block, addr))
        } else {
            self.usage.use_uniform_block(block);
            Ok(format!("CB{}[{} + {}]", block, addr, offsets.join(" + ")))
        }
    }

    /// Store a lane result into `PVo`/`PSo` and queue the GPR write
    pub(super) fn insert_dest_assign(
        &mut self,
        unit: AluUnit,
        inst: &AluInst,
        expr: String,
    ) -> Result<(), TranslateError> {
        let flags = inst.opcode()?.flags();
        let value = if flags.intersects(InstFlags::INT_OUT | InstFlags::UINT_OUT) {
            format!("asfloat({})", expr)
        } else {
            self.float_result(inst, expr)
        };

        let dest = match unit.chan() {
            Some(chan) => format!("PVo.{}", chan.as_char()),
            None => "PSo".to_string(),
        };
        self.out.line(format!("{} = {};", dest, value));

        if inst.write_mask() {
            self.defer_gpr_write(inst, &dest)?;
        }
        Ok(())
    }

    /// Output modifier then clamp, for float results
    pub(super) fn float_result(&self, inst: &AluInst, expr: String) -> String {
        let expr = apply_output_modifier(expr, inst.omod());
        if inst.clamp() {
            format!("saturate({})", expr)
        } else {
            expr
        }
    }

    /// Queue `R[dst].chan = value` for the end of the group
    pub(super) fn defer_gpr_write(&mut self, inst: &AluInst, value: &str) -> Result<(), TranslateError> {
        let chan = inst.dst_chan().as_char();
        let write = if inst.dst_rel() {
            let index = index_register(inst.index_mode())?;
            format!("R[{} + {}].{} = {};", inst.dst_gpr(), index, chan, value)
        } else {
            format!("R[{}].{} = {};", inst.dst_gpr(), chan, value)
        };
        self.deferred.push(write);
        Ok(())
    }

    /// Load the address register from a float operand
    pub(super) fn insert_ar_assign(&mut self, inst: &AluInst, expr: String) {
        let chan = inst.dst_chan().as_char();
        self.out
            .line(format!("AR.{} = clamp((int)floor({}), -256, 255);", chan, expr));
    }

    pub(super) fn insert_assign_stmt(&mut self, dest: &str, src: &str, sels: [Sel; 4]) {
        if let Some(stmt) = assign_stmt(dest, src, sels) {
            self.out.line(stmt);
        }
    }
}
