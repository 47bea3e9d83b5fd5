//! ALU instruction handlers

use lt_core::TranslateError;
use lt_microcode::{
    AluInst, AluInstructionGroup, AluOp2, AluOp3, AluOpcode, AluUnit, ControlFlowInst,
};

use super::Transpiler;
use crate::parser::{AluHandler, AluTarget};

pub(super) fn op2_handler<'a>(op: AluOp2) -> Option<AluHandler<Transpiler<'a>>> {
    let handler: AluHandler<Transpiler<'a>> = match op {
        AluOp2::Add
        | AluOp2::Mul
        | AluOp2::MulIeee
        | AluOp2::Max
        | AluOp2::Min
        | AluOp2::Fract
        | AluOp2::Trunc
        | AluOp2::Floor
        | AluOp2::Mov
        | AluOp2::AndInt
        | AluOp2::OrInt
        | AluOp2::XorInt
        | AluOp2::AddInt
        | AluOp2::AshrInt
        | AluOp2::LshrInt
        | AluOp2::LshlInt
        | AluOp2::IntToFlt
        | AluOp2::UintToFlt
        | AluOp2::FltToInt
        | AluOp2::RecipIeee
        | AluOp2::RecipsqrtIeee
        | AluOp2::SqrtIeee => alu_op2 as AluHandler<Transpiler<'a>>,
        AluOp2::Nop => alu_nop as AluHandler<Transpiler<'a>>,
        AluOp2::MovaFloor => alu_mova_floor as AluHandler<Transpiler<'a>>,
        AluOp2::Dot4 | AluOp2::Dot4Ieee | AluOp2::Max4 => alu_reduction as AluHandler<Transpiler<'a>>,
        _ => return None,
    };
    Some(handler)
}

pub(super) fn op3_handler<'a>(op: AluOp3) -> Option<AluHandler<Transpiler<'a>>> {
    let handler: AluHandler<Transpiler<'a>> = match op {
        AluOp3::Muladd | AluOp3::MuladdIeee | AluOp3::Cnde | AluOp3::Cndgt | AluOp3::Cndge => {
            alu_op3 as AluHandler<Transpiler<'a>>
        }
        _ => return None,
    };
    Some(handler)
}

/// Lane a non-reduction instruction executes on
fn lane(target: AluTarget) -> AluUnit {
    match target {
        AluTarget::Unit(unit) => unit,
        // The walker only dispatches reduction opcodes to the whole vector
        AluTarget::Reduction => AluUnit::X,
    }
}

fn alu_nop(
    _t: &mut Transpiler<'_>,
    _cf: &ControlFlowInst,
    _group: &AluInstructionGroup,
    _target: AluTarget,
    _inst: &AluInst,
) -> Result<(), TranslateError> {
    Ok(())
}

fn alu_op2(
    t: &mut Transpiler<'_>,
    cf: &ControlFlowInst,
    group: &AluInstructionGroup,
    target: AluTarget,
    inst: &AluInst,
) -> Result<(), TranslateError> {
    let op = match inst.opcode()? {
        AluOpcode::Op2(op) => op,
        other => {
            return Err(TranslateError::Unimplemented {
                kind: other.kind(),
                name: other.name(),
            })
        }
    };

    let mut src = |n| t.gen_src_var(cf, group, inst, n);
    let expr = match op {
        AluOp2::Add | AluOp2::AddInt => format!("{} + {}", src(0)?, src(1)?),
        AluOp2::Mul | AluOp2::MulIeee => format!("{} * {}", src(0)?, src(1)?),
        AluOp2::Max => format!("max({}, {})", src(0)?, src(1)?),
        AluOp2::Min => format!("min({}, {})", src(0)?, src(1)?),
        AluOp2::Fract => format!("frac({})", src(0)?),
        AluOp2::Trunc => format!("trunc({})", src(0)?),
        AluOp2::Floor => format!("floor({})", src(0)?),
        AluOp2::Mov => src(0)?,
        AluOp2::AndInt => format!("{} & {}", src(0)?, src(1)?),
        AluOp2::OrInt => format!("{} | {}", src(0)?, src(1)?),
        AluOp2::XorInt => format!("{} ^ {}", src(0)?, src(1)?),
        AluOp2::AshrInt | AluOp2::LshrInt => format!("{} >> {}", src(0)?, src(1)?),
        AluOp2::LshlInt => format!("{} << {}", src(0)?, src(1)?),
        AluOp2::IntToFlt | AluOp2::UintToFlt => format!("(float){}", src(0)?),
        AluOp2::FltToInt => format!("(int){}", src(0)?),
        AluOp2::RecipIeee => format!("1.0f / {}", src(0)?),
        AluOp2::RecipsqrtIeee => format!("rsqrt({})", src(0)?),
        AluOp2::SqrtIeee => format!("sqrt({})", src(0)?),
        _ => {
            return Err(TranslateError::Unimplemented {
                kind: AluOp2::KIND,
                name: op.name(),
            })
        }
    };
    t.insert_dest_assign(lane(target), inst, expr)
}

fn alu_mova_floor(
    t: &mut Transpiler<'_>,
    cf: &ControlFlowInst,
    group: &AluInstructionGroup,
    _target: AluTarget,
    inst: &AluInst,
) -> Result<(), TranslateError> {
    let src = t.gen_src_var(cf, group, inst, 0)?;
    t.insert_ar_assign(inst, src);
    Ok(())
}

/// DOT4, DOT4_IEEE and MAX4 across lanes X..W
fn alu_reduction(
    t: &mut Transpiler<'_>,
    cf: &ControlFlowInst,
    group: &AluInstructionGroup,
    target: AluTarget,
    inst: &AluInst,
) -> Result<(), TranslateError> {
    let opcode = inst.opcode()?;
    if target != AluTarget::Reduction {
        return Err(TranslateError::ReductionOnly {
            name: opcode.name(),
        });
    }

    let lanes = [AluUnit::X, AluUnit::Y, AluUnit::Z, AluUnit::W].map(|unit| group.unit(unit));
    let mut src0 = Vec::with_capacity(4);
    let mut src1 = Vec::with_capacity(4);
    for lane in lanes.iter().flatten() {
        src0.push(t.gen_src_var(cf, group, lane, 0)?);
        if opcode != AluOpcode::Op2(AluOp2::Max4) {
            src1.push(t.gen_src_var(cf, group, lane, 1)?);
        }
    }

    let expr = match opcode {
        AluOpcode::Op2(AluOp2::Dot4 | AluOp2::Dot4Ieee) => format!(
            "dot(float4({}), float4({}))",
            src0.join(", "),
            src1.join(", ")
        ),
        AluOpcode::Op2(AluOp2::Max4) => format!(
            "max(max({}, {}), max({}, {}))",
            src0[0], src0[1], src0[2], src0[3]
        ),
        _ => {
            return Err(TranslateError::Unimplemented {
                kind: opcode.kind(),
                name: opcode.name(),
            })
        }
    };

    let value = t.float_result(inst, expr);
    t.out.line(format!("PVo = (float4)({});", value));
    for (unit, lane) in [AluUnit::X, AluUnit::Y, AluUnit::Z, AluUnit::W].iter().zip(lanes) {
        let (Some(lane), Some(chan)) = (lane, unit.chan()) else {
            continue;
        };
        if lane.write_mask() {
            t.defer_gpr_write(lane, &format!("PVo.{}", chan.as_char()))?;
        }
    }
    Ok(())
}

fn alu_op3(
    t: &mut Transpiler<'_>,
    cf: &ControlFlowInst,
    group: &AluInstructionGroup,
    target: AluTarget,
    inst: &AluInst,
) -> Result<(), TranslateError> {
    let opcode = inst.opcode()?;
    let a = t.gen_src_var(cf, group, inst, 0)?;
    let b = t.gen_src_var(cf, group, inst, 1)?;
    let c = t.gen_src_var(cf, group, inst, 2)?;

    let expr = match opcode {
        AluOpcode::Op3(AluOp3::Muladd | AluOp3::MuladdIeee) => format!("{} * {} + {}", a, b, c),
        AluOpcode::Op3(AluOp3::Cnde) => format!("({} == 0.0f) ? {} : {}", a, b, c),
        AluOpcode::Op3(AluOp3::Cndgt) => format!("({} > 0.0f) ? {} : {}", a, b, c),
        AluOpcode::Op3(AluOp3::Cndge) => format!("({} >= 0.0f) ? {} : {}", a, b, c),
        _ => {
            return Err(TranslateError::Unimplemented {
                kind: opcode.kind(),
                name: opcode.name(),
            })
        }
    };
    t.insert_dest_assign(lane(target), inst, expr)
}
