//! Control flow handlers

use lt_core::TranslateError;
use lt_microcode::{CfAluInst, CfInst, ControlFlowInst};

use super::Transpiler;
use crate::parser::{CfHandler, ShaderParser};

pub(super) fn normal_handler<'a>(inst: CfInst) -> Option<CfHandler<Transpiler<'a>>> {
    let handler: CfHandler<Transpiler<'a>> = match inst {
        CfInst::Nop => cf_nop as CfHandler<Transpiler<'a>>,
        CfInst::Tex => cf_tex as CfHandler<Transpiler<'a>>,
        CfInst::Vtx | CfInst::VtxTc => cf_vtx as CfHandler<Transpiler<'a>>,
        CfInst::CallFs => cf_call_fs as CfHandler<Transpiler<'a>>,
        CfInst::Return => cf_return as CfHandler<Transpiler<'a>>,
        _ => return None,
    };
    Some(handler)
}

pub(super) fn alu_handler<'a>(inst: CfAluInst) -> Option<CfHandler<Transpiler<'a>>> {
    let handler: CfHandler<Transpiler<'a>> = match inst {
        CfAluInst::Alu => cf_alu as CfHandler<Transpiler<'a>>,
        _ => return None,
    };
    Some(handler)
}

fn cf_nop(t: &mut Transpiler<'_>, _cf: &ControlFlowInst) -> Result<(), TranslateError> {
    t.cf_comment(CfInst::Nop.name());
    Ok(())
}

fn cf_tex(t: &mut Transpiler<'_>, cf: &ControlFlowInst) -> Result<(), TranslateError> {
    t.cf_comment(CfInst::Tex.name());
    t.translate_tex_clause(cf)
}

fn cf_vtx(t: &mut Transpiler<'_>, cf: &ControlFlowInst) -> Result<(), TranslateError> {
    t.cf_comment(cf.cf_inst()?.name());
    t.translate_vtx_clause(cf)
}

fn cf_alu(t: &mut Transpiler<'_>, cf: &ControlFlowInst) -> Result<(), TranslateError> {
    t.cf_comment(CfAluInst::Alu.name());
    t.translate_alu_clause(cf)
}

fn cf_call_fs(t: &mut Transpiler<'_>, _cf: &ControlFlowInst) -> Result<(), TranslateError> {
    t.cf_comment(CfInst::CallFs.name());
    t.out.line("FSMain(input, R);");
    Ok(())
}

fn cf_return(t: &mut Transpiler<'_>, _cf: &ControlFlowInst) -> Result<(), TranslateError> {
    t.cf_comment(CfInst::Return.name());
    t.out.line("return;");
    Ok(())
}
