//! Export handlers: position, parameter and pixel outputs

use bitflags::bitflags;
use lt_core::TranslateError;
use lt_microcode::{CfExpInst, ControlFlowInst, ExportType, ShaderType};

use super::Transpiler;
use crate::parser::CfHandler;

/// Pixel exports address render targets 0..8
pub const MAX_RENDER_TARGETS: u32 = 8;

bitflags! {
    /// Set of shader stages
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ShaderStages: u8 {
        const FETCH = 0x01;
        const VERTEX = 0x02;
        const GEOMETRY = 0x04;
        const PIXEL = 0x08;
    }
}

impl From<ShaderType> for ShaderStages {
    fn from(stage: ShaderType) -> Self {
        match stage {
            ShaderType::Fetch => ShaderStages::FETCH,
            ShaderType::Vertex => ShaderStages::VERTEX,
            ShaderType::Geometry => ShaderStages::GEOMETRY,
            ShaderType::Pixel => ShaderStages::PIXEL,
        }
    }
}

/// Stages allowed to issue exports of `kind`
fn export_stages(kind: ExportType) -> ShaderStages {
    match kind {
        ExportType::Pos | ExportType::Param => ShaderStages::VERTEX | ShaderStages::GEOMETRY,
        ExportType::Pixel => ShaderStages::PIXEL,
    }
}

/// Output struct member receiving export slot `slot`
fn output_member(kind: ExportType, slot: u32) -> String {
    match kind {
        ExportType::Pos => format!("output.pos{}", slot),
        ExportType::Param => format!("output.param{}", slot),
        ExportType::Pixel => format!("output.color{}", slot),
    }
}

pub(super) fn handler<'a>(inst: CfExpInst) -> Option<CfHandler<Transpiler<'a>>> {
    let handler: CfHandler<Transpiler<'a>> = match inst {
        CfExpInst::Exp | CfExpInst::ExpDone => cf_export,
        _ => return None,
    };
    Some(handler)
}

fn cf_export(t: &mut Transpiler<'_>, cf: &ControlFlowInst) -> Result<(), TranslateError> {
    t.cf_comment(cf.exp_inst()?.name());

    let stage = t.walk.stage;
    let array_base = cf.exp_array_base();
    let kind = ExportType::from_raw(cf.exp_type()).ok_or(TranslateError::InvalidExport {
        kind: "reserved",
        array_base,
        stage: stage.name(),
    })?;
    if !export_stages(kind).contains(ShaderStages::from(stage)) {
        return Err(TranslateError::InvalidExport {
            kind: kind.name(),
            array_base,
            stage: stage.name(),
        });
    }

    let sels = cf.exp_sels();
    for i in 0..cf.exp_burst_count() {
        let target = array_base + i;
        if kind == ExportType::Pixel && target >= MAX_RENDER_TARGETS {
            return Err(TranslateError::InvalidExport {
                kind: kind.name(),
                array_base: target,
                stage: stage.name(),
            });
        }

        let slot = t.exports.get_or_assign(kind, target);
        let gpr = cf.exp_rw_gpr() + i;
        let src = if cf.exp_rw_rel() {
            format!("R[{} + AL]", gpr)
        } else {
            format!("R[{}]", gpr)
        };
        t.insert_assign_stmt(&output_member(kind, slot), &src, sels);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::StageResources;
    use crate::parser::ShaderParser;
    use crate::record::ExportMap;
    use lt_core::ShaderConfig;
    use lt_microcode::builder::{CfBuilder, ProgramBuilder};
    use lt_microcode::Sel;

    fn translate_exports(
        stage: ShaderType,
        exports: Vec<CfBuilder>,
    ) -> Result<(String, ExportMap), TranslateError> {
        let mut program = ProgramBuilder::new();
        for export in exports {
            program = program.cf(export);
        }
        let bytes = program.build();
        let config = ShaderConfig {
            emit_comments: false,
            log_source: false,
        };
        let mut t = Transpiler::new(&bytes, stage, false, &StageResources::default(), &config);
        t.translate()?;
        Ok((t.body().to_string(), t.exports().clone()))
    }

    #[test]
    fn test_stage_sets() {
        assert!(export_stages(ExportType::Pos).contains(ShaderStages::GEOMETRY));
        assert!(!export_stages(ExportType::Param).contains(ShaderStages::PIXEL));
        assert!(!export_stages(ExportType::Pixel).contains(ShaderStages::FETCH));
    }

    #[test]
    fn test_vertex_exports() {
        let (body, exports) = translate_exports(
            ShaderType::Vertex,
            vec![
                CfBuilder::export(CfExpInst::Exp, ExportType::Pos, 60, 1),
                CfBuilder::export(CfExpInst::ExpDone, ExportType::Param, 3, 2)
                    .burst(2)
                    .sels([Sel::X, Sel::Y, Sel::Zero, Sel::One])
                    .end_of_program(),
            ],
        )
        .unwrap();

        let lines: Vec<_> = body.lines().map(str::trim).collect();
        assert_eq!(
            lines,
            [
                "output.pos0 = R[1];",
                "output.param0 = float4(R[2].x, R[2].y, 0.0f, 1.0f);",
                "output.param1 = float4(R[3].x, R[3].y, 0.0f, 1.0f);",
            ]
        );
        assert_eq!(exports.count(ExportType::Pos), 1);
        assert_eq!(exports.slot(ExportType::Param, 4), Some(1));
    }

    #[test]
    fn test_repeated_export_reuses_slot() {
        let (body, exports) = translate_exports(
            ShaderType::Pixel,
            vec![
                CfBuilder::export(CfExpInst::Exp, ExportType::Pixel, 1, 0),
                CfBuilder::export(CfExpInst::ExpDone, ExportType::Pixel, 1, 4).end_of_program(),
            ],
        )
        .unwrap();
        assert_eq!(exports.count(ExportType::Pixel), 1);
        assert!(body.contains("output.color0 = R[4];"));
    }

    #[test]
    fn test_invalid_exports() {
        let err = translate_exports(
            ShaderType::Pixel,
            vec![CfBuilder::export(CfExpInst::ExpDone, ExportType::Pos, 60, 0).end_of_program()],
        )
        .unwrap_err();
        assert_eq!(
            err,
            TranslateError::InvalidExport {
                kind: "position",
                array_base: 60,
                stage: "pixel"
            }
        );

        let err = translate_exports(
            ShaderType::Vertex,
            vec![CfBuilder::export(CfExpInst::ExpDone, ExportType::Pixel, 0, 0).end_of_program()],
        )
        .unwrap_err();
        assert!(matches!(err, TranslateError::InvalidExport { kind: "pixel", .. }));

        let err = translate_exports(
            ShaderType::Pixel,
            vec![CfBuilder::export(CfExpInst::ExpDone, ExportType::Pixel, 7, 0)
                .burst(2)
                .end_of_program()],
        )
        .unwrap_err();
        assert_eq!(
            err,
            TranslateError::InvalidExport {
                kind: "pixel",
                array_base: 8,
                stage: "pixel"
            }
        );

        let err = translate_exports(
            ShaderType::Vertex,
            vec![CfBuilder::export(CfExpInst::ExpDone, ExportType::Pos, 60, 0)
                .export_type_raw(3)
                .end_of_program()],
        )
        .unwrap_err();
        assert!(matches!(err, TranslateError::InvalidExport { kind: "reserved", .. }));
    }

    #[test]
    fn test_unimplemented_export() {
        let err = translate_exports(
            ShaderType::Vertex,
            vec![CfBuilder::export(CfExpInst::MemRing, ExportType::Param, 0, 0)],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Unimplemented CF EXPORT instruction MEM_RING");
    }
}
