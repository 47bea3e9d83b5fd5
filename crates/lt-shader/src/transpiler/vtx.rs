//! Vertex fetch handlers

use lt_core::TranslateError;
use lt_microcode::{ControlFlowInst, DataFormat, FetchType, Sel, VertexFetchInst, VtxInst};
use tracing::trace;

use super::Transpiler;
use crate::desc::{MAX_SEMANTICS, SEMANTIC_UNUSED};
use crate::parser::VtxHandler;
use crate::record::{InputData, InputIndexMode};

/// First fetch constant of the vertex attribute buffers
pub const ATTRIBUTE_BUFFER_BASE: u32 = 160;
pub const MAX_ATTRIBUTE_BUFFERS: u32 = 16;

pub(super) fn handler<'a>(inst: VtxInst) -> Option<VtxHandler<Transpiler<'a>>> {
    let handler: VtxHandler<Transpiler<'a>> = match inst {
        VtxInst::Semantic => vtx_semantic,
        _ => return None,
    };
    Some(handler)
}

fn vtx_semantic(
    t: &mut Transpiler<'_>,
    _cf: &ControlFlowInst,
    inst: &VertexFetchInst,
) -> Result<(), TranslateError> {
    let buffer_id = inst.buffer_id();
    let buffer_index = buffer_id
        .checked_sub(ATTRIBUTE_BUFFER_BASE)
        .filter(|&index| index < MAX_ATTRIBUTE_BUFFERS)
        .ok_or(TranslateError::InvalidFetchBuffer { buffer_id })?;

    let (index_mode, divisor) = match FetchType::from_raw(inst.fetch_type()) {
        Some(FetchType::VertexData) => (InputIndexMode::PerVertex, 0),
        Some(FetchType::InstanceData) => {
            let divisor = match inst.src_sel_x() {
                Sel::W => 1,
                Sel::Y => t.instance_step_rates[0],
                Sel::Z => t.instance_step_rates[1],
                other => {
                    return Err(TranslateError::UnsupportedFetch {
                        what: "instance index selector",
                        value: other as u32,
                    })
                }
            };
            (InputIndexMode::PerInstance, divisor)
        }
        _ => {
            return Err(TranslateError::UnsupportedFetch {
                what: "fetch type",
                value: inst.fetch_type(),
            })
        }
    };

    let format = inst.data_format();
    let (bits, elem_count) = DataFormat::from_raw(format)
        .and_then(DataFormat::element_layout)
        .ok_or(TranslateError::UnsupportedFetch {
            what: "data format",
            value: format,
        })?;

    let semantic_id = inst.semantic_id();
    if semantic_id as usize >= MAX_SEMANTICS {
        return Err(TranslateError::UnsupportedFetch {
            what: "semantic id",
            value: semantic_id,
        });
    }
    let gpr = t.semantic_gprs[semantic_id as usize];
    if gpr == SEMANTIC_UNUSED {
        trace!("Semantic {} is not consumed, skipping fetch", semantic_id);
        return Ok(());
    }

    t.inputs.push(InputData {
        buffer_index,
        offset: inst.offset(),
        elem_width: bits / 8,
        elem_count,
        index_mode,
        divisor,
        location: semantic_id,
    });
    t.insert_assign_stmt(
        &format!("R[{}]", gpr),
        &format!("input.attr{}", semantic_id),
        inst.dst_sels(),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::StageResources;
    use crate::parser::ShaderParser;
    use lt_core::ShaderConfig;
    use lt_microcode::builder::{CfBuilder, ProgramBuilder, VtxBuilder};
    use lt_microcode::{CfInst, ShaderType};

    fn translate_fetch(
        fetches: Vec<VertexFetchInst>,
        semantic_gprs: [u8; MAX_SEMANTICS],
    ) -> Result<(String, Vec<InputData>), TranslateError> {
        let bytes = ProgramBuilder::new()
            .vtx_clause(CfBuilder::normal(CfInst::Vtx), fetches)
            .cf(CfBuilder::normal(CfInst::Return))
            .build();
        let config = ShaderConfig {
            emit_comments: false,
            log_source: false,
        };
        let mut t = Transpiler::new(&bytes, ShaderType::Fetch, true, &StageResources::default(), &config)
            .with_semantics(semantic_gprs, [4, 8]);
        t.translate()?;
        Ok((t.body().to_string(), t.inputs().to_vec()))
    }

    fn semantics(entries: &[(usize, u8)]) -> [u8; MAX_SEMANTICS] {
        let mut table = [SEMANTIC_UNUSED; MAX_SEMANTICS];
        for &(id, gpr) in entries {
            table[id] = gpr;
        }
        table
    }

    #[test]
    fn test_semantic_fetch() {
        let fetch = VtxBuilder::semantic(161, 2)
            .data_format(DataFormat::Fmt8_8_8_8)
            .offset(12)
            .dst_sels([Sel::X, Sel::Y, Sel::Z, Sel::One])
            .build();
        let (body, inputs) = translate_fetch(vec![fetch], semantics(&[(2, 1)])).unwrap();

        assert!(body.contains("R[1] = float4(input.attr2.x, input.attr2.y, input.attr2.z, 1.0f);"));
        assert_eq!(
            inputs,
            [InputData {
                buffer_index: 1,
                offset: 12,
                elem_width: 1,
                elem_count: 4,
                index_mode: InputIndexMode::PerVertex,
                divisor: 0,
                location: 2,
            }]
        );
    }

    #[test]
    fn test_instance_divisors() {
        let fetches = vec![
            VtxBuilder::semantic(160, 0)
                .fetch_type(FetchType::InstanceData)
                .src_sel_x(Sel::W)
                .build(),
            VtxBuilder::semantic(160, 1)
                .fetch_type(FetchType::InstanceData)
                .src_sel_x(Sel::Y)
                .build(),
            VtxBuilder::semantic(160, 2)
                .fetch_type(FetchType::InstanceData)
                .src_sel_x(Sel::Z)
                .build(),
        ];
        let (_, inputs) = translate_fetch(fetches, semantics(&[(0, 0), (1, 1), (2, 2)])).unwrap();
        let divisors: Vec<_> = inputs.iter().map(|i| i.divisor).collect();
        assert_eq!(divisors, [1, 4, 8]);
        assert!(inputs.iter().all(|i| i.index_mode == InputIndexMode::PerInstance));

        let fetch = VtxBuilder::semantic(160, 0)
            .fetch_type(FetchType::InstanceData)
            .src_sel_x(Sel::X)
            .build();
        assert_eq!(
            translate_fetch(vec![fetch], semantics(&[(0, 0)])).unwrap_err(),
            TranslateError::UnsupportedFetch {
                what: "instance index selector",
                value: 0
            }
        );
    }

    #[test]
    fn test_unused_semantic_skipped() {
        let fetch = VtxBuilder::semantic(160, 5).build();
        let (body, inputs) = translate_fetch(vec![fetch], semantics(&[])).unwrap();
        assert!(inputs.is_empty());
        assert!(!body.contains("attr5"));
    }

    #[test]
    fn test_fetch_errors() {
        let table = semantics(&[(0, 0)]);
        assert_eq!(
            translate_fetch(vec![VtxBuilder::semantic(128, 0).build()], table).unwrap_err(),
            TranslateError::InvalidFetchBuffer { buffer_id: 128 }
        );
        assert_eq!(
            translate_fetch(vec![VtxBuilder::semantic(176, 0).build()], table).unwrap_err(),
            TranslateError::InvalidFetchBuffer { buffer_id: 176 }
        );
        assert_eq!(
            translate_fetch(
                vec![VtxBuilder::semantic(160, 0).data_format(DataFormat::Fmt10_11_11).build()],
                table
            )
            .unwrap_err(),
            TranslateError::UnsupportedFetch {
                what: "data format",
                value: 21
            }
        );
        assert_eq!(
            translate_fetch(vec![VtxBuilder::semantic(160, 40).build()], table).unwrap_err(),
            TranslateError::UnsupportedFetch {
                what: "semantic id",
                value: 40
            }
        );
        assert_eq!(
            translate_fetch(
                vec![VtxBuilder::semantic(160, 0).fetch_type(FetchType::NoIndexOffset).build()],
                table
            )
            .unwrap_err(),
            TranslateError::UnsupportedFetch {
                what: "fetch type",
                value: 2
            }
        );
    }

    #[test]
    fn test_unimplemented_vtx() {
        let fetch = VtxBuilder::new(VtxInst::Fetch, 160).build();
        assert_eq!(
            translate_fetch(vec![fetch], semantics(&[])).unwrap_err().to_string(),
            "Unimplemented VTX instruction FETCH"
        );
    }
}
