//! Texture fetch handlers

use lt_core::TranslateError;
use lt_microcode::{Chan, ControlFlowInst, TexCoordType, TexDim, TexInst, TextureFetchInst};

use super::Transpiler;
use crate::parser::TexHandler;
use crate::record::{MAX_SAMPLERS, MAX_TEXTURES};

pub(super) fn handler<'a>(inst: TexInst) -> Option<TexHandler<Transpiler<'a>>> {
    let handler: TexHandler<Transpiler<'a>> = match inst {
        TexInst::Sample => tex_sample,
        _ => return None,
    };
    Some(handler)
}

/// Swizzle of `tmp` holding the coordinates for a texture of `dim`
fn coord_swizzle(dim: TexDim) -> &'static str {
    match dim {
        TexDim::Dim1D => "x",
        TexDim::Dim1DArray | TexDim::Dim2D | TexDim::Dim2DMsaa => "xy",
        TexDim::Dim3D | TexDim::Cubemap | TexDim::Dim2DArray | TexDim::Dim2DArrayMsaa => "xyz",
    }
}

/// Texel offset argument, `None` when every offset is zero
fn offset_arg(dim: TexDim, offsets: [i32; 3]) -> Result<Option<String>, TranslateError> {
    if offsets == [0; 3] {
        return Ok(None);
    }
    let [x, y, z] = offsets;
    let arg = match dim {
        TexDim::Dim1D | TexDim::Dim1DArray => format!("{}", x),
        TexDim::Dim2D | TexDim::Dim2DArray | TexDim::Dim2DMsaa | TexDim::Dim2DArrayMsaa => {
            format!("int2({}, {})", x, y)
        }
        TexDim::Dim3D => format!("int3({}, {}, {})", x, y, z),
        TexDim::Cubemap => {
            return Err(TranslateError::UnexpectedTextureDim {
                dim: dim.name(),
                context: "texel offsets",
            })
        }
    };
    Ok(Some(arg))
}

fn tex_sample(
    t: &mut Transpiler<'_>,
    _cf: &ControlFlowInst,
    inst: &TextureFetchInst,
) -> Result<(), TranslateError> {
    if inst.bc_frac_mode() {
        return Err(TranslateError::FracAddressingMode);
    }
    for (chan, coord_type) in Chan::ALL.iter().zip(inst.coord_types()) {
        if coord_type == TexCoordType::Unnormalized {
            return Err(TranslateError::NonNormalizedCoords {
                channel: chan.as_char(),
            });
        }
    }

    let texture = inst.resource_id();
    let sampler = inst.sampler_id();
    if texture as usize >= MAX_TEXTURES {
        return Err(TranslateError::ResourceOutOfRange {
            kind: "texture",
            slot: texture,
        });
    }
    if sampler as usize >= MAX_SAMPLERS {
        return Err(TranslateError::ResourceOutOfRange {
            kind: "sampler",
            slot: sampler,
        });
    }
    let dim = t.tex_dims[texture as usize].ok_or(TranslateError::UnknownTextureDim {
        slot: texture,
        context: "texture coordinates",
    })?;
    let offset = offset_arg(dim, inst.offsets())?;

    let src = if inst.src_rel() {
        format!("R[{} + AL]", inst.src_gpr())
    } else {
        format!("R[{}]", inst.src_gpr())
    };
    let dst = if inst.dst_rel() {
        format!("R[{} + AL]", inst.dst_gpr())
    } else {
        format!("R[{}]", inst.dst_gpr())
    };

    t.insert_assign_stmt("tmp", &src, inst.src_sels());
    let coords = format!("tmp.{}", coord_swizzle(dim));
    let call = match offset {
        Some(offset) => format!(
            "tmp = texture{}.Sample(sampler{}, {}, {});",
            texture, sampler, coords, offset
        ),
        None => format!("tmp = texture{}.Sample(sampler{}, {});", texture, sampler, coords),
    };
    t.out.line(call);
    t.insert_assign_stmt(&dst, "tmp", inst.dst_sels());

    t.usage.use_texture(texture as usize);
    t.usage.use_sampler(sampler as usize);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::StageResources;
    use crate::parser::ShaderParser;
    use crate::record::ResourceUsage;
    use lt_core::ShaderConfig;
    use lt_microcode::builder::{CfBuilder, ProgramBuilder, TexBuilder};
    use lt_microcode::{CfInst, Sel, ShaderType};

    fn translate_tex(
        fetch: TextureFetchInst,
        resources: &StageResources,
    ) -> Result<(String, ResourceUsage), TranslateError> {
        let bytes = ProgramBuilder::new()
            .tex_clause(CfBuilder::normal(CfInst::Tex), vec![fetch])
            .cf(CfBuilder::normal(CfInst::Nop).end_of_program())
            .build();
        let config = ShaderConfig {
            emit_comments: false,
            log_source: false,
        };
        let mut t = Transpiler::new(&bytes, ShaderType::Pixel, false, resources, &config);
        t.translate()?;
        Ok((t.body().to_string(), t.usage().clone()))
    }

    #[test]
    fn test_coord_swizzle() {
        assert_eq!(coord_swizzle(TexDim::Dim1D), "x");
        assert_eq!(coord_swizzle(TexDim::Dim2DMsaa), "xy");
        assert_eq!(coord_swizzle(TexDim::Dim1DArray), "xy");
        assert_eq!(coord_swizzle(TexDim::Cubemap), "xyz");
        assert_eq!(coord_swizzle(TexDim::Dim2DArrayMsaa), "xyz");
    }

    #[test]
    fn test_offset_arg() {
        assert_eq!(offset_arg(TexDim::Cubemap, [0, 0, 0]), Ok(None));
        assert_eq!(offset_arg(TexDim::Dim1DArray, [3, 1, 0]), Ok(Some("3".to_string())));
        assert_eq!(
            offset_arg(TexDim::Dim2DArray, [-1, 2, 0]),
            Ok(Some("int2(-1, 2)".to_string()))
        );
        assert_eq!(
            offset_arg(TexDim::Dim3D, [1, 2, -3]),
            Ok(Some("int3(1, 2, -3)".to_string()))
        );
        assert_eq!(
            offset_arg(TexDim::Cubemap, [1, 0, 0]),
            Err(TranslateError::UnexpectedTextureDim {
                dim: "CUBEMAP",
                context: "texel offsets"
            })
        );
    }

    #[test]
    fn test_sample_2d() {
        let resources = StageResources::default().with_texture(3, TexDim::Dim2D, 0);
        let fetch = TexBuilder::new(TexInst::Sample, 3, 1)
            .src(2, [Sel::X, Sel::Y, Sel::Mask, Sel::Mask])
            .dst(4, [Sel::X, Sel::Y, Sel::Z, Sel::W])
            .build();
        let (body, usage) = translate_tex(fetch, &resources).unwrap();

        assert_eq!(
            body,
            "    tmp.xy = R[2].xy;\n    tmp = texture3.Sample(sampler1, tmp.xy);\n    R[4] = tmp;\n"
        );
        assert_eq!(usage.texture_count(), 1);
        assert!(usage.textures[3]);
        assert!(usage.samplers[1]);
        assert_eq!(usage.samplers.iter().filter(|&&s| s).count(), 1);
    }

    #[test]
    fn test_sample_with_offset() {
        let resources = StageResources::default().with_texture(0, TexDim::Dim3D, 0);
        let fetch = TexBuilder::new(TexInst::Sample, 0, 0).offset(1, -2, 3).build();
        let (body, _) = translate_tex(fetch, &resources).unwrap();
        assert!(body.contains("tmp = texture0.Sample(sampler0, tmp.xyz, int3(1, -2, 3));"));
    }

    #[test]
    fn test_sample_rejects_unnormalized() {
        let resources = StageResources::default().with_texture(0, TexDim::Dim2D, 0);
        let fetch = TexBuilder::new(TexInst::Sample, 0, 0).unnormalized(Chan::Y).build();
        assert_eq!(
            translate_tex(fetch, &resources).unwrap_err(),
            TranslateError::NonNormalizedCoords { channel: 'y' }
        );

        let fetch = TexBuilder::new(TexInst::Sample, 0, 0).frac_mode().build();
        assert_eq!(
            translate_tex(fetch, &resources).unwrap_err(),
            TranslateError::FracAddressingMode
        );
    }

    #[test]
    fn test_sample_requires_dimension() {
        let fetch = TexBuilder::new(TexInst::Sample, 5, 0).build();
        assert_eq!(
            translate_tex(fetch, &StageResources::default()).unwrap_err(),
            TranslateError::UnknownTextureDim {
                slot: 5,
                context: "texture coordinates"
            }
        );

        let fetch = TexBuilder::new(TexInst::Sample, 40, 0).build();
        assert_eq!(
            translate_tex(fetch, &StageResources::default()).unwrap_err(),
            TranslateError::ResourceOutOfRange {
                kind: "texture",
                slot: 40
            }
        );
    }

    #[test]
    fn test_unimplemented_tex() {
        let fetch = TexBuilder::new(TexInst::SampleL, 0, 0).build();
        assert_eq!(
            translate_tex(fetch, &StageResources::default())
                .unwrap_err()
                .to_string(),
            "Unimplemented TEX instruction SAMPLE_L"
        );
    }
}
