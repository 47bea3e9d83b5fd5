//! Final source assembly: resource declarations, interface structs and the
//! entry point wrapped around the translated body

use lt_microcode::{ExportType, ShaderType, TexDim};
use tracing::debug;

use super::{ShaderWriter, Transpiler};
use crate::record::{ExportMap, InputData, ResourceUsage, TranslatedShader, MAX_TEXTURES};

/// Number of general purpose registers
pub const NUM_GPRS: u32 = 128;

fn texture_type(dim: TexDim) -> &'static str {
    match dim {
        TexDim::Dim1D => "Texture1D",
        TexDim::Dim2D => "Texture2D",
        TexDim::Dim3D => "Texture3D",
        TexDim::Cubemap => "TextureCube",
        TexDim::Dim1DArray => "Texture1DArray",
        TexDim::Dim2DArray => "Texture2DArray",
        TexDim::Dim2DMsaa => "Texture2DMS<float4>",
        TexDim::Dim2DArrayMsaa => "Texture2DMSArray<float4>",
    }
}

fn declare_resources(w: &mut ShaderWriter, usage: &ResourceUsage, dims: &[Option<TexDim>; MAX_TEXTURES]) {
    let mut any = false;
    for (slot, dim) in dims.iter().enumerate() {
        if let (true, Some(dim)) = (usage.textures[slot], dim) {
            w.line(format!("{} texture{} : register(t{});", texture_type(*dim), slot, slot));
            any = true;
        }
    }
    for (slot, &used) in usage.samplers.iter().enumerate() {
        if used {
            w.line(format!("SamplerState sampler{} : register(s{});", slot, slot));
            any = true;
        }
    }
    for (block, &count) in usage.uniform_blocks.iter().enumerate() {
        if count > 0 {
            w.line(format!(
                "cbuffer UniformBlock{} : register(b{}) {{ float4 CB{}[{}]; }};",
                block, block, block, count
            ));
            any = true;
        }
    }
    if usage.cfile > 0 {
        w.line(format!("cbuffer Registers {{ float4 C[{}]; }};", usage.cfile));
        any = true;
    }
    if any {
        w.line("");
    }
}

fn declare_vertex_input(w: &mut ShaderWriter, inputs: &[InputData]) {
    w.line("struct VSInput");
    w.line("{");
    w.indent();
    w.line("uint vid : SV_VertexID;");
    w.line("uint iid : SV_InstanceID;");
    let mut locations: Vec<u32> = inputs.iter().map(|i| i.location).collect();
    locations.sort_unstable();
    locations.dedup();
    for location in locations {
        w.line(format!("float4 attr{} : ATTR{};", location, location));
    }
    w.dedent();
    w.line("};");
    w.line("");
}

/// Vertex/geometry output: position slot 0 is always present
fn declare_vertex_output(w: &mut ShaderWriter, name: &str, exports: &ExportMap) {
    w.line(format!("struct {}", name));
    w.line("{");
    w.indent();
    w.line("float4 pos0 : SV_Position;");
    for slot in 1..exports.count(ExportType::Pos) {
        w.line(format!("float4 pos{} : POSITION{};", slot, slot));
    }
    for entry in exports.of_kind(ExportType::Param) {
        w.line(format!("float4 param{} : TEXCOORD{};", entry.slot, entry.slot));
    }
    w.dedent();
    w.line("};");
    w.line("");
}

fn declare_pixel_interface(w: &mut ShaderWriter, num_inputs: u32, exports: &ExportMap) {
    w.line("struct PSInput");
    w.line("{");
    w.indent();
    w.line("float4 pos : SV_Position;");
    for i in 0..num_inputs {
        w.line(format!("float4 param{} : TEXCOORD{};", i, i));
    }
    w.dedent();
    w.line("};");
    w.line("");

    w.line("struct PSOutput");
    w.line("{");
    w.indent();
    for entry in exports.of_kind(ExportType::Pixel) {
        w.line(format!("float4 color{} : SV_Target{};", entry.slot, entry.array_base));
    }
    w.dedent();
    w.line("};");
    w.line("");
}

/// Working registers shared by every translated body
fn declare_locals(w: &mut ShaderWriter) {
    w.line("int4 AR = 0;");
    w.line("int AL = 0;");
    w.line("float4 PV = 0, PVo = 0;");
    w.line("float PS = 0, PSo = 0;");
    w.line("float4 tmp = 0;");
}

fn declare_registers(w: &mut ShaderWriter) {
    w.line(format!("float4 R[{}];", NUM_GPRS));
    w.line(format!("for (int i = 0; i < {}; ++i)", NUM_GPRS));
    w.line("{");
    w.indent();
    w.line("R[i] = 0;");
    w.dedent();
    w.line("}");
}

fn output_struct(stage: ShaderType) -> &'static str {
    match stage {
        ShaderType::Geometry => "GSOutput",
        ShaderType::Pixel => "PSOutput",
        ShaderType::Fetch | ShaderType::Vertex => "VSOutput",
    }
}

impl<'a> Transpiler<'a> {
    /// Wrap the translated body (and the fetch shader body, if called) into
    /// a complete source
    pub(super) fn assemble(self, fetch: Option<Transpiler<'_>>) -> TranslatedShader {
        let stage = self.walk.stage;
        let is_function = self.walk.is_function;

        let mut usage = self.usage;
        let mut inputs = Vec::new();
        if let Some(fetch) = &fetch {
            usage.merge(&fetch.usage);
            inputs.extend(fetch.inputs.iter().cloned());
        }
        inputs.extend(self.inputs);

        let mut w = ShaderWriter::new();
        w.line(format!("// Latte {} shader", stage.name()));
        w.line("");
        declare_resources(&mut w, &usage, &self.tex_dims);

        match stage {
            ShaderType::Fetch | ShaderType::Vertex => {
                declare_vertex_input(&mut w, &inputs);
                if stage == ShaderType::Vertex {
                    declare_vertex_output(&mut w, "VSOutput", &self.exports);
                }
            }
            ShaderType::Geometry => declare_vertex_output(&mut w, "GSOutput", &self.exports),
            ShaderType::Pixel => declare_pixel_interface(&mut w, self.num_inputs, &self.exports),
        }

        if let Some(fetch) = &fetch {
            w.line(format!("void FSMain(VSInput input, inout float4 R[{}])", NUM_GPRS));
            w.line("{");
            w.indent();
            declare_locals(&mut w);
            w.raw(fetch.out.as_str());
            w.dedent();
            w.line("}");
            w.line("");
        }

        let out = output_struct(stage);
        if is_function {
            let signature = match stage {
                ShaderType::Fetch => format!("void FSMain(VSInput input, inout float4 R[{}])", NUM_GPRS),
                ShaderType::Vertex => format!(
                    "void VSFunc(VSInput input, inout {} output, inout float4 R[{}])",
                    out, NUM_GPRS
                ),
                ShaderType::Geometry => {
                    format!("void GSFunc(inout {} output, inout float4 R[{}])", out, NUM_GPRS)
                }
                ShaderType::Pixel => format!(
                    "void PSFunc(PSInput input, inout {} output, inout float4 R[{}])",
                    out, NUM_GPRS
                ),
            };
            w.line(signature);
            w.line("{");
            w.indent();
            declare_locals(&mut w);
            w.raw(self.out.as_str());
            w.dedent();
            w.line("}");
        } else {
            let signature = match stage {
                ShaderType::Geometry => format!("{} GSMain()", out),
                ShaderType::Pixel => format!("{} PSMain(PSInput input)", out),
                ShaderType::Fetch | ShaderType::Vertex => format!("{} VSMain(VSInput input)", out),
            };
            w.line(signature);
            w.line("{");
            w.indent();
            w.line(format!("{} output = ({})0;", out, out));
            declare_registers(&mut w);
            if stage == ShaderType::Pixel {
                for i in 0..self.num_inputs.min(NUM_GPRS) {
                    w.line(format!("R[{}] = input.param{};", i, i));
                }
            }
            declare_locals(&mut w);
            w.raw(self.out.as_str());
            w.line("return output;");
            w.dedent();
            w.line("}");
        }

        let code = w.into_string();
        if self.config.log_source {
            debug!("Generated {} shader:\n{}", stage.name(), code);
        }

        TranslatedShader {
            stage,
            code,
            usage,
            inputs,
            calls_fs: self.walk.calls_fs,
            exports: self.exports,
        }
    }
}
