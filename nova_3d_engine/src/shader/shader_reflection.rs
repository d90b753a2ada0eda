/// SPIR-V reflection of compiled stages
///
/// Extracts constant buffer layouts (std140 offsets), texture and sampler
/// slots, and stage input/output interfaces using spirq.

use std::fmt;
use crate::error::{Error, Result};
use crate::graphics_device::ShaderStage;

/// Scalar component type of a reflected variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Float32,
    Float64,
    Int32,
    UInt32,
    Bool,
}

/// Type of a reflected variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReflectedType {
    Scalar(ScalarKind),
    /// (component kind, component count)
    Vector(ScalarKind, u32),
    /// (component kind, column count, row count)
    Matrix(ScalarKind, u32, u32),
    Array {
        element_type: Box<ReflectedType>,
        count: Option<u32>,
        stride: Option<u32>,
    },
    Struct(Vec<ConstantVariable>),
    /// Images, samplers and anything else without a CPU layout
    Opaque,
}

/// One member of a constant buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantVariable {
    pub name: String,
    /// Byte offset inside the buffer
    pub offset: u32,
    /// Byte size
    pub size: u32,
    pub ty: ReflectedType,
}

/// Layout of one constant (uniform) buffer in one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantBufferLayout {
    pub name: String,
    pub stage: ShaderStage,
    pub set: u32,
    pub slot: u32,
    /// Reflected byte size; the GPU buffer is allocated with exactly this size
    pub size: u32,
    /// Members in declaration order
    pub variables: Vec<ConstantVariable>,
}

/// How a texture is accessed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureBindingKind {
    /// Read through a sampler
    Sampled,
    /// Read-write storage image
    Storage,
}

/// Texture slot discovered by reflection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureBinding {
    pub name: String,
    pub stage: ShaderStage,
    pub slot: u32,
    pub kind: TextureBindingKind,
}

/// Sampler slot discovered by reflection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerBinding {
    pub name: String,
    pub stage: ShaderStage,
    pub slot: u32,
}

/// Stage input or output with an explicit location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceVariable {
    pub name: String,
    pub location: u32,
    pub ty: ReflectedType,
}

/// Everything reflection found in one compiled stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReflection {
    pub stage: ShaderStage,
    pub constant_buffers: Vec<ConstantBufferLayout>,
    pub textures: Vec<TextureBinding>,
    pub samplers: Vec<SamplerBinding>,
    pub inputs: Vec<InterfaceVariable>,
    pub outputs: Vec<InterfaceVariable>,
}

impl StageReflection {
    pub fn empty(stage: ShaderStage) -> Self {
        Self {
            stage,
            constant_buffers: Vec::new(),
            textures: Vec::new(),
            samplers: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

/// Reflect a compiled stage
pub fn reflect_stage(stage: ShaderStage, code: &[u32]) -> Result<StageReflection> {
    use spirq::ty::DescriptorType;
    use spirq::var::Variable;

    let entry_points = spirq::ReflectConfig::new()
        .spv(code)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| Error::ReflectionFailed(format!("{:?}", e)))?;

    let entry_point = entry_points
        .first()
        .ok_or_else(|| Error::ReflectionFailed("no entry point in module".to_string()))?;

    let mut reflection = StageReflection::empty(stage);

    for var in entry_point.vars.iter() {
        match var {
            Variable::Descriptor { name, desc_bind, desc_ty, ty, .. } => {
                let name = name.clone().unwrap_or_default();
                match desc_ty {
                    DescriptorType::UniformBuffer() => {
                        let variables = unwrap_block_members(struct_members(ty));
                        let size = ty
                            .nbyte()
                            .map(|s| s as u32)
                            .unwrap_or_else(|| members_extent(&variables));
                        reflection.constant_buffers.push(ConstantBufferLayout {
                            name,
                            stage,
                            set: desc_bind.set(),
                            slot: desc_bind.bind(),
                            size,
                            variables,
                        });
                    }
                    DescriptorType::SampledImage() | DescriptorType::CombinedImageSampler() => {
                        reflection.textures.push(TextureBinding {
                            name,
                            stage,
                            slot: desc_bind.bind(),
                            kind: TextureBindingKind::Sampled,
                        });
                    }
                    DescriptorType::StorageImage(..) => {
                        reflection.textures.push(TextureBinding {
                            name,
                            stage,
                            slot: desc_bind.bind(),
                            kind: TextureBindingKind::Storage,
                        });
                    }
                    DescriptorType::Sampler() => {
                        reflection.samplers.push(SamplerBinding {
                            name,
                            stage,
                            slot: desc_bind.bind(),
                        });
                    }
                    _ => {}
                }
            }
            Variable::Input { name, location, ty, .. } => {
                reflection.inputs.push(InterfaceVariable {
                    name: name.clone().unwrap_or_default(),
                    location: location.loc(),
                    ty: convert_type(ty),
                });
            }
            Variable::Output { name, location, ty, .. } => {
                reflection.outputs.push(InterfaceVariable {
                    name: name.clone().unwrap_or_default(),
                    location: location.loc(),
                    ty: convert_type(ty),
                });
            }
            _ => {}
        }
    }

    reflection.constant_buffers.sort_by_key(|b| (b.set, b.slot));
    reflection.inputs.sort_by_key(|v| v.location);
    reflection.outputs.sort_by_key(|v| v.location);
    Ok(reflection)
}

fn convert_scalar(scalar_ty: &spirq::ty::ScalarType) -> ScalarKind {
    use spirq::ty::ScalarType;
    match scalar_ty {
        ScalarType::Float { bits: 64 } => ScalarKind::Float64,
        ScalarType::Float { .. } => ScalarKind::Float32,
        ScalarType::Integer { is_signed: true, .. } => ScalarKind::Int32,
        ScalarType::Integer { is_signed: false, .. } => ScalarKind::UInt32,
        ScalarType::Boolean => ScalarKind::Bool,
        ScalarType::Void => ScalarKind::Float32,
    }
}

fn convert_type(ty: &spirq::ty::Type) -> ReflectedType {
    use spirq::ty::Type;
    match ty {
        Type::Scalar(s) => ReflectedType::Scalar(convert_scalar(s)),
        Type::Vector(v) => ReflectedType::Vector(convert_scalar(&v.scalar_ty), v.nscalar),
        Type::Matrix(m) => ReflectedType::Matrix(
            convert_scalar(&m.vector_ty.scalar_ty),
            m.nvector,
            m.vector_ty.nscalar,
        ),
        Type::Array(a) => ReflectedType::Array {
            element_type: Box::new(convert_type(&a.element_ty)),
            count: a.nelement.map(|n| n as u32),
            stride: a.stride.map(|s| s as u32),
        },
        Type::Struct(_) => ReflectedType::Struct(struct_members(ty)),
        _ => ReflectedType::Opaque,
    }
}

fn struct_members(ty: &spirq::ty::Type) -> Vec<ConstantVariable> {
    let spirq::ty::Type::Struct(st) = ty else {
        return Vec::new();
    };
    st.members
        .iter()
        .map(|m| ConstantVariable {
            name: m.name.clone().unwrap_or_default(),
            offset: m.offset.unwrap_or(0) as u32,
            size: m.ty.nbyte().unwrap_or(0) as u32,
            ty: convert_type(&m.ty),
        })
        .collect()
}

/// Flatten the unnamed wrapper struct naga emits around uniform block members
///
/// The wrapper's offset is added to each inner member. Repeats until the
/// members are no longer a single anonymous struct.
pub fn unwrap_block_members(mut variables: Vec<ConstantVariable>) -> Vec<ConstantVariable> {
    while variables.len() == 1 && variables[0].name.is_empty() {
        let wrapper = variables.remove(0);
        match wrapper.ty {
            ReflectedType::Struct(inner) => {
                variables = inner
                    .into_iter()
                    .map(|mut v| {
                        v.offset += wrapper.offset;
                        v
                    })
                    .collect();
            }
            ty => return vec![ConstantVariable { ty, ..wrapper }],
        }
    }
    variables
}

fn members_extent(variables: &[ConstantVariable]) -> u32 {
    variables.iter().map(|v| v.offset + v.size).max().unwrap_or(0)
}

// ===== SIGNATURE CHECK =====

/// Producer output / consumer input disagreement between two stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMismatch {
    pub producer: ShaderStage,
    pub consumer: ShaderStage,
    pub location: u32,
    pub input_name: String,
    pub output: Option<ReflectedType>,
    pub input: ReflectedType,
}

impl fmt::Display for SignatureMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.output {
            None => write!(
                f,
                "{:?} input '{}' at location {} has no matching {:?} output",
                self.consumer, self.input_name, self.location, self.producer
            ),
            Some(output) => write!(
                f,
                "{:?} input '{}' at location {} is {:?} but {:?} writes {:?}",
                self.consumer, self.input_name, self.location, self.input, self.producer, output
            ),
        }
    }
}

/// Compare every graphics stage's inputs against the previous present stage's
/// outputs
///
/// `reflections` may be in any order; compute stages and the vertex stage's
/// own inputs (vertex attributes) are not checked.
pub fn check_signatures(reflections: &[&StageReflection]) -> Vec<SignatureMismatch> {
    let mut graphics: Vec<&StageReflection> = reflections
        .iter()
        .copied()
        .filter(|r| r.stage != ShaderStage::Compute)
        .collect();
    graphics.sort_by_key(|r| r.stage);

    let mut mismatches = Vec::new();
    for pair in graphics.windows(2) {
        let (producer, consumer) = (pair[0], pair[1]);
        for input in &consumer.inputs {
            let output = producer.outputs.iter().find(|o| o.location == input.location);
            if output.map(|o| &o.ty) != Some(&input.ty) {
                mismatches.push(SignatureMismatch {
                    producer: producer.stage,
                    consumer: consumer.stage,
                    location: input.location,
                    input_name: input.name.clone(),
                    output: output.map(|o| o.ty.clone()),
                    input: input.ty.clone(),
                });
            }
        }
    }
    mismatches
}

#[cfg(test)]
#[path = "shader_reflection_tests.rs"]
mod tests;
