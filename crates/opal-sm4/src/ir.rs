//! In-memory representation of a decoded shader program: operands,
//! instructions, declarations, signatures.
//!
//! The types here aim for lossless round trips: everything the wire format
//! distinguishes (selection modes, index representations, residual control
//! bits) is kept explicitly so re-encoding a decoded program reproduces the
//! original token stream byte for byte.

use bitflags::bitflags;

use crate::op::{
    ComponentType, InputPrimitive, InterpolationMode, MinPrecision, Opcode, OutputTopology,
    RegisterType, ResourceDataType, ResourceType, SamplerMode, SysVal, TessDomain,
    TessOutputPrimitive, TessPartitioning,
};

// ---- Version ----

/// Shader pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Pixel,
    Vertex,
    Geometry,
    Hull,
    Domain,
    Compute,
}

impl ShaderStage {
    /// Looks up the version-token type field.
    pub fn from_wire(ty: u16) -> Option<Self> {
        Some(match ty {
            0 => Self::Pixel,
            1 => Self::Vertex,
            2 => Self::Geometry,
            3 => Self::Hull,
            4 => Self::Domain,
            5 => Self::Compute,
            _ => return None,
        })
    }

    /// Version-token type field.
    pub fn wire(self) -> u16 {
        match self {
            Self::Pixel => 0,
            Self::Vertex => 1,
            Self::Geometry => 2,
            Self::Hull => 3,
            Self::Domain => 4,
            Self::Compute => 5,
        }
    }

    /// Lowercase stage prefix (`ps`, `vs`, ...).
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Pixel => "ps",
            Self::Vertex => "vs",
            Self::Geometry => "gs",
            Self::Hull => "hs",
            Self::Domain => "ds",
            Self::Compute => "cs",
        }
    }
}

/// Shader model version: stage plus major/minor pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub stage: ShaderStage,
    pub major: u8,
    pub minor: u8,
}

impl Version {
    /// Whether this is at least shader model `major.minor`.
    pub fn at_least(self, major: u8, minor: u8) -> bool {
        (self.major, self.minor) >= (major, minor)
    }

    /// Shader model 5.1 changes descriptor register encoding.
    pub fn is_51(self) -> bool {
        self.at_least(5, 1)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}_{}", self.stage.prefix(), self.major, self.minor)
    }
}

// ---- Components ----

/// Four-bit destination write mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct WriteMask(pub u8);

impl WriteMask {
    pub const NONE: Self = Self(0);
    pub const X: Self = Self(0b0001);
    pub const Y: Self = Self(0b0010);
    pub const Z: Self = Self(0b0100);
    pub const W: Self = Self(0b1000);
    pub const ALL: Self = Self(0b1111);

    /// Number of set components.
    pub fn component_count(self) -> u32 {
        (self.0 & 0xf).count_ones()
    }

    /// Whether every component of `other` is also set here.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no component is shared with `other`.
    pub fn is_disjoint(self, other: Self) -> bool {
        self.0 & other.0 == 0
    }

    /// Union of both masks.
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether the set components form one contiguous run starting anywhere.
    pub fn is_contiguous(self) -> bool {
        let m = self.0 & 0xf;
        if m == 0 {
            return true;
        }
        let shifted = m >> m.trailing_zeros();
        (shifted & (shifted + 1)) == 0
    }
}

/// Four-component swizzle, one source component index (0..=3) per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Swizzle(pub [u8; 4]);

impl Swizzle {
    pub const IDENTITY: Self = Self([0, 1, 2, 3]);

    /// Replicates one component into all four slots.
    pub fn replicate(component: u8) -> Self {
        Self([component; 4])
    }

    /// Unpacks the 2-bits-per-slot wire form.
    pub fn from_packed(packed: u8) -> Self {
        Self([
            packed & 0x3,
            (packed >> 2) & 0x3,
            (packed >> 4) & 0x3,
            (packed >> 6) & 0x3,
        ])
    }

    /// Packs into the 2-bits-per-slot wire form.
    pub fn packed(self) -> u8 {
        (self.0[0] & 0x3)
            | ((self.0[1] & 0x3) << 2)
            | ((self.0[2] & 0x3) << 4)
            | ((self.0[3] & 0x3) << 6)
    }
}

impl Default for Swizzle {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ---- Operands ----

/// Source operand modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperandModifier {
    #[default]
    None,
    Neg,
    Abs,
    AbsNeg,
}

impl OperandModifier {
    /// Looks up the extended-operand wire field.
    pub fn from_wire(wire: u32) -> Option<Self> {
        Some(match wire {
            0 => Self::None,
            1 => Self::Neg,
            2 => Self::Abs,
            3 => Self::AbsNeg,
            _ => return None,
        })
    }

    /// Extended-operand wire field.
    pub fn wire(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Neg => 1,
            Self::Abs => 2,
            Self::AbsNeg => 3,
        }
    }
}

/// Destination operand modifier. The wire saturate bit lives on the opcode
/// token; decoding moves it onto the destinations and encoding derives it
/// back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DstModifier {
    #[default]
    None,
    Saturate,
}

/// Immediate operand payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Immediate {
    /// Scalar 32-bit literal (raw bits).
    U32(u32),
    /// Four-component 32-bit literal (raw bits).
    U32x4([u32; 4]),
    /// Scalar 64-bit literal (raw bits).
    U64(u64),
    /// Four-component 64-bit literal (raw bits).
    U64x4([u64; 4]),
}

/// One register index slot: a literal offset, a relative-addressing operand,
/// or both summed.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterIndex {
    /// Literal offset, absent for purely relative slots.
    pub offset: Option<u32>,
    /// Relative-addressing sub-operand.
    pub relative: Option<Box<SrcOperand>>,
}

impl RegisterIndex {
    /// Plain literal index.
    pub fn literal(offset: u32) -> Self {
        Self { offset: Some(offset), relative: None }
    }

    /// The literal part, zero when purely relative.
    pub fn value(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

/// A register reference: type, index chain, optional immediate payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Register {
    pub ty: RegisterType,
    /// Index slots, outermost first. At most three.
    pub indices: Vec<RegisterIndex>,
    /// Literal payload for immediate register types.
    pub immediate: Option<Immediate>,
}

impl Register {
    /// Register with a single literal index.
    pub fn indexed(ty: RegisterType, index: u32) -> Self {
        Self { ty, indices: vec![RegisterIndex::literal(index)], immediate: None }
    }

    /// Register with no indices (`oDepth`, `vCoverage`, ...).
    pub fn unindexed(ty: RegisterType) -> Self {
        Self { ty, indices: Vec::new(), immediate: None }
    }

    /// First literal index, if any.
    pub fn index0(&self) -> Option<u32> {
        self.indices.first().map(RegisterIndex::value)
    }
}

/// Component dimension of an operand token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperandDimension {
    Zero,
    One,
    #[default]
    Four,
}

/// Component selection of a four-component source operand. The wire format
/// distinguishes three encodings, so the decoded form keeps which one was
/// used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrcSelection {
    /// No selection bits (zero- or one-component operands).
    None,
    /// Write-mask style selection.
    Mask(WriteMask),
    /// Full swizzle.
    Swizzle(Swizzle),
    /// Replicated scalar component.
    Select1(u8),
}

/// Source operand.
#[derive(Debug, Clone, PartialEq)]
pub struct SrcOperand {
    pub reg: Register,
    pub dimension: OperandDimension,
    pub selection: SrcSelection,
    pub modifier: OperandModifier,
    pub precision: MinPrecision,
    pub non_uniform: bool,
}

impl SrcOperand {
    /// Plain swizzled reference to a register.
    pub fn swizzled(reg: Register, swizzle: Swizzle) -> Self {
        Self {
            reg,
            dimension: OperandDimension::Four,
            selection: SrcSelection::Swizzle(swizzle),
            modifier: OperandModifier::None,
            precision: MinPrecision::Default,
            non_uniform: false,
        }
    }

    /// Effective swizzle regardless of the wire selection encoding.
    pub fn swizzle(&self) -> Swizzle {
        match self.selection {
            SrcSelection::None | SrcSelection::Mask(_) => Swizzle::IDENTITY,
            SrcSelection::Swizzle(s) => s,
            SrcSelection::Select1(c) => Swizzle::replicate(c),
        }
    }
}

/// Destination operand.
#[derive(Debug, Clone, PartialEq)]
pub struct DstOperand {
    pub reg: Register,
    pub dimension: OperandDimension,
    /// Write mask; meaningful only for four-component destinations.
    pub mask: WriteMask,
    pub modifier: DstModifier,
    pub precision: MinPrecision,
    pub non_uniform: bool,
}

impl DstOperand {
    /// Masked four-component destination.
    pub fn masked(reg: Register, mask: WriteMask) -> Self {
        Self {
            reg,
            dimension: OperandDimension::Four,
            mask,
            modifier: DstModifier::None,
            precision: MinPrecision::Default,
            non_uniform: false,
        }
    }
}

/// Signed texel offsets from an `aoffimmi` extended opcode token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TexelOffset {
    pub u: i8,
    pub v: i8,
    pub w: i8,
}

// ---- Flags ----

bitflags! {
    /// `dcl_globalFlags` payload. Bit values are the opcode controls field
    /// shifted down to bit zero.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct GlobalFlags: u32 {
        const REFACTORING_ALLOWED = 0x01;
        const ENABLE_DOUBLES = 0x02;
        const FORCE_EARLY_DEPTH_STENCIL = 0x04;
        const ENABLE_RAW_STRUCTURED_IN_NON_CS = 0x08;
        const SKIP_OPTIMIZATION = 0x10;
        const ENABLE_MINIMUM_PRECISION = 0x20;
        const ENABLE_DOUBLE_EXTENSIONS = 0x40;
        const ENABLE_SHADER_EXTENSIONS = 0x80;
    }
}

bitflags! {
    /// UAV declaration flags (opcode controls, shifted down).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct UavFlags: u32 {
        const GLOBALLY_COHERENT = 0x20;
        const RASTERIZER_ORDERED = 0x40;
    }
}

bitflags! {
    /// `sync` instruction flags (opcode controls, shifted down).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SyncFlags: u32 {
        const THREADS_IN_GROUP = 0x1;
        const THREAD_GROUP_SHARED_MEMORY = 0x2;
        const UAV_GROUP = 0x4;
        const UAV_GLOBAL = 0x8;
    }
}

bitflags! {
    /// Feature flags recorded in the `SFI0` container section.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FeatureFlags: u64 {
        const DOUBLES = 0x0001;
        const COMPUTE_SHADERS_PLUS_RAW_AND_STRUCTURED_BUFFERS_VIA_SHADER_4_X = 0x0002;
        const UAVS_AT_EVERY_STAGE = 0x0004;
        const SIXTY_FOUR_UAVS = 0x0008;
        const MINIMUM_PRECISION = 0x0010;
        const DOUBLE_EXTENSIONS_11_1 = 0x0020;
        const SHADER_EXTENSIONS_11_1 = 0x0040;
        const LEVEL_9_COMPARISON_FILTERING = 0x0080;
        const TILED_RESOURCES = 0x0100;
        const STENCIL_REF = 0x0200;
        const INNER_COVERAGE = 0x0400;
        const TYPED_UAV_LOAD_ADDITIONAL_FORMATS = 0x0800;
        const ROVS = 0x1000;
        const VIEWPORT_AND_RT_ARRAY_INDEX_FROM_ANY_SHADER_FEEDING_RASTERIZER = 0x2000;
    }
}

// ---- Declarations ----

/// Descriptor binding range: register space plus inclusive first/last
/// register. Pre-5.1 programs always have `space == 0` and
/// `first == last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegisterRange {
    pub space: u32,
    pub first: u32,
    pub last: u32,
}

/// Resource dimension annotation carried by `ld`/`store` extended opcode
/// tokens and structured declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceInfo {
    pub ty: ResourceType,
    /// Structure byte stride; zero unless structured.
    pub stride: u32,
}

/// Declaration payload attached to `dcl_*` instructions and custom-data
/// blocks.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    GlobalFlags(GlobalFlags),
    Temps(u32),
    IndexableTemp {
        id: u32,
        /// Array length in registers.
        count: u32,
        /// Components per register (1..=4).
        components: u32,
    },
    Input {
        reg: DstOperand,
    },
    InputSgv {
        reg: DstOperand,
        sysval: SysVal,
    },
    InputSiv {
        reg: DstOperand,
        sysval: SysVal,
    },
    InputPs {
        reg: DstOperand,
        interpolation: InterpolationMode,
    },
    InputPsSgv {
        reg: DstOperand,
        sysval: SysVal,
    },
    InputPsSiv {
        reg: DstOperand,
        sysval: SysVal,
        interpolation: InterpolationMode,
    },
    Output {
        reg: DstOperand,
    },
    OutputSgv {
        reg: DstOperand,
        sysval: SysVal,
    },
    OutputSiv {
        reg: DstOperand,
        sysval: SysVal,
    },
    IndexRange {
        reg: DstOperand,
        /// Number of consecutive registers covered.
        count: u32,
    },
    Resource {
        reg: Register,
        resource: ResourceInfo,
        /// Multisample count for `Texture2dMs*`.
        sample_count: u32,
        data: [ResourceDataType; 4],
        range: RegisterRange,
    },
    ConstantBuffer {
        reg: Register,
        /// Buffer size in vec4 registers.
        size: u32,
        /// Indexed with a dynamic offset rather than immediates only.
        dynamic_indexed: bool,
        range: RegisterRange,
    },
    Sampler {
        reg: Register,
        mode: SamplerMode,
        range: RegisterRange,
    },
    GsOutputTopology(OutputTopology),
    GsInputPrimitive(InputPrimitive),
    VerticesOut(u32),
    GsInstanceCount(u32),
    Stream(Register),
    FunctionBody(u32),
    FunctionTable {
        id: u32,
        body_ids: Vec<u32>,
    },
    Interface {
        id: u32,
        /// Trailing payload words, kept raw.
        words: Vec<u32>,
    },
    InputControlPointCount(u32),
    OutputControlPointCount(u32),
    TessDomain(TessDomain),
    TessPartitioning(TessPartitioning),
    TessOutputPrimitive(TessOutputPrimitive),
    HsMaxTessFactor(f32),
    HsForkPhaseInstanceCount(u32),
    HsJoinPhaseInstanceCount(u32),
    ThreadGroup {
        x: u32,
        y: u32,
        z: u32,
    },
    UavTyped {
        reg: Register,
        resource: ResourceInfo,
        data: [ResourceDataType; 4],
        flags: UavFlags,
        range: RegisterRange,
    },
    UavRaw {
        reg: Register,
        flags: UavFlags,
        range: RegisterRange,
    },
    UavStructured {
        reg: Register,
        /// Structure byte stride.
        stride: u32,
        flags: UavFlags,
        range: RegisterRange,
    },
    TgsmRaw {
        reg: Register,
        /// Total size in bytes.
        byte_count: u32,
    },
    TgsmStructured {
        reg: Register,
        /// Structure byte stride.
        stride: u32,
        /// Number of structures.
        count: u32,
    },
    ResourceRaw {
        reg: Register,
        range: RegisterRange,
    },
    ResourceStructured {
        reg: Register,
        /// Structure byte stride.
        stride: u32,
        range: RegisterRange,
    },
    /// Immediate constant buffer contents (custom-data class 3).
    ImmediateConstantBuffer(Vec<[u32; 4]>),
    /// Any other custom-data block, kept raw (class, payload words).
    CustomData {
        class: u32,
        words: Vec<u32>,
    },
}

// ---- Instructions ----

/// One decoded instruction or declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    /// Residual opcode controls (shifted down to bit zero), with the
    /// saturate/test/precise bits already separated out. For declarations the
    /// encoder rebuilds controls from the payload instead.
    pub controls: u32,
    /// Per-component "precise" nibble.
    pub precise: u8,
    /// Zero/nonzero test sense for conditional opcodes.
    pub test_nonzero: Option<bool>,
    pub dsts: Vec<DstOperand>,
    pub srcs: Vec<SrcOperand>,
    pub texel_offset: Option<TexelOffset>,
    pub resource_info: Option<ResourceInfo>,
    pub resource_data: Option<[ResourceDataType; 4]>,
    pub decl: Option<Declaration>,
}

impl Instruction {
    /// Bare instruction with no operands or payload.
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            controls: 0,
            precise: 0,
            test_nonzero: None,
            dsts: Vec::new(),
            srcs: Vec::new(),
            texel_offset: None,
            resource_info: None,
            resource_data: None,
            decl: None,
        }
    }

    /// Declaration wrapper.
    pub fn declaration(opcode: Opcode, decl: Declaration) -> Self {
        let mut ins = Self::new(opcode);
        ins.decl = Some(decl);
        ins
    }

    /// Typed view of a `sync` instruction's control bits; `None` for every
    /// other opcode.
    pub fn sync_flags(&self) -> Option<SyncFlags> {
        (self.opcode == Opcode::Sync).then(|| SyncFlags::from_bits_truncate(self.controls))
    }

    /// Whether any destination carries the saturate modifier; this is what
    /// the encoder writes back into the opcode token's saturate bit.
    pub fn saturates(&self) -> bool {
        self.dsts.iter().any(|d| d.modifier == DstModifier::Saturate)
    }
}

/// Hull-shader phase an instruction belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HullPhase {
    #[default]
    None,
    ControlPoint,
    Fork,
    Join,
}

// ---- Signatures ----

/// One element of an input/output/patch-constant signature.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureElement {
    /// Semantic name, without the trailing index.
    pub name: String,
    pub semantic_index: u32,
    pub sysval: SysVal,
    pub component_type: ComponentType,
    /// Register index; `u32::MAX` for registerless elements such as
    /// `SV_Depth`.
    pub register: u32,
    /// Declared component mask.
    pub mask: WriteMask,
    /// Components actually read/written by the consuming stage.
    pub used_mask: WriteMask,
    /// Geometry-shader stream (SM5 only).
    pub stream: u32,
    pub min_precision: MinPrecision,
}

impl SignatureElement {
    /// Register value marking an element not bound to a numbered register.
    pub const UNREGISTERED: u32 = u32::MAX;
}

/// A shader signature: ordered list of elements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    pub elements: Vec<SignatureElement>,
}

impl Signature {
    /// Finds the element bound to `register` on `stream`.
    pub fn element_for_register(&self, register: u32, stream: u32) -> Option<&SignatureElement> {
        self.elements
            .iter()
            .find(|e| e.register == register && e.stream == stream)
    }

    /// Whether any element carries a minimum-precision hint.
    pub fn uses_min_precision(&self) -> bool {
        self.elements
            .iter()
            .any(|e| e.min_precision != MinPrecision::Default)
    }

    /// Whether any element targets a nonzero geometry stream.
    pub fn uses_streams(&self) -> bool {
        self.elements.iter().any(|e| e.stream != 0)
    }
}

// ---- Program ----

/// A complete decoded shader program.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub version: Version,
    pub instructions: Vec<Instruction>,
    pub input_signature: Signature,
    pub output_signature: Signature,
    pub patch_constant_signature: Signature,
}

impl Program {
    /// Program with the given version and empty bodies.
    pub fn new(version: Version) -> Self {
        Self {
            version,
            instructions: Vec::new(),
            input_signature: Signature::default(),
            output_signature: Signature::default(),
            patch_constant_signature: Signature::default(),
        }
    }

    fn find_decl<T>(&self, f: impl FnMut(&Declaration) -> Option<T>) -> Option<T> {
        self.instructions
            .iter()
            .filter_map(|ins| ins.decl.as_ref())
            .find_map(f)
    }

    /// The declared global flags, if a `dcl_globalFlags` is present.
    pub fn global_flags(&self) -> Option<GlobalFlags> {
        self.find_decl(|d| match *d {
            Declaration::GlobalFlags(f) => Some(f),
            _ => None,
        })
    }

    /// The `dcl_temps` register count.
    pub fn temp_count(&self) -> Option<u32> {
        self.find_decl(|d| match *d {
            Declaration::Temps(n) => Some(n),
            _ => None,
        })
    }

    /// Declared indexable temp arrays as `(id, count, components)` triples,
    /// in declaration order.
    pub fn indexable_temps(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        self.instructions
            .iter()
            .filter_map(|ins| match ins.decl {
                Some(Declaration::IndexableTemp { id, count, components }) => {
                    Some((id, count, components))
                }
                _ => None,
            })
    }

    /// Compute-shader thread-group size.
    pub fn thread_group(&self) -> Option<(u32, u32, u32)> {
        self.find_decl(|d| match *d {
            Declaration::ThreadGroup { x, y, z } => Some((x, y, z)),
            _ => None,
        })
    }

    pub fn tess_domain(&self) -> Option<TessDomain> {
        self.find_decl(|d| match *d {
            Declaration::TessDomain(v) => Some(v),
            _ => None,
        })
    }

    pub fn tess_partitioning(&self) -> Option<TessPartitioning> {
        self.find_decl(|d| match *d {
            Declaration::TessPartitioning(v) => Some(v),
            _ => None,
        })
    }

    pub fn tess_output_primitive(&self) -> Option<TessOutputPrimitive> {
        self.find_decl(|d| match *d {
            Declaration::TessOutputPrimitive(v) => Some(v),
            _ => None,
        })
    }

    pub fn max_tess_factor(&self) -> Option<f32> {
        self.find_decl(|d| match *d {
            Declaration::HsMaxTessFactor(v) => Some(v),
            _ => None,
        })
    }

    pub fn input_control_point_count(&self) -> Option<u32> {
        self.find_decl(|d| match *d {
            Declaration::InputControlPointCount(n) => Some(n),
            _ => None,
        })
    }

    pub fn output_control_point_count(&self) -> Option<u32> {
        self.find_decl(|d| match *d {
            Declaration::OutputControlPointCount(n) => Some(n),
            _ => None,
        })
    }

    pub fn gs_input_primitive(&self) -> Option<InputPrimitive> {
        self.find_decl(|d| match *d {
            Declaration::GsInputPrimitive(v) => Some(v),
            _ => None,
        })
    }

    pub fn gs_output_topology(&self) -> Option<OutputTopology> {
        self.find_decl(|d| match *d {
            Declaration::GsOutputTopology(v) => Some(v),
            _ => None,
        })
    }

    /// The geometry shader's `dcl_maxOutputVertexCount`.
    pub fn vertices_out(&self) -> Option<u32> {
        self.find_decl(|d| match *d {
            Declaration::VerticesOut(n) => Some(n),
            _ => None,
        })
    }

    pub fn gs_instance_count(&self) -> Option<u32> {
        self.find_decl(|d| match *d {
            Declaration::GsInstanceCount(n) => Some(n),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_surfaces_declared_attributes() {
        let version = Version { stage: ShaderStage::Compute, major: 5, minor: 0 };
        let mut p = Program::new(version);
        p.instructions
            .push(Instruction::declaration(Opcode::DclTemps, Declaration::Temps(4)));
        p.instructions.push(Instruction::declaration(
            Opcode::DclIndexableTemp,
            Declaration::IndexableTemp { id: 1, count: 8, components: 4 },
        ));
        p.instructions.push(Instruction::declaration(
            Opcode::DclThreadGroup,
            Declaration::ThreadGroup { x: 8, y: 8, z: 1 },
        ));
        p.instructions.push(Instruction::new(Opcode::Ret));

        assert_eq!(p.temp_count(), Some(4));
        assert_eq!(p.indexable_temps().collect::<Vec<_>>(), vec![(1, 8, 4)]);
        assert_eq!(p.thread_group(), Some((8, 8, 1)));
        assert_eq!(p.tess_domain(), None);
        assert_eq!(p.vertices_out(), None);
    }

    #[test]
    fn write_mask_contiguity() {
        assert!(WriteMask(0b0001).is_contiguous());
        assert!(WriteMask(0b0110).is_contiguous());
        assert!(WriteMask(0b1111).is_contiguous());
        assert!(WriteMask::NONE.is_contiguous());
        assert!(!WriteMask(0b0101).is_contiguous());
        assert!(!WriteMask(0b1001).is_contiguous());
    }

    #[test]
    fn write_mask_set_ops() {
        assert!(WriteMask::ALL.contains(WriteMask(0b0110)));
        assert!(!WriteMask(0b0011).contains(WriteMask(0b0110)));
        assert!(WriteMask(0b0011).is_disjoint(WriteMask(0b1100)));
        assert_eq!(WriteMask(0b0011).union(WriteMask(0b1100)), WriteMask::ALL);
    }

    #[test]
    fn swizzle_packing() {
        assert_eq!(Swizzle::IDENTITY.packed(), 0b11_10_01_00);
        assert_eq!(Swizzle::from_packed(0b11_10_01_00), Swizzle::IDENTITY);
        assert_eq!(Swizzle::replicate(2).packed(), 0b10_10_10_10);
        for packed in 0..=255u8 {
            assert_eq!(Swizzle::from_packed(packed).packed(), packed);
        }
    }

    #[test]
    fn src_selection_normalizes_to_swizzle() {
        let reg = Register::indexed(crate::op::RegisterType::Temp, 0);
        let mut src = SrcOperand::swizzled(reg, Swizzle([3, 3, 3, 3]));
        assert_eq!(src.swizzle(), Swizzle([3, 3, 3, 3]));
        src.selection = SrcSelection::Select1(1);
        assert_eq!(src.swizzle(), Swizzle::replicate(1));
        src.selection = SrcSelection::Mask(WriteMask::ALL);
        assert_eq!(src.swizzle(), Swizzle::IDENTITY);
    }

    #[test]
    fn version_ordering() {
        let v = Version { stage: ShaderStage::Pixel, major: 5, minor: 0 };
        assert!(v.at_least(4, 0));
        assert!(v.at_least(4, 1));
        assert!(v.at_least(5, 0));
        assert!(!v.at_least(5, 1));
        assert!(!v.is_51());
        assert_eq!(v.to_string(), "ps_5_0");
    }
}
