//! Token stream decoding: the bounds-checked cursor, the operand reader,
//! the per-opcode instruction decoder and the decoder context that carries
//! cross-instruction state (hull phase, declared usage masks, index
//! ranges).
//!
//! [`parse_program`] is the entry point. Any structural failure abandons
//! the whole parse; no partial program is ever returned.

use std::collections::HashMap;

use crate::ir::{
    Declaration, DstModifier, DstOperand, GlobalFlags, HullPhase, Immediate, Instruction,
    OperandDimension, OperandModifier, Program, Register, RegisterIndex, RegisterRange,
    ResourceInfo, Signature, SrcOperand, SrcSelection, SyncFlags, TexelOffset, UavFlags, Version,
    WriteMask,
};
use crate::limits::{MAX_PROGRAM_TOKEN_COUNT, MAX_RELATIVE_ADDRESS_DEPTH};
use crate::op::{
    DataType, InputPrimitive, InterpolationMode, MinPrecision, Opcode, OutputTopology, ReadKind,
    RegisterType, ResourceDataType, ResourceType, SamplerMode, SysVal, TessDomain,
    TessOutputPrimitive, TessPartitioning,
};
use crate::token;
use crate::{Diagnostics, ShaderDesc, ShaderError};

/// Structural decode failure with the dword position it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("at dword {at_dword}: {kind}")]
pub struct DecodeError {
    /// Dword index into the full token stream.
    pub at_dword: usize,
    pub kind: DecodeErrorKind,
}

/// The specific structural violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeErrorKind {
    #[error("unexpected end of token stream")]
    UnexpectedEnd,
    #[error("unknown shader type {0:#06x}")]
    UnknownShaderType(u16),
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u32),
    #[error("invalid instruction length {0}")]
    InvalidInstructionLength(u32),
    #[error("unknown register type {0:#04x}")]
    UnknownRegisterType(u32),
    #[error("unsupported index representation {0}")]
    UnsupportedIndexRepresentation(u32),
    #[error("invalid operand component count field {0}")]
    InvalidComponentCount(u32),
    #[error("invalid operand selection mode {0}")]
    InvalidSelectionMode(u32),
    #[error("relative addressing nested deeper than one level")]
    RelativeAddressTooDeep,
    #[error(
        "register {register} usage mask {new:#06b} partially overlaps previously \
         declared mask {prior:#06b}"
    )]
    MaskConflict { register: u32, prior: u8, new: u8 },
    #[error("index range [{first}, {first_plus_count}) overlaps a previous range")]
    IndexRangeOverlap { first: u32, first_plus_count: u32 },
    #[error("index range covers register {register} with system value {sysval}")]
    IndexRangeBadSysval { register: u32, sysval: u32 },
    #[error("immediate constant buffer payload of {0} dwords is not a multiple of four")]
    InvalidImmediateConstantBufferSize(u32),
    #[error("malformed declaration: {0}")]
    MalformedDeclaration(&'static str),
    #[error("signature register {register} out of range (maximum {max})")]
    SignatureRegisterOutOfRange { register: u32, max: u32 },
    #[error("hull shader input and output index ranges differ with no control point phase")]
    HullIndexRangeMismatch,
    #[error("allocation failed")]
    OutOfMemory,
}

// ---- Cursor ----

/// Bounds-checked dword cursor over one instruction's token span.
///
/// `base` is the span's absolute offset in the full stream, so error
/// positions always refer to the whole buffer.
struct InstrReader<'a> {
    toks: &'a [u32],
    pos: usize,
    base: usize,
}

impl<'a> InstrReader<'a> {
    fn new(toks: &'a [u32], base: usize) -> Self {
        Self { toks, pos: 0, base }
    }

    fn at_dword(&self) -> usize {
        self.base + self.pos
    }

    fn error(&self, kind: DecodeErrorKind) -> DecodeError {
        DecodeError { at_dword: self.at_dword(), kind }
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let v = *self
            .toks
            .get(self.pos)
            .ok_or_else(|| self.error(DecodeErrorKind::UnexpectedEnd))?;
        self.pos += 1;
        Ok(v)
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.toks.len()
    }

    fn remaining(&self) -> usize {
        self.toks.len() - self.pos
    }
}

// ---- Decoder context ----

/// Signature class an I/O register binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IoClass {
    Input = 0,
    Output = 1,
    PatchConstant = 2,
}

/// One recorded `dcl_indexrange`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct IndexRangeRecord {
    pub(crate) first: u32,
    pub(crate) count: u32,
    pub(crate) mask: WriteMask,
}

#[derive(Default)]
struct RegisterMasks {
    declared: Vec<WriteMask>,
    cumulative: WriteMask,
}

/// Cross-instruction state extracted at the end of a parse for the
/// validator.
pub(crate) struct DecodeSummary {
    pub(crate) explicit_control_point_phase: bool,
    pub(crate) input_ranges: Vec<IndexRangeRecord>,
    pub(crate) output_ranges: Vec<IndexRangeRecord>,
    pub(crate) patch_constant_ranges: Vec<IndexRangeRecord>,
}

struct DecoderContext<'a> {
    version: Version,
    desc: &'a ShaderDesc,
    phase: HullPhase,
    explicit_control_point_phase: bool,
    declared_masks: [HashMap<u32, RegisterMasks>; 3],
    ranges: [Vec<IndexRangeRecord>; 3],
}

impl<'a> DecoderContext<'a> {
    fn new(version: Version, desc: &'a ShaderDesc) -> Self {
        Self {
            version,
            desc,
            phase: HullPhase::None,
            explicit_control_point_phase: false,
            declared_masks: Default::default(),
            ranges: Default::default(),
        }
    }

    /// In fork/join phases the `OUTPUT` register file binds to the
    /// patch-constant signature rather than the output signature.
    fn io_class(&self, ty: RegisterType) -> Option<IoClass> {
        match ty {
            RegisterType::Input => Some(IoClass::Input),
            RegisterType::Output => match self.phase {
                HullPhase::Fork | HullPhase::Join => Some(IoClass::PatchConstant),
                _ => Some(IoClass::Output),
            },
            RegisterType::PatchConstant => Some(IoClass::PatchConstant),
            _ => None,
        }
    }

    fn signature_for(&self, class: IoClass) -> &Signature {
        match class {
            IoClass::Input => &self.desc.input_signature,
            IoClass::Output => &self.desc.output_signature,
            IoClass::PatchConstant => &self.desc.patch_constant_signature,
        }
    }

    /// Cross-checks a declared register mask against every previously
    /// declared mask for the same register: each pair must be fully
    /// contained one way or the other, or fully disjoint.
    fn record_declared_mask(&mut self, at: usize, reg: &DstOperand) -> Result<(), DecodeError> {
        let Some(class) = self.io_class(reg.reg.ty) else {
            return Ok(());
        };
        // Multi-dimensional inputs (GS/HS vertex arrays) key on the last,
        // per-register index.
        let Some(index) = reg.reg.indices.last().map(RegisterIndex::value) else {
            return Ok(());
        };
        let entry = self.declared_masks[class as usize].entry(index).or_default();
        for &prior in &entry.declared {
            if !(prior.contains(reg.mask) || reg.mask.contains(prior) || prior.is_disjoint(reg.mask))
            {
                return Err(DecodeError {
                    at_dword: at,
                    kind: DecodeErrorKind::MaskConflict {
                        register: index,
                        prior: prior.0,
                        new: reg.mask.0,
                    },
                });
            }
        }
        entry.declared.push(reg.mask);
        entry.cumulative = entry.cumulative.union(reg.mask);
        Ok(())
    }

    fn record_index_range(
        &mut self,
        at: usize,
        reg: &DstOperand,
        count: u32,
        diags: &mut Diagnostics,
    ) -> Result<(), DecodeError> {
        let Some(class) = self.io_class(reg.reg.ty) else {
            return Err(DecodeError {
                at_dword: at,
                kind: DecodeErrorKind::MalformedDeclaration(
                    "index range does not target an I/O register file",
                ),
            });
        };
        let Some(first) = reg.reg.indices.last().map(RegisterIndex::value) else {
            return Err(DecodeError {
                at_dword: at,
                kind: DecodeErrorKind::MalformedDeclaration("index range register has no index"),
            });
        };
        let record = IndexRangeRecord { first, count, mask: reg.mask };
        let end = first.saturating_add(count);
        for prior in &self.ranges[class as usize] {
            let disjoint = end <= prior.first || prior.first.saturating_add(prior.count) <= first;
            if !disjoint {
                return Err(DecodeError {
                    at_dword: at,
                    kind: DecodeErrorKind::IndexRangeOverlap { first, first_plus_count: end },
                });
            }
        }
        if count > 1 {
            let signature = self.signature_for(class);
            for register in first..end {
                match signature.element_for_register(register, 0) {
                    Some(element) if !element.sysval.allows_index_range() => {
                        return Err(DecodeError {
                            at_dword: at,
                            kind: DecodeErrorKind::IndexRangeBadSysval {
                                register,
                                sysval: element.sysval.0,
                            },
                        });
                    }
                    Some(_) => {}
                    None => diags.warn(
                        at,
                        format!("index range covers undeclared signature register {register}"),
                    ),
                }
            }
        }
        self.ranges[class as usize].push(record);
        Ok(())
    }

    fn into_summary(self) -> DecodeSummary {
        let [input_ranges, output_ranges, patch_constant_ranges] = self.ranges;
        DecodeSummary {
            explicit_control_point_phase: self.explicit_control_point_phase,
            input_ranges,
            output_ranges,
            patch_constant_ranges,
        }
    }
}

// ---- Entry point ----

/// Decodes a full token stream (version token, token-count word, then
/// instructions) into a validated [`Program`].
///
/// `desc` supplies the pre-parsed signature sections; their wire-form
/// "used" masks are un-inverted while the program is built. Returns the
/// program together with any recoverable diagnostics.
pub fn parse_program(
    tokens: &[u32],
    desc: ShaderDesc,
) -> Result<(Program, Diagnostics), ShaderError> {
    if tokens.len() < 2 {
        return Err(ShaderError::InvalidArgument(
            "token stream shorter than its two-word header",
        ));
    }
    let declared = tokens[1] as usize;
    if declared != tokens.len() {
        return Err(ShaderError::InvalidArgument(
            "declared token count does not match the buffer size",
        ));
    }
    if declared > MAX_PROGRAM_TOKEN_COUNT as usize {
        return Err(ShaderError::InvalidArgument(
            "declared token count exceeds the format maximum",
        ));
    }

    let version_token = tokens[0];
    let ty = token::version_type(version_token);
    let stage = crate::ir::ShaderStage::from_wire(ty).ok_or(DecodeError {
        at_dword: 0,
        kind: DecodeErrorKind::UnknownShaderType(ty),
    })?;
    let version = Version {
        stage,
        major: token::version_major(version_token),
        minor: token::version_minor(version_token),
    };

    let mut diags = Diagnostics::new();
    let mut ctx = DecoderContext::new(version, &desc);
    let mut instructions = Vec::new();
    let mut pos = 2;
    while pos < tokens.len() {
        let (ins, next) = decode_instruction(tokens, pos, &mut ctx, &mut diags)?;
        debug_assert!(next > pos);
        instructions.push(ins);
        pos = next;
    }
    let summary = ctx.into_summary();

    let mut program = Program {
        version,
        instructions,
        input_signature: desc.input_signature,
        output_signature: desc.output_signature,
        patch_constant_signature: desc.patch_constant_signature,
    };
    crate::validate::validate_program(&mut program, &summary, &mut diags)?;
    Ok((program, diags))
}

// ---- Instruction decoding ----

fn oom(at: usize) -> DecodeError {
    DecodeError { at_dword: at, kind: DecodeErrorKind::OutOfMemory }
}

fn decode_instruction(
    tokens: &[u32],
    pos: usize,
    ctx: &mut DecoderContext<'_>,
    diags: &mut Diagnostics,
) -> Result<(Instruction, usize), DecodeError> {
    let token0 = tokens[pos];
    let wire = token::opcode_id(token0);
    let opcode = Opcode::from_wire(wire).ok_or(DecodeError {
        at_dword: pos,
        kind: DecodeErrorKind::UnknownOpcode(wire),
    })?;

    if opcode == Opcode::CustomData {
        return decode_custom_data(tokens, pos);
    }

    let mut header = 1usize;
    let mut len = token::opcode_length(token0) as usize;
    if len == 0 {
        // Length field overflowed; the real total length follows as a whole
        // word.
        len = *tokens.get(pos + 1).ok_or(DecodeError {
            at_dword: pos + 1,
            kind: DecodeErrorKind::UnexpectedEnd,
        })? as usize;
        header = 2;
    }
    if len < header || pos + len > tokens.len() {
        return Err(DecodeError {
            at_dword: pos,
            kind: DecodeErrorKind::InvalidInstructionLength(len as u32),
        });
    }

    let mut r = InstrReader::new(&tokens[pos..pos + len], pos);
    for _ in 0..header {
        r.read_u32()?;
    }

    let mut ins = Instruction::new(opcode);
    ins.controls = token::opcode_controls(token0);
    ins.precise = token::opcode_precise(token0);

    if token::opcode_is_extended(token0) {
        loop {
            let at = r.at_dword();
            let ext = r.read_u32()?;
            match token::extended_opcode_type(ext) {
                token::EXTENDED_OPCODE_SAMPLE_CONTROLS => {
                    let [u, v, w] = token::sample_controls_offsets(ext);
                    ins.texel_offset = Some(TexelOffset { u, v, w });
                }
                token::EXTENDED_OPCODE_RESOURCE_DIM => {
                    let dim = token::resource_dim(ext);
                    let ty = ResourceType::from_wire(dim).unwrap_or_else(|| {
                        diags.warn(at, format!("unknown resource dimension {dim}"));
                        ResourceType::default()
                    });
                    ins.resource_info =
                        Some(ResourceInfo { ty, stride: token::resource_dim_stride(ext) });
                }
                token::EXTENDED_OPCODE_RESOURCE_RETURN_TYPE => {
                    ins.resource_data =
                        Some(resource_data_types(token::resource_return_types(ext), at, diags));
                }
                token::EXTENDED_OPCODE_EMPTY => {}
                other => diags.warn(at, format!("unknown extended opcode token type {other}")),
            }
            if !token::extended_opcode_continues(ext) {
                break;
            }
        }
    }

    let info = opcode.info();
    match info.read {
        ReadKind::Normal => {
            for _ in info.dst_types {
                let dst = read_dst_operand(&mut r, ctx, diags)?;
                ins.dsts.push(dst);
            }
            for &dt in info.src_types {
                let src = read_src_operand(&mut r, ctx, diags, 0, dt)?;
                ins.srcs.push(src);
            }
            if token::opcode_saturate(token0) {
                for dst in &mut ins.dsts {
                    dst.modifier = DstModifier::Saturate;
                }
            }
            if info.conditional {
                ins.test_nonzero = Some(token::opcode_test_nonzero(token0));
            }
            if opcode == Opcode::Sync && SyncFlags::from_bits(ins.controls).is_none() {
                diags.warn(pos, format!("unknown sync flag bits {:#x}", ins.controls));
            }
        }
        kind => read_declaration(kind, &mut r, ctx, diags, &mut ins)?,
    }

    // The embedded length is authoritative; anything the readers left
    // unconsumed inside the span is skipped.
    Ok((ins, pos + len))
}

fn decode_custom_data(tokens: &[u32], pos: usize) -> Result<(Instruction, usize), DecodeError> {
    let class = token::customdata_class(tokens[pos]);
    let len = *tokens.get(pos + 1).ok_or(DecodeError {
        at_dword: pos + 1,
        kind: DecodeErrorKind::UnexpectedEnd,
    })? as usize;
    if len < 2 || pos + len > tokens.len() {
        return Err(DecodeError {
            at_dword: pos,
            kind: DecodeErrorKind::InvalidInstructionLength(len as u32),
        });
    }
    let payload = &tokens[pos + 2..pos + len];

    const CLASS_IMMEDIATE_CONSTANT_BUFFER: u32 = 3;
    let decl = if class == CLASS_IMMEDIATE_CONSTANT_BUFFER {
        if payload.len() % 4 != 0 {
            return Err(DecodeError {
                at_dword: pos,
                kind: DecodeErrorKind::InvalidImmediateConstantBufferSize(payload.len() as u32),
            });
        }
        let mut rows = Vec::new();
        rows.try_reserve_exact(payload.len() / 4).map_err(|_| oom(pos))?;
        for chunk in payload.chunks_exact(4) {
            rows.push([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Declaration::ImmediateConstantBuffer(rows)
    } else {
        let mut words = Vec::new();
        words.try_reserve_exact(payload.len()).map_err(|_| oom(pos))?;
        words.extend_from_slice(payload);
        Declaration::CustomData { class, words }
    };
    Ok((Instruction::declaration(Opcode::CustomData, decl), pos + len))
}

// ---- Operand decoding ----

fn resource_data_types(
    nibbles: [u32; 4],
    at: usize,
    diags: &mut Diagnostics,
) -> [ResourceDataType; 4] {
    nibbles.map(|n| {
        ResourceDataType::from_wire(n).unwrap_or_else(|| {
            diags.warn(at, format!("unknown resource data type {n}"));
            ResourceDataType::default()
        })
    })
}

struct OperandHeader {
    token: u32,
    modifier: OperandModifier,
    precision: MinPrecision,
    non_uniform: bool,
}

/// Reads the operand token plus its extended-token chain. Only the first
/// extended token is interpreted; second-order chained extensions are
/// skipped with a warning, never fatally.
fn read_operand_header(
    r: &mut InstrReader<'_>,
    diags: &mut Diagnostics,
) -> Result<OperandHeader, DecodeError> {
    let token = r.read_u32()?;
    let mut header = OperandHeader {
        token,
        modifier: OperandModifier::None,
        precision: MinPrecision::Default,
        non_uniform: false,
    };
    if token::operand_is_extended(token) {
        let mut first = true;
        loop {
            let at = r.at_dword();
            let ext = r.read_u32()?;
            let ty = token::extended_operand_type(ext);
            if first {
                match ty {
                    token::EXTENDED_OPERAND_MODIFIER => {
                        let m = token::extended_operand_modifier(ext);
                        header.modifier = OperandModifier::from_wire(m).unwrap_or_else(|| {
                            diags.warn(at, format!("unknown operand modifier {m}"));
                            OperandModifier::None
                        });
                        let p = token::extended_operand_precision(ext);
                        header.precision = MinPrecision::from_wire(p).unwrap_or_else(|| {
                            diags.warn(at, format!("unknown minimum precision {p}"));
                            MinPrecision::Default
                        });
                        header.non_uniform = token::extended_operand_non_uniform(ext);
                    }
                    token::EXTENDED_OPERAND_EMPTY => {}
                    other => {
                        diags.warn(at, format!("unknown extended operand token type {other}"))
                    }
                }
            } else if ty != token::EXTENDED_OPERAND_EMPTY {
                diags.warn(at, "skipping second-order extended operand token");
            }
            if !token::extended_operand_continues(ext) {
                break;
            }
            first = false;
        }
    }
    Ok(header)
}

fn operand_dimension(token: u32, at: usize) -> Result<OperandDimension, DecodeError> {
    match token::operand_component_count(token) {
        token::COMPONENTS_0 => Ok(OperandDimension::Zero),
        token::COMPONENTS_1 => Ok(OperandDimension::One),
        token::COMPONENTS_4 => Ok(OperandDimension::Four),
        other => Err(DecodeError {
            at_dword: at,
            kind: DecodeErrorKind::InvalidComponentCount(other),
        }),
    }
}

/// Reads the register body: type, index chain (with relative addressing),
/// immediate payload, and the 5.1 descriptor-shape normalization.
fn read_register(
    r: &mut InstrReader<'_>,
    ctx: &mut DecoderContext<'_>,
    diags: &mut Diagnostics,
    header: &OperandHeader,
    dimension: OperandDimension,
    depth: u32,
) -> Result<Register, DecodeError> {
    let at = r.at_dword();
    let ty_wire = token::operand_register_type(header.token);
    let ty = RegisterType::from_wire(ty_wire).ok_or(DecodeError {
        at_dword: at,
        kind: DecodeErrorKind::UnknownRegisterType(ty_wire),
    })?;

    let idx_count = token::operand_index_dimension(header.token) as usize;
    let mut indices = Vec::with_capacity(idx_count);
    for slot in 0..idx_count {
        let rep = token::operand_index_rep(header.token, slot);
        let index = match rep {
            token::INDEX_REP_IMMEDIATE32 => RegisterIndex::literal(r.read_u32()?),
            token::INDEX_REP_RELATIVE => RegisterIndex {
                offset: None,
                relative: Some(read_relative_address(r, ctx, diags, depth)?),
            },
            token::INDEX_REP_IMMEDIATE32_PLUS_RELATIVE => {
                let offset = r.read_u32()?;
                RegisterIndex {
                    offset: Some(offset),
                    relative: Some(read_relative_address(r, ctx, diags, depth)?),
                }
            }
            other => {
                return Err(r.error(DecodeErrorKind::UnsupportedIndexRepresentation(other)));
            }
        };
        indices.push(index);
    }

    let immediate = match ty {
        RegisterType::Immediate32 => Some(match dimension {
            OperandDimension::One => Immediate::U32(r.read_u32()?),
            _ => {
                let mut v = [0u32; 4];
                for slot in &mut v {
                    *slot = r.read_u32()?;
                }
                Immediate::U32x4(v)
            }
        }),
        RegisterType::Immediate64 => Some(match dimension {
            OperandDimension::One => Immediate::U64(read_u64(r)?),
            _ => {
                let mut v = [0u64; 4];
                for lane in &mut v {
                    *lane = read_u64(r)?;
                }
                Immediate::U64x4(v)
            }
        }),
        _ => None,
    };

    let mut reg = Register { ty, indices, immediate };

    // Pre-5.1 descriptor registers carry one fewer index level; shifting in
    // a copy of the leading id gives every stream the canonical 5.1 shape.
    if ty.is_descriptor() && !ctx.version.is_51() && !reg.indices.is_empty() {
        let id = reg.indices[0].clone();
        reg.indices.insert(0, id);
    }
    Ok(reg)
}

/// Stream order is low dword first.
fn read_u64(r: &mut InstrReader<'_>) -> Result<u64, DecodeError> {
    let lo = r.read_u32()? as u64;
    let hi = r.read_u32()? as u64;
    Ok(lo | (hi << 32))
}

fn read_relative_address(
    r: &mut InstrReader<'_>,
    ctx: &mut DecoderContext<'_>,
    diags: &mut Diagnostics,
    depth: u32,
) -> Result<Box<SrcOperand>, DecodeError> {
    if depth >= MAX_RELATIVE_ADDRESS_DEPTH {
        return Err(r.error(DecodeErrorKind::RelativeAddressTooDeep));
    }
    let src = read_src_operand(r, ctx, diags, depth + 1, DataType::Int)?;
    Ok(Box::new(src))
}

fn read_src_operand(
    r: &mut InstrReader<'_>,
    ctx: &mut DecoderContext<'_>,
    diags: &mut Diagnostics,
    depth: u32,
    data_type: DataType,
) -> Result<SrcOperand, DecodeError> {
    let at = r.at_dword();
    let header = read_operand_header(r, diags)?;
    let dimension = operand_dimension(header.token, at)?;
    let selection = match dimension {
        OperandDimension::Zero | OperandDimension::One => SrcSelection::None,
        OperandDimension::Four => match token::operand_selection_mode(header.token) {
            token::SELECTION_MASK => {
                SrcSelection::Mask(WriteMask(token::operand_mask(header.token)))
            }
            token::SELECTION_SWIZZLE => SrcSelection::Swizzle(crate::ir::Swizzle::from_packed(
                token::operand_swizzle(header.token),
            )),
            token::SELECTION_SELECT1 => SrcSelection::Select1(token::operand_select1(header.token)),
            other => {
                return Err(DecodeError {
                    at_dword: at,
                    kind: DecodeErrorKind::InvalidSelectionMode(other),
                });
            }
        },
    };
    let reg = read_register(r, ctx, diags, &header, dimension, depth)?;
    if matches!(reg.immediate, Some(Immediate::U64(_) | Immediate::U64x4(_)))
        && data_type != DataType::Double
    {
        diags.warn(at, "64-bit immediate in a 32-bit operand slot");
    }
    Ok(SrcOperand {
        reg,
        dimension,
        selection,
        modifier: header.modifier,
        precision: header.precision,
        non_uniform: header.non_uniform,
    })
}

fn read_dst_operand(
    r: &mut InstrReader<'_>,
    ctx: &mut DecoderContext<'_>,
    diags: &mut Diagnostics,
) -> Result<DstOperand, DecodeError> {
    let at = r.at_dword();
    let header = read_operand_header(r, diags)?;
    if header.modifier != OperandModifier::None {
        diags.warn(at, "source modifier on a destination operand ignored");
    }
    let dimension = operand_dimension(header.token, at)?;
    let mask = match dimension {
        OperandDimension::Zero | OperandDimension::One => WriteMask::NONE,
        OperandDimension::Four => match token::operand_selection_mode(header.token) {
            token::SELECTION_MASK => WriteMask(token::operand_mask(header.token)),
            other => {
                return Err(DecodeError {
                    at_dword: at,
                    kind: DecodeErrorKind::InvalidSelectionMode(other),
                });
            }
        },
    };
    let reg = read_register(r, ctx, diags, &header, dimension, 0)?;
    Ok(DstOperand {
        reg,
        dimension,
        mask,
        modifier: DstModifier::None,
        precision: header.precision,
        non_uniform: header.non_uniform,
    })
}

// ---- Declaration readers ----

/// Inclusive descriptor register range from a normalized declaration
/// operand: `idx[1]` is the first register, `idx[2]` (5.1 only) the last.
fn descriptor_range(
    reg: &Register,
    ctx: &DecoderContext<'_>,
    at: usize,
) -> Result<RegisterRange, DecodeError> {
    let first = reg
        .indices
        .get(1)
        .map(RegisterIndex::value)
        .ok_or(DecodeError {
            at_dword: at,
            kind: DecodeErrorKind::MalformedDeclaration("descriptor operand has too few indices"),
        })?;
    let last = if ctx.version.is_51() {
        reg.indices.get(2).map(RegisterIndex::value).ok_or(DecodeError {
            at_dword: at,
            kind: DecodeErrorKind::MalformedDeclaration("5.1 descriptor operand lacks range end"),
        })?
    } else {
        first
    };
    Ok(RegisterRange { space: 0, first, last })
}

/// The register-space word trails 5.1 descriptor declarations.
fn read_space(r: &mut InstrReader<'_>, ctx: &DecoderContext<'_>) -> Result<u32, DecodeError> {
    if ctx.version.is_51() {
        r.read_u32()
    } else {
        Ok(0)
    }
}

fn soft_enum<T>(
    parsed: Option<T>,
    what: &str,
    value: u32,
    at: usize,
    diags: &mut Diagnostics,
) -> T
where
    T: Default,
{
    parsed.unwrap_or_else(|| {
        diags.warn(at, format!("unknown {what} {value}"));
        T::default()
    })
}

fn read_declaration(
    kind: ReadKind,
    r: &mut InstrReader<'_>,
    ctx: &mut DecoderContext<'_>,
    diags: &mut Diagnostics,
    ins: &mut Instruction,
) -> Result<(), DecodeError> {
    let at = r.base;
    let controls = ins.controls;
    let decl = match kind {
        ReadKind::Normal | ReadKind::CustomData => unreachable!("handled by the caller"),
        ReadKind::DclGlobalFlags => {
            if GlobalFlags::from_bits(controls).is_none() {
                diags.warn(at, format!("unknown global flag bits {controls:#x}"));
            }
            Declaration::GlobalFlags(GlobalFlags::from_bits_truncate(controls))
        }
        ReadKind::DclTemps => Declaration::Temps(r.read_u32()?),
        ReadKind::DclIndexableTemp => Declaration::IndexableTemp {
            id: r.read_u32()?,
            count: r.read_u32()?,
            components: r.read_u32()?,
        },
        ReadKind::DclInput => {
            let reg = read_dst_operand(r, ctx, diags)?;
            ctx.record_declared_mask(at, &reg)?;
            Declaration::Input { reg }
        }
        ReadKind::DclInputSgv => {
            let reg = read_dst_operand(r, ctx, diags)?;
            ctx.record_declared_mask(at, &reg)?;
            Declaration::InputSgv { reg, sysval: SysVal(r.read_u32()?) }
        }
        ReadKind::DclInputSiv => {
            let reg = read_dst_operand(r, ctx, diags)?;
            ctx.record_declared_mask(at, &reg)?;
            Declaration::InputSiv { reg, sysval: SysVal(r.read_u32()?) }
        }
        ReadKind::DclInputPs => {
            let interpolation = soft_enum(
                InterpolationMode::from_wire(token::controls_interpolation_mode(controls)),
                "interpolation mode",
                token::controls_interpolation_mode(controls),
                at,
                diags,
            );
            let reg = read_dst_operand(r, ctx, diags)?;
            ctx.record_declared_mask(at, &reg)?;
            Declaration::InputPs { reg, interpolation }
        }
        ReadKind::DclInputPsSgv => {
            let reg = read_dst_operand(r, ctx, diags)?;
            ctx.record_declared_mask(at, &reg)?;
            Declaration::InputPsSgv { reg, sysval: SysVal(r.read_u32()?) }
        }
        ReadKind::DclInputPsSiv => {
            let interpolation = soft_enum(
                InterpolationMode::from_wire(token::controls_interpolation_mode(controls)),
                "interpolation mode",
                token::controls_interpolation_mode(controls),
                at,
                diags,
            );
            let reg = read_dst_operand(r, ctx, diags)?;
            ctx.record_declared_mask(at, &reg)?;
            Declaration::InputPsSiv { reg, sysval: SysVal(r.read_u32()?), interpolation }
        }
        ReadKind::DclOutput => {
            let reg = read_dst_operand(r, ctx, diags)?;
            ctx.record_declared_mask(at, &reg)?;
            Declaration::Output { reg }
        }
        ReadKind::DclOutputSgv => {
            let reg = read_dst_operand(r, ctx, diags)?;
            ctx.record_declared_mask(at, &reg)?;
            Declaration::OutputSgv { reg, sysval: SysVal(r.read_u32()?) }
        }
        ReadKind::DclOutputSiv => {
            let reg = read_dst_operand(r, ctx, diags)?;
            ctx.record_declared_mask(at, &reg)?;
            Declaration::OutputSiv { reg, sysval: SysVal(r.read_u32()?) }
        }
        ReadKind::DclIndexRange => {
            let reg = read_dst_operand(r, ctx, diags)?;
            let count = r.read_u32()?;
            ctx.record_index_range(at, &reg, count, diags)?;
            Declaration::IndexRange { reg, count }
        }
        ReadKind::DclResource => {
            let ty_wire = token::controls_resource_type(controls);
            let ty = soft_enum(
                ResourceType::from_wire(ty_wire),
                "resource dimension",
                ty_wire,
                at,
                diags,
            );
            let sample_count = token::controls_sample_count(controls);
            if sample_count != 0 && !ty.is_multisampled() {
                diags.warn(
                    at,
                    format!("sample count {sample_count} on a non-multisampled resource dimension"),
                );
            }
            let reg = read_dst_operand(r, ctx, diags)?.reg;
            let data = resource_data_types(token::decl_return_types(r.read_u32()?), at, diags);
            let mut range = descriptor_range(&reg, ctx, at)?;
            range.space = read_space(r, ctx)?;
            Declaration::Resource {
                reg,
                resource: ResourceInfo { ty, stride: 0 },
                sample_count,
                data,
                range,
            }
        }
        ReadKind::DclConstantBuffer => {
            let src = read_src_operand(r, ctx, diags, 0, DataType::Float)?;
            let reg = src.reg;
            let dynamic_indexed = controls & 0x1 != 0;
            let mut range = descriptor_range(&reg, ctx, at)?;
            let size = if ctx.version.is_51() {
                r.read_u32()?
            } else {
                reg.indices.get(2).map(RegisterIndex::value).ok_or(DecodeError {
                    at_dword: at,
                    kind: DecodeErrorKind::MalformedDeclaration(
                        "constant buffer operand lacks a size index",
                    ),
                })?
            };
            range.space = read_space(r, ctx)?;
            Declaration::ConstantBuffer { reg, size, dynamic_indexed, range }
        }
        ReadKind::DclSampler => {
            let mode_wire = token::controls_sampler_mode(controls);
            let mode = soft_enum(
                SamplerMode::from_wire(mode_wire),
                "sampler mode",
                mode_wire,
                at,
                diags,
            );
            let reg = read_dst_operand(r, ctx, diags)?.reg;
            let mut range = descriptor_range(&reg, ctx, at)?;
            range.space = read_space(r, ctx)?;
            Declaration::Sampler { reg, mode, range }
        }
        ReadKind::DclGsOutputTopology => {
            let value = token::controls_enum6(controls);
            Declaration::GsOutputTopology(soft_enum(
                OutputTopology::from_wire(value),
                "output topology",
                value,
                at,
                diags,
            ))
        }
        ReadKind::DclGsInputPrimitive => {
            let value = token::controls_enum6(controls);
            Declaration::GsInputPrimitive(soft_enum(
                InputPrimitive::from_wire(value),
                "input primitive",
                value,
                at,
                diags,
            ))
        }
        ReadKind::DclVerticesOut => Declaration::VerticesOut(r.read_u32()?),
        ReadKind::DclGsInstanceCount => Declaration::GsInstanceCount(r.read_u32()?),
        ReadKind::DclStream => {
            Declaration::Stream(read_src_operand(r, ctx, diags, 0, DataType::Opaque)?.reg)
        }
        ReadKind::DclFunctionBody => Declaration::FunctionBody(r.read_u32()?),
        ReadKind::DclFunctionTable => {
            let id = r.read_u32()?;
            let count = r.read_u32()? as usize;
            let mut body_ids = Vec::new();
            body_ids.try_reserve_exact(count).map_err(|_| oom(at))?;
            for _ in 0..count {
                body_ids.push(r.read_u32()?);
            }
            Declaration::FunctionTable { id, body_ids }
        }
        ReadKind::DclInterface => {
            let id = r.read_u32()?;
            let mut words = Vec::new();
            words.try_reserve_exact(r.remaining()).map_err(|_| oom(at))?;
            while !r.is_eof() {
                words.push(r.read_u32()?);
            }
            Declaration::Interface { id, words }
        }
        ReadKind::InterfaceCall => {
            // The function-pointer operand carries the table and body
            // indices itself.
            let src = read_src_operand(r, ctx, diags, 0, DataType::Opaque)?;
            ins.srcs.push(src);
            return Ok(());
        }
        ReadKind::DclControlPointCount => {
            let count = token::controls_control_point_count(controls);
            if ins.opcode == Opcode::DclInputControlPointCount {
                Declaration::InputControlPointCount(count)
            } else {
                Declaration::OutputControlPointCount(count)
            }
        }
        ReadKind::DclTessDomain => {
            let value = token::controls_enum6(controls);
            Declaration::TessDomain(soft_enum(
                TessDomain::from_wire(value),
                "tessellator domain",
                value,
                at,
                diags,
            ))
        }
        ReadKind::DclTessPartitioning => {
            let value = token::controls_enum6(controls);
            Declaration::TessPartitioning(soft_enum(
                TessPartitioning::from_wire(value),
                "tessellator partitioning",
                value,
                at,
                diags,
            ))
        }
        ReadKind::DclTessOutputPrimitive => {
            let value = token::controls_enum6(controls);
            Declaration::TessOutputPrimitive(soft_enum(
                TessOutputPrimitive::from_wire(value),
                "tessellator output primitive",
                value,
                at,
                diags,
            ))
        }
        ReadKind::DclHsMaxTessFactor => {
            Declaration::HsMaxTessFactor(f32::from_bits(r.read_u32()?))
        }
        ReadKind::DclHsPhaseInstanceCount => {
            let count = r.read_u32()?;
            if ins.opcode == Opcode::DclHsForkPhaseInstanceCount {
                Declaration::HsForkPhaseInstanceCount(count)
            } else {
                Declaration::HsJoinPhaseInstanceCount(count)
            }
        }
        ReadKind::DclThreadGroup => Declaration::ThreadGroup {
            x: r.read_u32()?,
            y: r.read_u32()?,
            z: r.read_u32()?,
        },
        ReadKind::HsPhase => {
            ctx.phase = match ins.opcode {
                Opcode::HsControlPointPhase => {
                    ctx.explicit_control_point_phase = true;
                    HullPhase::ControlPoint
                }
                Opcode::HsForkPhase => HullPhase::Fork,
                Opcode::HsJoinPhase => HullPhase::Join,
                _ => ctx.phase,
            };
            return Ok(());
        }
        ReadKind::DclUavTyped => {
            let ty_wire = token::controls_resource_type(controls);
            let ty = soft_enum(
                ResourceType::from_wire(ty_wire),
                "resource dimension",
                ty_wire,
                at,
                diags,
            );
            let flags = UavFlags::from_bits_truncate(controls);
            let reg = read_dst_operand(r, ctx, diags)?.reg;
            let data = resource_data_types(token::decl_return_types(r.read_u32()?), at, diags);
            let mut range = descriptor_range(&reg, ctx, at)?;
            range.space = read_space(r, ctx)?;
            Declaration::UavTyped {
                reg,
                resource: ResourceInfo { ty, stride: 0 },
                data,
                flags,
                range,
            }
        }
        ReadKind::DclUavRaw => {
            let flags = UavFlags::from_bits_truncate(controls);
            let reg = read_dst_operand(r, ctx, diags)?.reg;
            let mut range = descriptor_range(&reg, ctx, at)?;
            range.space = read_space(r, ctx)?;
            Declaration::UavRaw { reg, flags, range }
        }
        ReadKind::DclUavStructured => {
            let flags = UavFlags::from_bits_truncate(controls);
            let reg = read_dst_operand(r, ctx, diags)?.reg;
            let stride = r.read_u32()?;
            let mut range = descriptor_range(&reg, ctx, at)?;
            range.space = read_space(r, ctx)?;
            Declaration::UavStructured { reg, stride, flags, range }
        }
        ReadKind::DclTgsmRaw => {
            let reg = read_dst_operand(r, ctx, diags)?.reg;
            Declaration::TgsmRaw { reg, byte_count: r.read_u32()? }
        }
        ReadKind::DclTgsmStructured => {
            let reg = read_dst_operand(r, ctx, diags)?.reg;
            Declaration::TgsmStructured {
                reg,
                stride: r.read_u32()?,
                count: r.read_u32()?,
            }
        }
        ReadKind::DclResourceRaw => {
            let reg = read_dst_operand(r, ctx, diags)?.reg;
            let mut range = descriptor_range(&reg, ctx, at)?;
            range.space = read_space(r, ctx)?;
            Declaration::ResourceRaw { reg, range }
        }
        ReadKind::DclResourceStructured => {
            let reg = read_dst_operand(r, ctx, diags)?.reg;
            let stride = r.read_u32()?;
            let mut range = descriptor_range(&reg, ctx, at)?;
            range.space = read_space(r, ctx)?;
            Declaration::ResourceStructured { reg, stride, range }
        }
    };
    ins.decl = Some(decl);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Swizzle;
    use crate::test_utils::{dcl_input, finish, masked_dst, ps_5_0, swizzled_src};
    use crate::token::*;
    use pretty_assertions::assert_eq;

    fn temp_dst(index: u32, mask: u8) -> [u32; 2] {
        masked_dst(0x00, index, mask)
    }

    fn input_src(index: u32, swizzle: u8) -> [u32; 2] {
        swizzled_src(0x01, index, swizzle)
    }

    #[test]
    fn decodes_saturated_mov() {
        let mut body = vec![make_opcode(0x36, 0, 5, true, None, 0, false)];
        body.extend_from_slice(&temp_dst(0, 0xf));
        body.extend_from_slice(&input_src(1, 0b00_01_10_11));
        let tokens = ps_5_0(&body);

        let (program, diags) = parse_program(&tokens, ShaderDesc::default()).unwrap();
        assert!(diags.is_empty());
        assert_eq!(program.instructions.len(), 1);
        let ins = &program.instructions[0];
        assert_eq!(ins.opcode, Opcode::Mov);
        assert_eq!(ins.dsts[0].modifier, DstModifier::Saturate);
        assert_eq!(ins.dsts[0].mask, WriteMask::ALL);
        assert_eq!(
            ins.srcs[0].selection,
            SrcSelection::Swizzle(Swizzle([3, 2, 1, 0]))
        );
        assert_eq!(ins.srcs[0].reg.index0(), Some(1));
    }

    #[test]
    fn unknown_opcode_aborts_parse() {
        let tokens = ps_5_0(&[make_opcode(0x6b, 0, 1, false, None, 0, false)]);
        let err = parse_program(&tokens, ShaderDesc::default()).unwrap_err();
        assert_eq!(
            err,
            ShaderError::from(DecodeError {
                at_dword: 2,
                kind: DecodeErrorKind::UnknownOpcode(0x6b),
            })
        );
    }

    #[test]
    fn zero_length_instruction_is_rejected() {
        // Embedded length zero means a follow-on word; a follow-on word of
        // zero can never be valid.
        let tokens = ps_5_0(&[make_opcode(0x3a, 0, 0, false, None, 0, false), 0]);
        let err = parse_program(&tokens, ShaderDesc::default()).unwrap_err();
        assert!(matches!(err, ShaderError::InvalidShader(_)));
    }

    #[test]
    fn length_past_stream_end_is_rejected() {
        let tokens = ps_5_0(&[make_opcode(0x36, 0, 9, false, None, 0, false)]);
        let err = parse_program(&tokens, ShaderDesc::default()).unwrap_err();
        assert!(matches!(err, ShaderError::InvalidShader(_)));
    }

    #[test]
    fn truncated_operand_is_rejected() {
        // mov's span ends right after the src operand token, before the
        // index word the token promises.
        let mut body = vec![make_opcode(0x36, 0, 4, false, None, 0, false)];
        body.extend_from_slice(&temp_dst(0, 0xf));
        body.push(
            OperandToken::new()
                .components(COMPONENTS_4)
                .selection_mode(SELECTION_SWIZZLE)
                .swizzle(Swizzle::IDENTITY.packed())
                .register_type(0x01)
                .index_dimension(1)
                .index_rep(0, INDEX_REP_IMMEDIATE32)
                .build(),
        );
        let tokens = ps_5_0(&body);
        let err = parse_program(&tokens, ShaderDesc::default()).unwrap_err();
        let ShaderError::InvalidShader(msg) = err else {
            panic!("expected InvalidShader");
        };
        assert!(msg.contains("unexpected end"), "{msg}");
    }

    #[test]
    fn header_too_short_is_invalid_argument() {
        let err = parse_program(&[make_version(0, 5, 0)], ShaderDesc::default()).unwrap_err();
        assert!(matches!(err, ShaderError::InvalidArgument(_)));
    }

    #[test]
    fn partially_overlapping_usage_masks_fail() {
        // xy then zw is fine (disjoint), but a later yz declaration
        // straddles both and must be rejected.
        let mut body = dcl_input(3, 0b0011);
        body.extend(dcl_input(3, 0b1100));
        body.extend(dcl_input(3, 0b0110));
        let tokens = ps_5_0(&body);
        let err = parse_program(&tokens, ShaderDesc::default()).unwrap_err();
        let ShaderError::InvalidShader(msg) = err else {
            panic!("expected InvalidShader");
        };
        assert!(msg.contains("partially overlaps"), "{msg}");
    }

    #[test]
    fn contained_and_disjoint_masks_are_accepted() {
        let mut body = dcl_input(3, 0b0011);
        body.extend(dcl_input(3, 0b1100));
        body.extend(dcl_input(3, 0b1111)); // superset of the union
        let tokens = ps_5_0(&body);
        parse_program(&tokens, ShaderDesc::default()).unwrap();
    }

    #[test]
    fn immediate_constant_buffer_payload() {
        let mut body = vec![make_customdata(0x35, 3), 0];
        body[1] = 2 + 8;
        body.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let tokens = ps_5_0(&body);
        let (program, _) = parse_program(&tokens, ShaderDesc::default()).unwrap();
        assert_eq!(
            program.instructions[0].decl,
            Some(Declaration::ImmediateConstantBuffer(vec![
                [1, 2, 3, 4],
                [5, 6, 7, 8]
            ]))
        );
    }

    #[test]
    fn immediate_constant_buffer_ragged_payload_fails() {
        let mut body = vec![make_customdata(0x35, 3), 0];
        body[1] = 2 + 3;
        body.extend_from_slice(&[1, 2, 3]);
        let tokens = ps_5_0(&body);
        let err = parse_program(&tokens, ShaderDesc::default()).unwrap_err();
        assert!(matches!(err, ShaderError::InvalidShader(_)));
    }

    #[test]
    fn comment_custom_data_is_kept_raw() {
        let mut body = vec![make_customdata(0x35, 0), 5, 0xdead, 0xbeef, 0xf00d];
        body[1] = body.len() as u32;
        let tokens = ps_5_0(&body);
        let (program, _) = parse_program(&tokens, ShaderDesc::default()).unwrap();
        assert_eq!(
            program.instructions[0].decl,
            Some(Declaration::CustomData {
                class: 0,
                words: vec![0xdead, 0xbeef, 0xf00d]
            })
        );
    }

    fn cb_src_legacy(id: u32, offset: u32) -> [u32; 3] {
        [
            OperandToken::new()
                .components(COMPONENTS_4)
                .selection_mode(SELECTION_SWIZZLE)
                .swizzle(Swizzle::IDENTITY.packed())
                .register_type(0x08)
                .index_dimension(2)
                .index_rep(0, INDEX_REP_IMMEDIATE32)
                .index_rep(1, INDEX_REP_IMMEDIATE32)
                .build(),
            id,
            offset,
        ]
    }

    #[test]
    fn legacy_descriptor_operand_normalizes_to_three_indices() {
        let mut body = vec![make_opcode(0x36, 0, 6, false, None, 0, false)];
        body.extend_from_slice(&temp_dst(0, 0xf));
        body.extend_from_slice(&cb_src_legacy(1, 5));
        let mut tokens = vec![make_version(0, 4, 0), 0];
        tokens.extend_from_slice(&body);
        let tokens = finish(tokens);

        let (program, _) = parse_program(&tokens, ShaderDesc::default()).unwrap();
        let src = &program.instructions[0].srcs[0];
        assert_eq!(src.reg.ty, RegisterType::ConstantBuffer);
        let values: Vec<u32> = src.reg.indices.iter().map(RegisterIndex::value).collect();
        assert_eq!(values, vec![1, 1, 5]);
    }

    #[test]
    fn relative_index_with_offset() {
        // mov r0.xyzw, x0[r1.y + 4].xyzw
        let rel = OperandToken::new()
            .components(COMPONENTS_4)
            .selection_mode(SELECTION_SELECT1)
            .select1(1)
            .register_type(0x00)
            .index_dimension(1)
            .index_rep(0, INDEX_REP_IMMEDIATE32)
            .build();
        let src = OperandToken::new()
            .components(COMPONENTS_4)
            .selection_mode(SELECTION_SWIZZLE)
            .swizzle(Swizzle::IDENTITY.packed())
            .register_type(0x03)
            .index_dimension(2)
            .index_rep(0, INDEX_REP_IMMEDIATE32)
            .index_rep(1, INDEX_REP_IMMEDIATE32_PLUS_RELATIVE)
            .build();
        let mut body = vec![make_opcode(0x36, 0, 8, false, None, 0, false)];
        body.extend_from_slice(&temp_dst(0, 0xf));
        body.extend_from_slice(&[src, 0, 4, rel, 1]);
        let tokens = ps_5_0(&body);

        let (program, diags) = parse_program(&tokens, ShaderDesc::default()).unwrap();
        assert!(diags.is_empty());
        let index = &program.instructions[0].srcs[0].reg.indices[1];
        assert_eq!(index.offset, Some(4));
        let rel = index.relative.as_ref().unwrap();
        assert_eq!(rel.reg.ty, RegisterType::Temp);
        assert_eq!(rel.selection, SrcSelection::Select1(1));
    }

    #[test]
    fn nested_relative_addressing_is_rejected() {
        let inner = OperandToken::new()
            .components(COMPONENTS_4)
            .selection_mode(SELECTION_SELECT1)
            .select1(0)
            .register_type(0x00)
            .index_dimension(1)
            .index_rep(0, INDEX_REP_IMMEDIATE32)
            .build();
        let mid = OperandToken::new()
            .components(COMPONENTS_4)
            .selection_mode(SELECTION_SELECT1)
            .select1(0)
            .register_type(0x03)
            .index_dimension(2)
            .index_rep(0, INDEX_REP_IMMEDIATE32)
            .index_rep(1, INDEX_REP_RELATIVE)
            .build();
        let outer = OperandToken::new()
            .components(COMPONENTS_4)
            .selection_mode(SELECTION_SWIZZLE)
            .swizzle(Swizzle::IDENTITY.packed())
            .register_type(0x03)
            .index_dimension(2)
            .index_rep(0, INDEX_REP_IMMEDIATE32)
            .index_rep(1, INDEX_REP_RELATIVE)
            .build();
        let mut body = vec![make_opcode(0x36, 0, 9, false, None, 0, false)];
        body.extend_from_slice(&temp_dst(0, 0xf));
        body.extend_from_slice(&[outer, 0, mid, 1, inner, 2]);
        let tokens = ps_5_0(&body);
        let err = parse_program(&tokens, ShaderDesc::default()).unwrap_err();
        let ShaderError::InvalidShader(msg) = err else {
            panic!("expected InvalidShader");
        };
        assert!(msg.contains("relative addressing"), "{msg}");
    }

    #[test]
    fn second_order_extended_operand_is_skipped_with_warning() {
        let src = OperandToken::new()
            .components(COMPONENTS_4)
            .selection_mode(SELECTION_SWIZZLE)
            .swizzle(Swizzle::IDENTITY.packed())
            .register_type(0x01)
            .index_dimension(1)
            .index_rep(0, INDEX_REP_IMMEDIATE32)
            .extended()
            .build();
        let ext1 = make_extended_operand(1, 0, false) | 0x8000_0000; // neg, continues
        let ext2 = make_extended_operand(2, 0, false); // second order, skipped
        let mut body = vec![make_opcode(0x36, 0, 7, false, None, 0, false)];
        body.extend_from_slice(&temp_dst(0, 0xf));
        body.extend_from_slice(&[src, ext1, ext2, 3]);
        let tokens = ps_5_0(&body);

        let (program, diags) = parse_program(&tokens, ShaderDesc::default()).unwrap();
        assert_eq!(diags.len(), 1);
        assert!(diags.iter().next().unwrap().message.contains("second-order"));
        // The first-order modifier still applies.
        assert_eq!(
            program.instructions[0].srcs[0].modifier,
            OperandModifier::Neg
        );
    }

    #[test]
    fn overlapping_index_ranges_fail() {
        // dcl_indexrange over v0..v3, then another over v2..v4.
        let mut body = dcl_input(0, 0xf);
        for reg in 1..5 {
            body.extend(dcl_input(reg, 0xf));
        }
        for (first, count) in [(0u32, 4u32), (2, 3)] {
            body.push(make_opcode(0x5b, 0, 4, false, None, 0, false));
            body.extend_from_slice(&[
                OperandToken::new()
                    .components(COMPONENTS_4)
                    .selection_mode(SELECTION_MASK)
                    .mask(0xf)
                    .register_type(0x01)
                    .index_dimension(1)
                    .index_rep(0, INDEX_REP_IMMEDIATE32)
                    .build(),
                first,
                count,
            ]);
        }
        let mut desc = ShaderDesc::default();
        for register in 0..5 {
            desc.input_signature.elements.push(crate::SignatureElement {
                name: "TEXCOORD".to_owned(),
                semantic_index: register,
                sysval: SysVal::NONE,
                component_type: crate::op::ComponentType::Float32,
                register,
                mask: WriteMask::ALL,
                used_mask: WriteMask::ALL,
                stream: 0,
                min_precision: MinPrecision::Default,
            });
        }
        let tokens = ps_5_0(&body);
        let err = parse_program(&tokens, desc).unwrap_err();
        let ShaderError::InvalidShader(msg) = err else {
            panic!("expected InvalidShader");
        };
        assert!(msg.contains("overlaps"), "{msg}");
    }

    #[test]
    fn double_immediate_in_a_float_slot_warns() {
        // mov r0.x, d(1.0): mov's source expects 32-bit data.
        let mut body = vec![make_opcode(0x36, 0, 6, false, None, 0, false)];
        body.extend_from_slice(&temp_dst(0, 0x1));
        body.push(
            OperandToken::new()
                .components(COMPONENTS_1)
                .register_type(0x05)
                .build(),
        );
        let bits = 1.0f64.to_bits();
        body.push(bits as u32);
        body.push((bits >> 32) as u32);
        let tokens = ps_5_0(&body);

        let (program, diags) = parse_program(&tokens, ShaderDesc::default()).unwrap();
        assert_eq!(diags.len(), 1);
        let diag = diags.iter().next().unwrap();
        assert!(diag.message.contains("64-bit immediate"), "{}", diag.message);
        assert_eq!(program.instructions[0].srcs[0].reg.immediate, Some(Immediate::U64(bits)));
    }

    #[test]
    fn unknown_sync_flag_bits_warn() {
        // sync with the two thread-group flags plus an undefined bit.
        let tokens = ps_5_0(&[make_opcode(0xbe, 0x13, 1, false, None, 0, false)]);
        let (program, diags) = parse_program(&tokens, ShaderDesc::default()).unwrap();
        assert_eq!(diags.len(), 1);
        assert_eq!(
            program.instructions[0].sync_flags(),
            Some(SyncFlags::THREADS_IN_GROUP | SyncFlags::THREAD_GROUP_SHARED_MEMORY)
        );
    }

    #[test]
    fn sample_count_on_non_multisampled_resource_warns() {
        // dcl_resource t0, texture2d with a sample count of 4.
        let mut body = vec![make_opcode(0x58, make_resource_controls(3, 4), 4, false, None, 0, false)];
        body.extend_from_slice(&[
            OperandToken::new()
                .components(COMPONENTS_0)
                .register_type(0x07)
                .index_dimension(1)
                .index_rep(0, INDEX_REP_IMMEDIATE32)
                .build(),
            0,
            make_decl_return_types([3, 3, 3, 3]),
        ]);
        let tokens = ps_5_0(&body);

        let (_, diags) = parse_program(&tokens, ShaderDesc::default()).unwrap();
        assert_eq!(diags.len(), 1);
        let diag = diags.iter().next().unwrap();
        assert!(diag.message.contains("sample count"), "{}", diag.message);
    }

    #[test]
    fn vector_double_immediate_reads_all_eight_words() {
        // dmov r0.xyzw, d(1.0, 2.0, 3.0, 4.0)
        let mut body = vec![make_opcode(0xc7, 0, 12, false, None, 0, false)];
        body.extend_from_slice(&temp_dst(0, 0xf));
        body.push(
            OperandToken::new()
                .components(COMPONENTS_4)
                .selection_mode(SELECTION_MASK)
                .mask(0xf)
                .register_type(0x05)
                .build(),
        );
        for lane in [1.0f64, 2.0, 3.0, 4.0] {
            let bits = lane.to_bits();
            body.push(bits as u32);
            body.push((bits >> 32) as u32);
        }
        let tokens = ps_5_0(&body);

        let (program, diags) = parse_program(&tokens, ShaderDesc::default()).unwrap();
        assert!(diags.is_empty());
        let ins = &program.instructions[0];
        assert_eq!(ins.opcode, Opcode::DMov);
        assert_eq!(
            ins.srcs[0].reg.immediate,
            Some(Immediate::U64x4([
                1.0f64.to_bits(),
                2.0f64.to_bits(),
                3.0f64.to_bits(),
                4.0f64.to_bits(),
            ]))
        );
    }
}
