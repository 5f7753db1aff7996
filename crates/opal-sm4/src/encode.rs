//! Token stream encoding and container section assembly.
//!
//! [`encode_program`] is the inverse of [`crate::decode::parse_program`]:
//! it serializes a [`Program`] back into a token stream plus the container
//! sections a consumer expects alongside it (signatures, feature flags,
//! statistics). Instruction lengths are back-patched once each body is
//! written; anything longer than the embedded length field gets the
//! follow-on total-length word.

use std::collections::HashMap;

use crate::fourcc::{
    FourCC, TAG_ISG1, TAG_ISGN, TAG_OSG1, TAG_OSG5, TAG_OSGN, TAG_PCSG, TAG_PSG1, TAG_SFI0,
    TAG_SHDR, TAG_SHEX, TAG_STAT,
};
use crate::ir::{
    Declaration, DstOperand, FeatureFlags, GlobalFlags, Immediate, Instruction, OperandDimension,
    OperandModifier, Program, Register, RegisterIndex, ResourceInfo, ShaderStage, Signature,
    SrcOperand, SrcSelection, TexelOffset, Version, WriteMask,
};
use crate::limits::{
    MAX_PROGRAM_TOKEN_COUNT, MAX_REGISTER_INDEX_COUNT, MAX_TEXEL_OFFSET, MIN_TEXEL_OFFSET,
};
use crate::op::{DefaultSwizzleKind, MinPrecision, Opcode, ReadKind, RegisterType, ResourceDataType};
use crate::stat::Statistics;
use crate::token;
use crate::ShaderError;

/// One encoded container section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub tag: FourCC,
    pub data: Vec<u8>,
}

/// The full set of sections for one program, in container order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedShader {
    pub sections: Vec<Section>,
}

impl EncodedShader {
    /// Finds a section by tag.
    pub fn section(&self, tag: FourCC) -> Option<&Section> {
        self.sections.iter().find(|s| s.tag == tag)
    }
}

/// Serializes a program into its container sections: the signature
/// sections, `SFI0` feature flags (only when non-zero), the `SHDR`/`SHEX`
/// token stream and the `STAT` record.
pub fn encode_program(program: &Program) -> Result<EncodedShader, ShaderError> {
    let version = program.version;
    let tokens = encode_token_stream(program)?;
    let stats = Statistics::for_program(program);
    let features = feature_flags(program);
    let hull = version.stage == ShaderStage::Hull;

    let mut sections = Vec::new();
    if !features.is_empty() {
        sections.push(Section {
            tag: TAG_SFI0,
            data: features.bits().to_le_bytes().to_vec(),
        });
    }
    sections.push(signature_section(
        &program.input_signature,
        SignatureRole::Input,
        hull,
    )?);
    sections.push(signature_section(
        &program.output_signature,
        SignatureRole::Output,
        hull,
    )?);
    if !program.patch_constant_signature.elements.is_empty() {
        sections.push(signature_section(
            &program.patch_constant_signature,
            SignatureRole::PatchConstant,
            hull,
        )?);
    }
    sections.push(Section {
        tag: if version.major >= 5 { TAG_SHEX } else { TAG_SHDR },
        data: dwords_to_bytes(&tokens)?,
    });
    sections.push(Section {
        tag: TAG_STAT,
        data: dwords_to_bytes(&stats.to_dwords(version))?,
    });
    Ok(EncodedShader { sections })
}

fn dwords_to_bytes(words: &[u32]) -> Result<Vec<u8>, ShaderError> {
    let mut out = Vec::new();
    out.try_reserve_exact(words.len() * 4)
        .map_err(|_| ShaderError::OutOfMemory)?;
    for w in words {
        out.extend_from_slice(&w.to_le_bytes());
    }
    Ok(out)
}

// ---- Feature flags ----

/// Derives the `SFI0` flags from what the program actually declares and
/// uses: global-flag opt-ins, minimum-precision anywhere, stencil-ref
/// outputs and rasterizer-ordered views.
fn feature_flags(program: &Program) -> FeatureFlags {
    let mut flags = FeatureFlags::empty();
    if let Some(g) = program.global_flags() {
        if g.contains(GlobalFlags::ENABLE_DOUBLES) {
            flags |= FeatureFlags::DOUBLES;
        }
        if g.contains(GlobalFlags::ENABLE_MINIMUM_PRECISION) {
            flags |= FeatureFlags::MINIMUM_PRECISION;
        }
        if g.contains(GlobalFlags::ENABLE_DOUBLE_EXTENSIONS) {
            flags |= FeatureFlags::DOUBLE_EXTENSIONS_11_1;
        }
        if g.contains(GlobalFlags::ENABLE_SHADER_EXTENSIONS) {
            flags |= FeatureFlags::SHADER_EXTENSIONS_11_1;
        }
        if g.contains(GlobalFlags::ENABLE_RAW_STRUCTURED_IN_NON_CS)
            && program.version.stage != ShaderStage::Compute
        {
            flags |= FeatureFlags::COMPUTE_SHADERS_PLUS_RAW_AND_STRUCTURED_BUFFERS_VIA_SHADER_4_X;
        }
    }
    for signature in [
        &program.input_signature,
        &program.output_signature,
        &program.patch_constant_signature,
    ] {
        if signature.uses_min_precision() {
            flags |= FeatureFlags::MINIMUM_PRECISION;
        }
    }
    for ins in &program.instructions {
        if ins
            .dsts
            .iter()
            .any(|d| d.reg.ty == RegisterType::StencilRefOut)
        {
            flags |= FeatureFlags::STENCIL_REF;
        }
        let min_precision = ins
            .dsts
            .iter()
            .any(|d| d.precision != MinPrecision::Default)
            || ins
                .srcs
                .iter()
                .any(|s| s.precision != MinPrecision::Default);
        if min_precision {
            flags |= FeatureFlags::MINIMUM_PRECISION;
        }
        if let Some(
            Declaration::UavTyped { flags: uav, .. }
            | Declaration::UavRaw { flags: uav, .. }
            | Declaration::UavStructured { flags: uav, .. },
        ) = &ins.decl
        {
            if uav.contains(crate::ir::UavFlags::RASTERIZER_ORDERED) {
                flags |= FeatureFlags::ROVS;
            }
        }
    }
    flags
}

// ---- Signature sections ----

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignatureRole {
    Input,
    Output,
    PatchConstant,
}

const SIGNATURE_HEADER_LEN: usize = 8;
const SIGNATURE_ENTRY_LEN_V0: usize = 24;
const SIGNATURE_ENTRY_LEN_V1: usize = 32;

fn signature_section(
    signature: &Signature,
    role: SignatureRole,
    hull: bool,
) -> Result<Section, ShaderError> {
    // Minimum precision forces the v1 entry layout; geometry streams fit
    // the packed v0 dword, so `OSG5` keeps the v0 layout.
    let v1 = signature.uses_min_precision();
    let tag = match role {
        SignatureRole::Input => {
            if v1 {
                TAG_ISG1
            } else {
                TAG_ISGN
            }
        }
        SignatureRole::Output => {
            if v1 {
                TAG_OSG1
            } else if signature.uses_streams() {
                TAG_OSG5
            } else {
                TAG_OSGN
            }
        }
        SignatureRole::PatchConstant => {
            if v1 {
                TAG_PSG1
            } else {
                TAG_PCSG
            }
        }
    };
    // The output side stores its "used" masks inverted; for hull shaders
    // the patch-constant signature does too.
    let invert_used = match role {
        SignatureRole::Input => false,
        SignatureRole::Output => true,
        SignatureRole::PatchConstant => hull,
    };
    Ok(Section {
        tag,
        data: write_signature(signature, v1, invert_used)?,
    })
}

fn put_u32(data: &mut Vec<u8>, value: u32) {
    data.extend_from_slice(&value.to_le_bytes());
}

fn write_signature(
    signature: &Signature,
    v1: bool,
    invert_used: bool,
) -> Result<Vec<u8>, ShaderError> {
    let elements = &signature.elements;
    let entry_len = if v1 {
        SIGNATURE_ENTRY_LEN_V1
    } else {
        SIGNATURE_ENTRY_LEN_V0
    };

    let mut order: Vec<usize> = (0..elements.len()).collect();
    order.sort_by_key(|&i| {
        let e = &elements[i];
        (e.stream, e.register, e.mask)
    });

    // Semantic-name strings live after the entry table, deduplicated, each
    // NUL terminated. Offsets are relative to the section start.
    let strings_base = SIGNATURE_HEADER_LEN + elements.len() * entry_len;
    let mut pool: Vec<u8> = Vec::new();
    let mut name_offsets: HashMap<&str, u32> = HashMap::new();
    for &i in &order {
        let name = elements[i].name.as_str();
        if !name_offsets.contains_key(name) {
            name_offsets.insert(name, (strings_base + pool.len()) as u32);
            pool.try_reserve(name.len() + 1)
                .map_err(|_| ShaderError::OutOfMemory)?;
            pool.extend_from_slice(name.as_bytes());
            pool.push(0);
        }
    }

    let mut data = Vec::new();
    data.try_reserve_exact(strings_base + pool.len())
        .map_err(|_| ShaderError::OutOfMemory)?;
    put_u32(&mut data, elements.len() as u32);
    put_u32(&mut data, SIGNATURE_HEADER_LEN as u32);
    for &i in &order {
        let e = &elements[i];
        let used_wire = if invert_used {
            WriteMask(e.mask.0 ^ e.used_mask.0)
        } else {
            e.used_mask
        };
        put_u32(&mut data, name_offsets[e.name.as_str()]);
        put_u32(&mut data, e.semantic_index);
        put_u32(&mut data, e.sysval.0);
        put_u32(&mut data, e.component_type.wire());
        put_u32(&mut data, e.register);
        if v1 {
            data.push(e.mask.0);
            data.push(used_wire.0);
            data.extend_from_slice(&[0, 0]);
            put_u32(&mut data, e.stream);
            put_u32(&mut data, e.min_precision.wire());
        } else {
            let packed = (e.mask.0 as u32)
                | ((used_wire.0 as u32) << 8)
                | (e.stream << 16)
                | (e.min_precision.wire() << 24);
            put_u32(&mut data, packed);
        }
    }
    data.extend_from_slice(&pool);
    Ok(data)
}

// ---- Token stream ----

/// Serializes the version token, the token-count word and every
/// instruction.
pub fn encode_token_stream(program: &Program) -> Result<Vec<u32>, ShaderError> {
    let version = program.version;
    let mut out = vec![
        token::make_version(version.stage.wire(), version.major, version.minor),
        0,
    ];
    for ins in &program.instructions {
        encode_instruction(&mut out, ins, version)?;
    }
    if out.len() > MAX_PROGRAM_TOKEN_COUNT as usize {
        return Err(ShaderError::InvalidShader(format!(
            "program of {} tokens exceeds the format maximum",
            out.len()
        )));
    }
    out[1] = out.len() as u32;
    Ok(out)
}

enum ExtOpcode {
    SampleControls(TexelOffset),
    ResourceDim(ResourceInfo),
    ReturnTypes([ResourceDataType; 4]),
}

fn encode_instruction(
    out: &mut Vec<u32>,
    ins: &Instruction,
    version: Version,
) -> Result<(), ShaderError> {
    if ins.opcode == Opcode::CustomData {
        return encode_custom_data(out, ins);
    }

    let start = out.len();
    out.push(0); // opcode token, patched below

    let mut exts = Vec::new();
    if let Some(off) = ins.texel_offset {
        // Signed 4-bit immediates on the wire; anything wider would be
        // silently truncated by the token packing.
        for component in [off.u, off.v, off.w] {
            if !(MIN_TEXEL_OFFSET..=MAX_TEXEL_OFFSET).contains(&component) {
                return Err(ShaderError::InvalidShader(format!(
                    "texel offset {component} outside {MIN_TEXEL_OFFSET}..={MAX_TEXEL_OFFSET}"
                )));
            }
        }
        exts.push(ExtOpcode::SampleControls(off));
    }
    if let Some(info) = ins.resource_info {
        exts.push(ExtOpcode::ResourceDim(info));
    }
    if let Some(data) = ins.resource_data {
        exts.push(ExtOpcode::ReturnTypes(data));
    }
    let extended = !exts.is_empty();
    let count = exts.len();
    for (i, ext) in exts.into_iter().enumerate() {
        let continues = i + 1 < count;
        out.push(match ext {
            ExtOpcode::SampleControls(o) => {
                token::make_sample_controls([o.u, o.v, o.w], continues)
            }
            ExtOpcode::ResourceDim(info) => {
                token::make_resource_dim(info.ty.wire(), info.stride, continues)
            }
            ExtOpcode::ReturnTypes(data) => {
                token::make_resource_return_types(data.map(|d| d.wire()), continues)
            }
        });
    }

    let controls = match &ins.decl {
        Some(decl) => {
            let controls = declaration_controls(decl);
            write_declaration(out, decl, version)?;
            controls
        }
        None => {
            let info = ins.opcode.info();
            if ins.opcode.is_declaration()
                && !matches!(info.read, ReadKind::HsPhase | ReadKind::InterfaceCall)
            {
                return Err(ShaderError::InvalidShader(format!(
                    "{} requires a declaration payload",
                    ins.opcode.name()
                )));
            }
            if ins.dsts.len() != info.dst_types.len() || ins.srcs.len() != info.src_types.len() {
                return Err(ShaderError::InvalidShader(format!(
                    "{} takes {} destination(s) and {} source(s), got {} and {}",
                    ins.opcode.name(),
                    info.dst_types.len(),
                    info.src_types.len(),
                    ins.dsts.len(),
                    ins.srcs.len()
                )));
            }
            for dst in &ins.dsts {
                write_dst_operand(out, dst, version)?;
            }
            for src in &ins.srcs {
                write_src_operand(out, src, version)?;
            }
            ins.controls
        }
    };

    let mut len = out.len() - start;
    let mut embedded = len as u32;
    if embedded > token::MAX_EMBEDDED_LENGTH {
        // Length field overflow: the real total (including the extra word)
        // follows the opcode token as a whole word.
        len += 1;
        out.insert(start + 1, len as u32);
        embedded = 0;
    }
    out[start] = token::make_opcode(
        ins.opcode.wire(),
        controls,
        embedded,
        ins.saturates(),
        ins.test_nonzero,
        ins.precise,
        extended,
    );
    Ok(())
}

const CLASS_IMMEDIATE_CONSTANT_BUFFER: u32 = 3;

fn encode_custom_data(out: &mut Vec<u32>, ins: &Instruction) -> Result<(), ShaderError> {
    let wire = ins.opcode.wire();
    match &ins.decl {
        Some(Declaration::ImmediateConstantBuffer(rows)) => {
            let len = u32::try_from(2 + rows.len() * 4).map_err(|_| {
                ShaderError::InvalidShader("immediate constant buffer too large".into())
            })?;
            out.push(token::make_customdata(wire, CLASS_IMMEDIATE_CONSTANT_BUFFER));
            out.push(len);
            for row in rows {
                out.extend_from_slice(row);
            }
        }
        Some(Declaration::CustomData { class, words }) => {
            let len = u32::try_from(2 + words.len())
                .map_err(|_| ShaderError::InvalidShader("custom-data block too large".into()))?;
            out.push(token::make_customdata(wire, *class));
            out.push(len);
            out.extend_from_slice(words);
        }
        _ => {
            return Err(ShaderError::InvalidShader(
                "custom-data instruction without a custom-data payload".into(),
            ));
        }
    }
    Ok(())
}

// ---- Operand encoding ----

/// The index chain as it goes on the wire: pre-5.1 descriptor registers
/// drop the leading id the decoder duplicated in.
fn effective_indices(reg: &Register, version: Version) -> &[RegisterIndex] {
    if reg.ty.is_descriptor() && !version.is_51() && !reg.indices.is_empty() {
        &reg.indices[1..]
    } else {
        &reg.indices
    }
}

fn index_rep(index: &RegisterIndex) -> u32 {
    match (index.offset.is_some(), index.relative.is_some()) {
        (_, false) => token::INDEX_REP_IMMEDIATE32,
        (false, true) => token::INDEX_REP_RELATIVE,
        (true, true) => token::INDEX_REP_IMMEDIATE32_PLUS_RELATIVE,
    }
}

fn write_index(
    out: &mut Vec<u32>,
    index: &RegisterIndex,
    version: Version,
) -> Result<(), ShaderError> {
    if index.relative.is_none() {
        out.push(index.value());
    } else {
        if let Some(offset) = index.offset {
            out.push(offset);
        }
        if let Some(rel) = &index.relative {
            write_src_operand(out, rel, version)?;
        }
    }
    Ok(())
}

fn write_immediate(out: &mut Vec<u32>, immediate: Immediate) {
    match immediate {
        Immediate::U32(v) => out.push(v),
        Immediate::U32x4(v) => out.extend_from_slice(&v),
        Immediate::U64(v) => {
            out.push(v as u32);
            out.push((v >> 32) as u32);
        }
        Immediate::U64x4(v) => {
            for lane in v {
                out.push(lane as u32);
                out.push((lane >> 32) as u32);
            }
        }
    }
}

fn write_register_body(
    out: &mut Vec<u32>,
    reg: &Register,
    version: Version,
) -> Result<(), ShaderError> {
    for index in effective_indices(reg, version) {
        write_index(out, index, version)?;
    }
    if let Some(immediate) = reg.immediate {
        write_immediate(out, immediate);
    }
    Ok(())
}

/// The operand token's index-dimension field holds at most
/// [`MAX_REGISTER_INDEX_COUNT`] slots; wider chains cannot be encoded.
fn check_index_count(indices: &[RegisterIndex]) -> Result<(), ShaderError> {
    if indices.len() > MAX_REGISTER_INDEX_COUNT {
        return Err(ShaderError::InvalidShader(format!(
            "register carries {} index slots, the operand token holds at most {}",
            indices.len(),
            MAX_REGISTER_INDEX_COUNT
        )));
    }
    Ok(())
}

fn operand_token_base(reg: &Register, version: Version) -> token::OperandToken {
    let indices = effective_indices(reg, version);
    let mut tok = token::OperandToken::new()
        .register_type(reg.ty.wire())
        .index_dimension(indices.len() as u32);
    for (slot, index) in indices.iter().enumerate() {
        tok = tok.index_rep(slot, index_rep(index));
    }
    tok
}

fn write_dst_operand(
    out: &mut Vec<u32>,
    dst: &DstOperand,
    version: Version,
) -> Result<(), ShaderError> {
    check_index_count(effective_indices(&dst.reg, version))?;
    let mut tok = operand_token_base(&dst.reg, version);
    tok = match dst.dimension {
        OperandDimension::Zero => tok.components(token::COMPONENTS_0),
        OperandDimension::One => tok.components(token::COMPONENTS_1),
        OperandDimension::Four => tok
            .components(token::COMPONENTS_4)
            .selection_mode(token::SELECTION_MASK)
            .mask(dst.mask.0),
    };
    let ext = dst.precision != MinPrecision::Default || dst.non_uniform;
    if ext {
        tok = tok.extended();
    }
    out.push(tok.build());
    if ext {
        out.push(token::make_extended_operand(
            OperandModifier::None.wire(),
            dst.precision.wire(),
            dst.non_uniform,
        ));
    }
    write_register_body(out, &dst.reg, version)
}

fn write_src_operand(
    out: &mut Vec<u32>,
    src: &SrcOperand,
    version: Version,
) -> Result<(), ShaderError> {
    check_index_count(effective_indices(&src.reg, version))?;
    let mut tok = operand_token_base(&src.reg, version);
    tok = match src.dimension {
        OperandDimension::Zero => tok.components(token::COMPONENTS_0),
        OperandDimension::One => tok.components(token::COMPONENTS_1),
        OperandDimension::Four => {
            let tok = tok.components(token::COMPONENTS_4);
            match src.selection {
                SrcSelection::Mask(mask) => {
                    tok.selection_mode(token::SELECTION_MASK).mask(mask.0)
                }
                SrcSelection::Swizzle(swizzle) => tok
                    .selection_mode(token::SELECTION_SWIZZLE)
                    .swizzle(swizzle.packed()),
                SrcSelection::Select1(component) => tok
                    .selection_mode(token::SELECTION_SELECT1)
                    .select1(component),
                // A four-component source without explicit selection gets
                // the register type's default swizzle.
                SrcSelection::None => tok.selection_mode(token::SELECTION_SWIZZLE).swizzle(
                    match src.reg.ty.default_swizzle_kind() {
                        DefaultSwizzleKind::Vec4 => crate::ir::Swizzle::IDENTITY.packed(),
                        DefaultSwizzleKind::Scalar => crate::ir::Swizzle::replicate(0).packed(),
                    },
                ),
            }
        }
    };
    let ext = src.modifier != OperandModifier::None
        || src.precision != MinPrecision::Default
        || src.non_uniform;
    if ext {
        tok = tok.extended();
    }
    out.push(tok.build());
    if ext {
        out.push(token::make_extended_operand(
            src.modifier.wire(),
            src.precision.wire(),
            src.non_uniform,
        ));
    }
    write_register_body(out, &src.reg, version)
}

/// Declaration register operands are emitted in canonical zero-component
/// form; the decoder only keeps the register out of them.
///
/// `legacy_count` is how many index words the declaration carries on a
/// pre-5.1 wire: one for resources/samplers/UAVs (the id doubles as the
/// whole range), two for constant buffers (id plus size). 5.1 targets
/// always emit the full id/first/last chain.
fn write_decl_register(
    out: &mut Vec<u32>,
    reg: &Register,
    version: Version,
    legacy_count: usize,
) -> Result<(), ShaderError> {
    let indices: &[RegisterIndex] =
        if reg.ty.is_descriptor() && !version.is_51() && !reg.indices.is_empty() {
            let end = (1 + legacy_count).min(reg.indices.len());
            &reg.indices[1..end]
        } else {
            &reg.indices
        };
    let mut tok = token::OperandToken::new()
        .components(token::COMPONENTS_0)
        .register_type(reg.ty.wire())
        .index_dimension(indices.len() as u32);
    for (slot, index) in indices.iter().enumerate() {
        tok = tok.index_rep(slot, index_rep(index));
    }
    out.push(tok.build());
    for index in indices {
        write_index(out, index, version)?;
    }
    Ok(())
}

// ---- Declaration encoding ----

/// Rebuilds the opcode-token controls field from the declaration payload.
fn declaration_controls(decl: &Declaration) -> u32 {
    match decl {
        Declaration::GlobalFlags(f) => f.bits(),
        Declaration::Resource {
            resource,
            sample_count,
            ..
        } => token::make_resource_controls(resource.ty.wire(), *sample_count),
        Declaration::ConstantBuffer {
            dynamic_indexed, ..
        } => *dynamic_indexed as u32,
        Declaration::Sampler { mode, .. } => mode.wire(),
        Declaration::InputPs { interpolation, .. }
        | Declaration::InputPsSiv { interpolation, .. } => interpolation.wire(),
        Declaration::GsOutputTopology(t) => token::make_enum6_controls(t.wire()),
        Declaration::GsInputPrimitive(p) => token::make_enum6_controls(p.wire()),
        Declaration::TessDomain(d) => token::make_enum6_controls(d.wire()),
        Declaration::TessPartitioning(p) => token::make_enum6_controls(p.wire()),
        Declaration::TessOutputPrimitive(p) => token::make_enum6_controls(p.wire()),
        Declaration::InputControlPointCount(n) | Declaration::OutputControlPointCount(n) => {
            token::make_enum6_controls(*n)
        }
        Declaration::UavTyped {
            resource, flags, ..
        } => resource.ty.wire() | flags.bits(),
        Declaration::UavRaw { flags, .. } | Declaration::UavStructured { flags, .. } => {
            flags.bits()
        }
        _ => 0,
    }
}

/// Trailing register-space word of 5.1 descriptor declarations.
fn write_space(out: &mut Vec<u32>, space: u32, version: Version) {
    if version.is_51() {
        out.push(space);
    }
}

fn write_declaration(
    out: &mut Vec<u32>,
    decl: &Declaration,
    version: Version,
) -> Result<(), ShaderError> {
    match decl {
        Declaration::GlobalFlags(_) => {}
        Declaration::Temps(n) => out.push(*n),
        Declaration::IndexableTemp {
            id,
            count,
            components,
        } => out.extend_from_slice(&[*id, *count, *components]),
        Declaration::Input { reg } | Declaration::InputPs { reg, .. } => {
            write_dst_operand(out, reg, version)?;
        }
        Declaration::InputSgv { reg, sysval }
        | Declaration::InputSiv { reg, sysval }
        | Declaration::InputPsSgv { reg, sysval }
        | Declaration::InputPsSiv { reg, sysval, .. } => {
            write_dst_operand(out, reg, version)?;
            out.push(sysval.0);
        }
        Declaration::Output { reg } => write_dst_operand(out, reg, version)?,
        Declaration::OutputSgv { reg, sysval } | Declaration::OutputSiv { reg, sysval } => {
            write_dst_operand(out, reg, version)?;
            out.push(sysval.0);
        }
        Declaration::IndexRange { reg, count } => {
            write_dst_operand(out, reg, version)?;
            out.push(*count);
        }
        Declaration::Resource {
            reg, data, range, ..
        } => {
            write_decl_register(out, reg, version, 1)?;
            out.push(token::make_decl_return_types(data.map(|d| d.wire())));
            write_space(out, range.space, version);
        }
        Declaration::ConstantBuffer {
            reg, size, range, ..
        } => {
            // The pre-5.1 buffer size travels as the operand's trailing
            // index, already in the register's index chain.
            write_decl_register(out, reg, version, 2)?;
            if version.is_51() {
                out.push(*size);
            }
            write_space(out, range.space, version);
        }
        Declaration::Sampler { reg, range, .. } => {
            write_decl_register(out, reg, version, 1)?;
            write_space(out, range.space, version);
        }
        Declaration::GsOutputTopology(_)
        | Declaration::GsInputPrimitive(_)
        | Declaration::InputControlPointCount(_)
        | Declaration::OutputControlPointCount(_)
        | Declaration::TessDomain(_)
        | Declaration::TessPartitioning(_)
        | Declaration::TessOutputPrimitive(_) => {}
        Declaration::VerticesOut(n)
        | Declaration::GsInstanceCount(n)
        | Declaration::FunctionBody(n)
        | Declaration::HsForkPhaseInstanceCount(n)
        | Declaration::HsJoinPhaseInstanceCount(n) => out.push(*n),
        Declaration::Stream(reg) => write_decl_register(out, reg, version, 1)?,
        Declaration::FunctionTable { id, body_ids } => {
            out.push(*id);
            out.push(body_ids.len() as u32);
            out.extend_from_slice(body_ids);
        }
        Declaration::Interface { id, words } => {
            out.push(*id);
            out.extend_from_slice(words);
        }
        Declaration::HsMaxTessFactor(factor) => out.push(factor.to_bits()),
        Declaration::ThreadGroup { x, y, z } => out.extend_from_slice(&[*x, *y, *z]),
        Declaration::UavTyped {
            reg, data, range, ..
        } => {
            write_decl_register(out, reg, version, 1)?;
            out.push(token::make_decl_return_types(data.map(|d| d.wire())));
            write_space(out, range.space, version);
        }
        Declaration::UavRaw { reg, range, .. } => {
            write_decl_register(out, reg, version, 1)?;
            write_space(out, range.space, version);
        }
        Declaration::UavStructured {
            reg,
            stride,
            range,
            ..
        } => {
            write_decl_register(out, reg, version, 1)?;
            out.push(*stride);
            write_space(out, range.space, version);
        }
        Declaration::TgsmRaw { reg, byte_count } => {
            write_decl_register(out, reg, version, 1)?;
            out.push(*byte_count);
        }
        Declaration::TgsmStructured { reg, stride, count } => {
            write_decl_register(out, reg, version, 1)?;
            out.extend_from_slice(&[*stride, *count]);
        }
        Declaration::ResourceRaw { reg, range } => {
            write_decl_register(out, reg, version, 1)?;
            write_space(out, range.space, version);
        }
        Declaration::ResourceStructured { reg, stride, range } => {
            write_decl_register(out, reg, version, 1)?;
            out.push(*stride);
            write_space(out, range.space, version);
        }
        Declaration::ImmediateConstantBuffer(_) | Declaration::CustomData { .. } => {
            return Err(ShaderError::InvalidShader(
                "custom-data payload on a non-custom-data opcode".into(),
            ));
        }
    }
    Ok(())
}
