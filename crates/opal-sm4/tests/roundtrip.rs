//! End-to-end decode/encode properties over hand-built token streams.

use opal_sm4::decode::parse_program;
use opal_sm4::encode::{encode_program, encode_token_stream};
use opal_sm4::fourcc::TAG_STAT;
use opal_sm4::ir::{Declaration, DstModifier, Swizzle, WriteMask};
use opal_sm4::op::Opcode;
use opal_sm4::test_utils::{dcl_input, decl_operand, masked_dst, shader, swizzled_src};
use opal_sm4::token::{
    make_decl_return_types, make_opcode, make_resource_controls, opcode_length, OperandToken,
    COMPONENTS_4, INDEX_REP_IMMEDIATE32, SELECTION_SWIZZLE,
};
use opal_sm4::{Program, ShaderDesc, ShaderError};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const SWIZZLE_IDENTITY: u8 = 0b11_10_01_00;

fn parse(tokens: &[u32]) -> Program {
    let (program, _) = parse_program(tokens, ShaderDesc::default()).unwrap();
    program
}

/// A pixel shader exercising declarations, a constant-buffer read, a
/// saturated mov and plain arithmetic.
fn sample_ps_5_0() -> Vec<u32> {
    let mut body = vec![make_opcode(0x6a, 0x01, 1, false, None, 0, false)];
    // cb0 with 4 vec4 constants, legacy two-index form.
    body.push(make_opcode(0x59, 0, 4, false, None, 0, false));
    body.extend_from_slice(&decl_operand(0x08, &[0, 4]));
    body.extend_from_slice(&dcl_input(1, 0xf));
    body.extend_from_slice(&[make_opcode(0x68, 0, 2, false, None, 0, false), 2]);
    // mov_sat r0.xyzw, v1.xyzw
    body.push(make_opcode(0x36, 0, 5, true, None, 0, false));
    body.extend_from_slice(&masked_dst(0x00, 0, 0xf));
    body.extend_from_slice(&swizzled_src(0x01, 1, SWIZZLE_IDENTITY));
    // add r0.xyzw, r0.xyzw, cb0[2].xyzw
    body.push(make_opcode(0x00, 0, 8, false, None, 0, false));
    body.extend_from_slice(&masked_dst(0x00, 0, 0xf));
    body.extend_from_slice(&swizzled_src(0x00, 0, SWIZZLE_IDENTITY));
    body.extend_from_slice(&[
        OperandToken::new()
            .components(COMPONENTS_4)
            .selection_mode(SELECTION_SWIZZLE)
            .swizzle(SWIZZLE_IDENTITY)
            .register_type(0x08)
            .index_dimension(2)
            .index_rep(0, INDEX_REP_IMMEDIATE32)
            .index_rep(1, INDEX_REP_IMMEDIATE32)
            .build(),
        0,
        2,
    ]);
    body.push(make_opcode(0x3e, 0, 1, false, None, 0, false));
    shader(0, 5, 0, &body)
}

#[test]
fn vertex_shader_mov_decodes_expected_shape() {
    let mut body = vec![make_opcode(0x68, 0, 2, false, None, 0, false), 2];
    body.push(make_opcode(0x36, 0, 5, false, None, 0, false));
    body.extend_from_slice(&masked_dst(0x00, 0, 0xf));
    body.extend_from_slice(&swizzled_src(0x00, 1, SWIZZLE_IDENTITY));
    let tokens = shader(1, 5, 0, &body);

    let program = parse(&tokens);
    assert_eq!(program.temp_count(), Some(2));

    let movs: Vec<_> = program
        .instructions
        .iter()
        .filter(|ins| ins.opcode == Opcode::Mov)
        .collect();
    assert_eq!(movs.len(), 1);
    let mov = movs[0];
    assert_eq!(mov.dsts[0].mask, WriteMask::ALL);
    assert_eq!(mov.dsts[0].modifier, DstModifier::None);
    assert_eq!(mov.srcs[0].swizzle(), Swizzle([0, 1, 2, 3]));
}

#[test]
fn decode_of_encode_is_identity() {
    let tokens = sample_ps_5_0();
    let program = parse(&tokens);

    let first = encode_token_stream(&program).unwrap();
    let reparsed = parse(&first);
    assert_eq!(reparsed, program);

    let second = encode_token_stream(&reparsed).unwrap();
    assert_eq!(second, first);
}

#[test]
fn saturate_survives_the_round_trip() {
    let tokens = sample_ps_5_0();
    let program = parse(&tokens);
    let sat: Vec<_> = program
        .instructions
        .iter()
        .filter(|ins| ins.opcode == Opcode::Mov)
        .map(|ins| ins.dsts[0].modifier)
        .collect();
    assert_eq!(sat, vec![DstModifier::Saturate]);

    let reparsed = parse(&encode_token_stream(&program).unwrap());
    assert_eq!(reparsed, program);
}

/// Instruction start offsets of a well-formed stream, version header
/// included as offset 2.
fn instruction_boundaries(tokens: &[u32]) -> Vec<usize> {
    let mut bounds = vec![2];
    let mut pos = 2;
    while pos < tokens.len() {
        let len = opcode_length(tokens[pos]) as usize;
        assert!(len > 0, "helper does not handle follow-on length words");
        pos += len;
        bounds.push(pos);
    }
    bounds
}

#[test]
fn truncation_at_every_offset_is_contained() {
    let tokens = sample_ps_5_0();
    let boundaries = instruction_boundaries(&tokens);

    for cut in 2..tokens.len() {
        let mut truncated = tokens[..cut].to_vec();
        truncated[1] = cut as u32;
        let result = parse_program(&truncated, ShaderDesc::default());
        if boundaries.contains(&cut) {
            // Cutting between instructions leaves a shorter valid program.
            assert!(result.is_ok(), "boundary cut at {cut} should parse");
        } else {
            assert!(result.is_err(), "mid-instruction cut at {cut} must fail");
        }
    }
}

#[test]
fn descriptor_registers_share_one_index_shape_across_models() {
    // cb1[1] in both encodings; 5.1 spells out the one-element range.
    let mut legacy = vec![make_opcode(0x59, 0, 4, false, None, 0, false)];
    legacy.extend_from_slice(&decl_operand(0x08, &[1, 1]));
    let legacy = parse(&shader(0, 4, 0, &legacy));

    let mut modern = vec![make_opcode(0x59, 0, 7, false, None, 0, false)];
    modern.extend_from_slice(&decl_operand(0x08, &[1, 1, 1]));
    modern.push(1); // size
    modern.push(0); // space
    let modern = parse(&shader(0, 5, 1, &modern));

    let cb_decl = |p: &Program| match &p.instructions[0].decl {
        Some(decl @ Declaration::ConstantBuffer { reg, .. }) => {
            assert_eq!(reg.indices.len(), 3);
            decl.clone()
        }
        other => panic!("expected a constant buffer declaration, got {other:?}"),
    };
    assert_eq!(cb_decl(&legacy), cb_decl(&modern));
}

#[test]
fn resource_range_collapses_for_a_legacy_target() {
    let mut body = vec![make_opcode(
        0x58,
        make_resource_controls(3, 0), // texture2d
        7,
        false,
        None,
        0,
        false,
    )];
    body.extend_from_slice(&decl_operand(0x07, &[2, 5, 7]));
    body.push(make_decl_return_types([3, 3, 3, 3])); // float4
    body.push(1); // space
    body.push(make_opcode(0x3e, 0, 1, false, None, 0, false));
    let tokens = shader(0, 5, 1, &body);

    let mut program = parse(&tokens);
    let (reg, range) = match &program.instructions[0].decl {
        Some(Declaration::Resource { reg, range, .. }) => (reg.clone(), *range),
        other => panic!("expected a resource declaration, got {other:?}"),
    };
    assert_eq!(reg.indices.len(), 3);
    assert_eq!(range.first, 5);
    assert_eq!(range.last, 7);
    assert_eq!(range.space, 1);

    // Re-encoded for a pre-5.1 model the declaration keeps a single index
    // word, the start of the range.
    program.version.minor = 0;
    let legacy = encode_token_stream(&program).unwrap();
    let operand = legacy[3];
    assert_eq!((operand >> 20) & 0x3, 1, "one index dimension");
    assert_eq!(legacy[4], 5);
    // No space word; the return types are followed directly by ret.
    assert_eq!(legacy[5], make_decl_return_types([3, 3, 3, 3]));
    assert_eq!(opcode_length(legacy[6]), 1);
}

#[test]
fn overlapping_input_masks_are_rejected() {
    let mut ok = dcl_input(3, 0b0011);
    ok.extend_from_slice(&dcl_input(3, 0b1100));
    assert!(parse_program(&shader(0, 5, 0, &ok), ShaderDesc::default()).is_ok());

    let mut bad = ok.clone();
    bad.extend_from_slice(&dcl_input(3, 0b0110));
    let err = parse_program(&shader(0, 5, 0, &bad), ShaderDesc::default()).unwrap_err();
    assert!(matches!(err, ShaderError::InvalidShader(_)));
}

#[test]
fn statistics_bytes_are_deterministic() {
    let program = parse(&sample_ps_5_0());
    let first = encode_program(&program).unwrap();
    let second = encode_program(&program).unwrap();
    let stat = |e: &opal_sm4::encode::EncodedShader| e.section(TAG_STAT).unwrap().data.clone();
    assert_eq!(stat(&first), stat(&second));
    assert_eq!(first, second);
}

fn truncation_cut() -> impl Strategy<Value = usize> {
    let len = sample_ps_5_0().len();
    2..len
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn decoder_is_total_on_arbitrary_streams(tokens in prop::collection::vec(any::<u32>(), 0..64)) {
        // Any outcome is fine as long as it is a result, not a panic or an
        // out-of-bounds read.
        let _ = parse_program(&tokens, ShaderDesc::default());
    }

    #[test]
    fn decoder_is_total_on_versioned_garbage(body in prop::collection::vec(any::<u32>(), 0..48)) {
        let tokens = shader(0, 5, 0, &body);
        let _ = parse_program(&tokens, ShaderDesc::default());
    }

    #[test]
    fn truncated_streams_never_panic(cut in truncation_cut()) {
        let tokens = sample_ps_5_0();
        let mut truncated = tokens[..cut].to_vec();
        truncated[1] = cut as u32;
        let _ = parse_program(&truncated, ShaderDesc::default());
    }
}
