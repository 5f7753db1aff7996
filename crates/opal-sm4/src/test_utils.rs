//! Builders for synthetic token streams.
//!
//! Shared by this crate's unit and integration tests; available to
//! downstream crates through the `test-utils` feature. Not part of the
//! stable API.

use crate::token::{
    make_opcode, make_version, OperandToken, COMPONENTS_0, COMPONENTS_4, INDEX_REP_IMMEDIATE32,
    SELECTION_MASK, SELECTION_SWIZZLE,
};

/// Patches the token-count word to the final stream length.
pub fn finish(mut tokens: Vec<u32>) -> Vec<u32> {
    tokens[1] = tokens.len() as u32;
    tokens
}

/// Version header plus body, with the count word patched.
pub fn shader(stage: u16, major: u8, minor: u8, body: &[u32]) -> Vec<u32> {
    let mut tokens = vec![make_version(stage, major, minor), 0];
    tokens.extend_from_slice(body);
    finish(tokens)
}

/// `ps_5_0` stream around the given instruction body.
pub fn ps_5_0(body: &[u32]) -> Vec<u32> {
    shader(0, 5, 0, body)
}

/// Masked vec4 destination operand with one literal index (two words).
pub fn masked_dst(register_type: u32, index: u32, mask: u8) -> [u32; 2] {
    [
        OperandToken::new()
            .components(COMPONENTS_4)
            .selection_mode(SELECTION_MASK)
            .mask(mask)
            .register_type(register_type)
            .index_dimension(1)
            .index_rep(0, INDEX_REP_IMMEDIATE32)
            .build(),
        index,
    ]
}

/// Swizzled vec4 source operand with one literal index (two words).
pub fn swizzled_src(register_type: u32, index: u32, swizzle: u8) -> [u32; 2] {
    [
        OperandToken::new()
            .components(COMPONENTS_4)
            .selection_mode(SELECTION_SWIZZLE)
            .swizzle(swizzle)
            .register_type(register_type)
            .index_dimension(1)
            .index_rep(0, INDEX_REP_IMMEDIATE32)
            .build(),
        index,
    ]
}

/// Zero-component declaration operand with literal indices.
pub fn decl_operand(register_type: u32, indices: &[u32]) -> Vec<u32> {
    let mut tok = OperandToken::new()
        .components(COMPONENTS_0)
        .register_type(register_type)
        .index_dimension(indices.len() as u32);
    for slot in 0..indices.len() {
        tok = tok.index_rep(slot, INDEX_REP_IMMEDIATE32);
    }
    let mut out = vec![tok.build()];
    out.extend_from_slice(indices);
    out
}

/// Complete `dcl_input v<register>.<mask>` instruction.
pub fn dcl_input(register: u32, mask: u8) -> Vec<u32> {
    let mut v = vec![make_opcode(0x5f, 0, 3, false, None, 0, false)];
    v.extend_from_slice(&masked_dst(0x01, register, mask));
    v
}
