//! Typed accessors over the raw 32-bit tokens of the SM4/SM5 wire format.
//!
//! Every bit-packed field gets a named extraction/construction pair here so
//! the decoder and encoder never scatter shift/mask literals. Field layouts
//! follow the D3D10/D3D11 tokenized program format headers
//! (`d3d10tokenizedprogramformat.h` / `d3d11tokenizedprogramformat.h`).

// ---- Version token ----

/// Shader-type field of the version token (high 16 bits).
pub fn version_type(token: u32) -> u16 {
    (token >> 16) as u16
}

/// Major version nibble.
pub fn version_major(token: u32) -> u8 {
    ((token >> 4) & 0xf) as u8
}

/// Minor version nibble.
pub fn version_minor(token: u32) -> u8 {
    (token & 0xf) as u8
}

/// Builds a version token from its parts.
pub fn make_version(ty: u16, major: u8, minor: u8) -> u32 {
    ((ty as u32) << 16) | ((major as u32 & 0xf) << 4) | (minor as u32 & 0xf)
}

// ---- Opcode token ----

const OPCODE_MASK: u32 = 0xff;
const OPCODE_CONTROLS_SHIFT: u32 = 11;
const OPCODE_CONTROLS_MASK: u32 = 0x1fff;
const OPCODE_LENGTH_SHIFT: u32 = 24;
const OPCODE_LENGTH_MASK: u32 = 0x7f;
const OPCODE_EXTENDED_BIT: u32 = 0x8000_0000;

const SATURATE_BIT: u32 = 1 << 13;
const TEST_NONZERO_BIT: u32 = 1 << 18;
const PRECISE_SHIFT: u32 = 19;
const PRECISE_MASK: u32 = 0xf;

/// Wire opcode id (low 8 bits of the opening token).
pub fn opcode_id(token: u32) -> u32 {
    token & OPCODE_MASK
}

/// Opcode-specific control bits (bits 11..=23), with the saturate bit, the
/// test-boolean bit and the precise nibble masked out.
pub fn opcode_controls(token: u32) -> u32 {
    let controls = (token >> OPCODE_CONTROLS_SHIFT) & OPCODE_CONTROLS_MASK;
    let strip = (SATURATE_BIT | TEST_NONZERO_BIT | (PRECISE_MASK << PRECISE_SHIFT))
        >> OPCODE_CONTROLS_SHIFT;
    controls & !strip
}

/// Instruction length in dwords, including the opcode token itself.
///
/// A zero value means the real length follows in the next token.
pub fn opcode_length(token: u32) -> u32 {
    (token >> OPCODE_LENGTH_SHIFT) & OPCODE_LENGTH_MASK
}

/// Whether one or more extended opcode tokens follow.
pub fn opcode_is_extended(token: u32) -> bool {
    (token & OPCODE_EXTENDED_BIT) != 0
}

/// Whether the saturate control bit is set.
pub fn opcode_saturate(token: u32) -> bool {
    (token & SATURATE_BIT) != 0
}

/// Conditional test sense: `true` tests for nonzero, `false` for zero.
pub fn opcode_test_nonzero(token: u32) -> bool {
    (token & TEST_NONZERO_BIT) != 0
}

/// Per-component "precise" nibble (bits 19..=22).
pub fn opcode_precise(token: u32) -> u8 {
    ((token >> PRECISE_SHIFT) & PRECISE_MASK) as u8
}

/// Builds an opcode token. `length` must fit the embedded field; callers emit
/// a follow-on length word themselves when it does not.
pub fn make_opcode(
    opcode: u32,
    controls: u32,
    length: u32,
    saturate: bool,
    test_nonzero: Option<bool>,
    precise: u8,
    extended: bool,
) -> u32 {
    debug_assert!(length <= OPCODE_LENGTH_MASK);
    let mut token = (opcode & OPCODE_MASK)
        | ((controls & OPCODE_CONTROLS_MASK) << OPCODE_CONTROLS_SHIFT)
        | (length << OPCODE_LENGTH_SHIFT)
        | ((precise as u32 & PRECISE_MASK) << PRECISE_SHIFT);
    if saturate {
        token |= SATURATE_BIT;
    }
    if test_nonzero == Some(true) {
        token |= TEST_NONZERO_BIT;
    }
    if extended {
        token |= OPCODE_EXTENDED_BIT;
    }
    token
}

/// Longest instruction length expressible in the embedded field.
pub const MAX_EMBEDDED_LENGTH: u32 = OPCODE_LENGTH_MASK;

// ---- Custom-data blocks ----
//
// Custom-data blocks do not use the embedded length field: the class lives in
// bits 11..=31 of the opening token and the total dword length (including both
// header words) follows as a whole second token.

/// Custom-data class field.
pub fn customdata_class(token: u32) -> u32 {
    token >> 11
}

/// Builds a custom-data opening token.
pub fn make_customdata(opcode: u32, class: u32) -> u32 {
    (opcode & OPCODE_MASK) | (class << 11)
}

// ---- Extended opcode tokens ----

const EXTENDED_TYPE_MASK: u32 = 0x3f;

/// Extended opcode token kinds.
pub const EXTENDED_OPCODE_EMPTY: u32 = 0;
/// Texel-offset immediate (`aoffimmi`).
pub const EXTENDED_OPCODE_SAMPLE_CONTROLS: u32 = 1;
/// Resource dimension annotation.
pub const EXTENDED_OPCODE_RESOURCE_DIM: u32 = 2;
/// Resource return-type annotation.
pub const EXTENDED_OPCODE_RESOURCE_RETURN_TYPE: u32 = 3;

/// Type tag of an extended opcode token.
pub fn extended_opcode_type(token: u32) -> u32 {
    token & EXTENDED_TYPE_MASK
}

/// Whether another extended opcode token follows.
pub fn extended_opcode_continues(token: u32) -> bool {
    (token & OPCODE_EXTENDED_BIT) != 0
}

fn sign_extend_4(v: u32) -> i8 {
    ((v as i8) << 4) >> 4
}

/// Texel offsets from a sample-controls token: `(u, v, w)`, each signed 4-bit.
pub fn sample_controls_offsets(token: u32) -> [i8; 3] {
    [
        sign_extend_4((token >> 9) & 0xf),
        sign_extend_4((token >> 13) & 0xf),
        sign_extend_4((token >> 17) & 0xf),
    ]
}

/// Builds a sample-controls (texel offset) extended opcode token.
pub fn make_sample_controls(offsets: [i8; 3], continues: bool) -> u32 {
    let mut token = EXTENDED_OPCODE_SAMPLE_CONTROLS
        | (((offsets[0] as u32) & 0xf) << 9)
        | (((offsets[1] as u32) & 0xf) << 13)
        | (((offsets[2] as u32) & 0xf) << 17);
    if continues {
        token |= OPCODE_EXTENDED_BIT;
    }
    token
}

/// Resource dimension from a resource-dim token.
pub fn resource_dim(token: u32) -> u32 {
    (token >> 6) & 0x1f
}

/// Structure stride from a resource-dim token (structured buffers only).
pub fn resource_dim_stride(token: u32) -> u32 {
    (token >> 11) & 0xfff
}

/// Builds a resource-dim extended opcode token.
pub fn make_resource_dim(dim: u32, stride: u32, continues: bool) -> u32 {
    let mut token =
        EXTENDED_OPCODE_RESOURCE_DIM | ((dim & 0x1f) << 6) | ((stride & 0xfff) << 11);
    if continues {
        token |= OPCODE_EXTENDED_BIT;
    }
    token
}

/// The four return-type nibbles from a resource-return-type token.
pub fn resource_return_types(token: u32) -> [u32; 4] {
    [
        (token >> 6) & 0xf,
        (token >> 10) & 0xf,
        (token >> 14) & 0xf,
        (token >> 18) & 0xf,
    ]
}

/// The four return-type nibbles of a declaration's return-type word
/// (`dcl_resource` / `dcl_uav_typed`); unlike the extended opcode token
/// these start at bit zero.
pub fn decl_return_types(token: u32) -> [u32; 4] {
    [
        token & 0xf,
        (token >> 4) & 0xf,
        (token >> 8) & 0xf,
        (token >> 12) & 0xf,
    ]
}

/// Builds a declaration return-type word.
pub fn make_decl_return_types(types: [u32; 4]) -> u32 {
    (types[0] & 0xf) | ((types[1] & 0xf) << 4) | ((types[2] & 0xf) << 8) | ((types[3] & 0xf) << 12)
}

/// Builds a resource-return-type extended opcode token.
pub fn make_resource_return_types(types: [u32; 4], continues: bool) -> u32 {
    let mut token = EXTENDED_OPCODE_RESOURCE_RETURN_TYPE
        | ((types[0] & 0xf) << 6)
        | ((types[1] & 0xf) << 10)
        | ((types[2] & 0xf) << 14)
        | ((types[3] & 0xf) << 18);
    if continues {
        token |= OPCODE_EXTENDED_BIT;
    }
    token
}

// ---- Opcode controls sub-fields ----
//
// The controls field is opcode specific; these accessors name the layouts the
// specialized readers/writers interpret. They operate on the shifted-down
// controls value returned by [`opcode_controls`], not the raw opcode token.

/// Resource type of a `dcl_resource`/`dcl_uav_typed` opcode token (bits 11..=15).
pub fn controls_resource_type(controls: u32) -> u32 {
    controls & 0x1f
}

/// Multisample count of a resource declaration (bits 16..=22).
pub fn controls_sample_count(controls: u32) -> u32 {
    (controls >> 5) & 0x7f
}

/// Builds the controls field for a resource declaration.
pub fn make_resource_controls(resource_type: u32, sample_count: u32) -> u32 {
    (resource_type & 0x1f) | ((sample_count & 0x7f) << 5)
}

/// Interpolation mode of a `dcl_input_ps` opcode token (bits 11..=14).
pub fn controls_interpolation_mode(controls: u32) -> u32 {
    controls & 0xf
}

/// Sampler mode of a `dcl_sampler` opcode token (bits 11..=14).
pub fn controls_sampler_mode(controls: u32) -> u32 {
    controls & 0xf
}

/// Primitive/topology/tessellator enum field shared by several declarations
/// (bits 11..=16).
pub fn controls_enum6(controls: u32) -> u32 {
    controls & 0x3f
}

/// Builds a 6-bit enum controls field.
pub fn make_enum6_controls(value: u32) -> u32 {
    value & 0x3f
}

/// Control-point count of `dcl_input/output_control_point_count` (bits 11..=16).
pub fn controls_control_point_count(controls: u32) -> u32 {
    controls & 0x3f
}

// ---- Operand token ----

const OPERAND_COMPONENT_COUNT_MASK: u32 = 0x3;
const OPERAND_SELECTION_MODE_SHIFT: u32 = 2;
const OPERAND_SELECTION_MODE_MASK: u32 = 0x3;
const OPERAND_MASK_SHIFT: u32 = 4;
const OPERAND_MASK_MASK: u32 = 0xf;
const OPERAND_SWIZZLE_SHIFT: u32 = 4;
const OPERAND_SWIZZLE_MASK: u32 = 0xff;
const OPERAND_SELECT1_SHIFT: u32 = 4;
const OPERAND_SELECT1_MASK: u32 = 0x3;
const OPERAND_TYPE_SHIFT: u32 = 12;
const OPERAND_TYPE_MASK: u32 = 0xff;
const OPERAND_INDEX_DIMENSION_SHIFT: u32 = 20;
const OPERAND_INDEX_DIMENSION_MASK: u32 = 0x3;
const OPERAND_INDEX_REP_SHIFTS: [u32; 3] = [22, 25, 28];
const OPERAND_INDEX_REP_MASK: u32 = 0x7;
const OPERAND_EXTENDED_BIT: u32 = 0x8000_0000;

/// Component-count field values.
pub const COMPONENTS_0: u32 = 0;
/// One component.
pub const COMPONENTS_1: u32 = 1;
/// Four components.
pub const COMPONENTS_4: u32 = 2;

/// Selection modes for four-component operands.
pub const SELECTION_MASK: u32 = 0;
/// Full four-component swizzle.
pub const SELECTION_SWIZZLE: u32 = 1;
/// Replicated scalar component.
pub const SELECTION_SELECT1: u32 = 2;

/// Index representations.
pub const INDEX_REP_IMMEDIATE32: u32 = 0;
/// 64-bit immediate index (unsupported in practice).
pub const INDEX_REP_IMMEDIATE64: u32 = 1;
/// Relative-addressing sub-operand, no literal offset.
pub const INDEX_REP_RELATIVE: u32 = 2;
/// Literal offset plus a relative-addressing sub-operand.
pub const INDEX_REP_IMMEDIATE32_PLUS_RELATIVE: u32 = 3;
/// 64-bit literal offset plus a relative sub-operand (unsupported).
pub const INDEX_REP_IMMEDIATE64_PLUS_RELATIVE: u32 = 4;

/// Component-count field (0, 1 or 4 components).
pub fn operand_component_count(token: u32) -> u32 {
    token & OPERAND_COMPONENT_COUNT_MASK
}

/// Selection mode for four-component operands.
pub fn operand_selection_mode(token: u32) -> u32 {
    (token >> OPERAND_SELECTION_MODE_SHIFT) & OPERAND_SELECTION_MODE_MASK
}

/// Write mask (selection mode [`SELECTION_MASK`]).
pub fn operand_mask(token: u32) -> u8 {
    ((token >> OPERAND_MASK_SHIFT) & OPERAND_MASK_MASK) as u8
}

/// Packed 8-bit swizzle (selection mode [`SELECTION_SWIZZLE`]).
pub fn operand_swizzle(token: u32) -> u8 {
    ((token >> OPERAND_SWIZZLE_SHIFT) & OPERAND_SWIZZLE_MASK) as u8
}

/// Scalar component selector (selection mode [`SELECTION_SELECT1`]).
pub fn operand_select1(token: u32) -> u8 {
    ((token >> OPERAND_SELECT1_SHIFT) & OPERAND_SELECT1_MASK) as u8
}

/// Wire register-type code.
pub fn operand_register_type(token: u32) -> u32 {
    (token >> OPERAND_TYPE_SHIFT) & OPERAND_TYPE_MASK
}

/// Index dimension (number of index slots, 0..=3).
pub fn operand_index_dimension(token: u32) -> u32 {
    (token >> OPERAND_INDEX_DIMENSION_SHIFT) & OPERAND_INDEX_DIMENSION_MASK
}

/// Index representation of slot `slot` (0..=2).
pub fn operand_index_rep(token: u32, slot: usize) -> u32 {
    (token >> OPERAND_INDEX_REP_SHIFTS[slot]) & OPERAND_INDEX_REP_MASK
}

/// Whether an extended operand token follows.
pub fn operand_is_extended(token: u32) -> bool {
    (token & OPERAND_EXTENDED_BIT) != 0
}

/// Piecewise builder for operand tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperandToken {
    raw: u32,
}

impl OperandToken {
    /// Starts from an all-zero token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the component-count field.
    pub fn components(mut self, count: u32) -> Self {
        self.raw |= count & OPERAND_COMPONENT_COUNT_MASK;
        self
    }

    /// Sets the selection mode.
    pub fn selection_mode(mut self, mode: u32) -> Self {
        self.raw |= (mode & OPERAND_SELECTION_MODE_MASK) << OPERAND_SELECTION_MODE_SHIFT;
        self
    }

    /// Sets the write-mask field.
    pub fn mask(mut self, mask: u8) -> Self {
        self.raw |= ((mask as u32) & OPERAND_MASK_MASK) << OPERAND_MASK_SHIFT;
        self
    }

    /// Sets the packed swizzle field.
    pub fn swizzle(mut self, swizzle: u8) -> Self {
        self.raw |= ((swizzle as u32) & OPERAND_SWIZZLE_MASK) << OPERAND_SWIZZLE_SHIFT;
        self
    }

    /// Sets the scalar component selector.
    pub fn select1(mut self, component: u8) -> Self {
        self.raw |= ((component as u32) & OPERAND_SELECT1_MASK) << OPERAND_SELECT1_SHIFT;
        self
    }

    /// Sets the wire register-type code.
    pub fn register_type(mut self, ty: u32) -> Self {
        self.raw |= (ty & OPERAND_TYPE_MASK) << OPERAND_TYPE_SHIFT;
        self
    }

    /// Sets the index dimension.
    pub fn index_dimension(mut self, dim: u32) -> Self {
        self.raw |= (dim & OPERAND_INDEX_DIMENSION_MASK) << OPERAND_INDEX_DIMENSION_SHIFT;
        self
    }

    /// Sets the index representation for slot `slot`.
    pub fn index_rep(mut self, slot: usize, rep: u32) -> Self {
        self.raw |= (rep & OPERAND_INDEX_REP_MASK) << OPERAND_INDEX_REP_SHIFTS[slot];
        self
    }

    /// Marks an extended operand token as following.
    pub fn extended(mut self) -> Self {
        self.raw |= OPERAND_EXTENDED_BIT;
        self
    }

    /// Finishes the token.
    pub fn build(self) -> u32 {
        self.raw
    }
}

// ---- Extended operand token ----

/// Extended operand token kinds.
pub const EXTENDED_OPERAND_EMPTY: u32 = 0;
/// Source modifier + precision/non-uniform hints.
pub const EXTENDED_OPERAND_MODIFIER: u32 = 1;

const EXTENDED_OPERAND_MODIFIER_SHIFT: u32 = 6;
const EXTENDED_OPERAND_MODIFIER_MASK: u32 = 0xff;
const EXTENDED_OPERAND_PRECISION_SHIFT: u32 = 14;
const EXTENDED_OPERAND_PRECISION_MASK: u32 = 0x7;
const EXTENDED_OPERAND_NON_UNIFORM_BIT: u32 = 1 << 17;

/// Type tag of an extended operand token.
pub fn extended_operand_type(token: u32) -> u32 {
    token & EXTENDED_TYPE_MASK
}

/// Whether another extended operand token follows.
pub fn extended_operand_continues(token: u32) -> bool {
    (token & OPERAND_EXTENDED_BIT) != 0
}

/// Register modifier field (none/neg/abs/absneg).
pub fn extended_operand_modifier(token: u32) -> u32 {
    (token >> EXTENDED_OPERAND_MODIFIER_SHIFT) & EXTENDED_OPERAND_MODIFIER_MASK
}

/// Minimum-precision hint field.
pub fn extended_operand_precision(token: u32) -> u32 {
    (token >> EXTENDED_OPERAND_PRECISION_SHIFT) & EXTENDED_OPERAND_PRECISION_MASK
}

/// Non-uniform marker.
pub fn extended_operand_non_uniform(token: u32) -> bool {
    (token & EXTENDED_OPERAND_NON_UNIFORM_BIT) != 0
}

/// Builds an extended operand modifier token.
pub fn make_extended_operand(modifier: u32, precision: u32, non_uniform: bool) -> u32 {
    let mut token = EXTENDED_OPERAND_MODIFIER
        | ((modifier & EXTENDED_OPERAND_MODIFIER_MASK) << EXTENDED_OPERAND_MODIFIER_SHIFT)
        | ((precision & EXTENDED_OPERAND_PRECISION_MASK) << EXTENDED_OPERAND_PRECISION_SHIFT);
    if non_uniform {
        token |= EXTENDED_OPERAND_NON_UNIFORM_BIT;
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_token_fields_round_trip() {
        let token = make_opcode(0x36, 0, 5, true, Some(true), 0b0011, false);
        assert_eq!(opcode_id(token), 0x36);
        assert_eq!(opcode_length(token), 5);
        assert!(opcode_saturate(token));
        assert!(opcode_test_nonzero(token));
        assert_eq!(opcode_precise(token), 0b0011);
        assert_eq!(opcode_controls(token), 0);
        assert!(!opcode_is_extended(token));
    }

    #[test]
    fn controls_strip_shared_bits() {
        // The saturate/test/precise bits must not leak into the generic
        // controls field or the encoder would double-apply them.
        let token = make_opcode(0x00, 0x3, 1, true, Some(true), 0xf, false);
        assert_eq!(opcode_controls(token), 0x3);
    }

    #[test]
    fn texel_offsets_sign_extend() {
        let token = make_sample_controls([-8, 7, -1], false);
        assert_eq!(extended_opcode_type(token), EXTENDED_OPCODE_SAMPLE_CONTROLS);
        assert_eq!(sample_controls_offsets(token), [-8, 7, -1]);
        assert!(!extended_opcode_continues(token));
    }

    #[test]
    fn operand_token_round_trip() {
        let token = OperandToken::new()
            .components(COMPONENTS_4)
            .selection_mode(SELECTION_SWIZZLE)
            .swizzle(0b11_10_01_00)
            .register_type(0x07)
            .index_dimension(2)
            .index_rep(0, INDEX_REP_IMMEDIATE32)
            .index_rep(1, INDEX_REP_RELATIVE)
            .build();
        assert_eq!(operand_component_count(token), COMPONENTS_4);
        assert_eq!(operand_selection_mode(token), SELECTION_SWIZZLE);
        assert_eq!(operand_swizzle(token), 0b11_10_01_00);
        assert_eq!(operand_register_type(token), 0x07);
        assert_eq!(operand_index_dimension(token), 2);
        assert_eq!(operand_index_rep(token, 0), INDEX_REP_IMMEDIATE32);
        assert_eq!(operand_index_rep(token, 1), INDEX_REP_RELATIVE);
    }

    #[test]
    fn extended_operand_round_trip() {
        let token = make_extended_operand(3, 1, true);
        assert_eq!(extended_operand_type(token), EXTENDED_OPERAND_MODIFIER);
        assert_eq!(extended_operand_modifier(token), 3);
        assert_eq!(extended_operand_precision(token), 1);
        assert!(extended_operand_non_uniform(token));
        assert!(!extended_operand_continues(token));
    }
}
