//! Whole-program validation run once token decoding finishes. Any failure
//! here discards the program; the caller never sees a partially valid one.

use crate::decode::{DecodeError, DecodeErrorKind, DecodeSummary};
use crate::ir::{Program, ShaderStage, Signature, WriteMask};
use crate::limits::MAX_SIGNATURE_REGISTER_COUNT;
use crate::Diagnostics;

pub(crate) fn validate_program(
    program: &mut Program,
    summary: &DecodeSummary,
    diags: &mut Diagnostics,
) -> Result<(), DecodeError> {
    // The wire format stores the output-side "used" masks inverted.
    uninvert_used_masks(&mut program.output_signature);
    if program.version.stage == ShaderStage::Hull {
        uninvert_used_masks(&mut program.patch_constant_signature);
    }

    for signature in [
        &program.input_signature,
        &program.output_signature,
        &program.patch_constant_signature,
    ] {
        check_signature(signature, diags)?;
    }

    for ranges in [
        &summary.input_ranges,
        &summary.output_ranges,
        &summary.patch_constant_ranges,
    ] {
        for range in ranges.iter() {
            let end = range.first.saturating_add(range.count);
            if end > MAX_SIGNATURE_REGISTER_COUNT {
                return Err(DecodeError {
                    at_dword: 0,
                    kind: DecodeErrorKind::SignatureRegisterOutOfRange {
                        register: end - 1,
                        max: MAX_SIGNATURE_REGISTER_COUNT,
                    },
                });
            }
        }
    }

    // A hull shader with no explicit control-point phase passes its inputs
    // through unchanged, which is only well defined when the input and
    // output index ranges agree exactly.
    if program.version.stage == ShaderStage::Hull && !summary.explicit_control_point_phase {
        let mut inputs = summary.input_ranges.clone();
        let mut outputs = summary.output_ranges.clone();
        inputs.sort_unstable();
        outputs.sort_unstable();
        if inputs != outputs {
            return Err(DecodeError {
                at_dword: 0,
                kind: DecodeErrorKind::HullIndexRangeMismatch,
            });
        }
    }

    Ok(())
}

fn uninvert_used_masks(signature: &mut Signature) {
    for element in &mut signature.elements {
        element.used_mask = WriteMask(element.mask.0 ^ element.used_mask.0);
    }
}

fn check_signature(signature: &Signature, diags: &mut Diagnostics) -> Result<(), DecodeError> {
    for element in &signature.elements {
        if element.register != crate::ir::SignatureElement::UNREGISTERED
            && element.register >= MAX_SIGNATURE_REGISTER_COUNT
        {
            return Err(DecodeError {
                at_dword: 0,
                kind: DecodeErrorKind::SignatureRegisterOutOfRange {
                    register: element.register,
                    max: MAX_SIGNATURE_REGISTER_COUNT,
                },
            });
        }
        if !element.mask.is_contiguous() {
            diags.warn(
                0,
                format!(
                    "signature element {}{} has non-contiguous mask {:#06b}",
                    element.name, element.semantic_index, element.mask.0
                ),
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::IndexRangeRecord;
    use crate::ir::{SignatureElement, Version};
    use crate::op::{ComponentType, MinPrecision, SysVal};

    fn element(register: u32, mask: u8, used: u8) -> SignatureElement {
        SignatureElement {
            name: "TEXCOORD".to_owned(),
            semantic_index: register,
            sysval: SysVal::NONE,
            component_type: ComponentType::Float32,
            register,
            mask: WriteMask(mask),
            used_mask: WriteMask(used),
            stream: 0,
            min_precision: MinPrecision::Default,
        }
    }

    fn summary() -> DecodeSummary {
        DecodeSummary {
            explicit_control_point_phase: false,
            input_ranges: Vec::new(),
            output_ranges: Vec::new(),
            patch_constant_ranges: Vec::new(),
        }
    }

    fn program(stage: ShaderStage) -> Program {
        Program::new(Version { stage, major: 5, minor: 0 })
    }

    #[test]
    fn output_used_masks_are_uninverted() {
        let mut p = program(ShaderStage::Pixel);
        // Wire form: mask xyzw, stored used-mask says "zw unused".
        p.output_signature.elements.push(element(0, 0b1111, 0b1100));
        p.input_signature.elements.push(element(0, 0b1111, 0b0011));
        validate_program(&mut p, &summary(), &mut Diagnostics::new()).unwrap();
        assert_eq!(p.output_signature.elements[0].used_mask, WriteMask(0b0011));
        // Input signatures are not inverted.
        assert_eq!(p.input_signature.elements[0].used_mask, WriteMask(0b0011));
    }

    #[test]
    fn patch_constant_inversion_is_hull_only() {
        let mut p = program(ShaderStage::Domain);
        p.patch_constant_signature.elements.push(element(0, 0b1111, 0b0011));
        validate_program(&mut p, &summary(), &mut Diagnostics::new()).unwrap();
        assert_eq!(
            p.patch_constant_signature.elements[0].used_mask,
            WriteMask(0b0011)
        );

        let mut p = program(ShaderStage::Hull);
        p.patch_constant_signature.elements.push(element(0, 0b1111, 0b0011));
        validate_program(&mut p, &summary(), &mut Diagnostics::new()).unwrap();
        assert_eq!(
            p.patch_constant_signature.elements[0].used_mask,
            WriteMask(0b1100)
        );
    }

    #[test]
    fn signature_register_bound_is_enforced() {
        let mut p = program(ShaderStage::Vertex);
        p.input_signature.elements.push(element(32, 0b1111, 0));
        let err = validate_program(&mut p, &summary(), &mut Diagnostics::new()).unwrap_err();
        assert_eq!(
            err.kind,
            DecodeErrorKind::SignatureRegisterOutOfRange { register: 32, max: 32 }
        );
    }

    #[test]
    fn registerless_elements_are_exempt_from_the_bound() {
        let mut p = program(ShaderStage::Pixel);
        p.output_signature
            .elements
            .push(element(SignatureElement::UNREGISTERED, 0b0001, 0));
        validate_program(&mut p, &summary(), &mut Diagnostics::new()).unwrap();
    }

    #[test]
    fn range_spanning_past_the_bound_is_enforced() {
        let mut p = program(ShaderStage::Vertex);
        let mut s = summary();
        s.input_ranges.push(IndexRangeRecord {
            first: 30,
            count: 4,
            mask: WriteMask::ALL,
        });
        let err = validate_program(&mut p, &s, &mut Diagnostics::new()).unwrap_err();
        assert!(matches!(
            err.kind,
            DecodeErrorKind::SignatureRegisterOutOfRange { .. }
        ));
    }

    #[test]
    fn non_contiguous_mask_is_a_warning_only() {
        let mut p = program(ShaderStage::Vertex);
        p.input_signature.elements.push(element(0, 0b0101, 0));
        let mut diags = Diagnostics::new();
        validate_program(&mut p, &summary(), &mut diags).unwrap();
        assert_eq!(diags.len(), 1);
        assert!(diags.iter().next().unwrap().message.contains("non-contiguous"));
    }

    #[test]
    fn hull_default_phase_requires_matching_ranges() {
        let range = IndexRangeRecord { first: 0, count: 4, mask: WriteMask::ALL };

        let mut s = summary();
        s.input_ranges.push(range);
        let mut p = program(ShaderStage::Hull);
        let err = validate_program(&mut p, &s, &mut Diagnostics::new()).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::HullIndexRangeMismatch);

        // Same ranges on both sides: fine.
        s.output_ranges.push(range);
        validate_program(&mut p, &s, &mut Diagnostics::new()).unwrap();

        // An explicit control-point phase lifts the requirement.
        let mut s = summary();
        s.input_ranges.push(range);
        s.explicit_control_point_phase = true;
        validate_program(&mut p, &s, &mut Diagnostics::new()).unwrap();
    }
}
