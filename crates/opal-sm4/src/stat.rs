//! The statistics accumulator behind the `STAT` container section.
//!
//! Counters follow the FXC record layout: 29 dwords for shader model 4.x,
//! 37 for 5.x (the tail adds tessellation, barrier, atomic and store
//! counters). Updating is purely additive bookkeeping and never fails.

use crate::ir::{Declaration, Instruction, Program, Version};
use crate::op::{InterpolationMode, Opcode};

/// Running statistics for one program being encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    pub instruction_count: u32,
    /// Running maximum over `dcl_temps`, not a sum.
    pub temp_register_count: u32,
    pub dcl_count: u32,
    pub float_instruction_count: u32,
    pub int_instruction_count: u32,
    pub uint_instruction_count: u32,
    pub static_flow_control_count: u32,
    pub dynamic_flow_control_count: u32,
    pub temp_array_count: u32,
    pub array_instruction_count: u32,
    pub cut_instruction_count: u32,
    pub emit_instruction_count: u32,
    pub texture_normal_instructions: u32,
    pub texture_load_instructions: u32,
    pub texture_comp_instructions: u32,
    pub texture_bias_instructions: u32,
    pub texture_gradient_instructions: u32,
    pub mov_instruction_count: u32,
    pub movc_instruction_count: u32,
    pub conversion_instruction_count: u32,
    pub input_primitive: u32,
    pub gs_output_topology: u32,
    pub gs_max_output_vertex_count: u32,
    pub is_sample_frequency_shader: bool,
    pub gs_instance_count: u32,
    pub control_points: u32,
    pub hs_output_primitive: u32,
    pub hs_partitioning: u32,
    pub tessellator_domain: u32,
    pub barrier_instructions: u32,
    pub interlocked_instructions: u32,
    pub texture_store_instructions: u32,
}

const STAT_SIZE_SM4: usize = 29;
const STAT_SIZE_SM5: usize = 37;

impl Statistics {
    /// Empty counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulates over every instruction of a program.
    pub fn for_program(program: &Program) -> Self {
        let mut stats = Self::new();
        for ins in &program.instructions {
            stats.record(ins);
        }
        stats
    }

    /// Updates the counters for one instruction. Declarations mostly *set*
    /// their mapped counter; everything else increments (or is ignored).
    pub fn record(&mut self, ins: &Instruction) {
        use Opcode::*;

        if let Some(decl) = &ins.decl {
            match ins.opcode {
                CustomData => {}
                _ => self.dcl_count += 1,
            }
            match decl {
                Declaration::Temps(n) => {
                    self.temp_register_count = self.temp_register_count.max(*n);
                }
                Declaration::IndexableTemp { count, .. } => {
                    self.temp_array_count += count;
                }
                Declaration::GsInputPrimitive(p) => self.input_primitive = p.wire(),
                Declaration::GsOutputTopology(t) => self.gs_output_topology = t.wire(),
                Declaration::VerticesOut(n) => self.gs_max_output_vertex_count = *n,
                Declaration::GsInstanceCount(n) => self.gs_instance_count = *n,
                Declaration::InputControlPointCount(n)
                | Declaration::OutputControlPointCount(n) => self.control_points = *n,
                Declaration::TessDomain(d) => self.tessellator_domain = d.wire(),
                Declaration::TessPartitioning(p) => self.hs_partitioning = p.wire(),
                Declaration::TessOutputPrimitive(p) => self.hs_output_primitive = p.wire(),
                Declaration::InputPs { interpolation, .. }
                | Declaration::InputPsSiv { interpolation, .. } => {
                    if matches!(
                        interpolation,
                        InterpolationMode::LinearSample
                            | InterpolationMode::LinearNoPerspectiveSample
                    ) {
                        self.is_sample_frequency_shader = true;
                    }
                }
                _ => {}
            }
            return;
        }

        // `fcall` sits in the declaration opcode space but executes; the
        // hull-shader phase markers do not and count as nothing.
        if ins.opcode.is_declaration() && ins.opcode != InterfaceCall {
            return;
        }
        self.instruction_count += 1;

        match ins.opcode {
            Add | Div | Dp2 | Dp3 | Dp4 | Exp | Frc | Log | Mad | Min | Max | Mul | RoundNe
            | RoundNi | RoundPi | RoundZ | Rsq | Sqrt | Rcp | SinCos | Eq | Ge | Lt | Ne
            | DerivRtx | DerivRty | DerivRtxCoarse | DerivRtxFine | DerivRtyCoarse
            | DerivRtyFine | DAdd | DMax | DMin | DMul | DEq | DGe | DLt | DNe | DDiv | DFma
            | DRcp => self.float_instruction_count += 1,

            IAdd | IEq | IGe | ILt | IMad | IMax | IMin | IMul | INe | INeg | IShl | IShr
            | IBfe | FirstBitShi => self.int_instruction_count += 1,

            And | Or | Not | Xor | UDiv | ULt | UGe | UMul | UMad | UMax | UMin | UShr | UAddc
            | USubb | CountBits | FirstBitHi | FirstBitLo | UBfe | Bfi | BfRev | Msad => {
                self.uint_instruction_count += 1;
            }

            Loop | EndLoop | Else | EndIf | Switch | Case | Default | EndSwitch | Call | Ret
            | Label | Break | Continue => self.static_flow_control_count += 1,

            If | Breakc | Continuec | Retc | Callc | Discard => {
                self.dynamic_flow_control_count += 1;
            }

            Cut | CutStream => self.cut_instruction_count += 1,
            Emit | EmitStream => self.emit_instruction_count += 1,
            EmitThenCut | EmitThenCutStream => {
                self.cut_instruction_count += 1;
                self.emit_instruction_count += 1;
            }

            Sample | SampleL | Gather4 | Gather4Po => self.texture_normal_instructions += 1,
            Ld | LdMs => self.texture_load_instructions += 1,
            SampleC | SampleCLz | Gather4C | Gather4PoC => self.texture_comp_instructions += 1,
            SampleB => self.texture_bias_instructions += 1,
            SampleD => self.texture_gradient_instructions += 1,

            Mov | DMov => self.mov_instruction_count += 1,
            Movc | Swapc | DMovc => self.movc_instruction_count += 1,

            Ftoi | Ftou | Itof | Utof | F32ToF16 | F16ToF32 | DtoF | FtoD | DtoI | DtoU | ItoD
            | UtoD => self.conversion_instruction_count += 1,

            Sync => self.barrier_instructions += 1,

            AtomicAnd | AtomicOr | AtomicXor | AtomicCmpStore | AtomicIAdd | AtomicIMax
            | AtomicIMin | AtomicUMax | AtomicUMin | ImmAtomicAlloc | ImmAtomicConsume
            | ImmAtomicIAdd | ImmAtomicAnd | ImmAtomicOr | ImmAtomicXor | ImmAtomicExch
            | ImmAtomicCmpExch | ImmAtomicIMax | ImmAtomicIMin | ImmAtomicUMax
            | ImmAtomicUMin => self.interlocked_instructions += 1,

            StoreUavTyped | StoreRaw | StoreStructured => self.texture_store_instructions += 1,

            _ => {}
        }

        // Any relative addressing counts as an array access.
        let indexes_dynamically = ins
            .srcs
            .iter()
            .any(|s| s.reg.indices.iter().any(|i| i.relative.is_some()))
            || ins
                .dsts
                .iter()
                .any(|d| d.reg.indices.iter().any(|i| i.relative.is_some()));
        if indexes_dynamically {
            self.array_instruction_count += 1;
        }
    }

    /// Serializes into the fixed `STAT` record for the target version.
    pub fn to_dwords(&self, version: Version) -> Vec<u32> {
        let sm5 = version.at_least(5, 0);
        let mut out = vec![0u32; if sm5 { STAT_SIZE_SM5 } else { STAT_SIZE_SM4 }];
        out[0] = self.instruction_count;
        out[1] = self.temp_register_count;
        // out[2] is DefCount, always zero for SM4+.
        out[3] = self.dcl_count;
        out[4] = self.float_instruction_count;
        out[5] = self.int_instruction_count;
        out[6] = self.uint_instruction_count;
        out[7] = self.static_flow_control_count;
        out[8] = self.dynamic_flow_control_count;
        // out[9] is MacroInstructionCount, always zero for SM4+.
        out[10] = self.temp_array_count;
        out[11] = self.array_instruction_count;
        out[12] = self.cut_instruction_count;
        out[13] = self.emit_instruction_count;
        out[14] = self.texture_normal_instructions;
        out[15] = self.texture_load_instructions;
        out[16] = self.texture_comp_instructions;
        out[17] = self.texture_bias_instructions;
        out[18] = self.texture_gradient_instructions;
        out[19] = self.mov_instruction_count;
        out[20] = self.movc_instruction_count;
        out[21] = self.conversion_instruction_count;
        out[23] = self.input_primitive;
        out[24] = self.gs_output_topology;
        out[25] = self.gs_max_output_vertex_count;
        out[28] = self.is_sample_frequency_shader as u32;
        if sm5 {
            out[29] = self.gs_instance_count;
            out[30] = self.control_points;
            out[31] = self.hs_output_primitive;
            out[32] = self.hs_partitioning;
            out[33] = self.tessellator_domain;
            out[34] = self.barrier_instructions;
            out[35] = self.interlocked_instructions;
            out[36] = self.texture_store_instructions;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ShaderStage;

    fn version(major: u8) -> Version {
        Version { stage: ShaderStage::Pixel, major, minor: 0 }
    }

    #[test]
    fn record_width_depends_on_shader_model() {
        let stats = Statistics::new();
        assert_eq!(stats.to_dwords(version(4)).len(), 29);
        assert_eq!(stats.to_dwords(version(5)).len(), 37);
    }

    #[test]
    fn temp_count_is_a_running_maximum() {
        let mut stats = Statistics::new();
        for n in [4u32, 12, 7] {
            let ins =
                Instruction::declaration(Opcode::DclTemps, Declaration::Temps(n));
            stats.record(&ins);
        }
        assert_eq!(stats.temp_register_count, 12);
        assert_eq!(stats.dcl_count, 3);
    }

    #[test]
    fn category_counters() {
        let mut stats = Statistics::new();
        for op in [
            Opcode::Add,
            Opcode::Mul,
            Opcode::IAdd,
            Opcode::And,
            Opcode::Mov,
            Opcode::Movc,
            Opcode::Ftoi,
            Opcode::Sample,
            Opcode::SampleB,
            Opcode::Ld,
            Opcode::Sync,
            Opcode::AtomicIAdd,
            Opcode::StoreRaw,
            Opcode::EmitThenCut,
        ] {
            stats.record(&Instruction::new(op));
        }
        assert_eq!(stats.instruction_count, 14);
        assert_eq!(stats.float_instruction_count, 2);
        assert_eq!(stats.int_instruction_count, 1);
        assert_eq!(stats.uint_instruction_count, 1);
        assert_eq!(stats.mov_instruction_count, 1);
        assert_eq!(stats.movc_instruction_count, 1);
        assert_eq!(stats.conversion_instruction_count, 1);
        assert_eq!(stats.texture_normal_instructions, 1);
        assert_eq!(stats.texture_bias_instructions, 1);
        assert_eq!(stats.texture_load_instructions, 1);
        assert_eq!(stats.barrier_instructions, 1);
        assert_eq!(stats.interlocked_instructions, 1);
        assert_eq!(stats.texture_store_instructions, 1);
        assert_eq!(stats.emit_instruction_count, 1);
        assert_eq!(stats.cut_instruction_count, 1);
    }

    #[test]
    fn accumulation_is_deterministic() {
        let instructions = vec![
            Instruction::declaration(Opcode::DclTemps, Declaration::Temps(3)),
            Instruction::new(Opcode::Mov),
            Instruction::new(Opcode::Ret),
        ];
        let mut a = Statistics::new();
        let mut b = Statistics::new();
        for ins in &instructions {
            a.record(ins);
        }
        for ins in &instructions {
            b.record(ins);
        }
        assert_eq!(a, b);
        assert_eq!(
            a.to_dwords(version(5)),
            b.to_dwords(version(5))
        );
    }
}
