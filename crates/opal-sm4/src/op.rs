//! Symbolic opcode and register-type spaces plus the static lookup tables
//! bridging them to the wire format.
//!
//! Wire ids follow the D3D10/D3D11 tokenized shader format opcode table
//! (`d3d10tokenizedprogramformat.h` / `d3d11tokenizedprogramformat.h`).
//! The tables are built once on first use and are immutable afterwards, so
//! lookups are safe to share across threads.

use std::sync::OnceLock;

/// Expected data type of one operand slot.
///
/// The decoder threads these through operand reads and flags 64-bit
/// immediates that land in slots expecting 32-bit data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// 32-bit float.
    Float,
    /// Signed 32-bit integer.
    Int,
    /// Unsigned 32-bit integer.
    Uint,
    /// 64-bit double (register pairs).
    Double,
    /// Shader resource view reference.
    Resource,
    /// Sampler reference.
    Sampler,
    /// Unordered access view (or thread-group shared memory) reference.
    Uav,
    /// Untyped operand (labels, stream registers, function pointers).
    Opaque,
}

/// How the instruction decoder consumes the token span after the opcode
/// token. `Normal` reads the operand lists declared in the opcode table;
/// every other variant is a bespoke declaration/control reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadKind {
    Normal,
    CustomData,
    DclResource,
    DclConstantBuffer,
    DclSampler,
    DclIndexRange,
    DclGsOutputTopology,
    DclGsInputPrimitive,
    DclVerticesOut,
    DclInput,
    DclInputSgv,
    DclInputSiv,
    DclInputPs,
    DclInputPsSgv,
    DclInputPsSiv,
    DclOutput,
    DclOutputSgv,
    DclOutputSiv,
    DclTemps,
    DclIndexableTemp,
    DclGlobalFlags,
    HsPhase,
    DclStream,
    DclFunctionBody,
    DclFunctionTable,
    DclInterface,
    InterfaceCall,
    DclControlPointCount,
    DclTessDomain,
    DclTessPartitioning,
    DclTessOutputPrimitive,
    DclHsMaxTessFactor,
    DclHsPhaseInstanceCount,
    DclThreadGroup,
    DclUavTyped,
    DclUavRaw,
    DclUavStructured,
    DclTgsmRaw,
    DclTgsmStructured,
    DclResourceRaw,
    DclResourceStructured,
    DclGsInstanceCount,
}

/// Static per-opcode descriptor.
#[derive(Debug)]
pub struct OpcodeInfo {
    /// Wire opcode id.
    pub wire: u32,
    /// Mnemonic.
    pub name: &'static str,
    /// Expected destination operand types, in order.
    pub dst_types: &'static [DataType],
    /// Expected source operand types, in order.
    pub src_types: &'static [DataType],
    /// Specialized reader selector.
    pub read: ReadKind,
    /// Whether the opcode token carries a zero/nonzero test bit.
    pub conditional: bool,
}

macro_rules! opcodes {
    ($( $wire:literal $variant:ident $name:literal, dst: [$($d:ident)*], src: [$($s:ident)*], $read:ident, $cond:literal; )*) => {
        /// Symbolic operation, one variant per supported wire opcode.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Opcode {
            $( $variant, )*
        }

        const OPCODE_TABLE: &[(Opcode, OpcodeInfo)] = &[
            $( (Opcode::$variant, OpcodeInfo {
                wire: $wire,
                name: $name,
                dst_types: &[$(DataType::$d),*],
                src_types: &[$(DataType::$s),*],
                read: ReadKind::$read,
                conditional: $cond,
            }), )*
        ];
    };
}

// Type tag shorthand used in the table below:
//   Float Int Uint Double Resource Sampler Uav Opaque
opcodes! {
    0x00 Add "add", dst: [Float], src: [Float Float], Normal, false;
    0x01 And "and", dst: [Uint], src: [Uint Uint], Normal, false;
    0x02 Break "break", dst: [], src: [], Normal, false;
    0x03 Breakc "breakc", dst: [], src: [Uint], Normal, true;
    0x04 Call "call", dst: [], src: [Opaque], Normal, false;
    0x05 Callc "callc", dst: [], src: [Uint Opaque], Normal, true;
    0x06 Case "case", dst: [], src: [Uint], Normal, false;
    0x07 Continue "continue", dst: [], src: [], Normal, false;
    0x08 Continuec "continuec", dst: [], src: [Uint], Normal, true;
    0x09 Cut "cut", dst: [], src: [], Normal, false;
    0x0a Default "default", dst: [], src: [], Normal, false;
    0x0b DerivRtx "deriv_rtx", dst: [Float], src: [Float], Normal, false;
    0x0c DerivRty "deriv_rty", dst: [Float], src: [Float], Normal, false;
    0x0d Discard "discard", dst: [], src: [Uint], Normal, true;
    0x0e Div "div", dst: [Float], src: [Float Float], Normal, false;
    0x0f Dp2 "dp2", dst: [Float], src: [Float Float], Normal, false;
    0x10 Dp3 "dp3", dst: [Float], src: [Float Float], Normal, false;
    0x11 Dp4 "dp4", dst: [Float], src: [Float Float], Normal, false;
    0x12 Else "else", dst: [], src: [], Normal, false;
    0x13 Emit "emit", dst: [], src: [], Normal, false;
    0x14 EmitThenCut "emit_then_cut", dst: [], src: [], Normal, false;
    0x15 EndIf "endif", dst: [], src: [], Normal, false;
    0x16 EndLoop "endloop", dst: [], src: [], Normal, false;
    0x17 EndSwitch "endswitch", dst: [], src: [], Normal, false;
    0x18 Eq "eq", dst: [Uint], src: [Float Float], Normal, false;
    0x19 Exp "exp", dst: [Float], src: [Float], Normal, false;
    0x1a Frc "frc", dst: [Float], src: [Float], Normal, false;
    0x1b Ftoi "ftoi", dst: [Int], src: [Float], Normal, false;
    0x1c Ftou "ftou", dst: [Uint], src: [Float], Normal, false;
    0x1d Ge "ge", dst: [Uint], src: [Float Float], Normal, false;
    0x1e IAdd "iadd", dst: [Int], src: [Int Int], Normal, false;
    0x1f If "if", dst: [], src: [Uint], Normal, true;
    0x20 IEq "ieq", dst: [Uint], src: [Int Int], Normal, false;
    0x21 IGe "ige", dst: [Uint], src: [Int Int], Normal, false;
    0x22 ILt "ilt", dst: [Uint], src: [Int Int], Normal, false;
    0x23 IMad "imad", dst: [Int], src: [Int Int Int], Normal, false;
    0x24 IMax "imax", dst: [Int], src: [Int Int], Normal, false;
    0x25 IMin "imin", dst: [Int], src: [Int Int], Normal, false;
    0x26 IMul "imul", dst: [Int Int], src: [Int Int], Normal, false;
    0x27 INe "ine", dst: [Uint], src: [Int Int], Normal, false;
    0x28 INeg "ineg", dst: [Int], src: [Int], Normal, false;
    0x29 IShl "ishl", dst: [Int], src: [Int Int], Normal, false;
    0x2a IShr "ishr", dst: [Int], src: [Int Int], Normal, false;
    0x2b Itof "itof", dst: [Float], src: [Int], Normal, false;
    0x2c Label "label", dst: [], src: [Opaque], Normal, false;
    0x2d Ld "ld", dst: [Float], src: [Int Resource], Normal, false;
    0x2e LdMs "ld_ms", dst: [Float], src: [Int Resource Int], Normal, false;
    0x2f Log "log", dst: [Float], src: [Float], Normal, false;
    0x30 Loop "loop", dst: [], src: [], Normal, false;
    0x31 Lt "lt", dst: [Uint], src: [Float Float], Normal, false;
    0x32 Mad "mad", dst: [Float], src: [Float Float Float], Normal, false;
    0x33 Min "min", dst: [Float], src: [Float Float], Normal, false;
    0x34 Max "max", dst: [Float], src: [Float Float], Normal, false;
    0x35 CustomData "customdata", dst: [], src: [], CustomData, false;
    0x36 Mov "mov", dst: [Float], src: [Float], Normal, false;
    0x37 Movc "movc", dst: [Float], src: [Uint Float Float], Normal, false;
    0x38 Mul "mul", dst: [Float], src: [Float Float], Normal, false;
    0x39 Ne "ne", dst: [Uint], src: [Float Float], Normal, false;
    0x3a Nop "nop", dst: [], src: [], Normal, false;
    0x3b Not "not", dst: [Uint], src: [Uint], Normal, false;
    0x3c Or "or", dst: [Uint], src: [Uint Uint], Normal, false;
    0x3d ResInfo "resinfo", dst: [Float], src: [Int Resource], Normal, false;
    0x3e Ret "ret", dst: [], src: [], Normal, false;
    0x3f Retc "retc", dst: [], src: [Uint], Normal, true;
    0x40 RoundNe "round_ne", dst: [Float], src: [Float], Normal, false;
    0x41 RoundNi "round_ni", dst: [Float], src: [Float], Normal, false;
    0x42 RoundPi "round_pi", dst: [Float], src: [Float], Normal, false;
    0x43 RoundZ "round_z", dst: [Float], src: [Float], Normal, false;
    0x44 Rsq "rsq", dst: [Float], src: [Float], Normal, false;
    0x45 Sample "sample", dst: [Float], src: [Float Resource Sampler], Normal, false;
    0x46 SampleC "sample_c", dst: [Float], src: [Float Resource Sampler Float], Normal, false;
    0x47 SampleCLz "sample_c_lz", dst: [Float], src: [Float Resource Sampler Float], Normal, false;
    0x48 SampleL "sample_l", dst: [Float], src: [Float Resource Sampler Float], Normal, false;
    0x49 SampleD "sample_d", dst: [Float], src: [Float Resource Sampler Float Float], Normal, false;
    0x4a SampleB "sample_b", dst: [Float], src: [Float Resource Sampler Float], Normal, false;
    0x4b Sqrt "sqrt", dst: [Float], src: [Float], Normal, false;
    0x4c Switch "switch", dst: [], src: [Int], Normal, false;
    0x4d SinCos "sincos", dst: [Float Float], src: [Float], Normal, false;
    0x4e UDiv "udiv", dst: [Uint Uint], src: [Uint Uint], Normal, false;
    0x4f ULt "ult", dst: [Uint], src: [Uint Uint], Normal, false;
    0x50 UGe "uge", dst: [Uint], src: [Uint Uint], Normal, false;
    0x51 UMul "umul", dst: [Uint Uint], src: [Uint Uint], Normal, false;
    0x52 UMad "umad", dst: [Uint], src: [Uint Uint Uint], Normal, false;
    0x53 UMax "umax", dst: [Uint], src: [Uint Uint], Normal, false;
    0x54 UMin "umin", dst: [Uint], src: [Uint Uint], Normal, false;
    0x55 UShr "ushr", dst: [Uint], src: [Uint Uint], Normal, false;
    0x56 Utof "utof", dst: [Float], src: [Uint], Normal, false;
    0x57 Xor "xor", dst: [Uint], src: [Uint Uint], Normal, false;
    0x58 DclResource "dcl_resource", dst: [], src: [], DclResource, false;
    0x59 DclConstantBuffer "dcl_constantbuffer", dst: [], src: [], DclConstantBuffer, false;
    0x5a DclSampler "dcl_sampler", dst: [], src: [], DclSampler, false;
    0x5b DclIndexRange "dcl_indexrange", dst: [], src: [], DclIndexRange, false;
    0x5c DclGsOutputTopology "dcl_outputtopology", dst: [], src: [], DclGsOutputTopology, false;
    0x5d DclGsInputPrimitive "dcl_inputprimitive", dst: [], src: [], DclGsInputPrimitive, false;
    0x5e DclVerticesOut "dcl_maxout", dst: [], src: [], DclVerticesOut, false;
    0x5f DclInput "dcl_input", dst: [], src: [], DclInput, false;
    0x60 DclInputSgv "dcl_input_sgv", dst: [], src: [], DclInputSgv, false;
    0x61 DclInputSiv "dcl_input_siv", dst: [], src: [], DclInputSiv, false;
    0x62 DclInputPs "dcl_input_ps", dst: [], src: [], DclInputPs, false;
    0x63 DclInputPsSgv "dcl_input_ps_sgv", dst: [], src: [], DclInputPsSgv, false;
    0x64 DclInputPsSiv "dcl_input_ps_siv", dst: [], src: [], DclInputPsSiv, false;
    0x65 DclOutput "dcl_output", dst: [], src: [], DclOutput, false;
    0x66 DclOutputSgv "dcl_output_sgv", dst: [], src: [], DclOutputSgv, false;
    0x67 DclOutputSiv "dcl_output_siv", dst: [], src: [], DclOutputSiv, false;
    0x68 DclTemps "dcl_temps", dst: [], src: [], DclTemps, false;
    0x69 DclIndexableTemp "dcl_indexableTemp", dst: [], src: [], DclIndexableTemp, false;
    0x6a DclGlobalFlags "dcl_globalFlags", dst: [], src: [], DclGlobalFlags, false;
    0x6c Lod "lod", dst: [Float], src: [Float Resource Sampler], Normal, false;
    0x6d Gather4 "gather4", dst: [Float], src: [Float Resource Sampler], Normal, false;
    0x6e SamplePos "samplepos", dst: [Float], src: [Resource Int], Normal, false;
    0x6f SampleInfo "sampleinfo", dst: [Float], src: [Resource], Normal, false;
    0x71 HsDecls "hs_decls", dst: [], src: [], HsPhase, false;
    0x72 HsControlPointPhase "hs_control_point_phase", dst: [], src: [], HsPhase, false;
    0x73 HsForkPhase "hs_fork_phase", dst: [], src: [], HsPhase, false;
    0x74 HsJoinPhase "hs_join_phase", dst: [], src: [], HsPhase, false;
    0x75 EmitStream "emit_stream", dst: [], src: [Opaque], Normal, false;
    0x76 CutStream "cut_stream", dst: [], src: [Opaque], Normal, false;
    0x77 EmitThenCutStream "emit_then_cut_stream", dst: [], src: [Opaque], Normal, false;
    0x78 InterfaceCall "fcall", dst: [], src: [Opaque], InterfaceCall, false;
    0x79 BufInfo "bufinfo", dst: [Int], src: [Resource], Normal, false;
    0x7a DerivRtxCoarse "deriv_rtx_coarse", dst: [Float], src: [Float], Normal, false;
    0x7b DerivRtxFine "deriv_rtx_fine", dst: [Float], src: [Float], Normal, false;
    0x7c DerivRtyCoarse "deriv_rty_coarse", dst: [Float], src: [Float], Normal, false;
    0x7d DerivRtyFine "deriv_rty_fine", dst: [Float], src: [Float], Normal, false;
    0x7e Gather4C "gather4_c", dst: [Float], src: [Float Resource Sampler Float], Normal, false;
    0x7f Gather4Po "gather4_po", dst: [Float], src: [Float Int Resource Sampler], Normal, false;
    0x80 Gather4PoC "gather4_po_c", dst: [Float], src: [Float Int Resource Sampler Float], Normal, false;
    0x81 Rcp "rcp", dst: [Float], src: [Float], Normal, false;
    0x82 F32ToF16 "f32tof16", dst: [Uint], src: [Float], Normal, false;
    0x83 F16ToF32 "f16tof32", dst: [Float], src: [Uint], Normal, false;
    0x84 UAddc "uaddc", dst: [Uint Uint], src: [Uint Uint], Normal, false;
    0x85 USubb "usubb", dst: [Uint Uint], src: [Uint Uint], Normal, false;
    0x86 CountBits "countbits", dst: [Uint], src: [Uint], Normal, false;
    0x87 FirstBitHi "firstbit_hi", dst: [Uint], src: [Uint], Normal, false;
    0x88 FirstBitLo "firstbit_lo", dst: [Uint], src: [Uint], Normal, false;
    0x89 FirstBitShi "firstbit_shi", dst: [Uint], src: [Int], Normal, false;
    0x8a UBfe "ubfe", dst: [Uint], src: [Uint Uint Uint], Normal, false;
    0x8b IBfe "ibfe", dst: [Int], src: [Int Int Int], Normal, false;
    0x8c Bfi "bfi", dst: [Uint], src: [Uint Uint Uint Uint], Normal, false;
    0x8d BfRev "bfrev", dst: [Uint], src: [Uint], Normal, false;
    0x8e Swapc "swapc", dst: [Float Float], src: [Uint Float Float], Normal, false;
    0x8f DclStream "dcl_stream", dst: [], src: [], DclStream, false;
    0x90 DclFunctionBody "dcl_function_body", dst: [], src: [], DclFunctionBody, false;
    0x91 DclFunctionTable "dcl_function_table", dst: [], src: [], DclFunctionTable, false;
    0x92 DclInterface "dcl_interface", dst: [], src: [], DclInterface, false;
    0x93 DclInputControlPointCount "dcl_input_control_point_count", dst: [], src: [], DclControlPointCount, false;
    0x94 DclOutputControlPointCount "dcl_output_control_point_count", dst: [], src: [], DclControlPointCount, false;
    0x95 DclTessDomain "dcl_tessellator_domain", dst: [], src: [], DclTessDomain, false;
    0x96 DclTessPartitioning "dcl_tessellator_partitioning", dst: [], src: [], DclTessPartitioning, false;
    0x97 DclTessOutputPrimitive "dcl_tessellator_output_primitive", dst: [], src: [], DclTessOutputPrimitive, false;
    0x98 DclHsMaxTessFactor "dcl_hs_max_tessfactor", dst: [], src: [], DclHsMaxTessFactor, false;
    0x99 DclHsForkPhaseInstanceCount "dcl_hs_fork_phase_instance_count", dst: [], src: [], DclHsPhaseInstanceCount, false;
    0x9a DclHsJoinPhaseInstanceCount "dcl_hs_join_phase_instance_count", dst: [], src: [], DclHsPhaseInstanceCount, false;
    0x9b DclThreadGroup "dcl_thread_group", dst: [], src: [], DclThreadGroup, false;
    0x9c DclUavTyped "dcl_uav_typed", dst: [], src: [], DclUavTyped, false;
    0x9d DclUavRaw "dcl_uav_raw", dst: [], src: [], DclUavRaw, false;
    0x9e DclUavStructured "dcl_uav_structured", dst: [], src: [], DclUavStructured, false;
    0x9f DclTgsmRaw "dcl_tgsm_raw", dst: [], src: [], DclTgsmRaw, false;
    0xa0 DclTgsmStructured "dcl_tgsm_structured", dst: [], src: [], DclTgsmStructured, false;
    0xa1 DclResourceRaw "dcl_resource_raw", dst: [], src: [], DclResourceRaw, false;
    0xa2 DclResourceStructured "dcl_resource_structured", dst: [], src: [], DclResourceStructured, false;
    0xa3 LdUavTyped "ld_uav_typed", dst: [Uint], src: [Int Uav], Normal, false;
    0xa4 StoreUavTyped "store_uav_typed", dst: [Uav], src: [Int Uint], Normal, false;
    0xa5 LdRaw "ld_raw", dst: [Uint], src: [Int Resource], Normal, false;
    0xa6 StoreRaw "store_raw", dst: [Uav], src: [Int Uint], Normal, false;
    0xa7 LdStructured "ld_structured", dst: [Uint], src: [Int Int Resource], Normal, false;
    0xa8 StoreStructured "store_structured", dst: [Uav], src: [Int Int Uint], Normal, false;
    0xa9 AtomicAnd "atomic_and", dst: [Uav], src: [Int Uint], Normal, false;
    0xaa AtomicOr "atomic_or", dst: [Uav], src: [Int Uint], Normal, false;
    0xab AtomicXor "atomic_xor", dst: [Uav], src: [Int Uint], Normal, false;
    0xac AtomicCmpStore "atomic_cmp_store", dst: [Uav], src: [Int Uint Uint], Normal, false;
    0xad AtomicIAdd "atomic_iadd", dst: [Uav], src: [Int Int], Normal, false;
    0xae AtomicIMax "atomic_imax", dst: [Uav], src: [Int Int], Normal, false;
    0xaf AtomicIMin "atomic_imin", dst: [Uav], src: [Int Int], Normal, false;
    0xb0 AtomicUMax "atomic_umax", dst: [Uav], src: [Int Uint], Normal, false;
    0xb1 AtomicUMin "atomic_umin", dst: [Uav], src: [Int Uint], Normal, false;
    0xb2 ImmAtomicAlloc "imm_atomic_alloc", dst: [Uint Uav], src: [], Normal, false;
    0xb3 ImmAtomicConsume "imm_atomic_consume", dst: [Uint Uav], src: [], Normal, false;
    0xb4 ImmAtomicIAdd "imm_atomic_iadd", dst: [Int Uav], src: [Int Int], Normal, false;
    0xb5 ImmAtomicAnd "imm_atomic_and", dst: [Uint Uav], src: [Int Uint], Normal, false;
    0xb6 ImmAtomicOr "imm_atomic_or", dst: [Uint Uav], src: [Int Uint], Normal, false;
    0xb7 ImmAtomicXor "imm_atomic_xor", dst: [Uint Uav], src: [Int Uint], Normal, false;
    0xb8 ImmAtomicExch "imm_atomic_exch", dst: [Uint Uav], src: [Int Uint], Normal, false;
    0xb9 ImmAtomicCmpExch "imm_atomic_cmp_exch", dst: [Uint Uav], src: [Int Uint Uint], Normal, false;
    0xba ImmAtomicIMax "imm_atomic_imax", dst: [Int Uav], src: [Int Int], Normal, false;
    0xbb ImmAtomicIMin "imm_atomic_imin", dst: [Int Uav], src: [Int Int], Normal, false;
    0xbc ImmAtomicUMax "imm_atomic_umax", dst: [Uint Uav], src: [Int Uint], Normal, false;
    0xbd ImmAtomicUMin "imm_atomic_umin", dst: [Uint Uav], src: [Int Uint], Normal, false;
    0xbe Sync "sync", dst: [], src: [], Normal, false;
    0xbf DAdd "dadd", dst: [Double], src: [Double Double], Normal, false;
    0xc0 DMax "dmax", dst: [Double], src: [Double Double], Normal, false;
    0xc1 DMin "dmin", dst: [Double], src: [Double Double], Normal, false;
    0xc2 DMul "dmul", dst: [Double], src: [Double Double], Normal, false;
    0xc3 DEq "deq", dst: [Uint], src: [Double Double], Normal, false;
    0xc4 DGe "dge", dst: [Uint], src: [Double Double], Normal, false;
    0xc5 DLt "dlt", dst: [Uint], src: [Double Double], Normal, false;
    0xc6 DNe "dne", dst: [Uint], src: [Double Double], Normal, false;
    0xc7 DMov "dmov", dst: [Double], src: [Double], Normal, false;
    0xc8 DMovc "dmovc", dst: [Double], src: [Uint Double Double], Normal, false;
    0xc9 DtoF "dtof", dst: [Float], src: [Double], Normal, false;
    0xca FtoD "ftod", dst: [Double], src: [Float], Normal, false;
    0xcb EvalSnapped "eval_snapped", dst: [Float], src: [Float Int], Normal, false;
    0xcc EvalSampleIndex "eval_sample_index", dst: [Float], src: [Float Int], Normal, false;
    0xcd EvalCentroid "eval_centroid", dst: [Float], src: [Float], Normal, false;
    0xce DclGsInstanceCount "dcl_gs_instance_count", dst: [], src: [], DclGsInstanceCount, false;
    0xd2 DDiv "ddiv", dst: [Double], src: [Double Double], Normal, false;
    0xd3 DFma "dfma", dst: [Double], src: [Double Double Double], Normal, false;
    0xd4 DRcp "drcp", dst: [Double], src: [Double], Normal, false;
    0xd5 Msad "msad", dst: [Uint], src: [Uint Uint Uint], Normal, false;
    0xd6 DtoI "dtoi", dst: [Int], src: [Double], Normal, false;
    0xd7 DtoU "dtou", dst: [Uint], src: [Double], Normal, false;
    0xd8 ItoD "itod", dst: [Double], src: [Int], Normal, false;
    0xd9 UtoD "utod", dst: [Double], src: [Uint], Normal, false;
    0xea CheckAccessFullyMapped "check_access_fully_mapped", dst: [Uint], src: [Uint], Normal, false;
}

struct OpcodeTables {
    by_wire: [Option<u16>; 256],
    by_opcode: Vec<u16>,
}

fn tables() -> &'static OpcodeTables {
    static TABLES: OnceLock<OpcodeTables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut by_wire = [None; 256];
        let mut by_opcode = vec![0u16; OPCODE_TABLE.len()];
        for (i, (op, info)) in OPCODE_TABLE.iter().enumerate() {
            debug_assert!(by_wire[info.wire as usize].is_none());
            by_wire[info.wire as usize] = Some(i as u16);
            by_opcode[*op as usize] = i as u16;
        }
        OpcodeTables { by_wire, by_opcode }
    })
}

impl Opcode {
    /// Looks up the symbolic opcode for a wire id.
    pub fn from_wire(wire: u32) -> Option<Self> {
        if wire >= 256 {
            return None;
        }
        tables().by_wire[wire as usize].map(|i| OPCODE_TABLE[i as usize].0)
    }

    /// Static descriptor for this opcode.
    pub fn info(self) -> &'static OpcodeInfo {
        &OPCODE_TABLE[tables().by_opcode[self as usize] as usize].1
    }

    /// Wire opcode id.
    pub fn wire(self) -> u32 {
        self.info().wire
    }

    /// Mnemonic.
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Whether this opcode occupies the declaration space (including the
    /// hull-shader phase markers and custom-data blocks).
    pub fn is_declaration(self) -> bool {
        !matches!(self.info().read, ReadKind::Normal)
    }
}

// ---- Register types ----

/// How a register's vector sources are encoded by default when the operand
/// has vec4 dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultSwizzleKind {
    /// Full four-component swizzle.
    Vec4,
    /// Replicated scalar component.
    Scalar,
}

macro_rules! register_types {
    ($( $wire:literal $variant:ident $name:literal, $swizzle:ident, descriptor: $descr:literal; )*) => {
        /// Symbolic register (operand) type.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum RegisterType {
            $( $variant, )*
        }

        impl RegisterType {
            /// Looks up the symbolic register type for a wire code.
            pub fn from_wire(wire: u32) -> Option<Self> {
                match wire {
                    $( $wire => Some(Self::$variant), )*
                    _ => None,
                }
            }

            /// Wire register-type code.
            pub fn wire(self) -> u32 {
                match self {
                    $( Self::$variant => $wire, )*
                }
            }

            /// Assembly-style name.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )*
                }
            }

            /// Default swizzle encoding for vec4-dimensioned sources.
            pub fn default_swizzle_kind(self) -> DefaultSwizzleKind {
                match self {
                    $( Self::$variant => DefaultSwizzleKind::$swizzle, )*
                }
            }

            /// Whether this register refers to a bound descriptor
            /// (resource/sampler/constant-buffer/UAV) and therefore carries
            /// the extra 5.1 index level and register space.
            pub fn is_descriptor(self) -> bool {
                match self {
                    $( Self::$variant => $descr, )*
                }
            }
        }
    };
}

register_types! {
    0x00 Temp "r", Vec4, descriptor: false;
    0x01 Input "v", Vec4, descriptor: false;
    0x02 Output "o", Vec4, descriptor: false;
    0x03 IndexableTemp "x", Vec4, descriptor: false;
    0x04 Immediate32 "l", Vec4, descriptor: false;
    0x05 Immediate64 "d", Vec4, descriptor: false;
    0x06 Sampler "s", Scalar, descriptor: true;
    0x07 Resource "t", Vec4, descriptor: true;
    0x08 ConstantBuffer "cb", Vec4, descriptor: true;
    0x09 ImmediateConstantBuffer "icb", Vec4, descriptor: false;
    0x0a Label "label", Scalar, descriptor: false;
    0x0b PrimitiveId "vPrim", Scalar, descriptor: false;
    0x0c DepthOut "oDepth", Scalar, descriptor: false;
    0x0d Null "null", Vec4, descriptor: false;
    0x0e Rasterizer "rasterizer", Vec4, descriptor: false;
    0x0f CoverageOut "oMask", Scalar, descriptor: false;
    0x10 Stream "m", Scalar, descriptor: false;
    0x11 FunctionBody "fb", Scalar, descriptor: false;
    0x13 FunctionPointer "fp", Scalar, descriptor: false;
    0x16 OutputControlPointId "vOutputControlPointID", Scalar, descriptor: false;
    0x17 ForkInstanceId "vForkInstanceID", Scalar, descriptor: false;
    0x18 JoinInstanceId "vJoinInstanceID", Scalar, descriptor: false;
    0x19 InputControlPoint "vicp", Vec4, descriptor: false;
    0x1a OutputControlPoint "vocp", Vec4, descriptor: false;
    0x1b PatchConstant "vpc", Vec4, descriptor: false;
    0x1c TessCoord "vDomain", Vec4, descriptor: false;
    0x1e Uav "u", Vec4, descriptor: true;
    0x1f GroupSharedMemory "g", Vec4, descriptor: false;
    0x20 ThreadId "vThreadID", Vec4, descriptor: false;
    0x21 ThreadGroupId "vThreadGroupID", Vec4, descriptor: false;
    0x22 LocalThreadId "vThreadIDInGroup", Vec4, descriptor: false;
    0x23 CoverageIn "vCoverage", Scalar, descriptor: false;
    0x24 LocalThreadIndex "vThreadIDInGroupFlattened", Scalar, descriptor: false;
    0x25 GsInstanceId "vGSInstanceID", Scalar, descriptor: false;
    0x26 DepthOutGreaterEqual "oDepthGE", Scalar, descriptor: false;
    0x27 DepthOutLessEqual "oDepthLE", Scalar, descriptor: false;
    0x28 CycleCounter "vCycleCounter", Vec4, descriptor: false;
    0x29 StencilRefOut "oStencilRef", Scalar, descriptor: false;
}

// ---- Supporting wire enums ----

/// Resource dimensionality (`D3D10_SB_RESOURCE_DIMENSION`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceType {
    /// Safe default used when the wire value is unrecognized.
    #[default]
    Unknown,
    Buffer,
    Texture1d,
    Texture2d,
    Texture2dMs,
    Texture3d,
    TextureCube,
    Texture1dArray,
    Texture2dArray,
    Texture2dMsArray,
    TextureCubeArray,
    RawBuffer,
    StructuredBuffer,
}

impl ResourceType {
    /// Looks up a wire resource-dimension value.
    pub fn from_wire(wire: u32) -> Option<Self> {
        Some(match wire {
            0 => Self::Unknown,
            1 => Self::Buffer,
            2 => Self::Texture1d,
            3 => Self::Texture2d,
            4 => Self::Texture2dMs,
            5 => Self::Texture3d,
            6 => Self::TextureCube,
            7 => Self::Texture1dArray,
            8 => Self::Texture2dArray,
            9 => Self::Texture2dMsArray,
            10 => Self::TextureCubeArray,
            11 => Self::RawBuffer,
            12 => Self::StructuredBuffer,
            _ => return None,
        })
    }

    /// Wire value.
    pub fn wire(self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::Buffer => 1,
            Self::Texture1d => 2,
            Self::Texture2d => 3,
            Self::Texture2dMs => 4,
            Self::Texture3d => 5,
            Self::TextureCube => 6,
            Self::Texture1dArray => 7,
            Self::Texture2dArray => 8,
            Self::Texture2dMsArray => 9,
            Self::TextureCubeArray => 10,
            Self::RawBuffer => 11,
            Self::StructuredBuffer => 12,
        }
    }

    /// Whether this dimension carries a multisample count.
    pub fn is_multisampled(self) -> bool {
        matches!(self, Self::Texture2dMs | Self::Texture2dMsArray)
    }
}

/// Per-component resource return type (`D3D10_SB_RESOURCE_RETURN_TYPE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceDataType {
    Unorm,
    Snorm,
    Sint,
    Uint,
    /// Safe default used when the wire value is unrecognized.
    #[default]
    Float,
    Mixed,
    Double,
    Continued,
}

impl ResourceDataType {
    /// Looks up a wire return-type nibble.
    pub fn from_wire(wire: u32) -> Option<Self> {
        Some(match wire {
            1 => Self::Unorm,
            2 => Self::Snorm,
            3 => Self::Sint,
            4 => Self::Uint,
            5 => Self::Float,
            6 => Self::Mixed,
            7 => Self::Double,
            8 => Self::Continued,
            _ => return None,
        })
    }

    /// Wire nibble value.
    pub fn wire(self) -> u32 {
        match self {
            Self::Unorm => 1,
            Self::Snorm => 2,
            Self::Sint => 3,
            Self::Uint => 4,
            Self::Float => 5,
            Self::Mixed => 6,
            Self::Double => 7,
            Self::Continued => 8,
        }
    }
}

/// Sampler declaration mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplerMode {
    #[default]
    Default,
    Comparison,
    Mono,
}

impl SamplerMode {
    /// Looks up a wire sampler-mode value.
    pub fn from_wire(wire: u32) -> Option<Self> {
        Some(match wire {
            0 => Self::Default,
            1 => Self::Comparison,
            2 => Self::Mono,
            _ => return None,
        })
    }

    /// Wire value.
    pub fn wire(self) -> u32 {
        match self {
            Self::Default => 0,
            Self::Comparison => 1,
            Self::Mono => 2,
        }
    }
}

/// Geometry/tessellation input primitive (`D3D10_SB_PRIMITIVE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputPrimitive {
    #[default]
    Undefined,
    Point,
    Line,
    Triangle,
    LineAdj,
    TriangleAdj,
    /// `N`-control-point patch (1..=32).
    Patch(u8),
}

impl InputPrimitive {
    /// Looks up a wire primitive value.
    pub fn from_wire(wire: u32) -> Option<Self> {
        Some(match wire {
            0 => Self::Undefined,
            1 => Self::Point,
            2 => Self::Line,
            3 => Self::Triangle,
            6 => Self::LineAdj,
            7 => Self::TriangleAdj,
            8..=39 => Self::Patch((wire - 7) as u8),
            _ => return None,
        })
    }

    /// Wire value.
    pub fn wire(self) -> u32 {
        match self {
            Self::Undefined => 0,
            Self::Point => 1,
            Self::Line => 2,
            Self::Triangle => 3,
            Self::LineAdj => 6,
            Self::TriangleAdj => 7,
            Self::Patch(n) => 7 + n as u32,
        }
    }
}

/// Geometry-shader output topology (`D3D10_SB_PRIMITIVE_TOPOLOGY`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputTopology {
    #[default]
    Undefined,
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
}

impl OutputTopology {
    /// Looks up a wire topology value.
    pub fn from_wire(wire: u32) -> Option<Self> {
        Some(match wire {
            0 => Self::Undefined,
            1 => Self::PointList,
            2 => Self::LineList,
            3 => Self::LineStrip,
            4 => Self::TriangleList,
            5 => Self::TriangleStrip,
            _ => return None,
        })
    }

    /// Wire value.
    pub fn wire(self) -> u32 {
        match self {
            Self::Undefined => 0,
            Self::PointList => 1,
            Self::LineList => 2,
            Self::LineStrip => 3,
            Self::TriangleList => 4,
            Self::TriangleStrip => 5,
        }
    }
}

/// Tessellator domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TessDomain {
    #[default]
    Undefined,
    Isoline,
    Triangle,
    Quad,
}

impl TessDomain {
    /// Looks up a wire domain value.
    pub fn from_wire(wire: u32) -> Option<Self> {
        Some(match wire {
            0 => Self::Undefined,
            1 => Self::Isoline,
            2 => Self::Triangle,
            3 => Self::Quad,
            _ => return None,
        })
    }

    /// Wire value.
    pub fn wire(self) -> u32 {
        match self {
            Self::Undefined => 0,
            Self::Isoline => 1,
            Self::Triangle => 2,
            Self::Quad => 3,
        }
    }
}

/// Tessellator partitioning mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TessPartitioning {
    #[default]
    Undefined,
    Integer,
    Pow2,
    FractionalOdd,
    FractionalEven,
}

impl TessPartitioning {
    /// Looks up a wire partitioning value.
    pub fn from_wire(wire: u32) -> Option<Self> {
        Some(match wire {
            0 => Self::Undefined,
            1 => Self::Integer,
            2 => Self::Pow2,
            3 => Self::FractionalOdd,
            4 => Self::FractionalEven,
            _ => return None,
        })
    }

    /// Wire value.
    pub fn wire(self) -> u32 {
        match self {
            Self::Undefined => 0,
            Self::Integer => 1,
            Self::Pow2 => 2,
            Self::FractionalOdd => 3,
            Self::FractionalEven => 4,
        }
    }
}

/// Tessellator output primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TessOutputPrimitive {
    #[default]
    Undefined,
    Point,
    Line,
    TriangleCw,
    TriangleCcw,
}

impl TessOutputPrimitive {
    /// Looks up a wire output-primitive value.
    pub fn from_wire(wire: u32) -> Option<Self> {
        Some(match wire {
            0 => Self::Undefined,
            1 => Self::Point,
            2 => Self::Line,
            3 => Self::TriangleCw,
            4 => Self::TriangleCcw,
            _ => return None,
        })
    }

    /// Wire value.
    pub fn wire(self) -> u32 {
        match self {
            Self::Undefined => 0,
            Self::Point => 1,
            Self::Line => 2,
            Self::TriangleCw => 3,
            Self::TriangleCcw => 4,
        }
    }
}

/// Pixel-shader input interpolation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    #[default]
    Undefined,
    Constant,
    Linear,
    LinearCentroid,
    LinearNoPerspective,
    LinearNoPerspectiveCentroid,
    LinearSample,
    LinearNoPerspectiveSample,
}

impl InterpolationMode {
    /// Looks up a wire interpolation-mode value.
    pub fn from_wire(wire: u32) -> Option<Self> {
        Some(match wire {
            0 => Self::Undefined,
            1 => Self::Constant,
            2 => Self::Linear,
            3 => Self::LinearCentroid,
            4 => Self::LinearNoPerspective,
            5 => Self::LinearNoPerspectiveCentroid,
            6 => Self::LinearSample,
            7 => Self::LinearNoPerspectiveSample,
            _ => return None,
        })
    }

    /// Wire value.
    pub fn wire(self) -> u32 {
        match self {
            Self::Undefined => 0,
            Self::Constant => 1,
            Self::Linear => 2,
            Self::LinearCentroid => 3,
            Self::LinearNoPerspective => 4,
            Self::LinearNoPerspectiveCentroid => 5,
            Self::LinearSample => 6,
            Self::LinearNoPerspectiveSample => 7,
        }
    }
}

/// Minimum-precision hint carried by extended operand tokens and signature
/// elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MinPrecision {
    #[default]
    Default,
    Float16,
    Float10,
    Sint16,
    Uint16,
}

impl MinPrecision {
    /// Looks up a wire precision value.
    pub fn from_wire(wire: u32) -> Option<Self> {
        Some(match wire {
            0 => Self::Default,
            1 => Self::Float16,
            2 => Self::Float10,
            4 => Self::Sint16,
            5 => Self::Uint16,
            _ => return None,
        })
    }

    /// Wire value.
    pub fn wire(self) -> u32 {
        match self {
            Self::Default => 0,
            Self::Float16 => 1,
            Self::Float10 => 2,
            Self::Sint16 => 4,
            Self::Uint16 => 5,
        }
    }
}

/// Signature component data type (`D3D_REGISTER_COMPONENT_TYPE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentType {
    #[default]
    Unknown,
    Uint32,
    Sint32,
    Float32,
}

impl ComponentType {
    /// Looks up a wire component-type value.
    pub fn from_wire(wire: u32) -> Option<Self> {
        Some(match wire {
            0 => Self::Unknown,
            1 => Self::Uint32,
            2 => Self::Sint32,
            3 => Self::Float32,
            _ => return None,
        })
    }

    /// Wire value.
    pub fn wire(self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::Uint32 => 1,
            Self::Sint32 => 2,
            Self::Float32 => 3,
        }
    }
}

/// System-value semantic tag.
///
/// Kept as a raw wire value (`D3D10_SB_NAME` space) so unrecognized tags
/// survive a decode/encode round trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SysVal(pub u32);

impl SysVal {
    pub const NONE: Self = Self(0);
    pub const POSITION: Self = Self(1);
    pub const CLIP_DISTANCE: Self = Self(2);
    pub const CULL_DISTANCE: Self = Self(3);
    pub const RENDER_TARGET_ARRAY_INDEX: Self = Self(4);
    pub const VIEWPORT_ARRAY_INDEX: Self = Self(5);
    pub const VERTEX_ID: Self = Self(6);
    pub const PRIMITIVE_ID: Self = Self(7);
    pub const INSTANCE_ID: Self = Self(8);
    pub const IS_FRONT_FACE: Self = Self(9);
    pub const SAMPLE_INDEX: Self = Self(10);

    /// Tessellation-factor tags occupy 11..=22 in the declaration name space.
    pub fn is_tess_factor(self) -> bool {
        (11..=22).contains(&self.0)
    }

    /// Whether an index range spanning multiple registers may cover an
    /// element carrying this semantic.
    pub fn allows_index_range(self) -> bool {
        self == Self::NONE || self.is_tess_factor()
    }
}
