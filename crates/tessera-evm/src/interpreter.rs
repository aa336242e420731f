//! EVM bytecode interpreter

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use primitive_types::U256;
use tessera_primitives::Address;
use tracing::{debug, trace};

use crate::config::EvmConfig;
use crate::context::Environment;
use crate::error::{EvmError, EvmResult, Log};
use crate::gas::{self, cost};
use crate::host::Host;
use crate::memory::Memory;
use crate::opcode::{self, OpcodeTable};
use crate::stack::Stack;

/// Bitmap value of a JUMPDEST offset
pub const JUMPDEST_MARK: u8 = 1;
/// Bitmap value of a BEGINSUB offset
pub const BEGINSUB_MARK: u8 = 2;

/// Largest memory offset or size accepted before it is treated as out of gas
const MAX_MEMORY_OFFSET: u64 = u32::MAX as u64;

/// Scan `code` for jump targets, skipping PUSH immediates.
pub fn valid_jump_destinations(code: &[u8]) -> Vec<u8> {
    let mut jumps = vec![0u8; code.len()];
    let mut i = 0;
    while i < code.len() {
        let op = code[i];
        if (opcode::PUSH1..=opcode::PUSH32).contains(&op) {
            i += (op - opcode::PUSH0) as usize;
        } else if op == opcode::JUMPDEST {
            jumps[i] = JUMPDEST_MARK;
        } else if op == opcode::BEGINSUB {
            jumps[i] = BEGINSUB_MARK;
        }
        i += 1;
    }
    jumps
}

/// Mutable state of one frame, handed to every instruction handler
#[derive(Clone, Debug)]
pub struct RunState {
    /// Offset of the next instruction
    pub program_counter: usize,
    /// Opcode being executed
    pub opcode: u8,
    /// Frame memory
    pub memory: Memory,
    /// Operand stack
    pub stack: Stack,
    /// Subroutine return addresses
    pub return_stack: Stack,
    /// Code being executed
    pub code: Bytes,
    /// Remaining gas
    pub gas_left: u64,
    /// Refund counter
    pub gas_refund: u64,
    /// Jump destination bitmap, filled on first jump
    pub valid_jumps: Vec<u8>,
    /// Jump analysis still pending
    pub should_do_jump_analysis: bool,
    /// Invocation environment
    pub env: Environment,
    /// Output of the last nested call
    pub return_data: Bytes,
    /// Output of this frame
    pub return_value: Bytes,
    /// STOP, RETURN or SELFDESTRUCT executed
    pub halted: bool,
    /// Logs emitted so far
    pub logs: Vec<Log>,
    /// Accounts scheduled for removal
    pub selfdestruct: HashSet<Address>,
}

impl RunState {
    fn new(env: Environment, gas_limit: u64) -> Self {
        Self {
            program_counter: 0,
            opcode: opcode::INVALID,
            memory: Memory::new(),
            stack: Stack::new(),
            return_stack: Stack::with_limit(cost::MAX_RETURN_STACK_SIZE),
            code: Bytes::new(),
            gas_left: gas_limit,
            gas_refund: env.gas_refund,
            valid_jumps: Vec::new(),
            should_do_jump_analysis: true,
            env,
            return_data: Bytes::new(),
            return_value: Bytes::new(),
            halted: false,
            logs: Vec::new(),
            selfdestruct: HashSet::new(),
        }
    }

    /// Charge gas. Running out clamps the counter to zero.
    pub fn use_gas(&mut self, amount: u64) -> EvmResult<()> {
        match self.gas_left.checked_sub(amount) {
            Some(left) => {
                self.gas_left = left;
                Ok(())
            }
            None => {
                self.gas_left = 0;
                Err(EvmError::OutOfGas)
            }
        }
    }

    /// Give back gas a nested frame did not use
    pub fn return_gas(&mut self, amount: u64) {
        self.gas_left = self.gas_left.saturating_add(amount);
    }

    /// Charge expansion for `[offset, offset + size)`, grow memory and return
    /// the range as native offsets. A zero size touches nothing.
    pub fn memory_range(&mut self, offset: U256, size: U256) -> EvmResult<(usize, usize)> {
        if size.is_zero() {
            return Ok((0, 0));
        }
        let offset = memory_offset(offset)?;
        let size = memory_offset(size)?;
        let end = offset + size;
        self.use_gas(gas::memory_gas(self.memory.len(), end))?;
        self.memory.extend(offset, size)?;
        Ok((offset, size))
    }

    /// Fail inside a static frame
    pub fn require_non_static(&self) -> EvmResult<()> {
        if self.env.is_static {
            return Err(EvmError::StaticCallViolation);
        }
        Ok(())
    }

    /// Whether `dest` is a JUMPDEST outside push data
    pub fn is_valid_jump(&self, dest: usize) -> bool {
        self.valid_jumps.get(dest) == Some(&JUMPDEST_MARK)
    }

    /// Whether `dest` is a BEGINSUB outside push data
    pub fn is_valid_subroutine(&self, dest: usize) -> bool {
        self.valid_jumps.get(dest) == Some(&BEGINSUB_MARK)
    }
}

fn memory_offset(value: U256) -> EvmResult<usize> {
    if value > U256::from(MAX_MEMORY_OFFSET) {
        return Err(EvmError::OutOfGas);
    }
    Ok(value.as_u64() as usize)
}

/// Options for [`Interpreter::run`]
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Start at this offset instead of 0
    pub pc: Option<usize>,
}

/// Final frame state plus the condition that stopped it, if any
#[derive(Debug)]
pub struct InterpreterResult {
    /// State at halt
    pub run_state: RunState,
    /// `None` on STOP, RETURN or running off the end of the code
    pub exception_error: Option<EvmError>,
}

/// Executes one frame
pub struct Interpreter {
    run_state: RunState,
    opcodes: Arc<OpcodeTable>,
    config: Arc<EvmConfig>,
}

impl Interpreter {
    /// Create an interpreter for one frame
    pub fn new(
        env: Environment,
        gas_limit: u64,
        opcodes: Arc<OpcodeTable>,
        config: Arc<EvmConfig>,
    ) -> Self {
        Self {
            run_state: RunState::new(env, gas_limit),
            opcodes,
            config,
        }
    }

    /// Seed the self-destruct set inherited from the caller
    pub fn with_selfdestruct(mut self, selfdestruct: HashSet<Address>) -> Self {
        self.run_state.selfdestruct = selfdestruct;
        self
    }

    /// Current frame state
    pub fn run_state(&self) -> &RunState {
        &self.run_state
    }

    /// Run `code` until it halts.
    ///
    /// In-VM exceptions end up in [`InterpreterResult::exception_error`];
    /// only fatal errors (see [`EvmError::is_fatal`]) are returned as `Err`.
    pub fn run(
        mut self,
        code: Bytes,
        opts: RunOptions,
        host: &mut dyn Host,
    ) -> EvmResult<InterpreterResult> {
        self.run_state.code = code;
        if let Some(pc) = opts.pc {
            self.run_state.program_counter = pc;
        }

        let mut exception_error = None;
        while !self.run_state.halted && self.run_state.program_counter < self.run_state.code.len() {
            let op = self.run_state.code[self.run_state.program_counter];
            if self.run_state.should_do_jump_analysis && self.triggers_jump_analysis(op) {
                self.run_state.valid_jumps = valid_jump_destinations(&self.run_state.code);
                self.run_state.should_do_jump_analysis = false;
            }
            self.run_state.opcode = op;

            if let Err(err) = self.run_step(host) {
                if err.is_fatal() {
                    return Err(err);
                }
                if err != EvmError::Revert {
                    debug!(
                        pc = self.run_state.program_counter,
                        opcode = self.opcodes.get(op).name,
                        depth = self.run_state.env.depth,
                        error = %err,
                        "frame halted on exception"
                    );
                }
                exception_error = Some(err);
                break;
            }
        }

        Ok(InterpreterResult {
            run_state: self.run_state,
            exception_error,
        })
    }

    fn run_step(&mut self, host: &mut dyn Host) -> EvmResult<()> {
        let info = self.opcodes.get(self.run_state.opcode);
        trace!(
            pc = self.run_state.program_counter,
            opcode = info.name,
            gas_left = self.run_state.gas_left,
            "step"
        );
        self.run_state.use_gas(info.fee)?;
        self.run_state.program_counter += 1;
        (info.handler)(&mut self.run_state, host, &self.config)
    }

    fn triggers_jump_analysis(&self, op: u8) -> bool {
        op == opcode::JUMP
            || op == opcode::JUMPI
            || (self.config.subroutines && op == opcode::JUMPSUB)
    }
}
