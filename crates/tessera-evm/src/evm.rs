//! Message orchestration: call vs. create, value transfer, checkpoints

use std::sync::Arc;

use bytes::Bytes;
use primitive_types::U256;
use tessera_crypto::{create2_address, create_address, keccak256};
use tessera_primitives::{Address, H256};
use tessera_state::{Account, StateAccess};
use tracing::{debug, warn};

use crate::config::EvmConfig;
use crate::context::{BlockContext, Environment, TxContext};
use crate::error::{EvmError, EvmResult, ExecResult};
use crate::host::Host;
use crate::interpreter::{Interpreter, RunOptions};
use crate::message::Message;
use crate::opcode::OpcodeTable;
use crate::transient::TransientStorage;

/// Flat options for [`Evm::run_call`]
#[derive(Clone, Debug, Default)]
pub struct RunCallOpts {
    /// Sender, zero address if absent
    pub caller: Option<Address>,
    /// Transaction origin, defaults to the caller
    pub origin: Option<Address>,
    /// Gas price seen by GASPRICE
    pub gas_price: Option<U256>,
    /// Gas limit, defaults to `EvmConfig::default_gas_limit`
    pub gas_limit: Option<u64>,
    /// Target, `None` to create a contract
    pub to: Option<Address>,
    /// Value transferred
    pub value: Option<U256>,
    /// Call data, or init code for a create
    pub data: Option<Bytes>,
    /// Starting call depth
    pub depth: usize,
    /// Forbid state modification
    pub is_static: bool,
    /// CREATE2 salt
    pub salt: Option<H256>,
    /// Run without value transfer
    pub delegatecall: bool,
    /// Enclosing block, default block if absent
    pub block: Option<BlockContext>,
}

/// Outcome of [`Evm::run_call`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunCallResult {
    /// Address derived for a create, even when its init code failed
    pub created_address: Option<Address>,
    /// Execution outcome
    pub exec_result: ExecResult,
}

impl RunCallResult {
    fn short_circuit(
        created_address: Option<Address>,
        gas_refund: u64,
        error: Option<EvmError>,
    ) -> Self {
        Self {
            created_address,
            exec_result: ExecResult::short_circuit(gas_refund, error),
        }
    }
}

/// Top-level entry point. Owns the world state, the transaction's transient
/// storage and the opcode table for the configured rule set.
pub struct Evm<S: StateAccess> {
    state: S,
    transient_storage: TransientStorage,
    config: Arc<EvmConfig>,
    opcodes: Arc<OpcodeTable>,
    tx: TxContext,
    block: BlockContext,
}

impl<S: StateAccess> Evm<S> {
    /// Create an EVM over `state`
    pub fn new(state: S, config: EvmConfig) -> EvmResult<Self> {
        config.validate()?;
        let opcodes = Arc::new(OpcodeTable::new(&config));
        Ok(Self {
            state,
            transient_storage: TransientStorage::new(),
            config: Arc::new(config),
            opcodes,
            tx: TxContext::default(),
            block: BlockContext::default(),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &EvmConfig {
        &self.config
    }

    /// World state
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Mutable world state
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Give back the world state
    pub fn into_state(self) -> S {
        self.state
    }

    /// Transient storage of the current transaction
    pub fn transient_storage(&self) -> &TransientStorage {
        &self.transient_storage
    }

    /// Drop all transient storage. Call between transactions.
    pub fn clear_transient_storage(&mut self) {
        self.transient_storage.clear();
    }

    /// Run a top-level message built from flat options.
    ///
    /// A depth-0 call starts a new transaction, so transient storage left by
    /// the previous one is dropped first.
    ///
    /// In-VM failures are reported on the result; `Err` means the state
    /// backend or the engine itself malfunctioned.
    pub fn run_call(&mut self, opts: RunCallOpts) -> EvmResult<RunCallResult> {
        if opts.depth == 0 {
            self.transient_storage.clear();
        }
        let caller = opts.caller.unwrap_or(Address::ZERO);
        self.tx = TxContext {
            origin: opts.origin.unwrap_or(caller),
            gas_price: opts.gas_price.unwrap_or_default(),
        };
        self.block = opts.block.unwrap_or_default();

        let message = Message {
            to: opts.to,
            value: opts.value.unwrap_or_default(),
            caller,
            gas_limit: opts.gas_limit.unwrap_or(self.config.default_gas_limit),
            data: opts.data,
            depth: opts.depth,
            is_static: opts.is_static,
            salt: opts.salt,
            delegatecall: opts.delegatecall,
            ..Default::default()
        };
        self.run_message(message)
    }

    /// Run a prepared message under the current transaction context
    pub fn run_message(&mut self, message: Message) -> EvmResult<RunCallResult> {
        if message.depth > self.config.max_call_depth {
            debug!(depth = message.depth, "call depth exceeded");
            return Ok(RunCallResult::short_circuit(
                None,
                0,
                Some(EvmError::CallDepthExceeded),
            ));
        }

        debug!(
            depth = message.depth,
            to = ?message.to,
            gas_limit = message.gas_limit,
            create = message.is_create(),
            "message start"
        );

        self.state.checkpoint()?;
        self.transient_storage.checkpoint();

        let outcome = if message.is_create() {
            self.execute_create(message)
        } else {
            self.execute_call(message)
        };
        let mut result = match outcome {
            Ok(result) => result,
            Err(err) => {
                if let Err(revert_err) = self.revert_checkpoints() {
                    warn!(error = %revert_err, "checkpoint revert failed after fatal error");
                }
                return Err(err);
            }
        };

        let exec = &mut result.exec_result;
        if exec.exception_error.is_some() {
            exec.selfdestruct.clear();
            exec.gas_refund = 0;
            exec.logs.clear();
            self.revert_checkpoints()?;
        } else {
            self.state.commit()?;
            self.transient_storage.commit()?;
        }

        debug!(
            gas_used = exec.execution_gas_used,
            error = ?exec.exception_error,
            created = ?result.created_address,
            "message end"
        );
        Ok(result)
    }

    fn revert_checkpoints(&mut self) -> EvmResult<()> {
        self.state.revert()?;
        self.transient_storage.revert()
    }

    fn execute_call(&mut self, mut message: Message) -> EvmResult<RunCallResult> {
        let mut error = None;
        if !message.delegatecall {
            let sender = message.authcall_origin.unwrap_or(message.caller);
            let account = self.state.get_account(&sender)?;
            match self.reduce_sender_balance(sender, account, message.value) {
                Ok(()) => {}
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => error = Some(err),
            }
        }

        if let (false, Some(to)) = (message.delegatecall, message.to) {
            // credited even after a failed debit; the checkpoint revert undoes it
            match self.add_to_balance(to, message.value) {
                Ok(()) => {}
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    error.get_or_insert(err);
                }
            }
        }

        self.load_code(&mut message)?;
        if message.code.is_empty() || error.is_some() {
            return Ok(RunCallResult::short_circuit(None, message.gas_refund, error));
        }

        let exec_result = self.run_interpreter(&message)?;
        Ok(RunCallResult {
            created_address: None,
            exec_result,
        })
    }

    fn execute_create(&mut self, mut message: Message) -> EvmResult<RunCallResult> {
        let account = self.state.get_account(&message.caller)?;
        if let Err(err) = self.reduce_sender_balance(message.caller, account, message.value) {
            if err.is_fatal() {
                return Err(err);
            }
            return Ok(RunCallResult::short_circuit(None, message.gas_refund, Some(err)));
        }

        message.code = message.data.take().unwrap_or_default();
        message.data = Some(Bytes::new());
        let address = self.generate_address(&message)?;
        message.to = Some(address);

        self.state.clear_contract_storage(&address)?;
        let error = match self.add_to_balance(address, message.value) {
            Ok(()) => None,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => Some(err),
        };

        if message.code.is_empty() || error.is_some() {
            return Ok(RunCallResult::short_circuit(
                Some(address),
                message.gas_refund,
                error,
            ));
        }

        let gas_limit = message.gas_limit;
        let mut exec_result = self.run_interpreter(&message)?;
        if exec_result.is_success() {
            let code_len = exec_result.return_value.len();
            let deposit_fee = (code_len as u64).saturating_mul(self.config.create_data_gas);
            let total_gas = exec_result.execution_gas_used.saturating_add(deposit_fee);

            if total_gas > gas_limit {
                warn!(%address, code_len, "not enough gas to deposit code");
                exec_result = exec_result.into_fault(gas_limit, EvmError::OutOfGas);
            } else if let Some(limit) = self.config.max_code_size.filter(|&limit| code_len > limit) {
                warn!(%address, code_len, limit, "deployed code exceeds size limit");
                exec_result = exec_result.into_fault(
                    gas_limit,
                    EvmError::CodeSizeExceeded {
                        size: code_len,
                        limit,
                    },
                );
            } else {
                exec_result.execution_gas_used = total_gas;
                if code_len > 0 {
                    self.state
                        .put_contract_code(address, exec_result.return_value.to_vec())?;
                }
            }
        }

        Ok(RunCallResult {
            created_address: Some(address),
            exec_result,
        })
    }

    /// CREATE2 when salted; otherwise from `create_nonce`, falling back to
    /// the caller's current nonce.
    fn generate_address(&self, message: &Message) -> EvmResult<Address> {
        if let Some(salt) = &message.salt {
            return Ok(create2_address(
                &message.caller,
                salt,
                &keccak256(&message.code),
            ));
        }
        let nonce = match message.create_nonce {
            Some(nonce) => nonce,
            None => self.state.get_account(&message.caller)?.nonce,
        };
        Ok(create_address(&message.caller, nonce))
    }

    fn reduce_sender_balance(
        &mut self,
        sender: Address,
        mut account: Account,
        value: U256,
    ) -> EvmResult<()> {
        account.balance = account
            .balance
            .checked_sub(value)
            .ok_or(EvmError::InsufficientBalance)?;
        self.state.put_account(sender, account)?;
        Ok(())
    }

    /// Reloads the account since a create may have bumped its nonce.
    fn add_to_balance(&mut self, address: Address, value: U256) -> EvmResult<()> {
        let mut account = self.state.get_account(&address)?;
        account.balance = account
            .balance
            .checked_add(value)
            .ok_or(EvmError::ValueOverflow)?;
        self.state.put_account(address, account)?;
        Ok(())
    }

    fn load_code(&self, message: &mut Message) -> EvmResult<()> {
        let code_address = message.code_address()?;
        message.code = Bytes::from(self.state.get_contract_code(&code_address)?);
        message.is_compiled = false;
        Ok(())
    }

    fn run_interpreter(&mut self, message: &Message) -> EvmResult<ExecResult> {
        let address = message.to.unwrap_or(Address::ZERO);
        let env = Environment {
            address,
            caller: message.caller,
            call_data: message
                .data
                .clone()
                .unwrap_or_else(|| Bytes::from_static(&[0])),
            call_value: message.value,
            code: message.code.clone(),
            is_static: message.is_static,
            depth: message.depth,
            gas_price: self.tx.gas_price,
            origin: self.tx.origin,
            block: self.block.clone(),
            contract: self.state.get_account(&address)?,
            code_address: message.code_address.unwrap_or(address),
            gas_refund: message.gas_refund,
        };

        let gas_limit = message.gas_limit;
        let outcome = Interpreter::new(env, gas_limit, self.opcodes.clone(), self.config.clone())
            .with_selfdestruct(message.selfdestruct.clone())
            .run(message.code.clone(), RunOptions::default(), self)?;

        let run_state = outcome.run_state;
        let mut result = ExecResult {
            return_value: run_state.return_value,
            execution_gas_used: gas_limit.saturating_sub(run_state.gas_left),
            gas_refund: run_state.gas_refund,
            exception_error: outcome.exception_error,
            logs: run_state.logs,
            selfdestruct: run_state.selfdestruct,
        };
        match result.exception_error.clone() {
            None => {}
            Some(EvmError::Revert) => {
                result.logs.clear();
                result.selfdestruct.clear();
            }
            Some(err) => result = result.into_fault(gas_limit, err),
        }
        Ok(result)
    }
}

impl<S: StateAccess> Host for Evm<S> {
    fn account(&self, address: &Address) -> EvmResult<Account> {
        Ok(self.state.get_account(address)?)
    }

    fn code(&self, address: &Address) -> EvmResult<Bytes> {
        Ok(Bytes::from(self.state.get_contract_code(address)?))
    }

    fn storage_load(&self, address: &Address, key: &H256, original: bool) -> EvmResult<H256> {
        Ok(self.state.storage_load(address, key, original)?)
    }

    fn storage_store(&mut self, address: Address, key: H256, value: H256) -> EvmResult<()> {
        Ok(self.state.storage_store(address, key, value)?)
    }

    fn transient_load(&self, address: &Address, key: &H256) -> H256 {
        self.transient_storage.get(address, key.as_bytes())
    }

    fn transient_store(&mut self, address: Address, key: H256, value: H256) -> EvmResult<()> {
        self.transient_storage
            .put(address, key.as_bytes(), value.as_bytes())
    }

    fn increment_nonce(&mut self, address: &Address) -> EvmResult<u64> {
        let mut account = self.state.get_account(address)?;
        account.nonce = account.nonce.checked_add(1).ok_or(EvmError::NonceOverflow)?;
        let nonce = account.nonce;
        self.state.put_account(*address, account)?;
        Ok(nonce)
    }

    fn selfdestruct(&mut self, address: &Address, beneficiary: &Address) -> EvmResult<()> {
        if address == beneficiary {
            return Ok(());
        }
        let mut account = self.state.get_account(address)?;
        let balance = std::mem::take(&mut account.balance);
        self.state.put_account(*address, account)?;
        self.add_to_balance(*beneficiary, balance)
    }

    fn call(&mut self, message: Message) -> EvmResult<RunCallResult> {
        self.run_message(message)
    }
}
