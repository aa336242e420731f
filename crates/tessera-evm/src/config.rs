//! Chain rule configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gas::cost;

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// JSON could not be parsed
    #[error("invalid config: {0}")]
    Parse(String),

    /// Subroutine opcodes collide with Cancun's TLOAD/TSTORE/MCOPY
    #[error("subroutine opcodes are unavailable from {0:?} on")]
    SubroutinesUnavailable(Hardfork),

    /// Depth limit of zero forbids every call
    #[error("max_call_depth must be positive")]
    ZeroCallDepth,
}

/// Rule sets the opcode table can be built for
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Hardfork {
    /// CHAINID, SELFBALANCE
    Istanbul,
    /// Access lists
    Berlin,
    /// BASEFEE
    London,
    /// PUSH0
    Shanghai,
    /// TLOAD, TSTORE, MCOPY
    #[default]
    Cancun,
}

/// EVM configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvmConfig {
    /// Active rule set
    pub hardfork: Hardfork,
    /// Enable BEGINSUB/RETURNSUB/JUMPSUB (EIP-2315)
    pub subroutines: bool,
    /// Deployed code size limit, `None` for unlimited
    pub max_code_size: Option<usize>,
    /// Gas per byte of deployed code
    pub create_data_gas: u64,
    /// Deepest allowed message depth
    pub max_call_depth: usize,
    /// Gas limit for `run_call` when none is given
    pub default_gas_limit: u64,
}

impl Default for EvmConfig {
    fn default() -> Self {
        Self {
            hardfork: Hardfork::default(),
            subroutines: false,
            max_code_size: Some(cost::MAX_CODE_SIZE),
            create_data_gas: cost::CREATE_DATA,
            max_call_depth: cost::MAX_CALL_DEPTH,
            default_gas_limit: 0xff_ffff,
        }
    }
}

impl EvmConfig {
    /// Defaults for a given rule set
    pub fn for_hardfork(hardfork: Hardfork) -> Self {
        Self {
            hardfork,
            ..Default::default()
        }
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EvmConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject contradictory settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subroutines && self.hardfork >= Hardfork::Cancun {
            return Err(ConfigError::SubroutinesUnavailable(self.hardfork));
        }
        if self.max_call_depth == 0 {
            return Err(ConfigError::ZeroCallDepth);
        }
        Ok(())
    }

    /// Whether `fork` rules are active
    pub fn is_active(&self, fork: Hardfork) -> bool {
        self.hardfork >= fork
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EvmConfig::default();
        assert_eq!(config.hardfork, Hardfork::Cancun);
        assert!(!config.subroutines);
        assert_eq!(config.max_code_size, Some(24576));
        assert_eq!(config.create_data_gas, 200);
        assert_eq!(config.max_call_depth, 1024);
        assert_eq!(config.default_gas_limit, 0xffffff);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = EvmConfig::from_json(r#"{"hardfork":"berlin","subroutines":true}"#).unwrap();
        assert_eq!(config.hardfork, Hardfork::Berlin);
        assert!(config.subroutines);
        assert_eq!(config.create_data_gas, 200);
    }

    #[test]
    fn test_from_json_unlimited_code_size() {
        let config = EvmConfig::from_json(r#"{"max_code_size":null}"#).unwrap();
        assert_eq!(config.max_code_size, None);
    }

    #[test]
    fn test_subroutines_conflict_with_cancun() {
        let err = EvmConfig::from_json(r#"{"subroutines":true}"#).unwrap_err();
        assert_eq!(err, ConfigError::SubroutinesUnavailable(Hardfork::Cancun));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            EvmConfig::from_json(r#"{"hardfork":"frontier"}"#),
            Err(ConfigError::Parse(_))
        ));
        assert_eq!(
            EvmConfig::from_json(r#"{"max_call_depth":0}"#),
            Err(ConfigError::ZeroCallDepth)
        );
    }

    #[test]
    fn test_fork_ordering() {
        let config = EvmConfig::for_hardfork(Hardfork::London);
        assert!(config.is_active(Hardfork::Berlin));
        assert!(config.is_active(Hardfork::London));
        assert!(!config.is_active(Hardfork::Shanghai));
    }
}
