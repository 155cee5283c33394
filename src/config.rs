//! Engine configuration, with defaults matching spec §6.2 exactly.

use serde::{Deserialize, Serialize};

use crate::decimal::RoundingMode;
use crate::formula::OnErrorPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub enable_cache: bool,
    pub max_cache_size: usize,
    pub strict_mode: bool,
    pub variable_prefix: char,
    pub context_prefix: char,
    pub decimal: DecimalConfig,
    pub default_rounding: RoundingConfig,
    pub security: SecurityConfig,
    pub default_error_behavior: OnErrorPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            enable_cache: true,
            max_cache_size: 1000,
            strict_mode: true,
            variable_prefix: '$',
            context_prefix: '@',
            decimal: DecimalConfig::default(),
            default_rounding: RoundingConfig::default(),
            security: SecurityConfig::default(),
            default_error_behavior: OnErrorPolicy::Throw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecimalConfig {
    pub precision: u32,
    pub rounding_mode: RoundingMode,
    pub division_scale: u32,
    pub auto_convert_floats: bool,
    pub max_exponent: i64,
    pub min_exponent: i64,
}

impl Default for DecimalConfig {
    fn default() -> Self {
        DecimalConfig {
            precision: 20,
            rounding_mode: RoundingMode::HalfUp,
            division_scale: 10,
            auto_convert_floats: true,
            max_exponent: 1000,
            min_exponent: -1000,
        }
    }
}

/// Default rounding applied to a formula's result before it is injected
/// into the batch working context, absent a per-formula override.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundingConfig {
    pub mode: RoundingMode,
    pub precision: u32,
}

impl Default for RoundingConfig {
    fn default() -> Self {
        RoundingConfig {
            mode: RoundingMode::None,
            precision: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub max_expression_length: usize,
    pub max_recursion_depth: usize,
    pub max_iterations: usize,
    pub max_execution_time: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        SecurityConfig {
            max_expression_length: 10_000,
            max_recursion_depth: 100,
            max_iterations: 10_000,
            max_execution_time: 5_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = EngineConfig::default();
        assert!(cfg.enable_cache);
        assert_eq!(cfg.max_cache_size, 1000);
        assert!(cfg.strict_mode);
        assert_eq!(cfg.decimal.precision, 20);
        assert_eq!(cfg.decimal.rounding_mode, RoundingMode::HalfUp);
        assert_eq!(cfg.decimal.division_scale, 10);
        assert_eq!(cfg.security.max_expression_length, 10_000);
        assert_eq!(cfg.security.max_recursion_depth, 100);
        assert_eq!(cfg.security.max_iterations, 10_000);
        assert_eq!(cfg.default_rounding.mode, RoundingMode::None);
    }

    #[test]
    fn round_trips_through_json() {
        let cfg = EngineConfig::default();
        let text = serde_json::to_string(&cfg).unwrap();
        let back: EngineConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(cfg, back);
    }
}
