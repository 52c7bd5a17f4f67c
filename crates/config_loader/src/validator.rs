//! Config validation
//!
//! Rules:
//! - section names are non-empty
//! - option keys are non-empty
//! - `reading_types`, when present, names at least one type

use contracts::{ContractError, RelayConfig, READING_TYPES_ALIAS, READING_TYPES_KEY};

/// Validate a RelayConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &RelayConfig) -> Result<(), ContractError> {
    validate_section_names(config)?;
    validate_option_keys(config)?;
    validate_reading_types(config)?;
    Ok(())
}

fn validate_section_names(config: &RelayConfig) -> Result<(), ContractError> {
    for name in config.section_names() {
        if name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("[{name}]"),
                "section name cannot be empty",
            ));
        }
    }
    Ok(())
}

fn validate_option_keys(config: &RelayConfig) -> Result<(), ContractError> {
    for (name, section) in config.sections() {
        if section.iter().any(|(key, _)| key.trim().is_empty()) {
            return Err(ContractError::config_validation(
                format!("[{name}]"),
                "option key cannot be empty",
            ));
        }
    }
    Ok(())
}

fn validate_reading_types(config: &RelayConfig) -> Result<(), ContractError> {
    for (name, section) in config.sections() {
        for key in [READING_TYPES_KEY, READING_TYPES_ALIAS] {
            if let Some(types) = section.get_list(key) {
                if types.is_empty() {
                    return Err(ContractError::config_validation(
                        format!("[{name}].{key}"),
                        "reading types list cannot be empty",
                    ));
                }
            }
        }
    }
    Ok(())
}
