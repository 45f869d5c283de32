//! 配置校验模块
//!
//! 校验规则：
//! - 字段约束 (`validator` derive，声明在配置类型上)
//! - target.url 若已设置，必须是 http 或 https
//! - request_timeout > 0

use contracts::{ContractError, PusherSettings};
use validator::{Validate, ValidationErrors};

/// 校验 PusherSettings 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(settings: &PusherSettings) -> Result<(), ContractError> {
    settings.validate().map_err(first_violation)?;
    validate_target_scheme(settings)?;
    validate_request_timeout(settings)?;
    Ok(())
}

/// Flatten nested validator errors into a single `ConfigValidation`
fn first_violation(errors: ValidationErrors) -> ContractError {
    fn walk(prefix: &str, errors: &ValidationErrors) -> Option<ContractError> {
        for (field, kind) in errors.errors() {
            let path = if prefix.is_empty() {
                field.to_string()
            } else {
                format!("{prefix}.{field}")
            };
            match kind {
                validator::ValidationErrorsKind::Field(list) => {
                    if let Some(error) = list.first() {
                        let message = error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("failed '{}' check", error.code));
                        return Some(ContractError::config_validation(path, message));
                    }
                }
                validator::ValidationErrorsKind::Struct(inner) => {
                    if let Some(found) = walk(&path, inner) {
                        return Some(found);
                    }
                }
                validator::ValidationErrorsKind::List(items) => {
                    for (idx, inner) in items {
                        if let Some(found) = walk(&format!("{path}[{idx}]"), inner) {
                            return Some(found);
                        }
                    }
                }
            }
        }
        None
    }

    walk("", &errors)
        .unwrap_or_else(|| ContractError::config_validation("settings", errors.to_string()))
}

fn validate_target_scheme(settings: &PusherSettings) -> Result<(), ContractError> {
    let Some(url) = settings.target.url.as_deref() else {
        return Ok(());
    };
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ContractError::config_validation(
            "target.url",
            format!("'{url}' must use http or https"),
        ))
    }
}

fn validate_request_timeout(settings: &PusherSettings) -> Result<(), ContractError> {
    if settings.target.request_timeout.is_zero() {
        return Err(ContractError::config_validation(
            "target.request_timeout",
            "request_timeout must be > 0",
        ));
    }
    Ok(())
}
