use thiserror::Error;

/// 配置驗證錯誤
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("缺少必要配置項: {0}")]
    MissingField(String),

    #[error("無效的配置值: {0}")]
    InvalidValue(String),

    #[error("配置範圍錯誤: {field} 的值 {value} 不在範圍 {min}..{max} 內")]
    RangeError {
        field: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("依賴錯誤: {dependent} 依賴於 {dependency} 的配置")]
    DependencyError {
        dependent: String,
        dependency: String,
    },
}

/// 配置驗證器trait
pub trait Validator {
    /// 驗證配置
    fn validate(&self) -> Result<(), ValidationError>;
}

/// 驗證配置區段
pub fn validate_config<T>(config: &T) -> Result<(), ValidationError>
where
    T: Validator,
{
    config.validate()
}

/// 驗證工具函數
pub struct ValidationUtils;

impl ValidationUtils {
    /// 驗證配置值是否在指定範圍內（NaN 一律視為超出範圍）
    pub fn in_range<T>(value: T, min: T, max: T, field_name: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + ToString,
    {
        if !(value >= min && value <= max) {
            return Err(ValidationError::RangeError {
                field: field_name.to_string(),
                value: value.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(())
    }

    /// 驗證一個選項是否為某些值中的一個
    pub fn one_of<T>(value: &T, options: &[T], field_name: &str) -> Result<(), ValidationError>
    where
        T: PartialEq + ToString,
    {
        if !options.contains(value) {
            return Err(ValidationError::InvalidValue(format!(
                "{} 的值 {} 不是有效選項: {:?}",
                field_name,
                value.to_string(),
                options.iter().map(ToString::to_string).collect::<Vec<_>>()
            )));
        }
        Ok(())
    }

    /// 檢查必要的字串欄位是否有值
    pub fn not_empty(value: &str, field_name: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField(field_name.to_string()));
        }
        Ok(())
    }

    /// 檢查端點是否為 http(s) URL
    pub fn http_url(value: &str, field_name: &str) -> Result<(), ValidationError> {
        Self::not_empty(value, field_name)?;
        let lower = value.trim().to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(ValidationError::InvalidValue(format!(
                "{} 必須是 http(s) URL: {}",
                field_name, value
            )));
        }
        Ok(())
    }

    /// 檢查兩個欄位的依賴關係
    pub fn check_dependency(
        has_dependent: bool,
        has_dependency: bool,
        dependent_name: &str,
        dependency_name: &str,
    ) -> Result<(), ValidationError> {
        if has_dependent && !has_dependency {
            return Err(ValidationError::DependencyError {
                dependent: dependent_name.to_string(),
                dependency: dependency_name.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range_rate() {
        assert!(ValidationUtils::in_range(0.045, 0.0, 0.25, "engine.risk_free_rate").is_ok());

        let err = ValidationUtils::in_range(0.5, 0.0, 0.25, "engine.risk_free_rate").unwrap_err();
        match err {
            ValidationError::RangeError { field, value, min, max } => {
                assert_eq!(field, "engine.risk_free_rate");
                assert_eq!(value, "0.5");
                assert_eq!(min, "0");
                assert_eq!(max, "0.25");
            }
            _ => panic!("Expected RangeError"),
        }
    }

    #[test]
    fn test_in_range_rejects_nan() {
        assert!(ValidationUtils::in_range(f64::NAN, 0.0, 1.0, "engine.risk_free_rate").is_err());
    }

    #[test]
    fn test_one_of() {
        assert!(ValidationUtils::one_of(&"json", &["pretty", "json"], "log.format").is_ok());
        assert!(ValidationUtils::one_of(&"xml", &["pretty", "json"], "log.format").is_err());
    }

    #[test]
    fn test_http_url() {
        assert!(ValidationUtils::http_url("https://example.com/api", "fetch.endpoint").is_ok());
        assert!(ValidationUtils::http_url("ftp://example.com", "fetch.endpoint").is_err());
        assert!(ValidationUtils::http_url("  ", "fetch.endpoint").is_err());
    }

    #[test]
    fn test_check_dependency() {
        assert!(ValidationUtils::check_dependency(true, true, "fetch.enabled", "fetch.endpoint").is_ok());
        assert!(ValidationUtils::check_dependency(false, false, "fetch.enabled", "fetch.endpoint").is_ok());
        assert!(ValidationUtils::check_dependency(true, false, "fetch.enabled", "fetch.endpoint").is_err());
    }
}
