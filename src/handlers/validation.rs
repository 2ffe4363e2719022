use crate::error::{AppError, AppResult};
use uuid::Uuid;

/// 校验去除首尾空白后的字符串长度（按字符计），原值不做修改
pub fn validate_string(value: &str, field: &str, min: usize, max: usize) -> AppResult<()> {
    let len = value.trim().chars().count();

    if len < min {
        return Err(AppError::validation(format!(
            "{} 长度不能少于 {} 个字符",
            field, min
        )));
    }
    if len > max {
        return Err(AppError::validation(format!(
            "{} 长度不能超过 {} 个字符",
            field, max
        )));
    }

    Ok(())
}

/// 解析路径中的运行标识
pub fn parse_run_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::bad_request(format!("无效的运行标识: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_string_trims_and_bounds() {
        assert!(validate_string("  go  ", "language", 1, 100).is_ok());
        assert!(validate_string("   ", "language", 1, 100).is_err());
        assert!(validate_string(&"a".repeat(101), "language", 1, 100).is_err());
        assert!(validate_string(&"a".repeat(100), "language", 1, 100).is_ok());
        // 首尾空白不计入长度
        assert!(validate_string(&format!(" {} ", "a".repeat(100)), "language", 1, 100).is_ok());
    }

    #[test]
    fn test_validate_string_counts_chars_not_bytes() {
        // 4 个汉字 = 12 字节
        assert!(validate_string("性能测试", "tenant", 1, 4).is_ok());
    }

    #[test]
    fn test_parse_run_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_run_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_run_id("not-a-uuid").unwrap_err(),
            AppError::BadRequest(_)
        ));
    }
}
