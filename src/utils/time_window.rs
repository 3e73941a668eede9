//! 列表年龄窗口解析：`24h`、`7d`、`30d`、`2w` 等单一单位写法

use chrono::Duration;

use crate::errors::{DealdropError, Result};

/// 解析年龄窗口；`all` 或空串表示不过滤
pub fn parse_age_window(input: &str) -> Result<Option<Duration>> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("all") {
        return Ok(None);
    }

    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| DealdropError::validation(format!("Missing unit in age window '{}'", input)))?;
    let (num_str, unit) = input.split_at(split);

    let num: i64 = num_str
        .parse()
        .map_err(|_| DealdropError::validation(format!("Invalid age window '{}'", input)))?;
    if num <= 0 {
        return Err(DealdropError::validation("Age window must be positive"));
    }

    let duration = match unit.to_lowercase().as_str() {
        "h" | "hour" | "hours" => Duration::try_hours(num),
        "d" | "day" | "days" => Duration::try_days(num),
        "w" | "week" | "weeks" => Duration::try_weeks(num),
        _ => {
            return Err(DealdropError::validation(format!(
                "Unsupported age window unit '{}'",
                unit
            )));
        }
    };

    duration
        .map(Some)
        .ok_or_else(|| DealdropError::validation(format!("Age window '{}' is too large", input)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_windows() {
        assert_eq!(parse_age_window("24h").unwrap(), Some(Duration::hours(24)));
        assert_eq!(parse_age_window("7d").unwrap(), Some(Duration::days(7)));
        assert_eq!(parse_age_window("30d").unwrap(), Some(Duration::days(30)));
        assert_eq!(parse_age_window("2W").unwrap(), Some(Duration::weeks(2)));
    }

    #[test]
    fn test_no_filter() {
        assert_eq!(parse_age_window("").unwrap(), None);
        assert_eq!(parse_age_window("all").unwrap(), None);
    }

    #[test]
    fn test_invalid_windows() {
        assert!(parse_age_window("0d").is_err());
        assert!(parse_age_window("7").is_err());
        assert!(parse_age_window("d7").is_err());
        assert!(parse_age_window("3m").is_err());
        assert!(parse_age_window("99999999999999w").is_err());
    }
}
