//! Deal 字段校验
//!
//! 批量上传与单条创建共用同一套规则，校验顺序：
//! 1. 必填字段
//! 2. 价格为合法数字
//! 3. 价格为正且原价 > 现价
//! 4. 过期日期可解析
//! 5. 图片地址（可选）
//! 6. 推广链接

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use strum::{AsRefStr, EnumIter};

use crate::errors::DealdropError;
use crate::storage::NewDeal;
use crate::utils::url_validator::{AFFILIATE_LINK_ERROR, is_valid_affiliate_link, is_valid_image_url};

/// 表格中可识别的 deal 字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum DealField {
    Title,
    Description,
    Category,
    CurrentPrice,
    RetailPrice,
    ExpiryDate,
    ImageUrl,
    AffiliateLink,
}

impl DealField {
    pub const REQUIRED: [DealField; 6] = [
        DealField::Title,
        DealField::Category,
        DealField::CurrentPrice,
        DealField::RetailPrice,
        DealField::ExpiryDate,
        DealField::AffiliateLink,
    ];
}

/// 未校验的 deal 字段（全部为原始字符串）
#[derive(Debug, Clone, Default)]
pub struct DealFieldsRaw {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub current_price: Option<String>,
    pub retail_price: Option<String>,
    pub expiry_date: Option<String>,
    pub image_url: Option<String>,
    pub affiliate_link: Option<String>,
}

impl DealFieldsRaw {
    /// 读取字段，空白视为缺失
    pub fn get(&self, field: DealField) -> Option<&str> {
        let value = match field {
            DealField::Title => &self.title,
            DealField::Description => &self.description,
            DealField::Category => &self.category,
            DealField::CurrentPrice => &self.current_price,
            DealField::RetailPrice => &self.retail_price,
            DealField::ExpiryDate => &self.expiry_date,
            DealField::ImageUrl => &self.image_url,
            DealField::AffiliateLink => &self.affiliate_link,
        };
        value.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn set(&mut self, field: DealField, value: String) {
        let slot = match field {
            DealField::Title => &mut self.title,
            DealField::Description => &mut self.description,
            DealField::Category => &mut self.category,
            DealField::CurrentPrice => &mut self.current_price,
            DealField::RetailPrice => &mut self.retail_price,
            DealField::ExpiryDate => &mut self.expiry_date,
            DealField::ImageUrl => &mut self.image_url,
            DealField::AffiliateLink => &mut self.affiliate_link,
        };
        *slot = Some(value);
    }

    pub fn is_blank(&self) -> bool {
        use strum::IntoEnumIterator;
        DealField::iter().all(|f| self.get(f).is_none())
    }
}

/// 字段校验失败原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DealFieldError {
    Missing(DealField),
    InvalidNumber(DealField),
    NonPositivePrice,
    PriceOrder,
    InvalidDate,
    InvalidImageUrl,
    InvalidAffiliateLink,
}

impl fmt::Display for DealFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(field) => write!(f, "Missing required field '{}'", field.as_ref()),
            Self::InvalidNumber(field) => write!(f, "Invalid number for '{}'", field.as_ref()),
            Self::NonPositivePrice => write!(f, "Prices must be greater than zero"),
            Self::PriceOrder => write!(f, "Retail price must be greater than current price"),
            Self::InvalidDate => write!(f, "Invalid date for 'expiry_date'"),
            Self::InvalidImageUrl => write!(f, "Invalid image URL"),
            Self::InvalidAffiliateLink => write!(f, "{}", AFFILIATE_LINK_ERROR),
        }
    }
}

impl From<DealFieldError> for DealdropError {
    fn from(err: DealFieldError) -> Self {
        match err {
            DealFieldError::InvalidAffiliateLink => {
                DealdropError::invalid_affiliate_link(AFFILIATE_LINK_ERROR)
            }
            DealFieldError::InvalidImageUrl => DealdropError::invalid_image(err.to_string()),
            DealFieldError::InvalidDate => DealdropError::date_parse(err.to_string()),
            other => DealdropError::validation(other.to_string()),
        }
    }
}

/// 单行错误，行号为表格行号（表头为第 1 行）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealRowError {
    pub row_num: usize,
    pub error: DealFieldError,
}

impl fmt::Display for DealRowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row_num, self.error)
    }
}

/// 解析价格，接受货币符号、空格以及逗号小数点
///
/// 同时出现 `,` 和 `.` 时，靠后的一个是小数点；只有逗号时逗号就是小数点。
pub fn parse_price(input: &str) -> Option<f64> {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    // 输入里除了数字和分隔符之外只允许货币符号/字母前缀
    if input.chars().any(|c| matches!(c, '/' | ':' | '%')) {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 解析过期日期
///
/// 支持 RFC3339、`YYYY-MM-DD`、`YYYY-MM-DD HH:MM:SS`、`DD/MM/YYYY`。
/// 只有日期时取当天 23:59:59 UTC。
pub fn parse_expiry_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    ["%Y-%m-%d", "%d/%m/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .map(end_of_day)
}

pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(time))
}

/// 折扣百分比：round((原价 - 现价) / 原价 * 100)
pub fn compute_discount(current_price: f64, retail_price: f64) -> i32 {
    if retail_price <= 0.0 {
        return 0;
    }
    let pct = ((retail_price - current_price) / retail_price * 100.0).round();
    pct.clamp(0.0, 100.0) as i32
}

/// 价格规则：都为正数，且原价严格大于现价
pub fn check_prices(current_price: f64, retail_price: f64) -> Result<(), DealFieldError> {
    if current_price <= 0.0 || retail_price <= 0.0 {
        return Err(DealFieldError::NonPositivePrice);
    }
    if retail_price <= current_price {
        return Err(DealFieldError::PriceOrder);
    }
    Ok(())
}

fn parse_price_field(raw: &DealFieldsRaw, field: DealField) -> Result<f64, DealFieldError> {
    let value = raw.get(field).ok_or(DealFieldError::Missing(field))?;
    parse_price(value).ok_or(DealFieldError::InvalidNumber(field))
}

/// 校验一组字段并转换为 `NewDeal`
pub fn validate_deal_fields(
    raw: &DealFieldsRaw,
    promoter_id: &str,
) -> Result<NewDeal, DealFieldError> {
    if let Some(missing) = DealField::REQUIRED.iter().find(|f| raw.get(**f).is_none()) {
        return Err(DealFieldError::Missing(*missing));
    }

    let current_price = parse_price_field(raw, DealField::CurrentPrice)?;
    let retail_price = parse_price_field(raw, DealField::RetailPrice)?;
    check_prices(current_price, retail_price)?;

    let expiry_date = raw
        .get(DealField::ExpiryDate)
        .and_then(parse_expiry_date)
        .ok_or(DealFieldError::InvalidDate)?;

    let image_url = raw.get(DealField::ImageUrl).map(str::to_string);
    if let Some(ref url) = image_url
        && !is_valid_image_url(url)
    {
        return Err(DealFieldError::InvalidImageUrl);
    }

    let affiliate_link = raw.get(DealField::AffiliateLink).unwrap_or_default();
    if !is_valid_affiliate_link(affiliate_link) {
        return Err(DealFieldError::InvalidAffiliateLink);
    }

    Ok(NewDeal {
        promoter_id: promoter_id.to_string(),
        title: raw.get(DealField::Title).unwrap_or_default().to_string(),
        description: raw.get(DealField::Description).map(str::to_string),
        category: raw.get(DealField::Category).unwrap_or_default().to_string(),
        current_price,
        retail_price,
        discount_percentage: compute_discount(current_price, retail_price),
        expiry_date,
        affiliate_link: affiliate_link.to_string(),
        image_url,
    })
}

/// 批量校验，返回 (通过的 deal, 行错误)
pub fn validate_deal_rows(
    rows: &[(usize, DealFieldsRaw)],
    promoter_id: &str,
) -> (Vec<NewDeal>, Vec<DealRowError>) {
    let mut valid = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();

    for (row_num, raw) in rows {
        match validate_deal_fields(raw, promoter_id) {
            Ok(deal) => valid.push(deal),
            Err(error) => errors.push(DealRowError {
                row_num: *row_num,
                error,
            }),
        }
    }

    (valid, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn valid_raw() -> DealFieldsRaw {
        DealFieldsRaw {
            title: Some("Fone Bluetooth".to_string()),
            description: Some("Cancelamento de ruído".to_string()),
            category: Some("electronics".to_string()),
            current_price: Some("R$ 79,90".to_string()),
            retail_price: Some("149.90".to_string()),
            expiry_date: Some("2030-12-31".to_string()),
            image_url: Some("https://cdn.shop.com/fone.jpg".to_string()),
            affiliate_link: Some("https://shop.com/p/123?aff=me".to_string()),
        }
    }

    fn row_message(row_num: usize, raw: DealFieldsRaw) -> String {
        let (_, errors) = validate_deal_rows(&[(row_num, raw)], "promoter-1");
        errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no error".to_string())
    }

    #[test]
    fn test_valid_row_passes() {
        let (valid, errors) = validate_deal_rows(&[(2, valid_raw())], "promoter-1");
        assert!(errors.is_empty());
        assert_eq!(valid.len(), 1);

        let deal = &valid[0];
        assert_eq!(deal.promoter_id, "promoter-1");
        assert_eq!(deal.current_price, 79.90);
        assert_eq!(deal.retail_price, 149.90);
        assert_eq!(deal.discount_percentage, 47);
        assert_eq!(deal.expiry_date.year(), 2030);
        assert_eq!(deal.expiry_date.hour(), 23);
    }

    #[test]
    fn test_missing_title() {
        let mut raw = valid_raw();
        raw.title = None;
        assert_eq!(row_message(5, raw), "Row 5: Missing required field 'title'");

        let mut raw = valid_raw();
        raw.affiliate_link = Some("   ".to_string());
        assert_eq!(
            row_message(3, raw),
            "Row 3: Missing required field 'affiliate_link'"
        );
    }

    #[test]
    fn test_retail_not_greater_than_current() {
        let mut raw = valid_raw();
        raw.current_price = Some("100".to_string());
        raw.retail_price = Some("100".to_string());
        assert_eq!(
            row_message(2, raw),
            "Row 2: Retail price must be greater than current price"
        );

        let mut raw = valid_raw();
        raw.current_price = Some("0".to_string());
        assert_eq!(row_message(2, raw), "Row 2: Prices must be greater than zero");
    }

    #[test]
    fn test_invalid_number_and_date() {
        let mut raw = valid_raw();
        raw.retail_price = Some("abc".to_string());
        assert_eq!(row_message(4, raw), "Row 4: Invalid number for 'retail_price'");

        let mut raw = valid_raw();
        raw.expiry_date = Some("next week".to_string());
        assert_eq!(row_message(4, raw), "Row 4: Invalid date for 'expiry_date'");
    }

    #[test]
    fn test_image_and_link_order() {
        let mut raw = valid_raw();
        raw.image_url = Some("http://cdn.shop.com/a.png".to_string());
        raw.affiliate_link = Some("javascript:alert(1)".to_string());
        assert_eq!(row_message(7, raw), "Row 7: Invalid image URL");

        let mut raw = valid_raw();
        raw.image_url = None;
        raw.affiliate_link = Some("javascript:alert(1)".to_string());
        assert_eq!(row_message(7, raw), "Row 7: Invalid or unsafe affiliate link");
    }

    #[test]
    fn test_parse_price_formats() {
        assert_eq!(parse_price("19.99"), Some(19.99));
        assert_eq!(parse_price("19,99"), Some(19.99));
        assert_eq!(parse_price("R$ 1.299,90"), Some(1299.90));
        assert_eq!(parse_price("$1,299.90"), Some(1299.90));
        assert_eq!(parse_price("€ 5"), Some(5.0));
        assert_eq!(parse_price("free"), None);
        assert_eq!(parse_price("12/10"), None);
    }

    #[test]
    fn test_parse_expiry_formats() {
        let d = parse_expiry_date("31/01/2031").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2031, 1, 31));

        let d = parse_expiry_date("2031-01-31T10:00:00Z").unwrap();
        assert_eq!(d.hour(), 10);

        let d = parse_expiry_date("2031-01-31 08:30:00").unwrap();
        assert_eq!(d.minute(), 30);

        assert!(parse_expiry_date("31.01.2031").is_none());
        assert!(parse_expiry_date("").is_none());
    }

    #[test]
    fn test_compute_discount() {
        assert_eq!(compute_discount(50.0, 100.0), 50);
        assert_eq!(compute_discount(66.6, 100.0), 33);
        assert_eq!(compute_discount(10.0, 0.0), 0);
    }

    #[test]
    fn test_blank_row() {
        assert!(DealFieldsRaw::default().is_blank());
        let raw = DealFieldsRaw {
            title: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(raw.is_blank());
        assert!(!valid_raw().is_blank());
    }
}
