//! 表格批量上传
//!
//! 支持 `.xlsx` / `.xls` / `.ods`（calamine）与 `.csv`（csv）。第一行为表头，
//! 表头经多语言别名表映射到标准字段，未知列忽略。

use std::io::Cursor;
use std::sync::Arc;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::NaiveTime;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::import_validation::{DealField, DealFieldsRaw, validate_deal_rows};
use super::profile_service::require_promoter;
use crate::config::get_config;
use crate::errors::{DealdropError, Result};
use crate::storage::SeaOrmStorage;

/// 表头别名（已规范化：小写、去重音、非字母数字折叠为 `_`）
const HEADER_ALIASES: &[(&str, DealField)] = &[
    // English
    ("title", DealField::Title),
    ("name", DealField::Title),
    ("product", DealField::Title),
    ("product_name", DealField::Title),
    ("description", DealField::Description),
    ("details", DealField::Description),
    ("category", DealField::Category),
    ("current_price", DealField::CurrentPrice),
    ("price", DealField::CurrentPrice),
    ("sale_price", DealField::CurrentPrice),
    ("deal_price", DealField::CurrentPrice),
    ("retail_price", DealField::RetailPrice),
    ("original_price", DealField::RetailPrice),
    ("list_price", DealField::RetailPrice),
    ("msrp", DealField::RetailPrice),
    ("expiry_date", DealField::ExpiryDate),
    ("expiry", DealField::ExpiryDate),
    ("expires", DealField::ExpiryDate),
    ("expires_at", DealField::ExpiryDate),
    ("expiration_date", DealField::ExpiryDate),
    ("image_url", DealField::ImageUrl),
    ("image", DealField::ImageUrl),
    ("photo", DealField::ImageUrl),
    ("affiliate_link", DealField::AffiliateLink),
    ("affiliate_url", DealField::AffiliateLink),
    ("link", DealField::AffiliateLink),
    ("url", DealField::AffiliateLink),
    ("product_url", DealField::AffiliateLink),
    // Português
    ("titulo", DealField::Title),
    ("nome", DealField::Title),
    ("produto", DealField::Title),
    ("descricao", DealField::Description),
    ("detalhes", DealField::Description),
    ("categoria", DealField::Category),
    ("preco", DealField::CurrentPrice),
    ("preco_atual", DealField::CurrentPrice),
    ("preco_promocional", DealField::CurrentPrice),
    ("preco_original", DealField::RetailPrice),
    ("preco_de", DealField::RetailPrice),
    ("validade", DealField::ExpiryDate),
    ("data_de_validade", DealField::ExpiryDate),
    ("data_expiracao", DealField::ExpiryDate),
    ("data_de_expiracao", DealField::ExpiryDate),
    ("imagem", DealField::ImageUrl),
    ("url_da_imagem", DealField::ImageUrl),
    ("link_de_afiliado", DealField::AffiliateLink),
    ("link_afiliado", DealField::AffiliateLink),
    // Español
    ("nombre", DealField::Title),
    ("producto", DealField::Title),
    ("descripcion", DealField::Description),
    ("precio", DealField::CurrentPrice),
    ("precio_actual", DealField::CurrentPrice),
    ("precio_oferta", DealField::CurrentPrice),
    ("precio_original", DealField::RetailPrice),
    ("precio_regular", DealField::RetailPrice),
    ("vencimiento", DealField::ExpiryDate),
    ("fecha_de_vencimiento", DealField::ExpiryDate),
    ("fecha_de_expiracion", DealField::ExpiryDate),
    ("imagen", DealField::ImageUrl),
    ("url_de_imagen", DealField::ImageUrl),
    ("enlace", DealField::AffiliateLink),
    ("enlace_de_afiliado", DealField::AffiliateLink),
];

/// 上传结果
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkUploadReport {
    pub total_rows: usize,
    pub inserted: u64,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// 上传文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Workbook,
}

impl SheetFormat {
    /// 优先看扩展名，其次看 zip / OLE 魔数
    pub fn detect(filename: Option<&str>, data: &[u8]) -> Self {
        if let Some(name) = filename {
            let name = name.to_lowercase();
            if name.ends_with(".csv") {
                return SheetFormat::Csv;
            }
            if [".xlsx", ".xlsm", ".xls", ".ods"]
                .iter()
                .any(|ext| name.ends_with(ext))
            {
                return SheetFormat::Workbook;
            }
        }

        if data.starts_with(b"PK\x03\x04") || data.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]) {
            SheetFormat::Workbook
        } else {
            SheetFormat::Csv
        }
    }
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

/// 表头规范化：小写、去重音，连续的非字母数字字符折叠为单个 `_`
pub fn normalize_header(header: &str) -> String {
    let mut out = String::with_capacity(header.len());
    let mut pending_sep = false;

    for c in header.trim().to_lowercase().chars().map(fold_accent) {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}

pub fn resolve_header(header: &str) -> Option<DealField> {
    let normalized = normalize_header(header);
    HEADER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, field)| *field)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        // 纯日期单元格（时间部分为 0）按日期输出，到期时间取当天结束
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|naive| {
                if naive.time() == NaiveTime::MIN {
                    naive.format("%Y-%m-%d").to_string()
                } else {
                    naive.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            })
            .unwrap_or_default(),
    }
}

/// 带行号（1-based）的一行；`None` 表示该行无法解析
type NumberedRow = (usize, Option<Vec<String>>);

/// 读取工作簿第一个工作表的所有行
fn read_workbook(data: &[u8]) -> Result<Vec<NumberedRow>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data.to_vec()))
        .map_err(|e| DealdropError::spreadsheet_parse(format!("Cannot open workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DealdropError::spreadsheet_parse("Workbook has no sheets"))?
        .map_err(|e| DealdropError::spreadsheet_parse(format!("Cannot read sheet: {}", e)))?;

    // Range 从第一个非空单元格开始
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);

    Ok(range
        .rows()
        .enumerate()
        .map(|(idx, row)| {
            let cells = row.iter().map(cell_to_string).collect();
            (first_row + idx + 1, Some(cells))
        })
        .collect())
}

fn read_csv(data: &[u8]) -> Vec<NumberedRow> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(Cursor::new(data));

    let mut rows = Vec::new();
    let mut last_line = 0usize;
    for record in reader.records() {
        match record {
            Ok(r) => {
                last_line = r.position().map(|p| p.line() as usize).unwrap_or(last_line + 1);
                rows.push((last_line, Some(r.iter().map(str::to_string).collect())));
            }
            Err(e) => {
                last_line = e.position().map(|p| p.line() as usize).unwrap_or(last_line + 1);
                warn!("CSV parse error at line {}: {}", last_line, e);
                rows.push((last_line, None));
            }
        }
    }
    rows
}

/// 表头 + 数据行 → (行号, 原始字段)
///
/// 空行跳过；解析失败的行号单独返回。
fn map_rows(rows: Vec<NumberedRow>) -> Result<(Vec<(usize, DealFieldsRaw)>, Vec<usize>)> {
    let mut iter = rows.into_iter();
    let headers = iter
        .next()
        .and_then(|(_, cells)| cells)
        .ok_or_else(|| DealdropError::spreadsheet_parse("The file has no header row"))?;

    let columns: Vec<Option<DealField>> = headers.iter().map(|h| resolve_header(h)).collect();
    if columns.iter().all(Option::is_none) {
        return Err(DealdropError::spreadsheet_parse(
            "No recognizable columns in the header row",
        ));
    }
    debug!("Bulk upload columns: {:?}", columns);

    let mut parsed = Vec::new();
    let mut unreadable = Vec::new();

    for (row_num, row) in iter {
        let Some(cells) = row else {
            unreadable.push(row_num);
            continue;
        };

        let mut raw = DealFieldsRaw::default();
        for (cell, column) in cells.into_iter().zip(columns.iter()) {
            if let Some(field) = column {
                raw.set(*field, cell);
            }
        }

        if raw.is_blank() {
            continue;
        }
        parsed.push((row_num, raw));
    }

    Ok((parsed, unreadable))
}

/// 解析上传文件为带行号的原始字段
pub fn parse_sheet(
    filename: Option<&str>,
    data: &[u8],
) -> Result<(Vec<(usize, DealFieldsRaw)>, Vec<usize>)> {
    let rows = match SheetFormat::detect(filename, data) {
        SheetFormat::Csv => read_csv(data),
        SheetFormat::Workbook => read_workbook(data)?,
    };
    map_rows(rows)
}

pub struct BulkUploadService {
    storage: Arc<SeaOrmStorage>,
}

impl BulkUploadService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 校验并批量写入；合法行在一个事务内插入
    pub async fn upload(
        &self,
        user_id: &str,
        filename: Option<&str>,
        data: &[u8],
    ) -> Result<BulkUploadReport> {
        let max_bytes = get_config().media.max_upload_bytes;
        if data.len() > max_bytes {
            return Err(DealdropError::file_too_large(format!(
                "File size exceeds maximum {} MB",
                max_bytes / 1024 / 1024
            )));
        }

        let promoter = require_promoter(&self.storage, user_id).await?;
        let (rows, unreadable) = parse_sheet(filename, data)?;

        let (valid, row_errors) = validate_deal_rows(&rows, &promoter.id);

        let mut errors: Vec<(usize, String)> = row_errors
            .iter()
            .map(|e| (e.row_num, e.to_string()))
            .collect();
        errors.extend(
            unreadable
                .iter()
                .map(|row| (*row, format!("Row {}: Could not read row", row))),
        );
        errors.sort_by_key(|(row, _)| *row);

        let inserted = self.storage.bulk_insert_deals(&valid).await?;

        let report = BulkUploadReport {
            total_rows: rows.len() + unreadable.len(),
            inserted,
            failed: errors.len(),
            errors: errors.into_iter().map(|(_, msg)| msg).collect(),
        };

        info!(
            "Bulk upload by {}: total={}, inserted={}, failed={}",
            promoter.id, report.total_rows, report.inserted, report.failed
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Preço Original "), "preco_original");
        assert_eq!(normalize_header("Fecha de Vencimiento"), "fecha_de_vencimiento");
        assert_eq!(normalize_header("IMAGE-URL"), "image_url");
        assert_eq!(normalize_header("Descrição"), "descricao");
    }

    #[test]
    fn test_resolve_header_aliases() {
        assert_eq!(resolve_header("Título"), Some(DealField::Title));
        assert_eq!(resolve_header("Precio Actual"), Some(DealField::CurrentPrice));
        assert_eq!(resolve_header("Link de Afiliado"), Some(DealField::AffiliateLink));
        assert_eq!(resolve_header("retail price"), Some(DealField::RetailPrice));
        assert_eq!(resolve_header("internal notes"), None);
    }

    #[test]
    fn test_workbook_date_cells() {
        use calamine::{ExcelDateTime, ExcelDateTimeType};

        // 72866 = 2099-06-30
        let date_only =
            Data::DateTime(ExcelDateTime::new(72866.0, ExcelDateTimeType::DateTime, false));
        assert_eq!(cell_to_string(&date_only), "2099-06-30");

        let with_time =
            Data::DateTime(ExcelDateTime::new(72866.75, ExcelDateTimeType::DateTime, false));
        assert_eq!(cell_to_string(&with_time), "2099-06-30 18:00:00");
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(SheetFormat::detect(Some("deals.CSV"), b"PK"), SheetFormat::Csv);
        assert_eq!(SheetFormat::detect(Some("deals.xlsx"), b""), SheetFormat::Workbook);
        assert_eq!(SheetFormat::detect(None, b"PK\x03\x04rest"), SheetFormat::Workbook);
        assert_eq!(SheetFormat::detect(None, b"title,category"), SheetFormat::Csv);
    }

    #[test]
    fn test_parse_csv_rows() {
        let csv = "Título,Categoria,Preço,Preço Original,Validade,Link,Notes\n\
                   Fone,electronics,79.90,149.90,2030-01-01,https://shop.com/a,x\n\
                   ,,,,,,\n\
                   Mouse,electronics,10,20,2030-01-01,https://shop.com/b,y\n";
        let (rows, unreadable) = parse_sheet(Some("deals.csv"), csv.as_bytes()).unwrap();

        assert!(unreadable.is_empty());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, 2);
        assert_eq!(rows[1].0, 4);
        assert_eq!(rows[0].1.get(DealField::Title), Some("Fone"));
        assert_eq!(rows[1].1.get(DealField::RetailPrice), Some("20"));
        assert_eq!(rows[1].1.get(DealField::Description), None);
    }

    #[test]
    fn test_parse_rejects_unknown_headers() {
        let csv = "foo,bar\n1,2\n";
        let err = parse_sheet(Some("x.csv"), csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DealdropError::SpreadsheetParse(_)));

        let err = parse_sheet(Some("x.csv"), b"").unwrap_err();
        assert!(matches!(err, DealdropError::SpreadsheetParse(_)));
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::Float(20.0)), "20");
        assert_eq!(cell_to_string(&Data::Float(79.9)), "79.9");
        assert_eq!(cell_to_string(&Data::Int(5)), "5");
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::String("abc".into())), "abc");
    }
}
