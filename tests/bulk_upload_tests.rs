//! 批量上传集成测试

use std::sync::{Arc, Once};

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use dealdrop::config::init_config;
use dealdrop::errors::DealdropError;
use dealdrop::services::{BulkUploadService, DealListQuery, DealService};
use dealdrop::storage::{NewProfile, SeaOrmStorage, UserType};

static INIT: Once = Once::new();

fn init_static_config() {
    INIT.call_once(|| {
        init_config();
    });
}

async fn create_temp_storage() -> (Arc<SeaOrmStorage>, TempDir) {
    init_static_config();
    let td = TempDir::new().unwrap();
    let p = td.path().join("bulk_upload_test.db");
    let u = format!("sqlite://{}?mode=rwc", p.display());
    let s = SeaOrmStorage::new(&u, "sqlite").await.unwrap();
    (Arc::new(s), td)
}

async fn create_user(storage: &SeaOrmStorage, id: &str, user_type: UserType) {
    storage
        .insert_profile(&NewProfile {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            username: id.replace('-', "_"),
            password_hash: "x".to_string(),
            user_type,
        })
        .await
        .unwrap();
}

const CSV_MIXED: &str = "\
Title,Category,Current Price,Retail Price,Expiry Date,Affiliate Link
Robot vacuum,home,199.90,399.90,2099-06-30,https://shop.example.com/vac?ref=a
,home,10,20,2099-06-30,https://shop.example.com/x
Coffee grinder,kitchen,50,50,2099-06-30,https://shop.example.com/grinder
Standing desk,office,250,400,2099-06-30,javascript:alert(1)
";

#[tokio::test]
async fn test_csv_upload_reports_row_errors() {
    let (storage, _td) = create_temp_storage().await;
    create_user(&storage, "promoter-csv", UserType::Promoter).await;
    let service = BulkUploadService::new(storage.clone());

    let report = service
        .upload("promoter-csv", Some("deals.csv"), CSV_MIXED.as_bytes())
        .await
        .unwrap();

    assert_eq!(report.total_rows, 4);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.failed, 3);
    assert_eq!(
        report.errors,
        vec![
            "Row 3: Missing required field 'title'".to_string(),
            "Row 4: Retail price must be greater than current price".to_string(),
            "Row 5: Invalid or unsafe affiliate link".to_string(),
        ]
    );

    let page = DealService::new(storage)
        .list_deals(DealListQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.deals[0].title, "Robot vacuum");
    assert_eq!(page.deals[0].discount_percentage, 50);
}

#[tokio::test]
async fn test_localized_headers() {
    let (storage, _td) = create_temp_storage().await;
    create_user(&storage, "promoter-pt", UserType::Promoter).await;
    let service = BulkUploadService::new(storage);

    let csv = "\
Título;Categoria;Preço Atual;Preço Original;Validade;Link de Afiliado
Fone Bluetooth;eletrônicos;R$ 89,90;R$ 179,90;31/12/2099;https://loja.example.com/fone
";
    // 分号分隔不被识别为多列时整行只有一个单元格，应报缺少列
    let err = service
        .upload("promoter-pt", Some("ofertas.csv"), csv.as_bytes())
        .await
        .unwrap_err();
    assert!(matches!(err, DealdropError::SpreadsheetParse(_)));

    let csv = "\
Título,Categoria,Preço Atual,Preço Original,Validade,Link de Afiliado
Fone Bluetooth,eletrônicos,\"R$ 89,90\",\"R$ 179,90\",31/12/2099,https://loja.example.com/fone
";
    let report = service
        .upload("promoter-pt", Some("ofertas.csv"), csv.as_bytes())
        .await
        .unwrap();
    assert_eq!(report.inserted, 1, "errors: {:?}", report.errors);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn test_blank_rows_skipped() {
    let (storage, _td) = create_temp_storage().await;
    create_user(&storage, "promoter-blank", UserType::Promoter).await;
    let service = BulkUploadService::new(storage);

    let csv = "\
title,category,price,msrp,expires,link
Kettle,kitchen,20,40,2099-01-01,https://shop.example.com/kettle
,,,,,
Toaster,kitchen,25,50,2099-01-01,https://shop.example.com/toaster
";
    let report = service
        .upload("promoter-blank", Some("deals.csv"), csv.as_bytes())
        .await
        .unwrap();
    assert_eq!(report.total_rows, 2);
    assert_eq!(report.inserted, 2);
}

#[tokio::test]
async fn test_upload_requires_promoter() {
    let (storage, _td) = create_temp_storage().await;
    create_user(&storage, "shopper-bulk", UserType::Shopper).await;
    let service = BulkUploadService::new(storage);

    let err = service
        .upload("shopper-bulk", Some("deals.csv"), CSV_MIXED.as_bytes())
        .await
        .unwrap_err();
    assert!(matches!(err, DealdropError::Forbidden(_)));

    let err = service
        .upload("nobody", Some("deals.csv"), CSV_MIXED.as_bytes())
        .await
        .unwrap_err();
    assert!(matches!(err, DealdropError::Unauthorized(_)));
}

#[tokio::test]
async fn test_all_invalid_rows_insert_nothing() {
    let (storage, _td) = create_temp_storage().await;
    create_user(&storage, "promoter-bad", UserType::Promoter).await;
    let service = BulkUploadService::new(storage);

    let csv = "\
title,category,current_price,retail_price,expiry_date,affiliate_link
A,x,abc,10,2099-01-01,https://shop.example.com/a
B,x,5,10,not-a-date,https://shop.example.com/b
";
    let report = service
        .upload("promoter-bad", Some("deals.csv"), csv.as_bytes())
        .await
        .unwrap();
    assert_eq!(report.inserted, 0);
    assert_eq!(
        report.errors,
        vec![
            "Row 2: Invalid number for 'current_price'".to_string(),
            "Row 3: Invalid date for 'expiry_date'".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_xlsx_upload() {
    let (storage, _td) = create_temp_storage().await;
    create_user(&storage, "promoter-xlsx", UserType::Promoter).await;
    let service = BulkUploadService::new(storage.clone());

    let data = include_bytes!("fixtures/deals.xlsx");
    let report = service
        .upload("promoter-xlsx", Some("deals.xlsx"), data)
        .await
        .unwrap();

    assert_eq!(report.total_rows, 3);
    assert_eq!(report.inserted, 2, "errors: {:?}", report.errors);
    assert_eq!(report.errors, vec!["Row 3: Missing required field 'title'".to_string()]);

    let page = DealService::new(storage)
        .list_deals(DealListQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);

    // 日期格式的单元格：到期时间为当天 23:59:59
    let fryer = page.deals.iter().find(|d| d.title == "Air fryer").unwrap();
    assert_eq!(
        fryer.expiry_date,
        Utc.with_ymd_and_hms(2099, 6, 30, 23, 59, 59).unwrap()
    );
    assert_eq!(fryer.current_price, 59.9);

    let blender = page.deals.iter().find(|d| d.title == "Blender").unwrap();
    assert_eq!(
        blender.expiry_date,
        Utc.with_ymd_and_hms(2099, 7, 15, 23, 59, 59).unwrap()
    );
    assert_eq!(blender.discount_percentage, 50);
}

#[tokio::test]
async fn test_large_csv_upload() {
    let (storage, _td) = create_temp_storage().await;
    create_user(&storage, "promoter-big", UserType::Promoter).await;
    let service = BulkUploadService::new(storage.clone());

    let mut csv =
        String::from("title,category,current_price,retail_price,expiry_date,affiliate_link\n");
    for i in 0..6000 {
        csv.push_str(&format!(
            "Item {i},home,10,20,2099-01-01,https://shop.example.com/item/{i}\n"
        ));
    }

    let report = service
        .upload("promoter-big", Some("deals.csv"), csv.as_bytes())
        .await
        .unwrap();
    assert_eq!(report.total_rows, 6000);
    assert_eq!(report.inserted, 6000);
    assert!(report.errors.is_empty());

    let page = DealService::new(storage)
        .list_deals(DealListQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 6000);
    assert_eq!(page.active_total, 6000);
}
