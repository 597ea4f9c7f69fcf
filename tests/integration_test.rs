//! End-to-end pipeline tests: ingest a record stream, run the matcher and
//! tax classifier, and verify everything persisted.

use chrono::{NaiveDate, NaiveDateTime};
use fifotax::config::Config;
use fifotax::datasource::MockRecordSource;
use fifotax::db::{init_db, Repository};
use fifotax::domain::{
    AssetCategory, Conid, Decimal, OpenCloseFlag, Record, Side, TaxBucket, TransactionId,
};
use fifotax::engine::AuditField;
use fifotax::orchestration::{Ingestor, TaxRunner};
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 6, day)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn stock_record(
    txn: i64,
    conid: i64,
    flag: OpenCloseFlag,
    quantity: &str,
    trade_amount: &str,
    executed_at: NaiveDateTime,
) -> Record {
    Record {
        transaction_id: TransactionId::new(txn),
        ledger_event_id: txn,
        conid: Conid::new(conid),
        symbol: "XYZ".to_string(),
        description: "XYZ CORP".to_string(),
        side: if quantity.starts_with('-') {
            Side::Sell
        } else {
            Side::Buy
        },
        quantity: d(quantity),
        asset_category: AssetCategory::Stock,
        strike: None,
        expiry: None,
        executed_at,
        trade_date: executed_at.date(),
        open_close: flag,
        trade_amount: d(trade_amount),
        ledger_amount: d(trade_amount),
        currency: "USD".to_string(),
        broker_realized: None,
        fx_rate_to_base: d("1"),
        action: None,
        level_of_detail: "BaseCurrency".to_string(),
    }
}

fn test_config(db_path: &str) -> Config {
    Config {
        database_path: db_path.to_string(),
        records_path: "/unused/records.json".to_string(),
        base_currency_level: "BaseCurrency".to_string(),
        max_records: None,
    }
}

async fn setup(records: Vec<Record>) -> (Arc<Repository>, Config, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let source = Arc::new(MockRecordSource::new().with_records(records));
    let ingestor = Ingestor::new(source, repo.clone());
    ingestor.ingest().await.expect("ingestion failed");

    (repo, test_config(&db_path), temp_dir)
}

#[tokio::test]
async fn test_open_and_full_close_round_trip() {
    let mut close = stock_record(2, 100, OpenCloseFlag::Close, "-10", "520", at(2, 10, 0));
    close.broker_realized = Some(d("20"));

    let (repo, config, _temp) = setup(vec![
        stock_record(1, 100, OpenCloseFlag::Open, "10", "-500", at(1, 10, 0)),
        close,
    ])
    .await;

    let summary = TaxRunner::new(repo.clone(), config).run().await.unwrap();
    assert_eq!(summary.records_processed, 2);
    assert_eq!(summary.lots_opened, 1);
    assert_eq!(summary.positions_closed, 1);
    assert_eq!(summary.statements_inserted, 2);

    // Lot fully consumed: nothing left in the open-position table.
    assert!(repo.load_open_lots().await.unwrap().is_empty());

    let closed = repo.load_closed_positions().await.unwrap();
    assert_eq!(closed.len(), 1);
    let position = &closed[0];
    assert_eq!(position.transaction_id, TransactionId::new(2));
    assert_eq!(position.open_transaction_id, TransactionId::new(1));
    assert_eq!(position.realized, d("20"));
    assert_eq!(position.days_in_trade, 1);

    // Opens book the trade amount; stock closes book the broker result.
    let statements = repo.load_tax_statements(2023).await.unwrap();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].fifo_result, d("-500"));
    assert_eq!(statements[1].fifo_result, d("20"));

    let gain = repo
        .get_tax_bucket_amount(TransactionId::new(2), TaxBucket::StockGain)
        .await
        .unwrap();
    assert_eq!(gain, Some(d("20")));

    // Audit narratives were appended to both records.
    let op_info = repo
        .get_audit_note(TransactionId::new(1), AuditField::OpInfo)
        .await
        .unwrap()
        .unwrap();
    assert!(op_info.starts_with("Open-Trade XYZ CORP"));

    let tx_info = repo
        .get_audit_note(TransactionId::new(2), AuditField::TxInfo)
        .await
        .unwrap()
        .unwrap();
    assert!(tx_info.contains("FIFO result 20"));
}

#[tokio::test]
async fn test_partial_close_persists_reduced_lot() {
    let (repo, config, _temp) = setup(vec![
        stock_record(1, 100, OpenCloseFlag::Open, "10", "-500", at(1, 10, 0)),
        stock_record(2, 100, OpenCloseFlag::Close, "-4", "220", at(2, 10, 0)),
    ])
    .await;

    TaxRunner::new(repo.clone(), config).run().await.unwrap();

    let lots = repo.load_open_lots().await.unwrap();
    assert_eq!(lots.len(), 1);
    assert_eq!(lots[0].transaction_id, TransactionId::new(1));
    assert_eq!(lots[0].quantity, d("6"));
    assert_eq!(lots[0].amount, d("-280"));
}

#[tokio::test]
async fn test_statement_books_trade_amount_lot_books_ledger_amount() {
    // Ledger amount differs from trade amount (fees settle in the ledger):
    // the tax statement carries the trade amount, the lot the ledger amount.
    let mut open = stock_record(1, 100, OpenCloseFlag::Open, "10", "-500", at(1, 10, 0));
    open.ledger_amount = d("-502.5");

    let (repo, config, _temp) = setup(vec![open]).await;
    TaxRunner::new(repo.clone(), config).run().await.unwrap();

    let statements = repo.load_tax_statements(2023).await.unwrap();
    assert_eq!(statements[0].base_amount, d("-500"));
    assert_eq!(statements[0].fifo_result, d("-500"));

    let lots = repo.load_open_lots().await.unwrap();
    assert_eq!(lots[0].amount, d("-502.5"));
}

#[tokio::test]
async fn test_non_base_currency_rows_are_skipped() {
    let mut foreign = stock_record(2, 100, OpenCloseFlag::Open, "10", "-450", at(1, 11, 0));
    foreign.level_of_detail = "Currency".to_string();

    let (repo, config, _temp) = setup(vec![
        stock_record(1, 100, OpenCloseFlag::Open, "10", "-500", at(1, 10, 0)),
        foreign,
    ])
    .await;

    let summary = TaxRunner::new(repo.clone(), config).run().await.unwrap();
    assert_eq!(summary.records_processed, 1);
    assert_eq!(summary.skipped_level_of_detail, 1);

    // The skipped row got no statement and opened no lot.
    assert_eq!(repo.load_tax_statements(2023).await.unwrap().len(), 1);
    assert_eq!(repo.load_open_lots().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_max_records_window_stops_run() {
    let (repo, mut config, _temp) = setup(vec![
        stock_record(1, 100, OpenCloseFlag::Open, "10", "-500", at(1, 10, 0)),
        stock_record(2, 200, OpenCloseFlag::Open, "5", "-250", at(1, 11, 0)),
        stock_record(3, 300, OpenCloseFlag::Open, "5", "-250", at(1, 12, 0)),
    ])
    .await;
    config.max_records = Some(2);

    let summary = TaxRunner::new(repo.clone(), config).run().await.unwrap();
    assert_eq!(summary.records_processed, 2);
    assert_eq!(repo.load_open_lots().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_flag_aborts_without_flushing_lots() {
    let mut bad = stock_record(2, 100, OpenCloseFlag::Open, "5", "-250", at(1, 11, 0));
    bad.open_close = OpenCloseFlag::Unknown("Garbage".to_string());

    let (repo, config, _temp) = setup(vec![
        stock_record(1, 100, OpenCloseFlag::Open, "10", "-500", at(1, 10, 0)),
        bad,
    ])
    .await;

    let err = TaxRunner::new(repo.clone(), config).run().await;
    assert!(err.is_err());

    // The run aborted before the journal flush: no lot reached the table.
    assert!(repo.load_open_lots().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_close_without_lot_is_recoverable() {
    let (repo, config, _temp) = setup(vec![stock_record(
        1,
        100,
        OpenCloseFlag::Close,
        "-10",
        "520",
        at(1, 10, 0),
    )])
    .await;

    let summary = TaxRunner::new(repo.clone(), config).run().await.unwrap();
    assert_eq!(summary.closes_skipped, 1);
    assert_eq!(summary.positions_closed, 0);

    // The statement row is still written for the skipped close.
    assert_eq!(summary.statements_inserted, 1);
    assert!(repo.load_closed_positions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_run_closes_against_lots_seeded_from_table() {
    use fifotax::domain::OpenLot;
    use fifotax::engine::LotMutation;

    // Only the close arrives in this batch; the lot is left over from an
    // earlier run and lives in the open-position table.
    let (repo, config, _temp) = setup(vec![stock_record(
        2,
        100,
        OpenCloseFlag::Close,
        "-10",
        "520",
        at(2, 10, 0),
    )])
    .await;

    let seeded = OpenLot {
        conid: Conid::new(100),
        symbol: "XYZ".to_string(),
        description: "XYZ CORP".to_string(),
        quantity: d("10"),
        amount: d("-500"),
        transaction_id: TransactionId::new(1),
        asset_category: AssetCategory::Stock,
        side: Side::Buy,
        trade_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
        days_to_expiration: 0,
        combo: String::new(),
    };
    repo.apply_lot_mutations(&[LotMutation::Insert(seeded)])
        .await
        .unwrap();

    let summary = TaxRunner::new(repo.clone(), config).run().await.unwrap();
    assert_eq!(summary.positions_closed, 1);
    assert_eq!(summary.closes_skipped, 0);

    let closed = repo.load_closed_positions().await.unwrap();
    assert_eq!(closed[0].open_transaction_id, TransactionId::new(1));
    assert_eq!(closed[0].realized, d("20"));
    assert!(repo.load_open_lots().await.unwrap().is_empty());
}
