// ==========================================
// 摄入引擎集成测试
// ==========================================
// 覆盖: 文件摄入端到端 / 补卡幂等重算 / 指纹去重 / 跳过统计 / 考勤机载荷
// ==========================================

mod test_helpers;

use attendance_payroll::config::ConfigManager;
use attendance_payroll::domain::types::{SkipReason, ViolationType};
use attendance_payroll::importer::{IngestError, IngestService, TimeClockPayload};
use attendance_payroll::repository::{DailySalaryRepository, PayrollRepositoryImpl};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use test_helpers::*;

fn build_service(db_path: &str) -> (Arc<PayrollRepositoryImpl>, IngestService) {
    let repo = Arc::new(PayrollRepositoryImpl::new(db_path).unwrap());
    let config = Arc::new(ConfigManager::new(db_path).unwrap());
    let service = IngestService::new(
        repo.clone(),
        repo.clone(),
        repo.clone(),
        repo.clone(),
        repo.clone(),
        config,
    );
    (repo, service)
}

/// 标准场景种子: GURU 角色,槽位1 基数 1,000,000
/// 规则: 迟到 {10分→5%, 30分→10%} 槽位1;缺下班卡 10% 槽位1
fn seed_standard_scenario(db_path: &str) {
    let conn = Connection::open(db_path).unwrap();
    seed_employee(&conn, "emp-1", "1001", "Andi", "GURU").unwrap();
    seed_components(&conn, "GURU", &[(1, 1_000_000)]).unwrap();
    seed_rule(&conn, "r-late-10", "GURU", "LATE_ARRIVAL", 10, 1, 5).unwrap();
    seed_rule(&conn, "r-late-30", "GURU", "LATE_ARRIVAL", 30, 1, 10).unwrap();
    seed_rule(&conn, "r-mco", "GURU", "MISSING_CHECK_OUT", 0, 1, 10).unwrap();
    seed_schedule(&conn, "07:30:00", "16:00:00").unwrap();
}

fn write_csv(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn march_4() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

#[tokio::test]
async fn test_csv_ingest_end_to_end() {
    let (_db_file, db_path) = create_test_db().unwrap();
    seed_standard_scenario(&db_path);
    let (repo, service) = build_service(&db_path);

    // 迟到 25 分钟 + 缺下班卡
    let csv = write_csv("nip,tanggal,jam_masuk,jam_pulang\n1001,2024-03-04,07:55:00,\n");
    let result = service.ingest_file(csv.path()).await.unwrap();

    assert_eq!(result.processed, 1);
    assert_eq!(result.skipped, 0);

    let record = repo
        .get_daily_record("emp-1", march_4())
        .await
        .unwrap()
        .unwrap();

    // 迟到 25 分: 命中 10 分档 (5%),不叠加 30 分档
    // 1,000,000 - 50,000 = 950,000;缺下班卡 10%: 950,000 - 95,000 = 855,000
    assert_eq!(record.late_arrival_deduction, 50_000);
    assert_eq!(record.missing_check_out_deduction, 95_000);
    assert_eq!(record.components_final[0], 855_000);
    assert_eq!(record.total_salary, 855_000);
    assert!(record.check_in.is_some());
    assert_eq!(record.check_out, None);
}

#[tokio::test]
async fn test_checkout_only_reupload_recomputes_from_base() {
    let (_db_file, db_path) = create_test_db().unwrap();
    seed_standard_scenario(&db_path);
    let (repo, service) = build_service(&db_path);

    let first = write_csv("nip,tanggal,jam_masuk,jam_pulang\n1001,2024-03-04,07:55:00,\n");
    service.ingest_file(first.path()).await.unwrap();

    // 补下班卡: 只带 check_out 的重传
    let second = write_csv("nip,tanggal,jam_masuk,jam_pulang\n1001,2024-03-04,,16:00:00\n");
    let result = service.ingest_file(second.path()).await.unwrap();
    assert_eq!(result.processed, 1);

    let record = repo
        .get_daily_record("emp-1", march_4())
        .await
        .unwrap()
        .unwrap();

    // 从基数重算: 迟到扣款按存量上班卡保留,缺下班卡扣款归零,不叠扣
    assert_eq!(record.late_arrival_deduction, 50_000);
    assert_eq!(record.missing_check_out_deduction, 0);
    assert_eq!(record.components_final[0], 950_000);
    assert_eq!(record.total_salary, 950_000);
    assert!(record.check_in.is_some());
    assert!(record.check_out.is_some());
}

#[tokio::test]
async fn test_checkout_only_reupload_applies_early_leave() {
    let (_db_file, db_path) = create_test_db().unwrap();
    seed_standard_scenario(&db_path);
    {
        let conn = Connection::open(&db_path).unwrap();
        seed_rule(&conn, "r-el-15", "GURU", "EARLY_LEAVE", 15, 1, 5).unwrap();
    }
    let (repo, service) = build_service(&db_path);

    let first = write_csv("nip,tanggal,jam_masuk,jam_pulang\n1001,2024-03-04,07:55:00,\n");
    service.ingest_file(first.path()).await.unwrap();

    // 补到的下班卡同时构成早退 (15:30,早退 30 分钟)
    let second = write_csv("nip,tanggal,jam_masuk,jam_pulang\n1001,2024-03-04,,15:30:00\n");
    service.ingest_file(second.path()).await.unwrap();

    let record = repo
        .get_daily_record("emp-1", march_4())
        .await
        .unwrap()
        .unwrap();

    // 迟到按存量上班卡重算: 1,000,000 * 5% = 50,000 → 余额 950,000
    // 早退命中 15 分档: 950,000 * 5% = 47,500 → 余额 902,500
    // 缺下班卡扣款归零
    assert_eq!(record.deduction_for(ViolationType::LateArrival), 50_000);
    assert_eq!(record.deduction_for(ViolationType::EarlyLeave), 47_500);
    assert_eq!(record.deduction_for(ViolationType::MissingCheckOut), 0);
    assert_eq!(record.components_final[0], 902_500);
    assert_eq!(record.total_salary, 902_500);
}

#[tokio::test]
async fn test_out_of_range_slot_rule_does_not_abort_batch() {
    let (_db_file, db_path) = create_test_db().unwrap();
    seed_standard_scenario(&db_path);
    {
        // 槽位 11 的脏规则: 不得让整批摄入崩溃
        let conn = Connection::open(&db_path).unwrap();
        seed_rule(&conn, "r-mco-dirty", "GURU", "MISSING_CHECK_OUT", 0, 11, 10).unwrap();
    }
    let (repo, service) = build_service(&db_path);

    let csv = write_csv("nip,tanggal,jam_masuk,jam_pulang\n1001,2024-03-04,07:30:00,\n");
    let result = service.ingest_file(csv.path()).await.unwrap();
    assert_eq!(result.processed, 1);

    // 合法规则照常生效,脏规则被忽略
    let record = repo
        .get_daily_record("emp-1", march_4())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.deduction_for(ViolationType::MissingCheckOut), 100_000);
    assert_eq!(record.total_salary, 900_000);
}

#[tokio::test]
async fn test_duplicate_file_rejected_without_row_changes() {
    let (_db_file, db_path) = create_test_db().unwrap();
    seed_standard_scenario(&db_path);
    let (repo, service) = build_service(&db_path);

    let csv = write_csv("nip,tanggal,jam_masuk,jam_pulang\n1001,2024-03-04,07:55:00,16:00:00\n");
    service.ingest_file(csv.path()).await.unwrap();

    let before = repo
        .get_daily_record("emp-1", march_4())
        .await
        .unwrap()
        .unwrap();

    // 同内容文件再次摄入: 整批拒绝
    let result = service.ingest_file(csv.path()).await;
    assert!(matches!(result, Err(IngestError::DuplicateSource(_))));

    let after = repo
        .get_daily_record("emp-1", march_4())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(before.total_salary, after.total_salary);
    assert_eq!(before.components_final, after.components_final);
}

#[tokio::test]
async fn test_failed_batch_does_not_record_fingerprint() {
    let (_db_file, db_path) = create_test_db().unwrap();
    seed_standard_scenario(&db_path);
    let (_repo, service) = build_service(&db_path);

    // 缺少时间列的坏文件: 批次失败
    let bad = write_csv("nip,tanggal\n1001,2024-03-04\n");
    let result = service.ingest_file(bad.path()).await;
    assert!(matches!(result, Err(IngestError::InvalidFormat(_))));

    // 修复前重传同一文件: 仍报格式错误而非指纹命中
    let result = service.ingest_file(bad.path()).await;
    assert!(matches!(result, Err(IngestError::InvalidFormat(_))));
}

#[tokio::test]
async fn test_skip_accounting_does_not_abort_batch() {
    let (_db_file, db_path) = create_test_db().unwrap();
    seed_standard_scenario(&db_path);
    {
        // STAF 角色有员工但无组件配置
        let conn = Connection::open(&db_path).unwrap();
        seed_employee(&conn, "emp-2", "1002", "Budi", "STAF").unwrap();
    }
    let (repo, service) = build_service(&db_path);

    let csv = write_csv(
        "nip,tanggal,jam_masuk,jam_pulang\n\
         9999,2024-03-04,07:30:00,16:00:00\n\
         1002,2024-03-04,07:30:00,16:00:00\n\
         1001,2024-03-04,,\n\
         1001,2024-03-04,07:30:00,16:00:00\n",
    );
    let result = service.ingest_file(csv.path()).await.unwrap();

    assert_eq!(result.processed, 1);
    assert_eq!(result.skipped, 3);
    let reasons: Vec<SkipReason> = result.skipped_details.iter().map(|d| d.reason).collect();
    assert!(reasons.contains(&SkipReason::EmployeeNotFound));
    assert!(reasons.contains(&SkipReason::ComponentConfigMissing));
    assert!(reasons.contains(&SkipReason::IncompleteData));

    // 准点全勤不触发任何扣款
    let record = repo
        .get_daily_record("emp-1", march_4())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.total_salary, 1_000_000);
}

#[tokio::test]
async fn test_api_payload_normalizes_scans() {
    let (_db_file, db_path) = create_test_db().unwrap();
    seed_standard_scenario(&db_path);
    let (repo, service) = build_service(&db_path);

    let payload: TimeClockPayload = serde_json::from_str(
        r#"{
            "success": true,
            "trans_id": "TX-1",
            "data": [
                {"pin": "1001", "scan_date": "2024-03-04 07:31:00", "verify": 1, "status_scan": 0},
                {"pin": "1001", "scan_date": "2024-03-04 07:29:00", "verify": 1, "status_scan": 0},
                {"pin": "1001", "scan_date": "2024-03-04 16:02:00", "verify": 1, "status_scan": 1},
                {"pin": "1001", "scan_date": "2024-03-04 16:30:00", "verify": 1, "status_scan": 1},
                {"pin": "1001", "scan_date": "2024-03-04 12:00:00", "verify": 1, "status_scan": 4}
            ]
        }"#,
    )
    .unwrap();

    let result = service.ingest_api_payload(&payload).await.unwrap();
    assert_eq!(result.processed, 1);
    assert_eq!(result.skipped, 1);
    assert_eq!(result.skipped_details[0].reason, SkipReason::UnknownScanStatus);

    // 最早 In / 最晚 Out 生效: 07:29 上班不迟到
    let record = repo
        .get_daily_record("emp-1", march_4())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.late_arrival_deduction, 0);
    assert_eq!(record.total_salary, 1_000_000);
}
