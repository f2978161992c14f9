// ==========================================
// 考勤薪资扣款引擎 - CLI 主入口
// ==========================================
// 用法:
//   attendance-payroll ingest <考勤文件>
//   attendance-payroll summarize <员工ID> <起始日> <结束日> [奖金]
// 数据库路径: 环境变量 PAYROLL_DB,默认 payroll.db
// ==========================================

use attendance_payroll::config::ConfigManager;
use attendance_payroll::db::open_sqlite_connection;
use attendance_payroll::engine::PayrollAggregator;
use attendance_payroll::importer::IngestService;
use attendance_payroll::repository::PayrollRepositoryImpl;
use chrono::NaiveDate;
use std::sync::{Arc, Mutex};

fn usage() -> ! {
    eprintln!("用法:");
    eprintln!("  attendance-payroll ingest <考勤文件>");
    eprintln!("  attendance-payroll summarize <员工ID> <起始日 YYYY-MM-DD> <结束日 YYYY-MM-DD> [奖金]");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    attendance_payroll::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", attendance_payroll::APP_NAME);
    tracing::info!("系统版本: {}", attendance_payroll::VERSION);
    tracing::info!("==================================================");

    let db_path = std::env::var("PAYROLL_DB").unwrap_or_else(|_| "payroll.db".to_string());
    tracing::info!("使用数据库: {}", db_path);

    let conn = Arc::new(Mutex::new(
        open_sqlite_connection(&db_path).map_err(|e| anyhow::anyhow!(e.to_string()))?,
    ));

    let repo = Arc::new(
        PayrollRepositoryImpl::from_connection(conn.clone())
            .map_err(|e| anyhow::anyhow!(e.to_string()))?,
    );
    repo.init_schema()
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let config = Arc::new(
        ConfigManager::from_connection(conn).map_err(|e| anyhow::anyhow!(e.to_string()))?,
    );

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(|s| s.as_str()) {
        Some("ingest") => {
            let Some(path) = args.get(2) else { usage() };

            let service = IngestService::new(
                repo.clone(),
                repo.clone(),
                repo.clone(),
                repo.clone(),
                repo.clone(),
                config,
            );

            let result = service.ingest_file(path).await?;

            println!("批次: {}", result.batch_id);
            println!("成功落库: {} 条", result.processed);
            println!("跳过: {} 条", result.skipped);
            for detail in &result.skipped_details {
                println!("  [{}] {}", detail.reason, detail.raw);
            }
            println!("耗时: {} ms", result.elapsed_ms);
        }
        Some("summarize") => {
            let (Some(employee_id), Some(start), Some(end)) =
                (args.get(2), args.get(3), args.get(4))
            else {
                usage()
            };
            let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")?;
            let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")?;
            let bonus: Option<i64> = match args.get(5) {
                Some(raw) => Some(raw.parse()?),
                None => None,
            };

            let aggregator =
                PayrollAggregator::new(repo.clone(), repo.clone(), repo.clone(), repo.clone());

            let summary = aggregator
                .summarize(employee_id, start, end, bonus, None)
                .await
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;

            println!("员工: {}", summary.employee_id);
            println!("期间: {} ~ {}", summary.period_start, summary.period_end);
            println!("固定底薪合计: {}", summary.total_base_components);
            println!("日薪净额合计: {}", summary.total_daily_net);
            println!("奖金: {}", summary.total_bonus);
            println!("应发合计: {}", summary.grand_total);
        }
        _ => usage(),
    }

    Ok(())
}
