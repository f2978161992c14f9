// ==========================================
// 考勤薪资扣款引擎 - 摄入层
// ==========================================
// 职责: 外部考勤数据 (文件/考勤机接口) 进入系统的唯一入口
// 红线: 摄入层不计算薪资,计算一律委托引擎层
// ==========================================

pub mod api_adapter;
pub mod dedup;
pub mod error;
pub mod file_parser;
pub mod ingest_service;
pub mod normalizer;

// 重导出常用类型
pub use api_adapter::{TimeClockAdapter, TimeClockPayload, TimeClockRow};
pub use dedup::UploadDedupGuard;
pub use error::{IngestError, IngestResult};
pub use file_parser::{
    CsvAttendanceParser, ParsedAttendance, SpreadsheetMatrixParser, UniversalAttendanceParser,
};
pub use ingest_service::IngestService;
pub use normalizer::AttendanceNormalizer;
