// ==========================================
// 考勤薪资扣款引擎 - 摄入服务
// ==========================================
// 职责: 编排 解析 → 归并 → 规则匹配 → 台账落库 的完整批次
// 红线: 指纹命中的文件整批拒绝,不做任何行级处理
// 红线: 单条记录失败只计入跳过统计,不中断批次;存储错误为批次致命
// ==========================================

use crate::config::schedule_config_trait::ScheduleConfigReader;
use crate::domain::attendance::{AttendanceScan, BatchResult, NormalizedAttendance, SkippedRecord};
use crate::domain::salary::{DeductionRule, SalaryComponentSet};
use crate::domain::types::SkipReason;
use crate::engine::ledger::SalaryLedger;
use crate::importer::api_adapter::{TimeClockAdapter, TimeClockPayload};
use crate::importer::dedup::UploadDedupGuard;
use crate::importer::error::{IngestError, IngestResult};
use crate::importer::file_parser::{ParsedAttendance, UniversalAttendanceParser};
use crate::importer::normalizer::AttendanceNormalizer;
use crate::repository::payroll_repo::{
    DailySalaryRepository, DeductionRuleRepository, EmployeeDirectory, FingerprintRepository,
    SalaryComponentRepository,
};
use chrono::NaiveTime;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ==========================================
// IngestService - 批次摄入编排
// ==========================================
pub struct IngestService {
    directory: Arc<dyn EmployeeDirectory>,
    components: Arc<dyn SalaryComponentRepository>,
    rules: Arc<dyn DeductionRuleRepository>,
    daily: Arc<dyn DailySalaryRepository>,
    fingerprints: Arc<dyn FingerprintRepository>,
    schedule: Arc<dyn ScheduleConfigReader>,
}

impl IngestService {
    pub fn new(
        directory: Arc<dyn EmployeeDirectory>,
        components: Arc<dyn SalaryComponentRepository>,
        rules: Arc<dyn DeductionRuleRepository>,
        daily: Arc<dyn DailySalaryRepository>,
        fingerprints: Arc<dyn FingerprintRepository>,
        schedule: Arc<dyn ScheduleConfigReader>,
    ) -> Self {
        Self {
            directory,
            components,
            rules,
            daily,
            fingerprints,
            schedule,
        }
    }

    /// 摄入一个考勤文件 (.csv / .xlsx / .xls)
    ///
    /// # 流程
    /// 1. 读文件字节,计算 SHA-256 指纹
    /// 2. 指纹已记录 → 整批拒绝 (DuplicateSource),不处理任何行
    /// 3. 按扩展名解析为归一化记录
    /// 4. 逐条匹配规则、计算、落库
    /// 5. 全批成功后才登记指纹,失败批次可修复后重传
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub async fn ingest_file(&self, path: impl AsRef<Path>) -> IngestResult<BatchResult> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;

        let fingerprint = UploadDedupGuard::fingerprint(&bytes);
        let already_seen = self
            .fingerprints
            .has_fingerprint(&fingerprint)
            .await
            .map_err(|e| IngestError::InternalError(e.to_string()))?;
        if already_seen {
            warn!(fingerprint = %fingerprint, "指纹命中,整批拒绝");
            return Err(IngestError::DuplicateSource(fingerprint));
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| IngestError::UnsupportedFormat("(无扩展名)".to_string()))?;

        let parsed = UniversalAttendanceParser::parse(extension, &bytes)?;
        let result = self.process_parsed(parsed).await?;

        // 批次成功后的最后一步
        self.fingerprints
            .record_fingerprint(&fingerprint)
            .await
            .map_err(|e| IngestError::InternalError(e.to_string()))?;

        Ok(result)
    }

    /// 摄入考勤机推送载荷 (JSON,无文件指纹护栏)
    #[instrument(skip(self, payload), fields(trans_id = %payload.trans_id))]
    pub async fn ingest_api_payload(&self, payload: &TimeClockPayload) -> IngestResult<BatchResult> {
        let (scans, skipped) = TimeClockAdapter::to_scans(payload);
        self.ingest_scans(&scans, skipped).await
    }

    /// 摄入打卡事件列表(先归并为 (工号, 日期) 记录)
    pub async fn ingest_scans(
        &self,
        scans: &[AttendanceScan],
        pre_skipped: Vec<SkippedRecord>,
    ) -> IngestResult<BatchResult> {
        let normalized = AttendanceNormalizer::normalize(scans);
        self.process_parsed(ParsedAttendance {
            records: normalized,
            skipped: pre_skipped,
        })
        .await
    }

    /// 批次主循环
    async fn process_parsed(&self, parsed: ParsedAttendance) -> IngestResult<BatchResult> {
        let started = Instant::now();
        let mut result = BatchResult::new(Uuid::new_v4().to_string());

        for skipped in parsed.skipped {
            result.skip(skipped.reason, skipped.raw);
        }

        // 标准作息每批读一次
        let (standard_check_in, standard_check_out) = self.load_schedule().await?;

        // 同批内角色配置缓存,避免逐行重复查询
        let mut component_cache: HashMap<String, Option<SalaryComponentSet>> = HashMap::new();
        let mut rule_cache: HashMap<String, Vec<DeductionRule>> = HashMap::new();

        for record in &parsed.records {
            self.process_record(
                record,
                standard_check_in,
                standard_check_out,
                &mut component_cache,
                &mut rule_cache,
                &mut result,
            )
            .await?;
        }

        result.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            batch_id = %result.batch_id,
            processed = result.processed,
            skipped = result.skipped,
            elapsed_ms = result.elapsed_ms,
            "批次摄入完成"
        );

        Ok(result)
    }

    /// 处理单条归一化记录
    ///
    /// # 规则
    /// - 上下班均缺失 / 工号不存在 / 角色无组件配置 → 跳过并计数
    /// - 存储访问失败 → 批次致命错误
    async fn process_record(
        &self,
        record: &NormalizedAttendance,
        standard_check_in: NaiveTime,
        standard_check_out: NaiveTime,
        component_cache: &mut HashMap<String, Option<SalaryComponentSet>>,
        rule_cache: &mut HashMap<String, Vec<DeductionRule>>,
        result: &mut BatchResult,
    ) -> IngestResult<()> {
        let raw = format!("badge={} date={}", record.badge, record.date);

        if record.is_empty() {
            result.skip(SkipReason::IncompleteData, raw);
            return Ok(());
        }

        let employee = self
            .directory
            .find_by_badge(&record.badge)
            .await
            .map_err(|e| IngestError::InternalError(e.to_string()))?;
        let Some(employee) = employee else {
            result.skip(SkipReason::EmployeeNotFound, raw);
            return Ok(());
        };

        let components = match component_cache.get(&employee.role_code) {
            Some(cached) => cached.clone(),
            None => {
                let fetched = self
                    .components
                    .get_components(&employee.role_code)
                    .await
                    .map_err(|e| IngestError::InternalError(e.to_string()))?;
                component_cache.insert(employee.role_code.clone(), fetched.clone());
                fetched
            }
        };
        let Some(components) = components else {
            result.skip(SkipReason::ComponentConfigMissing, raw);
            return Ok(());
        };

        let rules = match rule_cache.get(&employee.role_code) {
            Some(cached) => cached.clone(),
            None => {
                let fetched = self
                    .rules
                    .list_rules(&employee.role_code)
                    .await
                    .map_err(|e| IngestError::InternalError(e.to_string()))?;
                rule_cache.insert(employee.role_code.clone(), fetched.clone());
                fetched
            }
        };

        SalaryLedger::apply_and_upsert(
            self.daily.as_ref(),
            &employee.employee_id,
            &components,
            &rules,
            record,
            standard_check_in,
            standard_check_out,
        )
        .await
        .map_err(|e| IngestError::InternalError(e.to_string()))?;

        result.processed += 1;
        Ok(())
    }

    async fn load_schedule(&self) -> IngestResult<(NaiveTime, NaiveTime)> {
        let check_in = self
            .schedule
            .get_standard_check_in()
            .await
            .map_err(|e| IngestError::ConfigReadError {
                key: "schedule/standard_check_in".to_string(),
                message: e.to_string(),
            })?;
        let check_out = self
            .schedule
            .get_standard_check_out()
            .await
            .map_err(|e| IngestError::ConfigReadError {
                key: "schedule/standard_check_out".to_string(),
                message: e.to_string(),
            })?;
        Ok((check_in, check_out))
    }
}
