// ==========================================
// 考勤薪资扣款引擎 - 摄入文件解析器
// ==========================================
// 支持: CSV (逐行 badge/date/in/out) / Excel 矩阵表 (.xlsx/.xls)
// 矩阵表布局: 一行一员工,一列一天,单元格 "上班\n下班" 或 "-"
// 红线: 解析阶段只产出归一化记录与跳过明细,不触碰薪资计算与落库
// ==========================================

use crate::domain::attendance::{NormalizedAttendance, SkippedRecord};
use crate::domain::types::SkipReason;
use crate::importer::error::{IngestError, IngestResult};
use calamine::{open_workbook_from_rs, Reader, Xlsx};
use chrono::{NaiveDate, NaiveTime};
use csv::ReaderBuilder;
use regex::Regex;
use std::io::Cursor;

// ==========================================
// ParsedAttendance - 解析阶段输出
// ==========================================
#[derive(Debug, Default)]
pub struct ParsedAttendance {
    pub records: Vec<NormalizedAttendance>,
    pub skipped: Vec<SkippedRecord>,
}

/// 解析时间串 (HH:MM:SS 或 HH:MM)
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .ok()
}

/// 解析日期串 (兼容 ISO 与 DD-MM-YYYY / DD/MM/YYYY)
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d-%m-%Y"))
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .ok()
}

// ==========================================
// CSV 解析器
// ==========================================
// 列: badge/nip, date/tanggal, check_in/jam_masuk, check_out/jam_pulang
pub struct CsvAttendanceParser;

impl CsvAttendanceParser {
    pub fn parse(bytes: &[u8]) -> IngestResult<ParsedAttendance> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let find_col = |names: &[&str]| -> Option<usize> {
            headers
                .iter()
                .position(|h| names.contains(&h.as_str()))
        };

        let badge_col = find_col(&["badge", "nip"])
            .ok_or_else(|| IngestError::InvalidFormat("缺少工号列 (badge/nip)".to_string()))?;
        let date_col = find_col(&["date", "tanggal"])
            .ok_or_else(|| IngestError::InvalidFormat("缺少日期列 (date/tanggal)".to_string()))?;
        let check_in_col = find_col(&["check_in", "jam_masuk"]).ok_or_else(|| {
            IngestError::InvalidFormat("缺少上班时间列 (check_in/jam_masuk)".to_string())
        })?;
        let check_out_col = find_col(&["check_out", "jam_pulang"]).ok_or_else(|| {
            IngestError::InvalidFormat("缺少下班时间列 (check_out/jam_pulang)".to_string())
        })?;

        let mut output = ParsedAttendance::default();

        for row in reader.records() {
            let row = row?;
            let raw_line = row.iter().collect::<Vec<_>>().join(",");

            // 跳过完全空白的行
            if row.iter().all(|v| v.trim().is_empty()) {
                continue;
            }

            let badge = row.get(badge_col).unwrap_or("").trim().to_string();
            let date_raw = row.get(date_col).unwrap_or("").trim().to_string();
            if badge.is_empty() || date_raw.is_empty() {
                output.skipped.push(SkippedRecord {
                    reason: SkipReason::MissingField,
                    raw: raw_line,
                });
                continue;
            }

            let Some(date) = parse_date(&date_raw) else {
                output.skipped.push(SkippedRecord {
                    reason: SkipReason::UnparseableTime,
                    raw: raw_line,
                });
                continue;
            };

            // 时间列为空视为缺卡;非空但解析失败则跳过该行
            let mut unparseable = false;
            let mut read_time = |col: usize| -> Option<NaiveTime> {
                let raw = row.get(col).unwrap_or("").trim();
                if raw.is_empty() || raw == "-" {
                    return None;
                }
                let parsed = parse_time(raw);
                if parsed.is_none() {
                    unparseable = true;
                }
                parsed
            };

            let check_in = read_time(check_in_col);
            let check_out = read_time(check_out_col);

            if unparseable {
                output.skipped.push(SkippedRecord {
                    reason: SkipReason::UnparseableTime,
                    raw: raw_line,
                });
                continue;
            }

            output.records.push(NormalizedAttendance {
                badge,
                date,
                check_in,
                check_out,
            });
        }

        Ok(output)
    }
}

// ==========================================
// Excel 矩阵表解析器
// ==========================================
// 表头区域须含期间年月 (如 "03/2024" 或 "2024-03"),找不到即判格式非法,
// 不做静默兜底
pub struct SpreadsheetMatrixParser;

impl SpreadsheetMatrixParser {
    pub fn parse(bytes: &[u8]) -> IngestResult<ParsedAttendance> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;

        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(IngestError::ExcelParseError("Excel 文件无工作表".to_string()));
        }

        let sheet_name = sheet_names[0].clone();
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| IngestError::ExcelParseError(e.to_string()))?;

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.to_string().trim().to_string())
                    .collect()
            })
            .collect();

        // 定位表头行: 首列为 NIP/BADGE 的行
        let header_idx = rows
            .iter()
            .position(|row| {
                row.first()
                    .map(|cell| {
                        let upper = cell.to_uppercase();
                        upper == "NIP" || upper == "BADGE"
                    })
                    .unwrap_or(false)
            })
            .ok_or_else(|| {
                IngestError::InvalidFormat("矩阵表未找到表头行 (首列 NIP/BADGE)".to_string())
            })?;

        // 期间年月: 扫描表头行之前的区域
        let (year, month) = Self::scan_period(&rows[..header_idx])?;

        // 日列映射: 表头中可解析为 1..=31 的列
        let mut day_columns: Vec<(usize, u32)> = Vec::new();
        for (col_idx, cell) in rows[header_idx].iter().enumerate().skip(1) {
            if let Ok(day) = cell.parse::<u32>() {
                if (1..=31).contains(&day) {
                    day_columns.push((col_idx, day));
                }
            }
        }
        if day_columns.is_empty() {
            return Err(IngestError::InvalidFormat(
                "矩阵表表头无日序号列 (1..31)".to_string(),
            ));
        }

        let mut output = ParsedAttendance::default();

        for row in rows.iter().skip(header_idx + 1) {
            let badge = row.first().map(|c| c.trim()).unwrap_or("");
            if badge.is_empty() {
                continue;
            }

            for &(col_idx, day) in &day_columns {
                let cell = row.get(col_idx).map(|c| c.as_str()).unwrap_or("");
                // "-" 或空白表示当天无打卡,不产出记录
                if cell.is_empty() || cell == "-" {
                    continue;
                }

                // 当月不存在的日序号 (如 2月31日) 直接略过
                let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
                    continue;
                };

                let mut times = cell
                    .split('\n')
                    .map(|part| part.trim())
                    .filter(|part| !part.is_empty() && *part != "-");

                let in_raw = times.next();
                let out_raw = times.next();

                let check_in = in_raw.and_then(parse_time);
                let check_out = out_raw.and_then(parse_time);

                // 有内容却一个时间都解析不出来,按坏数据计入跳过
                if check_in.is_none() && check_out.is_none() {
                    output.skipped.push(SkippedRecord {
                        reason: SkipReason::UnparseableTime,
                        raw: format!("{} {}: {}", badge, date, cell),
                    });
                    continue;
                }

                output.records.push(NormalizedAttendance {
                    badge: badge.to_string(),
                    date,
                    check_in,
                    check_out,
                });
            }
        }

        Ok(output)
    }

    /// 在表头区域扫描期间年月
    ///
    /// # 支持格式
    /// - MM/YYYY、MM-YYYY
    /// - YYYY-MM、YYYY/MM
    ///
    /// # 返回
    /// - Err(InvalidFormat): 找不到任何日期模式 (不做静默兜底)
    fn scan_period(header_rows: &[Vec<String>]) -> IngestResult<(i32, u32)> {
        let month_year = Regex::new(r"\b(0?[1-9]|1[0-2])\s*[/-]\s*((?:19|20)\d{2})\b")
            .map_err(|e| IngestError::InternalError(e.to_string()))?;
        let year_month = Regex::new(r"\b((?:19|20)\d{2})\s*[/-]\s*(0?[1-9]|1[0-2])\b")
            .map_err(|e| IngestError::InternalError(e.to_string()))?;

        for row in header_rows {
            for cell in row {
                if let Some(caps) = year_month.captures(cell) {
                    let year: i32 = caps[1].parse().unwrap_or(0);
                    let month: u32 = caps[2].parse().unwrap_or(0);
                    return Ok((year, month));
                }
                if let Some(caps) = month_year.captures(cell) {
                    let month: u32 = caps[1].parse().unwrap_or(0);
                    let year: i32 = caps[2].parse().unwrap_or(0);
                    return Ok((year, month));
                }
            }
        }

        Err(IngestError::InvalidFormat(
            "矩阵表表头未找到期间年月 (如 03/2024)".to_string(),
        ))
    }
}

// ==========================================
// 通用解析入口(根据扩展名自动选择)
// ==========================================
pub struct UniversalAttendanceParser;

impl UniversalAttendanceParser {
    pub fn parse(extension: &str, bytes: &[u8]) -> IngestResult<ParsedAttendance> {
        match extension.to_lowercase().as_str() {
            "csv" => CsvAttendanceParser::parse(bytes),
            "xlsx" | "xls" => SpreadsheetMatrixParser::parse(bytes),
            other => Err(IngestError::UnsupportedFormat(other.to_string())),
        }
    }
}
