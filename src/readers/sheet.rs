use super::{parse_number, unreadable, SourceReader};
use crate::constants::SHEET_SOURCE;
use crate::domain::{ProjectStatus, RawRecord};
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info, warn};

/// Reads a tabular export with a header row.
///
/// Header names are matched case- and language-tolerantly (Russian and
/// English variants). Unknown columns are dropped, not an error. A malformed
/// row is skipped with a reason; only an unreadable file is fatal for this
/// source.
pub struct SheetReader;

/// Canonical meaning of a recognized column.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Column {
    Title,
    City,
    Price,
    Area,
    PricePerM2,
    RoiPercent,
    OccupancyPercent,
    Adr,
    PaybackYears,
    RevPerM2Month,
    Format,
    Status,
    Description,
    Photo,
    Unknown,
}

impl SheetReader {
    pub fn new() -> Self {
        Self
    }

    fn classify_header(header: &str) -> Column {
        let h = header.trim().to_lowercase();
        // Per-m² columns must be recognized before the bare price/area names
        // they contain as substrings.
        if h.contains("за м2") || h.contains("за кв") || h.contains("м²") && h.contains("цена")
            || h.contains("price_per") || h.contains("price per")
        {
            return Column::PricePerM2;
        }
        if h.contains("назван") || h.contains("объект") || h == "title" || h == "name" {
            Column::Title
        } else if h.contains("город") || h == "city" {
            Column::City
        } else if h.contains("цена") || h.contains("стоимост") || h == "price" {
            Column::Price
        } else if h.contains("площад") || h == "area" || h.contains("метраж") {
            Column::Area
        } else if h.contains("доходност") || h.contains("roi") || h.contains("yield") {
            Column::RoiPercent
        } else if h.contains("загрузк") || h.contains("заполняем") || h.contains("occupancy") {
            Column::OccupancyPercent
        } else if h.contains("adr") || h.contains("тариф") {
            Column::Adr
        } else if h.contains("окупаем") || h.contains("payback") {
            Column::PaybackYears
        } else if h.contains("выручка") || h.contains("rev_per") || h.contains("revenue") {
            Column::RevPerM2Month
        } else if h.contains("формат") || h == "format" || h.contains("тип") {
            Column::Format
        } else if h.contains("статус") || h == "status" || h.contains("стадия") {
            Column::Status
        } else if h.contains("описан") || h.contains("description") {
            Column::Description
        } else if h.contains("фото") || h.contains("photo") || h.contains("image") {
            Column::Photo
        } else {
            Column::Unknown
        }
    }

    fn parse_status(text: &str) -> Option<ProjectStatus> {
        let t = text.trim().to_lowercase();
        if t.is_empty() {
            return None;
        }
        if t.contains("строит") || t.contains("construction") {
            Some(ProjectStatus::Construction)
        } else if t.contains("проект") || t.contains("план") || t.contains("planning") {
            Some(ProjectStatus::Planning)
        } else if t.contains("актив") || t.contains("active") || t.contains("сдан") {
            Some(ProjectStatus::Active)
        } else {
            None
        }
    }
}

impl Default for SheetReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceReader for SheetReader {
    fn source_name(&self) -> &'static str {
        SHEET_SOURCE
    }

    async fn read(&self, path: &Path) -> Result<Vec<RawRecord>> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| unreadable(SHEET_SOURCE, path, e))?;

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(bytes.as_slice());

        let headers = reader
            .headers()
            .map_err(|e| unreadable(SHEET_SOURCE, path, e))?
            .clone();
        let columns: Vec<Column> = headers.iter().map(Self::classify_header).collect();
        debug!("SheetReader: classified columns {:?}", columns);

        let mut out = Vec::new();
        let mut skipped = 0usize;
        for (index, row) in reader.records().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!("SheetReader: skipping malformed row {}: {}", index + 1, e);
                    skipped += 1;
                    continue;
                }
            };

            let mut record = RawRecord {
                source_id: format!("{}:{}", SHEET_SOURCE, index + 1),
                ..RawRecord::default()
            };
            for (cell, column) in row.iter().zip(columns.iter()) {
                if cell.is_empty() {
                    continue;
                }
                match column {
                    Column::Title => record.title = Some(cell.to_string()),
                    Column::City => record.city = Some(cell.to_string()),
                    Column::Price => record.price = parse_number(cell),
                    Column::Area => record.area = parse_number(cell),
                    Column::PricePerM2 => record.price_per_m2 = parse_number(cell),
                    Column::RoiPercent => record.roi_percent = parse_number(cell),
                    Column::OccupancyPercent => record.occupancy_percent = parse_number(cell),
                    Column::Adr => record.adr = parse_number(cell),
                    Column::PaybackYears => record.payback_years = parse_number(cell),
                    Column::RevPerM2Month => record.rev_per_m2_month = parse_number(cell),
                    Column::Format => record.format = Some(cell.to_string()),
                    Column::Status => record.status = Self::parse_status(cell),
                    Column::Description => record.description = Some(cell.to_string()),
                    Column::Photo => record.photos.push(cell.to_string()),
                    Column::Unknown => {}
                }
            }

            if record.title.is_none() && record.description.is_none() {
                debug!("SheetReader: row {} carries no title or description", index + 1);
                skipped += 1;
                continue;
            }
            out.push(record);
        }

        info!("SheetReader: extracted records count={} skipped={}", out.len(), skipped);
        Ok(out)
    }
}
