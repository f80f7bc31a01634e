use super::{unreadable, SourceReader};
use crate::constants::MESSAGE_EXPORT_SOURCE;
use crate::domain::RawRecord;
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::{Html, Selector};
use std::path::Path;
use tracing::{debug, info, warn};

/// Bodies shorter than this carry no extractable listing and are dropped
/// unless the message attaches a photo.
const MIN_BODY_LEN: usize = 10;

/// Reads a messenger chat export saved as HTML.
///
/// Messages are delimited by `div.message` blocks carrying a numeric
/// `id="message-N"`-style attribute; each block holds an optional localized
/// date marker in the date element's `title` attribute, entity-escaped free
/// text, and zero or more photo links. One raw record is produced per
/// message with a non-trivial text body or at least one attached image.
pub struct MessageExportReader;

impl MessageExportReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MessageExportReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceReader for MessageExportReader {
    fn source_name(&self) -> &'static str {
        MESSAGE_EXPORT_SOURCE
    }

    async fn read(&self, path: &Path) -> Result<Vec<RawRecord>> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| unreadable(MESSAGE_EXPORT_SOURCE, path, e))?;
        let html = String::from_utf8_lossy(&bytes).to_string();
        debug!("MessageExportReader: start html_len={}", html.len());

        let document = Html::parse_document(&html);
        let message_sel = Selector::parse("div.message").unwrap();
        let date_sel = Selector::parse(".date").unwrap();
        let text_sel = Selector::parse(".text").unwrap();
        let photo_link_sel = Selector::parse("a.photo_wrap").unwrap();
        let photo_img_sel = Selector::parse("img.photo").unwrap();

        let mut out = Vec::new();
        let mut skipped = 0usize;
        for element in document.select(&message_sel) {
            let message_id = match element
                .value()
                .attr("id")
                .and_then(|id| id.trim_start_matches(|c: char| !c.is_ascii_digit()).parse::<u64>().ok())
            {
                Some(id) => id,
                None => {
                    warn!("MessageExportReader: message block without numeric id; skipping");
                    skipped += 1;
                    continue;
                }
            };

            // Service messages (joins, pins) have no text block worth keeping.
            let body = element.select(&text_sel).next().map(|text_el| {
                text_el
                    .text()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n")
            });

            let mut photos: Vec<String> = element
                .select(&photo_link_sel)
                .filter_map(|a| a.value().attr("href"))
                .map(|href| href.to_string())
                .collect();
            if photos.is_empty() {
                photos = element
                    .select(&photo_img_sel)
                    .filter_map(|img| img.value().attr("src"))
                    .map(|src| src.to_string())
                    .collect();
            }

            let non_trivial_body = body.as_deref().map(|b| b.len() >= MIN_BODY_LEN).unwrap_or(false);
            if !non_trivial_body && photos.is_empty() {
                debug!("MessageExportReader: message {} has no usable body or photos", message_id);
                skipped += 1;
                continue;
            }

            let source_date = element
                .select(&date_sel)
                .next()
                .and_then(|d| d.value().attr("title"))
                .and_then(parse_export_date);

            out.push(RawRecord {
                source_id: format!("{}:{}", MESSAGE_EXPORT_SOURCE, message_id),
                source_date,
                body,
                photos,
                ..RawRecord::default()
            });
        }

        info!(
            "MessageExportReader: extracted records count={} skipped={}",
            out.len(),
            skipped
        );
        Ok(out)
    }
}

/// The export stamps dates like "05.08.2026 14:23:01 UTC+03:00"; only the
/// calendar date matters downstream.
fn parse_export_date(title: &str) -> Option<NaiveDate> {
    let date_part = title.split_whitespace().next()?;
    NaiveDate::parse_from_str(date_part, "%d.%m.%Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"<html><body>
      <div class="message service" id="message1">
        <div class="body details">5 августа 2026</div>
      </div>
      <div class="message default clearfix" id="message2">
        <div class="pull_right date details" title="05.08.2026 14:23:01 UTC+03:00">14:23</div>
        <div class="body">
          <div class="text">Апартаменты у моря — от 5 млн рублей.<br>Площадью 28 кв.м, доходность 12%</div>
          <a class="photo_wrap" href="photos/photo_45.jpg"><img class="photo" src="photos/photo_45_thumb.jpg"></a>
        </div>
      </div>
      <div class="message default clearfix" id="message3">
        <div class="pull_right date details" title="06.08.2026 09:00:00 UTC+03:00">09:00</div>
        <div class="body"><div class="text">ок</div></div>
      </div>
    </body></html>"#;

    #[tokio::test]
    async fn test_reads_messages_with_body_or_photo() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let reader = MessageExportReader::new();
        let records = reader.read(file.path()).await.unwrap();

        // message1 is a service message, message3 has a trivial body
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.source_id, "message_export:2");
        assert_eq!(rec.source_date, NaiveDate::from_ymd_opt(2026, 8, 5));
        assert!(rec.body.as_deref().unwrap().contains("от 5 млн рублей"));
        assert_eq!(rec.photos, vec!["photos/photo_45.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_file_is_source_unreadable() {
        let reader = MessageExportReader::new();
        let err = reader.read(Path::new("/nonexistent/messages.html")).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::PipelineError::SourceUnreadable { .. }
        ));
    }

    #[test]
    fn test_parse_export_date() {
        assert_eq!(
            parse_export_date("05.08.2026 14:23:01 UTC+03:00"),
            NaiveDate::from_ymd_opt(2026, 8, 5)
        );
        assert_eq!(parse_export_date("not a date"), None);
    }
}
