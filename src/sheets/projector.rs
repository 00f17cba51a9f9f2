//! Thread field to cell value mapping.

use super::header::HeaderField;
use crate::models::{Attachment, CellValue, ThreadRecord};

/// Render the value a thread contributes to the column headed `header`.
pub fn project_header(thread: &ThreadRecord, header: Option<&str>) -> CellValue {
    match header {
        Some(header) => project(thread, HeaderField::from_header(header)),
        None => CellValue::Empty,
    }
}

pub fn project(thread: &ThreadRecord, field: HeaderField) -> CellValue {
    match field {
        HeaderField::DiscordId => CellValue::numeric_id(thread.id),
        HeaderField::DiscordLink => CellValue::link(&thread.url),
        HeaderField::Poster => match &thread.poster {
            Some(poster) => CellValue::text(poster.as_str()),
            None => CellValue::Empty,
        },
        HeaderField::Title => CellValue::text(thread.title.as_str()),
        HeaderField::Details => match thread.first_message() {
            Some(message) => CellValue::text(message.content.as_str()),
            None => CellValue::Empty,
        },
        HeaderField::Tags => CellValue::text(thread.tags.join("\n")),
        HeaderField::SaveFiles => attachment_links(&thread.save_files),
        HeaderField::LogFiles => attachment_links(&thread.log_files),
        HeaderField::Media => attachment_links(&thread.media),
        HeaderField::Image => match thread.main_image() {
            Some(image) => CellValue::formula(image_formula(&image.url)),
            None => CellValue::Empty,
        },
        HeaderField::CreateDate => CellValue::from_datetime(&thread.create_date),
        HeaderField::LastPostDate => match &thread.last_post_date {
            Some(date) => CellValue::from_datetime(date),
            None => CellValue::Empty,
        },
        HeaderField::Unmapped => CellValue::Empty,
    }
}

fn attachment_links(attachments: &[Attachment]) -> CellValue {
    CellValue::from_names_and_urls(
        attachments
            .iter()
            .map(|a| (a.filename.as_str(), a.url.as_str())),
    )
}

/// `IMAGE` call for a URL; embedded quotes are doubled per formula string escaping.
fn image_formula(url: &str) -> String {
    format!("=IMAGE(\"{}\")", url.replace('"', "\"\""))
}
