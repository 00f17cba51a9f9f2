//! Desired content of a single spreadsheet cell.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc};

use super::sheet::{
    CellData, CellFormat, ExtendedValue, Link, NumberFormat, TextFormat, TextFormatRun,
};

const SECONDS_PER_DAY: i64 = 86_400;

/// Number format type the backend renders serial numbers with.
pub const DATE_TIME_FORMAT: &str = "DATE_TIME";

/// A contiguous span of text with an optional hyperlink target.
#[derive(Debug, Clone, PartialEq)]
pub struct RichTextRun {
    pub text: String,
    pub link: Option<String>,
}

impl RichTextRun {
    pub fn linked(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: Some(url.into()),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: None,
        }
    }
}

/// A cell's desired content, independent of which thread field produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    /// Digits written as a string so the backend never parses them into a lossy number.
    NumericText(String),
    Formula(String),
    /// Days since 1899-12-30 plus the fraction of the day.
    DateTime(f64),
    RichText(Vec<RichTextRun>),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn numeric_id(id: u64) -> Self {
        CellValue::NumericText(id.to_string())
    }

    pub fn formula(formula: impl Into<String>) -> Self {
        CellValue::Formula(formula.into())
    }

    pub fn from_datetime(dt: &DateTime<Utc>) -> Self {
        CellValue::DateTime(serial_number(dt))
    }

    /// A single run whose display text is the link itself.
    pub fn link(url: &str) -> Self {
        CellValue::RichText(vec![RichTextRun::linked(url, url)])
    }

    /// One linked run per pair, separated by unlinked newlines. No pairs gives `Empty`.
    pub fn from_names_and_urls<I, N, U>(names_and_urls: I) -> Self
    where
        I: IntoIterator<Item = (N, U)>,
        N: Into<String>,
        U: Into<String>,
    {
        let mut runs = Vec::new();
        for (i, (name, url)) in names_and_urls.into_iter().enumerate() {
            if i > 0 {
                runs.push(RichTextRun::plain("\n"));
            }
            runs.push(RichTextRun::linked(name, url));
        }

        if runs.is_empty() {
            CellValue::Empty
        } else {
            CellValue::RichText(runs)
        }
    }

    /// Encode into the backend's cell payload.
    pub fn to_cell_data(&self) -> CellData {
        match self {
            CellValue::Empty => CellData::default(),
            CellValue::Text(s) | CellValue::NumericText(s) => CellData {
                user_entered_value: Some(ExtendedValue::string(s.as_str())),
                ..CellData::default()
            },
            CellValue::Formula(f) => CellData {
                user_entered_value: Some(ExtendedValue::formula(f.as_str())),
                ..CellData::default()
            },
            CellValue::DateTime(serial) => CellData {
                user_entered_value: Some(ExtendedValue::number(*serial)),
                user_entered_format: Some(CellFormat {
                    number_format: Some(NumberFormat {
                        kind: DATE_TIME_FORMAT.to_string(),
                    }),
                }),
                ..CellData::default()
            },
            CellValue::RichText(runs) => {
                let mut text = String::new();
                let mut offset = 0;
                let mut text_format_runs = Vec::with_capacity(runs.len());
                for run in runs {
                    text_format_runs.push(TextFormatRun {
                        start_index: offset,
                        format: TextFormat {
                            link: run.link.as_ref().map(|uri| Link { uri: uri.clone() }),
                        },
                    });
                    offset += run.text.encode_utf16().count();
                    text.push_str(&run.text);
                }
                CellData {
                    user_entered_value: Some(ExtendedValue::string(text)),
                    user_entered_format: None,
                    text_format_runs,
                }
            }
        }
    }
}

/// Day zero of spreadsheet serial dates.
fn serial_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("1899-12-30 is a valid date")
}

/// Spreadsheet serial number for a UTC instant. Sub-second precision is dropped.
pub fn serial_number(dt: &DateTime<Utc>) -> f64 {
    let since_epoch = (dt.trunc_subsecs(0).naive_utc() - serial_epoch()).num_seconds();
    let days = since_epoch.div_euclid(SECONDS_PER_DAY);
    let seconds = since_epoch.rem_euclid(SECONDS_PER_DAY);
    days as f64 + seconds as f64 / SECONDS_PER_DAY as f64
}
