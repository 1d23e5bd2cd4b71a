/// Export boundary: turns a story document into a downloadable file.

use serde::Serialize;

use crate::core::format::{serialize_as, Format, FormatError};
use crate::schema::adventure::Adventure;

const UNSAFE_FILENAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// A serialized adventure ready to hand to a download sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportFile {
    pub filename: String,
    pub mime_type: String,
    pub contents: String,
}

/// Replace filesystem-unsafe characters (and control characters) with `_`.
/// Blank titles become "adventure".
pub fn sanitize_filename(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| {
            if UNSAFE_FILENAME_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    if cleaned.is_empty() {
        "adventure".to_string()
    } else {
        cleaned
    }
}

pub fn export(adventure: &Adventure, format: Format) -> Result<ExportFile, FormatError> {
    Ok(ExportFile {
        filename: format!(
            "{}.{}",
            sanitize_filename(adventure.title()),
            format.extension()
        ),
        mime_type: format.mime_type().to_string(),
        contents: serialize_as(adventure, format)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::format::parse_as;
    use crate::schema::passage::Passage;

    #[test]
    fn unsafe_characters_are_replaced() {
        assert_eq!(sanitize_filename("What/If: Part 2?"), "What_If_ Part 2_");
        assert_eq!(sanitize_filename("a\"b<c>d|e*f\\g"), "a_b_c_d_e_f_g");
        assert_eq!(sanitize_filename("tab\there"), "tab_here");
    }

    #[test]
    fn blank_title_gets_a_default() {
        assert_eq!(sanitize_filename("   "), "adventure");
    }

    #[test]
    fn export_names_and_serializes() {
        let adv = Adventure::new("Night/Day", &["Dusk."])
            .with_passage(Passage::new(1, &["Dawn."]).with_ending("morning"));
        let file = export(&adv, Format::Json).unwrap();
        assert_eq!(file.filename, "Night_Day.json");
        assert_eq!(file.mime_type, "application/json");
        assert_eq!(parse_as(&file.contents, Format::Json).unwrap(), adv);

        let file = export(&adv, Format::Ron).unwrap();
        assert_eq!(file.filename, "Night_Day.ron");
    }
}
