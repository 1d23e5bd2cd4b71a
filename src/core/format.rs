/// Serialization layer: story documents to and from text.
///
/// RON is the authoring format; JSON carries the same schema for browser
/// hosts. Parsing is syntactic only: a parsed document still has to go
/// through [`crate::core::validator::validate`] before it is played.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::schema::adventure::{Adventure, Introduction, Metadata};
use crate::schema::item::{Effect, Item, ItemId};
use crate::schema::passage::{Choice, Passage, PassageId};

#[derive(Debug, Error)]
pub enum FormatError {
    /// Malformed syntax.
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
    /// Well-formed text that does not match the document schema.
    #[error("schema error: {0}")]
    Schema(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Ron,
    Json,
}

impl Format {
    /// Pick a format from a file extension (`ron` or `json`).
    pub fn from_path(path: &Path) -> Option<Format> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ron") => Some(Format::Ron),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Some(Format::Json),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Json => "json",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Ron => "application/ron",
            Format::Json => "application/json",
        }
    }
}

// The persisted shape differs from the in-memory model: effects are
// `{type, item}` records and ids are bare integers and strings.

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAdventure {
    metadata: RawMetadata,
    #[serde(default)]
    items: Vec<RawItem>,
    introduction: RawIntroduction,
    passages: Vec<RawPassage>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMetadata {
    title: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawItem {
    id: String,
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawIntroduction {
    paragraphs: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawPassage {
    id: u32,
    paragraphs: Vec<String>,
    #[serde(default)]
    choices: Vec<RawChoice>,
    #[serde(default)]
    effects: Vec<RawEffect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ending_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawChoice {
    text: String,
    goto: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEffect {
    #[serde(rename = "type")]
    kind: String,
    item: String,
}

impl RawAdventure {
    fn into_adventure(self) -> Result<Adventure, FormatError> {
        let mut passages = Vec::with_capacity(self.passages.len());
        for raw in self.passages {
            passages.push(raw.into_passage()?);
        }

        Ok(Adventure {
            metadata: Metadata {
                title: self.metadata.title,
            },
            items: self
                .items
                .into_iter()
                .map(|i| Item {
                    id: ItemId(i.id),
                    name: i.name,
                })
                .collect(),
            introduction: Introduction {
                paragraphs: self.introduction.paragraphs,
            },
            passages,
        })
    }

    fn from_adventure(adventure: &Adventure) -> RawAdventure {
        RawAdventure {
            metadata: RawMetadata {
                title: adventure.metadata.title.clone(),
            },
            items: adventure
                .items
                .iter()
                .map(|i| RawItem {
                    id: i.id.0.clone(),
                    name: i.name.clone(),
                })
                .collect(),
            introduction: RawIntroduction {
                paragraphs: adventure.introduction.paragraphs.clone(),
            },
            passages: adventure.passages.iter().map(RawPassage::from_passage).collect(),
        }
    }
}

impl RawPassage {
    fn into_passage(self) -> Result<Passage, FormatError> {
        if self.id == 0 {
            return Err(FormatError::Schema(
                "passage id must be at least 1".to_string(),
            ));
        }

        let mut choices = Vec::with_capacity(self.choices.len());
        for (index, choice) in self.choices.into_iter().enumerate() {
            if choice.goto == 0 {
                return Err(FormatError::Schema(format!(
                    "choice {} in passage {}: goto must be at least 1",
                    index + 1,
                    self.id
                )));
            }
            choices.push(Choice {
                text: choice.text,
                goto: PassageId(choice.goto),
            });
        }

        let mut effects = Vec::with_capacity(self.effects.len());
        for effect in self.effects {
            let item = ItemId(effect.item);
            effects.push(match effect.kind.as_str() {
                "addItem" => Effect::AddItem { item },
                "removeItem" => Effect::RemoveItem { item },
                other => {
                    return Err(FormatError::Schema(format!(
                        "passage {}: unknown effect type '{}' (expected 'addItem' or 'removeItem')",
                        self.id, other
                    )))
                }
            });
        }

        Ok(Passage {
            id: PassageId(self.id),
            paragraphs: self.paragraphs,
            choices,
            effects,
            notes: self.notes,
            ending_type: self.ending_type,
        })
    }

    fn from_passage(passage: &Passage) -> RawPassage {
        RawPassage {
            id: passage.id.0,
            paragraphs: passage.paragraphs.clone(),
            choices: passage
                .choices
                .iter()
                .map(|c| RawChoice {
                    text: c.text.clone(),
                    goto: c.goto.0,
                })
                .collect(),
            effects: passage
                .effects
                .iter()
                .map(|e| RawEffect {
                    kind: e.type_tag().to_string(),
                    item: e.item().0.clone(),
                })
                .collect(),
            notes: passage.notes.clone(),
            ending_type: passage.ending_type.clone(),
        }
    }
}

/// RON is read in two passes so the error kind does not depend on which
/// token the typed deserializer happened to stop at: text that is not valid
/// RON at all is a `Parse` error, and anything rejected only once the
/// document shape is known is a `Schema` error.
fn parse_ron(input: &str) -> Result<RawAdventure, FormatError> {
    ron::from_str::<ron::Value>(input).map_err(|err| FormatError::Parse {
        line: err.position.line,
        column: err.position.col,
        message: err.code.to_string(),
    })?;
    ron::from_str(input).map_err(|err| {
        FormatError::Schema(format!(
            "{} (line {}, column {})",
            err.code, err.position.line, err.position.col
        ))
    })
}

fn json_error(err: serde_json::Error) -> FormatError {
    use serde_json::error::Category;

    match err.classify() {
        Category::Data => FormatError::Schema(err.to_string()),
        Category::Syntax | Category::Eof | Category::Io => FormatError::Parse {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        },
    }
}

/// Parse a RON story document.
pub fn parse(input: &str) -> Result<Adventure, FormatError> {
    parse_as(input, Format::Ron)
}

/// Serialize a story document to pretty-printed RON.
pub fn serialize(adventure: &Adventure) -> Result<String, FormatError> {
    serialize_as(adventure, Format::Ron)
}

pub fn parse_as(input: &str, format: Format) -> Result<Adventure, FormatError> {
    let raw: RawAdventure = match format {
        Format::Ron => parse_ron(input)?,
        Format::Json => serde_json::from_str(input).map_err(json_error)?,
    };
    let adventure = raw.into_adventure()?;
    tracing::debug!(
        title = %adventure.title(),
        passages = adventure.passages.len(),
        ?format,
        "parsed adventure"
    );
    Ok(adventure)
}

pub fn serialize_as(adventure: &Adventure, format: Format) -> Result<String, FormatError> {
    let raw = RawAdventure::from_adventure(adventure);
    match format {
        Format::Ron => {
            let config = ron::ser::PrettyConfig::default().struct_names(false);
            ron::ser::to_string_pretty(&raw, config)
                .map_err(|e| FormatError::Serialize(e.to_string()))
        }
        Format::Json => serde_json::to_string_pretty(&raw)
            .map_err(|e| FormatError::Serialize(e.to_string())),
    }
}

/// Load a story document, choosing the format from the file extension
/// (RON when unknown).
pub fn load_from_file(path: &Path) -> Result<Adventure, FormatError> {
    let contents = std::fs::read_to_string(path)?;
    parse_as(&contents, Format::from_path(path).unwrap_or_default())
}

pub fn save_to_file(adventure: &Adventure, path: &Path) -> Result<(), FormatError> {
    let serialized = serialize_as(adventure, Format::from_path(path).unwrap_or_default())?;
    std::fs::write(path, serialized)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Adventure {
        Adventure::new("The \"Quiet\" Mill", &["Wind turns the sails.", "Nobody is home."])
            .with_item(Item::new("flour", "Sack of flour"))
            .with_item(Item::new("coin", "Copper coin"))
            .with_passage(
                Passage::new(1, &["The mill door creaks."])
                    .with_choice("Climb the stairs", 3)
                    .with_choice("Search the sacks", 2)
                    .with_notes("hub passage"),
            )
            .with_passage(
                Passage::new(2, &["Flour everywhere.", "A coin glints."])
                    .with_effect(Effect::add("flour"))
                    .with_effect(Effect::add("coin"))
                    .with_choice("Back", 1),
            )
            .with_passage(
                Passage::new(3, &["The miller waits."])
                    .with_effect(Effect::remove("coin"))
                    .with_ending("bargain"),
            )
    }

    #[test]
    fn ron_round_trip() {
        let adv = sample();
        let text = serialize(&adv).unwrap();
        assert_eq!(parse(&text).unwrap(), adv);
    }

    #[test]
    fn json_round_trip() {
        let adv = sample();
        let text = serialize_as(&adv, Format::Json).unwrap();
        assert!(text.contains("\"endingType\": \"bargain\""));
        assert!(text.contains("\"type\": \"removeItem\""));
        assert_eq!(parse_as(&text, Format::Json).unwrap(), adv);
    }

    #[test]
    fn order_is_preserved() {
        let adv = sample();
        let back = parse(&serialize(&adv).unwrap()).unwrap();
        assert_eq!(back.passages[0].choices[0].goto, PassageId(3));
        assert_eq!(back.passages[1].effects[0], Effect::add("flour"));
        assert_eq!(back.items[0].id, ItemId::from("flour"));
    }

    #[test]
    fn parse_minimal_document() {
        let input = r#"(
            metadata: (title: "Tiny"),
            introduction: (paragraphs: ["Hello."]),
            passages: [
                (id: 1, paragraphs: ["Bye."], endingType: Some("end")),
            ],
        )"#;
        let adv = parse(input).unwrap();
        assert!(adv.items.is_empty());
        assert!(adv.passages[0].is_terminal());
        assert_eq!(adv.passages[0].ending_type.as_deref(), Some("end"));
    }

    #[test]
    fn parse_does_not_validate() {
        let input = r#"(
            metadata: (title: ""),
            introduction: (paragraphs: []),
            passages: [
                (id: 1, paragraphs: [], choices: [(text: "", goto: 42)]),
                (id: 1, paragraphs: [], effects: [(type: "addItem", item: "ghost")]),
            ],
        )"#;
        let adv = parse(input).unwrap();
        assert_eq!(adv.passages.len(), 2);
    }

    #[test]
    fn malformed_syntax_is_a_parse_error() {
        let err = parse("(metadata: (title: \"x\"),").unwrap_err();
        assert!(matches!(err, FormatError::Parse { .. }), "{err}");

        let err = parse_as("{\"metadata\": ", Format::Json).unwrap_err();
        assert!(matches!(err, FormatError::Parse { .. }), "{err}");
    }

    #[test]
    fn missing_field_is_a_schema_error() {
        let err = parse(r#"(metadata: (title: "x"), passages: [])"#).unwrap_err();
        assert!(matches!(err, FormatError::Schema(_)), "{err}");
    }

    #[test]
    fn non_integer_goto_is_a_schema_error() {
        let input = r#"(
            metadata: (title: "x"),
            introduction: (paragraphs: ["a"]),
            passages: [(id: 1, paragraphs: ["a"], choices: [(text: "go", goto: "two")])],
        )"#;
        let err = parse(input).unwrap_err();
        assert!(matches!(err, FormatError::Schema(_)), "{err}");

        let json = r#"{"metadata": {"title": "x"}, "introduction": {"paragraphs": ["a"]},
            "passages": [{"id": 1, "paragraphs": ["a"], "choices": [{"text": "go", "goto": "2"}]}]}"#;
        let err = parse_as(json, Format::Json).unwrap_err();
        assert!(matches!(err, FormatError::Schema(_)), "{err}");
    }

    fn ron_with_passage(passage: &str) -> String {
        format!(
            r#"(
            metadata: (title: "x"),
            introduction: (paragraphs: ["a"]),
            passages: [{passage}],
        )"#
        )
    }

    #[test]
    fn wrong_value_types_are_schema_errors() {
        let cases = [
            ron_with_passage(r#"(id: 1, paragraphs: ["a"], choices: [(text: "go", goto: 2.5)])"#),
            ron_with_passage(r#"(id: 1, paragraphs: ["a"], choices: [5])"#),
            ron_with_passage(r#"(id: 4294967296, paragraphs: ["a"], endingType: Some("e"))"#),
            ron_with_passage(r#"(id: 1, paragraphs: ["a"], endingType: "e")"#),
            ron_with_passage(r#"(id: -1, paragraphs: ["a"], endingType: Some("e"))"#),
            r#"(metadata: 5, introduction: (paragraphs: []), passages: [])"#.to_string(),
            r#"(metadata: (title: true), introduction: (paragraphs: []), passages: [])"#.to_string(),
        ];
        for input in &cases {
            let err = parse(input).unwrap_err();
            assert!(matches!(err, FormatError::Schema(_)), "{input}: {err}");
        }
    }

    #[test]
    fn both_formats_agree_on_a_float_goto() {
        let ron_err = parse(&ron_with_passage(
            r#"(id: 1, paragraphs: ["a"], choices: [(text: "go", goto: 2.5)])"#,
        ))
        .unwrap_err();
        let json = r#"{"metadata": {"title": "x"}, "introduction": {"paragraphs": ["a"]},
            "passages": [{"id": 1, "paragraphs": ["a"], "choices": [{"text": "go", "goto": 2.5}]}]}"#;
        let json_err = parse_as(json, Format::Json).unwrap_err();
        assert!(matches!(ron_err, FormatError::Schema(_)), "{ron_err}");
        assert!(matches!(json_err, FormatError::Schema(_)), "{json_err}");
    }

    #[test]
    fn schema_errors_keep_their_position() {
        let err = parse(&ron_with_passage(r#"(id: 1, paragraphs: ["a"], choices: [5])"#))
            .unwrap_err();
        assert!(matches!(&err, FormatError::Schema(m) if m.contains("line 4")), "{err}");
    }

    #[test]
    fn duplicate_field_is_a_schema_error() {
        let err = parse(r#"(metadata: (title: "x", title: "y"), introduction: (paragraphs: []), passages: [])"#)
            .unwrap_err();
        assert!(matches!(err, FormatError::Schema(_)), "{err}");
    }

    #[test]
    fn unknown_effect_type_is_a_schema_error() {
        let input = r#"(
            metadata: (title: "x"),
            introduction: (paragraphs: ["a"]),
            passages: [(id: 1, paragraphs: ["a"], effects: [(type: "teleport", item: "k")], endingType: Some("e"))],
        )"#;
        let err = parse(input).unwrap_err();
        assert!(matches!(&err, FormatError::Schema(m) if m.contains("teleport")));
    }

    #[test]
    fn zero_ids_are_schema_errors() {
        let input = r#"(
            metadata: (title: "x"),
            introduction: (paragraphs: ["a"]),
            passages: [(id: 0, paragraphs: ["a"], endingType: Some("e"))],
        )"#;
        assert!(matches!(parse(input), Err(FormatError::Schema(_))));
    }

    #[test]
    fn format_from_path() {
        assert_eq!(Format::from_path(Path::new("a/b.ron")), Some(Format::Ron));
        assert_eq!(Format::from_path(Path::new("b.JSON")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("b.yaml")), None);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mill.json");
        save_to_file(&sample(), &path).unwrap();
        assert_eq!(load_from_file(&path).unwrap(), sample());
    }
}
