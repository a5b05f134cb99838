//! Region labels and per-model label maps.
//!
//! Each supported detector configuration emits class ids from a fixed
//! vocabulary. [`Label`] is the union of those vocabularies; a [`LabelMap`]
//! restricts it to the ids and names of one model.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every label any supported layout model can assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    // PubLayNet
    /// Body text
    Text,
    /// Title
    Title,
    /// List
    List,
    /// Table
    Table,
    /// Figure
    Figure,

    // PRImA
    /// Text region
    TextRegion,
    /// Image region
    ImageRegion,
    /// Table region
    TableRegion,
    /// Formula region
    MathsRegion,
    /// Separator line
    SeparatorRegion,
    /// Anything else
    OtherRegion,

    // HJDataset
    /// Page frame
    PageFrame,
    /// Row
    Row,
    /// Title region
    TitleRegion,
    /// Subtitle
    Subtitle,
    /// Other
    Other,
}

impl Label {
    /// The name the detector uses for this label.
    pub fn name(&self) -> &'static str {
        match self {
            Label::Text => "Text",
            Label::Title => "Title",
            Label::List => "List",
            Label::Table => "Table",
            Label::Figure => "Figure",
            Label::TextRegion => "TextRegion",
            Label::ImageRegion => "ImageRegion",
            Label::TableRegion => "TableRegion",
            Label::MathsRegion => "MathsRegion",
            Label::SeparatorRegion => "SeparatorRegion",
            Label::OtherRegion => "OtherRegion",
            Label::PageFrame => "Page Frame",
            Label::Row => "Row",
            Label::TitleRegion => "Title Region",
            Label::Subtitle => "Subtitle",
            Label::Other => "Other",
        }
    }

    /// True for labels that normally carry running text.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            Label::Text
                | Label::Title
                | Label::List
                | Label::TextRegion
                | Label::TitleRegion
                | Label::Subtitle
        )
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Class id to label mapping for a single detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelMap {
    entries: Vec<(u32, Label)>,
}

impl LabelMap {
    /// Build a label map from `(class id, label)` pairs.
    pub fn new(entries: impl IntoIterator<Item = (u32, Label)>) -> Self {
        let mut entries: Vec<(u32, Label)> = entries.into_iter().collect();
        entries.sort_by_key(|(id, _)| *id);
        entries.dedup_by_key(|(id, _)| *id);
        Self { entries }
    }

    /// PubLayNet: text, title, list, table, figure.
    pub fn publaynet() -> Self {
        Self::new([
            (0, Label::Text),
            (1, Label::Title),
            (2, Label::List),
            (3, Label::Table),
            (4, Label::Figure),
        ])
    }

    /// PRImA layout analysis dataset.
    pub fn prima() -> Self {
        Self::new([
            (1, Label::TextRegion),
            (2, Label::ImageRegion),
            (3, Label::TableRegion),
            (4, Label::MathsRegion),
            (5, Label::SeparatorRegion),
            (6, Label::OtherRegion),
        ])
    }

    /// HJDataset (historical Japanese documents). Its "Text Region" class is
    /// the same concept as PRImA's and shares [`Label::TextRegion`].
    pub fn hjdataset() -> Self {
        Self::new([
            (1, Label::PageFrame),
            (2, Label::Row),
            (3, Label::TitleRegion),
            (4, Label::TextRegion),
            (5, Label::Title),
            (6, Label::Subtitle),
            (7, Label::Other),
        ])
    }

    /// Label assigned to `class_id`, if any.
    pub fn get(&self, class_id: u32) -> Option<Label> {
        self.entries
            .iter()
            .find(|(id, _)| *id == class_id)
            .map(|(_, label)| *label)
    }

    /// Resolve a label by the name the detector reports.
    ///
    /// Matching is exact first, then case-insensitive ignoring spaces, so
    /// both `"Text Region"` and `"TextRegion"` resolve under HJDataset.
    pub fn by_name(&self, name: &str) -> Option<Label> {
        let squash = |s: &str| -> String {
            s.chars()
                .filter(|c| !c.is_whitespace())
                .flat_map(char::to_lowercase)
                .collect()
        };
        self.labels()
            .find(|label| label.name() == name)
            .or_else(|| {
                let wanted = squash(name);
                self.labels().find(|label| squash(label.name()) == wanted)
            })
    }

    /// Whether `label` is part of this map.
    pub fn contains(&self, label: Label) -> bool {
        self.labels().any(|l| l == label)
    }

    /// Labels in class-id order.
    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.entries.iter().map(|(_, label)| *label)
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the map has no classes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Like [`LabelMap::get`] but reports the model name on failure.
    pub fn require_id(&self, model: &str, class_id: u32) -> Result<Label> {
        self.get(class_id).ok_or_else(|| Error::UnknownLabel {
            model: model.to_string(),
            label: class_id.to_string(),
        })
    }

    /// Like [`LabelMap::by_name`] but reports the model name on failure.
    pub fn require_name(&self, model: &str, name: &str) -> Result<Label> {
        self.by_name(name).ok_or_else(|| Error::UnknownLabel {
            model: model.to_string(),
            label: name.to_string(),
        })
    }
}
