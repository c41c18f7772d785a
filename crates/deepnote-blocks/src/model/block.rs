//! The block union.

use serde::Serialize;
use serde_json::Value;
use serde_with::skip_serializing_none;
use std::fmt;
use std::str::FromStr;

use super::metadata::*;

/// Fields every block carries.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    pub id: String,
    pub block_group: String,
    pub sorting_key: String,
    pub content_hash: Option<String>,
    pub version: Option<u64>,
}

/// Execution record of an executable block.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionState {
    pub execution_count: Option<i64>,
    pub execution_started_at: Option<String>,
    pub execution_finished_at: Option<String>,
    pub outputs: Option<Vec<Value>>,
}

/// A block without an execution record.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentationBlock<F> {
    #[serde(flatten)]
    pub header: BlockHeader,
    pub content: Option<String>,
    pub metadata: PresentationMetadata<F>,
}

/// A block that runs and keeps an execution record.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutableBlock<F> {
    #[serde(flatten)]
    pub header: BlockHeader,
    pub content: Option<String>,
    pub metadata: ExecutableMetadata<F>,
    #[serde(flatten)]
    pub execution: ExecutionState,
}

/// A notebook block, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Block {
    #[serde(rename = "markdown")]
    Markdown(PresentationBlock<NoFields>),
    #[serde(rename = "image")]
    Image(PresentationBlock<ImageFields>),
    #[serde(rename = "separator")]
    Separator(PresentationBlock<NoFields>),
    #[serde(rename = "text-cell-h1")]
    Heading1(PresentationBlock<NoFields>),
    #[serde(rename = "text-cell-h2")]
    Heading2(PresentationBlock<NoFields>),
    #[serde(rename = "text-cell-h3")]
    Heading3(PresentationBlock<NoFields>),
    #[serde(rename = "text-cell-p")]
    Paragraph(PresentationBlock<NoFields>),
    #[serde(rename = "text-cell-bullet")]
    Bullet(PresentationBlock<NoFields>),
    #[serde(rename = "text-cell-todo")]
    Todo(PresentationBlock<TodoFields>),
    #[serde(rename = "text-cell-callout")]
    Callout(PresentationBlock<CalloutFields>),

    #[serde(rename = "code")]
    Code(ExecutableBlock<CodeFields>),
    #[serde(rename = "sql")]
    Sql(ExecutableBlock<SqlFields>),
    #[serde(rename = "notebook-function")]
    NotebookFunction(ExecutableBlock<NotebookFunctionFields>),
    #[serde(rename = "visualization")]
    Visualization(ExecutableBlock<VisualizationFields>),
    #[serde(rename = "button")]
    Button(ExecutableBlock<ButtonFields>),
    #[serde(rename = "big-number")]
    BigNumber(ExecutableBlock<BigNumberFields>),

    #[serde(rename = "input-text")]
    InputText(ExecutableBlock<TextInputFields>),
    #[serde(rename = "input-textarea")]
    InputTextarea(ExecutableBlock<TextInputFields>),
    #[serde(rename = "input-checkbox")]
    InputCheckbox(ExecutableBlock<CheckboxInputFields>),
    #[serde(rename = "input-select")]
    InputSelect(ExecutableBlock<SelectInputFields>),
    #[serde(rename = "input-slider")]
    InputSlider(ExecutableBlock<SliderInputFields>),
    #[serde(rename = "input-date")]
    InputDate(ExecutableBlock<DateInputFields>),
    #[serde(rename = "input-date-range")]
    InputDateRange(ExecutableBlock<DateRangeInputFields>),
    #[serde(rename = "input-file")]
    InputFile(ExecutableBlock<FileInputFields>),
}

/// Applies `$body` to the inner block of whichever variant `$block` holds.
macro_rules! with_block {
    ($block:expr, $b:ident => $body:expr) => {
        match $block {
            Block::Markdown($b) => $body,
            Block::Image($b) => $body,
            Block::Separator($b) => $body,
            Block::Heading1($b) => $body,
            Block::Heading2($b) => $body,
            Block::Heading3($b) => $body,
            Block::Paragraph($b) => $body,
            Block::Bullet($b) => $body,
            Block::Todo($b) => $body,
            Block::Callout($b) => $body,
            Block::Code($b) => $body,
            Block::Sql($b) => $body,
            Block::NotebookFunction($b) => $body,
            Block::Visualization($b) => $body,
            Block::Button($b) => $body,
            Block::BigNumber($b) => $body,
            Block::InputText($b) => $body,
            Block::InputTextarea($b) => $body,
            Block::InputCheckbox($b) => $body,
            Block::InputSelect($b) => $body,
            Block::InputSlider($b) => $body,
            Block::InputDate($b) => $body,
            Block::InputDateRange($b) => $body,
            Block::InputFile($b) => $body,
        }
    };
}

impl Block {
    pub fn block_type(&self) -> BlockType {
        match self {
            Block::Markdown(_) => BlockType::Markdown,
            Block::Image(_) => BlockType::Image,
            Block::Separator(_) => BlockType::Separator,
            Block::Heading1(_) => BlockType::Heading1,
            Block::Heading2(_) => BlockType::Heading2,
            Block::Heading3(_) => BlockType::Heading3,
            Block::Paragraph(_) => BlockType::Paragraph,
            Block::Bullet(_) => BlockType::Bullet,
            Block::Todo(_) => BlockType::Todo,
            Block::Callout(_) => BlockType::Callout,
            Block::Code(_) => BlockType::Code,
            Block::Sql(_) => BlockType::Sql,
            Block::NotebookFunction(_) => BlockType::NotebookFunction,
            Block::Visualization(_) => BlockType::Visualization,
            Block::Button(_) => BlockType::Button,
            Block::BigNumber(_) => BlockType::BigNumber,
            Block::InputText(_) => BlockType::InputText,
            Block::InputTextarea(_) => BlockType::InputTextarea,
            Block::InputCheckbox(_) => BlockType::InputCheckbox,
            Block::InputSelect(_) => BlockType::InputSelect,
            Block::InputSlider(_) => BlockType::InputSlider,
            Block::InputDate(_) => BlockType::InputDate,
            Block::InputDateRange(_) => BlockType::InputDateRange,
            Block::InputFile(_) => BlockType::InputFile,
        }
    }

    pub fn header(&self) -> &BlockHeader {
        with_block!(self, b => &b.header)
    }

    pub fn header_mut(&mut self) -> &mut BlockHeader {
        with_block!(self, b => &mut b.header)
    }

    pub fn id(&self) -> &str {
        &self.header().id
    }

    /// Stored text or source; empty when the block has none.
    pub fn content(&self) -> &str {
        with_block!(self, b => b.content.as_deref().unwrap_or_default())
    }
}

/// Block discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Markdown,
    Image,
    Separator,
    Heading1,
    Heading2,
    Heading3,
    Paragraph,
    Bullet,
    Todo,
    Callout,
    Code,
    Sql,
    NotebookFunction,
    Visualization,
    Button,
    BigNumber,
    InputText,
    InputTextarea,
    InputCheckbox,
    InputSelect,
    InputSlider,
    InputDate,
    InputDateRange,
    InputFile,
}

/// Block families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockFamily {
    Presentation,
    Computation,
    Input,
}

impl BlockType {
    pub const ALL: [BlockType; 24] = [
        BlockType::Markdown,
        BlockType::Image,
        BlockType::Separator,
        BlockType::Heading1,
        BlockType::Heading2,
        BlockType::Heading3,
        BlockType::Paragraph,
        BlockType::Bullet,
        BlockType::Todo,
        BlockType::Callout,
        BlockType::Code,
        BlockType::Sql,
        BlockType::NotebookFunction,
        BlockType::Visualization,
        BlockType::Button,
        BlockType::BigNumber,
        BlockType::InputText,
        BlockType::InputTextarea,
        BlockType::InputCheckbox,
        BlockType::InputSelect,
        BlockType::InputSlider,
        BlockType::InputDate,
        BlockType::InputDateRange,
        BlockType::InputFile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Markdown => "markdown",
            BlockType::Image => "image",
            BlockType::Separator => "separator",
            BlockType::Heading1 => "text-cell-h1",
            BlockType::Heading2 => "text-cell-h2",
            BlockType::Heading3 => "text-cell-h3",
            BlockType::Paragraph => "text-cell-p",
            BlockType::Bullet => "text-cell-bullet",
            BlockType::Todo => "text-cell-todo",
            BlockType::Callout => "text-cell-callout",
            BlockType::Code => "code",
            BlockType::Sql => "sql",
            BlockType::NotebookFunction => "notebook-function",
            BlockType::Visualization => "visualization",
            BlockType::Button => "button",
            BlockType::BigNumber => "big-number",
            BlockType::InputText => "input-text",
            BlockType::InputTextarea => "input-textarea",
            BlockType::InputCheckbox => "input-checkbox",
            BlockType::InputSelect => "input-select",
            BlockType::InputSlider => "input-slider",
            BlockType::InputDate => "input-date",
            BlockType::InputDateRange => "input-date-range",
            BlockType::InputFile => "input-file",
        }
    }

    pub fn family(&self) -> BlockFamily {
        match self {
            BlockType::Markdown
            | BlockType::Image
            | BlockType::Separator
            | BlockType::Heading1
            | BlockType::Heading2
            | BlockType::Heading3
            | BlockType::Paragraph
            | BlockType::Bullet
            | BlockType::Todo
            | BlockType::Callout => BlockFamily::Presentation,
            BlockType::Code
            | BlockType::Sql
            | BlockType::NotebookFunction
            | BlockType::Visualization
            | BlockType::Button
            | BlockType::BigNumber => BlockFamily::Computation,
            BlockType::InputText
            | BlockType::InputTextarea
            | BlockType::InputCheckbox
            | BlockType::InputSelect
            | BlockType::InputSlider
            | BlockType::InputDate
            | BlockType::InputDateRange
            | BlockType::InputFile => BlockFamily::Input,
        }
    }

    /// Executable blocks carry execution metadata and an execution record.
    pub fn is_executable(&self) -> bool {
        self.family() != BlockFamily::Presentation
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a discriminator outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBlockType(pub String);

impl fmt::Display for UnknownBlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown block type '{}'", self.0)
    }
}

impl std::error::Error for UnknownBlockType {}

impl FromStr for BlockType {
    type Err = UnknownBlockType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownBlockType(s.to_string()))
    }
}
