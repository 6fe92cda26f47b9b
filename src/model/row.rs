use crate::model::Amount;
use crate::{utils, Result};
use anyhow::{bail, Context};
use chrono::NaiveDate;
use serde::de::{IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::io::Read;
use std::path::Path;
use tracing::{debug, trace, warn};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// The identifier of a row. Callers may supply integers or strings; either is kept as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Text(String),
}

impl RowId {
    /// Creates a random identifier for rows that arrive without one.
    pub fn generate() -> Self {
        RowId::Text(Uuid::new_v4().to_string())
    }

    /// True if `id` is the textual form of this identifier, e.g. both `1` and `"1"` match `"1"`.
    pub fn matches(&self, id: &str) -> bool {
        match self {
            RowId::Int(i) => id.trim().parse::<i64>().is_ok_and(|other| other == *i),
            RowId::Text(s) => s == id,
        }
    }
}

impl Display for RowId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(i) => Display::fmt(i, f),
            RowId::Text(s) => Display::fmt(s, f),
        }
    }
}

impl From<i64> for RowId {
    fn from(value: i64) -> Self {
        RowId::Int(value)
    }
}

impl From<i32> for RowId {
    fn from(value: i32) -> Self {
        RowId::Int(i64::from(value))
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        RowId::Text(value.to_string())
    }
}

impl From<String> for RowId {
    fn from(value: String) -> Self {
        RowId::Text(value)
    }
}

/// Accepts any JSON value as an id. Integers that fit in an `i64` stay integers, other scalars
/// keep their textual form, and `null` or structured values get a generated id.
struct RowIdVisitor;

impl<'de> Visitor<'de> for RowIdVisitor {
    type Value = RowId;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a string or integer id")
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<RowId, E> {
        Ok(RowId::Text(v.to_string()))
    }

    fn visit_string<E: serde::de::Error>(self, v: String) -> std::result::Result<RowId, E> {
        Ok(RowId::Text(v))
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> std::result::Result<RowId, E> {
        Ok(RowId::Int(v))
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> std::result::Result<RowId, E> {
        Ok(match i64::try_from(v) {
            Ok(i) => RowId::Int(i),
            Err(_) => RowId::Text(v.to_string()),
        })
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> std::result::Result<RowId, E> {
        Ok(RowId::Text(v.to_string()))
    }

    fn visit_bool<E: serde::de::Error>(self, v: bool) -> std::result::Result<RowId, E> {
        Ok(RowId::Text(v.to_string()))
    }

    fn visit_unit<E: serde::de::Error>(self) -> std::result::Result<RowId, E> {
        let id = RowId::generate();
        debug!("Row with a null id was given the id {id}");
        Ok(id)
    }

    fn visit_none<E: serde::de::Error>(self) -> std::result::Result<RowId, E> {
        self.visit_unit()
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<RowId, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(RowIdVisitor)
    }

    fn visit_seq<A>(self, seq: A) -> std::result::Result<RowId, A::Error>
    where
        A: SeqAccess<'de>,
    {
        IgnoredAny.visit_seq(seq)?;
        let id = RowId::generate();
        warn!("Array row id replaced with the id {id}");
        Ok(id)
    }

    fn visit_map<A>(self, map: A) -> std::result::Result<RowId, A::Error>
    where
        A: MapAccess<'de>,
    {
        IgnoredAny.visit_map(map)?;
        let id = RowId::generate();
        warn!("Object row id replaced with the id {id}");
        Ok(id)
    }
}

impl<'de> Deserialize<'de> for RowId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(RowIdVisitor)
    }
}

/// Represents one expenditure. Every field is fixed once the row has been ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default = "RowId::generate")]
    id: RowId,
    #[serde(default, deserialize_with = "loose_string")]
    date: String,
    #[serde(default, deserialize_with = "loose_string")]
    description: String,
    #[serde(default, deserialize_with = "loose_string")]
    category: String,
    #[serde(default, deserialize_with = "loose_string")]
    method: String,
    #[serde(default)]
    amount: Amount,
    #[serde(
        default,
        deserialize_with = "loose_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    notes: Option<String>,
}

impl Row {
    pub fn new(id: impl Into<RowId>, description: impl Into<String>, amount: Amount) -> Self {
        Self {
            id: id.into(),
            date: String::new(),
            description: description.into(),
            category: String::new(),
            method: String::new(),
            amount,
            notes: None,
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = non_empty(notes.into());
        self
    }

    pub fn id(&self) -> &RowId {
        &self.id
    }

    /// The raw date string as it was supplied.
    pub fn date(&self) -> &str {
        &self.date
    }

    /// The date, if it is a valid `YYYY-MM-DD` calendar date.
    pub fn date_value(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).ok()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// The text of the per-row "Open" action.
    pub fn open_label(&self) -> String {
        format!("Open row {}", self.id)
    }

    /// Given the CSV `field` and the `value`, set the appropriate struct field.
    fn set_field(&mut self, field: CsvField, value: &str) {
        match field {
            CsvField::Id => {
                if !value.trim().is_empty() {
                    self.id = parse_id(value);
                }
            }
            CsvField::Date => self.date = value.to_string(),
            CsvField::Description => self.description = value.to_string(),
            CsvField::Category => self.category = value.to_string(),
            CsvField::Method => self.method = value.to_string(),
            CsvField::Amount => self.amount = Amount::lenient(value),
            CsvField::Notes => self.notes = non_empty(value.to_string()),
        }
    }
}

/// The CSV columns that map onto `Row` fields.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum CsvField {
    Id,
    Date,
    Description,
    Category,
    Method,
    Amount,
    Notes,
}

impl CsvField {
    fn from_header(header: &str) -> Option<CsvField> {
        match header.trim().to_lowercase().as_str() {
            "id" => Some(CsvField::Id),
            "date" => Some(CsvField::Date),
            "description" => Some(CsvField::Description),
            "category" => Some(CsvField::Category),
            "method" | "payment method" => Some(CsvField::Method),
            "amount" | "amount ($)" => Some(CsvField::Amount),
            "notes" => Some(CsvField::Notes),
            _ => None,
        }
    }
}

/// Reads an id from CSV text. Only the canonical form of an integer becomes `RowId::Int`, so ids
/// such as `007` or `+5` stay text and survive a save and reload unchanged.
fn parse_id(value: &str) -> RowId {
    let trimmed = value.trim();
    match trimmed.parse::<i64>() {
        Ok(i) if i.to_string() == trimmed => RowId::Int(i),
        _ => RowId::Text(trimmed.to_string()),
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// The row collection handed to a table. It is always replaced wholesale, never patched.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rows(Vec<Row>);

impl Rows {
    pub fn new(rows: Vec<Row>) -> Self {
        Self(rows)
    }

    pub fn data(&self) -> &[Row] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Row> {
        self.0
    }

    /// Parses a JSON array of row objects. A JSON `null` is an empty collection.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let rows: Option<Vec<Row>> =
            serde_json::from_str(s).context("Unable to parse rows from JSON")?;
        Ok(Self(rows.unwrap_or_default()))
    }

    /// Reads rows from CSV data with a header line. Header names are matched case-insensitively
    /// and unknown columns are ignored. Rows without an `id` are given a generated one.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = rdr
            .headers()
            .context("Unable to read the CSV header line")?
            .clone();
        let fields: Vec<Option<CsvField>> = headers
            .iter()
            .map(|header| {
                let field = CsvField::from_header(header);
                if field.is_none() {
                    debug!("Ignoring unknown CSV column '{header}'");
                }
                field
            })
            .collect();

        let mut rows = Vec::new();
        for (ix, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("Unable to read CSV row {}", ix + 2))?;
            let mut row = Row::new(RowId::generate(), "", Amount::ZERO);
            for (field, value) in fields.iter().zip(record.iter()) {
                if let Some(field) = field {
                    row.set_field(*field, value);
                }
            }
            trace!("Parsed CSV row {}: {row:?}", ix + 2);
            rows.push(row);
        }
        Ok(Self(rows))
    }

    /// Loads rows from a `.json` or `.csv` file.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = utils::read(path).await?;
        let rows = match RowsFormat::from_path(path)? {
            RowsFormat::Json => Self::from_json_str(&content),
            RowsFormat::Csv => Self::from_csv_reader(content.as_bytes()),
        }
        .with_context(|| format!("Unable to load rows from {}", path.display()))?;
        debug!("Loaded {} rows from {}", rows.len(), path.display());
        Ok(rows)
    }

    /// Saves rows to a `.json` or `.csv` file.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let data = match RowsFormat::from_path(path)? {
            RowsFormat::Json => self.to_json_string()?,
            RowsFormat::Csv => self.to_csv_string()?,
        };
        utils::write(path, data).await
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.0).context("Unable to serialize rows to JSON")
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(CSV_HEADERS)?;
        for row in &self.0 {
            let amount = format!("{:.2}", row.amount().value());
            wtr.write_record([
                row.id().to_string().as_str(),
                row.date(),
                row.description(),
                row.category(),
                row.method(),
                amount.as_str(),
                row.notes().unwrap_or_default(),
            ])?;
        }
        let bytes = wtr.into_inner().context("Unable to flush CSV data")?;
        String::from_utf8(bytes).context("CSV output was not valid UTF-8")
    }
}

impl From<Vec<Row>> for Rows {
    fn from(value: Vec<Row>) -> Self {
        Rows(value)
    }
}

const CSV_HEADERS: [&str; 7] = [
    "id",
    "date",
    "description",
    "category",
    "method",
    "amount",
    "notes",
];

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum RowsFormat {
    Json,
    Csv,
}

impl RowsFormat {
    fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(RowsFormat::Json),
            "csv" => Ok(RowsFormat::Csv),
            _ => bail!(
                "Unsupported rows file '{}', expected a .json or .csv file",
                path.display()
            ),
        }
    }
}

/// Accepts any scalar and keeps its textual form. `null` becomes the empty string.
struct LooseString;

impl<'de> Visitor<'de> for LooseString {
    type Value = String;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a string, number, boolean or null")
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: serde::de::Error>(self, v: String) -> std::result::Result<String, E> {
        Ok(v)
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> std::result::Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> std::result::Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> std::result::Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_bool<E: serde::de::Error>(self, v: bool) -> std::result::Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_unit<E: serde::de::Error>(self) -> std::result::Result<String, E> {
        Ok(String::new())
    }

    fn visit_none<E: serde::de::Error>(self) -> std::result::Result<String, E> {
        Ok(String::new())
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LooseString)
    }

    fn visit_seq<A>(self, seq: A) -> std::result::Result<String, A::Error>
    where
        A: SeqAccess<'de>,
    {
        IgnoredAny.visit_seq(seq)?;
        warn!("Array value in a text field treated as empty");
        Ok(String::new())
    }

    fn visit_map<A>(self, map: A) -> std::result::Result<String, A::Error>
    where
        A: MapAccess<'de>,
    {
        IgnoredAny.visit_map(map)?;
        warn!("Object value in a text field treated as empty");
        Ok(String::new())
    }
}

fn loose_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LooseString)
}

fn loose_optional_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LooseString).map(non_empty)
}
