use crate::error::Res;
use crate::model::Amount;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::io::Cursor;
use std::str::FromStr;

/// Represents the transaction table, including the header order it was loaded with.
///
/// The identity of a transaction is its position in `data`. That position is only stable for the
/// lifetime of one loaded copy; there is no global id that survives a reload.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transactions {
    headers: Vec<String>,
    data: Vec<Transaction>,
}

impl Default for Transactions {
    fn default() -> Self {
        Self::from_data(Vec::new())
    }
}

impl Transactions {
    /// Parses CSV bytes with a header row. Unknown columns are kept in `other_fields` and written
    /// back in their original position. A `Memo` column is added if the file does not have one.
    pub(crate) fn parse_csv(bytes: &[u8]) -> Res<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(Cursor::new(bytes));

        let mut headers: Vec<String> = rdr
            .headers()
            .context("Unable to read the transactions header row")?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();
        validate_headers(&headers)?;

        let mut data = Vec::new();
        for (row_ix, record) in rdr.records().enumerate() {
            let record = record
                .with_context(|| format!("Unable to read transactions row {}", row_ix + 2))?;
            if record.len() > headers.len() {
                bail!(
                    "A row longer than the headers list was encountered at row {}",
                    row_ix + 2
                );
            }
            let txn = Transaction::new_with_headers(headers.as_slice(), record.iter())
                .with_context(|| format!("Unable to parse transactions row {}", row_ix + 2))?;
            data.push(txn);
        }

        if !headers.iter().any(|h| h == MEMO_STR) {
            headers.push(MEMO_STR.to_string());
        }

        Ok(Self { headers, data })
    }

    /// Writes the table as CSV with a header row, using the loaded header order.
    pub(crate) fn to_csv(&self) -> Res<Vec<u8>> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(&self.headers)
            .context("Unable to write transactions header row")?;
        for txn in &self.data {
            wtr.write_record(txn.to_row(&self.headers))
                .context("Unable to write transactions row")?;
        }
        wtr.into_inner()
            .map_err(|e| anyhow::anyhow!("Unable to flush transactions CSV: {e}"))
    }

    /// Creates a table from rows using the standard column order.
    pub fn from_data(data: Vec<Transaction>) -> Self {
        Self {
            headers: TransactionColumn::ALL
                .iter()
                .map(|c| c.as_header_str().to_string())
                .collect(),
            data,
        }
    }

    pub fn data(&self) -> &[Transaction] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [Transaction] {
        &mut self.data
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Represents a single row of the transaction table.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    pub(crate) date: String,
    pub(crate) description: String,
    /// `None` for a blank cell, which is written back blank.
    pub(crate) amount: Option<Amount>,
    pub(crate) currency: String,
    pub(crate) category: String,
    pub(crate) card: String,
    pub(crate) month: String,
    #[serde(rename = "type")]
    pub(crate) r#type: String,
    pub(crate) memo: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) other_fields: BTreeMap<String, String>,
}

impl Transaction {
    pub fn new_with_headers<S1, S2, I>(headers: &[S1], values: I) -> Res<Self>
    where
        S1: AsRef<str>,
        S2: Into<String>,
        I: IntoIterator<Item = S2>,
    {
        let mut transaction = Transaction::default();
        for (ix, value) in values.into_iter().map(|s| s.into()).enumerate() {
            let header = headers
                .get(ix)
                .with_context(|| format!("No header found for column index {ix}"))?
                .as_ref();
            transaction.set_with_header(header, value)?;
        }
        Ok(transaction)
    }

    pub fn set_with_header<S1, S2>(&mut self, header: S1, value: S2) -> Res<()>
    where
        S1: AsRef<str>,
        S2: Into<String>,
    {
        let header = header.as_ref();
        let value = value.into();

        match TransactionColumn::from_header(header) {
            Ok(col) => match col {
                TransactionColumn::Date => self.date = value,
                TransactionColumn::Description => self.description = value,
                TransactionColumn::Amount => {
                    self.amount = match value.trim() {
                        "" => None,
                        v => Some(Amount::from_str(v)?),
                    }
                }
                TransactionColumn::Currency => self.currency = value,
                TransactionColumn::Category => self.category = not_nan(value),
                TransactionColumn::Card => self.card = value,
                TransactionColumn::Month => self.month = value,
                TransactionColumn::Type => self.r#type = value,
                TransactionColumn::Memo => self.memo = not_nan(value),
            },
            Err(_) => {
                let _ = self.other_fields.insert(header.to_string(), value);
            }
        }

        Ok(())
    }

    pub fn get_by_header(&self, header: &str) -> String {
        match TransactionColumn::from_header(header) {
            Ok(col) => match col {
                TransactionColumn::Date => self.date.clone(),
                TransactionColumn::Description => self.description.clone(),
                TransactionColumn::Amount => self.amount.map(|a| a.to_string()).unwrap_or_default(),
                TransactionColumn::Currency => self.currency.clone(),
                TransactionColumn::Category => self.category.clone(),
                TransactionColumn::Card => self.card.clone(),
                TransactionColumn::Month => self.month.clone(),
                TransactionColumn::Type => self.r#type.clone(),
                TransactionColumn::Memo => self.memo.clone(),
            },
            Err(_) => self.other_fields.get(header).cloned().unwrap_or_default(),
        }
    }

    /// Given the order of the `headers`, convert the field values to a row.
    pub fn to_row(&self, headers: &[String]) -> Vec<String> {
        headers.iter().map(|h| self.get_by_header(h)).collect()
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Option<Amount> {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn card(&self) -> &str {
        &self.card
    }

    pub fn month(&self) -> &str {
        &self.month
    }

    pub fn r#type(&self) -> &str {
        &self.r#type
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }
}

/// Spreadsheet exports write missing text cells as `nan`; those are empty strings to us.
fn not_nan(value: String) -> String {
    if value.eq_ignore_ascii_case("nan") {
        String::new()
    } else {
        value
    }
}

fn validate_headers(headers: &[String]) -> Res<()> {
    let mut seen = HashSet::new();
    for header in headers {
        if !seen.insert(header.as_str()) {
            bail!("Encountered a duplicate header '{header}' in the transactions data");
        }
    }
    if !headers.iter().any(|h| h == DESCRIPTION_STR) {
        bail!("The transactions data has no '{DESCRIPTION_STR}' column");
    }
    Ok(())
}

/// Represents the known columns of the transaction table.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionColumn {
    #[default]
    Date,
    Description,
    Amount,
    Currency,
    Category,
    Card,
    Month,
    Type,
    Memo,
}

serde_plain::derive_display_from_serialize!(TransactionColumn);
serde_plain::derive_fromstr_from_deserialize!(TransactionColumn);

impl TransactionColumn {
    pub const ALL: [TransactionColumn; 9] = [
        TransactionColumn::Date,
        TransactionColumn::Description,
        TransactionColumn::Amount,
        TransactionColumn::Currency,
        TransactionColumn::Category,
        TransactionColumn::Card,
        TransactionColumn::Month,
        TransactionColumn::Type,
        TransactionColumn::Memo,
    ];

    pub fn from_header(header: impl AsRef<str>) -> Res<TransactionColumn> {
        let header_str = header.as_ref();
        match header_str {
            DATE_STR => Ok(TransactionColumn::Date),
            DESCRIPTION_STR => Ok(TransactionColumn::Description),
            AMOUNT_STR => Ok(TransactionColumn::Amount),
            CURRENCY_STR => Ok(TransactionColumn::Currency),
            CATEGORY_STR => Ok(TransactionColumn::Category),
            CARD_STR => Ok(TransactionColumn::Card),
            MONTH_STR => Ok(TransactionColumn::Month),
            TYPE_STR => Ok(TransactionColumn::Type),
            MEMO_STR => Ok(TransactionColumn::Memo),
            bad => bail!("Invalid transaction column name '{bad}'"),
        }
    }

    pub fn as_header_str(&self) -> &'static str {
        match self {
            TransactionColumn::Date => DATE_STR,
            TransactionColumn::Description => DESCRIPTION_STR,
            TransactionColumn::Amount => AMOUNT_STR,
            TransactionColumn::Currency => CURRENCY_STR,
            TransactionColumn::Category => CATEGORY_STR,
            TransactionColumn::Card => CARD_STR,
            TransactionColumn::Month => MONTH_STR,
            TransactionColumn::Type => TYPE_STR,
            TransactionColumn::Memo => MEMO_STR,
        }
    }
}

pub(super) const DATE_STR: &str = "Date";
pub(super) const DESCRIPTION_STR: &str = "Description";
pub(super) const AMOUNT_STR: &str = "Amount";
pub(super) const CURRENCY_STR: &str = "Currency";
pub(super) const CATEGORY_STR: &str = "Category";
pub(super) const CARD_STR: &str = "Card";
pub(super) const MONTH_STR: &str = "Month";
pub(super) const TYPE_STR: &str = "Type";
pub(super) const MEMO_STR: &str = "Memo";
