// Domain models - Expense
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Fixed set of expense categories
///
/// Serialized with the labels field users pick from, so documents stay
/// compatible with existing backups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum ExpenseCategory {
    #[default]
    #[serde(rename = "Alimentação")]
    Food,
    #[serde(rename = "Hospedagem")]
    Lodging,
    #[serde(rename = "Combustível")]
    Fuel,
    #[serde(rename = "Material")]
    Material,
    #[serde(rename = "Logística")]
    Logistics,
    #[serde(rename = "Deslocamento")]
    Travel,
    #[serde(rename = "Outros")]
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 7] = [
        ExpenseCategory::Food,
        ExpenseCategory::Lodging,
        ExpenseCategory::Fuel,
        ExpenseCategory::Material,
        ExpenseCategory::Logistics,
        ExpenseCategory::Travel,
        ExpenseCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ExpenseCategory::Food => "Alimentação",
            ExpenseCategory::Lodging => "Hospedagem",
            ExpenseCategory::Fuel => "Combustível",
            ExpenseCategory::Material => "Material",
            ExpenseCategory::Logistics => "Logística",
            ExpenseCategory::Travel => "Deslocamento",
            ExpenseCategory::Other => "Outros",
        }
    }
}

impl From<String> for ExpenseCategory {
    fn from(label: String) -> Self {
        ExpenseCategory::ALL
            .into_iter()
            .find(|category| category.label() == label)
            .unwrap_or(ExpenseCategory::Other)
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single expense entry with an optional receipt image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub date: String,
    /// Receipt number as printed, free text
    #[serde(default)]
    pub receipt: String,
    #[serde(default)]
    pub category: ExpenseCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub amount: f64,
    /// Embedded image data (data URL)
    #[serde(default)]
    pub receipt_img: Option<String>,
}

/// Older documents carry the amount as typed into the form, i.e. a string.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Number(f64),
        Text(String),
        Null(()),
    }

    let amount = match RawAmount::deserialize(deserializer)? {
        RawAmount::Number(n) => n,
        RawAmount::Null(()) => 0.0,
        RawAmount::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.replace(',', ".")
                    .parse::<f64>()
                    .map_err(|_| serde::de::Error::custom(format!("invalid amount: {:?}", s)))?
            }
        }
    };

    if !amount.is_finite() {
        return Err(serde::de::Error::custom(format!("amount must be finite, got {}", amount)));
    }
    Ok(amount)
}

impl Expense {
    /// Check the rules a stored document does not enforce on its own.
    pub fn validate(&self) -> Result<(), String> {
        if self.amount < 0.0 {
            return Err(format!("expense {} has a negative amount ({})", self.id, self.amount));
        }
        Ok(())
    }
}
