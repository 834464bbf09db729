use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::booking::default_currency;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletBalance {
    #[serde(default)]
    pub wallet_id: Option<u64>,
    #[serde(default)]
    pub balance: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMoney {
    pub amount: f64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddMoneyReceipt {
    #[serde(default)]
    pub message: String,
    pub new_balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub id: Option<u64>,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub date: DateTime<Utc>,
}

impl Transaction {
    /// `+₹100` for credits, `-₹250` for debits.
    pub fn signed_amount(&self) -> String {
        let sign = match self.kind {
            TransactionKind::Credit => '+',
            TransactionKind::Debit => '-',
        };
        format!("{sign}₹{}", self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_kind_comes_from_type_field() {
        let txn: Transaction = serde_json::from_str(
            r#"{"description":"Money added","type":"credit","amount":500.0,"date":"2025-01-02T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(txn.kind, TransactionKind::Credit);
        assert_eq!(txn.signed_amount(), "+₹500");
    }

    #[test]
    fn balance_defaults_currency() {
        let balance: WalletBalance = serde_json::from_str(r#"{"balance":12.5}"#).unwrap();
        assert_eq!(balance.currency, "INR");
        assert!(balance.wallet_id.is_none());
    }
}
