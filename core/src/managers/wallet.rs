use log::{error, info};

use crate::error::ApiError;
use crate::transport::{ApiClient, Transport};
use crate::types::{format_rupees, AddMoney, AddMoneyReceipt, Transaction, UserId, WalletBalance};

/// Smallest accepted top-up, in rupees.
pub const MIN_TOP_UP: f64 = 100.0;
pub const DEFAULT_TRANSACTION_LIMIT: u32 = 20;

#[derive(Debug, Default)]
pub struct WalletManager {
    balance: f64,
    transactions: Vec<Transaction>,
}

impl WalletManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load_balance<T: Transport>(&mut self, api: &ApiClient<T>, user_id: UserId) -> Result<f64, ApiError> {
        info!("Loading wallet balance for user: {user_id}");
        let WalletBalance { balance, .. } = api.call(api.client().build_wallet_balance(user_id)).await?;
        self.balance = balance;
        info!("Wallet balance: {}", self.format_balance());
        Ok(balance)
    }

    /// Top up the wallet. The cached balance becomes the server's new balance.
    pub async fn add_money<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        user_id: UserId,
        amount: f64,
    ) -> Result<AddMoneyReceipt, ApiError> {
        if !amount.is_finite() || amount < MIN_TOP_UP {
            error!("Rejected top-up of {amount}");
            return Err(ApiError::validation("Minimum amount is ₹100"));
        }
        info!("Adding money: {}", format_rupees(amount));
        let input = AddMoney {
            amount,
            description: Some("Wallet top-up".to_string()),
        };
        let receipt = api.call(api.client().build_add_money(user_id, &input)?).await?;
        self.balance = receipt.new_balance;
        info!("Money added, new balance: {}", self.format_balance());
        Ok(receipt)
    }

    pub async fn load_transactions<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        user_id: UserId,
        limit: u32,
    ) -> Result<&[Transaction], ApiError> {
        info!("Loading transactions for user: {user_id}");
        self.transactions = api
            .call(api.client().build_wallet_transactions(user_id, limit))
            .await?;
        info!("Loaded {} transactions", self.transactions.len());
        Ok(&self.transactions)
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn has_sufficient_balance(&self, amount: f64) -> bool {
        self.balance >= amount
    }

    pub fn format_balance(&self) -> String {
        format_rupees(self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{api, ScriptedTransport};

    #[tokio::test]
    async fn top_up_below_minimum_is_rejected_locally() {
        let api = api(ScriptedTransport::new());
        let mut wallet = WalletManager::new();

        let err = wallet.add_money(&api, 7, 99.99).await.unwrap_err();

        assert_eq!(err.to_string(), "Minimum amount is ₹100");
        assert!(api.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn top_up_replaces_cached_balance() {
        let api = api(
            ScriptedTransport::new()
                .reply(200, r#"{"wallet_id":1,"balance":50.0,"currency":"INR"}"#)
                .reply(200, r#"{"message":"Money added successfully","new_balance":1284.5}"#),
        );
        let mut wallet = WalletManager::new();
        wallet.load_balance(&api, 7).await.unwrap();
        assert!(!wallet.has_sufficient_balance(250.0));

        wallet.add_money(&api, 7, 100.0).await.unwrap();

        assert_eq!(wallet.balance(), 1284.5);
        assert_eq!(wallet.format_balance(), "₹1284.50");
        assert!(wallet.has_sufficient_balance(250.0));
        let request = &api.transport().requests()[1];
        assert_eq!(request.path, "http://transit.test/api/wallet/7/add-money");
    }

    #[tokio::test]
    async fn transactions_use_requested_limit() {
        let api = api(ScriptedTransport::new().reply(
            200,
            r#"[{"id":1,"description":"Money added","type":"credit","amount":500.0,"date":"2025-01-02T10:00:00Z"}]"#,
        ));
        let mut wallet = WalletManager::new();

        let transactions = wallet.load_transactions(&api, 7, DEFAULT_TRANSACTION_LIMIT).await.unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(
            api.transport().requests()[0].path,
            "http://transit.test/api/wallet/7/transactions?limit=20"
        );
    }

    #[test]
    fn fresh_wallet_shows_zero() {
        assert_eq!(WalletManager::new().format_balance(), "₹0.00");
    }
}
