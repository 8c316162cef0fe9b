//! Budget tracker session
//!
//! Holds the viewer's transactions and categories. Category assignment is
//! optimistic: the local row is updated first and restored from a snapshot
//! if the backend rejects the change. The snapshot lives in a local variable
//! for the duration of the one call, never in shared state.

use chrono::NaiveDate;
use log::debug;

use crate::client::Client;
use crate::error::Error;
use crate::models::{BulkTransaction, Category, Transaction};

/// Client-side state for the budget page
#[derive(Debug, Default)]
pub struct BudgetSession {
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
}

impl BudgetSession {
    /// An empty session; call [`BudgetSession::refresh`] to populate it
    pub fn new() -> Self {
        BudgetSession::default()
    }

    /// The viewer's transactions, newest day first
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// The viewer's categories, sorted by name
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Fetch both lists from the backend
    pub async fn refresh(&mut self, client: &Client) -> Result<(), Error> {
        self.transactions = client.transactions().await?;
        self.categories = client.categories().await?;
        Ok(())
    }

    /// Assign a category to a transaction, or clear it with `None`
    ///
    /// The local row is updated before the request goes out; on backend
    /// rejection it is restored to the exact pre-call snapshot. Edits to
    /// different transactions are independent; racing edits to the same one
    /// are last-write-wins.
    pub async fn assign_category(
        &mut self,
        client: &Client,
        transaction_id: i64,
        category_id: Option<i64>,
    ) -> Result<(), Error> {
        let index = self
            .transactions
            .iter()
            .position(|txn| txn.id == transaction_id)
            .ok_or_else(|| {
                Error::Validation(format!("no transaction with id {}", transaction_id))
            })?;

        let snapshot = self.transactions[index].clone();
        apply_assignment(&mut self.transactions[index], &self.categories, category_id);

        if let Err(err) = client.assign_category(transaction_id, category_id).await {
            debug!("category assignment rejected, restoring transaction {}", transaction_id);
            self.transactions[index] = snapshot;
            return Err(err);
        }

        Ok(())
    }

    /// Create a new category and add it to the local list
    pub async fn add_category(&mut self, client: &Client, name: &str) -> Result<&Category, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Category name cannot be empty".to_string()));
        }

        let category = client.create_category(name).await?;
        self.categories.push(category);
        // NOTE(unwrap): pushed on the previous line
        Ok(self.categories.last().unwrap())
    }

    /// Import transactions pasted as plain text
    ///
    /// Each line must match `MM/DD/YYYY <signed-decimal-amount> <description>`;
    /// anything else is silently dropped. Zero matching lines is an error and
    /// no request is made. After a successful import the transaction list is
    /// refetched rather than merged locally.
    pub async fn bulk_import(&mut self, client: &Client, raw: &str) -> Result<usize, Error> {
        let parsed = parse_bulk_lines(raw);
        if parsed.is_empty() {
            return Err(Error::Validation(
                "no transactions found in pasted text".to_string(),
            ));
        }

        let receipt = client.bulk_import(&parsed).await?;
        self.transactions = client.transactions().await?;
        Ok(receipt.count)
    }
}

/// Parse pasted transaction lines, dropping the ones that don't match
pub fn parse_bulk_lines(raw: &str) -> Vec<BulkTransaction> {
    raw.lines().filter_map(parse_bulk_line).collect()
}

/// One line: `MM/DD/YYYY <amount> <description>`, date re-keyed to ISO
fn parse_bulk_line(line: &str) -> Option<BulkTransaction> {
    let (date, rest) = line.trim().split_once(char::is_whitespace)?;
    let (amount, description) = rest.trim_start().split_once(char::is_whitespace)?;

    let date = NaiveDate::parse_from_str(date, "%m/%d/%Y").ok()?;
    let amount = amount.parse::<f64>().ok()?;
    let description = description.trim();
    if description.is_empty() {
        return None;
    }

    Some(BulkTransaction {
        date: date.format("%Y-%m-%d").to_string(),
        amount,
        description: description.to_string(),
    })
}

/// Apply a category choice to a row, resolving the display name locally
fn apply_assignment(txn: &mut Transaction, categories: &[Category], category_id: Option<i64>) {
    txn.category_id = category_id;
    txn.category_name = category_id
        .and_then(|id| categories.iter().find(|category| category.id == id))
        .map(|category| category.name.clone())
        .unwrap_or_default();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use url::Url;

    fn txn(id: i64) -> Transaction {
        Transaction {
            id,
            user_id: 1,
            date: "2025-03-10".to_string(),
            amount: -42.0,
            description: "Coffee".to_string(),
            category_id: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap(),
            category_name: String::new(),
        }
    }

    fn category(id: i64, name: &str) -> Category {
        Category {
            id,
            user_id: 1,
            name: name.to_string(),
            created_at: None,
        }
    }

    #[test]
    fn bulk_lines_parse_and_rekey_dates() {
        let parsed =
            parse_bulk_lines("03/10/2025 -577.76 Irs\nnot a line\n03/11/2025 12.50 Refund");

        assert_eq!(
            parsed,
            vec![
                BulkTransaction {
                    date: "2025-03-10".to_string(),
                    amount: -577.76,
                    description: "Irs".to_string(),
                },
                BulkTransaction {
                    date: "2025-03-11".to_string(),
                    amount: 12.50,
                    description: "Refund".to_string(),
                },
            ]
        );
    }

    #[test]
    fn bulk_line_keeps_spaces_in_description() {
        let parsed = parse_bulk_lines("01/02/2025 -9.99 Coffee and cake");
        assert_eq!(parsed[0].description, "Coffee and cake");
    }

    #[test]
    fn bulk_line_tolerates_runs_of_whitespace() {
        let parsed = parse_bulk_lines("01/02/2025   -9.99\t Rent");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].amount, -9.99);
        assert_eq!(parsed[0].description, "Rent");
    }

    #[test]
    fn bulk_lines_reject_bad_dates_and_amounts() {
        assert!(parse_bulk_lines("13/45/2025 10.00 Nope").is_empty());
        assert!(parse_bulk_lines("03/10/2025 ten Nope").is_empty());
        assert!(parse_bulk_lines("03/10/2025 10.00").is_empty());
        assert!(parse_bulk_lines("").is_empty());
    }

    #[tokio::test]
    async fn empty_import_fails_before_any_request() {
        let client = Client::new(Url::parse("http://127.0.0.1:9/").unwrap()).unwrap();
        let mut session = BudgetSession::new();

        let result = session.bulk_import(&client, "nothing to see\n").await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(session.transactions().is_empty());
    }

    #[test]
    fn assignment_resolves_category_name() {
        let categories = vec![category(2, "Food"), category(3, "Taxes")];
        let mut transaction = txn(7);

        apply_assignment(&mut transaction, &categories, Some(3));
        assert_eq!(transaction.category_id, Some(3));
        assert_eq!(transaction.category_name, "Taxes");

        apply_assignment(&mut transaction, &categories, None);
        assert_eq!(transaction.category_id, None);
        assert_eq!(transaction.category_name, "");
    }

    #[tokio::test]
    async fn failed_assignment_restores_the_exact_snapshot() {
        // The discard port refuses connections, so the request fails and the
        // optimistic edit must be rolled back
        let client = Client::new(Url::parse("http://127.0.0.1:9/").unwrap()).unwrap();
        let mut session = BudgetSession::new();
        session.categories = vec![category(2, "Food")];
        session.transactions = vec![txn(7), txn(8)];
        let before = session.transactions[0].clone();

        let result = session.assign_category(&client, 7, Some(2)).await;

        assert!(result.is_err());
        assert_eq!(session.transactions[0], before);
        assert_eq!(session.transactions[1].id, 8);
    }

    #[tokio::test]
    async fn assigning_unknown_transaction_is_a_validation_error() {
        let client = Client::new(Url::parse("http://127.0.0.1:9/").unwrap()).unwrap();
        let mut session = BudgetSession::new();

        let result = session.assign_category(&client, 99, None).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
