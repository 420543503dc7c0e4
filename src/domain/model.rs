use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub price: Decimal,
}

impl MenuItem {
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub specialties: Vec<String>,
    pub menu: Vec<MenuItem>,
}

impl Venue {
    pub fn menu_item(&self, name: &str) -> Option<&MenuItem> {
        self.menu.iter().find(|item| item.name == name)
    }
}

/// 單一場地的點餐集合，以品項名稱為鍵
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    items: BTreeMap<String, MenuItem>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of `item`. Returns `true` when the item is now selected.
    pub fn toggle(&mut self, item: &MenuItem) -> bool {
        if self.items.remove(&item.name).is_some() {
            false
        } else {
            self.items.insert(item.name.clone(), item.clone());
            true
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> Decimal {
        self.items.values().map(|item| item.price).sum()
    }

    /// Selected items in the order the venue lists them.
    pub fn in_menu_order(&self, venue: &Venue) -> Vec<MenuItem> {
        venue
            .menu
            .iter()
            .filter(|item| self.contains(&item.name))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttemptId(pub u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingState {
    Idle,
    SelectingMenu,
    AwaitingPayment,
    PaymentConfirmed,
    Committed,
    Cancelled,
}

impl fmt::Display for BookingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingState::Idle => "idle",
            BookingState::SelectingMenu => "selecting-menu",
            BookingState::AwaitingPayment => "awaiting-payment",
            BookingState::PaymentConfirmed => "payment-confirmed",
            BookingState::Committed => "committed",
            BookingState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAddress(pub String);

impl WalletAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `BCkA...S5s6` 形式的縮寫
    pub fn short(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 8 {
            return self.0.clone();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitmentLevel {
    #[default]
    Processed,
    Confirmed,
    Finalized,
}

impl fmt::Display for CommitmentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommitmentLevel::Processed => "processed",
            CommitmentLevel::Confirmed => "confirmed",
            CommitmentLevel::Finalized => "finalized",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSpec {
    pub from: WalletAddress,
    pub to: WalletAddress,
    pub lamports: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHandle {
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    Confirmed,
    Failed(String),
}

/// Amount owed for a selection, in both currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentQuote {
    pub quote_total: Decimal,
    pub lamports: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentFailure {
    UserRejected,
    NetworkError(String),
    Timeout,
}

impl fmt::Display for PaymentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentFailure::UserRejected => f.write_str("user rejected the transaction"),
            PaymentFailure::NetworkError(message) => write!(f, "network error: {}", message),
            PaymentFailure::Timeout => f.write_str("confirmation timed out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Confirmed(TransactionHandle),
    Rejected(PaymentFailure),
    /// 使用者在簽署前取消
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub attempt: AttemptId,
    pub quote: PaymentQuote,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub attempt: AttemptId,
    pub venue_id: u32,
    pub venue_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub items: Vec<MenuItem>,
    pub total: Decimal,
    pub lamports: u64,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkAck {
    pub reference: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn venue() -> Venue {
        Venue {
            id: 1,
            name: "Test Venue".to_string(),
            description: String::new(),
            location: String::new(),
            rating: 0.0,
            specialties: vec![],
            menu: vec![
                MenuItem::new("Nasi Lemak", dec!(8)),
                MenuItem::new("Chicken Rendang", dec!(12)),
                MenuItem::new("Ayam Kecap", dec!(10)),
            ],
        }
    }

    #[test]
    fn test_toggle_is_its_own_inverse() {
        let venue = venue();
        let mut selection = Selection::new();
        selection.toggle(&venue.menu[0]);
        let before = selection.clone();

        assert!(selection.toggle(&venue.menu[1]));
        assert!(!selection.toggle(&venue.menu[1]));
        assert_eq!(selection, before);
        assert_eq!(selection.total(), dec!(8));
    }

    #[test]
    fn test_total_tracks_every_toggle() {
        let venue = venue();
        let mut selection = Selection::new();
        assert_eq!(selection.total(), Decimal::ZERO);

        selection.toggle(&venue.menu[0]);
        selection.toggle(&venue.menu[1]);
        assert_eq!(selection.total(), dec!(20));

        selection.toggle(&venue.menu[2]);
        selection.toggle(&venue.menu[0]);
        assert_eq!(selection.total(), dec!(22));
    }

    #[test]
    fn test_in_menu_order_follows_venue_listing() {
        let venue = venue();
        let mut selection = Selection::new();
        selection.toggle(&venue.menu[2]);
        selection.toggle(&venue.menu[0]);

        let names: Vec<String> = selection
            .in_menu_order(&venue)
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(names, vec!["Nasi Lemak", "Ayam Kecap"]);
    }

    #[test]
    fn test_short_address() {
        let address = WalletAddress("BCkAq1Lw9tN8hYqK2mX3vR7pF5sZeD4uJ6cGbH2S5s6".to_string());
        assert_eq!(address.short(), "BCkA...S5s6");
        assert_eq!(WalletAddress("abc".to_string()).short(), "abc");
    }
}
