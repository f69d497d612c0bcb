use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct Wallet {
    pub id: Option<i64>,
    pub user_id: i64,
    pub name: String,
    pub currency: String,
    pub balance: Decimal,
    pub is_default: bool,
    pub is_active: bool,
    pub description: String,
    pub created_at: String,
}

impl Wallet {
    pub fn new(user_id: i64, name: String, currency: String) -> Self {
        Self {
            id: None,
            user_id,
            name,
            currency,
            balance: Decimal::ZERO,
            is_default: false,
            is_active: true,
            description: String::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }

    /// Find a wallet by name (case-insensitive) in a slice.
    pub fn find_by_name<'a>(wallets: &'a [Wallet], name: &str) -> Option<&'a Wallet> {
        let lower = name.to_lowercase();
        wallets.iter().find(|w| w.name.to_lowercase() == lower)
    }
}

impl std::fmt::Display for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.currency)
    }
}
