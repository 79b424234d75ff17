use crate::{
    loan::{LoanCategory, MAX_RATE_PERCENT},
    types::Amount,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default terms for one loan category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanProductConfig {
    pub category: LoanCategory,
    pub label: String,
    /// Percentage. Annual for standard loans, monthly for emergency loans.
    pub default_rate_percent: Amount,
    /// Days from start date to due date.
    pub term_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct LoanProductsFile {
    products: Vec<LoanProductConfig>,
    #[serde(default = "default_fy_start_month")]
    financial_year_start_month: u32,
}

/// Longest product term accepted from the product file, in days.
pub const MAX_TERM_DAYS: i64 = 100 * 365;

fn default_fy_start_month() -> u32 {
    3
}

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub products: HashMap<LoanCategory, LoanProductConfig>,
    /// First month of the reporting year (3 = March to February).
    pub financial_year_start_month: u32,
}

impl LedgerConfig {
    /// Load from the data/ directory.
    /// In tests, use LedgerConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/loans/loan_products.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Self::from_json(&content).map_err(|e| anyhow::anyhow!("Invalid {path}: {e}"))
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let file: LoanProductsFile = serde_json::from_str(content)?;
        let products = file
            .products
            .into_iter()
            .map(|p| (p.category, p))
            .collect();
        let config = Self {
            products,
            financial_year_start_month: file.financial_year_start_month,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        for category in LoanCategory::ALL {
            let product = self
                .products
                .get(&category)
                .ok_or_else(|| anyhow::anyhow!("no loan product configured for '{category}'"))?;
            if product.default_rate_percent < Decimal::ZERO {
                anyhow::bail!("'{category}' default rate must not be negative");
            }
            if !(0..=MAX_TERM_DAYS).contains(&product.term_days) {
                anyhow::bail!(
                    "'{category}' term_days must be 0..={MAX_TERM_DAYS}, got {}",
                    product.term_days
                );
            }
            if product.default_rate_percent > Decimal::from(MAX_RATE_PERCENT) {
                anyhow::bail!("'{category}' default rate exceeds {MAX_RATE_PERCENT}%");
            }
        }
        if !(1..=12).contains(&self.financial_year_start_month) {
            anyhow::bail!(
                "financial_year_start_month must be 1..=12, got {}",
                self.financial_year_start_month
            );
        }
        Ok(())
    }

    pub fn product(&self, category: LoanCategory) -> Option<&LoanProductConfig> {
        self.products.get(&category)
    }

    /// Group defaults: 10 % over roughly 24 months for standard loans,
    /// 2 % a month over roughly one month for emergency loans.
    pub fn default_test() -> Self {
        let standard = LoanProductConfig {
            category: LoanCategory::Standard,
            label: "Normal loan".into(),
            default_rate_percent: Decimal::TEN,
            term_days: 24 * 30,
        };
        let emergency = LoanProductConfig {
            category: LoanCategory::Emergency,
            label: "Emergency loan".into(),
            default_rate_percent: Decimal::TWO,
            term_days: 30,
        };
        Self {
            products: [standard, emergency]
                .into_iter()
                .map(|p| (p.category, p))
                .collect(),
            financial_year_start_month: default_fy_start_month(),
        }
    }
}
