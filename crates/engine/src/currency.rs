use serde::{Deserialize, Serialize};

/// Currency tag carried by every [`Money`](crate::Money) value.
///
/// PocketLedger is mono-currency: all expenses and budgets are recorded in
/// Vietnamese dong. The enum exists so the data model stays explicit about it.
///
/// Amounts are stored as an `i64` number of minor units. VND has no
/// fractional part, so `300000` minor units is `300,000 VND`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Vnd,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Vnd => "VND",
        }
    }

    /// Symbol appended to formatted amounts.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Currency::Vnd => "₫",
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}
