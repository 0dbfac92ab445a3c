use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Symbol {
    Btc,
    Ltc,
    Eth,
}

impl Symbol {
    pub fn all() -> [Symbol; 3] {
        [Symbol::Btc, Symbol::Ltc, Symbol::Eth]
    }

    pub fn ticker(&self) -> &'static str {
        match self {
            Symbol::Btc => "BTC",
            Symbol::Ltc => "LTC",
            Symbol::Eth => "ETH",
        }
    }

    /// Key of this asset in the exchange's ticker payload.
    pub fn pair(&self) -> &'static str {
        match self {
            Symbol::Btc => "BTC_USD",
            Symbol::Ltc => "LTC_USD",
            Symbol::Eth => "ETH_USD",
        }
    }

    pub fn menu_key(&self) -> char {
        match self {
            Symbol::Btc => '1',
            Symbol::Ltc => '2',
            Symbol::Eth => '3',
        }
    }

    pub fn from_menu_key(key: char) -> Option<Symbol> {
        Symbol::all().into_iter().find(|s| s.menu_key() == key)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ticker())
    }
}
