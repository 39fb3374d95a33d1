use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// The closed set of financial tools the mock serves. Each one resolves to a
/// single fixture document per identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    FetchNetWorth,
    FetchCreditReport,
    FetchEpfDetails,
    FetchMfTransactions,
    FetchBankTransactions,
    FetchStockTransactions,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tool '{0}'")]
pub struct UnknownTool(pub String);

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::FetchNetWorth,
        Tool::FetchCreditReport,
        Tool::FetchEpfDetails,
        Tool::FetchMfTransactions,
        Tool::FetchBankTransactions,
        Tool::FetchStockTransactions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tool::FetchNetWorth => "fetch_net_worth",
            Tool::FetchCreditReport => "fetch_credit_report",
            Tool::FetchEpfDetails => "fetch_epf_details",
            Tool::FetchMfTransactions => "fetch_mf_transactions",
            Tool::FetchBankTransactions => "fetch_bank_transactions",
            Tool::FetchStockTransactions => "fetch_stock_transactions",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Tool::FetchNetWorth => {
                "Net worth summary: total assets and liabilities across linked accounts."
            }
            Tool::FetchCreditReport => {
                "Credit report: score, active loans, credit cards and repayment history."
            }
            Tool::FetchEpfDetails => {
                "Employee provident fund balance, contributions and employer details."
            }
            Tool::FetchMfTransactions => "Mutual fund purchase and redemption transactions.",
            Tool::FetchBankTransactions => "Bank account transactions across linked accounts.",
            Tool::FetchStockTransactions => "Stock buy, sell and bonus transactions.",
        }
    }

    /// File name of this tool's document inside an identity directory.
    pub fn file_name(self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = UnknownTool;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|tool| tool.as_str() == name)
            .ok_or_else(|| UnknownTool(name.to_string()))
    }
}
