use alloy::primitives::B256;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Render an error and its `source()` chain as `outer: inner: root`.
pub fn render_chain(e: &(dyn std::error::Error + 'static)) -> String {
    let mut out = e.to_string();
    let mut cur = e.source();
    while let Some(inner) = cur {
        let s = inner.to_string();
        if !out.ends_with(&s) {
            out.push_str(": ");
            out.push_str(&s);
        }
        cur = inner.source();
    }
    out
}

fn chain(e: &BoxError) -> String {
    render_chain(e.as_ref())
}

/// Terminal failures of a swap run. Every variant except `InvalidInput` and `SwapReverted`
/// keeps the underlying transport/signing error as its source.
#[derive(Debug, Error)]
pub enum SwapError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("read {what} failed: {}", chain(.source))]
    ChainRead {
        what: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("approval failed: {}", chain(.source))]
    ApprovalFailed {
        #[source]
        source: BoxError,
    },

    #[error("gas estimation failed: {}", chain(.source))]
    GasEstimationFailed {
        #[source]
        source: BoxError,
    },

    #[error("submit swap transaction failed: {}", chain(.source))]
    SubmitFailed {
        #[source]
        source: BoxError,
    },

    #[error("transaction not found: {tx_hash:#x}: {}", chain(.source))]
    TransactionNotFound {
        tx_hash: B256,
        #[source]
        source: BoxError,
    },

    #[error(
        "swap transaction {tx_hash:#x} reverted (block {})",
        .block_number.map_or_else(|| "unknown".to_owned(), |n| n.to_string())
    )]
    SwapReverted {
        tx_hash: B256,
        block_number: Option<u64>,
    },
}

impl SwapError {
    pub fn approval(e: eyre::Report) -> Self {
        Self::ApprovalFailed { source: e.into() }
    }

    pub fn gas_estimation(e: eyre::Report) -> Self {
        Self::GasEstimationFailed { source: e.into() }
    }

    pub fn submit(e: eyre::Report) -> Self {
        Self::SubmitFailed { source: e.into() }
    }

    /// Stable machine-readable code, used in the CLI's JSON error output.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::ChainRead { .. } => "chain_read_failed",
            Self::ApprovalFailed { .. } => "approval_failed",
            Self::GasEstimationFailed { .. } => "gas_estimation_failed",
            Self::SubmitFailed { .. } => "submit_failed",
            Self::TransactionNotFound { .. } => "transaction_not_found",
            Self::SwapReverted { .. } => "swap_reverted",
        }
    }
}
