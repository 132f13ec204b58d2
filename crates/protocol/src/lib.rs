pub mod constants;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use messages::{
    ApiResult, CommitRequest, FinishRequest, FragmentQuery, FragmentReceipt, NegotiateRequest,
    NegotiateResponse,
};
pub use types::PartConfig;
