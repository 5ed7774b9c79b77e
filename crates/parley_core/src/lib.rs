pub mod access;
pub mod error;
pub mod image;
pub mod retry;
pub mod store;
pub mod tokens;
pub mod turn;
pub mod usage;
pub mod window;

pub use access::{AllowList, GrantOutcome, RevokeOutcome};
pub use error::{CoreError, Result};
pub use self::image::ensure_jpeg;
pub use retry::{RetryPolicy, Retryable};
pub use store::ContextStore;
pub use tokens::{image_token_cost, TokenCounter};
pub use turn::{ContentBlock, ImageAttachment, ImageDetail, Role, Turn};
pub use usage::UsageLedger;
pub use window::{ContextWindow, PreparedPrompt, TokenBudget, WindowError};
