use crate::code_store::CodeRecord;
use crate::path::ShortPath;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, crate::error::AllocationError>;

/// Parameters for assigning a code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocateParams {
    /// URL or literal text the code will point to.
    pub payload: String,
    /// Serve `payload` verbatim instead of redirecting to it.
    pub is_literal: bool,
    /// Desired path. Stripped to alphanumerics; if nothing is left a code is
    /// generated instead.
    pub custom_path: Option<String>,
}

impl AllocateParams {
    pub fn generated(payload: impl Into<String>, is_literal: bool) -> Self {
        Self {
            payload: payload.into(),
            is_literal,
            custom_path: None,
        }
    }

    pub fn custom(
        custom_path: impl Into<String>,
        payload: impl Into<String>,
        is_literal: bool,
    ) -> Self {
        Self {
            payload: payload.into(),
            is_literal,
            custom_path: Some(custom_path.into()),
        }
    }
}

#[async_trait]
pub trait Allocator: Send + Sync + 'static {
    /// Assigns a fresh or caller-chosen path to the payload and returns it.
    async fn allocate(&self, params: AllocateParams) -> Result<ShortPath>;

    /// Looks up what a path points to.
    async fn resolve(&self, path: &ShortPath) -> Result<Option<CodeRecord>>;
}
