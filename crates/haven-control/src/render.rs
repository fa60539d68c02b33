//! Seam to the external document rendering service.
//!
//! The core never renders anything itself; it asks a renderer to rebuild
//! the final contract artifact when both signatures land. Rendering runs
//! after the transition has committed and the lock has been released, and
//! a failure is logged and swallowed like any other post-commit side effect.

use async_trait::async_trait;
use haven_store::Contract;
use thiserror::Error;

/// Errors from the rendering service.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer could not produce the artifact.
    #[error("renderer error: {0}")]
    Renderer(String),
}

/// Trait for the document rendering collaborator.
///
/// This trait abstracts the renderer interface, allowing for mock
/// implementations in tests.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Re-render the final artifact for a fully signed contract.
    ///
    /// # Errors
    ///
    /// Returns an error if the rendering service fails.
    async fn render_contract(&self, contract: &Contract) -> std::result::Result<(), RenderError>;
}

/// Renderer that does nothing, for deployments that regenerate documents
/// elsewhere and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRenderer;

#[async_trait]
impl DocumentRenderer for NoopRenderer {
    async fn render_contract(&self, contract: &Contract) -> std::result::Result<(), RenderError> {
        tracing::debug!(contract_id = %contract.contract_id, "Skipping artifact render (noop)");
        Ok(())
    }
}
