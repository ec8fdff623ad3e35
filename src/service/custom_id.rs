//! Custom ID service.
//!
//! Couples the renderer with the configuration store: collaborators either
//! pass an element list with each call or save one per inventory and refer
//! to it by inventory id.

use std::sync::Arc;

use tracing::info;

use crate::domain::{
    ElementDraft, ElementTypeResponse, GenerateResponse, IdConfiguration, InventoryId,
    SequenceResponse, StoredConfiguration, ValidationResponse,
};
use crate::error::{AppError, Result};
use crate::service::registry;
use crate::service::renderer::{RenderMode, Renderer};
use crate::storage::{SequenceStorage, Storage};

/// Service for custom ID configuration and generation.
pub struct CustomIdService {
    storage: Arc<dyn Storage>,
    renderer: Renderer,
}

impl CustomIdService {
    /// Create a new service over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, start_value: u64) -> Self {
        let backend = storage.backend_name();
        let sequences: Arc<dyn SequenceStorage> = storage.clone();
        Self {
            renderer: Renderer::new(sequences, start_value).with_backend_label(backend),
            storage,
        }
    }

    /// Create a service around a prepared renderer.
    #[must_use]
    pub const fn with_renderer(storage: Arc<dyn Storage>, renderer: Renderer) -> Self {
        Self { storage, renderer }
    }

    /// The renderer used by this service.
    #[must_use]
    pub const fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// The element type catalogue.
    #[must_use]
    pub fn element_types(&self) -> Vec<ElementTypeResponse> {
        registry::catalog()
            .into_iter()
            .map(ElementTypeResponse::from)
            .collect()
    }

    /// Validate an element list as it would be saved.
    ///
    /// # Errors
    ///
    /// Returns `Validation` with every field error found.
    pub fn validate(&self, drafts: &[ElementDraft]) -> Result<ValidationResponse> {
        let config = self.resolve_for_commit(drafts)?;
        Ok(ValidationResponse {
            valid: true,
            element_count: config.len(),
        })
    }

    /// Render an example identifier for an element list not tied to an inventory.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when the drafts do not resolve, or `Render` when
    /// rendering fails.
    pub async fn preview(&self, drafts: &[ElementDraft]) -> Result<String> {
        let config = resolve(drafts)?;
        self.renderer
            .render_preview(None, &config)
            .await
            .map_err(AppError::Render)
    }

    /// Get the stored configuration of an inventory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` when nothing is stored.
    pub async fn get_configuration(&self, inventory_id: &InventoryId) -> Result<StoredConfiguration> {
        self.storage
            .get_configuration(inventory_id)
            .await?
            .ok_or_else(|| AppError::ConfigNotFound(inventory_id.to_string()))
    }

    /// Validate and store the configuration of an inventory.
    ///
    /// An invalid configuration is never stored. The inventory's sequence
    /// counter is not affected.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an invalid configuration or `Storage` when the
    /// store fails.
    pub async fn save_configuration(
        &self,
        inventory_id: &InventoryId,
        drafts: &[ElementDraft],
    ) -> Result<StoredConfiguration> {
        let config = self.resolve_for_commit(drafts)?;
        let stored = StoredConfiguration::new(inventory_id.clone(), config);

        self.storage.save_configuration(&stored).await?;
        info!(
            inventory_id = %inventory_id,
            elements = stored.elements.len(),
            "Custom ID configuration saved"
        );

        Ok(stored)
    }

    /// Delete the configuration of an inventory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` when nothing was stored.
    pub async fn delete_configuration(&self, inventory_id: &InventoryId) -> Result<()> {
        if self.storage.delete_configuration(inventory_id).await? {
            info!(inventory_id = %inventory_id, "Custom ID configuration deleted");
            Ok(())
        } else {
            Err(AppError::ConfigNotFound(inventory_id.to_string()))
        }
    }

    /// Render an example identifier for an inventory.
    ///
    /// Uses `drafts` when given, otherwise the stored configuration. Sequence
    /// elements show the counter's next value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` when no drafts are given and nothing is
    /// stored, `Validation`/`Render` for bad configurations, or `Render` with
    /// `AllocationUnavailable` when the counter cannot be read.
    pub async fn preview_for_inventory(
        &self,
        inventory_id: &InventoryId,
        drafts: Option<&[ElementDraft]>,
    ) -> Result<String> {
        let config = self.configuration_for(inventory_id, drafts).await?;
        self.renderer
            .render_preview(Some(inventory_id), &config)
            .await
            .map_err(AppError::Render)
    }

    /// Render the final identifier of a new record of an inventory.
    ///
    /// Uses `drafts` when given, otherwise the stored configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` when no drafts are given and nothing is
    /// stored, `Validation`/`Render` for bad configurations, or `Render` with
    /// `AllocationUnavailable` when the counter cannot be advanced.
    pub async fn generate(
        &self,
        inventory_id: &InventoryId,
        drafts: Option<&[ElementDraft]>,
    ) -> Result<GenerateResponse> {
        let config = self.configuration_for(inventory_id, drafts).await?;
        let custom_id = self
            .renderer
            .render_committed(inventory_id, &config)
            .await
            .map_err(AppError::Render)?;

        Ok(GenerateResponse {
            inventory_id: inventory_id.clone(),
            custom_id,
        })
    }

    /// Current state of an inventory's sequence counter.
    ///
    /// # Errors
    ///
    /// Returns `Storage` when the store fails.
    pub async fn sequence(&self, inventory_id: &InventoryId) -> Result<SequenceResponse> {
        let state = self.storage.get_state(inventory_id).await?;
        Ok(SequenceResponse {
            inventory_id: inventory_id.clone(),
            initialized: state.is_some(),
            next_value: state.map_or(self.renderer.start_value(), |s| s.next_value),
        })
    }

    async fn configuration_for(
        &self,
        inventory_id: &InventoryId,
        drafts: Option<&[ElementDraft]>,
    ) -> Result<IdConfiguration> {
        match drafts {
            Some(drafts) => resolve(drafts),
            None => Ok(self.get_configuration(inventory_id).await?.elements),
        }
    }

    fn resolve_for_commit(&self, drafts: &[ElementDraft]) -> Result<IdConfiguration> {
        self.renderer
            .validate_drafts(drafts, RenderMode::Commit)
            .map_err(AppError::Validation)
    }
}

fn resolve(drafts: &[ElementDraft]) -> Result<IdConfiguration> {
    IdConfiguration::from_drafts(drafts).map_err(AppError::Validation)
}
