//! Renderer.
//!
//! A render runs `Validating -> Rendering -> Done`, or stops in `Failed` with
//! the first error. Validation covers every element before the sequence
//! counter is touched, so a doomed render never consumes a sequence value.
//! Committed renders allocate at most one sequence value, shared by every
//! `SEQUENCE` element of the configuration.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::domain::{ElementDraft, ElementField, IdConfiguration, InventoryId};
use crate::error::{EngineError, FieldError};
use crate::service::generator::{
    Clock, GenerationContext, SystemClock, generate, render_value,
};
use crate::service::specifier::{CompiledRule, RuleCache};
use crate::service::validator;
use crate::storage::SequenceStorage;

/// Whether a render may consume the sequence counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Example output; reads the counter without advancing it.
    Preview,
    /// Final identifier; advances the counter.
    Commit,
}

impl RenderMode {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Commit => "commit",
        }
    }
}

/// Renders configurations into identifier strings.
pub struct Renderer {
    sequences: Arc<dyn SequenceStorage>,
    rules: RuleCache,
    clock: Arc<dyn Clock>,
    start_value: u64,
    backend: &'static str,
}

impl Renderer {
    /// Create a renderer drawing sequence values from `sequences`.
    ///
    /// `start_value` is the first value of a fresh counter.
    #[must_use]
    pub fn new(sequences: Arc<dyn SequenceStorage>, start_value: u64) -> Self {
        Self {
            sequences,
            rules: RuleCache::new(),
            clock: Arc::new(SystemClock),
            start_value,
            backend: "unknown",
        }
    }

    /// Replace the timestamp source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Name of the storage backend, used as a metrics label.
    #[must_use]
    pub fn with_backend_label(mut self, backend: &'static str) -> Self {
        self.backend = backend;
        self
    }

    /// First value of a fresh counter.
    #[must_use]
    pub const fn start_value(&self) -> u64 {
        self.start_value
    }

    /// Validate a configuration without rendering it.
    ///
    /// # Errors
    ///
    /// Returns every field-level error found.
    pub fn validate(
        &self,
        config: &IdConfiguration,
        mode: RenderMode,
    ) -> Result<(), Vec<FieldError>> {
        validator::validate(config, mode, &self.rules)
    }

    /// Resolve and validate collaborator drafts without rendering them.
    ///
    /// # Errors
    ///
    /// Returns every field-level error found, including unknown element
    /// types.
    pub fn validate_drafts(
        &self,
        drafts: &[ElementDraft],
        mode: RenderMode,
    ) -> Result<IdConfiguration, Vec<FieldError>> {
        validator::validate_drafts(drafts, mode, &self.rules)
    }

    /// Render an example identifier.
    ///
    /// `SEQUENCE` elements show the counter's next value for `inventory_id`,
    /// or the start value when no inventory is given. An empty configuration
    /// renders as an empty string.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or `AllocationUnavailable` when the
    /// counter cannot be read.
    pub async fn render_preview(
        &self,
        inventory_id: Option<&InventoryId>,
        config: &IdConfiguration,
    ) -> Result<String, FieldError> {
        self.render(RenderMode::Preview, inventory_id, config).await
    }

    /// Render the final identifier of a new record.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, `EmptyConfiguration` for a
    /// configuration without elements, or `AllocationUnavailable` when the
    /// counter cannot be advanced. No partial identifier is ever returned.
    pub async fn render_committed(
        &self,
        inventory_id: &InventoryId,
        config: &IdConfiguration,
    ) -> Result<String, FieldError> {
        self.render(RenderMode::Commit, Some(inventory_id), config)
            .await
    }

    async fn render(
        &self,
        mode: RenderMode,
        inventory_id: Option<&InventoryId>,
        config: &IdConfiguration,
    ) -> Result<String, FieldError> {
        let started = Instant::now();
        let result = self.run(mode, inventory_id, config).await;

        let outcome = if result.is_ok() { "success" } else { "failure" };
        metrics::counter!(
            "customid_renders_total",
            "mode" => mode.as_str(),
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!("customid_render_duration_seconds", "mode" => mode.as_str())
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(id) => debug!(
                mode = mode.as_str(),
                inventory_id = inventory_id.map(InventoryId::as_str),
                elements = config.len(),
                id = %id,
                "Rendered custom id"
            ),
            Err(err) => debug!(
                mode = mode.as_str(),
                inventory_id = inventory_id.map(InventoryId::as_str),
                error = %err,
                "Render failed"
            ),
        }

        result
    }

    async fn run(
        &self,
        mode: RenderMode,
        inventory_id: Option<&InventoryId>,
        config: &IdConfiguration,
    ) -> Result<String, FieldError> {
        // Validating
        self.validate(config, mode).map_err(first_error)?;

        let rules = config
            .iter()
            .enumerate()
            .map(|(index, element)| {
                self.rules
                    .get_or_compile(element.element_type, element.format_str())
                    .map_err(|err| FieldError::at(index, ElementField::Format, err))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Rendering
        let sequence = match config.sequence_index() {
            Some(index) => Some(self.sequence_value(mode, inventory_id, index).await?),
            None => None,
        };

        self.assemble(config, &rules, sequence)
    }

    async fn sequence_value(
        &self,
        mode: RenderMode,
        inventory_id: Option<&InventoryId>,
        index: usize,
    ) -> Result<u64, FieldError> {
        let Some(inventory_id) = inventory_id else {
            return Ok(self.start_value);
        };

        let result = match mode {
            RenderMode::Preview => self.sequences.peek(inventory_id, self.start_value).await,
            RenderMode::Commit => {
                let allocated = self
                    .sequences
                    .allocate(inventory_id, self.start_value)
                    .await;
                if allocated.is_ok() {
                    metrics::counter!(
                        "customid_sequence_allocations_total",
                        "backend" => self.backend
                    )
                    .increment(1);
                }
                allocated
            }
        };

        result.map_err(|err| {
            warn!(
                inventory_id = %inventory_id,
                mode = mode.as_str(),
                error = %err,
                "Sequence counter unavailable"
            );
            FieldError {
                index: Some(index),
                field: None,
                error: EngineError::AllocationUnavailable(err.to_string()),
            }
        })
    }

    /// Generate and format every element; no I/O happens here.
    fn assemble(
        &self,
        config: &IdConfiguration,
        rules: &[Arc<CompiledRule>],
        sequence: Option<u64>,
    ) -> Result<String, FieldError> {
        let mut rng = rand::rng();
        let mut ctx = GenerationContext {
            now: self.clock.now(),
            rng: &mut rng,
            sequence,
        };

        let mut out = String::new();
        for (index, (element, rule)) in config.iter().zip(rules).enumerate() {
            let raw = generate(element, &mut ctx).map_err(|err| FieldError {
                index: Some(index),
                field: None,
                error: err,
            })?;
            out.push_str(&render_value(&raw, rule));
        }
        Ok(out)
    }
}

fn first_error(mut errors: Vec<FieldError>) -> FieldError {
    if errors.is_empty() {
        FieldError::global(EngineError::EmptyConfiguration)
    } else {
        errors.swap_remove(0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use regex::Regex;

    use super::*;
    use crate::domain::{ElementSpec, ElementType, SequenceState};
    use crate::error::{StorageError, StorageResult};
    use crate::service::generator::FixedClock;
    use crate::storage::MemoryStorage;

    /// Counts calls and fails every one of them.
    #[derive(Default)]
    struct UnavailableStorage {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SequenceStorage for UnavailableStorage {
        async fn allocate(&self, _: &InventoryId, _: u64) -> StorageResult<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::Unavailable)
        }

        async fn peek(&self, _: &InventoryId, _: u64) -> StorageResult<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::Unavailable)
        }

        async fn get_state(&self, _: &InventoryId) -> StorageResult<Option<SequenceState>> {
            Err(StorageError::Unavailable)
        }
    }

    fn inv(id: &str) -> InventoryId {
        InventoryId::parse(id).unwrap()
    }

    fn memory_renderer() -> (Renderer, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let renderer = Renderer::new(storage.clone(), 1).with_clock(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2025, 10, 15, 0, 0, 0).unwrap(),
        )));
        (renderer, storage)
    }

    fn sku() -> IdConfiguration {
        IdConfiguration::empty()
            .with_element(ElementSpec::fixed_text("SKU-"))
            .with_element(ElementSpec::new(ElementType::Sequence, "D4"))
    }

    #[tokio::test]
    async fn test_sku_sequence_commits() {
        let (renderer, _) = memory_renderer();
        let id = inv("inv-1");

        assert_eq!(
            renderer.render_committed(&id, &sku()).await.unwrap(),
            "SKU-0001"
        );
        assert_eq!(
            renderer.render_committed(&id, &sku()).await.unwrap(),
            "SKU-0002"
        );
    }

    #[tokio::test]
    async fn test_preview_peeks_without_advancing() {
        let (renderer, storage) = memory_renderer();
        let id = inv("inv-1");

        assert_eq!(
            renderer.render_preview(Some(&id), &sku()).await.unwrap(),
            "SKU-0001"
        );
        assert_eq!(
            renderer.render_preview(Some(&id), &sku()).await.unwrap(),
            "SKU-0001"
        );
        assert!(storage.get_state(&id).await.unwrap().is_none());

        renderer.render_committed(&id, &sku()).await.unwrap();
        assert_eq!(
            renderer.render_preview(Some(&id), &sku()).await.unwrap(),
            "SKU-0002"
        );
    }

    #[tokio::test]
    async fn test_preview_without_inventory_uses_start_value() {
        let storage = Arc::new(MemoryStorage::new());
        let renderer = Renderer::new(storage, 0);
        assert_eq!(
            renderer.render_preview(None, &sku()).await.unwrap(),
            "SKU-0000"
        );
    }

    #[tokio::test]
    async fn test_empty_configuration() {
        let (renderer, _) = memory_renderer();
        let empty = IdConfiguration::empty();

        assert_eq!(renderer.render_preview(None, &empty).await.unwrap(), "");

        let err = renderer
            .render_committed(&inv("inv-1"), &empty)
            .await
            .unwrap_err();
        assert_eq!(err.error, EngineError::EmptyConfiguration);
    }

    #[tokio::test]
    async fn test_validation_precedes_allocation() {
        let (renderer, storage) = memory_renderer();
        let id = inv("inv-1");

        // The bad element sits after the sequence element.
        let config = sku().with_element(ElementSpec::new(ElementType::Random6Digit, "D0"));
        let err = renderer.render_committed(&id, &config).await.unwrap_err();
        assert_eq!(err.index, Some(2));
        assert!(matches!(
            err.error,
            EngineError::InvalidFormatSpecifier { .. }
        ));
        assert!(storage.get_state(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_too_many_elements_never_allocates() {
        let storage = Arc::new(UnavailableStorage::default());
        let renderer = Renderer::new(storage.clone(), 1);
        let config = (0..11).fold(IdConfiguration::empty(), |c, _| {
            c.with_element(ElementSpec::new(ElementType::Sequence, "D4"))
        });

        let err = renderer
            .render_committed(&inv("inv-1"), &config)
            .await
            .unwrap_err();
        assert_eq!(
            err.error,
            EngineError::TooManyElements { count: 11, max: 10 }
        );
        assert_eq!(storage.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_allocation_failure_aborts_render() {
        let storage = Arc::new(UnavailableStorage::default());
        let renderer = Renderer::new(storage.clone(), 1);
        let id = inv("inv-1");

        let err = renderer.render_committed(&id, &sku()).await.unwrap_err();
        assert!(matches!(err.error, EngineError::AllocationUnavailable(_)));
        assert_eq!(err.index, Some(1));

        // Preview of the same inventory fails too rather than guessing.
        let err = renderer.render_preview(Some(&id), &sku()).await.unwrap_err();
        assert!(matches!(err.error, EngineError::AllocationUnavailable(_)));

        // Configurations without a sequence never touch the store.
        let calls = storage.calls.load(Ordering::SeqCst);
        let config = IdConfiguration::empty().with_element(ElementSpec::guid());
        assert!(renderer.render_committed(&id, &config).await.is_ok());
        assert_eq!(storage.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test]
    async fn test_one_allocation_per_render() {
        let (renderer, _) = memory_renderer();
        let id = inv("inv-1");
        let config = sku()
            .with_element(ElementSpec::fixed_text("/"))
            .with_element(ElementSpec::new(ElementType::Sequence, "D2"));

        assert_eq!(
            renderer.render_committed(&id, &config).await.unwrap(),
            "SKU-0001/01"
        );
        assert_eq!(
            renderer.render_committed(&id, &config).await.unwrap(),
            "SKU-0002/02"
        );
    }

    #[tokio::test]
    async fn test_preview_and_commit_share_fixed_segments() {
        let (renderer, _) = memory_renderer();
        let id = inv("inv-1");
        let config = IdConfiguration::empty()
            .with_element(ElementSpec::fixed_text("INV-"))
            .with_element(ElementSpec::new(ElementType::DateTime, "yyyyMMdd"))
            .with_element(ElementSpec::fixed_text("-"))
            .with_element(ElementSpec::new(ElementType::Random32Bit, "X8"))
            .with_element(ElementSpec::fixed_text("-"))
            .with_element(ElementSpec::new(ElementType::Sequence, "D3"));

        let shape = Regex::new("^INV-20251015-[0-9a-f]{8,}-[0-9]{3}$").unwrap();
        let preview = renderer.render_preview(Some(&id), &config).await.unwrap();
        let committed = renderer.render_committed(&id, &config).await.unwrap();
        assert!(shape.is_match(&preview), "{preview}");
        assert!(shape.is_match(&committed), "{committed}");
        assert!(committed.ends_with("-001"));
    }
}
