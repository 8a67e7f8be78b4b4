//! Authority-specific parsers and their registry.
//!
//! A [`Handler`] turns an authority's raw lines into structured fields.
//! Handlers are registered by identity in a [`HandlerRegistry`] at startup
//! and instantiated at most once, on first use.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::result::LookupResult;

/// Identity of the generic top-level-domain handler.
///
/// It only runs when generic recursion is explicitly allowed.
pub const GENERIC_HANDLER: &str = "gtld";

/// What a handler hands back.
#[derive(Debug, Clone, Default)]
pub struct HandlerOutput {
    /// The updated result tree.
    pub result: LookupResult,
    /// An error the handler wants reported. Non-fatal.
    pub error: Option<String>,
}

impl From<LookupResult> for HandlerOutput {
    fn from(result: LookupResult) -> Self {
        Self {
            result,
            error: None,
        }
    }
}

/// A parser for one authority or suffix family.
///
/// `parse` receives the tree with `rawdata` filled in and returns it with
/// `structured_info` populated. Setting `registry_info.referral` asks the
/// client to follow up with a more specific authority; `deep_lookup` tells
/// the handler whether that will happen.
pub trait Handler: Send + Sync {
    /// Parses `result.rawdata` for `query`.
    fn parse(&self, result: LookupResult, query: &str, deep_lookup: bool) -> HandlerOutput;
}

impl<F> Handler for F
where
    F: Fn(LookupResult, &str, bool) -> HandlerOutput + Send + Sync,
{
    fn parse(&self, result: LookupResult, query: &str, deep_lookup: bool) -> HandlerOutput {
        self(result, query, deep_lookup)
    }
}

type Factory = Box<dyn Fn() -> Arc<dyn Handler> + Send + Sync>;

struct Slot {
    factory: Factory,
    instance: OnceLock<Arc<dyn Handler>>,
}

/// Registration table mapping identities to handlers.
///
/// # Example
///
/// ```
/// use whois_client::{HandlerOutput, HandlerRegistry, LookupResult};
///
/// let mut registry = HandlerRegistry::new();
/// registry.register("example", || {
///     |mut result: LookupResult, _query: &str, _deep: bool| {
///         result.structured_info.insert("registered".into(), "yes".into());
///         HandlerOutput::from(result)
///     }
/// });
///
/// assert!(registry.contains("example"));
/// assert!(registry.get("missing").is_none());
/// ```
#[derive(Default)]
pub struct HandlerRegistry {
    slots: HashMap<String, Slot>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under `id`. Replaces any earlier registration.
    pub fn register<H, F>(&mut self, id: impl Into<String>, factory: F)
    where
        H: Handler + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let factory: Factory = Box::new(move || Arc::new(factory()) as Arc<dyn Handler>);
        self.slots.insert(
            id.into(),
            Slot {
                factory,
                instance: OnceLock::new(),
            },
        );
    }

    /// Returns `true` if a handler is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    /// Returns the handler for `id`, instantiating it on first use.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn Handler>> {
        let slot = self.slots.get(id)?;
        let handler = slot.instance.get_or_init(|| {
            tracing::debug!(handler = %id, "Loading handler");
            (slot.factory)()
        });
        Some(Arc::clone(handler))
    }

    /// Registered identities, unordered.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("ids", &self.ids().collect::<Vec<_>>())
            .finish()
    }
}
