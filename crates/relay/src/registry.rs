//! PluginRegistry - resolves declared plugins against the configuration

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use contracts::{Capability, Handler, PluginConfig, PluginError, RelayConfig, Source};

use crate::error::RelayError;

/// Constructor of a source plugin
pub type SourceFactory =
    Arc<dyn Fn(&PluginConfig) -> Result<Box<dyn Source>, PluginError> + Send + Sync>;

/// Constructor of a handler plugin
pub type HandlerFactory =
    Arc<dyn Fn(&PluginConfig) -> Result<Box<dyn Handler>, PluginError> + Send + Sync>;

#[derive(Clone)]
enum Constructor {
    Source(SourceFactory),
    Handler(HandlerFactory),
}

/// A plugin identity bound to its capability and constructor
#[derive(Clone)]
pub struct PluginDeclaration {
    name: String,
    constructor: Constructor,
}

impl PluginDeclaration {
    /// Declare a source plugin
    pub fn source<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&PluginConfig) -> Result<Box<dyn Source>, PluginError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            constructor: Constructor::Source(Arc::new(factory)),
        }
    }

    /// Declare a handler plugin
    pub fn handler<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&PluginConfig) -> Result<Box<dyn Handler>, PluginError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            constructor: Constructor::Handler(Arc::new(factory)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capability(&self) -> Capability {
        match self.constructor {
            Constructor::Source(_) => Capability::Source,
            Constructor::Handler(_) => Capability::Handler,
        }
    }
}

impl fmt::Debug for PluginDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDeclaration")
            .field("name", &self.name)
            .field("capability", &self.capability())
            .finish()
    }
}

/// Registration table of available plugins
///
/// Declaration order is significant: it fixes the polling order of sources
/// and the subscription order of handlers.
#[derive(Debug, Clone, Default)]
pub struct PluginManifest {
    declarations: Vec<PluginDeclaration>,
}

impl PluginManifest {
    /// Create empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration
    ///
    /// One name may carry both capabilities, each built from the same config
    /// section. A repeated (name, capability) pair keeps its first declaration.
    pub fn declare(&mut self, declaration: PluginDeclaration) -> &mut Self {
        if self
            .get(declaration.name(), declaration.capability())
            .is_some()
        {
            warn!(
                plugin = %declaration.name(),
                capability = %declaration.capability(),
                "Plugin declared twice, keeping the first declaration"
            );
        } else {
            self.declarations.push(declaration);
        }
        self
    }

    /// Builder-style source declaration
    pub fn with_source<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&PluginConfig) -> Result<Box<dyn Source>, PluginError> + Send + Sync + 'static,
    {
        self.declare(PluginDeclaration::source(name, factory));
        self
    }

    /// Builder-style handler declaration
    pub fn with_handler<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&PluginConfig) -> Result<Box<dyn Handler>, PluginError> + Send + Sync + 'static,
    {
        self.declare(PluginDeclaration::handler(name, factory));
        self
    }

    pub fn get(&self, name: &str, capability: Capability) -> Option<&PluginDeclaration> {
        self.declarations
            .iter()
            .find(|d| d.name == name && d.capability() == capability)
    }

    /// Every declaration under `name`, in declaration order
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a PluginDeclaration> {
        self.declarations.iter().filter(move |d| d.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.named(name).next().is_some()
    }

    pub fn declarations(&self) -> &[PluginDeclaration] {
        &self.declarations
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

/// Identity of a registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub(crate) usize);

pub(crate) struct RegisteredSource {
    pub(crate) name: String,
    pub(crate) plugin: Box<dyn Source>,
}

pub(crate) struct RegisteredHandler {
    pub(crate) name: String,
    pub(crate) plugin: Box<dyn Handler>,
}

/// Instantiated plugins
///
/// Owns every source and handler. The subscription map refers to handlers
/// by [`HandlerId`], so a handler subscribed to several types exists once.
#[derive(Default)]
pub struct PluginRegistry {
    pub(crate) sources: Vec<RegisteredSource>,
    pub(crate) handlers: Vec<RegisteredHandler>,
    pub(crate) subscriptions: HashMap<String, Vec<HandlerId>>,
}

impl PluginRegistry {
    /// Create empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate every configured plugin of the manifest
    ///
    /// Plugins without a config section are skipped with a warning. Handlers
    /// without `reading_types` are registered with no subscriptions.
    ///
    /// # Errors
    /// A failing constructor aborts the whole load.
    #[instrument(
        name = "plugin_registry_load",
        skip(manifest, config),
        fields(declared = manifest.len(), sections = config.len())
    )]
    pub fn load(manifest: &PluginManifest, config: &RelayConfig) -> Result<Self, RelayError> {
        let mut registry = Self::new();

        for declaration in manifest.declarations() {
            let name = declaration.name();
            let Some(section) = config.section(name) else {
                warn!(
                    plugin = %name,
                    "Plugin: {name} not loaded. It has not been configured."
                );
                continue;
            };

            match &declaration.constructor {
                Constructor::Source(factory) => {
                    let plugin = factory(section)
                        .map_err(|e| RelayError::plugin_construction(name, e))?;
                    registry.register_source(name, plugin);
                }
                Constructor::Handler(factory) => {
                    let plugin = factory(section)
                        .map_err(|e| RelayError::plugin_construction(name, e))?;
                    let reading_types = section.reading_types().unwrap_or_else(|| {
                        warn!(
                            plugin = %name,
                            "Handler: {name} has no reading types configured, it will receive nothing"
                        );
                        Vec::new()
                    });
                    registry.register_handler(name, plugin, reading_types);
                }
            }

            debug!(
                plugin = %name,
                capability = %declaration.capability(),
                "Plugin: {name}.{}, loaded",
                declaration.capability()
            );
        }

        for section in config.section_names() {
            if !manifest.contains(section) {
                warn!(section = %section, "Config section matches no known plugin");
            }
        }

        Ok(registry)
    }

    /// Append a source to the polling order
    pub fn register_source(&mut self, name: impl Into<String>, plugin: Box<dyn Source>) {
        self.sources.push(RegisteredSource {
            name: name.into(),
            plugin,
        });
    }

    /// Register a handler and subscribe it to `reading_types`
    ///
    /// A type listed more than once subscribes the handler once.
    pub fn register_handler<I, S>(
        &mut self,
        name: impl Into<String>,
        plugin: Box<dyn Handler>,
        reading_types: I,
    ) -> HandlerId
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = HandlerId(self.handlers.len());
        self.handlers.push(RegisteredHandler {
            name: name.into(),
            plugin,
        });

        for reading_type in reading_types {
            let subscribers = self.subscriptions.entry(reading_type.into()).or_default();
            if !subscribers.contains(&id) {
                subscribers.push(id);
            }
        }
        id
    }

    /// Handlers subscribed to a reading type, in subscription order
    pub fn subscribers(&self, reading_type: &str) -> &[HandlerId] {
        self.subscriptions
            .get(reading_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn handler_name(&self, id: HandlerId) -> Option<&str> {
        self.handlers.get(id.0).map(|h| h.name.as_str())
    }

    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.name.as_str())
    }

    pub fn handler_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.iter().map(|h| h.name.as_str())
    }

    /// Reading type -> subscribed handler names, sorted by type
    pub fn subscriptions(&self) -> BTreeMap<&str, Vec<&str>> {
        self.subscriptions
            .iter()
            .map(|(reading_type, ids)| {
                let names = ids
                    .iter()
                    .filter_map(|id| self.handler_name(*id))
                    .collect();
                (reading_type.as_str(), names)
            })
            .collect()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("sources", &self.source_names().collect::<Vec<_>>())
            .field("handlers", &self.handler_names().collect::<Vec<_>>())
            .field("subscriptions", &self.subscriptions())
            .finish()
    }
}
