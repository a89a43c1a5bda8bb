//! Host runtime
//!
//! A minimal single-threaded host for [`Component`]s. It owns the cache
//! arena and the invalidation scheduler, runs render passes, and routes
//! events to handlers in the last rendered tree by structural key. It does
//! no tree diffing: each pass simply replaces the instance's tree.
//!
//! ```text
//! mount / update ──► diff properties ──► render pass ──► commit focus
//!                                             │
//!     dispatch ──► handler ──► cache.set ──► Scheduler (pending ids)
//!                                             │
//!                        flush ◄──────────────┘ (bounded passes)
//! ```
//!
//! Render passes never re-enter. Writes made during a pass or inside a
//! handler only queue the instance; [`Runtime::flush`] replays the queue
//! until it is empty or `max_render_passes` is exceeded.

use std::rc::Rc;

use slotmap::SecondaryMap;

use crate::cache::{CacheArena, CacheHandle, InstanceId};
use crate::config::{FormworkConfig, RuntimeConfig};
use crate::diff::{diff_properties, Diffable, PropertyDiffer};
use crate::error::{Result, RuntimeError};
use crate::focus::{FocusState, FocusTracker};
use crate::invalidator::Scheduler;
use crate::theme::{BaseTheme, ThemeResolver};
use crate::validity::{NativeValidity, ValidityService};
use crate::vnode::{Event, EventContext, EventType, VNode};

/// A widget that renders from its properties and instance cache
pub trait Component: 'static {
    /// The property bag delivered by the parent
    type Properties: Diffable + Clone + 'static;

    /// Widget name, used for theme class keys and logging
    const NAME: &'static str;

    /// Register custom property comparators
    ///
    /// Called once per instance when it is mounted.
    fn diff_properties(_differ: &mut PropertyDiffer<Self::Properties>) {}

    /// Produce the render tree for the current properties and cache
    fn render(ctx: &RenderContext<'_, Self::Properties>) -> VNode;
}

/// Shared services available to every render pass
#[derive(Clone)]
pub struct Services {
    validity: Rc<dyn ValidityService>,
    theme: Rc<dyn ThemeResolver>,
}

impl Services {
    /// Native validity and base theme built from configuration
    pub fn from_config(config: &FormworkConfig) -> Self {
        Self {
            validity: Rc::new(NativeValidity::new(config.messages.clone())),
            theme: Rc::new(BaseTheme::from_config(&config.theme)),
        }
    }

    /// Replace the validity service
    pub fn with_validity(mut self, validity: impl ValidityService + 'static) -> Self {
        self.validity = Rc::new(validity);
        self
    }

    /// Replace the theme resolver
    pub fn with_theme(mut self, theme: impl ThemeResolver + 'static) -> Self {
        self.theme = Rc::new(theme);
        self
    }

    pub fn validity(&self) -> Rc<dyn ValidityService> {
        self.validity.clone()
    }

    pub fn theme(&self) -> Rc<dyn ThemeResolver> {
        self.theme.clone()
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::from_config(&FormworkConfig::default())
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

/// Capabilities handed to [`Component::render`]
///
/// Everything a render pass may touch is passed explicitly. Handles are
/// cheap to clone so event handlers can capture them.
pub struct RenderContext<'a, P> {
    properties: &'a P,
    serial: u64,
    cache: CacheHandle,
    focus: Rc<FocusState>,
    services: &'a Services,
}

impl<'a, P> RenderContext<'a, P> {
    /// Create a context for one render pass
    pub fn new(
        properties: &'a P,
        cache: CacheHandle,
        focus: Rc<FocusState>,
        services: &'a Services,
        serial: u64,
    ) -> Self {
        Self {
            properties,
            serial,
            cache,
            focus,
            services,
        }
    }

    /// Current properties
    pub fn properties(&self) -> &'a P {
        self.properties
    }

    /// Mount serial number, unique for the lifetime of the runtime
    pub fn id(&self) -> u64 {
        self.serial
    }

    /// The instance's cache
    pub fn cache(&self) -> CacheHandle {
        self.cache.clone()
    }

    /// Focus queries for the instance
    pub fn focus(&self) -> Rc<dyn FocusTracker> {
        self.focus.clone()
    }

    pub fn validity(&self) -> Rc<dyn ValidityService> {
        self.services.validity()
    }

    pub fn theme(&self) -> Rc<dyn ThemeResolver> {
        self.services.theme()
    }
}

/// What handlers did with a dispatched event
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub default_prevented: bool,
    pub propagation_stopped: bool,
}

type PropertyProvider<P> = Box<dyn Fn() -> P>;

struct InstanceRecord<C: Component> {
    identity: String,
    serial: u64,
    properties: C::Properties,
    /// Polled on every flush to pick up parent-side changes
    provider: Option<PropertyProvider<C::Properties>>,
    differ: PropertyDiffer<C::Properties>,
    focus: Rc<FocusState>,
    tree: Option<VNode>,
    renders: usize,
}

/// Single-threaded host for instances of one component type
pub struct Runtime<C: Component> {
    config: RuntimeConfig,
    services: Services,
    scheduler: Scheduler,
    arena: CacheArena,
    instances: SecondaryMap<InstanceId, InstanceRecord<C>>,
    next_serial: u64,
}

impl<C: Component> Runtime<C> {
    /// Create a runtime
    pub fn new(config: RuntimeConfig, services: Services) -> Self {
        let scheduler = Scheduler::new();
        Self {
            config,
            services,
            arena: CacheArena::new(scheduler.clone()),
            scheduler,
            instances: SecondaryMap::new(),
            next_serial: 0,
        }
    }

    /// Create a runtime with default services built from `config`
    pub fn from_config(config: &FormworkConfig) -> Self {
        Self::new(config.runtime.clone(), Services::from_config(config))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Mount an instance and run its first render pass
    pub fn mount(&mut self, identity: &str, properties: C::Properties) -> Result<()> {
        self.mount_inner(identity, properties, None)
    }

    /// Mount an instance whose properties come from `provider`
    ///
    /// The provider is called once for the first render and again on every
    /// [`flush`](Self::flush); a changed result is diffed and re-rendered
    /// like an [`update`](Self::update). This is how a parent that echoes
    /// callback results back into properties is modelled.
    pub fn mount_with<F>(&mut self, identity: &str, provider: F) -> Result<()>
    where
        F: Fn() -> C::Properties + 'static,
    {
        let properties = provider();
        self.mount_inner(identity, properties, Some(Box::new(provider)))
    }

    fn mount_inner(
        &mut self,
        identity: &str,
        properties: C::Properties,
        provider: Option<PropertyProvider<C::Properties>>,
    ) -> Result<()> {
        if self.arena.lookup(identity).is_some() {
            return Err(RuntimeError::AlreadyMounted(identity.to_string()));
        }

        let (id, _) = self.arena.get_or_allocate(identity);
        let mut differ = PropertyDiffer::new();
        C::diff_properties(&mut differ);

        let serial = self.next_serial;
        self.next_serial += 1;

        self.instances.insert(
            id,
            InstanceRecord {
                identity: identity.to_string(),
                serial,
                properties,
                provider,
                differ,
                focus: Rc::new(FocusState::new(self.scheduler.invalidator(id))),
                tree: None,
                renders: 0,
            },
        );
        tracing::debug!(widget = C::NAME, identity, serial, "mounted");

        self.render(id);
        Ok(())
    }

    /// Deliver new properties
    ///
    /// Returns whether a render pass ran: it does when the default diff
    /// reports a changed key or a custom comparator reported a change.
    pub fn update(&mut self, identity: &str, properties: C::Properties) -> Result<bool> {
        let id = self.instance_id(identity)?;
        let changed = self.apply_properties(id, properties);
        if changed {
            self.render(id);
        }
        Ok(changed)
    }

    /// Unmount an instance, releasing its cache
    pub fn unmount(&mut self, identity: &str) -> Result<()> {
        let id = self
            .arena
            .release(identity)
            .ok_or_else(|| RuntimeError::UnknownInstance(identity.to_string()))?;
        self.instances.remove(id);
        tracing::debug!(widget = C::NAME, identity, "unmounted");
        Ok(())
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Deliver an event to the node with structural key `node_key`
    ///
    /// `focus` and `blur` update the instance's focus state before the
    /// handler runs and are accepted even without a handler. Any other
    /// event without a handler is an error.
    pub fn dispatch(
        &mut self,
        identity: &str,
        node_key: &str,
        event: Event,
    ) -> Result<DispatchOutcome> {
        let id = self.instance_id(identity)?;
        let record = &self.instances[id];

        let node = record
            .tree
            .as_ref()
            .and_then(|tree| tree.find(node_key))
            .ok_or_else(|| RuntimeError::NodeNotFound {
                identity: identity.to_string(),
                key: node_key.to_string(),
            })?;
        let event_type = event.event_type;
        let handler = node.handlers.get(event_type);

        match event_type {
            EventType::Focus => record.focus.set_focused(node_key),
            EventType::Blur => record.focus.blur(node_key),
            _ => {}
        }

        let Some(handler) = handler else {
            return match event_type {
                EventType::Focus | EventType::Blur => Ok(DispatchOutcome::default()),
                _ => Err(RuntimeError::MissingHandler {
                    key: node_key.to_string(),
                    event: event_type.name(),
                }),
            };
        };

        tracing::trace!(identity, node_key, event = event_type.name(), "dispatch");
        let ctx = EventContext::new(event, node_key);
        handler(&ctx);

        Ok(DispatchOutcome {
            default_prevented: ctx.is_default_prevented(),
            propagation_stopped: ctx.is_propagation_stopped(),
        })
    }

    /// Request that focus moves to the instance on its next commit
    pub fn focus(&mut self, identity: &str) -> Result<()> {
        let id = self.instance_id(identity)?;
        self.instances[id].focus.request_focus();
        Ok(())
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    /// Poll property providers and replay queued invalidations until the
    /// queue is empty
    ///
    /// Returns the number of passes run. Fails with
    /// [`RuntimeError::RenderLoop`] when invalidations are still queued
    /// after `max_render_passes` passes; the queue is left intact.
    pub fn flush(&mut self) -> Result<usize> {
        let mut passes = 0;
        loop {
            self.poll_providers();
            if !self.scheduler.has_pending() {
                return Ok(passes);
            }

            let pending = self.scheduler.take_pending();
            if passes >= self.config.max_render_passes {
                let identity = pending
                    .iter()
                    .find_map(|id| self.instances.get(*id))
                    .map(|record| record.identity.clone())
                    .unwrap_or_default();
                for id in pending {
                    self.scheduler.schedule(id);
                }
                tracing::warn!(identity = %identity, passes, "render loop aborted");
                return Err(RuntimeError::RenderLoop { identity, passes });
            }

            passes += 1;
            for id in pending {
                if self.instances.contains_key(id) {
                    self.render(id);
                }
            }
        }
    }

    fn poll_providers(&mut self) {
        let updates: Vec<(InstanceId, C::Properties)> = self
            .instances
            .iter()
            .filter_map(|(id, record)| record.provider.as_ref().map(|provider| (id, provider())))
            .collect();

        for (id, properties) in updates {
            if self.apply_properties(id, properties) {
                self.scheduler.schedule(id);
            }
        }
    }

    /// Diff and store new properties; true when a render is needed
    fn apply_properties(&mut self, id: InstanceId, properties: C::Properties) -> bool {
        let invalidator = self.scheduler.invalidator(id);
        let record = &mut self.instances[id];
        let changes = diff_properties(&record.differ, &record.properties, &properties, &invalidator);
        record.properties = properties;
        if changes.any() {
            tracing::debug!(
                identity = %record.identity,
                default = ?changes.default,
                custom = ?changes.custom,
                "properties changed"
            );
        }
        changes.any()
    }

    fn render(&mut self, id: InstanceId) {
        // This pass covers anything queued so far
        self.scheduler.cancel(id);

        let Some(cache) = self.arena.cache(id) else {
            return;
        };
        let Some(record) = self.instances.get(id) else {
            return;
        };

        let ctx = RenderContext::new(
            &record.properties,
            cache,
            record.focus.clone(),
            &self.services,
            record.serial,
        );
        let tree = C::render(&ctx);

        let record = &mut self.instances[id];
        record.renders += 1;
        record.tree = Some(tree);
        tracing::debug!(
            widget = C::NAME,
            identity = %record.identity,
            pass = record.renders,
            "rendered"
        );

        self.commit_focus(id);
    }

    /// Run focus directives of the committed tree
    ///
    /// A directive that returns true moves focus to its node; the node's
    /// focus handler runs when focus actually moved.
    fn commit_focus(&self, id: InstanceId) {
        let record = &self.instances[id];
        let Some(tree) = record.tree.as_ref() else {
            return;
        };

        let mut directives = Vec::new();
        tree.walk(&mut |node| {
            if let (Some(key), Some(directive)) = (node.key, node.focus.as_ref()) {
                directives.push((key, directive.clone(), node.handlers.get(EventType::Focus)));
            }
        });

        for (key, directive, handler) in directives {
            if !directive() || record.focus.is_focused(key) {
                continue;
            }
            tracing::debug!(identity = %record.identity, key, "focus moved on commit");
            record.focus.set_focused(key);
            if let Some(handler) = handler {
                handler(&EventContext::new(Event::new(EventType::Focus), key));
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    fn instance_id(&self, identity: &str) -> Result<InstanceId> {
        self.arena
            .lookup(identity)
            .filter(|id| self.instances.contains_key(*id))
            .ok_or_else(|| RuntimeError::UnknownInstance(identity.to_string()))
    }

    pub fn is_mounted(&self, identity: &str) -> bool {
        self.instance_id(identity).is_ok()
    }

    /// The last rendered tree of an instance
    pub fn tree(&self, identity: &str) -> Option<&VNode> {
        let id = self.instance_id(identity).ok()?;
        self.instances[id].tree.as_ref()
    }

    /// Render passes run for an instance since it was mounted
    pub fn render_count(&self, identity: &str) -> Option<usize> {
        let id = self.instance_id(identity).ok()?;
        Some(self.instances[id].renders)
    }

    /// Current properties of an instance
    pub fn properties(&self, identity: &str) -> Option<&C::Properties> {
        let id = self.instance_id(identity).ok()?;
        Some(&self.instances[id].properties)
    }

    /// Handle to an instance's cache
    pub fn cache(&self, identity: &str) -> Option<CacheHandle> {
        self.arena.cache(self.instance_id(identity).ok()?)
    }

    /// Key of the focused element of an instance
    pub fn focused(&self, identity: &str) -> Option<String> {
        let id = self.instance_id(identity).ok()?;
        self.instances[id].focus.focused()
    }

    /// Whether any instance is waiting for a render pass
    pub fn has_pending(&self) -> bool {
        self.scheduler.has_pending()
    }

    /// Services shared by every render pass
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Runtime limits in effect
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

impl<C: Component> Default for Runtime<C> {
    fn default() -> Self {
        Self::from_config(&FormworkConfig::default())
    }
}
