//! Isolated factory contract and the scope guard around each session.

use crate::error::PluginResult;
use crate::types::{InterfaceId, PluginInfo};
use blob_core::BlobStore;
use std::fmt;
use tracing::debug;

/// Inspects one candidate store for a component implementing an interface.
///
/// A factory is created fresh for every candidate and dropped right after
/// the inspection, so implementations may keep per-session state.
pub trait PluginFactory {
    /// Looks for a component in `store` implementing `interface`.
    ///
    /// # Errors
    ///
    /// Returns a [`PluginError`](crate::PluginError) describing why the
    /// candidate does not qualify.
    fn find_plugin(&mut self, store: &dyn BlobStore, interface: &InterfaceId)
    -> PluginResult<PluginInfo>;
}

/// Supplies factory sessions to the discovery orchestrator.
///
/// The orchestrator brackets every inspection with
/// [`open_factory_scope`](Self::open_factory_scope) and
/// [`close_factory_scope`](Self::close_factory_scope) through a
/// [`FactoryScope`], so a scope is closed on every exit path.
pub trait FactoryHost {
    /// Opens an isolated loading context.
    ///
    /// # Errors
    ///
    /// Returns an error if the context cannot be created; the scope is then
    /// considered not open and will not be closed.
    fn open_factory_scope(&mut self) -> PluginResult<()>;

    /// Closes the context opened by the matching
    /// [`open_factory_scope`](Self::open_factory_scope).
    fn close_factory_scope(&mut self);

    /// Creates a factory inside the open scope.
    ///
    /// # Errors
    ///
    /// Returns an error if no factory can be constructed.
    fn get_plugin_factory(&mut self) -> PluginResult<Box<dyn PluginFactory + '_>>;
}

/// RAII guard for one factory session.
///
/// Opening the guard opens the host's scope; dropping it closes the scope,
/// including when the inspection panics.
///
/// # Examples
///
/// ```
/// use blob_core::NullStore;
/// use blob_plugin::{FactoryScope, InterfaceId, PluginRegistry, RegistryHost};
///
/// let mut host = RegistryHost::new(PluginRegistry::new());
/// {
///     let mut scope = FactoryScope::open(&mut host).unwrap();
///     let mut factory = scope.factory().unwrap();
///     let result = factory.find_plugin(&NullStore::default(), &InterfaceId::new("demo.Api"));
///     assert!(result.is_err());
/// }
/// assert_eq!(host.opened_scopes(), 1);
/// assert_eq!(host.closed_scopes(), 1);
/// ```
pub struct FactoryScope<'h, H: FactoryHost + ?Sized> {
    host: &'h mut H,
}

impl<'h, H: FactoryHost + ?Sized> FactoryScope<'h, H> {
    /// Opens a scope on `host`.
    ///
    /// # Errors
    ///
    /// Propagates the host's failure to open a scope.
    pub fn open(host: &'h mut H) -> PluginResult<Self> {
        host.open_factory_scope()?;
        debug!("Opened factory scope");
        Ok(Self { host })
    }

    /// Creates the session's factory.
    ///
    /// # Errors
    ///
    /// Propagates the host's failure to construct a factory.
    pub fn factory(&mut self) -> PluginResult<Box<dyn PluginFactory + '_>> {
        self.host.get_plugin_factory()
    }
}

impl<H: FactoryHost + ?Sized> fmt::Debug for FactoryScope<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryScope").finish_non_exhaustive()
    }
}

impl<H: FactoryHost + ?Sized> Drop for FactoryScope<'_, H> {
    fn drop(&mut self) {
        self.host.close_factory_scope();
        debug!("Closed factory scope");
    }
}
