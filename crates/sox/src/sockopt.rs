//! The get/set/list operations addressed by (pid, fd).

use std::os::fd::RawFd;

use crate::accessor::OptionAccessor;
use crate::error::Result;
use crate::lister::OptionLister;
use crate::registry::OptionRegistry;
use crate::resolver::{DescriptorResolver, PidFdOpener, ProcessOpener, ResolvedDescriptor};
use crate::types::{OptionListing, OptionResult};

/// Socket option access for descriptors owned by other processes.
///
/// Every call resolves the descriptor afresh and closes the local duplicate
/// before returning, whether the call succeeds or not.
///
/// # Example
///
/// ```ignore
/// use sox::{OptionRegistry, SockOpt};
///
/// let registry = OptionRegistry::new();
/// let sockopt = SockOpt::new(&registry);
///
/// let result = sockopt.set_option(1234, 5, "TCP_NODELAY", 1)?;
/// println!("{} = {:?}", result.name, result.value);
/// ```
#[derive(Debug)]
pub struct SockOpt<'a, O = PidFdOpener> {
    registry: &'a OptionRegistry,
    resolver: DescriptorResolver<O>,
}

impl<'a> SockOpt<'a, PidFdOpener> {
    /// Create a pidfd-backed instance over `registry`.
    pub fn new(registry: &'a OptionRegistry) -> Self {
        Self::with_resolver(registry, DescriptorResolver::new())
    }
}

impl<'a, O: ProcessOpener> SockOpt<'a, O> {
    /// Create an instance with a custom resolver.
    pub fn with_resolver(registry: &'a OptionRegistry, resolver: DescriptorResolver<O>) -> Self {
        Self { registry, resolver }
    }

    /// Get the registry.
    pub fn registry(&self) -> &'a OptionRegistry {
        self.registry
    }

    /// Resolve `fd` of process `pid` to a local descriptor.
    pub fn resolve(&self, pid: libc::pid_t, fd: RawFd) -> Result<ResolvedDescriptor> {
        self.resolver.resolve(pid, fd)
    }

    /// Read option `name` of descriptor `fd` in process `pid`.
    pub fn get_option(&self, pid: libc::pid_t, fd: RawFd, name: &str) -> Result<OptionResult> {
        let sock = self.resolve(pid, fd)?;
        OptionAccessor::new(self.registry).get(&sock, name)
    }

    /// Write option `name` of descriptor `fd` in process `pid` and return
    /// the value in effect afterwards.
    pub fn set_option(
        &self,
        pid: libc::pid_t,
        fd: RawFd,
        name: &str,
        value: i64,
    ) -> Result<OptionResult> {
        let sock = self.resolve(pid, fd)?;
        OptionAccessor::new(self.registry).set(&sock, name, value)
    }

    /// Read every registered option of descriptor `fd` in process `pid`.
    ///
    /// Fails only if the descriptor cannot be resolved; unreadable options
    /// end up in [`OptionListing::diagnostics`].
    pub fn list_options(&self, pid: libc::pid_t, fd: RawFd) -> Result<OptionListing> {
        let sock = self.resolve(pid, fd)?;
        let listing = OptionLister::new(self.registry).list_all(&sock);
        tracing::debug!(
            pid,
            fd,
            read = listing.results.len(),
            failed = listing.diagnostics.len(),
            "listed options"
        );
        Ok(listing)
    }
}
