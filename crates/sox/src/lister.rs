//! Read every registered option from one socket.

use crate::accessor::{OptionAccessor, SocketOptionIo};
use crate::registry::OptionRegistry;
use crate::types::{OptionDiagnostic, OptionListing};

/// Lists all options in registry order.
///
/// Not every option applies to every socket (`TCP_REPAIR_QUEUE` outside
/// repair mode, `TCP_QUEUE_SEQ` on a fresh socket...), so a failed read is
/// recorded as a diagnostic and the listing moves on.
#[derive(Debug, Clone, Copy)]
pub struct OptionLister<'a> {
    accessor: OptionAccessor<'a>,
}

impl<'a> OptionLister<'a> {
    /// Create a lister over `registry`.
    pub fn new(registry: &'a OptionRegistry) -> Self {
        Self {
            accessor: OptionAccessor::new(registry),
        }
    }

    /// Read every option, in display order.
    pub fn list_all<S: SocketOptionIo + ?Sized>(&self, sock: &S) -> OptionListing {
        let mut listing = OptionListing::default();

        for (position, spec) in self.accessor.registry().iter().enumerate() {
            match self.accessor.get_spec(sock, spec) {
                Ok(result) => listing.results.push(result),
                Err(error) => {
                    tracing::debug!(option = spec.name, %error, "skipping unreadable option");
                    listing.diagnostics.push(OptionDiagnostic {
                        position,
                        spec,
                        error,
                    });
                }
            }
        }

        listing
    }
}
