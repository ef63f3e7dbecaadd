//! redb table definitions for the durable store.

use redb::TableDefinition;

/// Service records keyed by service URL, values MessagePack-encoded.
pub const SERVICES: TableDefinition<&str, &[u8]> = TableDefinition::new("services");
