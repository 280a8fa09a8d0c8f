//! Service layer: intent validation, enrichment, and event relay.

pub mod relay;

pub use relay::RelayService;
