// handlers/mod.rs - two security tiers
//
// Public (no auth): service info, health, and the server-side connection
// test endpoints the dashboard proxies vendor probes through.
// Protected (session JWT): the per-user connection registry.
pub mod protected;
pub mod public;
