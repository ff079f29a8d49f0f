// ABOUTME: Sync phase marker types for the type state pattern.
// ABOUTME: Zero-sized types enforce the fetch-before-checkout ordering at compile time.

/// Nothing written yet.
/// Available actions: `write_deploy_file()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Idle;

/// Deploy record persisted.
/// Available actions: `publish_server_info()`
#[derive(Debug, Clone, Copy, Default)]
pub struct DeployFileWritten;

/// Repository (and optionally submodules) discoverable by the fleet.
/// Available actions: `trigger_fetch()`
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerInfoPublished;

/// Fetch dispatched to the fleet.
/// Available actions: `confirm()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Fetching;

/// Operator confirmed the fetch.
/// Available actions: `trigger_checkout()`
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchConfirmed;

/// Checkout dispatched to the fleet.
/// Available actions: `confirm()`
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckingOut;

/// Operator confirmed the checkout.
/// Available actions: `finish()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Done;
