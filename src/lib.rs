// Library surface for headless/integration tests and reuse.
// The binary only adds the CLI and terminal setup on top of this.
pub mod app;
pub mod color;
pub mod config;
pub mod flash;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod timer;
pub mod ui;
