pub mod config;
pub mod dispatch;
pub mod errors;
pub mod host;
pub mod report;
pub mod server;
pub mod session;
pub mod state;
pub mod term;

#[cfg(test)]
pub(crate) mod test_support;

// Convenience re-exports of the core surface; the submodules stay public for
// hosts that implement the traits.
pub use config::ServerConfig;
pub use errors::ServerError;
pub use server::ProgressServer;
pub use session::SessionScope;
pub use state::ProgressState;
