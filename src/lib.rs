//! Engine of the knowledge-graph feed client.
//!
//! Incrementally fetched graph snapshots are merged into one stable model
//! ([`nodes`]), laid out as a hub with rings around it ([`layout`]) and
//! explored with a pan/tap gesture model ([`interaction`]).

pub mod api;
pub mod config;
pub mod interaction;
pub mod layout;
pub mod nodes;
pub mod profile;
pub mod sync;
pub mod util;

pub fn init_test_tracing() {
    use std::sync::Once;
    static START: Once = Once::new();
    START.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
