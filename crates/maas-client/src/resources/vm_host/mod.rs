//! VM hosts (`/vm-hosts/`): LXD/virsh hosts that compose machines on demand.

mod client;
mod models;

pub use client::{VmComposer, VmHostHandle, VmHosts};
pub use models::*;
