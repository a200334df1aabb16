//! Machine network interfaces (`/nodes/{system_id}/interfaces/`).
//!
//! Besides plain link and unlink calls, [`InterfaceHandle::set_static_ip`]
//! moves a boot interface from DHCP to a static address, following a bridge
//! down to the child that carries the links.

mod client;
mod models;

pub use client::{InterfaceHandle, NetworkInterfaces};
pub use models::*;
