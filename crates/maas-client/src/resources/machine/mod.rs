//! Machines (`/machines/`).
//!
//! [`Machines`] lists and allocates; [`MachineHandle`] drives the lifecycle
//! of one machine (deploy, release, power on, update).

mod client;
mod models;

pub use client::{
    MachineAllocator, MachineDeployer, MachineHandle, MachineModifier, MachinePowerOn,
    MachineReleaser, Machines,
};
pub use models::*;
