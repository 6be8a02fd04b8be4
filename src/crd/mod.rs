//! Custom Resource Definitions consumed by the webhook.
//!
//! None of these are owned by this crate; they are installed by the SDN
//! controller and KubeSphere. They are modelled here so the webhook can
//! read and write them through the dynamic cluster store.
//!
//! - `Subnet`: CIDR allocated to a namespace (read only)
//! - `Vpc`: per-workspace virtual network (created and deleted)
//! - `Workspace`: KubeSphere tenant grouping (existence check only)

mod subnet;
mod vpc;
mod workspace;

pub use subnet::*;
pub use vpc::*;
pub use workspace::*;
