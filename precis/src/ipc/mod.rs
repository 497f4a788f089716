//! Control socket for precisctl.

pub mod server;
