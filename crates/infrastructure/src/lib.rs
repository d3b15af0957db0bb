//! waypoint-dns infrastructure: DNS wire handling and catalog backends
pub mod catalog;
pub mod dns;
