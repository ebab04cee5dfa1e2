//! Skyform stack definitions
//!
//! The two resource graphs this repository exists to declare:
//!
//! - [`web_service`]: a containerized web service on a managed container
//!   platform behind a load balancer, exporting its public URL.
//! - [`static_site`]: a static-website bucket with public read access and one
//!   object per content file, exporting the bucket name and website URL.

pub mod static_site;
pub mod web_service;

pub use skyform_graph::Stack;
