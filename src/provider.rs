//! Provider-facing descriptors.
//!
//! `descriptor` exposes validated metadata ([`ProviderDescriptor`]) covering the consent screen,
//! token endpoint, and REST API base, supported grant flags, client authentication preferences,
//! and provider quirks (scope delimiter, GoHighLevel's `user_type` form field, API version
//! header).

pub mod descriptor;

pub use descriptor::*;
