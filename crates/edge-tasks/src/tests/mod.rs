//! Task tests against in-memory collaborators.

mod reconcile;
