//! Infrastructure layer: the credential store behind repository traits.

pub mod store;

pub use store::{
    ApplicationStore, CompanyStore, Datastore, InMemoryStore, JobStore, PostgresStore, StoreError,
    StoreResult, UserStore,
};
