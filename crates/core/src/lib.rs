//! `jobly-core`: domain records and input validation for the job board.
//!
//! This crate contains **pure domain** types (no storage, no transport).

pub mod application;
pub mod company;
pub mod entity;
pub mod error;
pub mod id;
pub mod job;
pub mod user;

pub use application::Application;
pub use company::{Company, CompanyPatch, NewCompany};
pub use entity::Entity;
pub use error::{validate_password, DomainError, DomainResult};
pub use id::{Handle, JobId, Username};
pub use job::{Job, JobPatch, NewJob};
pub use user::{NewUser, User, UserPatch};
