//! GraphQL API definitions.

pub mod company;
pub mod job;
mod mutation;
mod query;
pub mod report;
pub mod scalar;
mod subscription;
pub mod user;

use crate::define_error;

pub use self::{
    company::Company,
    job::Job,
    mutation::Mutation,
    query::Query,
    subscription::Subscription,
    user::User,
};

/// GraphQL schema.
pub type Schema = juniper::RootNode<'static, Query, Mutation, Subscription>;

define_error! {
    enum PrivilegeError {
        #[code = "NOT_RECRUITER"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be a recruiter"]
        Recruiter,

        #[code = "NOT_JOB_SEEKER"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be a job seeker"]
        JobSeeker,

        #[code = "NOT_PERMITTED"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` cannot manage this entity"]
        Manager,
    }
}

define_error! {
    enum PaginationError {
        #[code = "AMBIGUOUS_PAGINATION_ARGUMENTS"]
        #[status = BAD_REQUEST]
        #[message = "Ambiguous pagination arguments"]
        Ambiguous,
    }
}
