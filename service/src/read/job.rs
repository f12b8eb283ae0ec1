//! [`Job`]-related read definitions.

use derive_more::{Deref, Into};

use crate::domain::job;
#[cfg(doc)]
use crate::domain::{Company, Job};

/// IDs of [`Job`]s transitioned into [`job::Status::Expired`] by a single
/// operation.
#[derive(Clone, Debug, Default, Deref, Eq, Into, PartialEq)]
pub struct Expired(pub Vec<job::Id>);

/// IDs of [`Job`]s transitioned into [`job::Status::Inactive`] because their
/// [`Company`] became inactive.
#[derive(Clone, Debug, Default, Deref, Eq, Into, PartialEq)]
pub struct Deactivated(pub Vec<job::Id>);

pub mod list {
    //! [`Job`]s list definitions.

    use std::{fmt, str::FromStr};

    use common::{define_pagination, DateTime};
    use derive_more::{Display, Error, From, Into};
    use smart_default::SmartDefault;

    use crate::domain::{company, job, user};
    #[cfg(doc)]
    use crate::domain::{Company, Job, User};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = job::Id;

    /// Cursor pointing to a specific [`Job`] in a list.
    ///
    /// [`Job`]s are listed newest first, so the [`Cursor`] carries the
    /// [`Job::posted_at`] along with the [`job::Id`] breaking ties.
    #[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
    pub struct Cursor {
        /// [`Job::posted_at`] of the pointed [`Job`].
        pub posted_at: job::PostingDateTime,

        /// ID of the pointed [`Job`].
        pub id: job::Id,
    }

    impl fmt::Display for Cursor {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}/{}", self.posted_at.to_rfc3339(), self.id)
        }
    }

    impl FromStr for Cursor {
        type Err = ParseCursorError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let (posted_at, id) =
                s.rsplit_once('/').ok_or(ParseCursorError)?;
            Ok(Self {
                posted_at: DateTime::from_rfc3339(posted_at)
                    .map_err(|_| ParseCursorError)?
                    .coerce(),
                id: id.parse().map_err(|_| ParseCursorError)?,
            })
        }
    }

    /// Error of parsing a [`Cursor`] from its string representation.
    #[derive(Clone, Copy, Debug, Display, Error)]
    #[display("invalid `Job` list cursor")]
    pub struct ParseCursorError;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, SmartDefault)]
    pub struct Filter {
        /// [`job::Status`] of the listed [`Job`]s.
        #[default(job::Status::Active)]
        pub status: job::Status,

        /// ID of the [`Company`] the listed [`Job`]s belong to.
        pub company_id: Option<company::Id>,

        /// ID of the [`User`] who posted the listed [`Job`]s.
        pub created_by: Option<user::Id>,

        /// [`job::Title`] (or its part) to fuzzy search for.
        pub title: Option<job::Title>,

        /// [`job::Location`] (or its part) to fuzzy search for.
        pub location: Option<job::Location>,

        /// [`job::WorkType`] of the listed [`Job`]s.
        pub work_type: Option<job::WorkType>,

        /// [`job::EmploymentType`] of the listed [`Job`]s.
        pub employment_type: Option<job::EmploymentType>,

        /// [`job::ExperienceLevel`] of the listed [`Job`]s.
        pub experience_level: Option<job::ExperienceLevel>,

        /// Minimal [`job::Salary`] of the listed [`Job`]s.
        pub min_salary: Option<job::Salary>,
    }

    impl Filter {
        /// Indicates whether the provided [`Job`] satisfies this [`Filter`].
        ///
        /// Text fields are matched case-insensitively by any of their words.
        #[must_use]
        pub fn matches(&self, job: &job::Job) -> bool {
            fn contains_any_word(haystack: &str, needle: &str) -> bool {
                let haystack = haystack.to_lowercase();
                needle
                    .split_whitespace()
                    .any(|w| haystack.contains(&w.to_lowercase()))
            }

            job.status == self.status
                && self.company_id.map_or(true, |id| job.company_id == id)
                && self.created_by.map_or(true, |id| job.created_by == id)
                && self.title.as_ref().map_or(true, |t| {
                    contains_any_word(job.title.as_ref(), t.as_ref())
                })
                && self.location.as_ref().map_or(true, |l| {
                    contains_any_word(job.location.as_ref(), l.as_ref())
                })
                && self.work_type.map_or(true, |t| job.work_type == t)
                && self
                    .employment_type
                    .map_or(true, |t| job.employment_type == t)
                && self
                    .experience_level
                    .map_or(true, |l| job.experience_level == l)
                && self.min_salary.map_or(true, |s| job.salary >= s)
        }
    }

    /// Total count of [`Job`]s matching a [`Filter`].
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);

    #[cfg(test)]
    mod spec {
        use common::DateTime;

        use super::Cursor;
        use crate::domain::job;

        #[test]
        fn cursor_survives_string_form() {
            let cursor = Cursor {
                posted_at: DateTime::from_rfc3339("2024-05-01T12:30:00.5Z")
                    .unwrap()
                    .coerce(),
                id: job::Id::new(),
            };

            let parsed = cursor.to_string().parse::<Cursor>().unwrap();

            assert_eq!(parsed, cursor);
        }

        #[test]
        fn cursors_order_by_posting_first() {
            let earlier = DateTime::from_rfc3339("2024-05-01T00:00:00Z")
                .unwrap()
                .coerce();
            let later = DateTime::from_rfc3339("2024-05-02T00:00:00Z")
                .unwrap()
                .coerce();
            let (a, b) = (job::Id::new(), job::Id::new());

            assert!(
                Cursor { posted_at: earlier, id: a.max(b) }
                    < Cursor { posted_at: later, id: a.min(b) }
            );
        }

        #[test]
        fn rejects_malformed_cursor() {
            assert!("".parse::<Cursor>().is_err());
            assert!("2024-05-01T00:00:00Z".parse::<Cursor>().is_err());
            assert!("yesterday/00000000-0000-0000-0000-000000000000"
                .parse::<Cursor>()
                .is_err());
        }
    }
}
