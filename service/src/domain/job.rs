//! [`Job`] definitions.

use std::{collections::BTreeSet, time::Duration};

#[cfg(doc)]
use common::DateTime;
use common::{datetime, define_kind, unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use uuid::Uuid;

pub use crate::domain::company::Industry;
use crate::domain::{company, user, Company, User};

/// Open position posted by a [`Company`].
#[derive(Clone, Debug)]
pub struct Job {
    /// ID of this [`Job`].
    pub id: Id,

    /// ID of the [`Company`] this [`Job`] belongs to.
    pub company_id: company::Id,

    /// ID of the [`User`] who posted this [`Job`].
    pub created_by: user::Id,

    /// [`Title`] of this [`Job`].
    pub title: Title,

    /// [`Description`] of this [`Job`].
    pub description: Description,

    /// [`Skill`]s required by this [`Job`].
    pub skills: BTreeSet<Skill>,

    /// [`Salary`] offered by this [`Job`].
    pub salary: Salary,

    /// [`Location`] of this [`Job`].
    pub location: Location,

    /// [`WorkType`] of this [`Job`].
    pub work_type: WorkType,

    /// [`EmploymentType`] of this [`Job`].
    pub employment_type: EmploymentType,

    /// [`ExperienceLevel`] required by this [`Job`].
    pub experience_level: ExperienceLevel,

    /// [`Education`] required by this [`Job`].
    pub education: Education,

    /// [`Industry`] of this [`Job`], if specified.
    pub industry: Option<Industry>,

    /// Number of open [`Positions`] of this [`Job`].
    pub positions: Positions,

    /// IDs of the [`User`]s who applied for this [`Job`], in the order they
    /// applied.
    pub applicants: Vec<user::Id>,

    /// [`Status`] of this [`Job`].
    pub status: Status,

    /// [`DateTime`] when this [`Job`] was posted.
    pub posted_at: PostingDateTime,

    /// [`DateTime`] after which this [`Job`] is no longer active.
    pub expires_at: ExpirationDateTime,

    /// [`DateTime`] when this [`Job`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Job`] was modified the last time.
    pub updated_at: ModificationDateTime,
}

impl Job {
    /// [`Duration`] a newly posted [`Job`] stays active for.
    pub const EXPIRATION_PERIOD: Duration = datetime::days(7);

    /// Age after which an active [`Job`] is expired by a sweep regardless of
    /// its [`Job::expires_at`].
    pub const STALE_PERIOD: Duration = datetime::days(30);

    /// Indicates whether this [`Job`] is [`Status::Active`].
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// Indicates whether this [`Job`] is still active while its
    /// [`Job::expires_at`] has already passed at the provided moment.
    #[must_use]
    pub fn is_overdue<Of: ?Sized>(&self, now: DateTimeOf<Of>) -> bool {
        self.is_active() && self.is_past_expiration(now)
    }

    /// Indicates whether [`Job::expires_at`] has passed at the provided
    /// moment, whatever the [`Status`] of this [`Job`] is.
    #[must_use]
    pub fn is_past_expiration<Of: ?Sized>(
        &self,
        now: DateTimeOf<Of>,
    ) -> bool {
        now.coerce() > self.expires_at
    }

    /// Transitions this [`Job`] into [`Status::Expired`] if it's active.
    ///
    /// Returns whether the [`Status`] has changed, so expiring an already
    /// expired (or otherwise inactive) [`Job`] is a no-op.
    pub fn expire<Of: ?Sized>(&mut self, now: DateTimeOf<Of>) -> bool {
        if !self.is_active() {
            return false;
        }
        self.status = Status::Expired;
        self.updated_at = now.coerce();
        true
    }

    /// Indicates whether the provided [`User`] may manage this [`Job`] of the
    /// provided [`Company`].
    #[must_use]
    pub fn is_managed_by(&self, user: &User, company: &Company) -> bool {
        self.created_by == user.id || company.is_managed_by(user)
    }

    /// Registers the provided applicant for this [`Job`].
    ///
    /// Returns `false` if the applicant has already applied.
    pub fn add_applicant(&mut self, applicant: user::Id) -> bool {
        if self.applicants.contains(&applicant) {
            return false;
        }
        self.applicants.push(applicant);
        true
    }
}

/// ID of a [`Job`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Lifecycle status of a [`Job`]."]
    enum Status {
        #[doc = "[`Job`] is published and accepts applications."]
        Active = 1,

        #[doc = "[`Job`] is hidden by its recruiter or its [`Company`]."]
        Inactive = 2,

        #[doc = "[`Job`] is filled and closed."]
        Closed = 3,

        #[doc = "[`Job`] has outlived its [`Job::expires_at`]."]
        Expired = 4,
    }
}

impl Status {
    /// Indicates whether this [`Status`] may be requested explicitly.
    #[must_use]
    pub const fn is_requestable(self) -> bool {
        // TODO: Produce `Closed` once recruiters can close filled positions.
        matches!(self, Self::Active | Self::Inactive | Self::Expired)
    }

    /// Returns the [`Status`] a [`Job`] actually gets when this one is
    /// written while its [`Company`] has the provided [`company::Status`].
    ///
    /// A [`Job`] of an inactive [`Company`] is always [`Status::Inactive`].
    #[must_use]
    pub const fn under(self, company: company::Status) -> Self {
        match company {
            company::Status::Active => self,
            company::Status::Inactive => Self::Inactive,
        }
    }
}

define_kind! {
    #[doc = "Where the work on a [`Job`] happens."]
    enum WorkType {
        #[doc = "At the employer's office."]
        OnSite = 1,

        #[doc = "From anywhere."]
        Remote = 2,

        #[doc = "Partly at the office, partly remote."]
        Hybrid = 3,
    }
}

define_kind! {
    #[doc = "Kind of employment offered by a [`Job`]."]
    enum EmploymentType {
        #[doc = "Full-time employment."]
        FullTime = 1,

        #[doc = "Part-time employment."]
        PartTime = 2,

        #[doc = "Fixed-term contract."]
        Contract = 3,

        #[doc = "Internship."]
        Internship = 4,

        #[doc = "Freelance engagement."]
        Freelance = 5,
    }
}

define_kind! {
    #[doc = "Seniority required by a [`Job`]."]
    enum ExperienceLevel {
        #[doc = "Entry level."]
        Entry = 1,

        #[doc = "Mid level."]
        Mid = 2,

        #[doc = "Senior level."]
        Senior = 3,

        #[doc = "Team lead."]
        Lead = 4,

        #[doc = "Executive."]
        Executive = 5,
    }
}

define_text! {
    #[doc = "Title of a [`Job`]."]
    Title(max = 256)
}

define_text! {
    #[doc = "Description of a [`Job`]."]
    Description(max = 16384)
}

define_text! {
    #[doc = "Skill required by a [`Job`]."]
    Skill(max = 64)
}

define_text! {
    #[doc = "Location of a [`Job`]."]
    Location(max = 256)
}

define_text! {
    #[doc = "Education required by a [`Job`]."]
    Education(max = 256)
}

/// Salary offered by a [`Job`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Salary(Decimal);

impl Salary {
    /// Creates a new [`Salary`] if the given `amount` is not negative.
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        (!amount.is_sign_negative() || amount.is_zero()).then_some(Self(amount))
    }

    /// Returns the amount of this [`Salary`].
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }
}

impl FromStr for Salary {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `Salary`")
    }
}

/// Number of open positions of a [`Job`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd)]
pub struct Positions(u16);

impl Positions {
    /// Creates new [`Positions`] if the given `count` is positive.
    #[must_use]
    pub const fn new(count: u16) -> Option<Self> {
        if count == 0 {
            None
        } else {
            Some(Self(count))
        }
    }

    /// Returns the number of these [`Positions`].
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

/// Field of a [`Job`] that must be provided when creating it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    /// [`Job::company_id`].
    CompanyId,

    /// [`Job::title`].
    Title,

    /// [`Job::description`].
    Description,

    /// [`Job::salary`].
    Salary,

    /// [`Job::location`].
    Location,

    /// [`Job::employment_type`].
    EmploymentType,

    /// [`Job::experience_level`].
    ExperienceLevel,

    /// [`Job::education`].
    Education,

    /// [`Job::positions`].
    Positions,
}

/// Persisted intention to expire a [`Job`] once it's due.
///
/// Scheduled along with the [`Job`] creation and dropped along with the
/// [`Job`], so it survives restarts of the process.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Expiration {
    /// ID of the [`Job`] to expire.
    pub job_id: Id,

    /// [`DateTime`] when the [`Job`] should be expired.
    pub due_at: ExpirationDateTime,
}

/// Application of a job seeker for a [`Job`].
///
/// Lands only on an active [`Job`] which is not past its
/// [`Job::expires_at`], and only once per applicant.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Application {
    /// ID of the [`Job`] to apply for.
    pub job_id: Id,

    /// ID of the applying [`User`].
    pub applicant_id: user::Id,

    /// [`DateTime`] of applying.
    pub applied_at: ModificationDateTime,
}

/// [`DateTime`] when a [`Job`] was created.
pub type CreationDateTime = DateTimeOf<(Job, unit::Creation)>;

/// [`DateTime`] when a [`Job`] was modified the last time.
pub type ModificationDateTime = DateTimeOf<(Job, unit::Modification)>;

/// [`DateTime`] when a [`Job`] was posted.
pub type PostingDateTime = DateTimeOf<(Job, unit::Publication)>;

/// [`DateTime`] when a [`Job`] expires.
pub type ExpirationDateTime = DateTimeOf<(Job, unit::Expiration)>;
