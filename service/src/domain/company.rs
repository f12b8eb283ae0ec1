//! [`Company`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;

pub use crate::domain::contact::{Email, Phone, Url};
#[cfg(doc)]
use crate::domain::Job;
use crate::domain::{user, User};

/// Employer registered on the job board.
///
/// [`Job`]s reference their [`Company`], so the list of posted [`Job`]s is
/// derived from them rather than stored here.
#[derive(Clone, Debug)]
pub struct Company {
    /// ID of this [`Company`].
    pub id: Id,

    /// ID of the [`User`] who registered this [`Company`].
    pub owner_id: user::Id,

    /// Unique [`Name`] of this [`Company`].
    pub name: Name,

    /// [`Status`] of this [`Company`].
    pub status: Status,

    /// Logo [`Url`] of this [`Company`], if any.
    pub logo: Option<Url>,

    /// [`Location`] of this [`Company`] headquarters.
    pub location: Location,

    /// Website [`Url`] of this [`Company`], if any.
    pub website: Option<Url>,

    /// [`Industry`] this [`Company`] operates in, if specified.
    pub industry: Option<Industry>,

    /// [`Size`] of this [`Company`], if specified.
    pub size: Option<Size>,

    /// [`Description`] of this [`Company`], if any.
    pub description: Option<Description>,

    /// Contact [`Email`] of this [`Company`].
    pub email: Email,

    /// Contact [`Phone`] of this [`Company`], if any.
    pub phone: Option<Phone>,

    /// [`DateTime`] when this [`Company`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Company`] was modified the last time.
    pub updated_at: ModificationDateTime,
}

impl Company {
    /// Indicates whether this [`Company`] is [`Status::Active`].
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// Indicates whether the provided [`User`] may manage this [`Company`].
    #[must_use]
    pub fn is_managed_by(&self, user: &User) -> bool {
        self.owner_id == user.id || user.is_admin()
    }
}

/// ID of a [`Company`].
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
    #[doc = "Status of a [`Company`]."]
    enum Status {
        #[doc = "[`Company`] is operating and may have active [`Job`]s."]
        Active = 1,

        #[doc = "[`Company`] is suspended, so none of its [`Job`]s is active."]
        Inactive = 2,
    }
}

define_kind! {
    #[doc = "Headcount range of a [`Company`]."]
    enum Size {
        #[doc = "1-10 employees."]
        Micro = 1,

        #[doc = "11-50 employees."]
        Small = 2,

        #[doc = "51-200 employees."]
        Medium = 3,

        #[doc = "201-500 employees."]
        Large = 4,

        #[doc = "More than 500 employees."]
        Enterprise = 5,
    }
}

define_text! {
    #[doc = "Name of a [`Company`]."]
    Name(max = 256)
}

define_text! {
    #[doc = "Location of a [`Company`] headquarters."]
    Location(max = 256)
}

define_text! {
    #[doc = "Industry a [`Company`] operates in."]
    Industry(max = 128)
}

define_text! {
    #[doc = "Description of a [`Company`]."]
    Description(max = 4096)
}

/// [`DateTime`] when a [`Company`] was created.
pub type CreationDateTime = DateTimeOf<(Company, unit::Creation)>;

/// [`DateTime`] when a [`Company`] was modified the last time.
pub type ModificationDateTime = DateTimeOf<(Company, unit::Modification)>;
