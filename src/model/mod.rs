//! Records served by the dashboard lists.
//!
//! The remote system owns every record; the client only ever holds
//! read-through copies keyed by [`Record::id`].

mod campaign;
mod contact;
mod email;
mod user;

pub use campaign::{Campaign, CampaignStatus, Platform};
pub use contact::{Contact, ContactDraft, ContactSource};
pub use email::{Email, EmailPatch};
pub use user::User;

/// An entity with a stable unique identifier.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}
