//! Reservation state machine.
//!
//! Each action resolves through a static table to its target status, the
//! topic its event is published on, and the predicate that authorizes it.
//! Adding an action means adding a variant and a table row.
//!
//! Transitions do not look at the booking's current status: any action can be
//! applied from any state, including re-confirming a confirmed booking.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::events::BookingTopic;
use crate::models::{Actor, Booking, BookingStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BookingAction {
    Confirm,
    Reject,
    Cancel,
}

/// What an authorization predicate gets to look at
#[derive(Debug, Clone, Copy)]
pub struct AccessContext<'a> {
    pub actor: &'a Actor,
    /// The booking as currently persisted
    pub booking: &'a Booking,
    /// Organization of the booking's property, if the property still exists
    pub property_organization_id: Option<Uuid>,
}

pub type Authorize = fn(&AccessContext<'_>) -> bool;

#[derive(Debug)]
pub struct Transition {
    pub status: BookingStatus,
    pub topic: BookingTopic,
    authorize: Authorize,
}

impl Transition {
    pub fn is_authorized(&self, ctx: &AccessContext<'_>) -> bool {
        (self.authorize)(ctx)
    }
}

static CONFIRM: Transition = Transition {
    status: BookingStatus::Confirmed,
    topic: BookingTopic::Confirm,
    authorize: admin_or_property_member,
};

static REJECT: Transition = Transition {
    status: BookingStatus::Rejected,
    topic: BookingTopic::Reject,
    authorize: admin_or_property_member,
};

static CANCEL: Transition = Transition {
    status: BookingStatus::Cancelled,
    topic: BookingTopic::Cancel,
    authorize: admin_or_guest,
};

impl BookingAction {
    pub fn transition(self) -> &'static Transition {
        match self {
            BookingAction::Confirm => &CONFIRM,
            BookingAction::Reject => &REJECT,
            BookingAction::Cancel => &CANCEL,
        }
    }
}

/// Platform admins, or members of the organization that manages the property
fn admin_or_property_member(ctx: &AccessContext<'_>) -> bool {
    if ctx.actor.is_admin() {
        return true;
    }
    match (ctx.actor.organization_id(), ctx.property_organization_id) {
        (Some(member_of), Some(owner)) => member_of == owner,
        _ => false,
    }
}

/// Platform admins, or the guest who made the booking
fn admin_or_guest(ctx: &AccessContext<'_>) -> bool {
    ctx.actor.is_admin() || ctx.actor.id == ctx.booking.user_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewBooking, OrganizationMembership, OrganizationRole, UserRole};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use strum::IntoEnumIterator;

    fn booking(user_id: Uuid) -> Booking {
        Booking::new(NewBooking {
            property_id: Uuid::now_v7(),
            user_id,
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
            number_of_guests: 1,
            total_price: dec!(200),
            confirmation_code: "ZX82MNQA".to_string(),
        })
    }

    fn actor(role: UserRole, organization_id: Option<Uuid>) -> Actor {
        Actor {
            id: Uuid::now_v7(),
            email: "someone@example.com".to_string(),
            name: "Someone".to_string(),
            role,
            organization_membership: organization_id.map(|organization_id| {
                OrganizationMembership {
                    organization_id,
                    role: OrganizationRole::Member,
                }
            }),
        }
    }

    #[test]
    fn test_table_targets() {
        assert_eq!(BookingAction::Confirm.transition().status, BookingStatus::Confirmed);
        assert_eq!(BookingAction::Reject.transition().status, BookingStatus::Rejected);
        assert_eq!(BookingAction::Cancel.transition().status, BookingStatus::Cancelled);
        assert_eq!(BookingAction::Cancel.transition().topic, BookingTopic::Cancel);
    }

    #[test]
    fn test_admin_is_authorized_for_every_action() {
        let admin = actor(UserRole::Admin, None);
        let booking = booking(Uuid::now_v7());
        let ctx = AccessContext {
            actor: &admin,
            booking: &booking,
            property_organization_id: Some(Uuid::now_v7()),
        };

        for action in BookingAction::iter() {
            assert!(action.transition().is_authorized(&ctx), "{action}");
        }
    }

    #[test]
    fn test_property_organization_member_can_confirm_and_reject() {
        let org = Uuid::now_v7();
        let member = actor(UserRole::User, Some(org));
        let booking = booking(Uuid::now_v7());
        let ctx = AccessContext {
            actor: &member,
            booking: &booking,
            property_organization_id: Some(org),
        };

        assert!(BookingAction::Confirm.transition().is_authorized(&ctx));
        assert!(BookingAction::Reject.transition().is_authorized(&ctx));
        // managing the property does not make you the guest
        assert!(!BookingAction::Cancel.transition().is_authorized(&ctx));
    }

    #[test]
    fn test_member_of_other_organization_is_refused() {
        let member = actor(UserRole::User, Some(Uuid::now_v7()));
        let booking = booking(Uuid::now_v7());
        let ctx = AccessContext {
            actor: &member,
            booking: &booking,
            property_organization_id: Some(Uuid::now_v7()),
        };

        assert!(!BookingAction::Confirm.transition().is_authorized(&ctx));
        assert!(!BookingAction::Reject.transition().is_authorized(&ctx));
    }

    #[test]
    fn test_missing_property_only_admits_admins() {
        let member = actor(UserRole::User, Some(Uuid::now_v7()));
        let booking = booking(Uuid::now_v7());
        let ctx = AccessContext {
            actor: &member,
            booking: &booking,
            property_organization_id: None,
        };

        assert!(!BookingAction::Confirm.transition().is_authorized(&ctx));
    }

    #[test]
    fn test_guest_can_cancel_own_booking_only() {
        let guest = actor(UserRole::User, None);
        let own = booking(guest.id);
        let other = booking(Uuid::now_v7());

        let own_ctx = AccessContext {
            actor: &guest,
            booking: &own,
            property_organization_id: None,
        };
        let other_ctx = AccessContext {
            booking: &other,
            ..own_ctx
        };

        assert!(BookingAction::Cancel.transition().is_authorized(&own_ctx));
        assert!(!BookingAction::Cancel.transition().is_authorized(&other_ctx));
        assert!(!BookingAction::Confirm.transition().is_authorized(&own_ctx));
    }

    #[test]
    fn test_action_names() {
        assert_eq!(BookingAction::Confirm.to_string(), "confirm");
        assert_eq!("cancel".parse::<BookingAction>().unwrap(), BookingAction::Cancel);
    }
}
