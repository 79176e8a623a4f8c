//! Tests for the catalogue service.

use std::sync::Arc;

use chrono::Utc;
use mockable::DefaultClock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    MockBillingPeriodRepository, MockItemRepository, MockRoomRepository, MockUserRepository,
    RoomRepositoryError,
};
use crate::domain::{ErrorCode, ItemName, ItemStats, ItemWithStats, Price, Role, User, UserId, Username};

type Service = CatalogueService<
    MockRoomRepository,
    MockItemRepository,
    MockUserRepository,
    MockBillingPeriodRepository,
>;

#[derive(Default)]
struct Mocks {
    rooms: MockRoomRepository,
    items: MockItemRepository,
    users: MockUserRepository,
    periods: MockBillingPeriodRepository,
}

impl Mocks {
    fn into_service(self) -> Service {
        CatalogueService::new(
            CatalogueRepositories {
                rooms: Arc::new(self.rooms),
                items: Arc::new(self.items),
                users: Arc::new(self.users),
                periods: Arc::new(self.periods),
            },
            Arc::new(DefaultClock),
        )
    }
}

#[fixture]
fn caller() -> Caller {
    Caller {
        user_id: UserId::new(4),
        username: Username::new("fay").expect("valid username"),
        role: Role::Admin,
    }
}

#[fixture]
fn cola() -> Item {
    Item {
        id: ItemId::new(11),
        name: ItemName::new("Cola").expect("valid name"),
        description: Description::default(),
        room_id: RoomId::new(2),
        room_name: RoomName::new("Kitchen").expect("valid name"),
        price: Price::from_cents(150).expect("valid price"),
        created_at: Utc::now(),
        created_by: None,
    }
}

fn stored(role: Role) -> User {
    User {
        id: UserId::new(4),
        username: Username::new("fay").expect("valid username"),
        email: None,
        role,
        created_at: Utc::now(),
    }
}

#[rstest]
#[tokio::test]
async fn default_room_is_protected() {
    let mut mocks = Mocks::default();
    mocks.rooms.expect_delete().never();

    let error = mocks
        .into_service()
        .delete_room(DEFAULT_ROOM_ID)
        .await
        .expect_err("protected");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn non_empty_room_is_kept() {
    let mut mocks = Mocks::default();
    mocks
        .rooms
        .expect_delete()
        .return_once(|_| Err(RoomRepositoryError::not_empty(2_u64)));

    let error = mocks
        .into_service()
        .delete_room(RoomId::new(2))
        .await
        .expect_err("room not empty");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn member_listing_hides_internal_fields(caller: Caller, cola: Item) {
    let mut mocks = Mocks::default();
    mocks
        .users
        .expect_find_by_id()
        .return_once(|_| Ok(Some(stored(Role::User))));
    mocks
        .items
        .expect_list()
        .return_once(move |_| Ok(vec![cola]));
    mocks.items.expect_list_with_stats().never();

    // The token still claims admin; the stored role decides.
    let listing = mocks
        .into_service()
        .list_items(&caller, None, PeriodSelector::All)
        .await
        .expect("listed");
    let ItemListing::Member(items) = listing else {
        panic!("expected member projection");
    };
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].room_name.as_ref(), "Kitchen");
}

#[rstest]
#[tokio::test]
async fn vanished_account_gets_member_projection(caller: Caller) {
    let mut mocks = Mocks::default();
    mocks.users.expect_find_by_id().return_once(|_| Ok(None));
    mocks.items.expect_list().return_once(|_| Ok(Vec::new()));

    let listing = mocks
        .into_service()
        .list_items(&caller, None, PeriodSelector::All)
        .await
        .expect("listed");
    assert!(matches!(listing, ItemListing::Member(_)));
}

#[rstest]
#[tokio::test]
async fn admin_listing_carries_stats(caller: Caller, cola: Item) {
    let mut mocks = Mocks::default();
    mocks
        .users
        .expect_find_by_id()
        .return_once(|_| Ok(Some(stored(Role::Admin))));
    mocks
        .items
        .expect_list_with_stats()
        .withf(|room, window| *room == Some(RoomId::new(2)) && window.is_none())
        .return_once(move |_, _| {
            Ok(vec![ItemWithStats {
                item: cola,
                stats: ItemStats {
                    stroke_count: 3,
                    last_stroke: None,
                },
            }])
        });

    let listing = mocks
        .into_service()
        .list_items(&caller, Some(RoomId::new(2)), PeriodSelector::All)
        .await
        .expect("listed");
    let ItemListing::Admin(items) = listing else {
        panic!("expected admin projection");
    };
    assert_eq!(items[0].stats.stroke_count, 3);
}

#[rstest]
#[tokio::test]
async fn create_item_records_creator(caller: Caller, cola: Item) {
    let mut mocks = Mocks::default();
    mocks
        .items
        .expect_create()
        .withf(|item| item.created_by == Some(UserId::new(4)) && item.price.cents() == 150)
        .return_once(move |_| Ok(cola));

    let draft = ItemDraft {
        name: ItemName::new("Cola").expect("valid name"),
        description: Description::default(),
        room_id: RoomId::new(2),
        price: Price::from_cents(150).expect("valid price"),
    };
    let item = mocks
        .into_service()
        .create_item(&caller, draft)
        .await
        .expect("created");
    assert_eq!(item.id, ItemId::new(11));
}

#[rstest]
#[tokio::test]
async fn empty_room_update_returns_current_room() {
    let mut mocks = Mocks::default();
    mocks.rooms.expect_update().never();
    mocks.rooms.expect_find_by_id().return_once(|_| Ok(None));

    let error = mocks
        .into_service()
        .update_room(RoomId::new(8), RoomChanges::default())
        .await
        .expect_err("unknown room");
    assert_eq!(error.code(), ErrorCode::NotFound);
}
