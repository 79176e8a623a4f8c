//! In-memory store implementing every repository port.
//!
//! All state lives behind one mutex so each port call is atomic, matching the
//! transactional guarantees of the Diesel adapters closely enough for
//! handler and service tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    BillingPeriodRepository, BillingPeriodRepositoryError, BootstrapRepository,
    BootstrapRepositoryError, ItemRepository, ItemRepositoryError, RoomRepository,
    RoomRepositoryError, SettingsRepository, SettingsRepositoryError, StrokeRepository,
    StrokeRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{
    BOOTSTRAP_ADMIN_ID, BillingPeriod, BillingPeriodId, DEFAULT_ROOM_ID, DefaultSeed,
    ImportOutcome, InvitationCode, Item, ItemChanges, ItemId, ItemStats, ItemWithStats,
    LegacyImport, NewBillingPeriod, NewItem, NewRoom, NewStroke, NewUser, PasswordDigest,
    PeriodWindow, Role, Room, RoomChanges, RoomId, RoomSummary, SeedReport, SeedStatus, Stroke,
    StrokeId, User, UserAccount, UserId, within,
};

#[derive(Default)]
struct Sequences {
    users: i64,
    rooms: i64,
    items: i64,
    strokes: i64,
    periods: i64,
}

fn bump(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, UserAccount>,
    rooms: BTreeMap<RoomId, Room>,
    items: BTreeMap<ItemId, Item>,
    strokes: BTreeMap<StrokeId, Stroke>,
    periods: BTreeMap<BillingPeriodId, BillingPeriod>,
    invitation_code: Option<InvitationCode>,
    sequences: Sequences,
}

impl State {
    fn admin_count(&self) -> usize {
        self.users
            .values()
            .filter(|account| account.user.role.is_admin())
            .count()
    }

    fn username_taken(&self, username: &str) -> bool {
        self.users
            .values()
            .any(|account| account.user.username.as_ref() == username)
    }

    fn email_taken(&self, email: &str) -> bool {
        self.users.values().any(|account| {
            account
                .user
                .email
                .as_ref()
                .is_some_and(|existing| existing.as_ref() == email)
        })
    }

    fn room_name_taken(&self, name: &str, except: Option<RoomId>) -> bool {
        let folded = name.to_lowercase();
        self.rooms
            .values()
            .any(|room| Some(room.id) != except && room.name.folded() == folded)
    }

    fn item_name_taken(&self, room: RoomId, name: &str, except: Option<ItemId>) -> bool {
        let folded = name.to_lowercase();
        self.items.values().any(|item| {
            item.room_id == room && Some(item.id) != except && item.name.folded() == folded
        })
    }

    fn item_count(&self, room: RoomId) -> u64 {
        self.items.values().filter(|item| item.room_id == room).count() as u64
    }

    fn stats_for(&self, item: ItemId, window: Option<&PeriodWindow>) -> ItemStats {
        self.strokes
            .values()
            .filter(|stroke| stroke.item_id == item && within(window, stroke.created_at))
            .fold(ItemStats::default(), |mut stats, stroke| {
                stats.stroke_count += 1;
                stats.last_stroke = stats.last_stroke.max(Some(stroke.created_at));
                stats
            })
    }

    fn items_in(&self, room: Option<RoomId>) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .items
            .values()
            .filter(|item| room.is_none_or(|id| item.room_id == id))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.name
                .folded()
                .cmp(&b.name.folded())
                .then_with(|| a.id.cmp(&b.id))
        });
        items
    }

    fn insert_user(&mut self, id: UserId, user: &NewUser) -> User {
        let created = User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
        };
        self.users.insert(
            id,
            UserAccount {
                user: created.clone(),
                password_digest: user.password_digest.clone(),
            },
        );
        created
    }

    fn forget_user(&mut self, id: UserId) {
        self.users.remove(&id);
        let clear = |created_by: &mut Option<UserId>| {
            if *created_by == Some(id) {
                *created_by = None;
            }
        };
        self.rooms.values_mut().for_each(|room| clear(&mut room.created_by));
        self.items.values_mut().for_each(|item| clear(&mut item.created_by));
        self.periods
            .values_mut()
            .for_each(|period| clear(&mut period.created_by));
        self.strokes
            .values_mut()
            .for_each(|stroke| clear(&mut stroke.user_id));
    }
}

/// Shared in-memory implementation of every repository port.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("in-memory store mutex"),
        }
    }

    /// Number of strokes currently held, across all items.
    #[must_use]
    pub fn stroke_count(&self) -> usize {
        self.lock().strokes.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAccount>, UserRepositoryError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|account| account.user.username.as_ref() == username)
            .cloned())
    }

    async fn find_account(&self, id: UserId) -> Result<Option<UserAccount>, UserRepositoryError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.lock().users.get(&id).map(|account| account.user.clone()))
    }

    async fn list(&self) -> Result<Vec<User>, UserRepositoryError> {
        let mut users: Vec<User> = self
            .lock()
            .users
            .values()
            .map(|account| account.user.clone())
            .collect();
        users.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(users)
    }

    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut state = self.lock();
        if state.username_taken(user.username.as_ref()) {
            return Err(UserRepositoryError::duplicate_username());
        }
        if user
            .email
            .as_ref()
            .is_some_and(|email| state.email_taken(email.as_ref()))
        {
            return Err(UserRepositoryError::duplicate_email());
        }
        let id = UserId::new(bump(&mut state.sequences.users));
        Ok(state.insert_user(id, user))
    }

    async fn update_password(
        &self,
        id: UserId,
        digest: &PasswordDigest,
    ) -> Result<(), UserRepositoryError> {
        let mut state = self.lock();
        let account = state
            .users
            .get_mut(&id)
            .ok_or_else(UserRepositoryError::not_found)?;
        account.password_digest = digest.clone();
        Ok(())
    }

    async fn change_role(&self, id: UserId, role: Role) -> Result<User, UserRepositoryError> {
        let mut state = self.lock();
        let current = state
            .users
            .get(&id)
            .map(|account| account.user.role)
            .ok_or_else(UserRepositoryError::not_found)?;
        if current.is_admin() && !role.is_admin() && state.admin_count() <= 1 {
            return Err(UserRepositoryError::last_admin());
        }
        let account = state
            .users
            .get_mut(&id)
            .ok_or_else(UserRepositoryError::not_found)?;
        account.user.role = role;
        Ok(account.user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<(), UserRepositoryError> {
        let mut state = self.lock();
        let role = state
            .users
            .get(&id)
            .map(|account| account.user.role)
            .ok_or_else(UserRepositoryError::not_found)?;
        if role.is_admin() && state.admin_count() <= 1 {
            return Err(UserRepositoryError::last_admin());
        }
        state.forget_user(id);
        Ok(())
    }
}

#[async_trait]
impl SettingsRepository for InMemoryStore {
    async fn invitation_code(&self) -> Result<Option<InvitationCode>, SettingsRepositoryError> {
        Ok(self.lock().invitation_code.clone())
    }

    async fn set_invitation_code(
        &self,
        code: &InvitationCode,
    ) -> Result<(), SettingsRepositoryError> {
        self.lock().invitation_code = Some(code.clone());
        Ok(())
    }
}

#[async_trait]
impl RoomRepository for InMemoryStore {
    async fn list_summaries(&self) -> Result<Vec<RoomSummary>, RoomRepositoryError> {
        let state = self.lock();
        let mut summaries: Vec<RoomSummary> = state
            .rooms
            .values()
            .map(|room| RoomSummary {
                room: room.clone(),
                item_count: state.item_count(room.id),
            })
            .collect();
        summaries.sort_by(|a, b| {
            a.room
                .name
                .folded()
                .cmp(&b.room.name.folded())
                .then_with(|| a.room.id.cmp(&b.room.id))
        });
        Ok(summaries)
    }

    async fn find_by_id(&self, id: RoomId) -> Result<Option<Room>, RoomRepositoryError> {
        Ok(self.lock().rooms.get(&id).cloned())
    }

    async fn create(&self, room: &NewRoom) -> Result<Room, RoomRepositoryError> {
        let mut state = self.lock();
        if state.room_name_taken(room.name.as_ref(), None) {
            return Err(RoomRepositoryError::duplicate_name());
        }
        let id = RoomId::new(bump(&mut state.sequences.rooms));
        let created = Room {
            id,
            name: room.name.clone(),
            description: room.description.clone(),
            created_at: room.created_at,
            created_by: room.created_by,
        };
        state.rooms.insert(id, created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        id: RoomId,
        changes: &RoomChanges,
    ) -> Result<Room, RoomRepositoryError> {
        let mut state = self.lock();
        if !state.rooms.contains_key(&id) {
            return Err(RoomRepositoryError::not_found());
        }
        if let Some(name) = &changes.name {
            if state.room_name_taken(name.as_ref(), Some(id)) {
                return Err(RoomRepositoryError::duplicate_name());
            }
            state
                .items
                .values_mut()
                .filter(|item| item.room_id == id)
                .for_each(|item| item.room_name = name.clone());
        }
        let room = state
            .rooms
            .get_mut(&id)
            .ok_or_else(RoomRepositoryError::not_found)?;
        if let Some(name) = &changes.name {
            room.name = name.clone();
        }
        if let Some(description) = &changes.description {
            room.description = description.clone();
        }
        Ok(room.clone())
    }

    async fn delete(&self, id: RoomId) -> Result<(), RoomRepositoryError> {
        let mut state = self.lock();
        if !state.rooms.contains_key(&id) {
            return Err(RoomRepositoryError::not_found());
        }
        let item_count = state.item_count(id);
        if item_count > 0 {
            return Err(RoomRepositoryError::not_empty(item_count));
        }
        state.rooms.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for InMemoryStore {
    async fn list(&self, room: Option<RoomId>) -> Result<Vec<Item>, ItemRepositoryError> {
        Ok(self.lock().items_in(room))
    }

    async fn list_with_stats(
        &self,
        room: Option<RoomId>,
        window: Option<PeriodWindow>,
    ) -> Result<Vec<ItemWithStats>, ItemRepositoryError> {
        let state = self.lock();
        Ok(state
            .items_in(room)
            .into_iter()
            .map(|item| {
                let stats = state.stats_for(item.id, window.as_ref());
                ItemWithStats { item, stats }
            })
            .collect())
    }

    async fn find_by_id(&self, id: ItemId) -> Result<Option<Item>, ItemRepositoryError> {
        Ok(self.lock().items.get(&id).cloned())
    }

    async fn create(&self, item: &NewItem) -> Result<Item, ItemRepositoryError> {
        let mut state = self.lock();
        let room_name = state
            .rooms
            .get(&item.room_id)
            .map(|room| room.name.clone())
            .ok_or_else(ItemRepositoryError::room_not_found)?;
        if state.item_name_taken(item.room_id, item.name.as_ref(), None) {
            return Err(ItemRepositoryError::duplicate_name());
        }
        let id = ItemId::new(bump(&mut state.sequences.items));
        let created = Item {
            id,
            name: item.name.clone(),
            description: item.description.clone(),
            room_id: item.room_id,
            room_name,
            price: item.price,
            created_at: item.created_at,
            created_by: item.created_by,
        };
        state.items.insert(id, created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        id: ItemId,
        changes: &ItemChanges,
    ) -> Result<Item, ItemRepositoryError> {
        let mut state = self.lock();
        let current = state
            .items
            .get(&id)
            .cloned()
            .ok_or_else(ItemRepositoryError::not_found)?;
        let room_id = changes.room_id.unwrap_or(current.room_id);
        let room_name = state
            .rooms
            .get(&room_id)
            .map(|room| room.name.clone())
            .ok_or_else(ItemRepositoryError::room_not_found)?;
        let name = changes.name.clone().unwrap_or(current.name);
        if state.item_name_taken(room_id, name.as_ref(), Some(id)) {
            return Err(ItemRepositoryError::duplicate_name());
        }
        let updated = Item {
            id,
            name,
            description: changes
                .description
                .clone()
                .unwrap_or(current.description),
            room_id,
            room_name,
            price: changes.price.unwrap_or(current.price),
            created_at: current.created_at,
            created_by: current.created_by,
        };
        state.items.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: ItemId) -> Result<u64, ItemRepositoryError> {
        let mut state = self.lock();
        if state.items.remove(&id).is_none() {
            return Err(ItemRepositoryError::not_found());
        }
        let before = state.strokes.len();
        state.strokes.retain(|_, stroke| stroke.item_id != id);
        Ok((before - state.strokes.len()) as u64)
    }
}

#[async_trait]
impl StrokeRepository for InMemoryStore {
    async fn append(&self, stroke: &NewStroke) -> Result<Stroke, StrokeRepositoryError> {
        let mut state = self.lock();
        if !state.items.contains_key(&stroke.item_id) {
            return Err(StrokeRepositoryError::item_not_found());
        }
        if !state.users.contains_key(&stroke.user_id) {
            return Err(StrokeRepositoryError::user_not_found());
        }
        let id = StrokeId::new(bump(&mut state.sequences.strokes));
        let created = Stroke {
            id,
            item_id: stroke.item_id,
            user_id: Some(stroke.user_id),
            username: stroke.username.clone(),
            created_at: stroke.created_at,
        };
        state.strokes.insert(id, created.clone());
        Ok(created)
    }

    async fn list_for_item(
        &self,
        item: ItemId,
        window: Option<PeriodWindow>,
    ) -> Result<Vec<Stroke>, StrokeRepositoryError> {
        let mut strokes: Vec<Stroke> = self
            .lock()
            .strokes
            .values()
            .filter(|stroke| stroke.item_id == item && within(window.as_ref(), stroke.created_at))
            .cloned()
            .collect();
        strokes.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(strokes)
    }

    async fn remove_for_item(
        &self,
        item: ItemId,
        window: Option<PeriodWindow>,
    ) -> Result<u64, StrokeRepositoryError> {
        let mut state = self.lock();
        let before = state.strokes.len();
        state.strokes.retain(|_, stroke| {
            !(stroke.item_id == item && within(window.as_ref(), stroke.created_at))
        });
        Ok((before - state.strokes.len()) as u64)
    }

    async fn counts_for_user(
        &self,
        user: UserId,
        window: Option<PeriodWindow>,
    ) -> Result<Vec<(ItemId, u64)>, StrokeRepositoryError> {
        let mut counts: BTreeMap<ItemId, u64> = BTreeMap::new();
        for stroke in self.lock().strokes.values() {
            if stroke.user_id == Some(user) && within(window.as_ref(), stroke.created_at) {
                *counts.entry(stroke.item_id).or_default() += 1;
            }
        }
        Ok(counts.into_iter().collect())
    }
}

#[async_trait]
impl BillingPeriodRepository for InMemoryStore {
    async fn create(
        &self,
        period: &NewBillingPeriod,
        activate: bool,
    ) -> Result<BillingPeriod, BillingPeriodRepositoryError> {
        let mut state = self.lock();
        if activate {
            state
                .periods
                .values_mut()
                .for_each(|existing| existing.is_active = false);
        }
        let id = BillingPeriodId::new(bump(&mut state.sequences.periods));
        let created = BillingPeriod {
            id,
            name: period.name.clone(),
            range: period.range,
            is_active: activate,
            created_at: period.created_at,
            created_by: period.created_by,
        };
        state.periods.insert(id, created.clone());
        Ok(created)
    }

    async fn activate(
        &self,
        id: BillingPeriodId,
    ) -> Result<BillingPeriod, BillingPeriodRepositoryError> {
        let mut state = self.lock();
        if !state.periods.contains_key(&id) {
            return Err(BillingPeriodRepositoryError::not_found());
        }
        state
            .periods
            .values_mut()
            .for_each(|period| period.is_active = period.id == id);
        state
            .periods
            .get(&id)
            .cloned()
            .ok_or_else(BillingPeriodRepositoryError::not_found)
    }

    async fn list(&self) -> Result<Vec<BillingPeriod>, BillingPeriodRepositoryError> {
        let mut periods: Vec<BillingPeriod> = self.lock().periods.values().cloned().collect();
        periods.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(periods)
    }

    async fn find_by_id(
        &self,
        id: BillingPeriodId,
    ) -> Result<Option<BillingPeriod>, BillingPeriodRepositoryError> {
        Ok(self.lock().periods.get(&id).cloned())
    }

    async fn find_active(&self) -> Result<Option<BillingPeriod>, BillingPeriodRepositoryError> {
        Ok(self
            .lock()
            .periods
            .values()
            .find(|period| period.is_active)
            .cloned())
    }
}

#[async_trait]
impl BootstrapRepository for InMemoryStore {
    async fn import_legacy(
        &self,
        import: &LegacyImport,
    ) -> Result<ImportOutcome, BootstrapRepositoryError> {
        let mut state = self.lock();
        if !state.users.is_empty() {
            return Ok(ImportOutcome::SkippedExistingData);
        }
        for account in &import.users {
            state.users.insert(account.user.id, account.clone());
        }
        for room in &import.rooms {
            state.rooms.insert(room.id, room.clone());
        }
        for item in &import.items {
            state.items.insert(item.id, item.clone());
        }
        for stroke in &import.strokes {
            state.strokes.insert(stroke.id, stroke.clone());
        }
        if let Some(code) = &import.invitation_code {
            state.invitation_code = Some(code.clone());
        }
        let sequences = Sequences {
            users: state.users.keys().map(|id| id.get()).max().unwrap_or(0),
            rooms: state.rooms.keys().map(|id| id.get()).max().unwrap_or(0),
            items: state.items.keys().map(|id| id.get()).max().unwrap_or(0),
            strokes: state.strokes.keys().map(|id| id.get()).max().unwrap_or(0),
            periods: state.sequences.periods,
        };
        state.sequences = sequences;
        Ok(ImportOutcome::Imported {
            users: import.users.len(),
            rooms: import.rooms.len(),
            items: import.items.len(),
            strokes: import.strokes.len(),
        })
    }

    async fn seed_defaults(
        &self,
        seed: &DefaultSeed,
    ) -> Result<SeedReport, BootstrapRepositoryError> {
        let mut state = self.lock();
        let admin = match (&seed.admin, state.users.is_empty()) {
            (_, false) => SeedStatus::AlreadyPresent,
            (None, true) => SeedStatus::Missing,
            (Some(admin), true) => {
                state.insert_user(BOOTSTRAP_ADMIN_ID, admin);
                state.sequences.users = state.sequences.users.max(BOOTSTRAP_ADMIN_ID.get());
                SeedStatus::Created
            }
        };
        let room = if state.rooms.contains_key(&DEFAULT_ROOM_ID) {
            SeedStatus::AlreadyPresent
        } else if state.room_name_taken(seed.room.name.as_ref(), None) {
            return Err(BootstrapRepositoryError::query(format!(
                "default room name {} is held by another room",
                seed.room.name.as_ref()
            )));
        } else {
            state.rooms.insert(
                DEFAULT_ROOM_ID,
                Room {
                    id: DEFAULT_ROOM_ID,
                    name: seed.room.name.clone(),
                    description: seed.room.description.clone(),
                    created_at: seed.room.created_at,
                    created_by: seed.room.created_by,
                },
            );
            state.sequences.rooms = state.sequences.rooms.max(DEFAULT_ROOM_ID.get());
            SeedStatus::Created
        };
        let invitation_code = if state.invitation_code.is_some() {
            SeedStatus::AlreadyPresent
        } else {
            state.invitation_code = Some(seed.invitation_code.clone());
            SeedStatus::Created
        };
        Ok(SeedReport {
            admin,
            room,
            invitation_code,
        })
    }
}
