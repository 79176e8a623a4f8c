//! Stroke ledger values and analytics aggregation.
//!
//! A stroke is an immutable consumption event. Strokes are only appended or
//! bulk-removed per item.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::catalogue::{Description, Item, ItemName, Price};
use super::ids::{ItemId, StrokeId, UserId};
use super::user::Username;

/// Number of most recent strokes reported by item analytics.
pub const RECENT_STROKES_LIMIT: usize = 10;

/// One logged consumption event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stroke {
    pub id: StrokeId,
    pub item_id: ItemId,
    /// Cleared when the account is deleted; the username copy remains.
    pub user_id: Option<UserId>,
    pub username: Username,
    pub created_at: DateTime<Utc>,
}

/// Data required to append a stroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStroke {
    pub item_id: ItemId,
    pub user_id: UserId,
    pub username: Username,
    pub created_at: DateTime<Utc>,
}

/// Confirmation returned after a stroke is logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrokeReceipt {
    pub id: StrokeId,
    pub item_name: ItemName,
    pub created_at: DateTime<Utc>,
}

/// Per-user share of an item's strokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStrokeBreakdown {
    pub username: Username,
    pub count: u64,
    pub last_stroke: DateTime<Utc>,
}

/// Item identity shown at the top of an analytics report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsItem {
    pub id: ItemId,
    pub name: ItemName,
    pub description: Description,
}

/// Stroke analytics for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemAnalytics {
    pub item: AnalyticsItem,
    pub total_strokes: u64,
    /// Ordered by count descending, then username.
    pub by_user: Vec<UserStrokeBreakdown>,
    /// Most recent first.
    pub recent: Vec<Stroke>,
}

impl ItemAnalytics {
    /// Aggregate `strokes` (already scoped to the item and window).
    #[must_use]
    pub fn aggregate(item: &Item, mut strokes: Vec<Stroke>) -> Self {
        let mut by_user: HashMap<&str, UserStrokeBreakdown> = HashMap::new();
        for stroke in &strokes {
            by_user
                .entry(stroke.username.as_ref())
                .and_modify(|entry| {
                    entry.count += 1;
                    entry.last_stroke = entry.last_stroke.max(stroke.created_at);
                })
                .or_insert_with(|| UserStrokeBreakdown {
                    username: stroke.username.clone(),
                    count: 1,
                    last_stroke: stroke.created_at,
                });
        }
        let mut by_user: Vec<_> = by_user.into_values().collect();
        by_user.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.username.as_ref().cmp(b.username.as_ref()))
        });

        let total_strokes = strokes.len() as u64;
        strokes.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        strokes.truncate(RECENT_STROKES_LIMIT);

        Self {
            item: AnalyticsItem {
                id: item.id,
                name: item.name.clone(),
                description: item.description.clone(),
            },
            total_strokes,
            by_user,
            recent: strokes,
        }
    }
}

/// A summary whose cost does not fit the decimal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cost of item {item_id} overflows the decimal range")]
pub struct CostOverflow {
    pub item_id: ItemId,
}

/// One priced line of a user's consumption summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostLine {
    pub item_id: ItemId,
    pub item_name: ItemName,
    pub unit_price: Price,
    pub count: u64,
    pub subtotal: Decimal,
}

/// A user's stroke counts per item with computed cost.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserStrokeSummary {
    pub counts: BTreeMap<ItemId, u64>,
    /// Ordered by item name.
    pub lines: Vec<CostLine>,
    pub total: Decimal,
}

impl UserStrokeSummary {
    /// Join per-item counts with the items they refer to. Counts for items
    /// missing from `items` are kept in `counts` but not priced.
    ///
    /// # Errors
    /// [`CostOverflow`] when a subtotal or the total leaves the decimal range.
    pub fn price(counts: Vec<(ItemId, u64)>, items: &[Item]) -> Result<Self, CostOverflow> {
        let by_id: HashMap<ItemId, &Item> = items.iter().map(|item| (item.id, item)).collect();
        let mut summary = Self::default();
        for (item_id, count) in counts {
            if count == 0 {
                continue;
            }
            summary.counts.insert(item_id, count);
            if let Some(item) = by_id.get(&item_id) {
                let overflow = CostOverflow { item_id };
                let subtotal = item.price.times(count).ok_or(overflow)?;
                summary.total = summary.total.checked_add(subtotal).ok_or(overflow)?;
                summary.lines.push(CostLine {
                    item_id,
                    item_name: item.name.clone(),
                    unit_price: item.price,
                    count,
                    subtotal,
                });
            }
        }
        summary
            .lines
            .sort_by(|a, b| a.item_name.folded().cmp(&b.item_name.folded()));
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalogue::RoomName;
    use crate::domain::ids::RoomId;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};
    use std::str::FromStr;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0)
            .single()
            .expect("valid instant")
    }

    fn stroke(id: i64, username: &str, minute: u32) -> Stroke {
        Stroke {
            id: StrokeId::new(id),
            item_id: ItemId::new(1),
            user_id: Some(UserId::new(id)),
            username: Username::new(username).expect("valid username"),
            created_at: at(minute),
        }
    }

    #[fixture]
    fn cola() -> Item {
        Item {
            id: ItemId::new(1),
            name: ItemName::new("Cola").expect("valid name"),
            description: Description::new(Some("0.5l")).expect("valid description"),
            room_id: RoomId::new(1),
            room_name: RoomName::new("Kitchen").expect("valid name"),
            price: Price::new(Decimal::from_str("1.50").expect("decimal")).expect("valid price"),
            created_at: at(0),
            created_by: None,
        }
    }

    #[rstest]
    fn aggregates_counts_per_user(cola: Item) {
        let strokes = vec![
            stroke(1, "alice", 1),
            stroke(2, "bob", 2),
            stroke(3, "alice", 3),
        ];
        let analytics = ItemAnalytics::aggregate(&cola, strokes);

        assert_eq!(analytics.total_strokes, 3);
        assert_eq!(analytics.by_user.len(), 2);
        let alice = &analytics.by_user[0];
        assert_eq!(alice.username.as_ref(), "alice");
        assert_eq!(alice.count, 2);
        assert_eq!(alice.last_stroke, at(3));
    }

    #[rstest]
    fn recent_strokes_are_newest_first_and_capped(cola: Item) {
        let strokes: Vec<_> = (0..15).map(|n| stroke(i64::from(n) + 1, "alice", n)).collect();
        let analytics = ItemAnalytics::aggregate(&cola, strokes);

        assert_eq!(analytics.total_strokes, 15);
        assert_eq!(analytics.recent.len(), RECENT_STROKES_LIMIT);
        assert_eq!(analytics.recent[0].created_at, at(14));
        assert_eq!(analytics.recent[9].created_at, at(5));
    }

    #[rstest]
    fn empty_ledger_yields_empty_report(cola: Item) {
        let analytics = ItemAnalytics::aggregate(&cola, Vec::new());
        assert_eq!(analytics.total_strokes, 0);
        assert!(analytics.by_user.is_empty());
        assert!(analytics.recent.is_empty());
        assert_eq!(analytics.item.name.as_ref(), "Cola");
    }

    #[rstest]
    fn prices_counts_into_total(cola: Item) {
        let summary = UserStrokeSummary::price(vec![(cola.id, 3)], std::slice::from_ref(&cola))
            .expect("priced");

        assert_eq!(summary.counts.get(&cola.id), Some(&3));
        assert_eq!(summary.total, Decimal::from_str("4.50").expect("decimal"));
        assert_eq!(summary.lines.len(), 1);
        assert_eq!(summary.lines[0].subtotal, summary.total);
    }

    #[rstest]
    fn oversized_costs_are_reported_instead_of_panicking(mut cola: Item) {
        cola.price = Price::new(Decimal::from(i64::MAX / 100)).expect("largest price");
        let water = Item {
            id: ItemId::new(2),
            name: ItemName::new("Water").expect("valid name"),
            ..cola.clone()
        };

        let result = UserStrokeSummary::price(
            vec![(cola.id, u64::MAX), (water.id, 1)],
            &[cola.clone(), water],
        );

        assert_eq!(result, Err(CostOverflow { item_id: cola.id }));
    }
}
